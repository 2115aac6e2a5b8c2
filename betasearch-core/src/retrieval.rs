//! Query-side retrieval contract, independent of the embedding backend.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::provider::{EmbeddingSpace, SimilarityHit};

/// Default number of matches a search returns.
pub const DEFAULT_TOPN: usize = 3;

/// Normalize a raw query, embed it, and return the top `k` neighbors.
///
/// Whatever order the space returns, the result is sorted by descending
/// score with ascending document id breaking ties, holds no duplicate
/// document ids, and is clamped to the corpus size. A query that
/// normalizes to zero tokens still runs, it just embeds no terms.
pub fn search_hits<S: EmbeddingSpace>(space: &S, query_text: &str, k: usize) -> Result<Vec<SimilarityHit>> {
    if k < 1 {
        return Err(Error::InvalidConfig(format!("k must be at least 1, got {k}")));
    }
    let tokens = normalize(query_text);
    if tokens.is_empty() {
        tracing::warn!(
            query = query_text,
            "query normalized to zero tokens, scores will be low-confidence"
        );
    }
    let vector = space.infer(&tokens);
    let mut hits = space.nearest(&vector, k);
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.doc_id.cmp(&b.doc_id))
    });
    let mut seen = HashSet::new();
    hits.retain(|h| seen.insert(h.doc_id));
    hits.truncate(k.min(space.num_documents()));
    Ok(hits)
}
