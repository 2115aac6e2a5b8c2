//! Trait seams for pluggable embedding backends.
//!
//! The pipeline never looks inside a vector: it hands token lists to a
//! trained space and gets ranked document ids back. Backends choose their
//! own vector representation through the associated `Vector` type.

use crate::corpus::{Corpus, DocumentId};
use crate::error::Result;

/// One ranked neighbor from a similarity query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityHit {
    pub doc_id: DocumentId,
    /// Similarity score, higher is more similar.
    pub score: f32,
}

/// A trained embedding space over one corpus.
pub trait EmbeddingSpace: Send + Sync {
    /// Backend-private vector representation.
    type Vector;

    /// Embed an already-normalized token list. Must accept an empty list.
    fn infer(&self, tokens: &[String]) -> Self::Vector;

    /// The `k` most similar training documents, best first. Implementations
    /// may return ties and overfull lists; callers re-sort and clamp.
    fn nearest(&self, vector: &Self::Vector, k: usize) -> Vec<SimilarityHit>;

    /// Number of documents the space was trained over.
    fn num_documents(&self) -> usize;
}

/// Anything that can train an [`EmbeddingSpace`] from a corpus.
pub trait EmbeddingProvider: Send + Sync {
    type Space: EmbeddingSpace;

    fn train(&self, corpus: &Corpus) -> Result<Self::Space>;
}
