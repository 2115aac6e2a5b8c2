//! Join ranked document ids back to caller-facing route records.

use serde::Serialize;
use std::collections::HashMap;

use crate::corpus::{IdentityMap, RouteId};
use crate::error::{Error, Result};
use crate::provider::SimilarityHit;

/// One retrieved route with its similarity score and the query that
/// produced it.
#[derive(Debug, Clone, Serialize)]
pub struct RouteMatch<R> {
    pub record: R,
    pub score: f32,
    pub query: String,
}

/// Ranked matches, best first.
pub type QueryResult<R> = Vec<RouteMatch<R>>;

/// Resolve each hit through the identity map and attach its route record.
/// Hit order is preserved. Fails if a document id has no route or a route
/// has no record, rather than silently dropping rows.
pub fn assemble<R: Clone>(
    hits: &[SimilarityHit],
    identity_map: &IdentityMap,
    records: &HashMap<RouteId, R>,
    query_text: &str,
) -> Result<QueryResult<R>> {
    let mut matches = Vec::with_capacity(hits.len());
    for hit in hits {
        let route_id = identity_map
            .route_for(hit.doc_id)
            .ok_or(Error::UnknownDocument(hit.doc_id))?;
        let record = records
            .get(&route_id)
            .ok_or(Error::UnknownRoute(route_id))?;
        matches.push(RouteMatch {
            record: record.clone(),
            score: hit.score,
            query: query_text.to_string(),
        });
    }
    Ok(matches)
}
