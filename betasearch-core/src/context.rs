//! Query-time state: everything one search needs, bundled and swappable.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::assemble::{assemble, QueryResult};
use crate::corpus::{IdentityMap, RouteId};
use crate::error::{Error, Result};
use crate::provider::EmbeddingSpace;
use crate::retrieval::search_hits;

/// A trained space, its identity map, and the route record snapshot from
/// the same training run. Construction cross-checks the three, so a
/// context that exists can serve queries without further validation.
#[derive(Debug)]
pub struct SearchContext<S, R> {
    space: S,
    identity_map: IdentityMap,
    records: HashMap<RouteId, R>,
}

impl<S: EmbeddingSpace, R: Clone> SearchContext<S, R> {
    pub fn new(
        space: S,
        identity_map: IdentityMap,
        records: HashMap<RouteId, R>,
    ) -> Result<Self> {
        if identity_map.len() != space.num_documents() {
            return Err(Error::ArtifactMismatch(format!(
                "identity map covers {} documents but embedding space indexes {}",
                identity_map.len(),
                space.num_documents()
            )));
        }
        for &route_id in identity_map.routes() {
            if !records.contains_key(&route_id) {
                return Err(Error::UnknownRoute(route_id));
            }
        }
        Ok(Self {
            space,
            identity_map,
            records,
        })
    }

    /// Run a raw query end to end: normalize, embed, rank, and join the
    /// top `k` hits to their route records.
    pub fn search(&self, query_text: &str, k: usize) -> Result<QueryResult<R>> {
        let hits = search_hits(&self.space, query_text, k)?;
        assemble(&hits, &self.identity_map, &self.records, query_text)
    }

    pub fn num_documents(&self) -> usize {
        self.space.num_documents()
    }

    pub fn space(&self) -> &S {
        &self.space
    }

    pub fn identity_map(&self) -> &IdentityMap {
        &self.identity_map
    }
}

/// Handle that lets long-running callers swap in a retrained context while
/// queries keep a consistent view. Readers clone the current [`Arc`] and
/// finish on whichever context they started with.
pub struct SharedContext<S, R> {
    inner: RwLock<Arc<SearchContext<S, R>>>,
}

impl<S: EmbeddingSpace, R: Clone> SharedContext<S, R> {
    pub fn new(context: SearchContext<S, R>) -> Self {
        Self {
            inner: RwLock::new(Arc::new(context)),
        }
    }

    pub fn current(&self) -> Arc<SearchContext<S, R>> {
        self.inner.read().clone()
    }

    /// Replace the space, identity map, and records in one step.
    pub fn replace(&self, context: SearchContext<S, R>) {
        let num_documents = context.num_documents();
        *self.inner.write() = Arc::new(context);
        tracing::debug!(num_documents, "search context replaced");
    }
}
