//! Error types shared across the search pipeline.

use thiserror::Error;

use crate::corpus::{DocumentId, RouteId};

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied parameter is out of range or unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A document id has no entry in the identity map.
    #[error("no route found for document id {0}")]
    UnknownDocument(DocumentId),

    /// A route id resolved by the identity map has no record snapshot.
    #[error("no route record found for route id {0}")]
    UnknownRoute(RouteId),

    /// The same route id was mapped to more than one document.
    #[error("route id {0} is mapped to more than one document")]
    DuplicateRoute(RouteId),

    /// Persisted artifacts were not produced by the same training run.
    #[error("artifact set is inconsistent: {0}")]
    ArtifactMismatch(String),

    /// A sampled document did not appear in its own similarity ranking.
    #[error("document id {0} is missing from its own similarity ranking")]
    MissingSelfRank(DocumentId),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
