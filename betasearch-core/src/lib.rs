//! Similarity search over climbing-route descriptions.
//!
//! Raw descriptions are normalized into token lists, collected into a
//! corpus with a dense-id/route-id identity map, and handed to an
//! [`EmbeddingProvider`] to train an [`EmbeddingSpace`]. Queries go through
//! the same normalizer, get embedded into the trained space, and come back
//! as route records ranked by similarity. A bundled TF-IDF provider makes
//! the pipeline usable without an external model.

pub mod assemble;
pub mod context;
pub mod corpus;
pub mod error;
pub mod normalize;
pub mod persist;
pub mod provider;
pub mod records;
pub mod retrieval;
pub mod tfidf;
pub mod validate;

pub use assemble::{assemble, QueryResult, RouteMatch};
pub use context::{SearchContext, SharedContext};
pub use corpus::{build_corpus, Corpus, Document, DocumentId, IdentityMap, RouteId};
pub use error::{Error, Result};
pub use normalize::normalize;
pub use provider::{EmbeddingProvider, EmbeddingSpace, SimilarityHit};
pub use records::RouteRecord;
pub use retrieval::{search_hits, DEFAULT_TOPN};
pub use tfidf::{TfIdfConfig, TfIdfProvider, TfIdfSpace};
pub use validate::{
    phrase_spot_check, read_phrases, self_rank_distribution, PhraseCheck, RankHistogram,
    RankRow, SelfRankReport, ValidationSample, SPOT_CHECK_TOPN,
};
