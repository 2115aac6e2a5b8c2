//! Bundled TF-IDF embedding provider.
//!
//! Documents and queries become L2-normalized sparse tf-idf vectors, so the
//! postings-weighted dot product in [`TfIdfSpace::nearest`] is cosine
//! similarity. Scores land in `[0, 1]` and a document scores `1.0` against
//! its own token list.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::corpus::{Corpus, DocumentId};
use crate::error::{Error, Result};
use crate::provider::{EmbeddingProvider, EmbeddingSpace, SimilarityHit};

pub type TermId = u32;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TfIdfConfig {
    /// Terms appearing in fewer documents than this are dropped from the
    /// dictionary.
    pub min_doc_freq: usize,
    /// Use idf = ln(1 + N/df) instead of ln(N/df). Keeps terms that appear
    /// in every document from weighting to zero.
    pub smoothed_idf: bool,
}

impl Default for TfIdfConfig {
    fn default() -> Self {
        Self {
            min_doc_freq: 1,
            smoothed_idf: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct TfIdfProvider {
    config: TfIdfConfig,
}

impl TfIdfProvider {
    pub fn new(config: TfIdfConfig) -> Self {
        Self { config }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocumentId,
    /// L2-normalized tf-idf weight.
    pub weight: f32,
}

/// L2-normalized sparse vector over dictionary terms, sorted by term id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector(Vec<(TermId, f32)>);

#[derive(Debug, Serialize, Deserialize)]
pub struct TfIdfSpace {
    dictionary: HashMap<String, TermId>,
    idf: Vec<f32>,
    postings: HashMap<TermId, Vec<Posting>>,
    num_docs: usize,
}

impl TfIdfSpace {
    fn weigh(&self, tokens: &[String]) -> Vec<(TermId, f32)> {
        let mut tf_raw: HashMap<TermId, u32> = HashMap::new();
        for token in tokens {
            if let Some(&tid) = self.dictionary.get(token) {
                *tf_raw.entry(tid).or_insert(0) += 1;
            }
        }
        let mut weights: Vec<(TermId, f32)> = tf_raw
            .into_iter()
            .map(|(tid, tf_raw)| {
                let tf = 1.0 + (tf_raw as f32).ln();
                (tid, tf * self.idf[tid as usize])
            })
            .collect();
        let mut norm = weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm == 0.0 {
            norm = 1.0;
        }
        for (_, w) in weights.iter_mut() {
            *w /= norm;
        }
        weights.sort_by_key(|&(tid, _)| tid);
        weights
    }
}

impl EmbeddingProvider for TfIdfProvider {
    type Space = TfIdfSpace;

    fn train(&self, corpus: &Corpus) -> Result<TfIdfSpace> {
        if corpus.is_empty() {
            return Err(Error::InvalidConfig("cannot train on an empty corpus".into()));
        }
        if self.config.min_doc_freq < 1 {
            return Err(Error::InvalidConfig(
                "min_doc_freq must be at least 1".into(),
            ));
        }
        let n = corpus.len();

        // Document frequencies, terms kept in first-seen order so term ids
        // are stable across runs.
        let mut term_order: Vec<String> = Vec::new();
        let mut df_by_term: HashMap<String, u32> = HashMap::new();
        for doc in corpus.documents() {
            let mut seen_in_doc: HashSet<&str> = HashSet::new();
            for token in &doc.tokens {
                if seen_in_doc.insert(token.as_str()) {
                    let df = df_by_term.entry(token.clone()).or_insert(0);
                    if *df == 0 {
                        term_order.push(token.clone());
                    }
                    *df += 1;
                }
            }
        }

        // Dictionary over surviving terms, with idf per term.
        let mut dictionary: HashMap<String, TermId> = HashMap::new();
        let mut idf: Vec<f32> = Vec::new();
        for term in term_order {
            let df_t = df_by_term[&term];
            if (df_t as usize) < self.config.min_doc_freq {
                continue;
            }
            let tid = idf.len() as TermId;
            let ratio = n as f32 / df_t as f32;
            idf.push(if self.config.smoothed_idf {
                (1.0 + ratio).ln()
            } else {
                ratio.ln()
            });
            dictionary.insert(term, tid);
        }

        // Per-document normalized weights become postings.
        let mut postings: HashMap<TermId, Vec<Posting>> = HashMap::new();
        for doc in corpus.documents() {
            let mut tf_raw: HashMap<TermId, u32> = HashMap::new();
            for token in &doc.tokens {
                if let Some(&tid) = dictionary.get(token) {
                    *tf_raw.entry(tid).or_insert(0) += 1;
                }
            }
            let mut weights: Vec<(TermId, f32)> = tf_raw
                .into_iter()
                .map(|(tid, tf_raw)| {
                    let tf = 1.0 + (tf_raw as f32).ln();
                    (tid, tf * idf[tid as usize])
                })
                .collect();
            let mut norm = weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
            if norm == 0.0 {
                norm = 1.0;
            }
            for (tid, w) in weights {
                postings.entry(tid).or_default().push(Posting {
                    doc_id: doc.id,
                    weight: w / norm,
                });
            }
        }

        tracing::debug!(
            num_docs = n,
            num_terms = dictionary.len(),
            "trained tf-idf space"
        );
        Ok(TfIdfSpace {
            dictionary,
            idf,
            postings,
            num_docs: n,
        })
    }
}

impl EmbeddingSpace for TfIdfSpace {
    type Vector = SparseVector;

    fn infer(&self, tokens: &[String]) -> SparseVector {
        SparseVector(self.weigh(tokens))
    }

    /// Ranks the whole corpus by cosine similarity and keeps the top `k`.
    /// Documents sharing no dictionary term with the vector score `0.0`;
    /// equal scores order by ascending document id.
    fn nearest(&self, vector: &SparseVector, k: usize) -> Vec<SimilarityHit> {
        let mut scores = vec![0.0f32; self.num_docs];
        for (tid, q_w) in &vector.0 {
            if let Some(plist) = self.postings.get(tid) {
                for p in plist {
                    scores[p.doc_id as usize] += p.weight * q_w;
                }
            }
        }
        let mut hits: Vec<SimilarityHit> = scores
            .into_iter()
            .enumerate()
            .map(|(id, score)| SimilarityHit {
                doc_id: id as DocumentId,
                score,
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.doc_id.cmp(&b.doc_id))
        });
        hits.truncate(k.min(self.num_docs));
        hits
    }

    fn num_documents(&self) -> usize {
        self.num_docs
    }
}
