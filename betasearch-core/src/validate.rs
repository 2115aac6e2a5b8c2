//! Post-training validation: self-rank distribution and phrase spot checks.
//!
//! A trained space is sanity-checked by re-embedding a sample of its own
//! training documents and ranking the whole corpus against each. A healthy
//! space puts nearly every document at rank 0 of its own query. The phrase
//! spot check then runs a handful of curated descriptions through the full
//! retrieval path for eyeballing.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::path::Path;

use crate::corpus::{Corpus, DocumentId, IdentityMap, RouteId};
use crate::error::{Error, Result};
use crate::provider::EmbeddingSpace;
use crate::retrieval::search_hits;

/// How many neighbors a phrase spot check prints per phrase.
pub const SPOT_CHECK_TOPN: usize = 3;

/// Rank of one sampled document in its own similarity query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationSample {
    pub doc_id: DocumentId,
    /// 0 means the document was its own best match.
    pub self_rank: usize,
}

/// Counts of observed self-ranks, ordered by rank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankHistogram {
    counts: BTreeMap<usize, usize>,
}

/// One row of the rank table: `count` documents landed at `rank`, and
/// `cumulative` landed at this rank or better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankRow {
    pub rank: usize,
    pub count: usize,
    pub cumulative: usize,
}

impl RankHistogram {
    pub fn record(&mut self, rank: usize) {
        *self.counts.entry(rank).or_insert(0) += 1;
    }

    pub fn count(&self, rank: usize) -> usize {
        self.counts.get(&rank).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn rows(&self) -> Vec<RankRow> {
        let mut cumulative = 0;
        self.counts
            .iter()
            .map(|(&rank, &count)| {
                cumulative += count;
                RankRow { rank, count, cumulative }
            })
            .collect()
    }
}

/// Outcome of a self-rank validation pass.
#[derive(Debug, Clone)]
pub struct SelfRankReport {
    pub samples: Vec<ValidationSample>,
    pub histogram: RankHistogram,
}

/// Sample up to `sample_size` documents without replacement and find where
/// each ranks in its own full-corpus similarity query. The same seed over
/// the same inputs draws the same documents.
pub fn self_rank_distribution<S: EmbeddingSpace>(
    space: &S,
    corpus: &Corpus,
    sample_size: usize,
    seed: u64,
) -> Result<SelfRankReport> {
    let n = corpus.len();
    if n == 0 {
        return Err(Error::InvalidConfig("cannot validate an empty corpus".into()));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let drawn = rand::seq::index::sample(&mut rng, n, sample_size.min(n));

    let mut samples = Vec::with_capacity(drawn.len());
    let mut histogram = RankHistogram::default();
    for idx in drawn.iter() {
        let doc = &corpus.documents()[idx];
        let vector = space.infer(&doc.tokens);
        let hits = space.nearest(&vector, n);
        let self_rank = hits
            .iter()
            .position(|h| h.doc_id == doc.id)
            .ok_or(Error::MissingSelfRank(doc.id))?;
        histogram.record(self_rank);
        samples.push(ValidationSample {
            doc_id: doc.id,
            self_rank,
        });
    }
    Ok(SelfRankReport { samples, histogram })
}

/// Top neighbors for one curated phrase, resolved to route ids.
#[derive(Debug, Clone)]
pub struct PhraseCheck {
    pub phrase: String,
    /// `(route_id, score)` pairs, best first.
    pub top: Vec<(RouteId, f32)>,
}

/// Run each phrase through the normal retrieval path and resolve the top
/// hits to route ids.
pub fn phrase_spot_check<S: EmbeddingSpace>(
    space: &S,
    identity_map: &IdentityMap,
    phrases: &[String],
) -> Result<Vec<PhraseCheck>> {
    let mut checks = Vec::with_capacity(phrases.len());
    for phrase in phrases {
        let hits = search_hits(space, phrase, SPOT_CHECK_TOPN)?;
        let mut top = Vec::with_capacity(hits.len());
        for hit in &hits {
            let route_id = identity_map
                .route_for(hit.doc_id)
                .ok_or(Error::UnknownDocument(hit.doc_id))?;
            top.push((route_id, hit.score));
        }
        checks.push(PhraseCheck {
            phrase: phrase.clone(),
            top,
        });
    }
    Ok(checks)
}

/// Read spot-check phrases from a text file, one per line. Blank lines are
/// skipped.
pub fn read_phrases(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::build_corpus;
    use crate::provider::SimilarityHit;
    use std::io::Write;

    /// Scores 1.0 for an exact token-sequence match and strictly less
    /// otherwise.
    struct ExactMatchSpace {
        docs: Vec<Vec<String>>,
    }

    impl ExactMatchSpace {
        fn over(corpus: &Corpus) -> Self {
            Self {
                docs: corpus.documents().iter().map(|d| d.tokens.clone()).collect(),
            }
        }
    }

    impl EmbeddingSpace for ExactMatchSpace {
        type Vector = Vec<String>;

        fn infer(&self, tokens: &[String]) -> Vec<String> {
            tokens.to_vec()
        }

        fn nearest(&self, vector: &Vec<String>, k: usize) -> Vec<SimilarityHit> {
            let mut hits: Vec<SimilarityHit> = self
                .docs
                .iter()
                .enumerate()
                .map(|(id, tokens)| {
                    let score = if tokens == vector {
                        1.0
                    } else {
                        let shared = tokens.iter().filter(|t| vector.contains(t)).count();
                        shared as f32 / (tokens.len() + vector.len() + 1) as f32
                    };
                    SimilarityHit {
                        doc_id: id as u32,
                        score,
                    }
                })
                .collect();
            hits.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.doc_id.cmp(&b.doc_id))
            });
            hits.truncate(k);
            hits
        }

        fn num_documents(&self) -> usize {
            self.docs.len()
        }
    }

    fn toy_corpus() -> (Corpus, IdentityMap) {
        let descs = [
            "steep crimpy headwall",
            "slab runout friction climbing",
            "bolted juggy roof",
            "splitter hand crack",
        ];
        let lines: Vec<Vec<String>> = descs.iter().map(|d| vec![d.to_string()]).collect();
        let records: Vec<(u64, &[String])> = lines
            .iter()
            .enumerate()
            .map(|(i, l)| (200 + i as u64, l.as_slice()))
            .collect();
        build_corpus(records).unwrap()
    }

    #[test]
    fn every_document_ranks_itself_first() {
        let (corpus, _) = toy_corpus();
        let space = ExactMatchSpace::over(&corpus);
        let report = self_rank_distribution(&space, &corpus, 100, 42).unwrap();
        assert_eq!(report.samples.len(), 4);
        assert_eq!(report.histogram.count(0), 4);
        assert_eq!(report.histogram.total(), 4);
        assert!(report.samples.iter().all(|s| s.self_rank == 0));
    }

    #[test]
    fn same_seed_draws_the_same_sample() {
        let (corpus, _) = toy_corpus();
        let space = ExactMatchSpace::over(&corpus);
        let a = self_rank_distribution(&space, &corpus, 2, 7).unwrap();
        let b = self_rank_distribution(&space, &corpus, 2, 7).unwrap();
        assert_eq!(a.samples, b.samples);
        assert_eq!(a.histogram, b.histogram);
    }

    #[test]
    fn histogram_rows_accumulate() {
        let mut hist = RankHistogram::default();
        for rank in [0, 0, 1, 3] {
            hist.record(rank);
        }
        let rows = hist.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].rank, rows[0].count, rows[0].cumulative), (0, 2, 2));
        assert_eq!((rows[1].rank, rows[1].count, rows[1].cumulative), (1, 1, 3));
        assert_eq!((rows[2].rank, rows[2].count, rows[2].cumulative), (3, 1, 4));
    }

    #[test]
    fn histogram_ignores_sample_order() {
        let mut forward = RankHistogram::default();
        let mut backward = RankHistogram::default();
        let ranks = [2, 0, 1, 0, 2];
        for &r in ranks.iter() {
            forward.record(r);
        }
        for &r in ranks.iter().rev() {
            backward.record(r);
        }
        assert_eq!(forward, backward);
    }

    #[test]
    fn spot_check_resolves_route_ids() {
        let (corpus, map) = toy_corpus();
        let space = ExactMatchSpace::over(&corpus);
        let phrases = vec!["slab runout friction climbing".to_string()];
        let checks = phrase_spot_check(&space, &map, &phrases).unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].top.len(), 3);
        let (route_id, score) = checks[0].top[0];
        assert_eq!(route_id, 201);
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn phrases_file_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phrases.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "steep juggy roof").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "  ").unwrap();
        writeln!(f, "slab friction").unwrap();
        drop(f);
        let phrases = read_phrases(&path).unwrap();
        assert_eq!(phrases, vec!["steep juggy roof", "slab friction"]);
    }
}
