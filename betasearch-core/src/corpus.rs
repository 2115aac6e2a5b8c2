//! Corpus construction and the document/route identity bookkeeping.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::normalize::normalize;

pub type DocumentId = u32;
pub type RouteId = u64;

/// One normalized description, addressed by its dense training id.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    pub tokens: Vec<String>,
}

/// Ordered set of documents with ids `0..len`.
#[derive(Debug, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id as usize)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }
}

/// Bijection between dense document ids and stable route ids.
///
/// Document id `i` maps to `routes[i]`; the reverse direction is indexed.
#[derive(Debug, Clone)]
pub struct IdentityMap {
    routes: Vec<RouteId>,
    docs: HashMap<RouteId, DocumentId>,
}

impl IdentityMap {
    pub fn from_routes(routes: Vec<RouteId>) -> Result<Self> {
        let mut docs = HashMap::with_capacity(routes.len());
        for (i, &route_id) in routes.iter().enumerate() {
            if docs.insert(route_id, i as DocumentId).is_some() {
                return Err(Error::DuplicateRoute(route_id));
            }
        }
        Ok(Self { routes, docs })
    }

    pub fn route_for(&self, doc_id: DocumentId) -> Option<RouteId> {
        self.routes.get(doc_id as usize).copied()
    }

    pub fn doc_for(&self, route_id: RouteId) -> Option<DocumentId> {
        self.docs.get(&route_id).copied()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route ids in document-id order.
    pub fn routes(&self) -> &[RouteId] {
        &self.routes
    }
}

/// Build a corpus and its identity map from `(route_id, description lines)`
/// pairs. Records without description lines are skipped; surviving records
/// get dense document ids in input order. A record whose lines normalize to
/// zero tokens still occupies a document slot.
pub fn build_corpus<'a, I>(records: I) -> Result<(Corpus, IdentityMap)>
where
    I: IntoIterator<Item = (RouteId, &'a [String])>,
{
    let mut documents = Vec::new();
    let mut routes = Vec::new();
    for (route_id, lines) in records {
        if lines.is_empty() {
            continue;
        }
        let id = documents.len() as DocumentId;
        documents.push(Document {
            id,
            tokens: normalize(&lines.join(" ")),
        });
        routes.push(route_id);
    }
    if documents.is_empty() {
        return Err(Error::InvalidConfig(
            "no records with description lines to build a corpus from".into(),
        ));
    }
    let map = IdentityMap::from_routes(routes)?;
    Ok((Corpus { documents }, map))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn dense_ids_skip_empty_records() {
        let a = lines(&["steep crimpy"]);
        let b: Vec<String> = Vec::new();
        let c = lines(&["slab", "runout"]);
        let records = vec![(101u64, a.as_slice()), (102, b.as_slice()), (103, c.as_slice())];
        let (corpus, map) = build_corpus(records).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get(1).unwrap().tokens, vec!["slab", "runout"]);
        assert_eq!(map.route_for(0), Some(101));
        assert_eq!(map.route_for(1), Some(103));
        assert_eq!(map.doc_for(103), Some(1));
        assert_eq!(map.doc_for(102), None);
    }

    #[test]
    fn single_empty_line_keeps_slot() {
        let a = lines(&[""]);
        let (corpus, map) = build_corpus(vec![(7u64, a.as_slice())]).unwrap();
        assert_eq!(corpus.len(), 1);
        assert!(corpus.get(0).unwrap().tokens.is_empty());
        assert_eq!(map.route_for(0), Some(7));
    }

    #[test]
    fn all_records_empty_is_an_error() {
        let a: Vec<String> = Vec::new();
        let err = build_corpus(vec![(1u64, a.as_slice())]).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn duplicate_route_id_is_rejected() {
        let a = lines(&["steep"]);
        let b = lines(&["slab"]);
        let records = vec![(9u64, a.as_slice()), (9, b.as_slice())];
        let err = build_corpus(records).unwrap_err();
        assert!(matches!(err, Error::DuplicateRoute(9)));
    }
}
