use bincode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::corpus::{IdentityMap, RouteId};
use crate::error::{Error, Result};
use crate::provider::EmbeddingSpace;
use crate::records::RouteRecord;

pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_documents: usize,
    pub created_at: String,
    pub version: u32,
}

/// File layout of one training run's artifact directory.
pub struct ArtifactPaths {
    pub root: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn space(&self) -> PathBuf { self.root.join("space.bin") }
    fn identity_map(&self) -> PathBuf { self.root.join("identity_map.bin") }
    fn routes(&self) -> PathBuf { self.root.join("routes.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn save_space<S: Serialize>(paths: &ArtifactPaths, space: &S) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.space())?;
    let bytes = bincode::serialize(space)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_space<S: DeserializeOwned>(paths: &ArtifactPaths) -> Result<S> {
    let mut f = File::open(paths.space())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let space = bincode::deserialize(&buf)?;
    Ok(space)
}

pub fn save_identity_map(paths: &ArtifactPaths, map: &IdentityMap) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.identity_map())?;
    let bytes = bincode::serialize(map.routes())?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_identity_map(paths: &ArtifactPaths) -> Result<IdentityMap> {
    let mut f = File::open(paths.identity_map())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let routes: Vec<RouteId> = bincode::deserialize(&buf)?;
    IdentityMap::from_routes(routes)
}

pub fn save_routes(paths: &ArtifactPaths, records: &HashMap<RouteId, RouteRecord>) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.routes())?;
    let bytes = bincode::serialize(records)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_routes(paths: &ArtifactPaths) -> Result<HashMap<RouteId, RouteRecord>> {
    let mut f = File::open(paths.routes())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let records = bincode::deserialize(&buf)?;
    Ok(records)
}

pub fn save_meta(paths: &ArtifactPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &ArtifactPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Save one training run as a versioned artifact set: the trained space,
/// the identity map, the route record snapshot, and a meta manifest.
pub fn save_artifacts<S>(
    paths: &ArtifactPaths,
    space: &S,
    map: &IdentityMap,
    records: &HashMap<RouteId, RouteRecord>,
) -> Result<()>
where
    S: EmbeddingSpace + Serialize,
{
    if map.len() != space.num_documents() {
        return Err(Error::ArtifactMismatch(format!(
            "identity map covers {} documents but embedding space indexes {}",
            map.len(),
            space.num_documents()
        )));
    }
    save_space(paths, space)?;
    save_identity_map(paths, map)?;
    save_routes(paths, records)?;
    let meta = MetaFile {
        num_documents: space.num_documents(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: ARTIFACT_VERSION,
    };
    save_meta(paths, &meta)?;
    Ok(())
}

/// Load a full artifact set and cross-check that the pieces came from the
/// same training run.
pub fn load_artifacts<S>(
    paths: &ArtifactPaths,
) -> Result<(S, IdentityMap, HashMap<RouteId, RouteRecord>, MetaFile)>
where
    S: EmbeddingSpace + DeserializeOwned,
{
    let space: S = load_space(paths)?;
    let map = load_identity_map(paths)?;
    let records = load_routes(paths)?;
    let meta = load_meta(paths)?;
    if map.len() != space.num_documents() {
        return Err(Error::ArtifactMismatch(format!(
            "identity map covers {} documents but embedding space indexes {}",
            map.len(),
            space.num_documents()
        )));
    }
    if meta.num_documents != space.num_documents() {
        return Err(Error::ArtifactMismatch(format!(
            "meta manifest records {} documents but embedding space indexes {}",
            meta.num_documents,
            space.num_documents()
        )));
    }
    Ok((space, map, records, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::build_corpus;
    use crate::provider::EmbeddingProvider;
    use crate::tfidf::{TfIdfProvider, TfIdfSpace};

    fn route(route_id: RouteId, name: &str, desc: &str) -> RouteRecord {
        RouteRecord {
            route_id,
            route_name: name.into(),
            type_string: "sport".into(),
            yds: Some("5.10".into()),
            vermin: None,
            description: vec![desc.into()],
            parent_sector: None,
            parent_loc: None,
        }
    }

    fn trained_fixture() -> (TfIdfSpace, IdentityMap, HashMap<RouteId, RouteRecord>) {
        let records = vec![
            route(101, "Captain Crimp", "steep crimpy headwall"),
            route(102, "Slab of Doom", "slab runout friction"),
        ];
        let (corpus, map) = build_corpus(
            records.iter().map(|r| (r.route_id, r.description.as_slice())),
        )
        .unwrap();
        let space = TfIdfProvider::default().train(&corpus).unwrap();
        let snapshot = records.into_iter().map(|r| (r.route_id, r)).collect();
        (space, map, snapshot)
    }

    #[test]
    fn artifact_set_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path());
        let (space, map, records) = trained_fixture();
        save_artifacts(&paths, &space, &map, &records).unwrap();

        let (loaded, loaded_map, loaded_records, meta) =
            load_artifacts::<TfIdfSpace>(&paths).unwrap();
        assert_eq!(loaded.num_documents(), 2);
        assert_eq!(loaded_map.route_for(0), Some(101));
        assert_eq!(loaded_map.route_for(1), Some(102));
        assert_eq!(loaded_records[&102].route_name, "Slab of Doom");
        assert_eq!(meta.num_documents, 2);
        assert_eq!(meta.version, ARTIFACT_VERSION);

        // the reloaded space still answers queries
        let v = loaded.infer(&["runout".into()]);
        assert_eq!(loaded.nearest(&v, 1)[0].doc_id, 1);
    }

    #[test]
    fn mismatched_identity_map_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path());
        let (space, map, records) = trained_fixture();
        save_artifacts(&paths, &space, &map, &records).unwrap();

        // overwrite the map with one covering a different corpus size
        let stale = IdentityMap::from_routes(vec![101]).unwrap();
        save_identity_map(&paths, &stale).unwrap();

        let err = load_artifacts::<TfIdfSpace>(&paths).unwrap_err();
        assert!(matches!(err, Error::ArtifactMismatch(_)));
    }

    #[test]
    fn save_refuses_inconsistent_pair() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path());
        let (space, _, records) = trained_fixture();
        let stale = IdentityMap::from_routes(vec![101, 102, 103]).unwrap();
        let err = save_artifacts(&paths, &space, &stale, &records).unwrap_err();
        assert!(matches!(err, Error::ArtifactMismatch(_)));
    }

    #[test]
    fn missing_artifact_surfaces_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path().join("nowhere"));
        let err = load_artifacts::<TfIdfSpace>(&paths).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
