//! Persistent ancestor-closure cache
//!
//! One gzip-compressed bincode file per namespace, named
//! `<namespace>.anc`, inside the cache directory. A file that exists is
//! trusted as-is: nothing compares it against the vocabulary it was built
//! from, so deleting the file is the only way to force a rebuild.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use super::AncestorClosure;
use crate::error::{EvalError, EvalResult};
use crate::ontology::{Namespace, OntologyGraph};

/// Magic bytes identifying a closure cache file
const CACHE_MAGIC: [u8; 4] = *b"GOAC";
/// On-disk format version
const CACHE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CacheFile {
    magic: [u8; 4],
    version: u32,
    namespace: String,
    closure: AncestorClosure,
}

/// Directory of per-namespace closure files
#[derive(Debug, Clone)]
pub struct ClosureCache {
    dir: PathBuf,
}

impl ClosureCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the closure of `namespace`
    pub fn path_for(&self, namespace: Namespace) -> PathBuf {
        self.dir.join(format!("{}.anc", namespace.name()))
    }

    /// Whether a cache file exists for `namespace`
    pub fn contains(&self, namespace: Namespace) -> bool {
        self.path_for(namespace).exists()
    }

    /// Persist a closure, replacing any existing file
    pub fn save(&self, closure: &AncestorClosure) -> EvalResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            EvalError::Cache(format!("Failed to create {}: {}", self.dir.display(), e))
        })?;

        let path = self.path_for(closure.namespace());
        let tmp = path.with_extension("anc.tmp");
        let file = File::create(&tmp)
            .map_err(|e| EvalError::Cache(format!("Failed to create {}: {}", tmp.display(), e)))?;

        let record = CacheFile {
            magic: CACHE_MAGIC,
            version: CACHE_VERSION,
            namespace: closure.namespace().name().to_string(),
            closure: closure.clone(),
        };

        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        bincode::serialize_into(&mut encoder, &record)
            .map_err(|e| EvalError::Cache(format!("Serialization failed: {}", e)))?;
        encoder
            .finish()
            .and_then(|mut writer| writer.flush())
            .map_err(|e| EvalError::Cache(format!("Failed to write {}: {}", tmp.display(), e)))?;

        std::fs::rename(&tmp, &path)
            .map_err(|e| EvalError::Cache(format!("Failed to move {}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "ancestor cache saved");
        Ok(())
    }

    /// Load the closure of `namespace`; `Ok(None)` when no file exists
    pub fn load(&self, namespace: Namespace) -> EvalResult<Option<AncestorClosure>> {
        let path = self.path_for(namespace);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(EvalError::Cache(format!(
                    "Failed to open {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let record: CacheFile = bincode::deserialize_from(GzDecoder::new(BufReader::new(file)))
            .map_err(|e| EvalError::Cache(format!("Corrupt cache {}: {}", path.display(), e)))?;

        if record.magic != CACHE_MAGIC {
            return Err(EvalError::Cache(format!(
                "Invalid magic bytes in {}: {:?}",
                path.display(),
                record.magic
            )));
        }
        if record.version != CACHE_VERSION {
            return Err(EvalError::Cache(format!(
                "Unsupported cache version {} in {} (expected {})",
                record.version,
                path.display(),
                CACHE_VERSION
            )));
        }
        if record.namespace != namespace.name() || record.closure.namespace() != namespace {
            return Err(EvalError::Cache(format!(
                "{} holds namespace {}, expected {}",
                path.display(),
                record.namespace,
                namespace
            )));
        }

        record.closure.validate().map_err(|message| {
            EvalError::Cache(format!("Inconsistent cache {}: {}", path.display(), message))
        })?;

        tracing::debug!(path = %path.display(), terms = record.closure.len(), "ancestor cache hit");
        Ok(Some(record.closure))
    }

    /// Build and save the closure of every namespace without a cache file.
    ///
    /// Existing files are left untouched, even if stale. Returns the
    /// namespaces that were built.
    pub fn ensure_cached(
        &self,
        graph: &OntologyGraph,
        namespaces: &[Namespace],
    ) -> EvalResult<Vec<Namespace>> {
        let mut built = Vec::new();
        for &namespace in namespaces {
            if self.contains(namespace) {
                continue;
            }
            tracing::info!(namespace = %namespace, "ancestor cache missing, building");
            self.save(&AncestorClosure::build(graph, namespace))?;
            built.push(namespace);
        }
        Ok(built)
    }

    /// Load the closure, building and saving it first if absent
    pub fn load_or_build(
        &self,
        graph: &OntologyGraph,
        namespace: Namespace,
    ) -> EvalResult<AncestorClosure> {
        if let Some(closure) = self.load(namespace)? {
            return Ok(closure);
        }
        let closure = AncestorClosure::build(graph, namespace);
        self.save(&closure)?;
        Ok(closure)
    }
}
