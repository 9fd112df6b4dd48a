//! Evaluation configuration
//!
//! Supports loading from a TOML file:
//!
//! ```toml
//! cache_dir = "./ancestor-cache"
//! parallelism = 8
//!
//! [ontology]
//! relation_aware = true
//! remove_obsolete = true
//! include_alt_ids = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};
use crate::ontology::LoadOptions;

/// Configuration shared by the evaluation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// How the vocabulary is assembled
    #[serde(default)]
    pub ontology: LoadOptions,

    /// Directory holding the per-namespace ancestor caches
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Number of worker threads for matrix scans
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./ancestor-cache")
}

fn default_parallelism() -> usize {
    num_cpus::get()
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            ontology: LoadOptions::default(),
            cache_dir: default_cache_dir(),
            parallelism: default_parallelism(),
        }
    }
}

impl EvalConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> EvalResult<Self> {
        let config: EvalConfig =
            toml::from_str(content).map_err(|e| EvalError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: &Path) -> EvalResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EvalError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_parallelism(mut self, workers: usize) -> Self {
        self.parallelism = workers;
        self
    }

    pub fn with_ontology(mut self, options: LoadOptions) -> Self {
        self.ontology = options;
        self
    }

    fn validate(&self) -> EvalResult<()> {
        if self.parallelism == 0 {
            return Err(EvalError::Config(
                "parallelism must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
