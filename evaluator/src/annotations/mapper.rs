//! Protein accession remapping
//!
//! Predictions are usually keyed by UniProtKB accession while benchmarks use
//! their own target identifiers. Two lookup tables bridge the namespaces:
//!
//! ```text
//! accession ──(accession map)──▶ entry name ──(benchmark map)──▶ target id
//! ```

use std::io::BufRead;
use std::path::Path;

use rustc_hash::FxHashMap;

use super::reader::for_each_record;
use super::Predictions;
use crate::error::EvalResult;

/// Two-step accession → benchmark-target translation table
#[derive(Debug, Clone, Default)]
pub struct AccessionMapper {
    accession_to_entry: FxHashMap<String, String>,
    entry_to_target: FxHashMap<String, String>,
}

impl AccessionMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read both tables.
    ///
    /// The accession map has three columns (`accession`, unused, `entry`);
    /// the benchmark map has two (`target`, `entry`).
    pub fn from_readers<A: BufRead, B: BufRead>(accessions: A, targets: B) -> EvalResult<Self> {
        let mut mapper = Self::new();
        for_each_record(accessions, 3, |_, f| {
            mapper.insert_accession(f[0], f[2]);
            Ok(())
        })?;
        for_each_record(targets, 2, |_, f| {
            mapper.insert_target(f[1], f[0]);
            Ok(())
        })?;
        Ok(mapper)
    }

    /// Read both tables from (optionally gzipped) files
    pub fn load_paths(accessions: &Path, targets: &Path) -> EvalResult<Self> {
        let mapper = Self::from_readers(
            crate::io::open_text(accessions)?,
            crate::io::open_text(targets)?,
        )?;
        tracing::debug!(
            accessions = mapper.accession_to_entry.len(),
            targets = mapper.entry_to_target.len(),
            "accession maps loaded"
        );
        Ok(mapper)
    }

    pub fn insert_accession(&mut self, accession: &str, entry: &str) {
        self.accession_to_entry
            .insert(accession.to_string(), entry.to_string());
    }

    pub fn insert_target(&mut self, entry: &str, target: &str) {
        self.entry_to_target
            .insert(entry.to_string(), target.to_string());
    }

    /// Translate one accession
    pub fn map(&self, accession: &str) -> Option<&str> {
        let entry = self.accession_to_entry.get(accession)?;
        self.entry_to_target.get(entry).map(String::as_str)
    }

    /// Re-key predictions by benchmark target, dropping unmapped proteins
    pub fn remap(&self, predictions: Predictions) -> Predictions {
        let before = predictions.len();
        let mut mapped = Predictions::new();
        for (accession, terms) in predictions.into_entries() {
            if let Some(target) = self.map(&accession) {
                mapped.replace(target, terms);
            }
        }
        tracing::debug!(
            before,
            after = mapped.len(),
            "predictions remapped to benchmark targets"
        );
        mapped
    }
}
