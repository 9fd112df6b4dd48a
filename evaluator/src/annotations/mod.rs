//! Benchmark and prediction annotations
//!
//! Reads protein → term annotations and lays them out as matrices whose
//! columns follow a namespace's term indices. Terms missing from the
//! vocabulary (for example removed as obsolete) or belonging to another
//! namespace are skipped silently.

pub mod mapper;
pub mod reader;

use std::io::BufRead;
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{EvalError, EvalResult};
use crate::matrix::{rows_with_any, BoolMatrix, ScoreMatrix};
use crate::ontology::{Namespace, OntologyGraph};

pub use mapper::AccessionMapper;
use reader::for_each_record;

/// Insertion-ordered protein → values table
#[derive(Debug, Clone)]
struct Ordered<V> {
    entries: Vec<(String, Vec<V>)>,
    index: FxHashMap<String, usize>,
}

impl<V> Default for Ordered<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<V> Ordered<V> {
    fn slot(&mut self, protein: &str) -> &mut Vec<V> {
        let pos = match self.index.get(protein) {
            Some(&pos) => pos,
            None => {
                self.index.insert(protein.to_string(), self.entries.len());
                self.entries.push((protein.to_string(), Vec::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    fn get(&self, protein: &str) -> Option<&[V]> {
        self.index
            .get(protein)
            .map(|&pos| self.entries[pos].1.as_slice())
    }
}

/// Benchmark annotations: protein → term identifiers, in file order
#[derive(Debug, Clone, Default)]
pub struct GroundTruth {
    table: Ordered<String>,
}

impl GroundTruth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `protein` is annotated with `term`
    pub fn insert(&mut self, protein: &str, term: &str) {
        self.table.slot(protein).push(term.to_string());
    }

    /// Read a two-column `protein<TAB>term` listing
    pub fn from_reader<R: BufRead>(reader: R) -> EvalResult<Self> {
        let mut truth = Self::new();
        for_each_record(reader, 2, |_, f| {
            truth.insert(f[0], f[1]);
            Ok(())
        })?;
        Ok(truth)
    }

    /// Read a (optionally gzipped) benchmark file
    pub fn load_path(path: &Path) -> EvalResult<Self> {
        let truth = Self::from_reader(crate::io::open_text(path)?)?;
        tracing::debug!(path = %path.display(), proteins = truth.len(), "benchmark loaded");
        Ok(truth)
    }

    /// Proteins in first-seen order
    pub fn proteins(&self) -> impl Iterator<Item = &str> {
        self.table.entries.iter().map(|(p, _)| p.as_str())
    }

    pub fn terms_of(&self, protein: &str) -> Option<&[String]> {
        self.table.get(protein)
    }

    pub fn len(&self) -> usize {
        self.table.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.entries.is_empty()
    }

    /// Proteins with at least one term of `namespace` in the vocabulary
    pub fn proteins_in(&self, graph: &OntologyGraph, namespace: Namespace) -> Vec<&str> {
        self.table
            .entries
            .iter()
            .filter(|(_, terms)| {
                terms
                    .iter()
                    .any(|t| graph.index_of(namespace, t).is_some())
            })
            .map(|(p, _)| p.as_str())
            .collect()
    }
}

/// Predicted annotations: protein → (term, confidence) pairs
#[derive(Debug, Clone, Default)]
pub struct Predictions {
    table: Ordered<(String, f64)>,
}

impl Predictions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, protein: &str, term: &str, confidence: f64) {
        self.table
            .slot(protein)
            .push((term.to_string(), confidence));
    }

    /// Replace every prediction of `protein`
    pub fn replace(&mut self, protein: &str, terms: Vec<(String, f64)>) {
        *self.table.slot(protein) = terms;
    }

    /// Read a three-column `protein<TAB>term<TAB>confidence` listing.
    ///
    /// Confidences must be finite numbers in `[0, 1]`.
    pub fn from_reader<R: BufRead>(reader: R) -> EvalResult<Self> {
        let mut predictions = Self::new();
        for_each_record(reader, 3, |line, f| {
            let confidence: f64 = f[2].parse().map_err(|_| EvalError::Input {
                line,
                message: format!("invalid confidence {:?}", f[2]),
            })?;
            if !(0.0..=1.0).contains(&confidence) {
                return Err(EvalError::Input {
                    line,
                    message: format!("confidence {} outside [0, 1]", confidence),
                });
            }
            predictions.insert(f[0], f[1], confidence);
            Ok(())
        })?;
        Ok(predictions)
    }

    /// Read a (optionally gzipped) prediction file
    pub fn load_path(path: &Path) -> EvalResult<Self> {
        let predictions = Self::from_reader(crate::io::open_text(path)?)?;
        tracing::debug!(
            path = %path.display(),
            proteins = predictions.len(),
            "predictions loaded"
        );
        Ok(predictions)
    }

    /// Keep only terms of `namespace`; proteins left without terms are dropped
    pub fn retain_namespace(self, graph: &OntologyGraph, namespace: Namespace) -> Self {
        let mut kept = Self::new();
        for (protein, terms) in self.into_entries() {
            let terms: Vec<_> = terms
                .into_iter()
                .filter(|(t, _)| graph.index_of(namespace, t).is_some())
                .collect();
            if !terms.is_empty() {
                kept.replace(&protein, terms);
            }
        }
        kept
    }

    pub fn proteins(&self) -> impl Iterator<Item = &str> {
        self.table.entries.iter().map(|(p, _)| p.as_str())
    }

    pub fn terms_of(&self, protein: &str) -> Option<&[(String, f64)]> {
        self.table.get(protein)
    }

    pub fn contains(&self, protein: &str) -> bool {
        self.table.index.contains_key(protein)
    }

    pub fn len(&self) -> usize {
        self.table.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.entries.is_empty()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, Vec<(String, f64)>)> {
        self.table.entries.into_iter()
    }
}

/// Benchmark proteins of `namespace` that also appear in the predictions
pub fn common_proteins(
    graph: &OntologyGraph,
    namespace: Namespace,
    truth: &GroundTruth,
    predictions: &Predictions,
) -> FxHashSet<String> {
    truth
        .proteins_in(graph, namespace)
        .into_iter()
        .filter(|p| predictions.contains(p))
        .map(str::to_string)
        .collect()
}

/// Ground truth laid out as a boolean matrix
#[derive(Debug, Clone)]
pub struct TruthMatrix {
    /// Benchmark proteins with at least one term in the namespace
    pub n_benchmark: usize,
    /// Row order
    pub proteins: Vec<String>,
    pub matrix: BoolMatrix,
}

/// Build the benchmark matrix for `namespace`.
///
/// `n_benchmark` counts every benchmark protein with a term in the
/// namespace; rows are restricted to proteins in `keep`, in benchmark order.
pub fn truth_matrix(
    graph: &OntologyGraph,
    namespace: Namespace,
    truth: &GroundTruth,
    keep: &FxHashSet<String>,
) -> TruthMatrix {
    let mut n_benchmark = 0;
    let mut skipped = 0usize;
    let mut proteins = Vec::new();
    let mut rows: Vec<Vec<usize>> = Vec::new();

    for (protein, terms) in &truth.table.entries {
        let mut cols = Vec::with_capacity(terms.len());
        for term in terms {
            match graph.index_of(namespace, term) {
                Some(col) => cols.push(col),
                None => skipped += 1,
            }
        }
        if cols.is_empty() {
            continue;
        }
        n_benchmark += 1;
        if keep.contains(protein) {
            proteins.push(protein.clone());
            rows.push(cols);
        }
    }

    let mut matrix = BoolMatrix::default((rows.len(), graph.count(namespace)));
    for (i, cols) in rows.iter().enumerate() {
        for &col in cols {
            matrix[[i, col]] = true;
        }
    }

    tracing::debug!(
        namespace = %namespace,
        n_benchmark,
        rows = proteins.len(),
        skipped_annotations = skipped,
        "benchmark matrix built"
    );

    TruthMatrix {
        n_benchmark,
        proteins,
        matrix,
    }
}

/// Predictions laid out as a confidence matrix
#[derive(Debug, Clone)]
pub struct PredictionMatrix {
    /// Rows that received at least one confidence above zero
    pub n_predicted: usize,
    pub matrix: ScoreMatrix,
}

/// Build the prediction matrix for `namespace`, aligned to `proteins`.
///
/// A term predicted twice for the same protein keeps its last confidence.
pub fn prediction_matrix(
    graph: &OntologyGraph,
    namespace: Namespace,
    predictions: &Predictions,
    proteins: &[String],
) -> PredictionMatrix {
    let mut matrix = ScoreMatrix::zeros((proteins.len(), graph.count(namespace)));
    let mut skipped = 0usize;

    for (row, protein) in proteins.iter().enumerate() {
        let Some(terms) = predictions.terms_of(protein) else {
            continue;
        };
        for (term, confidence) in terms {
            match graph.index_of(namespace, term) {
                Some(col) => matrix[[row, col]] = *confidence,
                None => skipped += 1,
            }
        }
    }

    let n_predicted = rows_with_any(&matrix);
    tracing::debug!(
        namespace = %namespace,
        n_predicted,
        rows = proteins.len(),
        skipped_predictions = skipped,
        "prediction matrix built"
    );

    PredictionMatrix {
        n_predicted,
        matrix,
    }
}
