//! End-to-end scoring pipeline
//!
//! ```text
//! GroundTruth ─┐                      ┌─ propagate ─┐
//!              ├─ common proteins ─▶ matrices      ├─ clear root ─▶ curve
//! Predictions ─┘                      └─ propagate ─┘
//!                      ▲
//!           AncestorClosure (cache)
//! ```
//!
//! The graph is built once by the caller and shared through an [`Arc`];
//! all numeric work runs on a dedicated rayon pool after every input has
//! been read.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::annotations::{
    common_proteins, prediction_matrix, truth_matrix, GroundTruth, Predictions,
};
use crate::closure::{AncestorClosure, ClosureCache};
use crate::config::EvalConfig;
use crate::error::{EvalError, EvalResult};
use crate::matrix::{BoolMatrix, ScoreMatrix};
use crate::metrics::{precision_recall_curve, Curve};
use crate::ontology::{Namespace, OntologyGraph};
use crate::propagate::propagate;

/// Recall denominator policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationMode {
    /// Every benchmark protein counts
    Full,
    /// Only proteins that received a prediction count
    Partial,
}

impl EvaluationMode {
    pub fn name(&self) -> &'static str {
        match self {
            EvaluationMode::Full => "full",
            EvaluationMode::Partial => "partial",
        }
    }

    /// Choose the recall denominator
    pub fn baseline(&self, n_benchmark: usize, n_predicted: usize) -> usize {
        match self {
            EvaluationMode::Full => n_benchmark,
            EvaluationMode::Partial => n_predicted,
        }
    }
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EvaluationMode {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "full" => Ok(EvaluationMode::Full),
            "partial" => Ok(EvaluationMode::Partial),
            other => Err(EvalError::InvalidMode(other.to_string())),
        }
    }
}

/// Result of scoring one prediction set
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub namespace: Namespace,
    pub mode: EvaluationMode,
    /// Benchmark proteins with a term in the namespace
    pub n_benchmark: usize,
    /// Scored proteins that received a non-zero prediction
    pub n_predicted: usize,
    /// Rows in the scored matrices
    pub n_proteins: usize,
    pub curve: Curve,
}

impl Evaluation {
    pub fn f1_max(&self) -> f64 {
        self.curve.f1_max()
    }
}

/// Scores predictions against a benchmark
pub struct Evaluator {
    graph: Arc<OntologyGraph>,
    cache: ClosureCache,
    pool: rayon::ThreadPool,
}

impl Evaluator {
    pub fn new(graph: Arc<OntologyGraph>, config: &EvalConfig) -> EvalResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallelism)
            .thread_name(|i| format!("annoteval-{}", i))
            .build()
            .map_err(|e| EvalError::Config(format!("Failed to start worker pool: {}", e)))?;

        Ok(Self {
            graph,
            cache: ClosureCache::new(&config.cache_dir),
            pool,
        })
    }

    pub fn graph(&self) -> &OntologyGraph {
        &self.graph
    }

    pub fn cache(&self) -> &ClosureCache {
        &self.cache
    }

    /// Build any missing ancestor caches
    pub fn prepare_cache(&self, namespaces: &[Namespace]) -> EvalResult<Vec<Namespace>> {
        self.pool
            .install(|| self.cache.ensure_cached(&self.graph, namespaces))
    }

    /// Cached closure of `namespace`, built on demand
    pub fn closure(&self, namespace: Namespace) -> EvalResult<AncestorClosure> {
        self.pool
            .install(|| self.cache.load_or_build(&self.graph, namespace))
    }

    /// Score `predictions` against `truth` in `namespace`.
    ///
    /// `mode` must be `"full"` or `"partial"`; it is checked before any
    /// matrix is built.
    pub fn all_scores(
        &self,
        predictions: &Predictions,
        mode: &str,
        namespace: Namespace,
        truth: &GroundTruth,
    ) -> EvalResult<Evaluation> {
        let mode: EvaluationMode = mode.parse()?;
        self.evaluate(predictions, mode, namespace, truth)
    }

    /// Maximum F1 over the threshold sweep
    pub fn f1max_score(
        &self,
        predictions: &Predictions,
        mode: &str,
        namespace: Namespace,
        truth: &GroundTruth,
    ) -> EvalResult<f64> {
        Ok(self
            .all_scores(predictions, mode, namespace, truth)?
            .f1_max())
    }

    /// Typed-mode variant of [`Evaluator::all_scores`]
    pub fn evaluate(
        &self,
        predictions: &Predictions,
        mode: EvaluationMode,
        namespace: Namespace,
        truth: &GroundTruth,
    ) -> EvalResult<Evaluation> {
        let common = common_proteins(&self.graph, namespace, truth, predictions);
        let truth = truth_matrix(&self.graph, namespace, truth, &common);
        let pred = prediction_matrix(&self.graph, namespace, predictions, &truth.proteins);

        let closure = self.closure(namespace)?;
        let baseline = mode.baseline(truth.n_benchmark, pred.n_predicted);

        tracing::info!(
            namespace = %namespace,
            mode = %mode,
            proteins = truth.proteins.len(),
            n_benchmark = truth.n_benchmark,
            n_predicted = pred.n_predicted,
            baseline,
            "scoring predictions"
        );

        let n_proteins = truth.proteins.len();
        let curve = self.score_matrices(truth.matrix, pred.matrix, &closure, baseline)?;

        Ok(Evaluation {
            namespace,
            mode,
            n_benchmark: truth.n_benchmark,
            n_predicted: pred.n_predicted,
            n_proteins,
            curve,
        })
    }

    /// Propagate both matrices, drop the namespace root and sweep thresholds
    pub fn score_matrices(
        &self,
        mut truth: BoolMatrix,
        mut pred: ScoreMatrix,
        closure: &AncestorClosure,
        baseline: usize,
    ) -> EvalResult<Curve> {
        let start = Instant::now();
        let namespace = closure.namespace();

        let curve = self.pool.install(|| {
            propagate(&mut truth, closure)?;
            propagate(&mut pred, closure)?;

            if let Some(root) = self.graph.index_of(namespace, namespace.root_id()) {
                truth.column_mut(root).fill(false);
                pred.column_mut(root).fill(0.0);
            }

            precision_recall_curve(&truth, &pred, baseline)
        })?;

        tracing::debug!(
            namespace = %namespace,
            elapsed_ms = start.elapsed().as_millis() as u64,
            f1_max = curve.f1_max(),
            "curve computed"
        );
        Ok(curve)
    }
}
