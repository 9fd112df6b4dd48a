//! Protein function prediction scoring
//!
//! Scores predicted Gene Ontology annotations against a curated benchmark:
//!
//! - Parses the OBO vocabulary into a DAG with dense per-namespace indices
//! - Computes and caches each term's strict, non-root ancestor closure
//! - Propagates annotation scores upward under a max rule
//! - Sweeps a confidence threshold to produce a precision/recall/F1 curve
//!
//! # Architecture
//!
//! ```text
//! OBO → OntologyGraph → AncestorClosure (cached) → propagate → curve
//!                    ↘ annotation matrices ↗
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use annoteval::{EvalConfig, Evaluator, GroundTruth, Namespace, OntologyGraph, Predictions};
//!
//! let config = EvalConfig::default();
//! let go = OntologyGraph::load_path("go.obo.gz".as_ref(), config.ontology)?;
//! let evaluator = Evaluator::new(Arc::new(go), &config)?;
//!
//! let truth = GroundTruth::load_path("benchmark.tsv.gz".as_ref())?;
//! let preds = Predictions::load_path("predictions.tsv".as_ref())?;
//! let result = evaluator.all_scores(&preds, "full", Namespace::BiologicalProcess, &truth)?;
//! println!("Fmax = {:.3}", result.f1_max());
//! ```

pub mod annotations;
pub mod closure;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod io;
pub mod matrix;
pub mod metrics;
pub mod ontology;
pub mod propagate;

pub use annotations::{AccessionMapper, GroundTruth, Predictions};
pub use closure::{AncestorClosure, ClosureCache};
pub use config::EvalConfig;
pub use error::{EvalError, EvalResult};
pub use evaluator::{Evaluation, EvaluationMode, Evaluator};
pub use matrix::{AnnotationMatrix, BoolMatrix, Score, ScoreMatrix};
pub use metrics::{precision_recall_curve, Curve, CurvePoint};
pub use ontology::{LoadOptions, Namespace, OntologyGraph, Term};
pub use propagate::propagate;
