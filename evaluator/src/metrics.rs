//! Threshold-swept precision / recall / F1
//!
//! For each threshold `t` in `0.00, 0.01, …, 1.00`, a prediction counts as
//! retrieved when its confidence is `>= t`. Per protein:
//!
//! ```text
//! precision_i = tp / (retrieved + ε)      recall_i = tp / (relevant + ε)
//! ```
//!
//! Precision is averaged over proteins that retrieved anything, recall over
//! the caller-supplied baseline count (clamped to 1.0).

use std::fmt;

use ndarray::ArrayView1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};
use crate::matrix::{BoolMatrix, ScoreMatrix};

/// Guard against division by zero
pub const EPSILON: f64 = f64::EPSILON;

/// Number of points on every curve
pub const N_THRESHOLDS: usize = 101;

/// Threshold of point `i`
pub fn threshold(i: usize) -> f64 {
    0.01 * i as f64
}

/// One point of the swept curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub threshold: f64,
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
}

impl fmt::Display for CurvePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}\t{:.6}\t{:.6}\t{:.6}",
            self.threshold, self.f1, self.precision, self.recall
        )
    }
}

/// The full 101-point curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    points: Vec<CurvePoint>,
}

impl Curve {
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Point with the highest F1 (earliest threshold on ties)
    pub fn best(&self) -> Option<CurvePoint> {
        self.points
            .iter()
            .copied()
            .fold(None, |best: Option<CurvePoint>, p| match best {
                Some(b) if b.f1 >= p.f1 => Some(b),
                _ => Some(p),
            })
    }

    /// Maximum F1 over all thresholds
    pub fn f1_max(&self) -> f64 {
        self.best().map(|p| p.f1).unwrap_or(0.0)
    }

    /// Tab-separated rendering with a header line
    pub fn to_tsv(&self) -> String {
        let mut out = String::from("threshold\tf1\tprecision\trecall\n");
        for p in &self.points {
            out.push_str(&p.to_string());
            out.push('\n');
        }
        out
    }
}

/// Per-threshold sums over proteins
#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    precision_sum: f64,
    recall_sum: f64,
    n_retrieved: usize,
}

impl Totals {
    fn merge(self, other: Totals) -> Totals {
        Totals {
            precision_sum: self.precision_sum + other.precision_sum,
            recall_sum: self.recall_sum + other.recall_sum,
            n_retrieved: self.n_retrieved + other.n_retrieved,
        }
    }
}

/// Counts for one protein at one threshold
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RowCounts {
    pub true_positive: usize,
    pub retrieved: usize,
    pub relevant: usize,
}

/// Count retrieved, relevant and true-positive columns of one protein
pub fn row_counts(
    truth: ArrayView1<'_, bool>,
    pred: ArrayView1<'_, f64>,
    thr: f64,
) -> RowCounts {
    let mut counts = RowCounts::default();
    for (&relevant, &score) in truth.iter().zip(pred.iter()) {
        let retrieved = score >= thr;
        counts.retrieved += retrieved as usize;
        counts.relevant += relevant as usize;
        counts.true_positive += (relevant && retrieved) as usize;
    }
    counts
}

/// Aggregate precision and recall at a single threshold
pub fn precision_recall_at(
    truth: &BoolMatrix,
    pred: &ScoreMatrix,
    baseline: f64,
    thr: f64,
) -> (f64, f64) {
    let totals = (0..truth.nrows())
        .into_par_iter()
        .map(|i| {
            let c = row_counts(truth.row(i), pred.row(i), thr);
            Totals {
                precision_sum: c.true_positive as f64 / (c.retrieved as f64 + EPSILON),
                recall_sum: c.true_positive as f64 / (c.relevant as f64 + EPSILON),
                n_retrieved: (c.retrieved > 0) as usize,
            }
        })
        .reduce(Totals::default, Totals::merge);

    let precision = if totals.n_retrieved > 0 {
        totals.precision_sum / totals.n_retrieved as f64
    } else {
        0.0
    };
    let recall = if baseline > 0.0 {
        (totals.recall_sum / baseline).min(1.0)
    } else {
        0.0
    };
    (precision, recall)
}

/// Sweep all 101 thresholds.
///
/// `baseline` is the recall denominator chosen by the evaluation mode.
/// Both matrices must share shape and row order.
pub fn precision_recall_curve(
    truth: &BoolMatrix,
    pred: &ScoreMatrix,
    baseline: usize,
) -> EvalResult<Curve> {
    if truth.nrows() != pred.nrows() {
        return Err(EvalError::DimensionMismatch {
            what: "prediction rows",
            expected: truth.nrows(),
            found: pred.nrows(),
        });
    }
    if truth.ncols() != pred.ncols() {
        return Err(EvalError::DimensionMismatch {
            what: "prediction columns",
            expected: truth.ncols(),
            found: pred.ncols(),
        });
    }

    let baseline = baseline as f64;
    let points = (0..N_THRESHOLDS)
        .into_par_iter()
        .map(|i| {
            let thr = threshold(i);
            let (precision, recall) = precision_recall_at(truth, pred, baseline, thr);
            let f1 = 2.0 * (precision * recall) / (precision + recall + EPSILON);
            CurvePoint {
                threshold: thr,
                f1,
                precision,
                recall,
            }
        })
        .collect();

    Ok(Curve { points })
}
