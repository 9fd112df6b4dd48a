//! Upward propagation of annotation scores
//!
//! Annotating a specific term implies every more general term holds with
//! at least the same confidence. For every row and every set column `j`,
//! each ancestor column `k` becomes `max(m[k], m[j])`.
//!
//! Rows are independent, so they are processed in parallel with exclusive
//! access to their own slice.

use ndarray::{ArrayViewMut1, Axis};
use rayon::prelude::*;

use crate::closure::AncestorClosure;
use crate::error::{EvalError, EvalResult};
use crate::matrix::{AnnotationMatrix, Score};

/// Propagate every row of `matrix` to the ancestors recorded in `closure`.
///
/// Mutates in place. Callers that still need the unpropagated values must
/// clone the matrix first.
pub fn propagate<T: Score>(
    matrix: &mut AnnotationMatrix<T>,
    closure: &AncestorClosure,
) -> EvalResult<()> {
    if matrix.ncols() != closure.len() {
        return Err(EvalError::DimensionMismatch {
            what: "ancestor closure",
            expected: matrix.ncols(),
            found: closure.len(),
        });
    }

    matrix
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .for_each(|row| propagate_row(row, closure));

    Ok(())
}

/// Propagate a single row
pub fn propagate_row<T: Score>(mut row: ArrayViewMut1<'_, T>, closure: &AncestorClosure) {
    // Snapshot the annotated columns and their pre-propagation values; the
    // closure is transitive, so pushing original values reaches the same
    // fixpoint as pushing updated ones.
    let annotated: Vec<(usize, T)> = row
        .indexed_iter()
        .filter(|(_, v)| v.is_set())
        .map(|(j, v)| (j, *v))
        .collect();

    for (j, value) in annotated {
        for &k in closure.ancestors_of(j) {
            let slot = &mut row[k as usize];
            if value > *slot {
                *slot = value;
            }
        }
    }
}
