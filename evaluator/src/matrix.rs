//! Dense protein-by-term annotation matrices
//!
//! Rows are proteins in a caller-defined stable order, columns are the term
//! indices of one namespace. Ground truth uses [`BoolMatrix`], predictions
//! use [`ScoreMatrix`].

use ndarray::Array2;

/// Value stored in an annotation matrix
pub trait Score: Copy + Default + PartialOrd + Send + Sync {
    /// Whether the entry counts as annotated
    fn is_set(&self) -> bool;
}

impl Score for bool {
    fn is_set(&self) -> bool {
        *self
    }
}

impl Score for f64 {
    fn is_set(&self) -> bool {
        *self != 0.0
    }
}

impl Score for f32 {
    fn is_set(&self) -> bool {
        *self != 0.0
    }
}

/// Protein × term matrix
pub type AnnotationMatrix<T> = Array2<T>;

/// Ground-truth presence matrix
pub type BoolMatrix = Array2<bool>;

/// Prediction confidence matrix
pub type ScoreMatrix = Array2<f64>;

/// Build from row vectors; `None` unless every row has `cols` entries
pub fn from_rows<T: Score>(cols: usize, rows: Vec<Vec<T>>) -> Option<Array2<T>> {
    let n = rows.len();
    if rows.iter().any(|row| row.len() != cols) {
        return None;
    }
    Array2::from_shape_vec((n, cols), rows.into_iter().flatten().collect()).ok()
}

/// Number of rows with at least one set entry
pub fn rows_with_any<T: Score>(matrix: &Array2<T>) -> usize {
    matrix
        .rows()
        .into_iter()
        .filter(|row| row.iter().any(Score::is_set))
        .count()
}
