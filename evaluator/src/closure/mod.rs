//! Ancestor closure per namespace
//!
//! For every term column `i` of a namespace, the closure records the set of
//! columns `k` that are strict ancestors of `i` over is-a (and, in
//! relation-aware graphs, part-of) edges. The term itself and the three
//! namespace roots are never recorded. Ancestors that fall outside the
//! namespace are dropped.
//!
//! The matrix is square and boolean, stored row-compressed: each row is a
//! sorted list of ancestor columns.

pub mod cache;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};
use crate::ontology::{is_root, Namespace, OntologyGraph};

pub use cache::ClosureCache;

/// Boolean (term × term) ancestor matrix for one namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorClosure {
    namespace: Namespace,
    /// `offsets[i]..offsets[i + 1]` indexes row `i` in `ancestors`
    offsets: Vec<usize>,
    ancestors: Vec<u32>,
}

impl AncestorClosure {
    /// Compute the closure of every term in `namespace`
    pub fn build(graph: &OntologyGraph, namespace: Namespace) -> Self {
        let start = std::time::Instant::now();
        let rows: Vec<Vec<u32>> = graph
            .namespace_columns(namespace)
            .par_iter()
            .map(|&tid| {
                let mut row: Vec<u32> = graph
                    .ancestor_set(tid)
                    .into_iter()
                    .map(|a| graph.get(a))
                    .filter(|a| a.namespace == namespace && !is_root(&a.id))
                    .map(|a| a.index as u32)
                    .collect();
                row.sort_unstable();
                row.dedup();
                row
            })
            .collect();

        let closure = Self::pack(namespace, rows);
        tracing::info!(
            namespace = %namespace,
            terms = closure.len(),
            entries = closure.entry_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ancestor closure built"
        );
        closure
    }

    /// Assemble from per-term ancestor column lists.
    ///
    /// Rows are sorted and deduplicated. A row that lists its own column or
    /// a column outside `0..rows.len()` is rejected.
    pub fn from_rows(namespace: Namespace, rows: Vec<Vec<u32>>) -> EvalResult<Self> {
        let closure = Self::pack(namespace, rows);
        closure.validate().map_err(EvalError::InvalidClosure)?;
        Ok(closure)
    }

    fn pack(namespace: Namespace, rows: Vec<Vec<u32>>) -> Self {
        let mut offsets = Vec::with_capacity(rows.len() + 1);
        let mut ancestors = Vec::with_capacity(rows.iter().map(Vec::len).sum());
        offsets.push(0);
        for mut row in rows {
            row.sort_unstable();
            row.dedup();
            ancestors.extend(row);
            offsets.push(ancestors.len());
        }
        Self {
            namespace,
            offsets,
            ancestors,
        }
    }

    /// Check the row-compressed layout.
    ///
    /// Offsets start at zero, never decrease and end at the entry count.
    /// Each row is strictly increasing, stays below `len()` and never names
    /// its own column.
    pub(crate) fn validate(&self) -> Result<(), String> {
        let (Some(&first), Some(&last)) = (self.offsets.first(), self.offsets.last()) else {
            return Err("no row offsets".to_string());
        };
        if first != 0 || last != self.ancestors.len() {
            return Err(format!(
                "row offsets span {}..{}, expected 0..{}",
                first,
                last,
                self.ancestors.len()
            ));
        }
        if let Some(row) = self.offsets.windows(2).position(|w| w[0] > w[1]) {
            return Err(format!("row offsets decrease at row {}", row));
        }

        let n = self.len();
        for i in 0..n {
            let row = self.ancestors_of(i);
            if let Some(&k) = row.iter().find(|&&k| k as usize >= n) {
                return Err(format!("row {} lists column {} outside 0..{}", i, k, n));
            }
            if row.windows(2).any(|w| w[0] >= w[1]) {
                return Err(format!("row {} is not strictly increasing", i));
            }
            if row.contains(&(i as u32)) {
                return Err(format!("row {} lists itself as an ancestor", i));
            }
        }
        Ok(())
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Number of terms (rows and columns)
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `true` entries
    pub fn entry_count(&self) -> usize {
        self.ancestors.len()
    }

    /// Sorted ancestor columns of term `i`
    pub fn ancestors_of(&self, i: usize) -> &[u32] {
        &self.ancestors[self.offsets[i]..self.offsets[i + 1]]
    }

    /// Entry `(i, k)`: is `k` a strict, non-root ancestor of `i`
    pub fn contains(&self, i: usize, k: usize) -> bool {
        i < self.len() && self.ancestors_of(i).binary_search(&(k as u32)).is_ok()
    }

    /// Expand to a dense boolean matrix
    pub fn to_dense(&self) -> Vec<Vec<bool>> {
        (0..self.len())
            .map(|i| {
                let mut row = vec![false; self.len()];
                for &k in self.ancestors_of(i) {
                    row[k as usize] = true;
                }
                row
            })
            .collect()
    }
}
