//! Gene Ontology vocabulary
//!
//! Parses OBO term blocks into an immutable [`OntologyGraph`] and assigns
//! every term a dense, per-namespace column index.
//!
//! # Architecture
//!
//! ```text
//! OBO text → OboParser (RawTerm stream) → OntologyGraph (arena + indices)
//! ```
//!
//! The graph is built once by the driver and shared read-only by every
//! later stage.

pub mod graph;
pub mod obo;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

pub use graph::{LoadOptions, OntologyGraph, Term, TermId};
pub use obo::{OboParseError, OboParser, RawTerm};

/// Root term of the biological process namespace
pub const BIOLOGICAL_PROCESS: &str = "GO:0008150";
/// Root term of the molecular function namespace
pub const MOLECULAR_FUNCTION: &str = "GO:0003674";
/// Root term of the cellular component namespace
pub const CELLULAR_COMPONENT: &str = "GO:0005575";

/// The three fixed roots, never reported as ancestors
pub const ROOT_TERMS: [&str; 3] = [BIOLOGICAL_PROCESS, MOLECULAR_FUNCTION, CELLULAR_COMPONENT];

/// One of the three sub-ontologies partitioning the vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    BiologicalProcess,
    MolecularFunction,
    CellularComponent,
}

impl Namespace {
    /// All namespaces in a fixed order
    pub const ALL: [Namespace; 3] = [
        Namespace::BiologicalProcess,
        Namespace::MolecularFunction,
        Namespace::CellularComponent,
    ];

    /// Canonical name as written in the `namespace:` tag
    pub fn name(&self) -> &'static str {
        match self {
            Namespace::BiologicalProcess => "biological_process",
            Namespace::MolecularFunction => "molecular_function",
            Namespace::CellularComponent => "cellular_component",
        }
    }

    /// Two-letter abbreviation
    pub fn short_name(&self) -> &'static str {
        match self {
            Namespace::BiologicalProcess => "bp",
            Namespace::MolecularFunction => "mf",
            Namespace::CellularComponent => "cc",
        }
    }

    /// Identifier of the namespace root term
    pub fn root_id(&self) -> &'static str {
        match self {
            Namespace::BiologicalProcess => BIOLOGICAL_PROCESS,
            Namespace::MolecularFunction => MOLECULAR_FUNCTION,
            Namespace::CellularComponent => CELLULAR_COMPONENT,
        }
    }

    /// Position in [`Namespace::ALL`], used to address per-namespace tables
    pub(crate) fn slot(&self) -> usize {
        match self {
            Namespace::BiologicalProcess => 0,
            Namespace::MolecularFunction => 1,
            Namespace::CellularComponent => 2,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Namespace {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "biological_process" | "bp" => Ok(Namespace::BiologicalProcess),
            "molecular_function" | "mf" => Ok(Namespace::MolecularFunction),
            "cellular_component" | "cc" => Ok(Namespace::CellularComponent),
            other => Err(EvalError::UnknownNamespace(other.to_string())),
        }
    }
}

/// Check whether `id` is one of the three namespace roots
pub fn is_root(id: &str) -> bool {
    ROOT_TERMS.contains(&id)
}
