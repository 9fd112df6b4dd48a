//! Ontology graph with dense per-namespace indices
//!
//! Terms live in an arena addressed by [`TermId`]. Parent and child edges are
//! stored as arena index lists, and every surviving term also carries its
//! column index inside its namespace. Column order is the order in which
//! terms were first encountered in the source, not lexical order.

use std::collections::VecDeque;
use std::io::Read;
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::obo::{OboParser, RawTerm};
use super::Namespace;
use crate::error::{EvalError, EvalResult};

/// Arena index of a term
pub type TermId = usize;

/// Options controlling how the vocabulary is assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Follow `relationship: part_of` edges in addition to is-a
    pub relation_aware: bool,
    /// Drop terms flagged `is_obsolete: true`
    pub remove_obsolete: bool,
    /// Register `alt_id` values as aliases of their primary term
    pub include_alt_ids: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            relation_aware: true,
            remove_obsolete: true,
            include_alt_ids: false,
        }
    }
}

impl LoadOptions {
    /// Only is-a edges, obsolete terms removed, no aliases
    pub fn is_a_only() -> Self {
        Self {
            relation_aware: false,
            ..Self::default()
        }
    }

    pub fn with_relations(mut self, relation_aware: bool) -> Self {
        self.relation_aware = relation_aware;
        self
    }

    pub fn with_obsolete_removal(mut self, remove_obsolete: bool) -> Self {
        self.remove_obsolete = remove_obsolete;
        self
    }

    pub fn with_alt_ids(mut self, include_alt_ids: bool) -> Self {
        self.include_alt_ids = include_alt_ids;
        self
    }
}

/// A vocabulary term
#[derive(Debug, Clone)]
pub struct Term {
    /// Primary identifier
    pub id: String,
    /// Namespace, fixed at parse time
    pub namespace: Namespace,
    /// Display name
    pub name: Option<String>,
    /// Alternate identifiers
    pub alt_ids: Vec<String>,
    /// Direct is-a parent identifiers as written in the source
    pub is_a: Vec<String>,
    /// Direct part-of parent identifiers (empty unless relation-aware)
    pub part_of: Vec<String>,
    /// Obsolete flag (only ever true when obsolete filtering is disabled)
    pub is_obsolete: bool,
    /// Column index inside the namespace
    pub index: usize,
    /// Resolved is-a parents
    parents: Vec<TermId>,
    /// Resolved part-of parents
    part_of_parents: Vec<TermId>,
    /// Inverse of the resolved is-a edges
    children: Vec<TermId>,
}

impl Term {
    /// Resolved is-a parents
    pub fn parents(&self) -> &[TermId] {
        &self.parents
    }

    /// Resolved part-of parents
    pub fn part_of_parents(&self) -> &[TermId] {
        &self.part_of_parents
    }

    /// Direct children (inverse of is-a)
    pub fn children(&self) -> &[TermId] {
        &self.children
    }

    /// True when no surviving term names this one as an is-a parent
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// The vocabulary DAG
#[derive(Debug, Clone)]
pub struct OntologyGraph {
    terms: Vec<Term>,
    lookup: FxHashMap<String, TermId>,
    /// Per-namespace column → arena index
    columns: [Vec<TermId>; 3],
    leaves: Vec<TermId>,
    options: LoadOptions,
}

impl OntologyGraph {
    /// Parse OBO text
    pub fn load(source: &str, options: LoadOptions) -> EvalResult<Self> {
        Self::from_reader(source.as_bytes(), options)
    }

    /// Parse OBO text from any reader
    pub fn from_reader<R: Read>(reader: R, options: LoadOptions) -> EvalResult<Self> {
        let parser = OboParser::new().with_relations(options.relation_aware);
        let raw = parser.parse(reader).collect::<Result<Vec<_>, _>>()?;
        Self::from_raw_terms(raw, options)
    }

    /// Parse an OBO file, decompressing `.gz` sources on the fly
    pub fn load_path(path: &Path, options: LoadOptions) -> EvalResult<Self> {
        let reader = crate::io::open_text(path)?;
        let graph = Self::from_reader(reader, options)?;
        tracing::info!(path = %path.display(), "ontology loaded");
        Ok(graph)
    }

    /// Assemble the graph from parsed term blocks
    pub fn from_raw_terms(
        raw: impl IntoIterator<Item = RawTerm>,
        options: LoadOptions,
    ) -> EvalResult<Self> {
        // Later duplicates replace earlier blocks but keep their position.
        let mut ordered: Vec<RawTerm> = Vec::new();
        let mut position: FxHashMap<String, usize> = FxHashMap::default();
        for term in raw {
            match position.get(&term.id) {
                Some(&pos) => ordered[pos] = term,
                None => {
                    position.insert(term.id.clone(), ordered.len());
                    ordered.push(term);
                }
            }
        }

        let mut terms = Vec::with_capacity(ordered.len());
        let mut lookup = FxHashMap::default();
        let mut columns: [Vec<TermId>; 3] = Default::default();
        let mut removed = 0usize;

        for raw in ordered {
            if options.remove_obsolete && raw.is_obsolete {
                removed += 1;
                continue;
            }
            let namespace = match raw.namespace.as_deref() {
                Some(ns) => ns.parse::<Namespace>().map_err(|_| EvalError::MalformedSource {
                    line: raw.line,
                    message: format!("term {} has unknown namespace {:?}", raw.id, ns),
                })?,
                None => {
                    return Err(EvalError::MalformedSource {
                        line: raw.line,
                        message: format!("term {} has no namespace", raw.id),
                    })
                }
            };

            let tid = terms.len();
            let column = &mut columns[namespace.slot()];
            lookup.insert(raw.id.clone(), tid);
            terms.push(Term {
                id: raw.id,
                namespace,
                name: raw.name,
                alt_ids: raw.alt_ids,
                is_a: raw.is_a,
                part_of: raw.part_of,
                is_obsolete: raw.is_obsolete,
                index: column.len(),
                parents: Vec::new(),
                part_of_parents: Vec::new(),
                children: Vec::new(),
            });
            column.push(tid);
        }

        if options.include_alt_ids {
            for (tid, term) in terms.iter().enumerate() {
                for alt in &term.alt_ids {
                    lookup.entry(alt.clone()).or_insert(tid);
                }
            }
        }

        // Parent references to removed or unknown terms register no edge.
        for tid in 0..terms.len() {
            let parents = resolve(&lookup, &terms[tid].is_a);
            let part_of = if options.relation_aware {
                resolve(&lookup, &terms[tid].part_of)
            } else {
                Vec::new()
            };
            for &parent in &parents {
                terms[parent].children.push(tid);
            }
            terms[tid].parents = parents;
            terms[tid].part_of_parents = part_of;
        }

        let leaves = terms
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_leaf())
            .map(|(tid, _)| tid)
            .collect();

        let graph = Self {
            terms,
            lookup,
            columns,
            leaves,
            options,
        };

        tracing::debug!(
            terms = graph.terms.len(),
            obsolete_removed = removed,
            biological_process = graph.count(Namespace::BiologicalProcess),
            molecular_function = graph.count(Namespace::MolecularFunction),
            cellular_component = graph.count(Namespace::CellularComponent),
            leaves = graph.leaves.len(),
            "ontology graph assembled"
        );

        Ok(graph)
    }

    /// Options the graph was built with
    pub fn options(&self) -> LoadOptions {
        self.options
    }

    /// Number of distinct terms (aliases not counted)
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Resolve an identifier (or alias) to its arena index
    pub fn resolve(&self, id: &str) -> Option<TermId> {
        self.lookup.get(id).copied()
    }

    /// Look up a term by identifier (or alias)
    pub fn term(&self, id: &str) -> Option<&Term> {
        self.resolve(id).map(|tid| &self.terms[tid])
    }

    /// Term at an arena index
    pub fn get(&self, tid: TermId) -> &Term {
        &self.terms[tid]
    }

    /// All terms in arena order
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter()
    }

    /// Number of terms in a namespace (the column width of its matrices)
    pub fn count(&self, namespace: Namespace) -> usize {
        self.columns[namespace.slot()].len()
    }

    /// Column of `id` within `namespace`; `None` if unknown or in another namespace
    pub fn index_of(&self, namespace: Namespace, id: &str) -> Option<usize> {
        self.term(id)
            .filter(|t| t.namespace == namespace)
            .map(|t| t.index)
    }

    /// Term occupying column `index` of `namespace`
    pub fn term_at(&self, namespace: Namespace, index: usize) -> Option<&Term> {
        self.columns[namespace.slot()]
            .get(index)
            .map(|&tid| &self.terms[tid])
    }

    /// Arena indices of a namespace in column order
    pub fn namespace_columns(&self, namespace: Namespace) -> &[TermId] {
        &self.columns[namespace.slot()]
    }

    /// Identifiers of every term in a namespace
    pub fn get_namespace_terms(&self, namespace: Namespace) -> FxHashSet<&str> {
        self.namespace_columns(namespace)
            .iter()
            .map(|&tid| self.terms[tid].id.as_str())
            .collect()
    }

    /// Identifiers of terms with no children
    pub fn leaves(&self) -> Vec<&str> {
        self.leaves
            .iter()
            .map(|&tid| self.terms[tid].id.as_str())
            .collect()
    }

    /// Direct is-a parents united with direct children
    pub fn get_blanket(&self, id: &str) -> FxHashSet<&str> {
        let Some(term) = self.term(id) else {
            return FxHashSet::default();
        };
        term.is_a
            .iter()
            .map(String::as_str)
            .chain(term.children.iter().map(|&c| self.terms[c].id.as_str()))
            .collect()
    }

    /// Edges followed upward from `tid`
    fn upward(&self, tid: TermId) -> impl Iterator<Item = TermId> + '_ {
        let term = &self.terms[tid];
        term.parents
            .iter()
            .chain(term.part_of_parents.iter())
            .copied()
    }

    /// Whether the term declares any parent at all, resolvable or not
    fn declares_parents(&self, tid: TermId) -> bool {
        let term = &self.terms[tid];
        !term.is_a.is_empty() || (self.options.relation_aware && !term.part_of.is_empty())
    }

    /// Every upward path from `id` to a top-level term.
    ///
    /// Each path starts at the term itself and ends at a term without
    /// parents. A parentless term yields a single one-element path. A
    /// branch that runs into a parent missing from the graph yields no path.
    /// The number of paths grows multiplicatively with multi-parent terms;
    /// use [`OntologyGraph::ancestor_set`] when only reachability matters.
    pub fn get_ancestors(&self, id: &str) -> Vec<Vec<String>> {
        let Some(tid) = self.resolve(id) else {
            return Vec::new();
        };
        let mut on_path = FxHashSet::default();
        self.paths_from(tid, &mut on_path)
            .into_iter()
            .map(|path| path.into_iter().map(|t| self.terms[t].id.clone()).collect())
            .collect()
    }

    fn paths_from(&self, tid: TermId, on_path: &mut FxHashSet<TermId>) -> Vec<Vec<TermId>> {
        if !self.declares_parents(tid) {
            return vec![vec![tid]];
        }
        on_path.insert(tid);
        let mut branches = Vec::new();
        for parent in self.upward(tid) {
            if on_path.contains(&parent) {
                continue;
            }
            for upper in self.paths_from(parent, on_path) {
                let mut path = Vec::with_capacity(upper.len() + 1);
                path.push(tid);
                path.extend(upper);
                branches.push(path);
            }
        }
        on_path.remove(&tid);
        branches
    }

    /// All terms reachable upward from `tid`, excluding `tid` itself.
    ///
    /// Breadth-first over is-a (and, if relation-aware, part-of) edges with
    /// a visited set; linear in the size of the ancestor subgraph.
    pub fn ancestor_set(&self, tid: TermId) -> Vec<TermId> {
        let mut visited = FxHashSet::default();
        visited.insert(tid);
        let mut queue: VecDeque<TermId> = self.upward(tid).collect();
        let mut ancestors = Vec::new();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            ancestors.push(current);
            queue.extend(self.upward(current));
        }

        ancestors
    }
}

fn resolve(lookup: &FxHashMap<String, TermId>, ids: &[String]) -> Vec<TermId> {
    let mut resolved: Vec<TermId> = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(&tid) = lookup.get(id) {
            if !resolved.contains(&tid) {
                resolved.push(tid);
            }
        }
    }
    resolved
}
