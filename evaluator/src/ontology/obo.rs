//! OBO term-block parser
//!
//! Streaming parser that yields `[Term]` stanzas as they are read, keeping
//! memory usage proportional to a single stanza. Other stanza types
//! (`[Typedef]`, `[Instance]`) are skipped.
//!
//! # Recognized tags
//!
//! - `id`, `namespace`, `name`
//! - `alt_id` (repeatable)
//! - `is_a` (repeatable, trailing `! comment` discarded)
//! - `relationship: part_of <id>` (only in relation-aware mode)
//! - `is_obsolete: true`
//!
//! Unrecognized tags are ignored.

use std::io::{BufRead, BufReader, Read};

/// Errors raised while reading OBO text
#[derive(Debug, Clone, thiserror::Error)]
pub enum OboParseError {
    #[error("read failed: {message}")]
    Io { line: usize, message: String },

    #[error("unterminated stanza header: {text}")]
    MalformedHeader { line: usize, text: String },

    #[error("[Term] stanza has no id")]
    MissingId { line: usize },
}

impl OboParseError {
    /// Line the error refers to (1-based)
    pub fn line(&self) -> usize {
        match self {
            OboParseError::Io { line, .. }
            | OboParseError::MalformedHeader { line, .. }
            | OboParseError::MissingId { line } => *line,
        }
    }
}

/// A `[Term]` stanza as read from the source, before graph assembly
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTerm {
    /// Primary identifier (e.g. `GO:0008150`)
    pub id: String,
    /// Value of the `namespace:` tag, validated during graph assembly
    pub namespace: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Alternate identifiers
    pub alt_ids: Vec<String>,
    /// Direct is-a parents
    pub is_a: Vec<String>,
    /// Direct part-of parents (empty unless relation-aware)
    pub part_of: Vec<String>,
    /// `is_obsolete: true` was present
    pub is_obsolete: bool,
    /// Line of the `[Term]` header
    pub line: usize,
}

impl RawTerm {
    /// Create a raw term with just an identifier and namespace
    pub fn new(id: impl Into<String>, namespace: impl Into<String>) -> Self {
        RawTerm {
            id: id.into(),
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    /// Add an is-a parent
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.is_a.push(parent.into());
        self
    }
}

/// OBO parser
#[derive(Debug, Clone, Default)]
pub struct OboParser {
    /// Collect `relationship: part_of` edges
    relation_aware: bool,
}

impl OboParser {
    /// Create a parser that only follows is-a edges
    pub fn new() -> Self {
        Self::default()
    }

    /// Also collect part-of relationships
    pub fn with_relations(mut self, relation_aware: bool) -> Self {
        self.relation_aware = relation_aware;
        self
    }

    /// Parse from a reader, yielding terms incrementally
    pub fn parse<'a, R: Read + 'a>(
        &'a self,
        reader: R,
    ) -> impl Iterator<Item = Result<RawTerm, OboParseError>> + 'a {
        OboIterator::new(BufReader::new(reader), self)
    }

    /// Parse an in-memory document
    pub fn parse_str(&self, content: &str) -> Result<Vec<RawTerm>, OboParseError> {
        self.parse(content.as_bytes()).collect()
    }
}

/// Accumulated data for the stanza being read
#[derive(Default)]
struct Stanza {
    is_term: bool,
    line: usize,
    id: Option<String>,
    namespace: Option<String>,
    name: Option<String>,
    alt_ids: Vec<String>,
    is_a: Vec<String>,
    part_of: Vec<String>,
    is_obsolete: bool,
}

struct OboIterator<'a, R: BufRead> {
    reader: R,
    parser: &'a OboParser,
    line_number: usize,
    current: Option<Stanza>,
    line_buffer: String,
    finished: bool,
}

impl<'a, R: BufRead> OboIterator<'a, R> {
    fn new(reader: R, parser: &'a OboParser) -> Self {
        Self {
            reader,
            parser,
            line_number: 0,
            current: None,
            line_buffer: String::new(),
            finished: false,
        }
    }

    fn tag_value(&mut self, tag: &str, value: &str) {
        let relation_aware = self.parser.relation_aware;
        let Some(stanza) = self.current.as_mut() else {
            // header tags (format-version, ontology, ...)
            return;
        };
        if !stanza.is_term {
            return;
        }

        match tag {
            "id" => stanza.id = Some(value.to_string()),
            "namespace" => stanza.namespace = Some(value.to_string()),
            "name" => stanza.name = Some(value.to_string()),
            "alt_id" => {
                if let Some(alt) = first_token(value) {
                    stanza.alt_ids.push(alt.to_string());
                }
            }
            "is_a" => {
                if let Some(parent) = first_token(value) {
                    stanza.is_a.push(parent.to_string());
                }
            }
            "relationship" if relation_aware => {
                let mut parts = value.split_whitespace();
                if parts.next() == Some("part_of")
                    && let Some(target) = parts.next()
                {
                    stanza.part_of.push(target.to_string());
                }
            }
            "is_obsolete" => stanza.is_obsolete = value == "true",
            _ => {}
        }
    }

    /// Close the current stanza, returning it if it was a term
    fn finalize(&mut self) -> Option<Result<RawTerm, OboParseError>> {
        let stanza = self.current.take()?;
        if !stanza.is_term {
            return None;
        }
        let Some(id) = stanza.id else {
            return Some(Err(OboParseError::MissingId { line: stanza.line }));
        };

        Some(Ok(RawTerm {
            id,
            namespace: stanza.namespace,
            name: stanza.name,
            alt_ids: stanza.alt_ids,
            is_a: stanza.is_a,
            part_of: stanza.part_of,
            is_obsolete: stanza.is_obsolete,
            line: stanza.line,
        }))
    }
}

impl<'a, R: BufRead> Iterator for OboIterator<'a, R> {
    type Item = Result<RawTerm, OboParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            self.line_buffer.clear();
            match self.reader.read_line(&mut self.line_buffer) {
                Ok(0) => {
                    self.finished = true;
                    return self.finalize();
                }
                Ok(_) => {
                    self.line_number += 1;
                    let line = self.line_buffer.trim().to_string();

                    if line.is_empty() || line.starts_with('!') {
                        continue;
                    }

                    if line.starts_with('[') {
                        if !line.ends_with(']') {
                            self.finished = true;
                            return Some(Err(OboParseError::MalformedHeader {
                                line: self.line_number,
                                text: line,
                            }));
                        }
                        let previous = self.finalize();
                        self.current = Some(Stanza {
                            is_term: &line[1..line.len() - 1] == "Term",
                            line: self.line_number,
                            ..Default::default()
                        });
                        if let Some(item) = previous {
                            if item.is_err() {
                                self.finished = true;
                            }
                            return Some(item);
                        }
                        continue;
                    }

                    if let Some((tag, value)) = line.split_once(':') {
                        self.tag_value(tag.trim(), value.trim());
                    }
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(OboParseError::Io {
                        line: self.line_number + 1,
                        message: e.to_string(),
                    }));
                }
            }
        }
    }
}

fn first_token(value: &str) -> Option<&str> {
    value.split_whitespace().next()
}
