//! Query string parsing.
//!
//! A raw query is either free text or field-qualified text:
//!
//! - `rust compiler`: free text, searched in `title` and `body`
//! - `t:rust b:compiler`: `rust` in `title`, `compiler` in `body`
//! - `category:languages infobox:mozilla`: full field names work as markers
//!
//! A marker is a field's initial or its full name immediately followed by
//! `:`, at the start of the query or after whitespace. Its text runs to the
//! next marker or the end of the query. Repeated markers accumulate. Any other
//! marker (`x:`, `info:`) is plain text. Text before the first marker is free
//! text.

use regex::Regex;

use crate::analysis::Analyzer;
use crate::error::{Result, WikindexError};
use crate::index::field::{Field, PerField};

/// A query split into analyzed terms per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    terms: PerField<Vec<String>>,
    /// Every term once per occurrence in the query, section by section.
    tokens: Vec<String>,
    qualified: bool,
}

impl ParsedQuery {
    /// Build a query from explicit per-field terms.
    pub fn from_terms(terms: PerField<Vec<String>>) -> Self {
        let tokens = terms.iter().flat_map(|(_, t)| t.iter().cloned()).collect();
        ParsedQuery {
            terms,
            tokens,
            qualified: true,
        }
    }

    /// Terms to look up in `field`.
    pub fn terms(&self, field: Field) -> &[String] {
        self.terms.get(field)
    }

    /// Fields with at least one term, with their terms.
    pub fn fields(&self) -> impl Iterator<Item = (Field, &[String])> {
        self.terms
            .iter()
            .filter(|(_, terms)| !terms.is_empty())
            .map(|(field, terms)| (field, terms.as_slice()))
    }

    /// Whether any field marker was used.
    pub fn is_qualified(&self) -> bool {
        self.qualified
    }

    pub fn is_empty(&self) -> bool {
        self.terms.iter().all(|(_, terms)| terms.is_empty())
    }

    /// Every term of the query in query order, repeats included.
    ///
    /// Free text counts once even though it is searched in two fields.
    pub fn all_terms(&self) -> &[String] {
        &self.tokens
    }

    /// All terms of the query searched in every field.
    pub fn widened(&self) -> ParsedQuery {
        ParsedQuery {
            terms: PerField::from_fn(|_| self.tokens.clone()),
            tokens: self.tokens.clone(),
            qualified: self.qualified,
        }
    }
}

/// Parses raw query strings with the index-time [`Analyzer`].
#[derive(Debug)]
pub struct QueryParser {
    analyzer: Analyzer,
    marker: Regex,
}

impl QueryParser {
    pub fn new() -> Result<Self> {
        Self::with_analyzer(Analyzer::new())
    }

    pub fn with_analyzer(analyzer: Analyzer) -> Result<Self> {
        let marker = Regex::new(r"(?:^|\s)([A-Za-z]+):")
            .map_err(|e| WikindexError::internal(format!("invalid marker pattern: {e}")))?;
        Ok(QueryParser { analyzer, marker })
    }

    pub fn parse(&self, raw: &str) -> ParsedQuery {
        let mut query = ParsedQuery::default();
        let mut section_field: Option<Field> = None;
        let mut section_start = 0usize;

        for caps in self.marker.captures_iter(raw) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Some(field) = Field::from_marker(name.as_str()) else {
                continue;
            };
            self.add_section(&mut query, section_field, &raw[section_start..name.start()]);
            section_field = Some(field);
            section_start = whole.end();
            query.qualified = true;
        }
        self.add_section(&mut query, section_field, &raw[section_start..]);
        query
    }

    fn add_section(&self, query: &mut ParsedQuery, field: Option<Field>, text: &str) {
        let terms = self.analyzer.analyze(text);
        match field {
            Some(field) => query.terms.get_mut(field).extend(terms.iter().cloned()),
            None => {
                for field in Field::DEFAULT_SEARCH {
                    query.terms.get_mut(field).extend(terms.iter().cloned());
                }
            }
        }
        query.tokens.extend(terms);
    }
}
