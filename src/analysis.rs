//! Text analysis: tokenization, stop words, stemming and field extraction.
//!
//! The pipeline is intentionally small:
//!
//! ```text
//! Text → split on non-alphanumerics → drop 1-char → lowercase → drop stop words → stem
//! ```
//!
//! The same [`Analyzer`] is used at index time (through a [`FieldExtractor`])
//! and at query time, so index terms and query terms are normalized alike.
//!
//! # Modules
//!
//! - [`analyzer`]: the token pipeline
//! - [`extractor`]: splitting wiki markup into per-field token lists
//! - [`stop_words`]: the English stop word list

pub mod analyzer;
pub mod extractor;
pub mod stop_words;

use crate::index::field::PerField;

pub use analyzer::Analyzer;
pub use extractor::{Extracted, FieldExtractor, WikiFieldExtractor};

/// Normalized tokens of one document, per field.
pub type FieldTokens = PerField<Vec<String>>;
