//! The token pipeline shared by indexing and querying.

use std::fmt;

use ahash::AHashSet;
use rust_stemmers::{Algorithm, Stemmer};

use crate::analysis::stop_words;

/// Splits text into normalized terms.
///
/// Tokens are maximal runs of ASCII letters and digits. Tokens of a single
/// character are dropped, the rest are lowercased, English stop words are
/// removed and the remainder is stemmed with the English Snowball stemmer.
pub struct Analyzer {
    stemmer: Stemmer,
    stop_words: AHashSet<&'static str>,
}

impl Analyzer {
    pub fn new() -> Self {
        Analyzer {
            stemmer: Stemmer::create(Algorithm::English),
            stop_words: stop_words::ENGLISH.iter().copied().collect(),
        }
    }

    /// Analyze `text` into terms.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let mut terms = Vec::new();
        self.analyze_into(text, &mut terms);
        terms
    }

    /// Append the terms of `text` to `terms`.
    ///
    /// Returns the number of raw tokens seen, before any filtering.
    pub fn analyze_into(&self, text: &str, terms: &mut Vec<String>) -> u64 {
        let mut raw = 0u64;
        for token in text
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            raw += 1;
            if token.len() <= 1 {
                continue;
            }
            let lower = token.to_ascii_lowercase();
            if self.stop_words.contains(lower.as_str()) {
                continue;
            }
            terms.push(self.stemmer.stem(&lower).into_owned());
        }
        raw
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("stemmer", &"english")
            .field("stop_words", &self.stop_words.len())
            .finish()
    }
}
