//! Splitting raw wiki markup into per-field token lists.

use std::fmt::Debug;

use regex::Regex;

use crate::analysis::{Analyzer, FieldTokens};
use crate::error::{Result, WikindexError};
use crate::index::field::Field;

/// Output of a [`FieldExtractor`] for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub tokens: FieldTokens,
    /// Raw tokens seen before filtering, for corpus statistics.
    pub raw_tokens: u64,
}

/// Turns a document's title and raw text into one token list per field.
pub trait FieldExtractor: Send + Sync + Debug {
    fn extract(&self, title: &str, text: &str) -> Extracted;
}

/// Extractor for MediaWiki markup.
///
/// - `ref`: lines after the first `==References==` heading, up to a line
///   containing `[[Category`, `==` or `DEFAULTSORT`
/// - `link`: lines starting with `*` after the first `==External links==`
/// - `infobox`: lines after the first `{{Infobox`, up to a line equal to `}}`
/// - `category`: the contents of `[[Category:...]]`
/// - `body`: all remaining text
///
/// URLs are removed before anything else; `<ref>` tags are removed before
/// the infobox, category and body are extracted.
#[derive(Debug)]
pub struct WikiFieldExtractor {
    analyzer: Analyzer,
    url: Regex,
    ref_pair: Regex,
    ref_empty: Regex,
    category: Regex,
}

const REFERENCES_HEADING: &str = "==References==";
const EXTERNAL_LINKS_HEADING: &str = "==External links==";
const INFOBOX_OPEN: &str = "{{Infobox";

impl WikiFieldExtractor {
    pub fn new() -> Result<Self> {
        Self::with_analyzer(Analyzer::new())
    }

    pub fn with_analyzer(analyzer: Analyzer) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                WikindexError::internal(format!("invalid pattern {pattern:?}: {e}"))
            })
        };
        Ok(WikiFieldExtractor {
            analyzer,
            url: compile(r"\w+://[A-Za-z/.0-9_~:&?=%-]+")?,
            ref_pair: compile(r"<ref(.*?)</ref>")?,
            ref_empty: compile(r"<ref(.*?)/>")?,
            category: compile(r"\[\[Category:(.*)\]\]")?,
        })
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }
}

/// Text between the first and the second occurrence of `heading`.
fn section_after<'a>(text: &'a str, heading: &str) -> Option<&'a str> {
    text.split(heading).nth(1)
}

fn reference_lines(text: &str) -> String {
    let Some(section) = section_after(text, REFERENCES_HEADING) else {
        return String::new();
    };
    section
        .split('\n')
        .take_while(|line| {
            !(line.contains("[[Category") || line.contains("==") || line.contains("DEFAULTSORT"))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn external_link_lines(text: &str) -> String {
    let Some(section) = section_after(text, EXTERNAL_LINKS_HEADING) else {
        return String::new();
    };
    section
        .split('\n')
        .filter(|line| line.starts_with('*'))
        .collect::<Vec<_>>()
        .join(" ")
}

fn infobox_lines(text: &str) -> String {
    let Some(section) = section_after(text, INFOBOX_OPEN) else {
        return String::new();
    };
    section
        .split('\n')
        .take_while(|line| *line != "}}")
        .collect::<Vec<_>>()
        .join(" ")
}

impl FieldExtractor for WikiFieldExtractor {
    fn extract(&self, title: &str, text: &str) -> Extracted {
        let mut out = Extracted::default();
        let mut analyze = |field: Field, input: &str| {
            out.raw_tokens += self
                .analyzer
                .analyze_into(input, out.tokens.get_mut(field));
        };

        analyze(Field::Title, title);

        let text = self.url.replace_all(text, "");
        analyze(Field::Ref, &reference_lines(&text));
        analyze(Field::Link, &external_link_lines(&text));

        let text = self.ref_pair.replace_all(&text, "");
        let text = self.ref_empty.replace_all(&text, "");
        analyze(Field::Infobox, &infobox_lines(&text));

        let categories: Vec<&str> = self
            .category
            .captures_iter(&text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();
        analyze(Field::Category, &categories.join(" "));

        analyze(Field::Body, &text);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "{{Infobox language\n\
| name = Rust\n\
| designer = Graydon Hoare\n\
}}\n\
'''Rust''' is a systems programming language.<ref name=\"a\">Cited journal</ref>\n\
See http://www.rust-lang.org/learn for details.<ref name=\"b\"/>\n\
==References==\n\
* Klabnik compiler book\n\
==External links==\n\
* [http://example.org Official homepage]\n\
not a link line\n\
[[Category:Programming languages]]\n\
[[Category:Mozilla]]\n";

    fn extract() -> Extracted {
        WikiFieldExtractor::new().unwrap().extract("Rust (language)", PAGE)
    }

    #[test]
    fn test_title_and_infobox() {
        let extracted = extract();
        assert_eq!(extracted.tokens.get(Field::Title), &vec!["rust", "languag"]);
        let infobox = extracted.tokens.get(Field::Infobox);
        assert!(infobox.contains(&"graydon".to_string()));
        assert!(infobox.contains(&"hoar".to_string()));
        assert!(!infobox.contains(&"system".to_string()));
    }

    #[test]
    fn test_references_and_links() {
        let extracted = extract();
        assert_eq!(
            extracted.tokens.get(Field::Ref),
            &vec!["klabnik", "compil", "book"]
        );
        assert_eq!(
            extracted.tokens.get(Field::Link),
            &vec!["offici", "homepag"]
        );
    }

    #[test]
    fn test_categories() {
        let extracted = extract();
        assert_eq!(
            extracted.tokens.get(Field::Category),
            &vec!["program", "languag", "mozilla"]
        );
    }

    #[test]
    fn test_body_strips_urls_and_ref_tags() {
        let extracted = extract();
        let body = extracted.tokens.get(Field::Body);
        assert!(body.contains(&"system".to_string()));
        assert!(!body.contains(&"journal".to_string()));
        assert!(!body.contains(&"learn".to_string()));
        assert!(!body.contains(&"www".to_string()));
        assert!(extracted.raw_tokens > body.len() as u64);
    }

    #[test]
    fn test_plain_text_has_only_body() {
        let extracted = WikiFieldExtractor::new()
            .unwrap()
            .extract("", "Plain encyclopedia text");
        assert_eq!(
            extracted.tokens.get(Field::Body),
            &vec!["plain", "encyclopedia", "text"]
        );
        for field in [Field::Title, Field::Ref, Field::Infobox, Field::Link, Field::Category] {
            assert!(extracted.tokens.get(field).is_empty(), "{field}");
        }
    }
}
