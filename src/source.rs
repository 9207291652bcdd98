//! Document sources.
//!
//! A source is a lazy, finite iterator of [`RawDocument`]s. Document ids are
//! not part of the source: the index builder assigns them in arrival order.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WikindexError};

pub mod jsonl;
pub mod wiki_dump;

pub use jsonl::JsonLinesReader;
pub use wiki_dump::WikiDumpReader;

/// A page as read from the source, before any analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub title: String,
    #[serde(default)]
    pub text: String,
}

impl RawDocument {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        RawDocument {
            title: title.into(),
            text: text.into(),
        }
    }
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// MediaWiki XML export.
    #[default]
    Xml,
    /// One JSON object per line with `title` and `text`.
    Jsonl,
}

impl FromStr for SourceFormat {
    type Err = WikindexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xml" => Ok(SourceFormat::Xml),
            "jsonl" | "json-lines" => Ok(SourceFormat::Jsonl),
            other => Err(WikindexError::invalid_argument(format!(
                "unknown source format: {other}"
            ))),
        }
    }
}

/// Boxed document iterator over any reader.
pub type DocumentStream = Box<dyn Iterator<Item = Result<RawDocument>> + Send>;

/// Open a document stream over `reader` in the given format.
pub fn read_documents<R>(reader: R, format: SourceFormat) -> DocumentStream
where
    R: BufRead + Send + 'static,
{
    match format {
        SourceFormat::Xml => Box::new(WikiDumpReader::new(reader)),
        SourceFormat::Jsonl => Box::new(JsonLinesReader::new(reader)),
    }
}

/// Open a document stream over the file at `path`.
pub fn open_documents(path: impl AsRef<Path>, format: SourceFormat) -> Result<DocumentStream> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            WikindexError::not_found(format!("input file {}", path.display()))
        } else {
            WikindexError::Io(e)
        }
    })?;
    Ok(read_documents(BufReader::new(file), format))
}
