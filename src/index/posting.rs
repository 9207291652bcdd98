//! Postings and their line-oriented text encoding.
//!
//! Segment files, merged files and shards all share one format: one term per
//! line, the term followed by space-separated `docId:frequency` pairs in
//! ascending document id order.
//!
//! ```text
//! language 3:1 17:4 18:2
//! rust 1:2 17:1
//! ```

use std::fmt::Write as _;
use std::io::Write;

use crate::error::{Result, WikindexError};

/// Sequential document identifier, starting at 1.
pub type DocId = u32;

/// One term occurrence count for one document in one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Posting {
    pub doc_id: DocId,
    pub frequency: u32,
}

impl Posting {
    pub fn new(doc_id: DocId, frequency: u32) -> Self {
        Posting { doc_id, frequency }
    }
}

/// Split a line into its leading term and the (possibly empty) posting text.
pub fn split_term(line: &str) -> (&str, &str) {
    match line.split_once(' ') {
        Some((term, rest)) => (term, rest),
        None => (line, ""),
    }
}

/// Leading term of a line.
pub fn leading_term(line: &str) -> &str {
    split_term(line).0
}

/// Parse the posting text following a term.
pub fn parse_postings(text: &str) -> Result<Vec<Posting>> {
    text.split_whitespace().map(parse_posting).collect()
}

fn parse_posting(entry: &str) -> Result<Posting> {
    let malformed = || WikindexError::index(format!("malformed posting: {entry:?}"));
    let (doc_id, frequency) = entry.split_once(':').ok_or_else(malformed)?;
    let doc_id: DocId = doc_id.parse().map_err(|_| malformed())?;
    let frequency: u32 = frequency.parse().map_err(|_| malformed())?;
    if doc_id == 0 || frequency == 0 {
        return Err(malformed());
    }
    Ok(Posting { doc_id, frequency })
}

/// Write one `term d1:f1 d2:f2 ...` line.
pub fn write_line<W: Write + ?Sized>(
    out: &mut W,
    term: &str,
    postings: &[Posting],
    scratch: &mut String,
) -> Result<()> {
    scratch.clear();
    scratch.push_str(term);
    for posting in postings {
        // Writing into a String cannot fail.
        let _ = write!(scratch, " {}:{}", posting.doc_id, posting.frequency);
    }
    scratch.push('\n');
    out.write_all(scratch.as_bytes())?;
    Ok(())
}
