//! JSON-lines document source.

use std::io::BufRead;

use crate::error::{Result, WikindexError};
use crate::source::RawDocument;

/// Reads one `{"title": ..., "text": ...}` object per line.
///
/// Blank lines are skipped. A line that is not a valid document, or not
/// valid UTF-8, is yielded as an [`WikindexError::InvalidArgument`] error
/// carrying its line number; iteration may continue past it.
#[derive(Debug)]
pub struct JsonLinesReader<R> {
    reader: R,
    line: Vec<u8>,
    line_no: u64,
    done: bool,
}

impl<R: BufRead> JsonLinesReader<R> {
    pub fn new(reader: R) -> Self {
        JsonLinesReader {
            reader,
            line: Vec::new(),
            line_no: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for JsonLinesReader<R> {
    type Item = Result<RawDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
            self.line_no += 1;
            let line = match std::str::from_utf8(&self.line) {
                Ok(line) => line.trim(),
                Err(e) => {
                    return Some(Err(WikindexError::invalid_argument(format!(
                        "line {}: {e}",
                        self.line_no
                    ))));
                }
            };
            if line.is_empty() {
                continue;
            }
            return Some(serde_json::from_str(line).map_err(|e| {
                WikindexError::invalid_argument(format!("line {}: {e}", self.line_no))
            }));
        }
        None
    }
}
