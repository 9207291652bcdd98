//! Streaming reader for MediaWiki XML exports.

use std::io::BufRead;

use log::debug;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Result, WikindexError};
use crate::source::RawDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    None,
    Title,
    Text,
}

/// Yields one [`RawDocument`] per `<page>` element.
///
/// Only the page's `<title>` and the revision's `<text>` are kept; entities
/// are decoded and CDATA is taken verbatim. The reader holds one page in
/// memory at a time. After an XML error the iterator is exhausted.
pub struct WikiDumpReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    pages: u64,
    done: bool,
}

impl<R: BufRead> WikiDumpReader<R> {
    pub fn new(reader: R) -> Self {
        WikiDumpReader {
            reader: Reader::from_reader(reader),
            buf: Vec::new(),
            pages: 0,
            done: false,
        }
    }

    fn next_page(&mut self) -> Result<Option<RawDocument>> {
        let mut in_page = false;
        let mut capture = Capture::None;
        let mut page = RawDocument::default();

        loop {
            self.buf.clear();
            let event = self.reader.read_event_into(&mut self.buf).map_err(|e| {
                WikindexError::xml(format!(
                    "at byte {}: {e}",
                    self.reader.buffer_position()
                ))
            })?;
            match event {
                Event::Start(start) => match start.local_name().as_ref() {
                    b"page" => {
                        in_page = true;
                        page = RawDocument::default();
                    }
                    b"title" if in_page => capture = Capture::Title,
                    b"text" if in_page => capture = Capture::Text,
                    _ => {}
                },
                Event::End(end) => match end.local_name().as_ref() {
                    b"page" if in_page => {
                        self.pages += 1;
                        return Ok(Some(page));
                    }
                    b"title" | b"text" => capture = Capture::None,
                    _ => {}
                },
                Event::Text(text) if capture != Capture::None => {
                    let decoded = text.unescape()?;
                    target(&mut page, capture).push_str(&decoded);
                }
                Event::CData(data) if capture != Capture::None => {
                    target(&mut page, capture).push_str(&String::from_utf8_lossy(&data));
                }
                Event::Eof => {
                    if in_page {
                        return Err(WikindexError::xml("dump ends inside a <page> element"));
                    }
                    debug!("end of dump after {} pages", self.pages);
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

fn target(page: &mut RawDocument, capture: Capture) -> &mut String {
    match capture {
        Capture::Title => &mut page.title,
        _ => &mut page.text,
    }
}

impl<R: BufRead> Iterator for WikiDumpReader<R> {
    type Item = Result<RawDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_page() {
            Ok(Some(page)) => Some(Ok(page)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
