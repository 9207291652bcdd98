//! External k-way merge of segments by pairwise reduction.
//!
//! Segments of a field are merged in rounds: `(1,2)`, `(3,4)`, ... are merged
//! pairwise and an odd segment out is promoted unchanged to the next round,
//! until one segment is left. Every pairwise merge streams both inputs line by
//! line, so memory use is independent of segment size.
//!
//! Because segment `k` only holds documents with lower ids than segment
//! `k + 1`, concatenating the postings of equal terms (first input first)
//! keeps every posting list in ascending document id order.

use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;

use log::{debug, info};
use rayon::prelude::*;

use crate::error::{Result, WikindexError};
use crate::index::field::Field;
use crate::index::posting::split_term;
use crate::index::segment::{Segment, segment_file_name};
use crate::storage::{Storage, StorageInput, StorageOutput, open_lines, read_line_trimmed};

/// Reduces the segments of one field to a single term-sorted segment.
#[derive(Debug)]
pub struct SegmentMerger {
    storage: Arc<dyn Storage>,
    parallel: bool,
}

impl SegmentMerger {
    pub fn new(storage: Arc<dyn Storage>, parallel: bool) -> Self {
        SegmentMerger { storage, parallel }
    }

    /// Merge `segments` (in creation order) into one segment.
    ///
    /// All input segments are consumed and their files deleted. Returns
    /// `None` when there is nothing to merge.
    pub fn merge(&self, field: Field, segments: Vec<Segment>) -> Result<Option<Segment>> {
        if let Some(stray) = segments.iter().find(|s| s.field() != field) {
            return Err(WikindexError::invalid_argument(format!(
                "segment {} does not belong to field {field}",
                stray.name()
            )));
        }

        let initial = segments.len();
        let mut current = segments;
        let mut round = 0u32;

        while current.len() > 1 {
            round += 1;
            let (pairs, carry) = pair_up(current);

            let storage = self.storage.as_ref();
            let merge = |(seq, (first, second)): (usize, (Segment, Segment))| {
                let output = segment_file_name(field, round, seq as u32 + 1);
                merge_pair(storage, first, second, output)
            };
            let mut merged: Vec<Segment> = if self.parallel {
                pairs.into_par_iter().enumerate().map(merge).collect::<Result<_>>()?
            } else {
                pairs.into_iter().enumerate().map(merge).collect::<Result<_>>()?
            };

            merged.extend(carry);
            debug!(
                "field {field}: merge round {round} left {} segments",
                merged.len()
            );
            current = merged;
        }

        let result = current.pop();
        if let Some(segment) = &result {
            info!(
                "field {field}: merged {initial} segments in {round} rounds ({} terms)",
                segment.terms()
            );
        }
        Ok(result)
    }
}

/// Group consecutive segments into pairs; the odd one out is returned apart.
fn pair_up(segments: Vec<Segment>) -> (Vec<(Segment, Segment)>, Option<Segment>) {
    let mut pairs = Vec::with_capacity(segments.len() / 2);
    let mut iter = segments.into_iter();
    loop {
        match (iter.next(), iter.next()) {
            (Some(first), Some(second)) => pairs.push((first, second)),
            (Some(last), None) => return (pairs, Some(last)),
            _ => return (pairs, None),
        }
    }
}

/// Streaming two-way merge of `first` and `second` into the file `output`.
///
/// `first` must hold strictly lower document ids than `second`. Both input
/// segments are deleted once the output is complete.
pub fn merge_pair(
    storage: &dyn Storage,
    first: Segment,
    second: Segment,
    output: String,
) -> Result<Segment> {
    let field = first.field();
    let postings = first.postings() + second.postings();
    let mut out = storage.create_output(&output)?;
    let terms = {
        let mut left = SortedLines::open(storage, &first)?;
        let mut right = SortedLines::open(storage, &second)?;
        merge_lines(&mut left, &mut right, out.as_mut())?
    };
    out.close()?;

    first.delete(storage)?;
    second.delete(storage)?;

    debug!("merged into {output} ({terms} terms)");
    Ok(Segment::new(field, output, terms, postings))
}

fn merge_lines<R: BufRead>(
    left: &mut SortedLines<R>,
    right: &mut SortedLines<R>,
    out: &mut dyn StorageOutput,
) -> Result<u64> {
    let mut terms = 0u64;
    left.advance()?;
    right.advance()?;

    while let (Some(l), Some(r)) = (left.current(), right.current()) {
        let (l_term, l_postings) = split_term(l);
        let (r_term, r_postings) = split_term(r);
        match l_term.cmp(r_term) {
            std::cmp::Ordering::Less => {
                write_raw(out, l)?;
                left.advance()?;
            }
            std::cmp::Ordering::Greater => {
                write_raw(out, r)?;
                right.advance()?;
            }
            std::cmp::Ordering::Equal => {
                out.write_all(l_term.as_bytes())?;
                for postings in [l_postings, r_postings] {
                    if !postings.is_empty() {
                        out.write_all(b" ")?;
                        out.write_all(postings.as_bytes())?;
                    }
                }
                out.write_all(b"\n")?;
                left.advance()?;
                right.advance()?;
            }
        }
        terms += 1;
    }

    for rest in [left, right] {
        while let Some(line) = rest.current() {
            write_raw(out, line)?;
            terms += 1;
            rest.advance()?;
        }
    }
    Ok(terms)
}

fn write_raw(out: &mut dyn StorageOutput, line: &str) -> Result<()> {
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Line cursor over a segment that checks the strict term order.
struct SortedLines<R> {
    name: String,
    reader: R,
    line: String,
    previous: String,
    exhausted: bool,
}

impl SortedLines<BufReader<Box<dyn StorageInput>>> {
    fn open(storage: &dyn Storage, segment: &Segment) -> Result<Self> {
        Ok(SortedLines::new(
            segment.name().to_string(),
            open_lines(storage, segment.name())?,
        ))
    }
}

impl<R: BufRead> SortedLines<R> {
    fn new(name: String, reader: R) -> Self {
        SortedLines {
            name,
            reader,
            line: String::new(),
            previous: String::new(),
            exhausted: false,
        }
    }

    fn current(&self) -> Option<&str> {
        if self.exhausted {
            None
        } else {
            Some(&self.line)
        }
    }

    fn advance(&mut self) -> Result<()> {
        if self.exhausted {
            return Ok(());
        }
        if !self.line.is_empty() {
            self.previous.clear();
            self.previous.push_str(split_term(&self.line).0);
        }
        loop {
            if !read_line_trimmed(&mut self.reader, &mut self.line)? {
                self.exhausted = true;
                return Ok(());
            }
            if !self.line.is_empty() {
                break;
            }
        }
        let term = split_term(&self.line).0;
        if !self.previous.is_empty() && term <= self.previous.as_str() {
            return Err(WikindexError::index(format!(
                "segment {} is not sorted: {term:?} follows {:?}",
                self.name, self.previous
            )));
        }
        Ok(())
    }
}
