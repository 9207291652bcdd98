//! Sharding of merged segments and the secondary index.
//!
//! The merged, term-sorted file of a field is cut into shards of at most
//! `shard_size` lines (`<field>/1.txt`, `<field>/2.txt`, ...). The first term
//! of every shard is kept in the field's secondary index
//! (`sec_ind/<field>`), which is small enough to live in memory and maps any
//! term to the only shard that can contain it with one binary search.

use std::io::{BufRead, Write};
use std::sync::Arc;

use log::{debug, info};

use crate::error::{Result, WikindexError};
use crate::index::field::Field;
use crate::index::posting::{self, Posting, leading_term};
use crate::index::segment::Segment;
use crate::storage::{Storage, StorageOutput, open_lines, read_line_trimmed};

/// Storage name of index shard `shard` (1-based) of `field`.
pub fn shard_file_name(field: Field, shard: usize) -> String {
    format!("{}/{}.txt", field.name(), shard)
}

/// Storage name of the secondary index of `field`.
pub fn secondary_index_file_name(field: Field) -> String {
    format!("sec_ind/{}", field.name())
}

/// Outcome of splitting a file into shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSummary {
    /// Number of shard files written.
    pub shards: usize,
    /// Number of lines copied.
    pub lines: u64,
}

/// Copy the lines of `source` into consecutive files of at most `shard_size`
/// lines, named by `shard_name(n)` for `n = 1, 2, ...`.
///
/// Lines are copied verbatim, empty lines included. The source is left in
/// place.
pub fn split_into_shards(
    storage: &dyn Storage,
    source: &str,
    shard_size: usize,
    shard_name: impl Fn(usize) -> String,
) -> Result<SplitSummary> {
    if shard_size == 0 {
        return Err(WikindexError::invalid_argument("shard size must be at least 1"));
    }

    let mut reader = open_lines(storage, source)?;
    let mut line = String::new();
    let mut summary = SplitSummary {
        shards: 0,
        lines: 0,
    };
    let mut current: Option<Box<dyn StorageOutput>> = None;
    let mut in_shard = 0usize;

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        if !line.ends_with('\n') {
            line.push('\n');
        }
        if current.is_none() || in_shard == shard_size {
            if let Some(mut finished) = current.take() {
                finished.close()?;
            }
            summary.shards += 1;
            current = Some(storage.create_output(&shard_name(summary.shards))?);
            in_shard = 0;
        }
        if let Some(output) = current.as_mut() {
            output.write_all(line.as_bytes())?;
        }
        in_shard += 1;
        summary.lines += 1;
    }

    if let Some(mut finished) = current.take() {
        finished.close()?;
    }
    Ok(summary)
}

/// Sorted list of the leading term of every shard of one field.
///
/// The entry at position `i` is the first term of shard `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryIndex {
    field: Field,
    leading_terms: Vec<String>,
}

impl SecondaryIndex {
    /// Build a secondary index, checking the strict ascending order.
    pub fn new(field: Field, leading_terms: Vec<String>) -> Result<Self> {
        if let Some(pair) = leading_terms.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(WikindexError::index(format!(
                "secondary index of {field} is not strictly ascending: {:?} then {:?}",
                pair[0], pair[1]
            )));
        }
        Ok(SecondaryIndex {
            field,
            leading_terms,
        })
    }

    /// A secondary index with no shards.
    pub fn empty(field: Field) -> Self {
        SecondaryIndex {
            field,
            leading_terms: Vec::new(),
        }
    }

    /// Load `sec_ind/<field>`.
    pub fn load(storage: &dyn Storage, field: Field) -> Result<Self> {
        let mut reader = open_lines(storage, &secondary_index_file_name(field))?;
        let mut line = String::new();
        let mut terms = Vec::new();
        while read_line_trimmed(&mut reader, &mut line)? {
            if !line.is_empty() {
                terms.push(line.clone());
            }
        }
        SecondaryIndex::new(field, terms)
    }

    /// Persist to `sec_ind/<field>`, one term per line.
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let mut output = storage.create_output(&secondary_index_file_name(self.field))?;
        for term in &self.leading_terms {
            output.write_all(term.as_bytes())?;
            output.write_all(b"\n")?;
        }
        output.close()
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// Number of shards covered.
    pub fn len(&self) -> usize {
        self.leading_terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leading_terms.is_empty()
    }

    pub fn leading_terms(&self) -> &[String] {
        &self.leading_terms
    }

    /// The 1-based shard that would contain `term`: the last shard whose
    /// leading term is `<= term`. `None` if `term` sorts before every shard.
    pub fn shard_for(&self, term: &str) -> Option<usize> {
        match self
            .leading_terms
            .partition_point(|leading| leading.as_str() <= term)
        {
            0 => None,
            shard => Some(shard),
        }
    }
}

/// Scan shard `shard` of `field` for the posting list of `term`.
///
/// Scanning stops at the first line whose term sorts after `term`; an absent
/// term yields an empty list.
pub fn scan_shard(
    storage: &dyn Storage,
    field: Field,
    shard: usize,
    term: &str,
) -> Result<Vec<Posting>> {
    let mut reader = open_lines(storage, &shard_file_name(field, shard))?;
    let mut line = String::new();
    while read_line_trimmed(&mut reader, &mut line)? {
        let (line_term, postings) = posting::split_term(&line);
        match line_term.cmp(term) {
            std::cmp::Ordering::Less => continue,
            std::cmp::Ordering::Equal => return posting::parse_postings(postings),
            std::cmp::Ordering::Greater => break,
        }
    }
    Ok(Vec::new())
}

/// Result of sharding one field.
#[derive(Debug, Clone)]
pub struct ShardedField {
    pub secondary: SecondaryIndex,
    /// Number of distinct terms in the field.
    pub terms: u64,
    /// Number of postings in the field.
    pub postings: u64,
}

/// Splits merged segments into shards and writes secondary indices.
#[derive(Debug)]
pub struct IndexSharder {
    storage: Arc<dyn Storage>,
    shard_size: usize,
}

impl IndexSharder {
    pub fn new(storage: Arc<dyn Storage>, shard_size: usize) -> Self {
        IndexSharder {
            storage,
            shard_size,
        }
    }

    /// Shard the merged segment of `field` and persist its secondary index.
    ///
    /// The merged segment is consumed and its file deleted. A field without a
    /// merged segment gets zero shards and an empty secondary index.
    pub fn shard(&self, field: Field, merged: Option<Segment>) -> Result<ShardedField> {
        let storage = self.storage.as_ref();
        let postings = merged.as_ref().map_or(0, Segment::postings);
        let summary = match merged {
            Some(segment) => {
                if segment.field() != field {
                    return Err(WikindexError::invalid_argument(format!(
                        "segment {} does not belong to field {field}",
                        segment.name()
                    )));
                }
                let summary = split_into_shards(storage, segment.name(), self.shard_size, |n| {
                    shard_file_name(field, n)
                })?;
                segment.delete(storage)?;
                summary
            }
            None => SplitSummary {
                shards: 0,
                lines: 0,
            },
        };

        let mut leading_terms = Vec::with_capacity(summary.shards);
        let mut line = String::new();
        for shard in 1..=summary.shards {
            let mut reader = open_lines(storage, &shard_file_name(field, shard))?;
            if !read_line_trimmed(&mut reader, &mut line)? {
                return Err(WikindexError::index(format!(
                    "shard {shard} of {field} is empty"
                )));
            }
            leading_terms.push(leading_term(&line).to_string());
            debug!("field {field}: shard {shard} starts at {:?}", line);
        }

        let secondary = SecondaryIndex::new(field, leading_terms)?;
        secondary.save(storage)?;
        info!(
            "field {field}: {} shards with {} unique terms",
            summary.shards, summary.lines
        );

        Ok(ShardedField {
            secondary,
            terms: summary.lines,
            postings,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::index::segment::segment_file_name;
    use crate::storage::memory::{MemoryStorage, MemoryStorageConfig};

    fn storage() -> Arc<dyn Storage> {
        Arc::new(MemoryStorage::new(MemoryStorageConfig::default()))
    }

    fn put(storage: &dyn Storage, name: &str, content: &str) {
        let mut out = storage.create_output(name).unwrap();
        out.write_all(content.as_bytes()).unwrap();
        out.close().unwrap();
    }

    fn read(storage: &dyn Storage, name: &str) -> String {
        let mut content = String::new();
        storage
            .open_input(name)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    fn merged(storage: &dyn Storage, terms: &[&str]) -> Segment {
        let name = segment_file_name(Field::Body, 4, 1);
        let content: String = terms
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{t} {}:1\n", i + 1))
            .collect();
        put(storage, &name, &content);
        Segment::new(Field::Body, name, terms.len() as u64, terms.len() as u64)
    }

    #[test]
    fn test_shard_and_secondary_index() {
        let storage = storage();
        let segment = merged(storage.as_ref(), &["ant", "bee", "cat", "dog", "eel"]);
        let sharder = IndexSharder::new(storage.clone(), 2);

        let sharded = sharder.shard(Field::Body, Some(segment)).unwrap();
        assert_eq!(sharded.terms, 5);
        assert_eq!(sharded.postings, 5);
        assert_eq!(sharded.secondary.leading_terms(), ["ant", "cat", "eel"]);
        assert_eq!(read(storage.as_ref(), "body/2.txt"), "cat 3:1\ndog 4:1\n");
        assert_eq!(read(storage.as_ref(), "sec_ind/body"), "ant\ncat\neel\n");
        assert!(!storage.file_exists(&segment_file_name(Field::Body, 4, 1)));

        let loaded = SecondaryIndex::load(storage.as_ref(), Field::Body).unwrap();
        assert_eq!(loaded, sharded.secondary);
    }

    #[test]
    fn test_shard_for_boundaries() {
        let index = SecondaryIndex::new(
            Field::Body,
            vec!["ant".into(), "cat".into(), "eel".into()],
        )
        .unwrap();
        assert_eq!(index.shard_for("aardvark"), None);
        assert_eq!(index.shard_for("ant"), Some(1));
        assert_eq!(index.shard_for("bee"), Some(1));
        assert_eq!(index.shard_for("cat"), Some(2));
        assert_eq!(index.shard_for("zebra"), Some(3));
        assert_eq!(SecondaryIndex::new(Field::Body, vec![]).unwrap().shard_for("a"), None);
    }

    #[test]
    fn test_secondary_index_rejects_unsorted() {
        assert!(SecondaryIndex::new(Field::Title, vec!["b".into(), "a".into()]).is_err());
        assert!(SecondaryIndex::new(Field::Title, vec!["a".into(), "a".into()]).is_err());
    }

    #[test]
    fn test_scan_shard_found_and_absent() {
        let storage = storage();
        put(storage.as_ref(), "body/1.txt", "ant 1:1\ncat 2:3 9:1\neel 4:1\n");

        let postings = scan_shard(storage.as_ref(), Field::Body, 1, "cat").unwrap();
        assert_eq!(postings, vec![Posting::new(2, 3), Posting::new(9, 1)]);
        assert!(scan_shard(storage.as_ref(), Field::Body, 1, "bee").unwrap().is_empty());
        assert!(scan_shard(storage.as_ref(), Field::Body, 1, "zebra").unwrap().is_empty());
    }

    #[test]
    fn test_split_round_trip() {
        let storage = storage();
        let lines: Vec<String> = (0..23).map(|i| format!("t{i:03} {}:1", i + 1)).collect();
        let content: String = lines.iter().map(|l| format!("{l}\n")).collect();
        put(storage.as_ref(), "source.txt", &content);

        for shard_size in [1, 4, 23, 100] {
            let summary = split_into_shards(storage.as_ref(), "source.txt", shard_size, |n| {
                format!("out{shard_size}/{n}.txt")
            })
            .unwrap();
            assert_eq!(summary.lines, 23);
            assert_eq!(summary.shards, 23usize.div_ceil(shard_size));

            let rebuilt: String = (1..=summary.shards)
                .map(|n| read(storage.as_ref(), &format!("out{shard_size}/{n}.txt")))
                .collect();
            assert_eq!(rebuilt, content);
        }
    }

    #[test]
    fn test_empty_field_gets_empty_secondary_index() {
        let storage = storage();
        let sharder = IndexSharder::new(storage.clone(), 10);
        let sharded = sharder.shard(Field::Link, None).unwrap();
        assert!(sharded.secondary.is_empty());
        assert_eq!(read(storage.as_ref(), "sec_ind/link"), "");
    }
}
