use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

use wikindex::analysis::{FieldExtractor, WikiFieldExtractor};
use wikindex::index::posting::{parse_postings, split_term};
use wikindex::index::shard::{SecondaryIndex, shard_file_name};
use wikindex::storage::file::FileStorageConfig;
use wikindex::storage::memory::{MemoryStorage, MemoryStorageConfig};
use wikindex::storage::{StorageConfig, StorageFactory};
use wikindex::{Field, IndexBuilder, IndexConfig, IndexMeta, QueryEngine, RawDocument, Storage};

const VOCABULARY: &[&str] = &[
    "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliet",
    "kilo", "lima", "mike", "november", "oscar", "papa", "quebec", "romeo", "sierra", "tango",
    "uniform", "victor", "whiskey", "xray", "yankee", "zulu", "amber", "basalt", "cobalt",
    "dolomite", "emerald", "feldspar", "granite", "hematite", "iolite", "jasper",
];

/// Deterministic pseudo-random corpus with every field populated.
fn corpus(count: usize) -> Vec<RawDocument> {
    let mut rng = StdRng::seed_from_u64(0x2545_f491_4f6c_dd1d);
    let mut words = |n: usize| {
        (0..n)
            .map(|_| VOCABULARY[rng.random_range(0..VOCABULARY.len())])
            .collect::<Vec<_>>()
            .join(" ")
    };
    (0..count)
        .map(|i| {
            let title = format!("{} {}", words(2), i);
            let text = format!(
                "{{{{Infobox thing\n| kind = {}\n}}}}\n{}\n==References==\n* {}\n\
                 ==External links==\n* {}\n[[Category:{}]]\n",
                words(2),
                words(12),
                words(3),
                words(2),
                words(1),
            );
            RawDocument::new(title, text)
        })
        .collect()
}

fn build(
    storage: Arc<dyn Storage>,
    docs: &[RawDocument],
    parallel: bool,
) -> wikindex::Result<IndexMeta> {
    let config = IndexConfig::builder()
        .batch_size(7)
        .shard_size(5)
        .parallel(parallel)
        .build();
    IndexBuilder::with_wiki_extractor(storage, config)?.build_from(docs.iter().cloned().map(Ok))
}

fn memory_storage() -> Arc<dyn Storage> {
    Arc::new(MemoryStorage::new(MemoryStorageConfig::default()))
}

fn read(storage: &dyn Storage, name: &str) -> wikindex::Result<String> {
    let mut content = String::new();
    storage.open_input(name)?.read_to_string(&mut content)?;
    Ok(content)
}

fn field_lines(
    storage: &dyn Storage,
    field: Field,
    shards: usize,
) -> wikindex::Result<Vec<Vec<String>>> {
    (1..=shards)
        .map(|shard| {
            Ok(read(storage, &shard_file_name(field, shard))?
                .lines()
                .map(str::to_string)
                .collect())
        })
        .collect()
}

/// The index a single in-memory pass would produce, one line per term.
fn expected_lines(docs: &[RawDocument], field: Field) -> Vec<String> {
    let extractor = WikiFieldExtractor::new().unwrap();
    let mut index: BTreeMap<String, BTreeMap<u32, u32>> = BTreeMap::new();
    for (i, doc) in docs.iter().enumerate() {
        let extracted = extractor.extract(&doc.title, &doc.text);
        for term in extracted.tokens.get(field) {
            *index
                .entry(term.clone())
                .or_default()
                .entry(i as u32 + 1)
                .or_default() += 1;
        }
    }
    index
        .into_iter()
        .map(|(term, postings)| {
            let postings: Vec<String> =
                postings.iter().map(|(d, f)| format!("{d}:{f}")).collect();
            format!("{term} {}", postings.join(" "))
        })
        .collect()
}

#[test]
fn test_shards_match_single_pass_index() -> wikindex::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let storage =
        StorageFactory::create(StorageConfig::File(FileStorageConfig::new(temp_dir.path())))?;
    let docs = corpus(61);
    let meta = build(storage.clone(), &docs, true)?;
    assert_eq!(meta.total_docs, 61);

    for field in Field::ALL {
        let stats = meta.fields.get(field);
        let shards = field_lines(storage.as_ref(), field, stats.shards)?;
        assert!(shards.iter().all(|lines| !lines.is_empty() && lines.len() <= 5));

        let all: Vec<String> = shards.concat();
        assert_eq!(all, expected_lines(&docs, field), "field {field}");
        assert_eq!(all.len() as u64, stats.unique_terms);

        let postings: usize = all
            .iter()
            .map(|line| parse_postings(split_term(line).1).map(|p| p.len()))
            .sum::<wikindex::Result<usize>>()?;
        assert_eq!(postings as u64, stats.postings);
    }

    let leftovers: Vec<String> = storage
        .list_files()?
        .into_iter()
        .filter(|f| f.contains("segment_") || f.contains("staging"))
        .collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");
    Ok(())
}

#[test]
fn test_terms_and_postings_are_strictly_ascending() -> wikindex::Result<()> {
    let storage = memory_storage();
    let meta = build(storage.clone(), &corpus(40), true)?;

    for field in Field::ALL {
        let shards = field_lines(storage.as_ref(), field, meta.fields.get(field).shards)?;
        let terms: Vec<&str> = shards
            .iter()
            .flatten()
            .map(|line| split_term(line).0)
            .collect();
        assert!(terms.windows(2).all(|w| w[0] < w[1]), "field {field}");

        for line in shards.iter().flatten() {
            let postings = parse_postings(split_term(line).1)?;
            assert!(!postings.is_empty());
            assert!(postings.windows(2).all(|w| w[0].doc_id < w[1].doc_id), "{line}");
        }
    }
    Ok(())
}

#[test]
fn test_secondary_index_finds_every_term() -> wikindex::Result<()> {
    let storage = memory_storage();
    let meta = build(storage.clone(), &corpus(33), false)?;
    let engine = QueryEngine::open(storage.clone())?;

    for field in Field::ALL {
        let shards = field_lines(storage.as_ref(), field, meta.fields.get(field).shards)?;
        let secondary = SecondaryIndex::load(storage.as_ref(), field)?;
        assert_eq!(secondary.len(), shards.len());
        let terms: Vec<&str> = shards.iter().flatten().map(|l| split_term(l).0).collect();

        for (shard_no, lines) in shards.iter().enumerate() {
            assert_eq!(secondary.leading_terms()[shard_no], split_term(&lines[0]).0);
            for line in lines {
                let (term, postings) = split_term(line);
                assert_eq!(secondary.shard_for(term), Some(shard_no + 1));
                assert_eq!(engine.postings(field, term)?, parse_postings(postings)?);

                let absent = format!("{term}0");
                if !terms.contains(&absent.as_str()) {
                    assert!(engine.postings(field, &absent)?.is_empty());
                }
            }
        }
        assert!(engine.postings(field, "")?.is_empty());
        assert!(engine.postings(field, "~~~")?.is_empty());
    }
    Ok(())
}

#[test]
fn test_parallel_and_sequential_builds_agree() -> wikindex::Result<()> {
    let docs = corpus(45);
    let parallel = memory_storage();
    let sequential = memory_storage();
    let meta_parallel = build(parallel.clone(), &docs, true)?;
    let meta_sequential = build(sequential.clone(), &docs, false)?;
    assert_eq!(meta_parallel.fields, meta_sequential.fields);

    let files = parallel.list_files()?;
    assert_eq!(files, sequential.list_files()?);
    for file in files.iter().filter(|f| f.as_str() != "meta.json") {
        assert_eq!(
            read(parallel.as_ref(), file)?,
            read(sequential.as_ref(), file)?,
            "{file}"
        );
    }
    Ok(())
}

#[test]
fn test_titles_resolve_across_shards() -> wikindex::Result<()> {
    let storage = memory_storage();
    let docs = corpus(23);
    let meta = build(storage.clone(), &docs, true)?;
    assert_eq!(meta.title_shards, 5);

    let engine = QueryEngine::open(storage)?;
    for (i, doc) in docs.iter().enumerate() {
        assert_eq!(engine.title(i as u32 + 1)?.as_deref(), Some(doc.title.as_str()));
    }
    assert_eq!(engine.title(24)?, None);
    Ok(())
}
