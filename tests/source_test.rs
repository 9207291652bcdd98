use std::fs;

use tempfile::TempDir;

use wikindex::storage::file::FileStorageConfig;
use wikindex::storage::{StorageConfig, StorageFactory};
use wikindex::{
    Field, IndexBuilder, IndexConfig, IndexMeta, QueryEngine, SourceFormat, WikindexError,
};

const DUMP: &str = r#"<mediawiki xmlns="http://www.mediawiki.org/xml/export-0.10/">
  <siteinfo><sitename>Wikipedia</sitename></siteinfo>
  <page>
    <title>Ferris &amp; Friends</title>
    <ns>0</ns>
    <revision>
      <text xml:space="preserve">Ferris is a crab mascot.
[[Category:Mascots]]</text>
    </revision>
  </page>
  <page>
    <title>Crab</title>
    <revision>
      <text xml:space="preserve">A crab is a decapod crustacean.
==References==
* Crustacean field guide
==External links==
* Marine biology portal
[[Category:Crustaceans]]</text>
    </revision>
  </page>
  <page>
    <title>Empty</title>
    <revision><text /></revision>
  </page>
</mediawiki>
"#;

fn build_file(
    temp_dir: &TempDir,
    name: &str,
    content: &str,
    format: SourceFormat,
) -> wikindex::Result<QueryEngine> {
    let input = temp_dir.path().join(name);
    fs::write(&input, content)?;

    let storage = StorageFactory::create(StorageConfig::File(FileStorageConfig::new(
        temp_dir.path().join("index"),
    )))?;
    let config = IndexConfig::builder().batch_size(2).shard_size(4).build();
    let documents = wikindex::source::open_documents(&input, format)?;
    IndexBuilder::with_wiki_extractor(storage.clone(), config)?.build_from(documents)?;
    QueryEngine::open(storage)
}

#[test]
fn test_index_wiki_dump() -> wikindex::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let engine = build_file(&temp_dir, "dump.xml", DUMP, SourceFormat::Xml)?;
    assert_eq!(engine.total_docs(), 3);
    assert_eq!(engine.title(1)?.as_deref(), Some("Ferris & Friends"));
    assert_eq!(engine.title(3)?.as_deref(), Some("Empty"));

    let results = engine.search("c:mascots", 5)?;
    assert_eq!(results.hits.len(), 1);
    assert_eq!(results.hits[0].doc_id, 1);
    assert!(!results.widened);

    let results = engine.search("r:guide l:portal", 5)?;
    assert_eq!(results.hits.len(), 1);
    assert_eq!(results.hits[0].doc_id, 2);
    assert_eq!(results.hits[0].score.field_matches(Field::Ref), 1);
    assert_eq!(results.hits[0].score.field_matches(Field::Link), 1);

    let results = engine.search("crab", 5)?;
    assert_eq!(results.total, 2);
    assert_eq!(results.hits[0].doc_id, 2);
    Ok(())
}

#[test]
fn test_index_json_lines() -> wikindex::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let content = concat!(
        r#"{"title": "Tokio", "text": "An asynchronous runtime."}"#,
        "\n\n",
        "this line is not json\n",
        r#"{"title": "Rayon"}"#,
        "\n",
        r#"{"title": "Serde", "text": "Serialization framework for asynchronous services."}"#,
        "\n",
    );
    let engine = build_file(&temp_dir, "pages.jsonl", content, SourceFormat::Jsonl)?;

    // The malformed line is skipped without consuming a document id.
    assert_eq!(engine.total_docs(), 3);
    assert_eq!(engine.title(2)?.as_deref(), Some("Rayon"));

    let results = engine.search("asynchronous", 10)?;
    let ids: Vec<u32> = results.hits.iter().map(|h| h.doc_id).collect();
    assert_eq!(results.total, 2);
    assert!(ids.contains(&1) && ids.contains(&3));
    Ok(())
}

#[test]
fn test_truncated_dump_aborts_the_build() -> wikindex::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let truncated = &DUMP[..DUMP.find("<title>Crab").unwrap()];
    let err = build_file(&temp_dir, "dump.xml", truncated, SourceFormat::Xml).unwrap_err();
    assert!(matches!(err, WikindexError::Xml(_)), "{err:?}");

    let storage = StorageFactory::open(StorageConfig::File(FileStorageConfig::new(
        temp_dir.path().join("index"),
    )))?;
    assert!(!IndexMeta::exists(storage.as_ref()));
    Ok(())
}

#[test]
fn test_missing_input_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let result =
        wikindex::source::open_documents(temp_dir.path().join("missing.xml"), SourceFormat::Xml);
    assert!(matches!(result, Err(WikindexError::NotFound(_))));
}
