use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;
use wikindex::IndexBuilder;
use wikindex::source::open_documents;

use crate::cli::IndexCommand;
use crate::context;

/// Build a new index from a dump file.
pub fn run(cmd: IndexCommand, data_dir: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = context::load_config(config_path)?;
    let storage = context::create_storage(data_dir)?;
    let documents = open_documents(&cmd.input, cmd.format.into())
        .with_context(|| format!("Failed to open {}", cmd.input.display()))?;

    info!("indexing {} into {}", cmd.input.display(), data_dir.display());
    let started = Instant::now();
    let builder = IndexBuilder::with_wiki_extractor(storage, config)?;
    let meta = builder.build_from(documents).context("Index build failed")?;

    println!(
        "Indexed {} documents into {} in {:.2}s.",
        meta.total_docs,
        data_dir.display(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
