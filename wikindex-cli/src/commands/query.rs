use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use wikindex::query::run_batch;

use crate::cli::QueryCommand;
use crate::context;

/// Answer every request of a query file.
pub fn run(cmd: QueryCommand, data_dir: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = context::load_config(config_path)?;
    let engine = context::open_engine(data_dir)?;

    let input = File::open(&cmd.queries)
        .with_context(|| format!("Failed to open query file {}", cmd.queries.display()))?;
    let output = File::create(&cmd.results)
        .with_context(|| format!("Failed to create result file {}", cmd.results.display()))?;
    let mut output = BufWriter::new(output);

    let summary = run_batch(&engine, BufReader::new(input), &mut output, config.parallel)
        .context("Query batch failed")?;

    println!(
        "Answered {} queries ({} invalid), results in {}.",
        summary.requests,
        summary.failed,
        cmd.results.display()
    );
    Ok(())
}
