use std::path::Path;

use anyhow::Result;

use crate::cli::SearchCommand;
use crate::context;
use crate::output;

/// Execute a single query.
pub fn run(cmd: SearchCommand, data_dir: &Path) -> Result<()> {
    let engine = context::open_engine(data_dir)?;
    let results = engine.search(&cmd.query, cmd.limit)?;
    output::print_search_results(&cmd.query, &results, cmd.format)
}
