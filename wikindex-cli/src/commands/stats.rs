use std::path::Path;

use anyhow::Result;
use wikindex::IndexMeta;

use crate::cli::StatsCommand;
use crate::context;
use crate::output;

/// Print the metadata of an index.
pub fn run(cmd: StatsCommand, data_dir: &Path) -> Result<()> {
    let storage = context::open_storage(data_dir)?;
    let meta = IndexMeta::load(storage.as_ref())?;
    output::print_stats(&meta, cmd.format)
}
