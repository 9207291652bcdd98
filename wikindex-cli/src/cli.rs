use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use wikindex::SourceFormat;

use crate::output::OutputFormat;

/// wikindex - sharded inverted index for encyclopedia dumps
#[derive(Parser)]
#[command(name = "wikindex", version, about)]
pub struct Cli {
    /// Path to the index directory.
    #[arg(long, global = true, env = "WIKINDEX_DATA_DIR", default_value = "./wikindex_data")]
    pub data_dir: PathBuf,

    /// Path to a TOML file with build settings (batch_size, shard_size, parallel).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build an index from a dump file.
    Index(IndexCommand),
    /// Run a batch query file and write the results.
    Query(QueryCommand),
    /// Run a single query.
    Search(SearchCommand),
    /// Show index statistics.
    Stats(StatsCommand),
}

/// Input file formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum InputFormat {
    /// MediaWiki XML export.
    Xml,
    /// One `{"title": ..., "text": ...}` object per line.
    Jsonl,
}

impl From<InputFormat> for SourceFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Xml => SourceFormat::Xml,
            InputFormat::Jsonl => SourceFormat::Jsonl,
        }
    }
}

#[derive(Parser)]
pub struct IndexCommand {
    /// Path to the dump file.
    pub input: PathBuf,

    /// Format of the dump file.
    #[arg(long, value_enum, default_value_t = InputFormat::Xml)]
    pub format: InputFormat,
}

#[derive(Parser)]
pub struct QueryCommand {
    /// File with one `<count>, <query>` request per line.
    pub queries: PathBuf,

    /// File the results are written to.
    pub results: PathBuf,
}

#[derive(Parser)]
pub struct SearchCommand {
    /// Query string, e.g. `t:rust b:compiler`.
    pub query: String,

    /// Maximum number of results.
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser)]
pub struct StatsCommand {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
