mod cli;
mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::commands::{index, query, search, stats};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir;
    let config = cli.config.as_deref();

    match cli.command {
        Command::Index(cmd) => index::run(cmd, &data_dir, config),
        Command::Query(cmd) => query::run(cmd, &data_dir, config),
        Command::Search(cmd) => search::run(cmd, &data_dir),
        Command::Stats(cmd) => stats::run(cmd, &data_dir),
    }
}
