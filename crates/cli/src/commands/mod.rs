// CLI subcommand dispatch.

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use linktitles_core::Config;
use linktitles_store::PageStore;

use crate::output::OutputFormat;
use crate::settings;

pub mod candidates;
pub mod import;
pub mod page;
pub mod run;
pub mod split;

#[derive(Subcommand)]
pub enum Command {
    /// Link every source page, starting at an index
    Run(run::RunArgs),
    /// Link a single page
    Page(page::PageArgs),
    /// Show how a file splits into linkable and protected spans
    Split(split::SplitArgs),
    /// List link targets in the order they are tried
    Candidates(candidates::CandidatesArgs),
    /// Load `*.wiki` / `*.txt` files into the page store
    Import(import::ImportArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Globals {
    pub db: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
    pub verbose: bool,
}

impl Globals {
    pub fn load_config(&self) -> Result<Config> {
        settings::load_config(self.config.as_deref())
    }

    pub fn open_store(&self) -> Result<PageStore> {
        let path = settings::resolve_db_path(self.db.as_deref())?;
        PageStore::open(path)
    }
}

pub fn run(cmd: Command, globals: &Globals) -> Result<()> {
    match cmd {
        Command::Run(args) => run::run(args, globals),
        Command::Page(args) => page::run(args, globals),
        Command::Split(args) => split::run(args, globals),
        Command::Candidates(args) => candidates::run(args, globals),
        Command::Import(args) => import::run(args, globals),
    }
}
