// linktitles CLI entry point.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_code;
mod output;
mod settings;

use exit_code::ExitCode;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "linktitles", about = "Automatically link page titles in wiki text")]
struct Cli {
    /// Page store (default: ~/.linktitles/pages.db).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file (default: ~/.linktitles/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long, global = true)]
    json: bool,

    /// Per-page progress and info-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let globals = commands::Globals {
        db: cli.db,
        config: cli.config,
        format: OutputFormat::detect(cli.json),
        verbose: cli.verbose,
    };
    match commands::run(cli.command, &globals) {
        Ok(()) => ExitCode::Success.into(),
        Err(error) => {
            output::print_anyhow_error(globals.format, &error);
            ExitCode::from_error(&error).into()
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
