// `linktitles run`: link every source page, starting at an index.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::Args;
use linktitles_core::batch::{run_slice, BatchCursor, PageProgress, SliceReport};
use linktitles_core::LinkEngine;
use serde::Serialize;
use tracing::info;

use super::Globals;
use crate::exit_code::UsageError;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Index of the first page to process.
    #[arg(long, default_value_t = 0)]
    start: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub start: usize,
    pub end: usize,
    pub processed: usize,
    pub linked: usize,
    pub slices: u32,
    pub pages_per_slice: f64,
    pub last_title: Option<String>,
}

impl RunSummary {
    fn absorb(&mut self, report: &SliceReport) {
        self.end = report.cursor.end.unwrap_or(report.cursor.start);
        self.processed += report.processed;
        self.linked += report.linked;
        self.slices += 1;
        if report.last_title.is_some() {
            self.last_title.clone_from(&report.last_title);
        }
        if report.complete {
            self.pages_per_slice = report.pages_per_reload();
        }
    }
}

pub fn run(args: RunArgs, globals: &Globals) -> Result<()> {
    let config = globals.load_config()?;
    let store = globals.open_store()?;
    let engine = LinkEngine::new(&config, &store).context("failed to build link engine")?;

    let total = store.page_count(&config.source_namespaces)?;
    if args.start > total {
        return Err(UsageError(format!(
            "--start {} is past the last source page (there are {total})",
            args.start
        ))
        .into());
    }

    let budget = Duration::from_secs(config.batch_reload_after_secs);
    let mut progress = Progress::new(globals);
    let mut cursor = BatchCursor::starting_at(args.start);
    let mut summary = RunSummary { start: args.start, ..RunSummary::default() };

    loop {
        let slice_start = cursor.start;
        let report = run_slice(&engine, &store, cursor, Some(budget), |page| {
            progress.page(slice_start, page);
        })
        .with_context(|| format!("batch run stopped at index {slice_start}"))?;

        summary.absorb(&report);
        cursor = report.cursor;
        if report.complete {
            break;
        }
        info!(
            index = cursor.start,
            percent = report.percent(),
            last = report.last_title.as_deref().unwrap_or(""),
            "continuing with next slice"
        );
    }

    progress.finish();
    output::print_output(globals.format, &summary, format_human)?;
    Ok(())
}

/// Progress written to stderr while pages are processed.
struct Progress {
    mode: ProgressMode,
    dirty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgressMode {
    Silent,
    Counter,
    PerPage,
}

impl Progress {
    fn new(globals: &Globals) -> Self {
        let mode = match (globals.format, globals.verbose) {
            (_, true) => ProgressMode::PerPage,
            (OutputFormat::Human, false) if io::stderr().is_terminal() => ProgressMode::Counter,
            _ => ProgressMode::Silent,
        };
        Self { mode, dirty: false }
    }

    fn page(&mut self, slice_start: usize, page: &PageProgress<'_>) {
        let mut err = io::stderr().lock();
        match self.mode {
            ProgressMode::Silent => {}
            ProgressMode::PerPage => {
                let _ = writeln!(err, "{}", verbose_line(Utc::now(), page));
            }
            ProgressMode::Counter => {
                let overall = overall_percent(page.index, slice_start + page.total);
                let _ = write!(err, "{}", counter_line(page.index, overall));
                let _ = err.flush();
                self.dirty = true;
            }
        }
    }

    fn finish(&mut self) {
        if self.dirty {
            let _ = writeln!(io::stderr());
            self.dirty = false;
        }
    }
}

fn verbose_line(now: DateTime<Utc>, page: &PageProgress<'_>) -> String {
    format!(
        "{} - processed {:5} of {:5} ({:2.0}%) - index {:5} - {}",
        now.to_rfc3339_opts(SecondsFormat::Secs, true),
        page.processed,
        page.total,
        page.percent(),
        page.index,
        page.title
    )
}

fn counter_line(index: usize, percent: f64) -> String {
    format!("\rPage #{index} ({percent:02.0}%) ")
}

fn overall_percent(index: usize, end: usize) -> f64 {
    if end > 0 {
        index as f64 / end as f64 * 100.0
    } else {
        100.0
    }
}

fn format_human(summary: &RunSummary) -> String {
    let mut line = format!(
        "Finished. Processed {} page(s) from index {}, added links to {}.",
        summary.processed, summary.start, summary.linked
    );
    if summary.slices > 1 {
        line.push_str(&format!(
            " {} slices, {:.1} pages per slice.",
            summary.slices, summary.pages_per_slice
        ));
    }
    line
}
