// Whole-corpus processing in resumable, time-boxed slices.
//
// A slice walks the source pages from `cursor.start`, links each one, and
// stops when the list is exhausted or the time budget has elapsed. The
// returned cursor resumes where the slice stopped.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::LinkEngine;
use crate::error::{LinkError, ProviderError};
use crate::source::Source;
use crate::title::{NamespaceId, PageTitle};

/// Edit summary for automatic link edits.
pub const BOT_SUMMARY: &str = "Links to other pages added by linktitles bot.";

/// How a rewritten page is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOptions {
    pub summary: String,
    pub minor: bool,
    pub bot: bool,
}

impl EditOptions {
    pub fn bot() -> Self {
        Self { summary: BOT_SUMMARY.to_string(), minor: true, bot: true }
    }
}

/// Page listing and saving, provided by the host.
pub trait PageCatalog {
    /// Number of pages in `namespaces`.
    fn count_pages(&self, namespaces: &[NamespaceId]) -> Result<usize, ProviderError>;

    /// Pages in `namespaces` from `offset` on, in a stable order.
    fn list_pages(
        &self,
        namespaces: &[NamespaceId],
        offset: usize,
    ) -> Result<Vec<PageTitle>, ProviderError>;

    /// Store new text for an existing page.
    fn save_page(
        &self,
        title: &PageTitle,
        text: &str,
        edit: &EditOptions,
    ) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum PageOutcome {
    /// No such page.
    Missing,
    /// The page exists but nothing was linked.
    Unchanged,
    /// The page was saved with `links` new links.
    Linked { links: usize },
}

/// Link one stored page and save it if it changed.
pub fn process_page(
    engine: &LinkEngine<'_>,
    catalog: &dyn PageCatalog,
    title: &PageTitle,
) -> Result<PageOutcome, LinkError> {
    let mut source = Source::from_title(title.clone());
    if !source.has_content(engine.provider())? {
        debug!(page = %title, "page does not exist");
        return Ok(PageOutcome::Missing);
    }

    let Some(linked) = engine.link_with_report(&mut source)? else {
        return Ok(PageOutcome::Unchanged);
    };
    catalog.save_page(title, &linked.text, &EditOptions::bot())?;
    Ok(PageOutcome::Linked { links: linked.insertions.len() })
}

/// Resumable position of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCursor {
    /// Index of the next page to process.
    pub start: usize,
    /// Total number of pages, fixed when the run starts.
    pub end: Option<usize>,
    /// Slices completed so far, not counting the current one.
    pub reloads: u32,
}

impl BatchCursor {
    pub fn starting_at(start: usize) -> Self {
        Self { start, ..Self::default() }
    }
}

/// Per-page progress passed to the observer.
#[derive(Debug, Clone, Copy)]
pub struct PageProgress<'p> {
    /// Pages handled in this slice, including this one.
    pub processed: usize,
    /// Pages listed for this slice.
    pub total: usize,
    /// Absolute index after this page.
    pub index: usize,
    pub title: &'p PageTitle,
    pub outcome: PageOutcome,
}

impl PageProgress<'_> {
    pub fn percent(&self) -> f64 {
        percent(self.processed, self.total)
    }
}

/// Result of one slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceReport {
    pub cursor: BatchCursor,
    pub processed: usize,
    pub linked: usize,
    pub last_title: Option<String>,
    pub complete: bool,
}

impl SliceReport {
    /// Overall progress of the run.
    pub fn percent(&self) -> f64 {
        percent(self.cursor.start, self.cursor.end.unwrap_or(0))
    }

    /// Average pages per slice, reported when the run completes.
    pub fn pages_per_reload(&self) -> f64 {
        let end = self.cursor.end.unwrap_or(self.cursor.start) as f64;
        if self.cursor.reloads > 0 {
            end / f64::from(self.cursor.reloads)
        } else {
            end
        }
    }
}

fn percent(done: usize, total: usize) -> f64 {
    if total > 0 {
        done as f64 / total as f64 * 100.0
    } else {
        100.0
    }
}

/// Process pages from `cursor` until done or `budget` has elapsed.
///
/// The budget is checked after each page, so a slice always makes progress.
/// The candidate cache is dropped first so a run sees the current corpus.
pub fn run_slice<F>(
    engine: &LinkEngine<'_>,
    catalog: &dyn PageCatalog,
    cursor: BatchCursor,
    budget: Option<Duration>,
    mut observe: F,
) -> Result<SliceReport, LinkError>
where
    F: FnMut(&PageProgress<'_>),
{
    let started = Instant::now();
    engine.candidates().invalidate();

    let namespaces = &engine.config().source_namespaces;
    let end = match cursor.end {
        Some(end) => end,
        None => catalog.count_pages(namespaces)?,
    };
    let pages = catalog.list_pages(namespaces, cursor.start)?;
    info!(start = cursor.start, end, pages = pages.len(), "batch slice started");

    let mut index = cursor.start;
    let mut processed = 0;
    let mut linked = 0;
    let mut last_title = None;

    for title in &pages {
        let outcome = process_page(engine, catalog, title)?;
        processed += 1;
        index += 1;
        if matches!(outcome, PageOutcome::Linked { .. }) {
            linked += 1;
        }
        observe(&PageProgress { processed, total: pages.len(), index, title, outcome });
        last_title = Some(title.to_string());

        if budget.is_some_and(|budget| started.elapsed() >= budget) {
            break;
        }
    }

    let complete = index >= end || processed == pages.len();
    let reloads = if complete { cursor.reloads } else { cursor.reloads + 1 };
    let report = SliceReport {
        cursor: BatchCursor { start: index, end: Some(end), reloads },
        processed,
        linked,
        last_title,
        complete,
    };
    info!(
        index,
        end,
        processed,
        linked,
        complete,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch slice finished"
    );
    Ok(report)
}

/// Run slices until the corpus is done, without a time budget between them.
pub fn run_all<F>(
    engine: &LinkEngine<'_>,
    catalog: &dyn PageCatalog,
    start: usize,
    observe: F,
) -> Result<SliceReport, LinkError>
where
    F: FnMut(&PageProgress<'_>),
{
    run_slice(engine, catalog, BatchCursor::starting_at(start), None, observe)
}
