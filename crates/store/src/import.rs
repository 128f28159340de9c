use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::pages::PageStore;

const PAGE_EXTENSIONS: &[&str] = &["wiki", "txt"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    /// Files whose name is not a valid title.
    pub skipped: Vec<PathBuf>,
}

/// Load every `*.wiki` / `*.txt` file in `dir` (not recursive) as a page.
///
/// The file stem is the page title, optionally prefixed with a namespace
/// (`Help:Editing.wiki`); underscores stand for spaces.
pub fn import_dir(store: &PageStore, dir: &Path) -> Result<ImportReport> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read import directory `{}`", dir.display()))?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let extension = path.extension()?.to_str()?;
            (path.is_file() && PAGE_EXTENSIONS.contains(&extension)).then_some(path)
        })
        .collect();
    files.sort();

    let mut report = ImportReport::default();
    for path in files {
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            warn!(path = %path.display(), "skipping file with non-UTF-8 name");
            report.skipped.push(path);
            continue;
        };
        let title = match store.parse_title(stem) {
            Ok(title) => title,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "skipping file with invalid title");
                report.skipped.push(path);
                continue;
            }
        };

        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read page file `{}`", path.display()))?;
        store.put_page(&title, &text)?;
        report.imported += 1;
    }

    info!(dir = %dir.display(), imported = report.imported, skipped = report.skipped.len(), "import finished");
    Ok(report)
}
