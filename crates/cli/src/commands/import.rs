// `linktitles import`: load page files into the store.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use linktitles_store::{import_dir, ImportReport};
use serde::Serialize;

use super::Globals;
use crate::output;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Directory of `*.wiki` / `*.txt` files; the file stem is the title.
    dir: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: Vec<String>,
}

impl From<ImportReport> for ImportResult {
    fn from(report: ImportReport) -> Self {
        Self {
            imported: report.imported,
            skipped: report.skipped.iter().map(|path| path.display().to_string()).collect(),
        }
    }
}

pub fn run(args: ImportArgs, globals: &Globals) -> Result<()> {
    let store = globals.open_store()?;
    let result = ImportResult::from(import_dir(&store, &args.dir)?);

    for path in &result.skipped {
        output::print_warning(
            globals.format,
            "INVALID_TITLE",
            &format!("skipped `{path}`: file name is not a valid page title"),
        );
    }
    output::print_output(globals.format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &ImportResult) -> String {
    match result.skipped.len() {
        0 => format!("Imported {} page(s).", result.imported),
        skipped => format!("Imported {} page(s), skipped {skipped} file(s).", result.imported),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_human_counts() {
        let result = ImportResult { imported: 4, skipped: Vec::new() };
        assert_eq!(format_human(&result), "Imported 4 page(s).");

        let result = ImportResult { imported: 4, skipped: vec!["Bad[Name].wiki".into()] };
        assert_eq!(format_human(&result), "Imported 4 page(s), skipped 1 file(s).");
    }

    #[test]
    fn report_paths_become_strings() {
        let report = ImportReport {
            imported: 1,
            skipped: vec![PathBuf::from("pages").join("a|b.wiki")],
        };
        let result = ImportResult::from(report);
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].ends_with("a|b.wiki"));
    }
}
