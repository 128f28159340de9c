// `linktitles candidates`: list link targets in the order they are tried.

use anyhow::{Context, Result};
use clap::Args;
use linktitles_core::candidates::rank_rows;
use linktitles_core::title::{NamespaceId, NS_MAIN};
use linktitles_core::{ContentProvider, CorpusRow, PageTitle};
use serde::Serialize;

use super::Globals;
use crate::output;

#[derive(Debug, Args)]
pub struct CandidatesArgs {
    /// Namespace of the page being linked.
    #[arg(long, default_value_t = NS_MAIN)]
    namespace: NamespaceId,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidatesResult {
    pub source_namespace: NamespaceId,
    pub candidates: Vec<CandidateEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateEntry {
    pub namespace: NamespaceId,
    pub title: String,
    pub prefixed: String,
}

pub fn run(args: CandidatesArgs, globals: &Globals) -> Result<()> {
    let config = globals.load_config()?;
    let store = globals.open_store()?;
    let rows = rank_rows(&config, args.namespace, &store)
        .context("failed to query link candidates")?;

    let result = CandidatesResult {
        source_namespace: args.namespace,
        candidates: rows.into_iter().map(|row| entry(&store, row)).collect(),
    };
    output::print_output(globals.format, &result, format_human)?;
    Ok(())
}

fn entry(provider: &dyn ContentProvider, row: CorpusRow) -> CandidateEntry {
    let prefixed = match PageTitle::new(row.namespace, &row.title) {
        Ok(title) => title.prefixed_text(provider.namespace_name(row.namespace).as_deref()),
        Err(_) => row.title.clone(),
    };
    CandidateEntry { namespace: row.namespace, title: row.title, prefixed }
}

fn format_human(result: &CandidatesResult) -> String {
    if result.candidates.is_empty() {
        return format!("No link targets for namespace {}.", result.source_namespace);
    }

    let mut lines = Vec::new();
    lines.push(format!(
        "{} candidate(s) for namespace {}",
        result.candidates.len(),
        result.source_namespace
    ));
    for (rank, candidate) in result.candidates.iter().enumerate() {
        lines.push(format!("  {:>4}. {}", rank + 1, candidate.prefixed));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use linktitles_core::title::NS_HELP;
    use linktitles_core::MemoryProvider;

    use super::*;

    #[test]
    fn entry_uses_provider_namespace_names() {
        let provider = MemoryProvider::new();
        let help = entry(&provider, CorpusRow::new(NS_HELP, "Editing"));
        assert_eq!(help.prefixed, "Help:Editing");

        let main = entry(&provider, CorpusRow::new(NS_MAIN, "Berlin"));
        assert_eq!(main.prefixed, "Berlin");
    }

    #[test]
    fn format_human_numbers_candidates() {
        let result = CandidatesResult {
            source_namespace: NS_MAIN,
            candidates: vec![
                CandidateEntry { namespace: 0, title: "New York".into(), prefixed: "New York".into() },
                CandidateEntry { namespace: 0, title: "Berlin".into(), prefixed: "Berlin".into() },
            ],
        };
        assert_eq!(
            format_human(&result),
            "2 candidate(s) for namespace 0\n     1. New York\n     2. Berlin"
        );
    }

    #[test]
    fn format_human_empty() {
        let result = CandidatesResult { source_namespace: NS_HELP, candidates: Vec::new() };
        assert_eq!(format_human(&result), "No link targets for namespace 12.");
    }
}
