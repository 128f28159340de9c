// `linktitles page`: link a single page.

use anyhow::{Context, Result};
use clap::Args;
use linktitles_core::batch::{process_page, PageOutcome};
use linktitles_core::{LinkEngine, ProviderError};
use serde::Serialize;

use super::Globals;
use crate::output;

#[derive(Debug, Args)]
pub struct PageArgs {
    /// Page name, optionally prefixed with its namespace (`Help:Editing`).
    name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult {
    pub title: String,
    #[serde(flatten)]
    pub outcome: PageOutcome,
}

pub fn run(args: PageArgs, globals: &Globals) -> Result<()> {
    let config = globals.load_config()?;
    let store = globals.open_store()?;
    let title = store.parse_title(&args.name)?;

    if !config.is_source_namespace(title.namespace()) {
        output::print_warning(
            globals.format,
            "NOT_A_SOURCE_NAMESPACE",
            &format!("{title} is outside the configured source namespaces; nothing will be linked"),
        );
    }

    let engine = LinkEngine::new(&config, &store).context("failed to build link engine")?;
    let outcome = process_page(&engine, &store, &title)
        .with_context(|| format!("failed to link page `{title}`"))?;
    if outcome == PageOutcome::Missing {
        return Err(anyhow::Error::new(ProviderError::NotFound(title.to_string()))
            .context(format!("page `{title}` does not exist")));
    }

    let result = PageResult { title: title.to_string(), outcome };
    output::print_output(globals.format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &PageResult) -> String {
    match result.outcome {
        PageOutcome::Linked { links } => format!("{}: added {links} link(s).", result.title),
        PageOutcome::Unchanged => format!("{}: nothing to link.", result.title),
        PageOutcome::Missing => format!("{}: no such page.", result.title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_human_linked() {
        let result =
            PageResult { title: "Berlin".into(), outcome: PageOutcome::Linked { links: 2 } };
        assert_eq!(format_human(&result), "Berlin: added 2 link(s).");
    }

    #[test]
    fn format_human_unchanged() {
        let result = PageResult { title: "Help:Editing".into(), outcome: PageOutcome::Unchanged };
        assert_eq!(format_human(&result), "Help:Editing: nothing to link.");
    }

    #[test]
    fn json_flattens_the_outcome() {
        let result =
            PageResult { title: "Berlin".into(), outcome: PageOutcome::Linked { links: 1 } };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["title"], "Berlin");
        assert_eq!(value["outcome"], "linked");
        assert_eq!(value["links"], 1);
    }
}
