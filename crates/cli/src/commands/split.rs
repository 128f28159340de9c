// `linktitles split`: show how a file splits into linkable and protected
// spans.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use linktitles_core::segment::{Span, SpanKind, Splitter};
use serde::Serialize;

use super::Globals;
use crate::output;

#[derive(Debug, Args)]
pub struct SplitArgs {
    /// Wiki text file.
    file: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitResult {
    pub spans: Vec<SpanEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpanEntry {
    pub kind: &'static str,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl From<&Span<'_>> for SpanEntry {
    fn from(span: &Span<'_>) -> Self {
        let kind = match span.kind {
            SpanKind::Linkable => "linkable",
            SpanKind::Protected => "protected",
        };
        Self { kind, start: span.range.start, end: span.range.end, text: span.text.to_owned() }
    }
}

pub fn run(args: SplitArgs, globals: &Globals) -> Result<()> {
    let config = globals.load_config()?;
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read `{}`", args.file.display()))?;
    let splitter = Splitter::new(&config).context("failed to build protected-span pattern")?;

    let result = split_text(&splitter, &text);
    output::print_output(globals.format, &result, format_human)?;
    Ok(())
}

fn split_text(splitter: &Splitter, text: &str) -> SplitResult {
    SplitResult { spans: splitter.split(text).iter().map(SpanEntry::from).collect() }
}

fn format_human(result: &SplitResult) -> String {
    result
        .spans
        .iter()
        .map(|span| format!("{:<9} {:>6}..{:<6} {:?}", span.kind, span.start, span.end, span.text))
        .collect::<Vec<_>>()
        .join("\n")
}
