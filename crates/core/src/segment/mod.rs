// Splits wiki text into linkable and protected spans.
//
// One composite pattern covers every protected construct; the first
// alternative that matches at the leftmost position wins. With
// `skip_templates`, balanced `{{...}}` blocks are collected by a brace
// scanner in one pass per split and take precedence over a pattern match
// starting at the same offset or later. An unbalanced opener falls through
// to the name-only template alternative of the composite pattern.

mod template;

use std::ops::Range;

use regex::{Regex, RegexBuilder};
use tracing::trace;

use crate::config::Config;

pub use template::balanced_ranges;

const URL: &str = r"[a-z]+?://(?:\S+\.)+\S+";

/// Unicode classes under case folding make the compiled pattern large.
const PATTERN_SIZE_LIMIT: usize = 32 * (1 << 20);

/// Whether a span may receive links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Linkable,
    Protected,
}

/// A region of the segmented text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'t> {
    pub kind: SpanKind,
    /// Byte range into the original text.
    pub range: Range<usize>,
    pub text: &'t str,
}

impl Span<'_> {
    pub fn is_linkable(&self) -> bool {
        self.kind == SpanKind::Linkable
    }
}

/// Segmenter built once per configuration.
#[derive(Debug, Clone)]
pub struct Splitter {
    pattern: Regex,
    balance_templates: bool,
}

impl Splitter {
    pub fn new(config: &Config) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(&protected_pattern(config))
            .case_insensitive(true)
            .multi_line(true)
            .dot_matches_new_line(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()?;
        Ok(Self { pattern, balance_templates: config.skip_templates })
    }

    /// Split `text` into alternating linkable and protected spans.
    ///
    /// The sequence starts and ends with a linkable span (possibly empty) and
    /// covers `text` without gaps or overlaps.
    pub fn split<'t>(&self, text: &'t str) -> Vec<Span<'t>> {
        let mut spans = Vec::new();
        let mut linkable_start = 0usize;
        let mut search_from = 0usize;
        let templates =
            if self.balance_templates { template::balanced_ranges(text) } else { Vec::new() };

        while search_from <= text.len() {
            let Some(hit) = self.next_protected(text, search_from, &templates) else {
                break;
            };
            if hit.is_empty() {
                search_from = next_char_boundary(text, hit.start);
                continue;
            }

            spans.push(span(text, SpanKind::Linkable, linkable_start..hit.start));
            spans.push(span(text, SpanKind::Protected, hit.clone()));
            linkable_start = hit.end;
            search_from = hit.end;
        }

        spans.push(span(text, SpanKind::Linkable, linkable_start..text.len()));
        trace!(spans = spans.len(), bytes = text.len(), "text segmented");
        spans
    }

    fn next_protected(
        &self,
        text: &str,
        from: usize,
        templates: &[Range<usize>],
    ) -> Option<Range<usize>> {
        let hit = self.pattern.find_at(text, from).map(|m| m.range());
        if templates.is_empty() {
            return hit;
        }

        let limit = hit.as_ref().map_or(text.len(), |range| range.start);
        template::first_in(templates, from, limit).or(hit)
    }
}

fn span(text: &str, kind: SpanKind, range: Range<usize>) -> Span<'_> {
    Span { kind, text: &text[range.clone()], range }
}

fn next_char_boundary(text: &str, index: usize) -> usize {
    text[index..].chars().next().map_or(text.len() + 1, |ch| index + ch.len_utf8())
}

/// Composite alternation of every protected construct, in priority order.
fn protected_pattern(config: &Config) -> String {
    let mut parts: Vec<String> = vec![
        // existing links
        r"\[\[.*?\]\]".into(),
    ];

    if !config.parse_headings {
        parts.push(r"^=+[^=]+=+\r?$".into());
    }

    // template names up to the first parameter, and named parameters
    parts.push(r"\{\{[^|]*?(?:\[\[[^\]]+\]\])?[^|]*?(?:\|(?:\w+=)?|\}\})".into());
    parts.push(r"\|\w+=".into());

    parts.extend(
        [
            // preformatted lines (leading space)
            r"^ .+?\n",
            r"\n .+?\n",
            r"\n .+?$",
            r"^ .+?$",
            r"<nowiki>.*?</nowiki>",
            r"<code>.*?</code>",
            r"<pre>.*?</pre>",
            r"<html>.*?</html>",
            r"<script>.*?</script>",
            r"<syntaxhighlight.*?>.*?</syntaxhighlight>",
            r"<gallery>.*?</gallery>",
            r"<div.*?>",
            r"</div>",
            r"<input.+</input>",
            r"<select.+</select>",
            r"<span.*?>",
            r"</span>",
            r"<file>[^<]*</file>",
            r#"style=".+?""#,
            r#"class=".+?""#,
            r#"data-sort-value=".+?""#,
            r"<noautolinks>.*?</noautolinks>",
        ]
        .into_iter()
        .map(String::from),
    );

    parts.push(format!(r"\[{URL}\s.+?\]"));
    parts.push(URL.into());
    // email addresses
    parts.push(r"\b\S+@(?:\S+\.)+\S+\b".into());

    parts.join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter() -> Splitter {
        Splitter::new(&Config::default()).unwrap()
    }

    fn protected<'t>(spans: &[Span<'t>]) -> Vec<&'t str> {
        spans.iter().filter(|s| !s.is_linkable()).map(|s| s.text).collect()
    }

    fn rejoin(spans: &[Span<'_>]) -> String {
        spans.iter().map(|s| s.text).collect()
    }

    #[test]
    fn empty_input_is_one_empty_linkable_span() {
        let spans = splitter().split("");
        assert_eq!(spans.len(), 1);
        assert!(spans[0].is_linkable());
        assert_eq!(spans[0].text, "");
    }

    #[test]
    fn plain_text_is_one_linkable_span() {
        let spans = splitter().split("The quick fox visits Berlin.");
        assert_eq!(spans.len(), 1);
        assert!(spans[0].is_linkable());
    }

    #[test]
    fn spans_alternate_and_cover_text() {
        let text = "See [[Paris]] and [[Rome]].";
        let spans = splitter().split(text);
        assert_eq!(rejoin(&spans), text);
        for (index, span) in spans.iter().enumerate() {
            assert_eq!(span.is_linkable(), index % 2 == 0, "span {index} has wrong kind");
        }
        assert_eq!(protected(&spans), vec!["[[Paris]]", "[[Rome]]"]);
    }

    #[test]
    fn adjacent_protected_spans_get_empty_linkable_between() {
        let spans = splitter().split("[[A]][[B]]");
        assert_eq!(spans.len(), 5);
        assert_eq!(spans[2].text, "");
        assert!(spans[2].is_linkable());
    }

    #[test]
    fn headings_are_protected_unless_parsed() {
        let text = "== Berlin ==\nBerlin is big.";
        assert_eq!(protected(&splitter().split(text)), vec!["== Berlin =="]);

        let mut config = Config::default();
        config.parse_headings = true;
        let spans = Splitter::new(&config).unwrap().split(text);
        assert!(protected(&spans).is_empty());
    }

    #[test]
    fn template_names_are_protected_but_parameters_are_not() {
        let text = "{{Infobox city|name=Paris|country France}}";
        let spans = splitter().split(text);
        assert_eq!(rejoin(&spans), text);
        let guarded = protected(&spans);
        assert_eq!(guarded[0], "{{Infobox city|name=");
        assert!(spans.iter().any(|s| s.is_linkable() && s.text.contains("Paris")));
    }

    #[test]
    fn skip_templates_protects_balanced_blocks() {
        let mut config = Config::default();
        config.skip_templates = true;
        let text = "Before {{Infobox|city={{flag|Paris}}|x=Berlin}} after Paris.";
        let spans = Splitter::new(&config).unwrap().split(text);
        assert_eq!(rejoin(&spans), text);
        assert_eq!(protected(&spans), vec!["{{Infobox|city={{flag|Paris}}|x=Berlin}}"]);
    }

    #[test]
    fn skip_templates_falls_back_to_name_pattern_when_unbalanced() {
        let mut config = Config::default();
        config.skip_templates = true;
        let text = "{{Broken|Paris never closes";
        let spans = Splitter::new(&config).unwrap().split(text);
        assert_eq!(rejoin(&spans), text);
        assert_eq!(protected(&spans), vec!["{{Broken|"]);
    }

    #[test]
    fn tag_bodies_are_protected() {
        let text = "a <nowiki>Paris</nowiki> b <code>Rome</code> c <pre>X</pre> \
                    d <syntaxhighlight lang=\"rust\">fn</syntaxhighlight> e \
                    <noautolinks>Berlin</noautolinks> f <gallery>img</gallery>";
        let guarded = protected(&splitter().split(text));
        assert_eq!(
            guarded,
            vec![
                "<nowiki>Paris</nowiki>",
                "<code>Rome</code>",
                "<pre>X</pre>",
                "<syntaxhighlight lang=\"rust\">fn</syntaxhighlight>",
                "<noautolinks>Berlin</noautolinks>",
                "<gallery>img</gallery>",
            ]
        );
    }

    #[test]
    fn tags_match_case_insensitively() {
        let guarded = protected(&splitter().split("x <NOWIKI>Paris</NoWiki> y"));
        assert_eq!(guarded, vec!["<NOWIKI>Paris</NoWiki>"]);
    }

    #[test]
    fn div_and_span_attributes_are_protected_but_content_is_not() {
        let text = "<div class=\"Paris\">Paris</div>";
        let spans = splitter().split(text);
        assert_eq!(protected(&spans), vec!["<div class=\"Paris\">", "</div>"]);
        assert!(spans.iter().any(|s| s.is_linkable() && s.text == "Paris"));
    }

    #[test]
    fn style_and_class_attributes_are_protected() {
        let text = "{| \n| style=\"color:red\" | Paris\n|}";
        let guarded = protected(&splitter().split(text));
        assert!(guarded.contains(&"style=\"color:red\""));
    }

    #[test]
    fn preformatted_lines_are_protected() {
        let text = "Intro\n preformatted Paris\nOutro";
        let guarded = protected(&splitter().split(text));
        assert_eq!(guarded, vec!["\n preformatted Paris\n"]);
    }

    #[test]
    fn bare_and_bracketed_urls_are_protected() {
        let text = "Go to http://example.com/Paris now or [https://example.org/x Paris site].";
        let guarded = protected(&splitter().split(text));
        assert_eq!(guarded, vec!["http://example.com/Paris", "[https://example.org/x Paris site]"]);
    }

    #[test]
    fn email_addresses_are_protected() {
        let text = "Write to paris@example.com today.";
        let guarded = protected(&splitter().split(text));
        assert_eq!(guarded, vec!["paris@example.com"]);
    }

    #[test]
    fn multibyte_text_is_covered() {
        let text = "Über [[Köln]] nach Zürich — https://ü.example.de/straße fertig";
        let spans = splitter().split(text);
        assert_eq!(rejoin(&spans), text);
    }

    #[test]
    fn crlf_headings_are_protected() {
        let text = "== Apple ==\r\nApple pie";
        let guarded = protected(&splitter().split(text));
        assert_eq!(guarded, vec!["== Apple ==\r"]);
    }

    #[test]
    fn unclosed_template_openers_split_in_linear_time() {
        let config = Config { skip_templates: true, ..Config::default() };
        let splitter = Splitter::new(&config).unwrap();
        let text = "{{".repeat(20_000);

        let started = std::time::Instant::now();
        let spans = splitter.split(&text);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(rejoin(&spans), text);
    }
}
