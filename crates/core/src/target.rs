// One potential link target and the rules deciding whether it may be linked.
//
// The regex crate has no lookaround, so the guard characters and word
// boundaries around a title are checked by hand on each hit, retrying from
// the next character when a hit is rejected.

use std::cell::OnceCell;
use std::ops::Range;

use regex::{Regex, RegexBuilder};
use tracing::{trace, warn};

use crate::config::Config;
use crate::error::LinkError;
use crate::magic::{self, Marker};
use crate::provider::{ContentProvider, CorpusRow};
use crate::title::{NamespaceId, PageTitle, NS_CATEGORY, NS_MAIN};
use crate::wikilink::render_link;

/// Characters that may not directly precede a match (URLs, prefixes, emails).
const GUARD_CHARS: [char; 6] = [':', '.', '@', '/', '?', '&'];

/// How a hit was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Exact case, except the first letter under `capital_links`.
    CaseSensitive,
    /// Whole title case-insensitive (smart mode).
    CaseInsensitive,
}

#[derive(Debug)]
pub struct TargetCandidate<'a> {
    config: &'a Config,
    row: CorpusRow,
    /// `None` when the corpus row does not form a valid title.
    title: Option<PageTitle>,
    case_sensitive: OnceCell<Option<Regex>>,
    case_insensitive: OnceCell<Option<Regex>>,
    content: OnceCell<Option<String>>,
    redirect: OnceCell<Option<PageTitle>>,
}

impl<'a> TargetCandidate<'a> {
    pub fn new(config: &'a Config, row: CorpusRow) -> Self {
        let title = match PageTitle::new(row.namespace, &row.title) {
            Ok(title) => Some(title),
            Err(error) => {
                warn!(namespace = row.namespace, title = %row.title, %error, "ignoring invalid target title");
                None
            }
        };
        Self {
            config,
            row,
            title,
            case_sensitive: OnceCell::new(),
            case_insensitive: OnceCell::new(),
            content: OnceCell::new(),
            redirect: OnceCell::new(),
        }
    }

    pub fn row(&self) -> &CorpusRow {
        &self.row
    }

    pub fn namespace(&self) -> NamespaceId {
        self.row.namespace
    }

    pub fn title(&self) -> Option<&PageTitle> {
        self.title.as_ref()
    }

    /// Title text as stored, empty for an inert candidate.
    pub fn title_text(&self) -> &str {
        self.title.as_ref().map_or("", PageTitle::text)
    }

    /// Link target with namespace prefix; categories get a leading colon so
    /// the link does not put the page into the category.
    pub fn prefixed_title_text(&self, provider: &dyn ContentProvider) -> String {
        let Some(title) = &self.title else {
            return String::new();
        };
        let name = provider.namespace_name(title.namespace());
        let prefixed = title.prefixed_text(name.as_deref());
        if title.namespace() == NS_CATEGORY {
            format!(":{prefixed}")
        } else {
            prefixed
        }
    }

    /// Whether the candidate names the source page itself.
    pub fn is_same_title(&self, source: &PageTitle) -> bool {
        self.title
            .as_ref()
            .is_some_and(|title| title.same_page(source, self.config.capital_links))
    }

    /// Exclusion rules: invalid title, redirect back to the source, and the
    /// no-target marker. Content is looked up at most once per candidate.
    pub fn may_link_to(
        &self,
        source: &PageTitle,
        provider: &dyn ContentProvider,
    ) -> Result<bool, LinkError> {
        let Some(title) = &self.title else {
            return Ok(false);
        };

        if self.config.check_redirect {
            if let Some(redirect) = self.redirect(title, provider)? {
                if redirect.same_page(source, self.config.capital_links) {
                    trace!(target = %title, "target redirects to source");
                    return Ok(false);
                }
            }
        }

        if self.config.enable_no_target_magic_word {
            if let Some(text) = self.content(title, provider)? {
                if provider.has_marker(text, Marker::NoTarget) {
                    trace!(target = %title, "target carries no-target marker");
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }

    /// First acceptable hit of this title in `haystack`.
    ///
    /// `haystack` is one linkable span; neighbouring characters outside it
    /// are not considered.
    pub fn find_in(&self, haystack: &str, mode: MatchMode) -> Option<Range<usize>> {
        let pattern = self.pattern(mode)?;
        let mut from = 0;

        while from <= haystack.len() {
            let hit = pattern.find_at(haystack, from)?;
            if hit.is_empty() {
                return None;
            }
            if self.accepts(haystack, hit.range()) {
                return Some(hit.range());
            }
            from = match haystack[hit.start()..].chars().next() {
                Some(ch) => hit.start() + ch.len_utf8(),
                None => return None,
            };
        }
        None
    }

    /// Link markup for a hit of `matched`.
    pub fn render(&self, matched: &str, mode: MatchMode, provider: &dyn ContentProvider) -> String {
        let namespace = self.title.as_ref().map_or(NS_MAIN, PageTitle::namespace);
        if mode == MatchMode::CaseSensitive && namespace == NS_MAIN {
            return render_link(matched, matched);
        }
        render_link(&self.prefixed_title_text(provider), matched)
    }

    fn accepts(&self, haystack: &str, range: Range<usize>) -> bool {
        let before = haystack[..range.start].chars().next_back();
        let after = haystack[range.end..].chars().next();

        if before.is_some_and(|ch| GUARD_CHARS.contains(&ch)) {
            return false;
        }
        if self.config.word_start_only && before.is_some_and(char::is_alphanumeric) {
            return false;
        }
        if self.config.word_end_only && after.is_some_and(char::is_alphanumeric) {
            return false;
        }
        true
    }

    fn pattern(&self, mode: MatchMode) -> Option<&Regex> {
        let cell = match mode {
            MatchMode::CaseSensitive => &self.case_sensitive,
            MatchMode::CaseInsensitive => &self.case_insensitive,
        };
        cell.get_or_init(|| self.build_pattern(mode)).as_ref()
    }

    fn build_pattern(&self, mode: MatchMode) -> Option<Regex> {
        let title = self.title.as_ref()?;
        let source = match mode {
            MatchMode::CaseSensitive => case_sensitive_source(title.text(), self.config.capital_links),
            MatchMode::CaseInsensitive => regex::escape(title.text()),
        };
        let built = RegexBuilder::new(&source)
            .case_insensitive(mode == MatchMode::CaseInsensitive)
            .build();
        match built {
            Ok(regex) => Some(regex),
            Err(error) => {
                warn!(target = %title, %error, "target pattern failed to compile");
                None
            }
        }
    }

    fn content(
        &self,
        title: &PageTitle,
        provider: &dyn ContentProvider,
    ) -> Result<Option<&str>, LinkError> {
        if let Some(content) = self.content.get() {
            return Ok(content.as_deref());
        }
        let loaded = provider.page_text(title)?;
        Ok(self.content.get_or_init(|| loaded).as_deref())
    }

    fn redirect(
        &self,
        title: &PageTitle,
        provider: &dyn ContentProvider,
    ) -> Result<Option<&PageTitle>, LinkError> {
        if let Some(redirect) = self.redirect.get() {
            return Ok(redirect.as_ref());
        }
        // Reuse content already loaded for the marker check.
        let resolved = match self.content.get() {
            Some(text) => text
                .as_deref()
                .and_then(|text| magic::redirect_target(text, |name| provider.namespace_id(name))),
            None => provider.redirect_target(title)?,
        };
        Ok(self.redirect.get_or_init(|| resolved).as_ref())
    }
}

/// Escaped title; under `capital_links` a leading letter matches either case.
fn case_sensitive_source(text: &str, capital_links: bool) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if capital_links && first.is_alphabetic() => {
            let rest = chars.as_str();
            format!("(?i:{}){}", regex::escape(first.encode_utf8(&mut [0; 4])), regex::escape(rest))
        }
        _ => regex::escape(text),
    }
}
