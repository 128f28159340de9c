// The substitution loop.
//
// Candidates are tried in ranked order. Each target gets at most one link per
// call: the first acceptable hit in document order across linkable spans. The
// text is segmented again after every insertion so the new link is protected
// from later candidates.

use std::cell::Cell;
use std::collections::HashSet;
use std::ops::Range;

use tracing::{debug, trace};

use crate::candidates::CandidateSource;
use crate::config::Config;
use crate::error::LinkError;
use crate::provider::ContentProvider;
use crate::segment::Splitter;
use crate::source::Source;
use crate::target::{MatchMode, TargetCandidate};
use crate::title::PageTitle;

/// Nesting counter that switches linking off while held.
///
/// Owned by the engine; guards release on every exit path.
#[derive(Debug, Default)]
pub struct ReentrancyLock {
    depth: Cell<usize>,
}

impl ReentrancyLock {
    pub fn is_held(&self) -> bool {
        self.depth.get() > 0
    }

    /// Hold the lock until the guard drops.
    pub fn hold(&self) -> LockGuard<'_> {
        self.depth.set(self.depth.get() + 1);
        LockGuard { lock: self }
    }

    /// Release the lock entirely until the guard drops, then restore it.
    pub fn suspend(&self) -> SuspendGuard<'_> {
        let saved = self.depth.replace(0);
        SuspendGuard { lock: self, saved }
    }
}

#[must_use = "the lock is released when the guard drops"]
#[derive(Debug)]
pub struct LockGuard<'l> {
    lock: &'l ReentrancyLock,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        let depth = self.lock.depth.get();
        self.lock.depth.set(depth.saturating_sub(1));
    }
}

#[must_use = "the lock is restored when the guard drops"]
#[derive(Debug)]
pub struct SuspendGuard<'l> {
    lock: &'l ReentrancyLock,
    saved: usize,
}

impl Drop for SuspendGuard<'_> {
    fn drop(&mut self) {
        self.lock.depth.set(self.saved);
    }
}

/// One link the engine inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub target: PageTitle,
    /// Text that was turned into the link.
    pub matched: String,
    /// Markup that replaced it.
    pub markup: String,
    pub mode: MatchMode,
}

/// Rewritten text plus what changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linked {
    pub text: String,
    pub insertions: Vec<Insertion>,
}

/// Per-context linking service: configuration, segmenter, candidate cache and
/// reentrancy lock. Not shared across threads.
pub struct LinkEngine<'a> {
    config: &'a Config,
    provider: &'a dyn ContentProvider,
    splitter: Splitter,
    candidates: CandidateSource<'a>,
    lock: ReentrancyLock,
}

impl std::fmt::Debug for LinkEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkEngine")
            .field("config", self.config)
            .field("candidates", &self.candidates)
            .field("lock", &self.lock)
            .finish_non_exhaustive()
    }
}

impl<'a> LinkEngine<'a> {
    pub fn new(config: &'a Config, provider: &'a dyn ContentProvider) -> Result<Self, LinkError> {
        Ok(Self {
            config,
            provider,
            splitter: Splitter::new(config)?,
            candidates: CandidateSource::new(config),
            lock: ReentrancyLock::default(),
        })
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn provider(&self) -> &'a dyn ContentProvider {
        self.provider
    }

    pub fn splitter(&self) -> &Splitter {
        &self.splitter
    }

    pub fn candidates(&self) -> &CandidateSource<'a> {
        &self.candidates
    }

    pub fn lock(&self) -> &ReentrancyLock {
        &self.lock
    }

    /// Link `source`. `Ok(None)` means nothing changed.
    pub fn link_content(&self, source: &mut Source) -> Result<Option<String>, LinkError> {
        Ok(self.link_with_report(source)?.map(|linked| linked.text))
    }

    /// Like [`link_content`](Self::link_content), also reporting each insertion.
    pub fn link_with_report(&self, source: &mut Source) -> Result<Option<Linked>, LinkError> {
        if self.lock.is_held() {
            trace!("linking suspended by reentrancy lock");
            return Ok(None);
        }
        let _guard = self.lock.hold();

        let title = source.title()?.clone();
        if !source.has_desired_namespace(&self.config.source_namespaces)? {
            debug!(page = %title, "source namespace not eligible");
            return Ok(None);
        }
        if source.has_no_autolinks_marker(self.provider)? {
            debug!(page = %title, "page opts out of automatic links");
            return Ok(None);
        }

        let candidates = self.candidates.ranked(title.namespace(), self.provider)?;
        if candidates.is_empty() {
            return Ok(None);
        }

        let original = source.text(self.provider)?;
        let mut text = original.to_string();
        let mut linkable = self.linkable_ranges(&text);
        let mut linked: HashSet<PageTitle> = HashSet::new();
        let mut insertions = Vec::new();

        for candidate in candidates.iter() {
            let Some(target) = candidate.title() else {
                continue;
            };
            if linked.contains(target) || candidate.is_same_title(&title) {
                continue;
            }
            let Some((range, mode)) = self.first_match(&text, &linkable, candidate) else {
                continue;
            };
            // Checked only on a hit: it may need the target's content.
            if !candidate.may_link_to(&title, self.provider)? {
                continue;
            }

            let matched = text[range.clone()].to_string();
            let markup = candidate.render(&matched, mode, self.provider);
            trace!(target = %target, %matched, ?mode, "inserting link");
            text.replace_range(range, &markup);
            linked.insert(target.clone());
            insertions.push(Insertion { target: target.clone(), matched, markup, mode });
            linkable = self.linkable_ranges(&text);
        }

        if insertions.is_empty() || text == original {
            debug!(page = %title, "no links added");
            return Ok(None);
        }
        debug!(page = %title, links = insertions.len(), "links added");
        Ok(Some(Linked { text, insertions }))
    }

    /// First hit of `candidate` in the linkable spans; exact case first, then
    /// any case in smart mode.
    fn first_match(
        &self,
        text: &str,
        linkable: &[Range<usize>],
        candidate: &TargetCandidate<'_>,
    ) -> Option<(Range<usize>, MatchMode)> {
        let mut modes = vec![MatchMode::CaseSensitive];
        if self.config.smart_mode {
            modes.push(MatchMode::CaseInsensitive);
        }

        modes.into_iter().find_map(|mode| {
            linkable.iter().find_map(|span| {
                candidate
                    .find_in(&text[span.clone()], mode)
                    .map(|hit| (span.start + hit.start..span.start + hit.end, mode))
            })
        })
    }

    fn linkable_ranges(&self, text: &str) -> Vec<Range<usize>> {
        self.splitter
            .split(text)
            .into_iter()
            .filter(|span| span.is_linkable() && !span.text.is_empty())
            .map(|span| span.range)
            .collect()
    }
}
