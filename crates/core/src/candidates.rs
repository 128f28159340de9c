// Ranked candidate targets for a source namespace, with a one-slot cache.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::config::Config;
use crate::error::LinkError;
use crate::provider::{ContentProvider, CorpusQuery, CorpusRow};
use crate::target::TargetCandidate;
use crate::title::NamespaceId;

/// Namespace weight step; a namespace at 1-based position `n` weighs `n * 100`.
const NAMESPACE_WEIGHT: usize = 100;

type Ranked<'a> = Rc<[TargetCandidate<'a>]>;

/// Fetches and ranks candidates. The last ranked list is kept until a
/// different source namespace is requested or [`invalidate`] is called.
///
/// [`invalidate`]: CandidateSource::invalidate
#[derive(Debug)]
pub struct CandidateSource<'a> {
    config: &'a Config,
    cache: RefCell<Option<(NamespaceId, Ranked<'a>)>>,
}

impl<'a> CandidateSource<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config, cache: RefCell::new(None) }
    }

    /// Candidates for pages in `source_namespace`, best first.
    pub fn ranked(
        &self,
        source_namespace: NamespaceId,
        provider: &dyn ContentProvider,
    ) -> Result<Ranked<'a>, LinkError> {
        if let Some((namespace, ranked)) = self.cache.borrow().as_ref() {
            if *namespace == source_namespace {
                return Ok(Rc::clone(ranked));
            }
        }

        let rows = rank_rows(self.config, source_namespace, provider)?;
        let ranked: Ranked<'a> =
            rows.into_iter().map(|row| TargetCandidate::new(self.config, row)).collect();
        debug!(source_namespace, candidates = ranked.len(), "candidate list loaded");
        *self.cache.borrow_mut() = Some((source_namespace, Rc::clone(&ranked)));
        Ok(ranked)
    }

    /// Drop the cached list (between batch runs, after config changes).
    pub fn invalidate(&self) {
        self.cache.borrow_mut().take();
    }

    /// Namespace the cached list belongs to, if any.
    pub fn cached_namespace(&self) -> Option<NamespaceId> {
        self.cache.borrow().as_ref().map(|(namespace, _)| *namespace)
    }
}

/// Query the corpus and sort it by namespace weight, then title length.
pub fn rank_rows(
    config: &Config,
    source_namespace: NamespaceId,
    provider: &dyn ContentProvider,
) -> Result<Vec<CorpusRow>, LinkError> {
    let namespaces = config.eligible_target_namespaces(source_namespace);
    if namespaces.is_empty() {
        return Ok(Vec::new());
    }

    let query = CorpusQuery {
        namespaces: &namespaces,
        black_list: &config.black_list,
        minimum_length: config.minimum_title_length,
    };
    let mut rows = provider.corpus(&query)?;
    // Providers may filter in storage; apply the same filter to be exact.
    rows.retain(|row| query.admits(row.namespace, &row.title));

    let weight = |namespace: NamespaceId| {
        namespaces
            .iter()
            .position(|candidate| *candidate == namespace)
            .map_or(usize::MAX, |index| (index + 1) * NAMESPACE_WEIGHT)
    };
    let prefer_short = config.prefer_short_titles;
    rows.sort_by(|left, right| {
        let (left_len, right_len) = (left.title.chars().count(), right.title.chars().count());
        let by_length =
            if prefer_short { left_len.cmp(&right_len) } else { right_len.cmp(&left_len) };
        weight(left.namespace).cmp(&weight(right.namespace)).then(by_length)
    });
    Ok(rows)
}
