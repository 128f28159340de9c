// Host collaborators the engine reads from.
//
// The host owns storage; the engine only asks for page text, redirect
// targets, namespace names, and the title corpus. `MemoryProvider` is a
// self-contained implementation for embedding and tests.

use std::cell::Cell;
use std::collections::HashMap;

use crate::error::ProviderError;
use crate::magic::{self, Marker};
use crate::title::{canonical_namespace_id, canonical_namespace_name, NamespaceId, PageTitle};

/// One title from the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusRow {
    pub namespace: NamespaceId,
    pub title: String,
}

impl CorpusRow {
    pub fn new(namespace: NamespaceId, title: impl Into<String>) -> Self {
        Self { namespace, title: title.into() }
    }
}

/// Filter for a corpus query.
#[derive(Debug, Clone, Copy)]
pub struct CorpusQuery<'a> {
    pub namespaces: &'a [NamespaceId],
    pub black_list: &'a [String],
    /// Minimum title length in characters.
    pub minimum_length: usize,
}

impl CorpusQuery<'_> {
    /// Whether a row passes the namespace, blacklist and length filters.
    pub fn admits(&self, namespace: NamespaceId, title: &str) -> bool {
        if !self.namespaces.contains(&namespace) {
            return false;
        }
        if title.chars().count() < self.minimum_length {
            return false;
        }
        let key = blacklist_key(title);
        !self.black_list.iter().any(|entry| blacklist_key(entry) == key)
    }
}

/// Blacklist entries and titles compare with underscores and spaces unified.
pub fn blacklist_key(title: &str) -> String {
    title.trim().replace('_', " ")
}

/// Read access to the host's pages.
pub trait ContentProvider {
    /// Serialized text of a page, `None` if the page does not exist.
    fn page_text(&self, title: &PageTitle) -> Result<Option<String>, ProviderError>;

    /// All titles admitted by `query`, in storage order. No pagination.
    fn corpus(&self, query: &CorpusQuery<'_>) -> Result<Vec<CorpusRow>, ProviderError>;

    /// Where a page redirects to, if it is a redirect.
    fn redirect_target(&self, title: &PageTitle) -> Result<Option<PageTitle>, ProviderError> {
        Ok(self
            .page_text(title)?
            .and_then(|text| magic::redirect_target(&text, |name| self.namespace_id(name))))
    }

    /// Display name of a namespace; `None` for the main namespace.
    fn namespace_name(&self, namespace: NamespaceId) -> Option<String> {
        canonical_namespace_name(namespace).map(str::to_string)
    }

    /// Namespace id for a prefix name.
    fn namespace_id(&self, name: &str) -> Option<NamespaceId> {
        canonical_namespace_id(name)
    }

    /// Whether `text` carries `marker`.
    fn has_marker(&self, text: &str, marker: Marker) -> bool {
        magic::contains_marker(text, marker)
    }
}

/// In-memory page set.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    order: Vec<PageTitle>,
    pages: HashMap<PageTitle, String>,
    text_lookups: Cell<usize>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a page.
    pub fn insert(&mut self, title: PageTitle, text: impl Into<String>) {
        if !self.pages.contains_key(&title) {
            self.order.push(title.clone());
        }
        self.pages.insert(title, text.into());
    }

    /// Convenience insert from raw parts; invalid titles are ignored.
    pub fn with_page(mut self, namespace: NamespaceId, title: &str, text: &str) -> Self {
        if let Ok(title) = PageTitle::new(namespace, title) {
            self.insert(title, text);
        }
        self
    }

    pub fn get(&self, title: &PageTitle) -> Option<&str> {
        self.pages.get(title).map(String::as_str)
    }

    pub fn titles(&self) -> impl Iterator<Item = &PageTitle> {
        self.order.iter()
    }

    /// Number of `page_text` calls served so far.
    pub fn text_lookups(&self) -> usize {
        self.text_lookups.get()
    }
}

impl ContentProvider for MemoryProvider {
    fn page_text(&self, title: &PageTitle) -> Result<Option<String>, ProviderError> {
        self.text_lookups.set(self.text_lookups.get() + 1);
        Ok(self.pages.get(title).cloned())
    }

    fn corpus(&self, query: &CorpusQuery<'_>) -> Result<Vec<CorpusRow>, ProviderError> {
        Ok(self
            .order
            .iter()
            .filter(|title| query.admits(title.namespace(), title.text()))
            .map(|title| CorpusRow::new(title.namespace(), title.text()))
            .collect())
    }
}
