// Page title identity: namespace + normalized title text.
//
// Normalization: NFC, underscores to spaces, whitespace collapsed and trimmed.
// Rejection: empty, illegal characters, relative path segments, >255 bytes.

use std::fmt;

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Namespace identifier as used by the host wiki.
pub type NamespaceId = i32;

pub const NS_MAIN: NamespaceId = 0;
pub const NS_TALK: NamespaceId = 1;
pub const NS_USER: NamespaceId = 2;
pub const NS_USER_TALK: NamespaceId = 3;
pub const NS_PROJECT: NamespaceId = 4;
pub const NS_PROJECT_TALK: NamespaceId = 5;
pub const NS_FILE: NamespaceId = 6;
pub const NS_FILE_TALK: NamespaceId = 7;
pub const NS_MEDIAWIKI: NamespaceId = 8;
pub const NS_MEDIAWIKI_TALK: NamespaceId = 9;
pub const NS_TEMPLATE: NamespaceId = 10;
pub const NS_TEMPLATE_TALK: NamespaceId = 11;
pub const NS_HELP: NamespaceId = 12;
pub const NS_HELP_TALK: NamespaceId = 13;
pub const NS_CATEGORY: NamespaceId = 14;
pub const NS_CATEGORY_TALK: NamespaceId = 15;

/// Maximum title length in bytes (after normalization).
const MAX_TITLE_BYTES: usize = 255;

/// Characters that can never appear in a title.
const ILLEGAL_CHARS: &[char] = &['#', '<', '>', '[', ']', '|', '{', '}'];

/// Canonical name of a built-in namespace. The main namespace has no name.
pub fn canonical_namespace_name(namespace: NamespaceId) -> Option<&'static str> {
    let name = match namespace {
        NS_MAIN => return None,
        NS_TALK => "Talk",
        NS_USER => "User",
        NS_USER_TALK => "User talk",
        NS_PROJECT => "Project",
        NS_PROJECT_TALK => "Project talk",
        NS_FILE => "File",
        NS_FILE_TALK => "File talk",
        NS_MEDIAWIKI => "MediaWiki",
        NS_MEDIAWIKI_TALK => "MediaWiki talk",
        NS_TEMPLATE => "Template",
        NS_TEMPLATE_TALK => "Template talk",
        NS_HELP => "Help",
        NS_HELP_TALK => "Help talk",
        NS_CATEGORY => "Category",
        NS_CATEGORY_TALK => "Category talk",
        _ => return None,
    };
    Some(name)
}

/// Reverse lookup of a built-in namespace by name (case-insensitive, `_` = space).
pub fn canonical_namespace_id(name: &str) -> Option<NamespaceId> {
    let wanted = name.trim().replace('_', " ").to_lowercase();
    (NS_TALK..=NS_CATEGORY_TALK).find(|namespace| {
        canonical_namespace_name(*namespace)
            .map(|candidate| candidate.to_lowercase() == wanted)
            .unwrap_or(false)
    })
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TitleError {
    #[error("title is empty")]
    Empty,

    #[error("title exceeds maximum length of {MAX_TITLE_BYTES} bytes")]
    TooLong,

    #[error("title contains illegal character: {0:?}")]
    IllegalChar(char),

    #[error("title contains a relative path segment")]
    RelativePath,
}

/// A resolved page identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageTitle {
    namespace: NamespaceId,
    text: String,
}

impl PageTitle {
    /// Build a title from a namespace and raw title text.
    pub fn new(namespace: NamespaceId, raw: &str) -> Result<Self, TitleError> {
        Ok(Self { namespace, text: normalize_title_text(raw)? })
    }

    /// Parse `Ns:Title` using `lookup` to resolve the prefix. An unknown
    /// prefix is treated as part of a main-namespace title.
    pub fn parse_prefixed<F>(raw: &str, lookup: F) -> Result<Self, TitleError>
    where
        F: Fn(&str) -> Option<NamespaceId>,
    {
        let trimmed = raw.trim().trim_start_matches(':');
        if let Some((prefix, rest)) = trimmed.split_once(':') {
            if let Some(namespace) = lookup(prefix) {
                return Self::new(namespace, rest);
            }
        }
        Self::new(NS_MAIN, trimmed)
    }

    pub fn namespace(&self) -> NamespaceId {
        self.namespace
    }

    /// Title text without namespace prefix.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Title text with underscores instead of spaces (storage key form).
    pub fn db_key(&self) -> String {
        self.text.replace(' ', "_")
    }

    /// Render `Ns:Title` given the namespace's display name.
    pub fn prefixed_text(&self, namespace_name: Option<&str>) -> String {
        match namespace_name {
            Some(name) if !name.is_empty() => format!("{name}:{}", self.text),
            _ => self.text.clone(),
        }
    }

    /// Whether two titles name the same page. Under `capital_links` the first
    /// character is compared case-insensitively.
    pub fn same_page(&self, other: &PageTitle, capital_links: bool) -> bool {
        if self.namespace != other.namespace {
            return false;
        }
        if !capital_links {
            return self.text == other.text;
        }
        let mut left = self.text.chars();
        let mut right = other.text.chars();
        match (left.next(), right.next()) {
            (Some(a), Some(b)) => {
                a.to_uppercase().eq(b.to_uppercase()) && left.as_str() == right.as_str()
            }
            (None, None) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PageTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match canonical_namespace_name(self.namespace) {
            Some(name) => write!(f, "{name}:{}", self.text),
            None if self.namespace == NS_MAIN => f.write_str(&self.text),
            None => write!(f, "{{ns{}}}:{}", self.namespace, self.text),
        }
    }
}

/// Normalize raw title text into its canonical form.
///
/// Rules:
/// - Apply Unicode NFC normalization
/// - Convert underscores to spaces
/// - Collapse whitespace runs into a single space, trim both ends
/// - Reject illegal characters and control characters
/// - Reject `.`/`..` and relative path segments
/// - Enforce max 255 byte limit
pub fn normalize_title_text(raw: &str) -> Result<String, TitleError> {
    let normalized: String = raw.nfc().collect();
    let spaced = normalized.replace('_', " ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        return Err(TitleError::Empty);
    }

    if let Some(ch) = collapsed.chars().find(|ch| ILLEGAL_CHARS.contains(ch) || ch.is_control()) {
        return Err(TitleError::IllegalChar(ch));
    }

    if collapsed == "."
        || collapsed == ".."
        || collapsed.starts_with("./")
        || collapsed.starts_with("../")
        || collapsed.contains("/./")
        || collapsed.contains("/../")
        || collapsed.ends_with("/.")
        || collapsed.ends_with("/..")
    {
        return Err(TitleError::RelativePath);
    }

    if collapsed.len() > MAX_TITLE_BYTES {
        return Err(TitleError::TooLong);
    }

    Ok(collapsed)
}
