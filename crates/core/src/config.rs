// Linking policy. Immutable once built; shared by reference with every
// engine component.
//
// Loaded from TOML (`~/.linktitles/config.toml` by default in the CLI).

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::title::{NamespaceId, NS_MAIN};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Link pages when they are saved.
    pub parse_on_edit: bool,
    /// Link pages when they are rendered (text is not stored).
    pub parse_on_render: bool,
    /// Try short titles before long ones.
    pub prefer_short_titles: bool,
    /// Titles shorter than this many characters are never linked.
    pub minimum_title_length: usize,
    /// Titles that are never linked.
    pub black_list: Vec<String>,
    /// Namespaces whose pages receive links.
    pub source_namespaces: Vec<NamespaceId>,
    /// Namespaces whose pages may be linked to, in priority order.
    pub target_namespaces: Vec<NamespaceId>,
    /// Prefer targets from the source page's own namespace.
    pub same_namespace: bool,
    /// Fall back to case-insensitive matching, producing piped links.
    pub smart_mode: bool,
    /// First letter of a title is case-insensitive.
    pub capital_links: bool,
    /// Only match at the start of a word.
    pub word_start_only: bool,
    /// Only match at the end of a word.
    pub word_end_only: bool,
    /// Protect whole templates instead of only template names.
    pub skip_templates: bool,
    /// Allow links inside headings.
    pub parse_headings: bool,
    /// Do not link to pages that redirect back to the source.
    pub check_redirect: bool,
    /// Honour `__NOTARGET__` on target pages.
    pub enable_no_target_magic_word: bool,
    /// Time budget for one batch slice, in seconds.
    pub batch_reload_after_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parse_on_edit: true,
            parse_on_render: false,
            prefer_short_titles: false,
            minimum_title_length: 3,
            black_list: Vec::new(),
            source_namespaces: vec![NS_MAIN],
            target_namespaces: Vec::new(),
            same_namespace: true,
            smart_mode: true,
            capital_links: true,
            word_start_only: true,
            word_end_only: true,
            skip_templates: false,
            parse_headings: false,
            check_redirect: true,
            enable_no_target_magic_word: false,
            batch_reload_after_secs: 10,
        }
    }
}

impl Config {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_namespaces.is_empty() {
            return Err(ConfigError::Invalid("source_namespaces must not be empty".into()));
        }
        if self.black_list.iter().any(|title| title.trim().is_empty()) {
            return Err(ConfigError::Invalid("black_list contains an empty title".into()));
        }
        Ok(())
    }

    /// Whether `namespace` is a configured link origin.
    pub fn is_source_namespace(&self, namespace: NamespaceId) -> bool {
        self.source_namespaces.contains(&namespace)
    }

    /// Eligible target namespaces for a source namespace, in priority order.
    pub fn eligible_target_namespaces(&self, source_namespace: NamespaceId) -> Vec<NamespaceId> {
        let mut namespaces = Vec::with_capacity(self.target_namespaces.len() + 1);
        if self.same_namespace {
            namespaces.push(source_namespace);
        }
        for namespace in &self.target_namespaces {
            if !namespaces.contains(namespace) {
                namespaces.push(*namespace);
            }
        }
        namespaces
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
