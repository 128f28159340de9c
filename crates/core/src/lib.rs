// linktitles-core: automatic cross-reference linking for wiki text

pub mod batch;
pub mod candidates;
pub mod config;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod magic;
pub mod provider;
pub mod segment;
pub mod source;
pub mod target;
pub mod title;
pub mod wikilink;

pub use config::{Config, ConfigError};
pub use engine::{Insertion, LinkEngine, Linked, ReentrancyLock};
pub use error::{LinkError, ProviderError};
pub use provider::{ContentProvider, CorpusQuery, CorpusRow, MemoryProvider};
pub use source::Source;
pub use title::{NamespaceId, PageTitle, TitleError};
