// The page links are added to.
//
// Identity and text resolve lazily through explicit slots; a failed lookup
// is remembered so repeated access does not hit storage again.

use crate::error::{LinkError, ProviderError};
use crate::magic::Marker;
use crate::provider::ContentProvider;
use crate::title::{NamespaceId, PageTitle};

/// Resolution state of a lazily loaded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot<T> {
    Unresolved,
    Resolved(T),
    Failed(String),
}

impl<T> Slot<T> {
    pub fn resolved(&self) -> Option<&T> {
        match self {
            Slot::Resolved(value) => Some(value),
            _ => None,
        }
    }
}

/// How the source came to exist, which decides what can be derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Built from an identity; text is loaded on demand.
    Title,
    /// Built from a page record and its content; identity comes from the page.
    Page,
    /// Built by a renderer with text in hand.
    Text,
}

#[derive(Debug, Clone)]
pub struct Source {
    origin: Origin,
    title: Option<PageTitle>,
    /// Whether the stored page exists; `None` until text is loaded.
    exists: Option<bool>,
    text: Slot<String>,
}

impl Source {
    /// A stored page, identified by title. Text loads on first access.
    pub fn from_title(title: PageTitle) -> Self {
        Self { origin: Origin::Title, title: Some(title), exists: None, text: Slot::Unresolved }
    }

    /// A page record whose content is already known (e.g. during a save).
    /// A page without identity is a caller bug and fails on first use.
    pub fn from_page(title: Option<PageTitle>, text: Option<String>) -> Self {
        let text = match text {
            Some(text) => Slot::Resolved(text),
            None => Slot::Unresolved,
        };
        Self { origin: Origin::Page, title, exists: Some(true), text }
    }

    /// Text being rendered for a page (parser hooks, tag bodies).
    pub fn from_text(title: PageTitle, text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Text,
            title: Some(title),
            exists: None,
            text: Slot::Resolved(text.into()),
        }
    }

    /// Page identity.
    pub fn title(&self) -> Result<&PageTitle, LinkError> {
        self.title.as_ref().ok_or(LinkError::MissingIdentity)
    }

    pub fn namespace(&self) -> Result<NamespaceId, LinkError> {
        Ok(self.title()?.namespace())
    }

    /// Page text, loading it through `provider` on first access. A page that
    /// does not exist has empty text.
    pub fn text(&mut self, provider: &dyn ContentProvider) -> Result<&str, LinkError> {
        if let Slot::Unresolved = self.text {
            self.text = match self.load_text(provider) {
                Ok(text) => Slot::Resolved(text),
                Err(error) => {
                    let message = error.to_string();
                    self.text = Slot::Failed(message);
                    return Err(error);
                }
            };
        }

        match &self.text {
            Slot::Resolved(text) => Ok(text),
            Slot::Failed(message) => Err(LinkError::Provider(ProviderError::backend(message.clone()))),
            Slot::Unresolved => Err(LinkError::MissingText),
        }
    }

    /// Text if already materialized, without touching storage.
    pub fn cached_text(&self) -> Option<&str> {
        self.text.resolved().map(String::as_str)
    }

    /// Whether the underlying page has content.
    pub fn has_content(&mut self, provider: &dyn ContentProvider) -> Result<bool, LinkError> {
        self.text(provider)?;
        Ok(self.exists.unwrap_or(true))
    }

    /// Replace the text (after linking). The page record stays the same.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Slot::Resolved(text.into());
    }

    pub fn into_text(self) -> Option<String> {
        match self.text {
            Slot::Resolved(text) => Some(text),
            _ => None,
        }
    }

    /// Whether the page sits in a configured source namespace.
    pub fn has_desired_namespace(&self, source_namespaces: &[NamespaceId]) -> Result<bool, LinkError> {
        Ok(source_namespaces.contains(&self.namespace()?))
    }

    /// Whether the text opts out of automatic linking.
    pub fn has_no_autolinks_marker(
        &mut self,
        provider: &dyn ContentProvider,
    ) -> Result<bool, LinkError> {
        let text = self.text(provider)?;
        Ok(!text.is_empty() && provider.has_marker(text, Marker::NoAutolinks))
    }

    fn load_text(&mut self, provider: &dyn ContentProvider) -> Result<String, LinkError> {
        let title = match (self.origin, self.title.as_ref()) {
            (_, Some(title)) => title,
            (Origin::Page, None) => return Err(LinkError::MissingIdentity),
            (_, None) => return Err(LinkError::MissingText),
        };
        let text = provider.page_text(title)?;
        self.exists = Some(text.is_some());
        Ok(text.unwrap_or_default())
    }
}
