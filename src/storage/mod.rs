//! Wiki page storage abstractions.
//!
//! Every workflow reads and writes pages through [`WikiStore`]. Two backends
//! exist:
//!
//! - [`MediaWikiClient`] talks to a live wiki over the action API
//! - [`LocalWiki`] keeps pages as JSON files in a directory, for dry runs and tests
//!
//! Each page is re-read right before a replacement is computed; there is no
//! cross-page transaction.

pub mod local;
pub mod mediawiki;

use async_trait::async_trait;

use crate::error::{Rejection, Result};
use crate::models::Revision;

// Re-export for convenience
pub use local::LocalWiki;
pub use mediawiki::MediaWikiClient;

/// Trait for wiki page backends.
#[async_trait]
pub trait WikiStore: Send + Sync {
    /// Whether the page exists.
    async fn exists(&self, title: &str) -> Result<bool>;

    /// Whether the page exists and is a redirect.
    async fn is_redirect(&self, title: &str) -> Result<bool>;

    /// Current wikitext. A missing page is a reported [`Rejection::PageMissing`].
    async fn get_text(&self, title: &str) -> Result<String>;

    /// Save new wikitext, creating the page if needed.
    async fn put_text(&self, title: &str, text: &str, summary: &str) -> Result<()>;

    /// Edit history, newest first.
    async fn revisions(&self, title: &str) -> Result<Vec<Revision>>;

    /// The page's creation revision.
    async fn first_revision(&self, title: &str) -> Result<Option<Revision>> {
        Ok(self.revisions(title).await?.pop())
    }

    /// Titles of pages in a category (`Category:` prefix included in the argument).
    async fn category_members(&self, category: &str) -> Result<Vec<String>>;

    /// Public URL of a page.
    fn page_url(&self, title: &str) -> String;

    /// Current wikitext, or `None` when the page does not exist.
    async fn get_text_opt(&self, title: &str) -> Result<Option<String>> {
        if self.exists(title).await? {
            Ok(Some(self.get_text(title).await?))
        } else {
            Ok(None)
        }
    }
}

/// Whether wikitext is a redirect.
pub fn is_redirect_text(text: &str) -> bool {
    text.trim_start().to_uppercase().starts_with("#REDIRECT")
}

/// Reported error for a missing page.
pub(crate) fn missing(title: &str) -> Rejection {
    Rejection::PageMissing(title.to_string())
}
