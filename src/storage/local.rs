//! Local filesystem wiki backend.
//!
//! Keeps every page as a JSON record so archival runs can be rehearsed offline
//! and exercised in tests.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── wiki.json             # Revision id counter
//! └── pages/
//!     └── {sha256(title)}.json
//! ```
//!
//! Revisions are stamped with the injected [`Clock`] and the configured editor
//! name. Category membership is the union of a page's explicit categories and
//! the `[[Category:...]]` links in its text.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::Revision;
use crate::storage::{WikiStore, is_redirect_text, missing};
use crate::utils::{Clock, SystemClock};

/// A stored page.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PageRecord {
    title: String,
    text: String,
    #[serde(default)]
    categories: Vec<String>,
    /// Oldest first
    #[serde(default)]
    revisions: Vec<Revision>,
}

impl PageRecord {
    fn in_category(&self, category: &str) -> bool {
        if self.categories.iter().any(|c| c == category) {
            return true;
        }
        let link = format!("[[{category}");
        self.text.match_indices(&link).any(|(i, _)| {
            matches!(
                self.text[i + link.len()..].chars().next(),
                Some(']') | Some('|')
            )
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WikiMeta {
    next_revid: u64,
}

/// Directory-backed wiki.
#[derive(Clone)]
pub struct LocalWiki {
    root_dir: PathBuf,
    base_url: String,
    editor: String,
    clock: Arc<dyn Clock>,
    write_lock: Arc<Mutex<()>>,
}

impl LocalWiki {
    /// Create a LocalWiki rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            base_url: "https://wiki.local/wiki/".to_string(),
            editor: "ArchiverBot".to_string(),
            clock: Arc::new(SystemClock),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Use a different time source for revision stamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Name recorded on revisions made through [`WikiStore::put_text`].
    pub fn with_editor(mut self, editor: impl Into<String>) -> Self {
        self.editor = editor.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Save a page as a specific user, with change tags.
    pub async fn edit_as(
        &self,
        title: &str,
        text: &str,
        user: &str,
        summary: &str,
        tags: &[&str],
    ) -> Result<Revision> {
        let _guard = self.write_lock.lock().await;

        let mut meta: WikiMeta = self.read_json("wiki.json").await?.unwrap_or_default();
        meta.next_revid += 1;
        let revision = Revision {
            revid: meta.next_revid,
            user: user.to_string(),
            timestamp: self.clock.now(),
            comment: summary.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        };

        let key = Self::page_key(title);
        let mut record = self
            .read_json::<PageRecord>(&key)
            .await?
            .unwrap_or_else(|| PageRecord {
                title: title.to_string(),
                text: String::new(),
                categories: Vec::new(),
                revisions: Vec::new(),
            });
        record.text = text.to_string();
        record.revisions.push(revision.clone());

        self.write_json(&key, &record).await?;
        self.write_json("wiki.json", &meta).await?;
        log::debug!("Saved {} (r{}): {}", title, revision.revid, summary);
        Ok(revision)
    }

    /// Put a page into a category without touching its text.
    pub async fn add_to_category(&self, title: &str, category: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = Self::page_key(title);
        let mut record = self
            .read_json::<PageRecord>(&key)
            .await?
            .ok_or_else(|| missing(title))?;
        if !record.categories.iter().any(|c| c == category) {
            record.categories.push(category.to_string());
        }
        self.write_json(&key, &record).await
    }

    /// Storage key of a page.
    fn page_key(title: &str) -> String {
        let digest = Sha256::digest(title.trim().as_bytes());
        format!("pages/{}.json", hex::encode(digest))
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn record(&self, title: &str) -> Result<Option<PageRecord>> {
        self.read_json(&Self::page_key(title)).await
    }

    /// Every stored page.
    async fn all_records(&self) -> Result<Vec<PageRecord>> {
        let dir = self.path("pages");
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            records.push(serde_json::from_slice::<PageRecord>(&bytes)?);
        }
        records.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(records)
    }
}

#[async_trait]
impl WikiStore for LocalWiki {
    async fn exists(&self, title: &str) -> Result<bool> {
        Ok(self.record(title).await?.is_some())
    }

    async fn is_redirect(&self, title: &str) -> Result<bool> {
        Ok(self
            .record(title)
            .await?
            .is_some_and(|r| is_redirect_text(&r.text)))
    }

    async fn get_text(&self, title: &str) -> Result<String> {
        match self.record(title).await? {
            Some(record) => Ok(record.text),
            None => Err(missing(title).into()),
        }
    }

    async fn put_text(&self, title: &str, text: &str, summary: &str) -> Result<()> {
        let editor = self.editor.clone();
        self.edit_as(title, text, &editor, summary, &[]).await?;
        Ok(())
    }

    async fn revisions(&self, title: &str) -> Result<Vec<Revision>> {
        let mut revisions = self
            .record(title)
            .await?
            .map(|r| r.revisions)
            .unwrap_or_default();
        revisions.reverse();
        Ok(revisions)
    }

    async fn category_members(&self, category: &str) -> Result<Vec<String>> {
        Ok(self
            .all_records()
            .await?
            .into_iter()
            .filter(|r| r.in_category(category))
            .map(|r| r.title)
            .collect())
    }

    fn page_url(&self, title: &str) -> String {
        format!("{}{}", self.base_url, title.replace(' ', "_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::FixedClock;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let wiki = LocalWiki::new(tmp.path());

        assert!(!wiki.exists("Foo").await.unwrap());
        wiki.put_text("Foo", "hello", "Creating").await.unwrap();
        assert!(wiki.exists("Foo").await.unwrap());
        assert_eq!(wiki.get_text("Foo").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_missing_page_is_reported() {
        let tmp = TempDir::new().unwrap();
        let wiki = LocalWiki::new(tmp.path());

        let err = wiki.get_text("Nope").await.unwrap_err();
        assert!(err.is_reported());
        assert_eq!(wiki.get_text_opt("Nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_revisions_newest_first() {
        let tmp = TempDir::new().unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(start));
        let wiki = LocalWiki::new(tmp.path()).with_clock(clock.clone());

        wiki.edit_as("Foo", "a", "Writer", "Added FAnom", &["Added FAnom"])
            .await
            .unwrap();
        clock.advance(Duration::days(1));
        wiki.put_text("Foo", "b", "Successful FAN").await.unwrap();

        let revisions = wiki.revisions("Foo").await.unwrap();
        assert_eq!(revisions.len(), 2);
        assert_eq!(revisions[0].comment, "Successful FAN");
        assert_eq!(revisions[0].user, "ArchiverBot");
        assert!(revisions[0].revid > revisions[1].revid);

        let first = wiki.first_revision("Foo").await.unwrap().unwrap();
        assert_eq!(first.user, "Writer");
        assert_eq!(first.timestamp, start);
    }

    #[tokio::test]
    async fn test_category_members() {
        let tmp = TempDir::new().unwrap();
        let wiki = LocalWiki::new(tmp.path());

        wiki.put_text("A", "x\n[[Category:Things|A]]", "c").await.unwrap();
        wiki.put_text("B", "[[Category:Things]]", "c").await.unwrap();
        wiki.put_text("C", "[[Category:Things and more]]", "c").await.unwrap();
        wiki.put_text("D", "plain", "c").await.unwrap();
        wiki.add_to_category("D", "Category:Things").await.unwrap();

        let members = wiki.category_members("Category:Things").await.unwrap();
        assert_eq!(members, vec!["A", "B", "D"]);
    }

    #[tokio::test]
    async fn test_redirect_detection() {
        let tmp = TempDir::new().unwrap();
        let wiki = LocalWiki::new(tmp.path());

        wiki.put_text("Old", "#REDIRECT [[New]]", "r").await.unwrap();
        assert!(wiki.is_redirect("Old").await.unwrap());
        assert!(!wiki.is_redirect("Missing").await.unwrap());
    }

    #[test]
    fn test_page_url() {
        let wiki = LocalWiki::new("/tmp/unused").with_base_url("https://example.org/wiki/");
        assert_eq!(wiki.page_url("Darth Bane"), "https://example.org/wiki/Darth_Bane");
    }
}
