//! Pipeline entry points for the archiver workflows.
//!
//! - `run_archive`: Archive one nomination outcome across every bookkeeping page
//! - `run_review`: Create, pass, probate or revoke a status review
//! - `check_active_nominations` / `check_active_reviews`: Objection reports
//! - `run_intake`: Prepare newly created nomination pages
//! - `run_analysis`: Compare status listing pages with their categories

pub mod analyze;
pub mod archive;
pub mod intake;
pub mod objections;
pub mod review;

pub use analyze::{AnalysisCache, run_analysis};
pub use archive::run_archive;
pub use intake::{NominationWatcher, run_intake};
pub use objections::{
    ReviewReport, check_active_nominations, check_active_reviews, check_nomination_page,
    check_review_page,
};
pub use review::run_review;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::BotData;
use crate::error::{Rejection, Result};
use crate::models::{Config, Revision};
use crate::storage::WikiStore;
use crate::utils::{Clock, progress};

/// Shared handles for workflow runs.
pub struct Context {
    pub config: Config,
    pub data: BotData,
    pub store: Arc<dyn WikiStore>,
    pub clock: Arc<dyn Clock>,
}

impl Context {
    pub fn new(config: Config, data: BotData, store: Arc<dyn WikiStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            data,
            store,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Save a page, then wait out the configured edit delay.
    pub(crate) async fn save(&self, title: &str, text: &str, summary: &str) -> Result<()> {
        self.store.put_text(title, text, summary).await?;
        progress::sub_item(&format!("Saved {title}: {summary}"));

        let delay = self.config.archive.edit_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    /// Reject redirects; missing pages pass.
    pub(crate) async fn ensure_not_redirect(&self, title: &str) -> Result<()> {
        if self.store.is_redirect(title).await? {
            return Err(Rejection::RedirectPage(title.to_string()).into());
        }
        Ok(())
    }

    /// Create a per-user category page on first use.
    pub(crate) async fn ensure_category_page(&self, title: &str, text: &str) -> Result<()> {
        if self.store.exists(title).await? {
            return Ok(());
        }
        self.save(title, text, "Creating new nomination category").await
    }
}

/// Start and completion revisions of a finished workflow.
#[derive(Debug, Clone)]
pub(crate) struct RevisionSpan {
    pub start: Revision,
    pub completed: Revision,
}

/// Locate the workflow's revisions in a newest-first history.
///
/// The completed revision is the oldest one whose summary matches, among
/// those newer than the start revision.
pub(crate) fn find_revisions(
    revisions: &[Revision],
    is_start: impl Fn(&Revision) -> bool,
    completed_summary: &str,
) -> std::result::Result<RevisionSpan, Rejection> {
    let mut completed = None;
    let mut start = None;
    for revision in revisions {
        if revision.comment == completed_summary {
            completed = Some(revision);
        } else if is_start(revision) {
            start = Some(revision);
            break;
        }
    }

    match (start, completed) {
        (Some(start), Some(completed)) => Ok(RevisionSpan {
            start: start.clone(),
            completed: completed.clone(),
        }),
        (None, _) => Err(Rejection::RevisionNotFound("start")),
        (_, None) => Err(Rejection::RevisionNotFound("completed")),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn revision(revid: u64, comment: &str) -> Revision {
        Revision {
            revid,
            user: "Someone".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            comment: comment.to_string(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_find_revisions_takes_oldest_matching_completion() {
        let revisions = vec![
            revision(5, "Successful FAN"),
            revision(4, "Typo"),
            revision(3, "Successful FAN"),
            revision(2, "Added FAnom"),
            revision(1, "Successful FAN"),
        ];
        let span = find_revisions(&revisions, |r| r.is_marked("Added FAnom"), "Successful FAN").unwrap();
        assert_eq!(span.start.revid, 2);
        assert_eq!(span.completed.revid, 3);
    }

    #[test]
    fn test_find_revisions_missing() {
        let revisions = vec![revision(2, "Successful FAN"), revision(1, "Created")];
        assert_eq!(
            find_revisions(&revisions, |r| r.is_marked("Added FAnom"), "Successful FAN").unwrap_err(),
            Rejection::RevisionNotFound("start")
        );

        let revisions = vec![revision(1, "Added FAnom")];
        assert_eq!(
            find_revisions(&revisions, |r| r.is_marked("Added FAnom"), "Successful FAN").unwrap_err(),
            Rejection::RevisionNotFound("completed")
        );
    }
}
