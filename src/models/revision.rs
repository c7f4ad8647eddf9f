//! Page revision record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a page's edit history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Revision {
    /// Revision id, unique across the wiki
    pub revid: u64,

    /// Editor user name
    pub user: String,

    /// When the edit was saved
    pub timestamp: DateTime<Utc>,

    /// Edit summary
    #[serde(default)]
    pub comment: String,

    /// Change tags applied to the edit
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Revision {
    /// Whether this edit carries the given tag or uses it as its summary.
    pub fn is_marked(&self, marker: &str) -> bool {
        self.comment == marker || self.tags.iter().any(|t| t == marker)
    }
}
