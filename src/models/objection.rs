//! Objection discussion structures.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One line of an objection thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectionLine {
    /// Bullet depth (1 = objection, 2 = reply, ...)
    pub counter: usize,

    /// Most recent user signature seen at this depth
    pub user: Option<String>,

    /// Raw signature timestamp, e.g. `14:02, 5 March 2024`
    pub date: Option<String>,

    pub content: String,
}

impl ObjectionLine {
    /// Whether the line opens with a strike-through after its bullets.
    pub fn is_struck(&self) -> bool {
        let content = self.content.strip_prefix(':').unwrap_or(&self.content);
        content
            .strip_prefix("*".repeat(self.counter).as_str())
            .is_some_and(|rest| rest.trim_start_matches(' ').starts_with("<s>"))
    }
}

/// An objection and its reply chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectionTree {
    /// The objector
    pub user: Option<String>,

    /// Second-level bullet acting as its own objection
    pub nested: bool,

    /// Resolved by strike-through or review note
    pub struck: bool,

    pub lines: BTreeMap<usize, ObjectionLine>,
}

impl ObjectionTree {
    /// Depth of the last reply.
    pub fn depth(&self) -> usize {
        self.lines.keys().next_back().copied().unwrap_or(0)
    }

    /// The nominator has the last word when the deepest reply is at an even depth.
    pub fn is_addressed(&self) -> bool {
        self.depth() % 2 == 0
    }
}

/// Classification of one unresolved objection tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectionResult {
    pub nominator: String,
    pub objector: Option<String>,
    pub addressed: bool,
    pub overdue: bool,
    pub first_notification: bool,
    pub last_date: DateTime<Utc>,
    pub age_days: i64,
}

/// Review report grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewBucket {
    Ready,
    Normal,
    Probe,
    Probation,
}

impl ReviewBucket {
    pub const ALL: [ReviewBucket; 4] = [Self::Ready, Self::Normal, Self::Probe, Self::Probation];

    /// Report header for the bucket.
    pub fn header(&self, probe_days: i64) -> String {
        match self {
            Self::Ready => "The following articles have no outstanding objections:".to_string(),
            Self::Probe => format!(
                "The following articles have been under review for {probe_days} or more days and have outstanding objections:"
            ),
            Self::Normal => {
                "The following articles are under review but have outstanding objections:".to_string()
            }
            Self::Probation => {
                "The following articles on probation continue to have outstanding objections:"
                    .to_string()
            }
        }
    }
}
