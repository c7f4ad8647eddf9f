//! Operator command intents.

use serde::{Deserialize, Serialize};

/// Outcome requested for a nomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveOutcome {
    Successful,
    Unsuccessful,
    Withdrawn,
    /// Dry run: preconditions and approval only
    Test,
    /// Collect nominator and project data without editing
    Post,
}

impl ArchiveOutcome {
    /// Whether the approval gate applies.
    pub fn needs_approval(&self) -> bool {
        matches!(self, Self::Successful | Self::Test)
    }
}

/// A parsed archival command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub result: ArchiveOutcome,

    /// Nomination type abbreviation (e.g. `FA`)
    pub nom_type: String,

    pub article_name: String,

    /// Disambiguator for repeat nominations, e.g. `(second nomination)`
    pub suffix: Option<String>,

    /// Replay after a partial failure
    pub retry: bool,

    /// Skip the requester identity check
    pub bypass: bool,

    pub send_message: bool,
    pub custom_message: Option<String>,
    pub requested_by: String,
}

impl Command {
    pub fn is_successful(&self) -> bool {
        self.result == ArchiveOutcome::Successful
    }

    pub fn is_withdrawn(&self) -> bool {
        self.result == ArchiveOutcome::Withdrawn
    }

    /// Subpage name under the nomination index page.
    pub fn subpage(&self) -> String {
        match &self.suffix {
            Some(suffix) => format!("{} {}", self.article_name, suffix),
            None => self.article_name.clone(),
        }
    }
}

/// Review management actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Create,
    Pass,
    Probation,
    Revoke,
}

/// A parsed review management command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCommand {
    pub article: String,
    pub action: ReviewAction,
    pub retry: bool,
    pub requested_by: String,
}
