//! Archival outcome reported back to the requester.

use serde::Serialize;

use crate::models::{ArchiveOutcome, Command, Revision};

/// Result of one archival pipeline run.
///
/// Consumed by notification and ranking side effects outside this crate.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveResult {
    pub completed: bool,
    pub successful: bool,
    pub nom_type: String,
    pub message: String,
    pub target: Option<String>,
    pub nomination_page: Option<String>,
    pub nominator: Option<String>,
    pub projects: Vec<String>,
    pub nominated: Option<Revision>,
    pub completed_revision: Option<Revision>,
}

impl ArchiveResult {
    /// A run that finished every step.
    pub fn completed(command: &Command, target: &str, nomination_page: &str) -> Self {
        Self {
            completed: true,
            successful: command.result == ArchiveOutcome::Successful,
            nom_type: command.nom_type.clone(),
            message: String::new(),
            target: Some(target.to_string()),
            nomination_page: Some(nomination_page.to_string()),
            nominator: None,
            projects: Vec::new(),
            nominated: None,
            completed_revision: None,
        }
    }

    /// A run that stopped early with a message for the requester.
    pub fn failed(command: &Command, message: impl Into<String>) -> Self {
        Self {
            completed: false,
            successful: false,
            nom_type: command.nom_type.clone(),
            message: message.into(),
            target: None,
            nomination_page: None,
            nominator: None,
            projects: Vec::new(),
            nominated: None,
            completed_revision: None,
        }
    }
}
