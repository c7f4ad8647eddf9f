// src/error.rs

//! Unified error handling for the archiver.
//!
//! Two kinds of failure exist. A [`Rejection`] is a reported outcome: it
//! carries a message meant for the requester and is surfaced verbatim. Every
//! other [`AppError`] variant is unexpected and is logged with its context
//! before a generic message is shown.

use std::fmt;

use thiserror::Error;

/// Result type alias for archiver operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A reported failure, shown to the requester as-is
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// A pattern built from configuration failed to compile
    #[error("Pattern error: {0}")]
    Regex(#[from] regex::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Wiki API returned an error or an unexpected payload
    #[error("Wiki error for {context}: {message}")]
    Wiki { context: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a wiki error with context.
    pub fn wiki(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Wiki {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error is a reported outcome rather than a fault.
    pub fn is_reported(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Message to show the requester.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(rejection) => rejection.to_string(),
            other => format!("Unexpected failure: {other}"),
        }
    }
}

/// Reported failures.
///
/// Covers command parsing, archival preconditions and the approval gate. The
/// display text of every variant is user-facing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Invalid command")]
    MalformedCommand,

    #[error("Invalid result {0}")]
    UnrecognizedResult(String),

    #[error("Unrecognized nomination type {0}")]
    UnrecognizedType(String),

    #[error("Nominated by field lacks a link to nominator's userpage")]
    MissingNominatorLink,

    #[error("Nominated by field lacks nomination date")]
    MissingNominationDate,

    #[error("Nomination page lacks the approved template")]
    NotApproved,

    #[error("Approval template contains username, and was unable to remove it")]
    ApprovalLeaksUsername,

    #[error("Nomination is only {days} days old, cannot pass yet.")]
    TooYoung { days: i64 },

    #[error("Nomination page lacks the number of sufficient votes")]
    MissingVotesCategory,

    #[error("Nomination only has {board} review board votes and {user} user votes, cannot pass yet")]
    InsufficientVotes { board: usize, user: usize },

    #[error(
        "Nomination only has {board} {board_name} votes, {org} {org_name} votes, and {user} user votes; cannot pass yet"
    )]
    InsufficientOrgVotes {
        board: usize,
        board_name: String,
        org: usize,
        org_name: String,
        user: usize,
    },

    #[error("{}", incomplete_votes(.missing_dates, .missing_users))]
    IncompleteVotes {
        missing_dates: usize,
        missing_users: usize,
    },

    #[error("Target: {0} does not exist")]
    TargetMissing(String),

    #[error("{0} does not exist")]
    PageMissing(String),

    #[error("{0} is a redirect page")]
    RedirectPage(String),

    #[error("Archive requested by {requested_by}, but {article} was nominated by {nominator}")]
    WrongRequester {
        requested_by: String,
        article: String,
        nominator: String,
    },

    #[error("Cannot find /{0} in nomination page")]
    TransclusionNotFound(String),

    #[error("Could not remove {0} template from page")]
    TemplateNotFound(String),

    #[error("Could not add status to {{{{Top}}}} template")]
    StatusNotApplied,

    #[error("Cannot find Top template on {0}")]
    TopTemplateMissing(String),

    #[error("Could not find {0} revision")]
    RevisionNotFound(&'static str),

    #[error("Cannot find category in nomination page")]
    ArchiveCategoryMissing,

    #[error("{0} has already been archived")]
    AlreadyArchived(String),

    #[error("Could not find {{{{Ahf}}}} template")]
    HistoryFooterMissing,

    #[error("Cannot determine status for article {0}")]
    StatusUnknown(String),

    #[error("No review page found for {0}")]
    ReviewPageMissing(String),

    #[error("Too many review pages exist for {0}")]
    ReviewPagesExhausted(String),
}

fn incomplete_votes(missing_dates: &usize, missing_users: &usize) -> String {
    match (*missing_dates, *missing_users) {
        (d, u) if d > 0 && u > 0 => format!(
            "{d} support votes are missing dates, and {u} votes are missing usernames"
        ),
        (d, _) if d > 0 => format!("{d} support votes are missing dates"),
        (_, u) => format!("{u} support votes are missing usernames"),
    }
}
