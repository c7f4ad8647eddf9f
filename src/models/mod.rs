// src/models/mod.rs

//! Domain models for the archiver.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod archive;
mod command;
mod config;
mod nomination;
mod objection;
mod revision;

// Re-export all public types
pub use archive::ArchiveResult;
pub use command::{ArchiveOutcome, Command, ReviewAction, ReviewCommand};
pub use config::{ArchiveConfig, Config, LoggingConfig, PathsConfig, WikiConfig};
pub use nomination::{NominationType, NominationTypeData, NominationTypes, builtin_data};
pub use objection::{ObjectionLine, ObjectionResult, ObjectionTree, ReviewBucket};
pub use revision::Revision;
