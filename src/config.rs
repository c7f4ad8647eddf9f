// src/config.rs

//! Bot data loading.
//!
//! The TOML [`Config`](crate::models::Config) says where the JSON bot data
//! documents live; this module loads them into a [`BotData`] snapshot that the
//! workflows read. A reload swaps the whole snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{NominationTypes, PathsConfig, builtin_data};

/// WikiProject entry of the projects document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectData {
    /// Talk page banner template, without braces
    #[serde(default)]
    pub template: Option<String>,

    /// Alternative names recognised in the nomination's project field
    #[serde(default)]
    pub shortcut: Vec<String>,
}

/// Everything the workflows read from the data documents.
#[derive(Debug, Clone, Default)]
pub struct BotData {
    pub types: NominationTypes,

    /// User name to wiki signature markup
    pub signatures: BTreeMap<String, String>,

    /// User name to the nomination types they do not want notifications for
    pub preferences: BTreeMap<String, Vec<String>>,

    pub projects: BTreeMap<String, ProjectData>,
}

impl BotData {
    /// Load all data documents.
    ///
    /// The nomination types fall back to the built-in set when their document
    /// is missing; the other documents fall back to empty.
    pub fn load(paths: &PathsConfig) -> Result<Self> {
        let types = match fs::read_to_string(&paths.nomination_types) {
            Ok(json) => NominationTypes::from_json(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!(
                    "No nomination types at {:?}, using built-in types",
                    paths.nomination_types
                );
                NominationTypes::from_data(&builtin_data())
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            types,
            signatures: load_json_or_default(&paths.signatures)?,
            preferences: load_json_or_default(&paths.preferences)?,
            projects: load_json_or_default(&paths.projects)?,
        })
    }

    /// Data set using only the built-in nomination types.
    pub fn builtin() -> Self {
        Self {
            types: NominationTypes::from_data(&builtin_data()),
            ..Self::default()
        }
    }

    /// Replace this snapshot with a freshly loaded one.
    ///
    /// On failure the current snapshot is kept.
    pub fn reload(&mut self, paths: &PathsConfig) -> Result<()> {
        let fresh = Self::load(paths)?;
        log::info!(
            "Reloaded bot data: {} nomination types, {} signatures, {} projects",
            fresh.types.len(),
            fresh.signatures.len(),
            fresh.projects.len()
        );
        *self = fresh;
        Ok(())
    }

    /// Signature markup for a user, falling back to a `{{U|..}}` link.
    pub fn signature(&self, user: &str) -> String {
        match self.signatures.get(user) {
            Some(signature) => signature.clone(),
            None => {
                log::warn!("No signature found for user {user}! Signature may be invalid");
                format!("{{{{U|{user}}}}}")
            }
        }
    }

    /// Whether the user opted out of notifications for the nomination type.
    pub fn has_opted_out(&self, user: &str, nom_type: &str) -> bool {
        self.preferences
            .get(user)
            .is_some_and(|types| types.iter().any(|t| t == nom_type))
    }

    /// Talk page banner template of a project.
    pub fn project_template(&self, project: &str) -> Option<&str> {
        self.projects
            .get(project)
            .and_then(|data| data.template.as_deref())
    }
}

fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match fs::read_to_string(path) {
        Ok(json) => serde_json::from_str(&json).map_err(|e| {
            AppError::config(format!("Invalid data document {path:?}: {e}"))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("No data document at {path:?}, using empty defaults");
            Ok(T::default())
        }
        Err(e) => Err(e.into()),
    }
}
