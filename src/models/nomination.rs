//! Nomination type configuration.
//!
//! One [`NominationType`] exists per status class. Page and category names are
//! derived from the adjective and mode; thresholds come from the data document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Raw per-type entry of the nomination data document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NominationTypeData {
    /// Status adjective (e.g. "Featured")
    #[serde(rename = "type")]
    pub adjective: String,

    /// "article" or "topic"
    pub mode: String,

    /// Board votes that pass a nomination on their own
    pub review_board_only_vote_count: usize,

    /// Total votes needed alongside the minimum board votes
    pub total_votes_for_fast_pass: usize,

    /// Minimum board votes when the total is high enough
    pub min_review_board_votes: usize,

    /// Board vote template, e.g. `{{Inq}}`
    pub vote_template: String,

    /// Reviewer-organisation vote template counted apart from user votes
    #[serde(default)]
    pub org_vote_template: Option<String>,

    /// A single org vote may cover a one-vote board shortfall
    #[serde(default)]
    pub org_vote_override: bool,

    /// One extra board vote may cover a one-vote total shortfall
    #[serde(default)]
    pub relaxed_threshold: bool,

    /// Board name used in vote messages
    #[serde(default = "defaults::board_name")]
    pub board_name: String,

    /// Org name used in vote messages
    #[serde(default = "defaults::org_name")]
    pub org_name: String,

    pub overdue_days: i64,
    pub notification_days: i64,
}

/// Static configuration for one status class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NominationType {
    /// Short code, e.g. `FA`
    pub abbreviation: String,
    pub adjective: String,
    pub mode: String,
    pub full_name: String,

    /// Listing page of articles holding the status
    pub page: String,
    pub category: String,
    pub nomination_page: String,
    pub nomination_category: String,
    pub votes_category: String,
    pub review_page: String,
    pub review_category: String,

    pub fast_review_votes: usize,
    pub min_total_votes: usize,
    pub min_review_votes: usize,

    /// Lowercased board vote template
    pub vote_template: String,
    /// Lowercased org vote template
    pub org_vote_template: Option<String>,
    pub org_vote_override: bool,
    pub relaxed_threshold: bool,
    pub board_name: String,
    pub org_name: String,

    pub overdue_days: i64,
    pub notification_days: i64,
}

impl NominationType {
    /// Build a type from its abbreviation and data entry.
    pub fn new(abbreviation: &str, data: &NominationTypeData) -> Self {
        let adjective = data.adjective.as_str();
        let mode = data.mode.as_str();
        Self {
            abbreviation: abbreviation.to_string(),
            adjective: adjective.to_string(),
            mode: mode.to_string(),
            full_name: format!("{adjective} {mode}"),
            page: format!("Wookieepedia:{adjective} {mode}s"),
            category: format!("Category:Wookieepedia {adjective} {mode}s"),
            nomination_page: format!("Wookieepedia:{adjective} {mode} nominations"),
            nomination_category: format!(
                "Category:Wookieepedia {adjective} {mode} nomination pages"
            ),
            votes_category: format!(
                "Category:{adjective} {mode} nominations with sufficient votes"
            ),
            review_page: format!("Wookieepedia:{adjective} {mode} reviews"),
            review_category: format!("Category:Wookieepedia {adjective} {mode} review pages"),
            fast_review_votes: data.review_board_only_vote_count,
            min_total_votes: data.total_votes_for_fast_pass,
            min_review_votes: data.min_review_board_votes,
            vote_template: data.vote_template.to_lowercase(),
            org_vote_template: data.org_vote_template.as_ref().map(|t| t.to_lowercase()),
            org_vote_override: data.org_vote_override,
            relaxed_threshold: data.relaxed_threshold,
            board_name: data.board_name.clone(),
            org_name: data.org_name.clone(),
            overdue_days: data.overdue_days,
            notification_days: data.notification_days,
        }
    }

    /// Process code, e.g. `FAN`.
    pub fn code(&self) -> String {
        format!("{}N", self.abbreviation)
    }

    /// Template placed on the target article while nominated, e.g. `FAnom`.
    pub fn nomination_template(&self) -> String {
        format!("{}nom", self.abbreviation)
    }

    /// Tag or summary of the edit that nominated the article.
    pub fn nomination_marker(&self) -> String {
        format!("Added {}", self.nomination_template())
    }

    /// Status flag used inside `{{Top}}`, e.g. `fa`.
    pub fn status_flag(&self) -> String {
        self.abbreviation.to_lowercase()
    }

    /// Template placed on the target article while under review.
    pub fn review_template(&self) -> String {
        format!("{}review", self.abbreviation)
    }

    pub fn history_page(&self) -> String {
        format!("{}/History", self.nomination_page)
    }

    pub fn review_history_page(&self) -> String {
        format!("{}/History", self.review_page)
    }

    /// Full title of a nomination subpage.
    pub fn nomination_page_name(&self, subpage: &str) -> String {
        format!("{}/{}", self.nomination_page, subpage)
    }
}

/// The configured set of nomination types, keyed by abbreviation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NominationTypes {
    types: BTreeMap<String, NominationType>,
}

impl NominationTypes {
    /// Build from the raw data document. Topic modes are skipped.
    pub fn from_data(data: &BTreeMap<String, NominationTypeData>) -> Self {
        let types = data
            .iter()
            .filter(|(_, entry)| entry.mode != "topic")
            .map(|(abbr, entry)| (abbr.clone(), NominationType::new(abbr, entry)))
            .collect();
        Self { types }
    }

    /// Parse the JSON nomination data document.
    pub fn from_json(json: &str) -> Result<Self> {
        let data: BTreeMap<String, NominationTypeData> = serde_json::from_str(json)?;
        let types = Self::from_data(&data);
        if types.is_empty() {
            return Err(AppError::config("No nomination types defined"));
        }
        Ok(types)
    }

    /// Look up a type by abbreviation (`FA`) or process code (`FAN`).
    pub fn get(&self, code: &str) -> Option<&NominationType> {
        self.types.get(code).or_else(|| {
            code.strip_suffix('N')
                .and_then(|abbr| self.types.get(abbr))
        })
    }

    /// Look up a type by its `{{Top}}` status flag (`fa`).
    pub fn by_status_flag(&self, flag: &str) -> Option<&NominationType> {
        self.types
            .values()
            .find(|t| t.status_flag().eq_ignore_ascii_case(flag))
    }

    pub fn iter(&self) -> impl Iterator<Item = &NominationType> {
        self.types.values()
    }

    pub fn abbreviations(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }
}

impl FromIterator<NominationType> for NominationTypes {
    fn from_iter<I: IntoIterator<Item = NominationType>>(iter: I) -> Self {
        Self {
            types: iter
                .into_iter()
                .map(|t| (t.abbreviation.clone(), t))
                .collect(),
        }
    }
}

impl Default for NominationTypeData {
    fn default() -> Self {
        Self {
            adjective: "Featured".into(),
            mode: "article".into(),
            review_board_only_vote_count: 5,
            total_votes_for_fast_pass: 7,
            min_review_board_votes: 3,
            vote_template: "{{Inq}}".into(),
            org_vote_template: None,
            org_vote_override: false,
            relaxed_threshold: true,
            board_name: defaults::board_name(),
            org_name: defaults::org_name(),
            overdue_days: 14,
            notification_days: 7,
        }
    }
}

/// Built-in data for the three standard status classes.
pub fn builtin_data() -> BTreeMap<String, NominationTypeData> {
    let mut data = BTreeMap::new();
    data.insert(
        "FA".to_string(),
        NominationTypeData {
            board_name: "Inquisitorius".into(),
            ..NominationTypeData::default()
        },
    );
    data.insert(
        "GA".to_string(),
        NominationTypeData {
            adjective: "Good".into(),
            review_board_only_vote_count: 3,
            total_votes_for_fast_pass: 5,
            min_review_board_votes: 2,
            vote_template: "{{AC}}".into(),
            org_vote_template: Some("{{Inq}}".into()),
            org_vote_override: true,
            relaxed_threshold: false,
            board_name: "AgriCorps".into(),
            org_name: "Inquisitorius".into(),
            ..NominationTypeData::default()
        },
    );
    data.insert(
        "CA".to_string(),
        NominationTypeData {
            adjective: "Comprehensive".into(),
            review_board_only_vote_count: 3,
            total_votes_for_fast_pass: 4,
            min_review_board_votes: 2,
            vote_template: "{{EC}}".into(),
            org_vote_template: Some("{{Inq}}".into()),
            org_vote_override: false,
            relaxed_threshold: false,
            board_name: "EduCorps".into(),
            org_name: "Inquisitorius".into(),
            ..NominationTypeData::default()
        },
    );
    data
}

mod defaults {
    pub fn board_name() -> String {
        "review board".into()
    }
    pub fn org_name() -> String {
        "Inquisitorius".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_names_are_derived() {
        let types = NominationTypes::from_data(&builtin_data());
        let fa = types.get("FA").unwrap();
        assert_eq!(fa.page, "Wookieepedia:Featured articles");
        assert_eq!(fa.nomination_page, "Wookieepedia:Featured article nominations");
        assert_eq!(
            fa.votes_category,
            "Category:Featured article nominations with sufficient votes"
        );
        assert_eq!(fa.history_page(), "Wookieepedia:Featured article nominations/History");
        assert_eq!(fa.vote_template, "{{inq}}");
    }

    #[test]
    fn test_lookup_by_code_and_flag() {
        let types = NominationTypes::from_data(&builtin_data());
        assert_eq!(types.get("GAN").unwrap().abbreviation, "GA");
        assert_eq!(types.by_status_flag("ca").unwrap().abbreviation, "CA");
        assert!(types.get("JAN").is_none());
    }

    #[test]
    fn test_from_json_skips_topics() {
        let json = r#"{
            "FA": {"type": "Featured", "mode": "article", "reviewBoardOnlyVoteCount": 5,
                   "totalVotesForFastPass": 7, "minReviewBoardVotes": 3,
                   "voteTemplate": "{{Inq}}", "overdueDays": 14, "notificationDays": 7},
            "FT": {"type": "Featured", "mode": "topic", "reviewBoardOnlyVoteCount": 5,
                   "totalVotesForFastPass": 7, "minReviewBoardVotes": 3,
                   "voteTemplate": "{{Inq}}", "overdueDays": 14, "notificationDays": 7}
        }"#;
        let types = NominationTypes::from_json(json).unwrap();
        assert_eq!(types.len(), 1);
        assert!(types.get("FT").is_none());
    }

    #[test]
    fn test_from_json_rejects_empty() {
        assert!(NominationTypes::from_json("{}").is_err());
    }
}
