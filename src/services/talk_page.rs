// src/services/talk_page.rs

//! Article history markup and the talk page merge.
//!
//! A history entry is a pair of `{{Ahm}}` templates followed by a fresh
//! `{{Ahf}}` footer. The merge inserts it into a talk page under the `{{Ahh}}`
//! header, replacing the previous footer. An entry whose completion revision
//! is already on the page is not inserted again.

use std::fmt;

use crate::error::Rejection;
use crate::models::Revision;

/// Result recorded in the article history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryResult {
    Success,
    Withdrawn,
    Failure,
    Kept,
    Probation,
}

impl HistoryResult {
    /// `(process, status)` codes for a type abbreviation.
    pub fn codes(&self, abbr: &str) -> (String, String) {
        match self {
            Self::Success => (format!("{abbr}N"), abbr.to_string()),
            Self::Withdrawn | Self::Failure => (format!("{abbr}N"), format!("F{abbr}N")),
            Self::Kept => (format!("{abbr}R"), abbr.to_string()),
            Self::Probation => (format!("{abbr}R"), format!("P{abbr}")),
        }
    }
}

impl fmt::Display for HistoryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Success => "Success",
            Self::Withdrawn => "Withdrawn",
            Self::Failure => "Failure",
            Self::Kept => "Kept",
            Self::Probation => "Probation",
        };
        f.write_str(text)
    }
}

/// Rendered history markup plus the token that identifies it on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub text: String,
    pub token: String,
}

impl HistoryEntry {
    fn new(text: String, completed: &Revision) -> Self {
        Self {
            text,
            token: format!("|oldid={}", completed.revid),
        }
    }

    /// Whether the entry is already present in a talk page.
    pub fn is_applied(&self, text: &str) -> bool {
        text.lines().any(|line| line.trim() == self.token)
    }
}

/// History entry for a completed nomination or review.
pub fn build_history_entry(
    abbr: &str,
    result: HistoryResult,
    link: &str,
    start: &Revision,
    completed: &Revision,
) -> HistoryEntry {
    let (process, status) = result.codes(abbr);
    let text = format!(
        "{{{{Ahm\n|date={}\n|oldid={}\n|process={process}\n|result={result}\n}}}}\n\
         {{{{Ahm\n|date={}\n|oldid={}\n|process={status}\n|user={}\n|link={link}\n}}}}\n\
         {{{{Ahf|status={status}}}}}",
        start.timestamp.format("%B %d, %Y"),
        start.revid,
        completed.timestamp.format("%B %d, %Y"),
        completed.revid,
        start.user,
    );
    HistoryEntry::new(text, completed)
}

/// History entry for a revoked status.
pub fn build_removal_entry(abbr: &str, link: &str, revision: &Revision) -> HistoryEntry {
    let text = format!(
        "{{{{Ahm\n|date={}\n|oldid={}\n|process=F{abbr}\n|link={link}\n}}}}\n{{{{Ahf|status=F{abbr}}}}}",
        revision.timestamp.format("%B %d, %Y"),
        revision.revid,
    );
    HistoryEntry::new(text, revision)
}

/// Inputs of a talk page merge.
#[derive(Debug, Clone)]
pub struct TalkUpdate<'a> {
    pub entry: &'a HistoryEntry,
    /// Status banner template name (e.g. `FA`) when the article gains a status
    pub status_banner: Option<&'a str>,
    /// Every configured type abbreviation; their banners are superseded
    pub known_types: &'a [String],
    /// WikiProject banner template names
    pub project_banners: &'a [String],
}

/// Outcome of a talk page merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalkMerge {
    pub text: String,
    pub summary: &'static str,
    pub changed: bool,
}

pub const CREATE_SUMMARY: &str = "Creating talk page with article nomination history";
pub const UPDATE_SUMMARY: &str = "Updating talk page with article nomination history";

/// Merge a history entry into a talk page.
pub fn merge_talk_page(existing: Option<&str>, update: &TalkUpdate<'_>) -> Result<TalkMerge, Rejection> {
    let banner = update.status_banner.map(|b| format!("{{{{{b}}}}}"));

    let Some(text) = existing else {
        let mut lines = vec!["{{Talkheader}}".to_string()];
        lines.extend(banner);
        lines.push("{{Ahh}}".to_string());
        lines.push(update.entry.text.clone());
        lines.extend(update.project_banners.iter().map(|p| format!("{{{{{p}}}}}")));
        return Ok(TalkMerge {
            text: lines.join("\n"),
            summary: CREATE_SUMMARY,
            changed: true,
        });
    };

    if update.entry.is_applied(text) {
        return Ok(TalkMerge {
            text: text.to_string(),
            summary: UPDATE_SUMMARY,
            changed: false,
        });
    }

    let mut entry = update.entry.text.clone();
    for project in update.project_banners {
        if !text.contains(project.as_str()) {
            entry.push_str(&format!("\n{{{{{project}}}}}"));
        }
    }

    let lower = text.to_lowercase();
    let mut new_lines: Vec<String> = Vec::new();

    if lower.contains("{{ahh") {
        let superseded = superseded_banners(update.known_types);
        let mut header_found = false;
        let mut footer_found = false;
        for line in text.lines() {
            let line_lower = line.to_lowercase();
            if superseded.iter().any(|b| line.contains(b.as_str())) {
                log::debug!("Removing old status template: {line}");
            } else if line_lower.contains("{{ahh") {
                new_lines.extend(banner.clone());
                new_lines.push(line.to_string());
                header_found = true;
            } else if line_lower.contains("{{ahf") && !footer_found {
                if !header_found {
                    new_lines.push("{{Ahh}}".to_string());
                    new_lines.extend(banner.clone());
                    header_found = true;
                }
                new_lines.push(entry.clone());
                footer_found = true;
            } else {
                new_lines.push(line.to_string());
            }
        }
        if !footer_found {
            return Err(Rejection::HistoryFooterMissing);
        }
    } else if !lower.contains("{{talkheader") {
        new_lines.push("{{Talkheader}}".to_string());
        new_lines.extend(banner);
        new_lines.push("{{Ahh}}".to_string());
        new_lines.push(entry);
        new_lines.extend(text.lines().map(str::to_string));
    } else {
        let mut inserted = false;
        for line in text.lines() {
            new_lines.push(line.to_string());
            if !inserted && line.to_lowercase().contains("{{talkheader") {
                new_lines.extend(banner.clone());
                new_lines.push("{{Ahh}}".to_string());
                new_lines.push(entry.clone());
                inserted = true;
            }
        }
    }

    let merged = new_lines.join("\n");
    Ok(TalkMerge {
        changed: merged != text,
        text: merged,
        summary: UPDATE_SUMMARY,
    })
}

fn superseded_banners(known_types: &[String]) -> Vec<String> {
    known_types
        .iter()
        .flat_map(|abbr| [format!("{{{{{abbr}}}}}"), format!("{{{{Former{abbr}}}}}")])
        .collect()
}
