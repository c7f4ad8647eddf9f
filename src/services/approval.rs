// src/services/approval.rs

//! Approval and vote gate for successful nominations.
//!
//! Checks run in a fixed order and the first failure is reported. A
//! nomination older than the grace period passes without a vote count.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::error::Rejection;
use crate::models::NominationType;

/// Minimum nomination age, in days, before it can pass.
pub const MIN_AGE_DAYS: i64 = 2;

/// Age, in days, after which vote counts are no longer checked.
pub const GRACE_PERIOD_DAYS: i64 = 7;

static NOMINATOR_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Nominated by.*?(\[\[User:|\{\{U\|)(.*?)[\|\]\}]").unwrap()
});

static NOMINATION_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Nominated by.*?[0-9]+:[0-9]+, [0-9]+ [A-z]+ 20[0-9]{2}").unwrap()
});

static APPROVAL_TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(AC|Inq|EC)approved\|").unwrap());

static APPROVAL_WITH_USER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(AC|Inq|EC)approved\|.*?(\[\[User:|\{\{U\|)").unwrap()
});

static APPROVAL_USER_REPAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\{\{(AC|Inq|EC)approved\|).*?(\[\[User:|\{\{U\|).*? ([0-9]+:[0-9]+, [0-9]+ [A-z]+ 20[0-9]{2}.*?\}\})",
    )
    .unwrap()
});

static VOTE_USER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\[\[[Uu]ser:|\{\{[Uu]\|)").unwrap());

static VOTE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+:[0-9]+, [0-9]+ [A-z]+ 20[0-9]{2}").unwrap());

static SECTION_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^=+\s*(?P<name>[^=]*?)\s*=+\s*$").unwrap());

/// Everything the gate looks at.
#[derive(Debug, Clone)]
pub struct ApprovalRequest<'a> {
    pub text: &'a str,
    pub nom_type: &'a NominationType,
    pub retry: bool,
    /// When the nomination page was created
    pub created: DateTime<Utc>,
    pub in_votes_category: bool,
    pub now: DateTime<Utc>,
    pub timezone_offset_hours: i64,
}

/// Vote tally of a support section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteCount {
    pub board: usize,
    pub org: usize,
    pub user: usize,
    pub total: usize,
}

/// Why a nomination was approved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalBasis {
    /// Old enough that votes were not counted
    GracePeriod,
    Votes(VoteCount),
}

/// A passed gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    pub basis: ApprovalBasis,
    pub age_days: i64,
    /// Nomination text with the username stripped from the approval template
    pub repaired_text: Option<String>,
}

/// Run the gate.
pub fn check_approval(request: &ApprovalRequest<'_>) -> Result<Approval, Rejection> {
    let text = request.text;
    if !NOMINATOR_LINK.is_match(text) {
        return Err(Rejection::MissingNominatorLink);
    }
    if !NOMINATION_DATE.is_match(text) {
        return Err(Rejection::MissingNominationDate);
    }
    if !APPROVAL_TEMPLATE.is_match(text) {
        return Err(Rejection::NotApproved);
    }

    let repaired_text = if APPROVAL_WITH_USER.is_match(text) {
        let repaired = APPROVAL_USER_REPAIR.replace_all(text, "${1}${4}").into_owned();
        if APPROVAL_WITH_USER.is_match(&repaired) {
            return Err(Rejection::ApprovalLeaksUsername);
        }
        log::info!("Removed username from approval template");
        Some(repaired)
    } else {
        None
    };

    let age = request.now + Duration::hours(request.timezone_offset_hours) - request.created;
    let age_days = age.num_days();
    if age_days < MIN_AGE_DAYS {
        return Err(Rejection::TooYoung { days: age_days });
    }

    if !request.retry && !request.in_votes_category {
        return Err(Rejection::MissingVotesCategory);
    }

    if age_days >= GRACE_PERIOD_DAYS {
        return Ok(Approval {
            basis: ApprovalBasis::GracePeriod,
            age_days,
            repaired_text,
        });
    }

    let section = extract_support_section(&text.to_lowercase());
    let votes = vote_lines(&section);
    let count = count_votes(&section, votes.len(), request.nom_type);
    check_vote_counts(request.nom_type, &count)?;
    check_vote_signatures(&votes)?;

    Ok(Approval {
        basis: ApprovalBasis::Votes(count),
        age_days,
        repaired_text,
    })
}

/// The nominator named in the "Nominated by" field.
pub fn nominator_from_text(text: &str) -> Option<String> {
    NOMINATOR_LINK
        .captures(text)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().trim().to_string())
        .filter(|user| !user.is_empty())
}

/// Lines between the support heading and the next heading.
///
/// Without a support heading the text up to the objection heading is used.
pub fn extract_support_section(text: &str) -> String {
    let mut in_support = false;
    let mut has_heading = false;
    let mut section = Vec::new();
    let mut preamble = Vec::new();

    for line in text.lines() {
        if let Some(caps) = SECTION_HEADING.captures(line.trim()) {
            let name = caps["name"].to_lowercase();
            if name == "support" {
                in_support = true;
                has_heading = true;
                continue;
            }
            if in_support {
                break;
            }
            if name == "object" && !has_heading {
                break;
            }
            continue;
        }
        if in_support {
            section.push(line);
        } else {
            preamble.push(line);
        }
    }

    if has_heading {
        section.join("\n")
    } else {
        preamble.join("\n")
    }
}

/// Top-level `#` vote lines; `#:` and `#*` replies are not votes.
fn vote_lines(section: &str) -> Vec<&str> {
    section
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('#'))
        .filter(|line| !line.starts_with("#:") && !line.starts_with("#*"))
        .collect()
}

fn count_votes(section: &str, total: usize, nom_type: &NominationType) -> VoteCount {
    let board = section.matches(nom_type.vote_template.as_str()).count();
    let org = nom_type
        .org_vote_template
        .as_deref()
        .map(|template| section.matches(template).count())
        .unwrap_or(0);
    VoteCount {
        board,
        org,
        user: total.saturating_sub(board + org),
        total,
    }
}

/// The vote decision table, evaluated in order.
pub fn check_vote_counts(nom_type: &NominationType, count: &VoteCount) -> Result<(), Rejection> {
    let fast = nom_type.fast_review_votes;
    let min = nom_type.min_review_votes;
    let min_total = nom_type.min_total_votes;
    let VoteCount {
        board,
        org,
        user,
        total,
    } = *count;

    if board >= fast {
        return Ok(());
    }
    if board >= min && total >= min_total {
        return Ok(());
    }
    if nom_type.relaxed_threshold && board > min && total + 1 >= min_total {
        return Ok(());
    }
    if nom_type.org_vote_override && org >= 1 {
        if board + 1 == fast {
            return Ok(());
        }
        if board + 1 == min && total >= min_total {
            return Ok(());
        }
        return Err(Rejection::InsufficientOrgVotes {
            board,
            board_name: nom_type.board_name.clone(),
            org,
            org_name: nom_type.org_name.clone(),
            user,
        });
    }
    Err(Rejection::InsufficientVotes { board, user })
}

fn check_vote_signatures(votes: &[&str]) -> Result<(), Rejection> {
    let mut missing_users = 0;
    let mut missing_dates = 0;
    for vote in votes {
        if !VOTE_USER.is_match(vote) {
            missing_users += 1;
        } else if !VOTE_DATE.is_match(vote) {
            missing_dates += 1;
        }
    }
    if missing_users > 0 || missing_dates > 0 {
        return Err(Rejection::IncompleteVotes {
            missing_dates,
            missing_users,
        });
    }
    Ok(())
}
