// src/services/review.rs

//! Markup for status reviews.
//!
//! A review page lives at `<review page>/<article><suffix>`, where the suffix
//! disambiguates repeat reviews. The article carries a `{{XAreview}}` template
//! below its `{{Top}}` while the review is open.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Rejection;
use crate::models::{NominationType, NominationTypes, Revision};

/// Page suffixes for the first through tenth review of an article.
pub const REVIEW_SUFFIXES: [&str; 10] = [
    "",
    " (second)",
    " (third)",
    " (fourth)",
    " (fifth)",
    " (sixth)",
    " (seventh)",
    " (eighth)",
    " (ninth)",
    " (tenth)",
];

static TOP_PARAMS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{[Tt]op(.*?)\}\}").unwrap());

static TOP_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\{\{[Tt]op.*?\}\})").unwrap());

static REVIEW_TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\{\{[FGC]Areview.*?\}\}").unwrap());

static ACTIVE_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\{\{[Tt]op.*?\|)([cgf]a)([|}])").unwrap());

static REVOCABLE_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\{\{[Tt]op.*?\|)p?([cgf]a)([|}])").unwrap());

static REQUESTED_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)Requested By.*?: (.*?)$").unwrap());

static HISTORY_END_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<!--2-->(.*?)\|\|").unwrap());

static HISTORY_RESULT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<!--3-->(.*?)\]\]").unwrap());

/// How an article currently holds its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusState {
    Active,
    Probation,
    Former,
}

/// Status of an article according to its `{{Top}}` template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleStatus<'a> {
    pub nom_type: &'a NominationType,
    pub state: StatusState,
}

/// Read the article's status flag (`fa`, `pfa`, `ffa`, ...).
pub fn article_status<'a>(text: &str, types: &'a NominationTypes) -> Option<ArticleStatus<'a>> {
    let params = TOP_PARAMS.captures(text)?.get(1)?.as_str().to_string();
    let params: Vec<&str> = params.split('|').map(str::trim).collect();

    types.iter().find_map(|nom_type| {
        let flag = nom_type.status_flag();
        let state = params.iter().find_map(|param| {
            if *param == flag {
                Some(StatusState::Active)
            } else if *param == format!("p{flag}") {
                Some(StatusState::Probation)
            } else if *param == format!("f{flag}") {
                Some(StatusState::Former)
            } else {
                None
            }
        })?;
        Some(ArticleStatus { nom_type, state })
    })
}

/// Initial text of a review page.
pub fn build_review_page(nom_type: &NominationType, article: &str, requested_by: &str, title: &str) -> String {
    format!(
        "===[[{article}]]===\n*'''Requested By''': {requested_by}\n*'''Date Requested''': ~~~~~\n\n\
         {{{{{abbr}Rvotes|{title}}}}}\n====Support====\n\n====Object====\n\n====Comments====\n\n\
         <!-- DO NOT WRITE BELOW THIS LINE! -->\n\
         <noinclude>{{{{SpecialCategorizer|[[Category:Wookieepedia {adjective} article review pages]]}}}}</noinclude>",
        abbr = nom_type.abbreviation,
        adjective = nom_type.adjective,
    )
}

/// Add the review template below `{{Top}}`. `None` when the article is
/// already marked.
pub fn mark_under_review(
    text: &str,
    article: &str,
    nom_type: &NominationType,
    suffix: &str,
) -> Result<Option<String>, Rejection> {
    let template = nom_type.review_template();
    if text.contains(&format!("{{{{{template}")) {
        return Ok(None);
    }
    if !TOP_TEMPLATE.is_match(text) {
        return Err(Rejection::TopTemplateMissing(article.to_string()));
    }

    let param = match suffix.trim() {
        "" => String::new(),
        trimmed => format!("|{trimmed}"),
    };
    let marked = TOP_TEMPLATE.replacen(text, 1, format!("${{1}}\n{{{{{template}{param}}}}}").as_str());
    Ok(Some(marked.into_owned()))
}

/// Remove the review template; when revoking, also turn the status flag into
/// its former variant. `None` when nothing changed.
pub fn remove_review_template(text: &str, revoke: bool) -> Option<String> {
    let mut updated = REVIEW_TEMPLATE.replace_all(text, "").into_owned();
    if revoke {
        updated = REVOCABLE_STATUS
            .replace_all(&updated, "${1}f${2}${3}")
            .into_owned();
    }
    (updated != text).then_some(updated)
}

/// Put the article's status on probation. `None` when it already is.
pub fn apply_probation(text: &str) -> Option<String> {
    let updated = ACTIVE_STATUS.replace_all(text, "${1}p${2}${3}");
    (updated != text).then(|| updated.into_owned())
}

/// Archive a review page. `None` when it is already archived.
pub fn archive_review_page(text: &str, abbreviation: &str, successful: bool) -> Option<String> {
    if text.contains("Date Archived") {
        return None;
    }

    let failed = if successful { "" } else { "|failed" };
    let mut lines = vec![format!("{{{{subst:{abbreviation}R archive{failed}}}}}")];
    for line in text.lines() {
        lines.push(line.to_string());
        if line.contains("Date Requested") {
            lines.push("*'''Date Archived''': ~~~~~".to_string());
        }
    }
    lines.push("</div>".to_string());
    Some(lines.join("\n"))
}

/// Who asked for the review: the page creator unless that was the bot,
/// otherwise the `Requested By` field.
pub fn review_requester(text: &str, creator: Option<&Revision>, bot_user: &str) -> String {
    if let Some(creator) = creator.filter(|r| !crate::utils::same_user(&r.user, bot_user)) {
        return creator.user.clone();
    }
    REQUESTED_BY
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|user| !user.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// One row of a review history table.
pub fn review_history_row(
    link: &str,
    start: &Revision,
    end: &Revision,
    requester: &str,
    page: &str,
    result: &str,
) -> String {
    format!(
        "|-\n| {link} || <!--1-->{} || <!--2-->{} || {requester} || [[{page} |<!--3-->{result}]]",
        start.timestamp.format("%Y/%m/%d"),
        end.timestamp.format("%Y/%m/%d"),
    )
}

/// Row for a revocation that was never recorded as a review.
pub fn revoked_history_row(link: &str, start: &Revision, end: &Revision, requester: &str, page: &str) -> String {
    format!(
        "|-\n| {link} || {} || <!--2-->{} || {requester} || [[{page} | Revoked]]",
        start.timestamp.format("%Y/%m/%d"),
        end.timestamp.format("%Y/%m/%d"),
    )
}

/// Set the end date and result of an existing review row. `None` when the
/// review has no row or the row already says so.
pub fn update_history_result(text: &str, page: &str, end: &Revision, result: &str) -> Option<String> {
    let plain = format!("[[{page} |");
    let piped = format!("[[{page}|");
    let date = end.timestamp.format("%Y/%m/%d").to_string();

    let mut found = false;
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            if !line.contains(&plain) && !line.contains(&piped) {
                return line.to_string();
            }
            found = true;
            let dated = HISTORY_END_DATE.replace_all(line, format!("<!--2-->{date} ||").as_str());
            HISTORY_RESULT
                .replace_all(&dated, format!("<!--3-->{result}]]").as_str())
                .into_owned()
        })
        .collect();

    let updated = lines.join("\n");
    (found && updated != text).then_some(updated)
}
