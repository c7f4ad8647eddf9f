// src/services/command.rs

//! Operator command parsing.
//!
//! Two grammars are recognised: archival commands such as
//! `successful FAN: Darth Bane (second nomination)` and review management
//! commands such as `mark review of Darth Bane as passed`.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::Rejection;
use crate::models::{ArchiveOutcome, Command, NominationTypes, ReviewAction, ReviewCommand};
use crate::utils::clean_text;

static ARCHIVE_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<result>([Ss]uc(c)?es(s)?ful|[Uu]nsuc(c)?es(s)?ful|[Ff]ailed|[Ww]ithdrawn?|[Tt]est|[Pp]ost)) (?P<ntype>[A-Z]A)N: ?(?P<article>.*?)(?P<suffix> \([A-z]+ nomination\))?(?P<no_msg> \(no message\))?(, | \()?(?P<custom>custom message: .*?\)?)?$",
    )
    .unwrap()
});

static CREATE_REVIEW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[Cc]reate review for (?P<article>.*)").unwrap());

static PASS_REVIEW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[Mm]ark review (of|for) (?P<article>.*?) as passed").unwrap()
});

static PROBATION_REVIEW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[Mm]ark review (of|for) (?P<article>.*?) as ((on )?probation|probed)").unwrap()
});

static REVOKE_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([Rr]emove|[Rr]evoke) status (of|for) (?P<article>.*)").unwrap()
});

fn group(caps: &Captures<'_>, name: &str) -> String {
    clean_text(caps.name(name).map(|m| m.as_str()).unwrap_or_default())
}

fn parse_outcome(result: &str) -> Result<ArchiveOutcome, Rejection> {
    match result {
        "successful" | "succesful" | "sucessful" | "sucesful" => Ok(ArchiveOutcome::Successful),
        "unsuccessful" | "unsuccesful" | "unsucessful" | "unsucesful" | "failed" => {
            Ok(ArchiveOutcome::Unsuccessful)
        }
        "withdrawn" | "withdraw" => Ok(ArchiveOutcome::Withdrawn),
        "test" => Ok(ArchiveOutcome::Test),
        "post" => Ok(ArchiveOutcome::Post),
        other => Err(Rejection::UnrecognizedResult(other.to_string())),
    }
}

/// Parse an archival command.
///
/// The nomination type must be one of the configured types. `bypass` is never
/// set by the text; callers grant it.
pub fn parse_command(
    text: &str,
    requested_by: &str,
    types: &NominationTypes,
) -> Result<Command, Rejection> {
    let input = text.trim().replace("\\n", "");
    let caps = ARCHIVE_COMMAND
        .captures(&input)
        .ok_or(Rejection::MalformedCommand)?;

    let result = parse_outcome(&group(&caps, "result").to_lowercase())?;

    let nom_type = group(&caps, "ntype");
    if types.get(&nom_type).is_none() {
        return Err(Rejection::UnrecognizedType(nom_type));
    }

    let suffix = Some(group(&caps, "suffix")).filter(|s| !s.is_empty());
    let custom_message = Some(group(&caps, "custom"))
        .filter(|s| !s.is_empty())
        .map(|custom| {
            let message = custom
                .split_once("custom message: ")
                .map(|(_, m)| m.trim())
                .unwrap_or_default();
            message.strip_suffix(')').unwrap_or(message).to_string()
        });

    Ok(Command {
        result,
        nom_type,
        article_name: group(&caps, "article"),
        suffix,
        retry: text.split(':').next().unwrap_or_default().contains("retry "),
        bypass: false,
        send_message: group(&caps, "no_msg").is_empty(),
        custom_message,
        requested_by: requested_by.to_string(),
    })
}

/// Parse a review management command.
pub fn parse_review_command(text: &str, requested_by: &str) -> Result<ReviewCommand, Rejection> {
    let input = text.trim().replace("\\n", "");
    let patterns: [(&Regex, ReviewAction); 4] = [
        (&*CREATE_REVIEW, ReviewAction::Create),
        (&*PASS_REVIEW, ReviewAction::Pass),
        (&*PROBATION_REVIEW, ReviewAction::Probation),
        (&*REVOKE_STATUS, ReviewAction::Revoke),
    ];

    patterns
        .iter()
        .find_map(|(pattern, action)| {
            pattern.captures(&input).map(|caps| ReviewCommand {
                article: group(&caps, "article"),
                action: *action,
                retry: input.contains("retry "),
                requested_by: requested_by.to_string(),
            })
        })
        .filter(|command| !command.article.is_empty())
        .ok_or(Rejection::MalformedCommand)
}
