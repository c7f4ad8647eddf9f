// src/services/objections.rs

//! Objection thread analysis.
//!
//! A nomination or review page keeps its objections between the `Object`
//! heading and the `Comments` heading, one sub-section per objector. Each
//! depth-1 bullet opens an objection tree; deeper bullets are replies. The
//! parse is heuristic: threads are reconstructed from bullet depth alone, and
//! "all done" replies are copied back onto earlier threads that lack an answer
//! at the same depth.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use crate::models::{NominationType, ObjectionLine, ObjectionResult, ObjectionTree, ReviewBucket};
use crate::utils::parse_signature_date;

static BULLETS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^:?(\*+)").unwrap());

static STRIKE_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(:?\*+)[ ]*").unwrap());

static DATE_DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{2}:[0-9]{2}, [0-9]+ [A-z]+ 20[0-9]+) \(UTC\)").unwrap()
});

static DATE_MONTH_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{2}:[0-9]{2}, [A-z]+ [0-9]+, 20[0-9]+) \(UTC\)").unwrap()
});

static USER_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[\{]{2}[Uu]s?e?r?[\|:](.*?)[\|\]\}]").unwrap());

static NOMINATOR_CATEGORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Category:Nominations by User:(.*?)[\|\]]").unwrap());

/// Bullet lines of one thread, keyed by depth, before interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTree {
    pub nested: bool,
    pub lines: BTreeMap<usize, String>,
}

/// The trees of one objector sub-section.
pub type Section = Vec<RawTree>;

/// Nominator recorded by the per-user nomination category.
pub fn find_nominator(text: &str) -> Option<String> {
    NOMINATOR_CATEGORY
        .captures(text)
        .map(|caps| caps[1].to_string())
}

fn is_review_note(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.replace("reviewing", "review").contains("review note") || lower.contains("(comment)")
}

fn signature_date(line: &str) -> Option<String> {
    DATE_DAY_FIRST
        .captures(line)
        .or_else(|| DATE_MONTH_FIRST.captures(line))
        .map(|caps| caps[1].to_string())
}

fn push_tree(section: &mut Section, nested: bool, tree: &BTreeMap<usize, String>) {
    if !tree.is_empty() {
        section.push(RawTree {
            nested,
            lines: tree.clone(),
        });
    }
}

fn close_section(sections: &mut Vec<Section>, section: &mut Section) {
    if !section.is_empty() {
        sections.push(std::mem::take(section));
    }
}

/// Split the objection area of a page into sections of raw trees.
pub fn build_objection_trees(page_name: &str, text: &str) -> Vec<Section> {
    let mut objections_found = false;
    let mut sections = Vec::new();
    let mut section = Section::new();
    let mut tree: BTreeMap<usize, String> = BTreeMap::new();
    let mut nested = false;

    for line in text.lines() {
        if !objections_found {
            objections_found = line.contains("===Object===");
            continue;
        }
        if line.contains("===Comments===") {
            break;
        }
        if line.starts_with("===") {
            push_tree(&mut section, nested, &tree);
            tree.clear();
            close_section(&mut sections, &mut section);
            continue;
        }
        if !line.starts_with('*') && !line.starts_with(":*") {
            continue;
        }
        let Some(depth) = BULLETS.captures(line).map(|caps| caps[1].len()) else {
            continue;
        };

        if depth == 1 && line.starts_with(":*") && tree.contains_key(&1) {
            tree.clear();
        } else if depth == 1 {
            push_tree(&mut section, nested, &tree);
            nested = false;
            tree.clear();
        } else if nested && tree.contains_key(&depth) {
            push_tree(&mut section, nested, &tree);
            tree.retain(|k, _| *k < depth);
        } else if depth == 2 && tree.contains_key(&2) {
            nested = true;
            push_tree(&mut section, nested, &tree);
            tree.retain(|k, _| *k < depth);
        } else if tree.contains_key(&depth) {
            log::debug!("{page_name}: unexpected reply at depth {depth}: {line}");
        }
        tree.insert(depth, line.to_string());
    }

    push_tree(&mut section, nested, &tree);
    close_section(&mut sections, &mut section);
    sections
}

/// Open `<s>` spans that run past the end of a tree strike the following trees.
pub fn fix_missing_strikethroughs(section: &mut Section) {
    let mut open: i64 = 0;
    for tree in section.iter_mut() {
        let root = if tree.nested { 2 } else { 1 };
        if open > 0 {
            if let Some(line) = tree.lines.get_mut(&root) {
                if !line.contains("<s>") {
                    *line = STRIKE_PREFIX.replace(line, "${1}<s>").into_owned();
                }
            }
        }

        let mut balance = |depth: usize| {
            if let Some(line) = tree.lines.get(&depth) {
                open += line.matches("<s>").count() as i64;
                open -= line.matches("</s>").count() as i64;
            }
        };
        balance(1);
        if tree.nested {
            balance(2);
        }
    }
}

/// Interpret the raw trees of one section.
///
/// Returns the section's objector (the first user found at the root of the
/// last tree upwards) and the interpreted trees, last tree first.
pub fn extract_objections(section: &Section) -> (Option<String>, Vec<ObjectionTree>) {
    let mut current_user: Option<String> = None;
    let mut dates: BTreeMap<usize, String> = BTreeMap::new();
    let mut users: BTreeMap<usize, String> = BTreeMap::new();
    let mut all_done: Option<usize> = None;
    let mut previous: Option<BTreeMap<usize, String>> = None;
    let mut results = Vec::new();

    for raw in section.iter().rev() {
        if raw.lines.is_empty() {
            continue;
        }

        let mut lines = raw.lines.clone();
        if let Some(depth) = all_done {
            if lines.contains_key(&depth) {
                all_done = None;
            } else if let Some(reply) = previous.as_ref().and_then(|p| p.get(&depth)) {
                lines.insert(depth, reply.clone());
            }
        }

        let mut tree = ObjectionTree {
            nested: raw.nested,
            ..ObjectionTree::default()
        };
        for (&depth, line) in &lines {
            if let Some(date) = signature_date(line) {
                dates.insert(depth, date);
            }

            let lower = line.to_lowercase();
            if lower.contains("all done") || lower.contains("all handled") {
                all_done = Some(depth);
            }

            let user = if lower.contains("[[user:") || lower.contains("{{u|") {
                USER_LINK
                    .captures_iter(line)
                    .last()
                    .map(|caps| caps[1].to_string())
            } else {
                None
            };
            if let Some(user) = &user {
                users.insert(depth, user.clone());
            }

            let entry = ObjectionLine {
                counter: depth,
                user: users.get(&depth).cloned(),
                date: dates.get(&depth).cloned(),
                content: line.clone(),
            };
            if depth == 1 || (depth == 2 && raw.nested && !tree.struck) {
                if current_user.is_none() {
                    current_user = user.clone();
                }
                if entry.is_struck() || is_review_note(line) {
                    tree.struck = true;
                }
            }
            tree.lines.insert(depth, entry);
        }

        tree.user = current_user.clone();
        results.push(tree);
        previous = Some(lines);
    }

    (current_user, results)
}

/// Parse, repair and interpret every section of a page.
pub fn parse_objections(page_name: &str, text: &str) -> Vec<(Option<String>, Vec<ObjectionTree>)> {
    build_objection_trees(page_name, text)
        .into_iter()
        .map(|mut section| {
            fix_missing_strikethroughs(&mut section);
            extract_objections(&section)
        })
        .collect()
}

/// Date of the last reply, falling back to the reply above it.
fn last_activity(page_name: &str, tree: &ObjectionTree) -> Option<DateTime<Utc>> {
    let depth = tree.depth();
    let target = tree.lines.get(&depth)?;
    let date = match &target.date {
        Some(date) => date.clone(),
        None => match tree.lines.get(&depth.saturating_sub(1)).and_then(|l| l.date.clone()) {
            Some(date) => {
                log::debug!("{page_name}: no date on reply at depth {depth}, using {date}");
                date
            }
            None => {
                log::warn!("{page_name}: cannot date objection: {}", target.content);
                return None;
            }
        },
    };

    let parsed = parse_signature_date(&date);
    if parsed.is_none() {
        log::warn!("{page_name}: unparseable objection date {date}");
    }
    parsed
}

/// Classify every dated, unresolved tree.
pub fn classify_objections(
    page_name: &str,
    trees: &[ObjectionTree],
    nominator: &str,
    nom_type: &NominationType,
    now: DateTime<Utc>,
) -> Vec<ObjectionResult> {
    trees
        .iter()
        .filter(|tree| !tree.struck)
        .filter_map(|tree| {
            let last_date = last_activity(page_name, tree)?;
            let age_days = (now - last_date).num_days();
            Some(ObjectionResult {
                nominator: nominator.to_string(),
                objector: tree.user.clone(),
                addressed: tree.is_addressed(),
                overdue: age_days >= nom_type.overdue_days,
                first_notification: age_days == nom_type.notification_days,
                last_date,
                age_days,
            })
        })
        .collect()
}

/// A message for one user about objections on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: String,
    pub message: String,
}

/// Aggregated objection state of one nomination page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectionReport {
    pub nominator: String,
    pub overdue: Vec<String>,
    pub notifications: Vec<Notification>,
}

impl ObjectionReport {
    pub fn is_empty(&self) -> bool {
        self.overdue.is_empty() && self.notifications.is_empty()
    }
}

/// Group results per objector into overdue lines and notifications.
///
/// Only trees at least `notification_days` old count. With `include`, every
/// such tree is reported; otherwise only those reaching the threshold today.
pub fn summarize_objections(
    nominator: &str,
    results: &[ObjectionResult],
    nom_type: &NominationType,
    include: bool,
) -> ObjectionReport {
    let mut counts: BTreeMap<(bool, String), (usize, usize)> = BTreeMap::new();
    for result in results
        .iter()
        .filter(|r| r.age_days >= nom_type.notification_days)
    {
        let objector = result.objector.clone().unwrap_or_else(|| "Unknown".to_string());
        let entry = counts.entry((!result.addressed, objector)).or_default();
        if result.overdue {
            entry.0 += 1;
        } else if result.first_notification || include {
            entry.1 += 1;
        }
    }

    let more = if include { " or more" } else { "" };
    let mut report = ObjectionReport {
        nominator: nominator.to_string(),
        ..ObjectionReport::default()
    };
    for ((unaddressed, objector), (overdue, notify)) in counts {
        let state = if unaddressed { "unaddressed" } else { "addressed" };
        if overdue > 0 {
            report.overdue.push(format!(
                "{overdue} objections from {objector} have been {state} for {}{more} days",
                nom_type.overdue_days
            ));
        }
        if notify == 0 {
            continue;
        }
        let days = nom_type.notification_days;
        report.notifications.push(if unaddressed {
            Notification {
                recipient: nominator.to_string(),
                message: format!(
                    "{notify} objections from {objector} have been {state} for {days}{more} days"
                ),
            }
        } else {
            Notification {
                message: format!("{notify} of your objections have been {state} for {days}{more} days"),
                recipient: objector,
            }
        });
    }
    report
}

/// Full objection check of one nomination page. `None` when the page names
/// no nominator.
pub fn examine_nomination(
    page_name: &str,
    text: &str,
    nom_type: &NominationType,
    now: DateTime<Utc>,
    include: bool,
) -> Option<ObjectionReport> {
    let Some(nominator) = find_nominator(text) else {
        log::warn!("{page_name}: no nominator category found");
        return None;
    };

    let results: Vec<ObjectionResult> = parse_objections(page_name, text)
        .iter()
        .flat_map(|(_, trees)| classify_objections(page_name, trees, &nominator, nom_type, now))
        .collect();
    Some(summarize_objections(&nominator, &results, nom_type, include))
}

/// Objection state of one review page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewStatus {
    pub bucket: ReviewBucket,
    pub outstanding: usize,
    /// Age of the oldest dated unresolved objection
    pub oldest_days: Option<i64>,
}

/// Bucket a review page by its unresolved objections.
pub fn classify_review(
    page_name: &str,
    text: &str,
    on_probation: bool,
    now: DateTime<Utc>,
    probe_days: i64,
) -> ReviewStatus {
    let open: Vec<ObjectionTree> = parse_objections(page_name, text)
        .into_iter()
        .flat_map(|(_, trees)| trees)
        .filter(|tree| !tree.struck)
        .collect();
    let oldest_days = open
        .iter()
        .filter_map(|tree| last_activity(page_name, tree))
        .map(|date| (now - date).num_days())
        .max();

    let bucket = if open.is_empty() {
        ReviewBucket::Ready
    } else if on_probation {
        ReviewBucket::Probation
    } else if oldest_days.is_some_and(|days| days >= probe_days) {
        ReviewBucket::Probe
    } else {
        ReviewBucket::Normal
    };

    ReviewStatus {
        bucket,
        outstanding: open.len(),
        oldest_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NominationTypeData;
    use chrono::TimeZone;

    fn fa(overdue_days: i64, notification_days: i64) -> NominationType {
        NominationType::new(
            "FA",
            &NominationTypeData {
                overdue_days,
                notification_days,
                ..NominationTypeData::default()
            },
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 10, 10, 0, 0).unwrap()
    }

    fn sig(user: &str, date: &str) -> String {
        format!("[[User:{user}|{user}]] ([[User talk:{user}|talk]]) {date} (UTC)")
    }

    fn page(objections: &str) -> String {
        format!(
            "===[[Foo]]===\n*'''Nominated by''': {}\n====Support====\n#{{{{Inq}}}}\n====Object====\n{objections}\n====Comments====\n*Nice.\n\n[[Category:Nominations by User:Writer|Foo]]",
            sig("Writer", "10:00, 1 February 2024")
        )
    }

    fn trees(objections: &str) -> Vec<ObjectionTree> {
        parse_objections("Foo", &page(objections))
            .into_iter()
            .flat_map(|(_, trees)| trees)
            .collect()
    }

    #[test]
    fn test_depth_one_is_unaddressed_depth_two_is_addressed() {
        let text = format!(
            "=====Reviewer=====\n*Expand the lead. {}\n*Cite the quote. {}\n**Done. {}",
            sig("Reviewer", "10:00, 1 April 2024"),
            sig("Reviewer", "10:00, 1 April 2024"),
            sig("Writer", "11:00, 2 April 2024"),
        );
        let trees = trees(&text);
        assert_eq!(trees.len(), 2);

        // last tree first
        assert_eq!(trees[0].depth(), 2);
        assert!(trees[0].is_addressed());
        assert_eq!(trees[1].depth(), 1);
        assert!(!trees[1].is_addressed());
        assert_eq!(trees[1].user.as_deref(), Some("Reviewer"));
    }

    #[test]
    fn test_aside_without_reply_is_unaddressed() {
        let text = format!(
            "=====Reviewer=====\n*Fix the lead. {}\n***Some aside. {}",
            sig("Reviewer", "10:00, 1 April 2024"),
            sig("Other", "10:00, 2 April 2024"),
        );
        let trees = trees(&text);
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].lines.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(trees[0].depth(), 3);
        assert!(!trees[0].is_addressed());

        let results = classify_objections("Foo", &trees, "Writer", &fa(14, 7), now());
        assert_eq!(results.len(), 1);
        assert!(!results[0].addressed);
    }

    #[test]
    fn test_bullets_before_first_objector_heading_form_a_section() {
        let text = format!(
            "====Object====\n*Unsigned point. {}\n=====Reviewer=====\n*Expand the lead. {}\n====Comments====",
            sig("Drive-by", "10:00, 1 March 2024"),
            sig("Reviewer", "10:00, 1 March 2024"),
        );
        let sections = build_objection_trees("Foo", &text);
        assert_eq!(sections.len(), 2);
        assert!(sections[0][0].lines[&1].starts_with("*Unsigned point."));
        assert!(sections[1][0].lines[&1].starts_with("*Expand the lead."));
    }

    #[test]
    fn test_forty_day_old_objection_is_overdue() {
        let text = format!(
            "=====Reviewer=====\n*Expand the lead. {}",
            sig("Reviewer", "10:00, 1 March 2024")
        );
        let trees = trees(&text);
        let results = classify_objections("Foo", &trees, "Writer", &fa(30, 7), now());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].age_days, 40);
        assert!(results[0].overdue);
        assert!(!results[0].addressed);
        assert!(!results[0].first_notification);
        assert_eq!(results[0].objector.as_deref(), Some("Reviewer"));
    }

    #[test]
    fn test_struck_and_review_notes_are_resolved() {
        let text = format!(
            "=====Reviewer=====\n*<s>Expand the lead.</s> {}\n*Review note: consider a map. {}\n* <s>Fix</s> {}",
            sig("Reviewer", "10:00, 1 March 2024"),
            sig("Reviewer", "10:00, 1 March 2024"),
            sig("Reviewer", "10:00, 1 March 2024"),
        );
        let trees = trees(&text);
        assert_eq!(trees.len(), 3);
        assert!(trees.iter().all(|t| t.struck));
        assert!(classify_objections("Foo", &trees, "Writer", &fa(14, 7), now()).is_empty());
    }

    #[test]
    fn test_open_strike_carries_into_next_tree() {
        let text = format!(
            "=====Reviewer=====\n*<s>First point {}\n*Second point</s> {}",
            sig("Reviewer", "10:00, 1 March 2024"),
            sig("Reviewer", "10:00, 1 March 2024"),
        );
        let trees = trees(&text);
        assert_eq!(trees.len(), 2);
        assert!(trees.iter().all(|t| t.struck));
        assert!(trees[0].lines[&1].content.starts_with("*<s>Second point"));
    }

    #[test]
    fn test_all_done_propagates_to_earlier_trees() {
        let text = format!(
            "=====Reviewer=====\n*Fix A. {}\n*Fix B. {}\n**All done. {}",
            sig("Reviewer", "10:00, 1 March 2024"),
            sig("Reviewer", "10:00, 1 March 2024"),
            sig("Writer", "10:00, 2 March 2024"),
        );
        let trees = trees(&text);
        assert_eq!(trees.len(), 2);
        assert!(trees.iter().all(|t| t.is_addressed()));
        assert_eq!(trees[1].lines[&2].user.as_deref(), Some("Writer"));
    }

    #[test]
    fn test_nested_objections_split_into_trees() {
        let text = format!(
            "=====Reviewer=====\n*A few points:\n**Expand the lead. {}\n***Done. {}\n**Cite the quote. {}",
            sig("Reviewer", "10:00, 1 March 2024"),
            sig("Writer", "10:00, 2 March 2024"),
            sig("Reviewer", "10:00, 1 March 2024"),
        );
        let sections = build_objection_trees("Foo", &page(&text));
        assert_eq!(sections.len(), 1);
        let section = &sections[0];
        assert_eq!(section.len(), 2);
        assert!(section[0].nested);
        assert_eq!(section[0].lines.len(), 3);
        assert!(section[1].nested);
        assert_eq!(section[1].lines.len(), 2);
    }

    #[test]
    fn test_sections_without_comments_heading_are_flushed() {
        let text = format!(
            "====Object====\n=====Reviewer=====\n*Expand the lead. {}",
            sig("Reviewer", "10:00, 1 March 2024")
        );
        let sections = build_objection_trees("Foo", &text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0][0].lines.len(), 1);
    }

    #[test]
    fn test_missing_reply_date_falls_back_to_parent() {
        let text = format!(
            "=====Reviewer=====\n*Expand the lead. {}\n**Working on it",
            sig("Reviewer", "10:00, 1 March 2024")
        );
        let trees = trees(&text);
        let results = classify_objections("Foo", &trees, "Writer", &fa(30, 7), now());
        assert_eq!(results.len(), 1);
        assert!(results[0].addressed);
        assert_eq!(results[0].age_days, 40);
    }

    #[test]
    fn test_report_messages() {
        let text = format!(
            "=====Reviewer=====\n*Expand the lead. {}\n*Cite the quote. {}\n**Done. {}\n=====Critic=====\n*Too short. {}",
            sig("Reviewer", "10:00, 1 April 2024"),
            sig("Reviewer", "10:00, 1 April 2024"),
            sig("Writer", "10:00, 2 April 2024"),
            sig("Critic", "10:00, 1 March 2024"),
        );
        let report = examine_nomination("Foo", &page(&text), &fa(14, 7), now(), true).unwrap();
        assert_eq!(report.nominator, "Writer");
        assert_eq!(
            report.overdue,
            vec!["1 objections from Critic have been unaddressed for 14 or more days"]
        );
        assert_eq!(
            report.notifications,
            vec![
                Notification {
                    recipient: "Reviewer".into(),
                    message: "1 of your objections have been addressed for 7 or more days".into(),
                },
                Notification {
                    recipient: "Writer".into(),
                    message: "1 objections from Reviewer have been unaddressed for 7 or more days"
                        .into(),
                },
            ]
        );
    }

    #[test]
    fn test_report_without_include_only_counts_first_notifications() {
        let text = format!(
            "=====Reviewer=====\n*Expand the lead. {}\n*Cite the quote. {}",
            sig("Reviewer", "10:00, 3 April 2024"),
            sig("Reviewer", "10:00, 1 April 2024"),
        );
        let report = examine_nomination("Foo", &page(&text), &fa(14, 7), now(), false).unwrap();
        assert_eq!(
            report.notifications[0].message,
            "1 objections from Reviewer have been unaddressed for 7 days"
        );
    }

    #[test]
    fn test_missing_nominator() {
        assert!(examine_nomination("Foo", "====Object====", &fa(14, 7), now(), true).is_none());
        assert_eq!(find_nominator(&page("")).as_deref(), Some("Writer"));
    }

    #[test]
    fn test_review_buckets() {
        let review = |objections: &str| {
            format!("===[[Foo]]===\n====Support====\n\n====Object====\n{objections}\n====Comments====\n")
        };
        let old = format!("*Outdated. {}", sig("Reviewer", "10:00, 1 March 2024"));
        let fresh = format!("*Outdated. {}", sig("Reviewer", "10:00, 1 April 2024"));

        let ready = classify_review("Foo", &review(""), false, now(), 30);
        assert_eq!(ready.bucket, ReviewBucket::Ready);
        assert_eq!(ready.outstanding, 0);

        let probe = classify_review("Foo", &review(&old), false, now(), 30);
        assert_eq!(probe.bucket, ReviewBucket::Probe);
        assert_eq!(probe.oldest_days, Some(40));

        assert_eq!(classify_review("Foo", &review(&fresh), false, now(), 30).bucket, ReviewBucket::Normal);
        assert_eq!(classify_review("Foo", &review(&fresh), true, now(), 30).bucket, ReviewBucket::Probation);
    }
}
