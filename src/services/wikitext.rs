// src/services/wikitext.rs

//! Markup transformations applied during archival and intake.
//!
//! Every function here is pure: it takes the current page text and returns
//! the replacement, or `None` when the change is already in place (or cannot
//! be located, where the caller decides whether that is an error).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::ProjectData;
use crate::error::{Rejection, Result};
use crate::models::Revision;

pub const DO_NOT_WRITE_BELOW: &str = "<!-- DO NOT WRITE BELOW THIS LINE! -->";

const WORD_COUNT_VIOLATION: &str =
    "[[Category:Status article nominations that violate the word count requirement]]";

static TOP_PAGENAME_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{\{[Tt]op\|[^\n]+\|title=''\{\{PAGENAME\}\}''").unwrap()
});

static TOP_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\{[Tt]op\|[^\n]+\|title=(?P<title>.*?)[|}]").unwrap());

static TOP_TITLE2: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\{[Tt]op\|[^\n]+\|title2=(?P<title>.*?)[|}]").unwrap());

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<title>.+?) \((?P<paren>.*?)\)$").unwrap());

static FORMER_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[Tt]op.*?\|([cgf]a)[|}]").unwrap());

static STRIP_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\{\{[Tt]op.*?)\|f?[cgf]a([|}])").unwrap());

static TOP_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{[Tt]op([|}])").unwrap());

static VOTES_TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\{\{[FGC][AT]Nvotes\|.*?)\}\}").unwrap());

static PROJECT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'+WookieeProject.*'+:(.*)").unwrap());

static UNSORTED_PROJECT_CATEGORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[Category:WookieeProject [^\|]+\]\]").unwrap());

static COMMENTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static REFS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<ref[^>]*/>|<ref[^>]*>.*?</ref>").unwrap());

static INNER_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{[^{}]*\}\}").unwrap());

static TABLES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{\|.*?\|\}").unwrap());

static MEDIA_LINKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(?:File|Image|Category):[^\]]*\]\]").unwrap());

static LINKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(?:[^|\]]*\|)?([^\]]*)\]\]").unwrap());

static EXTERNAL_LINKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[https?://\S+ ?([^\]]*)\]").unwrap());

static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Pipelink to an article honouring the `title=` and `title2=` parameters of
/// its `{{Top}}` template.
pub fn determine_title_format(title: &str, text: &str) -> String {
    if TOP_PAGENAME_TITLE.is_match(text) {
        return format!("''[[{title}]]''");
    }

    let title1 = TOP_TITLE.captures(text).map(|caps| caps["title"].to_string());
    if title1.as_deref() == Some(format!("''{title}''").as_str()) {
        return format!("''[[{title}]]''");
    }

    if let Some(caps) = PARENTHETICAL.captures(title) {
        let title2 = TOP_TITLE2.captures(text).map(|c| c["title"].to_string());
        if title1.is_none() && title2.is_none() {
            return format!("[[{title}]]");
        }
        let main = title1.unwrap_or_else(|| caps["title"].to_string());
        let paren = title2.unwrap_or_else(|| caps["paren"].to_string());
        return format!("[[{title}|{main} ({paren})]]");
    }

    match title1 {
        Some(display) if display != title => format!("[[{title}|{display}]]"),
        _ => format!("[[{title}]]"),
    }
}

/// Prose word counts of an article.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub total: usize,
    pub intro: usize,
    pub body: usize,
    pub bts: usize,
}

impl fmt::Display for WordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} words ({} introduction, {} body, {} behind the scenes)",
            self.total, self.intro, self.body, self.bts
        )
    }
}

#[derive(Clone, Copy, PartialEq)]
enum ProseSection {
    Intro,
    Body,
    BehindTheScenes,
    Skipped,
}

const NON_PROSE_SECTIONS: [&str; 7] = [
    "appearances",
    "non-canon appearances",
    "sources",
    "non-canon sources",
    "notes and references",
    "external links",
    "see also",
];

fn strip_markup(text: &str) -> String {
    let mut text = COMMENTS.replace_all(text, "").into_owned();
    text = REFS.replace_all(&text, "").into_owned();
    loop {
        let stripped = INNER_TEMPLATE.replace_all(&text, "").into_owned();
        if stripped == text {
            break;
        }
        text = stripped;
    }
    text = TABLES.replace_all(&text, "").into_owned();
    text = MEDIA_LINKS.replace_all(&text, "").into_owned();
    text = LINKS.replace_all(&text, "$1").into_owned();
    text = EXTERNAL_LINKS.replace_all(&text, "$1").into_owned();
    text = TAGS.replace_all(&text, "").into_owned();
    text.replace("'''", "").replace("''", "")
}

/// Count prose words in the introduction, body and behind-the-scenes sections.
pub fn word_count(text: &str) -> WordCount {
    let mut counts = WordCount::default();
    let mut section = ProseSection::Intro;

    for line in strip_markup(text).lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("==") {
            if !trimmed.starts_with("===") {
                let name = trimmed.trim_matches('=').trim().to_lowercase();
                section = if name == "behind the scenes" {
                    ProseSection::BehindTheScenes
                } else if NON_PROSE_SECTIONS.contains(&name.as_str()) {
                    ProseSection::Skipped
                } else {
                    ProseSection::Body
                };
            }
            continue;
        }

        let words = trimmed.unicode_words().count();
        match section {
            ProseSection::Intro => counts.intro += words,
            ProseSection::Body => counts.body += words,
            ProseSection::BehindTheScenes => counts.bts += words,
            ProseSection::Skipped => {}
        }
    }

    counts.total = counts.intro + counts.body + counts.bts;
    counts
}

/// Remove `{{/<subpage>}}` and the blank lines after it. `None` when the
/// transclusion is not on the page.
pub fn detach_subpage(parent: &str, subpage: &str) -> Option<String> {
    let expected = format!("{{{{/{subpage}}}}}");
    if !parent.contains(&expected) {
        return None;
    }

    let mut lines = Vec::new();
    let mut found = false;
    let mut skipping_blank = false;
    for line in parent.lines() {
        if !found && line.trim() == expected {
            found = true;
            skipping_blank = true;
        } else if skipping_blank && line.trim().is_empty() {
            continue;
        } else {
            skipping_blank = false;
            lines.push(line);
        }
    }

    found.then(|| lines.join("\n"))
}

/// Append `{{/<subpage>}}` to the parent page. `None` when already present.
pub fn attach_subpage(parent: &str, subpage: &str) -> Option<String> {
    let expected = format!("{{{{/{subpage}}}}}");
    (!parent.contains(&expected)).then(|| format!("{parent}\n\n{expected}"))
}

/// Set the status flag of the `{{Top}}` template, replacing any current or
/// former flag. Returns the new text and the flag previously held.
pub fn apply_status_flag(text: &str, flag: &str) -> std::result::Result<(String, Option<String>), Rejection> {
    let former = FORMER_STATUS
        .captures(text)
        .map(|caps| caps[1].to_string());

    let stripped = STRIP_STATUS.replace_all(text, "${1}${2}");
    let flagged = TOP_OPEN.replace_all(&stripped, format!("{{{{Top|{flag}${{1}}").as_str());
    if flagged == stripped {
        return Err(Rejection::StatusNotApplied);
    }
    Ok((flagged.into_owned(), former))
}

/// Remove the line carrying `{{<template>|...}}`. `None` when the template
/// is not on the page.
pub fn remove_template_line(text: &str, template: &str) -> Result<Option<String>> {
    let pattern = Regex::new(&format!(r"\{{\{{{}[|}}].*?(\n|$)", regex::escape(template)))?;
    let removed = pattern.replace_all(text, "");
    Ok((removed != text).then(|| removed.into_owned()))
}

/// Values stamped onto an archived nomination page.
#[derive(Debug, Clone)]
pub struct NominationArchive<'a> {
    pub abbreviation: &'a str,
    /// `successful`, `withdrawn` or `unsuccessful`
    pub outcome: &'a str,
    pub nomination_category: &'a str,
    pub archive_category: &'a str,
    pub sort_key: &'a str,
    pub word_count: &'a str,
}

/// Whether a nomination or review page already carries its completion note.
pub fn is_archived(text: &str) -> bool {
    text.contains("*'''Date Archived'''")
}

fn is_relocatable(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed != "</div>" && !trimmed.contains("[[Category:")
}

/// Apply the archive template and completion note to a nomination page.
///
/// `None` when the active nomination category is no longer on the page.
pub fn archive_nomination_page(text: &str, archive: &NominationArchive<'_>) -> Option<String> {
    let (above, below) = match text.split_once(DO_NOT_WRITE_BELOW) {
        Some((above, below)) => (above, below),
        None => (text, ""),
    };
    let mut relocated: Vec<&str> = below.lines().filter(|l| is_relocatable(l)).collect();

    let mut lines = vec![format!(
        "{{{{subst:{} archive|{}}}}}",
        archive.abbreviation, archive.outcome
    )];
    let mut category_found = below.contains(archive.nomination_category);

    for line in above.lines() {
        if line.contains("ANvotes|") {
            lines.push(VOTES_TEMPLATE.replace_all(line, "${1}|1}}").into_owned());
        } else if line.contains("Nomination comments") {
            lines.push(line.to_string());
            lines.push("*'''Date Archived''': ~~~~~".to_string());
            lines.push(format!("*'''Final word count''': {}", archive.word_count));
            lines.extend(relocated.drain(..).map(str::to_string));
        } else if !category_found && line.contains(archive.nomination_category) {
            category_found = true;
        } else if line.contains(WORD_COUNT_VIOLATION) && !line.contains("nowiki") {
            lines.push(format!("<nowiki>{line}</nowiki>"));
        } else {
            lines.push(line.to_string());
        }
    }

    if !category_found {
        return None;
    }

    lines.extend(relocated.into_iter().map(str::to_string));
    lines.push(format!("[[{}|{}]]", archive.archive_category, archive.sort_key));
    lines.push("</div>".to_string());
    Some(lines.join("\n"))
}

/// One row of a nomination history table.
pub fn history_row(
    link: &str,
    start: &Revision,
    end: &Revision,
    user: &str,
    page: &str,
    result: &str,
) -> String {
    format!(
        "|-\n| {link} || {} || {} || {{{{U|{user}}}}} || [[{page} | {result}]]",
        start.timestamp.format("%Y/%m/%d"),
        end.timestamp.format("%Y/%m/%d"),
    )
}

/// Whether a history table already links the given nomination page.
pub fn has_history_row(text: &str, page: &str) -> bool {
    text.contains(&format!("[[{page} |")) || text.contains(&format!("[[{page}|"))
}

/// Insert a row before the closing `|}` of the last table.
pub fn insert_table_row(text: &str, row: &str) -> String {
    match text.rfind("|}") {
        Some(index) => format!("{}{row}\n{}", &text[..index], &text[index..]),
        None => format!("{text}\n{row}"),
    }
}

/// Remove an article's line from a status listing page.
///
/// `None` when a line listing the article also lists others, which would
/// require a manual edit.
pub fn remove_from_listing(text: &str, article: &str) -> Option<String> {
    let plain = format!("[[{article}]]");
    let piped = format!("[[{article}|");
    let mut lines = Vec::new();
    for line in text.lines() {
        let lists_article = line.contains(&plain) || line.contains(&piped);
        if lists_article && line.matches("[[").count() > 1 {
            log::error!("Unable to remove {article}, listing line is ambiguous: {line}");
            return None;
        }
        if !lists_article {
            lines.push(line);
        }
    }
    Some(lines.join("\n"))
}

/// Projects named in the nomination's WookieeProject field.
pub fn identify_projects(text: &str, projects: &BTreeMap<String, ProjectData>) -> Vec<String> {
    let Some(field) = PROJECT_FIELD.captures(text).map(|caps| caps[1].trim().to_uppercase()) else {
        return Vec::new();
    };
    if field.is_empty() {
        return Vec::new();
    }

    projects
        .iter()
        .filter(|(name, data)| {
            let name = name.to_uppercase();
            field.contains(&format!("WOOKIEEPROJECT {name}"))
                || field.contains(&name)
                || data
                    .shortcut
                    .iter()
                    .any(|shortcut| field.contains(&shortcut.to_uppercase()))
        })
        .map(|(name, _)| name.clone())
        .collect()
}

/// Categories a new nomination page still lacks.
pub fn missing_nomination_categories(
    text: &str,
    user_category: &str,
    sort_key: &str,
    projects: &[String],
) -> Vec<String> {
    let mut categories = Vec::new();
    if !text.contains(user_category) {
        categories.push(format!("[[{user_category}|{sort_key}]]"));
    }
    for project in projects {
        if !text.contains(&format!("[[Category:WookieeProject {project}")) {
            categories.push(format!("[[Category:WookieeProject {project}|{sort_key}]]"));
        }
    }
    categories
}

/// Insert categories into the trailing `<noinclude>` block and drop unsorted
/// project categories.
pub fn insert_categories(text: &str, categories: &[String]) -> String {
    let joined = categories.concat();
    let inserted = ["|}}</noinclude>", "}}</noinclude>", "</noinclude>"]
        .iter()
        .find(|anchor| text.contains(*anchor))
        .map(|anchor| text.replacen(anchor, &format!("{joined}{anchor}"), 1));

    let text = match inserted {
        Some(text) => text,
        None if joined.is_empty() => text.to_string(),
        None => {
            log::warn!("Nomination page has no noinclude block, appending one");
            format!("{text}\n<noinclude>{joined}</noinclude>")
        }
    };
    UNSORTED_PROJECT_CATEGORY.replace_all(&text, "").into_owned()
}

/// Insert the word count field above the WookieeProject field. `None` when
/// the count is already recorded or there is no anchor field.
pub fn add_word_count_line(text: &str, count: &WordCount) -> Option<String> {
    if text.contains("*'''Word count at nomination time'''") {
        return None;
    }
    let mut found = false;
    let mut lines = Vec::new();
    for line in text.lines() {
        if line.contains("*'''WookieeProject (optional)''':") {
            lines.push(format!("*'''Word count at nomination time''': {count}"));
            found = true;
        }
        lines.push(line.to_string());
    }
    found.then(|| lines.join("\n"))
}

/// Section appended to a nominator's talk page.
pub fn notification_text(header: &str, abbreviation: &str, article: &str, signature: &str) -> String {
    format!(
        "\n\n=={header}==\n{{{{subst:{abbreviation} notify|1={article}|2={signature} ~~~~~}}}}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_title_format() {
        assert_eq!(determine_title_format("Foo", "{{Top|fa}}\nText"), "[[Foo]]");
        assert_eq!(
            determine_title_format("Foo", "{{Top|fa|title=''{{PAGENAME}}''}}"),
            "''[[Foo]]''"
        );
        assert_eq!(
            determine_title_format("Foo", "{{Top|fa|title=''Foo''}}"),
            "''[[Foo]]''"
        );
        assert_eq!(
            determine_title_format("Foo (starship)", "{{Top|ga|title=''Foo''}}"),
            "[[Foo (starship)|''Foo'' (starship)]]"
        );
        assert_eq!(
            determine_title_format("Foo (starship)", "{{Top|ga}}"),
            "[[Foo (starship)]]"
        );
        assert_eq!(
            determine_title_format("Bar", "{{Top|ca|title=The Bar}}"),
            "[[Bar|The Bar]]"
        );
    }

    #[test]
    fn test_word_count_sections() {
        let text = "{{Top|fa}}\n'''Foo''' was a [[Jedi|Jedi Knight]].<ref>{{Cite|x}}</ref>\n\
                    ==Biography==\nFoo fought in the [[Clone Wars]].\n===Early life===\nBorn on Coruscant.\n\
                    ==Behind the scenes==\nCreated by a writer.\n\
                    ==Appearances==\n*''Some Book''\n[[Category:Jedi]]";
        let count = word_count(text);
        assert_eq!(count.intro, 5);
        assert_eq!(count.body, 9);
        assert_eq!(count.bts, 4);
        assert_eq!(count.total, 18);
        assert_eq!(
            count.to_string(),
            "18 words (5 introduction, 9 body, 4 behind the scenes)"
        );
    }

    #[test]
    fn test_detach_subpage() {
        let parent = "Intro\n{{/Foo}}\n\n\n{{/Bar}}\n";
        assert_eq!(detach_subpage(parent, "Foo").as_deref(), Some("Intro\n{{/Bar}}"));
        assert_eq!(detach_subpage(parent, "Baz"), None);
        assert_eq!(detach_subpage("{{/Foo (second nomination)}}", "Foo"), None);
    }

    #[test]
    fn test_attach_subpage() {
        assert_eq!(attach_subpage("Intro", "Foo").as_deref(), Some("Intro\n\n{{/Foo}}"));
        assert_eq!(attach_subpage("Intro\n\n{{/Foo}}", "Foo"), None);
    }

    #[test]
    fn test_apply_status_flag() {
        let (text, former) = apply_status_flag("{{Top|ga|real}}\nText", "fa").unwrap();
        assert_eq!(text, "{{Top|fa|real}}\nText");
        assert_eq!(former.as_deref(), Some("ga"));

        let (text, former) = apply_status_flag("{{Top|ffa}}", "ga").unwrap();
        assert_eq!(text, "{{Top|ga}}");
        assert_eq!(former, None);

        assert_eq!(apply_status_flag("No top", "fa"), Err(Rejection::StatusNotApplied));
    }

    #[test]
    fn test_remove_template_line() {
        let text = "{{Top}}\n{{FAnom|date}}\nBody";
        assert_eq!(
            remove_template_line(text, "FAnom").unwrap().as_deref(),
            Some("{{Top}}\nBody")
        );
        assert_eq!(remove_template_line("{{Top}}\nBody", "FAnom").unwrap(), None);
        assert_eq!(
            remove_template_line("{{Top}}\nBody\n{{FAnom|Darth Bane}}", "FAnom").unwrap().as_deref(),
            Some("{{Top}}\nBody\n")
        );
    }

    fn archive<'a>() -> NominationArchive<'a> {
        NominationArchive {
            abbreviation: "FA",
            outcome: "successful",
            nomination_category: "Category:Wookieepedia Featured article nominations",
            archive_category: "Category:Archived nominations by User:Writer",
            sort_key: "Foo",
            word_count: "100 words (10 introduction, 80 body, 10 behind the scenes)",
        }
    }

    #[test]
    fn test_archive_nomination_page() {
        let text = "===[[Foo]]===\n{{FANvotes|Foo}}\n====Nomination comments====\n*Looks fine\n\
                    [[Category:Status article nominations that violate the word count requirement]]\n\
                    <!-- DO NOT WRITE BELOW THIS LINE! -->\n*Late support\n</div>\n\
                    <noinclude>[[Category:Wookieepedia Featured article nominations|Foo]]</noinclude>";
        let archived = archive_nomination_page(text, &archive()).unwrap();
        assert_eq!(
            archived,
            "{{subst:FA archive|successful}}\n===[[Foo]]===\n{{FANvotes|Foo|1}}\n====Nomination comments====\n\
             *'''Date Archived''': ~~~~~\n\
             *'''Final word count''': 100 words (10 introduction, 80 body, 10 behind the scenes)\n\
             *Late support\n*Looks fine\n\
             <nowiki>[[Category:Status article nominations that violate the word count requirement]]</nowiki>\n\
             [[Category:Archived nominations by User:Writer|Foo]]\n</div>"
        );
        assert!(is_archived(&archived));
    }

    #[test]
    fn test_archive_requires_nomination_category() {
        assert_eq!(archive_nomination_page("===[[Foo]]===", &archive()), None);
    }

    #[test]
    fn test_history_rows() {
        let revision = |day| Revision {
            revid: 1,
            user: "Writer".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
            comment: String::new(),
            tags: Vec::new(),
        };
        let row = history_row("[[Foo]]", &revision(1), &revision(9), "Writer", "WP:FAN/Foo", "Success");
        assert_eq!(
            row,
            "|-\n| [[Foo]] || 2024/03/01 || 2024/03/09 || {{U|Writer}} || [[WP:FAN/Foo | Success]]"
        );

        let table = "{|\n! Article\n|}\n{|\n|-\n| [[Bar]]\n|}";
        let updated = insert_table_row(table, &row);
        assert!(updated.ends_with(&format!("| [[Bar]]\n{row}\n|}}")));
        assert!(updated.starts_with("{|\n! Article\n|}\n"));
        assert!(has_history_row(&updated, "WP:FAN/Foo"));
        assert!(!has_history_row(&updated, "WP:FAN/Foo (second nomination)"));
    }

    #[test]
    fn test_remove_from_listing() {
        let text = "==People==\n*[[Foo]]\n*[[Bar|The Bar]]";
        assert_eq!(remove_from_listing(text, "Foo").as_deref(), Some("==People==\n*[[Bar|The Bar]]"));
        assert_eq!(remove_from_listing(text, "Bar").as_deref(), Some("==People==\n*[[Foo]]"));
        assert_eq!(remove_from_listing("*[[Foo]], [[Baz]]", "Foo"), None);
    }

    #[test]
    fn test_identify_projects() {
        let mut projects = BTreeMap::new();
        projects.insert("Dinosaurs".to_string(), ProjectData::default());
        projects.insert(
            "Ships".to_string(),
            ProjectData {
                template: None,
                shortcut: vec!["WP:SHIPS".to_string()],
            },
        );
        projects.insert("Droids".to_string(), ProjectData::default());

        let text = "*'''WookieeProject (optional)''': [[WP:SHIPS]], WookieeProject Dinosaurs";
        assert_eq!(identify_projects(text, &projects), vec!["Dinosaurs", "Ships"]);
        assert!(identify_projects("*'''WookieeProject (optional)''':", &projects).is_empty());
    }

    #[test]
    fn test_intake_categories() {
        let text = "Body\n<noinclude>{{Nom|x}}</noinclude>";
        let categories = missing_nomination_categories(
            text,
            "Category:Nominations by User:Writer",
            "Foo",
            &["Ships".to_string()],
        );
        assert_eq!(categories.len(), 2);
        let updated = insert_categories(text, &categories);
        assert_eq!(
            updated,
            "Body\n<noinclude>{{Nom|x[[Category:Nominations by User:Writer|Foo]][[Category:WookieeProject Ships|Foo]]}}</noinclude>"
        );
        assert!(missing_nomination_categories(&updated, "Category:Nominations by User:Writer", "Foo", &["Ships".to_string()]).is_empty());

        assert_eq!(
            insert_categories("Body", &["[[Category:X|Foo]]".to_string()]),
            "Body\n<noinclude>[[Category:X|Foo]]</noinclude>"
        );
        assert_eq!(
            insert_categories("[[Category:WookieeProject Ships]]</noinclude>", &[]),
            "</noinclude>"
        );
    }

    #[test]
    fn test_add_word_count_line() {
        let count = WordCount { total: 3, intro: 1, body: 1, bts: 1 };
        let text = "*'''Nominated by''': x\n*'''WookieeProject (optional)''': ";
        let updated = add_word_count_line(text, &count).unwrap();
        assert_eq!(
            updated,
            "*'''Nominated by''': x\n*'''Word count at nomination time''': 3 words (1 introduction, 1 body, 1 behind the scenes)\n*'''WookieeProject (optional)''': "
        );
        assert_eq!(add_word_count_line(&updated, &count), None);
    }

    #[test]
    fn test_notification_text() {
        assert_eq!(
            notification_text("Foo", "FA", "Foo", "{{U|Reviewer}}"),
            "\n\n==Foo==\n{{subst:FA notify|1=Foo|2={{U|Reviewer}} ~~~~~}}"
        );
    }
}
