// src/services/analysis.rs

//! Listing page versus status category comparison.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static LINK_TARGET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[(.*?)[\|\]]").unwrap());

/// Discrepancies between a status listing page and its category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub duplicates: Vec<String>,
    /// In the category but not on the listing page
    pub missing_from_page: Vec<String>,
    /// On the listing page but not in the category
    pub missing_from_category: Vec<String>,
}

impl Analysis {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty()
            && self.missing_from_page.is_empty()
            && self.missing_from_category.is_empty()
    }

    /// Report lines naming the listing page and category.
    pub fn report(&self, page: &str, category: &str) -> Vec<String> {
        let mut lines = Vec::new();
        let mut section = |header: String, items: &[String]| {
            if !items.is_empty() {
                lines.push(header);
                lines.extend(items.iter().map(|item| format!("- {item}")));
            }
        };
        section(format!("Duplicates on {page}:"), &self.duplicates);
        section(format!("Missing from {page}:"), &self.missing_from_page);
        section(
            format!("Listed on {page}, but not in {category}:"),
            &self.missing_from_category,
        );
        lines
    }
}

/// Articles linked between the `<!--Start-->` and `<!--End-->` markers.
fn listed_articles(text: &str) -> (Vec<String>, Vec<String>) {
    let mut listed: Vec<String> = Vec::new();
    let mut duplicates = Vec::new();
    let mut started = false;

    for line in text.lines() {
        if !started {
            started = line.contains("<!--Start-->");
            continue;
        }
        if line.contains("<!--End-->") {
            break;
        }
        for caps in LINK_TARGET.captures_iter(line) {
            let target = caps[1].replace('\u{200e}', "");
            if listed.contains(&target) {
                duplicates.push(target);
            } else {
                listed.push(target);
            }
        }
    }
    (listed, duplicates)
}

const OTHER_NAMESPACES: [&str; 10] = [
    "Category:",
    "File:",
    "Forum:",
    "Help:",
    "Module:",
    "Talk:",
    "Template:",
    "User:",
    "User talk:",
    "Wookieepedia:",
];

fn is_article(title: &str) -> bool {
    !OTHER_NAMESPACES.iter().any(|ns| title.starts_with(ns))
}

fn lowercase_first(title: &str) -> String {
    let mut chars = title.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Compare the listing page text with the category's article titles.
///
/// Only main-namespace members count. A listing whose first letter is
/// lowercase still matches its category member.
pub fn compare_category_and_page(listing: &str, members: &[String]) -> Analysis {
    let (mut listed, duplicates) = listed_articles(listing);
    let mut missing_from_page = Vec::new();

    for title in members.iter().filter(|title| is_article(title)) {
        if let Some(index) = listed.iter().position(|l| l == title) {
            listed.remove(index);
        } else if let Some(index) = listed.iter().position(|l| *l == lowercase_first(title)) {
            listed.remove(index);
        } else {
            missing_from_page.push(title.clone());
        }
    }

    Analysis {
        duplicates,
        missing_from_page,
        missing_from_category: listed,
    }
}
