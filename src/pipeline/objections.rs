// src/pipeline/objections.rs

//! Scheduled objection checks.
//!
//! Walks the active nomination or review pages of a type and runs the
//! objection analysis over each one.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Rejection, Result};
use crate::models::{NominationType, ReviewBucket};
use crate::services::objections::{classify_review, examine_nomination};
use crate::services::review::{REVIEW_SUFFIXES, StatusState, article_status};
use crate::services::{ObjectionReport, ReviewStatus};
use crate::pipeline::Context;
use crate::utils::{progress, subpage_name};

fn nomination_type<'a>(ctx: &'a Context, code: &str) -> Result<&'a NominationType> {
    ctx.data
        .types
        .get(code)
        .ok_or_else(|| Rejection::UnrecognizedType(code.to_string()).into())
}

/// Subpages of an index page listed in a category.
async fn active_pages(ctx: &Context, category: &str, index: &str) -> Result<Vec<String>> {
    let prefix = format!("{index}/");
    let members = ctx.store.category_members(category).await?;
    Ok(members
        .into_iter()
        .filter(|title| title.starts_with(&prefix) && !title.ends_with("/History"))
        .collect())
}

/// Objection reports for every active nomination of a type.
///
/// With `include`, objections past the notification threshold are reported
/// every time; otherwise only on the day they reach it.
pub async fn check_active_nominations(
    ctx: &Context,
    code: &str,
    include: bool,
) -> Result<Vec<(String, ObjectionReport)>> {
    let nom_type = nomination_type(ctx, code)?;
    progress::header(&format!("Checking {} objections", nom_type.code()));

    let pages = active_pages(ctx, &nom_type.nomination_category, &nom_type.nomination_page).await?;
    let mut reports = Vec::new();
    for page in pages {
        if let Some(report) = check_nomination_page(ctx, &page, include).await? {
            if !report.is_empty() {
                reports.push((page, report));
            }
        }
    }

    progress::summary(
        "Objection check complete",
        &[("Nominations with findings", reports.len().to_string())],
    );
    Ok(reports)
}

/// Objection report for one nomination page. `None` when the page names no
/// nominator.
pub async fn check_nomination_page(ctx: &Context, page: &str, include: bool) -> Result<Option<ObjectionReport>> {
    let nom_type = ctx
        .data
        .types
        .iter()
        .find(|t| page.starts_with(&format!("{}/", t.nomination_page)))
        .ok_or_else(|| Rejection::UnrecognizedType(page.to_string()))?;
    let text = ctx.store.get_text(page).await?;
    let report = examine_nomination(page, &text, nom_type, ctx.now(), include);
    if let Some(report) = &report {
        progress::sub_item(&format!(
            "{page}: {} overdue, {} notifications",
            report.overdue.len(),
            report.notifications.len()
        ));
    }
    Ok(report)
}

/// Article under review, with any repeat-review suffix removed.
fn reviewed_article(page: &str) -> &str {
    let subpage = subpage_name(page);
    REVIEW_SUFFIXES
        .iter()
        .filter(|suffix| !suffix.is_empty())
        .find_map(|suffix| subpage.strip_suffix(*suffix))
        .unwrap_or(subpage)
}

/// Objection state of one review page.
pub async fn check_review_page(ctx: &Context, page: &str) -> Result<ReviewStatus> {
    let text = ctx.store.get_text(page).await?;
    let article = reviewed_article(page);

    let on_probation = match ctx.store.get_text_opt(article).await? {
        Some(article_text) => article_status(&article_text, &ctx.data.types)
            .is_some_and(|status| status.state == StatusState::Probation),
        None => {
            log::warn!("{article} under review does not exist");
            false
        }
    };
    Ok(classify_review(
        page,
        &text,
        on_probation,
        ctx.now(),
        ctx.config.archive.review_probe_days,
    ))
}

/// Active reviews grouped by objection state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewReport {
    pub probe_days: i64,
    pub buckets: BTreeMap<ReviewBucket, Vec<String>>,
}

impl ReviewReport {
    /// Report lines: one header per non-empty bucket followed by its articles.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for bucket in ReviewBucket::ALL {
            let Some(articles) = self.buckets.get(&bucket).filter(|a| !a.is_empty()) else {
                continue;
            };
            lines.push(bucket.header(self.probe_days));
            lines.extend(articles.iter().map(|article| format!("- {article}")));
        }
        lines
    }
}

/// Classify every active review of a type.
pub async fn check_active_reviews(ctx: &Context, code: &str) -> Result<ReviewReport> {
    let nom_type = nomination_type(ctx, code)?;
    progress::header(&format!("Checking {} reviews", nom_type.adjective));

    let mut report = ReviewReport {
        probe_days: ctx.config.archive.review_probe_days,
        buckets: BTreeMap::new(),
    };
    for page in active_pages(ctx, &nom_type.review_category, &nom_type.review_page).await? {
        let status = check_review_page(ctx, &page).await?;
        progress::sub_item(&format!("{page}: {:?} ({} open)", status.bucket, status.outstanding));
        report
            .buckets
            .entry(status.bucket)
            .or_default()
            .push(reviewed_article(&page).to_string());
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{Fixture, fixture};
    use chrono::{TimeZone, Utc};

    const NOM_CATEGORY: &str = "Category:Wookieepedia Featured article nomination pages";
    const REVIEW_CATEGORY: &str = "Category:Wookieepedia Featured article review pages";

    fn sig(user: &str, date: &str) -> String {
        format!("[[User:{user}|{user}]] {date} (UTC)")
    }

    fn nomination(objections: &str) -> String {
        format!(
            "===[[Foo]]===\n*'''Nominated by''': {}\n====Support====\n====Object====\n{objections}\n====Comments====\n\n[[Category:Nominations by User:Writer|Foo]]",
            sig("Writer", "10:00, 1 February 2024")
        )
    }

    async fn add(f: &Fixture, title: &str, text: &str, category: &str) {
        f.wiki.edit_as(title, text, "Someone", "Create", &[]).await.unwrap();
        f.wiki.add_to_category(title, category).await.unwrap();
    }

    #[tokio::test]
    async fn test_check_active_nominations() {
        let f = fixture();
        f.clock.set(Utc.with_ymd_and_hms(2024, 4, 10, 10, 0, 0).unwrap());

        let overdue = format!("=====Reviewer=====\n*Expand the lead. {}", sig("Reviewer", "10:00, 1 March 2024"));
        add(&f, "Wookieepedia:Featured article nominations/Foo", &nomination(&overdue), NOM_CATEGORY).await;
        let quiet = format!("=====Reviewer=====\n*Expand the lead. {}", sig("Reviewer", "10:00, 9 April 2024"));
        add(&f, "Wookieepedia:Featured article nominations/Bar", &nomination(&quiet), NOM_CATEGORY).await;
        add(&f, "Wookieepedia:Featured article nominations/History", "{|\n|}", NOM_CATEGORY).await;

        let reports = check_active_nominations(&f.ctx, "FA", true).await.unwrap();
        assert_eq!(reports.len(), 1);
        let (page, report) = &reports[0];
        assert_eq!(page, "Wookieepedia:Featured article nominations/Foo");
        assert_eq!(report.nominator, "Writer");
        assert_eq!(report.overdue, vec!["1 objections from Reviewer have been unaddressed for 14 or more days"]);
    }

    #[tokio::test]
    async fn test_check_nomination_page_outside_known_types() {
        let f = fixture();
        let err = check_nomination_page(&f.ctx, "Wookieepedia:Elsewhere/Foo", false).await.unwrap_err();
        assert!(err.is_reported());
    }

    #[tokio::test]
    async fn test_check_active_reviews_buckets() {
        let f = fixture();
        f.clock.set(Utc.with_ymd_and_hms(2024, 4, 10, 10, 0, 0).unwrap());

        f.wiki.edit_as("Revan", "{{Top|fa}}", "Someone", "Create", &[]).await.unwrap();
        f.wiki.edit_as("Malak", "{{Top|pfa}}", "Someone", "Create", &[]).await.unwrap();
        f.wiki.edit_as("Bastila", "{{Top|fa}}", "Someone", "Create", &[]).await.unwrap();
        f.wiki.edit_as("Nihilus", "{{Top|fa}}", "Someone", "Create", &[]).await.unwrap();

        let open = |date: &str| {
            format!(
                "====Object====\n=====Reviewer=====\n*Fix this. {}\n====Comments====",
                sig("Reviewer", date)
            )
        };
        add(&f, "Wookieepedia:Featured article reviews/Revan (second)", "====Object====\n====Comments====", REVIEW_CATEGORY).await;
        add(&f, "Wookieepedia:Featured article reviews/Malak", &open("10:00, 1 April 2024"), REVIEW_CATEGORY).await;
        add(&f, "Wookieepedia:Featured article reviews/Bastila", &open("10:00, 1 February 2024"), REVIEW_CATEGORY).await;
        add(&f, "Wookieepedia:Featured article reviews/Nihilus", &open("10:00, 1 April 2024"), REVIEW_CATEGORY).await;

        let report = check_active_reviews(&f.ctx, "FA").await.unwrap();
        assert_eq!(report.buckets[&ReviewBucket::Ready], vec!["Revan"]);
        assert_eq!(report.buckets[&ReviewBucket::Probation], vec!["Malak"]);
        assert_eq!(report.buckets[&ReviewBucket::Probe], vec!["Bastila"]);
        assert_eq!(report.buckets[&ReviewBucket::Normal], vec!["Nihilus"]);

        let lines = report.lines();
        assert_eq!(lines[0], ReviewBucket::Ready.header(30));
        assert_eq!(lines[1], "- Revan");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_reviewed_article() {
        assert_eq!(reviewed_article("Wookieepedia:Featured article reviews/Revan (third)"), "Revan");
        assert_eq!(reviewed_article("Wookieepedia:Featured article reviews/Revan"), "Revan");
    }
}
