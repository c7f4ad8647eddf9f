// src/pipeline/intake.rs

//! New nomination intake.
//!
//! Compares the nomination category against the pages already seen and
//! prepares each new nomination page: nominator and project categories, the
//! word count line and the transclusion on the nomination index.

use std::sync::Arc;

use chrono::Duration;

use crate::error::{Rejection, Result};
use crate::models::NominationType;
use crate::pipeline::Context;
use crate::services::TimedCache;
use crate::services::approval::nominator_from_text;
use crate::services::wikitext::{
    add_word_count_line, attach_subpage, identify_projects, insert_categories,
    missing_nomination_categories, word_count,
};
use crate::utils::{Clock, progress, subpage_name};

/// Pages not seen in a scan for this long are forgotten.
const FORGET_AFTER_HOURS: i64 = 24;

/// Nomination pages already handled, stamped with the last scan that saw them.
pub struct NominationWatcher {
    seen: TimedCache<String, ()>,
}

impl NominationWatcher {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            seen: TimedCache::new(clock),
        }
    }

    /// Record the current nominations of a type without processing them.
    pub async fn prime(&mut self, ctx: &Context, code: &str) -> Result<usize> {
        let nom_type = nomination_type(ctx, code)?;
        let pages = nomination_pages(ctx, nom_type).await?;
        let count = pages.len();
        for page in pages {
            self.seen.insert(page, ());
        }
        log::info!("Tracking {count} active {} nominations", nom_type.code());
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

fn nomination_type<'a>(ctx: &'a Context, code: &str) -> Result<&'a NominationType> {
    ctx.data
        .types
        .get(code)
        .ok_or_else(|| Rejection::UnrecognizedType(code.to_string()).into())
}

async fn nomination_pages(ctx: &Context, nom_type: &NominationType) -> Result<Vec<String>> {
    let prefix = format!("{}/", nom_type.nomination_page);
    Ok(ctx
        .store
        .category_members(&nom_type.nomination_category)
        .await?
        .into_iter()
        .filter(|title| title.starts_with(&prefix) && !title.ends_with("/History"))
        .collect())
}

/// Process every nomination of a type that appeared since the last scan.
/// Returns the pages that were processed.
///
/// A page that fails is logged and left unseen, so the next scan retries it.
pub async fn run_intake(ctx: &Context, watcher: &mut NominationWatcher, code: &str) -> Result<Vec<String>> {
    let nom_type = nomination_type(ctx, code)?;
    let pages = nomination_pages(ctx, nom_type).await?;

    let mut processed = Vec::new();
    for page in pages {
        if !watcher.seen.contains(&page) {
            progress::header(&format!("New {}: {}", nom_type.code(), page));
            match prepare_nomination(ctx, nom_type, &page).await {
                Ok(()) => processed.push(page.clone()),
                Err(e) if e.is_reported() => {
                    log::warn!("Skipping {page}: {e}");
                    continue;
                }
                Err(e) => {
                    log::error!("Failed to prepare {page}: {e:?}");
                    continue;
                }
            }
        }
        watcher.seen.insert(page, ());
    }

    let forgotten = watcher.seen.evict_older_than(Duration::hours(FORGET_AFTER_HOURS));
    if forgotten > 0 {
        log::debug!("Forgot {forgotten} closed nominations");
    }
    Ok(processed)
}

/// Article a nomination subpage is about, without a repeat-nomination suffix.
fn nominated_article(subpage: &str) -> &str {
    match subpage.rsplit_once(" (") {
        Some((article, tail)) if tail.ends_with("nomination)") => article,
        _ => subpage,
    }
}

async fn prepare_nomination(ctx: &Context, nom_type: &NominationType, page: &str) -> Result<()> {
    ctx.ensure_not_redirect(page).await?;
    let text = ctx.store.get_text(page).await?;
    let subpage = subpage_name(page);

    let nominator = match nominator_from_text(&text) {
        Some(nominator) => nominator,
        None => ctx
            .store
            .first_revision(page)
            .await?
            .map(|r| r.user)
            .ok_or(Rejection::MissingNominatorLink)?,
    };
    progress::sub_item(&format!("Nominated by {nominator}"));

    let user_category = format!("Category:Nominations by User:{nominator}");
    ctx.ensure_category_page(
        &user_category,
        &format!("Active nominations by {{{{U|{nominator}}}}}\n\n[[Category:Nominations by user|{nominator}]]"),
    )
    .await?;

    let projects = identify_projects(&text, &ctx.data.projects);
    let categories = missing_nomination_categories(&text, &user_category, subpage, &projects);
    let mut updated = insert_categories(&text, &categories);

    let article = nominated_article(subpage);
    match ctx.store.get_text_opt(article).await? {
        Some(article_text) => {
            if let Some(counted) = add_word_count_line(&updated, &word_count(&article_text)) {
                updated = counted;
            }
        }
        None => log::warn!("Nominated article {article} does not exist"),
    }

    if updated != text {
        ctx.save(page, &updated, "Adding user-nomination and WookieeProject categories")
            .await?;
    } else {
        progress::skipped("Nomination page is already categorized");
    }

    let index = ctx.store.get_text(&nom_type.nomination_page).await?;
    match attach_subpage(&index, subpage) {
        Some(attached) => {
            let summary = format!("Adding new nomination: {subpage}");
            ctx.save(&nom_type.nomination_page, &attached, &summary).await
        }
        None => {
            progress::skipped("Nomination is already transcluded");
            Ok(())
        }
    }
}
