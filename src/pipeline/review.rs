// src/pipeline/review.rs

//! Status review workflow.
//!
//! Opening a review creates the review page, lists it on the review index and
//! tags the article. Closing it (kept, probation or revoked) updates the
//! article's status flag, the review history table and the talk page. Like
//! archival, every step tolerates a replay with `retry`.

use crate::error::{Rejection, Result};
use crate::models::{NominationType, ReviewAction, ReviewCommand};
use crate::pipeline::{Context, RevisionSpan, find_revisions};
use crate::services::review::{
    REVIEW_SUFFIXES, apply_probation, archive_review_page, article_status, build_review_page,
    mark_under_review, remove_review_template, review_history_row, review_requester,
    revoked_history_row, update_history_result,
};
use crate::services::talk_page::{HistoryEntry, build_history_entry, build_removal_entry};
use crate::services::wikitext::{
    attach_subpage, detach_subpage, determine_title_format, has_history_row, insert_table_row,
    remove_from_listing,
};
use crate::services::{HistoryResult, TalkUpdate, merge_talk_page};
use crate::utils::{progress, subpage_name};

/// Run a review command. Returns a message naming the review page.
pub async fn run_review(ctx: &Context, command: &ReviewCommand) -> Result<String> {
    let article = command.article.as_str();
    if !ctx.store.exists(article).await? {
        return Err(Rejection::TargetMissing(article.to_string()).into());
    }
    ctx.ensure_not_redirect(article).await?;

    let text = ctx.store.get_text(article).await?;
    let status = article_status(&text, &ctx.data.types)
        .ok_or_else(|| Rejection::StatusUnknown(article.to_string()))?;
    let nom_type = status.nom_type;

    progress::header(&format!("{:?} review: {}", command.action, article));

    match command.action {
        ReviewAction::Create => create_review(ctx, command, nom_type).await,
        action => close_review(ctx, command, nom_type, action).await,
    }
}

fn review_page_name(nom_type: &NominationType, article: &str, suffix: &str) -> String {
    format!("{}/{}{}", nom_type.review_page, article, suffix)
}

fn mark_summary(nom_type: &NominationType) -> String {
    format!("Marking {} article as under review", nom_type.adjective)
}

async fn create_review(ctx: &Context, command: &ReviewCommand, nom_type: &NominationType) -> Result<String> {
    let article = command.article.as_str();

    progress::step(1, 3, "Creating the review page");
    let mut chosen = None;
    for suffix in REVIEW_SUFFIXES {
        let page = review_page_name(nom_type, article, suffix);
        match ctx.store.get_text_opt(&page).await? {
            None => {
                let body = build_review_page(nom_type, article, &command.requested_by, subpage_name(&page));
                let summary = format!("Creating new review page for {} article: {}", nom_type.adjective, article);
                ctx.save(&page, &body, &summary).await?;
                chosen = Some((page, suffix));
                break;
            }
            Some(existing) if !is_archived_review(&existing) => {
                progress::skipped(&format!("{page} is already open"));
                chosen = Some((page, suffix));
                break;
            }
            Some(_) => continue,
        }
    }
    let (page, suffix) = chosen.ok_or_else(|| Rejection::ReviewPagesExhausted(article.to_string()))?;
    let subpage = subpage_name(&page).to_string();

    progress::step(2, 3, "Adding the review to the index");
    let index = ctx.store.get_text(&nom_type.review_page).await?;
    match attach_subpage(&index, &subpage) {
        Some(updated) => {
            let summary = format!("Adding new nomination: {subpage}");
            ctx.save(&nom_type.review_page, &updated, &summary).await?;
        }
        None => progress::skipped("Review is already listed"),
    }

    progress::step(3, 3, "Marking the article");
    let text = ctx.store.get_text(article).await?;
    match mark_under_review(&text, article, nom_type, suffix)? {
        Some(updated) => ctx.save(article, &updated, &mark_summary(nom_type)).await?,
        None => progress::skipped("Article is already marked as under review"),
    }

    progress::success(&format!("Opened {page}"));
    Ok(format!("Created {}", ctx.store.page_url(&page)))
}

fn is_archived_review(text: &str) -> bool {
    text.contains("Date Archived")
}

/// The most recent review page of an article.
async fn find_review_page(ctx: &Context, nom_type: &NominationType, article: &str) -> Result<String> {
    let mut found = None;
    for suffix in REVIEW_SUFFIXES {
        let page = review_page_name(nom_type, article, suffix);
        if ctx.store.exists(&page).await? {
            found = Some(page);
        } else {
            break;
        }
    }
    found.ok_or_else(|| Rejection::ReviewPageMissing(article.to_string()).into())
}

async fn close_review(
    ctx: &Context,
    command: &ReviewCommand,
    nom_type: &NominationType,
    action: ReviewAction,
) -> Result<String> {
    let article = command.article.as_str();
    let page = find_review_page(ctx, nom_type, article).await?;
    let subpage = subpage_name(&page).to_string();
    let total = if action == ReviewAction::Probation { 4 } else { 6 };

    progress::step(1, total, "Updating the article");
    let summary = match action {
        ReviewAction::Pass => format!("{} article successfully passed review", nom_type.adjective),
        ReviewAction::Probation => {
            format!("{} article under review and put on probation", nom_type.adjective)
        }
        _ => format!("Article failed review and {} status has been revoked", nom_type.adjective),
    };
    let text = ctx.store.get_text(article).await?;
    let updated = match action {
        ReviewAction::Pass => remove_review_template(&text, false).map(|t| restore_status(&t, nom_type)),
        ReviewAction::Probation => apply_probation(&text),
        _ => remove_review_template(&text, true),
    };
    match updated {
        Some(updated) => ctx.save(article, &updated, &summary).await?,
        None if command.retry => progress::skipped("Article is already updated"),
        None if action == ReviewAction::Probation => return Err(Rejection::StatusNotApplied.into()),
        None => return Err(Rejection::TemplateNotFound(nom_type.review_template()).into()),
    }

    progress::step(2, total, "Resolving review revisions");
    let revisions = ctx.store.revisions(article).await?;
    let marker = mark_summary(nom_type);
    let span = find_revisions(&revisions, |r| r.comment == marker, &summary)?;

    let mut step = 3;
    if action != ReviewAction::Probation {
        progress::step(step, total, "Archiving the review page");
        let page_text = ctx.store.get_text(&page).await?;
        match archive_review_page(&page_text, &nom_type.abbreviation, action == ReviewAction::Pass) {
            Some(archived) => ctx.save(&page, &archived, "Archiving review page").await?,
            None if command.retry => progress::skipped("Review page is already archived"),
            None => return Err(Rejection::AlreadyArchived(page.clone()).into()),
        }
        step += 1;

        progress::step(step, total, "Removing the review from the index");
        let index = ctx.store.get_text(&nom_type.review_page).await?;
        match detach_subpage(&index, &subpage) {
            Some(updated) => {
                ctx.save(&nom_type.review_page, &updated, &format!("Archiving {subpage}"))
                    .await?
            }
            None if command.retry => progress::skipped("Review is no longer listed"),
            None => return Err(Rejection::TransclusionNotFound(subpage.clone()).into()),
        }
        step += 1;
    }

    progress::step(step, total, "Updating the review history");
    update_review_history(ctx, nom_type, article, &page, action, &span).await?;
    step += 1;

    progress::step(step, total, "Updating the talk page");
    let entry = match action {
        ReviewAction::Pass | ReviewAction::Probation => {
            let result = if action == ReviewAction::Pass {
                HistoryResult::Kept
            } else {
                HistoryResult::Probation
            };
            build_history_entry(&nom_type.abbreviation, result, &page, &span.start, &span.completed)
        }
        _ => build_removal_entry(&nom_type.abbreviation, &page, &span.completed),
    };
    let banner = (action == ReviewAction::Pass).then_some(nom_type.abbreviation.as_str());
    update_talk_page(ctx, article, &entry, banner).await?;

    if action == ReviewAction::Revoke {
        remove_from_status_listing(ctx, nom_type, article).await?;
    }

    progress::success(&format!("Closed {page}"));
    Ok(format!("{} review of {}: {:?}", nom_type.adjective, article, action))
}

/// A kept article leaves probation.
fn restore_status(text: &str, nom_type: &NominationType) -> String {
    let flag = nom_type.status_flag();
    text.replacen(&format!("|p{flag}"), &format!("|{flag}"), 1)
}

async fn update_review_history(
    ctx: &Context,
    nom_type: &NominationType,
    article: &str,
    page: &str,
    action: ReviewAction,
    span: &RevisionSpan,
) -> Result<()> {
    let history_page = nom_type.review_history_page();
    let text = ctx.store.get_text(&history_page).await?;
    let result = match action {
        ReviewAction::Pass => "Kept",
        ReviewAction::Probation => "Probation",
        _ => "Revoked",
    };
    let summary = format!("Archiving {page}");

    if has_history_row(&text, page) {
        if action == ReviewAction::Probation {
            progress::skipped("Review history already lists this review");
            return Ok(());
        }
        return match update_history_result(&text, page, &span.completed, result) {
            Some(updated) => ctx.save(&history_page, &updated, &summary).await,
            None => {
                progress::skipped("Review history is already updated");
                Ok(())
            }
        };
    }

    let page_text = ctx.store.get_text(page).await?;
    let creator = ctx.store.first_revision(page).await?;
    let requester = review_requester(&page_text, creator.as_ref(), &ctx.config.wiki.user);
    let link = determine_title_format(article, &ctx.store.get_text(article).await?);
    let row = match action {
        ReviewAction::Revoke => revoked_history_row(&link, &span.start, &span.completed, &requester, page),
        _ => review_history_row(&link, &span.start, &span.completed, &requester, page, result),
    };
    ctx.save(&history_page, &insert_table_row(&text, &row), &summary)
        .await
}

async fn update_talk_page(ctx: &Context, article: &str, entry: &HistoryEntry, banner: Option<&str>) -> Result<()> {
    let talk = ctx.config.archive.talk_page(article);
    let existing = ctx.store.get_text_opt(&talk).await?;
    let known_types = ctx.data.types.abbreviations();
    let merge = merge_talk_page(
        existing.as_deref(),
        &TalkUpdate {
            entry,
            status_banner: banner,
            known_types: &known_types,
            project_banners: &[],
        },
    )?;

    if merge.changed {
        ctx.save(&talk, &merge.text, merge.summary).await
    } else {
        progress::skipped("Talk page already records this review");
        Ok(())
    }
}

async fn remove_from_status_listing(ctx: &Context, nom_type: &NominationType, article: &str) -> Result<()> {
    let Some(text) = ctx.store.get_text_opt(&nom_type.page).await? else {
        log::warn!("Listing page {} does not exist", nom_type.page);
        return Ok(());
    };
    match remove_from_listing(&text, article) {
        Some(updated) if updated != text => {
            let summary = format!("Removing {article} after status revocation");
            ctx.save(&nom_type.page, &updated, &summary).await
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{Fixture, fixture};
    use crate::storage::WikiStore;
    use chrono::Duration;

    const ARTICLE: &str = "Revan";
    const PAGE: &str = "Wookieepedia:Featured article reviews/Revan";
    const INDEX: &str = "Wookieepedia:Featured article reviews";
    const HISTORY: &str = "Wookieepedia:Featured article reviews/History";
    const LISTING: &str = "Wookieepedia:Featured articles";

    async fn seed(f: &Fixture) {
        let wiki = &f.wiki;
        wiki.edit_as(ARTICLE, "{{Top|fa}}\n'''Revan''' was a Jedi.", "Writer", "Created", &[])
            .await
            .unwrap();
        wiki.edit_as(INDEX, "Current reviews", "Someone", "Index", &[]).await.unwrap();
        wiki.edit_as(HISTORY, "{|\n! Article !! Start !! End !! Requester !! Result\n|}", "Someone", "Table", &[])
            .await
            .unwrap();
        wiki.edit_as(
            "Talk:Revan",
            "{{Talkheader}}\n{{FA}}\n{{Ahh}}\n{{Ahm\n|oldid=1\n}}\n{{Ahf|status=FA}}",
            "Someone",
            "Talk",
            &[],
        )
        .await
        .unwrap();
        wiki.edit_as(LISTING, "<!--Start-->\n*[[Revan]]\n*[[Bastila Shan]]\n<!--End-->", "Someone", "List", &[])
            .await
            .unwrap();
    }

    fn command(action: ReviewAction, retry: bool) -> ReviewCommand {
        ReviewCommand {
            article: ARTICLE.to_string(),
            action,
            retry,
            requested_by: "Reviewer".to_string(),
        }
    }

    async fn text(f: &Fixture, title: &str) -> String {
        f.wiki.get_text(title).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_review_is_idempotent() {
        let f = fixture();
        seed(&f).await;

        run_review(&f.ctx, &command(ReviewAction::Create, false)).await.unwrap();
        assert!(text(&f, PAGE).await.contains("*'''Requested By''': Reviewer"));
        assert!(text(&f, INDEX).await.contains("{{/Revan}}"));
        assert_eq!(text(&f, ARTICLE).await, "{{Top|fa}}\n{{FAreview}}\n'''Revan''' was a Jedi.");

        run_review(&f.ctx, &command(ReviewAction::Create, false)).await.unwrap();
        assert!(!f.wiki.exists(&format!("{PAGE} (second)")).await.unwrap());
        assert_eq!(text(&f, ARTICLE).await.matches("FAreview").count(), 1);
        assert_eq!(text(&f, INDEX).await.matches("{{/Revan}}").count(), 1);
    }

    #[tokio::test]
    async fn test_pass_review() {
        let f = fixture();
        seed(&f).await;
        run_review(&f.ctx, &command(ReviewAction::Create, false)).await.unwrap();
        f.clock.advance(Duration::days(3));

        run_review(&f.ctx, &command(ReviewAction::Pass, false)).await.unwrap();
        assert_eq!(text(&f, ARTICLE).await, "{{Top|fa}}\n'''Revan''' was a Jedi.");
        assert!(text(&f, PAGE).await.starts_with("{{subst:FAR archive}}"));
        assert!(!text(&f, INDEX).await.contains("{{/Revan}}"));
        let history = text(&f, HISTORY).await;
        assert!(history.contains("|| Reviewer || [[Wookieepedia:Featured article reviews/Revan |<!--3-->Kept]]"));
        let talk = text(&f, "Talk:Revan").await;
        assert!(talk.contains("|process=FAR"));
        assert_eq!(talk.matches("{{Ahf").count(), 1);

        run_review(&f.ctx, &command(ReviewAction::Pass, true)).await.unwrap();
        assert_eq!(text(&f, HISTORY).await, history);
        assert_eq!(text(&f, "Talk:Revan").await, talk);

        let err = run_review(&f.ctx, &command(ReviewAction::Pass, false)).await.unwrap_err();
        assert_eq!(err.user_message(), "Could not remove FAreview template from page");
    }

    #[tokio::test]
    async fn test_probation_then_revoke() {
        let f = fixture();
        seed(&f).await;
        run_review(&f.ctx, &command(ReviewAction::Create, false)).await.unwrap();
        f.clock.advance(Duration::days(30));

        run_review(&f.ctx, &command(ReviewAction::Probation, false)).await.unwrap();
        assert!(text(&f, ARTICLE).await.starts_with("{{Top|pfa}}\n{{FAreview}}"));
        assert!(text(&f, HISTORY).await.contains("<!--3-->Probation]]"));
        assert!(text(&f, INDEX).await.contains("{{/Revan}}"));
        assert!(text(&f, "Talk:Revan").await.contains("|process=PFA"));

        f.clock.advance(Duration::days(14));
        run_review(&f.ctx, &command(ReviewAction::Revoke, false)).await.unwrap();
        assert_eq!(text(&f, ARTICLE).await, "{{Top|ffa}}\n'''Revan''' was a Jedi.");
        assert!(text(&f, PAGE).await.starts_with("{{subst:FAR archive|failed}}"));
        let history = text(&f, HISTORY).await;
        assert_eq!(history.matches(PAGE).count(), 1);
        assert!(history.contains("<!--3-->Revoked]]"));
        let talk = text(&f, "Talk:Revan").await;
        assert!(talk.contains("|process=FFA"));
        assert!(!talk.contains("{{FA}}"));
        assert!(!text(&f, LISTING).await.contains("[[Revan]]"));
    }

    #[tokio::test]
    async fn test_second_review_gets_a_new_page() {
        let f = fixture();
        seed(&f).await;
        run_review(&f.ctx, &command(ReviewAction::Create, false)).await.unwrap();
        f.clock.advance(Duration::days(3));
        run_review(&f.ctx, &command(ReviewAction::Pass, false)).await.unwrap();
        f.clock.advance(Duration::days(300));

        run_review(&f.ctx, &command(ReviewAction::Create, false)).await.unwrap();
        assert!(f.wiki.exists(&format!("{PAGE} (second)")).await.unwrap());
        assert!(text(&f, ARTICLE).await.contains("{{FAreview|(second)}}"));
        assert!(text(&f, INDEX).await.contains("{{/Revan (second)}}"));
    }

    #[tokio::test]
    async fn test_article_without_status() {
        let f = fixture();
        f.wiki.edit_as(ARTICLE, "{{Top}}\nRevan.", "Writer", "Created", &[]).await.unwrap();

        let err = run_review(&f.ctx, &command(ReviewAction::Create, false)).await.unwrap_err();
        assert!(err.is_reported());
        assert_eq!(err.user_message(), "Cannot determine status for article Revan");

        f.wiki.edit_as(ARTICLE, "{{Top|fa}}\nRevan.", "Writer", "Promoted", &[]).await.unwrap();
        let err = run_review(&f.ctx, &command(ReviewAction::Pass, false)).await.unwrap_err();
        assert_eq!(err.user_message(), "No review page found for Revan");
    }
}
