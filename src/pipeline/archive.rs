// src/pipeline/archive.rs

//! Nomination archival pipeline.
//!
//! Runs the edits for one archival command in a fixed order: the nomination
//! index, the target article, the nomination page, the talk page, the history
//! table, then (for successful nominations) the former status listing and the
//! nominator's talk page. Each edit first checks whether its change is already
//! in place, so a run that failed part-way can be replayed with `retry`.

use crate::error::{Rejection, Result};
use crate::models::{ArchiveOutcome, ArchiveResult, Command, NominationType};
use crate::pipeline::{Context, RevisionSpan, find_revisions};
use crate::services::talk_page::build_history_entry;
use crate::services::wikitext::{
    self, NominationArchive, apply_status_flag, archive_nomination_page, detach_subpage,
    determine_title_format, has_history_row, history_row, identify_projects, insert_table_row,
    is_archived, notification_text, remove_from_listing, remove_template_line,
};
use crate::services::{
    ApprovalRequest, HistoryResult, TalkUpdate, approval::nominator_from_text, check_approval,
    merge_talk_page,
};
use crate::utils::{progress, same_user, subpage_name};

const TOTAL_STEPS: usize = 8;

/// Archive a nomination.
///
/// Reported failures come back as an incomplete result carrying their message;
/// anything else is logged in full and surfaced as a generic failure.
pub async fn run_archive(ctx: &Context, command: &Command) -> ArchiveResult {
    match archive_nomination(ctx, command).await {
        Ok(result) => result,
        Err(e) if e.is_reported() => {
            log::warn!("Archival of {} stopped: {}", command.subpage(), e);
            ArchiveResult::failed(command, e.user_message())
        }
        Err(e) => {
            log::error!("Archival of {} failed: {:?}", command.subpage(), e);
            ArchiveResult::failed(command, e.user_message())
        }
    }
}

/// Pages touched by one archival run.
struct Pages {
    article: String,
    subpage: String,
    nomination: String,
    talk: String,
}

async fn archive_nomination(ctx: &Context, command: &Command) -> Result<ArchiveResult> {
    let nom_type = ctx
        .data
        .types
        .get(&command.nom_type)
        .ok_or_else(|| Rejection::UnrecognizedType(command.nom_type.clone()))?;
    let subpage = command.subpage();
    let pages = Pages {
        article: command.article_name.clone(),
        nomination: nom_type.nomination_page_name(&subpage),
        talk: ctx.config.archive.talk_page(&command.article_name),
        subpage,
    };

    progress::header(&format!("Archiving {}: {}", nom_type.code(), pages.subpage));

    progress::step(1, TOTAL_STEPS, "Checking preconditions");
    check_preconditions(ctx, &pages).await?;
    let nom_text = ctx.store.get_text(&pages.nomination).await?;
    let projects = identify_projects(&nom_text, &ctx.data.projects);

    if command.result == ArchiveOutcome::Post {
        return post_result(ctx, command, nom_type, &pages, &nom_text, projects).await;
    }

    if command.result.needs_approval() {
        let created = ctx
            .store
            .first_revision(&pages.nomination)
            .await?
            .ok_or(Rejection::RevisionNotFound("nomination page"))?
            .timestamp;
        let in_votes_category = ctx
            .store
            .category_members(&nom_type.votes_category)
            .await?
            .contains(&pages.nomination);

        let approval = check_approval(&ApprovalRequest {
            text: &nom_text,
            nom_type,
            retry: command.retry,
            created,
            in_votes_category,
            now: ctx.now(),
            timezone_offset_hours: ctx.config.archive.timezone_offset_hours,
        })?;
        progress::sub_item(&format!("Approved after {} days ({:?})", approval.age_days, approval.basis));

        if command.result == ArchiveOutcome::Test {
            progress::success(&format!("{} passed all checks", pages.nomination));
            let mut result = ArchiveResult::completed(command, &pages.article, &pages.nomination);
            result.message = format!("{} is ready to be archived", pages.subpage);
            result.projects = projects;
            return Ok(result);
        }
        if let Some(repaired) = approval.repaired_text {
            ctx.save(&pages.nomination, &repaired, "Removing username from approval template")
                .await?;
        }
    } else if !command.bypass {
        check_requester(ctx, command, nom_type, &pages.article).await?;
    }

    let article_text = ctx.store.get_text(&pages.article).await?;
    let words = wikitext::word_count(&article_text);

    progress::step(2, TOTAL_STEPS, "Removing nomination from the index");
    detach_nomination(ctx, command, nom_type, &pages).await?;

    progress::step(3, TOTAL_STEPS, "Updating the article");
    let summary = target_summary(nom_type, command.result);
    let former_status = update_target(ctx, command, nom_type, &pages.article, &summary).await?;

    progress::step(4, TOTAL_STEPS, "Resolving nomination revisions");
    let revisions = ctx.store.revisions(&pages.article).await?;
    let marker = nom_type.nomination_marker();
    let span = find_revisions(&revisions, |r| r.is_marked(&marker), &summary)?;
    let nominator = span.start.user.clone();
    progress::sub_item(&format!(
        "Nominated in r{} by {}, completed in r{}",
        span.start.revid, nominator, span.completed.revid
    ));

    progress::step(5, TOTAL_STEPS, "Archiving the nomination page");
    let word_count = words.to_string();
    archive_page(ctx, command, nom_type, &pages, &nominator, &word_count).await?;

    progress::step(6, TOTAL_STEPS, "Updating the talk page");
    update_talk_page(ctx, command, nom_type, &pages, &span, &projects).await?;

    progress::step(7, TOTAL_STEPS, "Updating the nomination history");
    let link = determine_title_format(&pages.article, &ctx.store.get_text(&pages.article).await?);
    update_history(ctx, command, nom_type, &pages, &link, &span).await?;

    progress::step(8, TOTAL_STEPS, "Announcing the new status");
    if command.is_successful() {
        if let Some(former) = former_status.filter(|f| *f != nom_type.status_flag()) {
            remove_from_former_listing(ctx, &former, &pages.article).await?;
        }
        notify_nominator(ctx, command, nom_type, &pages.article, &nominator).await?;
    } else {
        progress::skipped("Nomination was not successful");
    }

    progress::summary(
        "Archival complete",
        &[
            ("Nomination", pages.nomination.clone()),
            ("Nominator", nominator.clone()),
            ("Result", outcome_label(command.result).to_string()),
            ("Word count", word_count),
        ],
    );

    let mut result = ArchiveResult::completed(command, &pages.article, &pages.nomination);
    result.nominator = Some(nominator);
    result.projects = projects;
    result.nominated = Some(span.start);
    result.completed_revision = Some(span.completed);
    Ok(result)
}

async fn check_preconditions(ctx: &Context, pages: &Pages) -> Result<()> {
    if !ctx.store.exists(&pages.article).await? {
        return Err(Rejection::TargetMissing(pages.article.clone()).into());
    }
    if !ctx.store.exists(&pages.nomination).await? {
        return Err(Rejection::PageMissing(pages.nomination.clone()).into());
    }
    for title in [&pages.article, &pages.nomination, &pages.talk] {
        ctx.ensure_not_redirect(title).await?;
    }
    Ok(())
}

/// Only the nominator may close a nomination without success.
async fn check_requester(ctx: &Context, command: &Command, nom_type: &NominationType, article: &str) -> Result<()> {
    let marker = nom_type.nomination_marker();
    let revisions = ctx.store.revisions(article).await?;
    let nominated = revisions
        .iter()
        .find(|r| r.is_marked(&marker))
        .ok_or(Rejection::RevisionNotFound("nomination"))?;

    if !same_user(&nominated.user, &command.requested_by) {
        return Err(Rejection::WrongRequester {
            requested_by: command.requested_by.clone(),
            article: article.to_string(),
            nominator: nominated.user.clone(),
        }
        .into());
    }
    Ok(())
}

/// Nominator and projects of a nomination, without editing anything.
async fn post_result(
    ctx: &Context,
    command: &Command,
    nom_type: &NominationType,
    pages: &Pages,
    nom_text: &str,
    projects: Vec<String>,
) -> Result<ArchiveResult> {
    let marker = nom_type.nomination_marker();
    let revisions = ctx.store.revisions(&pages.article).await?;
    let nominated = revisions.into_iter().find(|r| r.is_marked(&marker));
    let nominator = nominated
        .as_ref()
        .map(|r| r.user.clone())
        .or_else(|| nominator_from_text(nom_text));

    let mut result = ArchiveResult::completed(command, &pages.article, &pages.nomination);
    result.nominator = nominator;
    result.projects = projects;
    result.nominated = nominated;
    Ok(result)
}

async fn detach_nomination(ctx: &Context, command: &Command, nom_type: &NominationType, pages: &Pages) -> Result<()> {
    let parent = ctx.store.get_text(&nom_type.nomination_page).await?;
    match detach_subpage(&parent, &pages.subpage) {
        Some(updated) => {
            let summary = if command.is_withdrawn() {
                format!("Archiving {} per nominator request", pages.subpage)
            } else {
                format!("Archiving {}", pages.subpage)
            };
            ctx.save(&nom_type.nomination_page, &updated, &summary).await
        }
        None if command.retry => {
            progress::skipped("Nomination is no longer transcluded");
            Ok(())
        }
        None => Err(Rejection::TransclusionNotFound(pages.subpage.clone()).into()),
    }
}

fn target_summary(nom_type: &NominationType, result: ArchiveOutcome) -> String {
    match result {
        ArchiveOutcome::Successful => format!("Successful {}", nom_type.code()),
        ArchiveOutcome::Withdrawn => format!("Closing {} by nominator request", nom_type.code()),
        _ => format!("Failed {}", nom_type.code()),
    }
}

/// Strip the nomination template and, on success, set the status flag.
/// Returns the status flag the article held before.
async fn update_target(
    ctx: &Context,
    command: &Command,
    nom_type: &NominationType,
    article: &str,
    summary: &str,
) -> Result<Option<String>> {
    let text = ctx.store.get_text(article).await?;
    let (text, former_status) = if command.is_successful() {
        apply_status_flag(&text, &nom_type.status_flag())?
    } else {
        (text, None)
    };

    let template = nom_type.nomination_template();
    match remove_template_line(&text, &template)? {
        Some(updated) => {
            ctx.save(article, &updated, summary).await?;
            Ok(former_status)
        }
        None if command.retry => {
            progress::skipped(&format!("{{{{{template}}}}} is already gone"));
            Ok(None)
        }
        None => Err(Rejection::TemplateNotFound(template).into()),
    }
}

fn outcome_label(result: ArchiveOutcome) -> &'static str {
    match result {
        ArchiveOutcome::Successful => "successful",
        ArchiveOutcome::Withdrawn => "withdrawn",
        _ => "unsuccessful",
    }
}

fn history_result(result: ArchiveOutcome) -> HistoryResult {
    match result {
        ArchiveOutcome::Successful => HistoryResult::Success,
        ArchiveOutcome::Withdrawn => HistoryResult::Withdrawn,
        _ => HistoryResult::Failure,
    }
}

async fn archive_page(
    ctx: &Context,
    command: &Command,
    nom_type: &NominationType,
    pages: &Pages,
    nominator: &str,
    word_count: &str,
) -> Result<()> {
    let text = ctx.store.get_text(&pages.nomination).await?;
    if is_archived(&text) {
        if command.retry {
            progress::skipped("Nomination page is already archived");
            return Ok(());
        }
        return Err(Rejection::AlreadyArchived(pages.nomination.clone()).into());
    }

    let archive_category = format!("Category:Archived nominations by User:{nominator}");
    let sort_key = match subpage_name(&pages.nomination) {
        key if command.is_successful() => key.to_string(),
        key => format!(" {key}"),
    };
    let outcome = outcome_label(command.result);
    let archived = archive_nomination_page(
        &text,
        &NominationArchive {
            abbreviation: &nom_type.abbreviation,
            outcome,
            nomination_category: &nom_type.nomination_category,
            archive_category: &archive_category,
            sort_key: &sort_key,
            word_count,
        },
    )
    .ok_or(Rejection::ArchiveCategoryMissing)?;

    ctx.ensure_category_page(
        &archive_category,
        &format!(
            "Archived nominations by {{{{U|{nominator}}}}}\n\n__EXPECTUNUSEDCATEGORY__\n\
             [[Category:Archived nominations by user|{nominator}]]"
        ),
    )
    .await?;
    ctx.save(&pages.nomination, &archived, &format!("Archiving {outcome} nomination"))
        .await
}

async fn update_talk_page(
    ctx: &Context,
    command: &Command,
    nom_type: &NominationType,
    pages: &Pages,
    span: &RevisionSpan,
    projects: &[String],
) -> Result<()> {
    let entry = build_history_entry(
        &nom_type.abbreviation,
        history_result(command.result),
        &pages.nomination,
        &span.start,
        &span.completed,
    );
    let project_banners: Vec<String> = projects
        .iter()
        .filter_map(|project| ctx.data.project_template(project))
        .map(str::to_string)
        .collect();
    let known_types = ctx.data.types.abbreviations();

    let existing = ctx.store.get_text_opt(&pages.talk).await?;
    let merge = merge_talk_page(
        existing.as_deref(),
        &TalkUpdate {
            entry: &entry,
            status_banner: command.is_successful().then_some(nom_type.abbreviation.as_str()),
            known_types: &known_types,
            project_banners: &project_banners,
        },
    )?;
    if merge.changed {
        ctx.save(&pages.talk, &merge.text, merge.summary).await
    } else {
        progress::skipped("Talk page already records this nomination");
        Ok(())
    }
}

async fn update_history(
    ctx: &Context,
    command: &Command,
    nom_type: &NominationType,
    pages: &Pages,
    link: &str,
    span: &RevisionSpan,
) -> Result<()> {
    let history_page = nom_type.history_page();
    let text = ctx.store.get_text(&history_page).await?;
    if has_history_row(&text, &pages.nomination) {
        progress::skipped("History table already lists this nomination");
        return Ok(());
    }

    let row = history_row(
        link,
        &span.start,
        &span.completed,
        &span.start.user,
        &pages.nomination,
        &history_result(command.result).to_string(),
    );
    let summary = format!("Archiving {}", pages.nomination);
    ctx.save(&history_page, &insert_table_row(&text, &row), &summary)
        .await
}

async fn remove_from_former_listing(ctx: &Context, former: &str, article: &str) -> Result<()> {
    let Some(former_type) = ctx.data.types.by_status_flag(former) else {
        log::warn!("No nomination type for former status {former}");
        return Ok(());
    };
    let Some(text) = ctx.store.get_text_opt(&former_type.page).await? else {
        log::warn!("Listing page {} does not exist", former_type.page);
        return Ok(());
    };

    match remove_from_listing(&text, article) {
        Some(updated) if updated != text => {
            let summary = format!("Removing newly-promoted {article}");
            ctx.save(&former_type.page, &updated, &summary).await
        }
        Some(_) => {
            progress::skipped(&format!("{article} is not listed on {}", former_type.page));
            Ok(())
        }
        None => Ok(()),
    }
}

async fn notify_nominator(
    ctx: &Context,
    command: &Command,
    nom_type: &NominationType,
    article: &str,
    nominator: &str,
) -> Result<()> {
    let header = match &command.custom_message {
        Some(custom) => custom.as_str(),
        None if same_user(nominator, &command.requested_by) => {
            progress::skipped("Nominator archived their own nomination");
            return Ok(());
        }
        None if !command.send_message => {
            progress::skipped("Notification suppressed");
            return Ok(());
        }
        None => article,
    };

    if ctx.data.has_opted_out(nominator, &nom_type.abbreviation)
        || ctx.data.has_opted_out(nominator, &nom_type.code())
    {
        progress::skipped(&format!("{nominator} opted out of {} notifications", nom_type.code()));
        return Ok(());
    }

    let talk_page = format!("User talk:{nominator}");
    let Some(text) = ctx.store.get_text_opt(&talk_page).await? else {
        log::warn!("{talk_page} does not exist, not notifying");
        return Ok(());
    };

    let signature = ctx.data.signature(&command.requested_by);
    let notice = notification_text(header, &nom_type.abbreviation, article, &signature);
    if text.contains(&notice) {
        progress::skipped("Nominator was already notified");
        return Ok(());
    }

    let summary = format!("Notifying user about new {}: {}", nom_type.code(), article);
    ctx.save(&talk_page, &format!("{text}{notice}"), &summary)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectData;
    use crate::pipeline::testing::{Fixture, fixture};
    use crate::storage::WikiStore;
    use chrono::{Duration, TimeZone, Utc};

    const ARTICLE: &str = "Darth Bane";
    const NOM_PAGE: &str = "Wookieepedia:Featured article nominations/Darth Bane";
    const INDEX: &str = "Wookieepedia:Featured article nominations";
    const HISTORY: &str = "Wookieepedia:Featured article nominations/History";
    const GA_LISTING: &str = "Wookieepedia:Good articles";

    fn nomination_text() -> String {
        [
            "===[[Darth Bane]]===",
            "*'''Nominated by''': [[User:Nominator|Nominator]] 12:00, 20 February 2024 (UTC)",
            "*'''Nomination comments''': Rule of Two.",
            "*'''WookieeProject (optional)''': WookieeProject Sith",
            "{{FANvotes|Darth Bane}}",
            "====Support====",
            "#{{Inq}} [[User:Reviewer|Reviewer]] 12:00, 21 February 2024 (UTC)",
            "====Object====",
            "====Comments====",
            "{{Inqapproved|12:00, 29 February 2024 (UTC)}}",
            "[[Category:Wookieepedia Featured article nomination pages|Darth Bane]]",
            wikitext::DO_NOT_WRITE_BELOW,
        ]
        .join("\n")
    }

    async fn seed(f: &mut Fixture) {
        f.ctx.data.projects.insert(
            "Sith".to_string(),
            ProjectData {
                template: Some("SithProject".to_string()),
                shortcut: Vec::new(),
            },
        );

        f.clock.set(Utc.with_ymd_and_hms(2024, 2, 20, 12, 0, 0).unwrap());
        let wiki = &f.wiki;
        wiki.edit_as(ARTICLE, "{{Top|ga}}\n'''Darth Bane''' was a Sith Lord.\n\n==Biography==\nBane founded the Rule of Two.", "Nominator", "Created", &[])
            .await
            .unwrap();
        f.clock.advance(Duration::minutes(5));
        wiki.edit_as(ARTICLE, "{{Top|ga}}\n{{FAnom}}\n'''Darth Bane''' was a Sith Lord.\n\n==Biography==\nBane founded the Rule of Two.", "Nominator", "Nominating", &["Added FAnom"])
            .await
            .unwrap();
        wiki.edit_as(NOM_PAGE, &nomination_text(), "Nominator", "New nomination", &[])
            .await
            .unwrap();
        wiki.edit_as(INDEX, "Intro\n\n{{/Darth Bane}}\n\n{{/Other}}", "Someone", "Add", &[])
            .await
            .unwrap();
        wiki.edit_as(HISTORY, "{| class=\"wikitable\"\n! Article !! Start !! End !! Nominator !! Result\n|}", "Someone", "Table", &[])
            .await
            .unwrap();
        wiki.edit_as(GA_LISTING, "<!--Start-->\n*[[Darth Bane]]\n*[[Revan]]\n<!--End-->", "Someone", "List", &[])
            .await
            .unwrap();
        wiki.edit_as("User talk:Nominator", "Welcome!", "Someone", "Hi", &[])
            .await
            .unwrap();
        wiki.add_to_category(NOM_PAGE, "Category:Featured article nominations with sufficient votes")
            .await
            .unwrap();

        f.clock.set(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    }

    fn command(result: ArchiveOutcome, requested_by: &str, retry: bool) -> Command {
        Command {
            result,
            nom_type: "FA".to_string(),
            article_name: ARTICLE.to_string(),
            suffix: None,
            retry,
            bypass: false,
            send_message: true,
            custom_message: None,
            requested_by: requested_by.to_string(),
        }
    }

    async fn text(f: &Fixture, title: &str) -> String {
        f.wiki.get_text(title).await.unwrap()
    }

    #[tokio::test]
    async fn test_successful_archival_then_retry_is_idempotent() {
        let mut f = fixture();
        seed(&mut f).await;

        let result = run_archive(&f.ctx, &command(ArchiveOutcome::Successful, "Reviewer", false)).await;
        assert!(result.completed, "{}", result.message);
        assert!(result.successful);
        assert_eq!(result.nominator.as_deref(), Some("Nominator"));
        assert_eq!(result.projects, vec!["Sith"]);

        assert!(!text(&f, INDEX).await.contains("{{/Darth Bane}}"));
        let article = text(&f, ARTICLE).await;
        assert!(article.starts_with("{{Top|fa}}"));
        assert!(!article.contains("FAnom"));
        assert!(!text(&f, GA_LISTING).await.contains("Darth Bane"));

        let archived = text(&f, NOM_PAGE).await;
        assert!(archived.starts_with("{{subst:FA archive|successful}}"));
        assert!(archived.contains("[[Category:Archived nominations by User:Nominator|Darth Bane]]"));
        assert!(f.wiki.exists("Category:Archived nominations by User:Nominator").await.unwrap());

        let talk = text(&f, "Talk:Darth Bane").await;
        assert!(talk.contains("{{FA}}"));
        assert!(talk.contains("{{SithProject}}"));
        assert!(text(&f, HISTORY).await.contains(&format!("[[{NOM_PAGE} | Success]]")));
        assert!(text(&f, "User talk:Nominator").await.contains("{{subst:FA notify|1=Darth Bane"));

        let replay = run_archive(&f.ctx, &command(ArchiveOutcome::Successful, "Reviewer", true)).await;
        assert!(replay.completed, "{}", replay.message);

        assert_eq!(text(&f, NOM_PAGE).await.matches("Date Archived").count(), 1);
        assert_eq!(text(&f, HISTORY).await.matches(NOM_PAGE).count(), 1);
        assert_eq!(text(&f, "Talk:Darth Bane").await, talk);
        assert_eq!(text(&f, "User talk:Nominator").await.matches("FA notify").count(), 1);
    }

    #[tokio::test]
    async fn test_replay_without_retry_is_reported() {
        let mut f = fixture();
        seed(&mut f).await;

        run_archive(&f.ctx, &command(ArchiveOutcome::Successful, "Reviewer", false)).await;
        let replay = run_archive(&f.ctx, &command(ArchiveOutcome::Successful, "Reviewer", false)).await;
        assert!(!replay.completed);
        assert_eq!(replay.message, "Cannot find /Darth Bane in nomination page");
    }

    #[tokio::test]
    async fn test_withdrawal_requires_nominator() {
        let mut f = fixture();
        seed(&mut f).await;

        let result = run_archive(&f.ctx, &command(ArchiveOutcome::Withdrawn, "Reviewer", false)).await;
        assert!(!result.completed);
        assert_eq!(
            result.message,
            "Archive requested by Reviewer, but Darth Bane was nominated by Nominator"
        );
        assert!(text(&f, INDEX).await.contains("{{/Darth Bane}}"));
    }

    #[tokio::test]
    async fn test_withdrawal_by_nominator() {
        let mut f = fixture();
        seed(&mut f).await;

        let result = run_archive(&f.ctx, &command(ArchiveOutcome::Withdrawn, "Nominator", false)).await;
        assert!(result.completed, "{}", result.message);
        assert!(!result.successful);

        let archived = text(&f, NOM_PAGE).await;
        assert!(archived.starts_with("{{subst:FA archive|withdrawn}}"));
        assert!(archived.contains("|1}}"));
        assert!(archived.contains("[[Category:Archived nominations by User:Nominator| Darth Bane]]"));
        assert!(text(&f, ARTICLE).await.starts_with("{{Top|ga}}"));
        assert!(text(&f, HISTORY).await.contains("| Withdrawn]]"));
        assert!(!text(&f, "Talk:Darth Bane").await.contains("{{FA}}"));
        assert_eq!(text(&f, "User talk:Nominator").await, "Welcome!");
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_edits() {
        let mut f = fixture();
        seed(&mut f).await;

        let result = run_archive(&f.ctx, &command(ArchiveOutcome::Test, "Reviewer", false)).await;
        assert!(result.completed, "{}", result.message);
        assert!(text(&f, INDEX).await.contains("{{/Darth Bane}}"));
        assert!(!f.wiki.exists("Talk:Darth Bane").await.unwrap());
    }

    #[tokio::test]
    async fn test_post_collects_nominator_and_projects() {
        let mut f = fixture();
        seed(&mut f).await;

        let result = run_archive(&f.ctx, &command(ArchiveOutcome::Post, "Reviewer", false)).await;
        assert!(result.completed);
        assert_eq!(result.nominator.as_deref(), Some("Nominator"));
        assert_eq!(result.projects, vec!["Sith"]);
        assert!(text(&f, INDEX).await.contains("{{/Darth Bane}}"));
    }

    #[tokio::test]
    async fn test_too_young_nomination_is_rejected() {
        let mut f = fixture();
        seed(&mut f).await;
        f.clock.set(Utc.with_ymd_and_hms(2024, 2, 21, 12, 0, 0).unwrap());

        let result = run_archive(&f.ctx, &command(ArchiveOutcome::Successful, "Reviewer", false)).await;
        assert!(!result.completed);
        assert!(result.message.starts_with("Nomination is only 1 days old"), "{}", result.message);
    }

    #[tokio::test]
    async fn test_missing_target_and_redirects() {
        let mut f = fixture();
        seed(&mut f).await;

        let mut missing = command(ArchiveOutcome::Successful, "Reviewer", false);
        missing.article_name = "Darth Zannah".to_string();
        let result = run_archive(&f.ctx, &missing).await;
        assert_eq!(result.message, "Target: Darth Zannah does not exist");

        f.wiki
            .edit_as("Talk:Darth Bane", "#REDIRECT [[Talk:Bane]]", "Someone", "Move", &[])
            .await
            .unwrap();
        let result = run_archive(&f.ctx, &command(ArchiveOutcome::Successful, "Reviewer", false)).await;
        assert_eq!(result.message, "Talk:Darth Bane is a redirect page");
    }

    #[tokio::test]
    async fn test_unknown_type_is_reported() {
        let f = fixture();
        let mut unknown = command(ArchiveOutcome::Successful, "Reviewer", false);
        unknown.nom_type = "XA".to_string();
        let result = run_archive(&f.ctx, &unknown).await;
        assert_eq!(result.message, "Unrecognized nomination type XA");
    }
}
