// src/pipeline/analyze.rs

//! Listing page consistency checks.

use chrono::Duration;

use crate::error::{Rejection, Result};
use crate::pipeline::Context;
use crate::services::{Analysis, TimedCache, compare_category_and_page};
use crate::utils::progress;

/// Analyses keyed by nomination type abbreviation.
pub type AnalysisCache = TimedCache<String, Analysis>;

/// Compare a type's listing page with its status category.
///
/// A cached analysis younger than `max_age` is returned as is.
pub async fn run_analysis(
    ctx: &Context,
    cache: &mut AnalysisCache,
    code: &str,
    max_age: Duration,
) -> Result<Analysis> {
    let nom_type = ctx
        .data
        .types
        .get(code)
        .ok_or_else(|| Rejection::UnrecognizedType(code.to_string()))?;

    if let Some(cached) = cache.get_fresh(&nom_type.abbreviation, max_age) {
        log::debug!("Using cached analysis for {}", nom_type.page);
        return Ok(cached.clone());
    }

    progress::header(&format!("Analyzing {}", nom_type.page));
    let listing = ctx.store.get_text(&nom_type.page).await?;
    let members = ctx.store.category_members(&nom_type.category).await?;
    let analysis = compare_category_and_page(&listing, &members);

    for line in analysis.report(&nom_type.page, &nom_type.category) {
        progress::sub_item(&line);
    }
    if analysis.is_clean() {
        progress::success(&format!("{} matches {}", nom_type.page, nom_type.category));
    }

    cache.insert(nom_type.abbreviation.clone(), analysis.clone());
    Ok(analysis)
}
