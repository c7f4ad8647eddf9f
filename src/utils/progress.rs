// src/utils/progress.rs

//! Pipeline progress logging on top of the `log` facade.
//!
//! Keeps the step/header formatting consistent across the archival, review
//! and intake workflows.

/// Log a header for a workflow run.
pub fn header(title: &str) {
    let border = "═".repeat(60);
    log::info!("{}", border);
    log::info!("  {}", title);
    log::info!("{}", border);
}

/// Log a step in a process.
pub fn step(step_num: usize, total: usize, message: &str) {
    log::info!("[STEP {}/{}] {}", step_num, total, message);
}

/// Log a step that was skipped because its effect is already in place.
pub fn skipped(message: &str) {
    log::info!("    ↷ {}", message);
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    log::info!("    {}", message);
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {}", title);
    for (key, value) in items {
        log::info!("    {}: {}", key, value);
    }
}

/// Log a completed workflow.
pub fn success(message: &str) {
    log::info!("✓ {}", message);
}
