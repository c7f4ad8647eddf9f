//! Utility functions and helpers.

pub mod clock;
pub mod http;
pub mod progress;

use chrono::{DateTime, NaiveDateTime, Utc};

pub use clock::{Clock, FixedClock, SystemClock};

/// Strip tabs, newlines and left-to-right marks, then trim.
pub fn clean_text(text: &str) -> String {
    text.replace(['\t', '\n', '\u{200e}'], "").trim().to_string()
}

/// Compare two user names the way the wiki does (underscores are spaces,
/// case-insensitive).
pub fn same_user(a: &str, b: &str) -> bool {
    normalize_user(a) == normalize_user(b)
}

fn normalize_user(user: &str) -> String {
    user.replace('_', " ").trim().to_lowercase()
}

/// Parse a signature timestamp such as `12:34, 5 March 2024` or
/// `12:34, March 5, 2024`. Signatures are always UTC.
pub fn parse_signature_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    ["%H:%M, %d %B %Y", "%H:%M, %B %d, %Y"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// The subpage part of a nomination or review page title.
pub fn subpage_name(title: &str) -> &str {
    title.split_once('/').map(|(_, sub)| sub).unwrap_or(title)
}
