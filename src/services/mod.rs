//! Service layer for the archiver.
//!
//! Pure text engines, free of I/O:
//! - Command parsing (`command`)
//! - The approval and vote gate (`approval`)
//! - Nomination page, history table and listing markup (`wikitext`)
//! - Review page markup (`review`)
//! - Talk page history merge (`talk_page`)
//! - Objection thread analysis (`objections`)
//! - Listing/category comparison (`analysis`)
//! - Timed caches (`cache`)

pub mod analysis;
pub mod approval;
pub mod cache;
pub mod command;
pub mod objections;
pub mod review;
pub mod talk_page;
pub mod wikitext;

pub use analysis::{Analysis, compare_category_and_page};
pub use approval::{Approval, ApprovalBasis, ApprovalRequest, VoteCount, check_approval};
pub use cache::TimedCache;
pub use command::{parse_command, parse_review_command};
pub use objections::{Notification, ObjectionReport, ReviewStatus};
pub use talk_page::{HistoryEntry, HistoryResult, TalkMerge, TalkUpdate, merge_talk_page};
pub use wikitext::WordCount;
