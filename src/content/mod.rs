//! Content module - raw API payloads, normalized posts, body handling and
//! reading time

mod post;
pub mod raw;
pub mod reading_time;
pub mod rich_text;

pub use post::{Banner, DetailData, PostDetail, PostSummary, Section, SummaryData};
pub use reading_time::ReadingTime;
pub use rich_text::Body;
