//! Record Module - Normalized result records
//!
//! - `types` - ResultRecord, Explanation, StreamEvent
//! - `wire` - raw server JSON -> normalized events

pub mod types;
pub mod wire;

pub use types::{Explanation, ResultRecord, ScoreBreakdown, StatsSummary, StreamEvent};
pub use wire::decode_message;
