use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Score components reported by the remote scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub rule_score: Option<f64>,
    pub ml_score: Option<f64>,
    pub graph_score: Option<f64>,
    pub threshold: Option<f64>,
}

/// Opaque explanation payload attached to a scored item.
///
/// `raw` keeps the server payload untouched; the typed fields are the
/// parts consumers actually look at.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Explanation {
    pub text: Option<String>,
    pub fraud_type: Option<String>,
    pub score_breakdown: Option<ScoreBreakdown>,
    pub path_nodes: Option<Vec<String>>,
    pub raw: Value,
}

/// One scored item. Immutable once appended to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Caller-assigned id (not guaranteed unique)
    pub id: String,
    /// Groups records for profile lookups
    pub owner_key: String,
    pub recipient: Option<String>,
    pub location: Option<String>,
    /// Non-negative
    pub amount: f64,
    /// Caller supplied, never parsed
    pub timestamp: String,
    /// [0, 1]; absent when the scorer did not produce one
    pub score: Option<f64>,
    pub is_flagged: bool,
    pub explanation: Explanation,
}

impl ResultRecord {
    /// Status label used for sorting and display
    pub fn status(&self) -> &'static str {
        if self.is_flagged { "Flagged" } else { "Normal" }
    }

    /// Label shown by renderers; flagged records prefer the fraud type
    pub fn status_label(&self) -> &str {
        match (&self.explanation.fraud_type, self.is_flagged) {
            (Some(kind), true) => kind.as_str(),
            _ => self.status(),
        }
    }
}

/// Server-computed summary delivered with the last message of a batch
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total: Option<u64>,
    pub flagged_count: Option<u64>,
    pub mean_amount: Option<f64>,
    pub most_active_owner: Option<String>,
}

/// One normalized message from the event channel
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Record {
        record: ResultRecord,
        index_in_batch: u64,
        total_in_batch: u64,
        running_flagged_count: u64,
    },
    FinalStats(StatsSummary),
    Error(String),
    /// Payload that could not be normalized; skipped by the controller
    Malformed(String),
}
