use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logic::record::Explanation;

/// Editable fields of the single-item probe form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeInput {
    pub amount: Option<f64>,
    pub location: String,
    pub owner_key: String,
    pub item_id: String,
    pub timestamp: String,
}

/// Body of `POST /api/judge`
#[derive(Debug, Clone, Serialize)]
pub struct JudgeRequest {
    pub amount: f64,
    pub location: String,
    pub user_id: String,
    pub transaction_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeWeights {
    pub rule: f64,
    pub ml: f64,
    pub graph: f64,
}

/// Scoring transparency block returned with a probe result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeDetails {
    #[serde(default)]
    pub rule_score: f64,
    #[serde(default)]
    pub ml_score: f64,
    #[serde(default)]
    pub graph_score: f64,
    pub weights: Option<ProbeWeights>,
    pub threshold: Option<f64>,
}

/// Raw `/api/judge` response
#[derive(Debug, Clone, Deserialize)]
pub struct JudgeResponse {
    #[serde(default)]
    pub is_anomalous: bool,
    #[serde(default)]
    pub final_score: f64,
    #[serde(default)]
    pub explanation: Value,
    pub details: Option<ProbeDetails>,
    pub error: Option<String>,
}

/// Normalized probe verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub is_flagged: bool,
    pub score: f64,
    pub explanation: Explanation,
    pub details: Option<ProbeDetails>,
}

impl ProbeResult {
    pub fn verdict(&self) -> &'static str {
        if self.is_flagged { "DETECTED: FAKE" } else { "VERIFIED: LEGIT" }
    }
}
