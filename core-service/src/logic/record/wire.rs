//! Stream boundary normalization
//!
//! Every message pushed by the analysis server passes through `decode_message`
//! exactly once. Consumers only ever see `ResultRecord` / `StreamEvent`, never
//! raw JSON with its alternate key spellings.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::types::{Explanation, ResultRecord, ScoreBreakdown, StatsSummary, StreamEvent};

const ID_KEYS: &[&str] = &["transaction_id", "id", "itemId"];
const OWNER_KEYS: &[&str] = &["user_id", "owner_key", "ownerKey", "sender_id"];
const RECIPIENT_KEYS: &[&str] = &[
    "recipient_id", "receiver_id", "recipient", "Receiver ID", "Recipient ID",
];
const AMOUNT_KEYS: &[&str] = &["amount"];
const SCORE_KEYS: &[&str] = &["final_score", "score"];
const FLAG_KEYS: &[&str] = &["is_anomalous", "is_flagged", "isFlagged"];

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default, alias = "record")]
    row: Option<Value>,
    #[serde(default, alias = "indexInBatch")]
    index: Option<u64>,
    #[serde(default, alias = "totalInBatch")]
    total_transactions: Option<u64>,
    #[serde(default, alias = "runningFlaggedCount")]
    anomalous_count: Option<u64>,
    #[serde(default, alias = "finalStats")]
    stats: Option<WireStats>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireStats {
    #[serde(default, alias = "total")]
    total_transactions: Option<u64>,
    #[serde(default, alias = "flaggedCount")]
    anomalous_count: Option<u64>,
    #[serde(default, alias = "meanAmount")]
    mean_amount: Option<f64>,
    #[serde(default, alias = "mostActiveOwner")]
    most_active_user_id: Option<String>,
}

impl From<WireStats> for StatsSummary {
    fn from(w: WireStats) -> Self {
        Self {
            total: w.total_transactions,
            flagged_count: w.anomalous_count,
            mean_amount: w.mean_amount.filter(|m| m.is_finite()),
            most_active_owner: w.most_active_user_id.filter(|o| !o.is_empty() && o != "N/A"),
        }
    }
}

/// Decode one `data:` payload into zero or more normalized events.
///
/// A single message may carry a row and the terminal stats together; the
/// row is always emitted first so stats never precede the record they close.
pub fn decode_message(payload: &str) -> Vec<StreamEvent> {
    let message: WireMessage = match serde_json::from_str(payload) {
        Ok(m) => m,
        Err(e) => return vec![StreamEvent::Malformed(format!("invalid JSON: {}", e))],
    };

    if let Some(error) = message.error {
        let text = match message.details {
            Some(details) if !details.is_empty() => format!("{} ({})", error, details),
            _ => error,
        };
        return vec![StreamEvent::Error(text)];
    }

    let mut events = Vec::with_capacity(2);

    if let Some(row) = message.row.filter(|r| !r.is_null()) {
        match normalize_record(&row) {
            Ok(record) => events.push(StreamEvent::Record {
                record,
                index_in_batch: message.index.unwrap_or(0),
                total_in_batch: message.total_transactions.unwrap_or(0),
                running_flagged_count: message.anomalous_count.unwrap_or(0),
            }),
            Err(reason) => events.push(StreamEvent::Malformed(reason)),
        }
    }

    if let Some(stats) = message.stats {
        events.push(StreamEvent::FinalStats(stats.into()));
    }

    if events.is_empty() {
        events.push(StreamEvent::Malformed("message carries no row, stats or error".to_string()));
    }

    events
}

/// Normalize one raw row into a `ResultRecord`
pub fn normalize_record(row: &Value) -> Result<ResultRecord, String> {
    let obj = row.as_object().ok_or_else(|| "row is not an object".to_string())?;

    let amount = number_field(obj, AMOUNT_KEYS).ok_or_else(|| "missing amount".to_string())?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("invalid amount {}", amount));
    }

    let score = number_field(obj, SCORE_KEYS)
        .filter(|s| s.is_finite())
        .map(|s| s.clamp(0.0, 1.0));

    Ok(ResultRecord {
        id: string_field(obj, ID_KEYS).unwrap_or_default(),
        owner_key: string_field(obj, OWNER_KEYS).unwrap_or_default(),
        recipient: string_field(obj, RECIPIENT_KEYS),
        location: string_field(obj, &["location"]),
        amount,
        timestamp: string_field(obj, &["timestamp"]).unwrap_or_default(),
        score,
        is_flagged: bool_field(obj, FLAG_KEYS).unwrap_or(false),
        explanation: obj.get("explanation").map(normalize_explanation).unwrap_or_default(),
    })
}

/// Normalize an explanation payload (string narrative or structured object)
pub fn normalize_explanation(value: &Value) -> Explanation {
    match value {
        Value::String(text) => Explanation {
            text: Some(text.clone()),
            raw: value.clone(),
            ..Default::default()
        },
        Value::Object(obj) => Explanation {
            text: string_field(obj, &["text", "summary", "narrative"]),
            fraud_type: string_field(obj, &["fraud_type", "fraudType"]),
            score_breakdown: ["score_breakdown", "scoreBreakdown"]
                .iter()
                .find_map(|k| obj.get(*k))
                .and_then(|v| v.as_object())
                .map(|b| ScoreBreakdown {
                    rule_score: number_field(b, &["rule_score", "rule"]),
                    ml_score: number_field(b, &["ml_score", "ml"]),
                    graph_score: number_field(b, &["graph_score", "graph"]),
                    threshold: number_field(b, &["threshold"]),
                }),
            path_nodes: ["path_nodes", "pathNodes"]
                .iter()
                .find_map(|k| obj.get(*k))
                .and_then(|v| v.as_array())
                .map(|nodes| nodes.iter().filter_map(scalar_to_string).collect()),
            raw: value.clone(),
        },
        _ => Explanation { raw: value.clone(), ..Default::default() },
    }
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(scalar_to_string)
        .filter(|s| !s.is_empty())
}

fn number_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn bool_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(|v| match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    })
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
