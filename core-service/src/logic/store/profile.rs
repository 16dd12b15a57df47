//! Owner risk profile, computed on demand from the store

use serde::Serialize;

use super::ResultStore;
use crate::logic::record::ResultRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskBand {
    Low,
    Suspicious,
    Critical,
}

impl RiskBand {
    pub fn from_score(score: f64) -> Self {
        if score > 0.7 {
            RiskBand::Critical
        } else if score > 0.3 {
            RiskBand::Suspicious
        } else {
            RiskBand::Low
        }
    }
}

/// One flagged item in an owner's history
#[derive(Debug, Clone, Serialize)]
pub struct FlaggedItem {
    pub id: String,
    pub amount: f64,
    pub timestamp: String,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerProfile {
    pub owner_key: String,
    /// Mean of the scores that are present
    pub risk_score: f64,
    pub risk_band: RiskBand,
    pub total_volume: f64,
    pub item_count: usize,
    pub flagged_count: usize,
    /// Flagged items in arrival order
    pub history: Vec<FlaggedItem>,
}

/// Build the profile for `owner`, or `None` if the owner has no records
pub fn owner_profile(store: &ResultStore, owner: &str) -> Option<OwnerProfile> {
    let owned: Vec<&ResultRecord> = store
        .records()
        .iter()
        .filter(|r| r.owner_key == owner)
        .collect();

    if owned.is_empty() {
        return None;
    }

    let scores: Vec<f64> = owned.iter().filter_map(|r| r.score).collect();
    let risk_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    let history: Vec<FlaggedItem> = owned
        .iter()
        .filter(|r| r.is_flagged)
        .map(|r| FlaggedItem {
            id: r.id.clone(),
            amount: r.amount,
            timestamp: r.timestamp.clone(),
            explanation: r.explanation.text.clone(),
        })
        .collect();

    Some(OwnerProfile {
        owner_key: owner.to_string(),
        risk_score,
        risk_band: RiskBand::from_score(risk_score),
        total_volume: owned.iter().map(|r| r.amount).sum(),
        item_count: owned.len(),
        flagged_count: history.len(),
        history,
    })
}
