//! Probe Module - Single-item analysis
//!
//! Shared by the manual judge action and the scenario orchestrator.
//! Input validation happens here so both callers reject the same forms.

pub mod types;

pub use types::{JudgeRequest, JudgeResponse, ProbeDetails, ProbeInput, ProbeResult, ProbeWeights};

use uuid::Uuid;

use crate::logic::error::{MonitorError, MonitorResult};
use crate::logic::record::wire::normalize_explanation;

impl ProbeInput {
    /// Amount, location and owner are required
    pub fn validate(&self) -> MonitorResult<f64> {
        let amount = match self.amount {
            Some(a) if a.is_finite() && a >= 0.0 => a,
            _ => return Err(MonitorError::InvalidProbeInput("amount".to_string())),
        };
        if self.location.trim().is_empty() {
            return Err(MonitorError::InvalidProbeInput("location".to_string()));
        }
        if self.owner_key.trim().is_empty() {
            return Err(MonitorError::InvalidProbeInput("owner".to_string()));
        }
        Ok(amount)
    }

    /// Build the wire request, filling an item id and timestamp when blank
    pub fn to_request(&self) -> MonitorResult<JudgeRequest> {
        let amount = self.validate()?;

        let transaction_id = if self.item_id.trim().is_empty() {
            let id = Uuid::new_v4().simple().to_string();
            format!("JUDGE-{}", &id[..8])
        } else {
            self.item_id.trim().to_string()
        };

        let timestamp = if self.timestamp.trim().is_empty() {
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
        } else {
            self.timestamp.trim().to_string()
        };

        Ok(JudgeRequest {
            amount,
            location: self.location.trim().to_string(),
            user_id: self.owner_key.trim().to_string(),
            transaction_id,
            timestamp,
        })
    }

    pub fn clear(&mut self) {
        *self = ProbeInput::default();
    }
}

impl JudgeResponse {
    pub fn into_result(self) -> MonitorResult<ProbeResult> {
        if let Some(error) = self.error {
            return Err(MonitorError::Probe(error));
        }
        if !self.final_score.is_finite() {
            return Err(MonitorError::Probe("non-numeric score".to_string()));
        }
        Ok(ProbeResult {
            is_flagged: self.is_anomalous,
            score: self.final_score.clamp(0.0, 1.0),
            explanation: normalize_explanation(&self.explanation),
            details: self.details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filled() -> ProbeInput {
        ProbeInput {
            amount: Some(2500.0),
            location: "Mumbai".into(),
            owner_key: "user_1".into(),
            item_id: String::new(),
            timestamp: String::new(),
        }
    }

    #[test]
    fn test_validate_required_fields() {
        assert!(filled().validate().is_ok());

        let mut input = filled();
        input.amount = None;
        assert_eq!(input.validate(), Err(MonitorError::InvalidProbeInput("amount".into())));

        let mut input = filled();
        input.location = "  ".into();
        assert_eq!(input.validate(), Err(MonitorError::InvalidProbeInput("location".into())));

        let mut input = filled();
        input.owner_key.clear();
        assert_eq!(input.validate(), Err(MonitorError::InvalidProbeInput("owner".into())));
    }

    #[test]
    fn test_request_fills_blank_id_and_timestamp() {
        let request = filled().to_request().unwrap();
        assert!(request.transaction_id.starts_with("JUDGE-"));
        assert_eq!(request.transaction_id.len(), "JUDGE-".len() + 8);
        assert_eq!(request.timestamp.len(), "2024-01-01 00:00:00".len());
        assert_eq!(request.user_id, "user_1");
    }

    #[test]
    fn test_response_into_result() {
        let response: JudgeResponse = serde_json::from_value(json!({
            "is_anomalous": true,
            "final_score": 0.91,
            "explanation": "Amount spike",
            "details": {
                "rule_score": 0.8, "ml_score": 0.9, "graph_score": 0.0,
                "weights": { "rule": 0.4, "ml": 0.4, "graph": 0.2 },
                "threshold": 0.6
            }
        }))
        .unwrap();

        let result = response.into_result().unwrap();
        assert!(result.is_flagged);
        assert_eq!(result.verdict(), "DETECTED: FAKE");
        assert_eq!(result.explanation.text.as_deref(), Some("Amount spike"));
        assert_eq!(result.details.unwrap().weights.unwrap().graph, 0.2);
    }

    #[test]
    fn test_error_response() {
        let response: JudgeResponse =
            serde_json::from_value(json!({ "error": "model not ready" })).unwrap();
        assert_eq!(response.into_result(), Err(MonitorError::Probe("model not ready".into())));
    }
}
