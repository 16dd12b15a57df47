//! Running aggregate over ingested records

use std::collections::HashMap;
use serde::Serialize;

use crate::logic::record::{ResultRecord, StatsSummary};

/// Running aggregate. Every update is a pure function of the previous
/// aggregate and one record; nothing here rescans history.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    pub total: u64,
    pub flagged_count: u64,
    pub mean_amount: f64,
    pub most_active_owner: Option<String>,

    #[serde(skip)]
    owner_counts: HashMap<String, u64>,
    #[serde(skip)]
    leader_count: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// `flagged_count / total`, 0 when nothing was ingested
    pub fn flagged_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.flagged_count as f64 / self.total as f64
        }
    }

    /// Fold one record in O(1)
    pub fn fold(&mut self, record: &ResultRecord) {
        self.total += 1;
        if record.is_flagged {
            self.flagged_count += 1;
        }

        // mean' = mean + (x - mean) / n
        self.mean_amount += (record.amount - self.mean_amount) / self.total as f64;

        let count = {
            let entry = self.owner_counts.entry(record.owner_key.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        // Counts only grow, so only the incoming owner can overtake the leader.
        // Ties keep whoever got there first.
        if count > self.leader_count {
            self.leader_count = count;
            if self.most_active_owner.as_deref() != Some(record.owner_key.as_str()) {
                self.most_active_owner = Some(record.owner_key.clone());
            }
        }
    }

    /// Overwrite aggregate-consistency fields with server-computed values.
    /// Counters stay tied to what was actually folded.
    pub fn apply_summary(&mut self, summary: &StatsSummary) {
        if let Some(mean) = summary.mean_amount {
            self.mean_amount = mean;
        }
        if let Some(owner) = &summary.most_active_owner {
            self.most_active_owner = Some(owner.clone());
        }
        if let Some(server_total) = summary.total {
            if server_total != self.total {
                log::warn!(
                    "Server reported {} items, {} were ingested",
                    server_total, self.total
                );
            }
        }
    }

    /// Records seen for one owner
    pub fn owner_count(&self, owner: &str) -> u64 {
        self.owner_counts.get(owner).copied().unwrap_or(0)
    }

    pub fn unique_owners(&self) -> usize {
        self.owner_counts.len()
    }
}
