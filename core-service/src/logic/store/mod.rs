//! Store Module - Append-only result store for one streaming session
//!
//! The store owns the ordered record sequence and the running `Stats`.
//! Both change together through `append`, so `stats.total == len()` holds
//! after every call.

pub mod stats;
pub mod profile;

#[cfg(test)]
mod tests;

use std::collections::HashSet;

use crate::logic::config::DuplicatePolicy;
use crate::logic::record::{ResultRecord, StatsSummary};
pub use stats::Stats;
pub use profile::{owner_profile, OwnerProfile, RiskBand};

/// Outcome of offering a record to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    SkippedDuplicate,
}

pub struct ResultStore {
    records: Vec<ResultRecord>,
    stats: Stats,
    seen_ids: HashSet<String>,
    policy: DuplicatePolicy,
}

impl ResultStore {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            records: Vec::new(),
            stats: Stats::new(),
            seen_ids: HashSet::new(),
            policy,
        }
    }

    /// Append a record and fold it into the stats
    pub fn append(&mut self, record: ResultRecord) -> AppendOutcome {
        let first_sighting = self.seen_ids.insert(record.id.clone());

        if !first_sighting && self.policy == DuplicatePolicy::SkipRepeatedIds {
            log::debug!("Skipping repeated record id '{}'", record.id);
            return AppendOutcome::SkippedDuplicate;
        }

        self.stats.fold(&record);
        self.records.push(record);
        AppendOutcome::Appended
    }

    /// Apply the server's terminal summary without touching record order
    pub fn apply_summary(&mut self, summary: &StatsSummary) {
        self.stats.apply_summary(summary);
    }

    /// Drop everything (new session)
    pub fn clear(&mut self) {
        self.records.clear();
        self.seen_ids.clear();
        self.stats = Stats::new();
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default())
    }
}
