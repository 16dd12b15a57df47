//! Monitor Configuration
//!
//! Runtime knobs for the streaming session and the scenario orchestrator.
//! Defaults come from `constants` (environment first, then built-in).

use serde::{Deserialize, Serialize};
use crate::constants;

/// What to do with a record whose `id` was already ingested this session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Append every record as delivered (no deduplication)
    #[default]
    AppendAll,
    /// Drop records whose id has been seen before
    SkipRepeatedIds,
}

impl DuplicatePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "append" | "append_all" => Some(Self::AppendAll),
            "skip" | "skip_repeated_ids" => Some(Self::SkipRepeatedIds),
            _ => None,
        }
    }
}

/// Monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Analysis server URL
    pub server_url: String,
    /// HTTP timeout for upload/probe requests (seconds)
    pub request_timeout_secs: u64,
    /// Project the table every N appended records
    pub table_refresh_every: u64,
    /// Repaint the series renderer every N appended records
    pub series_repaint_every: u64,
    /// Max rows in a DisplaySet
    pub display_cap: usize,
    /// Duplicate id handling
    pub duplicate_policy: DuplicatePolicy,
    /// Pause between scenario steps (ms)
    pub step_delay_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let duplicate_policy = match constants::get_duplicate_policy() {
            Some(raw) => DuplicatePolicy::parse(&raw).unwrap_or_else(|| {
                log::warn!("Unknown MONITOR_DUPLICATE_POLICY '{}', using append", raw);
                DuplicatePolicy::AppendAll
            }),
            None => DuplicatePolicy::AppendAll,
        };

        Self {
            server_url: constants::get_server_url(),
            request_timeout_secs: constants::get_request_timeout(),
            table_refresh_every: constants::get_table_refresh_every(),
            series_repaint_every: constants::get_series_repaint_every(),
            display_cap: constants::get_display_cap(),
            duplicate_policy,
            step_delay_ms: constants::get_step_delay_ms(),
        }
    }
}

impl MonitorConfig {
    /// Refresh on every record; used where redraw timing must be predictable
    pub fn deterministic() -> Self {
        Self {
            table_refresh_every: 1,
            series_repaint_every: 1,
            ..Default::default()
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn step_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.step_delay_ms)
    }
}
