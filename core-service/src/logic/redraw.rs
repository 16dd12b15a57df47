//! Redraw Scheduler - throttles visible refreshes while streaming
//!
//! Data is never dropped here; only the visible refresh is deferred.
//! `finalize` always asks for everything.

use crate::logic::config::MonitorConfig;

/// Policy constants (both clamp to at least 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedrawPolicy {
    pub table_every: u64,
    pub repaint_every: u64,
}

impl RedrawPolicy {
    pub fn new(table_every: u64, repaint_every: u64) -> Self {
        Self {
            table_every: table_every.max(1),
            repaint_every: repaint_every.max(1),
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.table_refresh_every, config.series_repaint_every)
    }
}

impl Default for RedrawPolicy {
    fn default() -> Self {
        Self::new(
            crate::constants::DEFAULT_TABLE_REFRESH_EVERY,
            crate::constants::DEFAULT_SERIES_REPAINT_EVERY,
        )
    }
}

/// What should run after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RedrawDecision {
    pub project_table: bool,
    pub repaint_series: bool,
}

impl RedrawDecision {
    pub const ALL: RedrawDecision = RedrawDecision { project_table: true, repaint_series: true };
    pub const NONE: RedrawDecision = RedrawDecision { project_table: false, repaint_series: false };
}

#[derive(Debug, Clone)]
pub struct RedrawScheduler {
    policy: RedrawPolicy,
}

impl RedrawScheduler {
    pub fn new(policy: RedrawPolicy) -> Self {
        Self { policy }
    }

    /// Decide after a record was appended; `appended` counts records in the store
    pub fn on_append(&self, appended: u64) -> RedrawDecision {
        if appended == 0 {
            return RedrawDecision::NONE;
        }
        RedrawDecision {
            project_table: appended % self.policy.table_every == 0,
            repaint_series: appended % self.policy.repaint_every == 0,
        }
    }

    /// Unconditional final refresh
    pub fn on_finalize(&self) -> RedrawDecision {
        RedrawDecision::ALL
    }

    pub fn policy(&self) -> RedrawPolicy {
        self.policy
    }
}
