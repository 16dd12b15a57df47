//! Logic Module - Session & Scenario Engines
//!
//! ## Layout
//! - `record/` - normalized stream records and the wire decoder
//! - `store/` - append-only result store, running stats, owner profiles
//! - `view/` - filter/sort/cap projection handed to the table renderer
//! - `redraw` - throttling policy for expensive refreshes
//! - `session/` - streaming session controller
//! - `probe/` + `scenario/` - single-item probe and generation-token runs
//! - `remote/` - analysis server client (upload, SSE stream, judge)

// Shared
pub mod config;
pub mod error;
pub mod events;

// Streaming session
pub mod record;
pub mod store;
pub mod view;
pub mod redraw;
pub mod session;

// Probe & scenarios
pub mod probe;
pub mod scenario;

// Remote side
pub mod remote;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{DuplicatePolicy, MonitorConfig};
pub use error::{MonitorError, MonitorResult};
pub use session::{SessionController, SessionState, SessionSummary};
pub use scenario::{RunOutcome, ScenarioOrchestrator};
