//! Remote Module - Analysis server communication
//!
//! This module handles:
//! - Batch submission (`RemoteSession::submit_batch`)
//! - The server-push analysis stream (`RemoteSession::open_analysis_stream`)
//! - Single-item probes and remote context reset (`ProbeClient`)

pub mod client;
pub mod sse;

pub use client::HttpRemote;

use std::path::Path;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::logic::error::{MonitorError, MonitorResult};
use crate::logic::probe::{ProbeInput, ProbeResult};
use crate::logic::record::StreamEvent;

/// Capacity of the in-process event channel
pub const CHANNEL_CAPACITY: usize = 256;

/// Normalized events in delivery order; closed when the server is done
pub type EventChannel = mpsc::Receiver<StreamEvent>;

/// Server-side id of one uploaded batch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque uploaded batch (contents are never inspected here)
#[derive(Debug, Clone)]
pub struct BatchFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl BatchFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), contents: contents.into() }
    }

    pub fn from_path(path: &Path) -> MonitorResult<Self> {
        let contents = std::fs::read(path)
            .map_err(|e| MonitorError::Submission(format!("Cannot read {}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "batch.csv".to_string());
        Ok(Self { name, contents })
    }
}

/// Batch upload + analysis stream
#[allow(async_fn_in_trait)]
pub trait RemoteSession {
    async fn submit_batch(&self, file: &BatchFile) -> MonitorResult<SessionId>;

    async fn open_analysis_stream(&self, session_id: &SessionId) -> MonitorResult<EventChannel>;
}

/// Single-item analysis used by the judge action and scenarios
#[allow(async_fn_in_trait)]
pub trait ProbeClient {
    async fn analyze_single_item(&self, input: &ProbeInput) -> MonitorResult<ProbeResult>;

    /// Best effort; callers log failures and move on
    async fn reset_remote_context(&self) -> MonitorResult<()>;
}
