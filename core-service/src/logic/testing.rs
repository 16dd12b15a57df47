//! Test doubles shared by the unit test modules

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, oneshot};

use crate::logic::error::{MonitorError, MonitorResult};
use crate::logic::events::{DisplaySink, SeriesBuffer};
use crate::logic::probe::{ProbeInput, ProbeResult};
use crate::logic::record::{Explanation, ResultRecord, StreamEvent};
use crate::logic::remote::{BatchFile, EventChannel, ProbeClient, RemoteSession, SessionId};
use crate::logic::scenario::ScenarioSink;
use crate::logic::session::Progress;
use crate::logic::store::Stats;
use crate::logic::view::DisplaySet;

pub fn record(id: &str, owner: &str, amount: f64, flagged: bool) -> ResultRecord {
    ResultRecord {
        id: id.to_string(),
        owner_key: owner.to_string(),
        recipient: None,
        location: None,
        amount,
        timestamp: String::new(),
        score: Some(if flagged { 0.9 } else { 0.1 }),
        is_flagged: flagged,
        explanation: Explanation::default(),
    }
}

/// Record event as the stream boundary would emit it
pub fn record_event(record: ResultRecord, index: u64, total: u64, running_flagged: u64) -> StreamEvent {
    StreamEvent::Record {
        record,
        index_in_batch: index,
        total_in_batch: total,
        running_flagged_count: running_flagged,
    }
}

pub fn verdict(flagged: bool, score: f64) -> ProbeResult {
    ProbeResult {
        is_flagged: flagged,
        score,
        explanation: Explanation::default(),
        details: None,
    }
}

// ============================================================================
// REMOTE SESSION
// ============================================================================

/// Replays a fixed list of events on every opened stream
pub struct ScriptedRemote {
    pub submit_error: Option<MonitorError>,
    pub events: Vec<StreamEvent>,
    pub submissions: AtomicUsize,
}

impl ScriptedRemote {
    pub fn new(events: Vec<StreamEvent>) -> Self {
        Self { submit_error: None, events, submissions: AtomicUsize::new(0) }
    }

    pub fn rejecting(message: &str) -> Self {
        Self {
            submit_error: Some(MonitorError::Submission(message.to_string())),
            events: Vec::new(),
            submissions: AtomicUsize::new(0),
        }
    }
}

impl RemoteSession for ScriptedRemote {
    async fn submit_batch(&self, _file: &BatchFile) -> MonitorResult<SessionId> {
        let n = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.submit_error {
            Some(e) => Err(e.clone()),
            None => Ok(SessionId(format!("batch-{}", n))),
        }
    }

    async fn open_analysis_stream(&self, _session_id: &SessionId) -> MonitorResult<EventChannel> {
        let (tx, rx) = mpsc::channel(self.events.len() + 1);
        for event in &self.events {
            let _ = tx.try_send(event.clone());
        }
        Ok(rx)
    }
}

// ============================================================================
// DISPLAY SINK
// ============================================================================

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub tables: Vec<DisplaySet>,
    pub repaints: usize,
    /// "attach" / "release" in call order
    pub lifecycle: Vec<&'static str>,
    pub stats_updates: Vec<(u64, Progress)>,
    pub alerts: Vec<String>,
    pub errors: Vec<MonitorError>,
}

impl RecordingSink {
    pub fn last_table(&self) -> Option<&DisplaySet> {
        self.tables.last()
    }

    pub fn last_table_ids(&self) -> Vec<String> {
        self.last_table()
            .map(|t| t.rows.iter().map(|r| r.id.clone()).collect())
            .unwrap_or_default()
    }
}

impl DisplaySink for RecordingSink {
    fn render_table(&mut self, rows: &DisplaySet) {
        self.tables.push(rows.clone());
    }

    fn repaint_series(&mut self, _series: &SeriesBuffer) {
        self.repaints += 1;
    }

    fn attach_series(&mut self) {
        self.lifecycle.push("attach");
    }

    fn release_series(&mut self) {
        self.lifecycle.push("release");
    }

    fn update_stats(&mut self, stats: &Stats, progress: &Progress) {
        self.stats_updates.push((stats.total, *progress));
    }

    fn alert_first_flag(&mut self, record: &ResultRecord) {
        self.alerts.push(record.id.clone());
    }

    fn show_error(&mut self, error: &MonitorError) {
        self.errors.push(error.clone());
    }
}

// ============================================================================
// PROBE
// ============================================================================

/// Probe whose responses are released by the test.
///
/// Each `gate()` queues one pending response; calls beyond the queued gates
/// answer immediately with a normal verdict.
#[derive(Default)]
pub struct GatedProbe {
    gates: Mutex<VecDeque<oneshot::Receiver<MonitorResult<ProbeResult>>>>,
    pub calls: Mutex<Vec<ProbeInput>>,
    pub resets: AtomicUsize,
    pub fail_reset: bool,
}

impl GatedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe whose remote context reset always fails
    pub fn failing_reset() -> Self {
        Self { fail_reset: true, ..Self::default() }
    }

    pub fn gate(&self) -> oneshot::Sender<MonitorResult<ProbeResult>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().push_back(rx);
        tx
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl ProbeClient for GatedProbe {
    async fn analyze_single_item(&self, input: &ProbeInput) -> MonitorResult<ProbeResult> {
        input.validate()?;
        self.calls.lock().push(input.clone());

        let gate = self.gates.lock().pop_front();
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(MonitorError::Probe("gate dropped".to_string()))),
            None => Ok(verdict(false, 0.1)),
        }
    }

    async fn reset_remote_context(&self) -> MonitorResult<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reset {
            Err(MonitorError::Probe("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// SCENARIO SINK
// ============================================================================

#[derive(Debug, Default)]
pub struct RecordingScenarioSink {
    /// (step label, score)
    pub steps: Vec<(String, f64)>,
    pub alerts: Vec<String>,
    pub failures: Vec<(String, MonitorError)>,
    pub clears: usize,
}

impl ScenarioSink for RecordingScenarioSink {
    fn render_step(&mut self, label: &str, _input: &ProbeInput, result: &ProbeResult) {
        self.steps.push((label.to_string(), result.score));
    }

    fn alert(&mut self, label: &str, _result: &ProbeResult) {
        self.alerts.push(label.to_string());
    }

    fn probe_failed(&mut self, label: &str, error: &MonitorError) {
        self.failures.push((label.to_string(), error.clone()));
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}
