//! Session Controller - drives one streaming session end-to-end
//!
//! ```text
//!   Idle ──start()──► Streaming ──channel closed──► Finalized
//!                        │
//!                        └──error event / broken stream──► Errored
//! ```
//!
//! Events are folded strictly in channel order. Expensive refreshes go
//! through the `RedrawScheduler`; `finalize` always performs one last
//! unthrottled projection.


use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::logic::config::MonitorConfig;
use crate::logic::error::{MonitorError, MonitorResult};
use crate::logic::events::{DisplaySink, SeriesBuffer};
use crate::logic::record::{ResultRecord, StatsSummary, StreamEvent};
use crate::logic::redraw::{RedrawDecision, RedrawPolicy, RedrawScheduler};
use crate::logic::remote::{BatchFile, EventChannel, RemoteSession, SessionId};
use crate::logic::store::{owner_profile, AppendOutcome, OwnerProfile, ResultStore, Stats};
use crate::logic::view::{project_capped, DisplayConfig, DisplaySet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Streaming,
    Finalized,
    Errored(String),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Finalized | SessionState::Errored(_))
    }
}

/// Batch progress as reported by the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Progress {
    pub processed: u64,
    pub total: u64,
    /// Server's flagged count at the latest record
    pub running_flagged: u64,
}

impl Progress {
    /// Rounded completion percentage
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.processed as f64 / self.total as f64) * 100.0).round().min(100.0) as u32
    }

    /// Flagged share of processed items, from the server's running count
    pub fn live_rate(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.running_flagged as f64 / self.processed as f64
        }
    }
}

/// What a finished session looked like
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: Option<SessionId>,
    pub state: SessionState,
    pub stats: Stats,
    pub flagged_rate: f64,
    pub progress: Progress,
    pub displayed: usize,
    pub matched: usize,
    pub malformed_events: u64,
    pub skipped_duplicates: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

pub struct SessionController<R: RemoteSession, D: DisplaySink> {
    remote: R,
    sink: D,
    config: MonitorConfig,
    scheduler: RedrawScheduler,

    store: ResultStore,
    series: SeriesBuffer,
    display_config: DisplayConfig,
    display: DisplaySet,
    progress: Progress,

    state: SessionState,
    session_id: Option<SessionId>,
    finalized: bool,
    alerted: bool,
    malformed_events: u64,
    skipped_duplicates: u64,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl<R: RemoteSession, D: DisplaySink> SessionController<R, D> {
    pub fn new(remote: R, sink: D, config: MonitorConfig) -> Self {
        Self {
            scheduler: RedrawScheduler::new(RedrawPolicy::from_config(&config)),
            store: ResultStore::new(config.duplicate_policy),
            remote,
            sink,
            config,
            series: SeriesBuffer::new(),
            display_config: DisplayConfig::default(),
            display: DisplaySet::default(),
            progress: Progress::default(),
            state: SessionState::Idle,
            session_id: None,
            finalized: false,
            alerted: false,
            malformed_events: 0,
            skipped_duplicates: 0,
            started_at: None,
            finished_at: None,
        }
    }

    /// Initial view settings (no projection yet)
    pub fn with_display_config(mut self, config: DisplayConfig) -> Self {
        self.display_config = config;
        self
    }

    /// Reset, submit the batch and open its event channel.
    ///
    /// A rejected submission is returned as `MonitorError::Submission`; the
    /// caller must re-submit, nothing is retried here.
    pub async fn start(&mut self, file: &BatchFile) -> MonitorResult<EventChannel> {
        self.discard_session();

        let session_id = match self.remote.submit_batch(file).await {
            Ok(id) => id,
            Err(e) => {
                let error = match e {
                    MonitorError::Submission(_) => e,
                    other => MonitorError::Submission(other.to_string()),
                };
                log::error!("Batch '{}' rejected: {}", file.name, error);
                self.sink.show_error(&error);
                return Err(error);
            }
        };

        self.session_id = Some(session_id.clone());
        self.started_at = Some(Utc::now());

        match self.remote.open_analysis_stream(&session_id).await {
            Ok(channel) => {
                log::info!("Streaming analysis for session {}", session_id);
                self.state = SessionState::Streaming;
                Ok(channel)
            }
            Err(e) => {
                let message = match &e {
                    MonitorError::Stream { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                self.fail(message);
                Err(self.stream_error().unwrap_or(e))
            }
        }
    }

    /// Fold one channel message. Ignored unless the session is streaming.
    pub fn on_event(&mut self, event: StreamEvent) {
        if self.state != SessionState::Streaming {
            log::debug!("Ignoring event in state {:?}", self.state);
            return;
        }

        match event {
            StreamEvent::Record { record, index_in_batch, total_in_batch, running_flagged_count } => {
                let processed = index_in_batch.saturating_add(1);
                self.progress = Progress {
                    processed,
                    total: total_in_batch.max(processed),
                    running_flagged: running_flagged_count,
                };
                self.ingest(record);
            }
            StreamEvent::FinalStats(summary) => self.apply_final_stats(&summary),
            StreamEvent::Error(message) => self.fail(message),
            StreamEvent::Malformed(reason) => {
                self.malformed_events += 1;
                log::warn!("Skipping event. {}", MonitorError::MalformedEvent(reason));
            }
        }
    }

    fn ingest(&mut self, record: ResultRecord) {
        let id = record.id.clone();
        if self.store.append(record) == AppendOutcome::SkippedDuplicate {
            self.skipped_duplicates += 1;
            return;
        }

        let appended = self.store.len() as u64;
        self.series.ensure_attached(&mut self.sink);

        if let Some(record) = self.store.records().last() {
            self.series.push(appended, record);

            if record.is_flagged && !self.alerted {
                self.alerted = true;
                self.sink.alert_first_flag(record);
            }
        }

        log::debug!("Folded record '{}' ({} in store)", id, appended);
        self.sink.update_stats(self.store.stats(), &self.progress);

        let decision = self.scheduler.on_append(appended);
        self.redraw(decision);
    }

    fn apply_final_stats(&mut self, summary: &StatsSummary) {
        self.store.apply_summary(summary);
        if let Some(total) = summary.total {
            self.progress.total = total.max(self.progress.processed);
        }
        self.sink.update_stats(self.store.stats(), &self.progress);
    }

    /// Close the session. Idempotent.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;

        if self.state == SessionState::Streaming || self.state == SessionState::Idle {
            self.state = SessionState::Finalized;
        }
        self.finished_at = Some(Utc::now());

        let decision = self.scheduler.on_finalize();
        self.redraw(decision);

        let stats = self.store.stats();
        log::info!(
            "Session {} finished ({:?}): {} items, {} flagged ({:.1}%)",
            self.session_id.as_ref().map(|s| s.0.as_str()).unwrap_or("-"),
            self.state,
            stats.total,
            stats.flagged_count,
            stats.flagged_rate() * 100.0
        );
    }

    /// start + consume the channel until it closes + finalize
    pub async fn run(&mut self, file: &BatchFile) -> MonitorResult<SessionSummary> {
        let mut channel = self.start(file).await?;

        while let Some(event) = channel.recv().await {
            self.on_event(event);
            if self.state.is_terminal() {
                break;
            }
        }

        self.finalize();

        match self.stream_error() {
            Some(error) => Err(error),
            None => Ok(self.summary()),
        }
    }

    /// Replace the view settings and re-project immediately
    pub fn set_display_config(&mut self, config: DisplayConfig) {
        self.display_config = config;
        self.refresh_table();
    }

    pub fn display_config(&self) -> &DisplayConfig {
        &self.display_config
    }

    /// Profile lookup for one owner of the current session
    pub fn owner_profile(&self, owner: &str) -> Option<OwnerProfile> {
        owner_profile(&self.store, owner)
    }

    pub fn summary(&self) -> SessionSummary {
        let stats = self.store.stats().clone();
        SessionSummary {
            session_id: self.session_id.clone(),
            state: self.state.clone(),
            flagged_rate: stats.flagged_rate(),
            stats,
            progress: self.progress,
            displayed: self.display.len(),
            matched: self.display.matched,
            malformed_events: self.malformed_events,
            skipped_duplicates: self.skipped_duplicates,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stats(&self) -> &Stats {
        self.store.stats()
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn display(&self) -> &DisplaySet {
        &self.display
    }

    pub fn series(&self) -> &SeriesBuffer {
        &self.series
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut D {
        &mut self.sink
    }

    fn redraw(&mut self, decision: RedrawDecision) {
        if decision.project_table {
            self.refresh_table();
        }
        if decision.repaint_series {
            self.sink.repaint_series(&self.series);
        }
    }

    fn refresh_table(&mut self) {
        self.display = project_capped(self.store.records(), &self.display_config, self.config.display_cap);
        self.sink.render_table(&self.display);
    }

    fn fail(&mut self, message: String) {
        if self.state.is_terminal() {
            return;
        }
        log::error!("Analysis stream error: {}", message);
        self.state = SessionState::Errored(message);
        if let Some(error) = self.stream_error() {
            self.sink.show_error(&error);
        }
        self.finalize();
    }

    fn stream_error(&self) -> Option<MonitorError> {
        match &self.state {
            SessionState::Errored(message) => Some(MonitorError::Stream {
                message: message.clone(),
                ingested: self.store.stats().total,
            }),
            _ => None,
        }
    }

    /// Drop the previous session. The series renderer is released before
    /// anything new can attach.
    fn discard_session(&mut self) {
        self.series.teardown(&mut self.sink);
        self.store.clear();
        self.display = DisplaySet::default();
        self.progress = Progress::default();
        self.state = SessionState::Idle;
        self.session_id = None;
        self.finalized = false;
        self.alerted = false;
        self.malformed_events = 0;
        self.skipped_duplicates = 0;
        self.started_at = None;
        self.finished_at = None;
    }
}
