//! Display Events - the seam between the session core and its surfaces
//!
//! The table renderer, the visual series renderer, stat counters and alert
//! effects all live behind `DisplaySink`. The core only decides *when* they
//! run and *what* they receive.

use serde::Serialize;

use crate::logic::error::MonitorError;
use crate::logic::record::ResultRecord;
use crate::logic::session::Progress;
use crate::logic::store::Stats;
use crate::logic::view::DisplaySet;

/// Display consumers of one streaming session
pub trait DisplaySink {
    /// Hand the current projection to the table renderer
    fn render_table(&mut self, rows: &DisplaySet);

    /// Repaint the visual series renderer from the running buffers
    fn repaint_series(&mut self, series: &SeriesBuffer);

    /// Create the series renderer (first record of a session)
    fn attach_series(&mut self) {}

    /// Release the series renderer before a replacement is created
    fn release_series(&mut self) {}

    /// Live counters and progress, after every record
    fn update_stats(&mut self, _stats: &Stats, _progress: &Progress) {}

    /// First flagged record of the session (fires once)
    fn alert_first_flag(&mut self, _record: &ResultRecord) {}

    /// User-visible session error
    fn show_error(&mut self, _error: &MonitorError) {}
}

/// One point of the running score series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// 1-based arrival position of the record in the store
    pub position: u64,
    pub score: f64,
}

/// Data backing the visual series renderer.
///
/// Appended on every record, regardless of whether a repaint happens.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeriesBuffer {
    points: Vec<SeriesPoint>,
    normal: u64,
    flagged: u64,
    #[serde(skip)]
    attached: bool,
}

impl SeriesBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record; records without a score only count toward the split
    pub fn push(&mut self, position: u64, record: &ResultRecord) {
        if let Some(score) = record.score {
            self.points.push(SeriesPoint { position, score });
        }
        if record.is_flagged {
            self.flagged += 1;
        } else {
            self.normal += 1;
        }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// (normal, flagged)
    pub fn split(&self) -> (u64, u64) {
        (self.normal, self.flagged)
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Attach the renderer once; returns true when this call attached it
    pub fn ensure_attached<S: DisplaySink + ?Sized>(&mut self, sink: &mut S) -> bool {
        if self.attached {
            return false;
        }
        sink.attach_series();
        self.attached = true;
        true
    }

    /// Release the renderer (if attached) and drop all buffered data
    pub fn teardown<S: DisplaySink + ?Sized>(&mut self, sink: &mut S) {
        if self.attached {
            sink.release_series();
            self.attached = false;
        }
        self.points.clear();
        self.normal = 0;
        self.flagged = 0;
    }
}

/// Sink that reports through the log facade (used by the CLI binary)
#[derive(Debug, Default)]
pub struct LogSink {
    last_percent: Option<u32>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for LogSink {
    fn render_table(&mut self, rows: &DisplaySet) {
        log::debug!("Table: {} rows ({} matched)", rows.len(), rows.matched);
        for row in rows.rows.iter().filter(|r| r.is_flagged).take(5) {
            log::debug!(
                "  {} | {} | {:.2} | {} | {}",
                row.id,
                row.owner_key,
                row.amount,
                row.score.map(|s| format!("{:.3}", s)).unwrap_or_else(|| "N/A".into()),
                row.status_label()
            );
        }
    }

    fn repaint_series(&mut self, series: &SeriesBuffer) {
        let (normal, flagged) = series.split();
        log::debug!(
            "Series: {} scores, normal={} flagged={}",
            series.points().len(), normal, flagged
        );
    }

    fn update_stats(&mut self, stats: &Stats, progress: &Progress) {
        let percent = progress.percent();
        // one line per 10% step is plenty for a terminal
        let bucket = percent / 10;
        if self.last_percent != Some(bucket) {
            self.last_percent = Some(bucket);
            log::info!(
                "Analyzing: {} / {} ({}%) - flagged {} ({:.1}%)",
                progress.processed,
                progress.total,
                percent,
                stats.flagged_count,
                progress.live_rate() * 100.0
            );
        }
    }

    fn alert_first_flag(&mut self, record: &ResultRecord) {
        log::warn!(
            "[FLAGGED] {} by {} ({:.2}) - {}",
            record.id,
            record.owner_key,
            record.amount,
            record.status_label()
        );
    }

    fn show_error(&mut self, error: &MonitorError) {
        log::error!("{}", error);
    }
}
