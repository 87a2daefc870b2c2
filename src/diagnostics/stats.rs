//! Ingest statistics.
//!
//! Counts what the pipeline has processed so a session can be audited after
//! the fact. Dropped malformed lines are not counted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running counters for one process.
#[derive(Debug)]
pub struct IngestStats {
    /// Chunks read from the transport
    chunks_received: AtomicU64,
    /// Complete lines produced by the framer
    lines_framed: AtomicU64,
    /// Lines parsed into readings
    readings_accepted: AtomicU64,
    /// Calibration status lines
    status_lines: AtomicU64,
    /// Readings that carried a device beat
    beats_recorded: AtomicU64,
    /// Scoring passes completed
    assessments_computed: AtomicU64,
    /// Sessions opened
    sessions_started: AtomicU64,
    started_at: DateTime<Utc>,
}

impl IngestStats {
    pub fn new() -> Self {
        Self {
            chunks_received: AtomicU64::new(0),
            lines_framed: AtomicU64::new(0),
            readings_accepted: AtomicU64::new(0),
            status_lines: AtomicU64::new(0),
            beats_recorded: AtomicU64::new(0),
            assessments_computed: AtomicU64::new(0),
            sessions_started: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn record_chunk(&self) {
        self.chunks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lines(&self, count: u64) {
        self.lines_framed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_reading(&self, carried_beat: bool) {
        self.readings_accepted.fetch_add(1, Ordering::Relaxed);
        if carried_beat {
            self.beats_recorded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_status_line(&self) {
        self.status_lines.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_assessment(&self) {
        self.assessments_computed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            chunks_received: self.chunks_received.load(Ordering::Relaxed),
            lines_framed: self.lines_framed.load(Ordering::Relaxed),
            readings_accepted: self.readings_accepted.load(Ordering::Relaxed),
            status_lines: self.status_lines.load(Ordering::Relaxed),
            beats_recorded: self.beats_recorded.load(Ordering::Relaxed),
            assessments_computed: self.assessments_computed.load(Ordering::Relaxed),
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Ingest Statistics:\n\
             - Sessions started: {}\n\
             - Chunks received: {}\n\
             - Lines framed: {}\n\
             - Readings accepted: {}\n\
             - Beats recorded: {}\n\
             - Status lines: {}\n\
             - Assessments computed: {}\n\
             - Uptime: {} seconds",
            stats.sessions_started,
            stats.chunks_received,
            stats.lines_framed,
            stats.readings_accepted,
            stats.beats_recorded,
            stats.status_lines,
            stats.assessments_computed,
            stats.uptime_secs
        )
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.chunks_received.store(0, Ordering::Relaxed);
        self.lines_framed.store(0, Ordering::Relaxed);
        self.readings_accepted.store(0, Ordering::Relaxed);
        self.status_lines.store(0, Ordering::Relaxed);
        self.beats_recorded.store(0, Ordering::Relaxed);
        self.assessments_computed.store(0, Ordering::Relaxed);
        self.sessions_started.store(0, Ordering::Relaxed);
    }
}

impl Default for IngestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub chunks_received: u64,
    pub lines_framed: u64,
    pub readings_accepted: u64,
    pub status_lines: u64,
    pub beats_recorded: u64,
    pub assessments_computed: u64,
    pub sessions_started: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

/// Thread-safe shared statistics.
pub type SharedIngestStats = Arc<IngestStats>;

/// Create a new shared statistics handle.
pub fn create_shared_stats() -> SharedIngestStats {
    Arc::new(IngestStats::new())
}
