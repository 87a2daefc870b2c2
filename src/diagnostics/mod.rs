//! Diagnostics for the ECG risk monitor.
//!
//! Exposes counters describing what the pipeline has ingested.

pub mod stats;

pub use stats::{create_shared_stats, IngestStats, SharedIngestStats, StatsSnapshot};
