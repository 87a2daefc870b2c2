//! Core signal processing for the ECG risk monitor.
//!
//! This module contains:
//! - Fixed-capacity ring buffers
//! - Sample and beat stores for one session
//! - Rhythm irregularity estimation
//! - Risk scoring into a health assessment

pub mod rhythm;
pub mod ring;
pub mod risk;
pub mod store;

// Re-export commonly used types
pub use rhythm::{estimate, RhythmEstimate, RhythmSource};
pub use ring::RingBuffer;
pub use risk::{HealthAssessment, HealthLevel, RiskScorer, ScoreBreakdown};
pub use store::SignalStore;
