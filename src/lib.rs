//! ECG Risk Monitor - real-time wearable ECG ingestion and risk screening.
//!
//! This library turns the line-oriented telemetry stream of a two-lead
//! wearable ECG into a bounded waveform buffer and a cardiac-risk screening
//! score recomputed once per second.
//!
//! # Screening, not diagnosis
//!
//! - **Heuristic**: the score combines heart-rate bands and rhythm variability
//!   with fixed weights that have no clinical calibration
//! - **In memory**: nothing a session collects outlives the session
//! - **Single device**: one transport feeds one session at a time
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ECG Risk Monitor                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Transport  │──▶│ Line Framer │──▶│   Parser    │       │
//! │  │ (115200 Bd) │   │   (bytes)   │   │ (readings)  │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                                             │               │
//! │                                             ▼               │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │ Risk Scorer │◀──│   Rhythm    │◀──│Signal Store │       │
//! │  │   (1 Hz)    │   │  Estimator  │   │(ring bufs)  │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         ▲                                                   │
//! │         └──────── gated by the session state machine        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use ecg_risk_monitor::{transport::DeviceTransport, Config, MonitorSession};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = DeviceTransport::new("/dev/ttyUSB0");
//! let mut session = MonitorSession::new(Config::default(), transport);
//!
//! session.connect().await?;
//! let mut assessments = session.subscribe_assessments();
//! assessments.changed().await?;
//! println!("score: {}", assessments.borrow().score);
//! session.disconnect().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod diagnostics;
pub mod session;
pub mod stream;
pub mod transport;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use crate::core::{
    HealthAssessment, HealthLevel, RiskScorer, RingBuffer, ScoreBreakdown, SignalStore,
};
pub use diagnostics::{IngestStats, SharedIngestStats};
pub use session::{Monitor, MonitorSession, SessionState, WaveformFrame};
pub use stream::{parse_line, LineFramer, Reading, Record};
pub use transport::{Transport, TransportError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Disclaimer shown to users before scores are displayed.
pub const SCREENING_DISCLAIMER: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║              ECG RISK MONITOR - SCREENING DISCLAIMER              ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  The risk score is a screening heuristic, NOT A DIAGNOSIS.       ║
║                                                                  ║
║  ✓ WHAT THE SCORE CONSIDERS:                                     ║
║    • Heart rate reported by the wearable                         ║
║    • Beat-to-beat rhythm variability                             ║
║    • Irregularity reported by the wearable                       ║
║                                                                  ║
║  ✗ WHAT IT CANNOT DO:                                            ║
║    • Detect specific arrhythmias or ischemia                     ║
║    • Replace a 12-lead ECG or a clinician's review               ║
║    • Account for medication, activity or posture                 ║
║                                                                  ║
║  Scores are only meaningful once calibration has finished.       ║
║  Nothing is stored: all data is discarded on disconnect.         ║
║                                                                  ║
║  If you feel unwell, contact a medical professional.             ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
