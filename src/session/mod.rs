//! Session handling for the ECG risk monitor.
//!
//! This module contains:
//! - The Disconnected / Calibrating / Monitoring state machine
//! - The per-session monitor context that owns all buffers
//! - The async runtime that connects a transport to the pipeline

pub mod monitor;
pub mod runtime;
pub mod state;

pub use monitor::{LineDiagnostics, LineOutcome, Monitor, WaveformFrame};
pub use runtime::{MonitorSession, SharedMonitor};
pub use state::{SessionState, SessionStateMachine, Transition, TransitionCause};
