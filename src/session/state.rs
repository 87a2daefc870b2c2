//! Session state machine.
//!
//! ```text
//!                 connect                 timer / device BPM / "Complete"
//! Disconnected ───────────▶ Calibrating ─────────────────────────────────▶ Monitoring
//!      ▲                         │                                            │
//!      └─────────────────────────┴──────── disconnect / transport failure ◀───┘
//! ```
//!
//! Events that do not apply to the current state are ignored and produce no
//! transition.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Connection and validity state of a monitoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Disconnected,
    Calibrating,
    Monitoring,
}

impl SessionState {
    /// Whether scores are valid for display in this state.
    pub fn is_monitoring(&self) -> bool {
        matches!(self, SessionState::Monitoring)
    }

    pub fn is_connected(&self) -> bool {
        !matches!(self, SessionState::Disconnected)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Calibrating => "calibrating",
            SessionState::Monitoring => "monitoring",
        };
        f.write_str(name)
    }
}

/// What triggered a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    TransportOpened,
    CalibrationTimer,
    DeviceBeat,
    CalibrationComplete,
    DisconnectRequested,
    TransportFailure,
}

/// An applied state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
    pub cause: TransitionCause,
}

/// Owns the session state; the only code allowed to change it.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    state: SessionState,
    calibration_period: Duration,
    calibration_deadline: Option<Instant>,
}

impl SessionStateMachine {
    pub fn new(calibration_period: Duration) -> Self {
        Self {
            state: SessionState::Disconnected,
            calibration_period,
            calibration_deadline: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// When the calibration window ends, if calibrating.
    pub fn calibration_deadline(&self) -> Option<Instant> {
        self.calibration_deadline
    }

    /// Transport opened successfully at `now`.
    ///
    /// Reconnecting while connected restarts calibration.
    pub fn connect(&mut self, now: Instant) -> Option<Transition> {
        self.calibration_deadline = Some(now + self.calibration_period);
        self.apply(SessionState::Calibrating, TransitionCause::TransportOpened)
    }

    /// End calibration if its window has elapsed.
    pub fn poll_calibration(&mut self, now: Instant) -> Option<Transition> {
        match self.calibration_deadline {
            Some(deadline) if self.state == SessionState::Calibrating && now >= deadline => {
                self.finish_calibration(TransitionCause::CalibrationTimer)
            }
            _ => None,
        }
    }

    /// A device heart rate arrived.
    pub fn device_beat(&mut self) -> Option<Transition> {
        self.finish_calibration(TransitionCause::DeviceBeat)
    }

    /// The firmware reported calibration complete.
    pub fn calibration_complete(&mut self) -> Option<Transition> {
        self.finish_calibration(TransitionCause::CalibrationComplete)
    }

    /// Session ended, either on request or by transport failure.
    pub fn disconnect(&mut self, cause: TransitionCause) -> Option<Transition> {
        self.calibration_deadline = None;
        if self.state == SessionState::Disconnected {
            return None;
        }
        self.apply(SessionState::Disconnected, cause)
    }

    fn finish_calibration(&mut self, cause: TransitionCause) -> Option<Transition> {
        if self.state != SessionState::Calibrating {
            return None;
        }
        self.calibration_deadline = None;
        self.apply(SessionState::Monitoring, cause)
    }

    fn apply(&mut self, to: SessionState, cause: TransitionCause) -> Option<Transition> {
        let from = self.state;
        self.state = to;
        Some(Transition { from, to, cause })
    }
}
