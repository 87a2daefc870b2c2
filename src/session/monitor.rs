//! The monitoring session context.
//!
//! `Monitor` owns every piece of per-session state: the signal store, the
//! device diagnostics, the state machine and the current assessment. The
//! async runtime shares it behind a lock; everything here is synchronous and
//! takes its clock values as arguments so it can be driven directly in tests.

use crate::config::Config;
use crate::core::{HealthAssessment, RiskScorer, SignalStore};
use crate::session::state::{SessionState, SessionStateMachine, Transition, TransitionCause};
use crate::stream::{parse_line, Record};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Most recent raw and parsed values, for diagnostic display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineDiagnostics {
    pub last_raw_line: Option<String>,
    pub last_bpm: Option<u32>,
    pub last_irregularity: Option<f64>,
    pub last_status: Option<String>,
}

/// What happened to one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Reading {
        beat: bool,
        transition: Option<Transition>,
    },
    Status {
        transition: Option<Transition>,
    },
    /// Malformed line, silently discarded
    Dropped,
}

/// Read-only snapshot handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveformFrame {
    pub state: SessionState,
    /// Lead I samples, oldest first
    pub lead_i: Vec<f64>,
    /// Lead II samples, oldest first
    pub lead_ii: Vec<f64>,
    pub assessment: HealthAssessment,
    pub captured_at: DateTime<Utc>,
}

impl WaveformFrame {
    /// Frame shown before any session has started.
    pub fn empty() -> Self {
        Self {
            state: SessionState::Disconnected,
            lead_i: Vec::new(),
            lead_ii: Vec::new(),
            assessment: HealthAssessment::insufficient_data(),
            captured_at: Utc::now(),
        }
    }
}

/// Per-session context for the ingestion and scoring pipeline.
#[derive(Debug)]
pub struct Monitor {
    store: SignalStore,
    scorer: RiskScorer,
    state: SessionStateMachine,
    assessment: HealthAssessment,
    diagnostics: LineDiagnostics,
}

impl Monitor {
    pub fn new(config: &Config) -> Self {
        Self {
            store: SignalStore::new(&config.buffers),
            scorer: RiskScorer::new(config.scoring.clone(), config.rhythm.clone()),
            state: SessionStateMachine::new(config.timing.calibration_period),
            assessment: HealthAssessment::insufficient_data(),
            diagnostics: LineDiagnostics::default(),
        }
    }

    /// Start a fresh session after the transport opened.
    pub fn begin_session(&mut self, now: Instant) -> Option<Transition> {
        self.clear();
        self.state.connect(now)
    }

    /// Tear the session down, discarding everything it collected.
    pub fn end_session(&mut self, cause: TransitionCause) -> Option<Transition> {
        self.clear();
        self.state.disconnect(cause)
    }

    /// Classify one framed line and apply it.
    pub fn handle_line(&mut self, line: &str, received_at: DateTime<Utc>) -> LineOutcome {
        self.diagnostics.last_raw_line = Some(line.to_string());

        match parse_line(line) {
            Some(Record::Status(status)) => {
                let transition = if status.completes_calibration {
                    self.state.calibration_complete()
                } else {
                    None
                };
                self.diagnostics.last_status = Some(status.text);
                LineOutcome::Status { transition }
            }
            Some(Record::Data(reading)) => {
                let beat = self.store.ingest(&reading, received_at);
                let mut transition = None;
                if let Some(bpm) = reading.device_bpm {
                    // Calibration-phase heart rates are trusted like any other
                    self.diagnostics.last_bpm = Some(bpm);
                    transition = self.state.device_beat();
                }
                if let Some(irregularity) = reading.device_irregularity {
                    self.diagnostics.last_irregularity = Some(irregularity);
                }
                LineOutcome::Reading { beat, transition }
            }
            None => LineOutcome::Dropped,
        }
    }

    /// End calibration if its window has elapsed.
    pub fn poll_calibration(&mut self, now: Instant) -> Option<Transition> {
        self.state.poll_calibration(now)
    }

    /// Recompute the assessment from current buffers and swap it in.
    pub fn rescore(&mut self) -> &HealthAssessment {
        self.assessment = self.scorer.assess(&self.store, self.diagnostics.last_bpm);
        &self.assessment
    }

    pub fn state(&self) -> SessionState {
        self.state.state()
    }

    pub fn calibration_deadline(&self) -> Option<Instant> {
        self.state.calibration_deadline()
    }

    /// Current assessment; only meaningful for display while monitoring.
    pub fn assessment(&self) -> &HealthAssessment {
        &self.assessment
    }

    pub fn is_assessment_valid(&self) -> bool {
        self.state().is_monitoring()
    }

    pub fn store(&self) -> &SignalStore {
        &self.store
    }

    pub fn diagnostics(&self) -> &LineDiagnostics {
        &self.diagnostics
    }

    /// Snapshot the buffers for drawing without mutating them.
    pub fn waveform_frame(&self, captured_at: DateTime<Utc>) -> WaveformFrame {
        WaveformFrame {
            state: self.state(),
            lead_i: self.store.lead_i().to_vec(),
            lead_ii: self.store.lead_ii().to_vec(),
            assessment: self.assessment.clone(),
            captured_at,
        }
    }

    fn clear(&mut self) {
        self.store.clear();
        self.assessment = HealthAssessment::insufficient_data();
        self.diagnostics = LineDiagnostics::default();
    }
}
