//! Cardiac-risk screening score.
//!
//! Combines the heart rate and the rhythm irregularity into a 0-100 score with
//! a per-component breakdown. This is a screening heuristic, not a diagnosis:
//! the rate bands and weights come from `ScoringConfig` and have no clinical
//! calibration behind them.

use crate::config::{RhythmConfig, ScoringConfig};
use crate::core::rhythm::{self, RhythmEstimate, RhythmSource};
use crate::core::store::SignalStore;
use serde::{Deserialize, Serialize};

/// Risk category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthLevel {
    InsufficientData,
    Normal,
    Moderate,
    High,
}

impl HealthLevel {
    /// Fixed human-readable description for this category.
    pub fn description(&self) -> &'static str {
        match self {
            HealthLevel::InsufficientData => "Collecting heartbeat data - keep the sensor in place",
            HealthLevel::Normal => "Heart rate and rhythm within the normal screening range",
            HealthLevel::Moderate => {
                "Some rate or rhythm deviation detected - keep monitoring"
            }
            HealthLevel::High => {
                "Marked rate or rhythm deviation - consider a medical check-up"
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthLevel::InsufficientData => "insufficient data",
            HealthLevel::Normal => "normal",
            HealthLevel::Moderate => "moderate",
            HealthLevel::High => "high",
        }
    }
}

impl std::fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Points contributed by each component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub brady_points: u8,
    pub tachy_points: u8,
    pub irregularity_points: u8,
}

impl ScoreBreakdown {
    /// Sum before clamping.
    pub fn total(&self) -> u32 {
        self.brady_points as u32 + self.tachy_points as u32 + self.irregularity_points as u32
    }
}

/// One complete scoring result. Replaced as a whole, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub level: HealthLevel,
    pub score: u8,
    pub description: String,
    pub breakdown: ScoreBreakdown,
    /// Heart rate the score was computed with
    pub heart_rate: Option<u32>,
    /// Irregularity the score was computed with
    pub irregularity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rhythm_source: Option<RhythmSource>,
}

impl HealthAssessment {
    /// The state before enough beats have been seen.
    pub fn insufficient_data() -> Self {
        Self {
            level: HealthLevel::InsufficientData,
            score: 0,
            description: HealthLevel::InsufficientData.description().to_string(),
            breakdown: ScoreBreakdown::default(),
            heart_rate: None,
            irregularity: None,
            rhythm_source: None,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        self.level == HealthLevel::InsufficientData
    }
}

impl Default for HealthAssessment {
    fn default() -> Self {
        Self::insufficient_data()
    }
}

/// Computes health assessments from buffer state.
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    scoring: ScoringConfig,
    rhythm: RhythmConfig,
}

impl RiskScorer {
    pub fn new(scoring: ScoringConfig, rhythm: RhythmConfig) -> Self {
        Self { scoring, rhythm }
    }

    /// Assess the current store contents.
    ///
    /// `latest_bpm` is the most recent device heart rate of the session.
    pub fn assess(&self, store: &SignalStore, latest_bpm: Option<u32>) -> HealthAssessment {
        match rhythm::estimate(store, &self.rhythm) {
            RhythmEstimate::InsufficientData => HealthAssessment::insufficient_data(),
            RhythmEstimate::Irregularity { value, source } => {
                let hr = latest_bpm.unwrap_or(self.scoring.default_heart_rate);
                let mut assessment = self.score(hr, value);
                assessment.rhythm_source = Some(source);
                assessment
            }
        }
    }

    /// Score a heart rate and an irregularity in [0, 1].
    pub fn score(&self, heart_rate: u32, irregularity: f64) -> HealthAssessment {
        let cfg = &self.scoring;
        let irregularity = if irregularity.is_finite() {
            irregularity.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let brady_points = if heart_rate < cfg.severe_brady_below {
            cfg.severe_rate_points
        } else if heart_rate < cfg.mild_brady_below {
            cfg.mild_rate_points
        } else {
            0
        };

        let tachy_points = if heart_rate > cfg.severe_tachy_above {
            cfg.severe_rate_points
        } else if heart_rate > cfg.mild_tachy_above {
            cfg.mild_rate_points
        } else {
            0
        };

        let irregularity_points = (irregularity * cfg.irregularity_weight as f64).round() as u8;

        let breakdown = ScoreBreakdown {
            brady_points,
            tachy_points,
            irregularity_points,
        };
        let score = breakdown.total().min(100) as u8;

        let level = if score >= cfg.high_threshold {
            HealthLevel::High
        } else if score >= cfg.moderate_threshold {
            HealthLevel::Moderate
        } else {
            HealthLevel::Normal
        };

        HealthAssessment {
            level,
            score,
            description: level.description().to_string(),
            breakdown,
            heart_rate: Some(heart_rate),
            irregularity: Some(irregularity),
            rhythm_source: None,
        }
    }
}
