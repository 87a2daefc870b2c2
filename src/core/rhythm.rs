//! Rhythm irregularity estimation.
//!
//! Prefers the irregularity figure the device computes itself. Without one,
//! falls back to the variability of the inter-beat intervals observed locally.

use crate::config::RhythmConfig;
use crate::core::store::SignalStore;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Where an irregularity figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmSource {
    Device,
    BeatIntervals,
}

/// Result of one estimation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RhythmEstimate {
    /// Irregularity in [0, 1]
    Irregularity { value: f64, source: RhythmSource },
    /// Not enough beats and no device figure
    InsufficientData,
}

impl RhythmEstimate {
    pub fn value(&self) -> Option<f64> {
        match self {
            RhythmEstimate::Irregularity { value, .. } => Some(*value),
            RhythmEstimate::InsufficientData => None,
        }
    }
}

/// Estimate rhythm irregularity from the current store contents.
pub fn estimate(store: &SignalStore, config: &RhythmConfig) -> RhythmEstimate {
    let history = store.device_irregularity();
    if !history.is_empty() {
        let value = history.recent(config.device_window.max(1)).mean();
        return RhythmEstimate::Irregularity {
            value: value.clamp(0.0, 1.0),
            source: RhythmSource::Device,
        };
    }

    let beats = store.beat_timestamps();
    if beats.len() < config.min_beats {
        return RhythmEstimate::InsufficientData;
    }

    let recent: Vec<_> = beats.recent(config.beat_window).copied().collect();
    let intervals_ms: Vec<f64> = recent
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_milliseconds() as f64)
        .collect();

    let cv = coefficient_of_variation(&intervals_ms);
    RhythmEstimate::Irregularity {
        value: (cv * config.irregularity_gain).clamp(0.0, 1.0),
        source: RhythmSource::BeatIntervals,
    }
}

/// Population standard deviation over mean; 0 for empty or zero-mean input.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mean = values.iter().mean();
    if mean == 0.0 || !mean.is_finite() {
        return 0.0;
    }

    let sd = values.iter().population_std_dev();
    if sd.is_finite() {
        sd / mean
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BufferConfig;
    use crate::stream::Reading;
    use chrono::{Duration, Utc};

    fn beat(irregularity: Option<f64>) -> Reading {
        Reading {
            lead_i: 0.0,
            lead_ii: 0.0,
            device_bpm: Some(70),
            device_irregularity: irregularity,
        }
    }

    fn store_with_intervals(intervals_ms: &[i64]) -> SignalStore {
        let mut store = SignalStore::new(&BufferConfig::default());
        let mut at = Utc::now();
        store.ingest(&beat(None), at);
        for &ms in intervals_ms {
            at += Duration::milliseconds(ms);
            store.ingest(&beat(None), at);
        }
        store
    }

    #[test]
    fn test_device_history_wins() {
        let mut store = SignalStore::new(&BufferConfig::default());
        let now = Utc::now();
        for v in [0.9, 0.9, 0.1, 0.2, 0.3, 0.4, 0.5] {
            store.ingest(&beat(Some(v)), now);
        }

        match estimate(&store, &RhythmConfig::default()) {
            RhythmEstimate::Irregularity { value, source } => {
                assert_eq!(source, RhythmSource::Device);
                // Mean of the last five only
                assert!((value - 0.3).abs() < 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_device_history_clamped() {
        let mut store = SignalStore::new(&BufferConfig::default());
        store.ingest(&beat(Some(4.0)), Utc::now());
        assert_eq!(estimate(&store, &RhythmConfig::default()).value(), Some(1.0));
    }

    #[test]
    fn test_insufficient_beats() {
        let store = store_with_intervals(&[800]);
        assert_eq!(
            estimate(&store, &RhythmConfig::default()),
            RhythmEstimate::InsufficientData
        );

        let empty = SignalStore::new(&BufferConfig::default());
        assert_eq!(
            estimate(&empty, &RhythmConfig::default()),
            RhythmEstimate::InsufficientData
        );
    }

    #[test]
    fn test_steady_rhythm_is_regular() {
        let store = store_with_intervals(&[800, 800, 800, 800]);
        match estimate(&store, &RhythmConfig::default()) {
            RhythmEstimate::Irregularity { value, source } => {
                assert_eq!(source, RhythmSource::BeatIntervals);
                assert_eq!(value, 0.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_variable_rhythm() {
        // Intervals 600 and 1000: mean 800, population sd 200, cv 0.25
        let store = store_with_intervals(&[600, 1000]);
        let value = estimate(&store, &RhythmConfig::default()).value().unwrap();
        assert!((value - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_very_irregular_rhythm_saturates() {
        let store = store_with_intervals(&[300, 1500, 400, 1600]);
        assert_eq!(estimate(&store, &RhythmConfig::default()).value(), Some(1.0));
    }

    #[test]
    fn test_only_recent_beats_considered() {
        // Wild early intervals fall outside the 8-beat window
        let mut intervals = vec![200, 2000, 150, 1800];
        intervals.extend([800; 7]);
        let store = store_with_intervals(&intervals);
        assert_eq!(estimate(&store, &RhythmConfig::default()).value(), Some(0.0));
    }

    #[test]
    fn test_coefficient_of_variation_edge_cases() {
        assert_eq!(coefficient_of_variation(&[]), 0.0);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), 0.0);
        assert_eq!(coefficient_of_variation(&[500.0]), 0.0);
    }
}
