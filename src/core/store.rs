//! Sample and beat stores.
//!
//! Holds the recent waveform for both leads plus the beat timeline and the
//! device-reported irregularity history. `ingest` is the only mutation path
//! for these buffers besides `clear` at session boundaries.

use crate::config::BufferConfig;
use crate::core::ring::RingBuffer;
use crate::stream::Reading;
use chrono::{DateTime, Utc};

/// Ring buffers for one monitoring session.
#[derive(Debug, Clone)]
pub struct SignalStore {
    lead_i: RingBuffer<f64>,
    lead_ii: RingBuffer<f64>,
    beat_timestamps: RingBuffer<DateTime<Utc>>,
    device_irregularity: RingBuffer<f64>,
}

impl SignalStore {
    pub fn new(config: &BufferConfig) -> Self {
        Self {
            lead_i: RingBuffer::new(config.lead_capacity),
            lead_ii: RingBuffer::new(config.lead_capacity),
            beat_timestamps: RingBuffer::new(config.beat_capacity),
            device_irregularity: RingBuffer::new(config.irregularity_capacity),
        }
    }

    /// Record one reading received at wall-clock time `received_at`.
    ///
    /// Returns true if the reading carried a beat.
    pub fn ingest(&mut self, reading: &Reading, received_at: DateTime<Utc>) -> bool {
        self.lead_ii.push(reading.lead_ii);
        self.lead_i.push(reading.lead_i);

        if reading.device_bpm.is_none() {
            return false;
        }

        // Keep the beat timeline non-decreasing if the wall clock steps back
        let at = match self.beat_timestamps.last() {
            Some(&last) if received_at < last => last,
            _ => received_at,
        };
        self.beat_timestamps.push(at);

        if let Some(irregularity) = reading.device_irregularity {
            self.device_irregularity.push(irregularity);
        }
        true
    }

    /// Empty every buffer.
    pub fn clear(&mut self) {
        self.lead_i.clear();
        self.lead_ii.clear();
        self.beat_timestamps.clear();
        self.device_irregularity.clear();
    }

    pub fn lead_i(&self) -> &RingBuffer<f64> {
        &self.lead_i
    }

    pub fn lead_ii(&self) -> &RingBuffer<f64> {
        &self.lead_ii
    }

    pub fn beat_timestamps(&self) -> &RingBuffer<DateTime<Utc>> {
        &self.beat_timestamps
    }

    pub fn device_irregularity(&self) -> &RingBuffer<f64> {
        &self.device_irregularity
    }

    /// True when all four buffers are empty.
    pub fn is_empty(&self) -> bool {
        self.lead_i.is_empty()
            && self.lead_ii.is_empty()
            && self.beat_timestamps.is_empty()
            && self.device_irregularity.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reading(bpm: Option<u32>, irregularity: Option<f64>) -> Reading {
        Reading {
            lead_i: 0.1,
            lead_ii: 0.2,
            device_bpm: bpm,
            device_irregularity: irregularity,
        }
    }

    #[test]
    fn test_samples_always_recorded() {
        let mut store = SignalStore::new(&BufferConfig::default());
        let now = Utc::now();

        assert!(!store.ingest(&reading(None, None), now));
        assert_eq!(store.lead_i().to_vec(), vec![0.1]);
        assert_eq!(store.lead_ii().to_vec(), vec![0.2]);
        assert!(store.beat_timestamps().is_empty());
    }

    #[test]
    fn test_beats_and_irregularity() {
        let mut store = SignalStore::new(&BufferConfig::default());
        let now = Utc::now();

        assert!(store.ingest(&reading(Some(72), Some(0.05)), now));
        assert!(store.ingest(&reading(Some(74), None), now + Duration::milliseconds(800)));

        assert_eq!(store.beat_timestamps().len(), 2);
        assert_eq!(store.device_irregularity().to_vec(), vec![0.05]);
    }

    #[test]
    fn test_irregularity_without_bpm_is_ignored() {
        let mut store = SignalStore::new(&BufferConfig::default());
        store.ingest(&reading(None, Some(0.4)), Utc::now());
        assert!(store.device_irregularity().is_empty());
    }

    #[test]
    fn test_beat_timestamps_non_decreasing() {
        let mut store = SignalStore::new(&BufferConfig::default());
        let now = Utc::now();

        store.ingest(&reading(Some(70), None), now);
        store.ingest(&reading(Some(70), None), now - Duration::seconds(5));

        let beats = store.beat_timestamps().to_vec();
        assert!(beats.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_capacities_respected() {
        let config = BufferConfig {
            lead_capacity: 10,
            beat_capacity: 4,
            irregularity_capacity: 2,
        };
        let mut store = SignalStore::new(&config);
        let start = Utc::now();
        for i in 0..25 {
            store.ingest(
                &reading(Some(60), Some(0.1)),
                start + Duration::milliseconds(i * 1000),
            );
        }

        assert_eq!(store.lead_i().len(), 10);
        assert_eq!(store.lead_ii().len(), 10);
        assert_eq!(store.beat_timestamps().len(), 4);
        assert_eq!(store.device_irregularity().len(), 2);

        store.clear();
        assert!(store.is_empty());
    }
}
