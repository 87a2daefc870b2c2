//! Configuration for the ECG risk monitor.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Baud rate the wearable's serial bridge is opened at.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Main configuration for the monitor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transport: TransportConfig,
    pub buffers: BufferConfig,
    pub rhythm: RhythmConfig,
    pub scoring: ScoringConfig,
    pub timing: TimingConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ecg-risk-monitor")
            .join("config.json")
    }

    /// Reject values that would stall or break the pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.buffers;
        if b.lead_capacity == 0 || b.beat_capacity == 0 || b.irregularity_capacity == 0 {
            return Err(ConfigError::Invalid(
                "buffer capacities must be non-zero".to_string(),
            ));
        }
        if self.rhythm.min_beats < 2 {
            return Err(ConfigError::Invalid(
                "rhythm.min_beats must be at least 2 to form an interval".to_string(),
            ));
        }
        let gain = self.rhythm.irregularity_gain;
        if !gain.is_finite() || gain <= 0.0 {
            return Err(ConfigError::Invalid(
                "rhythm.irregularity_gain must be positive".to_string(),
            ));
        }
        let t = &self.timing;
        if t.scoring_interval.is_zero() || t.render_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "timing intervals must be non-zero".to_string(),
            ));
        }
        if t.read_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "timing.read_chunk_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where and how to open the device stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Character device (or file) the ECG bridge is exposed as
    pub device_path: Option<PathBuf>,
    pub baud_rate: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            device_path: None,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Ring buffer capacities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Samples kept per lead (1500 ≈ 12 s at 125 Hz)
    pub lead_capacity: usize,
    pub beat_capacity: usize,
    pub irregularity_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            lead_capacity: 1500,
            beat_capacity: 50,
            irregularity_capacity: 10,
        }
    }
}

/// Rhythm estimator heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmConfig {
    /// How many recent device irregularity values are averaged
    pub device_window: usize,
    /// How many recent beats feed the interval variability
    pub beat_window: usize,
    /// Fewer beats than this means there is not enough data
    pub min_beats: usize,
    /// Maps coefficient of variation to irregularity (3.0 → 33% CV saturates)
    pub irregularity_gain: f64,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            device_window: 5,
            beat_window: 8,
            min_beats: 3,
            irregularity_gain: 3.0,
        }
    }
}

/// Score weights and heart-rate bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Heart rate assumed when the device has not reported one yet
    pub default_heart_rate: u32,
    pub severe_brady_below: u32,
    pub mild_brady_below: u32,
    pub mild_tachy_above: u32,
    pub severe_tachy_above: u32,
    pub severe_rate_points: u8,
    pub mild_rate_points: u8,
    pub irregularity_weight: u8,
    pub high_threshold: u8,
    pub moderate_threshold: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_heart_rate: 70,
            severe_brady_below: 50,
            mild_brady_below: 60,
            mild_tachy_above: 100,
            severe_tachy_above: 120,
            severe_rate_points: 40,
            mild_rate_points: 20,
            irregularity_weight: 40,
            high_threshold: 70,
            moderate_threshold: 35,
        }
    }
}

/// Cadences of the session tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    #[serde(with = "duration_ms")]
    pub calibration_period: Duration,
    #[serde(with = "duration_ms")]
    pub scoring_interval: Duration,
    #[serde(with = "duration_ms")]
    pub render_interval: Duration,
    /// Bytes requested from the transport per read
    pub read_chunk_size: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            calibration_period: Duration::from_secs(4),
            scoring_interval: Duration::from_secs(1),
            render_interval: Duration::from_millis(33),
            read_chunk_size: 1024,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration as whole milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
