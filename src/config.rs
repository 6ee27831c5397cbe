// Configuration for flow reconstruction, classification and anomaly rules
//
// Every threshold here is a tunable default, not a calibrated constant.
// Deployments override them from a TOML file or from CLI flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Timestamp used to order an activity that has no recorded start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderingFallback {
    /// Planned start time from the scheduling system
    Scheduled,
    /// Completion time
    Complete,
    /// No fallback: activities without a start sort last
    None,
}

/// Configuration for the flow engine
///
/// # Example
/// ```
/// use procflow::config::FlowConfig;
///
/// let config = FlowConfig::default();
/// assert_eq!(config.min_gap_seconds, -5.0);
/// assert_eq!(config.max_gap_seconds, 300.0);
/// assert_eq!(config.anomaly_duration_threshold, 120.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Lower bound (inclusive) of the gap validity window, in seconds
    ///
    /// Negative values tolerate a small overlap between an activity and
    /// its successor. Pairs below this are not treated as a flow edge.
    pub min_gap_seconds: f64,

    /// Upper bound (inclusive) of the gap validity window, in seconds
    pub max_gap_seconds: f64,

    /// Largest gap still classified as `immediate`
    pub immediate_max_seconds: f64,

    /// Largest gap still classified as `short-wait`
    pub short_wait_max_seconds: f64,

    /// Activities running strictly longer than this are anomalous
    pub anomaly_duration_threshold: f64,

    /// Lower clamp for merged edge weight
    pub min_weight: f64,

    /// Upper clamp for merged edge weight
    pub max_weight: f64,

    /// Weight contributed per merged occurrence before clamping
    pub weight_per_count: f64,

    /// Ordering key for activities missing a start time
    pub ordering_fallback: OrderingFallback,

    /// Worker threads for multi-case analysis (0 = available parallelism)
    pub workers: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            min_gap_seconds: -5.0,
            max_gap_seconds: 300.0,
            immediate_max_seconds: 5.0,
            short_wait_max_seconds: 30.0,
            anomaly_duration_threshold: 120.0,
            min_weight: 2.0,
            max_weight: 12.0,
            weight_per_count: 1.0,
            ordering_fallback: OrderingFallback::Scheduled,
            workers: 0,
        }
    }
}

impl FlowConfig {
    /// Load a configuration from a TOML file
    ///
    /// Keys absent from the file keep their defaults. The result is
    /// validated before it is returned.
    ///
    /// # Example TOML
    /// ```toml
    /// max_gap_seconds = 600.0
    /// anomaly_duration_threshold = 90.0
    /// ordering_fallback = "complete"
    /// ```
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FlowConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML flow configuration")?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let all = [
            ("min_gap_seconds", self.min_gap_seconds),
            ("max_gap_seconds", self.max_gap_seconds),
            ("immediate_max_seconds", self.immediate_max_seconds),
            ("short_wait_max_seconds", self.short_wait_max_seconds),
            ("anomaly_duration_threshold", self.anomaly_duration_threshold),
            ("min_weight", self.min_weight),
            ("max_weight", self.max_weight),
            ("weight_per_count", self.weight_per_count),
        ];
        for (name, value) in all {
            if !value.is_finite() {
                return Err(format!("{} must be finite, got {}", name, value));
            }
        }

        if self.min_gap_seconds > self.max_gap_seconds {
            return Err(format!(
                "min_gap_seconds ({}) must not exceed max_gap_seconds ({})",
                self.min_gap_seconds, self.max_gap_seconds
            ));
        }

        if self.immediate_max_seconds > self.short_wait_max_seconds {
            return Err(format!(
                "immediate_max_seconds ({}) must not exceed short_wait_max_seconds ({})",
                self.immediate_max_seconds, self.short_wait_max_seconds
            ));
        }

        if self.anomaly_duration_threshold < 0.0 {
            return Err(format!(
                "anomaly_duration_threshold must be non-negative, got {}",
                self.anomaly_duration_threshold
            ));
        }

        if self.min_weight < 0.0 || self.min_weight > self.max_weight {
            return Err(format!(
                "weight clamp must satisfy 0 <= min_weight <= max_weight, got [{}, {}]",
                self.min_weight, self.max_weight
            ));
        }

        if self.weight_per_count <= 0.0 {
            return Err(format!(
                "weight_per_count must be positive, got {}",
                self.weight_per_count
            ));
        }

        Ok(())
    }

    /// Whether a gap lies inside the validity window (bounds inclusive)
    pub fn gap_in_window(&self, gap_seconds: f64) -> bool {
        gap_seconds >= self.min_gap_seconds && gap_seconds <= self.max_gap_seconds
    }
}
