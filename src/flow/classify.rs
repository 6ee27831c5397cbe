// Latency buckets for transitions
//
// Bucket assignment depends on the gap alone. Each boundary belongs to the
// lower bucket: a gap of exactly 5s is `immediate`, exactly 30s `short-wait`.

use crate::config::FlowConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Latency classification of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    Immediate,
    ShortWait,
    LongWait,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Immediate => "immediate",
            Bucket::ShortWait => "short-wait",
            Bucket::LongWait => "long-wait",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bounds (inclusive) of the two lower buckets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketThresholds {
    pub immediate_max: f64,
    pub short_wait_max: f64,
}

impl Default for BucketThresholds {
    fn default() -> Self {
        Self {
            immediate_max: 5.0,
            short_wait_max: 30.0,
        }
    }
}

impl From<&FlowConfig> for BucketThresholds {
    fn from(config: &FlowConfig) -> Self {
        Self {
            immediate_max: config.immediate_max_seconds,
            short_wait_max: config.short_wait_max_seconds,
        }
    }
}

impl BucketThresholds {
    /// Classify a gap against these thresholds
    ///
    /// Total over `f64`: anything not at or below `short_wait_max`
    /// (including NaN) is `LongWait`.
    pub fn classify(&self, gap_seconds: f64) -> Bucket {
        if gap_seconds <= self.immediate_max {
            Bucket::Immediate
        } else if gap_seconds <= self.short_wait_max {
            Bucket::ShortWait
        } else {
            Bucket::LongWait
        }
    }
}

/// Classify a gap with the default thresholds (5s / 30s)
///
/// # Example
/// ```
/// use procflow::flow::{classify, Bucket};
///
/// assert_eq!(classify(5.0), Bucket::Immediate);
/// assert_eq!(classify(5.0001), Bucket::ShortWait);
/// assert_eq!(classify(30.0), Bucket::ShortWait);
/// assert_eq!(classify(30.0001), Bucket::LongWait);
/// ```
pub fn classify(gap_seconds: f64) -> Bucket {
    BucketThresholds::default().classify(gap_seconds)
}
