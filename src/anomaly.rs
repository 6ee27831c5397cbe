//! Threshold-based anomaly flags for activities and transitions
//!
//! An activity is anomalous when it failed or ran strictly longer than the
//! duration threshold. Long-wait transitions get a separate, informational
//! flag; the two are never counted together.

use crate::activity::{Activity, ActivityStatus};
use crate::flow::Transition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default duration threshold in seconds
pub const DEFAULT_DURATION_THRESHOLD: f64 = 120.0;

/// Severity level for prioritizing flags
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        };
        f.write_str(label)
    }
}

/// Why an activity was flagged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyReason {
    /// The activity finished with `failed` status
    Failed,
    /// The activity ran longer than the threshold
    ExcessiveDuration { duration_seconds: f64, threshold_seconds: f64 },
}

impl AnomalyReason {
    pub fn severity(&self) -> Severity {
        match self {
            AnomalyReason::Failed => Severity::High,
            AnomalyReason::ExcessiveDuration { .. } => Severity::Medium,
        }
    }
}

/// An activity with its derived anomaly flag
///
/// The wrapped activity is never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedActivity {
    pub activity: Activity,
    pub is_anomaly: bool,
    pub reasons: Vec<AnomalyReason>,
}

impl AnnotatedActivity {
    /// Highest severity among the reasons, if flagged
    pub fn severity(&self) -> Option<Severity> {
        self.reasons.iter().map(AnomalyReason::severity).max()
    }

    pub fn to_report_string(&self) -> String {
        let reasons: Vec<String> = self
            .reasons
            .iter()
            .map(|r| match r {
                AnomalyReason::Failed => "status failed".to_string(),
                AnomalyReason::ExcessiveDuration {
                    duration_seconds,
                    threshold_seconds,
                } => format!("duration {:.1}s > {:.1}s", duration_seconds, threshold_seconds),
            })
            .collect();
        format!(
            "[{}] {} ({}) on {}: {}",
            self.severity().unwrap_or(Severity::Low),
            self.activity.activity_name,
            self.activity.id,
            if self.activity.resource.is_empty() {
                "-"
            } else {
                self.activity.resource.as_str()
            },
            reasons.join(", ")
        )
    }
}

/// Informational flag for a long-wait transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionFlag {
    pub from_activity_id: String,
    pub to_activity_id: String,
    pub gap_seconds: f64,
    pub severity: Severity,
}

/// Reasons an activity is anomalous under `threshold_seconds`
pub fn anomaly_reasons(activity: &Activity, threshold_seconds: f64) -> Vec<AnomalyReason> {
    let mut reasons = Vec::new();
    if activity.status == ActivityStatus::Failed {
        reasons.push(AnomalyReason::Failed);
    }
    if activity.duration_seconds > threshold_seconds {
        reasons.push(AnomalyReason::ExcessiveDuration {
            duration_seconds: activity.duration_seconds,
            threshold_seconds,
        });
    }
    reasons
}

/// `status == failed || duration > threshold` (strict)
pub fn is_anomalous(activity: &Activity, threshold_seconds: f64) -> bool {
    activity.status == ActivityStatus::Failed || activity.duration_seconds > threshold_seconds
}

/// Annotate each activity with its anomaly flag
///
/// `threshold_seconds` defaults to [`DEFAULT_DURATION_THRESHOLD`]. Output
/// order matches input order.
///
/// # Example
/// ```
/// use procflow::activity::{Activity, ActivityStatus};
/// use procflow::anomaly::evaluate_anomalies;
///
/// let activities = vec![
///     Activity::new("a", "C1", "A", Some(0), Some(10)).with_status(ActivityStatus::Failed),
///     Activity::new("b", "C1", "B", Some(0), Some(121)),
///     Activity::new("c", "C1", "C", Some(0), Some(120)),
/// ];
///
/// let flags: Vec<bool> = evaluate_anomalies(&activities, None)
///     .iter()
///     .map(|a| a.is_anomaly)
///     .collect();
/// assert_eq!(flags, vec![true, true, false]);
/// ```
pub fn evaluate_anomalies(
    activities: &[Activity],
    threshold_seconds: Option<f64>,
) -> Vec<AnnotatedActivity> {
    let threshold = threshold_seconds.unwrap_or(DEFAULT_DURATION_THRESHOLD);
    activities
        .iter()
        .map(|activity| {
            let reasons = anomaly_reasons(activity, threshold);
            AnnotatedActivity {
                activity: activity.clone(),
                is_anomaly: !reasons.is_empty(),
                reasons,
            }
        })
        .collect()
}

/// Flag every long-wait transition
pub fn flag_transitions(transitions: &[Transition]) -> Vec<TransitionFlag> {
    transitions
        .iter()
        .filter(|t| t.is_long_wait())
        .map(|t| TransitionFlag {
            from_activity_id: t.from_activity_id.clone(),
            to_activity_id: t.to_activity_id.clone(),
            gap_seconds: t.gap_seconds,
            severity: Severity::Low,
        })
        .collect()
}
