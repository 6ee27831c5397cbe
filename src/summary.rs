//! Per-case summary counters for reporting collaborators
//!
//! Summaries are always recomputed from the full case inputs; there is no
//! incremental update path.

use crate::activity::Activity;
use crate::anomaly::AnnotatedActivity;
use crate::flow::Transition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate counters for one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub case_id: String,
    pub activity_count: usize,
    /// Sum of activity durations (not the wall-clock span of the case)
    pub total_duration_seconds: f64,
    pub valid_transition_count: usize,
    /// Anomalous activities only; long waits are counted separately
    pub anomaly_count: usize,
    pub long_wait_count: usize,
}

impl fmt::Display for CaseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} activities, {:.1}s total, {} transitions, {} anomalies, {} long waits",
            self.case_id,
            self.activity_count,
            self.total_duration_seconds,
            self.valid_transition_count,
            self.anomaly_count,
            self.long_wait_count
        )
    }
}

impl CaseSummary {
    /// Share of activities flagged anomalous, in percent
    pub fn anomaly_rate(&self) -> f64 {
        if self.activity_count == 0 {
            return 0.0;
        }
        (self.anomaly_count as f64 / self.activity_count as f64) * 100.0
    }
}

/// Summarize one case from its activities, valid transitions and anomaly flags
///
/// Only anomalies belonging to `case_id` are counted, so the caller may pass
/// a flag list covering more than one case.
///
/// # Example
/// ```
/// use procflow::activity::{Activity, ActivityStatus};
/// use procflow::anomaly::evaluate_anomalies;
/// use procflow::config::FlowConfig;
/// use procflow::flow::reconstruct_case_flow;
/// use procflow::summary::summarize_case;
///
/// let activities = vec![
///     Activity::new("A", "C1", "A", Some(0), Some(10)),
///     Activity::new("B", "C1", "B", Some(12), Some(20)).with_status(ActivityStatus::Failed),
/// ];
/// let flow = reconstruct_case_flow("C1", &activities, &FlowConfig::default());
/// let anomalies = evaluate_anomalies(&flow.sequence, None);
///
/// let summary = summarize_case("C1", &flow.sequence, &flow.transitions, &anomalies);
/// assert_eq!(summary.activity_count, 2);
/// assert_eq!(summary.total_duration_seconds, 18.0);
/// assert_eq!(summary.valid_transition_count, 1);
/// assert_eq!(summary.anomaly_count, 1);
/// ```
pub fn summarize_case(
    case_id: &str,
    activities: &[Activity],
    transitions: &[Transition],
    anomalies: &[AnnotatedActivity],
) -> CaseSummary {
    let in_case: Vec<&Activity> = activities.iter().filter(|a| a.case_id == case_id).collect();

    CaseSummary {
        case_id: case_id.to_string(),
        activity_count: in_case.len(),
        total_duration_seconds: in_case.iter().map(|a| a.duration_seconds).sum(),
        valid_transition_count: transitions.len(),
        anomaly_count: anomalies
            .iter()
            .filter(|a| a.is_anomaly && a.activity.case_id == case_id)
            .count(),
        long_wait_count: transitions.iter().filter(|t| t.is_long_wait()).count(),
    }
}
