// Flow reconstruction from temporal adjacency
//
// Upstream systems carry no control-flow metadata, so an edge is inferred
// between every pair of time-adjacent activities in a case, provided the
// wait between them falls inside the configured validity window. Pairs
// outside the window are parallel or unrelated work sharing a case id.

use crate::activity::{micros_to_secs, Activity};
use crate::config::FlowConfig;
use crate::flow::classify::{Bucket, BucketThresholds};
use crate::normalize::normalize_case;
use serde::{Deserialize, Serialize};

/// A directed edge between two consecutive activities of one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from_activity_id: String,
    pub to_activity_id: String,
    pub from_activity_name: String,
    pub to_activity_name: String,
    /// `start(next) - complete(previous)`; negative when they overlap
    pub gap_seconds: f64,
    pub bucket: Bucket,
}

impl Transition {
    /// Long waits are flagged for review, separately from activity anomalies
    pub fn is_long_wait(&self) -> bool {
        self.bucket == Bucket::LongWait
    }
}

/// Adjacent pairs that did not become transitions, by reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedEdges {
    /// Previous activity had no completion or next had no start
    pub missing_timestamp: usize,
    /// Gap fell outside the validity window
    pub out_of_window: usize,
}

impl DroppedEdges {
    pub fn total(&self) -> usize {
        self.missing_timestamp + self.out_of_window
    }
}

/// Reconstructed flow of a single case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseFlow {
    pub case_id: String,
    pub sequence: Vec<Activity>,
    pub transitions: Vec<Transition>,
    pub dropped: DroppedEdges,
}

/// Gap in seconds between `prev` completing and `next` starting
///
/// `None` when either timestamp is missing; no gap is ever fabricated.
pub fn gap_seconds(prev: &Activity, next: &Activity) -> Option<f64> {
    let complete = prev.complete_us?;
    let start = next.start_us?;
    Some(micros_to_secs(start.saturating_sub(complete)))
}

/// Normalize a case's activities and reconstruct its transitions
///
/// An unknown `case_id` yields an empty flow, not an error.
///
/// # Example
/// ```
/// use procflow::activity::Activity;
/// use procflow::config::FlowConfig;
/// use procflow::flow::{reconstruct_case_flow, Bucket};
///
/// let activities = vec![
///     Activity::new("A", "C1", "A", Some(0), Some(10)),
///     Activity::new("B", "C1", "B", Some(12), Some(20)),
///     Activity::new("C", "C1", "C", Some(100), Some(110)),
/// ];
///
/// let flow = reconstruct_case_flow("C1", &activities, &FlowConfig::default());
/// assert_eq!(flow.transitions.len(), 2);
/// assert_eq!(flow.transitions[0].gap_seconds, 2.0);
/// assert_eq!(flow.transitions[0].bucket, Bucket::Immediate);
/// assert_eq!(flow.transitions[1].gap_seconds, 80.0);
/// assert_eq!(flow.transitions[1].bucket, Bucket::LongWait);
/// ```
pub fn reconstruct_case_flow(
    case_id: &str,
    activities: &[Activity],
    config: &FlowConfig,
) -> CaseFlow {
    let sequence = normalize_case(activities, case_id, config.ordering_fallback);
    let (transitions, dropped) = reconstruct_transitions(&sequence, config);

    tracing::debug!(
        case_id,
        activities = sequence.len(),
        transitions = transitions.len(),
        missing_timestamp = dropped.missing_timestamp,
        out_of_window = dropped.out_of_window,
        "reconstructed case flow"
    );

    CaseFlow {
        case_id: case_id.to_string(),
        sequence,
        transitions,
        dropped,
    }
}

/// Derive the transitions of an already-ordered sequence
pub fn reconstruct_transitions(
    sequence: &[Activity],
    config: &FlowConfig,
) -> (Vec<Transition>, DroppedEdges) {
    let thresholds = BucketThresholds::from(config);
    let mut transitions = Vec::with_capacity(sequence.len().saturating_sub(1));
    let mut dropped = DroppedEdges::default();

    for pair in sequence.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);

        let Some(gap) = gap_seconds(prev, next) else {
            tracing::trace!(from = %prev.id, to = %next.id, "skipping pair without timestamps");
            dropped.missing_timestamp += 1;
            continue;
        };

        if !config.gap_in_window(gap) {
            tracing::trace!(from = %prev.id, to = %next.id, gap, "gap outside validity window");
            dropped.out_of_window += 1;
            continue;
        }

        transitions.push(Transition {
            from_activity_id: prev.id.clone(),
            to_activity_id: next.id.clone(),
            from_activity_name: prev.activity_name.clone(),
            to_activity_name: next.activity_name.clone(),
            gap_seconds: gap,
            bucket: thresholds.classify(gap),
        });
    }

    (transitions, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::parse_timestamp;

    #[test]
    fn test_gap_requires_both_timestamps() {
        let a = Activity::new("a", "C1", "A", Some(0), None);
        let b = Activity::new("b", "C1", "B", Some(5), Some(6));
        assert_eq!(gap_seconds(&a, &b), None);
        assert_eq!(gap_seconds(&b, &a), Some(-6.0));
    }

    #[test]
    fn test_overlap_within_window_is_kept() {
        let seq = vec![
            Activity::new("a", "C1", "A", Some(0), Some(10)),
            Activity::new("b", "C1", "B", Some(7), Some(20)),
        ];
        let (transitions, dropped) = reconstruct_transitions(&seq, &FlowConfig::default());
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].gap_seconds, -3.0);
        assert_eq!(transitions[0].bucket, Bucket::Immediate);
        assert_eq!(dropped.total(), 0);
    }

    #[test]
    fn test_out_of_window_gaps_are_dropped() {
        let seq = vec![
            Activity::new("a", "C1", "A", Some(0), Some(100)),
            Activity::new("b", "C1", "B", Some(50), Some(60)),
            Activity::new("c", "C1", "C", Some(400), Some(410)),
        ];
        let (transitions, dropped) = reconstruct_transitions(&seq, &FlowConfig::default());
        // a->b: -50s, b->c: 340s
        assert!(transitions.is_empty());
        assert_eq!(dropped.out_of_window, 2);
    }

    #[test]
    fn test_window_edges_inclusive() {
        let seq = vec![
            Activity::new("a", "C1", "A", Some(0), Some(10)),
            Activity::new("b", "C1", "B", Some(5), Some(6)),
            Activity::new("c", "C1", "C", Some(306), Some(310)),
        ];
        let (transitions, _) = reconstruct_transitions(&seq, &FlowConfig::default());
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0].gap_seconds, -5.0);
        assert_eq!(transitions[1].gap_seconds, 300.0);
    }

    #[test]
    fn test_sub_millisecond_gap_crosses_bucket_boundary() {
        let at = |value: &str| parse_timestamp(value).unwrap();
        let mut prev = Activity::new("a", "C1", "A", None, None);
        prev.start_us = at("2024-03-01T10:00:00Z");
        prev.complete_us = at("2024-03-01T10:00:10Z");
        let mut on_edge = Activity::new("b", "C1", "B", None, None);
        on_edge.start_us = at("2024-03-01T10:00:15Z");
        let mut past_edge = Activity::new("c", "C1", "C", None, None);
        past_edge.start_us = at("2024-03-01T10:00:15.0001Z");

        let config = FlowConfig::default();
        let (edge, _) = reconstruct_transitions(&[prev.clone(), on_edge], &config);
        let (past, _) = reconstruct_transitions(&[prev, past_edge], &config);

        assert_eq!(edge[0].gap_seconds, 5.0);
        assert_eq!(edge[0].bucket, Bucket::Immediate);
        assert!(past[0].gap_seconds > 5.0);
        assert_eq!(past[0].bucket, Bucket::ShortWait);
    }

    #[test]
    fn test_transition_carries_names() {
        let seq = vec![
            Activity::new("1", "C1", "/press/stamp", Some(0), Some(1)),
            Activity::new("2", "C1", "/weld/robot_3", Some(2), Some(3)),
        ];
        let (transitions, _) = reconstruct_transitions(&seq, &FlowConfig::default());
        assert_eq!(transitions[0].from_activity_name, "/press/stamp");
        assert_eq!(transitions[0].to_activity_name, "/weld/robot_3");
    }
}
