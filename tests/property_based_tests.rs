//! Property-based tests for the flow engine
//!
//! Properties covered:
//! 1. Transition count never exceeds activity count - 1
//! 2. Bucket classification is total and monotonic
//! 3. Reconstruction is idempotent and independent of input order of other cases
//! 4. Merged edge weight is monotonic in count and bounded
//! 5. Anomaly flag matches the status/duration rule exactly

use procflow::activity::{Activity, ActivityStatus};
use procflow::anomaly::evaluate_anomalies;
use procflow::config::FlowConfig;
use procflow::flow::{classify, edge_weight, reconstruct_case_flow, Bucket};
use proptest::prelude::*;

fn arb_activity(case: &'static str) -> impl Strategy<Value = Activity> {
    (
        proptest::option::weighted(0.9, 0i64..2_000),
        proptest::option::weighted(0.9, 0i64..400),
        0usize..5,
    )
        .prop_map(move |(start, len, name)| {
            let complete = match (start, len) {
                (Some(s), Some(l)) => Some(s + l),
                (None, Some(l)) => Some(l),
                _ => None,
            };
            Activity::new("", case, format!("step_{}", name), start, complete)
        })
}

fn with_ids(mut activities: Vec<Activity>) -> Vec<Activity> {
    for (i, a) in activities.iter_mut().enumerate() {
        a.id = format!("{}-{}", a.case_id, i);
    }
    activities
}

fn bucket_rank(bucket: Bucket) -> u8 {
    match bucket {
        Bucket::Immediate => 0,
        Bucket::ShortWait => 1,
        Bucket::LongWait => 2,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_transition_count_bounded(
        activities in prop::collection::vec(arb_activity("C1"), 0..30),
    ) {
        let activities = with_ids(activities);
        let flow = reconstruct_case_flow("C1", &activities, &FlowConfig::default());

        prop_assert_eq!(flow.sequence.len(), activities.len());
        let max_edges = activities.len().saturating_sub(1);
        prop_assert!(flow.transitions.len() <= max_edges);
        prop_assert_eq!(flow.transitions.len() + flow.dropped.total(), max_edges);
        for t in &flow.transitions {
            prop_assert!((-5.0..=300.0).contains(&t.gap_seconds));
        }
    }

    #[test]
    fn prop_classify_monotonic(a in -1_000.0f64..1_000.0, b in -1_000.0f64..1_000.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(bucket_rank(classify(lo)) <= bucket_rank(classify(hi)));
    }

    #[test]
    fn prop_classify_matches_thresholds(gap in -1_000.0f64..1_000.0) {
        let expected = if gap <= 5.0 {
            Bucket::Immediate
        } else if gap <= 30.0 {
            Bucket::ShortWait
        } else {
            Bucket::LongWait
        };
        prop_assert_eq!(classify(gap), expected);
    }

    #[test]
    fn prop_reconstruction_idempotent(
        c1 in prop::collection::vec(arb_activity("C1"), 0..15),
        c2 in prop::collection::vec(arb_activity("C2"), 0..15),
    ) {
        let config = FlowConfig::default();
        let mut mixed = c1.clone();
        mixed.extend(c2.clone());
        let mixed = with_ids(mixed);

        let first = reconstruct_case_flow("C1", &mixed, &config);
        let second = reconstruct_case_flow("C1", &mixed, &config);
        prop_assert_eq!(&first, &second);

        // other cases placed ahead of C1 do not change C1's flow
        let mut reordered: Vec<Activity> =
            mixed.iter().filter(|a| a.case_id == "C2").cloned().collect();
        reordered.extend(mixed.iter().filter(|a| a.case_id == "C1").cloned());
        let third = reconstruct_case_flow("C1", &reordered, &config);
        prop_assert_eq!(&first, &third);
    }

    #[test]
    fn prop_weight_monotonic_and_bounded(count in 0u64..10_000, extra in 0u64..1_000) {
        let config = FlowConfig::default();
        let w1 = edge_weight(count, &config);
        let w2 = edge_weight(count + extra, &config);
        prop_assert!(w2 >= w1);
        prop_assert!(w1 >= config.min_weight && w1 <= config.max_weight);
        prop_assert!(w2 >= config.min_weight && w2 <= config.max_weight);
    }

    #[test]
    fn prop_anomaly_rule(
        duration in 0.0f64..1_000.0,
        failed in any::<bool>(),
        threshold in 0.0f64..500.0,
    ) {
        let status = if failed { ActivityStatus::Failed } else { ActivityStatus::Success };
        let activity = Activity::new("x", "C1", "X", None, None)
            .with_status(status)
            .with_duration(duration);
        let flagged = evaluate_anomalies(&[activity], Some(threshold))[0].is_anomaly;
        prop_assert_eq!(flagged, failed || duration > threshold);
    }
}
