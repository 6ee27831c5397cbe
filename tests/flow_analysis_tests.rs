//! Integration tests for flow analysis over realistic event logs
//!
//! Exercises the public API end to end: raw records through validation,
//! normalization, reconstruction, anomaly flags and summaries.

use procflow::activity::{ingest, parse_records, read_records, Activity, ActivityStatus};
use procflow::anomaly::evaluate_anomalies;
use procflow::config::FlowConfig;
use procflow::flow::{build_flow_graph, reconstruct_case_flow, Bucket};
use procflow::pipeline::{analyze_case, analyze_log};
use procflow::summary::summarize_case;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/line_events.json");

fn fixture_activities() -> Vec<Activity> {
    let report = ingest(read_records(FIXTURE).unwrap());
    assert_eq!(report.rejected.len(), 1);
    report.activities
}

#[test]
fn test_fixture_case_c1_flow() {
    let activities = fixture_activities();
    let flow = reconstruct_case_flow("C1", &activities, &FlowConfig::default());

    let ids: Vec<_> = flow.sequence.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["c1-1", "c1-2", "c1-3"]);

    let gaps: Vec<_> = flow.transitions.iter().map(|t| (t.gap_seconds, t.bucket)).collect();
    assert_eq!(gaps, vec![(2.0, Bucket::Immediate), (80.0, Bucket::LongWait)]);
}

#[test]
fn test_fixture_case_c2_untimed_activity() {
    let activities = fixture_activities();
    let flow = reconstruct_case_flow("C2", &activities, &FlowConfig::default());

    assert_eq!(flow.sequence.len(), 3);
    assert_eq!(flow.sequence[2].id, "c2-3");
    assert_eq!(flow.transitions.len(), 1);
    assert_eq!(flow.dropped.missing_timestamp, 1);

    // duration derived from the timestamps: 180s
    let anomalies = evaluate_anomalies(&flow.sequence, None);
    assert!(anomalies[1].is_anomaly);
    assert_eq!(flow.sequence[1].duration_seconds, 180.0);
}

#[test]
fn test_fixture_log_analysis() {
    let analysis = analyze_log(&fixture_activities(), &FlowConfig::default());
    let totals = &analysis.totals;

    assert_eq!(totals.case_count, 2);
    assert_eq!(totals.activity_count, 6);
    assert_eq!(totals.transition_count, 3);
    assert_eq!(totals.anomaly_count, 2);
    assert_eq!(totals.long_wait_count, 1);
    assert_eq!(totals.dropped_edge_count, 1);

    let edge = analysis
        .graph
        .edge("/press/stamp_01", "/weld/robot_03")
        .unwrap();
    assert_eq!(edge.count, 2);
    assert_eq!(edge.case_count, 2);

    assert_eq!(analysis.breakdown.by_area["weld"], 2);
    assert_eq!(analysis.breakdown.peak_hour(), Some((10, 1)));
}

#[test]
fn test_transition_count_bound() {
    let activities = fixture_activities();
    for case in ["C1", "C2"] {
        let flow = reconstruct_case_flow(case, &activities, &FlowConfig::default());
        assert!(flow.transitions.len() <= flow.sequence.len().saturating_sub(1));
        assert_eq!(
            flow.transitions.len() + flow.dropped.total(),
            flow.sequence.len().saturating_sub(1)
        );
    }
}

#[test]
fn test_summary_matches_spec_counters() {
    let activities = vec![
        Activity::new("A", "C1", "A", Some(0), Some(10)),
        Activity::new("B", "C1", "B", Some(12), Some(20)).with_status(ActivityStatus::Failed),
        Activity::new("C", "C1", "C", Some(100), Some(110)),
    ];
    let flow = reconstruct_case_flow("C1", &activities, &FlowConfig::default());
    let anomalies = evaluate_anomalies(&flow.sequence, None);
    let summary = summarize_case("C1", &flow.sequence, &flow.transitions, &anomalies);

    assert_eq!(summary.activity_count, 3);
    assert_eq!(summary.total_duration_seconds, 28.0);
    assert_eq!(summary.valid_transition_count, 2);
    assert_eq!(summary.anomaly_count, 1);
    assert_eq!(summary.long_wait_count, 1);
}

#[test]
fn test_merge_of_two_single_edge_cases() {
    let config = FlowConfig::default();
    let flows: Vec<_> = ["C1", "C2"]
        .iter()
        .map(|case| {
            let activities = vec![
                Activity::new(format!("{case}-a"), *case, "A", Some(0), Some(10)),
                Activity::new(format!("{case}-b"), *case, "B", Some(11), Some(20)),
            ];
            reconstruct_case_flow(case, &activities, &config)
        })
        .collect();

    let single = build_flow_graph(&flows[..1], &config);
    let merged = build_flow_graph(&flows, &config);

    let one = single.edge("A", "B").unwrap();
    let two = merged.edge("A", "B").unwrap();
    assert_eq!(two.count, 2);
    assert!(two.weight >= one.weight);
    assert!(two.weight <= config.max_weight);
}

#[test]
fn test_config_file_changes_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flow.toml");
    std::fs::write(&path, "max_gap_seconds = 60.0\n").unwrap();

    let config = FlowConfig::from_toml(&path).unwrap();
    let flow = reconstruct_case_flow("C1", &fixture_activities(), &config);
    // the 80s wait now falls outside the window
    assert_eq!(flow.transitions.len(), 1);
    assert_eq!(flow.dropped.out_of_window, 1);
}

#[test]
fn test_iso8601_variants_keep_activities_in_case() {
    let records = parse_records(
        r#"[
            {"id": "p1", "caseId": "C1", "activityName": "/press/stamp_01",
             "startTime": "2024-03-01T10:00:00Z", "completeTime": "2024-03-01T10:00:55Z"},
            {"id": "p2", "caseId": "C1", "activityName": "/weld/robot_03", "status": "failed",
             "startTime": "2024-03-01T10:01Z", "completeTime": "2024-03-01T10:02Z"},
            {"id": "p3", "caseId": "C1", "activityName": "/qa/inspection",
             "startTime": "2024-03-01T10:03:00+0000", "completeTime": "not recorded"}
        ]"#,
    )
    .unwrap();
    let report = ingest(records);
    assert!(report.rejected.is_empty());

    let analysis = analyze_case("C1", &report.activities, &FlowConfig::default());
    assert_eq!(analysis.summary.activity_count, 3);
    assert_eq!(analysis.summary.anomaly_count, 1);
    // 5s and 60s waits; the unparseable completion only costs its own edge
    assert_eq!(analysis.summary.valid_transition_count, 2);
    assert_eq!(analysis.flow.transitions[0].bucket, Bucket::Immediate);
}
