//! End-to-end analysis: normalize, reconstruct, flag and summarize
//!
//! [`analyze_case`] runs the whole chain for one case. [`analyze_log`] runs
//! it for every case in a batch, spreading cases over scoped worker
//! threads, then builds the cross-case flow graph and anomaly breakdown.
//! Cases share nothing, so no locking is involved.

use crate::activity::Activity;
use crate::anomaly::{evaluate_anomalies, flag_transitions, AnnotatedActivity, TransitionFlag};
use crate::breakdown::{anomaly_breakdown, AnomalyBreakdown};
use crate::config::FlowConfig;
use crate::flow::{build_flow_graph, reconstruct_case_flow, CaseFlow, FlowGraph};
use crate::normalize::group_cases;
use crate::summary::{summarize_case, CaseSummary};
use serde::{Deserialize, Serialize};

/// Everything derived for one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseAnalysis {
    pub flow: CaseFlow,
    pub anomalies: Vec<AnnotatedActivity>,
    pub transition_flags: Vec<TransitionFlag>,
    pub summary: CaseSummary,
}

/// Totals over all analyzed cases
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogTotals {
    pub case_count: usize,
    pub activity_count: usize,
    pub transition_count: usize,
    pub anomaly_count: usize,
    pub long_wait_count: usize,
    pub dropped_edge_count: usize,
    pub total_duration_seconds: f64,
}

/// Result of analyzing a batch of cases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogAnalysis {
    /// Per-case results, ordered by case id
    pub cases: Vec<CaseAnalysis>,
    pub graph: FlowGraph,
    pub breakdown: AnomalyBreakdown,
    pub totals: LogTotals,
}

/// Run the full chain for a single case
///
/// # Example
/// ```
/// use procflow::activity::Activity;
/// use procflow::config::FlowConfig;
/// use procflow::pipeline::analyze_case;
///
/// let activities = vec![
///     Activity::new("A", "C1", "A", Some(0), Some(10)),
///     Activity::new("B", "C1", "B", Some(12), Some(200)),
/// ];
/// let analysis = analyze_case("C1", &activities, &FlowConfig::default());
/// assert_eq!(analysis.summary.valid_transition_count, 1);
/// assert_eq!(analysis.summary.anomaly_count, 1);
/// ```
pub fn analyze_case(case_id: &str, activities: &[Activity], config: &FlowConfig) -> CaseAnalysis {
    let flow = reconstruct_case_flow(case_id, activities, config);
    let anomalies = evaluate_anomalies(&flow.sequence, Some(config.anomaly_duration_threshold));
    let transition_flags = flag_transitions(&flow.transitions);
    let summary = summarize_case(case_id, &flow.sequence, &flow.transitions, &anomalies);

    CaseAnalysis {
        flow,
        anomalies,
        transition_flags,
        summary,
    }
}

fn worker_count(config: &FlowConfig, case_count: usize) -> usize {
    let wanted = if config.workers > 0 {
        config.workers
    } else {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    };
    wanted.clamp(1, case_count.max(1))
}

/// Analyze every case present in `activities`
///
/// Cases are split into contiguous chunks, one per worker; chunk results
/// are concatenated in order, so the output is identical for any worker
/// count.
pub fn analyze_log(activities: &[Activity], config: &FlowConfig) -> LogAnalysis {
    let cases: Vec<(String, Vec<Activity>)> = group_cases(activities).into_iter().collect();
    let workers = worker_count(config, cases.len());
    tracing::debug!(cases = cases.len(), workers, "analyzing event log");

    let analyses: Vec<CaseAnalysis> = if workers <= 1 {
        cases
            .iter()
            .map(|(id, acts)| analyze_case(id, acts, config))
            .collect()
    } else {
        let chunk_size = cases.len().div_ceil(workers);
        crossbeam::thread::scope(|s| {
            let handles: Vec<_> = cases
                .chunks(chunk_size)
                .map(|chunk| {
                    s.spawn(move |_| {
                        chunk
                            .iter()
                            .map(|(id, acts)| analyze_case(id, acts, config))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|e| std::panic::resume_unwind(e))
    };

    let flows: Vec<CaseFlow> = analyses.iter().map(|a| a.flow.clone()).collect();
    let graph = build_flow_graph(&flows, config);

    let all_anomalies: Vec<AnnotatedActivity> = analyses
        .iter()
        .flat_map(|a| a.anomalies.iter().cloned())
        .collect();
    let breakdown = anomaly_breakdown(&all_anomalies, config.ordering_fallback);

    let mut totals = LogTotals {
        case_count: analyses.len(),
        ..Default::default()
    };
    for analysis in &analyses {
        totals.activity_count += analysis.summary.activity_count;
        totals.transition_count += analysis.summary.valid_transition_count;
        totals.anomaly_count += analysis.summary.anomaly_count;
        totals.long_wait_count += analysis.summary.long_wait_count;
        totals.dropped_edge_count += analysis.flow.dropped.total();
        totals.total_duration_seconds += analysis.summary.total_duration_seconds;
    }

    LogAnalysis {
        cases: analyses,
        graph,
        breakdown,
        totals,
    }
}

impl CaseAnalysis {
    /// Human-readable report for one case
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!("=== Case {} ===\n", self.flow.case_id));
        report.push_str(&format!("{}\n", self.summary));

        if self.flow.sequence.is_empty() {
            report.push_str("No activities recorded for this case.\n");
            return report;
        }

        if !self.flow.transitions.is_empty() {
            report.push_str("\nTransitions:\n");
            for t in &self.flow.transitions {
                report.push_str(&format!(
                    "  {} -> {}  gap={:.1}s  [{}]\n",
                    t.from_activity_name, t.to_activity_name, t.gap_seconds, t.bucket
                ));
            }
        }

        let dropped = self.flow.dropped;
        if dropped.total() > 0 {
            report.push_str(&format!(
                "\nSkipped pairs: {} missing timestamps, {} outside gap window\n",
                dropped.missing_timestamp, dropped.out_of_window
            ));
        }

        let flagged: Vec<_> = self.anomalies.iter().filter(|a| a.is_anomaly).collect();
        if !flagged.is_empty() {
            report.push_str(&format!("\nAnomalous activities ({}):\n", flagged.len()));
            for a in flagged {
                report.push_str(&format!("  {}\n", a.to_report_string()));
            }
        }

        if !self.transition_flags.is_empty() {
            report.push_str(&format!("\nLong waits ({}):\n", self.transition_flags.len()));
            for f in &self.transition_flags {
                report.push_str(&format!(
                    "  {} -> {}  {:.1}s\n",
                    f.from_activity_id, f.to_activity_id, f.gap_seconds
                ));
            }
        }

        report
    }
}

impl LogAnalysis {
    /// Human-readable report for the whole batch
    pub fn to_report_string(&self) -> String {
        let t = &self.totals;
        let mut report = String::new();
        report.push_str("=== Process Flow Summary ===\n");
        report.push_str(&format!(
            "Cases: {}  Activities: {}  Transitions: {}  Skipped pairs: {}\n",
            t.case_count, t.activity_count, t.transition_count, t.dropped_edge_count
        ));
        report.push_str(&format!(
            "Anomalies: {}  Long waits: {}  Total activity time: {:.1}s\n",
            t.anomaly_count, t.long_wait_count, t.total_duration_seconds
        ));

        if let Some((hour, count)) = self.breakdown.peak_hour() {
            report.push_str(&format!(
                "Peak anomaly hour: {:02}:00 UTC ({} anomalies)\n",
                hour, count
            ));
        }
        for (area, count) in self.breakdown.top_areas(3) {
            report.push_str(&format!("  area {}: {} anomalies\n", area, count));
        }

        if !self.graph.edges.is_empty() {
            report.push_str("\nFlow edges:\n");
            for e in &self.graph.edges {
                report.push_str(&format!(
                    "  {} -> {}  count={} cases={} mean_gap={:.1}s [{}] weight={:.1}\n",
                    e.from, e.to, e.count, e.case_count, e.mean_gap_seconds, e.bucket, e.weight
                ));
            }
        }

        report.push_str("\nCases:\n");
        for case in &self.cases {
            report.push_str(&format!("  {}\n", case.summary));
        }

        report
    }
}
