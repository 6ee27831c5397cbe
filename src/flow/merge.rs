// Cross-case flow graph
//
// Transitions from many cases are merged on (from name, to name) into a
// single directly-follows view for rendering. Edge weight grows with the
// merged count but is clamped to a fixed display range.

use crate::config::FlowConfig;
use crate::flow::classify::{Bucket, BucketThresholds};
use crate::flow::reconstruct::CaseFlow;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Transitions sharing the same activity-name pair, merged across cases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedTransition {
    pub from: String,
    pub to: String,
    /// Number of merged transitions
    pub count: u64,
    /// Number of distinct cases contributing at least one transition
    pub case_count: u64,
    pub mean_gap_seconds: f64,
    pub min_gap_seconds: f64,
    pub max_gap_seconds: f64,
    /// Bucket of the mean gap
    pub bucket: Bucket,
    /// Display weight, monotonic in `count`, within the configured clamp
    pub weight: f64,
}

/// An activity name in the merged graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowNode {
    pub name: String,
    /// Occurrences across all case sequences
    pub count: u64,
    /// Cases whose sequence begins with this activity
    pub start_count: u64,
    /// Cases whose sequence ends with this activity
    pub end_count: u64,
}

/// Node/edge view of many reconstructed cases
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<MergedTransition>,
    pub case_count: u64,
}

impl FlowGraph {
    /// Outgoing edges of an activity
    pub fn outgoing(&self, activity: &str) -> Vec<&MergedTransition> {
        self.edges.iter().filter(|e| e.from == activity).collect()
    }

    /// Incoming edges of an activity
    pub fn incoming(&self, activity: &str) -> Vec<&MergedTransition> {
        self.edges.iter().filter(|e| e.to == activity).collect()
    }

    /// Edge between two activity names, if any
    pub fn edge(&self, from: &str, to: &str) -> Option<&MergedTransition> {
        self.edges.iter().find(|e| e.from == from && e.to == to)
    }
}

/// Display weight for an edge merged from `count` transitions
///
/// `count * weight_per_count`, clamped to `[min_weight, max_weight]`.
///
/// # Example
/// ```
/// use procflow::config::FlowConfig;
/// use procflow::flow::edge_weight;
///
/// let config = FlowConfig::default();
/// assert_eq!(edge_weight(1, &config), 2.0);
/// assert_eq!(edge_weight(5, &config), 5.0);
/// assert_eq!(edge_weight(10_000, &config), 12.0);
/// ```
pub fn edge_weight(count: u64, config: &FlowConfig) -> f64 {
    (count as f64 * config.weight_per_count).clamp(config.min_weight, config.max_weight)
}

#[derive(Default)]
struct EdgeAccumulator {
    count: u64,
    cases: BTreeSet<String>,
    gap_sum: f64,
    gap_min: f64,
    gap_max: f64,
}

/// Merge transitions of many cases on `(from name, to name)`
///
/// Edges are ordered by count (descending), then by names, so the output is
/// the same for any input order of cases.
pub fn merge_transitions(flows: &[CaseFlow], config: &FlowConfig) -> Vec<MergedTransition> {
    let thresholds = BucketThresholds::from(config);
    let mut edge_map: BTreeMap<(String, String), EdgeAccumulator> = BTreeMap::new();

    for flow in flows {
        for t in &flow.transitions {
            let key = (t.from_activity_name.clone(), t.to_activity_name.clone());
            let entry = edge_map.entry(key).or_insert_with(|| EdgeAccumulator {
                gap_min: f64::INFINITY,
                gap_max: f64::NEG_INFINITY,
                ..Default::default()
            });
            entry.count += 1;
            entry.cases.insert(flow.case_id.clone());
            entry.gap_sum += t.gap_seconds;
            entry.gap_min = entry.gap_min.min(t.gap_seconds);
            entry.gap_max = entry.gap_max.max(t.gap_seconds);
        }
    }

    let mut edges: Vec<MergedTransition> = edge_map
        .into_iter()
        .map(|((from, to), acc)| {
            let mean = acc.gap_sum / acc.count as f64;
            MergedTransition {
                from,
                to,
                count: acc.count,
                case_count: acc.cases.len() as u64,
                mean_gap_seconds: mean,
                min_gap_seconds: acc.gap_min,
                max_gap_seconds: acc.gap_max,
                bucket: thresholds.classify(mean),
                weight: edge_weight(acc.count, config),
            }
        })
        .collect();

    // Stable sort keeps the BTreeMap name order among equal counts
    edges.sort_by(|a, b| b.count.cmp(&a.count));
    edges
}

/// Build the merged node/edge graph for a set of reconstructed cases
pub fn build_flow_graph(flows: &[CaseFlow], config: &FlowConfig) -> FlowGraph {
    let mut nodes: BTreeMap<String, FlowNode> = BTreeMap::new();

    fn node<'a>(nodes: &'a mut BTreeMap<String, FlowNode>, name: &str) -> &'a mut FlowNode {
        nodes.entry(name.to_string()).or_insert_with(|| FlowNode {
            name: name.to_string(),
            count: 0,
            start_count: 0,
            end_count: 0,
        })
    }

    for flow in flows {
        for activity in &flow.sequence {
            node(&mut nodes, &activity.activity_name).count += 1;
        }
        if let Some(first) = flow.sequence.first() {
            node(&mut nodes, &first.activity_name).start_count += 1;
        }
        if let Some(last) = flow.sequence.last() {
            node(&mut nodes, &last.activity_name).end_count += 1;
        }
    }

    let edges = merge_transitions(flows, config);
    tracing::debug!(
        cases = flows.len(),
        nodes = nodes.len(),
        edges = edges.len(),
        "built cross-case flow graph"
    );

    FlowGraph {
        nodes: nodes.into_values().collect(),
        edges,
        case_count: flows.len() as u64,
    }
}
