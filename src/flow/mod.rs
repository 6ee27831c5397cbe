// Flow reconstruction and transition classification
//
// Turns a case's ordered activity sequence into directed transitions
// between time-adjacent activities, buckets each transition by its wait
// time, and merges transitions across cases into a weighted flow graph.
//
// Key Insight: the event sources carry no control-flow metadata. Temporal
// adjacency is the only signal, and the gap validity window is what keeps
// parallel or unrelated activities from producing false edges.

mod classify;
mod merge;
mod reconstruct;

pub use classify::{classify, Bucket, BucketThresholds};
pub use merge::{
    build_flow_graph, edge_weight, merge_transitions, FlowGraph, FlowNode, MergedTransition,
};
pub use reconstruct::{
    gap_seconds, reconstruct_case_flow, reconstruct_transitions, CaseFlow, DroppedEdges, Transition,
};
