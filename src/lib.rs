//! procflow - process flow reconstruction for manufacturing event logs
//!
//! This library rebuilds, per case, the directed flow between time-adjacent
//! activities, buckets each transition by its wait time, flags anomalous
//! activities by status and duration, and rolls the results into per-case
//! summaries and a cross-case flow graph. All analysis is pure and
//! deterministic; I/O stays with the caller.

pub mod activity;
pub mod anomaly;
pub mod breakdown;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod flow;
pub mod json_output;
pub mod normalize;
pub mod pipeline;
pub mod summary;
