//! JSON report format for flow analysis results

use crate::breakdown::AnomalyBreakdown;
use crate::flow::FlowGraph;
use crate::pipeline::{CaseAnalysis, LogAnalysis, LogTotals};
use serde::{Deserialize, Serialize};

/// Root JSON output structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Crate version that produced the report
    pub version: String,
    /// Format name
    pub format: String,
    /// Per-case results
    pub cases: Vec<CaseAnalysis>,
    /// Cross-case flow graph (multi-case reports only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<FlowGraph>,
    /// Anomaly distribution (multi-case reports only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<AnomalyBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<LogTotals>,
    /// Input records rejected at validation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected_records: Vec<String>,
}

impl JsonOutput {
    /// Create an empty report
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "procflow-json-v1".to_string(),
            cases: Vec::new(),
            graph: None,
            breakdown: None,
            totals: None,
            rejected_records: Vec::new(),
        }
    }

    /// Report for a single case
    pub fn from_case(case: CaseAnalysis) -> Self {
        let mut output = Self::new();
        output.cases.push(case);
        output
    }

    /// Report for a whole batch
    pub fn from_log(log: LogAnalysis) -> Self {
        let mut output = Self::new();
        output.cases = log.cases;
        output.graph = Some(log.graph);
        output.breakdown = Some(log.breakdown);
        output.totals = Some(log.totals);
        output
    }

    /// Record validation failures from ingestion
    pub fn set_rejected<E: ToString>(&mut self, rejected: &[E]) {
        self.rejected_records = rejected.iter().map(ToString::to_string).collect();
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}
