//! CSV output for transitions and case summaries
//!
//! Two tables: one row per valid transition, and one row per case summary.

use crate::flow::Transition;
use crate::pipeline::CaseAnalysis;
use crate::summary::CaseSummary;

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// CSV formatter for transitions
#[derive(Debug, Default)]
pub struct CsvTransitionOutput {
    rows: Vec<(String, Transition)>,
}

impl CsvTransitionOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every transition of a case
    pub fn add_case(&mut self, case: &CaseAnalysis) {
        for t in &case.flow.transitions {
            self.rows.push((case.flow.case_id.clone(), t.clone()));
        }
    }

    fn header() -> &'static str {
        "case_id,from_activity_id,to_activity_id,from,to,gap_seconds,bucket"
    }

    fn format_row(case_id: &str, t: &Transition) -> String {
        [
            escape_field(case_id),
            escape_field(&t.from_activity_id),
            escape_field(&t.to_activity_id),
            escape_field(&t.from_activity_name),
            escape_field(&t.to_activity_name),
            format!("{:.3}", t.gap_seconds),
            t.bucket.to_string(),
        ]
        .join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str(Self::header());
        output.push('\n');
        for (case_id, t) in &self.rows {
            output.push_str(&Self::format_row(case_id, t));
            output.push('\n');
        }
        output
    }
}

/// CSV formatter for case summaries
#[derive(Debug, Default)]
pub struct CsvSummaryOutput {
    summaries: Vec<CaseSummary>,
}

impl CsvSummaryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_summary(&mut self, summary: CaseSummary) {
        self.summaries.push(summary);
    }

    /// Generate CSV output for summaries
    pub fn to_csv(&self) -> String {
        let mut output = String::from(
            "case_id,activity_count,total_duration_seconds,valid_transition_count,anomaly_count,long_wait_count\n",
        );
        for s in &self.summaries {
            output.push_str(&format!(
                "{},{},{:.3},{},{},{}\n",
                escape_field(&s.case_id),
                s.activity_count,
                s.total_duration_seconds,
                s.valid_transition_count,
                s.anomaly_count,
                s.long_wait_count
            ));
        }
        output
    }
}
