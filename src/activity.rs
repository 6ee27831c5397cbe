//! Activity records and the ingestion boundary
//!
//! Upstream collaborators hand us loosely-typed event records: optional
//! fields, timestamps as strings, free-form status text. [`RawActivity`]
//! mirrors that shape, and [`Activity::from_raw`] turns it into the strict
//! internal [`Activity`] the flow engine works on. Everything past this
//! module can assume well-typed input.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while validating a raw record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("record {index}: missing case id")]
    MissingCaseId { index: usize },

    #[error("record {index}: missing activity name")]
    MissingActivityName { index: usize },

    #[error("record {index}: unknown status '{status}'")]
    UnknownStatus { index: usize, status: String },

    #[error("record {index}: malformed record: {message}")]
    Malformed { index: usize, message: String },

    #[error("record {index}: invalid duration {value}")]
    InvalidDuration { index: usize, value: f64 },
}

/// Execution status of an activity
///
/// Treated as an opaque value by the engine; only `Failed` carries meaning
/// for anomaly evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Pending => "pending",
            ActivityStatus::Running => "running",
            ActivityStatus::Success => "success",
            ActivityStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" => Ok(ActivityStatus::Pending),
            "running" | "in_progress" | "in-progress" => Ok(ActivityStatus::Running),
            "success" | "completed" | "complete" | "done" => Ok(ActivityStatus::Success),
            "failed" | "failure" | "error" => Ok(ActivityStatus::Failed),
            other => Err(other.to_string()),
        }
    }
}

/// A validated activity belonging to exactly one case
///
/// Timestamps are epoch microseconds. An absent timestamp is `None`; the
/// engine never substitutes a default for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub case_id: String,
    pub activity_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_us: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete_us: Option<i64>,
    /// Planned start, used to order activities that never recorded a start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_us: Option<i64>,
    pub duration_seconds: f64,
    pub resource: String,
    pub status: ActivityStatus,
}

impl Activity {
    /// Build an activity directly from second-resolution offsets
    ///
    /// Mostly useful for tests and benchmarks where wall-clock dates do not
    /// matter. Duration is derived from the two times when both are present.
    pub fn new(
        id: impl Into<String>,
        case_id: impl Into<String>,
        activity_name: impl Into<String>,
        start_secs: Option<i64>,
        complete_secs: Option<i64>,
    ) -> Self {
        let duration_seconds = match (start_secs, complete_secs) {
            (Some(s), Some(c)) => c.saturating_sub(s).max(0) as f64,
            _ => 0.0,
        };
        Self {
            id: id.into(),
            case_id: case_id.into(),
            activity_name: activity_name.into(),
            start_us: start_secs.map(secs_to_micros),
            complete_us: complete_secs.map(secs_to_micros),
            scheduled_us: None,
            duration_seconds,
            resource: String::new(),
            status: ActivityStatus::Success,
        }
    }

    pub fn with_status(mut self, status: ActivityStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_duration(mut self, duration_seconds: f64) -> Self {
        self.duration_seconds = duration_seconds;
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    pub fn with_scheduled(mut self, scheduled_secs: i64) -> Self {
        self.scheduled_us = Some(secs_to_micros(scheduled_secs));
        self
    }

    /// Validate a raw record into a strict activity
    ///
    /// `index` is the record's position in the ingested batch; it is used
    /// for error messages and to synthesize an id when none is given.
    pub fn from_raw(raw: RawActivity, index: usize) -> Result<Self, RecordError> {
        let case_id = non_blank(raw.case_id).ok_or(RecordError::MissingCaseId { index })?;
        let activity_name =
            non_blank(raw.activity_name).ok_or(RecordError::MissingActivityName { index })?;

        let status = match non_blank(raw.status) {
            Some(text) => text
                .parse::<ActivityStatus>()
                .map_err(|status| RecordError::UnknownStatus { index, status })?,
            None => ActivityStatus::Pending,
        };

        let start_us = parse_field(raw.start_time.as_deref(), index, "startTime");
        let complete_us = parse_field(raw.complete_time.as_deref(), index, "completeTime");
        let scheduled_us = parse_field(raw.scheduled_time.as_deref(), index, "scheduledTime");

        let duration_seconds = match raw.duration_seconds {
            Some(d) if !d.is_finite() || d < 0.0 => {
                return Err(RecordError::InvalidDuration { index, value: d })
            }
            Some(d) => d,
            None => match (start_us, complete_us) {
                (Some(s), Some(c)) => micros_to_secs(c.saturating_sub(s).max(0)),
                _ => 0.0,
            },
        };

        let id = non_blank(raw.id).unwrap_or_else(|| format!("{}#{}", case_id, index));

        Ok(Self {
            id,
            case_id,
            activity_name,
            start_us,
            complete_us,
            scheduled_us,
            duration_seconds,
            resource: raw.resource.unwrap_or_default(),
            status,
        })
    }

    /// UTC hour of day (0-23) of the given timestamp
    pub fn hour_of_day(us: i64) -> Option<u32> {
        DateTime::<Utc>::from_timestamp(us.div_euclid(MICROS_PER_SEC), 0).map(|dt| dt.hour())
    }

    /// Area prefix of a namespaced activity name (`/area/equipment` -> `area`)
    pub fn area(&self) -> &str {
        let trimmed = self.activity_name.trim_start_matches('/');
        match trimmed.split_once('/') {
            Some((area, _)) if !area.is_empty() => area,
            _ => trimmed,
        }
    }
}

/// An activity record as delivered by an upstream event source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawActivity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "caseId", alias = "case")]
    pub case_id: Option<String>,
    #[serde(default, alias = "activityName", alias = "activity")]
    pub activity_name: Option<String>,
    #[serde(default, alias = "startTime")]
    pub start_time: Option<String>,
    #[serde(default, alias = "completeTime", alias = "endTime")]
    pub complete_time: Option<String>,
    #[serde(default, alias = "scheduledTime")]
    pub scheduled_time: Option<String>,
    #[serde(default, alias = "durationSeconds", alias = "duration")]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Outcome of validating a batch of raw records
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub activities: Vec<Activity>,
    pub rejected: Vec<RecordError>,
}

/// Validate a batch of JSON records, keeping ingestion order
///
/// Each element is decoded on its own, so a record with a mistyped field is
/// rejected without taking its neighbours with it. Invalid records are
/// collected in `rejected` rather than failing the batch.
pub fn ingest(records: Vec<Value>) -> IngestReport {
    let mut report = IngestReport::default();
    for (index, value) in records.into_iter().enumerate() {
        let decoded = serde_json::from_value::<RawActivity>(value)
            .map_err(|e| RecordError::Malformed {
                index,
                message: e.to_string(),
            })
            .and_then(|raw| Activity::from_raw(raw, index));

        match decoded {
            Ok(activity) => report.activities.push(activity),
            Err(e) => {
                tracing::warn!("Rejected activity record: {}", e);
                report.rejected.push(e);
            }
        }
    }
    tracing::debug!(
        accepted = report.activities.len(),
        rejected = report.rejected.len(),
        "ingested activity records"
    );
    report
}

/// Split JSON text into undecoded records
///
/// Accepts either a bare array of records or `{ "activities": [...] }`.
/// Only the envelope is checked here; records are decoded by [`ingest`].
pub fn parse_records(json: &str) -> Result<Vec<Value>> {
    let document: Value =
        serde_json::from_str(json).with_context(|| "Failed to parse activity records JSON")?;
    match document {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => match map.remove("activities") {
            Some(Value::Array(records)) => Ok(records),
            _ => bail!("Expected an \"activities\" array in activity records JSON"),
        },
        _ => bail!("Expected an array of activity records"),
    }
}

/// Read undecoded records from a JSON file
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path.as_ref()).with_context(|| {
        format!("Failed to read activity records: {}", path.as_ref().display())
    })?;
    parse_records(&content)
}

const MICROS_PER_SEC: i64 = 1_000_000;

fn secs_to_micros(secs: i64) -> i64 {
    secs.saturating_mul(MICROS_PER_SEC)
}

/// Convert a microsecond span to fractional seconds
pub fn micros_to_secs(us: i64) -> f64 {
    us as f64 / MICROS_PER_SEC as f64
}

// Offset-bearing forms beyond RFC 3339: basic `+hhmm` offsets, no seconds
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

// Zone-less forms are taken as UTC; a trailing `Z` is matched literally
const NAIVE_FORMATS: [&str; 7] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%MZ",
    "%Y-%m-%d %H:%MZ",
];

/// Parse a timestamp string into epoch microseconds
///
/// Accepts RFC 3339 and the common ISO 8601 variants around it: basic
/// offsets (`+0000`), minute precision (`2024-03-01T10:01Z`), a space
/// instead of `T`, and zone-less times (taken as UTC). A bare number is
/// epoch seconds. Blank input is `Ok(None)`.
///
/// # Example
/// ```
/// use procflow::activity::parse_timestamp;
///
/// let a = parse_timestamp("2024-03-01T10:01Z").unwrap();
/// let b = parse_timestamp("2024-03-01T10:01:00+0000").unwrap();
/// assert_eq!(a, b);
/// assert!(parse_timestamp("tomorrow").is_err());
/// ```
pub fn parse_timestamp(value: &str) -> Result<Option<i64>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.timestamp_micros()));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Ok(Some(dt.timestamp_micros()));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Some(naive.and_utc().timestamp_micros()));
        }
    }

    match value.parse::<f64>() {
        Ok(secs) if secs.is_finite() => Ok(Some((secs * MICROS_PER_SEC as f64).round() as i64)),
        _ => Err(value.to_string()),
    }
}

/// An unusable timestamp is treated as absent: the activity stays in its
/// case and only loses the edges that needed this time.
fn parse_field(value: Option<&str>, index: usize, field: &'static str) -> Option<i64> {
    let text = value?;
    match parse_timestamp(text) {
        Ok(parsed) => parsed,
        Err(value) => {
            tracing::warn!(index, field, %value, "Unparseable timestamp treated as absent");
            None
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
