//! Where and when anomalies occur
//!
//! Distributes anomalous activities over UTC hour of day, resource and
//! plant area so reporting can point at peak periods and problem equipment.

use crate::activity::Activity;
use crate::anomaly::AnnotatedActivity;
use crate::config::OrderingFallback;
use crate::normalize::ordering_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Anomaly counts grouped by hour, resource and area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyBreakdown {
    /// Anomalies per UTC hour of day (index 0-23)
    pub by_hour: [usize; 24],
    /// Anomalies with no usable timestamp
    pub untimed: usize,
    pub by_resource: BTreeMap<String, usize>,
    pub by_area: BTreeMap<String, usize>,
    pub total: usize,
}

impl Default for AnomalyBreakdown {
    fn default() -> Self {
        Self {
            by_hour: [0; 24],
            untimed: 0,
            by_resource: BTreeMap::new(),
            by_area: BTreeMap::new(),
            total: 0,
        }
    }
}

impl AnomalyBreakdown {
    /// Hour with the most anomalies; earliest hour wins ties
    pub fn peak_hour(&self) -> Option<(u32, usize)> {
        let (hour, &count) = self
            .by_hour
            .iter()
            .enumerate()
            .max_by(|(ha, a), (hb, b)| a.cmp(b).then(hb.cmp(ha)))?;
        if count == 0 {
            None
        } else {
            Some((hour as u32, count))
        }
    }

    /// Resources ordered by anomaly count, descending
    pub fn top_resources(&self, n: usize) -> Vec<(&str, usize)> {
        top_n(&self.by_resource, n)
    }

    /// Areas ordered by anomaly count, descending
    pub fn top_areas(&self, n: usize) -> Vec<(&str, usize)> {
        top_n(&self.by_area, n)
    }
}

fn top_n(map: &BTreeMap<String, usize>, n: usize) -> Vec<(&str, usize)> {
    let mut entries: Vec<(&str, usize)> = map.iter().map(|(k, &v)| (k.as_str(), v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(n);
    entries
}

/// Group anomalous activities by hour of day, resource and area
///
/// The hour comes from the activity's ordering key (start time, else the
/// configured fallback). Blank resources are grouped as `unassigned`.
pub fn anomaly_breakdown(
    annotated: &[AnnotatedActivity],
    fallback: OrderingFallback,
) -> AnomalyBreakdown {
    let mut breakdown = AnomalyBreakdown::default();

    for entry in annotated.iter().filter(|a| a.is_anomaly) {
        let activity = &entry.activity;
        breakdown.total += 1;

        match ordering_key(activity, fallback).and_then(Activity::hour_of_day) {
            Some(hour) => breakdown.by_hour[hour as usize] += 1,
            None => breakdown.untimed += 1,
        }

        let resource = if activity.resource.trim().is_empty() {
            "unassigned"
        } else {
            activity.resource.as_str()
        };
        *breakdown.by_resource.entry(resource.to_string()).or_insert(0) += 1;
        *breakdown.by_area.entry(activity.area().to_string()).or_insert(0) += 1;
    }

    breakdown
}
