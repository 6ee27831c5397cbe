//! Event normalization: per-case, time-ordered activity sequences

use crate::activity::Activity;
use crate::config::OrderingFallback;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Ordering key for an activity: its start, else the configured fallback
pub fn ordering_key(activity: &Activity, fallback: OrderingFallback) -> Option<i64> {
    activity.start_us.or(match fallback {
        OrderingFallback::Scheduled => activity.scheduled_us,
        OrderingFallback::Complete => activity.complete_us,
        OrderingFallback::None => None,
    })
}

/// Return the time-ordered sequence of activities belonging to `case_id`
///
/// Sorting is stable: equal keys keep ingestion order, and activities with
/// no usable time at all are placed last in their original relative order.
/// Nothing is dropped. An unknown case yields an empty sequence.
///
/// # Example
/// ```
/// use procflow::activity::Activity;
/// use procflow::config::OrderingFallback;
/// use procflow::normalize::normalize_case;
///
/// let activities = vec![
///     Activity::new("b", "C1", "B", Some(20), Some(30)),
///     Activity::new("x", "C2", "X", Some(0), Some(5)),
///     Activity::new("a", "C1", "A", Some(0), Some(10)),
/// ];
///
/// let seq = normalize_case(&activities, "C1", OrderingFallback::Scheduled);
/// let ids: Vec<_> = seq.iter().map(|a| a.id.as_str()).collect();
/// assert_eq!(ids, vec!["a", "b"]);
/// ```
pub fn normalize_case(
    activities: &[Activity],
    case_id: &str,
    fallback: OrderingFallback,
) -> Vec<Activity> {
    let selected: Vec<Activity> = activities
        .iter()
        .filter(|a| a.case_id == case_id)
        .cloned()
        .collect();
    order_sequence(selected, fallback)
}

/// Stable-sort an already-selected case sequence by ordering key
pub fn order_sequence(mut sequence: Vec<Activity>, fallback: OrderingFallback) -> Vec<Activity> {
    sequence.sort_by(|a, b| {
        match (ordering_key(a, fallback), ordering_key(b, fallback)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    sequence
}

/// Partition activities by case id, keeping ingestion order within each case
///
/// Cases are returned in case-id order so downstream output is deterministic.
pub fn group_cases(activities: &[Activity]) -> BTreeMap<String, Vec<Activity>> {
    let mut cases: BTreeMap<String, Vec<Activity>> = BTreeMap::new();
    for activity in activities {
        cases
            .entry(activity.case_id.clone())
            .or_default()
            .push(activity.clone());
    }
    cases
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(seq: &[Activity]) -> Vec<&str> {
        seq.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_sorts_by_start_time() {
        let activities = vec![
            Activity::new("c", "C1", "C", Some(100), Some(110)),
            Activity::new("a", "C1", "A", Some(0), Some(10)),
            Activity::new("b", "C1", "B", Some(12), Some(20)),
        ];
        let seq = normalize_case(&activities, "C1", OrderingFallback::Scheduled);
        assert_eq!(ids(&seq), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ties_keep_ingestion_order() {
        let activities = vec![
            Activity::new("second", "C1", "B", Some(5), Some(6)),
            Activity::new("first", "C1", "A", Some(0), Some(1)),
            Activity::new("third", "C1", "C", Some(5), Some(9)),
        ];
        let seq = normalize_case(&activities, "C1", OrderingFallback::Scheduled);
        assert_eq!(ids(&seq), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_untimed_activities_go_last_in_original_order() {
        let activities = vec![
            Activity::new("u1", "C1", "U1", None, None),
            Activity::new("t2", "C1", "T2", Some(50), Some(60)),
            Activity::new("u2", "C1", "U2", None, None),
            Activity::new("t1", "C1", "T1", Some(10), Some(20)),
        ];
        let seq = normalize_case(&activities, "C1", OrderingFallback::Scheduled);
        assert_eq!(ids(&seq), vec!["t1", "t2", "u1", "u2"]);
        assert_eq!(seq.len(), activities.len());
    }

    #[test]
    fn test_scheduled_fallback_orders_unstarted_activities() {
        let activities = vec![
            Activity::new("late", "C1", "L", Some(100), Some(110)),
            Activity::new("planned", "C1", "P", None, None).with_scheduled(40),
            Activity::new("early", "C1", "E", Some(0), Some(10)),
        ];
        let seq = normalize_case(&activities, "C1", OrderingFallback::Scheduled);
        assert_eq!(ids(&seq), vec!["early", "planned", "late"]);

        let seq = normalize_case(&activities, "C1", OrderingFallback::None);
        assert_eq!(ids(&seq), vec!["early", "late", "planned"]);
    }

    #[test]
    fn test_complete_fallback() {
        let activities = vec![
            Activity::new("b", "C1", "B", Some(30), Some(40)),
            Activity::new("a", "C1", "A", None, Some(20)),
        ];
        let seq = normalize_case(&activities, "C1", OrderingFallback::Complete);
        assert_eq!(ids(&seq), vec!["a", "b"]);
    }

    #[test]
    fn test_unknown_case_is_empty() {
        let activities = vec![Activity::new("a", "C1", "A", Some(0), Some(1))];
        assert!(normalize_case(&activities, "missing", OrderingFallback::Scheduled).is_empty());
    }

    #[test]
    fn test_group_cases() {
        let activities = vec![
            Activity::new("b1", "B", "X", Some(0), Some(1)),
            Activity::new("a1", "A", "X", Some(5), Some(6)),
            Activity::new("b2", "B", "Y", Some(2), Some(3)),
        ];
        let cases = group_cases(&activities);
        let keys: Vec<_> = cases.keys().cloned().collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(ids(&cases["B"]), vec!["b1", "b2"]);
    }
}
