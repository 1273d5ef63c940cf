//! Pure functions over outcome batches.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use armada_core::{ArmadaError, Outcome};

/// Aggregate statistics over one batch of outcomes. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Total outcomes in the batch.
    pub total: usize,
    /// Outcomes without an error.
    pub successful: usize,
    /// Outcomes with an error.
    pub failed: usize,
    /// Mean task duration (zero for an empty batch).
    pub avg_duration: Duration,
    /// Shortest task duration (zero for an empty batch).
    pub min_duration: Duration,
    /// Longest task duration (zero for an empty batch).
    pub max_duration: Duration,
}

/// Number of successful outcomes.
#[must_use]
pub fn count_successful(outcomes: &[Outcome]) -> usize {
    outcomes.iter().filter(|o| o.is_success()).count()
}

/// Number of failed outcomes.
#[must_use]
pub fn count_failed(outcomes: &[Outcome]) -> usize {
    outcomes.iter().filter(|o| !o.is_success()).count()
}

/// The successful outcomes, in batch order.
#[must_use]
pub fn filter_successful(outcomes: &[Outcome]) -> Vec<&Outcome> {
    outcomes.iter().filter(|o| o.is_success()).collect()
}

/// The failed outcomes, in batch order.
#[must_use]
pub fn filter_failed(outcomes: &[Outcome]) -> Vec<&Outcome> {
    outcomes.iter().filter(|o| !o.is_success()).collect()
}

/// The outcomes for one cluster, in batch order.
#[must_use]
pub fn filter_by_cluster<'a>(outcomes: &'a [Outcome], name: &str) -> Vec<&'a Outcome> {
    outcomes.iter().filter(|o| o.cluster_name == name).collect()
}

/// Partition the batch by cluster name.
#[must_use]
pub fn group_by_cluster(outcomes: &[Outcome]) -> BTreeMap<String, Vec<&Outcome>> {
    let mut groups: BTreeMap<String, Vec<&Outcome>> = BTreeMap::new();
    for outcome in outcomes {
        groups
            .entry(outcome.cluster_name.clone())
            .or_default()
            .push(outcome);
    }
    groups
}

/// Every error in the batch, in batch order.
#[must_use]
pub fn errors(outcomes: &[Outcome]) -> Vec<&ArmadaError> {
    outcomes.iter().filter_map(|o| o.error.as_ref()).collect()
}

/// Distinct cluster names, in first-seen order.
#[must_use]
pub fn cluster_names(outcomes: &[Outcome]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for outcome in outcomes {
        if !names.iter().any(|n| n == &outcome.cluster_name) {
            names.push(outcome.cluster_name.clone());
        }
    }
    names
}

/// Mean task duration; zero for an empty batch.
#[must_use]
pub fn average_duration(outcomes: &[Outcome]) -> Duration {
    let Some(count) = u32::try_from(outcomes.len()).ok().filter(|&n| n > 0) else {
        return Duration::ZERO;
    };
    let total = outcomes
        .iter()
        .fold(Duration::ZERO, |acc, o| acc.saturating_add(o.duration));
    total.checked_div(count).unwrap_or_default()
}

/// Shortest task duration; zero for an empty batch.
#[must_use]
pub fn min_duration(outcomes: &[Outcome]) -> Duration {
    outcomes.iter().map(|o| o.duration).min().unwrap_or_default()
}

/// Longest task duration; zero for an empty batch.
#[must_use]
pub fn max_duration(outcomes: &[Outcome]) -> Duration {
    outcomes.iter().map(|o| o.duration).max().unwrap_or_default()
}

/// Percentage of successful outcomes; zero for an empty batch.
#[must_use]
// Counts are far below f64's integer range; the ratio cannot divide by zero.
#[allow(clippy::cast_precision_loss, clippy::arithmetic_side_effects)]
pub fn success_rate(outcomes: &[Outcome]) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    count_successful(outcomes) as f64 / outcomes.len() as f64 * 100.0
}

/// Percentage of failed outcomes; zero for an empty batch.
#[must_use]
// Counts are far below f64's integer range; the ratio cannot divide by zero.
#[allow(clippy::cast_precision_loss, clippy::arithmetic_side_effects)]
pub fn failure_rate(outcomes: &[Outcome]) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    count_failed(outcomes) as f64 / outcomes.len() as f64 * 100.0
}

/// Whether every outcome succeeded (vacuously true for an empty batch).
#[must_use]
pub fn all_successful(outcomes: &[Outcome]) -> bool {
    outcomes.iter().all(Outcome::is_success)
}

/// Compute the batch summary.
#[must_use]
pub fn summarize(outcomes: &[Outcome]) -> Summary {
    Summary {
        total: outcomes.len(),
        successful: count_successful(outcomes),
        failed: count_failed(outcomes),
        avg_duration: average_duration(outcomes),
        min_duration: min_duration(outcomes),
        max_duration: max_duration(outcomes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> Vec<Outcome> {
        vec![
            Outcome::success("a", None, Duration::from_millis(10), 0),
            Outcome::failure(
                "b",
                ArmadaError::ConnectionFailed("refused".into()),
                Duration::from_millis(30),
                1,
            ),
            Outcome::success("a", None, Duration::from_millis(20), 2),
            Outcome::failure("c", ArmadaError::Cancelled, Duration::ZERO, 3),
        ]
    }

    #[test]
    fn test_counts_partition_the_batch() {
        let outcomes = batch();
        assert_eq!(count_successful(&outcomes), 2);
        assert_eq!(count_failed(&outcomes), 2);
        assert_eq!(
            count_successful(&outcomes) + count_failed(&outcomes),
            outcomes.len()
        );
    }

    #[test]
    fn test_filters_are_a_disjoint_partition() {
        let outcomes = batch();
        let ok = filter_successful(&outcomes);
        let failed = filter_failed(&outcomes);

        assert_eq!(ok.len() + failed.len(), outcomes.len());
        let mut indices: Vec<usize> = ok
            .iter()
            .chain(failed.iter())
            .map(|o| o.submission_index)
            .collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_filter_by_cluster() {
        let outcomes = batch();
        assert_eq!(filter_by_cluster(&outcomes, "a").len(), 2);
        assert_eq!(filter_by_cluster(&outcomes, "c").len(), 1);
        assert!(filter_by_cluster(&outcomes, "ghost").is_empty());
    }

    #[test]
    fn test_group_by_cluster_is_a_partition() {
        let outcomes = batch();
        let groups = group_by_cluster(&outcomes);

        assert_eq!(groups.len(), 3);
        let regrouped: usize = groups.values().map(Vec::len).sum();
        assert_eq!(regrouped, outcomes.len());
        assert_eq!(groups.get("a").map(Vec::len), Some(2));
    }

    #[test]
    fn test_errors_and_cluster_names() {
        let outcomes = batch();
        assert_eq!(errors(&outcomes).len(), 2);
        assert_eq!(
            cluster_names(&outcomes),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_rates_sum_to_hundred() {
        let outcomes = batch();
        let total = success_rate(&outcomes) + failure_rate(&outcomes);
        assert!((total - 100.0).abs() < f64::EPSILON);

        assert_eq!(success_rate(&[]), 0.0);
        assert_eq!(failure_rate(&[]), 0.0);
    }

    #[test]
    fn test_average_bounded_by_min_and_max() {
        let outcomes = batch();
        let avg = average_duration(&outcomes);
        assert!(avg >= min_duration(&outcomes));
        assert!(avg <= max_duration(&outcomes));
        assert_eq!(avg, Duration::from_millis(15));
    }

    #[test]
    fn test_durations_zero_on_empty() {
        assert_eq!(average_duration(&[]), Duration::ZERO);
        assert_eq!(min_duration(&[]), Duration::ZERO);
        assert_eq!(max_duration(&[]), Duration::ZERO);
    }

    #[test]
    fn test_all_successful_vacuous_on_empty() {
        assert!(all_successful(&[]));
        assert!(!all_successful(&batch()));
        let ok = vec![Outcome::success("a", None, Duration::ZERO, 0)];
        assert!(all_successful(&ok));
    }

    #[test]
    fn test_summarize() {
        let outcomes = batch();
        let summary = summarize(&outcomes);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.successful + summary.failed, summary.total);
        assert_eq!(summary.min_duration, Duration::ZERO);
        assert_eq!(summary.max_duration, Duration::from_millis(30));
    }
}
