//! Aggregation policies and per-cell reduction
//!
//! A policy describes how the observations that land in one cell collapse to
//! that cell's output. Most policies are local to a single cell; cumulative
//! sums and moving averages carry state across the buckets of a leaf, so
//! reduction is driven by a per-leaf [`LeafReducer`] fed buckets in
//! chronological order.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::types::Value;

/// How the observations of one cell reduce to its output
///
/// # Example
///
/// ```rust
/// use timegrain::accumulate::Aggregation;
///
/// // The default policy passes observations through unchanged.
/// assert_eq!(Aggregation::default(), Aggregation::Identity);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aggregation {
    /// Pass every observation through unchanged, in row order
    #[default]
    Identity,
    /// The observation at the greatest row position
    LastValue,
    /// Largest numeric observation
    MaxValue,
    /// Smallest numeric observation
    MinValue,
    /// Running total across the leaf's buckets
    CumulativeSum,
    /// Mean of the observations pooled from a trailing window of buckets
    MovingAverage {
        /// Number of trailing buckets pooled into each mean; 0 acts as 1
        window: usize,
    },
}

impl Aggregation {
    /// Whether this policy folds numbers and therefore needs a numerical series
    pub fn requires_numeric(&self) -> bool {
        matches!(
            self,
            Aggregation::MaxValue
                | Aggregation::MinValue
                | Aggregation::CumulativeSum
                | Aggregation::MovingAverage { .. }
        )
    }

    /// Whether an empty cell is irreducible under this policy
    ///
    /// Identity simply emits nothing for an empty cell, and a cumulative sum
    /// emits its running total; the remaining policies need at least one
    /// observation and defer to the run's [`EmptyCellPolicy`].
    pub fn requires_observation(&self) -> bool {
        !matches!(self, Aggregation::Identity | Aggregation::CumulativeSum)
    }
}

/// What an accumulation does with an irreducible empty cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmptyCellPolicy {
    /// Leave the cell out of the output
    #[default]
    Skip,
    /// Fail the whole run with `Error::EmptyCellReduction`
    Fail,
}

/// Streaming reducer for one (leaf, quantity) pair
///
/// Fed one bucket at a time, in chronological order. Yields the cell's
/// output values, or `None` when the cell is empty and the policy has
/// nothing to emit for it.
#[derive(Debug)]
pub(crate) struct LeafReducer {
    aggregation: Aggregation,
    running_total: f64,
    trailing: VecDeque<Vec<f64>>,
}

impl LeafReducer {
    pub(crate) fn new(aggregation: Aggregation) -> Self {
        Self {
            aggregation,
            running_total: 0.0,
            trailing: VecDeque::new(),
        }
    }

    /// Reduce the next bucket's observations
    pub(crate) fn reduce_bucket(&mut self, values: &[Value]) -> Option<Vec<Value>> {
        match self.aggregation {
            Aggregation::Identity => {
                if values.is_empty() {
                    None
                } else {
                    Some(values.to_vec())
                }
            }
            Aggregation::LastValue => values.last().map(|v| vec![v.clone()]),
            Aggregation::MaxValue => fold_numbers(values, f64::max),
            Aggregation::MinValue => fold_numbers(values, f64::min),
            Aggregation::CumulativeSum => {
                let bucket_sum: f64 = values.iter().filter_map(Value::as_f64).sum();
                self.running_total += bucket_sum;
                Some(vec![Value::Numerical(self.running_total)])
            }
            Aggregation::MovingAverage { window } => {
                let numbers: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
                self.trailing.push_back(numbers);
                while self.trailing.len() > window.max(1) {
                    self.trailing.pop_front();
                }
                let count: usize = self.trailing.iter().map(Vec::len).sum();
                if count == 0 {
                    return None;
                }
                let sum: f64 = self.trailing.iter().flatten().sum();
                Some(vec![Value::Numerical(sum / count as f64)])
            }
        }
    }
}

fn fold_numbers(values: &[Value], pick: fn(f64, f64) -> f64) -> Option<Vec<Value>> {
    values
        .iter()
        .filter_map(Value::as_f64)
        .reduce(pick)
        .map(|v| vec![Value::Numerical(v)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[f64]) -> Vec<Value> {
        values.iter().copied().map(Value::Numerical).collect()
    }

    #[test]
    fn test_identity_passes_through_in_order() {
        let mut reducer = LeafReducer::new(Aggregation::Identity);
        let out = reducer.reduce_bucket(&nums(&[3.0, 1.0, 2.0]));
        assert_eq!(out, Some(nums(&[3.0, 1.0, 2.0])));
        assert_eq!(reducer.reduce_bucket(&[]), None);
    }

    #[test]
    fn test_last_value_keeps_any_affinity() {
        let mut reducer = LeafReducer::new(Aggregation::LastValue);
        let cell = vec![Value::from("first"), Value::from("last")];
        assert_eq!(reducer.reduce_bucket(&cell), Some(vec![Value::from("last")]));
        assert_eq!(reducer.reduce_bucket(&[]), None);
    }

    #[test]
    fn test_max_and_min() {
        let mut max = LeafReducer::new(Aggregation::MaxValue);
        assert_eq!(
            max.reduce_bucket(&nums(&[2.0, 9.0, 4.0])),
            Some(nums(&[9.0]))
        );

        let mut min = LeafReducer::new(Aggregation::MinValue);
        assert_eq!(
            min.reduce_bucket(&nums(&[2.0, 9.0, 4.0])),
            Some(nums(&[2.0]))
        );
        assert_eq!(min.reduce_bucket(&[]), None);
    }

    #[test]
    fn test_cumulative_sum_runs_across_buckets() {
        let mut reducer = LeafReducer::new(Aggregation::CumulativeSum);
        assert_eq!(reducer.reduce_bucket(&nums(&[1.0])), Some(nums(&[1.0])));
        assert_eq!(reducer.reduce_bucket(&nums(&[2.0])), Some(nums(&[3.0])));
        // An empty bucket still emits the running total
        assert_eq!(reducer.reduce_bucket(&[]), Some(nums(&[3.0])));
        assert_eq!(reducer.reduce_bucket(&nums(&[3.0])), Some(nums(&[6.0])));
    }

    #[test]
    fn test_moving_average_pools_trailing_buckets() {
        let mut reducer = LeafReducer::new(Aggregation::MovingAverage { window: 2 });
        // Partial window at the head: only the first bucket available
        assert_eq!(reducer.reduce_bucket(&nums(&[1.0, 3.0])), Some(nums(&[2.0])));
        // Pool of buckets [1,3] and [5]: mean 3
        assert_eq!(reducer.reduce_bucket(&nums(&[5.0])), Some(nums(&[3.0])));
        // Pool slides to [5] and [7]: mean 6
        assert_eq!(reducer.reduce_bucket(&nums(&[7.0])), Some(nums(&[6.0])));
        // Pool slides to [7] and []: mean 7
        assert_eq!(reducer.reduce_bucket(&[]), Some(nums(&[7.0])));
        // Pool is [] and []: nothing to average
        assert_eq!(reducer.reduce_bucket(&[]), None);
    }

    #[test]
    fn test_moving_average_zero_window_acts_as_one() {
        let mut reducer = LeafReducer::new(Aggregation::MovingAverage { window: 0 });
        assert_eq!(reducer.reduce_bucket(&nums(&[4.0])), Some(nums(&[4.0])));
        assert_eq!(reducer.reduce_bucket(&nums(&[8.0])), Some(nums(&[8.0])));
    }

    #[test]
    fn test_policy_classification() {
        assert!(!Aggregation::Identity.requires_numeric());
        assert!(!Aggregation::LastValue.requires_numeric());
        assert!(Aggregation::CumulativeSum.requires_numeric());
        assert!(Aggregation::MovingAverage { window: 3 }.requires_numeric());

        assert!(!Aggregation::Identity.requires_observation());
        assert!(!Aggregation::CumulativeSum.requires_observation());
        assert!(Aggregation::LastValue.requires_observation());
        assert!(Aggregation::MaxValue.requires_observation());
    }

    #[test]
    fn test_defaults_and_serde_round_trip() {
        assert_eq!(EmptyCellPolicy::default(), EmptyCellPolicy::Skip);

        let policy = Aggregation::MovingAverage { window: 7 };
        let json = serde_json::to_string(&policy).unwrap();
        let back: Aggregation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }
}
