//! Property tests for interval stepping, calendar generation and accumulation
//!
//! Uses property-based testing (proptest) to pin the structural invariants:
//! stepping always advances, boundaries always cover the range, grouping
//! always partitions the rows, and reductions conserve what they should.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use proptest::prelude::*;
use proptest::sample::select;

use timegrain::accumulate::{Accumulator, Aggregation, CategoryTree, Quantity};
use timegrain::calendar::{days_in_month, Calendar, Interval, TemporalUnit};
use timegrain::types::DataSeries;

// =============================================================================
// Test Data Strategies
// =============================================================================

/// Strategy for civil instants between 1900 and 2100
fn arb_instant() -> impl Strategy<Value = NaiveDateTime> {
    (
        1900i32..2100,
        1u32..=12,
        1u32..=31,
        0u32..24,
        0u32..60,
        0u32..60,
    )
        .prop_map(|(year, month, day, hour, minute, second)| {
            let day = day.min(days_in_month(year, month));
            NaiveDate::from_ymd_opt(year, month, day)
                .expect("clamped day is valid")
                .and_hms_opt(hour, minute, second)
                .expect("in-range time")
        })
}

/// Strategy for intervals over any unit with a modest scalar
fn arb_interval() -> impl Strategy<Value = Interval> {
    (select(TemporalUnit::ALL.to_vec()), 1u32..=100)
        .prop_map(|(unit, scalar)| Interval::new(unit, scalar).expect("nonzero scalar"))
}

/// Strategy for day-or-coarser intervals, safe to span months of range
fn arb_coarse_interval() -> impl Strategy<Value = Interval> {
    let coarse = vec![
        TemporalUnit::Days,
        TemporalUnit::Weeks,
        TemporalUnit::Months,
        TemporalUnit::Years,
    ];
    (select(coarse), 1u32..=12)
        .prop_map(|(unit, scalar)| Interval::new(unit, scalar).expect("nonzero scalar"))
}

/// Strategy for finite observation values
fn finite_value() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1e6..1e6f64,
        Just(0.0),
        (-1000i32..1000).prop_map(|i| f64::from(i) / 4.0),
    ]
}

// =============================================================================
// Interval Stepping Properties
// =============================================================================

mod interval_stepping {
    use super::*;

    proptest! {
        /// A step always lands strictly later, whatever the unit
        #[test]
        fn next_is_strictly_later(from in arb_instant(), interval in arb_interval()) {
            prop_assert!(interval.next(from) > from);
        }

        /// Repeated stepping keeps advancing
        #[test]
        fn step_chains_increase(from in arb_instant(), interval in arb_coarse_interval()) {
            let mut current = from;
            for _ in 0..16 {
                let next = interval.next(current);
                prop_assert!(next > current);
                current = next;
            }
        }

        /// Month steps clamp the day to the target month, never below
        /// the original day unless the month is shorter
        #[test]
        fn month_step_day_is_clamped(from in arb_instant(), scalar in 1u32..=48) {
            let interval = Interval::new(TemporalUnit::Months, scalar).expect("nonzero scalar");
            let next = interval.next(from);
            let expected_day = from.day().min(days_in_month(next.year(), next.month()));
            prop_assert_eq!(next.day(), expected_day);
            prop_assert_eq!(next.time(), from.time());
        }

        /// Year steps keep the month and clamp only Feb 29
        #[test]
        fn year_step_preserves_month(from in arb_instant(), scalar in 1u32..=10) {
            let interval = Interval::new(TemporalUnit::Years, scalar).expect("nonzero scalar");
            let next = interval.next(from);
            prop_assert_eq!(next.month(), from.month());
            prop_assert_eq!(
                next.day(),
                from.day().min(days_in_month(next.year(), next.month()))
            );
        }
    }
}

// =============================================================================
// Calendar Generation Properties
// =============================================================================

mod calendar_generation {
    use super::*;

    proptest! {
        /// A whole-day span of n days materializes n + 1 instants
        #[test]
        fn daily_instants_match_span(start in arb_instant(), span in 0i64..400) {
            let end = start + Duration::days(span);
            let cal = Calendar::new(start, end);
            prop_assert_eq!(cal.len() as i64, span + 1);
        }

        /// Instants step by exactly one day
        #[test]
        fn instants_step_one_day(start in arb_instant(), span in 1i64..200) {
            let cal = Calendar::new(start, start + Duration::days(span));
            for pair in cal.instants().windows(2) {
                prop_assert_eq!(pair[1] - pair[0], Duration::days(1));
            }
        }

        /// An inverted range is always empty
        #[test]
        fn inverted_range_is_empty(start in arb_instant(), span in 1i64..1000) {
            let cal = Calendar::new(start + Duration::days(span), start);
            prop_assert!(cal.is_empty());
            prop_assert!(cal.bucket_boundaries(&Interval::default()).is_empty());
        }

        /// Boundaries start at the range start, increase strictly, and the
        /// final boundary is the first one past the end
        #[test]
        fn boundaries_cover_the_range(
            start in arb_instant(),
            span in 0i64..400,
            interval in arb_coarse_interval(),
        ) {
            let end = start + Duration::days(span);
            let boundaries = Calendar::new(start, end).bucket_boundaries(&interval);

            prop_assert!(boundaries.len() >= 2);
            prop_assert_eq!(boundaries[0], start);
            prop_assert!(boundaries[boundaries.len() - 1] > end);
            prop_assert!(boundaries[boundaries.len() - 2] <= end);
            for pair in boundaries.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
        }
    }
}

// =============================================================================
// Grouping Properties
// =============================================================================

mod grouping {
    use super::*;

    proptest! {
        /// Leaves partition the rows: every row in exactly one leaf
        #[test]
        fn leaves_partition_rows(keys in prop::collection::vec(0u8..5, 0..200)) {
            let labels: Vec<String> = keys.iter().map(|k| format!("g{}", k)).collect();
            let n = labels.len();
            let series = DataSeries::categorical(labels);
            let tree = CategoryTree::build(&[series], n);

            let mut seen: Vec<usize> = tree
                .leaves()
                .iter()
                .flat_map(|leaf| leaf.rows.iter().copied())
                .collect();
            seen.sort_unstable();
            let expected: Vec<usize> = (0..n).collect();
            prop_assert_eq!(seen, expected);
        }

        /// Two-level grouping has one leaf per distinct key pair
        #[test]
        fn leaf_count_matches_distinct_pairs(
            pairs in prop::collection::vec((0u8..4, 0u8..4), 1..120)
        ) {
            let outer = DataSeries::categorical(pairs.iter().map(|(a, _)| format!("a{}", a)));
            let inner = DataSeries::categorical(pairs.iter().map(|(_, b)| format!("b{}", b)));
            let tree = CategoryTree::build(&[outer, inner], pairs.len());

            let mut distinct: Vec<(u8, u8)> = pairs.clone();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(tree.leaves().len(), distinct.len());
        }

        /// Identical inputs group identically
        #[test]
        fn grouping_is_deterministic(keys in prop::collection::vec(0u8..6, 0..100)) {
            let labels: Vec<String> = keys.iter().map(|k| format!("g{}", k)).collect();
            let n = labels.len();
            let first = CategoryTree::build(&[DataSeries::categorical(labels.clone())], n);
            let second = CategoryTree::build(&[DataSeries::categorical(labels)], n);
            prop_assert_eq!(first, second);
        }
    }
}

// =============================================================================
// Accumulation Properties
// =============================================================================

mod accumulation {
    use super::*;

    fn daily_axis(n: usize) -> DataSeries {
        let base = NaiveDate::from_ymd_opt(2025, 1, 1)
            .expect("valid date")
            .and_time(NaiveTime::MIN);
        DataSeries::temporal((0..n).map(|i| base + Duration::days(i as i64)))
    }

    proptest! {
        /// The final cumulative sum equals the plain total
        #[test]
        fn cumulative_sum_conserves_total(values in prop::collection::vec(finite_value(), 1..50)) {
            let total: f64 = values.iter().sum();
            let axis = daily_axis(values.len());
            let quantity = DataSeries::numerical(values).with_name("q");

            let result = Accumulator::new(axis)
                .with_quantity(Quantity::new(quantity).with_aggregation(Aggregation::CumulativeSum))
                .accumulate()
                .expect("accumulation succeeds");

            let last = result.cells().last().expect("at least one cell");
            let emitted = last.series.numbers()[0];
            prop_assert!(
                (emitted - total).abs() <= 1e-9 * (1.0 + total.abs()),
                "running total {} drifted from {}",
                emitted,
                total
            );
        }

        /// Passthrough accumulation conserves the observation multiset
        #[test]
        fn identity_conserves_observations(
            rows in prop::collection::vec((finite_value(), 0u8..3), 1..80)
        ) {
            let values: Vec<f64> = rows.iter().map(|(v, _)| *v).collect();
            let groups = DataSeries::categorical(rows.iter().map(|(_, g)| format!("g{}", g)));
            let axis = daily_axis(rows.len());

            let result = Accumulator::new(axis)
                .with_category(groups)
                .with_quantity(Quantity::new(DataSeries::numerical(values.clone())))
                .accumulate()
                .expect("accumulation succeeds");

            let mut collected: Vec<f64> = result
                .cells()
                .iter()
                .flat_map(|c| c.series.numbers())
                .collect();
            let mut expected = values;
            collected.sort_by(f64::total_cmp);
            expected.sort_by(f64::total_cmp);
            prop_assert_eq!(collected, expected);
        }

        /// Per-bucket maxima never exceed the global maximum, and the global
        /// maximum survives into some cell
        #[test]
        fn max_policy_preserves_global_max(
            values in prop::collection::vec(finite_value(), 1..60)
        ) {
            let global = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let axis = daily_axis(values.len());

            let result = Accumulator::new(axis)
                .with_quantity(
                    Quantity::new(DataSeries::numerical(values).with_name("q"))
                        .with_aggregation(Aggregation::MaxValue),
                )
                .accumulate()
                .expect("accumulation succeeds");

            let cell_maxima: Vec<f64> = result
                .cells()
                .iter()
                .map(|c| c.series.numbers()[0])
                .collect();
            prop_assert!(cell_maxima.iter().all(|&m| m <= global));
            prop_assert!(cell_maxima.iter().any(|&m| m == global));
        }
    }
}
