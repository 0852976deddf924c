//! Inclusive date ranges and bucket boundary generation
//!
//! A [`Calendar`] is an inclusive `[start, end]` range materialized as one
//! instant per day. It doubles as a temporal axis (via
//! [`Calendar::as_series`]) and as the source of bucket boundaries for
//! accumulation (via [`Calendar::bucket_boundaries`]).

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::interval::Interval;
use crate::error::{Error, Result};
use crate::types::DataSeries;

/// An inclusive date range materialized as daily instants
///
/// A range whose `end` precedes its `start` is valid and simply empty: it
/// holds no instants and yields no bucket boundaries.
///
/// # Example
///
/// ```rust
/// use timegrain::calendar::Calendar;
///
/// let cal = Calendar::parse("2025-01-01", "2025-01-03").unwrap();
/// assert_eq!(cal.len(), 3);
///
/// let single = Calendar::parse("2025-01-01", "2025-01-01").unwrap();
/// assert_eq!(single.len(), 1);
///
/// let empty = Calendar::parse("2025-01-02", "2025-01-01").unwrap();
/// assert!(empty.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    start: NaiveDateTime,
    end: NaiveDateTime,
    instants: Vec<NaiveDateTime>,
}

impl Calendar {
    /// Create a calendar over `[start, end]`
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            instants: generate_daily(start, end),
        }
    }

    /// Create a calendar from date strings
    ///
    /// Each bound accepts `YYYY-MM-DD` (midnight) or `YYYY-MM-DDTHH:MM:SS`.
    ///
    /// # Returns
    ///
    /// `Err(Error::InvalidDateFormat)` if either bound matches neither
    /// format.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(
            Self::parse_instant(start)?,
            Self::parse_instant(end)?,
        ))
    }

    /// Parse one instant string
    ///
    /// The date-only form is interpreted as midnight. Both forms are exact:
    /// every field zero-padded to its full width, no surrounding whitespace,
    /// no trailing input.
    ///
    /// # Example
    ///
    /// ```rust
    /// use timegrain::calendar::Calendar;
    ///
    /// let midnight = Calendar::parse_instant("2025-06-01").unwrap();
    /// let precise = Calendar::parse_instant("2025-06-01T08:30:00").unwrap();
    /// assert!(midnight < precise);
    ///
    /// assert!(Calendar::parse_instant("01/06/2025").is_err());
    /// assert!(Calendar::parse_instant("2025-6-1").is_err());
    /// ```
    pub fn parse_instant(input: &str) -> Result<NaiveDateTime> {
        let malformed = || Error::InvalidDateFormat {
            input: input.to_string(),
        };
        if !has_strict_shape(input) {
            return Err(malformed());
        }
        if input.len() == 10 {
            return NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .map(|date| date.and_time(NaiveTime::MIN))
                .map_err(|_| malformed());
        }
        NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S").map_err(|_| malformed())
    }

    /// Start of the range (inclusive)
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// End of the range (inclusive)
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// The daily instants, strictly increasing
    pub fn instants(&self) -> &[NaiveDateTime] {
        &self.instants
    }

    /// Number of daily instants
    pub fn len(&self) -> usize {
        self.instants.len()
    }

    /// Whether the range holds no instants
    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }

    /// Whether `instant` falls inside `[start, end]`
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// The daily instants as a temporal series
    ///
    /// Lets a calendar stand in directly as the temporal axis of an
    /// accumulation.
    pub fn as_series(&self) -> DataSeries {
        DataSeries::temporal(self.instants.iter().copied())
    }

    /// Bucket boundaries `[b0, b1, ..., bk]` stepped by `interval`
    ///
    /// `b0` is the range start and each following boundary is one interval
    /// step on; the last boundary is the first one strictly past `end`, so
    /// the half-open buckets `[b_i, b_{i+1})` cover the whole inclusive
    /// range. An empty range yields no boundaries.
    ///
    /// # Example
    ///
    /// ```rust
    /// use timegrain::calendar::{Calendar, Interval, TemporalUnit};
    ///
    /// let cal = Calendar::parse("2025-01-01", "2025-01-03").unwrap();
    /// let daily = Interval::new(TemporalUnit::Days, 1).unwrap();
    /// // Three one-day buckets need four boundaries.
    /// assert_eq!(cal.bucket_boundaries(&daily).len(), 4);
    /// ```
    pub fn bucket_boundaries(&self, interval: &Interval) -> Vec<NaiveDateTime> {
        match bounded_boundaries(self.start, self.end, interval, usize::MAX) {
            Ok(boundaries) => boundaries,
            // A usize::MAX cap is never exceeded
            Err(_) => Vec::new(),
        }
    }
}

/// Whether `input` is byte-for-byte `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`
///
/// chrono's `parse_from_str` tolerates unpadded fields and signed years, so
/// the shape is pinned down before any field value is read.
fn has_strict_shape(input: &str) -> bool {
    let bytes = input.as_bytes();
    if bytes.len() != 10 && bytes.len() != 19 {
        return false;
    }
    bytes.iter().enumerate().all(|(pos, &byte)| match pos {
        4 | 7 => byte == b'-',
        10 => byte == b'T',
        13 | 16 => byte == b':',
        _ => byte.is_ascii_digit(),
    })
}

/// Generate daily instants over an inclusive range
///
/// Returns an empty vector when `end < start`.
fn generate_daily(start: NaiveDateTime, end: NaiveDateTime) -> Vec<NaiveDateTime> {
    let mut instants = Vec::new();
    let mut current = start;
    while current <= end {
        instants.push(current);
        match current.checked_add_signed(Duration::days(1)) {
            Some(next) => current = next,
            None => break,
        }
    }
    instants
}

/// Generate bucket boundaries, failing once the bucket count passes `limit`
///
/// The closing boundary is the first one strictly past `end`. A saturated
/// step that cannot advance ends the walk.
pub(crate) fn bounded_boundaries(
    start: NaiveDateTime,
    end: NaiveDateTime,
    interval: &Interval,
    limit: usize,
) -> Result<Vec<NaiveDateTime>> {
    if end < start {
        return Ok(Vec::new());
    }
    let mut boundaries = vec![start];
    let mut current = start;
    while current <= end {
        let next = interval.next(current);
        if next <= current {
            break;
        }
        boundaries.push(next);
        current = next;
        if boundaries.len() - 1 > limit {
            return Err(Error::BucketLimitExceeded {
                buckets: boundaries.len() - 1,
                limit,
            });
        }
    }
    Ok(boundaries)
}
