//! Calendar interval stepping
//!
//! An [`Interval`] is a positive number of [`TemporalUnit`]s. Stepping with
//! sub-month units is fixed-duration arithmetic; stepping with months or
//! years follows civil-calendar rules, clamping the day of month when the
//! target month is shorter (Jan 31 + 1 month lands on Feb 28, or Feb 29 in a
//! leap year).

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Base units an interval can be expressed in
///
/// The set is closed; [`Interval::next`] matches it exhaustively and has no
/// unsupported-unit path. Unknown unit names can only appear when parsing
/// strings, where [`TemporalUnit::from_str`] rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemporalUnit {
    /// Thousandths of a second
    Milliseconds,
    /// Seconds
    Seconds,
    /// Minutes
    Minutes,
    /// Hours
    Hours,
    /// Civil days
    Days,
    /// Seven-day weeks
    Weeks,
    /// Calendar months, day-of-month clamped
    Months,
    /// Calendar years, Feb 29 clamped on non-leap targets
    Years,
}

impl TemporalUnit {
    /// Every supported unit, smallest to largest
    pub const ALL: [TemporalUnit; 8] = [
        TemporalUnit::Milliseconds,
        TemporalUnit::Seconds,
        TemporalUnit::Minutes,
        TemporalUnit::Hours,
        TemporalUnit::Days,
        TemporalUnit::Weeks,
        TemporalUnit::Months,
        TemporalUnit::Years,
    ];
}

impl fmt::Display for TemporalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TemporalUnit::Milliseconds => "milliseconds",
            TemporalUnit::Seconds => "seconds",
            TemporalUnit::Minutes => "minutes",
            TemporalUnit::Hours => "hours",
            TemporalUnit::Days => "days",
            TemporalUnit::Weeks => "weeks",
            TemporalUnit::Months => "months",
            TemporalUnit::Years => "years",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for TemporalUnit {
    type Err = Error;

    /// Parse a unit name, case-insensitively
    ///
    /// Accepts the full name, the singular, and a short form
    /// (`ms`, `s`, `min`, `h`, `d`, `w`, `mo`, `y`).
    ///
    /// # Example
    ///
    /// ```rust
    /// use timegrain::calendar::TemporalUnit;
    ///
    /// assert_eq!("Days".parse::<TemporalUnit>().unwrap(), TemporalUnit::Days);
    /// assert_eq!("mo".parse::<TemporalUnit>().unwrap(), TemporalUnit::Months);
    /// assert!("fortnights".parse::<TemporalUnit>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ms" | "millisecond" | "milliseconds" => Ok(TemporalUnit::Milliseconds),
            "s" | "second" | "seconds" => Ok(TemporalUnit::Seconds),
            "min" | "minute" | "minutes" => Ok(TemporalUnit::Minutes),
            "h" | "hour" | "hours" => Ok(TemporalUnit::Hours),
            "d" | "day" | "days" => Ok(TemporalUnit::Days),
            "w" | "week" | "weeks" => Ok(TemporalUnit::Weeks),
            "mo" | "month" | "months" => Ok(TemporalUnit::Months),
            "y" | "year" | "years" => Ok(TemporalUnit::Years),
            _ => Err(Error::UnsupportedUnit {
                unit: s.to_string(),
            }),
        }
    }
}

/// A fixed calendar step: `scalar` times `unit`
///
/// The scalar is validated at construction, so a held `Interval` always
/// advances time when stepped.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use timegrain::calendar::{Interval, TemporalUnit};
///
/// let quarterly = Interval::new(TemporalUnit::Months, 3).unwrap();
/// let from = NaiveDate::from_ymd_opt(2024, 11, 30).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let next = quarterly.next(from);
/// // Nov 2024 + 3 months lands in Feb 2025, which has 28 days, so the day clamps.
/// assert_eq!(next, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap().and_hms_opt(0, 0, 0).unwrap());
///
/// assert!(Interval::new(TemporalUnit::Days, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    unit: TemporalUnit,
    scalar: u32,
}

impl Interval {
    /// Create an interval of `scalar` units
    ///
    /// # Returns
    ///
    /// `Err(Error::InvalidScalar)` when `scalar` is 0; a zero-width step
    /// would never advance a bucket boundary.
    pub fn new(unit: TemporalUnit, scalar: u32) -> Result<Self> {
        if scalar == 0 {
            return Err(Error::InvalidScalar { scalar });
        }
        Ok(Self { unit, scalar })
    }

    /// The base unit
    pub fn unit(&self) -> TemporalUnit {
        self.unit
    }

    /// The number of units per step
    pub fn scalar(&self) -> u32 {
        self.scalar
    }

    /// The instant one step past `from`
    ///
    /// Sub-month units add a fixed duration. Months add to the month number
    /// with year carry and clamp the day of month to the target month's
    /// length; years behave as twelve-month steps, so Feb 29 lands on Feb 28
    /// when the target year is not a leap year. The result is strictly
    /// greater than `from`; steps that would leave chrono's representable
    /// range saturate at [`NaiveDateTime::MAX`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use timegrain::calendar::{Interval, TemporalUnit};
    ///
    /// let monthly = Interval::new(TemporalUnit::Months, 1).unwrap();
    /// let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap().and_hms_opt(9, 0, 0).unwrap();
    /// // 2024 is a leap year, so the clamp lands on Feb 29; time of day is kept.
    /// assert_eq!(
    ///     monthly.next(jan31),
    ///     NaiveDate::from_ymd_opt(2024, 2, 29).unwrap().and_hms_opt(9, 0, 0).unwrap()
    /// );
    /// ```
    pub fn next(&self, from: NaiveDateTime) -> NaiveDateTime {
        let n = i64::from(self.scalar);
        let stepped = match self.unit {
            TemporalUnit::Milliseconds => from.checked_add_signed(Duration::milliseconds(n)),
            TemporalUnit::Seconds => from.checked_add_signed(Duration::seconds(n)),
            TemporalUnit::Minutes => from.checked_add_signed(Duration::minutes(n)),
            TemporalUnit::Hours => from.checked_add_signed(Duration::hours(n)),
            TemporalUnit::Days => from.checked_add_signed(Duration::days(n)),
            TemporalUnit::Weeks => from.checked_add_signed(Duration::weeks(n)),
            TemporalUnit::Months => add_months(from, n),
            TemporalUnit::Years => add_months(from, n * 12),
        };
        stepped.unwrap_or(NaiveDateTime::MAX)
    }
}

impl Default for Interval {
    /// One civil day
    fn default() -> Self {
        Self {
            unit: TemporalUnit::Days,
            scalar: 1,
        }
    }
}

/// Add whole months to an instant, clamping the day of month
///
/// The time of day is preserved. Returns `None` only when the target year
/// falls outside chrono's representable range.
fn add_months(from: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let month0 = i64::from(from.month0()) + months;
    let year = i32::try_from(i64::from(from.year()) + month0.div_euclid(12)).ok()?;
    let month = (month0.rem_euclid(12) + 1) as u32;
    let day = from.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(from.time()))
}

/// Number of days in a civil month
///
/// Months outside `1..=12` yield 0.
///
/// # Example
///
/// ```rust
/// use timegrain::calendar::days_in_month;
///
/// assert_eq!(days_in_month(2024, 2), 29);
/// assert_eq!(days_in_month(2023, 2), 28);
/// assert_eq!(days_in_month(2023, 4), 30);
/// ```
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Whether `year` is a leap year
///
/// Divisible by 4 and not by 100, unless divisible by 400.
///
/// # Example
///
/// ```rust
/// use timegrain::calendar::is_leap_year;
///
/// assert!(is_leap_year(2024));
/// assert!(is_leap_year(2000));
/// assert!(!is_leap_year(1900));
/// assert!(!is_leap_year(2023));
/// ```
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
