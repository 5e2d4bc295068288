//! Carry-Forward Exchange Rate Lookups
//!
//! Exchange rates are not published every calendar day: weekends and bank
//! holidays are simply absent from the series. This library answers two
//! questions over such a sparse series:
//!
//! - "what was the most recent known rate as of day D" ([`latest`])
//! - "what is the rate for every day in `[start, end]`" ([`fill_range`])
//!
//! A missing day is filled with the most recent earlier observation, as long
//! as that observation is no older than the [`StalenessBound`]. Lookups that
//! cannot be answered credibly fail with a [`LookupError`]; a default value is
//! never substituted.
//!
//! # Example
//! ```
//! use chrono::NaiveDate;
//! use exchange_rates::{RatePoint, RateSeries, StalenessBound, latest};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 9, d).unwrap();
//! let series = RateSeries::new(vec![
//!     RatePoint::new(day(3), 1.10),
//!     RatePoint::new(day(2), 1.05),
//! ]);
//!
//! // Sunday 2024-09-08 carries forward Tuesday's rate (5 days old).
//! let rate = latest(&series, day(8), StalenessBound::DEFAULT).unwrap();
//! assert_eq!(rate, 1.10);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Reasons a point or range lookup cannot be answered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("No rate found")]
    NotFound,

    #[error(
        "Rate is for {observed}. This is {gap_days} days before {requested}, which exceeds the max of {max_days}"
    )]
    TooStale {
        observed: NaiveDate,
        requested: NaiveDate,
        gap_days: i64,
        max_days: u32,
    },

    #[error("Earliest available rate is for {earliest}. This is after the range start {start}")]
    InsufficientCoverage { earliest: NaiveDate, start: NaiveDate },

    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

// ─────────────────────────────────────────────────────────────────────────────
// Series
// ─────────────────────────────────────────────────────────────────────────────

/// A single observation: the rate published for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub day: NaiveDate,
    pub rate: f64,
}

impl RatePoint {
    pub fn new(day: NaiveDate, rate: f64) -> Self {
        Self { day, rate }
    }
}

/// Observations ordered from the newest day to the oldest.
///
/// The series is read-only once built; lookups only index into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateSeries {
    points: Vec<RatePoint>,
}

impl RateSeries {
    /// Builds a series from points in any order.
    pub fn new(mut points: Vec<RatePoint>) -> Self {
        points.sort_by(|a, b| b.day.cmp(&a.day));
        Self { points }
    }

    /// Builds a series from points already sorted descending by day,
    /// as returned by an `ORDER BY day DESC` query.
    pub fn from_descending(points: Vec<RatePoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].day >= w[1].day));
        Self { points }
    }

    pub fn points(&self) -> &[RatePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The most recent observation.
    pub fn newest(&self) -> Option<&RatePoint> {
        self.points.first()
    }

    /// The earliest observation.
    pub fn oldest(&self) -> Option<&RatePoint> {
        self.points.last()
    }
}

impl From<Vec<RatePoint>> for RateSeries {
    fn from(points: Vec<RatePoint>) -> Self {
        Self::new(points)
    }
}

/// Maximum age, in calendar days, of a carried-forward rate relative to the
/// day it stands in for. A gap equal to the bound is still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StalenessBound(u32);

impl StalenessBound {
    pub const DEFAULT: StalenessBound = StalenessBound(5);

    pub const fn days(days: u32) -> Self {
        Self(days)
    }

    pub fn as_days(&self) -> u32 {
        self.0
    }

    /// First day a caller must fetch so that `fill_range` can carry a value
    /// forward onto `start`.
    pub fn fetch_start(&self, start: NaiveDate) -> NaiveDate {
        start
            .checked_sub_days(Days::new(u64::from(self.0)))
            .unwrap_or(NaiveDate::MIN)
    }

    fn check(&self, observed: NaiveDate, requested: NaiveDate) -> Result<(), LookupError> {
        let gap_days = (requested - observed).num_days();
        if gap_days > i64::from(self.0) {
            return Err(LookupError::TooStale {
                observed,
                requested,
                gap_days,
                max_days: self.0,
            });
        }
        Ok(())
    }
}

impl Default for StalenessBound {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for StalenessBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lookups
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the rate in force on `day`: the newest observation on or before
/// `day`, provided it is no older than `bound`.
pub fn latest(series: &RateSeries, day: NaiveDate, bound: StalenessBound) -> Result<f64, LookupError> {
    let point = series
        .points()
        .iter()
        .find(|p| p.day <= day)
        .ok_or(LookupError::NotFound)?;

    bound.check(point.day, day)?;
    Ok(point.rate)
}

/// Returns one rate per calendar day in `[start, end]`, inclusive.
///
/// `series` must cover `[bound.fetch_start(start), end]`. Only the two ends of
/// the range are checked against `bound`; an interior day carries forward
/// whatever observation precedes it, however sparse the middle of the series.
pub fn fill_range(
    series: &RateSeries,
    start: NaiveDate,
    end: NaiveDate,
    bound: StalenessBound,
) -> Result<BTreeMap<NaiveDate, f64>, LookupError> {
    if start > end {
        return Err(LookupError::InvalidRange { start, end });
    }

    let points = series.points();
    // observations after `end` never stand in for a day in the range
    let (first, in_force) = points
        .iter()
        .enumerate()
        .find(|(_, p)| p.day <= end)
        .ok_or(LookupError::NotFound)?;
    let oldest = series.oldest().ok_or(LookupError::NotFound)?;

    // the rate in force on `end` must still be credible for it
    bound.check(in_force.day, end)?;

    // coverage must begin on or before the start of the range
    if start < oldest.day {
        return Err(LookupError::InsufficientCoverage {
            earliest: oldest.day,
            start,
        });
    }
    bound.check(oldest.day, start)?;

    let mut rates = BTreeMap::new();
    let mut cursor = first;
    let mut day = end;

    loop {
        // skip observations newer than the day being filled
        while points.get(cursor).is_some_and(|p| p.day > day) {
            cursor += 1;
        }
        let point = points.get(cursor).ok_or(LookupError::InsufficientCoverage {
            earliest: oldest.day,
            start,
        })?;
        rates.insert(day, point.rate);

        if day == start {
            break;
        }
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }

    Ok(rates)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
