//! Weekly / monthly revenue buckets over committed orders.
//!
//! A request for `[start, end)` is widened to the whole periods containing
//! `start` and the last day before `end`. Orders in that window are walked
//! newest first, emitting one bucket per period (zeros included) from the
//! most recent period back to the earliest.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use estore_core::Money;

use crate::{Order, OrderRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum RevenueError {
    #[error("invalid period: start {start} must be before end {end}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Week,
    Month,
}

/// Calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Bucket key: ISO week identified by its Sunday, or a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Period {
    WeekEnding(NaiveDate),
    Month(YearMonth),
}

impl Period {
    /// The period of `granularity` containing `date`.
    pub fn containing(date: NaiveDate, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Week => Period::WeekEnding(week_ending(date)),
            Granularity::Month => Period::Month(YearMonth::of(date)),
        }
    }

    /// The period immediately before this one.
    pub fn prev(self) -> Self {
        match self {
            Period::WeekEnding(sunday) => {
                Period::WeekEnding(week_ending(sunday.checked_sub_days(Days::new(7)).unwrap_or(NaiveDate::MIN)))
            }
            Period::Month(ym) => Period::Month(ym.prev()),
        }
    }

    /// First day of the period.
    pub fn first_day(self) -> Option<NaiveDate> {
        match self {
            Period::WeekEnding(sunday) => sunday.checked_sub_days(Days::new(6)),
            Period::Month(ym) => ym.first_day(),
        }
    }

    /// First day after the period.
    pub fn end_exclusive(self) -> Option<NaiveDate> {
        match self {
            Period::WeekEnding(sunday) => sunday.succ_opt(),
            Period::Month(ym) => ym.next().first_day(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::WeekEnding(sunday) => write!(f, "{sunday}"),
            Period::Month(ym) => write!(f, "{ym}"),
        }
    }
}

/// The Sunday closing `date`'s week. The final week of the calendar has no
/// representable Sunday and is labelled by `NaiveDate::MAX` instead.
fn week_ending(date: NaiveDate) -> NaiveDate {
    let to_sunday = 6 - u64::from(date.weekday().num_days_from_monday());
    date.checked_add_days(Days::new(to_sunday)).unwrap_or(NaiveDate::MAX)
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueBucket {
    pub period: Period,
    pub revenue: Money,
}

/// Buckets ordered most recent period first, with no gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueReport {
    pub granularity: Granularity,
    pub buckets: Vec<RevenueBucket>,
}

impl RevenueReport {
    pub fn get(&self, period: Period) -> Option<Money> {
        self.buckets.iter().find(|b| b.period == period).map(|b| b.revenue)
    }

    pub fn total(&self) -> Money {
        self.buckets.iter().map(|b| b.revenue).sum()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Read-only reporting over the order repository.
#[derive(Clone)]
pub struct RevenueAggregator {
    orders: Arc<dyn OrderRepository>,
}

impl RevenueAggregator {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub fn weekly(&self, start: NaiveDate, end: NaiveDate) -> Result<RevenueReport, RevenueError> {
        self.revenues(start, end, Granularity::Week)
    }

    pub fn monthly(&self, start: NaiveDate, end: NaiveDate) -> Result<RevenueReport, RevenueError> {
        self.revenues(start, end, Granularity::Month)
    }

    pub fn revenues(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Result<RevenueReport, RevenueError> {
        let invalid = || RevenueError::InvalidPeriod { start, end };
        if start >= end {
            return Err(invalid());
        }
        let last_day = end.pred_opt().ok_or_else(invalid)?;
        let first = Period::containing(start, granularity);
        let latest = Period::containing(last_day, granularity);

        // Periods touching the ends of the calendar are clamped to it.
        let from = first.first_day().map_or(DateTime::<Utc>::MIN_UTC, midnight);
        let to = latest.end_exclusive().map_or(DateTime::<Utc>::MAX_UTC, midnight);
        let mut orders = self.orders.find_by_time_range(from, to)?;
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        debug!(%first, %latest, orders = orders.len(), "aggregating revenue");
        Ok(RevenueReport {
            granularity,
            buckets: bucketize(&orders, first, latest, granularity),
        })
    }
}

/// Walk `orders` (newest first) from `latest` back to `first`.
fn bucketize(orders: &[Order], first: Period, latest: Period, granularity: Granularity) -> Vec<RevenueBucket> {
    let period_of = |o: &Order| Period::containing(o.created_at().date_naive(), granularity);

    let mut buckets = Vec::new();
    let mut current = latest;
    let mut acc = Money::ZERO;
    let mut i = 0;
    loop {
        match orders.get(i) {
            Some(o) if period_of(o) == current => {
                acc += o.revenue();
                i += 1;
            }
            Some(o) if period_of(o) > current => i += 1,
            _ => {
                buckets.push(RevenueBucket {
                    period: current,
                    revenue: acc,
                });
                acc = Money::ZERO;
                if current <= first {
                    break;
                }
                current = current.prev();
            }
        }
    }
    buckets
}
