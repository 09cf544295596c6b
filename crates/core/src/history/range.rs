//! Inclusive calendar-day ranges for history queries.

use chrono::NaiveDate;
use starledger_shared::AppError;
use thiserror::Error;

/// Range whose start falls after its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Start date {start} is after end date {end}")]
pub struct InvalidDateRange {
    /// Requested start.
    pub start: NaiveDate,
    /// Requested end.
    pub end: NaiveDate,
}

impl From<InvalidDateRange> for AppError {
    fn from(err: InvalidDateRange) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Inclusive day range with independently optional bounds.
///
/// A missing start means "from the beginning" and a missing end means "up to
/// the latest day"; a supplied bound is always kept as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateRange {
    /// Builds a range, rejecting `start > end`.
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, InvalidDateRange> {
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Err(InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Unbounded range.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Explicit lower bound, if any.
    #[must_use]
    pub const fn lower(&self) -> Option<NaiveDate> {
        self.start
    }

    /// Explicit upper bound, if any.
    #[must_use]
    pub const fn upper(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Effective start day.
    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start.unwrap_or(NaiveDate::MIN)
    }

    /// Effective end day.
    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.end.unwrap_or(NaiveDate::MAX)
    }

    /// Whether `day` falls inside the range, bounds included.
    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start() <= day && day <= self.end()
    }
}
