//! Calendar helpers: month lengths, date validation and seasons.
//!
//! All dates are proleptic Gregorian. Years must be positive.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of days in `month` of `year`, leap years included.
///
/// Returns `None` for a month outside 1..=12 or a year chrono cannot represent.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };

    Some(next.signed_duration_since(first).num_days() as u32)
}

/// Validate a (year, month) pair and return the month as `u32`
pub fn validate_month(year: i32, month: i32) -> Result<u32> {
    if year <= 0 {
        return Err(ForecastError::InvalidDate(format!(
            "year must be positive (got {})",
            year
        )));
    }
    if !(1..=12).contains(&month) {
        return Err(ForecastError::InvalidDate(format!(
            "month must be between 1 and 12 (got {})",
            month
        )));
    }

    let month = month as u32;
    if days_in_month(year, month).is_none() {
        return Err(ForecastError::InvalidDate(format!(
            "year {} is outside the supported calendar range",
            year
        )));
    }

    Ok(month)
}

/// Validate a (year, month, day) triple and build the date
pub fn validate_date(year: i32, month: i32, day: i32) -> Result<NaiveDate> {
    let checked_month = validate_month(year, month)?;

    if day < 1 {
        return Err(ForecastError::InvalidDate(format!(
            "{:02}/{:02}/{} does not exist",
            day, month, year
        )));
    }

    NaiveDate::from_ymd_opt(year, checked_month, day as u32).ok_or_else(|| {
        ForecastError::InvalidDate(format!("{:02}/{:02}/{} does not exist", day, month, year))
    })
}

/// Season of the year, southern hemisphere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Summer,
    Autumn,
    Winter,
    Spring,
}

impl Season {
    /// Season a calendar month falls in
    pub fn of_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Summer,
            3..=5 => Season::Autumn,
            6..=8 => Season::Winter,
            _ => Season::Spring,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Summer => write!(f, "Summer"),
            Season::Autumn => write!(f, "Autumn"),
            Season::Winter => write!(f, "Winter"),
            Season::Spring => write!(f, "Spring"),
        }
    }
}
