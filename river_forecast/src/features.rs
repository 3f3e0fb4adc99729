//! Date feature encoding
//!
//! A calendar date is turned into a fixed-length numeric vector that carries
//! both the raw calendar position and two cyclical (sine/cosine) encodings:
//! one over the solar year and one over the twelve months.
//!
//! The layout lives in exactly one place, [`FeatureSchema::seasonal_v1`].
//! Training and prediction both go through [`FeatureEncoder`], and every
//! fitted model stores the schema it was trained with so that predicting
//! under a different definition fails instead of silently drifting.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Length of the solar year used by the annual cycle, in days
pub const ANNUAL_PERIOD_DAYS: f64 = 365.25;

/// Length of the monthly cycle, in months
pub const MONTHLY_PERIOD: f64 = 12.0;

/// Feature names in vector order
pub const FEATURE_NAMES: [&str; FeatureVector::LEN] = [
    "year",
    "month",
    "day",
    "day_of_year",
    "annual_sin",
    "annual_cos",
    "monthly_sin",
    "monthly_cos",
];

/// Identity of a feature layout: ordered names plus cycle constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub name: String,
    pub version: u32,
    pub features: Vec<String>,
    pub annual_period: f64,
    pub monthly_period: f64,
}

impl FeatureSchema {
    /// Seasonal layout, version 1
    pub fn seasonal_v1() -> Self {
        Self {
            name: "seasonal".to_string(),
            version: 1,
            features: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            annual_period: ANNUAL_PERIOD_DAYS,
            monthly_period: MONTHLY_PERIOD,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::seasonal_v1()
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-v{} ({} features)",
            self.name,
            self.version,
            self.features.len()
        )
    }
}

/// Numeric encoding of a single date
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub year: f64,
    pub month: f64,
    pub day: f64,
    pub day_of_year: f64,
    pub annual_sin: f64,
    pub annual_cos: f64,
    pub monthly_sin: f64,
    pub monthly_cos: f64,
}

impl FeatureVector {
    /// Number of features
    pub const LEN: usize = 8;

    /// Values in [`FEATURE_NAMES`] order
    pub fn to_array(&self) -> [f64; Self::LEN] {
        [
            self.year,
            self.month,
            self.day,
            self.day_of_year,
            self.annual_sin,
            self.annual_cos,
            self.monthly_sin,
            self.monthly_cos,
        ]
    }

    /// (name, value) pairs, for verbose output
    pub fn named_values(&self) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES
            .iter()
            .copied()
            .zip(self.to_array())
            .collect()
    }
}

/// Maps dates to feature vectors under a fixed schema.
///
/// Encoding is pure and total over valid dates; validating user input is the
/// caller's job (see [`crate::calendar`]).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
}

impl FeatureEncoder {
    pub fn new() -> Self {
        Self {
            schema: FeatureSchema::seasonal_v1(),
        }
    }

    /// Schema every encoded vector follows
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Encode one date
    pub fn encode(&self, date: NaiveDate) -> FeatureVector {
        let day_of_year = date.ordinal() as f64;
        let month = date.month() as f64;
        let annual_angle = 2.0 * PI * day_of_year / self.schema.annual_period;
        let monthly_angle = 2.0 * PI * month / self.schema.monthly_period;

        FeatureVector {
            year: date.year() as f64,
            month,
            day: date.day() as f64,
            day_of_year,
            annual_sin: annual_angle.sin(),
            annual_cos: annual_angle.cos(),
            monthly_sin: monthly_angle.sin(),
            monthly_cos: monthly_angle.cos(),
        }
    }

    /// Encode many dates, preserving order
    pub fn encode_all(&self, dates: &[NaiveDate]) -> Vec<FeatureVector> {
        dates.iter().map(|&d| self.encode(d)).collect()
    }
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self::new()
    }
}
