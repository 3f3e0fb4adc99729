//! Level prediction for single days and whole months
//!
//! [`PredictionService`] validates the requested date, encodes it with the
//! same [`FeatureEncoder`] used in training and applies a [`FittedModel`].
//! The current date is read from an injected [`Clock`]; it decides where a
//! month forecast starts when the requested month is the current one.

use crate::calendar::{days_in_month, validate_date, validate_month, Season};
use crate::error::{ForecastError, Result};
use crate::features::{FeatureEncoder, FeatureVector};
use crate::fitted_model::FittedModel;
use crate::models::FittedRegressor;
use chrono::{Datelike, Local, NaiveDate, Weekday};
use log::{debug, warn};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A prediction this many years past the last training year is flagged
pub const DISTANT_YEAR_MARGIN: i32 = 5;

/// Source of "today"
pub trait Clock: fmt::Debug + Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock stuck on one date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Qualitative level bucket. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LevelCategory {
    /// Below 2 m
    VeryLow,
    /// 2 m up to 5 m
    Low,
    /// 5 m up to 8 m
    Normal,
    /// 8 m up to 12 m
    High,
    /// 12 m and above
    VeryHigh,
}

impl LevelCategory {
    pub fn from_level(level: f64) -> Self {
        if level < 2.0 {
            LevelCategory::VeryLow
        } else if level < 5.0 {
            LevelCategory::Low
        } else if level < 8.0 {
            LevelCategory::Normal
        } else if level < 12.0 {
            LevelCategory::High
        } else {
            LevelCategory::VeryHigh
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LevelCategory::VeryLow => "Very low",
            LevelCategory::Low => "Low",
            LevelCategory::Normal => "Normal",
            LevelCategory::High => "High",
            LevelCategory::VeryHigh => "Very high",
        }
    }
}

impl fmt::Display for LevelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Caveats attached to a single prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PredictionWarning {
    /// The model produced a level below zero
    NegativeLevel,
    /// The date lies well past the training data
    BeyondTrainingHistory { years_ahead: i32 },
}

impl fmt::Display for PredictionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionWarning::NegativeLevel => {
                write!(f, "negative level predicted; the model may be extrapolating")
            }
            PredictionWarning::BeyondTrainingHistory { years_ahead } => write!(
                f,
                "date is {} years past the training data; accuracy may be low",
                years_ahead
            ),
        }
    }
}

/// A predicted level with its date metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedLevel {
    pub date: NaiveDate,
    /// Meters
    pub level: f64,
    pub category: LevelCategory,
    pub season: Season,
    pub weekday: Weekday,
    #[serde(skip)]
    pub features: FeatureVector,
    pub warnings: Vec<PredictionWarning>,
}

impl PredictedLevel {
    pub fn day_of_year(&self) -> u32 {
        self.date.ordinal()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Applies a fitted model to calendar dates
#[derive(Debug, Clone)]
pub struct PredictionService<C: Clock = SystemClock> {
    encoder: FeatureEncoder,
    clock: C,
}

impl PredictionService<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for PredictionService<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> PredictionService<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            encoder: FeatureEncoder::new(),
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Predict the level for `day/month/year`
    pub fn predict_day<R: FittedRegressor>(
        &self,
        model: &FittedModel<R>,
        year: i32,
        month: i32,
        day: i32,
    ) -> Result<PredictedLevel> {
        let date = validate_date(year, month, day)?;
        self.predict_date(model, date)
    }

    /// Predict the level for an already valid date
    pub fn predict_date<R: FittedRegressor>(
        &self,
        model: &FittedModel<R>,
        date: NaiveDate,
    ) -> Result<PredictedLevel> {
        let mut predictions = self.predict_dates(model, &[date])?;
        predictions
            .pop()
            .ok_or_else(|| ForecastError::ModelError("model returned no prediction".to_string()))
    }

    /// Dates a month forecast covers. The current month starts today;
    /// any other month starts on day 1.
    pub fn month_days(&self, year: i32, month: i32) -> Result<Vec<NaiveDate>> {
        let month = validate_month(year, month)?;
        let last_day = days_in_month(year, month).ok_or_else(|| {
            ForecastError::InvalidDate(format!("{:02}/{} is out of range", month, year))
        })?;

        let today = self.clock.today();
        let first_day = if today.year() == year && today.month() == month {
            today.day()
        } else {
            1
        };

        Ok((first_day..=last_day)
            .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
            .collect())
    }

    /// Predict every remaining day of a month
    pub fn predict_month<R: FittedRegressor>(
        &self,
        model: &FittedModel<R>,
        year: i32,
        month: i32,
    ) -> Result<Vec<PredictedLevel>> {
        let dates = self.month_days(year, month)?;
        debug!("Predicting {} days of {:02}/{}", dates.len(), month, year);

        let predictions = self.predict_dates(model, &dates)?;
        let flagged = predictions.iter().filter(|p| p.has_warnings()).count();
        if flagged > 0 {
            warn!(
                "{} of {} predictions for {:02}/{} carry warnings",
                flagged,
                predictions.len(),
                month,
                year
            );
        }
        Ok(predictions)
    }

    fn check_schema<R: FittedRegressor>(&self, model: &FittedModel<R>) -> Result<()> {
        let expected = model.schema();
        let found = self.encoder.schema();
        if expected != found {
            return Err(ForecastError::SchemaMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    fn predict_dates<R: FittedRegressor>(
        &self,
        model: &FittedModel<R>,
        dates: &[NaiveDate],
    ) -> Result<Vec<PredictedLevel>> {
        self.check_schema(model)?;

        let features = self.encoder.encode_all(dates);
        let levels = model.predict_features(&features)?;
        let last_training_year = model.span().end.year();

        let predictions = dates
            .iter()
            .zip(features)
            .zip(levels)
            .map(|((&date, features), level)| {
                let warnings = warnings_for(date, level, last_training_year);
                if dates.len() == 1 {
                    for w in &warnings {
                        warn!("{}: {}", date, w);
                    }
                }

                PredictedLevel {
                    date,
                    level,
                    category: LevelCategory::from_level(level),
                    season: Season::of_month(date.month()),
                    weekday: date.weekday(),
                    features,
                    warnings,
                }
            })
            .collect();

        Ok(predictions)
    }
}

fn warnings_for(date: NaiveDate, level: f64, last_training_year: i32) -> Vec<PredictionWarning> {
    let mut warnings = Vec::new();
    if level < 0.0 {
        warnings.push(PredictionWarning::NegativeLevel);
    }
    let years_ahead = date.year() - last_training_year;
    if years_ahead > DISTANT_YEAR_MARGIN {
        warnings.push(PredictionWarning::BeyondTrainingHistory { years_ahead });
    }
    warnings
}

#[derive(Serialize)]
struct CsvRow<'a> {
    date: String,
    weekday: String,
    season: String,
    level: f64,
    category: &'a str,
}

/// Write predictions as CSV with a header row
pub fn write_csv<W: Write>(predictions: &[PredictedLevel], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for p in predictions {
        csv_writer.serialize(CsvRow {
            date: p.date.format("%Y-%m-%d").to_string(),
            weekday: p.weekday.to_string(),
            season: p.season.to_string(),
            level: p.level,
            category: p.category.label(),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write predictions to a CSV file at `path`
pub fn write_csv_file<P: AsRef<Path>>(predictions: &[PredictedLevel], path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_csv(predictions, file)?;
    debug!(
        "Wrote {} predictions to {}",
        predictions.len(),
        path.as_ref().display()
    );
    Ok(())
}
