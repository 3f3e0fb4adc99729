//! Historical level data
//!
//! The historical corpus is a JSON array of monthly records, one reading per
//! calendar day:
//!
//! ```json
//! [{ "ano": 2024, "mes": 2, "data": [12.3, 12.4, ...] }]
//! ```
//!
//! Records are validated against the calendar at load time and kept in
//! chronological order. Flattening a dataset yields one [`Observation`] per
//! day, which is what training consumes.

use crate::calendar::days_in_month;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// On-disk shape of one monthly record
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRecord {
    ano: i32,
    mes: i32,
    data: Vec<f64>,
}

/// One month of daily river levels, in meters
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRecord {
    year: i32,
    month: u32,
    daily_levels: Vec<f64>,
}

impl MonthlyRecord {
    /// Create a record, checking it against the calendar.
    ///
    /// `daily_levels` must hold exactly one finite value per day of the month.
    pub fn new(year: i32, month: i32, daily_levels: Vec<f64>) -> Result<Self> {
        let malformed = |reason: String| ForecastError::MalformedRecord {
            year,
            month,
            reason,
        };

        if year <= 0 {
            return Err(malformed("year must be positive".to_string()));
        }
        if !(1..=12).contains(&month) {
            return Err(malformed("month must be between 1 and 12".to_string()));
        }

        let expected = days_in_month(year, month as u32)
            .ok_or_else(|| malformed("year is outside the supported calendar range".to_string()))?;

        if daily_levels.len() != expected as usize {
            return Err(malformed(format!(
                "expected {} daily levels, found {}",
                expected,
                daily_levels.len()
            )));
        }

        if let Some(idx) = daily_levels.iter().position(|v| !v.is_finite()) {
            return Err(malformed(format!("day {} has a non-finite level", idx + 1)));
        }

        Ok(Self {
            year,
            month: month as u32,
            daily_levels,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Levels indexed by day of month minus one
    pub fn daily_levels(&self) -> &[f64] {
        &self.daily_levels
    }

    /// Number of days covered
    pub fn len(&self) -> usize {
        self.daily_levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.daily_levels.is_empty()
    }

    /// Dated observations for every day in the month
    pub fn observations(&self) -> impl Iterator<Item = Observation> + '_ {
        self.daily_levels
            .iter()
            .enumerate()
            .filter_map(move |(idx, &level)| {
                NaiveDate::from_ymd_opt(self.year, self.month, idx as u32 + 1)
                    .map(|date| Observation { date, level })
            })
    }
}

/// A single dated level reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub level: f64,
}

/// What to do when a (year, month) pair appears more than once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with [`ForecastError::DuplicateRecord`]
    Reject,
    /// Keep the record seen first
    FirstWins,
    /// Replace with the record seen last
    #[default]
    LastWins,
}

/// Monthly records keyed and ordered by (year, month)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalDataset {
    records: BTreeMap<(i32, u32), MonthlyRecord>,
}

impl HistoricalDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from records, resolving duplicates with `policy`
    pub fn from_records<I>(records: I, policy: DuplicatePolicy) -> Result<Self>
    where
        I: IntoIterator<Item = MonthlyRecord>,
    {
        let mut dataset = Self::new();
        for record in records {
            dataset.insert(record, policy)?;
        }
        Ok(dataset)
    }

    /// Insert one record. Returns `true` if the record is now part of the
    /// dataset and `false` if it was discarded under `FirstWins`.
    pub fn insert(&mut self, record: MonthlyRecord, policy: DuplicatePolicy) -> Result<bool> {
        let key = (record.year, record.month);
        match self.records.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
            Entry::Occupied(mut slot) => match policy {
                DuplicatePolicy::Reject => Err(ForecastError::DuplicateRecord {
                    year: key.0,
                    month: key.1,
                }),
                DuplicatePolicy::FirstWins => {
                    warn!(
                        "Duplicate record for {}/{:02}: keeping the first occurrence",
                        key.0, key.1
                    );
                    Ok(false)
                }
                DuplicatePolicy::LastWins => {
                    warn!(
                        "Duplicate record for {}/{:02}: replacing with the later occurrence",
                        key.0, key.1
                    );
                    slot.insert(record);
                    Ok(true)
                }
            },
        }
    }

    /// Number of monthly records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in chronological order
    pub fn records(&self) -> impl Iterator<Item = &MonthlyRecord> {
        self.records.values()
    }

    pub fn get(&self, year: i32, month: u32) -> Option<&MonthlyRecord> {
        self.records.get(&(year, month))
    }

    /// Flatten every record into dated observations, chronologically
    pub fn observations(&self) -> Vec<Observation> {
        self.records().flat_map(|r| r.observations()).collect()
    }

    /// Total number of daily readings
    pub fn observation_count(&self) -> usize {
        self.records().map(MonthlyRecord::len).sum()
    }

    /// First and last year present
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let first = self.records.keys().next()?.0;
        let last = self.records.keys().next_back()?.0;
        Some((first, last))
    }
}

/// Loader for the historical JSON corpus
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a dataset from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(
        path: P,
        policy: DuplicatePolicy,
    ) -> Result<HistoricalDataset> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset = Self::from_reader(BufReader::new(file), policy)?;

        info!(
            "Loaded {} monthly records ({} observations) from {}",
            dataset.len(),
            dataset.observation_count(),
            path.display()
        );

        Ok(dataset)
    }

    /// Load a dataset from any JSON reader
    pub fn from_reader<R: Read>(reader: R, policy: DuplicatePolicy) -> Result<HistoricalDataset> {
        let raw: Vec<RawRecord> = serde_json::from_reader(reader)?;
        Self::from_raw(raw, policy)
    }

    /// Load a dataset from a JSON string
    pub fn from_json_str(json: &str, policy: DuplicatePolicy) -> Result<HistoricalDataset> {
        let raw: Vec<RawRecord> = serde_json::from_str(json)?;
        Self::from_raw(raw, policy)
    }

    fn from_raw(raw: Vec<RawRecord>, policy: DuplicatePolicy) -> Result<HistoricalDataset> {
        let records = raw
            .into_iter()
            .map(|r| MonthlyRecord::new(r.ano, r.mes, r.data))
            .collect::<Result<Vec<_>>>()?;

        HistoricalDataset::from_records(records, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, month: i32, level: f64) -> MonthlyRecord {
        let days = days_in_month(year, month as u32).unwrap() as usize;
        MonthlyRecord::new(year, month, vec![level; days]).unwrap()
    }

    #[test]
    fn test_record_rejects_wrong_length() {
        let result = MonthlyRecord::new(2020, 4, vec![1.0; 31]);
        match result {
            Err(ForecastError::MalformedRecord { year, month, reason }) => {
                assert_eq!((year, month), (2020, 4));
                assert!(reason.contains("expected 30"));
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_record_rejects_bad_month_and_nan() {
        assert!(MonthlyRecord::new(2020, 13, vec![1.0; 31]).is_err());
        let mut levels = vec![1.0; 31];
        levels[4] = f64::NAN;
        assert!(MonthlyRecord::new(2020, 1, levels).is_err());
    }

    #[test]
    fn test_observations_follow_calendar() {
        let feb = record(2024, 2, 3.5);
        let obs: Vec<_> = feb.observations().collect();
        assert_eq!(obs.len(), 29);
        assert_eq!(obs[28].date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_dataset_is_chronological() {
        let dataset = HistoricalDataset::from_records(
            vec![record(2021, 3, 1.0), record(2020, 12, 2.0), record(2021, 1, 3.0)],
            DuplicatePolicy::Reject,
        )
        .unwrap();

        let keys: Vec<_> = dataset.records().map(|r| (r.year(), r.month())).collect();
        assert_eq!(keys, vec![(2020, 12), (2021, 1), (2021, 3)]);
        assert_eq!(dataset.year_range(), Some((2020, 2021)));
        assert_eq!(dataset.observation_count(), 31 + 31 + 31);
    }

    #[test]
    fn test_duplicate_policies() {
        let first = record(2022, 5, 1.0);
        let second = record(2022, 5, 9.0);

        let rejected = HistoricalDataset::from_records(
            vec![first.clone(), second.clone()],
            DuplicatePolicy::Reject,
        );
        assert!(matches!(
            rejected,
            Err(ForecastError::DuplicateRecord { year: 2022, month: 5 })
        ));

        let kept = HistoricalDataset::from_records(
            vec![first.clone(), second.clone()],
            DuplicatePolicy::FirstWins,
        )
        .unwrap();
        assert_eq!(kept.get(2022, 5).unwrap().daily_levels()[0], 1.0);

        let replaced =
            HistoricalDataset::from_records(vec![first, second], DuplicatePolicy::LastWins)
                .unwrap();
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced.get(2022, 5).unwrap().daily_levels()[0], 9.0);
    }
}
