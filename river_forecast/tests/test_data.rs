use pretty_assertions::assert_eq;
use river_forecast::data::{DataLoader, DuplicatePolicy};
use river_forecast::ForecastError;
use std::io::Write;
use tempfile::NamedTempFile;

fn month_json(year: i32, month: i32, days: usize, level: f64) -> String {
    let values = vec![format!("{:.1}", level); days].join(", ");
    format!(r#"{{"ano": {}, "mes": {}, "data": [{}]}}"#, year, month, values)
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "[{}, {}]",
        month_json(2021, 3, 31, 10.0),
        month_json(2021, 2, 28, 9.5)
    )
    .unwrap();

    let dataset = DataLoader::from_json_file(file.path(), DuplicatePolicy::Reject).unwrap();

    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.observation_count(), 59);
    assert_eq!(dataset.year_range(), Some((2021, 2021)));

    // Chronological regardless of file order
    let observations = dataset.observations();
    assert_eq!(observations[0].date.to_string(), "2021-02-01");
    assert_eq!(observations[0].level, 9.5);
    assert_eq!(observations[58].date.to_string(), "2021-03-31");
}

#[test]
fn test_april_with_31_days_is_malformed() {
    let json = format!("[{}]", month_json(2020, 4, 31, 5.0));
    let result = DataLoader::from_json_str(&json, DuplicatePolicy::LastWins);

    match result {
        Err(ForecastError::MalformedRecord { year, month, .. }) => {
            assert_eq!((year, month), (2020, 4));
        }
        other => panic!("expected MalformedRecord, got {:?}", other),
    }
}

#[test]
fn test_leap_february() {
    let leap = format!("[{}]", month_json(2024, 2, 29, 3.0));
    assert!(DataLoader::from_json_str(&leap, DuplicatePolicy::Reject).is_ok());

    let not_leap = format!("[{}]", month_json(2023, 2, 29, 3.0));
    assert!(matches!(
        DataLoader::from_json_str(&not_leap, DuplicatePolicy::Reject),
        Err(ForecastError::MalformedRecord { .. })
    ));
}

#[test]
fn test_invalid_month_is_malformed() {
    let json = format!("[{}]", month_json(2020, 13, 31, 5.0));
    let err = DataLoader::from_json_str(&json, DuplicatePolicy::Reject).unwrap_err();
    assert!(err.to_string().contains("2020/13"));
}

#[test]
fn test_duplicate_records_follow_policy() {
    let json = format!(
        "[{}, {}]",
        month_json(2022, 6, 30, 4.0),
        month_json(2022, 6, 30, 6.0)
    );

    let last = DataLoader::from_json_str(&json, DuplicatePolicy::LastWins).unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last.get(2022, 6).unwrap().daily_levels()[0], 6.0);

    let first = DataLoader::from_json_str(&json, DuplicatePolicy::FirstWins).unwrap();
    assert_eq!(first.get(2022, 6).unwrap().daily_levels()[0], 4.0);

    assert!(matches!(
        DataLoader::from_json_str(&json, DuplicatePolicy::Reject),
        Err(ForecastError::DuplicateRecord {
            year: 2022,
            month: 6
        })
    ));
}

#[test]
fn test_loader_error_handling() {
    let missing = DataLoader::from_json_file("nonexistent_file.json", DuplicatePolicy::LastWins);
    assert!(missing.is_err());

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{{\"not\": \"an array\"}}").unwrap();
    let result = DataLoader::from_json_file(file.path(), DuplicatePolicy::LastWins);
    assert!(matches!(result, Err(ForecastError::SerializationError(_))));
}
