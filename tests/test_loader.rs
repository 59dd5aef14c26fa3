use pretty_assertions::assert_eq;
use spread_report::loader::{load_series, load_series_from_reader, Dataset, SeriesRepository};
use spread_report::types::CountrySeries;
use spread_report::DashboardError;
use std::io::Write;
use tempfile::NamedTempFile;

const WHO_HEADER: &str =
    "Date_reported,Country_code,Country,WHO_region,New_cases,Cumulative_cases,New_deaths,Cumulative_deaths";

fn write_fixture(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", WHO_HEADER).unwrap();
    write!(file, "{}", body).unwrap();
    file.flush().unwrap();
    file
}

fn fixture() -> NamedTempFile {
    write_fixture(
        "\
2020-01-05,AF,Afghanistan,EMRO,,10,,0
2020-01-03,AF,Afghanistan,EMRO,,4,,0
2020-01-04,AF,Afghanistan,EMRO,,7,,0
2020-01-03,AL,Albania,EURO,,1,,0
2020-01-04,AL,Albania,EURO,,\"1,200\",,0
2020-01-04,AL,Albania,EURO,,1300,,0
not-a-date,AL,Albania,EURO,,5,,0
2020-01-06,AL,Albania,EURO,,unknown,,0
2020-01-06,,,EURO,,3,,0
",
    )
}

#[test]
fn test_series_are_sorted_and_unique() {
    let file = fixture();
    let data = load_series(file.path()).unwrap();

    assert_eq!(data.countries(), vec!["Afghanistan", "Albania"]);
    for country in data.countries() {
        let dates = data.series(country).unwrap().dates();
        assert!(dates.windows(2).all(|w| w[0] < w[1]), "{} not strictly ascending", country);
    }

    let afg = data.series("Afghanistan").unwrap();
    let values: Vec<u64> = afg.rows().iter().map(|r| r.value).collect();
    assert_eq!(values, vec![4, 7, 10]);
}

#[test]
fn test_duplicates_keep_last_row_and_bad_rows_are_counted() {
    let file = fixture();
    let data = load_series(file.path()).unwrap();

    let alb = data.series("Albania").unwrap();
    assert_eq!(alb.len(), 2);
    assert_eq!(alb.last().map(|r| r.value), Some(1300));

    let report = data.report();
    assert_eq!(report.total_rows, 9);
    assert_eq!(report.parse_errors, 3);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.loaded_rows, 5);
    assert_eq!(report.countries, 2);
}

#[test]
fn test_missing_file_is_a_data_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("WHO-COVID-19-global-daily-data.csv");
    match load_series(&path) {
        Err(DashboardError::DataLoad { path: p, .. }) => {
            assert!(p.ends_with("WHO-COVID-19-global-daily-data.csv"))
        }
        other => panic!("expected DataLoad, got {:?}", other),
    }
}

#[test]
fn test_missing_required_column_is_rejected() {
    let csv = "Date_reported,Country,New_cases\n2020-01-03,Chad,1\n";
    let err = load_series_from_reader(csv.as_bytes(), "trimmed.csv").unwrap_err();
    assert!(matches!(err, DashboardError::DataLoad { .. }));
    assert!(err.to_string().contains("Cumulative_cases"));
}

#[test]
fn test_header_only_file_is_rejected() {
    let file = write_fixture("");
    assert!(matches!(load_series(file.path()), Err(DashboardError::DataLoad { .. })));
}

#[test]
fn test_repository_reads_source_once() {
    let file = fixture();
    let path = file.path().to_path_buf();
    let repo = SeriesRepository::new(&path);
    assert!(!repo.is_loaded());

    assert_eq!(repo.countries().unwrap().len(), 2);
    assert!(repo.is_loaded());

    // The cached copy survives the file going away.
    drop(file);
    assert!(!path.exists());
    assert!(repo.series("Albania").unwrap().is_some());
}

#[test]
fn test_repository_retries_after_failed_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    let repo = SeriesRepository::new(&path);
    assert!(repo.dataset().is_err());

    std::fs::write(&path, format!("{}\n2021-03-01,NZ,New Zealand,WPRO,,2400,,26\n", WHO_HEADER)).unwrap();
    assert_eq!(repo.countries().unwrap(), vec!["New Zealand"]);
}

#[test]
fn test_repository_from_fixture_dataset() {
    let d = chrono::NaiveDate::from_ymd_opt(2022, 2, 1).unwrap();
    let series = CountrySeries::from_pairs("Fiji", &[(d, 10)]);
    let repo = SeriesRepository::from_dataset(Dataset::from_series(vec![series]));
    assert!(repo.is_loaded());
    assert_eq!(repo.countries().unwrap(), vec!["Fiji"]);
    assert!(repo.series("Tonga").unwrap().is_none());
}

#[test]
fn test_padded_header_names_are_accepted() {
    let csv = "Date_reported , Country_code, Country ,WHO_region,New_cases, Cumulative_cases\n\
               2021-03-01,NZ,New Zealand,WPRO,,2400\n\
               2021-03-02,NZ,New Zealand,WPRO,,2410\n";
    let data = load_series_from_reader(csv.as_bytes(), "padded.csv").unwrap();
    assert_eq!(data.countries(), vec!["New Zealand"]);
    let values: Vec<u64> = data.series("New Zealand").unwrap().rows().iter().map(|r| r.value).collect();
    assert_eq!(values, vec![2400, 2410]);
}
