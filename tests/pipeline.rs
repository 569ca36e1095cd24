use health_etl::{
    output::TableFormat,
    pipeline::{run, RunConfig},
    process::{find_table_bounds, read_measure, ColumnNames, Sex},
    store::{BlobStore, LocalStore, MemoryStore},
    validate::{validate_keys, KeyField},
    EtlError,
};
use std::{fs, path::Path};
use tempfile::tempdir;
use tracing_subscriber::{fmt, EnvFilter};

const ACTIVITY: &str = "Percentages of physically active children among";
const OBESITY: &str = "Prevalence of overweight (including obesity) among";

fn init_logging() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("info,health_etl=debug"))
        .with_test_writer()
        .try_init();
}

fn write_raw(container: &Path, prefix: &str, age: u32, body: &str) {
    let raw = container.join("raw");
    fs::create_dir_all(&raw).unwrap();
    fs::write(raw.join(format!("{prefix} {age}-year-olds.csv")), body).unwrap();
}

fn who_export(title: &str, rows: &[&str]) -> String {
    let mut text = String::from("\u{feff}");
    text.push_str(title);
    text.push_str("\nIndicator: HBSC survey\n\"\"\nCOUNTRY,SEX,YEAR,VALUE\n");
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text.push_str("\nLast update,2022.12.05\nSource: WHO Regional Office for Europe\n");
    text
}

fn seed_container(container: &Path) {
    write_raw(
        container,
        ACTIVITY,
        11,
        &who_export(
            "Physical activity, 11-year-olds",
            &["ARM,MALE,2009,34.3", "ARM,FEMALE,2009,20.6", "AUT,MALE,2005,29"],
        ),
    );
    write_raw(
        container,
        ACTIVITY,
        13,
        &who_export("Physical activity, 13-year-olds", &["ARM,MALE,2009,25.1"]),
    );
    write_raw(
        container,
        OBESITY,
        11,
        &who_export(
            "Overweight, 11-year-olds",
            &["ARM,MALE,2009,12.1", "ARM,FEMALE,2009,No data", "BEL,MALE,2010,15"],
        ),
    );
    // Header present, no rows published for 13-year-olds.
    write_raw(
        container,
        OBESITY,
        13,
        &who_export("Overweight, 13-year-olds", &[]),
    );
}

fn config(ages: &[u32]) -> RunConfig {
    RunConfig {
        ages: ages.to_vec(),
        activity_prefix: ACTIVITY.into(),
        obesity_prefix: OBESITY.into(),
        ..RunConfig::default()
    }
}

#[test]
fn full_run_writes_processed_and_curated_layers() {
    init_logging();
    let dir = tempdir().unwrap();
    let container = dir.path().join("activity-obesity-data");
    seed_container(&container);

    let store = LocalStore::new(&container);
    let summary = run(&store, None, &config(&[11, 13])).unwrap();
    assert_eq!(summary.activity_rows, 4);
    assert_eq!(summary.obesity_rows, 3);
    assert_eq!(summary.merged_rows, 2);
    assert_eq!(summary.written.len(), 3);

    let curated = fs::read_to_string(container.join("curated").join("df_merged.csv")).unwrap();
    let lines: Vec<&str> = curated.lines().collect();
    assert_eq!(
        lines,
        vec![
            "COUNTRY,AGE,SEX,YEAR,ACTIVITY_VAL,OBESITY_VAL",
            "ARM,11,MALE,2009,34.3,12.1",
            "ARM,11,FEMALE,2009,20.6,",
        ]
    );

    let activity =
        fs::read_to_string(container.join("processed").join("activity_merged.csv")).unwrap();
    assert!(activity.starts_with("COUNTRY,SEX,YEAR,ACTIVITY_VAL,AGE\n"));
    assert_eq!(activity.lines().count(), 5);
    let obesity =
        fs::read_to_string(container.join("processed").join("obesity_merged.csv")).unwrap();
    assert!(obesity.starts_with("COUNTRY,SEX,YEAR,OBESITY_VAL,AGE\n"));
    assert!(!container.join("curated").join("df_merged.parquet").exists());
}

#[test]
fn parquet_and_snapshot_are_optional_extras() {
    init_logging();
    let dir = tempdir().unwrap();
    let container = dir.path().join("c");
    let snapshot_dir = dir.path().join("data").join("curated");
    seed_container(&container);

    let store = LocalStore::new(&container);
    let snapshot = LocalStore::new(&snapshot_dir);
    let cfg = RunConfig {
        formats: vec![TableFormat::Csv, TableFormat::Parquet],
        ..config(&[11])
    };
    let summary = run(&store, Some(&snapshot), &cfg).unwrap();

    assert_eq!(summary.written.len(), 8);
    assert!(snapshot_dir.join("df_merged.csv").is_file());
    assert!(snapshot_dir.join("df_merged.parquet").is_file());
    for stem in ["activity_merged", "obesity_merged"] {
        assert!(container.join("processed").join(format!("{stem}.parquet")).is_file());
    }
    assert!(container.join("curated").join("df_merged.parquet").is_file());
}

#[test]
fn dry_run_leaves_container_untouched() {
    init_logging();
    let dir = tempdir().unwrap();
    let container = dir.path().join("c");
    seed_container(&container);

    let store = LocalStore::new(&container);
    let cfg = RunConfig {
        dry_run: true,
        ..config(&[11, 13])
    };
    let summary = run(&store, None, &cfg).unwrap();
    assert_eq!(summary.merged_rows, 2);
    assert!(summary.written.is_empty());
    assert!(!container.join("processed").exists());
    assert!(!container.join("curated").exists());
}

#[test]
fn missing_header_aborts_before_any_write() {
    init_logging();
    let dir = tempdir().unwrap();
    let container = dir.path().join("c");
    seed_container(&container);
    write_raw(&container, OBESITY, 15, "Metadata only\nNo columns here\n");
    write_raw(&container, ACTIVITY, 15, &who_export("t", &["ARM,MALE,2009,1"]));

    let store = LocalStore::new(&container);
    let err = run(&store, None, &config(&[11, 13, 15])).unwrap_err();
    match &err {
        EtlError::HeaderNotFound { resource, .. } => {
            assert_eq!(resource, &format!("{OBESITY} 15-year-olds.csv"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("header not found"));
    assert!(!container.join("processed").exists());
}

#[test]
fn bad_year_aborts_the_run() {
    let store = MemoryStore::new()
        .with_text(
            &format!("raw/{ACTIVITY} 11-year-olds.csv"),
            "COUNTRY,SEX,YEAR,VALUE\nARM,MALE,2009/10,34.3\n",
        )
        .with_text(
            &format!("raw/{OBESITY} 11-year-olds.csv"),
            "COUNTRY,SEX,YEAR,VALUE\nARM,MALE,2009,12.1\n",
        );
    let err = run(&store, None, &config(&[11])).unwrap_err();
    assert!(matches!(err, EtlError::TypeCoercion { row: 1, .. }));
    assert_eq!(store.len(), 2);
}

#[test]
fn missing_raw_file_is_reported() {
    let dir = tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    let err = run(&store, None, &config(&[11])).unwrap_err();
    assert!(matches!(err, EtlError::Store(_)));
}

#[test]
fn scenario_unmatched_age_is_dropped() {
    // Both measures have (ARM, 11, MALE, 2009); activity also has age 13.
    let store = MemoryStore::new()
        .with_text(
            &format!("raw/{ACTIVITY} 11-year-olds.csv"),
            "COUNTRY,SEX,YEAR,VALUE\nARM,MALE,2009,34.3\n",
        )
        .with_text(
            &format!("raw/{ACTIVITY} 13-year-olds.csv"),
            "COUNTRY,SEX,YEAR,VALUE\nARM,MALE,2009,30.0\n",
        )
        .with_text(
            &format!("raw/{OBESITY} 11-year-olds.csv"),
            "COUNTRY,SEX,YEAR,VALUE\nARM,MALE,2009,12.1\n",
        )
        .with_text(
            &format!("raw/{OBESITY} 13-year-olds.csv"),
            "COUNTRY,SEX,YEAR,VALUE\n",
        );
    let summary = run(&store, None, &config(&[11, 13])).unwrap();
    assert_eq!(summary.activity_rows, 2);
    assert_eq!(summary.obesity_rows, 1);
    assert_eq!(summary.merged_rows, 1);

    let curated = String::from_utf8(store.get("curated/df_merged.csv").unwrap()).unwrap();
    assert_eq!(curated.lines().nth(1), Some("ARM,11,MALE,2009,34.3,12.1"));
    assert_eq!(curated.lines().count(), 2);
}

#[test]
fn reader_and_validator_compose() {
    let dir = tempdir().unwrap();
    seed_container(dir.path());
    let store = LocalStore::new(dir.path());

    let lines = store
        .open_text(&format!("raw/{ACTIVITY} 11-year-olds.csv"))
        .unwrap();
    let bounds = find_table_bounds(&lines, &ColumnNames::default().required()).unwrap();
    assert_eq!(bounds.header_index, 3);
    assert_eq!(bounds.data_row_count, 3);

    let records = read_measure(&store, &[11], ACTIVITY, &ColumnNames::default()).unwrap();
    assert_eq!(records[1].sex, Some(Sex::Female));
    validate_keys(&records, &KeyField::ALL, "activity").unwrap();
}
