// CmdSift - tests/e2e_pipeline.rs
//
// End-to-end tests for the extraction pipeline.
//
// These tests run against real files on disk: fixture logs are copied into a
// temp directory, processed through `ProcessingRun`, and the export files it
// writes are read back with the csv crate. Covers single-file and directory
// modes, dedup table scoping, and the fatal-line abort path.

use cmdsift::app::batch::{ProcessingRun, RunOptions};
use cmdsift::app::key_config;
use cmdsift::core::export::ExportFormat;
use cmdsift::core::model::{KeyConfig, NameLookup};
use cmdsift::platform::config::TableScope;
use cmdsift::util::constants;
use cmdsift::util::error::{CmdSiftError, ParseError};
use std::fs;
use std::path::{Path, PathBuf};

// =============================================================================
// Helpers
// =============================================================================

/// Absolute path to the on-disk fixture files.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Copy a fixture file to `dest`, creating parent directories.
fn copy_fixture(name: &str, dest: &Path) {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::copy(fixture(name), dest).unwrap();
}

fn keys() -> KeyConfig {
    KeyConfig::new(["0x51", "0x65"], ["0x01", "0x30"])
}

fn names() -> NameLookup {
    [
        ("0x51".to_string(), "Handshake".to_string()),
        ("0x01".to_string(), "Query engine basic status".to_string()),
    ]
    .into_iter()
    .collect()
}

/// Read an export CSV back as rows of strings (header excluded).
fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, constants::EXPORT_CSV_HEADER);
    reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

/// Head column (index 1) of each row.
fn heads(rows: &[Vec<String>]) -> Vec<&str> {
    rows.iter().map(|r| r[1].as_str()).collect()
}

// =============================================================================
// Single-file mode
// =============================================================================

/// A device trace yields the expected records, names, and hex blocks.
#[test]
fn e2e_single_file_csv_export() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("engine_session.log");
    copy_fixture("engine_session.log", &input);

    let mut run = ProcessingRun::new(keys(), names(), RunOptions::default());
    let summary = run.process_input(&input).unwrap();

    let output = dir.path().join("engine_session_parse.csv");
    assert_eq!(summary.files.len(), 1);
    let report = &summary.files[0];
    assert_eq!(report.output.as_deref(), Some(output.as_path()));
    assert_eq!(report.lines, 13);
    assert_eq!(report.records_finalized, 6);
    assert_eq!(report.records_retained, 4);
    assert_eq!(report.records_discarded(), 2);
    assert_eq!(report.orphan_subs, 1);

    let rows = read_csv(&output);
    assert_eq!(heads(&rows), vec!["0x51", "0x01", "0x01", "0x65"]);

    // Handshake with its two sub pairs.
    assert_eq!(rows[0][0], "Handshake");
    assert_eq!(rows[0][2], "0x51,0x30,0x31");
    assert_eq!(rows[0][3], "0x10,0x20,0x21");
    assert_eq!(
        rows[0][4],
        "CMD:[0x51]->[0x10]\n   :[0x30]->[0x20]\n   :[0x31]->[0x21]"
    );

    // Changed return value is kept; the unchanged repeat is not.
    assert_eq!(rows[1][3], "0x99");
    assert_eq!(rows[2][3], "0x98");

    // No name entry for 0x65.
    assert_eq!(rows[3][0], constants::MISSING_NAME_LABEL);
    assert_eq!(rows[3][4], "CMD:[0x65]->[0x00]\n   :[0x0A]->[0x0B]");
}

/// Output subfolder and JSON format are honoured.
#[test]
fn e2e_single_file_json_into_subfolder() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("engine_session.log");
    copy_fixture("engine_session.log", &input);

    let options = RunOptions {
        output_subfolder: "parsed".to_string(),
        format: ExportFormat::Json,
        ..Default::default()
    };
    let mut run = ProcessingRun::new(keys(), names(), options);
    run.process_input(&input).unwrap();

    let output = dir.path().join("parsed").join("engine_session_parse.json");
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["name"], "Handshake");
    assert_eq!(rows[0]["head"], "0x51");
}

/// A file with no listed commands still produces a header-only export.
#[test]
fn e2e_single_file_with_no_records() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("quiet.txt");
    fs::write(&input, "boot ok\n:CMD: [0x77]->[0x00]\n").unwrap();

    let mut run = ProcessingRun::new(keys(), names(), RunOptions::default());
    let summary = run.process_input(&input).unwrap();

    assert_eq!(summary.records_retained(), 0);
    assert_eq!(summary.records_discarded(), 1);
    assert!(read_csv(&dir.path().join("quiet_parse.csv")).is_empty());
}

// =============================================================================
// Directory mode
// =============================================================================

fn batch_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    copy_fixture("batch/a_first.log", &dir.path().join("a_first.log"));
    copy_fixture(
        "batch/nested/b_repeat.log",
        &dir.path().join("nested").join("b_repeat.log"),
    );
    copy_fixture("batch/readme.txt", &dir.path().join("readme.txt"));
    dir
}

/// Every `.log` file gets a `parse_<stem>` export next to it; the shared
/// table suppresses the unchanged repeat in the second file.
#[test]
fn e2e_directory_shares_table_across_files() {
    let dir = batch_dir();

    let mut run = ProcessingRun::new(keys(), names(), RunOptions::default());
    let summary = run.process_input(dir.path()).unwrap();

    assert_eq!(summary.files.len(), 2, "readme.txt must not be processed");
    assert!(!dir.path().join("parse_readme.csv").exists());

    let first = read_csv(&dir.path().join("parse_a_first.csv"));
    let second = read_csv(&dir.path().join("nested").join("parse_b_repeat.csv"));
    assert_eq!(heads(&first), vec!["0x51", "0x01"]);
    assert_eq!(heads(&second), vec!["0x51"]);
    assert_eq!(run.table().occupied(), 2);
}

/// With a per-file table both files export the same records.
#[test]
fn e2e_directory_per_file_table() {
    let dir = batch_dir();

    let options = RunOptions {
        table_scope: TableScope::PerFile,
        ..Default::default()
    };
    let mut run = ProcessingRun::new(keys(), names(), options);
    run.process_input(dir.path()).unwrap();

    let first = read_csv(&dir.path().join("parse_a_first.csv"));
    let second = read_csv(&dir.path().join("nested").join("parse_b_repeat.csv"));
    assert_eq!(heads(&first), heads(&second));
}

/// An undecodable line stops the whole run: earlier exports stay, later
/// files are never processed.
#[test]
fn e2e_undecodable_line_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    copy_fixture("batch/a_first.log", &dir.path().join("a_first.log"));
    // GBK text, then a line ending in a truncated lead byte.
    fs::write(
        dir.path().join("b_broken.log"),
        b"\xCE\xD5\xCA\xD6 :CMD: [0x51]->[0x10]\n[0x30]->[0x20] \x81\n".as_slice(),
    )
    .unwrap();
    copy_fixture("batch/a_first.log", &dir.path().join("c_later.log"));

    let mut run = ProcessingRun::new(keys(), names(), RunOptions::default());
    let err = run.process_input(dir.path()).unwrap_err();

    match err {
        CmdSiftError::Parse(ParseError::Aborted {
            file,
            line_number,
            line,
            ..
        }) => {
            assert!(file.ends_with("b_broken.log"));
            assert_eq!(line_number, 2);
            assert!(line.starts_with("[0x30]->[0x20]"));
        }
        other => panic!("expected Aborted, got {other:?}"),
    }

    assert!(dir.path().join("parse_a_first.csv").exists());
    assert!(!dir.path().join("parse_b_broken.csv").exists());
    assert!(!dir.path().join("parse_c_later.csv").exists());
}

// =============================================================================
// Configuration files
// =============================================================================

/// Keys loaded from a first-run default `config.csv` drive a real run.
#[test]
fn e2e_default_key_config_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join(constants::KEY_CONFIG_FILE_NAME);
    let (keys, warnings) = key_config::load_key_config(&config_path).unwrap();
    assert!(warnings.is_empty());

    let input = dir.path().join("t.log");
    fs::write(&input, ":CMD: [0x51]->[0x10]\n:CMD: [0x51]->[0x10]\n").unwrap();

    let mut run = ProcessingRun::new(keys, NameLookup::default(), RunOptions::default());
    let summary = run.process_input(&input).unwrap();
    // 0x51 is a default matchkey: both occurrences are kept.
    assert_eq!(summary.records_retained(), 2);
}
