// Integration tests for the riskforest binary
//
// Runs the compiled CLI against the fixture population and checks the
// printed table, JSON report, interactive prompt and failure modes.

#![allow(deprecated)] // Command::cargo_bin is deprecated but still functional

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/application_sample.csv")
}

fn riskforest() -> Command {
    Command::cargo_bin("riskforest").unwrap()
}

// ============================================================================
// Test 1: population head is printed without prompting
// ============================================================================

#[test]
fn test_prints_population_head() {
    riskforest()
        .arg("--population")
        .arg(fixture_path())
        .arg("--no-prompt")
        .assert()
        .success()
        .stdout(predicate::str::contains("ID"))
        .stdout(predicate::str::contains("risk_score"))
        .stdout(predicate::str::contains("5008804"))
        .stdout(predicate::str::contains("Enter customer details").not());
}

// ============================================================================
// Test 2: --head limits the table
// ============================================================================

#[test]
fn test_head_limits_rows() {
    let output = riskforest()
        .arg("-p")
        .arg(fixture_path())
        .arg("--no-prompt")
        .arg("--head")
        .arg("3")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    // Header plus three rows
    assert_eq!(stdout.lines().count(), 4);
}

// ============================================================================
// Test 3: JSON report covers the whole population with --head 0
// ============================================================================

#[test]
fn test_json_report() {
    let output = riskforest()
        .arg("-p")
        .arg(fixture_path())
        .arg("--no-prompt")
        .arg("--head")
        .arg("0")
        .arg("--format")
        .arg("json")
        .arg("--trees")
        .arg("100")
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    // 42 data rows, one duplicate ID
    assert_eq!(report["population_size"], 41);
    assert_eq!(report["num_trees"], 100);
    assert_eq!(report["population"].as_array().unwrap().len(), 41);
    assert!(report.get("query_risk_score").is_none());

    for entry in report["population"].as_array().unwrap() {
        let score = entry["risk_score"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&score));
    }
}

// ============================================================================
// Test 4: interactive applicant is scored
// ============================================================================

#[test]
fn test_interactive_applicant_scored() {
    let answers = "F\nN\n0\n157500\nWorking\nMarried\nHouse / apartment\nLaborers\n2\n";

    riskforest()
        .arg("-p")
        .arg(fixture_path())
        .write_stdin(answers)
        .assert()
        .success()
        .stdout(predicate::str::contains("Gender (M/F): "))
        .stdout(predicate::str::contains(
            "Predicted Unsupervised Credit Risk Score (0 = low risk, 1 = high risk):",
        ));
}

#[test]
fn test_interactive_json_keeps_stdout_clean() {
    let answers = "M\nY\n1\n180000\nWorking\nMarried\nHouse / apartment\nAstronaut\n3\n";

    let output = riskforest()
        .arg("-p")
        .arg(fixture_path())
        .arg("--format")
        .arg("json")
        .write_stdin(answers)
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(report["query_risk_score"].as_f64().unwrap().is_finite());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Total Income: "));
}

// ============================================================================
// Test 5: failure modes
// ============================================================================

#[test]
fn test_non_numeric_income_fails() {
    let answers = "F\nN\n0\nlots\n";

    riskforest()
        .arg("-p")
        .arg(fixture_path())
        .write_stdin(answers)
        .assert()
        .failure()
        .stderr(predicate::str::contains("AMT_INCOME_TOTAL"));
}

#[test]
fn test_missing_id_column_fails() {
    let tmp_dir = TempDir::new().unwrap();
    let csv = tmp_dir.path().join("no_id.csv");
    fs::write(
        &csv,
        "CODE_GENDER,FLAG_OWN_CAR,CNT_CHILDREN,AMT_INCOME_TOTAL,NAME_INCOME_TYPE,NAME_FAMILY_STATUS,NAME_HOUSING_TYPE,OCCUPATION_TYPE,CNT_FAM_MEMBERS\nM,Y,0,100000,Working,Married,Rented apartment,,2\n",
    )
    .unwrap();

    riskforest()
        .arg("-p")
        .arg(&csv)
        .arg("--no-prompt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("identifier column 'ID'"));
}

#[test]
fn test_missing_population_file_fails() {
    riskforest()
        .arg("-p")
        .arg("/nonexistent/application_record.csv")
        .arg("--no-prompt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load population"));
}

#[test]
fn test_zero_trees_rejected() {
    riskforest()
        .arg("-p")
        .arg(fixture_path())
        .arg("--no-prompt")
        .arg("--trees")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("num_trees"));
}

// ============================================================================
// Test 6: config file drives the fit, seeds reproduce output
// ============================================================================

#[test]
fn test_config_file_and_reproducible_output() {
    let tmp_dir = TempDir::new().unwrap();
    let config = tmp_dir.path().join("riskforest.toml");
    fs::write(&config, "num_trees = 64\nseed = 2024\nsubsample_size = 32\n").unwrap();

    let run = || {
        riskforest()
            .arg("-p")
            .arg(fixture_path())
            .arg("-c")
            .arg(&config)
            .arg("--no-prompt")
            .arg("--head")
            .arg("0")
            .output()
            .unwrap()
    };

    let first = run();
    let second = run();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}
