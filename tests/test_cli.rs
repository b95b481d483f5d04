// Copyright (c) 2021 Tangram Robotics Inc. - All Rights Reserved
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// ----------------------------

use std::path::PathBuf;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;

fn resource(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("resources")
        .join(name)
}

fn cloudops_roi() -> Command {
    let mut cmd = Command::cargo_bin("cloudops-roi").expect("Calling binary failed");
    cmd.env_remove("CLOUDOPS_ROI__DATA_SOURCE__API_KEY")
        .env_remove("CLOUDOPS_ROI__DATA_SOURCE__APP_KEY");
    cmd
}

#[test]
fn test_cli() {
    cloudops_roi().assert().failure();
}

#[test]
fn test_calculate_strong_case() {
    cloudops_roi()
        .arg("calculate")
        .arg("--metrics")
        .arg(resource("metrics.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Annual Cost Savings: $697,406"))
        .stdout(predicate::str::contains("Migration Investment: $62,000"))
        .stdout(predicate::str::contains("Business Case: STRONG"));
}

#[test]
fn test_calculate_weak_case_single_service() {
    cloudops_roi()
        .args(&["calculate", "-s", "cloudwatch", "-m"])
        .arg(resource("small_estate.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Annual Cost Savings: $1,740"))
        .stdout(predicate::str::contains("Break-even Point: 358.6 months"))
        .stdout(predicate::str::contains("Business Case: WEAK"));
}

#[test]
fn test_calculate_json_output() {
    let output = cloudops_roi()
        .args(&["calculate", "--json", "--timeline-months", "12", "-m"])
        .arg(resource("metrics.json"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let analysis: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(analysis["business_case"], "STRONG");
    assert_eq!(analysis["timeline_months"], 12);
    assert_eq!(analysis["migration_cost"], 62000.0);
}

#[test]
fn test_calculate_missing_metrics_file() {
    cloudops_roi()
        .args(&["calculate", "-m", "thisfiledoesnotexist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read metrics file"));
}

#[test]
fn test_calculate_rejects_unknown_service() {
    cloudops_roi()
        .args(&["calculate", "-s", "cloudtrail", "-m"])
        .arg(resource("metrics.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--service"));
}

#[test]
fn test_pricing_env_override() {
    cloudops_roi()
        .arg("pricing")
        .env("CLOUDOPS_ROI__PRICING__CLOUDWATCH__METRICS", "0.25")
        .assert()
        .success()
        .stdout(predicate::str::contains("[cloudwatch]"))
        .stdout(predicate::str::contains("metrics = 0.25"))
        .stdout(predicate::str::contains("patch_management = 0.09"));
}

#[test]
fn test_missing_config_file() {
    cloudops_roi()
        .args(&["--config", "thisfiledoesnotexist.toml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_assess_without_data_source() {
    cloudops_roi()
        .arg("--config")
        .arg(resource("no_data_source.toml"))
        .arg("assess")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid assessment configuration"))
        .stderr(predicate::str::contains("\"data_source.type\" not found"));
}

#[test]
fn test_collect_malformed_config_date() {
    cloudops_roi()
        .arg("--config")
        .arg(resource("bad_date.toml"))
        .arg("collect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("analysis.start_date"))
        .stderr(predicate::str::contains("2024-13-01"));
}

#[test]
fn test_collect_malformed_cli_date() {
    cloudops_roi()
        .arg("--config")
        .arg(resource("bad_date.toml"))
        .args(&["collect", "--start-date", "2024-02-30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--start-date must be a YYYY-MM-DD date"));
}

#[test]
fn test_calculate_unknown_config_service() {
    cloudops_roi()
        .env("CLOUDOPS_ROI__AWS_SERVICES", "cloudtrail")
        .arg("calculate")
        .arg("--metrics")
        .arg(resource("metrics.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("aws_services"));
}
