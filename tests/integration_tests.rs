//! Integration tests for the gravcal CLI
//!
//! These tests exercise the commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// gravcal command isolated from the user's config and environment
fn gravcal(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gravcal").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("GRAVCAL_LOG")
        .env_remove("GRAVCAL_OPERATOR")
        .env_remove("GRAVCAL_REFERENCE_DENSITY")
        .env_remove("GRAVCAL_EVAPORATION_LOSS")
        .env_remove("GRAVCAL_DECIMALS");
    cmd
}

/// 1000 µL pipette, two runs; run 2 delivers about 3% short
const PIPETTE_CSV: &str = "\
1000,1000
1000,1000
21,21
0.9970,0.9700
1.9940,1.9400
2.9910,2.9100
";

const PIPETTE_OK_CSV: &str = "\
1000
1000
21
\"0,9970\"
\"1,9940\"
\"2,9910\"
";

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn env_args() -> [&'static str; 6] {
    ["--air-temp", "21", "--pressure", "1012", "--humidity", "55"]
}

// ============================================================================
// Catalogue and lookup commands
// ============================================================================

#[test]
fn test_help() {
    let tmp = TempDir::new().unwrap();
    gravcal(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("calc"))
        .stdout(predicate::str::contains("limits"));
}

#[test]
fn test_classes_lists_catalogue() {
    let tmp = TempDir::new().unwrap();
    gravcal(tmp.path())
        .arg("classes")
        .assert()
        .success()
        .stdout(predicate::str::contains("msa"))
        .stdout(predicate::str::contains("ISO 8655-2:2022"))
        .stdout(predicate::str::contains("ISO 1042:1998"));
}

#[test]
fn test_classes_json() {
    let tmp = TempDir::new().unwrap();
    let output = gravcal(tmp.path())
        .args(["classes", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 11);

    let output = gravcal(tmp.path())
        .args(["classes", "--family", "piston", "-f", "json"])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 6);
}

#[test]
fn test_limits_for_pipette() {
    let tmp = TempDir::new().unwrap();
    gravcal(tmp.path())
        .args(["limits", "--class", "msa", "--nominal", "1000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.800"))
        .stdout(predicate::str::contains("0.300"));
}

#[test]
fn test_limits_scaled_by_tested_volume() {
    let tmp = TempDir::new().unwrap();
    let output = gravcal(tmp.path())
        .args(["limits", "-c", "msa", "-n", "1000", "-t", "100", "-f", "json"])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let limit = value["systematic"]["limit"].as_f64().unwrap();
    assert!((limit - 8.0).abs() < 1e-9);
}

#[test]
fn test_limits_unlisted_flask_size() {
    let tmp = TempDir::new().unwrap();
    gravcal(tmp.path())
        .args(["limits", "--class", "bv", "--nominal", "37"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lists no 37 mL size"));
}

#[test]
fn test_unknown_class_rejected() {
    let tmp = TempDir::new().unwrap();
    gravcal(tmp.path())
        .args(["limits", "--class", "xyz", "--nominal", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown instrument class"));
}

#[test]
fn test_density_json() {
    let tmp = TempDir::new().unwrap();
    let output = gravcal(tmp.path())
        .args(["density", "--water-temp", "20", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rho_w = value["water_density"].as_f64().unwrap();
    assert!((rho_w - 0.998203).abs() < 1e-5);
    let z = value["conversion_factor"].as_f64().unwrap();
    assert!((z - 1.0029).abs() < 1e-3);
}

// ============================================================================
// Calculation
// ============================================================================

#[test]
fn test_calc_csv_table() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "runs.csv", PIPETTE_CSV);
    gravcal(tmp.path())
        .args(["calc", "runs.csv", "--class", "msa"])
        .args(env_args())
        .assert()
        .success()
        .stdout(predicate::str::contains("ISO 8655-6:2022"))
        .stdout(predicate::str::contains("non-conform"))
        .stdout(predicate::str::contains("run 2"));
}

#[test]
fn test_calc_csv_format() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "runs.csv", PIPETTE_CSV);
    let output = gravcal(tmp.path())
        .args(["calc", "runs.csv", "-c", "msa", "-f", "csv"])
        .args(env_args())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("run,nominal (µL)"));
    assert!(lines[1].starts_with("1,1000.00,1000.00,3,"));
}

#[test]
fn test_calc_json_report() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "runs.csv", PIPETTE_CSV);
    let output = gravcal(tmp.path())
        .args(["calc", "runs.csv", "-c", "msa", "-f", "json"])
        .args(env_args())
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let runs = value["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["status"], "evaluated");
    assert_eq!(runs[0]["systematic"]["conformity"], "conform");
    assert_eq!(runs[1]["systematic"]["conformity"], "non_conform");
}

#[test]
fn test_calc_strict_fails_on_non_conformity() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "runs.csv", PIPETTE_CSV);
    gravcal(tmp.path())
        .args(["calc", "runs.csv", "-c", "msa", "--strict", "-q"])
        .args(env_args())
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-conform"));
}

#[test]
fn test_calc_strict_passes_when_conform() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "ok.csv", PIPETTE_OK_CSV);
    gravcal(tmp.path())
        .args(["calc", "ok.csv", "-c", "msa", "--strict"])
        .args(env_args())
        .assert()
        .success()
        .stdout(predicate::str::contains("no non-conformity"));
}

#[test]
fn test_calc_requires_class_for_csv() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "runs.csv", PIPETTE_CSV);
    gravcal(tmp.path())
        .args(["calc", "runs.csv"])
        .args(env_args())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no instrument class"));
}

#[test]
fn test_calc_requires_environment() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "runs.csv", PIPETTE_CSV);
    gravcal(tmp.path())
        .args(["calc", "runs.csv", "-c", "msa", "--air-temp", "21"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing pressure"));
}

#[test]
fn test_calc_semicolon_csv_with_decimal_comma() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "runs.csv", "1000;1000\n1000;1000\n21;21\n0,9970;0,9700\n1,9940;1,9400\n2,9910;2,9100\n");
    let output = gravcal(tmp.path())
        .args(["calc", "runs.csv", "-c", "msa", "-f", "json"])
        .args(env_args())
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let runs = value["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["systematic"]["conformity"], "conform");
    assert_eq!(runs[1]["systematic"]["conformity"], "non_conform");
}

#[test]
fn test_calc_flags_invalid_cell() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "bad.csv", "1000,1000\n1000,1000\n21,21\n0.997,0.997\n1.994,oops\n2.991,2.991\n");
    gravcal(tmp.path())
        .args(["calc", "bad.csv", "-c", "msa"])
        .args(env_args())
        .assert()
        .success()
        .stdout(predicate::str::contains("row 5, column 2"));
}

#[test]
fn test_calc_sheet() {
    let tmp = TempDir::new().unwrap();
    write(
        &tmp,
        "flask.yaml",
        r#"
title: Flask 100 mL
operator: QC lab
instrument:
  class: bv
environment:
  air_temperature: 21
  pressure: 1012
  humidity: 55
columns:
  - [100, 100, 60, 21, 159.72, 159.71, 159.73]
"#,
    );
    gravcal(tmp.path())
        .args(["calc", "flask.yaml", "-f", "md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Flask 100 mL"))
        .stdout(predicate::str::contains("ISO 4787:2021"))
        .stdout(predicate::str::contains("Operator: QC lab"));
}

#[test]
fn test_calc_sheet_yaml_error_points_at_source() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "broken.yaml", "title: x\ninstrument:\n  class: zz\ncolumns: []\n");
    gravcal(tmp.path())
        .args(["calc", "broken.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gravcal::yaml::syntax"));
}

#[test]
fn test_calc_output_file() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "runs.csv", PIPETTE_CSV);
    gravcal(tmp.path())
        .args(["calc", "runs.csv", "-c", "msa", "-f", "yaml", "-o", "report.yaml"])
        .args(env_args())
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote report"));

    let report = fs::read_to_string(tmp.path().join("report.yaml")).unwrap();
    assert!(report.contains("ISO 8655-6:2022"));
    assert!(report.contains("runs:"));
}

#[test]
fn test_calc_uses_local_config() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "runs.csv", PIPETTE_OK_CSV);
    write(&tmp, ".gravcal.yaml", "decimals: 4\ndefault_format: csv\n");
    gravcal(tmp.path())
        .args(["calc", "runs.csv", "-c", "msa"])
        .args(env_args())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("run,"))
        .stdout(predicate::str::contains("1000.0000"));
}

// ============================================================================
// Sheet templates and completions
// ============================================================================

#[test]
fn test_new_sheet() {
    let tmp = TempDir::new().unwrap();
    gravcal(tmp.path())
        .env("GRAVCAL_OPERATOR", "Tester")
        .args(["new", "sheets/bu50.yaml", "--class", "bu", "--runs", "2", "--replicates", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    let content = fs::read_to_string(tmp.path().join("sheets/bu50.yaml")).unwrap();
    assert!(content.contains("class: bu"));
    assert!(content.contains("operator: \"Tester\""));
    assert!(content.contains("# run 2"));

    gravcal(tmp.path())
        .args(["new", "sheets/bu50.yaml", "--class", "bu"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    gravcal(tmp.path())
        .args(["new", "sheets/bu50.yaml", "--class", "msa", "--force", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_completions() {
    let tmp = TempDir::new().unwrap();
    gravcal(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gravcal"));
}
