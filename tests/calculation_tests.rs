//! Cross-module calculation scenarios
//!
//! These drive the library from grid to verdict the way the CLI does, plus
//! the reference scenarios worked out by hand for ISO 8655 pipettes.

use approx::assert_abs_diff_eq;
use proptest::prelude::*;

use gravcal::core::{
    calculate, evaluate, reduce, Conformity, ConvertedRun, EnvironmentalConditions, ErrorKind,
    ErrorUnit, Family, InstrumentClass, InstrumentSpec, ReadingGrid, RunOutcome,
};
use gravcal::entities::CalibrationSheet;

fn lab() -> EnvironmentalConditions {
    EnvironmentalConditions::new(21.0, 1012.0, 55.0)
}

fn pipette_run(volumes: Vec<f64>) -> ConvertedRun {
    ConvertedRun {
        column: 0,
        nominal: 1000.0,
        tested: 1000.0,
        volumes,
        water_temperature: 21.0,
        conversion_factor: 1.0031,
    }
}

#[test]
fn test_pipette_within_tolerance() {
    let result = reduce(&pipette_run(vec![998.5, 999.0, 999.5]), Family::Piston).unwrap();
    assert_abs_diff_eq!(result.mean, 999.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.systematic_error, -0.1, epsilon = 1e-9);

    let verdict = evaluate(
        InstrumentClass::Msa,
        ErrorKind::Systematic,
        1000.0,
        1000.0,
        result.systematic_error,
    );
    assert_eq!(verdict.limit, Some(0.8));
    assert_eq!(verdict.conformity, Conformity::Conform);
}

#[test]
fn test_pipette_outside_tolerance() {
    let result = reduce(&pipette_run(vec![969.0, 970.0, 971.0]), Family::Piston).unwrap();
    assert_abs_diff_eq!(result.systematic_error, -3.0, epsilon = 1e-9);

    let verdict = evaluate(
        InstrumentClass::Msa,
        ErrorKind::Systematic,
        1000.0,
        1000.0,
        result.systematic_error,
    );
    assert_eq!(verdict.conformity, Conformity::NonConform);
}

#[test]
fn test_single_measurement_yields_no_verdict() {
    let grid = ReadingGrid::from_values(&[vec![1000.0, 1000.0, 21.0, 0.9975]]);
    let report = calculate(&grid, &lab(), &InstrumentSpec::new(InstrumentClass::Msa), false);

    match &report.runs[0].outcome {
        RunOutcome::NoResult { failure, converted } => {
            assert_eq!(failure.kind, "insufficient_replicates");
            assert_eq!(converted.replicate_count(), 1);
        }
        other => panic!("expected no_result, got {:?}", other),
    }
    assert!(report.runs[0].verdicts().is_none());
    assert!(!report.all_conform());
}

#[test]
fn test_unlisted_flask_size_is_unevaluable() {
    // 37 mL flask: container 25 g, water 21 °C, three fills
    let grid = ReadingGrid::from_values(&[vec![37.0, 37.0, 25.0, 21.0, 61.89, 61.90, 61.88]]);
    let report = calculate(&grid, &lab(), &InstrumentSpec::new(InstrumentClass::Bv), false);

    let (sys, rnd) = report.runs[0].verdicts().unwrap();
    assert_eq!(sys.conformity, Conformity::Unevaluable);
    assert_eq!(sys.is_conform(), None);
    assert_eq!(rnd.conformity, Conformity::Unevaluable);
    assert_eq!(report.notices().len(), 2);
    // Unevaluable is neither a pass nor a fail
    assert!(report.non_conformities().is_empty());
}

#[test]
fn test_flask_end_to_end_absolute_error() {
    // 100 mL flask; Z near 1.003 at 21 °C puts 99.72 g at about 100.02 mL
    let grid = ReadingGrid::from_values(&[vec![
        100.0, 100.0, 60.0, 21.0, 159.72, 159.71, 159.73,
    ]]);
    let report = calculate(&grid, &lab(), &InstrumentSpec::new(InstrumentClass::Bv), false);

    let result = report.runs[0].result().unwrap();
    assert_eq!(result.systematic_unit, ErrorUnit::Absolute);
    assert!(result.systematic_error.abs() < 0.1);

    let (sys, _) = report.runs[0].verdicts().unwrap();
    assert_eq!(sys.limit, Some(0.10));
    assert_eq!(sys.conformity, Conformity::Conform);
    assert_eq!(report.method, "ISO 4787:2021");
}

#[test]
fn test_error_unit_follows_family() {
    let pipette = ReadingGrid::from_values(&[vec![100.0, 100.0, 21.0, 0.0996, 0.1993, 0.2990]]);
    let report = calculate(&pipette, &lab(), &InstrumentSpec::new(InstrumentClass::Msd), false);
    let result = report.runs[0].result().unwrap();
    assert_eq!(result.systematic_unit, ErrorUnit::Percent);

    let burette = ReadingGrid::from_values(&[vec![25.0, 25.0, 30.0, 21.0, 54.90, 54.91]]);
    let report = calculate(&burette, &lab(), &InstrumentSpec::new(InstrumentClass::Bu), false);
    let result = report.runs[0].result().unwrap();
    assert_eq!(result.systematic_unit, ErrorUnit::Absolute);
    // 24.90 g converts below the 25 mL tested volume
    assert!(result.systematic_error < 0.0);
}

#[test]
fn test_bad_column_is_isolated() {
    let grid = ReadingGrid::from_columns(&[
        vec![Some("200"), Some("200"), Some("21"), Some("0,1994"), Some("0,3990"), Some("0,5984")],
        vec![Some("200"), Some("200"), Some("21"), Some("0,1994"), Some("n/a"), Some("0,5984")],
        vec![Some("200"), Some("200"), None, Some("0,1994"), Some("0,3990")],
    ]);
    let report = calculate(&grid, &lab(), &InstrumentSpec::new(InstrumentClass::Msa), false);

    assert!(report.runs[0].result().is_some());
    let flagged = report.flagged_cells();
    assert_eq!(flagged.len(), 2);
    assert_eq!((flagged[0].0.row, flagged[0].0.column), (4, 1));
    // Missing water temperature
    assert_eq!((flagged[1].0.row, flagged[1].0.column), (2, 2));
}

#[test]
fn test_decimal_comma_matches_decimal_point() {
    let comma = ReadingGrid::from_csv_reader(
        "1000\n1000\n\"21,5\"\n\"0,9971\"\n\"1,9943\"\n\"2,9915\"\n".as_bytes(),
    )
    .unwrap();
    let point =
        ReadingGrid::from_csv_reader("1000\n1000\n21.5\n0.9971\n1.9943\n2.9915\n".as_bytes())
            .unwrap();
    let spec = InstrumentSpec::new(InstrumentClass::Msa);
    assert_eq!(
        calculate(&comma, &lab(), &spec, false),
        calculate(&point, &lab(), &spec, false)
    );
}

#[test]
fn test_sheet_end_to_end() {
    let sheet = CalibrationSheet::parse(
        r#"
title: Dispenser 10 mL
instrument:
  class: dis
environment:
  air_temperature: 22
  pressure: 1005
  humidity: 48
tare: true
columns:
  - [10, 10, 22, 9.96, 9.97, 9.95, 9.96]
"#,
        "dis.yaml",
    )
    .unwrap();

    let env = sheet.environment.resolve().unwrap();
    let report = calculate(&sheet.grid(), &env, &sheet.instrument.spec(), sheet.tare);
    assert!(report.tare);
    assert_eq!(report.method, "ISO 8655-6:2022");

    let (sys, rnd) = report.runs[0].verdicts().unwrap();
    assert_eq!(sys.standard, "ISO 8655-5:2022");
    assert_eq!(sys.limit, Some(0.5));
    assert_eq!(rnd.limit, Some(0.1));
    assert!(sys.is_conform().is_some());
}

proptest! {
    #[test]
    fn prop_calculation_is_repeatable(
        tw in 15.0f64..30.0,
        readings in prop::collection::vec(0.09f64..0.11, 2..10),
    ) {
        let mut column = vec![100.0, 100.0, tw];
        let mut total = 0.0;
        for r in &readings {
            total += r;
            column.push(total);
        }
        let grid = ReadingGrid::from_values(&[column]);
        let spec = InstrumentSpec::new(InstrumentClass::Msa);
        let a = calculate(&grid, &lab(), &spec, false);
        let b = calculate(&grid, &lab(), &spec, false);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_verdict_matches_limit(
        nominal in 1.0f64..10000.0,
        error in -5.0f64..5.0,
    ) {
        let v = evaluate(InstrumentClass::Mmc, ErrorKind::Random, nominal, nominal, error);
        let limit = v.limit.unwrap();
        prop_assert_eq!(v.is_conform(), Some(error.abs() <= limit));
    }

    #[test]
    fn prop_replicate_count_matches_readings(
        readings in prop::collection::vec(0.99f64..1.01, 2..12),
    ) {
        let mut column = vec![1.0, 1.0, 20.0];
        column.extend(&readings);
        let grid = ReadingGrid::from_values(&[column]);
        let report = calculate(&grid, &lab(), &InstrumentSpec::new(InstrumentClass::Dis), true);
        prop_assert_eq!(report.runs[0].result().unwrap().replicates, readings.len());
    }
}
