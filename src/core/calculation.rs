//! Batch calculation - grid in, per-run results and verdicts out
//!
//! Each column is handled in isolation: a bad column is recorded as a failed
//! run and never stops its siblings. The returned [`CalculationReport`] is
//! owned by the caller; nothing is cached between calls.

use serde::Serialize;

use crate::core::conformity::{evaluate, Conformity, ToleranceVerdict};
use crate::core::conversion::{ConvertedRun, Converter};
use crate::core::environment::EnvironmentalConditions;
use crate::core::error::{CellRef, RunFailure};
use crate::core::grid::{ReadingGrid, TestRun};
use crate::core::instrument::InstrumentSpec;
use crate::core::statistics::{reduce, ErrorUnit, ResultTriple};
use crate::core::tolerance::ErrorKind;

/// Minimum non-empty entries (nominal, tested, one measurement) for a run to count
pub const MIN_RUN_ENTRIES: usize = 3;

/// What happened to one grid column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Converted, reduced and judged
    Evaluated {
        converted: ConvertedRun,
        result: ResultTriple,
        systematic: ToleranceVerdict,
        random: ToleranceVerdict,
    },
    /// Converted, but no statistics could be computed
    NoResult {
        converted: ConvertedRun,
        failure: RunFailure,
    },
    /// Conversion failed; the offending cell is in `failure`
    Rejected { failure: RunFailure },
    /// Too few entries to be a run
    Excluded,
}

/// One grid column's report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub column: usize,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn converted(&self) -> Option<&ConvertedRun> {
        match &self.outcome {
            RunOutcome::Evaluated { converted, .. } | RunOutcome::NoResult { converted, .. } => {
                Some(converted)
            }
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ResultTriple> {
        match &self.outcome {
            RunOutcome::Evaluated { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn verdicts(&self) -> Option<(&ToleranceVerdict, &ToleranceVerdict)> {
        match &self.outcome {
            RunOutcome::Evaluated {
                systematic, random, ..
            } => Some((systematic, random)),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&RunFailure> {
        match &self.outcome {
            RunOutcome::NoResult { failure, .. } | RunOutcome::Rejected { failure } => {
                Some(failure)
            }
            _ => None,
        }
    }
}

/// Everything one calculation produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationReport {
    pub instrument: InstrumentSpec,
    pub environment: EnvironmentalConditions,
    pub tare: bool,

    /// Gravimetric method standard for the instrument family
    pub method: &'static str,

    /// Out-of-envelope environment notes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<String>,

    pub runs: Vec<RunReport>,
}

impl CalculationReport {
    /// Cells the caller should highlight, with their messages
    pub fn flagged_cells(&self) -> Vec<(CellRef, &str)> {
        self.runs
            .iter()
            .filter_map(|r| r.failure())
            .filter_map(|f| f.cell.map(|cell| (cell, f.message.as_str())))
            .collect()
    }

    /// Informational notices for verdicts that could not be evaluated
    pub fn notices(&self) -> Vec<String> {
        self.runs
            .iter()
            .filter_map(|r| r.verdicts().map(|v| (r.column, v)))
            .flat_map(|(column, (sys, rnd))| {
                [sys, rnd]
                    .into_iter()
                    .filter(|v| v.conformity == Conformity::Unevaluable)
                    .map(move |v| format!("column {}: {}", column + 1, v.explanation))
            })
            .collect()
    }

    pub fn evaluated_count(&self) -> usize {
        self.runs.iter().filter(|r| r.result().is_some()).count()
    }

    /// Verdicts that were evaluable and failed
    pub fn non_conformities(&self) -> Vec<(usize, &ToleranceVerdict)> {
        self.runs
            .iter()
            .filter_map(|r| r.verdicts().map(|v| (r.column, v)))
            .flat_map(|(column, (sys, rnd))| {
                [sys, rnd]
                    .into_iter()
                    .filter(|v| v.conformity == Conformity::NonConform)
                    .map(move |v| (column, v))
            })
            .collect()
    }

    /// At least one run evaluated and no evaluable verdict failed
    pub fn all_conform(&self) -> bool {
        self.evaluated_count() > 0 && self.non_conformities().is_empty()
    }
}

/// Run the full pipeline over every column of `grid`
pub fn calculate(
    grid: &ReadingGrid,
    environment: &EnvironmentalConditions,
    instrument: &InstrumentSpec,
    tare: bool,
) -> CalculationReport {
    let converter = Converter::new(instrument, environment, tare);

    let advisories = environment.advisories();
    for note in &advisories {
        tracing::warn!("{}", note);
    }

    let runs = grid
        .test_runs()
        .map(|run| RunReport {
            column: run.column,
            outcome: process_run(&run, &converter, instrument),
        })
        .collect();

    CalculationReport {
        instrument: *instrument,
        environment: *environment,
        tare,
        method: instrument.family().method_standard(),
        advisories,
        runs,
    }
}

fn process_run(run: &TestRun, converter: &Converter, instrument: &InstrumentSpec) -> RunOutcome {
    if run.entry_count() < MIN_RUN_ENTRIES {
        // Invalid text still gets flagged even in a sparse column
        return match run.first_invalid() {
            Some(err) => RunOutcome::Rejected {
                failure: RunFailure::from(&err),
            },
            None => RunOutcome::Excluded,
        };
    }

    let converted = match converter.convert(run) {
        Ok(converted) => converted,
        Err(err) => {
            tracing::debug!(column = run.column, error = %err, "run rejected");
            return RunOutcome::Rejected {
                failure: RunFailure::from(&err),
            };
        }
    };

    let result = match reduce(&converted, instrument.family()) {
        Ok(result) => result,
        Err(err) => {
            tracing::debug!(column = run.column, error = %err, "no result for run");
            return RunOutcome::NoResult {
                converted,
                failure: RunFailure::from(&err),
            };
        }
    };

    let (systematic, random) = judge(instrument, &converted, &result);
    RunOutcome::Evaluated {
        converted,
        result,
        systematic,
        random,
    }
}

/// Evaluate both errors in the class's native unit
fn judge(
    instrument: &InstrumentSpec,
    converted: &ConvertedRun,
    result: &ResultTriple,
) -> (ToleranceVerdict, ToleranceVerdict) {
    let class = instrument.class;
    let native = class.native_unit();
    let nominal = instrument.unit.convert(converted.nominal, native);
    let tested = instrument.unit.convert(converted.tested, native);
    let systematic_error = match result.systematic_unit {
        ErrorUnit::Absolute => instrument.unit.convert(result.systematic_error, native),
        ErrorUnit::Percent => result.systematic_error,
    };

    (
        evaluate(class, ErrorKind::Systematic, nominal, tested, systematic_error),
        evaluate(class, ErrorKind::Random, nominal, tested, result.random_error),
    )
}
