//! Per-run calculation errors
//!
//! None of these abort a batch: the calculation records them against the
//! failing column and carries on with the others.

use miette::Diagnostic;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Zero-based grid coordinate of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CellRef {
    pub row: usize,
    pub column: usize,
}

impl CellRef {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for CellRef {
    /// One-based, as an operator reads the grid
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}, column {}", self.row + 1, self.column + 1)
    }
}

/// Failure of one test run
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum RunError {
    #[error("invalid numeric input at {cell}: '{text}'")]
    #[diagnostic(
        code(gravcal::run::invalid_input),
        help("use digits with '.' or ',' as the decimal separator")
    )]
    InvalidInput { cell: CellRef, text: String },

    #[error("missing {what} at {cell}")]
    #[diagnostic(code(gravcal::run::missing_input))]
    MissingInput { cell: CellRef, what: &'static str },

    #[error("insufficient replicates: {found} measurement(s), at least 2 required")]
    #[diagnostic(code(gravcal::run::insufficient_replicates))]
    InsufficientReplicates { found: usize },

    #[error("division by zero: tested volume is 0")]
    #[diagnostic(code(gravcal::run::division_by_zero))]
    DivisionByZero,

    #[error("degenerate conditions: conversion factor is not finite (water {water_temperature} °C)")]
    #[diagnostic(
        code(gravcal::run::degenerate_conditions),
        help("check the ambient temperature, water temperature and reference weight density")
    )]
    DegenerateConditions { water_temperature: f64 },
}

impl RunError {
    /// Cell the caller should highlight, if the failure is tied to one
    pub fn cell(&self) -> Option<CellRef> {
        match self {
            RunError::InvalidInput { cell, .. } | RunError::MissingInput { cell, .. } => {
                Some(*cell)
            }
            _ => None,
        }
    }

    /// Stable machine-readable name
    pub fn kind(&self) -> &'static str {
        match self {
            RunError::InvalidInput { .. } => "invalid_input",
            RunError::MissingInput { .. } => "missing_input",
            RunError::InsufficientReplicates { .. } => "insufficient_replicates",
            RunError::DivisionByZero => "division_by_zero",
            RunError::DegenerateConditions { .. } => "degenerate_conditions",
        }
    }
}

/// Serializable record of a run failure for reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunFailure {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<CellRef>,
}

impl From<&RunError> for RunFailure {
    fn from(err: &RunError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            cell: err.cell(),
        }
    }
}
