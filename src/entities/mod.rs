//! Document types read from and written to disk
//!
//! - [`CalibrationSheet`] - instrument, conditions and reading grid of one
//!   verification session

pub mod sheet;

pub use sheet::{CalibrationSheet, SheetEnvironment, SheetError, SheetInstrument, SheetValue};
