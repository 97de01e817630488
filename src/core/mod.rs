//! Core module - the gravimetric calculation pipeline and configuration

pub mod calculation;
pub mod config;
pub mod conformity;
pub mod conversion;
pub mod density;
pub mod environment;
pub mod error;
pub mod grid;
pub mod instrument;
pub mod statistics;
pub mod tolerance;

pub use calculation::{calculate, CalculationReport, RunOutcome, RunReport};
pub use config::{Config, ConfigError};
pub use conformity::{evaluate, Conformity, ToleranceVerdict};
pub use conversion::{convert_run, ConvertedRun, Converter};
pub use environment::EnvironmentalConditions;
pub use error::{CellRef, RunError, RunFailure};
pub use grid::{Cell, GridError, ReadingGrid, TestRun};
pub use instrument::{Family, InstrumentClass, InstrumentSpec, Material, VolumeUnit};
pub use statistics::{reduce, ErrorUnit, ResultTriple};
pub use tolerance::{profile, ErrorKind, LimitTable, ToleranceProfile};
