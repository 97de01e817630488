//! gravcal: gravimetric calibration of volumetric instruments
//!
//! Balance readings are converted into delivered volumes (ISO 4787 for
//! glassware, ISO 8655-6 for piston-operated instruments), reduced to a
//! systematic and a random error per test run, and judged against the
//! tolerance tables of the instrument's governing standard.
//!
//! The library entry point is [`core::calculate`]; the `gravcal` binary
//! wraps it with sheet files, layered configuration and tabular output.

pub mod cli;
pub mod core;
pub mod entities;
pub mod schema;
pub mod yaml;
