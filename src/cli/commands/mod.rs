//! CLI command implementations

pub mod calc;
pub mod classes;
pub mod completions;
pub mod density;
pub mod limits;
pub mod new;
