//! Statistics reducer - mean, systematic error and random error per run

use serde::Serialize;

use crate::core::conversion::ConvertedRun;
use crate::core::error::RunError;
use crate::core::instrument::Family;

/// How the systematic error is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorUnit {
    /// Same unit as the volumes (ISO 4787)
    Absolute,
    /// Percent of the tested volume (ISO 8655)
    Percent,
}

impl ErrorUnit {
    pub fn for_family(family: Family) -> Self {
        match family {
            Family::Glassware => ErrorUnit::Absolute,
            Family::Piston => ErrorUnit::Percent,
        }
    }
}

/// Mean, systematic error and random error of one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResultTriple {
    /// Mean measured volume
    pub mean: f64,

    /// Signed deviation of the mean from the tested volume
    pub systematic_error: f64,

    /// Unit of `systematic_error`
    pub systematic_unit: ErrorUnit,

    /// Coefficient of variation relative to the tested volume (%)
    pub random_error: f64,

    /// Sample standard deviation of the volumes
    pub standard_deviation: f64,

    /// Number of replicate measurements
    pub replicates: usize,
}

/// Arithmetic mean; `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1); `None` below two values
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Reduce a converted run to its result triple
pub fn reduce(run: &ConvertedRun, family: Family) -> Result<ResultTriple, RunError> {
    let volumes = &run.volumes;
    let (m, sd) = match (mean(volumes), sample_std_dev(volumes)) {
        (Some(m), Some(sd)) => (m, sd),
        _ => {
            return Err(RunError::InsufficientReplicates {
                found: volumes.len(),
            })
        }
    };

    if run.tested == 0.0 {
        return Err(RunError::DivisionByZero);
    }

    let systematic_unit = ErrorUnit::for_family(family);
    let systematic_error = match systematic_unit {
        ErrorUnit::Absolute => m - run.tested,
        ErrorUnit::Percent => 100.0 * (m - run.tested) / run.tested,
    };

    Ok(ResultTriple {
        mean: m,
        systematic_error,
        systematic_unit,
        random_error: 100.0 * sd / run.tested,
        standard_deviation: sd,
        replicates: volumes.len(),
    })
}
