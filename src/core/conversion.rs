//! Volume conversion engine - raw balance readings to corrected volumes
//!
//! Grid layout per column (zero-based rows):
//!
//! | row | glassware (ISO 4787)       | piston (ISO 8655)     |
//! |-----|----------------------------|-----------------------|
//! | 0   | nominal volume             | nominal volume        |
//! | 1   | tested volume              | tested volume         |
//! | 2   | empty container mass (g)   | water temperature (°C)|
//! | 3   | water temperature (°C)     | readings (g)...       |
//! | 4.. | readings (g)               |                       |
//!
//! The empty container mass is only required outside tare mode.

use serde::Serialize;

use crate::core::density;
use crate::core::environment::EnvironmentalConditions;
use crate::core::error::RunError;
use crate::core::grid::TestRun;
use crate::core::instrument::{Family, InstrumentSpec};

/// Row holding the declared nominal volume
pub const ROW_NOMINAL: usize = 0;

/// Row holding the declared tested volume
pub const ROW_TESTED: usize = 1;

/// Where the family-specific entries sit in a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub container: Option<usize>,
    pub water_temperature: usize,
    pub first_reading: usize,
}

impl RowLayout {
    pub fn for_family(family: Family) -> Self {
        match family {
            Family::Glassware => Self {
                container: Some(2),
                water_temperature: 3,
                first_reading: 4,
            },
            Family::Piston => Self {
                container: None,
                water_temperature: 2,
                first_reading: 3,
            },
        }
    }
}

/// Volumes derived from one test run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedRun {
    /// Grid column the run came from
    pub column: usize,

    /// Declared nominal volume (passthrough)
    pub nominal: f64,

    /// Declared tested volume (passthrough)
    pub tested: f64,

    /// Converted measurement volumes, in the declared unit
    pub volumes: Vec<f64>,

    /// Water temperature consumed by the conversion (°C)
    pub water_temperature: f64,

    /// Conversion factor Z applied to every net mass (mL/g)
    pub conversion_factor: f64,
}

impl ConvertedRun {
    /// The run as a flat sequence: nominal, tested, then each volume
    pub fn sequence(&self) -> Vec<f64> {
        let mut seq = Vec::with_capacity(self.volumes.len() + 2);
        seq.push(self.nominal);
        seq.push(self.tested);
        seq.extend_from_slice(&self.volumes);
        seq
    }

    pub fn replicate_count(&self) -> usize {
        self.volumes.len()
    }
}

/// Conversion strategy fixed for one instrument, environment and protocol
#[derive(Debug, Clone)]
pub struct Converter {
    spec: InstrumentSpec,
    env: EnvironmentalConditions,
    tare: bool,
    layout: RowLayout,
    air_density: f64,
}

impl Converter {
    pub fn new(spec: &InstrumentSpec, env: &EnvironmentalConditions, tare: bool) -> Self {
        Self {
            spec: *spec,
            env: *env,
            tare,
            layout: RowLayout::for_family(spec.family()),
            air_density: env.air_density(),
        }
    }

    pub fn layout(&self) -> RowLayout {
        self.layout
    }

    /// Conversion factor Z for water at `tw` °C
    pub fn conversion_factor(&self, tw: f64) -> f64 {
        density::conversion_factor(
            density::water_density(tw),
            self.air_density,
            self.env.reference_density,
            self.spec.expansion_coefficient,
            tw,
        )
    }

    /// Convert one run, failing on the first invalid or missing entry
    pub fn convert(&self, run: &TestRun) -> Result<ConvertedRun, RunError> {
        if let Some(err) = run.first_invalid() {
            return Err(err);
        }

        let nominal = run.number(ROW_NOMINAL, "nominal volume")?;
        let tested = run.number(ROW_TESTED, "tested volume")?;
        let water_temperature = run.number(self.layout.water_temperature, "water temperature")?;
        let container = match self.layout.container {
            Some(row) if !self.tare => Some(run.number(row, "empty container mass")?),
            _ => None,
        };
        let readings = run.readings_from(self.layout.first_reading)?;

        if !density::water_temperature_in_domain(water_temperature) {
            tracing::warn!(
                column = run.column,
                water_temperature,
                "water temperature outside the 0-40 °C density domain"
            );
        }

        let z = self.conversion_factor(water_temperature);
        if !z.is_finite() {
            return Err(RunError::DegenerateConditions { water_temperature });
        }

        let scale = z * self.spec.multiplier();
        let volumes = self
            .net_masses(&readings, container)
            .into_iter()
            .map(|m| m * scale)
            .collect::<Vec<_>>();

        tracing::debug!(
            column = run.column,
            z,
            replicates = volumes.len(),
            tare = self.tare,
            "converted run"
        );

        Ok(ConvertedRun {
            column: run.column,
            nominal,
            tested,
            volumes,
            water_temperature,
            conversion_factor: z,
        })
    }

    /// Net delivered masses (g) for the active protocol
    fn net_masses(&self, readings: &[f64], container: Option<f64>) -> Vec<f64> {
        match self.spec.family() {
            Family::Glassware => {
                let baseline = container.unwrap_or(0.0);
                readings
                    .iter()
                    .map(|r| r - baseline + self.env.evaporation_loss)
                    .collect()
            }
            Family::Piston if self.tare => readings.to_vec(),
            Family::Piston => {
                let mut previous = 0.0;
                readings
                    .iter()
                    .map(|&r| {
                        let delivered = r - previous;
                        previous = r;
                        delivered
                    })
                    .collect()
            }
        }
    }
}

/// Convert a single run; see [`Converter`] when converting many
pub fn convert_run(
    run: &TestRun,
    env: &EnvironmentalConditions,
    spec: &InstrumentSpec,
    tare: bool,
) -> Result<ConvertedRun, RunError> {
    Converter::new(spec, env, tare).convert(run)
}
