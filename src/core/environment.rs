//! Environmental conditions supplied with each calculation

use serde::{Deserialize, Serialize};

use crate::core::density::{self, DEFAULT_REFERENCE_DENSITY};

/// Recommended laboratory temperature band for gravimetric testing (°C)
pub const LAB_TEMPERATURE_RANGE: (f64, f64) = (15.0, 30.0);

/// Minimum recommended relative humidity (%)
pub const LAB_HUMIDITY_MIN: f64 = 45.0;

/// Plausible atmospheric pressure band at the surface (hPa)
pub const PRESSURE_RANGE: (f64, f64) = (870.0, 1085.0);

/// Ambient conditions and balance constants for one calculation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalConditions {
    /// Ambient temperature (°C)
    pub air_temperature: f64,

    /// Atmospheric pressure (hPa)
    pub pressure: f64,

    /// Relative humidity (%)
    pub humidity: f64,

    /// Mass lost to evaporation per weighing (g)
    #[serde(default)]
    pub evaporation_loss: f64,

    /// Density of the balance reference weights (g/mL)
    #[serde(default = "default_reference_density")]
    pub reference_density: f64,
}

fn default_reference_density() -> f64 {
    DEFAULT_REFERENCE_DENSITY
}

impl Default for EnvironmentalConditions {
    fn default() -> Self {
        Self {
            air_temperature: 20.0,
            pressure: 1013.25,
            humidity: 50.0,
            evaporation_loss: 0.0,
            reference_density: DEFAULT_REFERENCE_DENSITY,
        }
    }
}

impl EnvironmentalConditions {
    pub fn new(air_temperature: f64, pressure: f64, humidity: f64) -> Self {
        Self {
            air_temperature,
            pressure,
            humidity,
            ..Self::default()
        }
    }

    pub fn with_evaporation_loss(mut self, loss: f64) -> Self {
        self.evaporation_loss = loss;
        self
    }

    pub fn with_reference_density(mut self, density: f64) -> Self {
        self.reference_density = density;
        self
    }

    /// Moist air density for these conditions (g/mL)
    pub fn air_density(&self) -> f64 {
        density::air_density(self.air_temperature, self.humidity, self.pressure)
    }

    /// Notes about conditions outside the recommended laboratory envelope.
    /// These never block a calculation.
    pub fn advisories(&self) -> Vec<String> {
        let mut notes = Vec::new();

        let (t_min, t_max) = LAB_TEMPERATURE_RANGE;
        if self.air_temperature < t_min || self.air_temperature > t_max {
            notes.push(format!(
                "ambient temperature {:.1} °C is outside the recommended {:.0}-{:.0} °C",
                self.air_temperature, t_min, t_max
            ));
        }

        if self.humidity < LAB_HUMIDITY_MIN {
            notes.push(format!(
                "relative humidity {:.0}% is below {:.0}%; evaporation losses increase",
                self.humidity, LAB_HUMIDITY_MIN
            ));
        }
        if self.humidity > 100.0 {
            notes.push(format!("relative humidity {:.0}% exceeds 100%", self.humidity));
        }

        let (p_min, p_max) = PRESSURE_RANGE;
        if self.pressure < p_min || self.pressure > p_max {
            notes.push(format!(
                "atmospheric pressure {:.1} hPa is outside {:.0}-{:.0} hPa; check the unit",
                self.pressure, p_min, p_max
            ));
        }

        if self.reference_density <= 0.0 {
            notes.push(format!(
                "reference weight density {} g/mL is not positive",
                self.reference_density
            ));
        }

        if self.evaporation_loss < 0.0 {
            notes.push(format!(
                "evaporation loss {} g is negative",
                self.evaporation_loss
            ));
        }

        notes
    }
}
