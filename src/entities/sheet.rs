//! Calibration sheet - one gravimetric verification session on disk
//!
//! A sheet bundles everything the calculation needs: the instrument
//! selection, ambient conditions, the weighing protocol and the reading
//! grid. Cells may be numbers, text (decimal commas are fine) or null.

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::environment::EnvironmentalConditions;
use crate::core::grid::{Cell, ReadingGrid};
use crate::core::instrument::{InstrumentClass, InstrumentSpec, Material, VolumeUnit};
use crate::yaml::YamlSyntaxError;

#[derive(Debug, Error, Diagnostic)]
pub enum SheetError {
    #[error("failed to read sheet {path}: {source}")]
    #[diagnostic(code(gravcal::sheet::io))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlSyntaxError),

    #[error("failed to serialize sheet: {0}")]
    #[diagnostic(code(gravcal::sheet::serialize))]
    Serialize(String),
}

/// Instrument block of a sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetInstrument {
    pub class: InstrumentClass,

    /// Declared unit; defaults to the class's native unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<VolumeUnit>,

    /// Glass material (glassware only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,

    /// Explicit expansion coefficient, overriding the material
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expansion_coefficient: Option<f64>,

    /// Serial number or inventory code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
}

impl SheetInstrument {
    pub fn spec(&self) -> InstrumentSpec {
        let mut spec = InstrumentSpec::new(self.class);
        if let Some(unit) = self.unit {
            spec = spec.with_unit(unit);
        }
        if let Some(material) = self.material {
            spec = spec.with_material(material);
        }
        if let Some(alpha) = self.expansion_coefficient {
            spec = spec.with_expansion_coefficient(alpha);
        }
        spec
    }
}

/// Ambient conditions as recorded; gaps are filled from flags or config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetEnvironment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaporation_loss: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_density: Option<f64>,
}

impl SheetEnvironment {
    /// Complete conditions, or the name of the first missing reading
    pub fn resolve(&self) -> Result<EnvironmentalConditions, &'static str> {
        let air_temperature = self.air_temperature.ok_or("air temperature")?;
        let pressure = self.pressure.ok_or("pressure")?;
        let humidity = self.humidity.ok_or("humidity")?;

        let mut env = EnvironmentalConditions::new(air_temperature, pressure, humidity);
        if let Some(loss) = self.evaporation_loss {
            env = env.with_evaporation_loss(loss);
        }
        if let Some(rho) = self.reference_density {
            env = env.with_reference_density(rho);
        }
        Ok(env)
    }
}

/// One grid cell as written in YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetValue {
    Number(f64),
    Text(String),
}

impl From<&SheetValue> for Cell {
    fn from(value: &SheetValue) -> Self {
        match value {
            SheetValue::Number(n) if n.is_finite() => Cell::Number(*n),
            SheetValue::Number(n) => Cell::Invalid(n.to_string()),
            SheetValue::Text(text) => Cell::parse(text),
        }
    }
}

/// A calibration sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSheet {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    pub instrument: SheetInstrument,

    #[serde(default)]
    pub environment: SheetEnvironment,

    /// Readings are individually tared instead of accumulated
    #[serde(default)]
    pub tare: bool,

    /// One list per test run, top to bottom
    #[serde(default)]
    pub columns: Vec<Vec<Option<SheetValue>>>,
}

impl CalibrationSheet {
    pub fn new(title: impl Into<String>, class: InstrumentClass) -> Self {
        Self {
            title: title.into(),
            operator: None,
            created: Some(Utc::now()),
            instrument: SheetInstrument {
                class,
                unit: None,
                material: None,
                expansion_coefficient: None,
                serial: None,
            },
            environment: SheetEnvironment::default(),
            tare: false,
            columns: Vec::new(),
        }
    }

    /// Parse sheet YAML, reporting errors against `filename`
    pub fn parse(source: &str, filename: &str) -> Result<Self, SheetError> {
        serde_yml::from_str(source)
            .map_err(|e| SheetError::Yaml(YamlSyntaxError::from_serde_error(&e, source, filename)))
    }

    pub fn load(path: &Path) -> Result<Self, SheetError> {
        let source = std::fs::read_to_string(path).map_err(|source| SheetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source, &path.display().to_string())
    }

    pub fn to_yaml(&self) -> Result<String, SheetError> {
        serde_yml::to_string(self).map_err(|e| SheetError::Serialize(e.to_string()))
    }

    pub fn grid(&self) -> ReadingGrid {
        ReadingGrid::from_cells(
            self.columns
                .iter()
                .map(|col| {
                    col.iter()
                        .map(|cell| cell.as_ref().map_or(Cell::Empty, Cell::from))
                        .collect()
                })
                .collect(),
        )
    }
}
