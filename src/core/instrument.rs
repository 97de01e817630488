//! Instrument catalogue - classes, formula families, units and materials
//!
//! Every supported instrument class is a variant of [`InstrumentClass`]. The
//! class decides, once per calculation, which conversion family applies,
//! which unit its tolerance table is written in and which standard governs it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Conversion / statistics family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Gravimetric glassware (ISO 4787): single fills weighed against an
    /// empty container, absolute systematic error
    Glassware,
    /// Piston-operated instruments (ISO 8655): discrete deliveries,
    /// percentage systematic error
    Piston,
}

impl Family {
    /// Standard describing the gravimetric test procedure for this family
    pub fn method_standard(&self) -> &'static str {
        match self {
            Family::Glassware => "ISO 4787:2021",
            Family::Piston => "ISO 8655-6:2022",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Glassware => write!(f, "glassware"),
            Family::Piston => write!(f, "piston"),
        }
    }
}

/// Instrument class tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentClass {
    /// Volumetric flask
    Bv,
    /// Volumetric flask, wide mouth
    Bvl,
    /// Burette
    Bu,
    /// Manual digital burette
    Bdm,
    /// Motorized digital burette
    Bda,
    /// Bottle-top dispenser
    Dis,
    /// Piston pipette, fixed volume / type A or D1
    Msa,
    /// Piston pipette, type D2
    Msd,
    /// Multichannel pipette
    Mmc,
    /// Graduated pipette
    Pg,
    /// Volumetric pipette
    Pv,
}

impl InstrumentClass {
    /// All classes in catalogue order
    pub const ALL: [InstrumentClass; 11] = [
        InstrumentClass::Bv,
        InstrumentClass::Bvl,
        InstrumentClass::Bu,
        InstrumentClass::Bdm,
        InstrumentClass::Bda,
        InstrumentClass::Dis,
        InstrumentClass::Msa,
        InstrumentClass::Msd,
        InstrumentClass::Mmc,
        InstrumentClass::Pg,
        InstrumentClass::Pv,
    ];

    /// Short tag used in sheets and on the command line
    pub fn tag(&self) -> &'static str {
        match self {
            InstrumentClass::Bv => "bv",
            InstrumentClass::Bvl => "bvl",
            InstrumentClass::Bu => "bu",
            InstrumentClass::Bdm => "bdm",
            InstrumentClass::Bda => "bda",
            InstrumentClass::Dis => "dis",
            InstrumentClass::Msa => "msa",
            InstrumentClass::Msd => "msd",
            InstrumentClass::Mmc => "mmc",
            InstrumentClass::Pg => "pg",
            InstrumentClass::Pv => "pv",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            InstrumentClass::Bv => "Volumetric flask",
            InstrumentClass::Bvl => "Volumetric flask, wide mouth",
            InstrumentClass::Bu => "Burette",
            InstrumentClass::Bdm => "Digital burette, manual",
            InstrumentClass::Bda => "Digital burette, motorized",
            InstrumentClass::Dis => "Dispenser",
            InstrumentClass::Msa => "Piston pipette, fixed / type A or D1",
            InstrumentClass::Msd => "Piston pipette, type D2",
            InstrumentClass::Mmc => "Multichannel pipette",
            InstrumentClass::Pg => "Graduated pipette",
            InstrumentClass::Pv => "Volumetric pipette",
        }
    }

    pub fn family(&self) -> Family {
        match self {
            InstrumentClass::Bv
            | InstrumentClass::Bvl
            | InstrumentClass::Bu
            | InstrumentClass::Pg
            | InstrumentClass::Pv => Family::Glassware,
            InstrumentClass::Bdm
            | InstrumentClass::Bda
            | InstrumentClass::Dis
            | InstrumentClass::Msa
            | InstrumentClass::Msd
            | InstrumentClass::Mmc => Family::Piston,
        }
    }

    /// Unit the class is normally declared in, and its tolerance table uses
    pub fn native_unit(&self) -> VolumeUnit {
        match self {
            InstrumentClass::Msa | InstrumentClass::Msd | InstrumentClass::Mmc => {
                VolumeUnit::Microlitre
            }
            _ => VolumeUnit::Millilitre,
        }
    }

    /// Flasks are calibrated "to contain"; everything else "to deliver"
    pub fn is_to_contain(&self) -> bool {
        matches!(self, InstrumentClass::Bv | InstrumentClass::Bvl)
    }
}

impl fmt::Display for InstrumentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Unknown instrument class tag
#[derive(Debug, Error)]
#[error("unknown instrument class '{0}' (expected one of: bv, bvl, bu, bdm, bda, dis, msa, msd, mmc, pg, pv)")]
pub struct UnknownClass(pub String);

impl FromStr for InstrumentClass {
    type Err = UnknownClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        InstrumentClass::ALL
            .into_iter()
            .find(|c| c.tag() == needle)
            .ok_or_else(|| UnknownClass(s.to_string()))
    }
}

/// Volume unit; the multiplier scales mL results into the declared unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeUnit {
    #[serde(rename = "ml", alias = "mL")]
    Millilitre,
    #[serde(rename = "ul", alias = "uL", alias = "µL")]
    Microlitre,
}

impl VolumeUnit {
    /// Factor applied to volumes computed in mL
    pub fn multiplier(&self) -> f64 {
        match self {
            VolumeUnit::Millilitre => 1.0,
            VolumeUnit::Microlitre => 1000.0,
        }
    }

    /// Re-express `value` (in `self`) in `target`
    pub fn convert(&self, value: f64, target: VolumeUnit) -> f64 {
        value / self.multiplier() * target.multiplier()
    }

    /// Display digits for volumes in this unit
    pub fn default_decimals(&self) -> usize {
        match self {
            VolumeUnit::Millilitre => 3,
            VolumeUnit::Microlitre => 2,
        }
    }

    /// Tag used in sheets and on the command line
    pub fn tag(&self) -> &'static str {
        match self {
            VolumeUnit::Millilitre => "ml",
            VolumeUnit::Microlitre => "ul",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            VolumeUnit::Millilitre => "mL",
            VolumeUnit::Microlitre => "µL",
        }
    }
}

impl fmt::Display for VolumeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for VolumeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ml" => Ok(VolumeUnit::Millilitre),
            "ul" | "µl" => Ok(VolumeUnit::Microlitre),
            other => Err(format!("unknown volume unit '{}' (expected ml or ul)", other)),
        }
    }
}

/// Glass material, determining the cubic thermal expansion coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Material {
    /// Borosilicate glass 3.3
    Boro33,
    /// Borosilicate glass 5.0
    Boro50,
    /// Soda-lime glass
    SodaLime,
}

impl Material {
    /// Cubic thermal expansion coefficient (°C⁻¹)
    pub fn expansion_coefficient(&self) -> f64 {
        match self {
            Material::Boro33 => 9.9e-6,
            Material::Boro50 => 15e-6,
            Material::SodaLime => 25e-6,
        }
    }
}

impl FromStr for Material {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "boro33" | "boro-33" | "borosilicate-3.3" => Ok(Material::Boro33),
            "boro50" | "boro-50" | "borosilicate-5.0" => Ok(Material::Boro50),
            "soda-lime" | "sodalime" => Ok(Material::SodaLime),
            other => Err(format!(
                "unknown material '{}' (expected boro33, boro50 or soda-lime)",
                other
            )),
        }
    }
}

/// Instrument selection for one calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    /// Instrument class
    pub class: InstrumentClass,

    /// Declared volume unit
    pub unit: VolumeUnit,

    /// Cubic thermal expansion coefficient (°C⁻¹); zero for piston instruments
    pub expansion_coefficient: f64,
}

impl InstrumentSpec {
    /// Spec with the class's native unit and default material
    pub fn new(class: InstrumentClass) -> Self {
        let expansion_coefficient = match class.family() {
            Family::Glassware => Material::Boro33.expansion_coefficient(),
            Family::Piston => 0.0,
        };
        Self {
            class,
            unit: class.native_unit(),
            expansion_coefficient,
        }
    }

    pub fn with_unit(mut self, unit: VolumeUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.expansion_coefficient = material.expansion_coefficient();
        self
    }

    pub fn with_expansion_coefficient(mut self, alpha: f64) -> Self {
        self.expansion_coefficient = alpha;
        self
    }

    pub fn family(&self) -> Family {
        self.class.family()
    }

    pub fn multiplier(&self) -> f64 {
        self.unit.multiplier()
    }
}
