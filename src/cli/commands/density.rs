//! `gravcal density` command - densities and conversion factor for given conditions

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::emit;
use crate::cli::table::{CellValue, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::density::{self, DEFAULT_REFERENCE_DENSITY};
use crate::core::environment::EnvironmentalConditions;
use crate::core::instrument::{InstrumentClass, InstrumentSpec, Material};
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct DensityArgs {
    /// Water temperature (°C)
    #[arg(long = "water-temp", allow_negative_numbers = true)]
    pub water_temperature: f64,

    /// Ambient air temperature (°C)
    #[arg(long = "air-temp", default_value_t = 20.0, allow_negative_numbers = true)]
    pub air_temperature: f64,

    /// Atmospheric pressure (hPa)
    #[arg(long, default_value_t = 1013.25)]
    pub pressure: f64,

    /// Relative humidity (%)
    #[arg(long, default_value_t = 50.0)]
    pub humidity: f64,

    /// Reference weight density (g/mL)
    #[arg(long = "ref-density")]
    pub reference_density: Option<f64>,

    /// Take the expansion coefficient from this instrument class
    #[arg(long, short = 'c')]
    pub class: Option<InstrumentClass>,

    /// Glass material, overriding the class default
    #[arg(long, conflicts_with = "alpha")]
    pub material: Option<Material>,

    /// Cubic expansion coefficient (1/°C)
    #[arg(long)]
    pub alpha: Option<f64>,
}

#[derive(Debug, Serialize)]
struct DensityReport {
    water_temperature: f64,
    environment: EnvironmentalConditions,
    expansion_coefficient: f64,
    water_density: f64,
    air_density: f64,
    conversion_factor: f64,
    in_domain: bool,
}

pub fn run(args: DensityArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let format = global.format.resolve(config.default_format.as_deref());

    let reference_density = args
        .reference_density
        .or(config.reference_density)
        .unwrap_or(DEFAULT_REFERENCE_DENSITY);
    let environment = EnvironmentalConditions::new(args.air_temperature, args.pressure, args.humidity)
        .with_reference_density(reference_density);

    let alpha = match (args.alpha, args.material, args.class) {
        (Some(alpha), _, _) => alpha,
        (None, Some(material), _) => material.expansion_coefficient(),
        (None, None, Some(class)) => InstrumentSpec::new(class).expansion_coefficient,
        (None, None, None) => 0.0,
    };

    let tw = args.water_temperature;
    let rho_w = density::water_density(tw);
    let rho_a = environment.air_density();
    let report = DensityReport {
        water_temperature: tw,
        environment,
        expansion_coefficient: alpha,
        water_density: rho_w,
        air_density: rho_a,
        conversion_factor: density::conversion_factor(rho_w, rho_a, reference_density, alpha, tw),
        in_domain: density::water_temperature_in_domain(tw),
    };

    if !report.in_domain && !global.quiet {
        eprintln!(
            "{} water temperature {} °C is outside the 0-40 °C range of the density formula",
            style("⚠").yellow(),
            tw
        );
    }

    let out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report).into_diagnostic()?,
        OutputFormat::Yaml => serde_yml::to_string(&report).into_diagnostic()?,
        _ => {
            let mut table = Table::new(["quantity", "value", "unit"]);
            let rows = [
                ("water temperature", CellValue::Float(tw, 2), "°C"),
                ("water density ρw", CellValue::Float(rho_w, 6), "g/mL"),
                ("air density ρa", CellValue::Float(rho_a, 6), "g/mL"),
                ("reference density ρb", CellValue::Float(reference_density, 3), "g/mL"),
                ("expansion coefficient α", CellValue::text(format!("{:.1e}", alpha)), "1/°C"),
                ("conversion factor Z", CellValue::Float(report.conversion_factor, 6), "mL/g"),
            ];
            for (name, value, unit) in rows {
                table.push(vec![CellValue::text(name), value, CellValue::text(unit)]);
            }
            table.render(format)
        }
    };

    emit(&out, None).into_diagnostic()
}
