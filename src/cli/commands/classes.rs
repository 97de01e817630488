//! `gravcal classes` command - list the instrument catalogue

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::emit;
use crate::cli::table::{CellValue, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::instrument::{Family, InstrumentClass, InstrumentSpec};
use crate::core::tolerance::profile;
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct ClassesArgs {
    /// Only list one family
    #[arg(long, value_parser = ["glassware", "piston"])]
    pub family: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClassRow {
    tag: &'static str,
    name: &'static str,
    family: Family,
    unit: &'static str,
    expansion_coefficient: f64,
    to_contain: bool,
    method: &'static str,
    standard: &'static str,
}

impl ClassRow {
    fn new(class: InstrumentClass) -> Self {
        Self {
            tag: class.tag(),
            name: class.name(),
            family: class.family(),
            unit: class.native_unit().symbol(),
            expansion_coefficient: InstrumentSpec::new(class).expansion_coefficient,
            to_contain: class.is_to_contain(),
            method: class.family().method_standard(),
            standard: profile(class).standard,
        }
    }
}

pub fn run(args: ClassesArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let format = global.format.resolve(config.default_format.as_deref());

    let rows: Vec<ClassRow> = InstrumentClass::ALL
        .into_iter()
        .filter(|c| match args.family.as_deref() {
            Some("glassware") => c.family() == Family::Glassware,
            Some("piston") => c.family() == Family::Piston,
            _ => true,
        })
        .map(ClassRow::new)
        .collect();

    let out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&rows).into_diagnostic()?,
        OutputFormat::Yaml => serde_yml::to_string(&rows).into_diagnostic()?,
        _ => {
            let mut table = Table::new(["tag", "class", "unit", "α (1/°C)", "method", "tolerances"]);
            for row in &rows {
                table.push(vec![
                    CellValue::text(row.tag),
                    CellValue::text(row.name),
                    CellValue::text(row.unit),
                    CellValue::text(format!("{:.1e}", row.expansion_coefficient)),
                    CellValue::text(row.method),
                    CellValue::text(row.standard),
                ]);
            }
            table.render(format)
        }
    };

    emit(&out, None).into_diagnostic()
}
