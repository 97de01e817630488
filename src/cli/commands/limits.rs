//! `gravcal limits` command - tolerance limits for one instrument size

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::emit;
use crate::cli::table::{CellValue, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::conformity::{evaluate, ToleranceVerdict};
use crate::core::instrument::{InstrumentClass, VolumeUnit};
use crate::core::statistics::ErrorUnit;
use crate::core::tolerance::ErrorKind;
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct LimitsArgs {
    /// Instrument class tag (see `gravcal classes`)
    #[arg(long, short = 'c')]
    pub class: InstrumentClass,

    /// Nominal volume
    #[arg(long, short = 'n')]
    pub nominal: f64,

    /// Tested volume (default: the nominal volume)
    #[arg(long, short = 't')]
    pub tested: Option<f64>,

    /// Unit of the volumes given (default: the class's native unit)
    #[arg(long, short = 'u')]
    pub unit: Option<VolumeUnit>,
}

#[derive(Debug, Serialize)]
struct LimitsReport {
    class: InstrumentClass,
    nominal: f64,
    tested: f64,
    unit: VolumeUnit,
    systematic: LimitEntry,
    random: LimitEntry,
}

#[derive(Debug, Serialize)]
struct LimitEntry {
    standard: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<ErrorUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

impl LimitEntry {
    fn new(verdict: ToleranceVerdict, unit: ErrorUnit) -> Self {
        let note = match verdict.limit {
            Some(_) => None,
            None => Some(verdict.explanation),
        };
        Self {
            standard: verdict.standard,
            limit: verdict.limit,
            unit: verdict.limit.map(|_| unit),
            note,
        }
    }
}

pub fn run(args: LimitsArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let format = global.format.resolve(config.default_format.as_deref());

    let class = args.class;
    let native = class.native_unit();
    let unit = args.unit.unwrap_or(native);
    let tested = args.tested.unwrap_or(args.nominal);

    // Limits are tabulated in the native unit
    let nominal_native = unit.convert(args.nominal, native);
    let tested_native = unit.convert(tested, native);
    let limit = |kind| evaluate(class, kind, nominal_native, tested_native, 0.0);

    let report = LimitsReport {
        class,
        nominal: args.nominal,
        tested,
        unit,
        systematic: LimitEntry::new(
            limit(ErrorKind::Systematic),
            ErrorUnit::for_family(class.family()),
        ),
        random: LimitEntry::new(limit(ErrorKind::Random), ErrorUnit::Percent),
    };

    let out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report).into_diagnostic()?,
        OutputFormat::Yaml => serde_yml::to_string(&report).into_diagnostic()?,
        _ => {
            let mut table = Table::new(["error", "limit", "unit", "standard", "note"]);
            for (kind, entry) in [
                (ErrorKind::Systematic, &report.systematic),
                (ErrorKind::Random, &report.random),
            ] {
                let unit_label = match entry.unit {
                    Some(ErrorUnit::Percent) => "%".to_string(),
                    Some(ErrorUnit::Absolute) => native.symbol().to_string(),
                    None => String::new(),
                };
                table.push(vec![
                    CellValue::text(kind.to_string()),
                    CellValue::optional(entry.limit, 3),
                    CellValue::text(unit_label),
                    CellValue::text(entry.standard),
                    entry.note.clone().map_or(CellValue::Empty, CellValue::Text),
                ]);
            }
            table.render(format)
        }
    };

    emit(&out, None).into_diagnostic()
}
