//! `gravcal calc` command - run the full calculation on a sheet or CSV grid
//!
//! Values are layered: explicit flags beat the sheet, the sheet beats the
//! config file, the config file beats built-in defaults.

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

use crate::cli::helpers::emit;
use crate::cli::table::{CellValue, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::calculation::{calculate, CalculationReport, RunOutcome, RunReport};
use crate::core::conformity::ToleranceVerdict;
use crate::core::environment::EnvironmentalConditions;
use crate::core::grid::ReadingGrid;
use crate::core::instrument::{Family, InstrumentClass, InstrumentSpec, Material, VolumeUnit};
use crate::core::statistics::ErrorUnit;
use crate::core::Config;
use crate::entities::{CalibrationSheet, SheetEnvironment, SheetInstrument};

/// Digits for percentages (relative errors and their limits)
const PERCENT_DECIMALS: usize = 3;

#[derive(clap::Args, Debug)]
pub struct CalcArgs {
    /// Calibration sheet (.yaml/.yml) or CSV grid, one column per run; `-` reads CSV from stdin
    pub input: PathBuf,

    /// Instrument class tag (required for CSV input)
    #[arg(long, short = 'c')]
    pub class: Option<InstrumentClass>,

    /// Declared volume unit
    #[arg(long, short = 'u')]
    pub unit: Option<VolumeUnit>,

    /// Glass material (glassware classes)
    #[arg(long, conflicts_with = "alpha")]
    pub material: Option<Material>,

    /// Cubic expansion coefficient (1/°C), overriding the material
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Ambient air temperature (°C)
    #[arg(long = "air-temp", allow_negative_numbers = true)]
    pub air_temperature: Option<f64>,

    /// Atmospheric pressure (hPa)
    #[arg(long)]
    pub pressure: Option<f64>,

    /// Relative humidity (%)
    #[arg(long)]
    pub humidity: Option<f64>,

    /// Evaporation loss per weighing (g), glassware only
    #[arg(long)]
    pub evaporation: Option<f64>,

    /// Reference weight density (g/mL)
    #[arg(long = "ref-density")]
    pub reference_density: Option<f64>,

    /// Readings were individually tared
    #[arg(long)]
    pub tare: bool,

    /// Display digits for volumes
    #[arg(long)]
    pub decimals: Option<usize>,

    /// Write the report to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Exit with an error when any verdict is non-conform
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: CalcArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let format = global.format.resolve(config.default_format.as_deref());

    let (sheet, grid) = load_input(&args.input)?;
    let instrument = resolve_instrument(&args, sheet.as_ref())?;
    let environment = resolve_environment(&args, sheet.as_ref(), &config)?;
    let tare = args.tare || sheet.as_ref().is_some_and(|s| s.tare);

    tracing::debug!(
        class = %instrument.class,
        unit = %instrument.unit,
        alpha = instrument.expansion_coefficient,
        tare,
        columns = grid.column_count(),
        "calculating"
    );

    let report = calculate(&grid, &environment, &instrument, tare);

    let decimals = args
        .decimals
        .or(config.decimals)
        .unwrap_or_else(|| instrument.unit.default_decimals());

    if args.output.is_some() {
        console::set_colors_enabled(false);
    }

    let out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report).into_diagnostic()?,
        OutputFormat::Yaml => serde_yml::to_string(&report).into_diagnostic()?,
        OutputFormat::Csv | OutputFormat::Tsv => {
            if !global.quiet {
                print_diagnostics(&report);
            }
            results_table(&report, decimals).render(format)
        }
        OutputFormat::Md => render_markdown(&report, sheet.as_ref(), decimals),
        OutputFormat::Table | OutputFormat::Auto => {
            render_terminal(&report, sheet.as_ref(), decimals, global.quiet)
        }
    };

    emit(&out, args.output.as_deref()).into_diagnostic()?;
    if let Some(path) = &args.output {
        if !global.quiet {
            println!(
                "{} Wrote report to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
    }

    if args.strict {
        check_strict(&report)?;
    }

    Ok(())
}

/// Sheet (if the input is one) and its reading grid
fn load_input(path: &Path) -> Result<(Option<CalibrationSheet>, ReadingGrid)> {
    if path.as_os_str() == "-" {
        let grid = ReadingGrid::from_csv_reader(std::io::stdin().lock())?;
        return Ok((None, grid));
    }

    let is_sheet = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    if is_sheet {
        let sheet = CalibrationSheet::load(path)?;
        let grid = sheet.grid();
        Ok((Some(sheet), grid))
    } else {
        let file = std::fs::File::open(path)
            .into_diagnostic()
            .map_err(|e| e.wrap_err(format!("failed to open {}", path.display())))?;
        let grid = ReadingGrid::from_csv_reader(file)?;
        Ok((None, grid))
    }
}

fn resolve_instrument(args: &CalcArgs, sheet: Option<&CalibrationSheet>) -> Result<InstrumentSpec> {
    let base = sheet.map(|s| s.instrument.clone());
    let class = args
        .class
        .or(base.as_ref().map(|b| b.class))
        .ok_or_else(|| {
            miette::miette!(
                help = "pass --class (see `gravcal classes`)",
                "no instrument class given"
            )
        })?;

    let mut spec = match base {
        Some(base) => SheetInstrument { class, ..base }.spec(),
        None => InstrumentSpec::new(class),
    };
    if let Some(unit) = args.unit {
        spec = spec.with_unit(unit);
    }
    if let Some(material) = args.material {
        spec = spec.with_material(material);
    }
    if let Some(alpha) = args.alpha {
        spec = spec.with_expansion_coefficient(alpha);
    }
    Ok(spec)
}

fn resolve_environment(
    args: &CalcArgs,
    sheet: Option<&CalibrationSheet>,
    config: &Config,
) -> Result<EnvironmentalConditions> {
    let recorded = sheet.map(|s| s.environment.clone()).unwrap_or_default();
    let layered = SheetEnvironment {
        air_temperature: args.air_temperature.or(recorded.air_temperature),
        pressure: args.pressure.or(recorded.pressure),
        humidity: args.humidity.or(recorded.humidity),
        evaporation_loss: args
            .evaporation
            .or(recorded.evaporation_loss)
            .or(config.evaporation_loss),
        reference_density: args
            .reference_density
            .or(recorded.reference_density)
            .or(config.reference_density),
    };

    layered.resolve().map_err(|missing| {
        miette::miette!(
            help = "record it under `environment` in the sheet or pass --air-temp, --pressure and --humidity",
            "missing {}",
            missing
        )
    })
}

fn check_strict(report: &CalculationReport) -> Result<()> {
    if report.evaluated_count() == 0 {
        return Err(miette::miette!(
            code = "gravcal::calc::nothing_evaluated",
            "no run could be evaluated"
        ));
    }
    let failures = report.non_conformities();
    if failures.is_empty() {
        return Ok(());
    }
    let detail = failures
        .iter()
        .map(|(column, v)| format!("run {}: {}", column + 1, v.explanation))
        .collect::<Vec<_>>()
        .join("\n");
    Err(miette::miette!(
        code = "gravcal::calc::non_conform",
        help = detail,
        "{} non-conform verdict(s)",
        failures.len()
    ))
}

/// Limit re-expressed in the declared unit for display
fn display_limit(report: &CalculationReport, verdict: &ToleranceVerdict, unit: ErrorUnit) -> Option<f64> {
    let limit = verdict.limit?;
    Some(match unit {
        ErrorUnit::Absolute => report
            .instrument
            .class
            .native_unit()
            .convert(limit, report.instrument.unit),
        ErrorUnit::Percent => limit,
    })
}

fn status_label(run: &RunReport) -> String {
    match &run.outcome {
        RunOutcome::Evaluated { .. } => "evaluated".to_string(),
        RunOutcome::NoResult { failure, .. } | RunOutcome::Rejected { failure } => {
            failure.message.clone()
        }
        RunOutcome::Excluded => "excluded".to_string(),
    }
}

/// One row per non-excluded run
fn results_table(report: &CalculationReport, decimals: usize) -> Table {
    let unit = report.instrument.unit;
    let sys_unit = match report.instrument.family() {
        Family::Glassware => unit.symbol(),
        Family::Piston => "%",
    };

    let mut table = Table::new([
        "run".to_string(),
        format!("nominal ({})", unit),
        format!("tested ({})", unit),
        "n".to_string(),
        format!("mean ({})", unit),
        format!("systematic ({})", sys_unit),
        format!("limit ({})", sys_unit),
        "systematic verdict".to_string(),
        "random (%)".to_string(),
        "limit (%)".to_string(),
        "random verdict".to_string(),
        "status".to_string(),
    ]);

    for run in report.runs.iter().filter(|r| r.outcome != RunOutcome::Excluded) {
        let converted = run.converted();
        let mut row = vec![
            CellValue::Count(run.column + 1),
            CellValue::optional(converted.map(|c| c.nominal), decimals),
            CellValue::optional(converted.map(|c| c.tested), decimals),
            converted.map_or(CellValue::Empty, |c| CellValue::Count(c.replicate_count())),
        ];

        match (run.result(), run.verdicts()) {
            (Some(result), Some((sys, rnd))) => {
                let sys_decimals = match result.systematic_unit {
                    ErrorUnit::Absolute => decimals,
                    ErrorUnit::Percent => PERCENT_DECIMALS,
                };
                row.extend([
                    CellValue::Float(result.mean, decimals),
                    CellValue::Signed(result.systematic_error, sys_decimals),
                    CellValue::optional(display_limit(report, sys, result.systematic_unit), sys_decimals),
                    CellValue::Verdict(sys.conformity),
                    CellValue::Float(result.random_error, PERCENT_DECIMALS),
                    CellValue::optional(display_limit(report, rnd, ErrorUnit::Percent), PERCENT_DECIMALS),
                    CellValue::Verdict(rnd.conformity),
                ]);
            }
            _ => row.extend(std::iter::repeat(CellValue::Empty).take(7)),
        }
        row.push(CellValue::text(status_label(run)));
        table.push(row);
    }

    table
}

/// Converted volumes laid out like the input grid: one column per run
fn converted_table(report: &CalculationReport, decimals: usize) -> Option<Table> {
    let runs: Vec<_> = report
        .runs
        .iter()
        .filter_map(|r| r.converted().map(|c| (r.column, c)))
        .collect();
    if runs.is_empty() {
        return None;
    }

    let depth = runs.iter().map(|(_, c)| c.replicate_count()).max().unwrap_or(0);
    let mut headers = vec![String::new()];
    headers.extend(runs.iter().map(|(column, _)| format!("run {}", column + 1)));
    let mut table = Table::new(headers);

    let mut labels = vec!["nominal".to_string(), "tested".to_string()];
    labels.extend((1..=depth).map(|i| format!("V{}", i)));

    for (i, label) in labels.into_iter().enumerate() {
        let mut row = vec![CellValue::Text(label)];
        row.extend(
            runs.iter()
                .map(|(_, c)| CellValue::optional(c.sequence().get(i).copied(), decimals)),
        );
        table.push(row);
    }

    let mut z_row = vec![CellValue::text("Z (mL/g)")];
    z_row.extend(runs.iter().map(|(_, c)| CellValue::Float(c.conversion_factor, 6)));
    table.push(z_row);

    Some(table)
}

fn heading(report: &CalculationReport, sheet: Option<&CalibrationSheet>) -> String {
    let instrument = &report.instrument;
    let env = &report.environment;
    let title = sheet.map_or_else(|| instrument.class.name().to_string(), |s| s.title.clone());
    format!(
        "{} | {} ({}) | {} | {:.1} °C, {:.1} hPa, {:.0}% RH{}",
        title,
        instrument.class.name(),
        instrument.class,
        report.method,
        env.air_temperature,
        env.pressure,
        env.humidity,
        if report.tare { " | tare" } else { "" }
    )
}

fn render_terminal(
    report: &CalculationReport,
    sheet: Option<&CalibrationSheet>,
    decimals: usize,
    quiet: bool,
) -> String {
    let mut lines = Vec::new();

    if !quiet {
        lines.push(style(heading(report, sheet)).bold().to_string());
        lines.push(String::new());
    }
    if let Some(table) = converted_table(report, decimals) {
        lines.push(table.render(OutputFormat::Table));
        lines.push(String::new());
    }
    let results = results_table(report, decimals);
    if !results.is_empty() {
        lines.push(results.render(OutputFormat::Table));
    }

    if !quiet {
        for (cell, message) in report.flagged_cells() {
            lines.push(format!("{} {} ({})", style("✗").red(), message, style(cell).cyan()));
        }
        for note in report.notices() {
            lines.push(format!("{} {}", style("ℹ").blue(), style(note).dim()));
        }
        for note in &report.advisories {
            lines.push(format!("{} {}", style("⚠").yellow(), note));
        }

        let failures = report.non_conformities().len();
        let evaluated = report.evaluated_count();
        lines.push(if evaluated == 0 {
            format!("{} No run could be evaluated", style("!").yellow())
        } else if failures == 0 {
            format!(
                "{} {} run(s) evaluated, no non-conformity",
                style("✓").green(),
                style(evaluated).cyan()
            )
        } else {
            format!(
                "{} {} run(s) evaluated, {} non-conform verdict(s)",
                style("✗").red(),
                style(evaluated).cyan(),
                style(failures).red().bold()
            )
        });
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn render_markdown(
    report: &CalculationReport,
    sheet: Option<&CalibrationSheet>,
    decimals: usize,
) -> String {
    let mut out = format!("# {}\n\n", heading(report, sheet).replace('|', "-"));
    if let Some(operator) = sheet.and_then(|s| s.operator.as_deref()) {
        out.push_str(&format!("Operator: {}\n\n", operator));
    }

    if let Some(table) = converted_table(report, decimals) {
        out.push_str("## Converted volumes\n\n");
        out.push_str(&table.render(OutputFormat::Md));
        out.push_str("\n\n");
    }

    out.push_str("## Results\n\n");
    out.push_str(&results_table(report, decimals).render(OutputFormat::Md));
    out.push_str("\n\n");

    let flagged = report.flagged_cells();
    let notices = report.notices();
    if !flagged.is_empty() || !notices.is_empty() || !report.advisories.is_empty() {
        out.push_str("## Notes\n\n");
        for (cell, message) in flagged {
            out.push_str(&format!("- **{}**: {}\n", cell, message));
        }
        for note in notices.iter().chain(&report.advisories) {
            out.push_str(&format!("- {}\n", note));
        }
    }

    out
}

/// Flagged cells and notices on stderr, keeping stdout machine-readable
fn print_diagnostics(report: &CalculationReport) {
    for (cell, message) in report.flagged_cells() {
        eprintln!("{} {} ({})", style("✗").red(), message, cell);
    }
    for note in report.notices().iter().chain(&report.advisories) {
        eprintln!("{} {}", style("⚠").yellow(), note);
    }
}
