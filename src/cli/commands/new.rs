//! `gravcal new` command - write an empty calibration sheet

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::core::density::DEFAULT_REFERENCE_DENSITY;
use crate::core::instrument::{InstrumentClass, VolumeUnit};
use crate::core::Config;
use crate::schema::{TemplateContext, TemplateGenerator};

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Path of the sheet to create
    pub path: PathBuf,

    /// Instrument class tag (see `gravcal classes`)
    #[arg(long, short = 'c')]
    pub class: InstrumentClass,

    /// Sheet title
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Volume unit (default: the class's native unit)
    #[arg(long, short = 'u')]
    pub unit: Option<VolumeUnit>,

    /// Number of test runs (grid columns)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=100))]
    pub runs: u16,

    /// Readings per run
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(2..=1000))]
    pub replicates: u16,

    /// Prepare the sheet for individually tared readings
    #[arg(long)]
    pub tare: bool,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    if args.path.exists() && !args.force {
        return Err(miette::miette!(
            help = "use --force to overwrite it",
            "{} already exists",
            args.path.display()
        ));
    }

    let config = Config::load();
    let mut ctx = TemplateContext::new(args.class, config.operator())
        .with_runs(args.runs as usize)
        .with_replicates(args.replicates as usize)
        .with_tare(args.tare)
        .with_evaporation_loss(config.evaporation_loss.unwrap_or(0.0))
        .with_reference_density(config.reference_density.unwrap_or(DEFAULT_REFERENCE_DENSITY));
    if let Some(title) = args.title {
        ctx = ctx.with_title(title);
    }
    if let Some(unit) = args.unit {
        ctx = ctx.with_unit(unit);
    }

    let generator = TemplateGenerator::new()?;
    let content = generator.generate_sheet(&ctx)?;

    if let Some(parent) = args.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).into_diagnostic()?;
    }
    std::fs::write(&args.path, content).into_diagnostic()?;
    tracing::debug!(path = %args.path.display(), class = %args.class, "sheet written");

    if !global.quiet {
        println!(
            "{} Created {} sheet {}",
            style("✓").green(),
            args.class.name(),
            style(args.path.display()).cyan()
        );
        println!(
            "  Fill in the readings, then run {}",
            style(format!("gravcal calc {}", args.path.display())).yellow()
        );
    }

    Ok(())
}
