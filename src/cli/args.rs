//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    calc::CalcArgs, classes::ClassesArgs, completions::CompletionsArgs, density::DensityArgs,
    limits::LimitsArgs, new::NewArgs,
};

#[derive(Parser)]
#[command(name = "gravcal")]
#[command(author, version, about = "Gravimetric calibration calculator")]
#[command(long_about = "Converts balance readings into delivered volumes (ISO 4787 / ISO 8655-6), \
reduces them to systematic and random errors, and judges each run against the tolerance \
limits of the instrument's governing standard.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Calculate volumes, errors and verdicts from a sheet or CSV grid
    Calc(CalcArgs),

    /// Show the tolerance limits for one instrument size
    Limits(LimitsArgs),

    /// Show water density, air density and conversion factor Z
    Density(DensityArgs),

    /// List the supported instrument classes
    Classes(ClassesArgs),

    /// Create a new calibration sheet from a template
    New(NewArgs),

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table on a terminal (or the configured default)
    #[default]
    Auto,
    /// Human-readable table with coloured verdicts
    Table,
    /// JSON format (full report)
    Json,
    /// YAML format (full report)
    Yaml,
    /// CSV format (for spreadsheets)
    Csv,
    /// Tab-separated values (for piping)
    Tsv,
    /// Markdown tables
    Md,
}

impl OutputFormat {
    /// Resolve `Auto` against the configured default
    pub fn resolve(self, configured: Option<&str>) -> OutputFormat {
        match self {
            OutputFormat::Auto => configured
                .and_then(|s| OutputFormat::from_str(s, true).ok())
                .filter(|f| *f != OutputFormat::Auto)
                .unwrap_or(OutputFormat::Table),
            other => other,
        }
    }
}
