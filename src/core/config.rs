//! Configuration management with layered hierarchy

use miette::Diagnostic;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the per-directory config, discovered by walking up
pub const LOCAL_CONFIG_FILE: &str = ".gravcal.yaml";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    #[diagnostic(code(gravcal::config::io))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {message}")]
    #[diagnostic(
        code(gravcal::config::parse),
        help("config files are YAML maps; see `gravcal --help` for the recognised keys")
    )]
    Parse { path: PathBuf, message: String },

    #[error("invalid value for {var}: '{value}'")]
    #[diagnostic(code(gravcal::config::env))]
    Env { var: &'static str, value: String },
}

/// gravcal configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Operator recorded on new sheets
    pub operator: Option<String>,

    /// Density of the balance reference weights (g/mL)
    pub reference_density: Option<f64>,

    /// Evaporation loss added to each glassware net mass (g)
    pub evaporation_loss: Option<f64>,

    /// Display digits for volumes
    pub decimals: Option<usize>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    ///
    /// Unreadable or malformed files are skipped with a warning so a broken
    /// global config never blocks a calculation.
    pub fn load() -> Self {
        let mut config = Config::default();

        let files = Self::global_config_path()
            .into_iter()
            .chain(std::env::current_dir().ok().and_then(|d| Self::find_local(&d)));

        for path in files {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(layer) => {
                    tracing::debug!(path = %path.display(), "loaded config");
                    config.merge(layer);
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }

        if let Err(e) = config.apply_env(|key| std::env::var(key).ok()) {
            tracing::warn!("{}", e);
        }

        config
    }

    /// Parse one config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "gravcal")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Nearest `.gravcal.yaml` at or above `start`
    pub fn find_local(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.operator.is_some() {
            self.operator = other.operator;
        }
        if other.reference_density.is_some() {
            self.reference_density = other.reference_density;
        }
        if other.evaporation_loss.is_some() {
            self.evaporation_loss = other.evaporation_loss;
        }
        if other.decimals.is_some() {
            self.decimals = other.decimals;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Apply `GRAVCAL_*` overrides; every valid variable is applied even if
    /// another one is malformed
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut first_error = None;

        if let Some(operator) = lookup("GRAVCAL_OPERATOR") {
            self.operator = Some(operator);
        }

        let mut number = |var: &'static str| -> Option<f64> {
            let value = lookup(var)?;
            match value.trim().replace(',', ".").parse::<f64>() {
                Ok(n) if n.is_finite() => Some(n),
                _ => {
                    first_error.get_or_insert(ConfigError::Env { var, value });
                    None
                }
            }
        };
        if let Some(rho) = number("GRAVCAL_REFERENCE_DENSITY") {
            self.reference_density = Some(rho);
        }
        if let Some(loss) = number("GRAVCAL_EVAPORATION_LOSS") {
            self.evaporation_loss = Some(loss);
        }

        if let Some(value) = lookup("GRAVCAL_DECIMALS") {
            match value.trim().parse::<usize>() {
                Ok(d) => self.decimals = Some(d),
                Err(_) => {
                    first_error.get_or_insert(ConfigError::Env {
                        var: "GRAVCAL_DECIMALS",
                        value,
                    });
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Get the operator name, falling back to git config or username
    pub fn operator(&self) -> String {
        if let Some(ref operator) = self.operator {
            return operator.clone();
        }

        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }
}
