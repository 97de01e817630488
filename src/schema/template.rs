//! Template generation for new calibration sheets

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use rust_embed::Embed;
use tera::Tera;
use thiserror::Error;

use crate::core::conversion::RowLayout;
use crate::core::density::DEFAULT_REFERENCE_DENSITY;
use crate::core::instrument::{Family, InstrumentClass, VolumeUnit};
use crate::core::tolerance::profile;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const SHEET_TEMPLATE: &str = "sheet.yaml.tera";

/// Context for sheet generation
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub class: InstrumentClass,
    pub operator: String,
    pub created: DateTime<Utc>,
    pub title: Option<String>,
    pub unit: Option<VolumeUnit>,
    pub runs: usize,
    pub replicates: usize,
    pub tare: bool,
    pub evaporation_loss: f64,
    pub reference_density: f64,
}

impl TemplateContext {
    pub fn new(class: InstrumentClass, operator: String) -> Self {
        Self {
            class,
            operator,
            created: Utc::now(),
            title: None,
            unit: None,
            runs: 1,
            replicates: 10,
            tare: false,
            evaporation_loss: 0.0,
            reference_density: DEFAULT_REFERENCE_DENSITY,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_unit(mut self, unit: VolumeUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_replicates(mut self, replicates: usize) -> Self {
        self.replicates = replicates;
        self
    }

    pub fn with_tare(mut self, tare: bool) -> Self {
        self.tare = tare;
        self
    }

    pub fn with_evaporation_loss(mut self, loss: f64) -> Self {
        self.evaporation_loss = loss;
        self
    }

    pub fn with_reference_density(mut self, density: f64) -> Self {
        self.reference_density = density;
        self
    }

    fn unit(&self) -> VolumeUnit {
        self.unit.unwrap_or_else(|| self.class.native_unit())
    }

    /// One comment label per grid row, in layout order
    pub fn row_labels(&self) -> Vec<String> {
        let unit = self.unit();
        let layout = RowLayout::for_family(self.class.family());
        let mut labels = vec![
            format!("nominal volume ({})", unit),
            format!("tested volume ({})", unit),
        ];

        for row in labels.len()..layout.first_reading {
            let label = if layout.container == Some(row) {
                if self.tare {
                    "empty container mass (g), unused in tare mode"
                } else {
                    "empty container mass (g)"
                }
            } else if row == layout.water_temperature {
                "water temperature (°C)"
            } else {
                "unused"
            };
            labels.push(label.to_string());
        }

        let cumulative = self.class.family() == Family::Piston && !self.tare;
        labels.extend((1..=self.replicates).map(|i| {
            if cumulative {
                format!("cumulative reading {} (g)", i)
            } else {
                format!("reading {} (g)", i)
            }
        }));
        labels
    }
}

/// Template generator using Tera
pub struct TemplateGenerator {
    tera: Tera,
}

#[derive(Debug, Error, Diagnostic)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    #[diagnostic(code(gravcal::template::not_found))]
    NotFound(String),

    #[error("template rendering error: {0}")]
    #[diagnostic(code(gravcal::template::render))]
    RenderError(String),
}

impl TemplateGenerator {
    /// Create a new template generator with embedded templates
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| TemplateError::RenderError(e.to_string()))?;
                }
            }
        }

        Ok(Self { tera })
    }

    /// Generate an empty calibration sheet
    pub fn generate_sheet(&self, ctx: &TemplateContext) -> Result<String, TemplateError> {
        if !self.tera.get_template_names().any(|n| n == SHEET_TEMPLATE) {
            return Err(TemplateError::NotFound(SHEET_TEMPLATE.to_string()));
        }

        let class = ctx.class;
        let title = ctx
            .title
            .clone()
            .unwrap_or_else(|| format!("{} calibration", class.name()));

        let mut context = tera::Context::new();
        context.insert("title", &title);
        context.insert("operator", &ctx.operator);
        context.insert("created", &ctx.created.to_rfc3339());
        context.insert("class", class.tag());
        context.insert("class_name", class.name());
        context.insert("unit", ctx.unit().tag());
        context.insert("glassware", &(class.family() == Family::Glassware));
        context.insert("method", class.family().method_standard());
        context.insert("standard", profile(class).standard);
        context.insert("evaporation_loss", &ctx.evaporation_loss);
        context.insert("reference_density", &ctx.reference_density);
        context.insert("tare", &ctx.tare);
        context.insert("runs", &ctx.runs);
        context.insert("rows", &ctx.row_labels());

        self.tera
            .render(SHEET_TEMPLATE, &context)
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }
}
