//! Table formatting for command output
//!
//! Commands build a [`Table`] of typed cells once and render it in whichever
//! tabular format was requested. Verdicts are coloured only in the terminal
//! table; CSV, TSV and Markdown stay plain for piping.

use console::style;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, fmt_fixed, fmt_signed};
use crate::cli::OutputFormat;
use crate::core::conformity::Conformity;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    Text(String),
    /// Float value with precision
    Float(f64, usize),
    /// Float shown with an explicit sign
    Signed(f64, usize),
    Count(usize),
    /// Conformity verdict with color coding
    Verdict(Conformity),
    Empty,
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn optional(value: Option<f64>, precision: usize) -> Self {
        value.map_or(CellValue::Empty, |v| CellValue::Float(v, precision))
    }

    /// Plain text, no colors
    pub fn raw(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Float(f, precision) => fmt_fixed(Some(*f), *precision),
            CellValue::Signed(f, precision) => fmt_signed(*f, *precision),
            CellValue::Count(n) => n.to_string(),
            CellValue::Verdict(c) => c.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Terminal rendering with colors
    pub fn format_terminal(&self) -> String {
        match self {
            CellValue::Verdict(c) => {
                let s = c.to_string();
                match c {
                    Conformity::Conform => style(s).green().to_string(),
                    Conformity::NonConform => style(s).red().bold().to_string(),
                    Conformity::Unevaluable => style(s).dim().to_string(),
                }
            }
            CellValue::Empty => "-".to_string(),
            other => other.raw(),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        escape_csv(&self.raw())
    }

    /// Format for TSV output; tabs and newlines would break the columns
    pub fn format_tsv(&self) -> String {
        self.raw().replace(['\t', '\n'], " ")
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Verdict(Conformity::NonConform) => "**non-conform**".to_string(),
            CellValue::Empty => "-".to_string(),
            other => other.raw(),
        };
        raw.replace('|', "\\|")
    }
}

/// Header plus rows, rendered on demand
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Render in a tabular format; structured formats fall back to the terminal table
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.delimited(",", CellValue::format_csv),
            OutputFormat::Tsv => self.delimited("\t", CellValue::format_tsv),
            OutputFormat::Md => self
                .builder(CellValue::format_md)
                .build()
                .with(Style::markdown())
                .to_string(),
            _ => self
                .builder(CellValue::format_terminal)
                .build()
                .with(Style::rounded())
                .to_string(),
        }
    }

    fn builder(&self, cell: fn(&CellValue) -> String) -> Builder {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().cloned());
        for row in &self.rows {
            builder.push_record(row.iter().map(cell));
        }
        builder
    }

    fn delimited(&self, sep: &str, cell: fn(&CellValue) -> String) -> String {
        let mut out = String::new();
        let header: Vec<String> = self
            .headers
            .iter()
            .map(|h| cell(&CellValue::Text(h.clone())))
            .collect();
        out.push_str(&header.join(sep));
        out.push('\n');
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(cell).collect();
            out.push_str(&line.join(sep));
            out.push('\n');
        }
        out
    }
}
