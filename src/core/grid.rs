//! Reading grid - the rectangular table of raw entries, one column per run
//!
//! Cells arrive as optional text from the data-entry surface (a sheet file or
//! a CSV export). Decimal commas are normalized before parsing; anything that
//! still fails to parse is kept as [`Cell::Invalid`] so the offending
//! coordinate can be reported back instead of failing the whole grid.

use miette::Diagnostic;
use std::io::Read;
use thiserror::Error;

use crate::core::error::{CellRef, RunError};

/// One grid cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Invalid(String),
}

impl Cell {
    /// Parse operator text, accepting ',' as the decimal separator
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.replace(',', ".").parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Number(value),
            _ => Cell::Invalid(trimmed.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl From<Option<&str>> for Cell {
    fn from(text: Option<&str>) -> Self {
        text.map_or(Cell::Empty, Cell::parse)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Grid loading errors
#[derive(Debug, Error, Diagnostic)]
pub enum GridError {
    #[error("CSV error: {0}")]
    #[diagnostic(code(gravcal::grid::csv))]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Column-major grid of readings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingGrid {
    columns: Vec<Vec<Cell>>,
}

impl ReadingGrid {
    /// Build from columns of already-classified cells
    pub fn from_cells(columns: Vec<Vec<Cell>>) -> Self {
        Self { columns }
    }

    /// Build from columns of optional text
    pub fn from_columns<S: AsRef<str>>(columns: &[Vec<Option<S>>]) -> Self {
        let columns = columns
            .iter()
            .map(|col| {
                col.iter()
                    .map(|cell| match cell {
                        Some(text) => Cell::parse(text.as_ref()),
                        None => Cell::Empty,
                    })
                    .collect()
            })
            .collect();
        Self { columns }
    }

    /// Build from rows of optional text; ragged rows are padded with empties
    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<Option<S>>]) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut columns = vec![Vec::with_capacity(rows.len()); width];
        for row in rows {
            for (col, column) in columns.iter_mut().enumerate() {
                let cell = match row.get(col) {
                    Some(Some(text)) => Cell::parse(text.as_ref()),
                    _ => Cell::Empty,
                };
                column.push(cell);
            }
        }
        Self { columns }
    }

    /// Build from numeric columns
    pub fn from_values(columns: &[Vec<f64>]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|col| col.iter().copied().map(Cell::from).collect())
                .collect(),
        }
    }

    /// Read a header-less CSV where each record is one grid row
    ///
    /// The delimiter is taken from the first line: `;` or tab when present
    /// outside quotes, `,` otherwise. Semicolon files may then carry bare
    /// decimal commas.
    pub fn from_csv_reader<R: Read>(mut reader: R) -> Result<Self, GridError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;

        let delimiter = sniff_delimiter(&data);
        tracing::debug!(delimiter = %char::from(delimiter), "reading CSV grid");

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(data.as_slice());

        let mut rows: Vec<Vec<Option<String>>> = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            None
                        } else {
                            Some(field.to_string())
                        }
                    })
                    .collect(),
            );
        }

        Ok(Self::from_rows(&rows))
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.columns
            .get(column)
            .and_then(|c| c.get(row))
            .unwrap_or(&Cell::Empty)
    }

    /// Extract the test run held in `column`
    pub fn test_run(&self, column: usize) -> TestRun {
        TestRun {
            column,
            cells: self.columns.get(column).cloned().unwrap_or_default(),
        }
    }

    /// All test runs, in column order
    pub fn test_runs(&self) -> impl Iterator<Item = TestRun> + '_ {
        (0..self.column_count()).map(|c| self.test_run(c))
    }
}

/// Field delimiter used by the first non-blank line of `data`
fn sniff_delimiter(data: &[u8]) -> u8 {
    let first = data
        .split(|&b| b == b'\n')
        .find(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .unwrap_or_default();

    let mut quoted = false;
    let mut tab = false;
    for &b in first {
        match b {
            b'"' => quoted = !quoted,
            b';' if !quoted => return b';',
            b'\t' if !quoted => tab = true,
            _ => {}
        }
    }
    if tab {
        b'\t'
    } else {
        b','
    }
}

/// The entries of one grid column
#[derive(Debug, Clone, PartialEq)]
pub struct TestRun {
    pub column: usize,
    cells: Vec<Cell>,
}

impl TestRun {
    pub fn new(column: usize, cells: Vec<Cell>) -> Self {
        Self { column, cells }
    }

    /// Number of non-empty entries
    pub fn entry_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    pub fn cell(&self, row: usize) -> &Cell {
        self.cells.get(row).unwrap_or(&Cell::Empty)
    }

    /// First unparseable cell in the run
    pub fn first_invalid(&self) -> Option<RunError> {
        self.cells.iter().enumerate().find_map(|(row, cell)| match cell {
            Cell::Invalid(text) => Some(RunError::InvalidInput {
                cell: CellRef::new(row, self.column),
                text: text.clone(),
            }),
            _ => None,
        })
    }

    /// Required numeric entry at `row`
    pub fn number(&self, row: usize, what: &'static str) -> Result<f64, RunError> {
        let cell = CellRef::new(row, self.column);
        match self.cell(row) {
            Cell::Number(value) => Ok(*value),
            Cell::Empty => Err(RunError::MissingInput { cell, what }),
            Cell::Invalid(text) => Err(RunError::InvalidInput {
                cell,
                text: text.clone(),
            }),
        }
    }

    /// Non-empty numeric entries from `start` on, in row order
    pub fn readings_from(&self, start: usize) -> Result<Vec<f64>, RunError> {
        let mut readings = Vec::new();
        for (row, cell) in self.cells.iter().enumerate().skip(start) {
            match cell {
                Cell::Empty => {}
                Cell::Number(value) => readings.push(*value),
                Cell::Invalid(text) => {
                    return Err(RunError::InvalidInput {
                        cell: CellRef::new(row, self.column),
                        text: text.clone(),
                    })
                }
            }
        }
        Ok(readings)
    }
}
