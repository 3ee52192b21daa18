//! In-memory spreadsheet model.
//!
//! The sheet is the system of record for a run: it is loaded once, mutated
//! in place one cell at a time, and written back in a single pass. Cells that
//! the pipeline never touches keep their original type and value.

use std::path::PathBuf;

pub mod read;
pub mod write;

pub use read::load;
pub use write::save;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open workbook ({path:?}): {error}")]
    Open {
        error: calamine::Error,
        path: PathBuf,
    },
    #[error("workbook has no worksheet ({path:?})")]
    NoWorksheet { path: PathBuf },
    #[error("failed to read worksheet ({path:?}): {error}")]
    ReadWorksheet {
        error: calamine::Error,
        path: PathBuf,
    },
    #[error("worksheet has no header row")]
    MissingHeader,
    #[error("column '{0}' not found in worksheet")]
    MissingColumn(String),
    #[error("too many columns to write: {0}")]
    TooManyColumns(usize),
    #[error("too many rows to write: {0}")]
    TooManyRows(usize),
    #[error("failed to create output directory ({path:?}): {error}")]
    CreateDir {
        error: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Excel serial date
    DateTime(f64),
    /// Formula error such as `#N/A`, kept as its display text.
    Error(String),
}

impl Cell {
    /// Empty cells and whitespace-only text both count as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Render the cell as trimmed text, `None` when blank.
    pub fn text(&self) -> Option<String> {
        let text = match self {
            Cell::Empty => return None,
            Cell::Text(text) => text.trim().to_owned(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                (*f as i64).to_string()
            }
            Cell::Float(f) => f.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(serial) => serial.to_string(),
            Cell::Error(e) => e.clone(),
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn number(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            Cell::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn integer(&self) -> Option<i64> {
        match self {
            Cell::Int(i) => Some(*i),
            Cell::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Cell::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, cells: impl IntoIterator<Item = Cell>) {
        let mut cells = cells.into_iter().collect::<Vec<_>>();
        cells.resize(self.headers.len(), Cell::Empty);
        self.rows.push(cells);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Index of a column by header name, ignoring surrounding whitespace.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| header.trim() == name.trim())
    }

    pub fn require_column(&self, name: &str) -> Result<usize, Error> {
        self.column(name)
            .ok_or_else(|| Error::MissingColumn(name.to_owned()))
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|cells| cells.get(column))
    }

    pub fn set(&mut self, row: usize, column: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(row).and_then(|cells| cells.get_mut(column)) {
            *slot = cell;
        }
    }
}
