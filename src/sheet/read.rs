use std::path::Path;

use calamine::{Data, Reader as _};
use tracing::{debug, info};

use super::{Cell, Error, Sheet};

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Error(e.to_string()),
        }
    }
}

/// Load the first worksheet of a workbook.
///
/// The first row is the header row. Blank rows between products are kept so
/// the sheet writes back with the same row layout; trailing blank rows are
/// trimmed.
pub fn load(path: &Path) -> Result<Sheet, Error> {
    info!(?path, "reading workbook");
    let mut workbook = calamine::open_workbook_auto(path).map_err(|error| Error::Open {
        error,
        path: path.to_owned(),
    })?;
    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::NoWorksheet {
            path: path.to_owned(),
        })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::NoWorksheet {
            path: path.to_owned(),
        })?
        .map_err(|error| Error::ReadWorksheet {
            error,
            path: path.to_owned(),
        })?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .ok_or(Error::MissingHeader)?
        .iter()
        .map(|cell| Cell::from(cell).text().unwrap_or_default())
        .collect::<Vec<_>>();
    let mut sheet = Sheet::new(name, headers);
    let rows = rows.collect::<Vec<_>>();
    let used = rows
        .iter()
        .rposition(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map_or(0, |last| last + 1);
    for row in &rows[..used] {
        sheet.push_row(row.iter().map(Cell::from));
    }
    debug!(sheet = sheet.name(), columns = sheet.headers().len(), "parsed worksheet");
    info!(rows = sheet.len(), "found products");
    Ok(sheet)
}
