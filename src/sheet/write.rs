use std::path::Path;

use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook};
use tracing::info;

use super::{Cell, Error, Sheet};

const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Write the whole sheet to `path`, replacing any existing file.
pub fn save(sheet: &Sheet, path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|error| Error::CreateDir {
            error,
            path: parent.to_owned(),
        })?;
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    if !sheet.name().is_empty() {
        worksheet.set_name(sheet.name())?;
    }
    let datetime = Format::new().set_num_format(DATETIME_FORMAT);

    for (col, header) in sheet.headers().iter().enumerate() {
        worksheet.write_string(0, col_num(col)?, header)?;
    }
    for (index, cells) in sheet.rows().enumerate() {
        let row = RowNum::try_from(index + 1).map_err(|_| Error::TooManyRows(index + 1))?;
        for (col, cell) in cells.iter().enumerate() {
            let col = col_num(col)?;
            match cell {
                Cell::Empty => {}
                Cell::Text(text) | Cell::Error(text) => {
                    worksheet.write_string(row, col, text)?;
                }
                Cell::Int(i) => {
                    worksheet.write_number(row, col, *i as f64)?;
                }
                Cell::Float(f) => {
                    worksheet.write_number(row, col, *f)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                Cell::DateTime(serial) => {
                    worksheet.write_number_with_format(row, col, *serial, &datetime)?;
                }
            }
        }
    }
    workbook.save(path)?;
    info!(?path, rows = sheet.len(), "workbook written");
    Ok(())
}

fn col_num(col: usize) -> Result<ColNum, Error> {
    ColNum::try_from(col).map_err(|_| Error::TooManyColumns(col))
}

#[cfg(test)]
mod tests {
    use crate::sheet::{Cell, Sheet, read};

    #[test]
    fn written_workbook_reads_back_with_types_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/products.xlsx");

        let mut sheet = Sheet::new(
            "Products",
            ["WL", "QOH", "Retail", "Silo Image", "Lifestyle Image", "Updated"],
        );
        sheet.push_row([
            Cell::Text("OWP0730".into()),
            Cell::Int(4),
            Cell::Float(1299.99),
            Cell::Text("https://example.com/owp0730.jpg".into()),
            Cell::Empty,
            Cell::DateTime(45292.5),
        ]);
        sheet.push_row([Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty]);
        sheet.push_row([
            Cell::Text("OWP0731".into()),
            Cell::Bool(true),
            Cell::Error("#N/A".into()),
            Cell::Empty,
            Cell::Text("https://cdn.example.com/OWP0731_room.png".into()),
            Cell::Empty,
        ]);
        super::save(&sheet, &path).unwrap();

        let loaded = read::load(&path).unwrap();
        assert_eq!(loaded.name(), "Products");
        assert_eq!(loaded.headers(), sheet.headers());
        // blank separator rows keep their place
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.cell(0, 0), Some(&Cell::Text("OWP0730".into())));
        assert_eq!(loaded.cell(0, 1).and_then(Cell::integer), Some(4));
        assert_eq!(loaded.cell(0, 2).and_then(Cell::number), Some(1299.99));
        assert_eq!(loaded.cell(0, 4), Some(&Cell::Empty));
        assert_eq!(loaded.cell(0, 5), Some(&Cell::DateTime(45292.5)));
        assert!((0..6).all(|col| loaded.cell(1, col) == Some(&Cell::Empty)));
        assert_eq!(loaded.cell(2, 1), Some(&Cell::Bool(true)));
        // error values come back as their text
        assert_eq!(loaded.cell(2, 2), Some(&Cell::Text("#N/A".into())));
        assert_eq!(
            loaded.cell(2, 4).and_then(Cell::text).as_deref(),
            Some("https://cdn.example.com/OWP0731_room.png")
        );
    }
}
