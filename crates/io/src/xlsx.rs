// Excel file import (xlsx, xls, xlsb, ods)
//
// Only the first worksheet is read. Row and column positions are absolute:
// if the used range starts below A1, the gap is filled with empty rows, so
// `skip_rows` counts sheet rows, not data rows.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};

use crate::table::{Cell, Table};

/// Maximum dimensions read from a sheet
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 256;

/// Import the first sheet of an Excel workbook, dropping `skip_rows` leading
/// sheet rows.
pub fn import(path: &Path, skip_rows: usize) -> Result<Table, String> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("{}: failed to open Excel file: {}", path.display(), e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let Some(first) = sheet_names.first() else {
        return Err(format!("{}: Excel file contains no sheets", path.display()));
    };

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| format!("{}: failed to read sheet '{}': {}", path.display(), first, e))?;

    let (height, width) = range.get_size();
    if height == 0 || width == 0 {
        return Ok(Table::default());
    }

    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let start_row = start_row as usize;
    let start_col = start_col as usize;

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row.min(MAX_ROWS)];

    for row in range.rows() {
        if rows.len() >= MAX_ROWS {
            break;
        }
        let mut cells = vec![Cell::Empty; start_col.min(MAX_COLS)];
        for cell in row.iter() {
            if cells.len() >= MAX_COLS {
                break;
            }
            cells.push(convert(cell));
        }
        rows.push(cells);
    }

    let rows = if skip_rows >= rows.len() {
        Vec::new()
    } else {
        rows.split_off(skip_rows)
    };
    Ok(Table::new(rows))
}

fn convert(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => {
            if s.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        // Store error as text representation
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        // calamine keeps the 1904 flag private; the 1900 system is assumed
        Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}
