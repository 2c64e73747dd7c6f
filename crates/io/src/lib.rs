// File I/O operations
//
// Every source is read into a raw `Table` grid: no header handling, no type
// coercion beyond what the file format itself carries. Schema decisions
// belong to the caller.

pub mod csv;
pub mod table;
pub mod xlsx;

use std::path::Path;

pub use table::{Cell, Table};

/// Tabular formats recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Delimited text (csv, tsv, txt)
    Delimited,
    /// Workbook (xlsx, xls, xlsb, ods); only the first sheet is read
    Workbook,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("csv") | Some("tsv") | Some("txt") => Some(Self::Delimited),
            Some("xlsx") | Some("xls") | Some("xlsb") | Some("ods") => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// Import any supported file into a raw table, dropping `skip_rows` leading
/// rows (physical lines for delimited text, sheet rows for workbooks).
pub fn import(path: &Path, skip_rows: usize) -> Result<Table, String> {
    match SourceFormat::from_path(path) {
        Some(SourceFormat::Delimited) => csv::import(path, skip_rows),
        Some(SourceFormat::Workbook) => xlsx::import(path, skip_rows),
        None => Err(format!(
            "{}: unsupported file extension (expected csv, tsv, txt, xlsx, xls, xlsb or ods)",
            path.display()
        )),
    }
}
