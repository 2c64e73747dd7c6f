use calllog_io::{Cell, Table};

use crate::cells::header_name;
use crate::error::PipelineError;

static EMPTY_CELL: Cell = Cell::Empty;

/// A header-bearing table: the first row of the source becomes capitalized
/// column names, the remaining non-blank rows are data.
#[derive(Debug, Clone)]
pub struct Frame {
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<FrameRow>,
}

#[derive(Debug, Clone)]
pub struct FrameRow {
    /// 1-based position below the header row.
    pub line: usize,
    pub cells: Vec<Cell>,
}

impl Frame {
    pub fn from_table(source: &str, table: Table) -> Result<Self, PipelineError> {
        let mut rows = table.rows.into_iter();
        let header = rows.next().ok_or_else(|| PipelineError::MissingHeader {
            source: source.to_string(),
        })?;

        let headers = header
            .iter()
            .map(|c| c.text().map(|t| header_name(&t)).unwrap_or_default())
            .collect();

        // Wholly blank rows carry no record
        let rows = rows
            .enumerate()
            .filter(|(_, cells)| !cells.iter().all(Cell::is_blank))
            .map(|(i, cells)| FrameRow { line: i + 1, cells })
            .collect();

        Ok(Self {
            source: source.to_string(),
            headers,
            rows,
        })
    }

    /// Index of a column by its capitalized name.
    pub fn column(&self, name: &str) -> Result<usize, PipelineError> {
        let wanted = header_name(name);
        self.headers
            .iter()
            .position(|h| *h == wanted)
            .ok_or_else(|| PipelineError::MissingColumn {
                source: self.source.clone(),
                column: wanted,
            })
    }

    /// Error for a carrier cell that did not parse.
    pub fn cell_error(&self, row: &FrameRow, col: usize) -> PipelineError {
        PipelineError::CellParse {
            source: self.source.clone(),
            row: row.line,
            column: self.headers.get(col).cloned().unwrap_or_default(),
            value: row.cell(col).text().unwrap_or_default(),
        }
    }
}

impl FrameRow {
    /// Cell at `col`; short rows read as empty.
    pub fn cell(&self, col: usize) -> &Cell {
        self.cells.get(col).unwrap_or(&EMPTY_CELL)
    }
}
