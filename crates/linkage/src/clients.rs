use calllog_io::{Cell, Table};
use tracing::{debug, warn};

use crate::cells::{parse_count, parse_date, parse_time};
use crate::model::{ClientCallRecord, DropReason, DropTally, DroppedRow, RowOutcome};
use crate::phone::PhoneNumber;

/// Extensions a client export may carry.
pub const CLIENT_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsb", "ods", "csv"];

/// Positional layout of a client export (no header row).
const COL_DATE: usize = 0;
const COL_TIME: usize = 1;
const COL_NUMBER: usize = 2;
const COL_ORIGINATION: usize = 3;
const COL_DESTINATION: usize = 4;
const COL_DURATION: usize = 5;
const MIN_CELLS: usize = 6;

/// Client identity from a file name: `_Acme Corp.xlsx` -> `Acme Corp`.
///
/// `None` when the name lacks the marker, has an unsupported extension, or
/// leaves an empty client name.
pub fn client_name(file_name: &str, marker: char) -> Option<String> {
    let rest = file_name.strip_prefix(marker)?;
    let (stem, ext) = rest.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    if !CLIENT_EXTENSIONS.contains(&ext.as_str()) || stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}

/// One loaded client export.
#[derive(Debug, Clone)]
pub struct ClientSource {
    pub file_name: String,
    pub client_name: String,
    pub table: Table,
}

/// Normalize every row of one client file. Malformed rows come back as
/// `RowOutcome::Dropped` rather than failing the file.
pub fn normalize_client_rows(source: &ClientSource) -> Vec<RowOutcome<ClientCallRecord>> {
    source
        .table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, cells)| !cells.iter().all(Cell::is_blank))
        .map(|(i, cells)| match read_row(cells, &source.client_name) {
            Ok(record) => RowOutcome::Kept(record),
            Err(reason) => RowOutcome::Dropped(DroppedRow {
                source: source.file_name.clone(),
                row: i + 1,
                reason,
            }),
        })
        .collect()
}

fn read_row(cells: &[Cell], client_name: &str) -> Result<ClientCallRecord, DropReason> {
    if cells.len() < MIN_CELLS {
        return Err(DropReason::ShortRow { cells: cells.len() });
    }

    let value = |col: usize| cells[col].text().unwrap_or_default();

    // A non-numeric duration marks a summary or note row. Nothing else drops
    // a row: a dropped row could hide a second client sharing its number.
    let duration = parse_count(&cells[COL_DURATION]).ok_or_else(|| DropReason::BadDuration {
        value: value(COL_DURATION),
    })?;

    Ok(ClientCallRecord {
        date: parse_date(&cells[COL_DATE]),
        time: parse_time(&cells[COL_TIME]),
        number: PhoneNumber::from_cell(&cells[COL_NUMBER]),
        origination: cells[COL_ORIGINATION].text(),
        destination: cells[COL_DESTINATION].text(),
        duration,
        client_name: client_name.to_string(),
    })
}

/// All client records, concatenated in file order.
#[derive(Debug, Clone, Default)]
pub struct ClientCorpus {
    pub records: Vec<ClientCallRecord>,
    pub files: usize,
    pub dropped: DropTally,
}

pub fn normalize_clients(sources: &[ClientSource]) -> ClientCorpus {
    let mut corpus = ClientCorpus {
        files: sources.len(),
        ..Default::default()
    };

    for source in sources {
        let mut kept = 0usize;
        let mut dropped = 0usize;
        for outcome in normalize_client_rows(source) {
            match outcome {
                RowOutcome::Kept(record) => {
                    kept += 1;
                    corpus.records.push(record);
                }
                RowOutcome::Dropped(row) => {
                    dropped += 1;
                    debug!(file = %row.source, row = row.row, reason = %row.reason, "client row dropped");
                    corpus.dropped.record(&row);
                }
            }
        }
        if dropped > 0 {
            warn!(file = %source.file_name, kept, dropped, "client file has malformed rows");
        } else {
            debug!(file = %source.file_name, kept, "client file normalized");
        }
    }

    corpus
}
