use calllog_io::Table;
use tracing::debug;

use crate::cells::{collapse_whitespace, parse_count, parse_date, parse_time};
use crate::error::PipelineError;
use crate::frame::{Frame, FrameRow};
use crate::model::CallRecord;
use crate::phone::PhoneNumber;

pub const BILLED_SOURCE: &str = "billed";
pub const UNBILLED_SOURCE: &str = "unbilled";

/// Date cell value that ends the billed report's data rows.
pub const TOTAL_SENTINEL: &str = "Total";

/// Column positions for one carrier layout.
struct CarrierColumns {
    date: usize,
    time: usize,
    number: usize,
    duration: usize,
    destination: usize,
}

impl CarrierColumns {
    fn locate(frame: &Frame, number: &str, duration: &str, destination: &str) -> Result<Self, PipelineError> {
        Ok(Self {
            date: frame.column("Date")?,
            time: frame.column("Time")?,
            number: frame.column(number)?,
            duration: frame.column(duration)?,
            destination: frame.column(destination)?,
        })
    }
}

/// Normalize the billed call-detail report (header row first).
///
/// Data ends at the first row whose date is `Total`; that row and every row
/// after it (report totals and footnotes) are excluded.
pub fn normalize_billed(table: Table) -> Result<Vec<CallRecord>, PipelineError> {
    let frame = Frame::from_table(BILLED_SOURCE, table)?;
    let cols = CarrierColumns::locate(&frame, "In/Out number", "Duration", "Destination")?;

    let end = frame
        .rows
        .iter()
        .position(|row| {
            row.cell(cols.date)
                .text()
                .is_some_and(|d| d.trim() == TOTAL_SENTINEL)
        })
        .ok_or_else(|| PipelineError::MissingSentinel {
            source: BILLED_SOURCE.to_string(),
        })?;

    let records = frame.rows[..end]
        .iter()
        .map(|row| read_record(&frame, row, &cols, true))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(rows = records.len(), trailing = frame.rows.len() - end, "billed source normalized");
    Ok(records)
}

/// Normalize the unbilled usage report (header row first).
pub fn normalize_unbilled(table: Table) -> Result<Vec<CallRecord>, PipelineError> {
    let frame = Frame::from_table(UNBILLED_SOURCE, table)?;
    let cols = CarrierColumns::locate(&frame, "Number", "Minutes", "Description")?;

    let records = frame
        .rows
        .iter()
        .map(|row| read_record(&frame, row, &cols, false))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(rows = records.len(), "unbilled source normalized");
    Ok(records)
}

fn read_record(
    frame: &Frame,
    row: &FrameRow,
    cols: &CarrierColumns,
    billed: bool,
) -> Result<CallRecord, PipelineError> {
    let date = parse_date(row.cell(cols.date)).ok_or_else(|| frame.cell_error(row, cols.date))?;
    let time = parse_time(row.cell(cols.time)).ok_or_else(|| frame.cell_error(row, cols.time))?;
    let duration = parse_count(row.cell(cols.duration))
        .ok_or_else(|| frame.cell_error(row, cols.duration))?;

    Ok(CallRecord {
        date,
        time,
        number: PhoneNumber::from_cell(row.cell(cols.number)),
        duration,
        destination: collapse_whitespace(row.cell(cols.destination)),
        billed,
    })
}

/// Carrier records from every configured source.
#[derive(Debug, Clone, Default)]
pub struct CarrierLog {
    pub records: Vec<CallRecord>,
    pub billed_rows: Option<usize>,
    pub unbilled_rows: Option<usize>,
}

/// Billed rows first, then unbilled, each in source order. At least one
/// source must be present.
pub fn combine(
    billed: Option<Vec<CallRecord>>,
    unbilled: Option<Vec<CallRecord>>,
) -> Result<CarrierLog, PipelineError> {
    if billed.is_none() && unbilled.is_none() {
        return Err(PipelineError::NoCarrierSource);
    }

    let billed_rows = billed.as_ref().map(Vec::len);
    let unbilled_rows = unbilled.as_ref().map(Vec::len);
    let records = billed.into_iter().chain(unbilled).flatten().collect();

    Ok(CarrierLog {
        records,
        billed_rows,
        unbilled_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use calllog_io::Cell;
    use chrono::{NaiveDate, NaiveTime};

    fn billed_table(rows: &[[&str; 5]]) -> Table {
        let mut all = vec![vec!["Date", "Time", "In/Out number", "Duration", "Destination"]];
        all.extend(rows.iter().map(|r| r.to_vec()));
        Table::from_text_rows(all)
    }

    #[test]
    fn billed_stops_at_total() {
        let table = billed_table(&[
            ["01/15/2024", "9:00 AM", "555-123-4567", "3", "SEATTLE    WA"],
            ["01/16/2024", "2:05 PM", "5559876543", "12", ""],
            [" Total ", "", "", "15", ""],
            ["01/17/2024", "1:00 PM", "5550000000", "1", "FOOTNOTE"],
        ]);
        let records = normalize_billed(table).unwrap();

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(first.time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(first.number.as_ref().map(|n| n.as_str()), Some("5551234567"));
        assert_eq!(first.destination.as_deref(), Some("SEATTLE WA"));
        assert!(first.billed);
        assert_eq!(records[1].destination, None);
    }

    #[test]
    fn billed_without_total_is_fatal() {
        let table = billed_table(&[["01/15/2024", "9:00 AM", "555", "3", "X"]]);
        let err = normalize_billed(table).unwrap_err();
        assert!(matches!(err, PipelineError::MissingSentinel { .. }));
    }

    #[test]
    fn billed_bad_duration_is_fatal() {
        let table = billed_table(&[
            ["01/15/2024", "9:00 AM", "555", "n/a", "X"],
            ["Total", "", "", "", ""],
        ]);
        let err = normalize_billed(table).unwrap_err();
        assert_eq!(err.to_string(), "billed, row 1: cannot parse Duration 'n/a'");
    }

    #[test]
    fn billed_digit_only_time_is_fatal() {
        let table = billed_table(&[
            ["01/15/2024", "0930", "555", "3", "X"],
            ["Total", "", "", "3", ""],
        ]);
        let err = normalize_billed(table).unwrap_err();
        assert_eq!(err.to_string(), "billed, row 1: cannot parse Time '0930'");
    }

    #[test]
    fn billed_requires_columns() {
        let table = Table::from_text_rows(vec![vec!["Date", "Time", "Number", "Duration", "Destination"]]);
        let err = normalize_billed(table).unwrap_err();
        assert_eq!(err.to_string(), "billed: missing column 'In/out number'");
    }

    #[test]
    fn unbilled_maps_columns() {
        let table = Table::new(vec![
            ["Date", "Time", "Number", "Minutes", "Description"]
                .iter()
                .map(|s| Cell::Text(s.to_string()))
                .collect(),
            vec![
                Cell::DateTime(45306.0),
                Cell::DateTime(0.375),
                Cell::Number(5551234567.0),
                Cell::Number(4.0),
                Cell::Text("Incoming,  CL".into()),
            ],
        ]);
        let records = normalize_unbilled(table).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].duration, 4);
        assert_eq!(records[0].destination.as_deref(), Some("Incoming, CL"));
        assert!(!records[0].billed);
    }

    #[test]
    fn combine_policy() {
        let rec = |billed| CallRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            number: None,
            duration: 1,
            destination: None,
            billed,
        };

        let both = combine(Some(vec![rec(true), rec(true)]), Some(vec![rec(false)])).unwrap();
        assert_eq!(both.records.len(), 3);
        assert!(both.records[0].billed && !both.records[2].billed);
        assert_eq!((both.billed_rows, both.unbilled_rows), (Some(2), Some(1)));

        let one = combine(None, Some(vec![rec(false)])).unwrap();
        assert_eq!(one.records.len(), 1);
        assert_eq!(one.billed_rows, None);

        assert!(matches!(combine(None, None), Err(PipelineError::NoCarrierSource)));
    }
}
