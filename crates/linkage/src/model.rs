use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::phone::PhoneNumber;

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactEntry {
    pub number: Option<PhoneNumber>,
    pub name: Option<String>,
    /// Other surviving columns, in header order. Absent values are omitted.
    pub extra: Vec<(String, String)>,
}

/// Canonical contact directory: at most one entry per number.
#[derive(Debug, Clone, Default)]
pub struct ContactDirectory {
    pub entries: Vec<ContactEntry>,
    /// Columns that survived the all-absent drop, in header order.
    pub columns: Vec<String>,
    pub duplicates_dropped: usize,
    index: HashMap<PhoneNumber, usize>,
}

impl ContactDirectory {
    /// Callers guarantee `entries` holds each number at most once.
    pub fn new(entries: Vec<ContactEntry>, columns: Vec<String>, duplicates_dropped: usize) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.number.clone().map(|n| (n, i)))
            .collect();
        Self {
            entries,
            columns,
            duplicates_dropped,
            index,
        }
    }

    pub fn lookup(&self, number: &PhoneNumber) -> Option<&ContactEntry> {
        self.index.get(number).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Call records
// ---------------------------------------------------------------------------

/// One normalized carrier call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub number: Option<PhoneNumber>,
    pub duration: i64,
    pub destination: Option<String>,
    pub billed: bool,
}

/// One row from a client's own call export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientCallRecord {
    /// `None` when the export's date cell does not parse.
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub number: Option<PhoneNumber>,
    pub origination: Option<String>,
    pub destination: Option<String>,
    pub duration: i64,
    pub client_name: String,
}

// ---------------------------------------------------------------------------
// Row outcomes
// ---------------------------------------------------------------------------

/// Result of normalizing one untrusted row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome<T> {
    Kept(T),
    Dropped(DroppedRow),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRow {
    pub source: String,
    /// 1-based row within the source file.
    pub row: usize,
    pub reason: DropReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    ShortRow { cells: usize },
    BadDuration { value: String },
}

impl DropReason {
    /// Stable key used for tallies and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ShortRow { .. } => "short_row",
            Self::BadDuration { .. } => "bad_duration",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortRow { cells } => write!(f, "only {cells} cell(s), expected at least 6"),
            Self::BadDuration { value } => write!(f, "duration '{value}' is not a whole number"),
        }
    }
}

/// Dropped-row counts by reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DropTally {
    pub total: usize,
    pub by_reason: BTreeMap<String, usize>,
}

impl DropTally {
    pub fn record(&mut self, dropped: &DroppedRow) {
        self.total += 1;
        *self.by_reason.entry(dropped.reason.kind().to_string()).or_insert(0) += 1;
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

pub const LOG_COLUMNS: [&str; 8] = [
    "date",
    "time",
    "number",
    "duration",
    "destination",
    "billed",
    "name",
    "client",
];

/// One row of the unified call log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub number: Option<PhoneNumber>,
    pub duration: i64,
    pub destination: Option<String>,
    pub billed: bool,
    pub name: Option<String>,
    pub client: Option<String>,
}

impl LogEntry {
    /// CSV fields in `LOG_COLUMNS` order; absent values are empty.
    pub fn to_record(&self) -> [String; 8] {
        [
            self.date.format("%Y-%m-%d").to_string(),
            self.time.format("%H:%M:%S").to_string(),
            self.number.as_ref().map(|n| n.to_string()).unwrap_or_default(),
            self.duration.to_string(),
            self.destination.clone().unwrap_or_default(),
            self.billed.to_string(),
            self.name.clone().unwrap_or_default(),
            self.client.clone().unwrap_or_default(),
        ]
    }
}
