use std::cmp::Ordering;

use chrono::NaiveDateTime;

use crate::attribution::AttributionMap;
use crate::model::{CallRecord, ContactDirectory, LogEntry};

/// Join carrier records to contacts and client attribution, then order them.
///
/// Every carrier record yields exactly one entry. Order: most recent date
/// first; within a date, by client name with unattributed calls last; then
/// by time of day. The sort is stable.
pub fn assemble(
    records: Vec<CallRecord>,
    contacts: &ContactDirectory,
    attribution: &AttributionMap,
) -> Vec<LogEntry> {
    let mut keyed: Vec<(NaiveDateTime, LogEntry)> = records
        .into_iter()
        .map(|r| {
            let name = r
                .number
                .as_ref()
                .and_then(|n| contacts.lookup(n))
                .and_then(|c| c.name.clone());
            let client = attribution.client_for(r.number.as_ref()).map(str::to_string);
            let entry = LogEntry {
                date: r.date,
                time: r.time,
                number: r.number,
                duration: r.duration,
                destination: r.destination,
                billed: r.billed,
                name,
                client,
            };
            (r.date.and_time(r.time), entry)
        })
        .collect();

    keyed.sort_by(|a, b| log_order(a, b));
    keyed.into_iter().map(|(_, entry)| entry).collect()
}

fn log_order(a: &(NaiveDateTime, LogEntry), b: &(NaiveDateTime, LogEntry)) -> Ordering {
    b.1.date
        .cmp(&a.1.date)
        .then_with(|| client_order(a.1.client.as_deref(), b.1.client.as_deref()))
        .then_with(|| a.0.cmp(&b.0))
}

fn client_order(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
