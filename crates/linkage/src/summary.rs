use serde::Serialize;

use crate::attribution::AttributionMap;
use crate::carrier::CarrierLog;
use crate::clients::ClientCorpus;
use crate::model::{ContactDirectory, DropTally, LogEntry};

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
}

/// Counts describing one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub meta: RunMeta,
    /// `None` when the source was not configured.
    pub billed_rows: Option<usize>,
    pub unbilled_rows: Option<usize>,
    pub contacts: usize,
    pub duplicate_contacts_dropped: usize,
    pub client_files: usize,
    pub client_rows_kept: usize,
    pub client_rows_dropped: DropTally,
    pub attributed_numbers: usize,
    /// Numbers found under more than one client; never attributed.
    pub ambiguous_numbers: Vec<String>,
    pub log_rows: usize,
    pub rows_with_name: usize,
    pub rows_with_client: usize,
}

pub fn compute_summary(
    carrier: &CarrierLog,
    contacts: &ContactDirectory,
    corpus: &ClientCorpus,
    attribution: &AttributionMap,
    log: &[LogEntry],
) -> RunSummary {
    let mut rows_with_name = 0;
    let mut rows_with_client = 0;
    for entry in log {
        if entry.name.is_some() {
            rows_with_name += 1;
        }
        if entry.client.is_some() {
            rows_with_client += 1;
        }
    }

    RunSummary {
        meta: RunMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        billed_rows: carrier.billed_rows,
        unbilled_rows: carrier.unbilled_rows,
        contacts: contacts.len(),
        duplicate_contacts_dropped: contacts.duplicates_dropped,
        client_files: corpus.files,
        client_rows_kept: corpus.records.len(),
        client_rows_dropped: corpus.dropped.clone(),
        attributed_numbers: attribution.len(),
        ambiguous_numbers: attribution.ambiguous().keys().map(|n| n.to_string()).collect(),
        log_rows: log.len(),
        rows_with_name,
        rows_with_client,
    }
}

impl RunSummary {
    /// Human summary line, e.g. `42 calls (40 billed, 2 unbilled), 30 named, 12 attributed`.
    pub fn one_line(&self) -> String {
        let sources: Vec<String> = [("billed", self.billed_rows), ("unbilled", self.unbilled_rows)]
            .iter()
            .filter_map(|(label, rows)| rows.map(|n| format!("{n} {label}")))
            .collect();
        let mut line = format!(
            "{} calls ({}), {} named, {} attributed",
            self.log_rows,
            sources.join(", "),
            self.rows_with_name,
            self.rows_with_client
        );
        if self.client_rows_dropped.total > 0 {
            line.push_str(&format!(", {} client rows dropped", self.client_rows_dropped.total));
        }
        if !self.ambiguous_numbers.is_empty() {
            line.push_str(&format!(", {} ambiguous numbers", self.ambiguous_numbers.len()));
        }
        line
    }
}
