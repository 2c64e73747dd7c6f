use std::fs;
use std::path::{Path, PathBuf};

use calllog_io::Table;
use tracing::{debug, info, warn};

use crate::attribution::resolve;
use crate::assemble::assemble;
use crate::carrier::{combine, normalize_billed, normalize_unbilled, BILLED_SOURCE, UNBILLED_SOURCE};
use crate::clients::{client_name, normalize_clients, ClientSource};
use crate::config::PipelineConfig;
use crate::contacts::{self, load_contacts};
use crate::error::PipelineError;
use crate::model::{LogEntry, LOG_COLUMNS};
use crate::summary::{compute_summary, RunSummary};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A client export found in the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFile {
    pub file_name: String,
    pub client_name: String,
    pub path: PathBuf,
}

/// Every source table, loaded and trimmed of leading metadata rows.
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    pub contacts: Table,
    pub billed: Option<Table>,
    pub unbilled: Option<Table>,
    pub clients: Vec<ClientSource>,
}

/// Result of a run: the ordered log and its summary.
#[derive(Debug, Clone)]
pub struct CallLog {
    pub entries: Vec<LogEntry>,
    pub summary: RunSummary,
}

/// Client exports in `dir`: regular files whose name starts with `marker`
/// and carries a supported extension, in byte-wise name order. `exclude`
/// keeps a previous output from being read back as a client.
pub fn discover_client_files(
    dir: &Path,
    marker: char,
    exclude: Option<&Path>,
) -> Result<Vec<ClientFile>, PipelineError> {
    let listing = fs::read_dir(dir)
        .map_err(|e| PipelineError::Io(format!("{}: {}", dir.display(), e)))?;

    let mut files = Vec::new();
    for entry in listing {
        let entry = entry.map_err(|e| PipelineError::Io(format!("{}: {}", dir.display(), e)))?;
        let path = entry.path();
        if !path.is_file() || exclude.is_some_and(|x| x == path.as_path()) {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if let Some(client_name) = client_name(&file_name, marker) {
            files.push(ClientFile {
                file_name,
                client_name,
                path,
            });
        }
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}

/// `MissingFile` unless `path` is a regular file.
fn require_file(source: &str, path: &Path) -> Result<(), PipelineError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::MissingFile {
            source: source.to_string(),
            path: path.to_path_buf(),
        })
    }
}

fn import(path: &Path, skip_rows: usize) -> Result<Table, PipelineError> {
    calllog_io::import(path, skip_rows).map_err(PipelineError::Io)
}

/// Validate the config and confirm every input exists, without reading any.
/// Returns the client exports that a run would read.
pub fn check(config: &PipelineConfig) -> Result<Vec<ClientFile>, PipelineError> {
    config.validate()?;

    require_file(contacts::SOURCE, &config.contacts_path())?;
    if let Some(path) = config.billed_path() {
        require_file(BILLED_SOURCE, &path)?;
    }
    if let Some(path) = config.unbilled_path() {
        require_file(UNBILLED_SOURCE, &path)?;
    }

    let output = config.output_path();
    discover_client_files(&config.input_dir, config.client_marker, Some(&output))
}

/// Read every source named by the config.
pub fn load_inputs(config: &PipelineConfig) -> Result<PipelineInputs, PipelineError> {
    let client_files = check(config)?;
    let layout = &config.layout;

    let contacts = import(&config.contacts_path(), layout.contacts_skip_rows)?;
    let billed = config
        .billed_path()
        .map(|p| import(&p, layout.billed_skip_rows))
        .transpose()?;
    let unbilled = config
        .unbilled_path()
        .map(|p| import(&p, layout.unbilled_skip_rows))
        .transpose()?;

    let mut clients = Vec::with_capacity(client_files.len());
    for file in client_files {
        debug!(file = %file.file_name, client = %file.client_name, "reading client export");
        clients.push(ClientSource {
            table: import(&file.path, 0)?,
            file_name: file.file_name,
            client_name: file.client_name,
        });
    }

    Ok(PipelineInputs {
        contacts,
        billed,
        unbilled,
        clients,
    })
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// Normalize, resolve and join loaded inputs into the ordered call log.
pub fn build_log(inputs: PipelineInputs) -> Result<CallLog, PipelineError> {
    if inputs.billed.is_none() && inputs.unbilled.is_none() {
        return Err(PipelineError::NoCarrierSource);
    }

    let billed = inputs.billed.map(normalize_billed).transpose()?;
    let unbilled = inputs.unbilled.map(normalize_unbilled).transpose()?;
    let mut carrier = combine(billed, unbilled)?;
    info!(
        rows = carrier.records.len(),
        billed = ?carrier.billed_rows,
        unbilled = ?carrier.unbilled_rows,
        "carrier records normalized"
    );

    let contacts = load_contacts(inputs.contacts)?;
    info!(
        contacts = contacts.len(),
        duplicates_dropped = contacts.duplicates_dropped,
        "contact directory loaded"
    );

    let corpus = normalize_clients(&inputs.clients);
    if corpus.dropped.total > 0 {
        warn!(
            dropped = corpus.dropped.total,
            reasons = ?corpus.dropped.by_reason,
            "malformed client rows excluded"
        );
    }
    info!(files = corpus.files, rows = corpus.records.len(), "client records normalized");

    let attribution = resolve(&corpus.records);
    for (number, clients) in attribution.ambiguous() {
        warn!(%number, ?clients, "number appears under several clients; left unattributed");
    }
    info!(
        attributed = attribution.len(),
        ambiguous = attribution.ambiguous().len(),
        "attribution resolved"
    );

    let records = std::mem::take(&mut carrier.records);
    let entries = assemble(records, &contacts, &attribution);
    let summary = compute_summary(&carrier, &contacts, &corpus, &attribution, &entries);
    info!(rows = entries.len(), "call log assembled");

    Ok(CallLog { entries, summary })
}

/// Write the log as CSV. The file appears only once fully written.
pub fn write_log(path: &Path, entries: &[LogEntry]) -> Result<(), PipelineError> {
    calllog_io::csv::export(path, &LOG_COLUMNS, entries.iter().map(LogEntry::to_record))
        .map_err(PipelineError::Io)?;
    info!(path = %path.display(), rows = entries.len(), "call log written");
    Ok(())
}

/// Load, build and write: one complete run.
pub fn run(config: &PipelineConfig) -> Result<CallLog, PipelineError> {
    let inputs = load_inputs(config)?;
    let log = build_log(inputs)?;
    write_log(&config.output_path(), &log.entries)?;
    Ok(log)
}
