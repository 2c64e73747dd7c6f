//! `calllog-linkage`: unified call log builder.
//!
//! Normalizes carrier call records, a contact directory and per-client call
//! exports, then joins them into one ordered call log. The only I/O is
//! reading sources through `calllog-io` and writing the final CSV; the build
//! step itself works on loaded tables.

pub mod assemble;
pub mod attribution;
pub mod carrier;
pub mod cells;
pub mod clients;
pub mod config;
pub mod contacts;
pub mod error;
pub mod frame;
pub mod model;
pub mod phone;
pub mod pipeline;
pub mod summary;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use model::{CallRecord, ContactDirectory, LogEntry, RowOutcome};
pub use phone::PhoneNumber;
pub use pipeline::{build_log, check, run, CallLog, PipelineInputs};
pub use summary::RunSummary;
