//! `calllog run` / `calllog check`.

use std::path::{Path, PathBuf};

use calllog_linkage::{PipelineConfig, PipelineError};
use tracing::debug;

use crate::exit_codes::{EXIT_INVALID_CONFIG, EXIT_MISSING_INPUT, EXIT_RUNTIME, EXIT_SCHEMA};
use crate::{CliError, SourceArgs};

/// Map a pipeline failure to its exit code.
pub fn exit_code_for(err: &PipelineError) -> u8 {
    if err.is_config() {
        EXIT_INVALID_CONFIG
    } else if matches!(err, PipelineError::MissingFile { .. }) {
        EXIT_MISSING_INPUT
    } else if err.is_schema() {
        EXIT_SCHEMA
    } else {
        EXIT_RUNTIME
    }
}

fn pipeline_err(err: PipelineError) -> CliError {
    let hint = match &err {
        PipelineError::NoCarrierSource => {
            Some("pass --billed and/or --unbilled, or set them in the config file")
        }
        PipelineError::MissingFile { .. } => Some("check --input-dir and the configured file names"),
        PipelineError::MissingHeader { .. } | PipelineError::MissingColumn { .. } => {
            Some("check the [layout] skip rows for this source")
        }
        PipelineError::MissingSentinel { .. } => {
            Some("the billed report must end with a row whose Date is 'Total'")
        }
        _ => None,
    };
    let cli_err = CliError::new(exit_code_for(&err), err.to_string());
    match hint {
        Some(h) => cli_err.with_hint(h),
        None => cli_err,
    }
}

/// Config file (if any), then flag and environment overrides, then validation.
pub fn load_config(args: &SourceArgs) -> Result<PipelineConfig, CliError> {
    if args.no_billed && args.billed.is_some() {
        return Err(CliError::usage("--billed and --no-billed cannot be combined"));
    }
    if args.no_unbilled && args.unbilled.is_some() {
        return Err(CliError::usage("--unbilled and --no-unbilled cannot be combined"));
    }

    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                CliError::new(EXIT_INVALID_CONFIG, format!("cannot read config {}: {e}", path.display()))
            })?;
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            PipelineConfig::parse(&text).map_err(pipeline_err)?.resolve_relative_to(base)
        }
        None => PipelineConfig::default(),
    };

    if let Some(dir) = &args.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(contacts) = &args.contacts {
        config.contacts = contacts.clone();
    }
    if let Some(billed) = &args.billed {
        config.billed = Some(billed.clone());
    }
    if let Some(unbilled) = &args.unbilled {
        config.unbilled = Some(unbilled.clone());
    }
    if args.no_billed {
        config.billed = None;
    }
    if args.no_unbilled {
        config.unbilled = None;
    }
    if let Some(output) = &args.output {
        config.output = absolute(output)?;
    }
    if let Some(marker) = args.client_marker {
        config.client_marker = marker;
    }

    config.drop_empty_sources();
    config.validate().map_err(pipeline_err)?;
    debug!(?config, "configuration resolved");
    Ok(config)
}

fn absolute(path: &Path) -> Result<PathBuf, CliError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| CliError::io(format!("cannot resolve current directory: {e}")))?;
    Ok(cwd.join(path))
}

pub fn cmd_run(
    sources: SourceArgs,
    summary_json: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let config = load_config(&sources)?;
    let log = calllog_linkage::run(&config).map_err(pipeline_err)?;
    eprintln!("wrote {}", config.output_path().display());

    let json_str = serde_json::to_string_pretty(&log.summary)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = summary_json {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write summary: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    eprintln!("call log: {}", log.summary.one_line());
    Ok(())
}

pub fn cmd_check(sources: SourceArgs, json_output: bool) -> Result<(), CliError> {
    let config = load_config(&sources)?;
    let clients = calllog_linkage::check(&config).map_err(pipeline_err)?;

    if json_output {
        let report = serde_json::json!({
            "input_dir": config.input_dir.display().to_string(),
            "contacts": config.contacts_path().display().to_string(),
            "billed": config.billed_path().map(|p| p.display().to_string()),
            "unbilled": config.unbilled_path().map(|p| p.display().to_string()),
            "output": config.output_path().display().to_string(),
            "client_files": clients
                .iter()
                .map(|c| serde_json::json!({ "file": c.file_name, "client": c.client_name }))
                .collect::<Vec<_>>(),
        });
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    let carriers: Vec<&str> = [
        config.billed.as_ref().map(|_| "billed"),
        config.unbilled.as_ref().map(|_| "unbilled"),
    ]
    .into_iter()
    .flatten()
    .collect();
    eprintln!(
        "config ok: contacts + {}, {} client file(s)",
        carriers.join(" + "),
        clients.len()
    );
    for client in &clients {
        eprintln!("  {} <- {}", client.client_name, client.file_name);
    }
    Ok(())
}
