// calllog CLI - builds the unified call log from carrier, contact and client files

mod exit_codes;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use exit_codes::{EXIT_RUNTIME, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "calllog")]
#[command(about = "Reconcile carrier call records with contacts and client call logs")]
#[command(version)]
struct Cli {
    /// Log format: text (default) or json
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    /// Verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the call log and write it as CSV
    #[command(after_help = "\
Examples:
  calllog run
  calllog run calllog.toml
  calllog run --input-dir ./records --no-unbilled
  calllog run calllog.toml --json --summary-json summary.json")]
    Run {
        #[command(flatten)]
        sources: SourceArgs,

        /// Write the run summary as JSON to this file
        #[arg(long, value_name = "PATH")]
        summary_json: Option<PathBuf>,

        /// Print the run summary as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration and confirm every input file exists
    #[command(after_help = "\
Examples:
  calllog check
  calllog check calllog.toml --json")]
    Check {
        #[command(flatten)]
        sources: SourceArgs,

        /// Print the resolved inputs as JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

/// Input selection shared by `run` and `check`. Flags override the config file.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// TOML config file; relative paths in it resolve against its directory
    pub config: Option<PathBuf>,

    /// Directory holding the sources and client exports
    #[arg(long, env = "CALLLOG_INPUT_DIR")]
    pub input_dir: Option<PathBuf>,

    /// Contacts file name
    #[arg(long, env = "CALLLOG_CONTACTS")]
    pub contacts: Option<String>,

    /// Billed call-detail report file name
    #[arg(long, env = "CALLLOG_BILLED")]
    pub billed: Option<String>,

    /// Unbilled usage report file name
    #[arg(long, env = "CALLLOG_UNBILLED")]
    pub unbilled: Option<String>,

    /// Do not read the billed report
    #[arg(long)]
    pub no_billed: bool,

    /// Do not read the unbilled report
    #[arg(long)]
    pub no_unbilled: bool,

    /// Output CSV (relative to the current directory)
    #[arg(long, short = 'o', env = "CALLLOG_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Leading character of client export file names
    #[arg(long, env = "CALLLOG_CLIENT_MARKER")]
    pub client_marker: Option<char>,
}

fn init_tracing(verbose: u8, format: &LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbose {
        0 => "calllog_linkage=info,calllog_cli=info",
        1 => "calllog_linkage=debug,calllog_cli=debug",
        _ => "calllog_linkage=trace,calllog_cli=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // stdout is reserved for --json output
    match format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, &cli.log_format);

    let result = match cli.command {
        Commands::Run { sources, summary_json, json } => run::cmd_run(sources, summary_json, json),
        Commands::Check { sources, json } => run::cmd_check(sources, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
