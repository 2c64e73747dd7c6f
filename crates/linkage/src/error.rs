use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum PipelineError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty file name, bad marker, etc.).
    ConfigValidation(String),
    /// Neither the billed nor the unbilled carrier source is configured.
    NoCarrierSource,
    /// A configured input file does not exist.
    MissingFile { source: String, path: PathBuf },
    /// Source has no header row (too few rows for the configured offset).
    MissingHeader { source: String },
    /// Missing required column in input data.
    MissingColumn { source: String, column: String },
    /// Billed source has no "Total" row terminating the data.
    MissingSentinel { source: String },
    /// Cell in a trusted (carrier) source that cannot be parsed.
    /// `row` is 1-based, counted from the source's header row.
    CellParse { source: String, row: usize, column: String, value: String },
    /// IO error (file read, write, directory listing).
    Io(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::NoCarrierSource => write!(f, "no carrier source listed (configure billed and/or unbilled)"),
            Self::MissingFile { source, path } => {
                write!(f, "{source}: file not found: {}", path.display())
            }
            Self::MissingHeader { source } => {
                write!(f, "{source}: no header row after the leading metadata rows")
            }
            Self::MissingColumn { source, column } => {
                write!(f, "{source}: missing column '{column}'")
            }
            Self::MissingSentinel { source } => {
                write!(f, "{source}: no 'Total' row marking the end of data")
            }
            Self::CellParse { source, row, column, value } => {
                write!(f, "{source}, row {row}: cannot parse {column} '{value}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl PipelineError {
    /// Configuration problems, as opposed to problems with the data.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse(_) | Self::ConfigValidation(_) | Self::NoCarrierSource
        )
    }

    /// Source data that does not have the expected shape.
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            Self::MissingHeader { .. }
                | Self::MissingColumn { .. }
                | Self::MissingSentinel { .. }
                | Self::CellParse { .. }
        )
    }
}
