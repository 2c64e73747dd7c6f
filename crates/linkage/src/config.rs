use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding every input file and the client exports.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_contacts")]
    pub contacts: String,
    /// Billed call-detail report. An empty string disables the source.
    #[serde(default = "default_billed")]
    pub billed: Option<String>,
    /// Unbilled usage report. An empty string disables the source.
    #[serde(default = "default_unbilled")]
    pub unbilled: Option<String>,
    /// Output CSV; relative paths resolve against `input_dir`.
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Leading character marking a file as a client export.
    #[serde(default = "default_client_marker")]
    pub client_marker: char,
    #[serde(default)]
    pub layout: LayoutConfig,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_contacts() -> String {
    "Sample contacts master list.xlsx".to_string()
}

fn default_billed() -> Option<String> {
    Some("Verizon Sample Call detail report billed calls.csv".to_string())
}

fn default_unbilled() -> Option<String> {
    Some("Verizon Sample Current Unbilled Usage Report_.xls".to_string())
}

fn default_output() -> PathBuf {
    PathBuf::from("call_log.csv")
}

fn default_client_marker() -> char {
    '_'
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            contacts: default_contacts(),
            billed: default_billed(),
            unbilled: default_unbilled(),
            output: default_output(),
            client_marker: default_client_marker(),
            layout: LayoutConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Metadata rows above each source's header row.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    #[serde(default)]
    pub contacts_skip_rows: usize,
    #[serde(default = "default_billed_skip_rows")]
    pub billed_skip_rows: usize,
    #[serde(default = "default_unbilled_skip_rows")]
    pub unbilled_skip_rows: usize,
}

fn default_billed_skip_rows() -> usize {
    13
}

fn default_unbilled_skip_rows() -> usize {
    3
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            contacts_skip_rows: 0,
            billed_skip_rows: default_billed_skip_rows(),
            unbilled_skip_rows: default_unbilled_skip_rows(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, PipelineError> {
        let config = Self::parse(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Deserialize without validating, for callers that apply overrides first.
    pub fn parse(input: &str) -> Result<Self, PipelineError> {
        let mut config: PipelineConfig =
            toml::from_str(input).map_err(|e| PipelineError::ConfigParse(e.to_string()))?;
        config.drop_empty_sources();
        Ok(config)
    }

    /// Treat blank carrier file names as unset.
    pub fn drop_empty_sources(&mut self) {
        for source in [&mut self.billed, &mut self.unbilled] {
            if source.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *source = None;
            }
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.billed.is_none() && self.unbilled.is_none() {
            return Err(PipelineError::NoCarrierSource);
        }

        if self.contacts.trim().is_empty() {
            return Err(PipelineError::ConfigValidation(
                "contacts file name is empty".into(),
            ));
        }

        if self.client_marker.is_whitespace() || self.client_marker == '.' {
            return Err(PipelineError::ConfigValidation(format!(
                "client_marker '{}' cannot mark client files",
                self.client_marker
            )));
        }

        // A source that looks like a client export would be read twice
        for name in self.source_names() {
            if name.starts_with(self.client_marker) {
                return Err(PipelineError::ConfigValidation(format!(
                    "'{name}' starts with the client marker '{}'",
                    self.client_marker
                )));
            }
        }

        if self.output.as_os_str().is_empty() {
            return Err(PipelineError::ConfigValidation("output path is empty".into()));
        }

        Ok(())
    }

    fn source_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.contacts.as_str())
            .chain(self.billed.as_deref())
            .chain(self.unbilled.as_deref())
    }

    /// Anchor a relative `input_dir` at `base` (the config file's directory).
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        if self.input_dir.is_relative() {
            self.input_dir = base.join(&self.input_dir);
        }
        self
    }

    pub fn contacts_path(&self) -> PathBuf {
        self.input_dir.join(&self.contacts)
    }

    pub fn billed_path(&self) -> Option<PathBuf> {
        self.billed.as_ref().map(|f| self.input_dir.join(f))
    }

    pub fn unbilled_path(&self) -> Option<PathBuf> {
        self.unbilled.as_ref().map(|f| self.input_dir.join(f))
    }

    pub fn output_path(&self) -> PathBuf {
        if self.output.is_absolute() {
            self.output.clone()
        } else {
            self.input_dir.join(&self.output)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config.input_dir, PathBuf::from("."));
        assert_eq!(config.contacts, "Sample contacts master list.xlsx");
        assert!(config.billed.is_some());
        assert!(config.unbilled.is_some());
        assert_eq!(config.client_marker, '_');
        assert_eq!(config.layout.billed_skip_rows, 13);
        assert_eq!(config.layout.unbilled_skip_rows, 3);
        assert_eq!(config.layout.contacts_skip_rows, 0);
    }

    #[test]
    fn parse_full() {
        let config = PipelineConfig::from_toml(
            r##"
input_dir = "records"
contacts = "contacts.csv"
billed = "billed.csv"
unbilled = ""
output = "out/log.csv"
client_marker = "#"

[layout]
billed_skip_rows = 2
"##,
        )
        .unwrap();
        assert_eq!(config.billed.as_deref(), Some("billed.csv"));
        assert_eq!(config.unbilled, None);
        assert_eq!(config.client_marker, '#');
        assert_eq!(config.layout.billed_skip_rows, 2);
        assert_eq!(config.layout.unbilled_skip_rows, 3);
        assert_eq!(config.output_path(), PathBuf::from("records/out/log.csv"));
        assert_eq!(config.billed_path(), Some(PathBuf::from("records/billed.csv")));
    }

    #[test]
    fn no_carrier_source_rejected() {
        let err = PipelineConfig::from_toml("billed = \"\"\nunbilled = \"\"\n").unwrap_err();
        assert!(matches!(err, PipelineError::NoCarrierSource));
    }

    #[test]
    fn marker_collision_rejected() {
        let err = PipelineConfig::from_toml("contacts = \"_contacts.xlsx\"\n").unwrap_err();
        assert!(matches!(err, PipelineError::ConfigValidation(_)));
        let err = PipelineConfig::from_toml("client_marker = \" \"\n").unwrap_err();
        assert!(matches!(err, PipelineError::ConfigValidation(_)));
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = PipelineConfig::from_toml("contact = \"typo.xlsx\"\n").unwrap_err();
        assert!(matches!(err, PipelineError::ConfigParse(_)));
    }

    #[test]
    fn relative_dirs_anchor_at_base() {
        let config = PipelineConfig::from_toml("input_dir = \"data\"\n")
            .unwrap()
            .resolve_relative_to(Path::new("/etc/calllog"));
        assert_eq!(config.contacts_path(), PathBuf::from("/etc/calllog/data/Sample contacts master list.xlsx"));

        let config = PipelineConfig::from_toml("input_dir = \"/srv/data\"\n")
            .unwrap()
            .resolve_relative_to(Path::new("/etc/calllog"));
        assert_eq!(config.input_dir, PathBuf::from("/srv/data"));
    }
}
