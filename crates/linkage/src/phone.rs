use std::fmt;

use calllog_io::Cell;
use serde::Serialize;

/// Normalized phone number join key.
///
/// The key is the decimal rendering of the number's integer value: formatting
/// characters, a trailing `.0` from spreadsheet floats and leading zeros all
/// disappear. A value with no usable digits has no key; callers carry that as
/// `Option::None`, never as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalize a spreadsheet cell.
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Number(n) | Cell::DateTime(n) => Self::from_float(*n),
            Cell::Text(s) => Self::parse(s),
            Cell::Empty | Cell::Bool(_) => None,
        }
    }

    /// Normalize free text: an integer, a decimal (truncated), or any text
    /// containing digits such as `(555) 123-4567`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        // Pure digit strings skip the float path, which would lose precision
        let all_digits = text.bytes().all(|b| b.is_ascii_digit());
        if !all_digits {
            if let Ok(f) = text.parse::<f64>() {
                return Self::from_float(f);
            }
        }

        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return None;
        }
        let trimmed = digits.trim_start_matches('0');
        Some(Self(if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() }))
    }

    fn from_float(n: f64) -> Option<Self> {
        if !n.is_finite() || n < 0.0 || n >= u64::MAX as f64 {
            return None;
        }
        Some(Self((n.trunc() as u64).to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
