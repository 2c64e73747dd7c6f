//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 2       | Universal        | CLI usage error (bad args)               |
//! | 60-69   | pipeline         | Call log build failures                  |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `run::exit_code_for`

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad or conflicting arguments.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Pipeline (60-69)
// =============================================================================

/// Config file unreadable or invalid, or no carrier source configured.
pub const EXIT_INVALID_CONFIG: u8 = 60;

/// A configured input file does not exist.
pub const EXIT_MISSING_INPUT: u8 = 61;

/// Source data has the wrong shape: missing header, column or `Total` row,
/// or an unparseable carrier cell.
pub const EXIT_SCHEMA: u8 = 62;

/// Read/write failure while running.
pub const EXIT_RUNTIME: u8 = 63;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_codes_are_distinct() {
        let codes = [EXIT_INVALID_CONFIG, EXIT_MISSING_INPUT, EXIT_SCHEMA, EXIT_RUNTIME];
        for (i, a) in codes.iter().enumerate() {
            assert!((60..70).contains(a));
            assert!(codes[i + 1..].iter().all(|b| b != a));
        }
        assert_ne!(EXIT_SUCCESS, EXIT_USAGE);
    }
}
