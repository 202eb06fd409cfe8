//! Rule loading errors.

use thiserror::Error;

/// Exit status used when a rule file is unusable (sysexits `EX_DATAERR`).
pub const EX_DATAERR: u8 = 65;

/// Fatal errors raised while building a rule set.
///
/// A rule file that cannot be opened is not an error: auto-response
/// simply stays disabled.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("bad regex in rule line grammar: {0}")]
    Grammar(#[source] regex::Error),

    #[error("bad regex in {pattern:?} (line {line}): {source}")]
    InvalidPattern {
        line: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("read error at line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

impl RuleError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        EX_DATAERR
    }
}
