//! Crate-level error types.
//!
//! Following the pattern used throughout this codebase's storage and
//! protocol layers: one `thiserror` enum, `#[from]` conversions where a
//! lower layer's error composes cleanly, and no panics on recoverable
//! conditions. Parse failures and inconsistent theories surface as
//! `Err`/empty results (see `evaluators`), never as process aborts.

use thiserror::Error;

/// Errors produced while parsing, building, or evaluating a CP-theory.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CpError {
    /// Malformed rule text. `line` is the 1-based source line of the
    /// offending rule when the parser can recover it.
    #[error("parse error on line {line}: {message}")]
    Parse { message: String, line: usize },

    /// `Theory::is_consistent` returned false (global or local check
    /// failed) where the caller required a consistent theory.
    #[error("theory is not consistent")]
    InconsistentTheory,

    /// A condition, preference, or indifferent clause referenced an
    /// attribute that records in the batch never carry. Not fatal by
    /// itself (see §7: missing attributes silently fail that rule for
    /// that record) but surfaced when a caller wants strict reporting.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// The preferred and worst intervals of a rule's preference
    /// overlap, which would make the rule self-contradicting.
    #[error("preference on {attribute} is self-contradicting: best and worst intervals overlap")]
    OverlappingPreference { attribute: String },
}

/// Convenient alias used across the crate.
pub type CpResult<T> = Result<T, CpError>;
