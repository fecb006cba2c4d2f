//! Error types for the MIP solver.

use thiserror::Error;

/// Errors that can occur during MIP solving.
///
/// Only malformed input is reported through this type. Relaxation failures,
/// resource limits and infeasibility are part of normal operation and show up
/// as a [`MipStatus`](crate::MipStatus) on the returned solution.
#[derive(Error, Debug)]
pub enum MipError {
    /// Problem validation failed
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// A vector or index set does not match the problem dimensions
    #[error("Dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Which piece of input is inconsistent.
        what: &'static str,
        /// Expected length or bound.
        expected: usize,
        /// Actual length or offending index.
        found: usize,
    },

    /// A variable was declared both integer and binary
    #[error("Variable {var} is declared both integer and binary")]
    OverlappingIntegrality {
        /// Offending variable index.
        var: usize,
    },

    /// The relaxation oracle cannot handle this problem
    #[error("Oracle rejected problem: {0}")]
    OracleError(String),
}

/// Result type for MIP operations.
pub type MipResult<T> = Result<T, MipError>;
