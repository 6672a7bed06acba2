// error.rs

use thiserror::Error;

/// Failure taxonomy of the analysis pipeline.
///
/// Every variant is raised by the stage that discovers the problem and handed back to the
/// caller untouched. Inputs are deterministic, so none of these are worth retrying.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PcaError {
    /// Structural problem with the inbound table (empty payload, missing or inconsistent keys).
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Every row was removed during cleaning.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Not enough samples or features left for a variance computation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Decomposition did not converge or produced non-finite values.
    #[error("Numeric instability: {0}")]
    NumericInstability(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse grouping used by front ends to report failures distinctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    BadInput,
    NotEnoughData,
    NumericalFailure,
}

impl PcaError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PcaError::MalformedInput(_) | PcaError::InvalidConfig(_) => ErrorCategory::BadInput,
            PcaError::EmptyDataset(_) | PcaError::InsufficientData(_) => {
                ErrorCategory::NotEnoughData
            }
            PcaError::NumericInstability(_) => ErrorCategory::NumericalFailure,
        }
    }

    /// Process exit code for the command-line front end.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::BadInput => 2,
            ErrorCategory::NotEnoughData => 3,
            ErrorCategory::NumericalFailure => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, PcaError>;
