//! Error types.
//!
//! - [`FitError`] is the library-level failure taxonomy. Every public analysis
//!   operation returns it, so front-ends can decide how to present each kind.
//! - [`AppError`] is the process boundary used by the binary: a message plus an
//!   exit code.

use thiserror::Error;

/// Why a dataset cannot be fitted or scored.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Malformed input: non-numeric cells, missing columns, negative substrate,
    /// non-finite values, unreadable files.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Fewer observations than free parameters.
    #[error("Insufficient data: {n} observation(s) supplied, at least {required} required")]
    InsufficientData { n: usize, required: usize },

    /// The data cannot identify the model (constant substrate or velocity).
    #[error("Degenerate data: {0}")]
    DegenerateData(String),

    /// The optimizer ran out of iterations (or produced non-finite values)
    /// before meeting its convergence tolerances.
    #[error("Fit did not converge after {iterations} iteration(s): {reason}")]
    FitDidNotConverge { iterations: usize, reason: String },
}

impl FitError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        FitError::InvalidInput(message.into())
    }

    pub fn degenerate(message: impl Into<String>) -> Self {
        FitError::DegenerateData(message.into())
    }

    /// Short, stable label for the failure kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FitError::InvalidInput(_) => "InvalidInput",
            FitError::InsufficientData { .. } => "InsufficientData",
            FitError::DegenerateData(_) => "DegenerateData",
            FitError::FitDidNotConverge { .. } => "FitDidNotConverge",
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        // 2 = bad input, 3 = unusable data, 4 = solver failure.
        let exit_code = match err {
            FitError::InvalidInput(_) => 2,
            FitError::InsufficientData { .. } | FitError::DegenerateData(_) => 3,
            FitError::FitDidNotConverge { .. } => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}
