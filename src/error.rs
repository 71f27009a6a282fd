use thiserror::Error;

/// Errors produced anywhere in the selection pipeline.
///
/// Every variant is fatal to the call that raised it: there is no partial
/// result for a cross-validation or information-criterion run.
#[derive(Debug, Error)]
pub enum SglError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input data: {0}")]
    Data(String),

    #[error("Path solver failed: {0}")]
    Solver(String),

    #[error("Lambda selection failed: {0}")]
    Selection(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SglError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::Data(message.into())
    }

    pub fn solver(message: impl Into<String>) -> Self {
        Self::Solver(message.into())
    }

    /// The message without the variant's display prefix.
    pub fn detail(&self) -> String {
        match self {
            SglError::Configuration(m)
            | SglError::Data(m)
            | SglError::Solver(m)
            | SglError::Selection(m) => m.clone(),
            SglError::Io(e) => e.to_string(),
            SglError::Csv(e) => e.to_string(),
        }
    }

    /// Process exit code used by the `sgl` binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            SglError::Configuration(_) | SglError::Io(_) | SglError::Csv(_) => 2,
            SglError::Data(_) => 3,
            SglError::Solver(_) | SglError::Selection(_) => 4,
        }
    }
}
