//! Error types for the nei-app service layer.

use std::path::PathBuf;

/// Unified error for every front end.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Case error: {0}")]
    Case(String),

    #[error("Case file not found: {path}")]
    CaseNotFound { path: PathBuf },

    #[error("Rate table error: {0}")]
    Rates(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    /// The run failed after committing some columns; they were stored as `run_id`.
    #[error("Run {run_id} failed after {columns} columns: {message}")]
    RunFailed {
        run_id: String,
        columns: usize,
        message: String,
    },

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<nei_project::ProjectError> for AppError {
    fn from(err: nei_project::ProjectError) -> Self {
        AppError::Case(err.to_string())
    }
}

impl From<nei_rates::RatesError> for AppError {
    fn from(err: nei_rates::RatesError) -> Self {
        AppError::Rates(err.to_string())
    }
}

impl From<nei_sim::SimError> for AppError {
    fn from(err: nei_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<nei_results::ResultsError> for AppError {
    fn from(err: nei_results::ResultsError) -> Self {
        match err {
            nei_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}
