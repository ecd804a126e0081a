//! Shared application service layer for the NEI simulator.
//!
//! Front ends go through this crate to load cases, run or reuse cached
//! simulations and query stored results.

pub mod case_service;
pub mod error;
pub mod progress;
pub mod query;
pub mod run_service;

pub use case_service::{CaseSummary, load_case, summarize_case};
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage};
pub use query::{
    RunSummary, SeriesTarget, extract_series, get_run_summary, list_element_ids, parse_target,
};
pub use run_service::{
    EquilibriumRequest, RunOptions, RunRequest, RunResponse, RunTimingSummary, ensure_run,
    ensure_run_with_progress, equilibrium, list_runs, load_run,
};
