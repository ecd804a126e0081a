//! nei-project: case file format, validation and compilation.

pub mod compile;
pub mod migrate;
pub mod schema;
pub mod units;
pub mod validate;

use std::path::Path;

pub use compile::{CompiledCase, build_rate_table, compile_case, rate_model};
pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use units::{Dimension, UnitError};
pub use validate::{ValidationError, validate_case};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("Compile error: {what}")]
    Compile { what: String },

    #[error("Unsupported case file extension: {path}")]
    UnsupportedFormat { path: String },

    #[error("Atomic data error: {0}")]
    Atomic(#[from] nei_atomic::AtomicError),

    #[error("Rate table error: {0}")]
    Rates(#[from] nei_rates::RatesError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &Path) -> ProjectResult<Case> {
    let content = std::fs::read_to_string(path)?;
    let mut case: Case = serde_yaml::from_str(&content)?;
    case = migrate_to_latest(case)?;
    validate_case(&case)?;
    Ok(case)
}

pub fn save_yaml(path: &Path, case: &Case) -> ProjectResult<()> {
    validate_case(case)?;
    let content = serde_yaml::to_string(case)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<Case> {
    let content = std::fs::read_to_string(path)?;
    let mut case: Case = serde_json::from_str(&content)?;
    case = migrate_to_latest(case)?;
    validate_case(&case)?;
    Ok(case)
}

pub fn save_json(path: &Path, case: &Case) -> ProjectResult<()> {
    validate_case(case)?;
    let content = serde_json::to_string_pretty(case)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load by extension: `.json` is JSON, `.yaml`/`.yml` is YAML.
pub fn load_case(path: &Path) -> ProjectResult<Case> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path),
        Some("yaml" | "yml") => load_yaml(path),
        _ => Err(ProjectError::UnsupportedFormat {
            path: path.display().to_string(),
        }),
    }
}
