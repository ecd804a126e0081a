//! Case loading and introspection.

use std::path::Path;

use nei_project::Case;

use crate::error::{AppError, AppResult};

/// Headline facts about a case for listings.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseSummary {
    pub name: String,
    pub elements: Vec<String>,
    pub explicit_fractions: bool,
    pub temperature: &'static str,
    pub density: &'static str,
    pub max_steps: usize,
    pub rate_model: String,
}

/// Load, migrate and validate a YAML or JSON case file.
pub fn load_case(path: &Path) -> AppResult<Case> {
    if !path.exists() {
        return Err(AppError::CaseNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(nei_project::load_case(path)?)
}

pub fn summarize_case(case: &Case) -> CaseSummary {
    let explicit_fractions = !case.initial_fractions.is_empty();
    let elements = if explicit_fractions {
        case.initial_fractions.keys().cloned().collect()
    } else {
        case.elements.clone()
    };
    CaseSummary {
        name: case.name.clone(),
        elements,
        explicit_fractions,
        temperature: case.temperature.kind(),
        density: case.density.kind(),
        max_steps: case.max_steps,
        rate_model: case.rate_table.model.clone(),
    }
}
