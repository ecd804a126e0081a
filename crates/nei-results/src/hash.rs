//! Content-based hashing for run IDs.

use nei_project::schema::Case;
use sha2::{Digest, Sha256};

/// SHA-256 of the case's canonical JSON and the solver version, as hex.
///
/// Serialization follows struct field order and sorted maps, so equal cases
/// always hash equally.
pub fn compute_run_id(case: &Case, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    let case_json = serde_json::to_string(case).unwrap_or_default();
    hasher.update(case_json.as_bytes());
    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
