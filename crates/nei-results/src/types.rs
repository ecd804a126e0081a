//! Result data types.

use std::collections::BTreeMap;

use nei_sim::{SimulationState, Snapshot};
use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub case_name: String,
    pub timestamp: String,
    pub solver_version: String,
    pub rate_model: String,
    pub elements: Vec<String>,
    pub max_steps: usize,
    /// Committed columns, `max_steps + 1` for a complete run.
    pub columns: usize,
    pub status: RunStatus,
}

/// Whether the stored columns cover the whole run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum RunStatus {
    Complete,
    Failed { step: usize, message: String },
}

/// One committed column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeseriesRecord {
    pub index: usize,
    pub time_s: f64,
    pub electron_temperature_k: f64,
    pub electron_density_cm3: f64,
    pub elements: BTreeMap<String, ElementRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementRecord {
    pub elemental_density_cm3: f64,
    pub ionic_fractions: Vec<f64>,
    pub number_densities_cm3: Vec<f64>,
}

impl From<&Snapshot> for TimeseriesRecord {
    fn from(snapshot: &Snapshot) -> Self {
        let elements = snapshot
            .ionic_fractions
            .iter()
            .map(|(element, fractions)| {
                let record = ElementRecord {
                    elemental_density_cm3: snapshot
                        .elemental_density
                        .get(element)
                        .copied()
                        .unwrap_or(f64::NAN),
                    ionic_fractions: fractions.clone(),
                    number_densities_cm3: snapshot
                        .number_densities
                        .get(element)
                        .cloned()
                        .unwrap_or_default(),
                };
                (element.symbol().to_string(), record)
            })
            .collect();
        Self {
            index: snapshot.index,
            time_s: snapshot.time,
            electron_temperature_k: snapshot.electron_temperature,
            electron_density_cm3: snapshot.electron_density,
            elements,
        }
    }
}

/// Records for every committed column of `state`.
pub fn records_from_state(state: &SimulationState) -> Vec<TimeseriesRecord> {
    (0..state.index())
        .filter_map(|i| state.snapshot(i))
        .map(|s| TimeseriesRecord::from(&s))
        .collect()
}
