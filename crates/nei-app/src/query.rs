//! Query helpers for extracting data from loaded runs.

use nei_results::TimeseriesRecord;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub time_range: (f64, f64),
    pub record_count: usize,
    pub elements: Vec<String>,
    pub final_electron_temperature_k: f64,
    pub final_electron_density_cm3: f64,
}

pub fn get_run_summary(records: &[TimeseriesRecord]) -> AppResult<RunSummary> {
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return Err(AppError::InvalidInput("No records in run".to_string()));
    };
    Ok(RunSummary {
        time_range: (first.time_s, last.time_s),
        record_count: records.len(),
        elements: list_element_ids(records),
        final_electron_temperature_k: last.electron_temperature_k,
        final_electron_density_cm3: last.electron_density_cm3,
    })
}

/// Element symbols of a run, in storage order.
pub fn list_element_ids(records: &[TimeseriesRecord]) -> Vec<String> {
    records
        .first()
        .map(|r| r.elements.keys().cloned().collect())
        .unwrap_or_default()
}

/// What a series is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesTarget {
    /// Run-wide quantities: electron temperature and density.
    Global,
    Element(String),
}

/// `global` or an element symbol.
pub fn parse_target(text: &str) -> SeriesTarget {
    if text.eq_ignore_ascii_case("global") {
        SeriesTarget::Global
    } else {
        SeriesTarget::Element(text.to_string())
    }
}

/// `(time_s, value)` pairs for one variable.
///
/// Global variables: `electron_temperature` (`temperature`, `t_e`) and
/// `electron_density` (`n_e`). Element variables: `elemental_density`,
/// `mean_charge`, `fraction_<z>` and `density_<z>` for charge state `z`.
pub fn extract_series(
    records: &[TimeseriesRecord],
    target: &SeriesTarget,
    variable: &str,
) -> AppResult<Vec<(f64, f64)>> {
    match target {
        SeriesTarget::Global => {
            let get: fn(&TimeseriesRecord) -> f64 = match variable {
                "electron_temperature" | "temperature" | "t_e" => |r| r.electron_temperature_k,
                "electron_density" | "n_e" => |r| r.electron_density_cm3,
                _ => {
                    return Err(AppError::InvalidInput(format!(
                        "Unknown global variable: {variable}"
                    )));
                }
            };
            Ok(records.iter().map(|r| (r.time_s, get(r))).collect())
        }
        SeriesTarget::Element(symbol) => {
            if records.first().is_some_and(|r| !r.elements.contains_key(symbol)) {
                return Err(AppError::InvalidInput(format!(
                    "Element {symbol} is not part of this run"
                )));
            }
            let variable = ElementVariable::parse(variable)?;
            let mut series = Vec::with_capacity(records.len());
            for record in records {
                let Some(values) = record.elements.get(symbol) else {
                    continue;
                };
                let value = match variable {
                    ElementVariable::ElementalDensity => values.elemental_density_cm3,
                    ElementVariable::MeanCharge => values
                        .ionic_fractions
                        .iter()
                        .enumerate()
                        .map(|(z, f)| z as f64 * f)
                        .sum(),
                    ElementVariable::Fraction(z) => charge_state(&values.ionic_fractions, z)?,
                    ElementVariable::Density(z) => charge_state(&values.number_densities_cm3, z)?,
                };
                series.push((record.time_s, value));
            }
            Ok(series)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ElementVariable {
    ElementalDensity,
    MeanCharge,
    Fraction(usize),
    Density(usize),
}

impl ElementVariable {
    fn parse(text: &str) -> AppResult<Self> {
        let charge = |digits: &str| {
            digits
                .parse::<usize>()
                .map_err(|_| AppError::InvalidInput(format!("Bad charge state in '{text}'")))
        };
        match text {
            "elemental_density" => Ok(Self::ElementalDensity),
            "mean_charge" => Ok(Self::MeanCharge),
            _ => {
                if let Some(z) = text.strip_prefix("fraction_") {
                    Ok(Self::Fraction(charge(z)?))
                } else if let Some(z) = text.strip_prefix("density_") {
                    Ok(Self::Density(charge(z)?))
                } else {
                    Err(AppError::InvalidInput(format!(
                        "Unknown element variable: {text}"
                    )))
                }
            }
        }
    }
}

fn charge_state(values: &[f64], z: usize) -> AppResult<f64> {
    values.get(z).copied().ok_or_else(|| {
        AppError::InvalidInput(format!(
            "Charge state {z} out of range (0..={})",
            values.len().saturating_sub(1)
        ))
    })
}
