//! Case validation logic.

use std::collections::HashSet;

use nei_atomic::AbundancePreset;
use nei_core::{Element, is_strictly_increasing};
use nei_rates::{ScaledHydrogenic, TemperatureGrid};
use nei_sim::SAFETY_FACTOR_RANGE;

use crate::schema::{AbundancesDef, Case, ProfileDef, ScalarDef};
use crate::units::{Dimension, UnitError, convert, parse_quantity};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate element: {symbol} in {context}")]
    DuplicateElement { symbol: String, context: String },

    #[error("Unknown element: {symbol} in {context}")]
    UnknownElement { symbol: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid unit for {field}: {source}")]
    Unit { field: String, source: UnitError },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn unit_error(field: &str) -> impl Fn(UnitError) -> ValidationError + '_ {
    move |source| ValidationError::Unit {
        field: field.to_string(),
        source,
    }
}

/// Resolve a scalar to canonical units.
pub fn scalar_value(
    scalar: &ScalarDef,
    dimension: Dimension,
    field: &str,
) -> Result<f64, ValidationError> {
    match scalar {
        ScalarDef::Number(v) => convert(*v, None, dimension),
        ScalarDef::Text(text) => parse_quantity(text, dimension),
    }
    .map_err(unit_error(field))
}

/// Parse element symbols, rejecting unknown and repeated ones.
pub fn parse_elements<'a>(
    symbols: impl IntoIterator<Item = &'a String>,
    context: &str,
) -> Result<Vec<Element>, ValidationError> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for symbol in symbols {
        let element =
            Element::from_symbol(symbol).map_err(|_| ValidationError::UnknownElement {
                symbol: symbol.clone(),
                context: context.to_string(),
            })?;
        if !seen.insert(element) {
            return Err(ValidationError::DuplicateElement {
                symbol: symbol.clone(),
                context: context.to_string(),
            });
        }
        out.push(element);
    }
    Ok(out)
}

pub fn validate_case(case: &Case) -> Result<(), ValidationError> {
    if case.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: case.version,
        });
    }
    if case.name.trim().is_empty() {
        return Err(invalid("name", "\"\"", "must not be empty"));
    }

    let elements = validate_elements(case)?;
    if !elements.contains(&Element::HYDROGEN) {
        return Err(invalid("elements", "no H", "hydrogen must be simulated"));
    }
    validate_abundances(&case.abundances, &elements)?;

    let grid_len = match &case.time_input {
        Some(grid) => {
            let unit = grid.unit.as_deref();
            let times = grid
                .values
                .iter()
                .map(|&t| convert(t, unit, Dimension::Time))
                .collect::<Result<Vec<_>, _>>()
                .map_err(unit_error("time_input"))?;
            if times.len() < 2 {
                return Err(invalid("time_input", times.len(), "at least two points required"));
            }
            if !is_strictly_increasing(&times) {
                return Err(invalid("time_input", "values", "must be strictly increasing"));
            }
            Some(times.len())
        }
        None => None,
    };

    validate_profile(&case.temperature, Dimension::Temperature, "temperature", grid_len)?;
    validate_profile(&case.density, Dimension::NumberDensity, "density", grid_len)?;

    let start = case
        .time_start
        .as_ref()
        .map(|t| scalar_value(t, Dimension::Time, "time_start"))
        .transpose()?;
    let max = case
        .time_max
        .as_ref()
        .map(|t| scalar_value(t, Dimension::Time, "time_max"))
        .transpose()?;
    if let (Some(start), Some(max)) = (start, max) {
        if max <= start {
            return Err(invalid("time_max", max, "must exceed time_start"));
        }
    }
    if matches!(case.temperature, ProfileDef::Linear { .. })
        || matches!(case.density, ProfileDef::Linear { .. })
    {
        let has_end = max.is_some() || case.time_input.is_some();
        if !has_end {
            return Err(invalid(
                "time_max",
                "None",
                "Linear profiles need time_max or time_input",
            ));
        }
    }

    if case.max_steps == 0 {
        return Err(invalid("max_steps", 0, "must be positive"));
    }
    if let Some(dt) = &case.dt {
        let dt = scalar_value(dt, Dimension::Time, "dt")?;
        if dt <= 0.0 {
            return Err(invalid("dt", dt, "must be positive"));
        }
    }
    if !case.tol.is_finite() || case.tol < 0.0 {
        return Err(invalid("tol", case.tol, "must be finite and non-negative"));
    }
    let (lo, hi) = SAFETY_FACTOR_RANGE;
    if !(lo..=hi).contains(&case.safety_factor) {
        return Err(invalid("safety_factor", case.safety_factor, "must lie in [1e-3, 1e3]"));
    }

    let table = &case.rate_table;
    if table.model != ScaledHydrogenic::NAME {
        return Err(ValidationError::Unsupported {
            feature: format!("rate model '{}'", table.model),
            reason: format!("only '{}' is available", ScaledHydrogenic::NAME),
        });
    }
    let grid = TemperatureGrid {
        log_t_min: table.log_t_min,
        log_t_max: table.log_t_max,
        points: table.points,
    };
    grid.validate()
        .map_err(|e| invalid("rate_table", format!("{grid:?}"), &e.to_string()))?;

    Ok(())
}

fn validate_elements(case: &Case) -> Result<Vec<Element>, ValidationError> {
    match (case.elements.is_empty(), case.initial_fractions.is_empty()) {
        (true, true) => Err(invalid(
            "elements",
            "[]",
            "give either elements or initial_fractions",
        )),
        (false, false) => Err(invalid(
            "elements",
            case.elements.join(", "),
            "elements and initial_fractions are exclusive",
        )),
        (false, true) => parse_elements(&case.elements, "elements"),
        (true, false) => {
            let elements = parse_elements(case.initial_fractions.keys(), "initial_fractions")?;
            for (element, fractions) in elements.iter().zip(case.initial_fractions.values()) {
                if fractions.len() != element.nstates() {
                    return Err(invalid(
                        &format!("initial_fractions.{element}"),
                        format!("{} values", fractions.len()),
                        &format!("{element} has {} charge states", element.nstates()),
                    ));
                }
                if fractions.iter().any(|f| !f.is_finite() || *f < 0.0) {
                    return Err(invalid(
                        &format!("initial_fractions.{element}"),
                        format!("{fractions:?}"),
                        "fractions must be finite and non-negative",
                    ));
                }
            }
            Ok(elements)
        }
    }
}

fn validate_abundances(
    abundances: &AbundancesDef,
    elements: &[Element],
) -> Result<(), ValidationError> {
    match abundances {
        AbundancesDef::Preset { preset } => {
            let preset = AbundancePreset::from_name(preset)
                .map_err(|e| invalid("abundances.preset", preset, &e.to_string()))?;
            for element in elements {
                if preset.abundance(*element).is_none() {
                    return Err(invalid(
                        "abundances.preset",
                        preset.name(),
                        &format!("no abundance for {element}"),
                    ));
                }
            }
        }
        AbundancesDef::Values { values } => {
            let given = parse_elements(values.keys(), "abundances")?;
            for (element, value) in given.iter().zip(values.values()) {
                if !value.is_finite() || *value < 0.0 {
                    return Err(invalid(
                        &format!("abundances.{element}"),
                        value,
                        "must be finite and non-negative",
                    ));
                }
            }
            if let Some(missing) = elements.iter().find(|e| !given.contains(*e)) {
                return Err(invalid(
                    "abundances",
                    format!("{missing}"),
                    "missing abundance for a simulated element",
                ));
            }
        }
    }
    Ok(())
}

fn validate_profile(
    profile: &ProfileDef,
    dimension: Dimension,
    field: &str,
    grid_len: Option<usize>,
) -> Result<(), ValidationError> {
    let unit = profile.unit();
    let check = |v: f64| -> Result<f64, ValidationError> {
        let v = convert(v, unit, dimension).map_err(unit_error(field))?;
        if v < 0.0 {
            return Err(invalid(field, v, "must be non-negative"));
        }
        Ok(v)
    };
    match profile {
        ProfileDef::Constant { value, .. } => {
            check(*value)?;
        }
        ProfileDef::Tabulated { values, .. } => {
            let n = grid_len.ok_or_else(|| invalid(field, "Tabulated", "requires time_input"))?;
            if values.len() != n {
                return Err(invalid(
                    field,
                    format!("{} values", values.len()),
                    &format!("time_input has {n} points"),
                ));
            }
            for v in values {
                check(*v)?;
            }
        }
        ProfileDef::Linear { from, to, .. } => {
            check(*from)?;
            check(*to)?;
        }
        ProfileDef::Exponential {
            initial,
            final_value,
            timescale_s,
            ..
        } => {
            check(*initial)?;
            check(*final_value)?;
            if !timescale_s.is_finite() || *timescale_s <= 0.0 {
                return Err(invalid(
                    &format!("{field}.timescale_s"),
                    timescale_s,
                    "must be positive",
                ));
            }
        }
    }
    Ok(())
}
