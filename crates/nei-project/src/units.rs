//! Unit strings in case files.
//!
//! A case file gives quantities either as a bare number with a separate `unit`
//! field or as text such as `"10 keV"` or `"1e3 s"`. Everything is converted to
//! the working units of the simulator: kelvin, seconds and cm⁻³.

use std::fmt;

use nei_core::units::constants::KELVIN_PER_EV;

/// Dimension family of a case-file quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    /// Canonical: K
    Temperature,
    /// Canonical: cm⁻³
    NumberDensity,
    /// Canonical: s
    Time,
}

impl Dimension {
    /// Unit assumed when none is given.
    pub fn default_unit(self) -> &'static str {
        match self {
            Self::Temperature => "K",
            Self::NumberDensity => "cm^-3",
            Self::Time => "s",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature"),
            Self::NumberDensity => write!(f, "number density"),
            Self::Time => write!(f, "time"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown unit '{unit}'")]
    UnknownUnit { unit: String },

    #[error("Unit '{unit}' is a {found} unit, expected {expected}")]
    WrongDimension {
        unit: String,
        expected: Dimension,
        found: Dimension,
    },

    #[error("Value {value} out of range: {reason}")]
    OutOfRange { value: f64, reason: &'static str },
}

const SECONDS_PER_YEAR: f64 = 365.25 * 86_400.0;

/// Dimension and factor to the canonical unit.
fn lookup(unit: &str) -> Option<(Dimension, f64)> {
    let normalized: String = unit.chars().filter(|c| !c.is_whitespace()).collect();
    let entry = match normalized.as_str() {
        "K" | "kelvin" => (Dimension::Temperature, 1.0),
        "MK" => (Dimension::Temperature, 1e6),
        "eV" => (Dimension::Temperature, KELVIN_PER_EV),
        "keV" => (Dimension::Temperature, 1e3 * KELVIN_PER_EV),

        "cm^-3" | "cm-3" | "/cm3" | "/cm^3" | "1/cm3" | "1/cm^3" => {
            (Dimension::NumberDensity, 1.0)
        }
        "m^-3" | "m-3" | "/m3" | "/m^3" | "1/m3" | "1/m^3" => (Dimension::NumberDensity, 1e-6),

        "s" | "sec" => (Dimension::Time, 1.0),
        "ms" => (Dimension::Time, 1e-3),
        "min" => (Dimension::Time, 60.0),
        "h" | "hr" => (Dimension::Time, 3_600.0),
        "d" | "day" => (Dimension::Time, 86_400.0),
        "yr" | "year" => (Dimension::Time, SECONDS_PER_YEAR),
        _ => return None,
    };
    Some(entry)
}

/// Multiplier taking a value in `unit` to the canonical unit of `expected`.
pub fn unit_factor(unit: &str, expected: Dimension) -> Result<f64, UnitError> {
    let unit = unit.trim();
    if unit.is_empty() {
        return Ok(1.0);
    }
    let (found, factor) = lookup(unit).ok_or_else(|| UnitError::UnknownUnit {
        unit: unit.to_string(),
    })?;
    if found != expected {
        return Err(UnitError::WrongDimension {
            unit: unit.to_string(),
            expected,
            found,
        });
    }
    Ok(factor)
}

/// Convert `value` given in `unit` (default unit when `None`).
pub fn convert(value: f64, unit: Option<&str>, expected: Dimension) -> Result<f64, UnitError> {
    if !value.is_finite() {
        return Err(UnitError::OutOfRange {
            value,
            reason: "must be finite",
        });
    }
    let factor = match unit {
        Some(u) => unit_factor(u, expected)?,
        None => 1.0,
    };
    Ok(value * factor)
}

/// Parse text like `"10 keV"`, `"1e9cm^-3"` or `"600"`.
pub fn parse_quantity(text: &str, expected: Dimension) -> Result<f64, UnitError> {
    let (value, unit) = split_value_and_unit(text)?;
    convert(value, Some(unit), expected)
}

/// Split `"1.5e3 yr"` into `(1.5e3, "yr")`.
///
/// An `e`/`E` belongs to the number only when an exponent follows it, so
/// `"5eV"` splits as `(5, "eV")`.
fn split_value_and_unit(input: &str) -> Result<(f64, &str), UnitError> {
    let trimmed = input.trim();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    while end < bytes.len() {
        let c = bytes[end];
        let numeric = match c {
            b'0'..=b'9' | b'.' => true,
            b'+' | b'-' => end == 0 || matches!(bytes[end - 1], b'e' | b'E'),
            b'e' | b'E' => {
                let next = bytes.get(end + 1).copied();
                let after = bytes.get(end + 2).copied();
                match next {
                    Some(b'0'..=b'9') => true,
                    Some(b'+' | b'-') => matches!(after, Some(b'0'..=b'9')),
                    _ => false,
                }
            }
            _ => false,
        };
        if !numeric {
            break;
        }
        end += 1;
    }

    let (num, unit) = trimmed.split_at(end);
    let value: f64 = num
        .parse()
        .map_err(|_| UnitError::Parse(format!("could not parse a number from '{input}'")))?;
    Ok((value, unit.trim()))
}
