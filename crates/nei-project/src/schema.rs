//! Case file schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One simulation case as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Case {
    pub version: u32,
    pub name: String,
    /// Elements that start in equilibrium. Exclusive with `initial_fractions`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub initial_fractions: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub abundances: AbundancesDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_input: Option<TimeGridDef>,
    pub temperature: ProfileDef,
    #[serde(alias = "hydrogen_density")]
    pub density: ProfileDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_start: Option<ScalarDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_max: Option<ScalarDef>,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt: Option<ScalarDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapt_dt: Option<bool>,
    #[serde(default = "default_tol")]
    pub tol: f64,
    #[serde(default = "default_safety_factor")]
    pub safety_factor: f64,
    #[serde(default)]
    pub renormalize: bool,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub rate_table: RateTableDef,
}

fn default_max_steps() -> usize {
    1000
}

fn default_tol() -> f64 {
    1e-15
}

fn default_safety_factor() -> f64 {
    1.0
}

/// `{ preset: solar }` or `{ values: { H: 1.0, He: 0.085 } }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AbundancesDef {
    Preset { preset: String },
    Values { values: BTreeMap<String, f64> },
}

impl Default for AbundancesDef {
    fn default() -> Self {
        AbundancesDef::Preset {
            preset: "solar".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeGridDef {
    pub values: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// A scalar given as a bare number (canonical unit) or as text with a unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ScalarDef {
    Number(f64),
    Text(String),
}

/// Time dependence of the temperature or density.
///
/// `Linear` and `Exponential` run from `time_start`; `Linear` reaches `to` at
/// `time_max`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ProfileDef {
    Constant {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    Tabulated {
        values: Vec<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    Linear {
        from: f64,
        to: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    Exponential {
        initial: f64,
        #[serde(rename = "final")]
        final_value: f64,
        timescale_s: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
}

impl ProfileDef {
    pub fn unit(&self) -> Option<&str> {
        match self {
            ProfileDef::Constant { unit, .. }
            | ProfileDef::Tabulated { unit, .. }
            | ProfileDef::Linear { unit, .. }
            | ProfileDef::Exponential { unit, .. } => unit.as_deref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProfileDef::Constant { .. } => "Constant",
            ProfileDef::Tabulated { .. } => "Tabulated",
            ProfileDef::Linear { .. } => "Linear",
            ProfileDef::Exponential { .. } => "Exponential",
        }
    }
}

/// Temperature grid and rate model of the eigen table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateTableDef {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_log_t_min")]
    pub log_t_min: f64,
    #[serde(default = "default_log_t_max")]
    pub log_t_max: f64,
    #[serde(default = "default_points")]
    pub points: usize,
}

fn default_model() -> String {
    "scaled-hydrogenic".to_string()
}

fn default_log_t_min() -> f64 {
    4.0
}

fn default_log_t_max() -> f64 {
    9.0
}

fn default_points() -> usize {
    501
}

impl Default for RateTableDef {
    fn default() -> Self {
        Self {
            model: default_model(),
            log_t_min: default_log_t_min(),
            log_t_max: default_log_t_max(),
            points: default_points(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version: 1
name: oxygen heating
elements: [H, He, O]
abundances: { preset: solar }
time_input: { values: [0, 100, 1000], unit: s }
temperature: { type: Tabulated, values: [1e4, 1e6, 1e6], unit: K }
density: { type: Constant, value: 1e9, unit: cm^-3 }
time_start: 0 s
time_max: 1000
max_steps: 100
dt: 10 s
"#;

    #[test]
    fn parses_documented_layout() {
        let case: Case = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(case.elements, vec!["H", "He", "O"]);
        assert_eq!(case.time_start, Some(ScalarDef::Text("0 s".to_string())));
        assert_eq!(case.time_max, Some(ScalarDef::Number(1000.0)));
        assert_eq!(case.temperature.kind(), "Tabulated");
        assert_eq!(case.density.unit(), Some("cm^-3"));
        assert_eq!(case.tol, 1e-15);
        assert_eq!(case.rate_table, RateTableDef::default());
        assert!(!case.renormalize);
    }

    #[test]
    fn explicit_abundances_and_exponential() {
        let yaml = r#"
version: 1
name: cooling
initial_fractions: { H: [0.0, 1.0] }
abundances: { values: { H: 1.0 } }
temperature: { type: Exponential, initial: 1e7, final: 1e5, timescale_s: 500 }
hydrogen_density: { type: Constant, value: 1e15, unit: m^-3 }
dt: 1
"#;
        let case: Case = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(case.abundances, AbundancesDef::Values { .. }));
        match case.temperature {
            ProfileDef::Exponential { final_value, .. } => assert_eq!(final_value, 1e5),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(case.density.unit(), Some("m^-3"));
    }

    #[test]
    fn json_serializes_final_keyword() {
        let profile = ProfileDef::Exponential {
            initial: 1.0,
            final_value: 2.0,
            timescale_s: 3.0,
            unit: None,
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(
            json,
            r#"{"type":"Exponential","initial":1.0,"final":2.0,"timescale_s":3.0}"#
        );
    }
}
