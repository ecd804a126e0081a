//! Turn a validated case into simulator inputs.

use nei_atomic::{AbundancePreset, AbundanceSpec, IonicInputs};
use nei_core::Element;
use nei_core::units::{NumberDensity, Temperature, Time, s, to_seconds};
use nei_rates::{EigenTable, RateModel, ScaledHydrogenic, TemperatureGrid};
use nei_sim::{InputQuantity, NeiConfig, TimeSeriesInput};

use crate::schema::{AbundancesDef, Case, ProfileDef};
use crate::units::{Dimension, convert};
use crate::validate::{ValidationError, parse_elements, scalar_value, validate_case};
use crate::{ProjectError, ProjectResult};

/// Everything a run needs besides the rate table itself.
#[derive(Debug, Clone)]
pub struct CompiledCase {
    pub config: NeiConfig,
    pub grid: TemperatureGrid,
    pub model: String,
}

impl CompiledCase {
    pub fn elements(&self) -> Vec<Element> {
        let mut elements = self.config.inputs.elements();
        elements.sort();
        elements
    }
}

/// Validate `case` and build the simulator configuration.
pub fn compile_case(case: &Case) -> ProjectResult<CompiledCase> {
    validate_case(case)?;

    let inputs = if case.initial_fractions.is_empty() {
        IonicInputs::Elements(parse_elements(&case.elements, "elements")?)
    } else {
        let elements = parse_elements(case.initial_fractions.keys(), "initial_fractions")?;
        IonicInputs::Fractions(
            elements
                .into_iter()
                .zip(case.initial_fractions.values().cloned())
                .collect(),
        )
    };

    let abundances = match &case.abundances {
        AbundancesDef::Preset { preset } => {
            AbundanceSpec::Preset(AbundancePreset::from_name(preset)?)
        }
        AbundancesDef::Values { values } => {
            let elements = parse_elements(values.keys(), "abundances")?;
            AbundanceSpec::Explicit(elements.into_iter().zip(values.values().copied()).collect())
        }
    };

    let times: Option<Vec<f64>> = match &case.time_input {
        Some(grid) => Some(
            grid.values
                .iter()
                .map(|&t| convert(t, grid.unit.as_deref(), Dimension::Time))
                .collect::<Result<_, _>>()
                .map_err(|source| ValidationError::Unit {
                    field: "time_input".to_string(),
                    source,
                })?,
        ),
        None => None,
    };
    let time_start = case
        .time_start
        .as_ref()
        .map(|t| scalar_value(t, Dimension::Time, "time_start"))
        .transpose()?;
    let time_max = case
        .time_max
        .as_ref()
        .map(|t| scalar_value(t, Dimension::Time, "time_max"))
        .transpose()?;
    let dt = case
        .dt
        .as_ref()
        .map(|t| scalar_value(t, Dimension::Time, "dt"))
        .transpose()?;

    // the window Linear and Exponential profiles are defined over
    let window = Window {
        start: time_start
            .or_else(|| times.as_ref().and_then(|ts| ts.first().copied()))
            .unwrap_or(0.0),
        end: time_max.or_else(|| times.as_ref().and_then(|ts| ts.last().copied())),
    };

    let temperature =
        compile_profile::<Temperature>(&case.temperature, Dimension::Temperature, window)?;
    let density =
        compile_profile::<NumberDensity>(&case.density, Dimension::NumberDensity, window)?;

    let mut config = NeiConfig::new(inputs);
    config.abundances = abundances;
    config.temperature = Some(temperature);
    config.density = Some(density);
    config.time_input = times.map(|ts| ts.into_iter().map(s).collect());
    config.time_start = time_start.map(s);
    config.time_max = time_max.map(s);
    config.max_steps = case.max_steps;
    config.tol = case.tol;
    config.dt = dt.map(s);
    config.adapt_dt = case.adapt_dt;
    config.safety_factor = case.safety_factor;
    config.renormalize = case.renormalize;
    config.parallel = case.parallel;

    Ok(CompiledCase {
        config,
        grid: TemperatureGrid {
            log_t_min: case.rate_table.log_t_min,
            log_t_max: case.rate_table.log_t_max,
            points: case.rate_table.points,
        },
        model: case.rate_table.model.clone(),
    })
}

#[derive(Debug, Clone, Copy)]
struct Window {
    start: f64,
    end: Option<f64>,
}

fn compile_profile<Q: InputQuantity>(
    profile: &ProfileDef,
    dimension: Dimension,
    window: Window,
) -> ProjectResult<TimeSeriesInput<Q>> {
    let unit = profile.unit();
    let canonical = |v: f64| -> ProjectResult<f64> {
        convert(v, unit, dimension).map_err(|source| {
            ProjectError::Validation(ValidationError::Unit {
                field: dimension.to_string(),
                source,
            })
        })
    };

    let input = match profile {
        ProfileDef::Constant { value, .. } => {
            TimeSeriesInput::Constant(Q::from_magnitude(canonical(*value)?))
        }
        ProfileDef::Tabulated { values, .. } => TimeSeriesInput::Tabulated(
            values
                .iter()
                .map(|v| canonical(*v).map(Q::from_magnitude))
                .collect::<ProjectResult<_>>()?,
        ),
        ProfileDef::Linear { from, to, .. } => {
            let (from, to) = (canonical(*from)?, canonical(*to)?);
            let start = window.start;
            let end = window.end.ok_or_else(|| ProjectError::Compile {
                what: "Linear profile needs an end time".to_string(),
            })?;
            let span = end - start;
            TimeSeriesInput::function(move |t: Time| {
                let w = ((to_seconds(t) - start) / span).clamp(0.0, 1.0);
                Q::from_magnitude(from + (to - from) * w)
            })
        }
        ProfileDef::Exponential {
            initial,
            final_value,
            timescale_s,
            ..
        } => {
            let (initial, last) = (canonical(*initial)?, canonical(*final_value)?);
            let (start, tau) = (window.start, *timescale_s);
            TimeSeriesInput::function(move |t: Time| {
                let decay = (-(to_seconds(t) - start) / tau).exp();
                Q::from_magnitude(last + (initial - last) * decay)
            })
        }
    };
    Ok(input)
}

/// Rate model registered under `name`.
pub fn rate_model(name: &str) -> ProjectResult<Box<dyn RateModel>> {
    match name {
        ScaledHydrogenic::NAME => Ok(Box::new(ScaledHydrogenic::default())),
        other => Err(ProjectError::Compile {
            what: format!("unknown rate model '{other}'"),
        }),
    }
}

/// Tabulate the eigen systems a compiled case needs.
pub fn build_rate_table(compiled: &CompiledCase) -> ProjectResult<EigenTable> {
    let model = rate_model(&compiled.model)?;
    Ok(EigenTable::build(
        model.as_ref(),
        &compiled.elements(),
        compiled.grid,
    )?)
}
