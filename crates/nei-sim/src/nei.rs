//! The NEI driver: configuration, initial state and the stepping loop.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use nei_atomic::{AbundanceSpec, IonicInputs, IonizationStates};
use nei_core::units::{NumberDensity, Temperature, Time, k, per_cm3, to_kelvin, to_seconds};
use nei_core::{Element, is_strictly_increasing};
use nei_rates::RateTableProvider;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::advance::advance_element;
use crate::error::{SimError, SimResult};
use crate::input::{InputQuantity, Profile, TimeDomain, TimeSeriesInput};
use crate::state::{Snapshot, SimulationState};

/// Allowed range of [`NeiConfig::safety_factor`].
pub const SAFETY_FACTOR_RANGE: (f64, f64) = (1e-3, 1e3);

/// Everything needed to set up a simulation.
///
/// `temperature` and `density` are both required even though they are optional
/// here; leaving either out fails in [`Nei::new`].
#[derive(Debug, Clone)]
pub struct NeiConfig {
    pub inputs: IonicInputs,
    pub abundances: AbundanceSpec,
    pub temperature: Option<TimeSeriesInput<Temperature>>,
    /// Density scale; elemental densities are this times the abundance.
    pub density: Option<TimeSeriesInput<NumberDensity>>,
    /// Time grid for tabulated inputs.
    pub time_input: Option<Vec<Time>>,
    pub time_start: Option<Time>,
    pub time_max: Option<Time>,
    pub max_steps: usize,
    /// Initial fractions at or below this are zeroed.
    pub tol: f64,
    pub dt: Option<Time>,
    /// Defaults to adaptive when no `dt` is given.
    pub adapt_dt: Option<bool>,
    pub safety_factor: f64,
    pub renormalize: bool,
    /// Advance elements on the rayon pool.
    pub parallel: bool,
    /// Log every step at info level instead of debug.
    pub verbose: bool,
}

impl NeiConfig {
    pub fn new(inputs: IonicInputs) -> Self {
        Self {
            inputs,
            abundances: AbundanceSpec::default(),
            temperature: None,
            density: None,
            time_input: None,
            time_start: None,
            time_max: None,
            max_steps: 1000,
            tol: 1e-15,
            dt: None,
            adapt_dt: None,
            safety_factor: 1.0,
            renormalize: false,
            parallel: false,
            verbose: false,
        }
    }

    /// One `name: value` line per parameter, for configuration errors.
    pub fn describe(&self) -> String {
        let secs = |t: &Option<Time>| match t {
            Some(t) => format!("{} s", to_seconds(*t)),
            None => "None".to_string(),
        };
        let times = match &self.time_input {
            Some(ts) => format!(
                "{:?} s",
                ts.iter().map(|t| to_seconds(*t)).collect::<Vec<_>>()
            ),
            None => "None".to_string(),
        };
        [
            format!("inputs: {:?}", self.inputs),
            format!("abundances: {:?}", self.abundances),
            format!("temperature: {}", describe_input(&self.temperature)),
            format!("density: {}", describe_input(&self.density)),
            format!("time_input: {times}"),
            format!("time_start: {}", secs(&self.time_start)),
            format!("time_max: {}", secs(&self.time_max)),
            format!("max_steps: {}", self.max_steps),
            format!("tol: {:e}", self.tol),
            format!("dt: {}", secs(&self.dt)),
            format!("adapt_dt: {:?}", self.adapt_dt),
            format!("safety_factor: {}", self.safety_factor),
            format!("renormalize: {}", self.renormalize),
            format!("parallel: {}", self.parallel),
            format!("verbose: {}", self.verbose),
        ]
        .join("\n")
    }
}

fn describe_input<Q: InputQuantity>(input: &Option<TimeSeriesInput<Q>>) -> String {
    match input {
        None => "None".to_string(),
        Some(TimeSeriesInput::Constant(q)) => format!("Constant({})", q.magnitude()),
        Some(TimeSeriesInput::Tabulated(v)) => format!(
            "Tabulated({:?})",
            v.iter().map(|q| q.magnitude()).collect::<Vec<_>>()
        ),
        Some(TimeSeriesInput::Functional(_)) => "Functional(<fn>)".to_string(),
    }
}

/// A configured non-equilibrium ionization simulation.
///
/// Temperatures are in K, densities in cm⁻³ and times in s once inside the
/// driver; the public accessors take and return `uom` quantities.
pub struct Nei {
    config: NeiConfig,
    provider: Arc<dyn RateTableProvider>,
    initial: IonizationStates,
    temperature: Profile,
    density: Profile,
    domain: TimeDomain,
    dt: Option<f64>,
    adapt_dt: bool,
    results: Option<SimulationState>,
}

impl fmt::Debug for Nei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nei")
            .field("config", &self.config)
            .field("initial", &self.initial)
            .field("domain", &self.domain)
            .field("dt", &self.dt)
            .field("adapt_dt", &self.adapt_dt)
            .field("results", &self.results.as_ref().map(|r| r.index()))
            .finish_non_exhaustive()
    }
}

impl Nei {
    /// Validate `config` and resolve the initial ionization state.
    ///
    /// Without explicit initial fractions, every element starts in the
    /// provider's equilibrium at the electron temperature at `time_start`.
    /// Any failure is a single [`SimError::Configuration`] that echoes every
    /// supplied parameter.
    pub fn new(config: NeiConfig, provider: Arc<dyn RateTableProvider>) -> SimResult<Self> {
        let inputs = config.describe();
        let fail = |what: String| SimError::Configuration {
            what,
            inputs: inputs.clone(),
        };

        if config.max_steps == 0 {
            return Err(fail("max_steps must be positive".into()));
        }
        if !config.tol.is_finite() || config.tol < 0.0 {
            return Err(fail(format!("tol must be finite and non-negative, got {}", config.tol)));
        }
        let (lo, hi) = SAFETY_FACTOR_RANGE;
        if !(lo..=hi).contains(&config.safety_factor) {
            return Err(fail(format!(
                "safety_factor must lie in [{lo}, {hi}], got {}",
                config.safety_factor
            )));
        }

        let times: Option<Vec<f64>> = config
            .time_input
            .as_ref()
            .map(|ts| ts.iter().map(|t| to_seconds(*t)).collect());
        if let Some(ts) = &times {
            if ts.is_empty() {
                return Err(fail("time_input is empty".into()));
            }
            if ts.iter().any(|t| !t.is_finite()) {
                return Err(fail("time_input must be finite".into()));
            }
            if !is_strictly_increasing(ts) {
                return Err(fail("time_input must be strictly increasing".into()));
            }
        }
        let first = times.as_ref().and_then(|ts| ts.first().copied());
        let last = times.as_ref().and_then(|ts| ts.last().copied());

        let start = config.time_start.map(to_seconds).or(first).unwrap_or(0.0);
        if !start.is_finite() {
            return Err(fail(format!("time_start must be finite, got {start}")));
        }
        if let Some(first) = first {
            if start < first {
                return Err(fail(format!(
                    "time_start = {start} s precedes the first time_input point {first} s"
                )));
            }
        }
        let max = config.time_max.map(to_seconds).or(last);
        if let Some(max) = max {
            if !max.is_finite() {
                return Err(fail(format!("time_max must be finite, got {max}")));
            }
            if max <= start {
                return Err(fail(format!(
                    "time_max = {max} s must exceed time_start = {start} s"
                )));
            }
        }
        let tabulated = matches!(config.temperature, Some(TimeSeriesInput::Tabulated(_)))
            || matches!(config.density, Some(TimeSeriesInput::Tabulated(_)));
        if let (true, Some(last), Some(max)) = (tabulated, last, max) {
            if max > last {
                return Err(fail(format!(
                    "time_max = {max} s exceeds the last time_input point {last} s"
                )));
            }
        }
        let domain = TimeDomain { start, max };

        let dt = match config.dt {
            Some(dt) => {
                let dt = to_seconds(dt);
                if !dt.is_finite() || dt <= 0.0 {
                    return Err(fail(format!("dt must be positive and finite, got {dt}")));
                }
                Some(dt)
            }
            None => None,
        };
        let adapt_dt = config.adapt_dt.unwrap_or(dt.is_none());
        if !adapt_dt && dt.is_none() {
            return Err(fail("a fixed timestep needs dt".into()));
        }

        let temperature = match &config.temperature {
            Some(input) => Profile::compile(input, times.as_deref(), &domain).map_err(&fail)?,
            None => return Err(fail("electron temperature input is required".into())),
        };
        let density = match &config.density {
            Some(input) => Profile::compile(input, times.as_deref(), &domain).map_err(&fail)?,
            None => return Err(fail("density input is required".into())),
        };

        let mut initial =
            IonizationStates::new(config.inputs.clone(), &config.abundances, config.tol)
                .map_err(|e| fail(e.to_string()))?;
        if !initial.contains(Element::HYDROGEN) {
            return Err(fail("hydrogen must be one of the elements".into()));
        }

        if !initial.is_explicit() {
            let t0 = temperature
                .evaluate(Temperature::NAME, start, &domain)
                .map_err(|e| fail(e.to_string()))?;
            let elements = initial.elements().to_vec();
            for element in elements {
                let eq = provider
                    .equilibrium_state(element, t0)
                    .map_err(|e| fail(e.to_string()))?;
                initial
                    .set_ionic_fractions(element, eq.as_slice())
                    .map_err(|e| fail(e.to_string()))?;
            }
            debug!(temperature_k = t0, "initialised to equilibrium");
        }

        Ok(Self {
            config,
            provider,
            initial,
            temperature,
            density,
            domain,
            dt,
            adapt_dt,
            results: None,
        })
    }

    pub fn config(&self) -> &NeiConfig {
        &self.config
    }

    pub fn initial(&self) -> &IonizationStates {
        &self.initial
    }

    pub fn elements(&self) -> &[Element] {
        self.initial.elements()
    }

    pub fn time_start(&self) -> Time {
        nei_core::s(self.domain.start)
    }

    pub fn time_max(&self) -> Option<Time> {
        self.domain.max.map(nei_core::s)
    }

    pub fn dt(&self) -> Option<Time> {
        self.dt.map(nei_core::s)
    }

    pub fn adapt_dt(&self) -> bool {
        self.adapt_dt
    }

    /// Electron temperature at `time`.
    pub fn electron_temperature(&self, time: Time) -> SimResult<Temperature> {
        self.temperature
            .evaluate(Temperature::NAME, to_seconds(time), &self.domain)
            .map(k)
    }

    /// Density scale at `time`.
    pub fn density_scale(&self, time: Time) -> SimResult<NumberDensity> {
        self.density
            .evaluate(NumberDensity::NAME, to_seconds(time), &self.domain)
            .map(per_cm3)
    }

    /// Equilibrium fractions of every element.
    ///
    /// Give at most one of `temperature` and `time`. With neither, the
    /// temperature input must be constant and is used directly.
    pub fn equilibrium_fractions(
        &self,
        temperature: Option<Temperature>,
        time: Option<Time>,
    ) -> SimResult<BTreeMap<Element, Vec<f64>>> {
        let t_e = match (temperature, time) {
            (Some(_), Some(_)) => {
                return Err(SimError::InvalidArg {
                    what: "give either a temperature or a time, not both",
                });
            }
            (Some(t), None) => to_kelvin(t),
            (None, Some(time)) => {
                self.temperature
                    .evaluate(Temperature::NAME, to_seconds(time), &self.domain)?
            }
            (None, None) => match &self.temperature {
                Profile::Constant(t) => *t,
                _ => {
                    return Err(SimError::InvalidArg {
                        what: "temperature input varies in time; give a temperature or a time",
                    });
                }
            },
        };

        let mut out = BTreeMap::new();
        for &element in self.initial.elements() {
            let eq = self.provider.equilibrium_state(element, t_e)?;
            out.insert(element, eq.iter().copied().collect());
        }
        Ok(out)
    }

    fn timestep(&self) -> SimResult<f64> {
        match self.dt {
            Some(dt) => Ok(dt),
            None => Err(SimError::Unimplemented {
                what: "adaptive timestep; give dt or set adapt_dt to false",
            }),
        }
    }

    /// Run `max_steps` advances from `time_start`.
    ///
    /// Each run starts from a fresh [`SimulationState`]. On a [`SimError::Run`]
    /// failure the columns committed before the failing step remain available
    /// through [`Nei::results`].
    pub fn simulate(&mut self) -> SimResult<&SimulationState> {
        let started = Instant::now();
        let dt = self.timestep()?;
        let max_steps = self.config.max_steps;

        let t0 = self.domain.start;
        let te0 = self
            .temperature
            .evaluate(Temperature::NAME, t0, &self.domain)?;
        let n0 = self
            .density
            .evaluate(NumberDensity::NAME, t0, &self.domain)?;

        let mut fractions = BTreeMap::new();
        for &element in self.initial.elements() {
            let f = self
                .initial
                .ionic_fractions(element)
                .ok_or(SimError::InvalidArg {
                    what: "initial ionic fractions are incomplete",
                })?;
            fractions.insert(element, f.to_vec());
        }
        let abundances: BTreeMap<Element, f64> = self.initial.abundances().iter().collect();

        self.results = None;
        let state = self.results.insert(SimulationState::new(
            &fractions,
            &abundances,
            max_steps,
            t0,
            te0,
            n0,
        )?);

        let provider: &dyn RateTableProvider = self.provider.as_ref();
        let elements = self.initial.elements();
        let renormalize = self.config.renormalize;

        for step in 1..=max_steps {
            let prev = step - 1;
            let t_e = state.electron_temperature()[prev];
            let n_e = state.electron_density()[prev];

            if self.config.verbose {
                info!(step, t_e, n_e, dt, "time advance");
            } else {
                debug!(step, t_e, n_e, dt, "time advance");
            }

            let advance = |element: &Element| {
                let f0 = &fractions[element];
                advance_element(provider, *element, f0, t_e, n_e, dt, renormalize)
                    .map(|f| (*element, f))
                    .map_err(|e| SimError::run(step, Some(*element), e))
            };
            let advanced: Vec<SimResult<(Element, Vec<f64>)>> = if self.config.parallel {
                elements.par_iter().map(advance).collect()
            } else {
                elements.iter().map(advance).collect()
            };
            let next: BTreeMap<Element, Vec<f64>> =
                advanced.into_iter().collect::<SimResult<_>>()?;

            let new_time = self
                .domain
                .resolve(t0 + step as f64 * dt)
                .map_err(|e| SimError::run(step, None, e))?;
            let new_t_e = self
                .temperature
                .evaluate(Temperature::NAME, new_time, &self.domain)
                .map_err(|e| SimError::run(step, None, e))?;
            let new_n = self
                .density
                .evaluate(NumberDensity::NAME, new_time, &self.domain)
                .map_err(|e| SimError::run(step, None, e))?;

            state
                .append(new_time, &next, new_t_e, new_n)
                .map_err(|e| SimError::run(step, None, e))?;
            fractions = next;
        }

        info!(
            steps = max_steps,
            elements = elements.len(),
            final_time_s = state.time().last().copied().unwrap_or(t0),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "simulation complete"
        );
        Ok(state)
    }

    /// State of the last (or current) run, `None` before [`Nei::simulate`].
    pub fn results(&self) -> Option<&SimulationState> {
        self.results.as_ref()
    }

    /// Last committed column of the last run.
    pub fn final_state(&self) -> Option<Snapshot> {
        self.results.as_ref().and_then(SimulationState::last)
    }
}
