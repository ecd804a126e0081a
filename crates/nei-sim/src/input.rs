//! Time-dependent electron temperature and density inputs.

use std::fmt;
use std::sync::Arc;

use nei_core::{CoreError, Tolerances, ensure_non_negative, nearly_equal};
use nei_core::units::{NumberDensity, Temperature, Time, k, per_cm3, s, to_kelvin, to_per_cm3};

use crate::error::{SimError, SimResult};

/// A physical quantity that can drive a simulation.
///
/// Profiles are evaluated in plain numbers (kelvin, cm⁻³); the unit is
/// re-attached on the way out.
pub trait InputQuantity: Copy + fmt::Debug + Send + Sync + 'static {
    const NAME: &'static str;

    fn magnitude(self) -> f64;

    fn from_magnitude(value: f64) -> Self;
}

impl InputQuantity for Temperature {
    const NAME: &'static str = "electron temperature";

    fn magnitude(self) -> f64 {
        to_kelvin(self)
    }

    fn from_magnitude(value: f64) -> Self {
        k(value)
    }
}

impl InputQuantity for NumberDensity {
    const NAME: &'static str = "number density";

    fn magnitude(self) -> f64 {
        to_per_cm3(self)
    }

    fn from_magnitude(value: f64) -> Self {
        per_cm3(value)
    }
}

/// How a quantity varies in time.
#[derive(Clone)]
pub enum TimeSeriesInput<Q> {
    Constant(Q),
    /// One value per point of the simulation's time grid.
    Tabulated(Vec<Q>),
    Functional(Arc<dyn Fn(Time) -> Q + Send + Sync>),
}

impl<Q> TimeSeriesInput<Q> {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(Time) -> Q + Send + Sync + 'static,
    {
        TimeSeriesInput::Functional(Arc::new(f))
    }
}

impl<Q: fmt::Debug> fmt::Debug for TimeSeriesInput<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSeriesInput::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            TimeSeriesInput::Tabulated(v) => f.debug_tuple("Tabulated").field(v).finish(),
            TimeSeriesInput::Functional(_) => f.write_str("Functional(<fn>)"),
        }
    }
}

/// Slack past `time_max` for times built from repeated steps.
const TIME_MAX_SLACK: Tolerances = Tolerances::ulps(8);

/// Closed interval `[start, max]` in seconds; `max = None` is unbounded.
///
/// Times within a few ulps above `max` count as `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeDomain {
    pub start: f64,
    pub max: Option<f64>,
}

impl TimeDomain {
    /// `t` itself, or `max` when `t` overshoots it by rounding only.
    pub fn resolve(&self, t: f64) -> SimResult<f64> {
        self.check(t)?;
        Ok(match self.max {
            Some(max) if t > max => max,
            _ => t,
        })
    }

    pub fn check(&self, t: f64) -> SimResult<()> {
        if t.is_nan() {
            return Err(SimError::domain("time is NaN"));
        }
        if t < self.start {
            return Err(SimError::domain(format!(
                "time {t} s is before time_start = {} s",
                self.start
            )));
        }
        if let Some(max) = self.max {
            if t > max && !nearly_equal(t, max, TIME_MAX_SLACK) {
                return Err(SimError::domain(format!(
                    "time {t} s is after time_max = {max} s"
                )));
            }
        }
        Ok(())
    }
}

/// Validated input in plain numbers.
#[derive(Clone)]
pub(crate) enum Profile {
    Constant(f64),
    Tabulated { times: Vec<f64>, values: Vec<f64> },
    Functional(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Profile::Tabulated { times, values } => f
                .debug_struct("Tabulated")
                .field("times", times)
                .field("values", values)
                .finish(),
            Profile::Functional(_) => f.write_str("Functional(<fn>)"),
        }
    }
}

fn check_value(name: &'static str, v: f64) -> Result<f64, String> {
    ensure_non_negative(v, name).map_err(|e| match e {
        CoreError::Negative { .. } => format!("{name} must be non-negative, got {v}"),
        _ => format!("{name} must be finite, got {v}"),
    })
}

impl Profile {
    /// Validate an input against the time grid and domain.
    ///
    /// `times` must already be strictly increasing. Functional inputs are probed at
    /// both ends of the domain.
    pub(crate) fn compile<Q: InputQuantity>(
        input: &TimeSeriesInput<Q>,
        times: Option<&[f64]>,
        domain: &TimeDomain,
    ) -> Result<Self, String> {
        match input {
            TimeSeriesInput::Constant(q) => {
                Ok(Profile::Constant(check_value(Q::NAME, q.magnitude())?))
            }
            TimeSeriesInput::Tabulated(values) => {
                let times =
                    times.ok_or_else(|| format!("tabulated {} requires time_input", Q::NAME))?;
                if values.len() != times.len() {
                    return Err(format!(
                        "tabulated {} has {} values but time_input has {} points",
                        Q::NAME,
                        values.len(),
                        times.len()
                    ));
                }
                if values.len() < 2 {
                    return Err(format!("tabulated {} needs at least two points", Q::NAME));
                }
                let values = values
                    .iter()
                    .map(|q| check_value(Q::NAME, q.magnitude()))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Profile::Tabulated {
                    times: times.to_vec(),
                    values,
                })
            }
            TimeSeriesInput::Functional(f) => {
                let f = Arc::clone(f);
                let wrapped: Arc<dyn Fn(f64) -> f64 + Send + Sync> =
                    Arc::new(move |t: f64| f(s(t)).magnitude());
                let probes = std::iter::once(domain.start).chain(domain.max);
                for t in probes {
                    check_value(Q::NAME, wrapped(t))
                        .map_err(|e| format!("{e} (function evaluated at {t} s)"))?;
                }
                Ok(Profile::Functional(wrapped))
            }
        }
    }

    /// Value at `t`, which the caller has already checked against the domain.
    pub(crate) fn value(&self, t: f64) -> f64 {
        match self {
            Profile::Constant(v) => *v,
            Profile::Tabulated { times, values } => interpolate(times, values, t),
            Profile::Functional(f) => f(t),
        }
    }

    /// Domain-checked evaluation.
    pub(crate) fn evaluate(&self, name: &'static str, t: f64, domain: &TimeDomain) -> SimResult<f64> {
        domain.check(t)?;
        let v = self.value(t);
        check_value(name, v).map_err(|e| SimError::domain(format!("{e} at t = {t} s")))
    }
}

/// Piecewise-linear interpolation on a strictly increasing grid, clamped at the ends.
pub fn interpolate(times: &[f64], values: &[f64], t: f64) -> f64 {
    let n = times.len().min(values.len());
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 || t <= times[0] {
        return values[0];
    }
    if t >= times[n - 1] {
        return values[n - 1];
    }
    let hi = times[..n].partition_point(|x| *x <= t);
    let lo = hi - 1;
    let w = (t - times[lo]) / (times[hi] - times[lo]);
    values[lo] + w * (values[hi] - values[lo])
}
