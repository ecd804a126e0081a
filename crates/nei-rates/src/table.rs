//! Tabulated eigen-decompositions on a log-spaced temperature grid.

use std::collections::BTreeMap;
use std::time::Instant;

use nei_core::Element;
use rayon::prelude::*;
use tracing::info;

use crate::eigen::{EigenSystem, RateTableProvider};
use crate::error::{RatesError, RatesResult};
use crate::rates::RateModel;

/// Log-spaced temperature nodes `10^log_t_min ..= 10^log_t_max` K.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureGrid {
    pub log_t_min: f64,
    pub log_t_max: f64,
    pub points: usize,
}

impl Default for TemperatureGrid {
    fn default() -> Self {
        Self {
            log_t_min: 4.0,
            log_t_max: 9.0,
            points: 501,
        }
    }
}

impl TemperatureGrid {
    pub fn validate(&self) -> RatesResult<()> {
        if !self.log_t_min.is_finite() || !self.log_t_max.is_finite() {
            return Err(RatesError::InvalidGrid {
                what: "bounds must be finite",
            });
        }
        if self.log_t_max <= self.log_t_min {
            return Err(RatesError::InvalidGrid {
                what: "log_t_max must exceed log_t_min",
            });
        }
        if self.points < 2 {
            return Err(RatesError::InvalidGrid {
                what: "at least two points required",
            });
        }
        Ok(())
    }

    fn step(&self) -> f64 {
        (self.log_t_max - self.log_t_min) / (self.points - 1) as f64
    }

    pub fn min_k(&self) -> f64 {
        10f64.powf(self.log_t_min)
    }

    pub fn max_k(&self) -> f64 {
        10f64.powf(self.log_t_max)
    }

    /// Temperature of node `i` in K.
    pub fn temperature(&self, i: usize) -> f64 {
        10f64.powf(self.log_t_min + i as f64 * self.step())
    }

    pub fn temperatures(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.points).map(|i| self.temperature(i))
    }

    /// Index of the node nearest to `temperature_k` in log space.
    ///
    /// Temperatures outside `[min_k, max_k]` are rejected rather than clamped.
    pub fn nearest_index(&self, temperature_k: f64) -> RatesResult<usize> {
        let out_of_range = || RatesError::TemperatureOutOfRange {
            temperature_k,
            min_k: self.min_k(),
            max_k: self.max_k(),
        };
        if !temperature_k.is_finite() || temperature_k <= 0.0 {
            return Err(out_of_range());
        }
        let log_t = temperature_k.log10();
        // tolerate rounding in 10^x round trips at the bounds
        let slack = 1e-9 * self.step();
        if log_t < self.log_t_min - slack || log_t > self.log_t_max + slack {
            return Err(out_of_range());
        }
        let pos = ((log_t - self.log_t_min) / self.step()).round();
        Ok((pos.max(0.0) as usize).min(self.points - 1))
    }
}

/// Eigen-decompositions of every element on one temperature grid.
#[derive(Debug, Clone)]
pub struct EigenTable {
    grid: TemperatureGrid,
    model: String,
    systems: BTreeMap<Element, Vec<EigenSystem>>,
}

impl EigenTable {
    /// Decompose `model`'s generator for each element at each grid node.
    ///
    /// Nodes are independent and are built on the rayon pool.
    pub fn build(
        model: &dyn RateModel,
        elements: &[Element],
        grid: TemperatureGrid,
    ) -> RatesResult<Self> {
        grid.validate()?;
        let started = Instant::now();

        let mut elements = elements.to_vec();
        elements.sort();
        elements.dedup();

        let jobs: Vec<(Element, usize)> = elements
            .iter()
            .flat_map(|&e| (0..grid.points).map(move |i| (e, i)))
            .collect();

        let built: Vec<(Element, EigenSystem)> = jobs
            .into_par_iter()
            .map(|(element, i)| {
                let t = grid.temperature(i);
                let rates = model.rate_coefficients(element, t)?;
                EigenSystem::from_rates(element, t, &rates).map(|sys| (element, sys))
            })
            .collect::<RatesResult<_>>()?;

        let mut systems: BTreeMap<Element, Vec<EigenSystem>> = BTreeMap::new();
        for (element, sys) in built {
            systems
                .entry(element)
                .or_insert_with(|| Vec::with_capacity(grid.points))
                .push(sys);
        }

        info!(
            model = model.name(),
            elements = elements.len(),
            points = grid.points,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "eigen table built"
        );

        Ok(Self {
            grid,
            model: model.name().to_string(),
            systems,
        })
    }

    pub fn grid(&self) -> &TemperatureGrid {
        &self.grid
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.systems.keys().copied()
    }
}

impl RateTableProvider for EigenTable {
    fn eigen_system(&self, element: Element, temperature_k: f64) -> RatesResult<&EigenSystem> {
        let systems = self
            .systems
            .get(&element)
            .ok_or(RatesError::UnsupportedElement { element })?;
        let i = self.grid.nearest_index(temperature_k)?;
        systems
            .get(i)
            .ok_or(RatesError::UnsupportedElement { element })
    }
}
