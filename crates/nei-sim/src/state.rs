//! Time-series record of a simulation run.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DMatrixView};
use nei_core::Element;

use crate::error::{SimError, SimResult};

/// Per-element storage: one column per committed time index.
#[derive(Debug, Clone)]
pub struct ElementSeries {
    pub abundance: f64,
    /// `nstates × capacity`
    ionic_fractions: DMatrix<f64>,
    /// `nstates × capacity`, cm⁻³
    number_densities: DMatrix<f64>,
    /// cm⁻³
    elemental_density: Vec<f64>,
}

impl ElementSeries {
    fn new(nstates: usize, capacity: usize, abundance: f64) -> Self {
        Self {
            abundance,
            ionic_fractions: DMatrix::from_element(nstates, capacity, f64::NAN),
            number_densities: DMatrix::from_element(nstates, capacity, f64::NAN),
            elemental_density: vec![f64::NAN; capacity],
        }
    }

    pub fn nstates(&self) -> usize {
        self.ionic_fractions.nrows()
    }
}

/// One column of a [`SimulationState`].
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub index: usize,
    pub time: f64,
    pub electron_temperature: f64,
    pub electron_density: f64,
    pub ionic_fractions: BTreeMap<Element, Vec<f64>>,
    pub number_densities: BTreeMap<Element, Vec<f64>>,
    pub elemental_density: BTreeMap<Element, f64>,
}

/// Fixed-capacity record of times, temperatures, densities and ionic fractions.
///
/// Storage is allocated up front and filled with NaN. Column 0 is written at
/// construction and each [`SimulationState::append`] fills the next column.
/// Densities are always derived from the fractions being stored.
#[derive(Debug, Clone)]
pub struct SimulationState {
    elements: Vec<Element>,
    series: BTreeMap<Element, ElementSeries>,
    time: Vec<f64>,
    electron_temperature: Vec<f64>,
    electron_density: Vec<f64>,
    index: usize,
    capacity: usize,
}

impl SimulationState {
    /// Allocate room for `max_steps + 1` columns and seed column 0.
    pub fn new(
        initial: &BTreeMap<Element, Vec<f64>>,
        abundances: &BTreeMap<Element, f64>,
        max_steps: usize,
        time_start: f64,
        electron_temperature: f64,
        density_scale: f64,
    ) -> SimResult<Self> {
        if initial.is_empty() {
            return Err(SimError::InvalidArg {
                what: "no elements to record",
            });
        }
        let capacity = max_steps
            .checked_add(1)
            .ok_or(SimError::InvalidArg {
                what: "max_steps too large",
            })?;

        let mut series = BTreeMap::new();
        for &element in initial.keys() {
            let abundance = abundances.get(&element).copied().ok_or(SimError::InvalidArg {
                what: "missing abundance for recorded element",
            })?;
            series.insert(element, ElementSeries::new(element.nstates(), capacity, abundance));
        }

        let mut state = Self {
            elements: initial.keys().copied().collect(),
            series,
            time: vec![f64::NAN; capacity],
            electron_temperature: vec![f64::NAN; capacity],
            electron_density: vec![f64::NAN; capacity],
            index: 0,
            capacity,
        };
        state.append(time_start, initial, electron_temperature, density_scale)?;
        Ok(state)
    }

    /// Commit one column.
    ///
    /// Number densities are `fraction × density_scale × abundance`; the electron
    /// density is the charge-weighted sum over every element and state. Nothing is
    /// written unless all inputs are valid.
    pub fn append(
        &mut self,
        time: f64,
        fractions: &BTreeMap<Element, Vec<f64>>,
        electron_temperature: f64,
        density_scale: f64,
    ) -> SimResult<()> {
        if self.index >= self.capacity {
            return Err(SimError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        if !time.is_finite() {
            return Err(SimError::domain(format!("non-finite time {time}")));
        }
        if !electron_temperature.is_finite() || electron_temperature < 0.0 {
            return Err(SimError::domain(format!(
                "electron temperature must be finite and non-negative, got {electron_temperature}"
            )));
        }
        if !density_scale.is_finite() || density_scale < 0.0 {
            return Err(SimError::domain(format!(
                "density must be finite and non-negative, got {density_scale}"
            )));
        }
        if fractions.len() != self.series.len() {
            return Err(SimError::InvalidArg {
                what: "fractions must cover exactly the recorded elements",
            });
        }
        for (element, series) in &self.series {
            let f = fractions.get(element).ok_or(SimError::InvalidArg {
                what: "fractions must cover exactly the recorded elements",
            })?;
            if f.len() != series.nstates() {
                return Err(SimError::InvalidArg {
                    what: "fraction vector length differs from number of charge states",
                });
            }
            if f.iter().any(|x| !x.is_finite()) {
                return Err(SimError::domain(format!("non-finite ionic fraction for {element}")));
            }
        }

        let col = self.index;
        let mut electron_density = 0.0;
        for (element, series) in self.series.iter_mut() {
            let f = &fractions[element];
            let n_elem = density_scale * series.abundance;
            series.elemental_density[col] = n_elem;
            for (i, &fi) in f.iter().enumerate() {
                let n_ion = fi * n_elem;
                series.ionic_fractions[(i, col)] = fi;
                series.number_densities[(i, col)] = n_ion;
                electron_density += i as f64 * n_ion;
            }
        }
        self.time[col] = time;
        self.electron_temperature[col] = electron_temperature;
        self.electron_density[col] = electron_density;
        self.index += 1;
        Ok(())
    }

    /// Number of committed columns.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_steps(&self) -> usize {
        self.capacity - 1
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, element: Element) -> Option<&ElementSeries> {
        self.series.get(&element)
    }

    /// Committed times in seconds.
    pub fn time(&self) -> &[f64] {
        &self.time[..self.index]
    }

    /// Committed electron temperatures in K.
    pub fn electron_temperature(&self) -> &[f64] {
        &self.electron_temperature[..self.index]
    }

    /// Committed electron densities in cm⁻³.
    pub fn electron_density(&self) -> &[f64] {
        &self.electron_density[..self.index]
    }

    /// Committed ionic fractions (`nstates × index`).
    pub fn ionic_fractions(&self, element: Element) -> Option<DMatrixView<'_, f64>> {
        let s = self.series.get(&element)?;
        Some(s.ionic_fractions.columns(0, self.index))
    }

    /// Committed ionic number densities (`nstates × index`), cm⁻³.
    pub fn number_densities(&self, element: Element) -> Option<DMatrixView<'_, f64>> {
        let s = self.series.get(&element)?;
        Some(s.number_densities.columns(0, self.index))
    }

    /// Committed elemental number densities, cm⁻³.
    pub fn elemental_density(&self, element: Element) -> Option<&[f64]> {
        let s = self.series.get(&element)?;
        Some(&s.elemental_density[..self.index])
    }

    /// Fractions of one element at a committed column.
    pub fn fractions_at(&self, element: Element, index: usize) -> Option<Vec<f64>> {
        if index >= self.index {
            return None;
        }
        let s = self.series.get(&element)?;
        Some(s.ionic_fractions.column(index).iter().copied().collect())
    }

    /// Every quantity at a committed column.
    pub fn snapshot(&self, index: usize) -> Option<Snapshot> {
        if index >= self.index {
            return None;
        }
        let mut ionic_fractions = BTreeMap::new();
        let mut number_densities = BTreeMap::new();
        let mut elemental_density = BTreeMap::new();
        for (element, s) in &self.series {
            ionic_fractions.insert(
                *element,
                s.ionic_fractions.column(index).iter().copied().collect(),
            );
            number_densities.insert(
                *element,
                s.number_densities.column(index).iter().copied().collect(),
            );
            elemental_density.insert(*element, s.elemental_density[index]);
        }
        Some(Snapshot {
            index,
            time: self.time[index],
            electron_temperature: self.electron_temperature[index],
            electron_density: self.electron_density[index],
            ionic_fractions,
            number_densities,
            elemental_density,
        })
    }

    /// The last committed column.
    pub fn last(&self) -> Option<Snapshot> {
        self.index.checked_sub(1).and_then(|i| self.snapshot(i))
    }
}
