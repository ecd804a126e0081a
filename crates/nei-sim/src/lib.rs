//! Time-dependent non-equilibrium ionization of a multi-element plasma.
//!
//! Provides:
//! - `TimeSeriesInput` for constant, tabulated or functional temperature and density
//! - `SimulationState`, the fixed-capacity record of a run
//! - `advance_element`, the eigen-decomposition time advance for one element
//! - `Nei`, the driver that ties configuration, initial state and stepping together

pub mod advance;
pub mod error;
pub mod input;
pub mod nei;
pub mod state;

pub use advance::{FRACTION_FLOOR, advance_element};
pub use error::{SimError, SimResult};
pub use input::{InputQuantity, TimeDomain, TimeSeriesInput, interpolate};
pub use nei::{Nei, NeiConfig, SAFETY_FACTOR_RANGE};
pub use state::{ElementSeries, SimulationState, Snapshot};
