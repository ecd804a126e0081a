//! Ionization/recombination rate tables for NEI simulations.
//!
//! The time advance never touches rate coefficients directly. It asks a
//! [`RateTableProvider`] for the eigen-decomposition of an element's rate generator
//! at a temperature. [`EigenTable`] is the provider shipped here: it tabulates
//! decompositions on a log-spaced temperature grid from any [`RateModel`].

pub mod eigen;
pub mod error;
pub mod jacobi;
pub mod rates;
pub mod table;

pub use eigen::{EigenSystem, RateTableProvider};
pub use error::{RatesError, RatesResult};
pub use rates::{RateCoefficients, RateModel, ScaledHydrogenic};
pub use table::{EigenTable, TemperatureGrid};
