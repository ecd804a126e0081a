//! Error types for rate tables.

use nei_core::{CoreError, Element};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RatesError {
    #[error("Invalid temperature grid: {what}")]
    InvalidGrid { what: &'static str },

    #[error("Temperature {temperature_k} K outside table range [{min_k}, {max_k}] K")]
    TemperatureOutOfRange {
        temperature_k: f64,
        min_k: f64,
        max_k: f64,
    },

    #[error("No rate data for element {element}")]
    UnsupportedElement { element: Element },

    #[error("Numeric error for {element} at {temperature_k} K: {what}")]
    Numeric {
        element: Element,
        temperature_k: f64,
        what: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type RatesResult<T> = Result<T, RatesError>;
