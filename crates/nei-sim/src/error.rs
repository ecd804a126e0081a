//! Error types for NEI simulations.

use nei_atomic::AtomicError;
use nei_core::{CoreError, Element};
use nei_rates::RatesError;
use thiserror::Error;

/// Errors raised while configuring or running an NEI simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Rejected configuration; `inputs` echoes every supplied parameter.
    #[error("Unable to configure NEI simulation: {what}\n{inputs}")]
    Configuration { what: String, inputs: String },

    /// Input evaluated outside its valid domain.
    #[error("Domain error: {what}")]
    Domain { what: String },

    /// Failure inside the stepping loop. Columns committed before `step` stay valid.
    #[error("Simulation failed at step {step}{}: {source}", for_element(.element))]
    Run {
        step: usize,
        element: Option<Element>,
        source: Box<SimError>,
    },

    #[error("Not implemented: {what}")]
    Unimplemented { what: &'static str },

    #[error("Simulation state is full ({capacity} columns)")]
    CapacityExceeded { capacity: usize },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Rate table error: {0}")]
    Rates(#[from] RatesError),

    #[error("Atomic data error: {0}")]
    Atomic(#[from] AtomicError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type SimResult<T> = Result<T, SimError>;

fn for_element(element: &Option<Element>) -> String {
    element.map(|e| format!(" for {e}")).unwrap_or_default()
}

impl SimError {
    pub fn run(step: usize, element: Option<Element>, cause: SimError) -> Self {
        SimError::Run {
            step,
            element,
            source: Box::new(cause),
        }
    }

    pub fn domain(what: impl Into<String>) -> Self {
        SimError::Domain { what: what.into() }
    }
}
