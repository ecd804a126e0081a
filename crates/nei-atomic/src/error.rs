//! Atomic data errors.

use nei_core::{CoreError, Element};
use thiserror::Error;

/// Result type for atomic data operations.
pub type AtomicResult<T> = Result<T, AtomicError>;

/// Errors raised while validating elements, abundances and ionic fractions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AtomicError {
    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Non-physical values (negative or non-finite fractions, abundances).
    #[error("Non-physical value for {element}: {what}")]
    NonPhysical { element: Element, what: &'static str },

    /// Fraction vector length does not match the number of charge states.
    #[error("Ionic fractions for {element} have length {got}, expected {expected}")]
    LengthMismatch {
        element: Element,
        expected: usize,
        got: usize,
    },

    /// Fractions do not sum to one.
    #[error("Ionic fractions for {element} sum to {sum}, expected 1")]
    NotNormalized { element: Element, sum: f64 },

    #[error("Element {element} given more than once")]
    DuplicateElement { element: Element },

    #[error("No abundance available for {element}")]
    MissingAbundance { element: Element },

    #[error("Unknown abundance preset: {name}")]
    UnknownPreset { name: String },

    #[error("Element {element} is not part of this set")]
    UnknownElement { element: Element },

    #[error(transparent)]
    Core(#[from] CoreError),
}
