//! Atomic data and initial ionization states for NEI simulations.
//!
//! This crate provides:
//! - Elemental abundance sets (explicit values or named presets)
//! - Validated initial ionic fractions per element (`IonizationStates`)

pub mod abundance;
pub mod error;
pub mod ionization;

pub use abundance::{AbundancePreset, AbundanceSpec, Abundances};
pub use error::{AtomicError, AtomicResult};
pub use ionization::{IonicInputs, IonizationStates, NORMALIZATION_TOL, normalize_fractions};
