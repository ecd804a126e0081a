//! nei-core: stable foundation for the NEI workspace.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (tolerances + float helpers)
//! - element (compact chemical element identifier)
//! - error (shared error types)

pub mod element;
pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use element::Element;
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
