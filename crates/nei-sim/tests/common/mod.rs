//! Common utilities for integration tests

pub mod mock_providers;
pub mod test_helpers;

pub use mock_providers::{CountingProvider, TwoLevelHydrogen};
pub use test_helpers::{assert_conserved, el, recomputed_electron_density, table};
