//! Rate table providers for testing
//!
//! `TwoLevelHydrogen` has a closed-form solution; `CountingProvider` wraps a
//! real table and starts failing after a fixed number of lookups.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use nalgebra::{DMatrix, DVector};
use nei_core::Element;
use nei_rates::{EigenSystem, RateTableProvider, RatesError, RatesResult};

/// Hydrogen with temperature-independent ionization `s` and recombination `a`.
///
/// Generator `[[-s, s], [a, -a]]`; eigenvalues `0` and `-(s + a)`.
pub struct TwoLevelHydrogen {
    pub ionization: f64,
    pub recombination: f64,
    system: EigenSystem,
}

impl TwoLevelHydrogen {
    pub fn new(ionization: f64, recombination: f64) -> Self {
        let (s, a) = (ionization, recombination);
        let total = s + a;
        let system = EigenSystem {
            temperature_k: 0.0,
            eigenvalues: DVector::from_vec(vec![0.0, -total]),
            eigenvectors: DMatrix::from_row_slice(2, 2, &[1.0, s, 1.0, -a]),
            eigenvector_inverses: DMatrix::from_row_slice(
                2,
                2,
                &[a / total, s / total, 1.0 / total, -1.0 / total],
            ),
            equilibrium: DVector::from_vec(vec![a / total, s / total]),
        };
        Self {
            ionization,
            recombination,
            system,
        }
    }

    /// Neutral fraction after `tau = n_e dt` starting from `neutral0`.
    pub fn analytical_neutral(&self, neutral0: f64, tau: f64) -> f64 {
        let total = self.ionization + self.recombination;
        let eq = self.recombination / total;
        eq + (neutral0 - eq) * (-total * tau).exp()
    }
}

impl RateTableProvider for TwoLevelHydrogen {
    fn eigen_system(&self, element: Element, _temperature_k: f64) -> RatesResult<&EigenSystem> {
        if element != Element::HYDROGEN {
            return Err(RatesError::UnsupportedElement { element });
        }
        Ok(&self.system)
    }
}

/// Delegates to `inner` for the first `limit` lookups, then fails.
pub struct CountingProvider<P> {
    pub inner: P,
    pub limit: usize,
    calls: AtomicUsize,
}

impl<P: RateTableProvider> CountingProvider<P> {
    pub fn new(inner: P, limit: usize) -> Self {
        Self {
            inner,
            limit,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<P: RateTableProvider> RateTableProvider for CountingProvider<P> {
    fn eigen_system(&self, element: Element, temperature_k: f64) -> RatesResult<&EigenSystem> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n >= self.limit {
            return Err(RatesError::Numeric {
                element,
                temperature_k,
                what: format!("lookup {n} refused"),
            });
        }
        self.inner.eigen_system(element, temperature_k)
    }
}
