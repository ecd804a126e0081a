//! Eigen-decomposition of an element's rate generator.

use nalgebra::{DMatrix, DVector};
use nei_core::Element;

use crate::error::{RatesError, RatesResult};
use crate::jacobi::symmetric_eigen;
use crate::rates::RateCoefficients;

const MAX_SWEEPS: usize = 100;

/// Decomposition `A = V diag(λ) V⁻¹` of a rate generator at one temperature.
///
/// `A` acts on row vectors (`df/dt = n_e f A`), so a state advanced by `τ = n_e dt`
/// is `f V diag(exp(λ τ)) V⁻¹`. Eigenvalues are in cm³ s⁻¹ and non-positive; the one
/// belonging to the equilibrium is exactly zero.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenSystem {
    pub temperature_k: f64,
    pub eigenvalues: DVector<f64>,
    pub eigenvectors: DMatrix<f64>,
    pub eigenvector_inverses: DMatrix<f64>,
    pub equilibrium: DVector<f64>,
}

impl EigenSystem {
    /// Decompose the generator built from `rates`.
    ///
    /// Detailed balance (`π_z S_z = π_{z+1} α_z`) makes the tridiagonal generator
    /// similar to a symmetric matrix `B = Π^½ A Π^-½`. With `B = Q Λ Qᵀ` this gives
    /// `V = Π^-½ Q` and `V⁻¹ = Qᵀ Π^½` without a matrix inversion.
    pub fn from_rates(
        element: Element,
        temperature_k: f64,
        rates: &RateCoefficients,
    ) -> RatesResult<Self> {
        let n = rates.nstates();
        let numeric = |what: &str| RatesError::Numeric {
            element,
            temperature_k,
            what: what.to_string(),
        };
        if n != element.nstates() || rates.ln_recombination.len() != n - 1 {
            return Err(numeric("rate vectors do not match the number of charge states"));
        }
        if rates
            .ln_ionization
            .iter()
            .chain(&rates.ln_recombination)
            .any(|l| !l.is_finite())
        {
            return Err(numeric("non-finite log rate"));
        }

        // log equilibrium populations, largest shifted to zero
        let mut ln_pi = Vec::with_capacity(n);
        ln_pi.push(0.0);
        for z in 0..n - 1 {
            ln_pi.push(ln_pi[z] + rates.ln_ionization[z] - rates.ln_recombination[z]);
        }
        let ln_max = ln_pi.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for l in &mut ln_pi {
            *l -= ln_max;
        }

        let generator = rates.generator();
        let mut b = DMatrix::zeros(n, n);
        for z in 0..n {
            b[(z, z)] = generator[(z, z)];
        }
        for z in 0..n - 1 {
            let coupling = (0.5 * (rates.ln_ionization[z] + rates.ln_recombination[z])).exp();
            b[(z, z + 1)] = coupling;
            b[(z + 1, z)] = coupling;
        }

        let (mut eigenvalues, q) = symmetric_eigen(b, MAX_SWEEPS)
            .ok_or_else(|| numeric("Jacobi sweeps did not converge"))?;

        let stationary = eigenvalues.imax();
        eigenvalues[stationary] = 0.0;

        let scale: Vec<f64> = ln_pi.iter().map(|l| (-0.5 * l).exp()).collect();
        let mut eigenvectors = DMatrix::zeros(n, n);
        let mut eigenvector_inverses = DMatrix::zeros(n, n);
        for i in 0..n {
            for k in 0..n {
                eigenvectors[(i, k)] = scale[i] * q[(i, k)];
                eigenvector_inverses[(k, i)] = q[(i, k)] / scale[i];
            }
        }
        if eigenvectors.iter().any(|x| !x.is_finite())
            || eigenvector_inverses.iter().any(|x| !x.is_finite())
        {
            return Err(numeric("eigenvectors overflow"));
        }

        let pi = DVector::from_iterator(n, ln_pi.iter().map(|l| l.exp()));
        let equilibrium = &pi / pi.sum();

        Ok(Self {
            temperature_k,
            eigenvalues,
            eigenvectors,
            eigenvector_inverses,
            equilibrium,
        })
    }

    pub fn nstates(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Transition matrix `V diag(exp(λ τ)) V⁻¹` for `τ = n_e dt` (cm⁻³ s).
    pub fn propagator(&self, tau: f64) -> DMatrix<f64> {
        let decay = self.eigenvalues.map(|l| (l * tau).exp());
        &self.eigenvectors * DMatrix::from_diagonal(&decay) * &self.eigenvector_inverses
    }

    /// Reassembled generator `V diag(λ) V⁻¹`.
    pub fn generator(&self) -> DMatrix<f64> {
        &self.eigenvectors
            * DMatrix::from_diagonal(&self.eigenvalues)
            * &self.eigenvector_inverses
    }
}

/// Read-only source of eigen-decompositions, shared across simulations.
pub trait RateTableProvider: Send + Sync {
    /// All four quantities for `element` at `temperature_k`.
    fn eigen_system(&self, element: Element, temperature_k: f64) -> RatesResult<&EigenSystem>;

    fn eigenvalues(&self, element: Element, temperature_k: f64) -> RatesResult<&DVector<f64>> {
        Ok(&self.eigen_system(element, temperature_k)?.eigenvalues)
    }

    fn eigenvectors(&self, element: Element, temperature_k: f64) -> RatesResult<&DMatrix<f64>> {
        Ok(&self.eigen_system(element, temperature_k)?.eigenvectors)
    }

    fn eigenvector_inverses(
        &self,
        element: Element,
        temperature_k: f64,
    ) -> RatesResult<&DMatrix<f64>> {
        Ok(&self.eigen_system(element, temperature_k)?.eigenvector_inverses)
    }

    fn equilibrium_state(&self, element: Element, temperature_k: f64) -> RatesResult<&DVector<f64>> {
        Ok(&self.eigen_system(element, temperature_k)?.equilibrium)
    }
}
