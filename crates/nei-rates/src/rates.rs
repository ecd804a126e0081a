//! Rate coefficient models.

use nalgebra::DMatrix;
use nei_core::units::constants::{KELVIN_PER_EV, RYDBERG_EV};
use nei_core::{CoreError, Element, ensure_finite};

use crate::error::RatesResult;

/// Ionization and recombination rate coefficients of one element at one temperature.
///
/// Both vectors have length `Z`. Entry `z` of `ln_ionization` is the log of the
/// rate (cm³ s⁻¹) for `z -> z + 1`; entry `z` of `ln_recombination` is the log of
/// the rate for `z + 1 -> z`. Logs keep strongly suppressed rates representable.
#[derive(Debug, Clone, PartialEq)]
pub struct RateCoefficients {
    pub ln_ionization: Vec<f64>,
    pub ln_recombination: Vec<f64>,
}

impl RateCoefficients {
    /// Number of charge states coupled by these rates.
    pub fn nstates(&self) -> usize {
        self.ln_ionization.len() + 1
    }

    pub fn ionization(&self) -> Vec<f64> {
        self.ln_ionization.iter().map(|l| l.exp()).collect()
    }

    pub fn recombination(&self) -> Vec<f64> {
        self.ln_recombination.iter().map(|l| l.exp()).collect()
    }

    /// Rate generator acting on row vectors: `df/dt = n_e f A`.
    ///
    /// Off-diagonals hold the transition rates, each row sums to zero.
    pub fn generator(&self) -> DMatrix<f64> {
        let n = self.nstates();
        let ion = self.ionization();
        let rec = self.recombination();
        let mut a = DMatrix::zeros(n, n);
        for z in 0..n - 1 {
            a[(z, z + 1)] = ion[z];
            a[(z + 1, z)] = rec[z];
            a[(z, z)] -= ion[z];
            a[(z + 1, z + 1)] -= rec[z];
        }
        a
    }
}

/// Source of rate coefficients for the table builder.
pub trait RateModel: Send + Sync {
    fn name(&self) -> &str;

    fn rate_coefficients(&self, element: Element, temperature_k: f64)
    -> RatesResult<RateCoefficients>;
}

/// `ln(1e10)`: largest ionization/recombination ratio kept between adjacent states.
pub const DEFAULT_LN_RATIO_LIMIT: f64 = 23.025_850_929_940_457;

/// Approximate rates from hydrogen-like scaling.
///
/// Ionization follows a Seaton-type expression with the potential of a hydrogenic
/// ion in the outer shell, radiative recombination a `T^-0.7` power law. Good
/// enough for qualitative charge-state evolution, not for spectroscopy.
///
/// The ratio of ionization to recombination between neighbouring states is limited
/// to `exp(±ln_ratio_limit)` by raising the smaller rate, which bounds the spread
/// of the equilibrium populations and keeps the decomposition well conditioned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledHydrogenic {
    pub ln_ratio_limit: f64,
}

impl Default for ScaledHydrogenic {
    fn default() -> Self {
        Self {
            ln_ratio_limit: DEFAULT_LN_RATIO_LIMIT,
        }
    }
}

impl ScaledHydrogenic {
    pub const NAME: &'static str = "scaled-hydrogenic";

    /// Principal quantum number of the outermost occupied shell.
    fn outer_shell(bound_electrons: u32) -> f64 {
        match bound_electrons {
            0..=2 => 1.0,
            3..=10 => 2.0,
            11..=28 => 3.0,
            _ => 4.0,
        }
    }

    /// Ionization potential (eV) of charge state `z`.
    pub fn ionization_potential_ev(element: Element, z: u32) -> f64 {
        let bound = u32::from(element.atomic_number()) - z;
        let q = f64::from(z + 1);
        let n = Self::outer_shell(bound);
        RYDBERG_EV * q * q / (n * n)
    }
}

impl RateModel for ScaledHydrogenic {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn rate_coefficients(
        &self,
        element: Element,
        temperature_k: f64,
    ) -> RatesResult<RateCoefficients> {
        let t = ensure_finite(temperature_k, "temperature")?;
        if t <= 0.0 {
            return Err(CoreError::InvalidArg {
                what: "temperature must be positive",
            }
            .into());
        }
        let t_ev = t / KELVIN_PER_EV;
        let limit = self.ln_ratio_limit.abs();

        let z_max = u32::from(element.atomic_number());
        let mut ln_ionization = Vec::with_capacity(z_max as usize);
        let mut ln_recombination = Vec::with_capacity(z_max as usize);

        for z in 0..z_max {
            let chi = Self::ionization_potential_ev(element, z);
            let u = chi / t_ev;
            let mut ls =
                (1e-7 * (RYDBERG_EV / chi).powf(1.5) * u.sqrt() / (0.25 + u)).ln() - u;

            let q = f64::from(z + 1);
            let mut la = (2.6e-13 * q * q).ln() - 0.7 * (t / (1e4 * q * q)).ln();

            let ratio = ls - la;
            if ratio < -limit {
                ls = la - limit;
            } else if ratio > limit {
                la = ls - limit;
            }
            ln_ionization.push(ls);
            ln_recombination.push(la);
        }

        Ok(RateCoefficients {
            ln_ionization,
            ln_recombination,
        })
    }
}
