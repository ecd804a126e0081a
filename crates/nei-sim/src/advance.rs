//! Single-element time advance.

use nalgebra::RowDVector;
use nei_core::Element;
use nei_rates::RateTableProvider;

use crate::error::{SimError, SimResult};

/// Fractions at or below this magnitude are stored as exactly zero.
pub const FRACTION_FLOOR: f64 = 1e-15;

/// Advance one element's ionic fractions by `dt` seconds.
///
/// With the decomposition `A = V diag(λ) V⁻¹` at `electron_temperature` (K), the
/// new row vector is `f0 · V · diag(exp(λ dt n_e)) · V⁻¹`. Entries with magnitude
/// at or below [`FRACTION_FLOOR`] are set to zero; with `renormalize` the result is
/// then rescaled to sum to one.
pub fn advance_element(
    provider: &dyn RateTableProvider,
    element: Element,
    f0: &[f64],
    electron_temperature: f64,
    electron_density: f64,
    dt: f64,
    renormalize: bool,
) -> SimResult<Vec<f64>> {
    let sys = provider.eigen_system(element, electron_temperature)?;
    let n = sys.nstates();
    if f0.len() != n {
        return Err(SimError::domain(format!(
            "{element} has {} fractions but the rate table has {n} states",
            f0.len()
        )));
    }

    let decay = sys.eigenvalues.map(|l| (l * dt * electron_density).exp());
    let mut f = RowDVector::from_row_slice(f0) * &sys.eigenvectors;
    for (fk, dk) in f.iter_mut().zip(decay.iter()) {
        *fk *= dk;
    }
    let f1 = f * &sys.eigenvector_inverses;

    let mut out: Vec<f64> = f1
        .iter()
        .map(|&x| if x.abs() <= FRACTION_FLOOR { 0.0 } else { x })
        .collect();

    if out.iter().any(|x| !x.is_finite()) {
        return Err(SimError::domain(format!(
            "non-finite ionic fraction for {element} at {electron_temperature} K"
        )));
    }

    if renormalize {
        let sum: f64 = out.iter().sum();
        if sum > 0.0 {
            for x in &mut out {
                *x /= sum;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nei_rates::{EigenTable, ScaledHydrogenic, TemperatureGrid};

    fn oxygen() -> Element {
        Element::from_symbol("O").unwrap()
    }

    fn table() -> EigenTable {
        let grid = TemperatureGrid {
            log_t_min: 4.0,
            log_t_max: 7.0,
            points: 31,
        };
        EigenTable::build(&ScaledHydrogenic::default(), &[oxygen()], grid).unwrap()
    }

    #[test]
    fn zero_step_is_identity() {
        let table = table();
        let f0 = vec![0.1, 0.2, 0.3, 0.4, 0.0, 0.0, 0.0, 0.0, 0.0];
        let f1 = advance_element(&table, oxygen(), &f0, 1e6, 1e9, 0.0, false).unwrap();
        for (a, b) in f0.iter().zip(&f1) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn small_values_are_floored() {
        let table = table();
        let mut f0 = vec![0.0; 9];
        f0[6] = 1.0;
        let f1 = advance_element(&table, oxygen(), &f0, 1e6, 1e8, 1.0, false).unwrap();
        assert!(f1.iter().all(|x| *x == 0.0 || x.abs() > FRACTION_FLOOR));
        // neutral oxygen cannot be reached from O VII in one second
        assert_eq!(f1[0], 0.0);
    }

    #[test]
    fn renormalize_sums_to_one() {
        let table = table();
        let f0 = vec![0.0, 0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0];
        let f1 = advance_element(&table, oxygen(), &f0, 2e6, 1e9, 1e4, true).unwrap();
        let sum: f64 = f1.iter().sum();
        assert!((sum - 1.0).abs() < 1e-14);
    }

    #[test]
    fn wrong_length_rejected() {
        let table = table();
        let err = advance_element(&table, oxygen(), &[1.0, 0.0], 1e6, 1e9, 1.0, false);
        assert!(matches!(err, Err(SimError::Domain { .. })));
    }

    #[test]
    fn out_of_table_temperature() {
        let table = table();
        let f0 = vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let err = advance_element(&table, oxygen(), &f0, 1e8, 1e9, 1.0, false);
        assert!(matches!(err, Err(SimError::Rates(_))));
    }
}
