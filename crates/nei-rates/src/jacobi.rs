//! Cyclic Jacobi eigensolver for small symmetric matrices.
//!
//! The symmetrized rate generators are strongly graded: couplings between rarely
//! populated charge states can sit twenty orders of magnitude below the largest
//! entry, and the propagator rescales eigenvector components by the inverse square
//! root of the equilibrium populations. Rotations are applied until every
//! off-diagonal entry underflows, so small components keep their relative accuracy.

use nalgebra::{DMatrix, DVector};

/// Off-diagonal magnitude treated as converged.
const TINY: f64 = 1e-300;

/// Beyond this `|θ|`, `θ²` would overflow.
const THETA_MAX: f64 = 1e150;

/// Decompose a symmetric matrix as `Q diag(λ) Qᵀ`.
///
/// Returns `(λ, Q)` with eigenvectors in the columns of `Q`, or `None` when the
/// sweeps do not converge. `a` must be symmetric.
pub fn symmetric_eigen(
    mut a: DMatrix<f64>,
    max_sweeps: usize,
) -> Option<(DVector<f64>, DMatrix<f64>)> {
    let n = a.nrows();
    if n != a.ncols() {
        return None;
    }
    let mut q = DMatrix::identity(n, n);

    for _ in 0..max_sweeps {
        let converged = (0..n).all(|p| (p + 1..n).all(|r| a[(p, r)].abs() < TINY));
        if converged {
            return Some((a.diagonal(), q));
        }

        for p in 0..n {
            for r in p + 1..n {
                let apr = a[(p, r)];
                if apr.abs() < TINY {
                    continue;
                }
                let theta = (a[(r, r)] - a[(p, p)]) / (2.0 * apr);
                let t = if theta.abs() > THETA_MAX {
                    0.5 / theta
                } else {
                    theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt())
                };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    if k == p || k == r {
                        continue;
                    }
                    let akp = a[(k, p)];
                    let akr = a[(k, r)];
                    let new_kp = c * akp - s * akr;
                    let new_kr = s * akp + c * akr;
                    a[(k, p)] = new_kp;
                    a[(p, k)] = new_kp;
                    a[(k, r)] = new_kr;
                    a[(r, k)] = new_kr;
                }
                a[(p, p)] -= t * apr;
                a[(r, r)] += t * apr;
                a[(p, r)] = 0.0;
                a[(r, p)] = 0.0;

                for k in 0..n {
                    let qkp = q[(k, p)];
                    let qkr = q[(k, r)];
                    q[(k, p)] = c * qkp - s * qkr;
                    q[(k, r)] = s * qkp + c * qkr;
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_by_two() {
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        let (vals, vecs) = symmetric_eigen(a.clone(), 50).unwrap();
        let mut sorted: Vec<f64> = vals.iter().copied().collect();
        sorted.sort_by(|x, y| x.total_cmp(y));
        assert!((sorted[0] - 1.0).abs() < 1e-14);
        assert!((sorted[1] - 3.0).abs() < 1e-14);

        let rebuilt = &vecs * DMatrix::from_diagonal(&vals) * vecs.transpose();
        assert!((rebuilt - a).abs().max() < 1e-14);
    }

    #[test]
    fn orthonormal_vectors() {
        let a = DMatrix::from_row_slice(
            4,
            4,
            &[
                4.0, 1.0, 0.0, 0.0, //
                1.0, 3.0, 0.5, 0.0, //
                0.0, 0.5, -2.0, 1e-9, //
                0.0, 0.0, 1e-9, -7.0,
            ],
        );
        let (_, q) = symmetric_eigen(a, 50).unwrap();
        let id = q.transpose() * &q;
        assert!((id - DMatrix::<f64>::identity(4, 4)).abs().max() < 1e-14);
    }

    #[test]
    fn diagonal_is_immediate() {
        let a = DMatrix::from_diagonal(&DVector::from_vec(vec![-1.0, -2.0, 0.0]));
        let (vals, q) = symmetric_eigen(a, 1).unwrap();
        assert_eq!(vals.as_slice(), &[-1.0, -2.0, 0.0]);
        assert_eq!(q, DMatrix::identity(3, 3));
    }

    #[test]
    fn non_square_rejected() {
        assert!(symmetric_eigen(DMatrix::zeros(2, 3), 10).is_none());
    }
}
