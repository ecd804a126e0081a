use crate::CoreError;

/// Absolute and relative tolerance for comparing two floats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

impl Tolerances {
    pub const fn absolute(abs: f64) -> Self {
        Self { abs, rel: 0.0 }
    }

    /// A few ulps relative to the larger magnitude.
    pub const fn ulps(n: u32) -> Self {
        Self {
            abs: 0.0,
            rel: n as f64 * f64::EPSILON,
        }
    }
}

/// `|a - b|` within `tol.abs`, or within `tol.rel` of the larger magnitude.
pub fn nearly_equal(a: f64, b: f64, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Finite and `>= 0`.
pub fn ensure_non_negative(v: f64, what: &'static str) -> Result<f64, CoreError> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(CoreError::Negative { what, value: v });
    }
    Ok(v)
}

/// True when every element is finite and larger than its predecessor.
pub fn is_strictly_increasing(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite()) && values.windows(2).all(|w| w[1] > w[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ulps_absorb_accumulated_rounding() {
        let summed = 0.1 + 0.1 + 0.1;
        assert_ne!(summed, 0.3);
        assert!(nearly_equal(summed, 0.3, Tolerances::ulps(4)));
        assert!(!nearly_equal(0.3 + 1e-12, 0.3, Tolerances::ulps(4)));
        assert!(nearly_equal(1.0 + 5e-7, 1.0, Tolerances::absolute(1e-6)));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(f64::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_non_negative_rejects_negative() {
        assert!(ensure_non_negative(0.0, "zero").is_ok());
        assert_eq!(
            ensure_non_negative(-1e-300, "tiny"),
            Err(CoreError::Negative {
                what: "tiny",
                value: -1e-300
            })
        );
        assert!(ensure_non_negative(f64::INFINITY, "inf").is_err());
    }

    #[test]
    fn strictly_increasing() {
        assert!(is_strictly_increasing(&[0.0, 1.0, 2.5]));
        assert!(is_strictly_increasing(&[3.0]));
        assert!(!is_strictly_increasing(&[0.0, 1.0, 1.0]));
        assert!(!is_strictly_increasing(&[0.0, 2.0, 1.0]));
        assert!(!is_strictly_increasing(&[0.0, f64::NAN]));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn nearly_equal_is_symmetric(a in -1e6_f64..1e6, b in -1e6_f64..1e6) {
            let tol = Tolerances { abs: 1e-12, rel: 1e-9 };
            prop_assert_eq!(nearly_equal(a, b, tol), nearly_equal(b, a, tol));
        }

        #[test]
        fn sorted_distinct_grid_is_increasing(mut xs in prop::collection::vec(-1e9_f64..1e9, 1..32)) {
            xs.sort_by(|a, b| a.total_cmp(b));
            xs.dedup();
            prop_assert!(is_strictly_increasing(&xs));
        }
    }
}
