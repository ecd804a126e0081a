//! Initial ionization states for a set of elements.

use std::collections::BTreeMap;

use nei_core::{Element, Tolerances, nearly_equal};

use crate::abundance::{AbundanceSpec, Abundances};
use crate::error::{AtomicError, AtomicResult};

/// Allowed deviation of a supplied fraction vector's sum from one.
pub const NORMALIZATION_TOL: f64 = 1e-6;

/// Elements to simulate, optionally with explicit initial fractions.
#[derive(Debug, Clone, PartialEq)]
pub enum IonicInputs {
    /// Element list only; fractions are filled in later (typically equilibrium).
    Elements(Vec<Element>),
    /// Explicit initial ionic fractions for every element.
    Fractions(Vec<(Element, Vec<f64>)>),
}

impl IonicInputs {
    pub fn elements(&self) -> Vec<Element> {
        match self {
            IonicInputs::Elements(elements) => elements.clone(),
            IonicInputs::Fractions(items) => items.iter().map(|(e, _)| *e).collect(),
        }
    }
}

/// Validate one ionic-fraction vector.
///
/// The vector must have `Z + 1` finite, non-negative entries summing to one within
/// [`NORMALIZATION_TOL`]. Entries at or below `tol` are zeroed and the result is
/// rescaled to sum exactly to one.
pub fn normalize_fractions(element: Element, raw: &[f64], tol: f64) -> AtomicResult<Vec<f64>> {
    let expected = element.nstates();
    if raw.len() != expected {
        return Err(AtomicError::LengthMismatch {
            element,
            expected,
            got: raw.len(),
        });
    }

    let mut sum = 0.0;
    for &f in raw {
        if !f.is_finite() {
            return Err(AtomicError::NonPhysical {
                element,
                what: "non-finite ionic fraction",
            });
        }
        if f < 0.0 {
            return Err(AtomicError::NonPhysical {
                element,
                what: "negative ionic fraction",
            });
        }
        sum += f;
    }
    if !nearly_equal(sum, 1.0, Tolerances::absolute(NORMALIZATION_TOL)) {
        return Err(AtomicError::NotNormalized { element, sum });
    }

    let mut out: Vec<f64> = raw
        .iter()
        .map(|&f| if f <= tol { 0.0 } else { f })
        .collect();
    let kept: f64 = out.iter().sum();
    if kept <= 0.0 {
        return Err(AtomicError::NonPhysical {
            element,
            what: "all ionic fractions negligible",
        });
    }
    for f in &mut out {
        *f /= kept;
    }
    Ok(out)
}

/// Validated elements, abundances and (possibly pending) initial ionic fractions.
#[derive(Debug, Clone, PartialEq)]
pub struct IonizationStates {
    elements: Vec<Element>,
    abundances: Abundances,
    fractions: BTreeMap<Element, Vec<f64>>,
    explicit: bool,
    tol: f64,
}

impl IonizationStates {
    /// Build from inputs and an abundance spec.
    ///
    /// Elements are kept in atomic-number order. With [`IonicInputs::Elements`] no
    /// fractions are known yet; see [`IonizationStates::set_ionic_fractions`].
    pub fn new(inputs: IonicInputs, abundances: &AbundanceSpec, tol: f64) -> AtomicResult<Self> {
        if !tol.is_finite() || tol < 0.0 {
            return Err(AtomicError::InvalidArg {
                what: "tolerance must be finite and non-negative",
            });
        }

        let mut elements = inputs.elements();
        if elements.is_empty() {
            return Err(AtomicError::InvalidArg {
                what: "no elements given",
            });
        }
        elements.sort();
        if let Some(w) = elements.windows(2).find(|w| w[0] == w[1]) {
            return Err(AtomicError::DuplicateElement { element: w[0] });
        }

        let abundances = Abundances::resolve(abundances, &elements)?;

        let (fractions, explicit) = match inputs {
            IonicInputs::Elements(_) => (BTreeMap::new(), false),
            IonicInputs::Fractions(items) => {
                let mut map = BTreeMap::new();
                for (element, raw) in items {
                    map.insert(element, normalize_fractions(element, &raw, tol)?);
                }
                (map, true)
            }
        };

        Ok(Self {
            elements,
            abundances,
            fractions,
            explicit,
            tol,
        })
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn contains(&self, element: Element) -> bool {
        self.elements.binary_search(&element).is_ok()
    }

    pub fn abundances(&self) -> &Abundances {
        &self.abundances
    }

    pub fn abundance(&self, element: Element) -> AtomicResult<f64> {
        self.abundances
            .get(element)
            .ok_or(AtomicError::UnknownElement { element })
    }

    /// Initial fractions of an element, `None` until known.
    pub fn ionic_fractions(&self, element: Element) -> Option<&[f64]> {
        self.fractions.get(&element).map(Vec::as_slice)
    }

    /// True when the fractions were supplied by the caller rather than derived.
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    /// True once every element has fractions.
    pub fn is_complete(&self) -> bool {
        self.elements.iter().all(|e| self.fractions.contains_key(e))
    }

    pub fn tol(&self) -> f64 {
        self.tol
    }

    pub fn set_ionic_fractions(&mut self, element: Element, raw: &[f64]) -> AtomicResult<()> {
        if !self.contains(element) {
            return Err(AtomicError::UnknownElement { element });
        }
        let normalized = normalize_fractions(element, raw, self.tol)?;
        self.fractions.insert(element, normalized);
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalized_fractions_sum_to_one(raw in prop::collection::vec(0.0_f64..1.0, 9)) {
            let oxygen = Element::from_atomic_number(8).unwrap();
            let sum: f64 = raw.iter().sum();
            prop_assume!(sum > 1e-3);
            let scaled: Vec<f64> = raw.iter().map(|f| f / sum).collect();

            let out = normalize_fractions(oxygen, &scaled, 1e-15).unwrap();
            let total: f64 = out.iter().sum();
            prop_assert!((total - 1.0).abs() < 1e-12);
            prop_assert!(out.iter().all(|f| *f >= 0.0));
        }
    }
}
