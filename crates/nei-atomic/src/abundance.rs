//! Elemental abundances relative to hydrogen.

use std::collections::BTreeMap;

use nei_core::Element;

use crate::error::{AtomicError, AtomicResult};

/// Named abundance sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AbundancePreset {
    /// Photospheric solar abundances (Asplund et al. 2009).
    #[default]
    Solar,
}

impl AbundancePreset {
    pub const ALL: [AbundancePreset; 1] = [AbundancePreset::Solar];

    pub fn name(&self) -> &'static str {
        match self {
            AbundancePreset::Solar => "solar",
        }
    }

    pub fn from_name(name: &str) -> AtomicResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| AtomicError::UnknownPreset {
                name: name.to_string(),
            })
    }

    /// log10 abundance on the astronomical scale where hydrogen is 12.
    pub fn log_abundance(&self, element: Element) -> Option<f64> {
        match self {
            AbundancePreset::Solar => {
                SOLAR_LOG_EPS.get(usize::from(element.atomic_number()) - 1).copied()
            }
        }
    }

    /// Abundance relative to hydrogen (`n_X / n_H`).
    pub fn abundance(&self, element: Element) -> Option<f64> {
        self.log_abundance(element).map(|x| 10f64.powf(x - 12.0))
    }
}

const SOLAR_LOG_EPS: [f64; 30] = [
    12.00, 10.93, 1.05, 1.38, 2.70, 8.43, 7.83, 8.69, 4.56, 7.93, 6.24, 7.60, 6.45, 7.51, 5.41,
    7.12, 5.50, 6.40, 5.03, 6.34, 3.15, 4.95, 3.93, 5.64, 5.43, 7.50, 4.99, 6.22, 4.19, 4.56,
];

/// How abundances are supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum AbundanceSpec {
    Explicit(Vec<(Element, f64)>),
    Preset(AbundancePreset),
}

impl Default for AbundanceSpec {
    fn default() -> Self {
        AbundanceSpec::Preset(AbundancePreset::default())
    }
}

/// Resolved abundances for exactly the elements of a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Abundances {
    items: BTreeMap<Element, f64>,
}

impl Abundances {
    /// Resolve a spec for a list of elements.
    ///
    /// Explicit values must be finite and non-negative, may not repeat an element,
    /// and must cover every requested element. Entries for elements outside the
    /// list are ignored.
    pub fn resolve(spec: &AbundanceSpec, elements: &[Element]) -> AtomicResult<Self> {
        let mut items = BTreeMap::new();
        match spec {
            AbundanceSpec::Preset(preset) => {
                for &element in elements {
                    let value = preset
                        .abundance(element)
                        .ok_or(AtomicError::MissingAbundance { element })?;
                    items.insert(element, value);
                }
            }
            AbundanceSpec::Explicit(values) => {
                let mut given = BTreeMap::new();
                for &(element, value) in values {
                    if !value.is_finite() {
                        return Err(AtomicError::NonPhysical {
                            element,
                            what: "non-finite abundance",
                        });
                    }
                    if value < 0.0 {
                        return Err(AtomicError::NonPhysical {
                            element,
                            what: "negative abundance",
                        });
                    }
                    if given.insert(element, value).is_some() {
                        return Err(AtomicError::DuplicateElement { element });
                    }
                }
                for &element in elements {
                    let value = given
                        .get(&element)
                        .copied()
                        .ok_or(AtomicError::MissingAbundance { element })?;
                    items.insert(element, value);
                }
            }
        }
        Ok(Self { items })
    }

    pub fn get(&self, element: Element) -> Option<f64> {
        self.items.get(&element).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Element, f64)> + '_ {
        self.items.iter().map(|(e, a)| (*e, *a))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
