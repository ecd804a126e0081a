use core::fmt;
use core::num::NonZeroU8;
use core::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// Symbols of the supported elements, indexed by `atomic_number - 1`.
const SYMBOLS: [&str; 30] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
];

/// Compact, stable identifier for a chemical element.
///
/// - stores the atomic number, so ordering follows the periodic table
/// - `NonZero` enables `Option<Element>` to be niche-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Element(NonZeroU8);

impl Element {
    pub const MAX_ATOMIC_NUMBER: u8 = SYMBOLS.len() as u8;

    pub const HYDROGEN: Element = Element(NonZeroU8::MIN);

    pub fn from_atomic_number(z: u32) -> CoreResult<Self> {
        let err = CoreError::UnsupportedAtomicNumber {
            z,
            max: Self::MAX_ATOMIC_NUMBER,
        };
        let z = u8::try_from(z).map_err(|_| err.clone())?;
        if z > Self::MAX_ATOMIC_NUMBER {
            return Err(err);
        }
        NonZeroU8::new(z).map(Self).ok_or(err)
    }

    /// Look up an element by its symbol (case-sensitive, e.g. `"Fe"`).
    pub fn from_symbol(symbol: &str) -> CoreResult<Self> {
        let trimmed = symbol.trim();
        SYMBOLS
            .iter()
            .position(|s| *s == trimmed)
            .map(|i| Self::from_atomic_number(i as u32 + 1))
            .unwrap_or_else(|| {
                Err(CoreError::UnknownElement {
                    symbol: symbol.to_string(),
                })
            })
    }

    pub fn atomic_number(self) -> u8 {
        self.0.get()
    }

    pub fn symbol(self) -> &'static str {
        SYMBOLS[usize::from(self.0.get()) - 1]
    }

    /// Number of charge states, neutral through fully stripped.
    pub fn nstates(self) -> usize {
        usize::from(self.atomic_number()) + 1
    }

    pub fn all() -> impl Iterator<Item = Element> {
        (1..=Self::MAX_ATOMIC_NUMBER).filter_map(|z| NonZeroU8::new(z).map(Element))
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({})", self.symbol())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Element {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(s)
    }
}

impl TryFrom<String> for Element {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_symbol(&value)
    }
}

impl From<Element> for String {
    fn from(element: Element) -> Self {
        element.symbol().to_string()
    }
}
