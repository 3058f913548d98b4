use crate::metal::Metal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metal composition of a sample, as mass fractions.
///
/// Metals absent from the map read as zero. The fractions are expected to lie in
/// `[0, 1]`; a sum above one is tolerated here and surfaces later as a grade warning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssayProfile {
    fractions: BTreeMap<Metal, f64>,
}

impl AssayProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, handy for fixtures.
    pub fn with(mut self, metal: Metal, fraction: f64) -> Self {
        self.fractions.insert(metal, fraction);
        self
    }

    pub fn fraction(&self, metal: Metal) -> f64 {
        self.fractions.get(&metal).copied().unwrap_or(0.0)
    }

    /// True only when no metal was listed at all; explicit zeros still count.
    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.fractions.values().sum()
    }

    /// Explicitly set entries, in metal order.
    pub fn iter(&self) -> impl Iterator<Item = (Metal, f64)> + '_ {
        self.fractions.iter().map(|(m, f)| (*m, *f))
    }
}

impl FromIterator<(Metal, f64)> for AssayProfile {
    fn from_iter<I: IntoIterator<Item = (Metal, f64)>>(iter: I) -> Self {
        Self {
            fractions: iter.into_iter().collect(),
        }
    }
}
