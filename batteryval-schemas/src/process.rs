use crate::metal::{Metal, Salt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What the nickel and cobalt circuit sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NickelProduct {
    /// Battery-grade sulphate salts.
    #[default]
    Sulphate,
    /// Mixed hydroxide precipitate, paid on contained metal.
    MixedHydroxide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LithiumProduct {
    #[default]
    Carbonate,
    Hydroxide,
}

impl LithiumProduct {
    pub fn salt(self) -> Salt {
        match self {
            LithiumProduct::Carbonate => Salt::LithiumCarbonate,
            LithiumProduct::Hydroxide => Salt::LithiumHydroxide,
        }
    }
}

/// Economic and process assumptions for one valuation.
///
/// Rates are in currency per tonne; fractions are in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    pub yield_fraction: f64,
    pub mechanical_recovery_fraction: f64,
    pub hydromet_recovery_fraction: f64,
    pub refining_cost_per_tonne: f64,
    pub shredding_cost_per_tonne: f64,
    pub electrolyte_surcharge_per_tonne: f64,
    pub nickel_product: NickelProduct,
    pub lithium_product: LithiumProduct,
    /// Fraction of the nickel price paid for nickel in MHP.
    pub mhp_payable_nickel: f64,
    /// Fraction of the cobalt price paid for cobalt in MHP.
    pub mhp_payable_cobalt: f64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            yield_fraction: 1.0,
            mechanical_recovery_fraction: 1.0,
            hydromet_recovery_fraction: 0.95,
            refining_cost_per_tonne: 1500.0,
            shredding_cost_per_tonne: 0.0,
            electrolyte_surcharge_per_tonne: 0.0,
            nickel_product: NickelProduct::Sulphate,
            lithium_product: LithiumProduct::Carbonate,
            mhp_payable_nickel: 0.85,
            mhp_payable_cobalt: 0.80,
        }
    }
}

/// Fraction of each metal's market price a buyer pays for contained metal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayableSchedule {
    fractions: BTreeMap<Metal, f64>,
}

impl PayableSchedule {
    pub fn get(&self, metal: Metal) -> Option<f64> {
        self.fractions.get(&metal).copied()
    }

    pub fn with(mut self, metal: Metal, fraction: f64) -> Self {
        self.fractions.insert(metal, fraction);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metal, f64)> + '_ {
        self.fractions.iter().map(|(m, f)| (*m, *f))
    }

    /// Typical recycler terms for black mass.
    pub fn industry_standard() -> Self {
        [
            (Metal::Nickel, 0.80),
            (Metal::Cobalt, 0.75),
            (Metal::Lithium, 0.30),
            (Metal::Copper, 0.80),
            (Metal::Aluminum, 0.70),
            (Metal::Manganese, 0.60),
            (Metal::Iron, 0.0),
            (Metal::Phosphorus, 0.0),
        ]
        .into_iter()
        .collect()
    }
}

impl FromIterator<(Metal, f64)> for PayableSchedule {
    fn from_iter<I: IntoIterator<Item = (Metal, f64)>>(iter: I) -> Self {
        Self {
            fractions: iter.into_iter().collect(),
        }
    }
}
