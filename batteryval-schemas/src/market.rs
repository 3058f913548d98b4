use crate::metal::{Metal, Salt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a price snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    PrimarySource,
    FallbackSource,
    StaticDefault,
}

impl Provenance {
    pub fn is_degraded(self) -> bool {
        !matches!(self, Provenance::PrimarySource)
    }
}

/// A snapshot of metal and salt prices in one currency, per kilogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPrices {
    pub currency: String,
    /// Units of `currency` per US dollar.
    pub fx_rate: f64,
    pub metals: BTreeMap<Metal, f64>,
    pub salts: BTreeMap<Salt, f64>,
    pub timestamp: DateTime<Utc>,
    pub provenance: Provenance,
}

impl MarketPrices {
    pub fn metal(&self, metal: Metal) -> Option<f64> {
        self.metals.get(&metal).copied()
    }

    pub fn salt(&self, salt: Salt) -> Option<f64> {
        self.salts.get(&salt).copied()
    }

    /// Replaces metal prices with caller-supplied quotes, keeping salts and provenance.
    pub fn with_metal_overrides(mut self, overrides: &BTreeMap<Metal, f64>) -> Self {
        for (metal, price) in overrides {
            self.metals.insert(*metal, *price);
        }
        self
    }

    /// Every price multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let mut scaled = self.clone();
        scaled.metals.values_mut().for_each(|p| *p *= factor);
        scaled.salts.values_mut().for_each(|p| *p *= factor);
        scaled
    }
}

/// Static reference prices used when no live feed is available.
///
/// Prices are US dollars per tonne; FX rates are units of currency per US dollar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDefaults {
    pub metals_usd_per_tonne: BTreeMap<Metal, f64>,
    pub salts_usd_per_tonne: BTreeMap<Salt, f64>,
    pub fx_rates: BTreeMap<String, f64>,
}

impl Default for MarketDefaults {
    fn default() -> Self {
        Self {
            metals_usd_per_tonne: [
                (Metal::Nickel, 16500.0),
                (Metal::Cobalt, 33000.0),
                (Metal::Lithium, 13500.0),
                (Metal::Copper, 9200.0),
                (Metal::Aluminum, 2500.0),
                (Metal::Manganese, 1800.0),
                (Metal::Iron, 120.0),
            ]
            .into_iter()
            .collect(),
            salts_usd_per_tonne: [
                (Salt::NickelSulphate, 3800.0),
                (Salt::CobaltSulphate, 6500.0),
                (Salt::LithiumCarbonate, 14000.0),
                (Salt::LithiumHydroxide, 15500.0),
                (Salt::IronPhosphate, 1500.0),
            ]
            .into_iter()
            .collect(),
            fx_rates: [("USD", 1.0), ("CAD", 1.40), ("EUR", 0.92), ("CNY", 7.25)]
                .into_iter()
                .map(|(c, r)| (c.to_string(), r))
                .collect(),
        }
    }
}
