//! The closed sets of tracked metals and salable compounds.
//!
//! Every metal and salt carries the price key it is quoted under, so lookups into a
//! price snapshot never go through free-form strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A metal tracked in an assay profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metal {
    #[serde(rename = "Ni", alias = "nickel")]
    Nickel,
    #[serde(rename = "Co", alias = "cobalt")]
    Cobalt,
    #[serde(rename = "Li", alias = "lithium")]
    Lithium,
    #[serde(rename = "Cu", alias = "copper")]
    Copper,
    #[serde(rename = "Al", alias = "aluminum", alias = "aluminium")]
    Aluminum,
    #[serde(rename = "Mn", alias = "manganese")]
    Manganese,
    #[serde(rename = "Fe", alias = "iron")]
    Iron,
    #[serde(rename = "P", alias = "phosphorus")]
    Phosphorus,
}

impl Metal {
    pub const ALL: [Metal; 8] = [
        Metal::Nickel,
        Metal::Cobalt,
        Metal::Lithium,
        Metal::Copper,
        Metal::Aluminum,
        Metal::Manganese,
        Metal::Iron,
        Metal::Phosphorus,
    ];

    /// The chemical symbol, which doubles as the price key.
    pub fn symbol(self) -> &'static str {
        match self {
            Metal::Nickel => "Ni",
            Metal::Cobalt => "Co",
            Metal::Lithium => "Li",
            Metal::Copper => "Cu",
            Metal::Aluminum => "Al",
            Metal::Manganese => "Mn",
            Metal::Iron => "Fe",
            Metal::Phosphorus => "P",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metal::Nickel => "Nickel",
            Metal::Cobalt => "Cobalt",
            Metal::Lithium => "Lithium",
            Metal::Copper => "Copper",
            Metal::Aluminum => "Aluminum",
            Metal::Manganese => "Manganese",
            Metal::Iron => "Iron",
            Metal::Phosphorus => "Phosphorus",
        }
    }
}

impl fmt::Display for Metal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A refined compound sold by the hydrometallurgical circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Salt {
    /// NiSO4·6H2O
    #[serde(rename = "NiSO4")]
    NickelSulphate,
    /// CoSO4·7H2O
    #[serde(rename = "CoSO4")]
    CobaltSulphate,
    /// Li2CO3, quoted as lithium carbonate equivalent.
    #[serde(rename = "LCE")]
    LithiumCarbonate,
    /// LiOH·H2O
    #[serde(rename = "LiOH")]
    LithiumHydroxide,
    /// FePO4, the LFP by-product.
    #[serde(rename = "FePO4")]
    IronPhosphate,
}

impl Salt {
    pub fn price_key(self) -> &'static str {
        match self {
            Salt::NickelSulphate => "NiSO4",
            Salt::CobaltSulphate => "CoSO4",
            Salt::LithiumCarbonate => "LCE",
            Salt::LithiumHydroxide => "LiOH",
            Salt::IronPhosphate => "FePO4",
        }
    }

    /// Kilograms of salt produced per kilogram of contained metal.
    ///
    /// These follow from molar masses (hydrate water included) and are not tunable.
    pub fn stoichiometric_factor(self) -> f64 {
        match self {
            Salt::NickelSulphate => 4.48,
            Salt::CobaltSulphate => 4.77,
            Salt::LithiumCarbonate => 5.32,
            Salt::LithiumHydroxide => 6.05,
            Salt::IronPhosphate => 2.70,
        }
    }

    /// The metal this salt is made from.
    pub fn source_metal(self) -> Metal {
        match self {
            Salt::NickelSulphate => Metal::Nickel,
            Salt::CobaltSulphate => Metal::Cobalt,
            Salt::LithiumCarbonate | Salt::LithiumHydroxide => Metal::Lithium,
            Salt::IronPhosphate => Metal::Iron,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Salt::NickelSulphate => "Nickel Sulphate",
            Salt::CobaltSulphate => "Cobalt Sulphate",
            Salt::LithiumCarbonate => "Lithium Carbonate (LCE)",
            Salt::LithiumHydroxide => "Lithium Hydroxide",
            Salt::IronPhosphate => "Iron Phosphate",
        }
    }
}

impl fmt::Display for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A line item of the production schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum Product {
    Salt(Salt),
    /// Metal contained in a mixed hydroxide precipitate, sold at a discount to metal price.
    MixedHydroxide(Metal),
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Product::Salt(salt) => write!(f, "{}", salt),
            Product::MixedHydroxide(metal) => write!(f, "MHP ({} Content)", metal.symbol()),
        }
    }
}
