//! Packaging and labelling rules for each kind of battery material.

use crate::transport::MaterialType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The packaging rule set a shipment falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackagingClass {
    LithiumBatteries,
    /// Damaged, defective or recalled batteries.
    DdrBatteries,
    BlackMass,
}

impl PackagingClass {
    /// DDR material takes the damaged-battery rules whatever its form. Processed
    /// metals are packed like black mass.
    pub fn for_material(material: MaterialType, is_ddr: bool) -> Self {
        if is_ddr {
            return PackagingClass::DdrBatteries;
        }
        match material {
            MaterialType::WholeBatteries => PackagingClass::LithiumBatteries,
            MaterialType::BlackMass | MaterialType::ProcessedMetals => PackagingClass::BlackMass,
        }
    }
}

impl fmt::Display for PackagingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PackagingClass::LithiumBatteries => "lithium batteries",
            PackagingClass::DdrBatteries => "DDR batteries",
            PackagingClass::BlackMass => "black mass",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnClassification {
    pub un_number: String,
    pub hazard_class: String,
    pub packing_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagingProfile {
    pub class: PackagingClass,
    pub description: Option<String>,
    pub un_classification: Option<UnClassification>,
    #[serde(default)]
    pub regulations: Vec<String>,
    /// Mode-level limits, e.g. a ban on air freight.
    #[serde(default)]
    pub restrictions: Vec<String>,
    pub items: Vec<String>,
}
