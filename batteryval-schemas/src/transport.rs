use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Ocean,
    Air,
    Truck,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportMode::Ocean => "ocean",
            TransportMode::Air => "air",
            TransportMode::Truck => "truck",
        })
    }
}

/// The kind of battery material being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialType {
    BlackMass,
    WholeBatteries,
    /// Recovered battery-grade compounds.
    ProcessedMetals,
}

impl MaterialType {
    /// Whether the material ships as dangerous goods unless stated otherwise.
    pub fn is_hazardous_by_default(self) -> bool {
        !matches!(self, MaterialType::ProcessedMetals)
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MaterialType::BlackMass => "black mass",
            MaterialType::WholeBatteries => "whole batteries",
            MaterialType::ProcessedMetals => "processed metals",
        })
    }
}

/// A shipment to be sized and priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportRequest {
    pub origin: String,
    pub destination: String,
    pub mode: TransportMode,
    pub weight_kg: f64,
    pub material_type: MaterialType,
    /// Damaged, defective or recalled material.
    #[serde(default)]
    pub is_ddr: bool,
    /// Overrides the material's default hazard status.
    #[serde(default)]
    pub hazardous: Option<bool>,
    /// Road distance; mandatory for truck mode.
    #[serde(default)]
    pub distance_miles: Option<f64>,
}

impl TransportRequest {
    pub fn is_hazardous(&self) -> bool {
        self.hazardous
            .unwrap_or_else(|| self.material_type.is_hazardous_by_default())
    }
}
