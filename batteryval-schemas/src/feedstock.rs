use serde::{Deserialize, Serialize};

/// The physical form of the lot as delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedType {
    Cells,
    Modules,
    Packs,
    /// Already shredded; no pretreatment shredding charge applies.
    BlackMass,
}

impl FeedType {
    pub fn is_concentrate(self) -> bool {
        matches!(self, FeedType::BlackMass)
    }
}

/// Where the assay sample was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssayBasis {
    /// Assay of the intact material, before shredding.
    WholeMaterial,
    /// Assay of the black mass itself.
    #[default]
    Concentrate,
}

/// A physical lot to be valued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedstockBatch {
    pub gross_weight_kg: f64,
    pub feed_type: FeedType,
    #[serde(default)]
    pub assay_basis: AssayBasis,
    #[serde(default)]
    pub electrolyte_present: bool,
}
