use crate::{
    appraisal::{BidTerms, LotInput},
    error::ValuatorError,
};
use batteryval_schemas::{
    assay::AssayProfile,
    feedstock::FeedstockBatch,
    metal::Metal,
    process::{PayableSchedule, ProcessConfig},
    transport::{MaterialType, TransportRequest},
};
use serde::{de::DeserializeOwned, Deserialize};
use std::{collections::BTreeMap, fs, path::Path};

fn default_currency() -> String {
    "USD".to_string()
}

/// A priced valuation of one lot, optionally with the shipment that moves it.
#[derive(Debug, Clone, Deserialize)]
pub struct ValuationRequest {
    pub batch: FeedstockBatch,
    pub assay: AssayProfile,
    #[serde(default)]
    pub process: ProcessConfig,
    #[serde(default = "PayableSchedule::industry_standard")]
    pub payables: PayableSchedule,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Negotiated metal prices in `currency` per kg, replacing market quotes.
    #[serde(default)]
    pub price_overrides: BTreeMap<Metal, f64>,
    #[serde(default)]
    pub shipment: Option<TransportRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppraisalRequest {
    pub weight_kg: f64,
    pub assay: AssayProfile,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Percent price moves; the standard ±10/±20 grid when absent.
    #[serde(default)]
    pub scenarios: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LotComparisonRequest {
    #[serde(default = "default_currency")]
    pub currency: String,
    pub lots: Vec<LotInput>,
}

fn default_material() -> MaterialType {
    MaterialType::BlackMass
}

/// The lane a quoted lot would travel.
#[derive(Debug, Clone, Deserialize)]
pub struct BidLane {
    pub origin: String,
    pub destination: String,
    #[serde(default = "default_material")]
    pub material: MaterialType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BidRequest {
    pub weight_kg: f64,
    pub assay: AssayProfile,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub terms: BidTerms,
    /// Adds a route summary to the quote when present.
    #[serde(default)]
    pub transport: Option<BidLane>,
}

/// Reads a YAML request file.
pub fn load_request<T: DeserializeOwned>(path: &Path) -> Result<T, ValuatorError> {
    let display = path.display().to_string();
    let content =
        fs::read_to_string(path).map_err(|e| ValuatorError::FileIO(display.clone(), e))?;
    serde_yaml::from_str(&content).map_err(|e| ValuatorError::YamlParsing(display, e))
}
