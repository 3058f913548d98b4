use batteryval_schemas::{
    metal::{Metal, Salt},
    transport::TransportMode,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValuatorError {
    #[error("Gross weight must be positive, got {0} kg")]
    NonPositiveWeight(f64),

    #[error("'{field}' must be a fraction between 0 and 1, got {value}")]
    FractionOutOfRange { field: String, value: f64 },

    #[error("'{field}' must not be negative, got {value}")]
    NegativeValue { field: String, value: f64 },

    #[error("Assay profile is empty")]
    EmptyAssay,

    #[error("No market price for {0} ({sym})", sym = .0.symbol())]
    MissingMetalPrice(Metal),

    #[error("No payable fraction for {0} ({sym})", sym = .0.symbol())]
    MissingPayable(Metal),

    #[error("No market price for {0} ({key})", key = .0.price_key())]
    MissingSaltPrice(Salt),

    #[error("Distance is required for {0} transport")]
    MissingDistance(TransportMode),

    #[error("Distance must be positive, got {0} miles")]
    InvalidDistance(f64),

    #[error("{weight_kg} kg would need {units} vehicles, above the limit of {limit} per shipment")]
    ShipmentTooLarge { weight_kg: f64, units: f64, limit: u32 },

    #[error("Damaged, defective or recalled batteries may not be shipped by air")]
    DdrProhibitedByAir,

    #[error("Currency '{0}' is not supported")]
    UnsupportedCurrency(String),

    #[error("Quote validity must be between 1 and {max} days, got {days}")]
    InvalidValidityDays { days: u32, max: u32 },

    #[error("Lot comparison needs between 2 and 10 lots, got {0}")]
    LotCount(usize),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("Failed to serialize JSON: {0}")]
    JsonSerializing(#[from] serde_json::Error),
}

/// Checks that a named input is a finite fraction in `[0, 1]`.
pub(crate) fn ensure_fraction(field: &str, value: f64) -> Result<(), ValuatorError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValuatorError::FractionOutOfRange {
            field: field.to_string(),
            value,
        })
    }
}

pub(crate) fn ensure_non_negative(field: &str, value: f64) -> Result<(), ValuatorError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValuatorError::NegativeValue {
            field: field.to_string(),
            value,
        })
    }
}
