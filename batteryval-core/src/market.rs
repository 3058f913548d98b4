use crate::error::ValuatorError;
use batteryval_schemas::market::{MarketDefaults, MarketPrices, Provenance};
use chrono::Utc;
use tracing::debug;

const KG_PER_TONNE: f64 = 1000.0;

/// A source of price snapshots.
pub trait MarketDataProvider: Send + Sync {
    /// Prices in `currency` per kilogram.
    fn market_data(&self, currency: &str) -> Result<MarketPrices, ValuatorError>;
}

/// Serves the reference price table, always tagged as a static default.
#[derive(Debug, Clone, Default)]
pub struct StaticMarketData {
    defaults: MarketDefaults,
}

impl StaticMarketData {
    pub fn new(defaults: MarketDefaults) -> Self {
        Self { defaults }
    }

    pub fn fx_rate(&self, currency: &str) -> Result<f64, ValuatorError> {
        self.defaults
            .fx_rates
            .get(&currency.to_uppercase())
            .copied()
            .ok_or_else(|| ValuatorError::UnsupportedCurrency(currency.to_string()))
    }
}

impl MarketDataProvider for StaticMarketData {
    fn market_data(&self, currency: &str) -> Result<MarketPrices, ValuatorError> {
        let fx_rate = self.fx_rate(currency)?;
        let per_kg = |usd_per_tonne: f64| usd_per_tonne / KG_PER_TONNE * fx_rate;

        debug!(currency, fx_rate, "Serving static market prices");
        Ok(MarketPrices {
            currency: currency.to_uppercase(),
            fx_rate,
            metals: self
                .defaults
                .metals_usd_per_tonne
                .iter()
                .map(|(m, p)| (*m, per_kg(*p)))
                .collect(),
            salts: self
                .defaults
                .salts_usd_per_tonne
                .iter()
                .map(|(s, p)| (*s, per_kg(*p)))
                .collect(),
            timestamp: Utc::now(),
            provenance: Provenance::StaticDefault,
        })
    }
}
