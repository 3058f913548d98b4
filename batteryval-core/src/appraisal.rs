//! Indicative appraisals for sellers: what a lot is worth at typical recycler terms,
//! how exposed that value is to price moves, how several lots rank, and the quote
//! sent back to a supplier.
//!
//! These views ignore processing costs and are not a priced valuation.

use crate::{
    chemistry::{self, Chemistry},
    error::{ensure_fraction, ensure_non_negative, ValuatorError},
    route::{RouteAdvisory, RouteStatus},
};
use batteryval_schemas::{
    assay::AssayProfile,
    market::{MarketPrices, Provenance},
    metal::Metal,
    process::PayableSchedule,
};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_SCENARIOS: [f64; 5] = [-20.0, -10.0, 0.0, 10.0, 20.0];
const RANKING_PRICE_MOVE_PCT: f64 = 20.0;
pub const MIN_LOTS: usize = 2;
pub const MAX_LOTS: usize = 10;
pub const DEFAULT_VALIDITY_DAYS: u32 = 7;
pub const MAX_VALIDITY_DAYS: u32 = 365;
const BID_KEY_REQUIREMENTS: usize = 3;

/// Typical recovery of each metal through a recycling flowsheet.
pub fn indicative_recovery(metal: Metal) -> f64 {
    match metal {
        Metal::Nickel | Metal::Cobalt | Metal::Copper => 0.95,
        Metal::Aluminum => 0.90,
        Metal::Lithium | Metal::Manganese | Metal::Iron => 0.85,
        Metal::Phosphorus => 0.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetalAppraisal {
    pub metal: Metal,
    pub grade_pct: f64,
    pub contained_kg: f64,
    pub recoverable_kg: f64,
    pub recovery_fraction: f64,
    pub estimated_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueView {
    pub weight_kg: f64,
    pub currency: String,
    pub chemistry: Chemistry,
    /// Highest value first; metals worth nothing are left out.
    pub metals: Vec<MetalAppraisal>,
    pub total_value: f64,
    pub value_per_tonne: f64,
    pub price_timestamp: DateTime<Utc>,
    pub price_provenance: Provenance,
}

impl ValueView {
    pub fn value_per_kg(&self) -> f64 {
        self.total_value / self.weight_kg
    }

    pub fn value_of(&self, metal: Metal) -> f64 {
        self.metals
            .iter()
            .find(|m| m.metal == metal)
            .map_or(0.0, |m| m.estimated_value)
    }
}

fn validate_lot(weight_kg: f64, assay: &AssayProfile) -> Result<(), ValuatorError> {
    if !(weight_kg.is_finite() && weight_kg > 0.0) {
        return Err(ValuatorError::NonPositiveWeight(weight_kg));
    }
    if assay.is_empty() {
        return Err(ValuatorError::EmptyAssay);
    }
    for (metal, fraction) in assay.iter() {
        ensure_fraction(&format!("assay.{}", metal.symbol()), fraction)?;
    }
    Ok(())
}

/// Values a lot on contained metal at industry-standard recovery and payables.
///
/// Metals without a quoted price contribute nothing.
pub fn value_view(
    weight_kg: f64,
    assay: &AssayProfile,
    prices: &MarketPrices,
) -> Result<ValueView, ValuatorError> {
    validate_lot(weight_kg, assay)?;
    let payables = PayableSchedule::industry_standard();

    let mut metals: Vec<MetalAppraisal> = assay
        .iter()
        .filter(|(_, fraction)| *fraction > 0.0)
        .filter_map(|(metal, fraction)| {
            let contained = weight_kg * fraction;
            let recovery = indicative_recovery(metal);
            let recoverable = contained * recovery;
            let value = recoverable
                * prices.metal(metal).unwrap_or(0.0)
                * payables.get(metal).unwrap_or(0.0);
            (value > 0.0).then_some(MetalAppraisal {
                metal,
                grade_pct: fraction * 100.0,
                contained_kg: contained,
                recoverable_kg: recoverable,
                recovery_fraction: recovery,
                estimated_value: value,
            })
        })
        .collect();
    metals.sort_by(|a, b| b.estimated_value.total_cmp(&a.estimated_value));

    let total_value: f64 = metals.iter().map(|m| m.estimated_value).sum();
    Ok(ValueView {
        weight_kg,
        currency: prices.currency.clone(),
        chemistry: chemistry::classify(assay),
        metals,
        total_value,
        value_per_tonne: total_value / weight_kg * 1000.0,
        price_timestamp: prices.timestamp,
        price_provenance: prices.provenance,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub price_change_pct: f64,
    pub total_value: f64,
    pub value_change: f64,
    /// Change relative to the base total, in percent.
    pub impact_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetalSensitivity {
    pub metal: Metal,
    pub base_value: f64,
    pub scenarios: Vec<ScenarioOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityReport {
    pub base: ValueView,
    pub metals: Vec<MetalSensitivity>,
    /// The metal whose +20 % price move shifts total value the most.
    pub most_sensitive: Option<Metal>,
}

fn scenario(base_total: f64, metal_value: f64, pct: f64) -> ScenarioOutcome {
    let value_change = metal_value * pct / 100.0;
    ScenarioOutcome {
        price_change_pct: pct,
        total_value: base_total + value_change,
        value_change,
        impact_pct: if base_total > 0.0 {
            value_change / base_total * 100.0
        } else {
            0.0
        },
    }
}

/// Moves one metal price at a time through `scenarios` (percent changes).
pub fn sensitivity(
    weight_kg: f64,
    assay: &AssayProfile,
    prices: &MarketPrices,
    scenarios: &[f64],
) -> Result<SensitivityReport, ValuatorError> {
    let base = value_view(weight_kg, assay, prices)?;
    let total = base.total_value;

    let metals: Vec<MetalSensitivity> = base
        .metals
        .iter()
        .map(|m| MetalSensitivity {
            metal: m.metal,
            base_value: m.estimated_value,
            scenarios: scenarios
                .iter()
                .map(|&pct| scenario(total, m.estimated_value, pct))
                .collect(),
        })
        .collect();

    let most_sensitive = metals
        .iter()
        .map(|m| {
            let shifted = scenario(total, m.base_value, RANKING_PRICE_MOVE_PCT);
            (m.metal, shifted.impact_pct.abs())
        })
        .filter(|(_, impact)| *impact > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(metal, _)| metal);

    Ok(SensitivityReport {
        base,
        metals,
        most_sensitive,
    })
}

/// One lot offered for comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotInput {
    #[serde(default)]
    pub name: Option<String>,
    pub weight_kg: f64,
    pub assay: AssayProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedLot {
    pub rank: usize,
    pub name: String,
    pub view: ValueView,
    pub value_per_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedLot {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonStats {
    pub best_lot: String,
    pub best_value_per_kg: f64,
    pub worst_lot: String,
    pub worst_value_per_kg: f64,
    /// How far the best lot's value per kg sits above the worst, in percent.
    pub spread_pct: f64,
    pub total_weight_kg: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotComparison {
    pub currency: String,
    pub ranked: Vec<RankedLot>,
    pub rejected: Vec<RejectedLot>,
    pub stats: Option<ComparisonStats>,
}

/// Ranks lots by indicative value per kg, best first.
///
/// A lot that cannot be valued is reported and left unranked rather than failing
/// the whole comparison.
pub fn compare_lots(
    lots: &[LotInput],
    prices: &MarketPrices,
) -> Result<LotComparison, ValuatorError> {
    if !(MIN_LOTS..=MAX_LOTS).contains(&lots.len()) {
        return Err(ValuatorError::LotCount(lots.len()));
    }

    let mut valued = Vec::new();
    let mut rejected = Vec::new();
    for (i, lot) in lots.iter().enumerate() {
        let name = lot.name.clone().unwrap_or_else(|| format!("Lot {}", i + 1));
        match value_view(lot.weight_kg, &lot.assay, prices) {
            Ok(view) => valued.push((name, view)),
            Err(e) => rejected.push(RejectedLot {
                name,
                error: e.to_string(),
            }),
        }
    }

    valued.sort_by(|a, b| b.1.value_per_kg().total_cmp(&a.1.value_per_kg()));
    let ranked: Vec<RankedLot> = valued
        .into_iter()
        .enumerate()
        .map(|(i, (name, view))| RankedLot {
            rank: i + 1,
            name,
            value_per_kg: view.value_per_kg(),
            view,
        })
        .collect();

    let stats = match (ranked.first(), ranked.last()) {
        (Some(best), Some(worst)) if ranked.len() >= MIN_LOTS => Some(ComparisonStats {
            best_lot: best.name.clone(),
            best_value_per_kg: best.value_per_kg,
            worst_lot: worst.name.clone(),
            worst_value_per_kg: worst.value_per_kg,
            spread_pct: if worst.value_per_kg > 0.0 {
                (best.value_per_kg - worst.value_per_kg) / worst.value_per_kg * 100.0
            } else {
                0.0
            },
            total_weight_kg: ranked.iter().map(|l| l.view.weight_kg).sum(),
            total_value: ranked.iter().map(|l| l.view.total_value).sum(),
        }),
        _ => None,
    };

    debug!(
        ranked = ranked.len(),
        rejected = rejected.len(),
        "Lot comparison complete"
    );
    Ok(LotComparison {
        currency: prices.currency.clone(),
        ranked,
        rejected,
        stats,
    })
}

fn default_validity_days() -> u32 {
    DEFAULT_VALIDITY_DAYS
}

fn default_true() -> bool {
    true
}

/// Commercial terms of a purchase quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidTerms {
    #[serde(default)]
    pub offered_price_per_kg: Option<f64>,
    #[serde(default = "default_validity_days")]
    pub validity_days: u32,
    /// Show the market price next to each metal.
    #[serde(default = "default_true")]
    pub include_market_prices: bool,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub reference_number: Option<String>,
}

impl Default for BidTerms {
    fn default() -> Self {
        Self {
            offered_price_per_kg: None,
            validity_days: DEFAULT_VALIDITY_DAYS,
            include_market_prices: true,
            company_name: None,
            reference_number: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidLine {
    pub metal: Metal,
    pub grade_pct: f64,
    pub contained_kg: f64,
    pub market_price_per_kg: Option<f64>,
}

/// Lane summary shown on a quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidTransport {
    pub route: String,
    pub status: RouteStatus,
    pub allowed: bool,
    pub key_requirements: Vec<String>,
    pub processing_time_days: Option<String>,
}

/// A purchase quote for the supplier. Carries no costs, payables or margins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidReport {
    pub report_date: NaiveDate,
    pub valid_until: NaiveDate,
    pub reference: Option<String>,
    pub company: Option<String>,
    pub weight_kg: f64,
    pub weight_tonnes: f64,
    pub chemistry: Chemistry,
    pub chemistry_name: &'static str,
    /// Highest grade first.
    pub composition: Vec<BidLine>,
    pub currency: String,
    pub market_price_date: Option<DateTime<Utc>>,
    pub offered_price_per_kg: Option<f64>,
    pub total_offered_value: Option<f64>,
    pub transport: Option<BidTransport>,
    pub disclaimer: String,
}

impl BidReport {
    pub fn with_route(mut self, advisory: &RouteAdvisory) -> Self {
        self.transport = Some(BidTransport {
            route: format!("{} -> {}", advisory.origin, advisory.destination),
            status: advisory.status,
            allowed: advisory.is_allowed(),
            key_requirements: advisory
                .requirements
                .iter()
                .take(BID_KEY_REQUIREMENTS)
                .cloned()
                .collect(),
            processing_time_days: advisory.processing_time_days.clone(),
        });
        self
    }
}

/// Builds the quote a trader sends to a supplier for one lot.
pub fn bid_report(
    weight_kg: f64,
    assay: &AssayProfile,
    prices: &MarketPrices,
    terms: &BidTerms,
    report_date: NaiveDate,
) -> Result<BidReport, ValuatorError> {
    validate_lot(weight_kg, assay)?;
    if let Some(price) = terms.offered_price_per_kg {
        ensure_non_negative("offered_price_per_kg", price)?;
    }
    let invalid_validity = ValuatorError::InvalidValidityDays {
        days: terms.validity_days,
        max: MAX_VALIDITY_DAYS,
    };
    if !(1..=MAX_VALIDITY_DAYS).contains(&terms.validity_days) {
        return Err(invalid_validity);
    }
    let valid_until = report_date
        .checked_add_days(Days::new(u64::from(terms.validity_days)))
        .ok_or(invalid_validity)?;

    let mut composition: Vec<BidLine> = assay
        .iter()
        .filter(|(_, fraction)| *fraction > 0.0)
        .map(|(metal, fraction)| BidLine {
            metal,
            grade_pct: fraction * 100.0,
            contained_kg: weight_kg * fraction,
            market_price_per_kg: if terms.include_market_prices {
                prices.metal(metal)
            } else {
                None
            },
        })
        .collect();
    composition.sort_by(|a, b| b.grade_pct.total_cmp(&a.grade_pct));

    let chemistry = chemistry::classify(assay);
    debug!(%chemistry, %valid_until, "Bid report prepared");
    Ok(BidReport {
        report_date,
        valid_until,
        reference: terms.reference_number.clone(),
        company: terms.company_name.clone(),
        weight_kg,
        weight_tonnes: weight_kg / 1000.0,
        chemistry,
        chemistry_name: chemistry.display_name(),
        composition,
        currency: prices.currency.clone(),
        market_price_date: terms.include_market_prices.then_some(prices.timestamp),
        offered_price_per_kg: terms.offered_price_per_kg,
        total_offered_value: terms.offered_price_per_kg.map(|p| p * weight_kg),
        transport: None,
        disclaimer: format!(
            "This quote is subject to material inspection and verification of specifications. \
             Final pricing may be adjusted on actual assay results. Quote valid until {}.",
            valid_until
        ),
    })
}
