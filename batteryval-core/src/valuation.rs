//! Turns a mass balance and a price snapshot into cost, revenue and margin.

use crate::{
    chemistry::{self, Chemistry},
    error::{ensure_fraction, ensure_non_negative, ValuatorError},
    mass_balance::{self, GradeWarning, MassBalance},
};
use batteryval_schemas::{
    assay::AssayProfile,
    feedstock::FeedstockBatch,
    market::{MarketPrices, Provenance},
    metal::{Metal, Product, Salt},
    process::{NickelProduct, PayableSchedule, ProcessConfig},
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const KG_PER_TONNE: f64 = 1000.0;

/// Lithium salts recover less efficiently than the nickel/cobalt circuit.
const LITHIUM_CIRCUIT_EFFICIENCY: f64 = 0.90;

/// Recovery of iron into FePO4 from LFP black mass.
const IRON_PHOSPHATE_RECOVERY: f64 = 0.80;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetalValuation {
    pub contained_mass_kg: f64,
    pub effective_grade_pct: f64,
    /// What the buyer pays for the contained metal.
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PretreatmentCost {
    pub shredding: f64,
    pub electrolyte: f64,
}

impl PretreatmentCost {
    pub fn total(&self) -> f64 {
        self.shredding + self.electrolyte
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionLine {
    pub product: Product,
    pub output_mass_kg: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationResult {
    pub chemistry: Chemistry,
    pub currency: String,
    pub price_provenance: Provenance,
    pub concentrate_weight_kg: f64,
    pub metals: BTreeMap<Metal, MetalValuation>,
    pub material_cost: f64,
    pub pretreatment: PretreatmentCost,
    pub refining_cost: f64,
    pub total_opex: f64,
    pub production_schedule: Vec<ProductionLine>,
    pub total_revenue: f64,
    pub warnings: Vec<GradeWarning>,
}

impl ValuationResult {
    pub fn net_profit(&self) -> f64 {
        self.total_revenue - self.material_cost - self.total_opex
    }

    /// Net profit as a fraction of revenue, zero when there is no revenue.
    pub fn margin_fraction(&self) -> f64 {
        if self.total_revenue > 0.0 {
            self.net_profit() / self.total_revenue
        } else {
            0.0
        }
    }

    /// The result as JSON, with the derived profit figures included.
    pub fn to_json(&self) -> Result<serde_json::Value, ValuatorError> {
        let mut value = serde_json::to_value(self)?;
        if let Some(object) = value.as_object_mut() {
            object.insert("net_profit".to_string(), self.net_profit().into());
            object.insert("margin_fraction".to_string(), self.margin_fraction().into());
        }
        Ok(value)
    }
}

fn validate_config(config: &ProcessConfig) -> Result<(), ValuatorError> {
    ensure_non_negative("refining_cost_per_tonne", config.refining_cost_per_tonne)?;
    ensure_non_negative("shredding_cost_per_tonne", config.shredding_cost_per_tonne)?;
    ensure_non_negative(
        "electrolyte_surcharge_per_tonne",
        config.electrolyte_surcharge_per_tonne,
    )?;
    ensure_fraction("mhp_payable_nickel", config.mhp_payable_nickel)?;
    ensure_fraction("mhp_payable_cobalt", config.mhp_payable_cobalt)?;
    Ok(())
}

fn validate_prices(prices: &MarketPrices) -> Result<(), ValuatorError> {
    for (metal, price) in &prices.metals {
        ensure_non_negative(&format!("price.{}", metal.symbol()), *price)?;
    }
    for (salt, price) in &prices.salts {
        ensure_non_negative(&format!("price.{}", salt.price_key()), *price)?;
    }
    Ok(())
}

/// Cost of the contained metal, per metal.
///
/// A payable entry is required for every metal actually present; a price is only
/// required where the payable is non-zero.
pub fn metal_costs(
    balance: &MassBalance,
    payables: &PayableSchedule,
    prices: &MarketPrices,
) -> Result<BTreeMap<Metal, f64>, ValuatorError> {
    let mut costs = BTreeMap::new();
    for (&metal, b) in &balance.metals {
        if b.contained_mass_kg <= 0.0 {
            costs.insert(metal, 0.0);
            continue;
        }
        let payable = payables
            .get(metal)
            .ok_or(ValuatorError::MissingPayable(metal))?;
        ensure_fraction(&format!("payable.{}", metal.symbol()), payable)?;

        let cost = if payable > 0.0 {
            let price = prices
                .metal(metal)
                .ok_or(ValuatorError::MissingMetalPrice(metal))?;
            b.contained_mass_kg * price * payable
        } else {
            0.0
        };
        costs.insert(metal, cost);
    }
    Ok(costs)
}

pub fn pretreatment_cost(batch: &FeedstockBatch, config: &ProcessConfig) -> PretreatmentCost {
    let tonnes = batch.gross_weight_kg / KG_PER_TONNE;
    let shredding_rate = if batch.feed_type.is_concentrate() {
        0.0
    } else {
        config.shredding_cost_per_tonne
    };
    PretreatmentCost {
        shredding: tonnes * shredding_rate,
        electrolyte: if batch.electrolyte_present {
            tonnes * config.electrolyte_surcharge_per_tonne
        } else {
            0.0
        },
    }
}

pub fn refining_cost(balance: &MassBalance, config: &ProcessConfig) -> f64 {
    balance.concentrate_weight_kg / KG_PER_TONNE * config.refining_cost_per_tonne
}

fn salt_line(
    salt: Salt,
    recovered_metal_kg: f64,
    prices: &MarketPrices,
) -> Result<ProductionLine, ValuatorError> {
    let output = recovered_metal_kg * salt.stoichiometric_factor();
    let revenue = if output > 0.0 {
        output * prices.salt(salt).ok_or(ValuatorError::MissingSaltPrice(salt))?
    } else {
        0.0
    };
    Ok(ProductionLine {
        product: Product::Salt(salt),
        output_mass_kg: output,
        revenue,
    })
}

fn mixed_hydroxide_line(
    metal: Metal,
    recovered_metal_kg: f64,
    payable: f64,
    prices: &MarketPrices,
) -> Result<ProductionLine, ValuatorError> {
    let revenue = if recovered_metal_kg > 0.0 {
        let price = prices
            .metal(metal)
            .ok_or(ValuatorError::MissingMetalPrice(metal))?;
        recovered_metal_kg * price * payable
    } else {
        0.0
    };
    Ok(ProductionLine {
        product: Product::MixedHydroxide(metal),
        output_mass_kg: recovered_metal_kg,
        revenue,
    })
}

/// Builds the production schedule for the detected chemistry.
pub fn production_schedule(
    chemistry: Chemistry,
    balance: &MassBalance,
    config: &ProcessConfig,
    prices: &MarketPrices,
) -> Result<Vec<ProductionLine>, ValuatorError> {
    let recovery = config.hydromet_recovery_fraction;
    let mut lines = Vec::new();

    if chemistry == Chemistry::Lfp {
        lines.push(salt_line(
            Salt::IronPhosphate,
            balance.contained(Metal::Iron) * IRON_PHOSPHATE_RECOVERY,
            prices,
        )?);
    } else {
        match config.nickel_product {
            NickelProduct::Sulphate => {
                for salt in [Salt::NickelSulphate, Salt::CobaltSulphate] {
                    let recovered = balance.contained(salt.source_metal()) * recovery;
                    lines.push(salt_line(salt, recovered, prices)?);
                }
            }
            NickelProduct::MixedHydroxide => {
                for (metal, payable) in [
                    (Metal::Nickel, config.mhp_payable_nickel),
                    (Metal::Cobalt, config.mhp_payable_cobalt),
                ] {
                    let recovered = balance.contained(metal) * recovery;
                    lines.push(mixed_hydroxide_line(metal, recovered, payable, prices)?);
                }
            }
        }
    }

    let lithium_recovered =
        balance.contained(Metal::Lithium) * recovery * LITHIUM_CIRCUIT_EFFICIENCY;
    lines.push(salt_line(
        config.lithium_product.salt(),
        lithium_recovered,
        prices,
    )?);

    Ok(lines)
}

/// Values a feedstock lot end to end.
pub fn valuate(
    batch: &FeedstockBatch,
    assay: &AssayProfile,
    config: &ProcessConfig,
    payables: &PayableSchedule,
    prices: &MarketPrices,
) -> Result<ValuationResult, ValuatorError> {
    validate_config(config)?;
    validate_prices(prices)?;
    if prices.provenance.is_degraded() {
        warn!(
            provenance = ?prices.provenance,
            timestamp = %prices.timestamp,
            "Valuing with non-primary market prices"
        );
    }

    let chemistry = chemistry::classify(assay);
    let balance = mass_balance::compute(batch, assay, config)?;
    let warnings = mass_balance::grade_warnings(&balance, chemistry);

    let costs = metal_costs(&balance, payables, prices)?;
    let material_cost = costs.values().sum();

    let pretreatment = pretreatment_cost(batch, config);
    let refining_cost = refining_cost(&balance, config);
    let total_opex = pretreatment.total() + refining_cost;

    let production_schedule = production_schedule(chemistry, &balance, config, prices)?;
    let total_revenue = production_schedule.iter().map(|l| l.revenue).sum();

    let metals = balance
        .metals
        .iter()
        .map(|(&metal, b)| {
            (
                metal,
                MetalValuation {
                    contained_mass_kg: b.contained_mass_kg,
                    effective_grade_pct: b.effective_grade_pct,
                    cost: costs.get(&metal).copied().unwrap_or(0.0),
                },
            )
        })
        .collect();

    let result = ValuationResult {
        chemistry,
        currency: prices.currency.clone(),
        price_provenance: prices.provenance,
        concentrate_weight_kg: balance.concentrate_weight_kg,
        metals,
        material_cost,
        pretreatment,
        refining_cost,
        total_opex,
        production_schedule,
        total_revenue,
        warnings,
    };
    debug!(
        %chemistry,
        material_cost = result.material_cost,
        total_opex = result.total_opex,
        total_revenue = result.total_revenue,
        net_profit = result.net_profit(),
        "Valuation complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use batteryval_schemas::{
        feedstock::{AssayBasis, FeedType},
        process::LithiumProduct,
    };
    use chrono::Utc;

    fn prices() -> MarketPrices {
        MarketPrices {
            currency: "USD".to_string(),
            fx_rate: 1.0,
            metals: [
                (Metal::Nickel, 16.5),
                (Metal::Cobalt, 33.0),
                (Metal::Lithium, 13.5),
                (Metal::Copper, 9.2),
                (Metal::Aluminum, 2.5),
                (Metal::Manganese, 1.8),
            ]
            .into_iter()
            .collect(),
            salts: [
                (Salt::NickelSulphate, 3.8),
                (Salt::CobaltSulphate, 6.5),
                (Salt::LithiumCarbonate, 14.0),
                (Salt::LithiumHydroxide, 15.5),
                (Salt::IronPhosphate, 1.5),
            ]
            .into_iter()
            .collect(),
            timestamp: Utc::now(),
            provenance: Provenance::PrimarySource,
        }
    }

    fn black_mass(weight: f64) -> FeedstockBatch {
        FeedstockBatch {
            gross_weight_kg: weight,
            feed_type: FeedType::BlackMass,
            assay_basis: AssayBasis::Concentrate,
            electrolyte_present: false,
        }
    }

    fn nmc_assay() -> AssayProfile {
        AssayProfile::new()
            .with(Metal::Nickel, 0.205)
            .with(Metal::Cobalt, 0.062)
            .with(Metal::Lithium, 0.025)
            .with(Metal::Copper, 0.035)
            .with(Metal::Aluminum, 0.012)
            .with(Metal::Manganese, 0.048)
    }

    #[test]
    fn material_cost_for_reference_nmc_lot() {
        let result = valuate(
            &black_mass(1000.0),
            &nmc_assay(),
            &ProcessConfig::default(),
            &PayableSchedule::industry_standard(),
            &prices(),
        )
        .unwrap();
        assert!((result.material_cost - 4672.19).abs() < 0.01);
        assert!((result.refining_cost - 1500.0).abs() < 1e-9);
        assert_eq!(result.chemistry, Chemistry::Nmc);
    }

    #[test]
    fn doubling_prices_doubles_cost_and_revenue() {
        let base = prices();
        let run = |p: &MarketPrices| {
            valuate(
                &black_mass(1000.0),
                &nmc_assay(),
                &ProcessConfig::default(),
                &PayableSchedule::industry_standard(),
                p,
            )
            .unwrap()
        };
        let single = run(&base);
        let double = run(&base.scaled(2.0));

        assert!((double.material_cost - 2.0 * single.material_cost).abs() < 1e-6);
        assert!((double.total_revenue - 2.0 * single.total_revenue).abs() < 1e-6);
        for (a, b) in single.production_schedule.iter().zip(&double.production_schedule) {
            assert!((b.revenue - 2.0 * a.revenue).abs() < 1e-6);
        }
        let expected_gain = single.total_revenue - single.material_cost;
        assert!((double.net_profit() - single.net_profit() - expected_gain).abs() < 1e-6);
    }

    #[test]
    fn sulphate_route_revenue() {
        let result = valuate(
            &black_mass(1000.0),
            &nmc_assay(),
            &ProcessConfig::default(),
            &PayableSchedule::industry_standard(),
            &prices(),
        )
        .unwrap();

        let nickel = &result.production_schedule[0];
        assert_eq!(nickel.product, Product::Salt(Salt::NickelSulphate));
        // 205 kg Ni * 0.95 * 4.48
        assert!((nickel.output_mass_kg - 872.48).abs() < 1e-6);
        assert!((nickel.revenue - 872.48 * 3.8).abs() < 1e-6);

        let lithium = result.production_schedule.last().unwrap();
        // 25 kg Li * 0.95 * 0.90 * 5.32
        assert!((lithium.output_mass_kg - 113.715).abs() < 1e-6);
        assert_eq!(result.production_schedule.len(), 3);
    }

    #[test]
    fn mixed_hydroxide_route_pays_on_metal_price() {
        let config = ProcessConfig {
            nickel_product: NickelProduct::MixedHydroxide,
            lithium_product: LithiumProduct::Hydroxide,
            ..ProcessConfig::default()
        };
        let result = valuate(
            &black_mass(1000.0),
            &nmc_assay(),
            &config,
            &PayableSchedule::industry_standard(),
            &prices(),
        )
        .unwrap();

        let cobalt = &result.production_schedule[1];
        assert_eq!(cobalt.product, Product::MixedHydroxide(Metal::Cobalt));
        // 62 kg Co * 0.95 recovered, paid at 33.0 * 0.80
        assert!((cobalt.output_mass_kg - 58.9).abs() < 1e-9);
        assert!((cobalt.revenue - 58.9 * 33.0 * 0.80).abs() < 1e-6);
        assert_eq!(
            result.production_schedule[2].product,
            Product::Salt(Salt::LithiumHydroxide)
        );
    }

    #[test]
    fn lfp_sells_iron_phosphate_and_lithium_only() {
        let assay = AssayProfile::new()
            .with(Metal::Iron, 0.30)
            .with(Metal::Lithium, 0.045)
            .with(Metal::Phosphorus, 0.17);
        let result = valuate(
            &black_mass(1000.0),
            &assay,
            &ProcessConfig::default(),
            &PayableSchedule::industry_standard(),
            &prices(),
        )
        .unwrap();

        assert_eq!(result.chemistry, Chemistry::Lfp);
        let products: Vec<Product> = result.production_schedule.iter().map(|l| l.product).collect();
        assert_eq!(
            products,
            vec![
                Product::Salt(Salt::IronPhosphate),
                Product::Salt(Salt::LithiumCarbonate)
            ]
        );
        // Iron and phosphorus carry a zero payable, so no iron price is needed
        assert_eq!(result.material_cost, result.metals[&Metal::Lithium].cost);
    }

    #[test]
    fn pretreatment_charges_shredding_and_electrolyte() {
        let batch = FeedstockBatch {
            gross_weight_kg: 2000.0,
            feed_type: FeedType::Modules,
            assay_basis: AssayBasis::WholeMaterial,
            electrolyte_present: true,
        };
        let config = ProcessConfig {
            shredding_cost_per_tonne: 300.0,
            electrolyte_surcharge_per_tonne: 150.0,
            yield_fraction: 0.5,
            ..ProcessConfig::default()
        };
        let cost = pretreatment_cost(&batch, &config);
        assert!((cost.shredding - 600.0).abs() < 1e-9);
        assert!((cost.electrolyte - 300.0).abs() < 1e-9);

        let concentrate = FeedstockBatch {
            feed_type: FeedType::BlackMass,
            ..batch
        };
        assert_eq!(pretreatment_cost(&concentrate, &config).shredding, 0.0);
    }

    #[test]
    fn margin_is_zero_without_revenue() {
        let copper_scrap = AssayProfile::new().with(Metal::Copper, 0.5);
        let result = valuate(
            &black_mass(100.0),
            &copper_scrap,
            &ProcessConfig::default(),
            &PayableSchedule::industry_standard(),
            &prices(),
        )
        .unwrap();
        assert_eq!(result.total_revenue, 0.0);
        assert_eq!(result.margin_fraction(), 0.0);
        assert!(result.net_profit() < 0.0);
    }

    #[test]
    fn all_zero_assay_values_to_nothing() {
        let barren = AssayProfile::new()
            .with(Metal::Nickel, 0.0)
            .with(Metal::Copper, 0.0);
        let result = valuate(
            &black_mass(1000.0),
            &barren,
            &ProcessConfig::default(),
            &PayableSchedule::industry_standard(),
            &prices(),
        )
        .unwrap();
        assert_eq!(result.chemistry, Chemistry::Unknown);
        assert_eq!(result.material_cost, 0.0);
        assert_eq!(result.total_revenue, 0.0);
        assert_eq!(result.margin_fraction(), 0.0);
    }

    #[test]
    fn missing_keys_are_rejected() {
        let no_cobalt_payable = PayableSchedule::industry_standard()
            .iter()
            .filter(|(m, _)| *m != Metal::Cobalt)
            .collect::<PayableSchedule>();
        let err = valuate(
            &black_mass(1000.0),
            &nmc_assay(),
            &ProcessConfig::default(),
            &no_cobalt_payable,
            &prices(),
        )
        .unwrap_err();
        assert!(matches!(err, ValuatorError::MissingPayable(Metal::Cobalt)));

        let mut no_lce = prices();
        no_lce.salts.remove(&Salt::LithiumCarbonate);
        let err = valuate(
            &black_mass(1000.0),
            &nmc_assay(),
            &ProcessConfig::default(),
            &PayableSchedule::industry_standard(),
            &no_lce,
        )
        .unwrap_err();
        assert!(matches!(err, ValuatorError::MissingSaltPrice(Salt::LithiumCarbonate)));
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut bad = prices();
        bad.metals.insert(Metal::Copper, -1.0);
        let err = valuate(
            &black_mass(1000.0),
            &nmc_assay(),
            &ProcessConfig::default(),
            &PayableSchedule::industry_standard(),
            &bad,
        )
        .unwrap_err();
        assert!(matches!(err, ValuatorError::NegativeValue { .. }));
    }

    #[test]
    fn json_includes_derived_profit() {
        let result = valuate(
            &black_mass(1000.0),
            &nmc_assay(),
            &ProcessConfig::default(),
            &PayableSchedule::industry_standard(),
            &prices(),
        )
        .unwrap();
        let json = result.to_json().unwrap();
        let net = json["net_profit"].as_f64().unwrap();
        assert!((net - result.net_profit()).abs() < 1e-9);
        assert_eq!(json["chemistry"], "NMC");
    }
}
