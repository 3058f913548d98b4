//! Sizes a shipment into containers or vehicles and prices the move.
//!
//! Rates are US dollars regardless of the valuation currency.

use crate::{error::ValuatorError, reference::RouteRegistry};
use batteryval_schemas::{
    packaging::PackagingProfile,
    transport::{TransportMode, TransportRequest},
};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

pub const TRANSPORT_CURRENCY: &str = "USD";

// Ocean
const CONTAINER_20FT_CAPACITY_HAZ_KG: f64 = 18_000.0;
const CONTAINER_20FT_CAPACITY_KG: f64 = 21_000.0;
const CONTAINER_40FT_CAPACITY_HAZ_KG: f64 = 24_000.0;
const CONTAINER_40FT_CAPACITY_KG: f64 = 27_000.0;
const CONTAINER_20FT_BASE: f64 = 3_000.0;
const CONTAINER_20FT_HAZMAT: f64 = 1_000.0;
const CONTAINER_40FT_BASE: f64 = 4_500.0;
const CONTAINER_40FT_HAZMAT: f64 = 1_500.0;
const OCEAN_TRANSIT_DAYS: u32 = 14;

// Truck
const FULL_LOAD_THRESHOLD_KG: f64 = 4_500.0;
const BOX_TRUCK_CAPACITY_KG: f64 = 6_000.0;
const SEMI_CAPACITY_HAZ_KG: f64 = 18_000.0;
const SEMI_CAPACITY_KG: f64 = 22_000.0;
const FULL_LOAD_RATE_PER_MILE: f64 = 2.50;
const FULL_LOAD_HAZMAT_PER_VEHICLE: f64 = 300.0;
const LBS_PER_KG: f64 = 2.205;
const PARTIAL_RATE_PER_LB_HAZ: f64 = 0.90;
const PARTIAL_RATE_PER_LB: f64 = 0.40;
const FUEL_SURCHARGE_FRACTION: f64 = 0.25;
const PARTIAL_HAZMAT_FEE: f64 = 150.0;
const PARTIAL_MINIMUM_CHARGE: f64 = 300.0;
const MILES_PER_TRANSIT_DAY: f64 = 500.0;

// Air
const AIR_RATE_PER_KG_HAZ: f64 = 12.0;
const AIR_RATE_PER_KG: f64 = 5.0;
const AIR_MINIMUM_CHARGE: f64 = 1_000.0;
const AIR_HAZMAT_HANDLING: f64 = 500.0;
const AIR_TRANSIT_DAYS: u32 = 2;

/// Containers or trucks one estimate may book.
pub const MAX_UNITS_PER_SHIPMENT: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Container20ft,
    Container40ft,
    BoxTruck,
    SemiTrailer,
    /// Shared space on a less-than-truckload carrier.
    PartialLoad,
    AirCargo,
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VehicleType::Container20ft => "20ft container",
            VehicleType::Container40ft => "40ft container",
            VehicleType::BoxTruck => "box truck",
            VehicleType::SemiTrailer => "semi-trailer",
            VehicleType::PartialLoad => "partial load (LTL)",
            VehicleType::AirCargo => "air cargo",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub base: f64,
    pub hazmat: f64,
    pub fuel_surcharge: f64,
    /// Top-up applied when the charge falls below the carrier minimum.
    pub minimum_charge_adjustment: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.base + self.hazmat + self.fuel_surcharge + self.minimum_charge_adjustment
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportEstimate {
    pub mode: TransportMode,
    pub vehicle_type: VehicleType,
    pub vehicle_count: u32,
    /// None when the shipment does not book whole vehicles.
    pub capacity_per_vehicle_kg: Option<f64>,
    pub total_capacity_kg: Option<f64>,
    pub utilization_fraction: Option<f64>,
    pub hazardous: bool,
    pub costs: CostBreakdown,
    pub total_cost: f64,
    pub cost_per_kg: f64,
    pub currency: &'static str,
    pub transit_days: u32,
    pub sizing_note: String,
    pub notes: Vec<String>,
    /// Filled in by [`estimate_shipment`] from the reference data.
    pub packaging: Option<PackagingProfile>,
}

/// How a shipment is split into units, before pricing.
struct Sizing {
    vehicle_type: VehicleType,
    vehicle_count: u32,
    capacity_per_vehicle_kg: Option<f64>,
}

fn units_needed(weight_kg: f64, capacity_kg: f64) -> Result<u32, ValuatorError> {
    let units = (weight_kg / capacity_kg).ceil().max(1.0);
    if units > f64::from(MAX_UNITS_PER_SHIPMENT) {
        return Err(ValuatorError::ShipmentTooLarge {
            weight_kg,
            units,
            limit: MAX_UNITS_PER_SHIPMENT,
        });
    }
    Ok(units as u32)
}

fn size_ocean(weight_kg: f64, hazardous: bool) -> Result<Sizing, ValuatorError> {
    let (cap_20, cap_40) = if hazardous {
        (CONTAINER_20FT_CAPACITY_HAZ_KG, CONTAINER_40FT_CAPACITY_HAZ_KG)
    } else {
        (CONTAINER_20FT_CAPACITY_KG, CONTAINER_40FT_CAPACITY_KG)
    };
    let sizing = if weight_kg <= cap_20 {
        Sizing {
            vehicle_type: VehicleType::Container20ft,
            vehicle_count: 1,
            capacity_per_vehicle_kg: Some(cap_20),
        }
    } else if weight_kg <= cap_40 {
        Sizing {
            vehicle_type: VehicleType::Container40ft,
            vehicle_count: 1,
            capacity_per_vehicle_kg: Some(cap_40),
        }
    } else {
        Sizing {
            vehicle_type: VehicleType::Container20ft,
            vehicle_count: units_needed(weight_kg, cap_20)?,
            capacity_per_vehicle_kg: Some(cap_20),
        }
    };
    Ok(sizing)
}

fn ocean_costs(sizing: &Sizing, hazardous: bool) -> CostBreakdown {
    let (base, hazmat) = match sizing.vehicle_type {
        VehicleType::Container40ft => (CONTAINER_40FT_BASE, CONTAINER_40FT_HAZMAT),
        _ => (CONTAINER_20FT_BASE, CONTAINER_20FT_HAZMAT),
    };
    let count = f64::from(sizing.vehicle_count);
    CostBreakdown {
        base: base * count,
        hazmat: if hazardous { hazmat * count } else { 0.0 },
        ..CostBreakdown::default()
    }
}

fn size_full_load(weight_kg: f64, hazardous: bool) -> Result<Sizing, ValuatorError> {
    if weight_kg <= BOX_TRUCK_CAPACITY_KG {
        Ok(Sizing {
            vehicle_type: VehicleType::BoxTruck,
            vehicle_count: 1,
            capacity_per_vehicle_kg: Some(BOX_TRUCK_CAPACITY_KG),
        })
    } else {
        let capacity = if hazardous {
            SEMI_CAPACITY_HAZ_KG
        } else {
            SEMI_CAPACITY_KG
        };
        Ok(Sizing {
            vehicle_type: VehicleType::SemiTrailer,
            vehicle_count: units_needed(weight_kg, capacity)?,
            capacity_per_vehicle_kg: Some(capacity),
        })
    }
}

fn distance_multiplier(distance_miles: f64) -> f64 {
    if distance_miles < 500.0 {
        1.0
    } else if distance_miles < 1_000.0 {
        1.3
    } else {
        1.6
    }
}

fn partial_load_costs(weight_kg: f64, distance_miles: f64, hazardous: bool) -> CostBreakdown {
    let rate = if hazardous {
        PARTIAL_RATE_PER_LB_HAZ
    } else {
        PARTIAL_RATE_PER_LB
    };
    let base = weight_kg * LBS_PER_KG * rate * distance_multiplier(distance_miles);
    let mut costs = CostBreakdown {
        base,
        hazmat: if hazardous { PARTIAL_HAZMAT_FEE } else { 0.0 },
        fuel_surcharge: base * FUEL_SURCHARGE_FRACTION,
        minimum_charge_adjustment: 0.0,
    };
    costs.minimum_charge_adjustment = (PARTIAL_MINIMUM_CHARGE - costs.total()).max(0.0);
    costs
}

fn truck_distance(request: &TransportRequest) -> Result<f64, ValuatorError> {
    let distance = request
        .distance_miles
        .ok_or(ValuatorError::MissingDistance(TransportMode::Truck))?;
    if distance.is_finite() && distance > 0.0 {
        Ok(distance)
    } else {
        Err(ValuatorError::InvalidDistance(distance))
    }
}

fn sizing_note(sizing: &Sizing, weight_kg: f64) -> String {
    match sizing.capacity_per_vehicle_kg {
        Some(capacity) => {
            let total = capacity * f64::from(sizing.vehicle_count);
            format!(
                "{} x {} ({:.0} kg each), {:.0} kg of {:.0} kg capacity used ({:.1}%)",
                sizing.vehicle_count,
                sizing.vehicle_type,
                capacity,
                weight_kg,
                total,
                weight_kg / total * 100.0
            )
        }
        None => format!("{} for {:.0} kg, billed by weight", sizing.vehicle_type, weight_kg),
    }
}

/// Sizes and prices a shipment.
///
/// Damaged, defective or recalled material is refused outright by air.
pub fn estimate_transport(request: &TransportRequest) -> Result<TransportEstimate, ValuatorError> {
    let weight = request.weight_kg;
    if !(weight.is_finite() && weight > 0.0) {
        return Err(ValuatorError::NonPositiveWeight(weight));
    }
    let hazardous = request.is_hazardous();
    let mut notes = Vec::new();

    let (sizing, costs, transit_days) = match request.mode {
        TransportMode::Ocean => {
            let sizing = size_ocean(weight, hazardous)?;
            let costs = ocean_costs(&sizing, hazardous);
            (sizing, costs, OCEAN_TRANSIT_DAYS)
        }
        TransportMode::Truck => {
            let distance = truck_distance(request)?;
            let transit_days = ((distance / MILES_PER_TRANSIT_DAY).floor() as u32).max(1);
            if weight >= FULL_LOAD_THRESHOLD_KG {
                let sizing = size_full_load(weight, hazardous)?;
                let count = f64::from(sizing.vehicle_count);
                let costs = CostBreakdown {
                    base: distance * FULL_LOAD_RATE_PER_MILE * count,
                    hazmat: if hazardous {
                        FULL_LOAD_HAZMAT_PER_VEHICLE * count
                    } else {
                        0.0
                    },
                    ..CostBreakdown::default()
                };
                (sizing, costs, transit_days)
            } else {
                let sizing = Sizing {
                    vehicle_type: VehicleType::PartialLoad,
                    vehicle_count: 1,
                    capacity_per_vehicle_kg: None,
                };
                let costs = partial_load_costs(weight, distance, hazardous);
                (sizing, costs, transit_days)
            }
        }
        TransportMode::Air => {
            if request.is_ddr {
                return Err(ValuatorError::DdrProhibitedByAir);
            }
            let rate = if hazardous {
                AIR_RATE_PER_KG_HAZ
            } else {
                AIR_RATE_PER_KG
            };
            let base = weight * rate;
            let costs = CostBreakdown {
                base,
                hazmat: if hazardous { AIR_HAZMAT_HANDLING } else { 0.0 },
                fuel_surcharge: 0.0,
                minimum_charge_adjustment: (AIR_MINIMUM_CHARGE - base).max(0.0),
            };
            let sizing = Sizing {
                vehicle_type: VehicleType::AirCargo,
                vehicle_count: 1,
                capacity_per_vehicle_kg: None,
            };
            (sizing, costs, AIR_TRANSIT_DAYS)
        }
    };

    if hazardous {
        notes.push("Class 9 dangerous goods documentation required".to_string());
    }
    if request.is_ddr {
        notes.push(
            "DDR material: special packaging and carrier approval required (UN3480 SP376)"
                .to_string(),
        );
    }

    let total_capacity = sizing
        .capacity_per_vehicle_kg
        .map(|c| c * f64::from(sizing.vehicle_count));
    let total_cost = costs.total();
    let estimate = TransportEstimate {
        mode: request.mode,
        vehicle_type: sizing.vehicle_type,
        vehicle_count: sizing.vehicle_count,
        capacity_per_vehicle_kg: sizing.capacity_per_vehicle_kg,
        total_capacity_kg: total_capacity,
        utilization_fraction: total_capacity.map(|c| weight / c),
        hazardous,
        costs,
        total_cost,
        cost_per_kg: total_cost / weight,
        currency: TRANSPORT_CURRENCY,
        transit_days,
        sizing_note: sizing_note(&sizing, weight),
        notes,
        packaging: None,
    };
    debug!(
        mode = %estimate.mode,
        vehicle = %estimate.vehicle_type,
        count = estimate.vehicle_count,
        total_cost = estimate.total_cost,
        "Transport estimated"
    );
    Ok(estimate)
}

/// Estimates the move and attaches the packaging rules the registry holds for
/// the material.
pub fn estimate_shipment<R: RouteRegistry + ?Sized>(
    registry: &R,
    request: &TransportRequest,
) -> Result<TransportEstimate, ValuatorError> {
    let mut estimate = estimate_transport(request)?;
    estimate.packaging = registry
        .packaging_requirements(request.material_type, request.is_ddr)
        .cloned();
    if estimate.packaging.is_none() {
        warn!(
            material = %request.material_type,
            ddr = request.is_ddr,
            "No packaging rules in reference data"
        );
    }
    Ok(estimate)
}
