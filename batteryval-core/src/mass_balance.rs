use crate::{
    chemistry::Chemistry,
    error::{ensure_fraction, ValuatorError},
};
use batteryval_schemas::{
    assay::AssayProfile,
    feedstock::{AssayBasis, FeedstockBatch},
    metal::Metal,
    process::ProcessConfig,
};
use serde::Serialize;
use std::{collections::BTreeMap, fmt};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetalBalance {
    pub contained_mass_kg: f64,
    /// Percent of concentrate weight.
    pub effective_grade_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MassBalance {
    pub concentrate_weight_kg: f64,
    pub metals: BTreeMap<Metal, MetalBalance>,
}

impl MassBalance {
    pub fn contained(&self, metal: Metal) -> f64 {
        self.metals.get(&metal).map_or(0.0, |b| b.contained_mass_kg)
    }

    pub fn grade(&self, metal: Metal) -> f64 {
        self.metals.get(&metal).map_or(0.0, |b| b.effective_grade_pct)
    }

    pub fn total_grade_pct(&self) -> f64 {
        self.metals.values().map(|b| b.effective_grade_pct).sum()
    }

    pub fn total_contained_kg(&self) -> f64 {
        self.metals.values().map(|b| b.contained_mass_kg).sum()
    }
}

/// A non-fatal observation about the assay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GradeWarning {
    GradeAboveTypical {
        metal: Metal,
        grade_pct: f64,
        typical_max_pct: f64,
    },
    TotalAbove100 {
        total_pct: f64,
    },
}

impl fmt::Display for GradeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeWarning::GradeAboveTypical {
                metal,
                grade_pct,
                typical_max_pct,
            } => write!(
                f,
                "{} grade ({:.1}%) exceeds typical black mass maximum of {:.0}%",
                metal, grade_pct, typical_max_pct
            ),
            GradeWarning::TotalAbove100 { total_pct } => {
                write!(f, "Total metal content ({:.1}%) exceeds 100%", total_pct)
            }
        }
    }
}

pub fn validate_inputs(
    batch: &FeedstockBatch,
    assay: &AssayProfile,
    config: &ProcessConfig,
) -> Result<(), ValuatorError> {
    if !(batch.gross_weight_kg.is_finite() && batch.gross_weight_kg > 0.0) {
        return Err(ValuatorError::NonPositiveWeight(batch.gross_weight_kg));
    }
    if assay.is_empty() {
        return Err(ValuatorError::EmptyAssay);
    }
    for (metal, fraction) in assay.iter() {
        ensure_fraction(&format!("assay.{}", metal.symbol()), fraction)?;
    }
    ensure_fraction("yield_fraction", config.yield_fraction)?;
    ensure_fraction("mechanical_recovery_fraction", config.mechanical_recovery_fraction)?;
    ensure_fraction("hydromet_recovery_fraction", config.hydromet_recovery_fraction)?;
    Ok(())
}

/// Computes contained metal and effective black mass grade for every tracked metal.
///
/// Grades are reported as computed and never clamped; anything implausible is left to
/// [`grade_warnings`].
pub fn compute(
    batch: &FeedstockBatch,
    assay: &AssayProfile,
    config: &ProcessConfig,
) -> Result<MassBalance, ValuatorError> {
    validate_inputs(batch, assay, config)?;

    let gross = batch.gross_weight_kg;
    let concentrate = gross * config.yield_fraction;

    let metals = Metal::ALL
        .iter()
        .map(|&metal| {
            let fraction = assay.fraction(metal);
            let balance = match batch.assay_basis {
                AssayBasis::WholeMaterial => {
                    let contained = gross * fraction * config.mechanical_recovery_fraction;
                    let grade = if concentrate > 0.0 {
                        contained / concentrate * 100.0
                    } else {
                        0.0
                    };
                    MetalBalance {
                        contained_mass_kg: contained,
                        effective_grade_pct: grade,
                    }
                }
                // The sample is already post-shred, so mechanical recovery is baked in
                AssayBasis::Concentrate => MetalBalance {
                    contained_mass_kg: concentrate * fraction,
                    effective_grade_pct: fraction * 100.0,
                },
            };
            (metal, balance)
        })
        .collect();

    Ok(MassBalance {
        concentrate_weight_kg: concentrate,
        metals,
    })
}

fn typical_max_grade(metal: Metal, chemistry: Chemistry) -> Option<f64> {
    match (chemistry, metal) {
        (Chemistry::Lfp, Metal::Iron) => Some(40.0),
        (Chemistry::Lfp, Metal::Lithium) => Some(10.0),
        (Chemistry::Lfp, _) => None,
        (_, Metal::Nickel) => Some(60.0),
        (_, Metal::Cobalt) => Some(25.0),
        (_, Metal::Lithium) => Some(10.0),
        _ => None,
    }
}

pub fn grade_warnings(balance: &MassBalance, chemistry: Chemistry) -> Vec<GradeWarning> {
    let mut warnings: Vec<GradeWarning> = balance
        .metals
        .iter()
        .filter_map(|(&metal, b)| {
            let max = typical_max_grade(metal, chemistry)?;
            (b.effective_grade_pct > max).then_some(GradeWarning::GradeAboveTypical {
                metal,
                grade_pct: b.effective_grade_pct,
                typical_max_pct: max,
            })
        })
        .collect();

    let total = balance.total_grade_pct();
    if total > 100.0 {
        warnings.push(GradeWarning::TotalAbove100 { total_pct: total });
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use batteryval_schemas::feedstock::FeedType;

    fn batch(basis: AssayBasis) -> FeedstockBatch {
        FeedstockBatch {
            gross_weight_kg: 1000.0,
            feed_type: FeedType::Cells,
            assay_basis: basis,
            electrolyte_present: false,
        }
    }

    fn nmc_assay() -> AssayProfile {
        AssayProfile::new()
            .with(Metal::Nickel, 0.12)
            .with(Metal::Cobalt, 0.04)
            .with(Metal::Lithium, 0.015)
            .with(Metal::Manganese, 0.03)
    }

    #[test]
    fn whole_material_basis_applies_mechanical_recovery() {
        let config = ProcessConfig {
            yield_fraction: 0.4,
            mechanical_recovery_fraction: 0.9,
            ..ProcessConfig::default()
        };
        let balance = compute(&batch(AssayBasis::WholeMaterial), &nmc_assay(), &config).unwrap();

        assert!((balance.concentrate_weight_kg - 400.0).abs() < 1e-9);
        assert!((balance.contained(Metal::Nickel) - 108.0).abs() < 1e-9);
        assert!((balance.grade(Metal::Nickel) - 27.0).abs() < 1e-9);
    }

    #[test]
    fn concentrate_basis_reports_assay_as_grade() {
        let config = ProcessConfig {
            yield_fraction: 0.5,
            mechanical_recovery_fraction: 0.5,
            ..ProcessConfig::default()
        };
        let balance = compute(&batch(AssayBasis::Concentrate), &nmc_assay(), &config).unwrap();

        assert!((balance.contained(Metal::Nickel) - 60.0).abs() < 1e-9);
        assert!((balance.grade(Metal::Nickel) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn mass_balance_identity_holds() {
        let config = ProcessConfig {
            yield_fraction: 0.37,
            mechanical_recovery_fraction: 0.93,
            ..ProcessConfig::default()
        };
        for basis in [AssayBasis::WholeMaterial, AssayBasis::Concentrate] {
            let balance = compute(&batch(basis), &nmc_assay(), &config).unwrap();
            let from_mass = balance.total_contained_kg() / balance.concentrate_weight_kg * 100.0;
            assert!(balance.total_grade_pct() >= 0.0);
            assert!((balance.total_grade_pct() - from_mass).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_yield_gives_zero_grade_not_nan() {
        let config = ProcessConfig {
            yield_fraction: 0.0,
            ..ProcessConfig::default()
        };
        let balance = compute(&batch(AssayBasis::WholeMaterial), &nmc_assay(), &config).unwrap();
        assert_eq!(balance.grade(Metal::Nickel), 0.0);
        assert!(balance.contained(Metal::Nickel) > 0.0);
    }

    #[test]
    fn grades_are_not_clamped() {
        // 30 % nickel in the cells but only 20 % of the cells end up as black mass
        let config = ProcessConfig {
            yield_fraction: 0.2,
            ..ProcessConfig::default()
        };
        let assay = AssayProfile::new().with(Metal::Nickel, 0.3);
        let balance = compute(&batch(AssayBasis::WholeMaterial), &assay, &config).unwrap();

        assert!((balance.grade(Metal::Nickel) - 150.0).abs() < 1e-9);
        let warnings = grade_warnings(&balance, Chemistry::Nmc);
        assert_eq!(warnings.len(), 2);
        assert!(matches!(warnings[1], GradeWarning::TotalAbove100 { .. }));
    }

    #[test]
    fn lfp_bounds_check_iron_not_nickel() {
        let assay = AssayProfile::new().with(Metal::Iron, 0.45).with(Metal::Lithium, 0.04);
        let balance = compute(&batch(AssayBasis::Concentrate), &assay, &ProcessConfig::default()).unwrap();
        let warnings = grade_warnings(&balance, Chemistry::Lfp);
        assert_eq!(warnings.len(), 1);
        match &warnings[0] {
            GradeWarning::GradeAboveTypical { metal, grade_pct, .. } => {
                assert_eq!(*metal, Metal::Iron);
                assert!((grade_pct - 45.0).abs() < 1e-9);
            }
            other => panic!("unexpected warning {other}"),
        }
    }

    #[test]
    fn rejects_bad_inputs() {
        let mut bad = batch(AssayBasis::Concentrate);
        bad.gross_weight_kg = 0.0;
        assert!(matches!(
            compute(&bad, &nmc_assay(), &ProcessConfig::default()),
            Err(ValuatorError::NonPositiveWeight(_))
        ));

        let over = AssayProfile::new().with(Metal::Nickel, 1.2);
        assert!(matches!(
            compute(&batch(AssayBasis::Concentrate), &over, &ProcessConfig::default()),
            Err(ValuatorError::FractionOutOfRange { .. })
        ));

        assert!(matches!(
            compute(&batch(AssayBasis::Concentrate), &AssayProfile::new(), &ProcessConfig::default()),
            Err(ValuatorError::EmptyAssay)
        ));
    }
}
