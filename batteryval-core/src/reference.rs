//! Versioned regulatory reference data and the lookups route checks need.

use batteryval_schemas::{
    packaging::{PackagingClass, PackagingProfile},
    route::{route_key, Country, PermitDescriptor, PermitDirection, PermitSet, RouteRecord},
    transport::MaterialType,
};
use std::collections::HashMap;

/// Read access to route, country and permit reference data.
pub trait RouteRegistry {
    /// Version label of the loaded reference data.
    fn version(&self) -> &str;

    /// The record stored under exactly `origin -> destination`, if any.
    fn route_record(&self, origin: &str, destination: &str) -> Option<&RouteRecord>;

    /// Finds a country by code or name, ignoring case.
    fn country(&self, id: &str) -> Option<&Country>;

    /// Export permits of the origin followed by import permits of the destination,
    /// keeping only those that apply to `material`.
    fn permit_checklist(
        &self,
        origin: &str,
        destination: &str,
        material: MaterialType,
    ) -> Vec<&PermitDescriptor>;

    fn packaging(&self, class: PackagingClass) -> Option<&PackagingProfile>;

    /// Packaging rules for a material, DDR status taking precedence.
    fn packaging_requirements(
        &self,
        material: MaterialType,
        is_ddr: bool,
    ) -> Option<&PackagingProfile> {
        self.packaging(PackagingClass::for_material(material, is_ddr))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegulatoryTable {
    version: String,
    routes: HashMap<String, RouteRecord>,
    countries: Vec<Country>,
    permit_sets: Vec<PermitSet>,
    packaging: Vec<PackagingProfile>,
}

impl RegulatoryTable {
    pub fn new(
        version: impl Into<String>,
        routes: impl IntoIterator<Item = RouteRecord>,
        countries: Vec<Country>,
        permit_sets: Vec<PermitSet>,
    ) -> Self {
        Self {
            version: version.into(),
            routes: routes.into_iter().map(|r| (r.key(), r)).collect(),
            countries,
            permit_sets,
            packaging: Vec::new(),
        }
    }

    pub fn with_packaging(mut self, packaging: Vec<PackagingProfile>) -> Self {
        self.packaging = packaging;
        self
    }

    /// The country's own code plus its bloc, used to match permit jurisdictions.
    fn jurisdictions(&self, id: &str) -> Vec<String> {
        match self.country(id) {
            Some(country) => std::iter::once(country.code.to_uppercase())
                .chain(country.bloc.iter().map(|b| b.to_uppercase()))
                .collect(),
            None => vec![id.to_uppercase()],
        }
    }

    /// Matching permits, the country's own sets ahead of its bloc's.
    fn permits_for(
        &self,
        jurisdictions: &[String],
        direction: PermitDirection,
        material: MaterialType,
    ) -> Vec<&PermitDescriptor> {
        jurisdictions
            .iter()
            .flat_map(|j| {
                self.permit_sets.iter().filter(move |set| {
                    set.direction == direction && j.eq_ignore_ascii_case(&set.jurisdiction)
                })
            })
            .flat_map(|set| set.permits.iter())
            .filter(|permit| permit.applies_to(material))
            .collect()
    }
}

impl RouteRegistry for RegulatoryTable {
    fn version(&self) -> &str {
        &self.version
    }

    fn route_record(&self, origin: &str, destination: &str) -> Option<&RouteRecord> {
        self.routes.get(&route_key(origin, destination))
    }

    fn country(&self, id: &str) -> Option<&Country> {
        self.countries
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(id) || c.name.eq_ignore_ascii_case(id))
    }

    fn permit_checklist(
        &self,
        origin: &str,
        destination: &str,
        material: MaterialType,
    ) -> Vec<&PermitDescriptor> {
        let origin = self.jurisdictions(origin);
        let destination = self.jurisdictions(destination);
        let mut checklist = self.permits_for(&origin, PermitDirection::Export, material);
        checklist.extend(self.permits_for(&destination, PermitDirection::Import, material));
        checklist
    }

    fn packaging(&self, class: PackagingClass) -> Option<&PackagingProfile> {
        self.packaging.iter().find(|p| p.class == class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batteryval_schemas::route::{PermitRequirement, RouteRule};

    fn country(code: &str, name: &str, oecd: bool, bloc: Option<&str>) -> Country {
        Country {
            code: code.to_string(),
            name: name.to_string(),
            oecd_member: oecd,
            bloc: bloc.map(str::to_string),
            competent_authority: None,
        }
    }

    fn permit(name: &str, applies_to: Option<Vec<MaterialType>>) -> PermitDescriptor {
        PermitDescriptor {
            name: name.to_string(),
            agency: None,
            requirement: PermitRequirement::Always,
            processing_time: None,
            url: None,
            applies_to,
        }
    }

    fn table() -> RegulatoryTable {
        RegulatoryTable::new(
            "test",
            vec![RouteRecord {
                origin: "us".to_string(),
                destination: "CA".to_string(),
                rule: RouteRule::Allowed,
                requirements: vec![],
                processing_time_days: None,
                notes: vec![],
                reason: None,
                legal_basis: None,
            }],
            vec![
                country("US", "United States", true, None),
                country("DE", "Germany", true, Some("EU")),
            ],
            vec![
                PermitSet {
                    jurisdiction: "US".to_string(),
                    direction: PermitDirection::Export,
                    permits: vec![
                        permit("EPA AOC", None),
                        permit(
                            "Hazardous Waste Manifest",
                            Some(vec![MaterialType::BlackMass, MaterialType::WholeBatteries]),
                        ),
                    ],
                },
                PermitSet {
                    jurisdiction: "EU".to_string(),
                    direction: PermitDirection::Import,
                    permits: vec![permit("Waste Shipment Notification", None)],
                },
            ],
        )
    }

    #[test]
    fn route_keys_are_case_insensitive() {
        let table = table();
        assert!(table.route_record("US", "ca").is_some());
        assert!(table.route_record("CA", "US").is_none());
        assert_eq!(table.country("germany").map(|c| c.code.as_str()), Some("DE"));
    }

    #[test]
    fn checklist_uses_bloc_and_material() {
        let table = table();
        let names = |m| {
            table
                .permit_checklist("US", "DE", m)
                .into_iter()
                .map(|p| p.name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(
            names(MaterialType::BlackMass),
            vec!["EPA AOC", "Hazardous Waste Manifest", "Waste Shipment Notification"]
        );
        assert_eq!(
            names(MaterialType::ProcessedMetals),
            vec!["EPA AOC", "Waste Shipment Notification"]
        );
    }

    fn profile(class: PackagingClass, item: &str) -> PackagingProfile {
        PackagingProfile {
            class,
            description: None,
            un_classification: None,
            regulations: vec![],
            restrictions: vec![],
            items: vec![item.to_string()],
        }
    }

    #[test]
    fn packaging_follows_material_and_ddr() {
        let table = table().with_packaging(vec![
            profile(PackagingClass::LithiumBatteries, "Terminals isolated"),
            profile(PackagingClass::DdrBatteries, "Non-conductive inner packaging"),
            profile(PackagingClass::BlackMass, "UN-approved drums"),
        ]);
        let first_item = |m, ddr| {
            table
                .packaging_requirements(m, ddr)
                .map(|p| p.items[0].clone())
        };
        assert_eq!(
            first_item(MaterialType::WholeBatteries, false).as_deref(),
            Some("Terminals isolated")
        );
        assert_eq!(
            first_item(MaterialType::WholeBatteries, true).as_deref(),
            Some("Non-conductive inner packaging")
        );
        assert_eq!(
            first_item(MaterialType::ProcessedMetals, false).as_deref(),
            Some("UN-approved drums")
        );
        assert!(RegulatoryTable::default()
            .packaging_requirements(MaterialType::BlackMass, false)
            .is_none());
    }

    #[test]
    fn country_permits_precede_bloc_permits() {
        let table = RegulatoryTable::new(
            "test",
            vec![],
            vec![country("DE", "Germany", true, Some("EU"))],
            vec![
                PermitSet {
                    jurisdiction: "EU".to_string(),
                    direction: PermitDirection::Export,
                    permits: vec![permit("Annex VII Form", None)],
                },
                PermitSet {
                    jurisdiction: "DE".to_string(),
                    direction: PermitDirection::Export,
                    permits: vec![permit("Notification to the Land authority", None)],
                },
            ],
        );
        let names: Vec<&str> = table
            .permit_checklist("Germany", "US", MaterialType::BlackMass)
            .into_iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Notification to the Land authority", "Annex VII Form"]);
    }
}
