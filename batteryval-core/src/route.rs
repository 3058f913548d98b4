//! Route feasibility: which lanes are open, under which rules, needing which paperwork.

use crate::reference::RouteRegistry;
use batteryval_schemas::{
    route::{route_key, PermitDescriptor, RouteRecord, RouteRule, Severity},
    transport::MaterialType,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

pub const OECD_GROUP: &str = "OECD";
pub const NON_OECD_GROUP: &str = "NON_OECD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "until", rename_all = "snake_case")]
pub enum RouteStatus {
    Allowed,
    /// Open, but closes on the given date.
    AllowedUntil(NaiveDate),
    Restricted,
    Blocked,
    Unknown,
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteStatus::Allowed => f.write_str("allowed"),
            RouteStatus::AllowedUntil(date) => write!(f, "allowed until {}", date),
            RouteStatus::Restricted => f.write_str("restricted"),
            RouteStatus::Blocked => f.write_str("blocked"),
            RouteStatus::Unknown => f.write_str("unknown"),
        }
    }
}

/// Resolves a stored rule against the evaluation date.
///
/// A time-gated lane is blocked from its effective date onwards.
pub fn resolve_status(rule: &RouteRule, today: NaiveDate) -> RouteStatus {
    match rule {
        RouteRule::Allowed => RouteStatus::Allowed,
        RouteRule::Restricted => RouteStatus::Restricted,
        RouteRule::Blocked => RouteStatus::Blocked,
        RouteRule::AllowedUntil { effective_date } if today < *effective_date => {
            RouteStatus::AllowedUntil(*effective_date)
        }
        RouteRule::AllowedUntil { .. } => RouteStatus::Blocked,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteAdvisory {
    pub origin: String,
    pub destination: String,
    pub material: MaterialType,
    pub evaluated_on: NaiveDate,
    /// Key of the reference record that matched, e.g. `EU->NON_OECD`.
    pub matched_route: Option<String>,
    pub status: RouteStatus,
    pub requirements: Vec<String>,
    pub permits: Vec<PermitDescriptor>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
    pub processing_time_days: Option<String>,
    pub legal_basis: Option<String>,
    pub reference_version: String,
}

impl RouteAdvisory {
    pub fn is_allowed(&self) -> bool {
        matches!(
            self.status,
            RouteStatus::Allowed | RouteStatus::AllowedUntil(_)
        )
    }
}

/// Lookup keys to try, most specific first.
///
/// Origins are tried as the country then its bloc; destinations as the country,
/// its bloc, then its OECD grouping.
pub fn candidate_keys<R: RouteRegistry + ?Sized>(
    registry: &R,
    origin: &str,
    destination: &str,
) -> Vec<(String, String)> {
    let origin_country = registry.country(origin);
    let dest_country = registry.country(destination);

    let mut origins = vec![origin_country.map_or(origin.to_uppercase(), |c| c.code.to_uppercase())];
    if let Some(bloc) = origin_country.and_then(|c| c.bloc.as_ref()) {
        origins.push(bloc.to_uppercase());
    }

    let mut destinations =
        vec![dest_country.map_or(destination.to_uppercase(), |c| c.code.to_uppercase())];
    if let Some(country) = dest_country {
        if let Some(bloc) = &country.bloc {
            destinations.push(bloc.to_uppercase());
        }
        let group = if country.oecd_member {
            OECD_GROUP
        } else {
            NON_OECD_GROUP
        };
        destinations.push(group.to_string());
    }

    let mut keys = Vec::new();
    for d in &destinations {
        for o in &origins {
            let pair = (o.clone(), d.clone());
            if !keys.contains(&pair) {
                keys.push(pair);
            }
        }
    }
    keys
}

fn material_requirements(material: MaterialType) -> Vec<String> {
    let mut items = Vec::new();
    match material {
        MaterialType::BlackMass | MaterialType::WholeBatteries => {
            items.push("Hazardous waste classification (Basel Y-code / EU 16 06 01*, 19 14 02*)".to_string());
            items.push("Hazardous waste storage permit at origin and destination".to_string());
        }
        MaterialType::ProcessedMetals => {
            items.push(
                "Processed battery-grade material may qualify for reduced (non-waste) classification; confirm with the competent authority"
                    .to_string(),
            );
        }
    }
    if material == MaterialType::WholeBatteries {
        items.push("UN3480 packaging classification (Class 9, packing group II)".to_string());
        items.push("State of charge documentation".to_string());
    }
    items
}

fn time_gate_warning(record: &RouteRecord, status: RouteStatus) -> Option<String> {
    let RouteRule::AllowedUntil { effective_date } = record.rule else {
        return None;
    };
    let reason = record.reason.as_deref().unwrap_or("regulatory change");
    Some(match status {
        RouteStatus::AllowedUntil(_) => format!(
            "Currently allowed, but this route closes on {}: {}",
            effective_date, reason
        ),
        _ => format!("Blocked since {}: {}", effective_date, reason),
    })
}

/// Evaluates whether `material` may move from `origin` to `destination` on `today`.
///
/// Unknown lanes resolve to [`RouteStatus::Unknown`] with a generic advisory.
pub fn check_route<R: RouteRegistry + ?Sized>(
    registry: &R,
    origin: &str,
    destination: &str,
    material: MaterialType,
    today: NaiveDate,
) -> RouteAdvisory {
    let record = candidate_keys(registry, origin, destination)
        .into_iter()
        .find_map(|(o, d)| registry.route_record(&o, &d));

    let permits = registry
        .permit_checklist(origin, destination, material)
        .into_iter()
        .cloned()
        .collect();

    let mut advisory = RouteAdvisory {
        origin: origin.to_uppercase(),
        destination: destination.to_uppercase(),
        material,
        evaluated_on: today,
        matched_route: None,
        status: RouteStatus::Unknown,
        requirements: Vec::new(),
        permits,
        warnings: Vec::new(),
        info: Vec::new(),
        processing_time_days: None,
        legal_basis: None,
        reference_version: registry.version().to_string(),
    };

    let Some(record) = record else {
        warn!(
            route = %route_key(origin, destination),
            "Route not found in reference data"
        );
        advisory.warnings.push(
            "Route not in reference data. Consult the competent authorities of both countries."
                .to_string(),
        );
        advisory.requirements = material_requirements(material);
        return advisory;
    };

    advisory.status = resolve_status(&record.rule, today);
    advisory.matched_route = Some(record.key());
    advisory.requirements = record.requirements.clone();
    advisory.requirements.extend(material_requirements(material));
    advisory.processing_time_days = record.processing_time_days.clone();
    advisory.legal_basis = record.legal_basis.clone();

    if let Some(gate) = time_gate_warning(record, advisory.status) {
        advisory.warnings.push(gate);
    }
    for note in &record.notes {
        match note.severity {
            Severity::Warning => advisory.warnings.push(note.text.clone()),
            Severity::Info => advisory.info.push(note.text.clone()),
        }
    }

    debug!(
        route = %record.key(),
        status = %advisory.status,
        %today,
        "Route evaluated"
    );
    advisory
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::RegulatoryTable;
    use batteryval_schemas::route::{Country, RouteNote};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cutoff() -> NaiveDate {
        date(2026, 11, 9)
    }

    fn record(origin: &str, destination: &str, rule: RouteRule) -> RouteRecord {
        RouteRecord {
            origin: origin.to_string(),
            destination: destination.to_string(),
            rule,
            requirements: vec!["Basel PIC".to_string()],
            processing_time_days: Some("120-180".to_string()),
            notes: vec![],
            reason: Some("Black mass classified as hazardous waste".to_string()),
            legal_basis: None,
        }
    }

    fn country(code: &str, oecd: bool, bloc: Option<&str>) -> Country {
        Country {
            code: code.to_string(),
            name: code.to_string(),
            oecd_member: oecd,
            bloc: bloc.map(str::to_string),
            competent_authority: None,
        }
    }

    fn table() -> RegulatoryTable {
        let mut us_ca = record("US", "CA", RouteRule::Allowed);
        us_ca.notes = vec![
            RouteNote {
                text: "Well-established cross-border protocols".to_string(),
                severity: Severity::Info,
            },
            RouteNote {
                text: "Manifest must travel with the load".to_string(),
                severity: Severity::Warning,
            },
        ];
        RegulatoryTable::new(
            "test",
            vec![
                us_ca,
                record("EU", "NON_OECD", RouteRule::AllowedUntil { effective_date: cutoff() }),
                record("EU", "OECD", RouteRule::Allowed),
                record("DE", "CN", RouteRule::AllowedUntil { effective_date: cutoff() }),
                record("US", "CN", RouteRule::Restricted),
            ],
            vec![
                country("US", true, None),
                country("CA", true, None),
                country("DE", true, Some("EU")),
                country("FR", true, Some("EU")),
                country("CN", false, None),
                country("IN", false, None),
                country("JP", true, None),
            ],
            vec![],
        )
    }

    #[test]
    fn time_gate_flips_on_the_effective_date() {
        let rule = RouteRule::AllowedUntil {
            effective_date: cutoff(),
        };
        let day_before = cutoff().pred_opt().unwrap();
        let day_after = cutoff().succ_opt().unwrap();

        assert_eq!(resolve_status(&rule, day_before), RouteStatus::AllowedUntil(cutoff()));
        assert_eq!(resolve_status(&rule, cutoff()), RouteStatus::Blocked);
        assert_eq!(resolve_status(&rule, day_after), RouteStatus::Blocked);
    }

    #[test]
    fn same_lane_changes_verdict_across_the_cutoff() {
        let table = table();
        let before = check_route(&table, "DE", "CN", MaterialType::BlackMass, date(2026, 11, 8));
        let after = check_route(&table, "DE", "CN", MaterialType::BlackMass, date(2026, 11, 10));

        assert!(before.is_allowed());
        assert!(before.warnings[0].contains("closes on 2026-11-09"));
        assert!(!after.is_allowed());
        assert_eq!(after.status, RouteStatus::Blocked);
        assert!(after.warnings[0].starts_with("Blocked since 2026-11-09"));
    }

    #[test]
    fn bloc_and_oecd_group_fallbacks() {
        let table = table();
        let to_india = check_route(&table, "FR", "IN", MaterialType::BlackMass, date(2026, 1, 1));
        assert_eq!(to_india.matched_route.as_deref(), Some("EU->NON_OECD"));

        let to_japan = check_route(&table, "fr", "jp", MaterialType::BlackMass, date(2027, 1, 1));
        assert_eq!(to_japan.matched_route.as_deref(), Some("EU->OECD"));
        assert_eq!(to_japan.status, RouteStatus::Allowed);

        let keys = candidate_keys(&table, "DE", "CN");
        assert_eq!(
            keys,
            vec![
                ("DE".to_string(), "CN".to_string()),
                ("EU".to_string(), "CN".to_string()),
                ("DE".to_string(), "NON_OECD".to_string()),
                ("EU".to_string(), "NON_OECD".to_string()),
            ]
        );
    }

    #[test]
    fn notes_split_by_severity() {
        let advisory = check_route(&table(), "US", "CA", MaterialType::ProcessedMetals, date(2026, 1, 1));
        assert_eq!(advisory.info, vec!["Well-established cross-border protocols"]);
        assert_eq!(advisory.warnings, vec!["Manifest must travel with the load"]);
        assert_eq!(advisory.requirements[0], "Basel PIC");
        assert!(advisory.requirements[1].contains("reduced"));
    }

    #[test]
    fn whole_battery_items_only_for_whole_batteries() {
        let table = table();
        let today = date(2026, 1, 1);
        let black_mass = check_route(&table, "US", "CN", MaterialType::BlackMass, today);
        let batteries = check_route(&table, "US", "CN", MaterialType::WholeBatteries, today);

        assert_eq!(black_mass.status, RouteStatus::Restricted);
        assert!(!black_mass.is_allowed());
        assert!(!black_mass.requirements.iter().any(|r| r.contains("UN3480")));
        assert!(batteries.requirements.iter().any(|r| r.contains("UN3480")));
        assert!(batteries.requirements.iter().any(|r| r.contains("State of charge")));
    }

    #[test]
    fn unknown_lane_is_an_advisory_not_an_error() {
        let advisory = check_route(&table(), "CA", "ZZ", MaterialType::BlackMass, date(2026, 1, 1));
        assert_eq!(advisory.status, RouteStatus::Unknown);
        assert!(advisory.matched_route.is_none());
        assert_eq!(advisory.warnings.len(), 1);
        assert!(!advisory.requirements.is_empty());
    }
}
