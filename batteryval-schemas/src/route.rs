//! Static regulatory reference records: routes, countries and permits.

use crate::transport::MaterialType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The regulatory rule attached to a route record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteRule {
    Allowed,
    Restricted,
    Blocked,
    /// Allowed until `effective_date`, blocked on and after it.
    AllowedUntil { effective_date: NaiveDate },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    #[default]
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteNote {
    pub text: String,
    #[serde(default)]
    pub severity: Severity,
}

/// A lane between an origin and a destination, either of which may be a country code
/// or a group label such as `EU` or `NON_OECD`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub origin: String,
    pub destination: String,
    pub rule: RouteRule,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub processing_time_days: Option<String>,
    #[serde(default)]
    pub notes: Vec<RouteNote>,
    /// Why a time-gated rule closes the route.
    pub reason: Option<String>,
    pub legal_basis: Option<String>,
}

impl RouteRecord {
    pub fn key(&self) -> String {
        route_key(&self.origin, &self.destination)
    }
}

pub fn route_key(origin: &str, destination: &str) -> String {
    format!("{}->{}", origin.to_uppercase(), destination.to_uppercase())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
    pub oecd_member: bool,
    /// Trade bloc whose rules apply to exports, e.g. `EU`.
    pub bloc: Option<String>,
    pub competent_authority: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PermitRequirement {
    Always,
    Conditional { condition: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitDescriptor {
    pub name: String,
    pub agency: Option<String>,
    pub requirement: PermitRequirement,
    pub processing_time: Option<String>,
    pub url: Option<String>,
    /// Materials this permit applies to; all materials when absent.
    pub applies_to: Option<Vec<MaterialType>>,
}

impl PermitDescriptor {
    pub fn applies_to(&self, material: MaterialType) -> bool {
        self.applies_to
            .as_ref()
            .map_or(true, |materials| materials.contains(&material))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitDirection {
    Export,
    Import,
}

/// The permits a country (or bloc) requires for one direction of movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitSet {
    pub jurisdiction: String,
    pub direction: PermitDirection,
    pub permits: Vec<PermitDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_time_gated_route() {
        let yaml = r#"
origin: EU
destination: NON_OECD
rule:
  type: allowed_until
  effective_date: 2026-11-09
requirements: [EU waste shipment consent]
processing_time_days: "120-180"
notes:
  - text: Export to OECD countries remains allowed
    severity: info
reason: Black mass classified as hazardous waste (191402*)
legal_basis: Commission Delegated Decision (EU) 2025/934
"#;
        let record: RouteRecord = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            record.rule,
            RouteRule::AllowedUntil {
                effective_date: NaiveDate::from_ymd_opt(2026, 11, 9).unwrap()
            }
        );
        assert_eq!(record.notes[0].severity, Severity::Info);
        assert_eq!(record.key(), "EU->NON_OECD");
    }

    #[test]
    fn note_severity_defaults_to_warning() {
        let note: RouteNote = serde_json::from_str(r#"{"text": "Long lead times"}"#).unwrap();
        assert_eq!(note.severity, Severity::Warning);
    }
}
