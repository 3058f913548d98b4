//! Cathode chemistry detection from an assay profile.

use batteryval_schemas::{assay::AssayProfile, metal::Metal};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chemistry {
    #[serde(rename = "NMC")]
    Nmc,
    #[serde(rename = "LFP")]
    Lfp,
    #[serde(rename = "LCO")]
    Lco,
    #[serde(rename = "NCA")]
    Nca,
    Unknown,
}

impl Chemistry {
    pub fn tag(self) -> &'static str {
        match self {
            Chemistry::Nmc => "NMC",
            Chemistry::Lfp => "LFP",
            Chemistry::Lco => "LCO",
            Chemistry::Nca => "NCA",
            Chemistry::Unknown => "Unknown",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Chemistry::Nmc => "Nickel Manganese Cobalt",
            Chemistry::Lfp => "Lithium Iron Phosphate",
            Chemistry::Lco => "Lithium Cobalt Oxide",
            Chemistry::Nca => "Nickel Cobalt Aluminum",
            Chemistry::Unknown => "Unknown",
        }
    }

    /// The metals that carry the value of this chemistry.
    pub fn primary_metals(self) -> &'static [Metal] {
        match self {
            Chemistry::Nmc => &[Metal::Nickel, Metal::Manganese, Metal::Cobalt, Metal::Lithium],
            Chemistry::Lfp => &[Metal::Lithium, Metal::Iron, Metal::Phosphorus],
            Chemistry::Lco => &[Metal::Lithium, Metal::Cobalt],
            Chemistry::Nca => &[Metal::Nickel, Metal::Cobalt, Metal::Aluminum, Metal::Lithium],
            Chemistry::Unknown => &[],
        }
    }
}

impl fmt::Display for Chemistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Classifies an assay with an ordered rule chain; the first matching rule wins.
pub fn classify(assay: &AssayProfile) -> Chemistry {
    let ni = assay.fraction(Metal::Nickel);
    let co = assay.fraction(Metal::Cobalt);
    let al = assay.fraction(Metal::Aluminum);
    let mn = assay.fraction(Metal::Manganese);
    let fe = assay.fraction(Metal::Iron);

    let nickel_or_cobalt_bearing = ni > 0.05 || co > 0.03;

    if fe > 0.20 && ni < 0.05 && co < 0.05 {
        Chemistry::Lfp
    } else if co > 0.35 && ni < 0.10 {
        Chemistry::Lco
    } else if ni > 0.40 && co > 0.05 && al > 0.005 {
        Chemistry::Nca
    } else if nickel_or_cobalt_bearing && mn > 0.01 {
        Chemistry::Nmc
    } else if nickel_or_cobalt_bearing {
        // Mn below detection still reads as a layered oxide
        Chemistry::Nmc
    } else {
        Chemistry::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assay(pairs: &[(Metal, f64)]) -> AssayProfile {
        pairs.iter().copied().collect()
    }

    #[test]
    fn lfp_profile() {
        let lfp = assay(&[(Metal::Iron, 0.30), (Metal::Lithium, 0.045)]);
        assert_eq!(classify(&lfp), Chemistry::Lfp);
        assert_eq!(classify(&lfp), classify(&lfp.clone()));
    }

    #[test]
    fn lco_profile() {
        let lco = assay(&[(Metal::Cobalt, 0.45), (Metal::Lithium, 0.06)]);
        assert_eq!(classify(&lco), Chemistry::Lco);
    }

    #[test]
    fn nca_needs_aluminum() {
        let nca = assay(&[(Metal::Nickel, 0.48), (Metal::Cobalt, 0.09), (Metal::Aluminum, 0.012)]);
        let no_al = assay(&[(Metal::Nickel, 0.48), (Metal::Cobalt, 0.09)]);
        assert_eq!(classify(&nca), Chemistry::Nca);
        assert_eq!(classify(&no_al), Chemistry::Nmc);
    }

    #[test]
    fn nmc_with_and_without_manganese() {
        let nmc = assay(&[(Metal::Nickel, 0.205), (Metal::Cobalt, 0.062), (Metal::Manganese, 0.048)]);
        let cobalt_only = assay(&[(Metal::Cobalt, 0.04)]);
        assert_eq!(classify(&nmc), Chemistry::Nmc);
        assert_eq!(classify(&cobalt_only), Chemistry::Nmc);
    }

    #[test]
    fn rule_order_prefers_lfp_over_nmc() {
        // Iron-rich with a little cobalt and manganese still reads as LFP
        let mixed = assay(&[(Metal::Iron, 0.25), (Metal::Cobalt, 0.04), (Metal::Manganese, 0.02)]);
        assert_eq!(classify(&mixed), Chemistry::Lfp);
    }

    #[test]
    fn empty_profile_is_unknown() {
        assert_eq!(classify(&AssayProfile::new()), Chemistry::Unknown);
        let copper_scrap = assay(&[(Metal::Copper, 0.6)]);
        assert_eq!(classify(&copper_scrap), Chemistry::Unknown);
    }
}
