use anyhow::{Context, Result};
use batteryval_core::reference::RegulatoryTable;
use batteryval_schemas::{
    file_formats::{
        CountryFile, MarketDefaultsFile, PackagingFile, PermitFile, RouteFile, VersionedFile,
    },
    market::MarketDefaults,
    packaging::PackagingProfile,
    route::{Country, PermitSet, RouteRecord},
};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};
use tracing::{info, warn};

const MARKET_DEFAULTS_KEY: &str = "default";

/// The static reference data for one run: regulatory tables, packaging rules and
/// fallback prices.
pub struct KnowledgeBase {
    pub routes: BTreeMap<String, RouteRecord>,
    pub countries: BTreeMap<String, Country>,
    pub permit_sets: BTreeMap<String, PermitSet>,
    pub packaging: BTreeMap<String, PackagingProfile>,
    pub market_defaults: MarketDefaults,
    /// Distinct schema versions declared by the loaded files.
    pub schema_versions: BTreeSet<String>,
}

impl KnowledgeBase {
    /// Loads all data from the specified base directory.
    pub fn load(base_path: &str) -> Result<Self> {
        info!(path = base_path, "Loading knowledge base");
        let base = Path::new(base_path);
        let mut schema_versions = BTreeSet::new();

        let routes = load_yaml_files_into_map(
            base.join("1_routes"),
            &mut schema_versions,
            |file: RouteFile| file.routes,
            |item: &RouteRecord| item.key(),
        )?;
        let countries = load_yaml_files_into_map(
            base.join("2_countries"),
            &mut schema_versions,
            |file: CountryFile| file.countries,
            |item: &Country| item.code.to_uppercase(),
        )?;
        let permit_sets = load_yaml_files_into_map(
            base.join("3_permits"),
            &mut schema_versions,
            |file: PermitFile| file.permit_sets,
            |item: &PermitSet| format!("{}_{:?}", item.jurisdiction.to_uppercase(), item.direction),
        )?;
        let mut market = load_yaml_files_into_map(
            base.join("4_market"),
            &mut schema_versions,
            |file: MarketDefaultsFile| vec![file.market_defaults],
            |_: &MarketDefaults| MARKET_DEFAULTS_KEY.to_string(),
        )?;
        let packaging = load_yaml_files_into_map(
            base.join("5_packaging"),
            &mut schema_versions,
            |file: PackagingFile| file.packaging,
            |item: &PackagingProfile| format!("{:?}", item.class),
        )?;
        let market_defaults = market.remove(MARKET_DEFAULTS_KEY).unwrap_or_else(|| {
            warn!("No market defaults in knowledge base, using built-in reference prices");
            MarketDefaults::default()
        });

        info!(
            routes = routes.len(),
            countries = countries.len(),
            permit_sets = permit_sets.len(),
            packaging = packaging.len(),
            versions = ?schema_versions,
            "Knowledge base loaded"
        );
        Ok(Self {
            routes,
            countries,
            permit_sets,
            packaging,
            market_defaults,
            schema_versions,
        })
    }

    pub fn version_label(&self) -> String {
        self.schema_versions
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join("+")
    }

    /// Builds the lookup table route checks run against.
    pub fn regulatory_table(&self) -> RegulatoryTable {
        RegulatoryTable::new(
            self.version_label(),
            self.routes.values().cloned(),
            self.countries.values().cloned().collect(),
            self.permit_sets.values().cloned().collect(),
        )
        .with_packaging(self.packaging.values().cloned().collect())
    }
}

/// Generic helper to load all YAML files in a directory into a key-ordered map.
fn load_yaml_files_into_map<P, F, E, T, K>(
    dir_path: P,
    versions: &mut BTreeSet<String>,
    extract_vec: E,
    get_key: K,
) -> Result<BTreeMap<String, T>>
where
    P: AsRef<Path>,
    F: for<'de> serde::Deserialize<'de> + VersionedFile, // The file wrapper struct (e.g., RouteFile)
    E: Fn(F) -> Vec<T>,                                   // Extracts the items from the wrapper
    K: Fn(&T) -> String,                                  // Map key for an item
{
    let mut map = BTreeMap::new();
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir_path.as_ref())
        .with_context(|| format!("Failed to read directory: {:?}", dir_path.as_ref()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |s| s == "yaml" || s == "yml") {
            paths.push(path);
        }
    }
    // Later files override earlier ones, so the order must not depend on the filesystem
    paths.sort();

    for path in paths {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        let file_wrapper: F = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {:?}", path))?;
        versions.insert(file_wrapper.schema_version().to_string());

        for item in extract_vec(file_wrapper) {
            let key = get_key(&item);
            if map.insert(key.clone(), item).is_some() {
                warn!(%key, file = ?path, "Duplicate knowledge base entry overridden");
            }
        }
    }
    Ok(map)
}
