use crate::{
    market::MarketDefaults,
    packaging::PackagingProfile,
    route::{Country, PermitSet, RouteRecord},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RouteFile {
    pub schema_version: String,
    pub routes: Vec<RouteRecord>,
}

#[derive(Debug, Deserialize)]
pub struct CountryFile {
    pub schema_version: String,
    pub countries: Vec<Country>,
}

#[derive(Debug, Deserialize)]
pub struct PermitFile {
    pub schema_version: String,
    pub permit_sets: Vec<PermitSet>,
}

#[derive(Debug, Deserialize)]
pub struct MarketDefaultsFile {
    pub schema_version: String,
    pub market_defaults: MarketDefaults,
}

#[derive(Debug, Deserialize)]
pub struct PackagingFile {
    pub schema_version: String,
    pub packaging: Vec<PackagingProfile>,
}

/// Every knowledge-base file declares the schema it was written against.
pub trait VersionedFile {
    fn schema_version(&self) -> &str;
}

impl VersionedFile for RouteFile {
    fn schema_version(&self) -> &str {
        &self.schema_version
    }
}

impl VersionedFile for CountryFile {
    fn schema_version(&self) -> &str {
        &self.schema_version
    }
}

impl VersionedFile for PermitFile {
    fn schema_version(&self) -> &str {
        &self.schema_version
    }
}

impl VersionedFile for MarketDefaultsFile {
    fn schema_version(&self) -> &str {
        &self.schema_version
    }
}

impl VersionedFile for PackagingFile {
    fn schema_version(&self) -> &str {
        &self.schema_version
    }
}
