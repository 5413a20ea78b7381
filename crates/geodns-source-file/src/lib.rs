// # File Registry Source
//
// Loads the member registry and the region table from JSON fixtures on
// disk. The shapes match the registry exports this system reconciles from:
//
// - members file: `{"members": {"<id>": {...}}}` with string-encoded
//   numeric fields (level, active flag, coordinates)
// - regions file: `{"countries": [{"name": ..., "country_code": ...,
//   "latitude": "...", "longitude": "...", "zone_id": N}]}`
//
// Member fields stay raw strings here; the eligibility filter owns parsing
// and per-member exclusion. Region rows parse eagerly instead: a region
// without a valid zone id or coordinate cannot be assigned correctly, so a
// malformed row fails the whole load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use geodns_core::config::SourceConfig;
use geodns_core::model::{Coordinate, RawMember, Region};
use geodns_core::traits::{RegistrySource, RegistrySourceFactory};
use geodns_core::{Error, Result};

/// Top-level members file shape
#[derive(Debug, Deserialize)]
struct MembersFile {
    members: BTreeMap<String, RawMember>,
}

/// Top-level regions file shape
#[derive(Debug, Deserialize)]
struct RegionsFile {
    countries: Vec<RegionRow>,
}

/// One region row as exported.
///
/// The zone id key varies by provider export, so the historical names are
/// accepted as aliases. Coordinates arrive string-encoded like member
/// coordinates do.
#[derive(Debug, Deserialize)]
struct RegionRow {
    #[serde(default)]
    name: String,
    #[serde(default)]
    country_code: String,
    #[serde(default)]
    latitude: String,
    #[serde(default)]
    longitude: String,
    #[serde(alias = "geodns-id", alias = "easydns_id")]
    zone_id: Option<i64>,
}

impl RegionRow {
    fn into_region(self) -> Result<Region> {
        let zone_id = self.zone_id.ok_or_else(|| {
            Error::data_validation(format!("region {:?} has no zone id", self.name))
        })?;
        let lat: f64 = parse_coordinate(&self.latitude, "latitude", &self.name)?;
        let lon: f64 = parse_coordinate(&self.longitude, "longitude", &self.name)?;
        Ok(Region {
            name: self.name,
            country_code: self.country_code,
            location: Coordinate::new(lat, lon),
            zone_id,
        })
    }
}

fn parse_coordinate(raw: &str, field: &str, region: &str) -> Result<f64> {
    raw.parse().map_err(|_| {
        Error::data_validation(format!(
            "region {region:?} has unparseable {field}: {raw:?}"
        ))
    })
}

/// Registry source reading JSON fixtures from disk
#[derive(Debug)]
pub struct FileRegistrySource {
    members_path: PathBuf,
    regions_path: PathBuf,
}

impl FileRegistrySource {
    /// Create a source for the given fixture paths
    pub fn new(members_path: impl Into<PathBuf>, regions_path: impl Into<PathBuf>) -> Self {
        Self {
            members_path: members_path.into(),
            regions_path: regions_path.into(),
        }
    }

    async fn read_file(path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {e}", path.display()),
            ))
        })
    }
}

#[async_trait]
impl RegistrySource for FileRegistrySource {
    async fn load_members(&self) -> Result<BTreeMap<String, RawMember>> {
        let contents = Self::read_file(&self.members_path).await?;
        let file: MembersFile = serde_json::from_str(&contents)
            .map_err(|e| Error::data_validation(format!("malformed members file: {e}")))?;
        tracing::debug!(
            path = %self.members_path.display(),
            count = file.members.len(),
            "loaded member registry"
        );
        Ok(file.members)
    }

    async fn load_regions(&self) -> Result<Vec<Region>> {
        let contents = Self::read_file(&self.regions_path).await?;
        let file: RegionsFile = serde_json::from_str(&contents)
            .map_err(|e| Error::data_validation(format!("malformed regions file: {e}")))?;

        let mut regions = Vec::with_capacity(file.countries.len());
        for row in file.countries {
            regions.push(row.into_region()?);
        }
        tracing::debug!(
            path = %self.regions_path.display(),
            count = regions.len(),
            "loaded region table"
        );
        Ok(regions)
    }

    fn source_name(&self) -> &'static str {
        "file"
    }
}

/// Factory for creating file registry sources
pub struct FileSourceFactory;

impl RegistrySourceFactory for FileSourceFactory {
    fn create(&self, config: &SourceConfig) -> Result<Box<dyn RegistrySource>> {
        match config {
            SourceConfig::File {
                members_path,
                regions_path,
            } => {
                config.validate()?;
                Ok(Box::new(FileRegistrySource::new(members_path, regions_path)))
            }
            _ => Err(Error::config("invalid config for file registry source")),
        }
    }
}

/// Register the file source with a registry
pub fn register(registry: &geodns_core::ProviderRegistry) {
    registry.register_source("file", Box::new(FileSourceFactory));
}
