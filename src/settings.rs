use crate::error::LocatorError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use toml;
use url::Url;

/// Catalog and command parameters. Every field has a default, so a settings
/// file only needs to name the values it overrides.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LocatorSettings {
    pub endpoint: String,
    pub collection: String,
    pub asset_key: String,
    pub max_items: usize,
    pub target_resolution: [u32; 2],
    pub extents_srs: String,
    pub output_filename: String,
    /// End instant sent to the catalog in place of the caller's end date.
    pub pinned_end_date: Option<String>,
}

const SEARCH_API: &str = "https://earth-search.aws.element84.com/v0";
const SENTINEL_S2_L2A_COGS: &str = "sentinel-s2-l2a-cogs";
const PINNED_END_DATE: &str = "2023-01-31T00:00:00Z";

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            endpoint: SEARCH_API.to_string(),
            collection: SENTINEL_S2_L2A_COGS.to_string(),
            asset_key: "B04".to_string(),
            max_items: 10,
            target_resolution: [10, 10],
            extents_srs: "EPSG:4326".to_string(),
            output_filename: "test_output_b04.tif".to_string(),
            pinned_end_date: Some(PINNED_END_DATE.to_string()),
        }
    }
}

/// Fully spelled-out settings file, useful as a starting point for `--config`.
pub fn settings_toml() -> toml::Table {
    toml::toml! {
        // Element84 Earth Search, STAC API v0
        endpoint = "https://earth-search.aws.element84.com/v0"

        // Sentinel-2, Level 2A, COGs
        collection = "sentinel-s2-l2a-cogs"

        asset_key = "B04"

        max_items = 10

        target_resolution = [10, 10]

        extents_srs = "EPSG:4326"

        output_filename = "test_output_b04.tif"

        pinned_end_date = "2023-01-31T00:00:00Z"
    }
}

impl LocatorSettings {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, LocatorError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LocatorError::Config(format!("unable to read {}: {}", path.display(), e))
        })?;
        let settings: Self = toml::from_str(&content)
            .map_err(|e| LocatorError::Config(format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn write<P: AsRef<Path>>(self: &Self, path: P) -> Result<(), LocatorError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| LocatorError::Config(e.to_string()))?;
        fs::write(path, content).map_err(|e| LocatorError::Config(e.to_string()))?;
        Ok(())
    }

    pub fn from_template(table: &toml::Table) -> Result<Self, LocatorError> {
        let settings: Self =
            toml::from_str(&table.to_string()).map_err(|e| LocatorError::Config(e.to_string()))?;
        Ok(settings)
    }

    /// Item search endpoint of the configured STAC API.
    pub fn search_url(self: &Self) -> Result<Url, LocatorError> {
        let url = format!("{}/search", self.endpoint.trim_end_matches('/'));
        Url::parse(&url).map_err(|e| LocatorError::Config(format!("endpoint '{url}': {e}")))
    }

    fn validate(self: &Self) -> Result<(), LocatorError> {
        if self.max_items == 0 {
            return Err(LocatorError::Config("max_items must be at least 1".into()));
        }
        if self.asset_key.is_empty() {
            return Err(LocatorError::Config("asset_key must not be empty".into()));
        }
        self.search_url()?;
        Ok(())
    }
}
