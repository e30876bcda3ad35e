//! Viewer configuration.
//!
//! Every tunable of the pipeline lives in one [`ViewerConfig`] that can be
//! loaded from TOML. Every field has a default, so a file only needs to name
//! what differs.
//!
//! ```toml
//! data_dir = "/srv/elwha"
//! latitude_columns = ["Latitude", "lat"]
//! longitude_columns = ["Longitude", "lon"]
//! time_series_folder = "Elevation"
//! geotiff_compression = "deflate"
//!
//! [colors]
//! "Water Level" = "#1f77b4"
//!
//! [[basemaps]]
//! name = "Satellite"
//! url = "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{Z}/{Y}/{X}"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::geotiff_writer::GeoTiffCompression;

/// Folder name reserved for transect files inside the data root.
pub const DEFAULT_TRANSECTS_FOLDER: &str = "Transects";
/// Folder name of the derived-artifact cache beside each source folder.
pub const DEFAULT_GEODATA_FOLDER: &str = "GeoData";

/// A named web map tile source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasemapOption {
    pub name: String,
    /// XYZ tile URL template.
    pub url: String,
}

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Root directory holding one subfolder per data category.
    pub data_dir: PathBuf,
    /// Accepted names for the latitude column of point tables.
    pub latitude_columns: Vec<String>,
    /// Accepted names for the longitude column of point tables.
    pub longitude_columns: Vec<String>,
    /// Per-category color overrides.
    pub colors: BTreeMap<String, String>,
    /// Ordered basemap choices; the first one is the default.
    pub basemaps: Vec<BasemapOption>,
    pub transects_folder: String,
    pub geodata_folder: String,
    /// Category folder whose files are sampled along a clicked transect.
    pub time_series_folder: Option<String>,
    /// Initial geometry of the editable user-drawn transect (EPSG:32148).
    pub user_transect: [Point; 2],
    pub geotiff_compression: GeoTiffCompression,
    /// Maximum number of memoized layers; `None` keeps them for the process lifetime.
    pub layer_cache_capacity: Option<usize>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            latitude_columns: vec![
                "Latitude".to_string(),
                "latitude".to_string(),
                "Lat".to_string(),
                "lat".to_string(),
            ],
            longitude_columns: vec![
                "Longitude".to_string(),
                "longitude".to_string(),
                "Long".to_string(),
                "Lon".to_string(),
                "lon".to_string(),
            ],
            colors: BTreeMap::new(),
            basemaps: vec![BasemapOption {
                name: "Default".to_string(),
                url: "https://tile.openstreetmap.org/{Z}/{X}/{Y}.png".to_string(),
            }],
            transects_folder: DEFAULT_TRANSECTS_FOLDER.to_string(),
            geodata_folder: DEFAULT_GEODATA_FOLDER.to_string(),
            time_series_folder: None,
            user_transect: [
                Point::new(296_856.91, 131_388.77),
                Point::new(296_416.54, 132_035.85),
            ],
            geotiff_compression: GeoTiffCompression::None,
            layer_cache_capacity: None,
        }
    }
}

impl ViewerConfig {
    /// Default configuration rooted at `data_dir`.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.basemaps.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one basemap must be configured".to_string(),
            ));
        }
        if self.latitude_columns.is_empty() || self.longitude_columns.is_empty() {
            return Err(ConfigError::Invalid(
                "latitude_columns and longitude_columns must not be empty".to_string(),
            ));
        }
        if self.geodata_folder.trim().is_empty() || self.transects_folder.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "folder names must not be empty".to_string(),
            ));
        }
        if self.layer_cache_capacity == Some(0) {
            return Err(ConfigError::Invalid(
                "layer_cache_capacity must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of the reserved transects folder.
    #[must_use]
    pub fn transects_dir(&self) -> PathBuf {
        self.data_dir.join(&self.transects_folder)
    }
}

/// Errors raised while loading a [`ViewerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.basemaps[0].name, "Default");
        assert_eq!(config.transects_folder, "Transects");
        assert_eq!(config.geodata_folder, "GeoData");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ViewerConfig::from_toml_str(
            r##"
            data_dir = "/srv/elwha"
            latitude_columns = ["LAT"]
            time_series_folder = "Elevation"
            geotiff_compression = "deflate"

            [colors]
            "Water Level" = "#123456"
            "##,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/elwha"));
        assert_eq!(config.latitude_columns, vec!["LAT".to_string()]);
        assert!(config.longitude_columns.contains(&"Longitude".to_string()));
        assert_eq!(config.time_series_folder.as_deref(), Some("Elevation"));
        assert_eq!(config.colors.get("Water Level").map(String::as_str), Some("#123456"));
        assert!(matches!(config.geotiff_compression, GeoTiffCompression::Deflate));
    }

    #[test]
    fn test_basemaps_keep_file_order() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [[basemaps]]
            name = "Satellite"
            url = "https://example.com/sat/{Z}/{X}/{Y}.png"

            [[basemaps]]
            name = "Streets"
            url = "https://example.com/streets/{Z}/{X}/{Y}.png"
            "#,
        )
        .unwrap();

        let names: Vec<_> = config.basemaps.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Satellite", "Streets"]);
    }

    #[test]
    fn test_empty_basemaps_rejected() {
        let result = ViewerConfig::from_toml_str("basemaps = []");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_cache_capacity_rejected() {
        let result = ViewerConfig::from_toml_str("layer_cache_capacity = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_toml_reports_parse_error() {
        let result = ViewerConfig::from_toml_str("data_dir = [");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = ViewerConfig::from_toml_file("/nonexistent/viewer.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
