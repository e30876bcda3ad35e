//! File-type dispatch from raw source files to renderable layers.
//!
//! Conversion goes through the [`GeoCache`]: the artifact is produced once,
//! then the layer is always built by reading the artifact, so a fresh
//! conversion and a cache hit render the same.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ViewerConfig;
use crate::error::{ViewerError, ViewerResult};
use crate::geocache::{ArtifactKind, GeoCache};
use crate::geometry::projection::REGIONAL_EPSG;
use crate::geotiff_reader::read_geotiff;
use crate::geotiff_writer::GeoTiffCompression;
use crate::grid::read_ascii_grid;
use crate::layer::{ImageLayer, Layer, PathLayer, PointLayer};
use crate::points::{read_point_artifact, write_point_artifact};
use crate::style::{ImageStyle, PathStyle, PointStyle};
use crate::transect::{read_transect_artifact, write_transect_artifact};

/// What a source file converts into, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.csv` / `.txt` point table.
    PointTable,
    /// `.asc` ESRI ASCII grid.
    AsciiGrid,
    Unsupported,
}

impl FileKind {
    #[must_use]
    pub fn classify(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv" | "txt") => Self::PointTable,
            Some("asc") => Self::AsciiGrid,
            _ => Self::Unsupported,
        }
    }
}

fn unsupported(path: &Path) -> ViewerError {
    ViewerError::UnsupportedFormat {
        path: path.to_path_buf(),
        extension: path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

/// Converts source files into layers, caching artifacts on disk.
#[derive(Debug, Clone)]
pub struct Converter {
    cache: GeoCache,
    latitude_columns: Vec<String>,
    longitude_columns: Vec<String>,
    compression: GeoTiffCompression,
}

impl Converter {
    #[must_use]
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            cache: GeoCache::new(config.geodata_folder.clone()),
            latitude_columns: config.latitude_columns.clone(),
            longitude_columns: config.longitude_columns.clone(),
            compression: config.geotiff_compression,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &GeoCache {
        &self.cache
    }

    /// Convert a category data file.
    ///
    /// Returns `Ok(None)` for unsupported extensions.
    ///
    /// # Errors
    /// Any conversion or artifact read failure for this one file.
    pub fn convert_data_file(&self, source: &Path, label: &str, style: &PointStyle) -> ViewerResult<Option<Layer>> {
        match FileKind::classify(source) {
            FileKind::PointTable => self.point_layer(source, label, style).map(Some),
            FileKind::AsciiGrid => self.image_layer(source, label).map(Some),
            FileKind::Unsupported => {
                warn!(error = %unsupported(source), "No layer created");
                Ok(None)
            }
        }
    }

    /// Convert a transect file into a clickable path layer.
    ///
    /// Only `.txt` transect files are supported; others return `Ok(None)`.
    ///
    /// # Errors
    /// Any parse or artifact failure for this one file.
    pub fn convert_transect_file(&self, source: &Path, label: &str, style: PathStyle) -> ViewerResult<Option<Layer>> {
        let is_txt = source
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
        if !is_txt {
            warn!(error = %unsupported(source), "No transect layer created");
            return Ok(None);
        }

        let artifact = self.cache.ensure(source, ArtifactKind::Vector, |tmp| {
            write_transect_artifact(source, tmp).map(|_| ())
        })?;
        let segments = read_transect_artifact(&artifact.path)?;
        debug!(path = %source.display(), segments = segments.len(), status = ?artifact.status, "Transect layer ready");

        Ok(Some(Layer::Paths(PathLayer {
            label: label.to_string(),
            artifact: Some(artifact.path),
            crs: REGIONAL_EPSG,
            segments,
            style,
            editable: false,
        })))
    }

    fn point_layer(&self, source: &Path, label: &str, style: &PointStyle) -> ViewerResult<Layer> {
        let artifact = self.cache.ensure(source, ArtifactKind::Vector, |tmp| {
            write_point_artifact(source, tmp, &self.latitude_columns, &self.longitude_columns).map(|_| ())
        })?;
        let points = read_point_artifact(&artifact.path)?;
        debug!(path = %source.display(), points = points.len(), status = ?artifact.status, "Point layer ready");

        Ok(Layer::Points(PointLayer {
            label: label.to_string(),
            artifact: artifact.path,
            points,
            style: style.clone(),
        }))
    }

    fn image_layer(&self, source: &Path, label: &str) -> ViewerResult<Layer> {
        let artifact = self.cache.ensure(source, ArtifactKind::Raster, |tmp| {
            let raster = read_ascii_grid(source)?;
            raster
                .geotiff_writer()
                .compression(self.compression)
                .write(tmp)
                .map_err(|e| ViewerError::GeoTiffWrite {
                    path: tmp.to_path_buf(),
                    source: e,
                })
        })?;
        let raster = read_geotiff(&artifact.path)?;
        let bounds_wgs84 = raster.bounds_wgs84().map_err(ViewerError::Projection)?;
        debug!(
            path = %source.display(),
            width = raster.width,
            height = raster.height,
            status = ?artifact.status,
            "Image layer ready"
        );

        Ok(Layer::Image(ImageLayer {
            label: label.to_string(),
            artifact: artifact.path,
            crs: raster.crs,
            bounds: raster.bounds,
            bounds_wgs84,
            width: raster.width,
            height: raster.height,
            value_range: raster.value_range(),
            style: ImageStyle::default(),
            raster: Arc::new(raster),
        }))
    }
}
