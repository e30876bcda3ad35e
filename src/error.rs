//! Error taxonomy for the ingestion, cache and extraction pipeline.
//!
//! Every variant is scoped to a single source file or a single request. The
//! compositor recovers from all of them locally: a failed file is logged and
//! skipped, it never tears down the overlay.

use std::path::PathBuf;

use crate::config::ConfigError;
use crate::geotiff_writer::GeoTiffWriteError;

/// Coordinate axis a column lookup was performed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latitude => f.write_str("latitude"),
            Self::Longitude => f.write_str("longitude"),
        }
    }
}

/// Errors raised while converting, caching or reading survey data.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("GeoJSON error in {path}: {source}")]
    GeoJson {
        path: PathBuf,
        #[source]
        source: geojson::Error,
    },

    /// Zero or several candidate coordinate columns matched.
    #[error("expected exactly one {axis} column in {path} (candidates {candidates:?}), found {found:?}")]
    AmbiguousColumn {
        path: PathBuf,
        axis: Axis,
        candidates: Vec<String>,
        found: Vec<String>,
    },

    #[error("row {row} of {path} has an invalid {axis} value `{value}`")]
    InvalidCoordinate {
        path: PathBuf,
        row: usize,
        axis: Axis,
        value: String,
    },

    #[error("unsupported file format `.{extension}` for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("malformed ASCII grid {path}: {message}")]
    Grid { path: PathBuf, message: String },

    #[error("malformed transect record on line {line} of {path}: {message}")]
    TransectRecord {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("failed to write GeoTIFF {path}: {source}")]
    GeoTiffWrite {
        path: PathBuf,
        #[source]
        source: GeoTiffWriteError,
    },

    #[error("failed to read GeoTIFF {path}: {message}")]
    GeoTiffRead { path: PathBuf, message: String },

    /// A cached artifact exists but does not hold what its kind promises.
    #[error("unexpected content in artifact {path}: {message}")]
    Artifact { path: PathBuf, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("projection error: {0}")]
    Projection(String),

    #[error("unknown basemap `{0}`")]
    UnknownBasemap(String),

    #[error("unknown transect file `{0}`")]
    UnknownTransectFile(String),
}

impl ViewerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type ViewerResult<T> = Result<T, ViewerError>;
