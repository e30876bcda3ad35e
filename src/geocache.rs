//! Derived-artifact cache on disk.
//!
//! Every converted file lives beside its source:
//! `<source folder>/<GeoData>/<source stem>.<ext>`. An artifact that exists
//! is reused as-is; nothing checks it against the source's modification
//! time, so editing a source file requires deleting its artifact.
//!
//! Artifacts are first written to `<artifact>.partial` and renamed into
//! place, so an interrupted conversion never leaves a file that later
//! counts as a cache hit.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::DEFAULT_GEODATA_FOLDER;
use crate::error::{ViewerError, ViewerResult};

/// Kind of derived artifact, which fixes its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// GeoJSON points or lines.
    Vector,
    /// Single-band GeoTIFF.
    Raster,
}

impl ArtifactKind {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Vector => "geojson",
            Self::Raster => "tif",
        }
    }
}

/// Whether [`GeoCache::ensure`] found or produced the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Created,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    pub path: PathBuf,
    pub status: CacheStatus,
}

/// Resolves and populates artifact paths.
#[derive(Debug, Clone)]
pub struct GeoCache {
    folder_name: String,
}

impl Default for GeoCache {
    fn default() -> Self {
        Self::new(DEFAULT_GEODATA_FOLDER)
    }
}

impl GeoCache {
    #[must_use]
    pub fn new(folder_name: impl Into<String>) -> Self {
        Self {
            folder_name: folder_name.into(),
        }
    }

    /// Cache folder for sources in `source_dir`.
    #[must_use]
    pub fn folder_for(&self, source_dir: &Path) -> PathBuf {
        source_dir.join(&self.folder_name)
    }

    /// Artifact path for `source`.
    #[must_use]
    pub fn artifact_path(&self, source: &Path, kind: ArtifactKind) -> PathBuf {
        let dir = source.parent().unwrap_or_else(|| Path::new(""));
        let stem = source.file_stem().unwrap_or_default();
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(kind.extension());
        self.folder_for(dir).join(name)
    }

    /// Return the artifact for `source`, running `create` only when it does
    /// not exist yet.
    ///
    /// `create` receives the temporary path it must write to.
    ///
    /// # Errors
    /// Propagates the error of `create`, or an I/O error creating the cache
    /// folder or moving the artifact into place.
    pub fn ensure<F>(&self, source: &Path, kind: ArtifactKind, create: F) -> ViewerResult<CachedArtifact>
    where
        F: FnOnce(&Path) -> ViewerResult<()>,
    {
        let path = self.artifact_path(source, kind);
        if path.exists() {
            debug!(path = %path.display(), "Artifact cache hit");
            return Ok(CachedArtifact {
                path,
                status: CacheStatus::Hit,
            });
        }

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| ViewerError::io(dir, e))?;
        }

        let partial = partial_path(&path);
        if let Err(e) = create(&partial) {
            // Best effort: the partial file may not exist
            let _ = std::fs::remove_file(&partial);
            return Err(e);
        }
        std::fs::rename(&partial, &path).map_err(|e| ViewerError::io(&path, e))?;

        info!(source = %source.display(), path = %path.display(), "Created artifact");
        Ok(CachedArtifact {
            path,
            status: CacheStatus::Created,
        })
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}
