//! Local filesystem data source.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{ViewerConfig, DEFAULT_GEODATA_FOLDER, DEFAULT_TRANSECTS_FOLDER};
use crate::error::{ViewerError, ViewerResult};

use super::{Category, DataSource, SourceFile};

/// Options for scanning a data root.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Folder holding transect files, excluded from categories.
    pub transects_folder: String,
    /// Cache folder name, never listed as a category or a file.
    pub geodata_folder: String,
    /// Whether to follow symbolic links
    pub follow_links: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            transects_folder: DEFAULT_TRANSECTS_FOLDER.to_string(),
            geodata_folder: DEFAULT_GEODATA_FOLDER.to_string(),
            follow_links: true,
        }
    }
}

impl ScanOptions {
    #[must_use]
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            transects_folder: config.transects_folder.clone(),
            geodata_folder: config.geodata_folder.clone(),
            ..Self::default()
        }
    }
}

/// Data source backed by a local directory tree.
#[derive(Debug, Clone)]
pub struct LocalDataSource {
    root: PathBuf,
    options: ScanOptions,
    categories: Vec<Category>,
    transect_files: Vec<SourceFile>,
}

impl LocalDataSource {
    /// Scan `root` for categories and transect files.
    ///
    /// # Errors
    /// Returns an error if the root directory does not exist.
    pub fn scan<P: AsRef<Path>>(root: P, options: &ScanOptions) -> ViewerResult<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ViewerError::io(
                root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "data directory does not exist"),
            ));
        }

        let categories: Vec<Category> = Self::walk(root, options.follow_links)
            .filter(|entry| entry.file_type().is_dir())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                if name == options.transects_folder || name == options.geodata_folder {
                    return None;
                }
                Some(Category {
                    name,
                    dir: entry.into_path(),
                })
            })
            .collect();

        let transects_dir = root.join(&options.transects_folder);
        let transect_files = if transects_dir.is_dir() {
            Self::list_files(&transects_dir, options.follow_links)
        } else {
            Vec::new()
        };

        debug!(
            root = %root.display(),
            categories = categories.len(),
            transect_files = transect_files.len(),
            "Scanned data directory"
        );

        Ok(Self {
            root: root.to_path_buf(),
            options: options.clone(),
            categories,
            transect_files,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn walk(dir: &Path, follow_links: bool) -> impl Iterator<Item = walkdir::DirEntry> {
        WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    None
                }
            })
    }

    fn list_files(dir: &Path, follow_links: bool) -> Vec<SourceFile> {
        Self::walk(dir, follow_links)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| SourceFile::new(entry.into_path()))
            .collect()
    }
}

impl DataSource for LocalDataSource {
    fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn transect_files(&self) -> &[SourceFile] {
        &self.transect_files
    }

    fn folder_files(&self, folder: &str) -> Vec<SourceFile> {
        if folder == self.options.geodata_folder {
            return Vec::new();
        }
        let dir = self.root.join(folder);
        if !dir.is_dir() {
            return Vec::new();
        }
        Self::list_files(&dir, self.options.follow_links)
    }
}
