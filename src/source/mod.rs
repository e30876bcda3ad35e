//! Input discovery.
//!
//! The data root holds one folder per category plus the reserved transects
//! folder:
//!
//! ```text
//! data/
//! ├── Elevation/
//! │   ├── dem_2012.asc
//! │   └── GeoData/          (created on demand)
//! ├── Water Level/
//! │   └── wl1.csv
//! └── Transects/
//!     └── lines.txt
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use transect_viewer::source::{DataSource, LocalDataSource, ScanOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let source = LocalDataSource::scan("data", &ScanOptions::default())?;
//!     for category in source.categories() {
//!         for file in source.category_files(&category.name) {
//!             println!("{}: {} ({:?})", category.name, file.name, file.kind);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod local;

pub use local::{LocalDataSource, ScanOptions};

use std::path::PathBuf;

use crate::convert::FileKind;

/// A data category folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Folder name, also the legend label.
    pub name: String,
    pub dir: PathBuf,
}

/// A raw source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File name including extension.
    pub name: String,
    pub path: PathBuf,
    pub kind: FileKind,
}

impl SourceFile {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = FileKind::classify(&path);
        Self { name, path, kind }
    }
}

/// Where categories and transect files come from.
pub trait DataSource {
    /// Categories in display order.
    fn categories(&self) -> &[Category];

    /// Transect files in display order.
    fn transect_files(&self) -> &[SourceFile];

    /// Files directly inside a top-level folder, sorted by name.
    ///
    /// Listed on every call so files added while running are picked up.
    fn folder_files(&self, folder: &str) -> Vec<SourceFile>;

    fn category(&self, name: &str) -> Option<&Category> {
        self.categories().iter().find(|c| c.name == name)
    }

    /// Files of a known category; empty for unknown names.
    fn category_files(&self, name: &str) -> Vec<SourceFile> {
        if self.category(name).is_none() {
            return Vec::new();
        }
        self.folder_files(name)
    }

    fn transect_file(&self, name: &str) -> Option<&SourceFile> {
        self.transect_files().iter().find(|f| f.name == name)
    }
}
