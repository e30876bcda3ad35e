//! Layer compositor.
//!
//! [`MapCompositor`] owns every piece of mutable viewer state: the layer
//! memo, the click trackers, the current selections and the derived
//! overlays. Each setter recomputes the overlays that depend on it, so the
//! getters are always current.
//!
//! The reference files of the time-series folder are listed once, when the
//! compositor is built, and every time-series overlay has one curve and one
//! scatter per file of that list. Files added to the folder later are picked
//! up by building a new compositor.
//!
//! # Example
//!
//! ```rust,no_run
//! use transect_viewer::compositor::MapCompositor;
//! use transect_viewer::config::ViewerConfig;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut config = ViewerConfig::with_data_dir("data");
//!     config.time_series_folder = Some("Elevation".to_string());
//!
//!     let mut map = MapCompositor::new(config)?;
//!     map.set_categories(&["Water Level"]);
//!     map.set_transects(&["lines.txt"]);
//!     println!("{}", serde_json::to_string(&map.overlay())?);
//!
//!     // The host reports a click on the third segment
//!     map.tap_transect("lines.txt", [2])?;
//!     let mut modal_opened = false;
//!     map.evaluate_clicks(&mut || modal_opened = true);
//!     println!("{}", serde_json::to_string(map.time_series())?);
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{BasemapOption, ConfigError, ViewerConfig};
use crate::convert::Converter;
use crate::error::{ViewerError, ViewerResult};
use crate::extract::extract_from_layer;
use crate::geometry::projection::REGIONAL_EPSG;
use crate::layer::{Layer, MapOverlay, OverlayOptions, PathLayer};
use crate::layer_cache::LayerCache;
use crate::selection::{SelectionOutcome, SelectionTracker};
use crate::source::{DataSource, LocalDataSource, ScanOptions, SourceFile};
use crate::style::{PathStyle, StyleBook};
use crate::timeseries::{DetailPipe, DetailViewHost, TimeSeriesOverlay, TransectDetail};
use crate::transect::TransectSegment;

/// Transect choice that shows the draggable user-drawn transect.
pub const USER_TRANSECT_OPTION: &str = "Create My Own Transect";

/// Options the host offers in its selection widgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choices {
    pub basemaps: Vec<String>,
    pub categories: Vec<String>,
    /// `None` when the data root has no transect files.
    pub transects: Option<Vec<String>>,
}

pub struct MapCompositor {
    config: ViewerConfig,
    source: LocalDataSource,
    converter: Converter,
    styles: StyleBook,
    layers: LayerCache,
    trackers: BTreeMap<String, SelectionTracker>,
    user_transect: Arc<Layer>,

    basemap: Arc<Layer>,
    category_layers: Vec<Arc<Layer>>,
    transect_layers: Vec<Arc<Layer>>,

    /// Fixed at construction; the time-series shape follows it.
    reference_files: Vec<SourceFile>,
    detail: DetailPipe,
    time_series: TimeSeriesOverlay,
}

impl MapCompositor {
    /// Scan the configured data root and build the initial (empty) overlays.
    ///
    /// This is also when the time-series reference files are listed.
    ///
    /// # Errors
    /// Fails if the configuration is invalid or the data root is missing.
    pub fn new(config: ViewerConfig) -> ViewerResult<Self> {
        config.validate()?;
        let source = LocalDataSource::scan(&config.data_dir, &ScanOptions::from_config(&config))?;

        let category_names: Vec<String> = source.categories().iter().map(|c| c.name.clone()).collect();
        let transect_names: Vec<String> = source.transect_files().iter().map(|f| f.name.clone()).collect();
        let styles = StyleBook::new(&category_names, &transect_names, &config.colors);

        let trackers = transect_names
            .iter()
            .map(|name| (name.clone(), SelectionTracker::new()))
            .collect();

        let [start, end] = config.user_transect;
        let user_transect = Arc::new(Layer::Paths(PathLayer {
            label: USER_TRANSECT_OPTION.to_string(),
            artifact: None,
            crs: REGIONAL_EPSG,
            segments: vec![TransectSegment::new(0, start, end)],
            style: PathStyle::user_drawn(),
            editable: true,
        }));

        let basemap = Arc::new(Layer::Basemap(first_basemap(&config)?));

        let reference_files = config
            .time_series_folder
            .as_deref()
            .map(|folder| source.folder_files(folder))
            .unwrap_or_default();
        let reference_labels: Vec<&str> = reference_files.iter().map(|f| f.name.as_str()).collect();
        let time_series = TimeSeriesOverlay::placeholder(&reference_labels);

        info!(
            data_dir = %config.data_dir.display(),
            categories = category_names.len(),
            transect_files = transect_names.len(),
            reference_files = reference_files.len(),
            "Map compositor ready"
        );

        Ok(Self {
            converter: Converter::from_config(&config),
            layers: LayerCache::with_capacity(config.layer_cache_capacity),
            config,
            source,
            styles,
            trackers,
            user_transect,
            basemap,
            category_layers: Vec::new(),
            transect_layers: Vec::new(),
            reference_files,
            detail: DetailPipe::default(),
            time_series,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[must_use]
    pub fn source(&self) -> &LocalDataSource {
        &self.source
    }

    /// Widget options: basemaps, categories, and transect choices when any
    /// transect files exist (always ending with the user-drawn option).
    #[must_use]
    pub fn choices(&self) -> Choices {
        let transect_files = self.source.transect_files();
        let transects = (!transect_files.is_empty()).then(|| {
            transect_files
                .iter()
                .map(|f| f.name.clone())
                .chain(std::iter::once(USER_TRANSECT_OPTION.to_string()))
                .collect()
        });
        Choices {
            basemaps: self.config.basemaps.iter().map(|b| b.name.clone()).collect(),
            categories: self.source.categories().iter().map(|c| c.name.clone()).collect(),
            transects,
        }
    }

    /// Select a basemap by name; `None` selects the first configured one.
    ///
    /// # Errors
    /// [`ViewerError::UnknownBasemap`] for a name that is not configured; the
    /// current basemap is kept.
    pub fn select_basemap(&mut self, name: Option<&str>) -> ViewerResult<()> {
        let option = match name {
            None => first_basemap(&self.config)?,
            Some(name) => self
                .config
                .basemaps
                .iter()
                .find(|b| b.name == name)
                .cloned()
                .ok_or_else(|| ViewerError::UnknownBasemap(name.to_string()))?,
        };
        debug!(basemap = %option.name, "Selected basemap");
        self.basemap = Arc::new(Layer::Basemap(option));
        Ok(())
    }

    /// Replace the selected categories and rebuild the category overlay.
    ///
    /// Layers are collected in category discovery order, then file order.
    /// Files that fail to convert or are unsupported are skipped.
    pub fn set_categories<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            if self.source.category(name.as_ref()).is_none() {
                warn!(category = name.as_ref(), "Ignoring unknown category");
            }
        }

        let selected: Vec<String> = self
            .source
            .categories()
            .iter()
            .filter(|c| names.iter().any(|n| n.as_ref() == c.name))
            .map(|c| c.name.clone())
            .collect();

        let mut layers = Vec::new();
        for category in &selected {
            for file in self.source.category_files(category) {
                if let Some(layer) = self.ensure_data_layer(&file.path, category) {
                    layers.push(layer);
                }
            }
        }
        debug!(categories = ?selected, layers = layers.len(), "Rebuilt category overlay");
        self.category_layers = layers;
    }

    /// Replace the selected transect choices and rebuild the transect overlay.
    ///
    /// Each file choice registers its path layer with that file's click
    /// tracker. The user-drawn option appears at most once.
    pub fn set_transects<S: AsRef<str>>(&mut self, choices: &[S]) {
        let mut layers = Vec::new();
        let mut user_drawn = false;

        for choice in choices {
            let choice = choice.as_ref();
            if choice == USER_TRANSECT_OPTION {
                if !user_drawn {
                    layers.push(Arc::clone(&self.user_transect));
                    user_drawn = true;
                }
                continue;
            }
            let Some(file) = self.source.transect_file(choice).cloned() else {
                warn!(choice, "Ignoring unknown transect file");
                continue;
            };
            let Some(layer) = self.ensure_transect_layer(&file) else {
                continue;
            };
            if let Some(tracker) = self.trackers.get_mut(&file.name) {
                tracker.set_source(Arc::clone(&layer));
            }
            layers.push(layer);
        }
        debug!(layers = layers.len(), "Rebuilt transect overlay");
        self.transect_layers = layers;
    }

    /// Basemap, then category layers, then transect paths.
    #[must_use]
    pub fn overlay(&self) -> MapOverlay {
        let layers = std::iter::once(Arc::clone(&self.basemap))
            .chain(self.category_layers.iter().cloned())
            .chain(self.transect_layers.iter().cloned())
            .collect();
        MapOverlay {
            layers,
            options: OverlayOptions::default(),
        }
    }

    /// Record the segments currently selected on a transect file's layer.
    ///
    /// # Errors
    /// [`ViewerError::UnknownTransectFile`] if `file` is not a discovered
    /// transect file.
    pub fn tap_transect(&mut self, file: &str, indices: impl IntoIterator<Item = usize>) -> ViewerResult<()> {
        let tracker = self
            .trackers
            .get_mut(file)
            .ok_or_else(|| ViewerError::UnknownTransectFile(file.to_string()))?;
        tracker.select(indices);
        Ok(())
    }

    /// Evaluate every click tracker.
    ///
    /// A single clicked segment pushes its detail table, rebuilds the
    /// time-series overlay and calls `host` once. Idle, multi-segment and
    /// unresolvable selections leave the overlay unchanged. Every tracker is
    /// empty afterwards.
    pub fn evaluate_clicks(&mut self, host: &mut dyn DetailViewHost) -> &TimeSeriesOverlay {
        let mut clicked = Vec::new();
        for (file, tracker) in &mut self.trackers {
            match tracker.evaluate() {
                SelectionOutcome::Idle => {}
                SelectionOutcome::Invalid(count) => {
                    warn!(file = %file, count, "Only one transect should be selected, ignoring click");
                }
                SelectionOutcome::Clicked(index) => {
                    let segment = tracker
                        .source()
                        .and_then(|layer| layer.as_paths())
                        .and_then(|paths| paths.segments.get(index));
                    match segment {
                        Some(segment) => clicked.push((file.clone(), segment.clone())),
                        None => warn!(file = %file, index, "Clicked transect cannot be resolved"),
                    }
                }
            }
        }

        for (file, segment) in clicked {
            info!(file = %file, transect_id = segment.transect_id, "Transect clicked");
            self.detail.push(TransectDetail::from_segment(&segment));
            self.time_series = self.time_series_for(&segment);
            host.open_detail_view();
        }
        &self.time_series
    }

    #[must_use]
    pub fn time_series(&self) -> &TimeSeriesOverlay {
        &self.time_series
    }

    #[must_use]
    pub fn detail(&self) -> &DetailPipe {
        &self.detail
    }

    /// Sample every reference file along `segment`.
    fn time_series_for(&mut self, segment: &TransectSegment) -> TimeSeriesOverlay {
        let Some(folder) = self.config.time_series_folder.clone() else {
            return TimeSeriesOverlay::placeholder::<&str>(&[]);
        };
        let line = [segment.start, segment.end];
        let files = self.reference_files.clone();

        let series: Vec<(&str, Option<_>)> = files
            .iter()
            .map(|file| {
                let samples = self
                    .ensure_data_layer(&file.path, &folder)
                    .and_then(|layer| extract_from_layer(&layer, &line))
                    .filter(|samples| !samples.is_empty());
                (file.name.as_str(), samples)
            })
            .collect();

        let overlay = TimeSeriesOverlay::build(series);
        debug!(
            transect_id = segment.transect_id,
            contributing = overlay.contributing(),
            reference_files = files.len(),
            "Rebuilt time-series overlay"
        );
        overlay
    }

    /// Memoized layer of a category data file; failures are logged and give
    /// `None`.
    fn ensure_data_layer(&mut self, path: &Path, category: &str) -> Option<Arc<Layer>> {
        let converter = &self.converter;
        let styles = &self.styles;
        let result = self
            .layers
            .get_or_try_insert(path, || converter.convert_data_file(path, category, &styles.point_style(category)));
        match result {
            Ok(layer) => layer,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping file that failed to convert");
                None
            }
        }
    }

    fn ensure_transect_layer(&mut self, file: &SourceFile) -> Option<Arc<Layer>> {
        let converter = &self.converter;
        let label = format!("{}: {}", self.config.transects_folder, file.name);
        let style = self.styles.transect(&file.name);
        let result = self
            .layers
            .get_or_try_insert(&file.path, || converter.convert_transect_file(&file.path, &label, style));
        match result {
            Ok(layer) => layer,
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "Skipping transect file that failed to parse");
                None
            }
        }
    }
}

fn first_basemap(config: &ViewerConfig) -> ViewerResult<BasemapOption> {
    config
        .basemaps
        .first()
        .cloned()
        .ok_or_else(|| ConfigError::Invalid("at least one basemap must be configured".to_string()).into())
}
