#![doc = include_str!("../README.md")]
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`source`]: Category and transect file discovery via [`DataSource`]
//! - [`convert`]: File-type dispatch from raw files to [`Layer`]s
//! - [`geocache`]: On-disk `GeoData/` artifact cache
//! - [`points`], [`grid`], [`transect`]: Parsers for point tables, ASCII grids and transect files
//! - [`geotiff_writer`], [`geotiff_reader`]: Raster artifacts
//! - [`extract`]: Raster values along a transect line
//! - [`compositor`]: The [`MapCompositor`] that owns all viewer state
//! - [`timeseries`]: Detail table and shape-stable time-series overlay
//! - [`geometry`]: Coordinate types ([`Point`], [`BoundingBox`]) and projections

// ============================================================================
// Public modules
// ============================================================================

pub mod casting;
pub mod compositor;
pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod geocache;
pub mod geometry;
pub mod geotiff_reader;
pub mod geotiff_writer;
pub mod grid;
pub mod layer;
pub mod layer_cache;
pub mod points;
pub mod raster;
pub mod selection;
pub mod source;
pub mod style;
pub mod telemetry;
pub mod timeseries;
pub mod transect;

// ============================================================================
// Compositor
// ============================================================================
// Primary API: MapCompositor::new(config)?.set_categories(..); .overlay()

pub use compositor::{
    Choices,
    MapCompositor,
    USER_TRANSECT_OPTION,
};

// ============================================================================
// Configuration & Errors
// ============================================================================

pub use config::{
    BasemapOption,
    ConfigError,
    ViewerConfig,
};
pub use error::{
    ViewerError,
    ViewerResult,
};

// ============================================================================
// Layers & Styling
// ============================================================================

pub use layer::{
    CurveLayer,
    ImageLayer,
    Layer,
    MapOverlay,
    OverlayOptions,
    PathLayer,
    PointFeature,
    PointLayer,
    ScatterLayer,
};
pub use style::{
    PathStyle,
    PointStyle,
    StyleBook,
    BOKEH_8,
};

// ============================================================================
// Ingestion & Caching
// ============================================================================

pub use convert::{
    Converter,
    FileKind,
};
pub use geocache::{
    ArtifactKind,
    CacheStatus,
    GeoCache,
};
pub use layer_cache::LayerCache;
pub use source::{
    Category,
    DataSource,
    LocalDataSource,
    ScanOptions,
    SourceFile,
};

// ============================================================================
// Transects & Extraction
// ============================================================================

pub use extract::{
    extract_along,
    extract_from_layer,
    TransectSample,
};
pub use selection::{
    SelectionOutcome,
    SelectionTracker,
};
pub use timeseries::{
    DetailPipe,
    DetailViewHost,
    TimeSeriesOverlay,
    TransectDetail,
};
pub use transect::{
    parse_transects,
    TransectSegment,
};

// ============================================================================
// Geometry & Projections
// ============================================================================

pub use geometry::{
    BoundingBox,
    Point,
};
pub use geometry::projection::{
    get_proj_string,
    is_geographic_crs,
    project_point,
    REGIONAL_EPSG,
};

// ============================================================================
// Raster
// ============================================================================

pub use raster::Raster;
pub use geotiff_writer::{
    GeoTiffCompression,
    GeoTiffWriteError,
    GeoTiffWriter,
};
