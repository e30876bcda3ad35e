//! Renderable layer descriptions.
//!
//! Layers are plain data: the host serializes them and draws them however it
//! likes. Raster pixels stay in memory for extraction and are never
//! serialized; the host loads the GeoTIFF artifact instead.

use std::path::PathBuf;
use std::sync::Arc;

use geojson::JsonObject;
use serde::Serialize;

use crate::config::BasemapOption;
use crate::extract::TransectSample;
use crate::geometry::{BoundingBox, Point};
use crate::raster::Raster;
use crate::style::{ImageStyle, LineDash, Marker, PathStyle, PointStyle, SeriesStyle};
use crate::transect::TransectSegment;

/// One point of a point-table layer, in WGS84 longitude/latitude.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointFeature {
    pub position: Point,
    /// Non-coordinate columns of the source row, in header order.
    pub properties: JsonObject,
}

#[derive(Debug, Clone, Serialize)]
pub struct PointLayer {
    /// Legend label (the category name).
    pub label: String,
    pub artifact: PathBuf,
    pub points: Vec<PointFeature>,
    pub style: PointStyle,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageLayer {
    pub label: String,
    pub artifact: PathBuf,
    /// EPSG code of the raster.
    pub crs: i32,
    pub bounds: BoundingBox,
    pub bounds_wgs84: BoundingBox,
    pub width: usize,
    pub height: usize,
    /// Range of valid values, `None` when every pixel is nodata.
    pub value_range: Option<(f32, f32)>,
    pub style: ImageStyle,
    #[serde(skip)]
    pub raster: Arc<Raster>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathLayer {
    pub label: String,
    /// `None` for the user-drawn transect, which has no backing file.
    pub artifact: Option<PathBuf>,
    /// EPSG code of the path coordinates.
    pub crs: i32,
    pub segments: Vec<TransectSegment>,
    pub style: PathStyle,
    /// Whether the host should let the user drag the vertices.
    pub editable: bool,
}

/// A line of `(distance, value)` samples.
#[derive(Debug, Clone, Serialize)]
pub struct CurveLayer {
    pub label: String,
    pub samples: Vec<TransectSample>,
    pub color: &'static str,
    pub line_dash: LineDash,
}

/// The same samples as a [`CurveLayer`], drawn as markers.
#[derive(Debug, Clone, Serialize)]
pub struct ScatterLayer {
    pub label: String,
    pub samples: Vec<TransectSample>,
    pub color: &'static str,
    pub marker: Marker,
}

/// A renderable layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layer {
    Basemap(BasemapOption),
    Points(PointLayer),
    Image(ImageLayer),
    Paths(PathLayer),
    Curve(CurveLayer),
    Scatter(ScatterLayer),
}

impl Layer {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Basemap(b) => &b.name,
            Self::Points(l) => &l.label,
            Self::Image(l) => &l.label,
            Self::Paths(l) => &l.label,
            Self::Curve(l) => &l.label,
            Self::Scatter(l) => &l.label,
        }
    }

    #[must_use]
    pub fn as_paths(&self) -> Option<&PathLayer> {
        match self {
            Self::Paths(l) => Some(l),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_image(&self) -> Option<&ImageLayer> {
        match self {
            Self::Image(l) => Some(l),
            _ => None,
        }
    }

    /// Curve + scatter pair for one time-series file.
    #[must_use]
    pub fn series_pair(label: &str, samples: Vec<TransectSample>, style: &SeriesStyle) -> [Layer; 2] {
        [
            Self::Curve(CurveLayer {
                label: label.to_string(),
                samples: samples.clone(),
                color: style.color,
                line_dash: style.line_dash,
            }),
            Self::Scatter(ScatterLayer {
                label: label.to_string(),
                samples,
                color: style.color,
                marker: style.marker,
            }),
        ]
    }
}

/// Options applied once to the whole map overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayOptions {
    pub show_axes: bool,
    pub tools: Vec<&'static str>,
    pub active_tools: Vec<&'static str>,
    pub toolbar: &'static str,
    pub title: String,
    pub show_legend: bool,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            show_axes: false,
            tools: vec!["zoom_in", "zoom_out", "save"],
            active_tools: vec!["pan", "wheel_zoom"],
            toolbar: "above",
            title: String::new(),
            show_legend: true,
        }
    }
}

/// The composed map: basemap first, then category layers, then transect paths.
#[derive(Debug, Clone, Serialize)]
pub struct MapOverlay {
    pub layers: Vec<Arc<Layer>>,
    pub options: OverlayOptions,
}

impl MapOverlay {
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::series_style;

    #[test]
    fn test_layer_serializes_with_type_tag() {
        let layer = Layer::Basemap(BasemapOption {
            name: "Default".to_string(),
            url: "https://tile.openstreetmap.org/{Z}/{X}/{Y}.png".to_string(),
        });
        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(json["type"], "basemap");
        assert_eq!(json["name"], "Default");
        assert_eq!(layer.label(), "Default");
    }

    #[test]
    fn test_series_pair_shares_style() {
        let [curve, scatter] = Layer::series_pair("dem.asc", Vec::new(), &series_style(2));
        match (&curve, &scatter) {
            (Layer::Curve(c), Layer::Scatter(s)) => {
                assert_eq!(c.color, s.color);
                assert_eq!(c.label, "dem.asc");
                assert!(c.samples.is_empty());
            }
            other => panic!("unexpected pair {other:?}"),
        }
    }

    #[test]
    fn test_image_layer_skips_pixels() {
        let raster = crate::raster::tests::sample_raster();
        let layer = Layer::Image(ImageLayer {
            label: "Elevation".to_string(),
            artifact: PathBuf::from("Elevation/GeoData/dem.tif"),
            crs: raster.crs,
            bounds: raster.bounds,
            bounds_wgs84: raster.bounds,
            width: raster.width,
            height: raster.height,
            value_range: raster.value_range(),
            style: ImageStyle::default(),
            raster: Arc::new(raster),
        });
        let json = serde_json::to_value(&layer).unwrap();
        assert!(json.get("raster").is_none());
        assert_eq!(json["style"]["cmap"], "Turbo");
        assert!(layer.as_image().is_some());
        assert!(layer.as_paths().is_none());
    }

    #[test]
    fn test_default_overlay_options() {
        let options = OverlayOptions::default();
        assert!(!options.show_axes);
        assert!(options.show_legend);
        assert_eq!(options.toolbar, "above");
        assert_eq!(options.active_tools, vec!["pan", "wheel_zoom"]);
    }
}
