//! Deterministic styling.
//!
//! Every style is a cyclic lookup into a fixed palette keyed by an index, so
//! the same inputs always render the same way across sessions.

use std::collections::BTreeMap;

use serde::Serialize;

/// The 8-color Bokeh categorical palette.
pub const BOKEH_8: [&str; 8] = [
    "#EC1557", "#F05223", "#F6A91B", "#A5CD39", "#20B254", "#00AAAE", "#4998D3", "#892889",
];

/// Marker cycle for point layers.
pub const MARKERS: [Marker; 10] = [
    Marker::Circle,
    Marker::Triangle,
    Marker::Square,
    Marker::Diamond,
    Marker::X,
    Marker::TriangleRight,
    Marker::Asterisk,
    Marker::InvertedTriangle,
    Marker::Cross,
    Marker::TriangleLeft,
];

/// Dash cycle for curve layers.
pub const LINE_DASHES: [LineDash; 5] = [
    LineDash::Solid,
    LineDash::Dashed,
    LineDash::Dotted,
    LineDash::DotDash,
    LineDash::DashDot,
];

/// Point glyph, serialized as its short matplotlib-style code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Marker {
    #[serde(rename = "o")]
    Circle,
    #[serde(rename = "^")]
    Triangle,
    #[serde(rename = "s")]
    Square,
    #[serde(rename = "d")]
    Diamond,
    #[serde(rename = "x")]
    X,
    #[serde(rename = ">")]
    TriangleRight,
    #[serde(rename = "*")]
    Asterisk,
    #[serde(rename = "v")]
    InvertedTriangle,
    #[serde(rename = "+")]
    Cross,
    #[serde(rename = "<")]
    TriangleLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineDash {
    Solid,
    Dashed,
    Dotted,
    DotDash,
    DashDot,
}

/// Style of a category's point layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointStyle {
    pub color: String,
    pub marker: Marker,
    pub size: u32,
    /// Opacity when the layer is muted from the legend.
    pub muted_alpha: f64,
    pub tools: Vec<&'static str>,
}

/// Style of a raster image layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageStyle {
    pub cmap: &'static str,
    pub alpha: f64,
    /// Name of the value dimension shown on hover.
    pub value_dimension: &'static str,
    pub tools: Vec<&'static str>,
}

impl Default for ImageStyle {
    fn default() -> Self {
        Self {
            cmap: "Turbo",
            alpha: 0.5,
            value_dimension: "Elevation (meters)",
            tools: vec!["hover"],
        }
    }
}

/// Style of a transect path layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathStyle {
    pub color: String,
    pub line_width: u32,
    pub tools: Vec<&'static str>,
}

impl PathStyle {
    /// Clickable transect paths.
    #[must_use]
    pub fn transect(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            line_width: 2,
            tools: vec!["hover", "tap"],
        }
    }

    /// The draggable user-drawn transect.
    #[must_use]
    pub fn user_drawn() -> Self {
        Self {
            color: "black".to_string(),
            line_width: 5,
            tools: vec!["poly_draw"],
        }
    }
}

/// Style shared by the curve and scatter of one time-series file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStyle {
    pub color: &'static str,
    pub line_dash: LineDash,
    pub marker: Marker,
}

/// Style of the `index`-th time-series reference file.
#[must_use]
pub fn series_style(index: usize) -> SeriesStyle {
    SeriesStyle {
        color: BOKEH_8[index % BOKEH_8.len()],
        line_dash: LINE_DASHES[index % LINE_DASHES.len()],
        marker: MARKERS[index % MARKERS.len()],
    }
}

/// Palette assignments for categories and transect files.
///
/// Categories take `BOKEH_8[i]` unless overridden; transect files continue
/// the cycle after the last category so paths stand apart from points.
#[derive(Debug, Clone, Default)]
pub struct StyleBook {
    categories: BTreeMap<String, PointStyle>,
    transects: BTreeMap<String, String>,
}

impl StyleBook {
    /// Assign styles for categories and transect files, both in display order.
    #[must_use]
    pub fn new(
        categories: &[String],
        transect_files: &[String],
        overrides: &BTreeMap<String, String>,
    ) -> Self {
        let categories_styled = categories
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let color = overrides
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| BOKEH_8[i % BOKEH_8.len()].to_string());
                let style = PointStyle {
                    color,
                    marker: MARKERS[i % MARKERS.len()],
                    size: 10,
                    muted_alpha: 0.01,
                    tools: vec!["hover"],
                };
                (name.clone(), style)
            })
            .collect();

        let offset = categories.len();
        let transects = transect_files
            .iter()
            .enumerate()
            .map(|(i, file)| (file.clone(), BOKEH_8[(offset + i) % BOKEH_8.len()].to_string()))
            .collect();

        Self {
            categories: categories_styled,
            transects,
        }
    }

    #[must_use]
    pub fn category(&self, name: &str) -> Option<&PointStyle> {
        self.categories.get(name)
    }

    /// Point style of a category, or a black circle for folders that are
    /// not a discovered category.
    #[must_use]
    pub fn point_style(&self, name: &str) -> PointStyle {
        self.category(name).cloned().unwrap_or_else(|| PointStyle {
            color: "black".to_string(),
            marker: Marker::Circle,
            size: 10,
            muted_alpha: 0.01,
            tools: vec!["hover"],
        })
    }

    /// Path style of a transect file, black for unknown files.
    #[must_use]
    pub fn transect(&self, file: &str) -> PathStyle {
        PathStyle::transect(
            self.transects
                .get(file)
                .map_or("black", String::as_str),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_category_palette_cycles() {
        let categories: Vec<String> = (0..10).map(|i| format!("cat{i}")).collect();
        let book = StyleBook::new(&categories, &[], &BTreeMap::new());

        assert_eq!(book.category("cat0").unwrap().color, BOKEH_8[0]);
        assert_eq!(book.category("cat8").unwrap().color, BOKEH_8[0]);
        assert_eq!(book.category("cat9").unwrap().marker, Marker::TriangleLeft);
        assert_eq!(book.category("cat1").unwrap().marker, Marker::Triangle);
    }

    #[test]
    fn test_color_override_keeps_marker_cycle() {
        let mut overrides = BTreeMap::new();
        overrides.insert("Water Level".to_string(), "#123456".to_string());
        let book = StyleBook::new(&names(&["Elevation", "Water Level"]), &[], &overrides);

        let style = book.category("Water Level").unwrap();
        assert_eq!(style.color, "#123456");
        assert_eq!(style.marker, Marker::Triangle);
        assert_eq!(book.category("Elevation").unwrap().color, BOKEH_8[0]);
    }

    #[test]
    fn test_transect_colors_continue_after_categories() {
        let book = StyleBook::new(
            &names(&["A", "B", "C"]),
            &names(&["t1.txt", "t2.txt"]),
            &BTreeMap::new(),
        );
        assert_eq!(book.transect("t1.txt").color, BOKEH_8[3]);
        assert_eq!(book.transect("t2.txt").color, BOKEH_8[4]);
        assert_eq!(book.transect("missing.txt").color, "black");
    }

    #[test]
    fn test_point_style_falls_back_for_unknown_folder() {
        let book = StyleBook::new(&names(&["A"]), &[], &BTreeMap::new());
        assert_eq!(book.point_style("A").color, BOKEH_8[0]);
        assert_eq!(book.point_style("Hidden").color, "black");
    }

    #[test]
    fn test_series_style_cycles_independently() {
        let style = series_style(9);
        assert_eq!(style.color, BOKEH_8[1]);
        assert_eq!(style.line_dash, LineDash::DashDot);
        assert_eq!(style.marker, Marker::TriangleLeft);
    }

    #[test]
    fn test_marker_serializes_as_code() {
        let json = serde_json::to_string(&MARKERS).unwrap();
        assert_eq!(json, r#"["o","^","s","d","x",">","*","v","+","<"]"#);
        assert_eq!(serde_json::to_string(&LineDash::DotDash).unwrap(), r#""dotdash""#);
    }
}
