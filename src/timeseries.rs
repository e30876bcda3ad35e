//! Detail table and time-series overlay for a clicked transect.
//!
//! The time-series overlay is shape-stable: it always holds one curve and one
//! scatter per reference file, in reference order. Files that contribute no
//! samples keep their pair with empty data, so a renderer never has to swap
//! item types between updates.

use serde::Serialize;

use crate::extract::TransectSample;
use crate::layer::Layer;
use crate::style::series_style;
use crate::transect::TransectSegment;

pub const POINT_TYPE_COLUMN: &str = "Point Type";
pub const EASTING_COLUMN: &str = "Easting (meters)";
pub const NORTHING_COLUMN: &str = "Northing (meters)";
pub const TRANSECT_ID_COLUMN: &str = "Transect ID";

pub const DETAIL_TITLE: &str = "Selected Transect's Data";
pub const TIME_SERIES_TITLE: &str = "Time-Series of Data Collected Along the Selected Transect";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointType {
    Start,
    End,
}

/// One row of the detail table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    #[serde(rename = "Point Type")]
    pub point_type: PointType,
    #[serde(rename = "Easting (meters)")]
    pub easting: f64,
    #[serde(rename = "Northing (meters)")]
    pub northing: f64,
    #[serde(rename = "Transect ID")]
    pub transect_id: u64,
}

/// Start/end table of the clicked transect, keyed by point type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransectDetail {
    pub title: &'static str,
    pub rows: [DetailRow; 2],
}

impl TransectDetail {
    #[must_use]
    pub fn from_segment(segment: &TransectSegment) -> Self {
        let row = |point_type, x, y| DetailRow {
            point_type,
            easting: x,
            northing: y,
            transect_id: segment.transect_id,
        };
        Self {
            title: DETAIL_TITLE,
            rows: [
                row(PointType::Start, segment.start.x, segment.start.y),
                row(PointType::End, segment.end.x, segment.end.y),
            ],
        }
    }

    /// Column names in display order; the first is the key dimension.
    #[must_use]
    pub fn columns() -> [&'static str; 4] {
        [POINT_TYPE_COLUMN, EASTING_COLUMN, NORTHING_COLUMN, TRANSECT_ID_COLUMN]
    }
}

/// Latest detail table plus a revision counter bumped on every push, so a
/// host can refresh even when the same transect is clicked twice.
#[derive(Debug, Default)]
pub struct DetailPipe {
    latest: Option<TransectDetail>,
    revision: u64,
}

impl DetailPipe {
    pub fn push(&mut self, detail: TransectDetail) {
        self.latest = Some(detail);
        self.revision += 1;
    }

    #[must_use]
    pub fn latest(&self) -> Option<&TransectDetail> {
        self.latest.as_ref()
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Host side effect run once per valid transect click.
pub trait DetailViewHost {
    /// Bring the detail view into focus (e.g. open a modal).
    fn open_detail_view(&mut self);
}

impl<F: FnMut()> DetailViewHost for F {
    fn open_detail_view(&mut self) {
        self();
    }
}

/// Curve + scatter pairs along the clicked transect.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesOverlay {
    pub title: &'static str,
    pub layers: Vec<Layer>,
}

impl TimeSeriesOverlay {
    /// Empty pairs for every reference file.
    #[must_use]
    pub fn placeholder<S: AsRef<str>>(reference_labels: &[S]) -> Self {
        Self::build(reference_labels.iter().map(|label| (label.as_ref(), None)))
    }

    /// Pairs for `(label, samples)` in order; `None` or empty samples give an
    /// empty pair.
    pub fn build<'a>(series: impl IntoIterator<Item = (&'a str, Option<Vec<TransectSample>>)>) -> Self {
        let layers = series
            .into_iter()
            .enumerate()
            .flat_map(|(i, (label, samples))| {
                Layer::series_pair(label, samples.unwrap_or_default(), &series_style(i))
            })
            .collect();
        Self {
            title: TIME_SERIES_TITLE,
            layers,
        }
    }

    /// Number of files that contributed at least one sample.
    #[must_use]
    pub fn contributing(&self) -> usize {
        self.layers
            .iter()
            .filter(|layer| matches!(layer, Layer::Curve(c) if !c.samples.is_empty()))
            .count()
    }

    /// Layer kinds and labels, which never change between updates for the
    /// same reference files.
    #[must_use]
    pub fn shape(&self) -> Vec<(&'static str, &str)> {
        self.layers
            .iter()
            .map(|layer| {
                let kind = match layer {
                    Layer::Curve(_) => "curve",
                    Layer::Scatter(_) => "scatter",
                    _ => "other",
                };
                (kind, layer.label())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::style::BOKEH_8;

    fn sample(distance: f64) -> TransectSample {
        TransectSample {
            easting: distance,
            northing: 0.0,
            distance,
            value: 1.0,
        }
    }

    #[test]
    fn test_detail_rows_follow_segment() {
        let segment = TransectSegment::new(12, Point::new(1.0, 2.0), Point::new(3.0, 4.0));
        let detail = TransectDetail::from_segment(&segment);

        assert_eq!(detail.rows[0].point_type, PointType::Start);
        assert_eq!((detail.rows[0].easting, detail.rows[0].northing), (1.0, 2.0));
        assert_eq!(detail.rows[1].point_type, PointType::End);
        assert_eq!((detail.rows[1].easting, detail.rows[1].northing), (3.0, 4.0));
        assert!(detail.rows.iter().all(|r| r.transect_id == 12));
    }

    #[test]
    fn test_detail_row_serializes_display_names() {
        let segment = TransectSegment::new(1, Point::new(1.0, 2.0), Point::new(3.0, 4.0));
        let json = serde_json::to_value(TransectDetail::from_segment(&segment)).unwrap();
        let keys: Vec<_> = json["rows"][0].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, TransectDetail::columns().map(String::from).to_vec());
        assert_eq!(json["rows"][0]["Point Type"], "start");
    }

    #[test]
    fn test_pipe_revision_bumps_on_identical_push() {
        let segment = TransectSegment::new(1, Point::new(1.0, 2.0), Point::new(3.0, 4.0));
        let mut pipe = DetailPipe::default();
        assert!(pipe.latest().is_none());

        pipe.push(TransectDetail::from_segment(&segment));
        pipe.push(TransectDetail::from_segment(&segment));
        assert_eq!(pipe.revision(), 2);
        assert_eq!(pipe.latest().unwrap().rows[0].transect_id, 1);
    }

    #[test]
    fn test_overlay_shape_is_stable() {
        let labels = ["a.asc", "b.asc", "c.asc"];
        let placeholder = TimeSeriesOverlay::placeholder(&labels);
        let updated = TimeSeriesOverlay::build([
            ("a.asc", None),
            ("b.asc", Some(vec![sample(1.0), sample(2.0)])),
            ("c.asc", Some(Vec::new())),
        ]);

        assert_eq!(placeholder.layers.len(), 6);
        assert_eq!(placeholder.shape(), updated.shape());
        assert_eq!(placeholder.contributing(), 0);
        assert_eq!(updated.contributing(), 1);
    }

    #[test]
    fn test_overlay_styles_cycle_by_reference_index() {
        let overlay = TimeSeriesOverlay::build([("a", None), ("b", None)]);
        match (&overlay.layers[0], &overlay.layers[2]) {
            (Layer::Curve(a), Layer::Curve(b)) => {
                assert_eq!(a.color, BOKEH_8[0]);
                assert_eq!(b.color, BOKEH_8[1]);
            }
            other => panic!("unexpected layers {other:?}"),
        }
    }

    #[test]
    fn test_closure_host() {
        let mut opened = 0;
        let mut host = || opened += 1;
        host.open_detail_view();
        host.open_detail_view();
        assert_eq!(opened, 2);
    }
}
