//! Transect files.
//!
//! A transect file is a list of comma-separated records
//! `point_id, x, y, <ignored>` in the regional projection. Records pair up:
//! the first of each pair opens a transect, the second closes it.
//!
//! ```text
//! PT101,296856.91,131388.77,start
//! PT101,296416.54,132035.85,end
//! ```

use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ViewerError, ViewerResult};
use crate::geometry::projection::REGIONAL_EPSG;
use crate::geometry::Point;
use crate::points::read_feature_collection;

pub const TRANSECT_ID_PROPERTY: &str = "Transect ID";
pub const START_POINT_PROPERTY: &str = "Start Point (meters)";
pub const END_POINT_PROPERTY: &str = "End Point (meters)";

/// A two-point transect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransectSegment {
    pub transect_id: u64,
    pub start: Point,
    pub end: Point,
    /// `"(x, y)"` built from the raw start fields.
    pub start_label: String,
    pub end_label: String,
}

impl TransectSegment {
    #[must_use]
    pub fn new(transect_id: u64, start: Point, end: Point) -> Self {
        Self {
            transect_id,
            start,
            end,
            start_label: format!("({}, {})", start.x, start.y),
            end_label: format!("({}, {})", end.x, end.y),
        }
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert(TRANSECT_ID_PROPERTY.to_string(), JsonValue::from(self.transect_id));
        properties.insert(START_POINT_PROPERTY.to_string(), JsonValue::from(self.start_label.clone()));
        properties.insert(END_POINT_PROPERTY.to_string(), JsonValue::from(self.end_label.clone()));
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::LineString(vec![
                vec![self.start.x, self.start.y],
                vec![self.end.x, self.end.y],
            ]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

struct Record<'a> {
    line: usize,
    point_id: &'a str,
    raw_x: &'a str,
    raw_y: &'a str,
    point: Point,
}

fn parse_record<'a>(path: &Path, line: usize, text: &'a str) -> ViewerResult<Record<'a>> {
    let error = |message: String| ViewerError::TransectRecord {
        path: path.to_path_buf(),
        line,
        message,
    };

    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    let [point_id, raw_x, raw_y, _] = fields.as_slice() else {
        return Err(error(format!("expected 4 fields, found {}", fields.len())));
    };
    let x: f64 = raw_x
        .parse()
        .map_err(|_| error(format!("invalid x coordinate `{raw_x}`")))?;
    let y: f64 = raw_y
        .parse()
        .map_err(|_| error(format!("invalid y coordinate `{raw_y}`")))?;

    Ok(Record {
        line,
        point_id: *point_id,
        raw_x: *raw_x,
        raw_y: *raw_y,
        point: Point::new(x, y),
    })
}

/// Numeric id from the digits of a point id (`"PT-0101"` -> `101`).
fn transect_id(point_id: &str) -> Result<u64, String> {
    let digits: String = point_id.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(format!("point id `{point_id}` has no numeric transect id"));
    }
    digits
        .parse()
        .map_err(|_| format!("transect id `{digits}` in point id `{point_id}` is too large"))
}

/// Parse transect text into segments.
///
/// Blank lines are skipped. A trailing record without a partner is dropped
/// with a warning.
///
/// # Errors
/// [`ViewerError::TransectRecord`] for the first malformed record.
pub fn parse_transects(path: &Path, text: &str) -> ViewerResult<Vec<TransectSegment>> {
    let mut segments = Vec::new();
    let mut open: Option<(Record<'_>, u64)> = None;

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_record(path, index + 1, line)?;
        match open.take() {
            None => {
                let id = transect_id(record.point_id).map_err(|message| ViewerError::TransectRecord {
                    path: path.to_path_buf(),
                    line: record.line,
                    message,
                })?;
                open = Some((record, id));
            }
            Some((start, id)) => segments.push(TransectSegment {
                transect_id: id,
                start: start.point,
                end: record.point,
                start_label: format!("({}, {})", start.raw_x, start.raw_y),
                end_label: format!("({}, {})", record.raw_x, record.raw_y),
            }),
        }
    }

    if let Some((dangling, id)) = open {
        warn!(
            path = %path.display(),
            line = dangling.line,
            transect_id = id,
            "Dropping transect start record without an end record"
        );
    }
    Ok(segments)
}

/// Read and parse a transect file.
///
/// # Errors
/// Fails if the file cannot be read or holds a malformed record.
pub fn read_transect_file(path: &Path) -> ViewerResult<Vec<TransectSegment>> {
    let text = std::fs::read_to_string(path).map_err(|e| ViewerError::io(path, e))?;
    parse_transects(path, &text)
}

/// Line features for `segments`, tagged with the regional CRS.
#[must_use]
pub fn segments_to_feature_collection(segments: &[TransectSegment]) -> FeatureCollection {
    let mut crs = JsonObject::new();
    crs.insert("type".to_string(), JsonValue::from("name"));
    crs.insert(
        "properties".to_string(),
        serde_json::json!({ "name": format!("urn:ogc:def:crs:EPSG::{REGIONAL_EPSG}") }),
    );
    let mut foreign_members = JsonObject::new();
    foreign_members.insert("crs".to_string(), JsonValue::Object(crs));

    FeatureCollection {
        bbox: None,
        features: segments.iter().map(TransectSegment::to_feature).collect(),
        foreign_members: Some(foreign_members),
    }
}

/// Convert a transect file into a GeoJSON file at `dest`.
///
/// Returns the number of segments written.
///
/// # Errors
/// Propagates parse errors and fails if `dest` cannot be written.
pub fn write_transect_artifact(source: &Path, dest: &Path) -> ViewerResult<usize> {
    let segments = read_transect_file(source)?;
    let collection = segments_to_feature_collection(&segments);
    std::fs::write(dest, GeoJson::from(collection).to_string())
        .map_err(|e| ViewerError::io(dest, e))?;
    debug!(path = %source.display(), segments = segments.len(), "Wrote transect artifact");
    Ok(segments.len())
}

/// Read a transect artifact back into segments, in file order.
///
/// # Errors
/// Fails if a feature is not a two-point line with a transect id.
pub fn read_transect_artifact(path: &Path) -> ViewerResult<Vec<TransectSegment>> {
    let collection = read_feature_collection(path)?;
    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| {
            let invalid = |message: &str| ViewerError::Artifact {
                path: path.to_path_buf(),
                message: format!("feature {i}: {message}"),
            };
            let (start, end) = match feature.geometry.as_ref().map(|g| &g.value) {
                Some(Value::LineString(coords)) if coords.len() == 2 => {
                    match (coords[0].as_slice(), coords[1].as_slice()) {
                        ([x0, y0, ..], [x1, y1, ..]) => (Point::new(*x0, *y0), Point::new(*x1, *y1)),
                        _ => return Err(invalid("coordinates need x and y")),
                    }
                }
                _ => return Err(invalid("not a two-point line")),
            };
            let properties = feature.properties.unwrap_or_default();
            let transect_id = properties
                .get(TRANSECT_ID_PROPERTY)
                .and_then(JsonValue::as_u64)
                .ok_or_else(|| invalid("missing transect id"))?;
            let label = |key: &str, point: &Point| {
                properties
                    .get(key)
                    .and_then(JsonValue::as_str)
                    .map_or_else(|| format!("({}, {})", point.x, point.y), str::to_string)
            };

            Ok(TransectSegment {
                transect_id,
                start_label: label(START_POINT_PROPERTY, &start),
                end_label: label(END_POINT_PROPERTY, &end),
                start,
                end,
            })
        })
        .collect()
}
