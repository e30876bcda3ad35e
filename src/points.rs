//! Point-table conversion.
//!
//! A point table is a delimited file with a header row. One column holds
//! latitudes and one holds longitudes; both are found by name from the
//! configured candidate lists. Every row becomes a GeoJSON `Point` in WGS84
//! carrying the remaining columns as properties.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use tracing::debug;

use crate::error::{Axis, ViewerError, ViewerResult};
use crate::geometry::Point;
use crate::layer::PointFeature;

/// Header positions of the coordinate columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateColumns {
    pub latitude: usize,
    pub longitude: usize,
}

/// Find exactly one latitude and one longitude column in `headers`.
///
/// # Errors
/// [`ViewerError::AmbiguousColumn`] if zero or several headers match the
/// candidates of either axis.
pub fn resolve_coordinate_columns<S: AsRef<str>>(
    path: &Path,
    headers: &[S],
    latitude_candidates: &[String],
    longitude_candidates: &[String],
) -> ViewerResult<CoordinateColumns> {
    let latitude = resolve_axis(path, headers, latitude_candidates, Axis::Latitude)?;
    let longitude = resolve_axis(path, headers, longitude_candidates, Axis::Longitude)?;
    Ok(CoordinateColumns { latitude, longitude })
}

fn resolve_axis<S: AsRef<str>>(
    path: &Path,
    headers: &[S],
    candidates: &[String],
    axis: Axis,
) -> ViewerResult<usize> {
    let matches: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| candidates.iter().any(|c| c == h.as_ref()))
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [index] => Ok(*index),
        _ => Err(ViewerError::AmbiguousColumn {
            path: path.to_path_buf(),
            axis,
            candidates: candidates.to_vec(),
            found: matches
                .iter()
                .map(|&i| headers[i].as_ref().to_string())
                .collect(),
        }),
    }
}

/// Read a point table into a GeoJSON feature collection.
///
/// # Errors
/// Fails on unreadable CSV, ambiguous coordinate columns, or a row whose
/// coordinates do not parse.
pub fn read_point_table(
    path: &Path,
    latitude_candidates: &[String],
    longitude_candidates: &[String],
) -> ViewerResult<FeatureCollection> {
    let csv_err = |source| ViewerError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();
    let columns =
        resolve_coordinate_columns(path, &headers, latitude_candidates, longitude_candidates)?;

    let mut features = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        // Header is line 1
        let row = row + 2;
        let lat = parse_coordinate(path, row, Axis::Latitude, record.get(columns.latitude))?;
        let lon = parse_coordinate(path, row, Axis::Longitude, record.get(columns.longitude))?;

        let mut properties = JsonObject::new();
        for (i, (name, cell)) in headers.iter().zip(record.iter()).enumerate() {
            if i == columns.latitude || i == columns.longitude {
                continue;
            }
            properties.insert(name.clone(), cell_value(cell));
        }

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    debug!(path = %path.display(), points = features.len(), "Read point table");
    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn parse_coordinate(path: &Path, row: usize, axis: Axis, cell: Option<&str>) -> ViewerResult<f64> {
    let text = cell.unwrap_or_default();
    let limit = match axis {
        Axis::Latitude => 90.0,
        Axis::Longitude => 180.0,
    };
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() && v.abs() <= limit => Ok(v),
        _ => Err(ViewerError::InvalidCoordinate {
            path: path.to_path_buf(),
            row,
            axis,
            value: text.to_string(),
        }),
    }
}

/// Numbers stay numbers, empty cells become null, everything else is text.
fn cell_value(cell: &str) -> JsonValue {
    if cell.is_empty() {
        return JsonValue::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return JsonValue::from(i);
    }
    if let Some(n) = cell
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        return JsonValue::Number(n);
    }
    JsonValue::String(cell.to_string())
}

/// Convert a point table into a GeoJSON file at `dest`.
///
/// Returns the number of points written.
///
/// # Errors
/// Propagates read errors and fails if `dest` cannot be written.
pub fn write_point_artifact(
    source: &Path,
    dest: &Path,
    latitude_candidates: &[String],
    longitude_candidates: &[String],
) -> ViewerResult<usize> {
    let collection = read_point_table(source, latitude_candidates, longitude_candidates)?;
    let count = collection.features.len();
    std::fs::write(dest, GeoJson::from(collection).to_string())
        .map_err(|e| ViewerError::io(dest, e))?;
    Ok(count)
}

/// Read a point artifact back into point features.
///
/// # Errors
/// Fails if the file is not a GeoJSON collection of points.
pub fn read_point_artifact(path: &Path) -> ViewerResult<Vec<PointFeature>> {
    let collection = read_feature_collection(path)?;
    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| {
            let position = match feature.geometry.map(|g| g.value) {
                Some(Value::Point(coords)) if coords.len() >= 2 => Point::new(coords[0], coords[1]),
                _ => {
                    return Err(ViewerError::Artifact {
                        path: path.to_path_buf(),
                        message: format!("feature {i} is not a point"),
                    })
                }
            };
            Ok(PointFeature {
                position,
                properties: feature.properties.unwrap_or_default(),
            })
        })
        .collect()
}

/// Parse a GeoJSON file that must hold a `FeatureCollection`.
pub(crate) fn read_feature_collection(path: &Path) -> ViewerResult<FeatureCollection> {
    let file = File::open(path).map_err(|e| ViewerError::io(path, e))?;
    let geojson = GeoJson::from_reader(BufReader::new(file)).map_err(|e| ViewerError::GeoJson {
        path: path.to_path_buf(),
        source: geojson::Error::MalformedJson(e),
    })?;
    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        _ => Err(ViewerError::Artifact {
            path: path.to_path_buf(),
            message: "expected a FeatureCollection".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_resolve_unique_columns() {
        let config = ViewerConfig::default();
        let headers = ["Station", "Latitude", "Longitude", "Value"];
        let columns = resolve_coordinate_columns(
            Path::new("wl.csv"),
            &headers,
            &config.latitude_columns,
            &config.longitude_columns,
        )
        .unwrap();
        assert_eq!(columns, CoordinateColumns { latitude: 1, longitude: 2 });
    }

    #[test]
    fn test_two_latitude_columns_are_ambiguous() {
        let config = ViewerConfig::default();
        let headers = ["Latitude", "lat", "Longitude"];
        let err = resolve_coordinate_columns(
            Path::new("wl.csv"),
            &headers,
            &config.latitude_columns,
            &config.longitude_columns,
        )
        .unwrap_err();
        match err {
            ViewerError::AmbiguousColumn { axis, found, .. } => {
                assert_eq!(axis, Axis::Latitude);
                assert_eq!(found, vec!["Latitude".to_string(), "lat".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_longitude_column() {
        let config = ViewerConfig::default();
        let err = resolve_coordinate_columns(
            Path::new("wl.csv"),
            &["Latitude", "Easting"],
            &config.latitude_columns,
            &config.longitude_columns,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ViewerError::AmbiguousColumn { axis: Axis::Longitude, ref found, .. } if found.is_empty()
        ));
    }

    #[test]
    fn test_read_point_table_properties_in_header_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "wl1.csv",
            "Station,Latitude,Longitude,Value,Note\nA,48.15,-123.56,1.5,\nB,48.16,-123.55,2,high\n",
        );
        let config = ViewerConfig::default();
        let collection =
            read_point_table(&path, &config.latitude_columns, &config.longitude_columns).unwrap();

        assert_eq!(collection.features.len(), 2);
        let first = &collection.features[0];
        match first.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(coords)) => assert_eq!(coords, &vec![-123.56, 48.15]),
            other => panic!("unexpected geometry {other:?}"),
        }
        let props = first.properties.as_ref().unwrap();
        let keys: Vec<_> = props.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Station", "Value", "Note"]);
        assert_eq!(props["Value"], JsonValue::from(1.5));
        assert_eq!(props["Note"], JsonValue::Null);

        let second = collection.features[1].properties.as_ref().unwrap();
        assert_eq!(second["Value"], JsonValue::from(2));
        assert_eq!(second["Note"], JsonValue::from("high"));
    }

    #[test]
    fn test_invalid_coordinate_reports_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "bad.csv", "lat,lon\n48.1,-123.5\nnorth,-123.5\n");
        let config = ViewerConfig::default();
        let err =
            read_point_table(&path, &config.latitude_columns, &config.longitude_columns).unwrap_err();
        assert!(matches!(err, ViewerError::InvalidCoordinate { row: 3, axis: Axis::Latitude, .. }));
    }

    #[test]
    fn test_out_of_range_latitude_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "bad.csv", "lat,lon\n296856.9,-123.5\n");
        let config = ViewerConfig::default();
        assert!(read_point_table(&path, &config.latitude_columns, &config.longitude_columns).is_err());
    }

    #[test]
    fn test_artifact_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_csv(dir.path(), "wl1.csv", "Latitude,Longitude,Value\n48.1,-123.5,3\n48.2,-123.6,4\n");
        let dest = dir.path().join("wl1.geojson");
        let config = ViewerConfig::default();

        let count =
            write_point_artifact(&source, &dest, &config.latitude_columns, &config.longitude_columns)
                .unwrap();
        assert_eq!(count, 2);

        let points = read_point_artifact(&dest).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].position, Point::new(-123.6, 48.2));
        assert_eq!(points[1].properties["Value"], JsonValue::from(4));
    }

    #[test]
    fn test_read_artifact_rejects_non_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("single.geojson");
        std::fs::write(&path, r#"{"type":"Point","coordinates":[1.0,2.0]}"#).unwrap();
        assert!(matches!(read_point_artifact(&path), Err(ViewerError::Artifact { .. })));
    }

    #[test]
    fn test_read_truncated_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truncated.geojson");
        std::fs::write(&path, r#"{"type":"FeatureCollection","features":["#).unwrap();
        match read_point_artifact(&path) {
            Err(ViewerError::GeoJson { path: reported, source }) => {
                assert_eq!(reported, path);
                assert!(matches!(source, geojson::Error::MalformedJson(_)));
            }
            other => panic!("expected a GeoJSON error, got {other:?}"),
        }
    }
}
