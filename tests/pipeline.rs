//! End-to-end tests over a temporary data root.

use std::path::Path;

use transect_viewer::{
    extract_along, parse_transects, ArtifactKind, GeoCache, Layer, MapCompositor, Point, ViewerConfig,
    BOKEH_8, USER_TRANSECT_OPTION,
};

const WATER_LEVEL: &str = "\
Latitude,Longitude,Value
48.10,-123.50,1.5
48.11,-123.51,
48.12,-123.52,gauge
";

const DEM: &str = "\
ncols 5
nrows 4
xllcorner 296000
yllcorner 131000
cellsize 100
NODATA_value -9999
1 2 3 4 5
6 7 -9999 9 10
11 12 13 14 15
16 17 18 19 20
";

const LINES: &str = "\
PT1,296050,131150,start
PT1,296450,131150,end

PT2,296250,131050,start
PT2,296250,131350,end
PT3,900000,900000,start
PT3,900100,900000,end
";

fn data_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    for folder in ["Water Level", "Elevation", "Transects"] {
        std::fs::create_dir(root.join(folder)).unwrap();
    }
    std::fs::write(root.join("Water Level/wl1.csv"), WATER_LEVEL).unwrap();
    std::fs::write(root.join("Elevation/dem_2012.asc"), DEM).unwrap();
    std::fs::write(root.join("Elevation/dem_2013.asc"), DEM.replace("1 2 3 4 5", "2 3 4 5 6")).unwrap();
    std::fs::write(root.join("Transects/lines.txt"), LINES).unwrap();
    dir
}

fn compositor(root: &Path) -> MapCompositor {
    let mut config = ViewerConfig::with_data_dir(root);
    config.time_series_folder = Some("Elevation".to_string());
    MapCompositor::new(config).unwrap()
}

#[test]
fn test_point_category_end_to_end() {
    let dir = data_root();
    let mut map = compositor(dir.path());
    map.set_categories(&["Water Level"]);

    let overlay = map.overlay();
    assert_eq!(overlay.len(), 2);
    let Layer::Points(points) = overlay.layers[1].as_ref() else {
        panic!("expected a point layer, got {:?}", overlay.layers[1]);
    };
    assert_eq!(points.label, "Water Level");
    assert_eq!(points.points.len(), 3);
    // "Water Level" is the second category in sorted order
    assert_eq!(points.style.color, BOKEH_8[1]);

    let value = &points.points[0].properties["Value"];
    assert_eq!(value.as_f64(), Some(1.5));
    assert!(points.points[1].properties["Value"].is_null());
    assert_eq!(points.points[2].properties["Value"], "gauge");

    let artifact = dir.path().join("Water Level/GeoData/wl1.geojson");
    assert!(artifact.exists());
    assert_eq!(points.artifact, artifact);
}

#[test]
fn test_reselecting_reuses_artifact() {
    let dir = data_root();
    let artifact = dir.path().join("Water Level/GeoData/wl1.geojson");

    {
        let mut map = compositor(dir.path());
        map.set_categories(&["Water Level"]);
    }
    let content = std::fs::read_to_string(&artifact).unwrap();
    let modified = std::fs::metadata(&artifact).unwrap().modified().unwrap();

    // A fresh compositor has an empty memo but finds the artifact on disk
    let mut map = compositor(dir.path());
    map.set_categories(&["Water Level"]);
    map.set_categories::<&str>(&[]);
    map.set_categories(&["Water Level"]);

    assert_eq!(std::fs::read_to_string(&artifact).unwrap(), content);
    assert_eq!(std::fs::metadata(&artifact).unwrap().modified().unwrap(), modified);
    assert_eq!(map.overlay().len(), 2);
}

#[test]
fn test_grid_category_renders_from_geotiff() {
    let dir = data_root();
    let mut map = compositor(dir.path());
    map.set_categories(&["Elevation"]);

    let overlay = map.overlay();
    let images: Vec<_> = overlay.layers.iter().filter_map(|l| l.as_image()).collect();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].artifact, dir.path().join("Elevation/GeoData/dem_2012.tif"));
    assert_eq!((images[0].width, images[0].height), (5, 4));
    assert_eq!(images[0].value_range, Some((1.0, 20.0)));

    let cache = GeoCache::default();
    let source = dir.path().join("Elevation/dem_2013.asc");
    assert!(cache.artifact_path(&source, ArtifactKind::Raster).exists());
}

#[test]
fn test_transect_file_parse_counts() {
    let segments = parse_transects(Path::new("lines.txt"), LINES).unwrap();
    assert_eq!(segments.len(), 3);
    assert_eq!(segments.iter().map(|s| s.transect_id).collect::<Vec<_>>(), vec![1, 2, 3]);

    let odd = format!("{LINES}PT4,1,1,start\n");
    let segments = parse_transects(Path::new("lines.txt"), &odd).unwrap();
    assert_eq!(segments.len(), 3);
}

#[test]
fn test_click_detail_and_time_series() {
    let dir = data_root();
    let mut map = compositor(dir.path());
    map.set_transects(&["lines.txt", USER_TRANSECT_OPTION]);

    let placeholder_shape: Vec<(String, String)> = map
        .time_series()
        .shape()
        .into_iter()
        .map(|(kind, label)| (kind.to_string(), label.to_string()))
        .collect();
    assert_eq!(placeholder_shape.len(), 4);

    let mut opened = 0;
    map.tap_transect("lines.txt", [0]).unwrap();
    let overlay = map.evaluate_clicks(&mut || opened += 1);
    assert_eq!(overlay.contributing(), 2);

    let shape: Vec<(String, String)> = overlay
        .shape()
        .into_iter()
        .map(|(kind, label)| (kind.to_string(), label.to_string()))
        .collect();
    assert_eq!(shape, placeholder_shape);

    let Layer::Curve(curve) = &overlay.layers[0] else {
        panic!("expected a curve first");
    };
    assert_eq!(curve.label, "dem_2012.asc");
    // Row 2 from the top: 11 12 13 14 15 sampled west to east
    let values: Vec<f32> = curve.samples.iter().map(|s| s.value).collect();
    assert_eq!(values, vec![11.0, 12.0, 13.0, 14.0, 15.0]);
    assert!(curve.samples.windows(2).all(|w| w[0].distance <= w[1].distance));

    assert_eq!(opened, 1);
    let detail = map.detail().latest().unwrap();
    assert_eq!(detail.rows[0].easting, 296_050.0);
    assert_eq!(detail.rows[1].northing, 131_150.0);
}

#[test]
fn test_nodata_cells_are_dropped_along_transect() {
    let dir = data_root();
    let mut map = compositor(dir.path());
    map.set_transects(&["lines.txt"]);

    let mut opened = 0;
    map.tap_transect("lines.txt", [1]).unwrap();
    let overlay = map.evaluate_clicks(&mut || opened += 1);
    let Layer::Curve(curve) = &overlay.layers[0] else {
        panic!("expected a curve first");
    };
    // Column 2 bottom to top is 18 13 (nodata) 3
    let values: Vec<f32> = curve.samples.iter().map(|s| s.value).collect();
    assert_eq!(values, vec![18.0, 13.0, 3.0]);
    let distances: Vec<f64> = curve.samples.iter().map(|s| s.distance).collect();
    assert_eq!(distances, vec![0.0, 100.0, 300.0]);
}

#[test]
fn test_invalid_and_idle_clicks_change_nothing() {
    let dir = data_root();
    let mut map = compositor(dir.path());
    map.set_transects(&["lines.txt"]);

    let mut opened = 0;
    map.tap_transect("lines.txt", [0]).unwrap();
    map.evaluate_clicks(&mut || opened += 1);
    let revision = map.detail().revision();
    let contributing = map.time_series().contributing();

    map.tap_transect("lines.txt", [0, 1]).unwrap();
    map.evaluate_clicks(&mut || opened += 1);
    map.evaluate_clicks(&mut || opened += 1);

    assert_eq!(opened, 1);
    assert_eq!(map.detail().revision(), revision);
    assert_eq!(map.time_series().contributing(), contributing);

    // Clicking the same transect again still refreshes the detail view
    map.tap_transect("lines.txt", [0]).unwrap();
    map.evaluate_clicks(&mut || opened += 1);
    assert_eq!(opened, 2);
    assert_eq!(map.detail().revision(), revision + 1);
}

#[test]
fn test_transect_outside_every_raster() {
    let dir = data_root();
    let mut map = compositor(dir.path());
    map.set_transects(&["lines.txt"]);

    let mut opened = 0;
    map.tap_transect("lines.txt", [2]).unwrap();
    let overlay = map.evaluate_clicks(&mut || opened += 1);
    assert_eq!(overlay.contributing(), 0);
    assert_eq!(overlay.layers.len(), 4);
    assert_eq!(opened, 1);
}

#[test]
fn test_extract_along_is_monotonic_and_misses_cleanly() {
    let raster = transect_viewer::grid::parse_ascii_grid(DEM).unwrap();
    let line = [Point::new(296_010.0, 131_010.0), Point::new(296_490.0, 131_390.0)];
    let samples = extract_along(&raster, &line).unwrap();
    assert!(!samples.is_empty());
    assert!(samples.windows(2).all(|w| w[0].distance <= w[1].distance));

    let away = [Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
    assert!(extract_along(&raster, &away).is_none());
}
