//! Along-transect extraction.
//!
//! Samples a raster under a transect polyline. The line is clipped to the
//! raster extent, every cell it crosses is visited once (Amanatides-Woo
//! traversal in pixel space), and each valid cell yields one sample at its
//! centre.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use transect_viewer::extract::extract_along;
//! use transect_viewer::geometry::Point;
//! use transect_viewer::grid::read_ascii_grid;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let raster = read_ascii_grid(Path::new("Elevation/dem_2012.asc"))?;
//!     let line = [Point::new(296_856.91, 131_388.77), Point::new(296_416.54, 132_035.85)];
//!     if let Some(samples) = extract_along(&raster, &line) {
//!         for s in samples {
//!             println!("{:.1} m: {}", s.distance, s.value);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::casting::{f64_to_clamped_pixel, step_index};
use crate::geometry::projection::{project_point, REGIONAL_EPSG};
use crate::geometry::{lerp, Point};
use crate::layer::Layer;
use crate::raster::Raster;

/// One raster cell under a transect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransectSample {
    /// Cell centre x in the raster's projected units.
    #[serde(rename = "Easting (meters)")]
    pub easting: f64,
    #[serde(rename = "Northing (meters)")]
    pub northing: f64,
    /// Straight-line distance from the first point of the transect.
    #[serde(rename = "Distance (meters)")]
    pub distance: f64,
    #[serde(rename = "Value")]
    pub value: f32,
}

/// Sample `raster` along `line` (in the raster's CRS).
///
/// Returns `None` when the line misses the raster extent entirely. Otherwise
/// the samples are sorted by distance and exclude nodata cells, so the
/// vector may be empty.
#[must_use]
pub fn extract_along(raster: &Raster, line: &[Point]) -> Option<Vec<TransectSample>> {
    let origin = *line.first()?;
    if raster.width == 0 || raster.height == 0 {
        return None;
    }

    let segments: Vec<(Point, Point)> = if line.len() == 1 {
        vec![(origin, origin)]
    } else {
        line.windows(2).map(|w| (w[0], w[1])).collect()
    };

    let mut seen = HashSet::new();
    let mut cells = Vec::new();
    let mut intersects = false;
    for (a, b) in segments {
        let Some((t0, t1)) = raster.bounds.clip_segment(&a, &b) else {
            continue;
        };
        intersects = true;
        traverse_cells(raster, lerp(&a, &b, t0), lerp(&a, &b, t1), |cell| {
            if seen.insert(cell) {
                cells.push(cell);
            }
        });
    }
    if !intersects {
        return None;
    }

    let mut samples: Vec<TransectSample> = cells
        .into_iter()
        .filter_map(|(col, row)| {
            let value = raster.value(col, row)?;
            if raster.is_nodata(value) {
                return None;
            }
            let centre = raster.pixel_center(col, row);
            Some(TransectSample {
                easting: centre.x,
                northing: centre.y,
                distance: centre.distance_to(&origin),
                value,
            })
        })
        .collect();
    samples.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    Some(samples)
}

/// Visit every cell crossed by `p0 -> p1`, both inside the raster extent.
fn traverse_cells(raster: &Raster, p0: Point, p1: Point, mut visit: impl FnMut((usize, usize))) {
    let (fx0, fy0) = raster.world_to_pixel(p0.x, p0.y);
    let (fx1, fy1) = raster.world_to_pixel(p1.x, p1.y);

    let mut col = f64_to_clamped_pixel(fx0, raster.width);
    let mut row = f64_to_clamped_pixel(fy0, raster.height);
    let end_col = f64_to_clamped_pixel(fx1, raster.width);
    let end_row = f64_to_clamped_pixel(fy1, raster.height);

    let (step_x, mut t_max_x, t_delta_x) = axis_setup(fx0, fx1 - fx0, col);
    let (step_y, mut t_max_y, t_delta_y) = axis_setup(fy0, fy1 - fy0, row);

    // A straight line crosses at most width + height cells
    let max_steps = raster.width + raster.height;
    for _ in 0..=max_steps {
        visit((col, row));
        if col == end_col && row == end_row {
            break;
        }
        if t_max_x < t_max_y {
            match step_index(col, step_x) {
                Some(c) if c < raster.width => col = c,
                _ => break,
            }
            t_max_x += t_delta_x;
        } else {
            match step_index(row, step_y) {
                Some(r) if r < raster.height => row = r,
                _ => break,
            }
            t_max_y += t_delta_y;
        }
    }
}

/// Step direction, parameter of the first cell boundary, and parameter
/// spacing between boundaries along one pixel axis.
#[allow(clippy::cast_precision_loss)]
fn axis_setup(start: f64, delta: f64, cell: usize) -> (isize, f64, f64) {
    if delta > 0.0 {
        (1, ((cell + 1) as f64 - start) / delta, 1.0 / delta)
    } else if delta < 0.0 {
        (-1, (start - cell as f64) / -delta, -1.0 / delta)
    } else {
        (0, f64::INFINITY, f64::INFINITY)
    }
}

/// Sample a rendered layer along a transect given in the regional CRS.
///
/// Only image layers carry samples; other kinds return `None` with a
/// diagnostic.
#[must_use]
pub fn extract_from_layer(layer: &Layer, line: &[Point]) -> Option<Vec<TransectSample>> {
    let Some(image) = layer.as_image() else {
        warn!(layer = layer.label(), "Along-transect extraction needs a raster layer");
        return None;
    };
    let raster = &image.raster;

    if raster.crs == REGIONAL_EPSG {
        return extract_along(raster, line);
    }
    let projected: Result<Vec<Point>, String> = line
        .iter()
        .map(|p| project_point(REGIONAL_EPSG, raster.crs, p.x, p.y).map(Point::from))
        .collect();
    match projected {
        Ok(projected) => extract_along(raster, &projected),
        Err(e) => {
            debug!(layer = layer.label(), crs = raster.crs, error = %e, "Cannot project transect");
            None
        }
    }
}
