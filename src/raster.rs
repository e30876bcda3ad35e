//! In-memory single-band raster.
//!
//! Rows are stored top to bottom, columns left to right. Pixel `(0, 0)` has
//! its upper-left corner at `(bounds.minx, bounds.maxy)`.

use crate::casting::f64_to_pixel_index;
use crate::geometry::projection::{is_geographic_crs, regional_to_lon_lat, REGIONAL_EPSG};
use crate::geometry::{BoundingBox, Point};

/// A georeferenced single-band raster.
#[derive(Debug, Clone)]
pub struct Raster {
    /// Row-major pixel values.
    pub pixels: Vec<f32>,
    pub width: usize,
    pub height: usize,
    /// EPSG code of the raster's CRS.
    pub crs: i32,
    /// Extent in the raster's CRS.
    pub bounds: BoundingBox,
    /// Pixel size `(x, y)`, both positive.
    pub resolution: (f64, f64),
    /// Sentinel value meaning "no measurement".
    pub nodata: Option<f64>,
}

impl Raster {
    /// Convert world coordinates to fractional pixel coordinates `(col, row)`.
    #[inline]
    #[must_use]
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.bounds.minx) / self.resolution.0,
            (self.bounds.maxy - y) / self.resolution.1,
        )
    }

    /// World coordinates of the centre of pixel `(col, row)`.
    #[inline]
    #[must_use]
    pub fn pixel_center(&self, col: usize, row: usize) -> Point {
        // Allow cast precision loss: grid indices are far below 2^53
        #[allow(clippy::cast_precision_loss)]
        Point::new(
            self.bounds.minx + (col as f64 + 0.5) * self.resolution.0,
            self.bounds.maxy - (row as f64 + 0.5) * self.resolution.1,
        )
    }

    /// Value at pixel `(col, row)`, `None` outside the grid.
    #[inline]
    #[must_use]
    pub fn value(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.pixels.get(row * self.width + col).copied()
    }

    /// Value at a world coordinate, `None` outside the grid.
    #[must_use]
    pub fn value_at(&self, x: f64, y: f64) -> Option<f32> {
        let (px, py) = self.world_to_pixel(x, y);
        let col = f64_to_pixel_index(px, self.width)?;
        let row = f64_to_pixel_index(py, self.height)?;
        self.value(col, row)
    }

    /// Whether `value` is the nodata sentinel (or NaN).
    #[inline]
    #[must_use]
    pub fn is_nodata(&self, value: f32) -> bool {
        if value.is_nan() {
            return true;
        }
        // Pixels are stored as f32, so compare at that precision
        #[allow(clippy::cast_possible_truncation)]
        self.nodata.is_some_and(|nodata| value == nodata as f32)
    }

    /// Extent in WGS84 longitude/latitude.
    ///
    /// # Errors
    /// Returns an error if the raster's CRS cannot be projected.
    pub fn bounds_wgs84(&self) -> Result<BoundingBox, String> {
        if is_geographic_crs(self.crs) {
            return Ok(self.bounds);
        }
        let corners = if self.crs == REGIONAL_EPSG {
            [
                regional_to_lon_lat(self.bounds.minx, self.bounds.miny)?,
                regional_to_lon_lat(self.bounds.minx, self.bounds.maxy)?,
                regional_to_lon_lat(self.bounds.maxx, self.bounds.miny)?,
                regional_to_lon_lat(self.bounds.maxx, self.bounds.maxy)?,
            ]
        } else {
            use crate::geometry::projection::{project_point, WGS84_EPSG};
            [
                project_point(self.crs, WGS84_EPSG, self.bounds.minx, self.bounds.miny)?,
                project_point(self.crs, WGS84_EPSG, self.bounds.minx, self.bounds.maxy)?,
                project_point(self.crs, WGS84_EPSG, self.bounds.maxx, self.bounds.miny)?,
                project_point(self.crs, WGS84_EPSG, self.bounds.maxx, self.bounds.maxy)?,
            ]
        };
        let mut bbox = BoundingBox::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (lon, lat) in corners {
            bbox.minx = bbox.minx.min(lon);
            bbox.miny = bbox.miny.min(lat);
            bbox.maxx = bbox.maxx.max(lon);
            bbox.maxy = bbox.maxy.max(lat);
        }
        Ok(bbox)
    }

    /// Minimum and maximum of the valid (non-nodata) pixels.
    #[must_use]
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.pixels
            .iter()
            .copied()
            .filter(|v| !self.is_nodata(*v))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
