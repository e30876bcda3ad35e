//! Coordinate types and planar helpers.
//!
//! All helpers here are planar: they operate in whatever units the caller's
//! coordinates are in. Distances along transects are measured in the
//! projected metres of the regional CRS.

pub mod projection;

use serde::{Deserialize, Serialize};

/// A 2D coordinate (x = easting / longitude, y = northing / latitude).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Axis-aligned bounding box in a coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self { minx, miny, maxx, maxy }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.maxx - self.minx
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.maxy - self.miny
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.minx && p.x <= self.maxx && p.y >= self.miny && p.y <= self.maxy
    }

    #[must_use]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(self.maxx < other.minx
            || self.minx > other.maxx
            || self.maxy < other.miny
            || self.miny > other.maxy)
    }

    /// Clip the segment `a -> b` to this box (Liang-Barsky).
    ///
    /// Returns the parametric range `(t0, t1)` with `0 <= t0 <= t1 <= 1` of the
    /// part of the segment inside the box, or `None` if they do not meet.
    #[must_use]
    pub fn clip_segment(&self, a: &Point, b: &Point) -> Option<(f64, f64)> {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let checks = [
            (-dx, a.x - self.minx),
            (dx, self.maxx - a.x),
            (-dy, a.y - self.miny),
            (dy, self.maxy - a.y),
        ];

        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        for (p, q) in checks {
            if p == 0.0 {
                // Parallel to this edge: reject if outside it
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
        Some((t0, t1))
    }
}

/// Point at parameter `t` along `a -> b`.
#[inline]
#[must_use]
pub fn lerp(a: &Point, b: &Point, t: f64) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_bbox_intersection() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(bbox.intersects(&BoundingBox::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!bbox.intersects(&BoundingBox::new(20.0, 20.0, 30.0, 30.0)));
    }

    #[test]
    fn test_clip_segment_crossing() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let (t0, t1) = bbox
            .clip_segment(&Point::new(-10.0, 5.0), &Point::new(20.0, 5.0))
            .expect("segment crosses the box");
        assert!((t0 - 1.0 / 3.0).abs() < EPS);
        assert!((t1 - 2.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn test_clip_segment_inside() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let clip = bbox.clip_segment(&Point::new(1.0, 1.0), &Point::new(9.0, 9.0));
        assert_eq!(clip, Some((0.0, 1.0)));
    }

    #[test]
    fn test_clip_segment_outside() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(bbox
            .clip_segment(&Point::new(-5.0, -5.0), &Point::new(-1.0, 20.0))
            .is_none());
        // Parallel to an edge, outside the box
        assert!(bbox
            .clip_segment(&Point::new(-1.0, 0.0), &Point::new(-1.0, 10.0))
            .is_none());
    }

    #[test]
    fn test_clip_degenerate_segment() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let p = Point::new(5.0, 5.0);
        assert_eq!(bbox.clip_segment(&p, &p), Some((0.0, 1.0)));
        let q = Point::new(50.0, 5.0);
        assert!(bbox.clip_segment(&q, &q).is_none());
    }

    #[test]
    fn test_lerp() {
        let p = lerp(&Point::new(0.0, 0.0), &Point::new(10.0, 20.0), 0.25);
        assert!((p.x - 2.5).abs() < EPS);
        assert!((p.y - 5.0).abs() < EPS);
    }
}
