//! Flat projection of task geometry.
//!
//! Path searches and bounding-box prefilters work on a local equirectangular
//! projection centred on the task. One flat unit is [`FLAT_UNIT_M`] meters.

use crate::geo::{meters_per_deg_lat, meters_per_deg_lon, GeoBounds, GeoPoint};

/// Size of one integer flat unit in meters.
pub const FLAT_UNIT_M: f64 = 50.0;

/// Integer projected location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct FlatGeoPoint {
    pub x: i32,
    pub y: i32,
}

impl FlatGeoPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(&self, other: &FlatGeoPoint) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }
}

/// Floating point projected location, in flat units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlatPoint {
    pub x: f64,
    pub y: f64,
}

impl FlatPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &FlatPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Cross product of (a - self) x (b - self).
    pub fn cross(&self, a: &FlatPoint, b: &FlatPoint) -> f64 {
        (a.x - self.x) * (b.y - self.y) - (a.y - self.y) * (b.x - self.x)
    }

    pub fn round(&self) -> FlatGeoPoint {
        FlatGeoPoint::new(self.x.round() as i32, self.y.round() as i32)
    }
}

/// Axis aligned box in integer flat units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlatBoundingBox {
    lower: FlatGeoPoint,
    upper: FlatGeoPoint,
}

impl FlatBoundingBox {
    /// Box of `radius` units around `center`.
    pub fn around(center: FlatGeoPoint, radius: i32) -> Self {
        Self {
            lower: FlatGeoPoint::new(center.x - radius, center.y - radius),
            upper: FlatGeoPoint::new(center.x + radius, center.y + radius),
        }
    }

    /// Smallest box holding every point, `None` for an empty iterator.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = FlatGeoPoint>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bb = Self::around(first, 0);
        for p in iter {
            bb.lower.x = bb.lower.x.min(p.x);
            bb.lower.y = bb.lower.y.min(p.y);
            bb.upper.x = bb.upper.x.max(p.x);
            bb.upper.y = bb.upper.y.max(p.y);
        }
        Some(bb)
    }

    pub fn expand(&mut self, by: i32) {
        self.lower.x -= by;
        self.lower.y -= by;
        self.upper.x += by;
        self.upper.y += by;
    }

    pub fn overlaps(&self, other: &FlatBoundingBox) -> bool {
        self.lower.x <= other.upper.x
            && other.lower.x <= self.upper.x
            && self.lower.y <= other.upper.y
            && other.lower.y <= self.upper.y
    }

    pub fn contains(&self, p: &FlatGeoPoint) -> bool {
        p.x >= self.lower.x && p.x <= self.upper.x && p.y >= self.lower.y && p.y <= self.upper.y
    }

    pub fn lower(&self) -> FlatGeoPoint {
        self.lower
    }

    pub fn upper(&self) -> FlatGeoPoint {
        self.upper
    }
}

/// Projection shared by all points of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskProjection {
    location_min: GeoPoint,
    location_max: GeoPoint,
    center: GeoPoint,
    units_per_deg_lat: f64,
    units_per_deg_lon: f64,
}

impl Default for TaskProjection {
    fn default() -> Self {
        let mut projection = Self {
            location_min: GeoPoint::default(),
            location_max: GeoPoint::default(),
            center: GeoPoint::default(),
            units_per_deg_lat: 1.0,
            units_per_deg_lon: 1.0,
        };
        projection.update();
        projection
    }
}

impl TaskProjection {
    pub fn new(location: GeoPoint) -> Self {
        let mut projection = Self::default();
        projection.reset(location);
        projection.update();
        projection
    }

    /// Restart the extent scan at `location`.
    pub fn reset(&mut self, location: GeoPoint) {
        self.location_min = location;
        self.location_max = location;
    }

    /// Grow the extent to include `location`.
    pub fn scan(&mut self, location: GeoPoint) {
        self.location_min.latitude = self.location_min.latitude.min(location.latitude);
        self.location_min.longitude = self.location_min.longitude.min(location.longitude);
        self.location_max.latitude = self.location_max.latitude.max(location.latitude);
        self.location_max.longitude = self.location_max.longitude.max(location.longitude);
    }

    /// Recompute center and scale from the scanned extent. Returns true if the center moved.
    pub fn update(&mut self) -> bool {
        let center = self.location_min.midpoint(&self.location_max);
        let changed = center != self.center;
        self.center = center;
        self.units_per_deg_lat = meters_per_deg_lat(center.latitude) / FLAT_UNIT_M;
        self.units_per_deg_lon = (meters_per_deg_lon(center.latitude) / FLAT_UNIT_M).max(1e-9);
        changed
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn fproject(&self, location: &GeoPoint) -> FlatPoint {
        FlatPoint::new(
            (location.longitude - self.center.longitude) * self.units_per_deg_lon,
            (location.latitude - self.center.latitude) * self.units_per_deg_lat,
        )
    }

    pub fn project(&self, location: &GeoPoint) -> FlatGeoPoint {
        self.fproject(location).round()
    }

    pub fn funproject(&self, point: &FlatPoint) -> GeoPoint {
        GeoPoint::new(
            self.center.latitude + point.y / self.units_per_deg_lat,
            self.center.longitude + point.x / self.units_per_deg_lon,
        )
    }

    pub fn unproject(&self, point: &FlatGeoPoint) -> GeoPoint {
        self.funproject(&FlatPoint::new(f64::from(point.x), f64::from(point.y)))
    }

    /// Meters to flat units.
    pub fn project_range(&self, distance_m: f64) -> f64 {
        distance_m / FLAT_UNIT_M
    }

    /// Distance from the center to the farthest scanned corner, in meters.
    pub fn approx_radius(&self) -> f64 {
        self.center
            .distance(&self.location_min)
            .max(self.center.distance(&self.location_max))
    }

    pub fn bounds(&self) -> GeoBounds {
        let mut bounds = GeoBounds::from_point(self.location_min);
        bounds.extend(self.location_max);
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_unproject_round_trip() {
        let mut projection = TaskProjection::new(GeoPoint::new(47.0, 8.0));
        projection.scan(GeoPoint::new(47.5, 8.7));
        projection.update();

        let location = GeoPoint::new(47.2, 8.3);
        let back = projection.funproject(&projection.fproject(&location));
        assert!(location.distance(&back) < 0.01);
    }

    #[test]
    fn test_flat_scale_matches_geodesic() {
        let mut projection = TaskProjection::new(GeoPoint::new(0.0, 0.0));
        projection.scan(GeoPoint::new(0.0, 0.2));
        projection.update();

        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 0.1);
        let flat = projection.fproject(&a).distance(&projection.fproject(&b)) * FLAT_UNIT_M;
        assert!((flat - a.distance(&b)).abs() / a.distance(&b) < 0.005);
    }

    #[test]
    fn test_bounding_box_overlap() {
        let a = FlatBoundingBox::around(FlatGeoPoint::new(0, 0), 1);
        let b = FlatBoundingBox::around(FlatGeoPoint::new(2, 2), 1);
        let c = FlatBoundingBox::around(FlatGeoPoint::new(5, 0), 1);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
