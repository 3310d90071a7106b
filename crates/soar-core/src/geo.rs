//! Geodetic math for task geometry.
//!
//! Locations are WGS84 latitude/longitude in decimal degrees, distances in
//! meters and bearings in degrees clockwise from true north.

use serde::{Deserialize, Serialize};

/// Mean earth radius used by the great-circle helpers.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geodetic location.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance(&self, other: &GeoPoint) -> f64 {
        haversine_distance(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Initial bearing to `other` in degrees, 0..360.
    pub fn bearing(&self, other: &GeoPoint) -> f64 {
        normalize_bearing(
            bearing(self.latitude, self.longitude, other.latitude, other.longitude).to_degrees(),
        )
    }

    pub fn vector_to(&self, other: &GeoPoint) -> GeoVector {
        GeoVector::new(self.distance(other), self.bearing(other))
    }

    /// Point reached by travelling `distance_m` along `bearing_deg`.
    pub fn offset(&self, bearing_deg: f64, distance_m: f64) -> GeoPoint {
        let (lat, lon) = offset_by_bearing(
            self.latitude,
            self.longitude,
            distance_m,
            bearing_deg.to_radians(),
        );
        GeoPoint::new(lat, lon)
    }

    /// Linear interpolation in lat/lon; adequate over task-leg distances.
    pub fn interpolate(&self, other: &GeoPoint, t: f64) -> GeoPoint {
        GeoPoint::new(
            self.latitude + (other.latitude - self.latitude) * t,
            self.longitude + (other.longitude - self.longitude) * t,
        )
    }

    pub fn midpoint(&self, other: &GeoPoint) -> GeoPoint {
        self.interpolate(other, 0.5)
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}

/// Distance and bearing of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoVector {
    pub distance: f64,
    pub bearing: f64,
}

impl GeoVector {
    pub const fn new(distance: f64, bearing: f64) -> Self {
        Self { distance, bearing }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn end_point(&self, origin: &GeoPoint) -> GeoPoint {
        origin.offset(self.bearing, self.distance)
    }
}

/// Horizontal speed with direction; for wind the bearing is where it blows FROM.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeedVector {
    pub bearing: f64,
    pub norm: f64,
}

impl SpeedVector {
    pub const fn new(bearing: f64, norm: f64) -> Self {
        Self { bearing, norm }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn is_zero(&self) -> bool {
        self.norm.abs() <= f64::EPSILON
    }
}

/// Lat/lon aligned bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    pub fn from_point(point: GeoPoint) -> Self {
        Self {
            north: point.latitude,
            south: point.latitude,
            east: point.longitude,
            west: point.longitude,
        }
    }

    pub fn extend(&mut self, point: GeoPoint) {
        self.north = self.north.max(point.latitude);
        self.south = self.south.min(point.latitude);
        self.east = self.east.max(point.longitude);
        self.west = self.west.min(point.longitude);
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.latitude <= self.north
            && point.latitude >= self.south
            && point.longitude <= self.east
            && point.longitude >= self.west
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }
}

/// Wrap a bearing into 0..360 degrees.
pub fn normalize_bearing(deg: f64) -> f64 {
    let b = deg.rem_euclid(360.0);
    if b >= 360.0 {
        0.0
    } else {
        b
    }
}

/// Reciprocal bearing.
pub fn reciprocal(deg: f64) -> f64 {
    normalize_bearing(deg + 180.0)
}

/// Signed turn from `from` to `to`, in (-180, 180].
pub fn bearing_difference(from: f64, to: f64) -> f64 {
    let d = normalize_bearing(to - from);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Whether `bearing` lies in the clockwise arc from `start` to `end`.
/// Equal start and end denote the full circle.
pub fn bearing_within(bearing: f64, start: f64, end: f64) -> bool {
    let width = normalize_bearing(end - start);
    if width <= f64::EPSILON {
        return true;
    }
    normalize_bearing(bearing - start) <= width + 1e-9
}

/// Haversine distance in meters between two lat/lon pairs in degrees.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Meters per degree of latitude, WGS84 series.
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude, WGS84 series.
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Initial bearing in radians, clockwise from north.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    x.atan2(y)
}

/// (lat, lon) reached from a position along a bearing in radians.
pub fn offset_by_bearing(lat: f64, lon: f64, distance_m: f64, bearing_rad: f64) -> (f64, f64) {
    if distance_m.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    (lat2.to_degrees(), lon2.to_degrees())
}

/// East/north offset of `point` from `origin` in meters, local flat approximation.
pub fn local_xy(origin: &GeoPoint, point: &GeoPoint) -> (f64, f64) {
    (
        (point.longitude - origin.longitude) * meters_per_deg_lon(origin.latitude),
        (point.latitude - origin.latitude) * meters_per_deg_lat(origin.latitude),
    )
}

/// Whether segments a1-a2 and b1-b2 touch or cross, on locally projected meters.
pub fn segments_intersect_2d(
    a1: (f64, f64),
    a2: (f64, f64),
    b1: (f64, f64),
    b2: (f64, f64),
) -> bool {
    const EPS_M: f64 = 1e-6;

    fn orient(p: (f64, f64), q: (f64, f64), r: (f64, f64)) -> f64 {
        (q.0 - p.0) * (r.1 - p.1) - (q.1 - p.1) * (r.0 - p.0)
    }

    fn within(a: f64, b: f64, value: f64) -> bool {
        let min = a.min(b) - EPS_M;
        let max = a.max(b) + EPS_M;
        value >= min && value <= max
    }

    fn on_segment(p: (f64, f64), q: (f64, f64), r: (f64, f64)) -> bool {
        within(p.0, q.0, r.0) && within(p.1, q.1, r.1)
    }

    let o1 = orient(a1, a2, b1);
    let o2 = orient(a1, a2, b2);
    let o3 = orient(b1, b2, a1);
    let o4 = orient(b1, b2, a2);

    if o1.abs() <= EPS_M && on_segment(a1, a2, b1) {
        return true;
    }
    if o2.abs() <= EPS_M && on_segment(a1, a2, b2) {
        return true;
    }
    if o3.abs() <= EPS_M && on_segment(b1, b2, a1) {
        return true;
    }
    if o4.abs() <= EPS_M && on_segment(b1, b2, a2) {
        return true;
    }

    let a_crosses = (o1 > EPS_M && o2 < -EPS_M) || (o1 < -EPS_M && o2 > EPS_M);
    let b_crosses = (o3 > EPS_M && o4 < -EPS_M) || (o3 < -EPS_M && o4 > EPS_M);
    a_crosses && b_crosses
}
