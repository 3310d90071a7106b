//! Slide an area target along its isoline to the fastest position.
//!
//! The isoline is the ellipse through the current target with the previous
//! and next locations as foci, so every position on it keeps the planned
//! task distance. Only the arc inside the zone around the current target is
//! searched.

use super::min_target::{target_legs, TargetPoint};
use super::zero_finder::find_min;
use crate::geo::{GeoPoint, EARTH_RADIUS_M};
use crate::glide::{GlidePolar, TaskMacCready};
use crate::models::AircraftState;
use crate::oz::ObservationZone;
use std::f64::consts::PI;

const ARC_STEP: f64 = PI / 90.0;

fn meters_per_degree() -> f64 {
    EARTH_RADIUS_M * PI / 180.0
}

/// Spherical equirectangular offset of `point` from `origin`, in meters.
fn to_xy(origin: &GeoPoint, point: &GeoPoint) -> (f64, f64) {
    let scale = meters_per_degree();
    (
        (point.longitude - origin.longitude) * scale * origin.latitude.to_radians().cos(),
        (point.latitude - origin.latitude) * scale,
    )
}

fn from_xy(origin: &GeoPoint, (east, north): (f64, f64)) -> GeoPoint {
    let scale = meters_per_degree();
    GeoPoint::new(
        origin.latitude + north / scale,
        origin.longitude + east / (scale * origin.latitude.to_radians().cos().max(1e-9)),
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Isoline {
    origin: GeoPoint,
    center: (f64, f64),
    major: (f64, f64),
    semi_major: f64,
    semi_minor: f64,
}

impl Isoline {
    fn new(previous: GeoPoint, target: GeoPoint, next: GeoPoint) -> Option<Self> {
        let f1 = to_xy(&target, &previous);
        let f2 = to_xy(&target, &next);
        let center = ((f1.0 + f2.0) / 2.0, (f1.1 + f2.1) / 2.0);
        let focal = ((f2.0 - f1.0) / 2.0).hypot((f2.1 - f1.1) / 2.0);
        let semi_major = (f1.0.hypot(f1.1) + f2.0.hypot(f2.1)) / 2.0;
        let semi_minor = (semi_major * semi_major - focal * focal).max(0.0).sqrt();
        if semi_minor < 1.0 || focal < 1.0 {
            return None;
        }
        let major = ((f2.0 - f1.0) / (2.0 * focal), (f2.1 - f1.1) / (2.0 * focal));
        Some(Self {
            origin: target,
            center,
            major,
            semi_major,
            semi_minor,
        })
    }

    fn xy(&self, theta: f64) -> (f64, f64) {
        let (u, v) = (self.semi_major * theta.cos(), self.semi_minor * theta.sin());
        (
            self.center.0 + u * self.major.0 - v * self.major.1,
            self.center.1 + u * self.major.1 + v * self.major.0,
        )
    }

    fn location(&self, theta: f64) -> GeoPoint {
        from_xy(&self.origin, self.xy(theta))
    }

    /// Ellipse parameter of the current target.
    fn target_theta(&self) -> f64 {
        let (dx, dy) = (-self.center.0, -self.center.1);
        let u = dx * self.major.0 + dy * self.major.1;
        let v = -dx * self.major.1 + dy * self.major.0;
        (v / self.semi_minor).atan2(u / self.semi_major)
    }
}

/// Best target for the active area point `points[0]`, or `None` when the
/// isoline is degenerate.
pub fn opt_target(
    previous: GeoPoint,
    zone: &ObservationZone,
    points: &[TargetPoint],
    aircraft: &AircraftState,
    polar: &GlidePolar,
) -> Option<GeoPoint> {
    let (active, rest) = points.split_first()?;
    let next = rest.first()?.location;
    let isoline = Isoline::new(previous, active.location, next)?;
    let theta0 = isoline.target_theta();

    let mut lower = theta0;
    while theta0 - lower < PI && zone.is_in_sector(&isoline.location(lower - ARC_STEP)) {
        lower -= ARC_STEP;
    }
    let mut upper = theta0;
    while upper - theta0 < PI && zone.is_in_sector(&isoline.location(upper + ARC_STEP)) {
        upper += ARC_STEP;
    }
    if upper - lower < ARC_STEP {
        return None;
    }

    let time_via = |theta: f64| {
        let mut candidate = points.to_vec();
        candidate[0] = TargetPoint {
            location: isoline.location(theta),
            range: None,
            ..*active
        };
        let legs = target_legs(aircraft.location, &candidate, 0.0);
        TaskMacCready::new(&legs, polar)
            .solve(aircraft.altitude, aircraft.wind)
            .total
            .time_elapsed
    };
    let theta = find_min(time_via, lower, upper);
    let best = isoline.location(theta);
    if zone.is_in_sector(&best) {
        return Some(best);
    }
    let nearest = if theta - lower < upper - theta { lower } else { upper };
    Some(isoline.location(nearest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::SpeedVector;

    #[test]
    fn test_isoline_passes_through_target() {
        let previous = GeoPoint::new(0.0, 0.0);
        let target = GeoPoint::new(0.05, 0.2);
        let next = GeoPoint::new(0.0, 0.4);
        let isoline = Isoline::new(previous, target, next).unwrap();
        let back = isoline.location(isoline.target_theta());
        assert!(back.distance(&target) < 5.0);

        let planned = previous.distance(&target) + target.distance(&next);
        let other = isoline.location(isoline.target_theta() + 0.2);
        let moved = previous.distance(&other) + other.distance(&next);
        assert!((moved - planned).abs() / planned < 1e-3);
    }

    #[test]
    fn test_opt_target_stays_in_zone() {
        let center = GeoPoint::new(0.0, 0.2);
        let zone = ObservationZone::cylinder(center, 10_000.0);
        let target = GeoPoint::new(0.05, 0.2);
        let points = [
            TargetPoint {
                location: target,
                range: Some((center, target)),
                min_arrival_altitude: 300.0,
            },
            TargetPoint {
                location: GeoPoint::new(0.0, 0.4),
                range: None,
                min_arrival_altitude: 300.0,
            },
        ];
        let aircraft = AircraftState::at(GeoPoint::new(0.0, 0.05), 1_500.0, 0.0)
            .with_wind(SpeedVector::new(0.0, 10.0));
        let polar = GlidePolar::default();
        let best = opt_target(GeoPoint::new(0.0, 0.0), &zone, &points, &aircraft, &polar).unwrap();
        assert!(zone.is_in_sector(&best));
    }

    #[test]
    fn test_degenerate_isoline() {
        let p = GeoPoint::new(0.0, 0.0);
        assert!(Isoline::new(p, GeoPoint::new(0.0, 0.1), GeoPoint::new(0.0, 0.2)).is_none());
    }
}
