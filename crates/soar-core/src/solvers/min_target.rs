use super::zero_finder::find_zero;
use crate::geo::GeoPoint;
use crate::glide::{GlideLeg, GlidePolar, TaskMacCready};
use crate::models::AircraftState;

/// Remaining point as seen by the target searches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPoint {
    /// Where the point is flown to when it cannot be moved
    pub location: GeoPoint,
    /// Reference and farthest location of a movable target
    pub range: Option<(GeoPoint, GeoPoint)>,
    pub min_arrival_altitude: f64,
}

impl TargetPoint {
    pub fn at_range(&self, range: f64) -> GeoPoint {
        match self.range {
            Some((reference, max)) => reference.interpolate(&max, range),
            None => self.location,
        }
    }
}

/// Legs from `origin` through every point with movable targets at `range`.
pub fn target_legs(origin: GeoPoint, points: &[TargetPoint], range: f64) -> Vec<GlideLeg> {
    let mut legs = Vec::with_capacity(points.len());
    let mut from = origin;
    for point in points {
        let to = point.at_range(range);
        legs.push(GlideLeg {
            origin: from,
            destination: to,
            min_arrival_altitude: point.min_arrival_altitude,
        });
        from = to;
    }
    legs
}

/// Target range in `[0, 1]` at which the remaining task takes
/// `time_remaining` seconds. Zero when nothing can be moved or the task is
/// already long enough at the reference targets.
pub fn min_target(
    points: &[TargetPoint],
    aircraft: &AircraftState,
    polar: &GlidePolar,
    time_remaining: f64,
) -> f64 {
    if points.iter().all(|p| p.range.is_none()) {
        return 0.0;
    }
    let excess = |range: f64| {
        let legs = target_legs(aircraft.location, points, range);
        TaskMacCready::new(&legs, polar)
            .solve(aircraft.altitude, aircraft.wind)
            .total
            .time_elapsed
            - time_remaining
    };
    if excess(0.0) >= 0.0 {
        return 0.0;
    }
    if excess(1.0) <= 0.0 {
        return 1.0;
    }
    find_zero(excess, 0.0, 1.0).map(|r| r.clamp(0.0, 1.0)).unwrap_or(0.0)
}
