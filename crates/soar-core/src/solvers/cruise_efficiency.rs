//! Fit the glide model to the time actually taken over the travelled legs.

use super::zero_finder::find_zero;
use super::MC_MAX;
use crate::glide::{GlideLeg, GlidePolar, MacCready, TaskMacCready};
use crate::models::AircraftState;

const CE_MIN: f64 = 0.1;
const CE_MAX: f64 = 2.0;
const MC_MIN: f64 = 0.1;

fn bracketed<F>(f: F, lower: f64, upper: f64, neutral: f64) -> f64
where
    F: Fn(f64) -> f64 + Copy,
{
    if let Some(x) = find_zero(f, lower, upper) {
        return x;
    }
    let (f_lower, f_upper) = (f(lower), f(upper));
    if (f_lower - f_upper).abs() < 1e-9 {
        neutral
    } else if f_upper > 0.0 {
        upper
    } else {
        lower
    }
}

/// Cruise efficiency that makes the predicted time over `legs` equal to
/// `time_elapsed`, starting at `start_altitude`.
pub fn cruise_efficiency(
    legs: &[GlideLeg],
    start_altitude: f64,
    aircraft: &AircraftState,
    polar: &GlidePolar,
    time_elapsed: f64,
) -> f64 {
    if legs.is_empty() || time_elapsed <= 0.0 {
        return 1.0;
    }
    let excess = |ce: f64| {
        let mac_cready = MacCready::new(polar).with_cruise_efficiency(ce);
        TaskMacCready::with_mac_cready(legs, mac_cready)
            .solve(start_altitude, aircraft.wind)
            .total
            .time_elapsed
            - time_elapsed
    };
    bracketed(excess, CE_MIN, CE_MAX, 1.0)
}

/// MacCready setting that makes the predicted time over `legs` equal to
/// `time_elapsed`.
pub fn effective_mc(
    legs: &[GlideLeg],
    start_altitude: f64,
    aircraft: &AircraftState,
    polar: &GlidePolar,
    time_elapsed: f64,
) -> f64 {
    if legs.is_empty() || time_elapsed <= 0.0 {
        return polar.mc();
    }
    let excess = |mc: f64| {
        let polar = polar.with_mc(mc);
        TaskMacCready::new(legs, &polar)
            .solve(start_altitude, aircraft.wind)
            .total
            .time_elapsed
            - time_elapsed
    };
    bracketed(excess, MC_MIN, MC_MAX, polar.mc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;

    fn climbing_legs() -> Vec<GlideLeg> {
        vec![GlideLeg {
            origin: GeoPoint::new(0.0, 0.0),
            destination: GeoPoint::new(0.0, 0.5),
            min_arrival_altitude: 1_000.0,
        }]
    }

    fn predicted_time(polar: &GlidePolar, ce: f64) -> f64 {
        let legs = climbing_legs();
        let mac_cready = MacCready::new(polar).with_cruise_efficiency(ce);
        TaskMacCready::with_mac_cready(&legs, mac_cready)
            .solve(1_000.0, Default::default())
            .total
            .time_elapsed
    }

    #[test]
    fn test_cruise_efficiency_recovers_factor() {
        let polar = GlidePolar::default().with_mc(1.5);
        let aircraft = AircraftState::at(GeoPoint::new(0.0, 0.5), 1_000.0, 0.0);
        let actual = predicted_time(&polar, 1.2);
        let ce = cruise_efficiency(&climbing_legs(), 1_000.0, &aircraft, &polar, actual);
        assert!((ce - 1.2).abs() < 1e-3);
    }

    #[test]
    fn test_effective_mc_recovers_setting() {
        let polar = GlidePolar::default().with_mc(2.0);
        let aircraft = AircraftState::at(GeoPoint::new(0.0, 0.5), 1_000.0, 0.0);
        let actual = predicted_time(&polar, 1.0);
        let mc = effective_mc(&climbing_legs(), 1_000.0, &aircraft, &GlidePolar::default(), actual);
        assert!((mc - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_neutral_without_elapsed_time() {
        let polar = GlidePolar::default();
        let aircraft = AircraftState::default();
        assert_eq!(cruise_efficiency(&climbing_legs(), 1_000.0, &aircraft, &polar, 0.0), 1.0);
        assert_eq!(effective_mc(&[], 1_000.0, &aircraft, &polar, 100.0), polar.mc());
    }
}
