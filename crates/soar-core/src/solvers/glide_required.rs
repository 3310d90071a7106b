use super::zero_finder::find_zero;
use crate::glide::{GlideLeg, GlidePolar, MacCready, TaskMacCready};
use crate::models::AircraftState;

const SINK_LIMIT: f64 = 10.0;

/// Sink rate at which a straight glide along `legs` arrives exactly on the
/// floors, flying at the current MacCready speed. Negative values mean the
/// remaining task needs a net climb.
pub fn required_glide(legs: &[GlideLeg], aircraft: &AircraftState, polar: &GlidePolar) -> f64 {
    if legs.is_empty() {
        return 0.0;
    }
    let margin = |sink: f64| {
        let mac_cready = MacCready::new(polar).with_virtual_sink(sink);
        TaskMacCready::with_mac_cready(legs, mac_cready)
            .solve(aircraft.altitude, aircraft.wind)
            .total
            .altitude_difference
    };
    match find_zero(margin, -SINK_LIMIT, SINK_LIMIT) {
        Some(sink) => sink,
        None if margin(SINK_LIMIT) > 0.0 => SINK_LIMIT,
        None => -SINK_LIMIT,
    }
}
