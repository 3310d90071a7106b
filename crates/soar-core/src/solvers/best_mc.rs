use super::zero_finder::find_zero;
use super::MC_MAX;
use crate::glide::{GlideLeg, GlidePolar, GlideResultValidity, TaskMacCready};
use crate::models::AircraftState;

const UNREACHABLE_M: f64 = -1.0e6;

fn arrival_margin(legs: &[GlideLeg], aircraft: &AircraftState, polar: &GlidePolar, mc: f64) -> f64 {
    let polar = polar.with_mc(mc);
    let total = TaskMacCready::new(legs, &polar)
        .solve(aircraft.altitude, aircraft.wind)
        .total;
    if total.validity == GlideResultValidity::WindExcessive {
        UNREACHABLE_M
    } else {
        total.altitude_difference
    }
}

/// Highest MacCready setting that still reaches the end of `legs` without
/// climbing, clamped to `[0, MC_MAX]`. `None` when even MC 0 falls short.
pub fn best_mc(legs: &[GlideLeg], aircraft: &AircraftState, polar: &GlidePolar) -> Option<f64> {
    if legs.is_empty() {
        return None;
    }
    let margin = |mc: f64| arrival_margin(legs, aircraft, polar, mc);
    if margin(0.0) < 0.0 {
        return None;
    }
    if margin(MC_MAX) >= 0.0 {
        return Some(MC_MAX);
    }
    find_zero(margin, 0.0, MC_MAX).map(|mc| mc.clamp(0.0, MC_MAX))
}
