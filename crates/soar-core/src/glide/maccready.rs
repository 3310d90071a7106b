//! MacCready speed-to-fly solutions for single legs and leg chains.

use super::polar::GlidePolar;
use super::result::{GlideResult, GlideResultValidity};
use super::state::GlideState;
use crate::geo::{GeoPoint, SpeedVector};

/// Single-leg solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacCready<'a> {
    polar: &'a GlidePolar,
    cruise_efficiency: f64,
    /// Fixed sink rate replacing the polar sink while gliding
    virtual_sink: Option<f64>,
}

impl<'a> MacCready<'a> {
    pub fn new(polar: &'a GlidePolar) -> Self {
        Self {
            polar,
            cruise_efficiency: polar.cruise_efficiency(),
            virtual_sink: None,
        }
    }

    pub fn with_cruise_efficiency(mut self, cruise_efficiency: f64) -> Self {
        self.cruise_efficiency = cruise_efficiency;
        self
    }

    pub fn with_virtual_sink(mut self, sink: f64) -> Self {
        self.virtual_sink = Some(sink);
        self
    }

    fn sink(&self, v: f64) -> f64 {
        self.virtual_sink.unwrap_or_else(|| self.polar.sink_rate(v))
    }

    /// Height lost gliding the whole leg without climbing, if the leg can be
    /// flown against the wind at all.
    pub fn glide_height(&self, state: &GlideState) -> Option<f64> {
        if state.vector.distance <= 0.0 {
            return Some(0.0);
        }
        let v = self.polar.v_opt_mc();
        let gs = state.ground_speed(v);
        (gs > 0.0).then(|| self.sink(v) * state.vector.distance / gs)
    }

    pub fn solve(&self, state: &GlideState) -> GlideResult {
        let mut result = GlideResult {
            validity: GlideResultValidity::Ok,
            vector: state.vector,
            min_arrival_altitude: state.min_arrival_altitude,
            head_wind: state.head_wind,
            altitude_difference: state.altitude_difference,
            ..Default::default()
        };
        let mc = self.polar.mc();

        if state.vector.distance <= 0.0 {
            let climb = (-state.altitude_difference).max(0.0);
            if climb > 0.0 && mc <= 0.0 {
                result.validity = GlideResultValidity::McTooLow;
                return result;
            }
            result.height_climb = climb;
            result.time_elapsed = if climb > 0.0 { climb / mc } else { 0.0 };
            return result;
        }

        let v = self.polar.v_opt(mc);
        let sink = self.sink(v);
        let gs = state.ground_speed(v);
        result.v_opt = v;
        if gs <= 0.0 {
            result.validity = GlideResultValidity::WindExcessive;
            return result;
        }

        let distance = state.vector.distance;
        let time_glide = distance / gs;
        let height_glide = sink * time_glide;
        if state.altitude_difference - height_glide >= 0.0 {
            result.time_elapsed = time_glide;
            result.height_glide = height_glide;
            result.altitude_difference = state.altitude_difference - height_glide;
            return result;
        }
        if mc <= 0.0 {
            result.validity = GlideResultValidity::McTooLow;
            result.height_glide = height_glide;
            result.altitude_difference = state.altitude_difference - height_glide;
            return result;
        }

        // cruise-climb: the aircraft drifts with the wind while circling
        let height = state.altitude_difference;
        let gs_cruise = gs * self.cruise_efficiency;
        let denominator = gs_cruise - state.head_wind * sink / mc;
        if denominator <= 0.0 {
            result.validity = GlideResultValidity::WindExcessive;
            return result;
        }
        let time_cruise = ((distance - state.head_wind * height / mc) / denominator).max(0.0);
        let height_glide = sink * time_cruise;
        let height_climb = (height_glide - height).max(0.0);
        result.height_glide = height_glide;
        result.height_climb = height_climb;
        result.time_elapsed = time_cruise + height_climb / mc;
        result.altitude_difference = height - height_glide;
        result
    }
}

/// One leg of a chain: fly from `origin` to `destination`, arriving no lower
/// than `min_arrival_altitude`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlideLeg {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub min_arrival_altitude: f64,
}

impl GlideLeg {
    pub fn distance(&self) -> f64 {
        self.origin.distance(&self.destination)
    }
}

/// Solution over a chain of legs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskGlide {
    pub total: GlideResult,
    pub legs: Vec<GlideResult>,
}

impl TaskGlide {
    /// The first leg, or an empty solution.
    pub fn first_leg(&self) -> GlideResult {
        self.legs.first().copied().unwrap_or_default()
    }

    /// Distance at the end of the chain that takes `time_remaining` seconds.
    pub fn effective_distance(&self, time_remaining: f64) -> f64 {
        let mut distance = 0.0;
        let mut time = 0.0;
        for leg in self.legs.iter().rev() {
            if leg.time_elapsed <= 0.0 {
                continue;
            }
            let p = (time_remaining - time) / leg.time_elapsed;
            if (0.0..=1.0).contains(&p) {
                return distance + p * leg.vector.distance;
            }
            distance += leg.vector.distance;
            time += leg.time_elapsed;
        }
        distance
    }

    /// Distance of leg `index` coverable in `time_remaining` seconds.
    pub fn effective_leg_distance(&self, index: usize, time_remaining: f64) -> f64 {
        match self.legs.get(index) {
            Some(leg) if leg.time_elapsed > 0.0 => {
                leg.vector.distance * (time_remaining / leg.time_elapsed).min(1.0)
            }
            Some(leg) => leg.vector.distance,
            None => 0.0,
        }
    }
}

/// Chain solver. The required heights are propagated back from the last leg
/// so that each leg arrives high enough for everything after it.
#[derive(Debug, Clone, Copy)]
pub struct TaskMacCready<'a> {
    legs: &'a [GlideLeg],
    mac_cready: MacCready<'a>,
}

impl<'a> TaskMacCready<'a> {
    pub fn new(legs: &'a [GlideLeg], polar: &'a GlidePolar) -> Self {
        Self {
            legs,
            mac_cready: MacCready::new(polar),
        }
    }

    pub fn with_mac_cready(legs: &'a [GlideLeg], mac_cready: MacCready<'a>) -> Self {
        Self { legs, mac_cready }
    }

    fn leg_state(&self, leg: &GlideLeg, min_arrival_altitude: f64, altitude: f64, wind: SpeedVector) -> GlideState {
        GlideState::new(leg.origin.vector_to(&leg.destination), min_arrival_altitude, altitude, wind)
    }

    /// Altitude needed at the start of each leg, or `None` when a leg
    /// cannot be flown against the wind.
    fn required_heights(&self, wind: SpeedVector) -> Option<Vec<f64>> {
        let mut required = vec![0.0; self.legs.len()];
        let mut after = f64::NEG_INFINITY;
        for (i, leg) in self.legs.iter().enumerate().rev() {
            let state = self.leg_state(leg, 0.0, 0.0, wind);
            let height = self.mac_cready.glide_height(&state)?;
            required[i] = after.max(leg.min_arrival_altitude) + height;
            after = required[i];
        }
        Some(required)
    }

    pub fn solve(&self, altitude: f64, wind: SpeedVector) -> TaskGlide {
        if self.legs.is_empty() {
            return TaskGlide {
                total: GlideResult {
                    validity: GlideResultValidity::Ok,
                    ..Default::default()
                },
                legs: Vec::new(),
            };
        }

        let required = self.required_heights(wind);
        let mut total = GlideResult {
            validity: GlideResultValidity::Ok,
            ..Default::default()
        };
        let mut legs = Vec::with_capacity(self.legs.len());
        let mut altitude_now = altitude;
        for (i, leg) in self.legs.iter().enumerate() {
            let floor = match &required {
                Some(required) => required
                    .get(i + 1)
                    .copied()
                    .unwrap_or(f64::NEG_INFINITY)
                    .max(leg.min_arrival_altitude),
                None => leg.min_arrival_altitude,
            };
            let result = self.mac_cready.solve(&self.leg_state(leg, floor, altitude_now, wind));
            altitude_now += result.height_climb - result.height_glide;
            if i == 0 {
                total = result;
            } else {
                total.add(&result);
            }
            legs.push(result);
        }

        if let Some(required) = &required {
            total.altitude_difference = altitude - required[0];
        } else {
            total.validity = total.validity.max(GlideResultValidity::WindExcessive);
        }
        TaskGlide { total, legs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoVector;

    fn polar(mc: f64) -> GlidePolar {
        GlidePolar::default().with_mc(mc)
    }

    #[test]
    fn test_final_glide_when_high() {
        let polar = polar(1.0);
        let state = GlideState::new(GeoVector::new(10_000.0, 90.0), 0.0, 2_000.0, SpeedVector::zero());
        let result = MacCready::new(&polar).solve(&state);
        assert!(result.is_final_glide());
        assert!(result.altitude_difference > 0.0);
        assert!((result.time_elapsed - 10_000.0 / polar.v_opt(1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_climb_needed_when_low() {
        let polar = polar(2.0);
        let state = GlideState::new(GeoVector::new(50_000.0, 90.0), 0.0, 300.0, SpeedVector::zero());
        let result = MacCready::new(&polar).solve(&state);
        assert!(result.is_ok());
        assert!(result.height_climb > 0.0);
        assert!(result.altitude_difference < 0.0);
        // climbing back the deficit
        assert!((result.height_climb + result.altitude_difference).abs() < 1e-6);
    }

    #[test]
    fn test_zero_mc_too_low() {
        let polar = polar(0.0);
        let state = GlideState::new(GeoVector::new(50_000.0, 90.0), 0.0, 300.0, SpeedVector::zero());
        assert_eq!(MacCready::new(&polar).solve(&state).validity, GlideResultValidity::McTooLow);
    }

    #[test]
    fn test_excessive_head_wind() {
        let polar = polar(1.0);
        let state = GlideState::new(GeoVector::new(10_000.0, 90.0), 0.0, 2_000.0, SpeedVector::new(90.0, 80.0));
        assert_eq!(MacCready::new(&polar).solve(&state).validity, GlideResultValidity::WindExcessive);
    }

    #[test]
    fn test_vertical_solution() {
        let polar = polar(2.0);
        let state = GlideState::vertical(1_000.0, 800.0);
        let result = MacCready::new(&polar).solve(&state);
        assert!(result.is_ok());
        assert!((result.height_climb - 200.0).abs() < 1e-9);
        assert!((result.time_elapsed - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_chain_propagates_required_heights() {
        let polar = polar(1.0);
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 0.1);
        let c = GeoPoint::new(0.0, 0.2);
        let legs = [
            GlideLeg { origin: a, destination: b, min_arrival_altitude: 300.0 },
            GlideLeg { origin: b, destination: c, min_arrival_altitude: 300.0 },
        ];
        let solution = TaskMacCready::new(&legs, &polar).solve(2_000.0, SpeedVector::zero());
        assert_eq!(solution.legs.len(), 2);
        assert!(solution.total.is_ok());
        let glide = solution.legs[0].height_glide + solution.legs[1].height_glide;
        assert!((solution.total.altitude_difference - (2_000.0 - 300.0 - glide)).abs() < 1e-6);
        assert!((solution.total.vector.distance - a.distance(&c)).abs() < 1e-6);
    }

    #[test]
    fn test_effective_distance_interpolates() {
        let leg = GlideResult {
            validity: GlideResultValidity::Ok,
            vector: GeoVector::new(10_000.0, 0.0),
            time_elapsed: 500.0,
            ..Default::default()
        };
        let glide = TaskGlide {
            total: leg,
            legs: vec![leg, leg],
        };
        assert!((glide.effective_distance(750.0) - 15_000.0).abs() < 1e-9);
        assert!((glide.effective_distance(5_000.0) - 20_000.0).abs() < 1e-9);
        assert!((glide.effective_leg_distance(0, 250.0) - 5_000.0).abs() < 1e-9);
    }
}
