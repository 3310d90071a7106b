use crate::geo::GeoVector;

/// Outcome class of a glide solution. Anything but `Ok` means "no solution".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum GlideResultValidity {
    Ok,
    /// Head wind exceeds the achievable cruise speed
    WindExcessive,
    /// Climb needed but the MacCready setting is zero
    McTooLow,
    #[default]
    NoSolution,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlideResult {
    pub validity: GlideResultValidity,
    pub vector: GeoVector,
    /// Speed to fly in m/s
    pub v_opt: f64,
    /// Height gained in climbs
    pub height_climb: f64,
    /// Height lost in glides
    pub height_glide: f64,
    /// Seconds to complete the solution
    pub time_elapsed: f64,
    /// Arrival height above the floor, negative when short
    pub altitude_difference: f64,
    pub min_arrival_altitude: f64,
    pub head_wind: f64,
}

impl GlideResult {
    pub fn is_ok(&self) -> bool {
        self.validity == GlideResultValidity::Ok
    }

    /// Reachable without further climbing.
    pub fn is_final_glide(&self) -> bool {
        self.is_ok() && self.altitude_difference >= 0.0 && self.height_climb <= 0.0
    }

    /// Distance made good per meter of height lost.
    pub fn glide_angle_ground(&self) -> f64 {
        if self.height_glide > 0.0 {
            self.vector.distance / self.height_glide
        } else {
            f64::INFINITY
        }
    }

    /// Total ground speed over the solution.
    pub fn average_speed(&self) -> f64 {
        if self.time_elapsed > 0.0 {
            self.vector.distance / self.time_elapsed
        } else {
            0.0
        }
    }

    /// Append the following leg. The worst validity wins and the arrival
    /// figures come from the later leg.
    pub fn add(&mut self, other: &GlideResult) {
        self.validity = self.validity.max(other.validity);
        self.vector.distance += other.vector.distance;
        if !other.is_ok() {
            return;
        }
        self.height_climb += other.height_climb;
        self.height_glide += other.height_glide;
        self.time_elapsed += other.time_elapsed;
        self.altitude_difference = other.altitude_difference;
        self.min_arrival_altitude = other.min_arrival_altitude;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(distance: f64, time: f64) -> GlideResult {
        GlideResult {
            validity: GlideResultValidity::Ok,
            vector: GeoVector::new(distance, 90.0),
            time_elapsed: time,
            height_glide: distance / 40.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_add_accumulates_legs() {
        let mut total = ok(10_000.0, 400.0);
        total.add(&ok(5_000.0, 200.0));
        assert!(total.is_ok());
        assert_eq!(total.vector.distance, 15_000.0);
        assert_eq!(total.time_elapsed, 600.0);
        assert!((total.glide_angle_ground() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_add_keeps_worst_validity() {
        let mut total = ok(10_000.0, 400.0);
        total.add(&GlideResult {
            validity: GlideResultValidity::McTooLow,
            ..ok(5_000.0, 200.0)
        });
        assert!(!total.is_ok());
        assert_eq!(total.validity, GlideResultValidity::McTooLow);
        assert_eq!(total.time_elapsed, 400.0);
    }

    #[test]
    fn test_default_is_no_solution() {
        assert!(!GlideResult::default().is_ok());
        assert!(!GlideResult::default().is_final_glide());
    }
}
