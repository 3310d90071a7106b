//! Flight path implementations.

use soar_core::{AircraftState, GeoPoint};

/// Trait for flight path implementations.
pub trait FlightPath: Send + Sync {
    /// Get (location, altitude_m) at time t seconds from start.
    fn get_position(&self, t: f64) -> (GeoPoint, f64);

    /// Get approximate track at time t (degrees, 0 = North).
    fn get_heading(&self, t: f64) -> f64 {
        let (from, _) = self.get_position(t);
        let (to, _) = self.get_position(t + 1.0);
        if from.distance(&to) < 1e-3 {
            return 0.0;
        }
        from.bearing(&to)
    }

    /// Get speed in meters per second.
    fn get_speed_mps(&self) -> f64;

    /// Seconds until the path ends.
    fn duration(&self) -> f64;

    /// Aircraft fix at `t` seconds from start, stamped with `time_offset + t`.
    fn state_at(&self, t: f64, time_offset: f64) -> AircraftState {
        let (location, altitude) = self.get_position(t);
        AircraftState::at(location, altitude, time_offset + t).with_speed(self.get_speed_mps(), self.get_heading(t))
    }
}

/// Linear glide between two points.
#[derive(Debug, Clone)]
pub struct LinearPath {
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub start_altitude_m: f64,
    pub end_altitude_m: f64,
    pub speed_mps: f64,
    pub distance_m: f64,
    pub duration: f64,
    heading: f64,
}

impl LinearPath {
    pub fn new(start: GeoPoint, end: GeoPoint, start_altitude_m: f64, end_altitude_m: f64, speed_mps: f64) -> Self {
        let distance_m = start.distance(&end);
        let duration = if speed_mps > 0.0 {
            distance_m / speed_mps
        } else {
            0.0
        };

        Self {
            start,
            end,
            start_altitude_m,
            end_altitude_m,
            speed_mps,
            distance_m,
            duration,
            heading: start.bearing(&end),
        }
    }
}

impl FlightPath for LinearPath {
    fn get_position(&self, t: f64) -> (GeoPoint, f64) {
        // Clamp progress to [0, 1]
        let progress = if self.duration > 0.0 {
            (t / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let altitude = self.start_altitude_m + progress * (self.end_altitude_m - self.start_altitude_m);
        (self.start.interpolate(&self.end, progress), altitude)
    }

    fn get_heading(&self, _t: f64) -> f64 {
        self.heading
    }

    fn get_speed_mps(&self) -> f64 {
        self.speed_mps
    }

    fn duration(&self) -> f64 {
        self.duration
    }
}

/// Straight legs through a list of turn locations at constant speed,
/// losing height at a constant glide ratio.
#[derive(Debug, Clone)]
pub struct RoutePath {
    legs: Vec<LinearPath>,
}

impl RoutePath {
    /// Create a route through `turns`. A `glide_ratio` of zero keeps the
    /// altitude constant.
    pub fn new(turns: &[GeoPoint], altitude_m: f64, speed_mps: f64, glide_ratio: f64) -> Self {
        let mut legs = Vec::with_capacity(turns.len().saturating_sub(1));
        let mut altitude = altitude_m;
        for pair in turns.windows(2) {
            let loss = if glide_ratio > 0.0 {
                pair[0].distance(&pair[1]) / glide_ratio
            } else {
                0.0
            };
            let end_altitude = (altitude - loss).max(0.0);
            legs.push(LinearPath::new(pair[0], pair[1], altitude, end_altitude, speed_mps));
            altitude = end_altitude;
        }
        Self { legs }
    }

    pub fn legs(&self) -> &[LinearPath] {
        &self.legs
    }

    pub fn distance_m(&self) -> f64 {
        self.legs.iter().map(|l| l.distance_m).sum()
    }

    fn leg_at(&self, t: f64) -> Option<(&LinearPath, f64)> {
        let mut elapsed = 0.0;
        for leg in &self.legs {
            if t < elapsed + leg.duration {
                return Some((leg, t - elapsed));
            }
            elapsed += leg.duration;
        }
        self.legs.last().map(|leg| (leg, leg.duration))
    }
}

impl FlightPath for RoutePath {
    fn get_position(&self, t: f64) -> (GeoPoint, f64) {
        match self.leg_at(t.max(0.0)) {
            Some((leg, t)) => leg.get_position(t),
            None => (GeoPoint::default(), 0.0),
        }
    }

    fn get_heading(&self, t: f64) -> f64 {
        self.leg_at(t.max(0.0))
            .map(|(leg, t)| leg.get_heading(t))
            .unwrap_or(0.0)
    }

    fn get_speed_mps(&self) -> f64 {
        self.legs.first().map(|l| l.speed_mps).unwrap_or(0.0)
    }

    fn duration(&self) -> f64 {
        self.legs.iter().map(|l| l.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_path_start_position() {
        let path = LinearPath::new(GeoPoint::new(33.0, -117.0), GeoPoint::new(34.0, -118.0), 1_000.0, 500.0, 30.0);
        let (location, alt) = path.get_position(0.0);

        assert!((location.latitude - 33.0).abs() < 0.0001);
        assert!((location.longitude - (-117.0)).abs() < 0.0001);
        assert!((alt - 1_000.0).abs() < 0.01);
    }

    #[test]
    fn test_linear_path_end_position() {
        let path = LinearPath::new(GeoPoint::new(33.0, -117.0), GeoPoint::new(34.0, -118.0), 1_000.0, 500.0, 30.0);
        let (location, alt) = path.get_position(path.duration + 100.0); // Past end

        assert!((location.latitude - 34.0).abs() < 0.0001);
        assert!((location.longitude - (-118.0)).abs() < 0.0001);
        assert!((alt - 500.0).abs() < 0.01);
    }

    #[test]
    fn test_route_turns_at_each_point() {
        let turns = [GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.1), GeoPoint::new(0.1, 0.1)];
        let route = RoutePath::new(&turns, 1_500.0, 25.0, 40.0);
        assert_eq!(route.legs().len(), 2);

        let first = route.legs()[0].duration;
        let (corner, _) = route.get_position(first);
        assert!(corner.distance(&turns[1]) < 1.0);
        assert!((route.get_heading(1.0) - 90.0).abs() < 0.5);
        assert!(route.get_heading(first + 1.0).abs() < 0.5);

        let (end, altitude) = route.get_position(route.duration() + 10.0);
        assert!(end.distance(&turns[2]) < 1.0);
        assert!((altitude - (1_500.0 - route.distance_m() / 40.0)).abs() < 1.0);
    }

    #[test]
    fn test_state_carries_time_offset() {
        let route = RoutePath::new(&[GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.1)], 1_000.0, 20.0, 0.0);
        let state = route.state_at(50.0, 36_000.0);
        assert_eq!(state.time, 36_050.0);
        assert_eq!(state.altitude, 1_000.0);
        assert!(state.flying);
        assert_eq!(state.ground_speed, 20.0);
    }
}
