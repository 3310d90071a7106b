use crate::geo::{GeoVector, SpeedVector};

/// One glide problem: a leg, the height available and the wind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlideState {
    pub vector: GeoVector,
    /// Lowest altitude allowed at the destination
    pub min_arrival_altitude: f64,
    /// Aircraft altitude at the origin
    pub altitude: f64,
    /// Height above the arrival floor
    pub altitude_difference: f64,
    pub wind: SpeedVector,
    /// Wind component against the track, positive for head wind
    pub head_wind: f64,
    pub cross_wind: f64,
}

impl GlideState {
    pub fn new(vector: GeoVector, min_arrival_altitude: f64, altitude: f64, wind: SpeedVector) -> Self {
        let (head_wind, cross_wind) = if wind.is_zero() || vector.distance <= 0.0 {
            (0.0, 0.0)
        } else {
            let theta = (wind.bearing - vector.bearing).to_radians();
            (wind.norm * theta.cos(), wind.norm * theta.sin())
        };
        Self {
            vector,
            min_arrival_altitude,
            altitude,
            altitude_difference: altitude - min_arrival_altitude,
            wind,
            head_wind,
            cross_wind,
        }
    }

    /// Climb-only problem with no horizontal leg.
    pub fn vertical(min_arrival_altitude: f64, altitude: f64) -> Self {
        Self::new(GeoVector::zero(), min_arrival_altitude, altitude, SpeedVector::zero())
    }

    /// Ground speed along the track for airspeed `v`.
    pub fn ground_speed(&self, v: f64) -> f64 {
        let along = (v * v - self.cross_wind * self.cross_wind).max(0.0).sqrt();
        along - self.head_wind
    }
}
