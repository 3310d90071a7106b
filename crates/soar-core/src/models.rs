use crate::geo::{GeoPoint, SpeedVector};
use serde::{Deserialize, Serialize};

/// Snapshot of the aircraft produced once per update tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AircraftState {
    /// Seconds since midnight UTC
    pub time: f64,
    pub location: GeoPoint,
    /// Altitude above mean sea level in meters
    pub altitude: f64,
    /// Altitude above ground in meters
    #[serde(default)]
    pub altitude_agl: f64,
    #[serde(default)]
    pub ground_speed: f64,
    /// Ground track in degrees
    #[serde(default)]
    pub track: f64,
    #[serde(default)]
    pub true_airspeed: f64,
    #[serde(default)]
    pub vario: f64,
    #[serde(default)]
    pub wind: SpeedVector,
    #[serde(default)]
    pub flying: bool,
}

impl AircraftState {
    /// A flying aircraft at `location`.
    pub fn at(location: GeoPoint, altitude: f64, time: f64) -> Self {
        Self {
            time,
            location,
            altitude,
            altitude_agl: altitude,
            flying: true,
            ..Default::default()
        }
    }

    pub fn with_wind(mut self, wind: SpeedVector) -> Self {
        self.wind = wind;
        self
    }

    pub fn with_speed(mut self, ground_speed: f64, track: f64) -> Self {
        self.ground_speed = ground_speed;
        self.true_airspeed = ground_speed;
        self.track = track;
        self
    }

    pub fn with_altitude_agl(mut self, altitude_agl: f64) -> Self {
        self.altitude_agl = altitude_agl;
        self
    }

    pub fn on_ground(mut self) -> Self {
        self.flying = false;
        self
    }
}

/// Turnpoint location as referenced by a task point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub location: GeoPoint,
    /// Ground elevation in meters
    #[serde(default)]
    pub elevation: f64,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, location: GeoPoint, elevation: f64) -> Self {
        Self {
            name: name.into(),
            location,
            elevation,
        }
    }

    /// Copy of this waypoint moved to `location`.
    pub fn relocated(&self, location: GeoPoint) -> Self {
        Self {
            location,
            ..self.clone()
        }
    }
}
