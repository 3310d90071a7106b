//! Glide polar: sink rate as a quadratic of airspeed.

use serde::{Deserialize, Serialize};

/// `sink = a * v^2 + b * v + c`, speeds in m/s and sink positive down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Default for PolarCoefficients {
    fn default() -> Self {
        Self {
            a: 0.0012,
            b: -0.0434,
            c: 0.941,
        }
    }
}

impl PolarCoefficients {
    /// Fit the quadratic through three (speed, sink) points.
    pub fn from_points(points: [(f64, f64); 3]) -> Option<Self> {
        let [(v1, w1), (v2, w2), (v3, w3)] = points;
        let d = (v1 - v2) * (v1 - v3) * (v2 - v3);
        if d.abs() < f64::EPSILON {
            return None;
        }
        let a = (v3 * (w2 - w1) + v2 * (w1 - w3) + v1 * (w3 - w2)) / d;
        let b = (v3 * v3 * (w1 - w2) + v2 * v2 * (w3 - w1) + v1 * v1 * (w2 - w3)) / d;
        let c = (v2 * v3 * (v2 - v3) * w1 + v3 * v1 * (v3 - v1) * w2 + v1 * v2 * (v1 - v2) * w3) / d;
        let coefficients = Self { a, b, c };
        coefficients.is_valid().then_some(coefficients)
    }

    pub fn is_valid(&self) -> bool {
        self.a > 0.0 && self.b < 0.0 && self.c > 0.0
    }
}

/// Aircraft performance settings read from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlideSettings {
    pub polar: PolarCoefficients,
    /// MacCready setting in m/s
    pub mc: f64,
    /// Performance factor, 1.0 = clean wings
    pub bugs: f64,
    /// Fraction of the ballast capacity carried
    pub ballast: f64,
    /// Water ballast capacity in kg
    pub ballast_capacity: f64,
    /// Mass the polar was measured at in kg
    pub reference_mass: f64,
    /// Maximum cruise speed in m/s
    pub v_max: f64,
}

impl Default for GlideSettings {
    fn default() -> Self {
        Self {
            polar: PolarCoefficients::default(),
            mc: 1.0,
            bugs: 1.0,
            ballast: 0.0,
            ballast_capacity: 100.0,
            reference_mass: 400.0,
            v_max: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlidePolar {
    ideal: PolarCoefficients,
    settings: GlideSettings,
    cruise_efficiency: f64,
    a: f64,
    b: f64,
    c: f64,
}

impl Default for GlidePolar {
    fn default() -> Self {
        Self::new(GlideSettings::default())
    }
}

impl GlidePolar {
    pub fn new(settings: GlideSettings) -> Self {
        let mut polar = Self {
            ideal: settings.polar,
            settings,
            cruise_efficiency: 1.0,
            a: 0.0,
            b: 0.0,
            c: 0.0,
        };
        polar.update();
        polar
    }

    fn update(&mut self) {
        let mass = self.settings.reference_mass + self.settings.ballast * self.settings.ballast_capacity;
        let loading = if self.settings.reference_mass > 0.0 {
            (mass / self.settings.reference_mass).max(f64::EPSILON)
        } else {
            1.0
        };
        let root = loading.sqrt();
        let bugs = self.settings.bugs.max(0.01);
        self.a = self.ideal.a / root / bugs;
        self.b = self.ideal.b / bugs;
        self.c = self.ideal.c * root / bugs;
    }

    pub fn mc(&self) -> f64 {
        self.settings.mc
    }

    pub fn set_mc(&mut self, mc: f64) {
        self.settings.mc = mc.max(0.0);
    }

    /// Copy of this polar at another MacCready setting.
    pub fn with_mc(&self, mc: f64) -> Self {
        let mut polar = self.clone();
        polar.set_mc(mc);
        polar
    }

    pub fn bugs(&self) -> f64 {
        self.settings.bugs
    }

    pub fn set_bugs(&mut self, bugs: f64) {
        self.settings.bugs = bugs.clamp(0.01, 1.0);
        self.update();
    }

    pub fn ballast(&self) -> f64 {
        self.settings.ballast
    }

    pub fn set_ballast(&mut self, ballast: f64) {
        self.settings.ballast = ballast.clamp(0.0, 1.0);
        self.update();
    }

    pub fn cruise_efficiency(&self) -> f64 {
        self.cruise_efficiency
    }

    pub fn set_cruise_efficiency(&mut self, cruise_efficiency: f64) {
        self.cruise_efficiency = cruise_efficiency;
    }

    pub fn settings(&self) -> &GlideSettings {
        &self.settings
    }

    pub fn is_valid(&self) -> bool {
        self.ideal.is_valid() && self.settings.v_max > self.v_min()
    }

    pub fn sink_rate(&self, v: f64) -> f64 {
        self.a * v * v + self.b * v + self.c
    }

    pub fn v_min(&self) -> f64 {
        -self.b / (2.0 * self.a)
    }

    pub fn s_min(&self) -> f64 {
        self.sink_rate(self.v_min())
    }

    pub fn v_max(&self) -> f64 {
        self.settings.v_max
    }

    pub fn v_best_ld(&self) -> f64 {
        (self.c / self.a).sqrt().clamp(self.v_min(), self.v_max())
    }

    pub fn best_ld(&self) -> f64 {
        let v = self.v_best_ld();
        v / self.sink_rate(v)
    }

    /// Speed to fly in still air for a climb rate of `mc`.
    pub fn v_opt(&self, mc: f64) -> f64 {
        ((self.c + mc.max(0.0)) / self.a)
            .sqrt()
            .clamp(self.v_min(), self.v_max())
    }

    /// Speed to fly at the current MacCready setting.
    pub fn v_opt_mc(&self) -> f64 {
        self.v_opt(self.settings.mc)
    }
}
