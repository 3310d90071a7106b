//! Task rules and behaviour settings.

use crate::advance::AdvanceMode;
use crate::models::AircraftState;
use serde::{Deserialize, Serialize};

/// Reference for the start height limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AltitudeReference {
    /// Above ground
    #[default]
    Agl,
    /// Above mean sea level
    Msl,
}

/// Rules of one ordered task. The factory owns the point-count fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderedTaskBehaviour {
    /// Whether the task is scored on distance
    pub task_scored: bool,
    /// Minimum task time for area tasks in seconds
    pub aat_min_time: f64,
    /// Maximum ground speed at start in m/s (0 = no limit)
    pub start_max_speed: f64,
    /// Maximum start height in meters (0 = no limit)
    pub start_max_height: f64,
    pub start_max_height_ref: AltitudeReference,
    /// Minimum finish height above the finish elevation in meters
    pub finish_min_height: f64,
    /// Whether the FAI finish height rule applies (start altitude minus 1000 m)
    pub fai_finish: bool,
    pub min_points: usize,
    pub max_points: usize,
    /// All intermediate points must be of the same kind
    pub homogeneous_tps: bool,
    /// Start and finish must coincide
    pub is_closed: bool,
    /// The start must be armed before the task advances past it
    pub start_requires_arm: bool,
}

impl Default for OrderedTaskBehaviour {
    fn default() -> Self {
        Self {
            task_scored: true,
            aat_min_time: 3.0 * 3600.0,
            start_max_speed: 0.0,
            start_max_height: 0.0,
            start_max_height_ref: AltitudeReference::Agl,
            finish_min_height: 0.0,
            fai_finish: false,
            min_points: 2,
            max_points: 13,
            homogeneous_tps: false,
            is_closed: false,
            start_requires_arm: false,
        }
    }
}

impl OrderedTaskBehaviour {
    /// Height of `state` measured against the start height reference.
    pub fn start_height(&self, state: &AircraftState) -> f64 {
        match self.start_max_height_ref {
            AltitudeReference::Agl => state.altitude_agl,
            AltitudeReference::Msl => state.altitude,
        }
    }

    pub fn check_start_speed(&self, state: &AircraftState) -> bool {
        self.start_max_speed <= 0.0 || state.ground_speed <= self.start_max_speed
    }

    pub fn check_start_height(&self, state: &AircraftState) -> bool {
        self.start_max_height <= 0.0 || self.start_height(state) <= self.start_max_height
    }

    /// Lowest valid finish altitude for a finish at `elevation`.
    pub fn finish_height(&self, elevation: f64, fai_finish_height: f64) -> f64 {
        let floor = elevation + self.finish_min_height;
        if self.fai_finish {
            floor.max(fai_finish_height)
        } else {
            floor
        }
    }
}

/// Default zone sizes used when the factory creates points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorDefaults {
    pub start_radius: f64,
    pub turnpoint_radius: f64,
    pub finish_radius: f64,
    pub aat_radius: f64,
}

impl Default for SectorDefaults {
    fn default() -> Self {
        Self {
            start_radius: 1_000.0,
            turnpoint_radius: 500.0,
            finish_radius: 1_000.0,
            aat_radius: 10_000.0,
        }
    }
}

/// Global behaviour of the task engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskBehaviour {
    /// Move area targets to meet the minimum time
    pub optimise_targets_range: bool,
    /// Move the active area target along the isoline to the best bearing
    pub optimise_targets_bearing: bool,
    /// Extra time added to the minimum time when placing targets, in seconds
    pub optimise_targets_margin: f64,
    /// Arrival height above ground at every point in meters
    pub safety_height_arrival: f64,
    /// Set MacCready to the best achievable value
    pub auto_mc: bool,
    pub calc_cruise_efficiency: bool,
    pub calc_effective_mc: bool,
    pub calc_glide_required: bool,
    pub advance_mode: AdvanceMode,
    pub ordered_defaults: OrderedTaskBehaviour,
    pub sector_defaults: SectorDefaults,
}

impl Default for TaskBehaviour {
    fn default() -> Self {
        Self {
            optimise_targets_range: true,
            optimise_targets_bearing: true,
            optimise_targets_margin: 0.0,
            safety_height_arrival: 300.0,
            auto_mc: false,
            calc_cruise_efficiency: true,
            calc_effective_mc: true,
            calc_glide_required: true,
            advance_mode: AdvanceMode::Smart,
            ordered_defaults: OrderedTaskBehaviour::default(),
            sector_defaults: SectorDefaults::default(),
        }
    }
}
