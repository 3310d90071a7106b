//! Derived task statistics, refreshed on every update tick.

use crate::glide::GlideResult;
use crate::task_point::TaskPointKind;

/// Time constant of the task vario filter, seconds.
pub const VARIO_TIME_CONSTANT: f64 = 120.0;
/// Time constant of the incremental speed filter, seconds.
pub const INCREMENTAL_SPEED_TIME_CONSTANT: f64 = 100.0;

/// Low-pass filtered rate of change of a sampled value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RateFilter {
    last: Option<f64>,
    value: f64,
}

impl RateFilter {
    /// Feed `x`, sampled `dt` seconds after the previous value. A first
    /// sample or a non-positive `dt` restarts the filter at zero.
    pub fn update(&mut self, x: f64, dt: f64, time_constant: f64) -> f64 {
        match self.last.replace(x) {
            Some(previous) if dt > 0.0 => {
                let rate = (x - previous) / dt;
                self.value += (rate - self.value) * dt / (time_constant.max(0.0) + dt);
            }
            _ => self.value = 0.0,
        }
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A distance with the average speed it was (or will be) flown at.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DistanceStat {
    distance: f64,
    speed: f64,
    speed_incremental: f64,
    incremental: RateFilter,
    defined: bool,
}

impl DistanceStat {
    pub fn set_distance(&mut self, distance: f64) {
        self.distance = distance;
        self.defined = true;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Average speed over `time` seconds; zero for non-positive times.
    pub fn calc_speed(&mut self, time: f64) {
        self.speed = if self.defined && time > 0.0 {
            self.distance / time
        } else {
            0.0
        };
    }

    /// Filtered rate of change of the distance over the last ticks.
    /// `decreasing` distances (remaining) count progress as positive speed.
    pub fn calc_incremental_speed(&mut self, dt: f64, decreasing: bool) {
        if !self.defined || dt <= 0.0 {
            self.incremental.reset();
            self.speed_incremental = 0.0;
            return;
        }
        let rate = self
            .incremental
            .update(self.distance, dt, INCREMENTAL_SPEED_TIME_CONSTANT);
        self.speed_incremental = if decreasing { -rate } else { rate };
    }

    pub fn reset_incremental_speed(&mut self) {
        self.incremental.reset();
        self.speed_incremental = 0.0;
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn speed_incremental(&self) -> f64 {
        self.speed_incremental
    }

    pub fn is_defined(&self) -> bool {
        self.defined
    }
}

/// Statistics of either the whole task or the current leg.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementStat {
    /// Time the element was started, if it has been
    pub time_started: Option<f64>,
    pub time_elapsed: f64,
    /// Predicted time to complete at the current MacCready setting
    pub time_remaining_now: f64,
    /// Elapsed plus remaining
    pub time_planned: f64,
    pub remaining: DistanceStat,
    pub remaining_effective: DistanceStat,
    pub planned: DistanceStat,
    pub travelled: DistanceStat,
    pub solution_remaining: GlideResult,
    pub solution_travelled: GlideResult,
    pub solution_planned: GlideResult,
    /// Remaining solution at MacCready 0
    pub solution_mc0: GlideResult,
    /// Rate of change of the remaining arrival height, m/s
    pub vario: f64,
    vario_filter: RateFilter,
}

impl ElementStat {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Refresh times from the solutions and derive the average speeds.
    pub fn calc_speeds(&mut self, now: f64) {
        self.time_elapsed = match self.time_started {
            Some(started) => (now - started).max(0.0),
            None => 0.0,
        };
        self.time_remaining_now = self.solution_remaining.time_elapsed;
        self.time_planned = self.time_elapsed + self.time_remaining_now;

        self.remaining.calc_speed(self.time_remaining_now);
        self.remaining_effective.calc_speed(self.time_remaining_now);
        self.planned.calc_speed(self.time_planned);
        self.travelled.calc_speed(self.time_elapsed);
    }

    /// Update the filtered rates with `dt` seconds since the previous tick.
    pub fn calc_rates(&mut self, dt: f64) {
        self.vario = self.vario_filter.update(
            self.solution_remaining.altitude_difference,
            dt,
            VARIO_TIME_CONSTANT,
        );
        self.remaining.calc_incremental_speed(dt, true);
        self.remaining_effective.calc_incremental_speed(dt, true);
        self.planned.calc_incremental_speed(dt, false);
        self.travelled.calc_incremental_speed(dt, false);
    }

    /// Restart the filtered rates, e.g. when the element changes.
    pub fn reset_rates(&mut self) {
        self.vario = 0.0;
        self.vario_filter.reset();
        self.remaining.reset_incremental_speed();
        self.remaining_effective.reset_incremental_speed();
        self.planned.reset_incremental_speed();
        self.travelled.reset_incremental_speed();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskStats {
    pub total: ElementStat,
    pub current_leg: ElementStat,
    /// Sum of the straight legs between point references
    pub distance_nominal: f64,
    pub distance_min: f64,
    pub distance_max: f64,
    pub distance_scored: f64,
    /// Highest MacCready that still completes the task on glide
    pub mc_best: Option<f64>,
    pub cruise_efficiency: f64,
    pub effective_mc: f64,
    /// Virtual sink rate of a straight glide to the finish; higher leaves more margin
    pub glide_required: f64,
    /// Height above the finish per meter remaining
    pub gradient: f64,
    pub task_started: bool,
    pub task_finished: bool,
    pub task_valid: bool,
    /// Time of the previous statistics update
    pub(crate) last_time: Option<f64>,
    /// Active index the current leg rates were built for
    pub(crate) leg_index: usize,
}

impl Default for TaskStats {
    fn default() -> Self {
        Self {
            total: ElementStat::default(),
            current_leg: ElementStat::default(),
            distance_nominal: 0.0,
            distance_min: 0.0,
            distance_max: 0.0,
            distance_scored: 0.0,
            mc_best: None,
            cruise_efficiency: 1.0,
            effective_mc: 0.0,
            glide_required: 0.0,
            gradient: 0.0,
            task_started: false,
            task_finished: false,
            task_valid: false,
            last_time: None,
            leg_index: 0,
        }
    }
}

impl TaskStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Seconds since the previous update at `time`; zero on the first one.
    pub(crate) fn advance_time(&mut self, time: f64) -> f64 {
        let dt = self.last_time.map_or(0.0, |last| time - last);
        self.last_time = Some(time);
        dt
    }
}

/// Progress entry of one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskSummaryPoint {
    pub kind: TaskPointKind,
    pub achieved: bool,
    /// Fraction of the planned distance left from this point to the finish
    pub d_remaining: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskSummary {
    pub points: Vec<TaskSummaryPoint>,
    pub active: usize,
    /// Fraction of the planned distance still to fly
    pub p_remaining: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_needs_definition_and_time() {
        let mut stat = DistanceStat::default();
        stat.calc_speed(100.0);
        assert_eq!(stat.speed(), 0.0);

        stat.set_distance(1_000.0);
        stat.calc_speed(0.0);
        assert_eq!(stat.speed(), 0.0);
        stat.calc_speed(100.0);
        assert!((stat.speed() - 10.0).abs() < 1e-9);

        stat.reset();
        assert!(!stat.is_defined());
    }

    #[test]
    fn test_element_times() {
        let mut element = ElementStat {
            time_started: Some(100.0),
            ..Default::default()
        };
        element.travelled.set_distance(5_000.0);
        element.solution_remaining.time_elapsed = 400.0;
        element.calc_speeds(600.0);
        assert_eq!(element.time_elapsed, 500.0);
        assert_eq!(element.time_planned, 900.0);
        assert!((element.travelled.speed() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_rate_filter_converges_to_steady_rate() {
        let mut filter = RateFilter::default();
        assert_eq!(filter.update(0.0, 1.0, 10.0), 0.0);
        let mut x = 0.0;
        for _ in 0..200 {
            x += 5.0;
            filter.update(x, 1.0, 10.0);
        }
        assert!((filter.value() - 5.0).abs() < 1e-3);

        // stalled time restarts the filter
        assert_eq!(filter.update(x, 0.0, 10.0), 0.0);
    }

    #[test]
    fn test_incremental_speed_of_remaining_distance() {
        let mut remaining = DistanceStat::default();
        let mut distance = 50_000.0;
        for _ in 0..400 {
            remaining.set_distance(distance);
            remaining.calc_incremental_speed(5.0, true);
            distance -= 150.0;
        }
        // 150 m every 5 s
        assert!((remaining.speed_incremental() - 30.0).abs() < 0.1);

        remaining.calc_incremental_speed(-1.0, true);
        assert_eq!(remaining.speed_incremental(), 0.0);

        let mut undefined = DistanceStat::default();
        undefined.calc_incremental_speed(5.0, true);
        assert_eq!(undefined.speed_incremental(), 0.0);
    }

    #[test]
    fn test_vario_follows_arrival_height() {
        let mut element = ElementStat::default();
        for i in 0..1_200 {
            element.solution_remaining.altitude_difference = 100.0 + 2.0 * i as f64;
            element.calc_rates(1.0);
        }
        assert!((element.vario - 2.0).abs() < 0.01);

        element.reset_rates();
        assert_eq!(element.vario, 0.0);
    }
}
