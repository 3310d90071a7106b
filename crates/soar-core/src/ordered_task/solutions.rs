use super::OrderedTask;
use crate::glide::{GlideLeg, GlidePolar, GlideResult, TaskMacCready};
use crate::models::AircraftState;
use crate::solvers::{self, TargetPoint};
use crate::task_point::TaskPointKind;

/// Planned solution of the whole task and of the active leg, with the
/// distances reachable in the remaining time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlannedGlide {
    pub total: GlideResult,
    pub leg: GlideResult,
    pub total_effective_distance: f64,
    pub leg_effective_distance: f64,
}

impl OrderedTask {
    /// Lowest acceptable arrival altitude at point `index`.
    fn arrival_floor(&self, index: usize) -> f64 {
        let point = &self.points[index];
        let floor = point.elevation() + self.behaviour.safety_height_arrival;
        if point.kind() == TaskPointKind::Finish {
            floor.max(
                self.ordered_behaviour
                    .finish_height(point.elevation(), point.fai_finish_height()),
            )
        } else {
            floor
        }
    }

    fn remaining_legs(&self, state: &AircraftState) -> Vec<GlideLeg> {
        if self.points.is_empty() || self.task_finished() {
            return Vec::new();
        }
        let mut from = state.location;
        (self.active..self.points.len())
            .map(|i| {
                let destination = self.points[i].location_remaining();
                let leg = GlideLeg {
                    origin: from,
                    destination,
                    min_arrival_altitude: self.arrival_floor(i),
                };
                from = destination;
                leg
            })
            .collect()
    }

    /// Legs flown so far with the altitude at the start. Achieved points
    /// use the altitude they were reached at as arrival floor.
    fn travelled_legs(&self, state: &AircraftState) -> Option<(Vec<GlideLeg>, f64)> {
        let start = self.points.first()?;
        let start_altitude = start.scored_state()?.altitude;
        let finished = self.task_finished();
        let achieved = if finished { self.points.len() } else { self.active };

        let mut legs = Vec::with_capacity(achieved);
        let mut from = start.location_travelled();
        for point in self.points.iter().take(achieved).skip(1) {
            let destination = point.location_travelled();
            legs.push(GlideLeg {
                origin: from,
                destination,
                min_arrival_altitude: point
                    .scored_state()
                    .map(|s| s.altitude)
                    .unwrap_or(state.altitude),
            });
            from = destination;
        }
        if !finished {
            legs.push(GlideLeg {
                origin: from,
                destination: state.location,
                min_arrival_altitude: state.altitude,
            });
        }
        Some((legs, start_altitude))
    }

    fn planned_legs(&self) -> Vec<GlideLeg> {
        let active = self.active;
        let location = |i: usize| {
            let point = &self.points[i];
            if i < active {
                point.location_travelled()
            } else {
                point.location_remaining()
            }
        };
        (1..self.points.len())
            .map(|i| GlideLeg {
                origin: location(i - 1),
                destination: location(i),
                min_arrival_altitude: self.arrival_floor(i),
            })
            .collect()
    }

    /// Remaining task and first remaining leg from `state`.
    pub fn glide_solution_remaining(&self, state: &AircraftState, polar: &GlidePolar) -> (GlideResult, GlideResult) {
        let legs = self.remaining_legs(state);
        let solution = TaskMacCready::new(&legs, polar).solve(state.altitude, state.wind);
        (solution.total, solution.first_leg())
    }

    /// What the flown part would have taken at the current settings.
    pub fn glide_solution_travelled(&self, state: &AircraftState, polar: &GlidePolar) -> (GlideResult, GlideResult) {
        let Some((legs, start_altitude)) = self.travelled_legs(state) else {
            return (GlideResult::default(), GlideResult::default());
        };
        let solution = TaskMacCready::new(&legs, polar).solve(start_altitude, state.wind);
        let leg = solution.legs.last().copied().unwrap_or_default();
        (solution.total, leg)
    }

    /// Whole task from the start, with the distance flyable in the time the
    /// remaining solution needs.
    pub fn glide_solution_planned(
        &self,
        state: &AircraftState,
        polar: &GlidePolar,
        remaining: &GlideResult,
        remaining_leg: &GlideResult,
    ) -> PlannedGlide {
        let legs = self.planned_legs();
        let start_altitude = self
            .points
            .first()
            .and_then(|p| p.scored_state())
            .map(|s| s.altitude)
            .unwrap_or(state.altitude);
        let solution = TaskMacCready::new(&legs, polar).solve(start_altitude, state.wind);
        let leg_index = self.active.checked_sub(1);
        PlannedGlide {
            total: solution.total,
            leg: leg_index
                .and_then(|i| solution.legs.get(i).copied())
                .unwrap_or_default(),
            total_effective_distance: solution.effective_distance(remaining.time_elapsed),
            leg_effective_distance: leg_index
                .map(|i| solution.effective_leg_distance(i, remaining_leg.time_elapsed))
                .unwrap_or(0.0),
        }
    }

    pub fn calc_best_mc(&self, state: &AircraftState, polar: &GlidePolar) -> Option<f64> {
        solvers::best_mc(&self.remaining_legs(state), state, polar)
    }

    pub fn calc_required_glide(&self, state: &AircraftState, polar: &GlidePolar) -> f64 {
        solvers::required_glide(&self.remaining_legs(state), state, polar)
    }

    /// Whether boundary-derived statistics are meaningful: not while still
    /// inside the zone that was just achieved.
    pub fn allow_incremental_boundary_stats(&self, state: &AircraftState) -> bool {
        if self.active == 0 || self.active >= self.points.len() {
            return false;
        }
        let active = &self.points[self.active];
        let in_sector = active.is_in_sector(state) || self.points[self.active - 1].is_in_sector(state);
        active.is_boundary_scored() || !in_sector
    }

    fn elapsed_since_start(&self, state: &AircraftState) -> f64 {
        self.scan_total_start_time()
            .map(|t| (state.time - t).max(0.0))
            .unwrap_or(0.0)
    }

    pub fn calc_cruise_efficiency(&self, state: &AircraftState, polar: &GlidePolar) -> f64 {
        if !self.allow_incremental_boundary_stats(state) {
            return 1.0;
        }
        match self.travelled_legs(state) {
            Some((legs, start_altitude)) => solvers::cruise_efficiency(
                &legs,
                start_altitude,
                state,
                polar,
                self.elapsed_since_start(state),
            ),
            None => 1.0,
        }
    }

    pub fn calc_effective_mc(&self, state: &AircraftState, polar: &GlidePolar) -> f64 {
        if !self.allow_incremental_boundary_stats(state) {
            return polar.mc();
        }
        match self.travelled_legs(state) {
            Some((legs, start_altitude)) => solvers::effective_mc(
                &legs,
                start_altitude,
                state,
                polar,
                self.elapsed_since_start(state),
            ),
            None => polar.mc(),
        }
    }

    fn target_points(&self) -> Vec<TargetPoint> {
        (self.active..self.points.len())
            .map(|i| {
                let point = &self.points[i];
                let movable = point.kind() == TaskPointKind::Aat && !point.target_locked();
                TargetPoint {
                    location: point.location_remaining(),
                    range: movable.then(|| (point.location(), point.location_max())),
                    min_arrival_altitude: self.arrival_floor(i),
                }
            })
            .collect()
    }

    /// Target range that makes the task last `t_target` seconds from the
    /// start. Zero when there is nothing to move.
    pub fn calc_min_target(&self, state: &AircraftState, polar: &GlidePolar, t_target: f64) -> f64 {
        if !self.has_targets() || self.stats.distance_max <= self.stats.distance_min {
            return 0.0;
        }
        let time_remaining = (t_target - self.elapsed_since_start(state)).max(0.0);
        solvers::min_target(&self.target_points(), state, polar, time_remaining)
    }

    /// Height above the finish floor per meter of remaining distance.
    pub fn calc_gradient(&self, state: &AircraftState) -> f64 {
        let distance = self.scan_distance_remaining(&state.location);
        if distance <= 0.0 || self.points.is_empty() {
            return 0.0;
        }
        let floor = self.arrival_floor(self.points.len() - 1);
        (state.altitude - floor) / distance
    }

    /// Place area targets: along their range to meet the minimum time, then
    /// the active one along its isoline. Returns whether a target moved.
    pub fn update_idle(&mut self, state: &AircraftState, polar: &GlidePolar) -> bool {
        if !self.has_targets() {
            return false;
        }
        let mut changed = false;

        if self.behaviour.optimise_targets_range && self.ordered_behaviour.aat_min_time > 0.0 {
            let t_target = self.ordered_behaviour.aat_min_time + self.behaviour.optimise_targets_margin;
            let range = self.calc_min_target(state, polar, t_target);
            let active = self.active;
            for point in self.points.iter_mut().skip(active) {
                if point.kind() == TaskPointKind::Aat && !point.target_locked() {
                    changed |= point.set_target_range(range);
                }
            }
        }

        if self.behaviour.optimise_targets_bearing {
            changed |= self.optimise_active_target(state, polar);
        }
        if changed {
            tracing::debug!("Task '{}': targets moved", self.name);
            self.force_full_update = true;
        }
        changed
    }

    fn optimise_active_target(&mut self, state: &AircraftState, polar: &GlidePolar) -> bool {
        let active = self.active;
        if active == 0 || active + 1 >= self.points.len() {
            return false;
        }
        let point = &self.points[active];
        if point.kind() != TaskPointKind::Aat || point.target_locked() {
            return false;
        }
        let previous = self.points[active - 1].location_travelled();
        let best = solvers::opt_target(previous, point.observation_zone(), &self.target_points(), state, polar);
        match best {
            Some(location) => self.points[active].set_target(location, false),
            None => false,
        }
    }

    /// Process one aircraft fix: transitions, samples, distances and glide
    /// statistics. Returns whether a full update was performed.
    pub fn update(&mut self, now: &AircraftState, last: &AircraftState, polar: &GlidePolar) -> bool {
        if self.points.is_empty() {
            self.stats.reset();
            return false;
        }
        let mut full_update = self.check_transitions(now, last);
        full_update |= self.update_sample(now);
        full_update |= std::mem::take(&mut self.force_full_update);

        let (dmin, dmax) = self.scan_distance_min_max(&now.location, full_update);
        self.stats.distance_min = dmin;
        self.stats.distance_max = dmax;
        self.update_leg_vectors(&now.location);
        self.update_stats(now, polar);
        full_update
    }

    fn update_stats(&mut self, state: &AircraftState, polar: &GlidePolar) {
        let location = state.location;
        let remaining = self.scan_distance_remaining(&location);
        let travelled = self.scan_distance_travelled(&location);
        let planned = self.scan_distance_planned();
        self.stats.distance_nominal = self.scan_distance_nominal();
        self.stats.distance_scored = self.scan_distance_scored(&location);
        self.stats.task_started = self.task_started(false);
        self.stats.task_finished = self.task_finished();

        let (solution_remaining, leg_remaining) = self.glide_solution_remaining(state, polar);
        let (solution_mc0, leg_mc0) = self.glide_solution_remaining(state, &polar.with_mc(0.0));
        let (solution_travelled, leg_travelled) = self.glide_solution_travelled(state, polar);
        let planned_glide = self.glide_solution_planned(state, polar, &solution_remaining, &leg_remaining);
        let total_start = self.scan_total_start_time();
        let leg_start = self.scan_leg_start_time();
        let active_vectors = self.points.get(self.active).map(|p| {
            (p.vector_remaining().distance, p.vector_travelled().distance, p.vector_planned().distance)
        });
        let dt = self.stats.advance_time(state.time);
        if self.stats.leg_index != self.active {
            self.stats.leg_index = self.active;
            self.stats.current_leg.reset_rates();
        }

        let total = &mut self.stats.total;
        total.time_started = total_start;
        total.remaining.set_distance(remaining);
        total.travelled.set_distance(travelled);
        total.planned.set_distance(planned);
        total.remaining_effective.set_distance(planned_glide.total_effective_distance);
        total.solution_remaining = solution_remaining;
        total.solution_mc0 = solution_mc0;
        total.solution_travelled = solution_travelled;
        total.solution_planned = planned_glide.total;
        total.calc_speeds(state.time);
        total.calc_rates(dt);

        let leg = &mut self.stats.current_leg;
        leg.time_started = leg_start;
        if let Some((remaining, travelled, planned)) = active_vectors {
            leg.remaining.set_distance(remaining);
            leg.travelled.set_distance(travelled);
            leg.planned.set_distance(planned);
        }
        leg.remaining_effective.set_distance(planned_glide.leg_effective_distance);
        leg.solution_remaining = leg_remaining;
        leg.solution_mc0 = leg_mc0;
        leg.solution_travelled = leg_travelled;
        leg.solution_planned = planned_glide.leg;
        leg.calc_speeds(state.time);
        leg.calc_rates(dt);

        self.stats.mc_best = self.calc_best_mc(state, polar);
        if self.behaviour.calc_cruise_efficiency {
            self.stats.cruise_efficiency = self.calc_cruise_efficiency(state, polar);
        }
        self.stats.effective_mc = if self.behaviour.calc_effective_mc {
            self.calc_effective_mc(state, polar)
        } else {
            polar.mc()
        };
        if self.behaviour.calc_glide_required {
            self.stats.glide_required = self.calc_required_glide(state, polar);
        }
        self.stats.gradient = self.calc_gradient(state);
        self.stats.task_valid = self.check_task();
    }
}
