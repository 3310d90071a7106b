use super::OrderedTask;
use crate::events::TaskEvent;
use crate::models::AircraftState;
use crate::projection::FlatBoundingBox;
use crate::task_point::TaskPointKind;

/// Height below the start altitude an FAI finish may be, in meters.
const FAI_FINISH_HEIGHT_LOSS: f64 = 1_000.0;

struct Window {
    now: FlatBoundingBox,
    last: FlatBoundingBox,
}

/// Crossings of one point during the current tick.
#[derive(Debug, Clone, Copy, Default)]
struct Crossing {
    entered: bool,
    exited: bool,
    sampled: bool,
}

impl OrderedTask {
    /// Detect zone crossings around the active point, apply the advance
    /// policy and raise events. Returns whether a full statistics update
    /// is needed.
    pub fn check_transitions(&mut self, now: &AircraftState, last: &AircraftState) -> bool {
        self.scan_active();
        if self.points.is_empty() || !now.flying {
            return false;
        }

        let window = Window {
            now: FlatBoundingBox::around(self.projection.project(&now.location), 1),
            last: FlatBoundingBox::around(self.projection.project(&last.location), 1),
        };
        let mut last_started = self.task_started(false);
        let last_finished = self.task_finished();
        let mut full_update = false;

        let n = self.points.len();
        let first = self.active.saturating_sub(1);
        let active = self.active.min(n - 1);
        for i in first..=active {
            let optional = if i == 0 {
                self.check_transition_optional_starts(now, last, &window)
            } else {
                Crossing::default()
            };
            let mut crossing = self.check_transition_point(i, now, last, &window, &mut last_started);
            crossing.entered |= optional.entered;
            crossing.exited |= optional.exited;
            full_update |= crossing.sampled || optional.sampled;

            if i != self.active {
                continue;
            }
            let point = &self.points[i];
            if self
                .advance
                .ready_to_advance(point, now, crossing.entered, crossing.exited)
            {
                self.advance.set_armed(false);
                if i + 1 < n {
                    self.active = i + 1;
                    self.scan_active();
                    self.events.push(TaskEvent::ActiveAdvanced(self.active));
                    tracing::info!("Task '{}': advanced to point {}", self.name, self.active);
                    full_update = true;
                }
            } else if self.advance.request_armed() && !self.arm_requested {
                self.events.push(TaskEvent::RequestArm(i));
                tracing::info!("Task '{}': point {} waits to be armed", self.name, i);
            }
            self.arm_requested = self.advance.request_armed();
        }

        self.stats.task_started = self.task_started(false);
        self.stats.task_finished = self.task_finished();

        if self.stats.task_started && !last_started {
            let start_altitude = self.start_state().altitude;
            if let Some(finish) = self.points.last_mut().filter(|p| p.kind() == TaskPointKind::Finish) {
                finish.set_fai_finish_height(start_altitude - FAI_FINISH_HEIGHT_LOSS);
            }
            self.events.push(TaskEvent::TaskStart);
            tracing::info!(
                "Task '{}' started at {:.0}s, {:.0}m",
                self.name,
                self.start_state().time,
                start_altitude
            );
            full_update = true;
        }
        if self.stats.task_finished && !last_finished {
            self.events.push(TaskEvent::TaskFinish);
            tracing::info!("Task '{}' finished at {:.0}s", self.name, self.finish_state().time);
            full_update = true;
        }
        full_update
    }

    fn check_transition_point(
        &mut self,
        index: usize,
        now: &AircraftState,
        last: &AircraftState,
        window: &Window,
        last_started: &mut bool,
    ) -> Crossing {
        let behaviour = &self.ordered_behaviour;
        let point = &mut self.points[index];
        let nearby = point.bounding_box_overlaps(&window.now) || point.bounding_box_overlaps(&window.last);
        let mut crossing = Crossing::default();

        if nearby && point.transition_enter(now, last, behaviour) {
            crossing.entered = true;
            tracing::debug!("Task '{}': entered point {} ({})", self.name, index, point.name());
            self.events.push(TaskEvent::EnterTransition(index));
        }
        if nearby && point.transition_exit(now, last, behaviour) {
            crossing.exited = true;
            tracing::debug!("Task '{}': exited point {} ({})", self.name, index, point.name());
            self.events.push(TaskEvent::ExitTransition(index));
            if index == 0 && *last_started {
                *last_started = false;
                self.events.push(TaskEvent::Restart);
                tracing::info!("Task '{}' restarted", self.name);
            }
        }

        crossing.sampled = if nearby {
            point.update_sample_near(now, &self.projection)
        } else {
            point.update_sample_far(now, &self.projection)
        };
        if index == 0 {
            self.update_start_transition(now);
        }
        crossing
    }

    /// Keep the start state consistent with where the aircraft is.
    fn update_start_transition(&mut self, now: &AircraftState) {
        let active = self.active;
        let start = &mut self.points[0];
        if active == 0 {
            let just_entered = start.entered_state() == Some(now);
            if start.has_exited() && just_entered && start.is_in_sector(now) {
                start.reset_exit(now);
                tracing::debug!("Task '{}': start re-entered before advancing", self.name);
            }
        } else if !start.has_exited() && !start.is_in_sector(now) {
            start.reset();
            tracing::debug!("Task '{}': start left without a valid exit", self.name);
        }
    }

    /// Track crossings of the optional starts; the last one crossed
    /// becomes the task start. Returns the crossing of the selected start.
    fn check_transition_optional_starts(
        &mut self,
        now: &AircraftState,
        last: &AircraftState,
        window: &Window,
    ) -> Crossing {
        let behaviour = &self.ordered_behaviour;
        let projection = &self.projection;
        let mut selected = None;
        let mut crossing = Crossing::default();
        for (j, point) in self.optional_starts.iter_mut().enumerate() {
            let nearby = point.bounding_box_overlaps(&window.now) || point.bounding_box_overlaps(&window.last);
            if !nearby {
                continue;
            }
            let entered = point.transition_enter(now, last, behaviour);
            let exited = point.transition_exit(now, last, behaviour);
            if entered || exited {
                selected = Some((j, entered, exited));
            }
            crossing.sampled |= point.update_sample_near(now, projection);
        }
        if let Some((j, entered, exited)) = selected {
            if self.select_optional_start(j).is_ok() {
                tracing::info!("Task '{}': optional start {} selected", self.name, self.points[0].name());
                crossing.entered = entered;
                crossing.exited = exited;
                crossing.sampled = true;
            }
        }
        crossing
    }

    /// Record `state` in every point from the active one on. Returns whether
    /// a full update is needed.
    pub fn update_sample(&mut self, state: &AircraftState) -> bool {
        let mut changed = false;
        let active = self.active;
        for point in self.points.iter_mut().skip(active) {
            changed |= point.update_sample_near(state, &self.projection);
        }
        changed || self.force_full_update
    }
}
