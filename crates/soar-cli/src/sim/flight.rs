//! Flying a path through a shared task.

use crate::sim::paths::FlightPath;
use rand::Rng;
use soar_core::{GeoPoint, GlidePolar, OrderedTask, SharedTask, TaskEvent, TaskPointKind};

/// How the synthetic pilot flies the task.
#[derive(Debug, Clone)]
pub struct FlightPlan {
    /// Distance before the start the track begins, meters
    pub lead_in_m: f64,
    /// Distance flown on past the finish, meters
    pub overshoot_m: f64,
    pub altitude_m: f64,
    pub speed_mps: f64,
    /// Zero keeps the altitude constant
    pub glide_ratio: f64,
    /// Fraction of each zone radius the turn may be moved off its target
    pub jitter: f64,
    /// Arm the advance as soon as the task asks for it
    pub auto_arm: bool,
    /// Follow the best MacCready value the task computes
    pub auto_mc: bool,
}

impl Default for FlightPlan {
    fn default() -> Self {
        Self {
            lead_in_m: 3_000.0,
            overshoot_m: 1_000.0,
            altitude_m: 1_500.0,
            speed_mps: 30.0,
            glide_ratio: 0.0,
            jitter: 0.0,
            auto_arm: true,
            auto_mc: false,
        }
    }
}

/// Turn locations of a straight-line flight through `task`: in from behind
/// the start, through each target and on past the finish.
pub fn plan_turns<R: Rng + ?Sized>(task: &OrderedTask, plan: &FlightPlan, rng: &mut R) -> Vec<GeoPoint> {
    let points = task.points();
    let (Some(start), Some(finish)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let mut turns = Vec::with_capacity(points.len() + 2);

    let first_leg_end = points.get(1).map(|p| p.location_remaining()).unwrap_or(finish.location());
    let away = first_leg_end.bearing(&start.location());
    turns.push(start.location().offset(away, plan.lead_in_m));
    turns.push(start.location());

    for point in &points[1..points.len() - 1] {
        let turn = if plan.jitter > 0.0 {
            point.observation_zone().random_point_in_sector(rng, plan.jitter)
        } else {
            point.location_remaining()
        };
        turns.push(turn);
    }

    if points.len() > 1 {
        let previous = turns[turns.len() - 1];
        turns.push(finish.location());
        if finish.kind() == TaskPointKind::Finish {
            turns.push(finish.location().offset(previous.bearing(&finish.location()), plan.overshoot_m));
        }
    }
    turns
}

#[derive(Debug, Clone, Default)]
pub struct FlightLog {
    /// Events with the fix time they were raised at
    pub events: Vec<(f64, TaskEvent)>,
    pub fixes: usize,
}

impl FlightLog {
    pub fn count(&self, event: TaskEvent) -> usize {
        self.events.iter().filter(|(_, e)| *e == event).count()
    }
}

/// Fly `path` through `task` with a fix every `step` seconds, stopping at
/// the finish. Times are seconds of day from `time_offset`.
pub fn fly<P: FlightPath + ?Sized>(
    task: &SharedTask,
    path: &P,
    polar: &mut GlidePolar,
    plan: &FlightPlan,
    time_offset: f64,
    step: f64,
) -> FlightLog {
    let mut log = FlightLog::default();
    let step = step.max(0.1);
    let duration = path.duration();
    let mut last = path.state_at(0.0, time_offset);
    let mut t = 0.0;

    while t <= duration + step {
        let now = path.state_at(t, time_offset);
        let (_, events) = task.update(&now, &last, polar);
        log.fixes += 1;

        let mut finished = false;
        for event in events {
            tracing::debug!("{:.0}s: {:?}", now.time, event);
            match event {
                TaskEvent::RequestArm(_) if plan.auto_arm => {
                    task.with_task_mut(|task| task.advance_mut().set_armed(true));
                }
                TaskEvent::TaskFinish => finished = true,
                _ => {}
            }
            log.events.push((now.time, event));
        }

        if plan.auto_mc {
            if let Some(mc) = task.stats().mc_best {
                polar.set_mc(mc);
            }
        }
        if finished {
            break;
        }
        last = now;
        t += step;
    }
    log
}
