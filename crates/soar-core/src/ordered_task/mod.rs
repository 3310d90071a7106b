//! The ordered task: a start, intermediate points and a finish, flown in order.
//!
//! The task owns its points in an index-addressed vector together with the
//! optional start alternatives, the active index and everything derived from
//! them. Updates are driven by [`OrderedTask::update`] once per aircraft fix.

mod edit;
mod scan;
mod solutions;
mod transitions;

pub use solutions::PlannedGlide;

use crate::advance::TaskAdvance;
use crate::dijkstra::SearchScratch;
use crate::events::TaskEvent;
use crate::factory::{TaskFactory, TaskFactoryKind};
use crate::geo::{GeoBounds, GeoPoint};
use crate::models::AircraftState;
use crate::projection::TaskProjection;
use crate::rules::{OrderedTaskBehaviour, TaskBehaviour};
use crate::stats::{TaskStats, TaskSummary, TaskSummaryPoint};
use crate::task_point::{ActiveState, OrderedTaskPoint, TaskPointKind};
use crate::visitor::TaskPointVisitor;

#[derive(Debug, Clone)]
pub struct OrderedTask {
    name: String,
    points: Vec<OrderedTaskPoint>,
    optional_starts: Vec<OrderedTaskPoint>,
    active: usize,
    factory: TaskFactory,
    behaviour: TaskBehaviour,
    ordered_behaviour: OrderedTaskBehaviour,
    advance: TaskAdvance,
    projection: TaskProjection,
    stats: TaskStats,
    scratch: SearchScratch,
    events: Vec<TaskEvent>,
    /// Arm request seen on the previous tick
    arm_requested: bool,
    force_full_update: bool,
}

impl OrderedTask {
    /// Empty racing task.
    pub fn new(behaviour: TaskBehaviour) -> Self {
        Self::with_factory(TaskFactoryKind::Racing, behaviour)
    }

    pub fn with_factory(kind: TaskFactoryKind, behaviour: TaskBehaviour) -> Self {
        let factory = TaskFactory::new(kind);
        let mut ordered_behaviour = behaviour.ordered_defaults.clone();
        factory.update_ordered_task_behaviour(&mut ordered_behaviour);
        let mut advance = TaskAdvance::new(behaviour.advance_mode);
        advance.set_start_requires_arm(ordered_behaviour.start_requires_arm);
        Self {
            name: String::new(),
            points: Vec::new(),
            optional_starts: Vec::new(),
            active: 0,
            factory,
            behaviour,
            ordered_behaviour,
            advance,
            projection: TaskProjection::default(),
            stats: TaskStats::default(),
            scratch: SearchScratch::default(),
            events: Vec::new(),
            arm_requested: false,
            force_full_update: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[OrderedTaskPoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&OrderedTaskPoint> {
        self.points.get(index)
    }

    pub fn optional_starts(&self) -> &[OrderedTaskPoint] {
        &self.optional_starts
    }

    pub fn optional_start(&self, index: usize) -> Option<&OrderedTaskPoint> {
        self.optional_starts.get(index)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_point(&self) -> Option<&OrderedTaskPoint> {
        self.points.get(self.active)
    }

    pub fn factory(&self) -> &TaskFactory {
        &self.factory
    }

    pub fn factory_kind(&self) -> TaskFactoryKind {
        self.factory.kind()
    }

    pub fn behaviour(&self) -> &TaskBehaviour {
        &self.behaviour
    }

    pub fn ordered_behaviour(&self) -> &OrderedTaskBehaviour {
        &self.ordered_behaviour
    }

    pub fn advance(&self) -> &TaskAdvance {
        &self.advance
    }

    pub fn advance_mut(&mut self) -> &mut TaskAdvance {
        &mut self.advance
    }

    pub fn stats(&self) -> &TaskStats {
        &self.stats
    }

    pub fn projection(&self) -> &TaskProjection {
        &self.projection
    }

    /// Events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<TaskEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_start(&self) -> bool {
        self.points.first().is_some_and(|p| p.kind() == TaskPointKind::Start)
    }

    pub fn has_finish(&self) -> bool {
        self.points.last().is_some_and(|p| p.kind() == TaskPointKind::Finish)
    }

    /// Has the start been crossed? A soft check also accepts a task that
    /// was advanced past the start manually.
    pub fn task_started(&self, soft: bool) -> bool {
        match self.points.first() {
            Some(start) if start.has_exited() => true,
            Some(_) => soft && self.active > 0,
            None => false,
        }
    }

    pub fn task_finished(&self) -> bool {
        self.points
            .last()
            .map(|p| p.kind() == TaskPointKind::Finish && p.has_entered())
            .unwrap_or(false)
    }

    /// Scored start state; default when not started.
    pub fn start_state(&self) -> AircraftState {
        self.points
            .first()
            .and_then(|p| p.scored_state().copied())
            .unwrap_or_default()
    }

    pub fn finish_state(&self) -> AircraftState {
        self.points
            .last()
            .filter(|p| p.kind() == TaskPointKind::Finish)
            .and_then(|p| p.scored_state().copied())
            .unwrap_or_default()
    }

    /// Lowest valid finish altitude, zero without a finish.
    pub fn finish_height(&self) -> f64 {
        self.points
            .last()
            .filter(|p| p.kind() == TaskPointKind::Finish)
            .map(|p| self.ordered_behaviour.finish_height(p.elevation(), p.fai_finish_height()))
            .unwrap_or(0.0)
    }

    pub fn has_targets(&self) -> bool {
        self.points.iter().any(|p| p.kind() == TaskPointKind::Aat)
    }

    pub fn has_optional_starts(&self) -> bool {
        !self.optional_starts.is_empty()
    }

    pub fn is_scored(&self) -> bool {
        self.ordered_behaviour.task_scored
    }

    /// Whether the task passes validation, warnings aside.
    pub fn check_task(&self) -> bool {
        self.factory
            .validate(&self.points, &self.ordered_behaviour)
            .iter()
            .all(|e| e.is_warning())
    }

    pub fn validate(&self) -> Vec<crate::error::TaskValidationError> {
        self.factory.validate(&self.points, &self.ordered_behaviour)
    }

    pub fn task_center(&self, fallback: GeoPoint) -> GeoPoint {
        if self.points.is_empty() {
            fallback
        } else {
            self.projection.center()
        }
    }

    /// Approximate radius in meters of the area the task covers.
    pub fn task_radius(&self) -> f64 {
        if self.points.is_empty() {
            0.0
        } else {
            self.projection.approx_radius()
        }
    }

    /// Geographic bounds of every zone, optional starts included.
    pub fn bounding_box(&self) -> Option<GeoBounds> {
        let mut bounds: Option<GeoBounds> = None;
        for point in self.points.iter().chain(&self.optional_starts) {
            for location in point.observation_zone().boundary() {
                match bounds.as_mut() {
                    Some(b) => b.extend(location),
                    None => bounds = Some(GeoBounds::from_point(location)),
                }
            }
        }
        bounds
    }

    pub fn point_bounds(&self, index: usize) -> Option<GeoBounds> {
        let point = self.points.get(index)?;
        let mut boundary = point.observation_zone().boundary().into_iter();
        let mut bounds = GeoBounds::from_point(boundary.next()?);
        boundary.for_each(|location| bounds.extend(location));
        Some(bounds)
    }

    /// Progress per point for compact display.
    pub fn summary(&self) -> TaskSummary {
        let planned = self.stats.total.planned.distance();
        let fraction = |d: f64| if planned > 0.0 { d / planned } else { 0.0 };
        let mut remaining = planned;
        let mut points = Vec::with_capacity(self.points.len());
        for (i, point) in self.points.iter().enumerate() {
            remaining -= point.vector_planned().distance;
            points.push(TaskSummaryPoint {
                kind: point.kind(),
                achieved: i < self.active || (i == self.active && self.task_finished()),
                d_remaining: fraction(remaining.max(0.0)),
            });
        }
        TaskSummary {
            points,
            active: self.active,
            p_remaining: fraction(self.stats.total.remaining.distance()),
        }
    }

    pub fn accept_task_point_visitor<V: TaskPointVisitor + ?Sized>(&self, visitor: &mut V, reverse: bool) {
        if reverse {
            self.points.iter().rev().for_each(|p| visitor.visit(p));
        } else {
            self.points.iter().for_each(|p| visitor.visit(p));
        }
    }

    pub fn accept_start_point_visitor<V: TaskPointVisitor + ?Sized>(&self, visitor: &mut V) {
        if let Some(start) = self.points.first() {
            visitor.visit(start);
        }
        self.optional_starts.iter().for_each(|p| visitor.visit(p));
    }

    /// Copy of the configuration with fresh flight state, using `behaviour`.
    pub fn clone_with_behaviour(&self, behaviour: &TaskBehaviour) -> OrderedTask {
        let mut task = OrderedTask::with_factory(self.factory.kind(), behaviour.clone());
        task.name = self.name.clone();
        task.ordered_behaviour = self.ordered_behaviour.clone();
        task.advance.set_start_requires_arm(task.ordered_behaviour.start_requires_arm);
        task.points = self.points.iter().map(OrderedTaskPoint::clone_fresh).collect();
        task.optional_starts = self
            .optional_starts
            .iter()
            .map(OrderedTaskPoint::clone_fresh)
            .collect();
        task.active = self.active.min(task.points.len().saturating_sub(1));
        task.update_geometry();
        task
    }

    /// Make this task match `other`, keeping flight state of unchanged
    /// points. Returns whether anything changed.
    pub fn commit(&mut self, other: &OrderedTask) -> bool {
        let mut modified = false;

        if self.name != other.name {
            self.name = other.name.clone();
            modified = true;
        }
        if self.factory.kind() != other.factory.kind() {
            self.factory = other.factory;
            modified = true;
        }
        if self.ordered_behaviour != other.ordered_behaviour {
            self.ordered_behaviour = other.ordered_behaviour.clone();
            self.advance.set_start_requires_arm(self.ordered_behaviour.start_requires_arm);
            modified = true;
        }

        modified |= commit_points(&mut self.points, &other.points);
        modified |= commit_points(&mut self.optional_starts, &other.optional_starts);

        if modified {
            self.update_geometry();
        }
        let active = other.active.min(self.points.len().saturating_sub(1));
        if active != self.active {
            self.set_active_task_point(active);
            modified = true;
        }
        if modified {
            tracing::debug!("Committed task '{}' ({} points)", self.name, self.points.len());
        }
        modified
    }

    /// Refresh every point's position relative to the active index.
    pub(crate) fn scan_active(&mut self) {
        let active = self.active;
        for (i, point) in self.points.iter_mut().enumerate() {
            point.set_active_state(match i.cmp(&active) {
                std::cmp::Ordering::Less => ActiveState::BeforeActive,
                std::cmp::Ordering::Equal => ActiveState::CurrentActive,
                std::cmp::Ordering::Greater => ActiveState::AfterActive,
            });
        }
        for point in self.optional_starts.iter_mut() {
            point.set_active_state(if active == 0 {
                ActiveState::CurrentActive
            } else {
                ActiveState::BeforeActive
            });
        }
    }
}

fn commit_points(target: &mut Vec<OrderedTaskPoint>, source: &[OrderedTaskPoint]) -> bool {
    let mut modified = false;
    if target.len() > source.len() {
        target.truncate(source.len());
        modified = true;
    }
    for (i, point) in source.iter().enumerate() {
        match target.get_mut(i) {
            Some(existing) if existing.equals(point) => {
                if let Some(target) = point.target() {
                    if existing.target() != Some(target) {
                        existing.set_target(target.location, true);
                        existing.lock_target(target.locked);
                        modified = true;
                    }
                }
            }
            Some(existing) => {
                *existing = point.clone_fresh();
                modified = true;
            }
            None => {
                target.push(point.clone_fresh());
                modified = true;
            }
        }
    }
    modified
}
