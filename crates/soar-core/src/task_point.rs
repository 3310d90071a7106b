//! Ordered task points and their transition/sampling state.
//!
//! Points live in an index-addressed sequence owned by the task. Links to the
//! neighbouring points are plain indices produced by [`relink`].

use crate::geo::{GeoPoint, GeoVector};
use crate::models::{AircraftState, Waypoint};
use crate::oz::ObservationZone;
use crate::projection::{FlatBoundingBox, TaskProjection};
use crate::rules::OrderedTaskBehaviour;
use crate::search_point::{SearchPoint, SearchPointVector};
use serde::{Deserialize, Serialize};

/// Role of a point within the ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPointKind {
    /// Start: certified by leaving the zone
    Start,
    /// Assigned speed turnpoint
    Ast,
    /// Assigned area with an adjustable target
    Aat,
    /// Finish: certified by entering the zone
    Finish,
}

impl TaskPointKind {
    pub fn is_intermediate(self) -> bool {
        matches!(self, TaskPointKind::Ast | TaskPointKind::Aat)
    }

    pub fn predecessor_allowed(self) -> bool {
        self != TaskPointKind::Start
    }

    pub fn successor_allowed(self) -> bool {
        self != TaskPointKind::Finish
    }

    /// Area points score the best sampled location rather than the reference.
    pub fn is_boundary_scored(self) -> bool {
        self == TaskPointKind::Aat
    }
}

/// Position of a point relative to the active index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveState {
    #[default]
    NotActive,
    BeforeActive,
    CurrentActive,
    AfterActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Neighbours {
    pub previous: Option<usize>,
    pub next: Option<usize>,
}

/// Neighbour indices of `position` in a sequence of `len` points.
pub fn relink(len: usize, position: usize) -> Neighbours {
    if position >= len {
        return Neighbours::default();
    }
    Neighbours {
        previous: position.checked_sub(1),
        next: (position + 1 < len).then_some(position + 1),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AatTarget {
    pub location: GeoPoint,
    pub locked: bool,
}

#[derive(Debug, Clone)]
pub struct OrderedTaskPoint {
    kind: TaskPointKind,
    waypoint: Waypoint,
    oz: ObservationZone,
    neighbours: Neighbours,
    active_state: ActiveState,
    boundary_points: SearchPointVector,
    reference_points: SearchPointVector,
    sampled_points: SearchPointVector,
    search_min: SearchPoint,
    search_max: SearchPoint,
    state_entered: Option<AircraftState>,
    state_exited: Option<AircraftState>,
    bounding_box: FlatBoundingBox,
    vector_planned: GeoVector,
    vector_travelled: GeoVector,
    vector_remaining: GeoVector,
    target: Option<AatTarget>,
    fai_finish_height: f64,
}

impl OrderedTaskPoint {
    /// Create a point; the zone is re-anchored on the waypoint location.
    pub fn new(kind: TaskPointKind, waypoint: Waypoint, oz: ObservationZone) -> Self {
        let location = waypoint.location;
        let projection = TaskProjection::new(location);
        let reference = SearchPoint::new(location, &projection);
        let mut point = Self {
            kind,
            oz: oz.with_reference(location),
            waypoint,
            neighbours: Neighbours::default(),
            active_state: ActiveState::NotActive,
            boundary_points: SearchPointVector::new(),
            reference_points: SearchPointVector::new(),
            sampled_points: SearchPointVector::new(),
            search_min: reference,
            search_max: reference,
            state_entered: None,
            state_exited: None,
            bounding_box: FlatBoundingBox::default(),
            vector_planned: GeoVector::zero(),
            vector_travelled: GeoVector::zero(),
            vector_remaining: GeoVector::zero(),
            target: (kind == TaskPointKind::Aat).then_some(AatTarget {
                location,
                locked: false,
            }),
            fai_finish_height: 0.0,
        };
        point.update_oz(&projection);
        point
    }

    /// Same configuration without any flight state.
    pub fn clone_fresh(&self) -> Self {
        let mut point = Self::new(self.kind, self.waypoint.clone(), self.oz.clone());
        point.target = self.target;
        point
    }

    /// Same kind and zone shape moved to another waypoint.
    pub fn relocated(&self, waypoint: Waypoint) -> Self {
        Self::new(self.kind, waypoint, self.oz.clone())
    }

    /// Configuration equality: kind, waypoint and zone.
    pub fn equals(&self, other: &OrderedTaskPoint) -> bool {
        self.kind == other.kind && self.waypoint == other.waypoint && self.oz == other.oz
    }

    pub fn kind(&self) -> TaskPointKind {
        self.kind
    }

    pub fn waypoint(&self) -> &Waypoint {
        &self.waypoint
    }

    pub fn name(&self) -> &str {
        &self.waypoint.name
    }

    pub fn location(&self) -> GeoPoint {
        self.waypoint.location
    }

    pub fn elevation(&self) -> f64 {
        self.waypoint.elevation
    }

    pub fn observation_zone(&self) -> &ObservationZone {
        &self.oz
    }

    pub fn neighbours(&self) -> Neighbours {
        self.neighbours
    }

    pub(crate) fn set_neighbours(&mut self, neighbours: Neighbours) {
        self.neighbours = neighbours;
    }

    pub fn active_state(&self) -> ActiveState {
        self.active_state
    }

    pub(crate) fn set_active_state(&mut self, state: ActiveState) {
        self.active_state = state;
    }

    pub fn is_in_sector(&self, state: &AircraftState) -> bool {
        self.oz.is_in_sector(&state.location)
    }

    pub fn is_boundary_scored(&self) -> bool {
        self.kind.is_boundary_scored()
    }

    /// Orient the zone from its neighbour locations.
    pub(crate) fn orient(&mut self, previous: Option<GeoPoint>, next: Option<GeoPoint>) {
        self.oz.set_legs(previous.as_ref(), next.as_ref());
    }

    /// Rebuild the cached search geometry for `projection`.
    pub(crate) fn update_oz(&mut self, projection: &TaskProjection) {
        self.boundary_points = SearchPointVector::from_locations(self.oz.boundary().iter(), projection);
        self.reference_points = SearchPointVector::from_locations([self.location()].iter(), projection);
        self.sampled_points.project(projection);
        let reference = SearchPoint::new(self.location(), projection);
        self.search_min = reference;
        self.search_max = reference;
        if let Some(target) = self.target.as_mut() {
            if !self.oz.is_in_sector(&target.location) {
                target.location = self.waypoint.location;
            }
        }
    }

    /// Every location that must fall inside the task projection.
    pub(crate) fn scan_projection(&self, projection: &mut TaskProjection) {
        projection.scan(self.location());
        for p in self.oz.boundary() {
            projection.scan(p);
        }
    }

    pub(crate) fn update_bounding_box(&mut self, projection: &TaskProjection) {
        let mut bb = self
            .boundary_points
            .bounding_box()
            .unwrap_or_else(|| FlatBoundingBox::around(projection.project(&self.location()), 0));
        bb.expand(1);
        self.bounding_box = bb;
    }

    pub fn bounding_box(&self) -> &FlatBoundingBox {
        &self.bounding_box
    }

    pub fn bounding_box_overlaps(&self, other: &FlatBoundingBox) -> bool {
        self.bounding_box.overlaps(other)
    }

    /// Boundary polygon of the zone in search form.
    pub fn boundary_points(&self) -> &SearchPointVector {
        &self.boundary_points
    }

    /// Candidates for the path searches. Area points offer their full
    /// boundary until sampled (or while ahead of the active point) and their
    /// sample hull afterwards; fixed points offer only their reference.
    pub fn search_points(&self) -> &SearchPointVector {
        if !self.is_boundary_scored() {
            &self.reference_points
        } else if self.active_state == ActiveState::AfterActive || self.sampled_points.is_empty()
        {
            &self.boundary_points
        } else {
            &self.sampled_points
        }
    }

    pub fn has_entered(&self) -> bool {
        self.state_entered.is_some()
    }

    pub fn has_exited(&self) -> bool {
        self.state_exited.is_some()
    }

    pub fn has_sampled(&self) -> bool {
        !self.sampled_points.is_empty()
    }

    pub fn entered_state(&self) -> Option<&AircraftState> {
        self.state_entered.as_ref()
    }

    pub fn exited_state(&self) -> Option<&AircraftState> {
        self.state_exited.as_ref()
    }

    /// State credited for this point: the exit for a start, the entry otherwise.
    pub fn scored_state(&self) -> Option<&AircraftState> {
        match self.kind {
            TaskPointKind::Start => self.state_exited.as_ref(),
            _ => self.state_entered.as_ref(),
        }
    }

    /// Forget entry, exit and samples.
    pub fn reset(&mut self) {
        self.state_entered = None;
        self.state_exited = None;
        self.sampled_points.clear();
        self.search_min = self.reference_points.iter().next().copied().unwrap_or(self.search_min);
        self.search_max = self.search_min;
        self.vector_planned = GeoVector::zero();
        self.vector_travelled = GeoVector::zero();
        self.vector_remaining = GeoVector::zero();
        if let Some(target) = self.target.as_mut() {
            if !target.locked {
                target.location = self.waypoint.location;
            }
        }
    }

    /// Start-zone re-entry: the previous exit no longer counts.
    pub(crate) fn reset_exit(&mut self, now: &AircraftState) {
        self.state_exited = None;
        self.state_entered = Some(*now);
    }

    fn finish_height_ok(&self, state: &AircraftState, behaviour: &OrderedTaskBehaviour) -> bool {
        if behaviour.finish_min_height <= 0.0 && !behaviour.fai_finish {
            return true;
        }
        state.altitude >= behaviour.finish_height(self.elevation(), self.fai_finish_height)
    }

    /// Outside-to-inside crossing. A start keeps its latest entry, other
    /// points their first.
    pub fn transition_enter(
        &mut self,
        now: &AircraftState,
        last: &AircraftState,
        behaviour: &OrderedTaskBehaviour,
    ) -> bool {
        let entered = self.oz.is_in_sector(&now.location)
            && !self.oz.is_in_sector(&last.location)
            && self.oz.transition_constraint(&now.location, &last.location);
        if !entered || self.state_entered.as_ref() == Some(now) {
            return false;
        }
        if self.kind == TaskPointKind::Finish && !self.finish_height_ok(now, behaviour) {
            return false;
        }
        if self.kind == TaskPointKind::Start || self.state_entered.is_none() {
            self.state_entered = Some(*now);
        }
        true
    }

    /// Inside-to-outside crossing. A start may also be left through the top
    /// of its zone, and its exit only counts within the start limits.
    pub fn transition_exit(
        &mut self,
        now: &AircraftState,
        last: &AircraftState,
        behaviour: &OrderedTaskBehaviour,
    ) -> bool {
        let in_now = self.oz.is_in_sector(&now.location);
        let in_last = self.oz.is_in_sector(&last.location);
        let crossed =
            !in_now && in_last && self.oz.transition_constraint(&now.location, &last.location);

        let through_top = self.kind == TaskPointKind::Start
            && behaviour.start_max_height > 0.0
            && self.oz.can_start_through_top()
            && in_now
            && in_last
            && behaviour.start_height(last) <= behaviour.start_max_height
            && behaviour.start_height(now) > behaviour.start_max_height;

        if !crossed && !through_top || self.state_exited.as_ref() == Some(last) {
            return false;
        }
        if self.kind == TaskPointKind::Start
            && !(behaviour.check_start_speed(last) && behaviour.check_start_height(last))
        {
            return false;
        }
        self.state_exited = Some(*last);
        true
    }

    /// Record `state` if it lies inside the zone. Returns true when the
    /// sample set changed.
    pub fn update_sample_near(&mut self, state: &AircraftState, projection: &TaskProjection) -> bool {
        if !self.oz.is_in_sector(&state.location) {
            return false;
        }
        if !self.is_boundary_scored() {
            if self.sampled_points.is_empty() {
                self.sampled_points.push(SearchPoint::new(self.location(), projection));
                return true;
            }
            return false;
        }
        let sample = SearchPoint::new(state.location, projection);
        if self.sampled_points.is_inside(&sample.flat) {
            return false;
        }
        self.sampled_points.push(sample);
        self.sampled_points.prune_interior();
        true
    }

    pub fn update_sample_far(&mut self, _state: &AircraftState, _projection: &TaskProjection) -> bool {
        false
    }

    pub fn search_min(&self) -> &SearchPoint {
        &self.search_min
    }

    pub fn search_max(&self) -> &SearchPoint {
        &self.search_max
    }

    pub(crate) fn set_search_min(&mut self, point: SearchPoint) {
        self.search_min = point;
    }

    pub(crate) fn set_search_max(&mut self, point: SearchPoint) {
        self.search_max = point;
    }

    /// Achieved points keep their best sampled location as minimum.
    pub(crate) fn set_search_achieved(&mut self, point: SearchPoint) {
        if self.has_sampled() {
            self.search_min = point;
        }
    }

    pub fn location_min(&self) -> GeoPoint {
        self.search_min.location
    }

    pub fn location_max(&self) -> GeoPoint {
        self.search_max.location
    }

    /// Where the remaining task is flown to: the target for area points.
    pub fn location_remaining(&self) -> GeoPoint {
        match self.target {
            Some(target) => target.location,
            None => self.location(),
        }
    }

    pub fn location_travelled(&self) -> GeoPoint {
        if self.is_boundary_scored() && self.has_sampled() {
            self.search_max.location
        } else {
            self.location()
        }
    }

    pub fn location_scored(&self) -> GeoPoint {
        self.location_travelled()
    }

    pub fn vector_planned(&self) -> GeoVector {
        self.vector_planned
    }

    pub fn vector_travelled(&self) -> GeoVector {
        self.vector_travelled
    }

    pub fn vector_remaining(&self) -> GeoVector {
        self.vector_remaining
    }

    pub(crate) fn set_leg_vectors(
        &mut self,
        planned: GeoVector,
        travelled: GeoVector,
        remaining: GeoVector,
    ) {
        self.vector_planned = planned;
        self.vector_travelled = travelled;
        self.vector_remaining = remaining;
    }

    pub fn target(&self) -> Option<&AatTarget> {
        self.target.as_ref()
    }

    /// Move the area target. Ignored outside the zone or when locked, unless forced.
    pub fn set_target(&mut self, location: GeoPoint, force: bool) -> bool {
        let in_sector = self.oz.is_in_sector(&location);
        match self.target.as_mut() {
            Some(target) if in_sector && (force || !target.locked) => {
                target.location = location;
                true
            }
            _ => false,
        }
    }

    /// Place the target along the range: 0 is the reference, +1 the
    /// farthest and -1 the nearest searched location.
    pub fn set_target_range(&mut self, range: f64) -> bool {
        let range = range.clamp(-1.0, 1.0);
        let reference = self.location();
        let location = if range >= 0.0 {
            reference.interpolate(&self.search_max.location, range)
        } else {
            reference.interpolate(&self.search_min.location, -range)
        };
        match self.target.as_mut() {
            Some(target) if !target.locked => {
                target.location = location;
                true
            }
            _ => false,
        }
    }

    pub fn lock_target(&mut self, locked: bool) {
        if let Some(target) = self.target.as_mut() {
            target.locked = locked;
        }
    }

    pub fn target_locked(&self) -> bool {
        self.target.map(|t| t.locked).unwrap_or(false)
    }

    pub fn fai_finish_height(&self) -> f64 {
        self.fai_finish_height
    }

    pub(crate) fn set_fai_finish_height(&mut self, height: f64) {
        self.fai_finish_height = height.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn behaviour() -> OrderedTaskBehaviour {
        OrderedTaskBehaviour::default()
    }

    fn state(lat: f64, lon: f64, time: f64) -> AircraftState {
        AircraftState::at(GeoPoint::new(lat, lon), 1_000.0, time)
    }

    fn cylinder(kind: TaskPointKind, lon: f64, radius: f64) -> OrderedTaskPoint {
        let location = GeoPoint::new(0.0, lon);
        OrderedTaskPoint::new(
            kind,
            Waypoint::new("tp", location, 0.0),
            ObservationZone::cylinder(location, radius),
        )
    }

    #[test]
    fn test_relink_is_pure() {
        assert_eq!(relink(3, 0), Neighbours { previous: None, next: Some(1) });
        assert_eq!(relink(3, 1), Neighbours { previous: Some(0), next: Some(2) });
        assert_eq!(relink(3, 2), Neighbours { previous: Some(1), next: None });
        assert_eq!(relink(3, 5), Neighbours::default());
    }

    #[test]
    fn test_enter_then_exit() {
        let mut tp = cylinder(TaskPointKind::Ast, 0.0, 500.0);
        let outside = state(0.0, -0.01, 0.0);
        let inside = state(0.0, 0.0, 10.0);
        assert!(!tp.transition_enter(&outside, &outside, &behaviour()));
        assert!(tp.transition_enter(&inside, &outside, &behaviour()));
        assert!(tp.has_entered());
        assert!(tp.transition_exit(&outside, &inside, &behaviour()));
        assert!(tp.has_exited());
        assert_eq!(tp.scored_state().map(|s| s.time), Some(10.0));
    }

    #[test]
    fn test_start_scores_last_exit() {
        let mut tp = cylinder(TaskPointKind::Start, 0.0, 1_000.0);
        let inside = state(0.0, 0.0, 10.0);
        let outside = state(0.0, 0.02, 20.0);
        assert!(tp.transition_exit(&outside, &inside, &behaviour()));
        let inside_again = state(0.0, 0.0, 30.0);
        let outside_again = state(0.0, 0.02, 40.0);
        assert!(tp.transition_exit(&outside_again, &inside_again, &behaviour()));
        assert_eq!(tp.scored_state().map(|s| s.time), Some(30.0));
    }

    #[test]
    fn test_start_speed_limit_blocks_exit() {
        let mut tp = cylinder(TaskPointKind::Start, 0.0, 1_000.0);
        let mut rules = behaviour();
        rules.start_max_speed = 40.0;
        let inside = state(0.0, 0.0, 10.0).with_speed(50.0, 90.0);
        let outside = state(0.0, 0.02, 20.0);
        assert!(!tp.transition_exit(&outside, &inside, &rules));
        assert!(!tp.has_exited());
    }

    #[test]
    fn test_start_through_top() {
        let mut tp = cylinder(TaskPointKind::Start, 0.0, 1_000.0);
        let mut rules = behaviour();
        rules.start_max_height = 1_500.0;
        let low = AircraftState::at(GeoPoint::new(0.0, 0.0), 1_400.0, 10.0);
        let high = AircraftState::at(GeoPoint::new(0.0, 0.0), 1_600.0, 11.0);
        assert!(tp.transition_exit(&high, &low, &rules));
    }

    #[test]
    fn test_area_samples_form_hull() {
        let location = GeoPoint::new(0.0, 0.0);
        let mut tp = OrderedTaskPoint::new(
            TaskPointKind::Aat,
            Waypoint::new("area", location, 0.0),
            ObservationZone::cylinder(location, 20_000.0),
        );
        let projection = TaskProjection::new(location);
        assert!(tp.update_sample_near(&state(0.0, 0.0, 0.0), &projection));
        assert!(tp.update_sample_near(&state(0.1, 0.0, 1.0), &projection));
        assert!(tp.update_sample_near(&state(0.1, 0.1, 2.0), &projection));
        assert!(tp.update_sample_near(&state(0.0, 0.1, 3.0), &projection));
        // interior sample adds nothing
        assert!(!tp.update_sample_near(&state(0.05, 0.05, 4.0), &projection));
        // outside the zone is ignored
        assert!(!tp.update_sample_near(&state(1.0, 1.0, 5.0), &projection));
        assert!(tp.has_sampled());
        assert_eq!(tp.search_points().len(), 4);
    }

    #[test]
    fn test_fixed_points_search_reference_only() {
        let tp = cylinder(TaskPointKind::Ast, 0.1, 500.0);
        assert_eq!(tp.search_points().len(), 1);
        assert_eq!(tp.search_points().as_slice()[0].location, tp.location());
        assert!(tp.boundary_points().len() > 1);
    }

    #[test]
    fn test_target_range_interpolates() {
        let location = GeoPoint::new(0.0, 0.0);
        let mut tp = OrderedTaskPoint::new(
            TaskPointKind::Aat,
            Waypoint::new("area", location, 0.0),
            ObservationZone::cylinder(location, 20_000.0),
        );
        let projection = TaskProjection::new(location);
        tp.set_search_max(SearchPoint::new(GeoPoint::new(0.0, 0.1), &projection));
        assert!(tp.set_target_range(0.5));
        let target = tp.location_remaining();
        assert!((target.longitude - 0.05).abs() < 1e-9);

        tp.lock_target(true);
        assert!(!tp.set_target_range(1.0));
        assert!(!tp.set_target(GeoPoint::new(0.0, 0.01), false));
        assert!(tp.set_target(GeoPoint::new(0.0, 0.01), true));
    }
}
