use super::OrderedTask;
use crate::error::TaskEditError;
use crate::factory::{LegalPointType, TaskFactory, TaskFactoryKind};
use crate::geo::GeoPoint;
use crate::models::Waypoint;
use crate::rules::OrderedTaskBehaviour;
use crate::task_point::{relink, OrderedTaskPoint, TaskPointKind};

impl OrderedTask {
    fn check_type(&self, point: &OrderedTaskPoint, position: usize, len: usize) -> Result<(), TaskEditError> {
        let point_type = LegalPointType::of(point);
        if self.factory.is_valid_type(point_type, position, len) {
            Ok(())
        } else {
            Err(TaskEditError::IllegalType(point_type))
        }
    }

    fn check_room(&self) -> Result<(), TaskEditError> {
        let max = self.ordered_behaviour.max_points;
        if self.points.len() >= max {
            Err(TaskEditError::TaskFull(max))
        } else {
            Ok(())
        }
    }

    fn check_position(&self, position: usize) -> Result<(), TaskEditError> {
        if position < self.points.len() {
            Ok(())
        } else {
            Err(TaskEditError::OutOfRange {
                position,
                len: self.points.len(),
            })
        }
    }

    fn rejected(&self, operation: &str, err: TaskEditError) -> TaskEditError {
        tracing::warn!("Task '{}': {} rejected: {}", self.name, operation, err);
        err
    }

    pub fn append(&mut self, point: OrderedTaskPoint) -> Result<(), TaskEditError> {
        self.check_append(&point)
            .map_err(|e| self.rejected("append", e))?;
        self.points.push(point);
        self.update_geometry();
        Ok(())
    }

    fn check_append(&self, point: &OrderedTaskPoint) -> Result<(), TaskEditError> {
        self.check_room()?;
        let len = self.points.len();
        match self.points.last() {
            None if point.kind() != TaskPointKind::Start => return Err(TaskEditError::NoStart),
            None => {}
            Some(last) if !last.kind().successor_allowed() => return Err(TaskEditError::FinishNotLast),
            Some(_) if point.kind() == TaskPointKind::Start => return Err(TaskEditError::StartNotFirst),
            Some(_) => {}
        }
        self.check_type(point, len, len + 1)
    }

    /// Insert before `position`; at or past the end this appends.
    pub fn insert(&mut self, point: OrderedTaskPoint, position: usize) -> Result<(), TaskEditError> {
        if position >= self.points.len() {
            return self.append(point);
        }
        self.check_insert(&point, position)
            .map_err(|e| self.rejected("insert", e))?;
        self.points.insert(position, point);
        if self.active >= position && self.points.len() > 1 {
            self.active += 1;
        }
        self.update_geometry();
        Ok(())
    }

    fn check_insert(&self, point: &OrderedTaskPoint, position: usize) -> Result<(), TaskEditError> {
        self.check_room()?;
        if position == 0 || point.kind() == TaskPointKind::Start {
            return Err(TaskEditError::StartNotFirst);
        }
        if point.kind() == TaskPointKind::Finish || !self.points[position - 1].kind().successor_allowed() {
            return Err(TaskEditError::FinishNotLast);
        }
        self.check_type(point, position, self.points.len() + 1)
    }

    /// Replace the point at `position`. Replacing with an equal point is a no-op.
    pub fn replace(&mut self, point: OrderedTaskPoint, position: usize) -> Result<(), TaskEditError> {
        self.check_replace(&point, position)
            .map_err(|e| self.rejected("replace", e))?;
        if self.points[position].equals(&point) {
            return Ok(());
        }
        self.points[position] = point;
        self.update_geometry();
        Ok(())
    }

    fn check_replace(&self, point: &OrderedTaskPoint, position: usize) -> Result<(), TaskEditError> {
        self.check_position(position)?;
        let len = self.points.len();
        match point.kind() {
            TaskPointKind::Start if position > 0 => return Err(TaskEditError::StartNotFirst),
            _ if position == 0 && point.kind() != TaskPointKind::Start => return Err(TaskEditError::NoStart),
            TaskPointKind::Finish if position + 1 != len => return Err(TaskEditError::FinishNotLast),
            _ => {}
        }
        self.check_type(point, position, len)
    }

    /// Remove the point at `position`. The start can only go last.
    pub fn remove(&mut self, position: usize) -> Result<(), TaskEditError> {
        self.check_position(position)
            .map_err(|e| self.rejected("remove", e))?;
        if position == 0 && self.points.len() > 1 {
            return Err(self.rejected("remove", TaskEditError::NoStart));
        }
        self.points.remove(position);
        if self.active > position {
            self.active -= 1;
        } else if self.active > 0 && self.active >= self.points.len() {
            self.active -= 1;
        }
        self.update_geometry();
        Ok(())
    }

    /// Move the point at `position` to `waypoint`, keeping kind and zone shape.
    pub fn relocate(&mut self, position: usize, waypoint: Waypoint) -> Result<(), TaskEditError> {
        self.check_position(position)
            .map_err(|e| self.rejected("relocate", e))?;
        let moved = self.points[position].relocated(waypoint);
        self.points[position] = moved;
        self.update_geometry();
        Ok(())
    }

    fn check_optional_start(&self, point: &OrderedTaskPoint) -> Result<(), TaskEditError> {
        let point_type = LegalPointType::of(point);
        if point.kind() != TaskPointKind::Start {
            return Err(TaskEditError::IllegalType(point_type));
        }
        self.check_type(point, 0, self.points.len().max(1))
    }

    fn check_optional_position(&self, position: usize) -> Result<(), TaskEditError> {
        if position < self.optional_starts.len() {
            Ok(())
        } else {
            Err(TaskEditError::OutOfRange {
                position,
                len: self.optional_starts.len(),
            })
        }
    }

    pub fn append_optional_start(&mut self, point: OrderedTaskPoint) -> Result<(), TaskEditError> {
        self.check_optional_start(&point)
            .map_err(|e| self.rejected("append optional start", e))?;
        self.optional_starts.push(point);
        self.update_geometry();
        Ok(())
    }

    pub fn replace_optional_start(&mut self, point: OrderedTaskPoint, position: usize) -> Result<(), TaskEditError> {
        self.check_optional_position(position)
            .and_then(|_| self.check_optional_start(&point))
            .map_err(|e| self.rejected("replace optional start", e))?;
        if self.optional_starts[position].equals(&point) {
            return Ok(());
        }
        self.optional_starts[position] = point;
        self.update_geometry();
        Ok(())
    }

    pub fn remove_optional_start(&mut self, position: usize) -> Result<(), TaskEditError> {
        self.check_optional_position(position)
            .map_err(|e| self.rejected("remove optional start", e))?;
        self.optional_starts.remove(position);
        self.update_geometry();
        Ok(())
    }

    pub fn relocate_optional_start(&mut self, position: usize, waypoint: Waypoint) -> Result<(), TaskEditError> {
        self.check_optional_position(position)
            .map_err(|e| self.rejected("relocate optional start", e))?;
        let moved = self.optional_starts[position].relocated(waypoint);
        self.optional_starts[position] = moved;
        self.update_geometry();
        Ok(())
    }

    /// Make optional start `position` the task start; the previous start
    /// joins the end of the alternatives.
    pub fn select_optional_start(&mut self, position: usize) -> Result<(), TaskEditError> {
        self.check_optional_position(position)
            .map_err(|e| self.rejected("select optional start", e))?;
        if self.points.is_empty() {
            return Err(self.rejected("select optional start", TaskEditError::NoStart));
        }
        let selected = self.optional_starts.remove(position);
        let previous = std::mem::replace(&mut self.points[0], selected);
        self.optional_starts.push(previous);
        tracing::debug!("Task '{}': start is now {}", self.name, self.points[0].name());
        self.update_geometry();
        Ok(())
    }

    /// Cycle to the first optional start. No-op without alternatives.
    pub fn rotate_optional_starts(&mut self) -> Result<(), TaskEditError> {
        if self.optional_starts.is_empty() || self.points.is_empty() {
            return Ok(());
        }
        self.select_optional_start(0)
    }

    /// Relink neighbours, re-orient zones and rebuild the projection and
    /// every derived geometry. Search state is discarded.
    pub fn update_geometry(&mut self) {
        let len = self.points.len();
        for i in 0..len {
            let neighbours = relink(len, i);
            let previous = neighbours.previous.map(|j| self.points[j].location());
            let next = neighbours.next.map(|j| self.points[j].location());
            let point = &mut self.points[i];
            point.set_neighbours(neighbours);
            point.orient(previous, next);
        }
        let next = self.points.get(1).map(|p| p.location());
        for point in self.optional_starts.iter_mut() {
            point.set_neighbours(relink(0, 0));
            point.orient(None, next);
        }
        if self.active >= len {
            self.active = len.saturating_sub(1);
        }
        self.scan_active();
        self.scratch.invalidate();
        self.force_full_update = true;

        let Some(first) = self.points.first() else {
            self.stats.reset();
            return;
        };
        self.projection.reset(first.location());
        for point in self.points.iter().chain(&self.optional_starts) {
            point.scan_projection(&mut self.projection);
        }
        self.projection.update();
        let projection = &self.projection;
        for point in self.points.iter_mut().chain(self.optional_starts.iter_mut()) {
            point.update_oz(projection);
            point.update_bounding_box(projection);
        }

        self.stats.distance_nominal = self.scan_distance_nominal();
        self.stats.task_valid = self.check_task();
        if !self.points[0].has_entered() {
            let origin = self.points[0].location();
            let (dmin, dmax) = self.scan_distance_min_max(&origin, true);
            self.stats.distance_min = dmin;
            self.stats.distance_max = dmax;
        }
    }

    /// Remove every point and optional start.
    pub fn clear(&mut self) {
        self.points.clear();
        self.optional_starts.clear();
        self.active = 0;
        self.advance.reset();
        self.update_geometry();
    }

    /// Forget all flight state; the configuration is kept.
    pub fn reset(&mut self) {
        for point in self.points.iter_mut().chain(self.optional_starts.iter_mut()) {
            point.reset();
        }
        self.active = 0;
        self.advance.reset();
        self.arm_requested = false;
        self.events.clear();
        self.stats.reset();
        self.update_geometry();
    }

    /// Switch task kind. Anything but a switch to mixed also resets the
    /// flight state. Returns the kind now in effect.
    pub fn set_factory(&mut self, kind: TaskFactoryKind) -> TaskFactoryKind {
        if kind == self.factory.kind() {
            return kind;
        }
        if kind != TaskFactoryKind::Mixed {
            self.reset();
        }
        self.factory = TaskFactory::new(kind);
        self.factory.update_ordered_task_behaviour(&mut self.ordered_behaviour);
        self.advance.set_start_requires_arm(self.ordered_behaviour.start_requires_arm);
        self.stats.task_valid = self.check_task();
        tracing::info!("Task '{}' switched to {:?}", self.name, kind);
        kind
    }

    /// Convert every point whose type the factory does not allow to its
    /// nearest legal type. Returns whether anything changed.
    pub fn mutate_points_to_factory(&mut self) -> bool {
        let factory = self.factory;
        let defaults = self.behaviour.sector_defaults.clone();
        let mutate = |point: &mut OrderedTaskPoint| {
            let current = LegalPointType::of(point);
            let mutated = factory.mutated_type(current);
            if mutated == current {
                return false;
            }
            *point = factory.create_point(mutated, point.waypoint().clone(), &defaults);
            true
        };
        let mut changed = false;
        for point in self.points.iter_mut().chain(self.optional_starts.iter_mut()) {
            changed |= mutate(point);
        }
        if changed {
            self.update_geometry();
        }
        changed
    }

    /// Move the active point by hand. Out-of-range indices are ignored.
    pub fn set_active_task_point(&mut self, index: usize) {
        if index >= self.points.len() || index == self.active {
            return;
        }
        self.active = index;
        self.advance.set_armed(false);
        self.scan_active();
        self.force_full_update = true;
        tracing::info!("Task '{}': active point set to {}", self.name, index);
    }

    pub fn set_ordered_behaviour(&mut self, behaviour: OrderedTaskBehaviour) {
        self.advance.set_start_requires_arm(behaviour.start_requires_arm);
        self.ordered_behaviour = behaviour;
        self.stats.task_valid = self.check_task();
    }

    pub fn set_behaviour(&mut self, behaviour: crate::rules::TaskBehaviour) {
        self.advance.set_mode(behaviour.advance_mode);
        self.behaviour = behaviour;
    }

    /// Move the target of area point `index`.
    pub fn set_target(&mut self, index: usize, location: GeoPoint, force: bool) -> bool {
        let changed = self
            .points
            .get_mut(index)
            .map(|p| p.set_target(location, force))
            .unwrap_or(false);
        self.force_full_update |= changed;
        changed
    }

    pub fn set_target_range(&mut self, index: usize, range: f64) -> bool {
        let changed = self
            .points
            .get_mut(index)
            .map(|p| p.set_target_range(range))
            .unwrap_or(false);
        self.force_full_update |= changed;
        changed
    }

    pub fn lock_target(&mut self, index: usize, locked: bool) {
        if let Some(point) = self.points.get_mut(index) {
            point.lock_target(locked);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::factory::{LegalPointType, TaskFactory, TaskFactoryKind};
    use crate::geo::GeoPoint;
    use crate::models::Waypoint;
    use crate::ordered_task::OrderedTask;
    use crate::rules::{SectorDefaults, TaskBehaviour};
    use crate::task_point::OrderedTaskPoint;
    use crate::TaskEditError;

    fn point(t: LegalPointType, name: &str, lon: f64) -> OrderedTaskPoint {
        TaskFactory::new(TaskFactoryKind::Mixed).create_point(
            t,
            Waypoint::new(name, GeoPoint::new(0.0, lon), 0.0),
            &SectorDefaults::default(),
        )
    }

    fn task() -> OrderedTask {
        let mut task = OrderedTask::new(TaskBehaviour::default());
        task.append(point(LegalPointType::StartCylinder, "s", 0.0)).unwrap();
        task.append(point(LegalPointType::AstCylinder, "a", 0.1)).unwrap();
        task.append(point(LegalPointType::FinishCylinder, "f", 0.2)).unwrap();
        task
    }

    #[test]
    fn test_first_point_must_start() {
        let mut task = OrderedTask::new(TaskBehaviour::default());
        assert_eq!(
            task.append(point(LegalPointType::AstCylinder, "a", 0.1)),
            Err(TaskEditError::NoStart)
        );
        assert!(task.is_empty());
    }

    #[test]
    fn test_nothing_after_finish() {
        let mut task = task();
        assert_eq!(
            task.append(point(LegalPointType::AstCylinder, "b", 0.3)),
            Err(TaskEditError::FinishNotLast)
        );
        assert_eq!(task.len(), 3);
    }

    #[test]
    fn test_insert_rules() {
        let mut task = task();
        assert_eq!(
            task.insert(point(LegalPointType::AstCylinder, "b", 0.05), 0),
            Err(TaskEditError::StartNotFirst)
        );
        assert_eq!(
            task.insert(point(LegalPointType::FinishCylinder, "b", 0.05), 1),
            Err(TaskEditError::FinishNotLast)
        );
        // area points are not legal in a racing task
        assert_eq!(
            task.insert(point(LegalPointType::AatCylinder, "b", 0.05), 1),
            Err(TaskEditError::IllegalType(LegalPointType::AatCylinder))
        );
        task.insert(point(LegalPointType::AstCylinder, "b", 0.05), 1).unwrap();
        assert_eq!(task.len(), 4);
        assert_eq!(task.points()[1].name(), "b");
        assert_eq!(task.points()[2].neighbours().previous, Some(1));
    }

    #[test]
    fn test_remove_keeps_start() {
        let mut task = task();
        assert_eq!(task.remove(0), Err(TaskEditError::NoStart));
        assert_eq!(task.remove(7), Err(TaskEditError::OutOfRange { position: 7, len: 3 }));
        task.remove(1).unwrap();
        assert_eq!(task.len(), 2);
        assert_eq!(task.points()[1].neighbours().previous, Some(0));
    }

    #[test]
    fn test_remove_last_moves_active_back() {
        let mut task = task();
        task.set_active_task_point(2);
        task.remove(2).unwrap();
        assert_eq!(task.active_index(), 1);
    }

    #[test]
    fn test_replace_equal_is_noop() {
        let mut task = task();
        let same = task.points()[1].clone();
        task.replace(same, 1).unwrap();
        assert_eq!(
            task.replace(point(LegalPointType::StartCylinder, "x", 0.1), 1),
            Err(TaskEditError::StartNotFirst)
        );
        assert_eq!(
            task.replace(point(LegalPointType::AstCylinder, "x", 0.1), 0),
            Err(TaskEditError::NoStart)
        );
    }

    #[test]
    fn test_task_full() {
        let mut task = OrderedTask::with_factory(TaskFactoryKind::FaiGoal, TaskBehaviour::default());
        task.append(point(LegalPointType::StartLine, "s", 0.0)).unwrap();
        task.append(point(LegalPointType::FinishLine, "f", 0.2)).unwrap();
        assert_eq!(
            task.append(point(LegalPointType::FinishLine, "g", 0.3)),
            Err(TaskEditError::TaskFull(2))
        );
    }

    #[test]
    fn test_optional_start_rotation() {
        let mut task = task();
        task.append_optional_start(point(LegalPointType::StartCylinder, "alt", -0.05))
            .unwrap();
        assert!(task
            .append_optional_start(point(LegalPointType::AstCylinder, "bad", -0.05))
            .is_err());
        task.rotate_optional_starts().unwrap();
        assert_eq!(task.points()[0].name(), "alt");
        assert_eq!(task.optional_starts()[0].name(), "s");
        task.rotate_optional_starts().unwrap();
        assert_eq!(task.points()[0].name(), "s");
    }

    #[test]
    fn test_relocate_keeps_shape() {
        let mut task = task();
        task.relocate(1, Waypoint::new("moved", GeoPoint::new(0.01, 0.1), 100.0))
            .unwrap();
        let moved = &task.points()[1];
        assert_eq!(moved.name(), "moved");
        assert_eq!(LegalPointType::of(moved), LegalPointType::AstCylinder);
        assert_eq!(moved.observation_zone().reference(), GeoPoint::new(0.01, 0.1));
    }

    #[test]
    fn test_mutate_to_factory() {
        let mut task = task();
        assert_eq!(task.set_factory(TaskFactoryKind::Aat), TaskFactoryKind::Aat);
        assert!(!task.check_task());
        assert!(task.mutate_points_to_factory());
        assert!(task.check_task());
        assert_eq!(LegalPointType::of(&task.points()[1]), LegalPointType::AatCylinder);
        assert!(!task.mutate_points_to_factory());
    }
}
