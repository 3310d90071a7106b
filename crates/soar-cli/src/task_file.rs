//! JSON task descriptions.
//!
//! A task file names the factory and lists the points in flight order:
//!
//! ```json
//! {
//!   "name": "Club triangle",
//!   "factory": "racing",
//!   "points": [
//!     { "type": "start_line", "name": "Home", "latitude": 51.0, "longitude": 7.0 },
//!     { "type": "ast_cylinder", "name": "North", "latitude": 51.5, "longitude": 7.0 },
//!     { "type": "finish_cylinder", "name": "Home", "latitude": 51.0, "longitude": 7.0 }
//!   ]
//! }
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use soar_core::{
    GeoPoint, LegalPointType, OrderedTask, OrderedTaskPoint, TaskBehaviour, TaskFactory, TaskFactoryKind,
    TaskPointVisitor, Waypoint,
};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFilePoint {
    #[serde(rename = "type")]
    pub point_type: LegalPointType,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub elevation: f64,
}

impl TaskFilePoint {
    fn waypoint(&self) -> Waypoint {
        Waypoint::new(self.name.clone(), GeoPoint::new(self.latitude, self.longitude), self.elevation)
    }

    fn of(point: &OrderedTaskPoint) -> Self {
        let location = point.location();
        Self {
            point_type: LegalPointType::of(point),
            name: point.name().to_string(),
            latitude: location.latitude,
            longitude: location.longitude,
            elevation: point.elevation(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub factory: TaskFactoryKind,
    pub points: Vec<TaskFilePoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_starts: Vec<TaskFilePoint>,
}

/// Collects the points of a task in visiting order.
#[derive(Default)]
struct PointCollector {
    points: Vec<TaskFilePoint>,
}

impl TaskPointVisitor for PointCollector {
    fn visit(&mut self, point: &OrderedTaskPoint) {
        self.points.push(TaskFilePoint::of(point));
    }
}

impl TaskFile {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid task file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json =
            std::fs::read_to_string(path).with_context(|| format!("reading task {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Description of an existing task.
    pub fn from_task(task: &OrderedTask) -> Self {
        let mut points = PointCollector::default();
        task.accept_task_point_visitor(&mut points, false);

        // the start visitor yields the task start first
        let mut starts = PointCollector::default();
        task.accept_start_point_visitor(&mut starts);
        let optional_starts = starts.points.into_iter().skip(1).collect();

        Self {
            name: task.name().to_string(),
            factory: task.factory_kind(),
            points: points.points,
            optional_starts,
        }
    }

    /// Build the task, failing on the first rejected point or when the
    /// result does not validate.
    pub fn build(&self, behaviour: &TaskBehaviour) -> Result<OrderedTask> {
        let factory = TaskFactory::new(self.factory);
        let defaults = &behaviour.sector_defaults;
        let mut task = OrderedTask::with_factory(self.factory, behaviour.clone());
        task.set_name(self.name.clone());

        for (i, point) in self.points.iter().enumerate() {
            task.append(factory.create_point(point.point_type, point.waypoint(), defaults))
                .with_context(|| format!("point {} ({})", i, point.name))?;
        }
        for (i, point) in self.optional_starts.iter().enumerate() {
            task.append_optional_start(factory.create_point(point.point_type, point.waypoint(), defaults))
                .with_context(|| format!("optional start {} ({})", i, point.name))?;
        }

        let errors = task.validate();
        for warning in errors.iter().filter(|e| e.is_warning()) {
            tracing::warn!("Task '{}': {}", self.name, warning);
        }
        if !task.check_task() {
            let problems: Vec<String> = errors
                .iter()
                .filter(|e| !e.is_warning())
                .map(|e| e.to_string())
                .collect();
            bail!("task '{}' is invalid: {}", self.name, problems.join(", "));
        }
        Ok(task)
    }
}
