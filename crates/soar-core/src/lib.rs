pub mod advance;
pub mod dijkstra;
pub mod error;
pub mod events;
pub mod factory;
pub mod geo;
pub mod glide;
pub mod models;
pub mod ordered_task;
pub mod oz;
pub mod projection;
pub mod rules;
pub mod search_point;
pub mod shared;
pub mod solvers;
pub mod stats;
pub mod task_point;
pub mod visitor;

pub use advance::{AdvanceMode, AdvanceState, TaskAdvance};
pub use error::{TaskEditError, TaskValidationError};
pub use events::TaskEvent;
pub use factory::{LegalPointType, TaskFactory, TaskFactoryKind};
pub use geo::{GeoBounds, GeoPoint, GeoVector, SpeedVector};
pub use glide::{GlidePolar, GlideResult, GlideResultValidity, GlideSettings, PolarCoefficients};
pub use models::{AircraftState, Waypoint};
pub use ordered_task::{OrderedTask, PlannedGlide};
pub use oz::{ObservationZone, OzShape};
pub use projection::TaskProjection;
pub use rules::{AltitudeReference, OrderedTaskBehaviour, SectorDefaults, TaskBehaviour};
pub use shared::SharedTask;
pub use stats::{DistanceStat, ElementStat, RateFilter, TaskStats, TaskSummary, TaskSummaryPoint};
pub use task_point::{ActiveState, OrderedTaskPoint, TaskPointKind};
pub use visitor::TaskPointVisitor;
