//! Task factories: which point types each task kind allows, its rules and
//! its validation.

use crate::error::TaskValidationError;
use crate::models::Waypoint;
use crate::oz::{ObservationZone, OzShape};
use crate::rules::{OrderedTaskBehaviour, SectorDefaults};
use crate::task_point::{OrderedTaskPoint, TaskPointKind};
use serde::{Deserialize, Serialize};

/// Share of the distance every leg of an FAI triangle must reach.
pub const FAI_TRIANGLE_MIN_LEG: f64 = 0.28;

/// Start and finish closer than this count as the same location, meters.
const CLOSED_TOLERANCE_M: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFactoryKind {
    #[default]
    Racing,
    Aat,
    FaiGeneral,
    FaiTriangle,
    FaiOr,
    FaiGoal,
    Mixed,
    Touring,
}

impl TaskFactoryKind {
    pub fn is_fai(self) -> bool {
        matches!(
            self,
            TaskFactoryKind::FaiGeneral
                | TaskFactoryKind::FaiTriangle
                | TaskFactoryKind::FaiOr
                | TaskFactoryKind::FaiGoal
        )
    }
}

/// Concrete point type: role plus zone shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalPointType {
    StartCylinder,
    StartLine,
    StartSector,
    StartBga,
    FaiSector,
    AstCylinder,
    Keyhole,
    BgaFixedCourse,
    BgaEnhancedOption,
    AatCylinder,
    AatSegment,
    AatAnnularSector,
    FinishCylinder,
    FinishLine,
    FinishSector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeFamily {
    Cylinder,
    Line,
    Sector,
    Keyhole,
}

impl LegalPointType {
    pub fn kind(self) -> TaskPointKind {
        use LegalPointType::*;
        match self {
            StartCylinder | StartLine | StartSector | StartBga => TaskPointKind::Start,
            FaiSector | AstCylinder | Keyhole | BgaFixedCourse | BgaEnhancedOption => TaskPointKind::Ast,
            AatCylinder | AatSegment | AatAnnularSector => TaskPointKind::Aat,
            FinishCylinder | FinishLine | FinishSector => TaskPointKind::Finish,
        }
    }

    fn family(self) -> ShapeFamily {
        use LegalPointType::*;
        match self {
            StartCylinder | AstCylinder | AatCylinder | FinishCylinder => ShapeFamily::Cylinder,
            StartLine | FinishLine => ShapeFamily::Line,
            StartSector | StartBga | FaiSector | AatSegment | AatAnnularSector | FinishSector => {
                ShapeFamily::Sector
            }
            Keyhole | BgaFixedCourse | BgaEnhancedOption => ShapeFamily::Keyhole,
        }
    }

    /// Type of an existing point, read from its kind and zone shape.
    pub fn of(point: &OrderedTaskPoint) -> Self {
        let shape = *point.observation_zone().shape();
        match point.kind() {
            TaskPointKind::Start => match shape {
                OzShape::Cylinder { .. } => LegalPointType::StartCylinder,
                OzShape::Line { .. } => LegalPointType::StartLine,
                OzShape::SymmetricSector { angle, .. } if angle >= 180.0 => LegalPointType::StartBga,
                _ => LegalPointType::StartSector,
            },
            TaskPointKind::Ast => match shape {
                OzShape::Cylinder { .. } => LegalPointType::AstCylinder,
                OzShape::Keyhole { radius, .. } if radius > 15_000.0 => LegalPointType::BgaFixedCourse,
                OzShape::Keyhole { angle, .. } if angle >= 180.0 => LegalPointType::BgaEnhancedOption,
                OzShape::Keyhole { .. } => LegalPointType::Keyhole,
                OzShape::SymmetricSector { .. } => LegalPointType::FaiSector,
                _ => LegalPointType::AstCylinder,
            },
            TaskPointKind::Aat => match shape {
                OzShape::Sector { .. } => LegalPointType::AatSegment,
                OzShape::AnnularSector { .. } => LegalPointType::AatAnnularSector,
                _ => LegalPointType::AatCylinder,
            },
            TaskPointKind::Finish => match shape {
                OzShape::Cylinder { .. } => LegalPointType::FinishCylinder,
                OzShape::Line { .. } => LegalPointType::FinishLine,
                _ => LegalPointType::FinishSector,
            },
        }
    }
}

use LegalPointType as T;

const ALL_STARTS: &[LegalPointType] = &[T::StartLine, T::StartCylinder, T::StartSector, T::StartBga];
const ALL_FINISHES: &[LegalPointType] = &[T::FinishLine, T::FinishCylinder, T::FinishSector];
const RACING_TPS: &[LegalPointType] = &[
    T::AstCylinder,
    T::FaiSector,
    T::Keyhole,
    T::BgaFixedCourse,
    T::BgaEnhancedOption,
];
const AAT_TPS: &[LegalPointType] = &[T::AatCylinder, T::AatSegment, T::AatAnnularSector];
const MIXED_TPS: &[LegalPointType] = &[
    T::AstCylinder,
    T::FaiSector,
    T::Keyhole,
    T::BgaFixedCourse,
    T::BgaEnhancedOption,
    T::AatCylinder,
    T::AatSegment,
    T::AatAnnularSector,
];
const FAI_STARTS: &[LegalPointType] = &[T::StartSector, T::StartLine, T::StartCylinder];
const FAI_TPS: &[LegalPointType] = &[T::FaiSector, T::AstCylinder];
const FAI_FINISHES: &[LegalPointType] = &[T::FinishSector, T::FinishLine, T::FinishCylinder];
const TOURING_STARTS: &[LegalPointType] = &[T::StartCylinder];
const TOURING_TPS: &[LegalPointType] = &[T::AstCylinder];
const TOURING_FINISHES: &[LegalPointType] = &[T::FinishCylinder];

/// Rules and legal types of one task kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskFactory {
    kind: TaskFactoryKind,
    start_types: &'static [LegalPointType],
    intermediate_types: &'static [LegalPointType],
    finish_types: &'static [LegalPointType],
}

impl Default for TaskFactory {
    fn default() -> Self {
        Self::new(TaskFactoryKind::default())
    }
}

impl TaskFactory {
    pub fn new(kind: TaskFactoryKind) -> Self {
        let (start_types, intermediate_types, finish_types) = match kind {
            TaskFactoryKind::Racing => (ALL_STARTS, RACING_TPS, ALL_FINISHES),
            TaskFactoryKind::Aat => (ALL_STARTS, AAT_TPS, ALL_FINISHES),
            TaskFactoryKind::FaiGeneral
            | TaskFactoryKind::FaiTriangle
            | TaskFactoryKind::FaiOr
            | TaskFactoryKind::FaiGoal => (FAI_STARTS, FAI_TPS, FAI_FINISHES),
            TaskFactoryKind::Mixed => (ALL_STARTS, MIXED_TPS, ALL_FINISHES),
            TaskFactoryKind::Touring => (TOURING_STARTS, TOURING_TPS, TOURING_FINISHES),
        };
        Self {
            kind,
            start_types,
            intermediate_types,
            finish_types,
        }
    }

    pub fn kind(&self) -> TaskFactoryKind {
        self.kind
    }

    pub fn start_types(&self) -> &'static [LegalPointType] {
        self.start_types
    }

    pub fn intermediate_types(&self) -> &'static [LegalPointType] {
        self.intermediate_types
    }

    pub fn finish_types(&self) -> &'static [LegalPointType] {
        self.finish_types
    }

    fn types_for(&self, kind: TaskPointKind) -> &'static [LegalPointType] {
        match kind {
            TaskPointKind::Start => self.start_types,
            TaskPointKind::Ast | TaskPointKind::Aat => self.intermediate_types,
            TaskPointKind::Finish => self.finish_types,
        }
    }

    /// Type the factory creates by default for a role.
    pub fn default_type(&self, kind: TaskPointKind) -> LegalPointType {
        self.types_for(kind)[0]
    }

    /// Whether the type is legal in this factory at `position` of a task of
    /// `len` points.
    pub fn is_valid_type(&self, point_type: LegalPointType, position: usize, len: usize) -> bool {
        let kind = point_type.kind();
        let position_ok = match kind {
            TaskPointKind::Start => position == 0,
            TaskPointKind::Finish => position > 0 && position + 1 == len,
            TaskPointKind::Ast | TaskPointKind::Aat => position > 0,
        };
        position_ok && self.types_for(kind).contains(&point_type)
    }

    /// Nearest legal type for `point_type`, keeping its role and, where
    /// possible, its shape family.
    pub fn mutated_type(&self, point_type: LegalPointType) -> LegalPointType {
        let candidates = self.types_for(point_type.kind());
        if candidates.contains(&point_type) {
            return point_type;
        }
        candidates
            .iter()
            .copied()
            .find(|t| t.family() == point_type.family())
            .unwrap_or(candidates[0])
    }

    /// Write the factory-owned rules into `behaviour`.
    pub fn update_ordered_task_behaviour(&self, behaviour: &mut OrderedTaskBehaviour) {
        let (min_points, max_points) = match self.kind {
            TaskFactoryKind::FaiTriangle => (4, 4),
            TaskFactoryKind::FaiOr => (3, 3),
            TaskFactoryKind::FaiGoal => (2, 2),
            TaskFactoryKind::Touring => (2, 10),
            _ => (2, 13),
        };
        behaviour.min_points = min_points;
        behaviour.max_points = max_points;
        behaviour.homogeneous_tps = matches!(self.kind, TaskFactoryKind::Aat | TaskFactoryKind::Touring);
        behaviour.is_closed = matches!(self.kind, TaskFactoryKind::FaiTriangle | TaskFactoryKind::FaiOr);
        behaviour.fai_finish = self.kind.is_fai();
        behaviour.task_scored = self.kind != TaskFactoryKind::Touring;
    }

    /// Build a point of `point_type` at `waypoint` with default zone sizes.
    pub fn create_point(
        &self,
        point_type: LegalPointType,
        waypoint: Waypoint,
        defaults: &SectorDefaults,
    ) -> OrderedTaskPoint {
        let at = waypoint.location;
        let oz = match point_type {
            T::StartCylinder => ObservationZone::cylinder(at, defaults.start_radius),
            T::StartLine => ObservationZone::line(at, 2.0 * defaults.start_radius),
            T::StartSector => ObservationZone::symmetric_sector(at, defaults.start_radius, 90.0),
            T::StartBga => ObservationZone::bga_start(at),
            T::FaiSector => ObservationZone::fai_sector(at),
            T::AstCylinder => ObservationZone::cylinder(at, defaults.turnpoint_radius),
            T::Keyhole => ObservationZone::keyhole(at),
            T::BgaFixedCourse => ObservationZone::bga_fixed_course(at),
            T::BgaEnhancedOption => ObservationZone::bga_enhanced_option(at),
            T::AatCylinder => ObservationZone::cylinder(at, defaults.aat_radius),
            T::AatSegment => ObservationZone::sector(at, defaults.aat_radius, 0.0, 180.0),
            T::AatAnnularSector => {
                ObservationZone::annular_sector(at, defaults.aat_radius, defaults.aat_radius / 2.0, 0.0, 180.0)
            }
            T::FinishCylinder => ObservationZone::cylinder(at, defaults.finish_radius),
            T::FinishLine => ObservationZone::line(at, 2.0 * defaults.finish_radius),
            T::FinishSector => ObservationZone::symmetric_sector(at, defaults.finish_radius, 90.0),
        };
        OrderedTaskPoint::new(point_type.kind(), waypoint, oz)
    }

    /// Every problem with `points` under these rules. Warnings included.
    pub fn validate(
        &self,
        points: &[OrderedTaskPoint],
        behaviour: &OrderedTaskBehaviour,
    ) -> Vec<TaskValidationError> {
        let mut errors = Vec::new();
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            errors.push(TaskValidationError::EmptyTask);
            return errors;
        };
        let len = points.len();

        if first.kind() != TaskPointKind::Start {
            errors.push(TaskValidationError::NoValidStart);
        }
        if len < 2 || last.kind() != TaskPointKind::Finish {
            errors.push(TaskValidationError::NoValidFinish);
        }

        let fixed_count = behaviour.min_points == behaviour.max_points;
        if len < behaviour.min_points {
            errors.push(if fixed_count {
                TaskValidationError::IncorrectNumberTurnpoints
            } else {
                TaskValidationError::UnderMinTurnpoints
            });
        } else if len > behaviour.max_points {
            errors.push(if fixed_count {
                TaskValidationError::IncorrectNumberTurnpoints
            } else {
                TaskValidationError::ExceedsMaxTurnpoints
            });
        }

        if behaviour.is_closed && first.location().distance(&last.location()) > CLOSED_TOLERANCE_M {
            errors.push(TaskValidationError::TaskNotClosed);
        }

        if behaviour.homogeneous_tps {
            let mut kinds = points.iter().map(|p| p.kind()).filter(|k| k.is_intermediate());
            if let Some(kind) = kinds.next() {
                if kinds.any(|k| k != kind) {
                    errors.push(TaskValidationError::TaskNotHomogeneous);
                }
            }
        }

        for (i, point) in points.iter().enumerate() {
            if !self.is_valid_type(LegalPointType::of(point), i, len) {
                errors.push(TaskValidationError::IllegalPointType(i));
            }
        }

        if points
            .windows(2)
            .any(|pair| pair[0].location().distance(&pair[1].location()) < CLOSED_TOLERANCE_M)
        {
            errors.push(TaskValidationError::TurnpointsNotUnique);
        }

        if self.kind == TaskFactoryKind::FaiTriangle && len == 4 && !is_fai_triangle(points) {
            errors.push(TaskValidationError::InvalidFaiTriangleGeometry);
        }
        errors
    }
}

/// Every leg at least [`FAI_TRIANGLE_MIN_LEG`] of the total.
pub fn is_fai_triangle(points: &[OrderedTaskPoint]) -> bool {
    let legs: Vec<f64> = points
        .windows(2)
        .map(|pair| pair[0].location().distance(&pair[1].location()))
        .collect();
    let total: f64 = legs.iter().sum();
    total > 0.0 && legs.iter().all(|d| *d >= FAI_TRIANGLE_MIN_LEG * total)
}
