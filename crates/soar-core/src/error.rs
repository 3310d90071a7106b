//! Error types of task editing and validation.

use crate::factory::LegalPointType;
use thiserror::Error;

/// Rejection of a structural task edit. The task is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskEditError {
    #[error("position {position} out of range for {len} points")]
    OutOfRange { position: usize, len: usize },

    #[error("a start can only be the first point")]
    StartNotFirst,

    #[error("a finish can only be the last point")]
    FinishNotLast,

    #[error("point type {0:?} is not legal for this task")]
    IllegalType(LegalPointType),

    #[error("task is full ({0} points)")]
    TaskFull(usize),

    #[error("the first point of a task must be a start")]
    NoStart,
}

/// Problem reported by task validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskValidationError {
    #[error("task has no points")]
    EmptyTask,

    #[error("task has no valid start")]
    NoValidStart,

    #[error("task has no valid finish")]
    NoValidFinish,

    #[error("start and finish are not at the same location")]
    TaskNotClosed,

    #[error("turnpoints are not all of the same kind")]
    TaskNotHomogeneous,

    #[error("incorrect number of turnpoints")]
    IncorrectNumberTurnpoints,

    #[error("not enough turnpoints")]
    UnderMinTurnpoints,

    #[error("too many turnpoints")]
    ExceedsMaxTurnpoints,

    #[error("turnpoints are not unique")]
    TurnpointsNotUnique,

    #[error("invalid FAI triangle geometry")]
    InvalidFaiTriangleGeometry,

    #[error("point {0} has a zone that is not legal for this task")]
    IllegalPointType(usize),
}

impl TaskValidationError {
    /// Warnings are reported but do not make a task invalid.
    pub fn is_warning(&self) -> bool {
        matches!(self, TaskValidationError::TurnpointsNotUnique)
    }
}
