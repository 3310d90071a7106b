//! Active point advance policy.

use crate::models::AircraftState;
use crate::task_point::{OrderedTaskPoint, TaskPointKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvanceMode {
    /// Only the pilot moves the active point
    Manual,
    /// Advance as soon as a point is achieved
    Auto,
    /// Auto for turnpoints, armed for areas (and the start when required)
    #[default]
    Smart,
}

/// What the policy is waiting for, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvanceState {
    #[default]
    Manual,
    Auto,
    StartArmed,
    StartDisarmed,
    TurnArmed,
    TurnDisarmed,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskAdvance {
    mode: AdvanceMode,
    armed: bool,
    request_armed: bool,
    state: AdvanceState,
    start_requires_arm: bool,
}

impl TaskAdvance {
    pub fn new(mode: AdvanceMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Whether the active point may be left behind. `x_enter` and `x_exit`
    /// are the crossings of the current tick. An unarmed but ready point
    /// raises an arm request instead.
    pub fn ready_to_advance(
        &mut self,
        point: &OrderedTaskPoint,
        state: &AircraftState,
        x_enter: bool,
        x_exit: bool,
    ) -> bool {
        let ready = state_ready(point, x_enter, x_exit);
        self.request_armed = false;
        self.state = self.advance_state(point.kind());

        match self.mode {
            AdvanceMode::Manual => false,
            AdvanceMode::Auto => ready,
            AdvanceMode::Smart => match point.kind() {
                TaskPointKind::Start if self.start_requires_arm => {
                    if !self.armed && point.is_in_sector(state) {
                        self.request_armed = true;
                    }
                    self.armed && ready
                }
                TaskPointKind::Aat => {
                    if !self.armed && ready {
                        self.request_armed = true;
                    }
                    self.armed && ready
                }
                _ => ready,
            },
        }
    }

    fn advance_state(&self, kind: TaskPointKind) -> AdvanceState {
        match self.mode {
            AdvanceMode::Manual => AdvanceState::Manual,
            AdvanceMode::Auto => AdvanceState::Auto,
            AdvanceMode::Smart => match kind {
                TaskPointKind::Start if self.start_requires_arm => {
                    if self.armed {
                        AdvanceState::StartArmed
                    } else {
                        AdvanceState::StartDisarmed
                    }
                }
                TaskPointKind::Aat => {
                    if self.armed {
                        AdvanceState::TurnArmed
                    } else {
                        AdvanceState::TurnDisarmed
                    }
                }
                _ => AdvanceState::Auto,
            },
        }
    }

    pub fn mode(&self) -> AdvanceMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AdvanceMode) {
        self.mode = mode;
    }

    pub fn set_start_requires_arm(&mut self, required: bool) {
        self.start_requires_arm = required;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn set_armed(&mut self, armed: bool) {
        self.armed = armed;
        self.request_armed = false;
    }

    /// Returns the new armed flag.
    pub fn toggle_armed(&mut self) -> bool {
        self.set_armed(!self.armed);
        self.armed
    }

    pub fn request_armed(&self) -> bool {
        self.request_armed
    }

    pub fn state(&self) -> AdvanceState {
        self.state
    }

    pub fn reset(&mut self) {
        self.armed = false;
        self.request_armed = false;
        self.state = AdvanceState::default();
    }
}

/// Achievement condition per point kind. A start is only ready on the tick
/// it is exited; turnpoints and areas go by their recorded crossings.
pub fn state_ready(point: &OrderedTaskPoint, x_enter: bool, x_exit: bool) -> bool {
    match point.kind() {
        TaskPointKind::Start => x_exit,
        TaskPointKind::Ast => x_enter || point.has_entered(),
        TaskPointKind::Aat => (x_enter || point.has_entered()) && (x_exit || point.has_exited()),
        TaskPointKind::Finish => false,
    }
}
