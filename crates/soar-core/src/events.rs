use serde::Serialize;

/// Notification raised by the task while processing an update tick.
/// Indices refer to the ordered points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "point", rename_all = "snake_case")]
pub enum TaskEvent {
    EnterTransition(usize),
    ExitTransition(usize),
    /// The active point moved on to this index
    ActiveAdvanced(usize),
    /// The point is ready but the advance policy waits to be armed
    RequestArm(usize),
    TaskStart,
    TaskFinish,
    /// The start was crossed again after the task had started
    Restart,
}
