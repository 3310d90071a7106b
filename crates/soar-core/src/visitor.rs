use crate::task_point::OrderedTaskPoint;

/// Read-only walk over task points, e.g. for rendering or export.
pub trait TaskPointVisitor {
    fn visit(&mut self, point: &OrderedTaskPoint);
}

impl<F> TaskPointVisitor for F
where
    F: FnMut(&OrderedTaskPoint),
{
    fn visit(&mut self, point: &OrderedTaskPoint) {
        self(point)
    }
}
