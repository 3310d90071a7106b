use super::OrderedTask;
use crate::geo::{GeoPoint, GeoVector};
use crate::search_point::SearchPoint;
use crate::task_point::ActiveState;

fn chain_distance<I>(locations: I) -> f64
where
    I: IntoIterator<Item = GeoPoint>,
{
    let mut locations = locations.into_iter();
    let Some(mut from) = locations.next() else {
        return 0.0;
    };
    let mut total = 0.0;
    for to in locations {
        total += from.distance(&to);
        from = to;
    }
    total
}

impl OrderedTask {
    /// Straight legs between the point references.
    pub fn scan_distance_nominal(&self) -> f64 {
        chain_distance(self.points.iter().map(|p| p.location()))
    }

    /// Travelled locations up to the active point, targets after it.
    pub fn scan_distance_planned(&self) -> f64 {
        let active = self.active;
        chain_distance(self.points.iter().enumerate().map(|(i, p)| {
            if i < active {
                p.location_travelled()
            } else {
                p.location_remaining()
            }
        }))
    }

    /// From `location` through the remaining targets to the finish.
    pub fn scan_distance_remaining(&self, location: &GeoPoint) -> f64 {
        if self.points.is_empty() || self.task_finished() {
            return 0.0;
        }
        let rest = &self.points[self.active..];
        let first = rest[0].location_remaining();
        location.distance(&first) + chain_distance(rest.iter().map(|p| p.location_remaining()))
    }

    /// Along the achieved points and on to `location`.
    pub fn scan_distance_travelled(&self, location: &GeoPoint) -> f64 {
        if !self.task_started(false) {
            return 0.0;
        }
        if self.task_finished() {
            return chain_distance(self.points.iter().map(|p| p.location_travelled()));
        }
        let achieved = &self.points[..self.active];
        let Some(last) = achieved.last() else {
            return 0.0;
        };
        chain_distance(achieved.iter().map(|p| p.location_travelled()))
            + last.location_travelled().distance(location)
    }

    /// Scored distance: achieved legs plus progress along the current leg,
    /// less the zone adjustments of start and finish.
    pub fn scan_distance_scored(&self, location: &GeoPoint) -> f64 {
        if !self.task_started(false) || self.active == 0 {
            return 0.0;
        }
        let start_adjustment = self.points[0].observation_zone().score_adjustment();
        if self.task_finished() {
            let finish_adjustment = self
                .points
                .last()
                .map(|p| p.observation_zone().score_adjustment())
                .unwrap_or(0.0);
            let total = chain_distance(self.points.iter().map(|p| p.location_scored()));
            return (total - start_adjustment - finish_adjustment).max(0.0);
        }
        let achieved = &self.points[..self.active];
        let mut total = chain_distance(achieved.iter().map(|p| p.location_scored()));
        if let Some(last) = achieved.last() {
            let target = self.points[self.active].location_remaining();
            let leg = last.location_scored().distance(&target);
            total += (leg - location.distance(&target)).max(0.0);
        }
        (total - start_adjustment).max(0.0)
    }

    /// Whether the aircraft moved far enough since the last minimum search
    /// to make another worthwhile.
    pub(crate) fn distance_is_significant(&self, location: &GeoPoint) -> bool {
        match self.scratch.location_min_last {
            None => true,
            Some(last) => {
                self.projection
                    .project(location)
                    .distance_sq(&self.projection.project(&last))
                    > 1
            }
        }
    }

    /// Minimum and maximum achievable task distance. The maximum is only
    /// searched when `full`; the minimum also when the aircraft moved
    /// significantly.
    pub fn scan_distance_min_max(&mut self, location: &GeoPoint, full: bool) -> (f64, f64) {
        if self.points.is_empty() {
            return (0.0, 0.0);
        }
        if full {
            self.scan_distance_max();
        }
        if full || self.distance_is_significant(location) {
            self.scan_distance_min(location);
            self.scratch.location_min_last = Some(*location);
        }
        (
            chain_distance(self.points.iter().map(|p| p.location_min())),
            chain_distance(self.points.iter().map(|p| p.location_max())),
        )
    }

    /// Longest path through every point's search candidates. The active
    /// point is treated as not yet reached so its full boundary counts.
    fn scan_distance_max(&mut self) {
        let original = self.active;
        if let Some(point) = self.points.get_mut(original) {
            if original > 0 {
                point.set_active_state(ActiveState::AfterActive);
            }
        }

        let layers: Vec<&[SearchPoint]> = self.points.iter().map(|p| p.search_points().as_slice()).collect();
        let solution = self.scratch.dijkstra().solve_max(&layers).map(|path| {
            path.iter()
                .zip(&layers)
                .map(|(&index, layer)| layer[index])
                .collect::<Vec<_>>()
        });

        self.scan_active();
        let Some(solution) = solution else {
            tracing::debug!("Task '{}': no maximum distance path", self.name);
            return;
        };
        for (i, (point, best)) in self.points.iter_mut().zip(solution).enumerate() {
            point.set_search_max(best);
            if i < original {
                point.set_search_achieved(best);
            }
        }
    }

    /// Shortest path from `location` through the remaining points. While
    /// inside the active area, the aircraft position is a candidate too.
    fn scan_distance_min(&mut self, location: &GeoPoint) {
        let active = self.active;
        let origin = SearchPoint::new(*location, &self.projection);

        let mut layers: Vec<Vec<SearchPoint>> = self.points[active..]
            .iter()
            .map(|p| p.search_points().as_slice().to_vec())
            .collect();
        let active_point = &self.points[active];
        if active_point.is_boundary_scored() && active_point.observation_zone().is_in_sector(location) {
            layers[0].push(origin);
        }
        let slices: Vec<&[SearchPoint]> = layers.iter().map(|l| l.as_slice()).collect();
        let Some(path) = self.scratch.dijkstra().solve_min(&slices, Some(&origin)) else {
            return;
        };

        let start_open = !self.points[0].has_exited();
        for (offset, (&index, layer)) in path.iter().zip(&layers).enumerate() {
            let i = active + offset;
            if i == 0 && start_open {
                continue;
            }
            self.points[i].set_search_min(layer[index]);
        }
    }

    /// Refresh the planned, travelled and remaining leg vectors of every point.
    pub(crate) fn update_leg_vectors(&mut self, location: &GeoPoint) {
        let active = self.active;
        let finished = self.task_finished();
        let planned: Vec<GeoPoint> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if i < active {
                    p.location_travelled()
                } else {
                    p.location_remaining()
                }
            })
            .collect();
        let travelled: Vec<GeoPoint> = self.points.iter().map(|p| p.location_travelled()).collect();

        for i in 0..self.points.len() {
            let planned_vector = match i {
                0 => GeoVector::zero(),
                _ => planned[i - 1].vector_to(&planned[i]),
            };
            let travelled_vector = match i {
                0 => GeoVector::zero(),
                _ if i < active || (finished && i == active) => travelled[i - 1].vector_to(&travelled[i]),
                _ if i == active => travelled[i - 1].vector_to(location),
                _ => GeoVector::zero(),
            };
            let remaining_vector = if finished || i < active {
                GeoVector::zero()
            } else if i == active {
                location.vector_to(&planned[i])
            } else {
                planned[i - 1].vector_to(&planned[i])
            };
            self.points[i].set_leg_vectors(planned_vector, travelled_vector, remaining_vector);
        }
    }

    /// Time the task was started.
    pub fn scan_total_start_time(&self) -> Option<f64> {
        self.points.first()?.scored_state().map(|s| s.time)
    }

    /// Time the current leg was started: when the previous point was achieved.
    pub fn scan_leg_start_time(&self) -> Option<f64> {
        let previous = self.active.checked_sub(1)?;
        self.points[previous].scored_state().map(|s| s.time)
    }
}

#[cfg(test)]
mod tests {
    use super::chain_distance;
    use crate::geo::GeoPoint;

    #[test]
    fn test_chain_distance() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 0.1);
        let c = GeoPoint::new(0.1, 0.1);
        assert_eq!(chain_distance(Vec::new()), 0.0);
        assert_eq!(chain_distance(vec![a]), 0.0);
        let expected = a.distance(&b) + b.distance(&c);
        assert!((chain_distance(vec![a, b, c]) - expected).abs() < 1e-9);
    }
}
