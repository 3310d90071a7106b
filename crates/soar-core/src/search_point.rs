//! Candidate points used by the task path searches.

use crate::geo::GeoPoint;
use crate::projection::{FlatBoundingBox, FlatPoint, TaskProjection, FLAT_UNIT_M};

/// A location together with its projected coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchPoint {
    pub location: GeoPoint,
    pub flat: FlatPoint,
}

impl SearchPoint {
    pub fn new(location: GeoPoint, projection: &TaskProjection) -> Self {
        Self {
            location,
            flat: projection.fproject(&location),
        }
    }

    pub fn project(&mut self, projection: &TaskProjection) {
        self.flat = projection.fproject(&self.location);
    }

    /// Projected distance in meters.
    pub fn flat_distance(&self, other: &SearchPoint) -> f64 {
        self.flat.distance(&other.flat) * FLAT_UNIT_M
    }
}

/// Ordered set of search points, kept as a convex polygon when pruned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPointVector {
    points: Vec<SearchPoint>,
}

impl SearchPointVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_locations<'a, I>(locations: I, projection: &TaskProjection) -> Self
    where
        I: IntoIterator<Item = &'a GeoPoint>,
    {
        Self {
            points: locations
                .into_iter()
                .map(|l| SearchPoint::new(*l, projection))
                .collect(),
        }
    }

    pub fn push(&mut self, point: SearchPoint) {
        self.points.push(point);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn as_slice(&self) -> &[SearchPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchPoint> {
        self.points.iter()
    }

    /// Re-project every point after the task projection changed.
    pub fn project(&mut self, projection: &TaskProjection) {
        for p in &mut self.points {
            p.project(projection);
        }
    }

    /// Reduce to the convex hull (monotone chain), counter-clockwise.
    pub fn prune_interior(&mut self) {
        if self.points.len() < 3 {
            return;
        }
        let mut sorted = self.points.clone();
        sorted.sort_by(|a, b| {
            a.flat
                .x
                .total_cmp(&b.flat.x)
                .then(a.flat.y.total_cmp(&b.flat.y))
        });
        sorted.dedup_by(|a, b| a.flat == b.flat);
        if sorted.len() < 3 {
            self.points = sorted;
            return;
        }

        let mut hull: Vec<SearchPoint> = Vec::with_capacity(sorted.len() * 2);
        for p in sorted.iter() {
            while hull.len() >= 2
                && hull[hull.len() - 2].flat.cross(&hull[hull.len() - 1].flat, &p.flat) <= 0.0
            {
                hull.pop();
            }
            hull.push(*p);
        }
        let lower_len = hull.len() + 1;
        for p in sorted.iter().rev().skip(1) {
            while hull.len() >= lower_len
                && hull[hull.len() - 2].flat.cross(&hull[hull.len() - 1].flat, &p.flat) <= 0.0
            {
                hull.pop();
            }
            hull.push(*p);
        }
        hull.pop();
        self.points = hull;
    }

    /// Whether `p` lies inside the polygon. Assumes a convex counter-clockwise hull.
    pub fn is_inside(&self, p: &FlatPoint) -> bool {
        if self.points.len() < 3 {
            return false;
        }
        let n = self.points.len();
        (0..n).all(|i| {
            let a = &self.points[i].flat;
            let b = &self.points[(i + 1) % n].flat;
            a.cross(b, p) >= 0.0
        })
    }

    pub fn bounding_box(&self) -> Option<FlatBoundingBox> {
        FlatBoundingBox::enclosing(self.points.iter().map(|p| p.flat.round()))
    }

    /// Point nearest to `location` in flat distance.
    pub fn nearest(&self, location: &FlatPoint) -> Option<&SearchPoint> {
        self.points
            .iter()
            .min_by(|a, b| a.flat.distance(location).total_cmp(&b.flat.distance(location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> TaskProjection {
        let mut projection = TaskProjection::new(GeoPoint::new(0.0, 0.0));
        projection.scan(GeoPoint::new(0.1, 0.1));
        projection.update();
        projection
    }

    #[test]
    fn test_prune_interior_keeps_hull() {
        let projection = projection();
        let locations = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.1),
            GeoPoint::new(0.1, 0.1),
            GeoPoint::new(0.1, 0.0),
            GeoPoint::new(0.05, 0.05),
        ];
        let mut points = SearchPointVector::from_locations(locations.iter(), &projection);
        points.prune_interior();
        assert_eq!(points.len(), 4);

        let center = projection.fproject(&GeoPoint::new(0.05, 0.05));
        assert!(points.is_inside(&center));
        let outside = projection.fproject(&GeoPoint::new(0.2, 0.05));
        assert!(!points.is_inside(&outside));
    }

    #[test]
    fn test_degenerate_hull_is_never_inside() {
        let projection = projection();
        let mut points = SearchPointVector::new();
        points.push(SearchPoint::new(GeoPoint::new(0.0, 0.0), &projection));
        points.prune_interior();
        assert!(!points.is_inside(&FlatPoint::new(0.0, 0.0)));
    }
}
