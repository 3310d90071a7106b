//! Observation zones: the geometric gates attached to task points.
//!
//! A zone is a closed set of shapes dispatched through plain functions.
//! Symmetric shapes (sectors, keyholes, lines) are oriented by the task legs
//! through [`ObservationZone::set_legs`].

use crate::geo::{
    bearing_difference, bearing_within, local_xy, normalize_bearing, reciprocal,
    segments_intersect_2d, GeoPoint,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Smallest radius or length a zone may carry.
pub const MIN_RADIUS_M: f64 = 1.0;

const ARC_STEP_DEG: f64 = 9.0;

/// Shape parameters of a zone. Radii and lengths in meters, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OzShape {
    Cylinder {
        radius: f64,
    },
    /// Gate of `length` perpendicular to the leg; the zone is the half disc behind it.
    Line {
        length: f64,
    },
    /// Sector of `angle` centred on the leg bisector.
    SymmetricSector {
        radius: f64,
        angle: f64,
    },
    /// Sector with fixed radials, as used by area tasks.
    Sector {
        radius: f64,
        start_radial: f64,
        end_radial: f64,
    },
    AnnularSector {
        radius: f64,
        inner_radius: f64,
        start_radial: f64,
        end_radial: f64,
    },
    /// Inner cylinder joined with an oriented sector.
    Keyhole {
        radius: f64,
        inner_radius: f64,
        angle: f64,
    },
}

impl OzShape {
    /// Outer extent of the zone measured from its reference.
    pub fn radius(&self) -> f64 {
        match *self {
            OzShape::Cylinder { radius }
            | OzShape::SymmetricSector { radius, .. }
            | OzShape::Sector { radius, .. }
            | OzShape::AnnularSector { radius, .. }
            | OzShape::Keyhole { radius, .. } => radius,
            OzShape::Line { length } => length / 2.0,
        }
    }

    pub fn is_valid(&self) -> bool {
        match *self {
            OzShape::Cylinder { radius } | OzShape::SymmetricSector { radius, .. } => radius > 0.0,
            OzShape::Line { length } => length > 0.0,
            OzShape::Sector { radius, .. } => radius > 0.0,
            OzShape::AnnularSector {
                radius,
                inner_radius,
                ..
            }
            | OzShape::Keyhole {
                radius,
                inner_radius,
                ..
            } => inner_radius > 0.0 && radius > inner_radius,
        }
    }

    fn clamped(self) -> Self {
        let r = |v: f64| v.max(MIN_RADIUS_M);
        match self {
            OzShape::Cylinder { radius } => OzShape::Cylinder { radius: r(radius) },
            OzShape::Line { length } => OzShape::Line { length: r(length) },
            OzShape::SymmetricSector { radius, angle } => OzShape::SymmetricSector {
                radius: r(radius),
                angle: angle.clamp(1.0, 360.0),
            },
            OzShape::Sector {
                radius,
                start_radial,
                end_radial,
            } => OzShape::Sector {
                radius: r(radius),
                start_radial: normalize_bearing(start_radial),
                end_radial: normalize_bearing(end_radial),
            },
            OzShape::AnnularSector {
                radius,
                inner_radius,
                start_radial,
                end_radial,
            } => {
                let inner_radius = r(inner_radius);
                OzShape::AnnularSector {
                    radius: r(radius).max(inner_radius + MIN_RADIUS_M),
                    inner_radius,
                    start_radial: normalize_bearing(start_radial),
                    end_radial: normalize_bearing(end_radial),
                }
            }
            OzShape::Keyhole {
                radius,
                inner_radius,
                angle,
            } => {
                let inner_radius = r(inner_radius);
                OzShape::Keyhole {
                    radius: r(radius).max(inner_radius + MIN_RADIUS_M),
                    inner_radius,
                    angle: angle.clamp(1.0, 360.0),
                }
            }
        }
    }
}

/// A zone anchored at a reference location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationZone {
    reference: GeoPoint,
    shape: OzShape,
    /// Direction the oriented shapes open toward, degrees.
    #[serde(default)]
    bisector: f64,
}

impl PartialEq for ObservationZone {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference && self.shape == other.shape
    }
}

impl ObservationZone {
    pub fn new(reference: GeoPoint, shape: OzShape) -> Self {
        Self {
            reference,
            shape: shape.clamped(),
            bisector: 0.0,
        }
    }

    pub fn cylinder(reference: GeoPoint, radius: f64) -> Self {
        Self::new(reference, OzShape::Cylinder { radius })
    }

    pub fn line(reference: GeoPoint, length: f64) -> Self {
        Self::new(reference, OzShape::Line { length })
    }

    pub fn symmetric_sector(reference: GeoPoint, radius: f64, angle: f64) -> Self {
        Self::new(reference, OzShape::SymmetricSector { radius, angle })
    }

    /// FAI quadrant, 10 km.
    pub fn fai_sector(reference: GeoPoint) -> Self {
        Self::symmetric_sector(reference, 10_000.0, 90.0)
    }

    pub fn sector(reference: GeoPoint, radius: f64, start_radial: f64, end_radial: f64) -> Self {
        Self::new(
            reference,
            OzShape::Sector {
                radius,
                start_radial,
                end_radial,
            },
        )
    }

    pub fn annular_sector(
        reference: GeoPoint,
        radius: f64,
        inner_radius: f64,
        start_radial: f64,
        end_radial: f64,
    ) -> Self {
        Self::new(
            reference,
            OzShape::AnnularSector {
                radius,
                inner_radius,
                start_radial,
                end_radial,
            },
        )
    }

    /// DAeC keyhole: 500 m cylinder plus 10 km quadrant.
    pub fn keyhole(reference: GeoPoint) -> Self {
        Self::new(
            reference,
            OzShape::Keyhole {
                radius: 10_000.0,
                inner_radius: 500.0,
                angle: 90.0,
            },
        )
    }

    /// BGA fixed course: 500 m cylinder plus 20 km quadrant.
    pub fn bga_fixed_course(reference: GeoPoint) -> Self {
        Self::new(
            reference,
            OzShape::Keyhole {
                radius: 20_000.0,
                inner_radius: 500.0,
                angle: 90.0,
            },
        )
    }

    /// BGA enhanced option: 500 m cylinder plus 10 km half disc.
    pub fn bga_enhanced_option(reference: GeoPoint) -> Self {
        Self::new(
            reference,
            OzShape::Keyhole {
                radius: 10_000.0,
                inner_radius: 500.0,
                angle: 180.0,
            },
        )
    }

    /// BGA start: 5 km half disc facing away from the first leg.
    pub fn bga_start(reference: GeoPoint) -> Self {
        Self::symmetric_sector(reference, 5_000.0, 180.0)
    }

    /// Same shape moved to `reference`.
    pub fn with_reference(&self, reference: GeoPoint) -> Self {
        Self {
            reference,
            shape: self.shape,
            bisector: self.bisector,
        }
    }

    pub fn reference(&self) -> GeoPoint {
        self.reference
    }

    pub fn shape(&self) -> &OzShape {
        &self.shape
    }

    pub fn bisector(&self) -> f64 {
        self.bisector
    }

    pub fn is_valid(&self) -> bool {
        self.shape.is_valid()
    }

    /// Orient the zone from its neighbours. A start faces away from the
    /// outbound leg, a finish away from the inbound leg, a turnpoint outward
    /// along the bisector of both legs.
    pub fn set_legs(&mut self, previous: Option<&GeoPoint>, next: Option<&GeoPoint>) {
        self.bisector = match (previous, next) {
            (None, Some(next)) => reciprocal(self.reference.bearing(next)),
            (Some(previous), None) => reciprocal(self.reference.bearing(previous)),
            (Some(previous), Some(next)) => {
                let inbound = self.reference.bearing(previous);
                let outbound = self.reference.bearing(next);
                let mid = normalize_bearing(inbound + bearing_difference(inbound, outbound) / 2.0);
                reciprocal(mid)
            }
            (None, None) => self.bisector,
        };
    }

    fn arc_range(&self) -> Option<(f64, f64)> {
        match self.shape {
            OzShape::Cylinder { .. } => None,
            OzShape::Line { .. } => Some((
                normalize_bearing(self.bisector - 90.0),
                normalize_bearing(self.bisector + 90.0),
            )),
            OzShape::SymmetricSector { angle, .. } | OzShape::Keyhole { angle, .. } => {
                if angle >= 360.0 {
                    Some((0.0, 0.0))
                } else {
                    Some((
                        normalize_bearing(self.bisector - angle / 2.0),
                        normalize_bearing(self.bisector + angle / 2.0),
                    ))
                }
            }
            OzShape::Sector {
                start_radial,
                end_radial,
                ..
            }
            | OzShape::AnnularSector {
                start_radial,
                end_radial,
                ..
            } => Some((start_radial, end_radial)),
        }
    }

    fn within_arc(&self, location: &GeoPoint, distance: f64) -> bool {
        match self.arc_range() {
            None => true,
            Some(_) if distance < 1e-3 => true,
            Some((start, end)) => bearing_within(self.reference.bearing(location), start, end),
        }
    }

    pub fn is_in_sector(&self, location: &GeoPoint) -> bool {
        let d = self.reference.distance(location);
        match self.shape {
            OzShape::Cylinder { radius } => d <= radius,
            OzShape::Line { length } => d <= length / 2.0 && self.within_arc(location, d),
            OzShape::SymmetricSector { radius, .. } | OzShape::Sector { radius, .. } => {
                d <= radius && self.within_arc(location, d)
            }
            OzShape::AnnularSector {
                radius,
                inner_radius,
                ..
            } => d <= radius && d >= inner_radius && self.within_arc(location, d),
            OzShape::Keyhole {
                radius,
                inner_radius,
                ..
            } => d <= inner_radius || (d <= radius && self.within_arc(location, d)),
        }
    }

    /// Directional condition on a crossing from `last` to `now`. A line must
    /// actually be crossed; every other shape is unconstrained.
    pub fn transition_constraint(&self, now: &GeoPoint, last: &GeoPoint) -> bool {
        match self.shape {
            OzShape::Line { length } => {
                let half = length / 2.0;
                let left = self.reference.offset(self.bisector - 90.0, half);
                let right = self.reference.offset(self.bisector + 90.0, half);
                let xy = |p: &GeoPoint| local_xy(&self.reference, p);
                segments_intersect_2d(xy(last), xy(now), xy(&left), xy(&right))
            }
            _ => true,
        }
    }

    /// Distance deducted from scored distance for this zone.
    pub fn score_adjustment(&self) -> f64 {
        match self.shape {
            OzShape::Cylinder { radius } => radius,
            OzShape::Keyhole { inner_radius, .. } => inner_radius,
            _ => 0.0,
        }
    }

    pub fn can_start_through_top(&self) -> bool {
        !matches!(self.shape, OzShape::Line { .. })
    }

    fn arc(&self, radius: f64, start: f64, end: f64) -> Vec<GeoPoint> {
        let mut width = normalize_bearing(end - start);
        if width <= f64::EPSILON {
            width = 360.0;
        }
        let steps = (width / ARC_STEP_DEG).ceil().max(1.0) as usize;
        (0..=steps)
            .map(|i| {
                let b = start + width * i as f64 / steps as f64;
                self.reference.offset(b, radius)
            })
            .collect()
    }

    /// Closed polygon approximating the zone outline.
    pub fn boundary(&self) -> Vec<GeoPoint> {
        let range = self.arc_range();
        match (self.shape, range) {
            (OzShape::Cylinder { radius }, _) => {
                let mut points = self.arc(radius, 0.0, 0.0);
                points.pop();
                points
            }
            (
                OzShape::AnnularSector {
                    radius,
                    inner_radius,
                    ..
                },
                Some((start, end)),
            ) => {
                let mut points = self.arc(radius, start, end);
                let mut inner = self.arc(inner_radius, start, end);
                inner.reverse();
                points.extend(inner);
                points
            }
            (
                OzShape::Keyhole {
                    radius,
                    inner_radius,
                    ..
                },
                Some((start, end)),
            ) => {
                let mut points = self.arc(radius, start, end);
                points.extend(self.arc(inner_radius, end, start));
                points
            }
            (shape, Some((start, end))) => {
                let mut points = vec![self.reference];
                points.extend(self.arc(shape.radius(), start, end));
                points
            }
            (shape, None) => vec![self.reference.offset(0.0, shape.radius())],
        }
    }

    /// Point at fraction `t` (0..1) of the way around the boundary.
    pub fn boundary_parametric(&self, t: f64) -> GeoPoint {
        let points = self.boundary();
        if points.len() < 2 {
            return points.first().copied().unwrap_or(self.reference);
        }
        let n = points.len();
        let lengths: Vec<f64> = (0..n)
            .map(|i| points[i].distance(&points[(i + 1) % n]))
            .collect();
        let total: f64 = lengths.iter().sum();
        if total <= 0.0 {
            return points[0];
        }
        let mut remaining = t.clamp(0.0, 1.0) * total;
        for (i, len) in lengths.iter().enumerate() {
            if remaining <= *len {
                let f = if *len > 0.0 { remaining / len } else { 0.0 };
                return points[i].interpolate(&points[(i + 1) % n], f);
            }
            remaining -= len;
        }
        points[0]
    }

    /// Random location inside the zone, within `magnitude` (0..1) of its radius.
    pub fn random_point_in_sector<R: Rng + ?Sized>(&self, rng: &mut R, magnitude: f64) -> GeoPoint {
        let radius = self.shape.radius() * magnitude.clamp(0.0, 1.0);
        for _ in 0..64 {
            let bearing = rng.random_range(0.0..360.0);
            let distance = radius * rng.random::<f64>().sqrt();
            let candidate = self.reference.offset(bearing, distance);
            if self.is_in_sector(&candidate) {
                return candidate;
            }
        }
        self.reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> GeoPoint {
        GeoPoint::new(0.0, 0.0)
    }

    #[test]
    fn test_cylinder_containment() {
        let oz = ObservationZone::cylinder(origin(), 1_000.0);
        assert!(oz.is_in_sector(&origin().offset(45.0, 999.0)));
        assert!(!oz.is_in_sector(&origin().offset(45.0, 1_001.0)));
        assert!((oz.score_adjustment() - 1_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_start_sector_faces_away_from_first_leg() {
        let mut oz = ObservationZone::symmetric_sector(origin(), 1_000.0, 90.0);
        oz.set_legs(None, Some(&GeoPoint::new(0.0, 0.1)));
        assert!((oz.bisector() - 270.0).abs() < 1e-6);
        assert!(oz.is_in_sector(&origin().offset(270.0, 500.0)));
        assert!(!oz.is_in_sector(&origin().offset(90.0, 500.0)));
    }

    #[test]
    fn test_turnpoint_sector_points_outward() {
        let tp = GeoPoint::new(0.0, 0.1);
        let mut oz = ObservationZone::fai_sector(tp);
        // inbound from the west, outbound to the south: outside of the corner is north-east
        oz.set_legs(Some(&origin()), Some(&GeoPoint::new(-0.1, 0.1)));
        assert!((oz.bisector() - 45.0).abs() < 0.5);
        assert!(oz.is_in_sector(&tp.offset(45.0, 2_000.0)));
        assert!(!oz.is_in_sector(&tp.offset(225.0, 2_000.0)));
    }

    #[test]
    fn test_line_requires_crossing() {
        let mut oz = ObservationZone::line(origin(), 2_000.0);
        oz.set_legs(None, Some(&GeoPoint::new(0.0, 0.1)));
        let behind = origin().offset(270.0, 200.0);
        let ahead = origin().offset(90.0, 200.0);
        assert!(oz.is_in_sector(&behind));
        assert!(!oz.is_in_sector(&ahead));
        assert!(oz.transition_constraint(&ahead, &behind));

        // leaving the half disc through its arc is not a crossing
        let far_behind = origin().offset(270.0, 1_500.0);
        let inside = origin().offset(270.0, 900.0);
        assert!(!oz.transition_constraint(&far_behind, &inside));
        assert!(!oz.can_start_through_top());
    }

    #[test]
    fn test_keyhole_inner_cylinder() {
        let mut oz = ObservationZone::keyhole(origin());
        oz.set_legs(Some(&GeoPoint::new(0.0, -0.1)), Some(&GeoPoint::new(0.1, 0.0)));
        let behind_task = origin().offset(reciprocal(oz.bisector()), 400.0);
        assert!(oz.is_in_sector(&behind_task));
        assert!(!oz.is_in_sector(&origin().offset(reciprocal(oz.bisector()), 700.0)));
        assert!(oz.is_in_sector(&origin().offset(oz.bisector(), 9_000.0)));
        assert!((oz.score_adjustment() - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_annular_sector_excludes_hole() {
        let oz = ObservationZone::annular_sector(origin(), 10_000.0, 5_000.0, 0.0, 90.0);
        assert!(!oz.is_in_sector(&origin().offset(45.0, 2_000.0)));
        assert!(oz.is_in_sector(&origin().offset(45.0, 7_000.0)));
        assert!(!oz.is_in_sector(&origin().offset(180.0, 7_000.0)));
    }

    #[test]
    fn test_boundary_stays_on_outline() {
        let oz = ObservationZone::cylinder(origin(), 5_000.0);
        let boundary = oz.boundary();
        assert_eq!(boundary.len(), 40);
        for p in &boundary {
            assert!((origin().distance(p) - 5_000.0).abs() < 1.0);
        }
        let halfway = oz.boundary_parametric(0.5);
        assert!((origin().distance(&halfway) - 5_000.0).abs() < 50.0);
    }

    #[test]
    fn test_equality_ignores_orientation() {
        let mut a = ObservationZone::fai_sector(origin());
        let b = ObservationZone::fai_sector(origin());
        a.set_legs(None, Some(&GeoPoint::new(1.0, 0.0)));
        assert_eq!(a, b);
        assert_ne!(a, ObservationZone::cylinder(origin(), 10_000.0));
    }

    #[test]
    fn test_radius_is_clamped_positive() {
        let oz = ObservationZone::cylinder(origin(), -5.0);
        assert!(oz.is_valid());
        assert!((oz.shape().radius() - MIN_RADIUS_M).abs() < f64::EPSILON);
    }

    #[test]
    fn test_random_point_is_inside() {
        let mut rng = rand::rng();
        let mut oz = ObservationZone::fai_sector(origin());
        oz.set_legs(Some(&GeoPoint::new(0.0, -0.1)), Some(&GeoPoint::new(0.1, 0.0)));
        for _ in 0..20 {
            let p = oz.random_point_in_sector(&mut rng, 0.8);
            assert!(oz.is_in_sector(&p));
        }
    }
}
