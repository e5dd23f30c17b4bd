//! A cam profile: the displacement diagram of one track on the drum.

use barrelcam_math::Point2;
use slotmap::{new_key_type, SlotMap};
use tracing::debug;

use crate::color::Color;
use crate::curve::Curve;
use crate::error::{CamError, Result};
use crate::law::MotionLaw;
use crate::point::CamPoint;
use crate::resolution::Resolution;
use crate::segment::{CurveKind, Segment};

/// Default track height in mm.
pub const DEFAULT_HEIGHT: f64 = 35.5;
/// Default track depth in mm.
pub const DEFAULT_DEPTH: f64 = 16.5;

new_key_type! {
    /// Stable handle to a point of a [`CamProfile`].
    pub struct PointId;
}

/// Result of [`CamProfile::add_point`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new point was inserted.
    Inserted(PointId),
    /// The point at the same angle was overwritten; its id is kept.
    Replaced(PointId),
}

impl AddOutcome {
    /// Id of the affected point.
    pub fn id(self) -> PointId {
        match self {
            Self::Inserted(id) | Self::Replaced(id) => id,
        }
    }
}

/// Control points of one track, kept sorted by angle and closed at 360°.
#[derive(Debug, Clone)]
pub struct CamProfile {
    points: SlotMap<PointId, CamPoint>,
    order: Vec<PointId>,
    label: String,
    color: Color,
    height: f64,
    depth: f64,
}

impl Default for CamProfile {
    fn default() -> Self {
        Self::new()
    }
}

fn check_dimension(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CamError::InvalidDimension { name, value })
    }
}

impl CamProfile {
    /// Profile with a single closing point at zero displacement.
    pub fn new() -> Self {
        let mut points = SlotMap::with_key();
        let closing = points.insert(CamPoint::closing_zero());
        Self {
            points,
            order: vec![closing],
            label: String::new(),
            color: Color::BLACK,
            height: DEFAULT_HEIGHT,
            depth: DEFAULT_DEPTH,
        }
    }

    /// Empty profile with the given cross-section.
    pub fn with_dimensions(height: f64, depth: f64) -> Result<Self> {
        check_dimension("height", height)?;
        check_dimension("depth", depth)?;
        Ok(Self {
            height,
            depth,
            ..Self::new()
        })
    }

    /// Build from points in any order. One of them must be at 360°.
    pub fn from_points(points: impl IntoIterator<Item = CamPoint>) -> Result<Self> {
        let mut profile = Self {
            points: SlotMap::with_key(),
            order: Vec::new(),
            ..Self::new()
        };
        for point in points {
            profile.add_point(point);
        }
        if !profile.closing().is_some_and(CamPoint::is_closing) {
            return Err(CamError::ClosingPoint);
        }
        Ok(profile)
    }

    /// Display name.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Set the display name.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Display colour.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Set the display colour.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Track height in mm.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Set the track height; must be > 0.
    pub fn set_height(&mut self, height: f64) -> Result<()> {
        check_dimension("height", height)?;
        self.height = height;
        Ok(())
    }

    /// Track depth in mm.
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Set the track depth; must be > 0.
    pub fn set_depth(&mut self, depth: f64) -> Result<()> {
        check_dimension("depth", depth)?;
        self.depth = depth;
        Ok(())
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Always false for a valid profile.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Point ids in angular order.
    pub fn ids(&self) -> &[PointId] {
        &self.order
    }

    /// Points in angular order.
    pub fn iter(&self) -> impl Iterator<Item = (PointId, &CamPoint)> + '_ {
        self.order.iter().map(|&id| (id, &self.points[id]))
    }

    /// Points in angular order, without ids.
    pub fn points(&self) -> impl Iterator<Item = &CamPoint> + '_ {
        self.order.iter().map(|&id| &self.points[id])
    }

    /// Look up a point.
    pub fn get(&self, id: PointId) -> Option<&CamPoint> {
        self.points.get(id)
    }

    /// Position of a point in angular order.
    pub fn index_of(&self, id: PointId) -> Result<usize> {
        self.order
            .iter()
            .position(|&p| p == id)
            .ok_or(CamError::PointNotFound)
    }

    /// Id of the 360° point.
    pub fn closing_point(&self) -> Option<PointId> {
        self.order.last().copied()
    }

    fn closing(&self) -> Option<&CamPoint> {
        self.closing_point().map(|id| &self.points[id])
    }

    /// Insert keeping angular order, or overwrite the point at the same angle.
    ///
    /// Laws are not normalized here; run [`check_cam`](Self::check_cam) after.
    pub fn add_point(&mut self, point: CamPoint) -> AddOutcome {
        let existing = self
            .order
            .iter()
            .copied()
            .find(|&id| self.points[id].angle() == point.angle());
        if let Some(id) = existing {
            self.points[id] = point;
            return AddOutcome::Replaced(id);
        }
        let at = self
            .order
            .partition_point(|&id| self.points[id].angle() < point.angle());
        let id = self.points.insert(point);
        self.order.insert(at, id);
        AddOutcome::Inserted(id)
    }

    /// Remove a point. The closing point cannot be removed.
    pub fn del_point(&mut self, id: PointId) -> Result<CamPoint> {
        let index = self.index_of(id)?;
        if self.points[id].is_closing() {
            return Err(CamError::ClosingPoint);
        }
        self.order.remove(index);
        self.points.remove(id).ok_or(CamError::PointNotFound)
    }

    /// Copy `new` onto the point `id`, keeping its identity.
    ///
    /// The angle and displacement are floored onto `resolution`. A different
    /// point already at the target angle is removed. The closing point keeps
    /// its angle and no other point may move onto 360°.
    pub fn edit_point(&mut self, id: PointId, new: &CamPoint, resolution: &Resolution) -> Result<()> {
        let current = *self.points.get(id).ok_or(CamError::PointNotFound)?;
        let mut edited = current;
        edited.set_angle(new.angle(), resolution)?;
        edited.set_displacement(resolution.quantize_displacement(new.displacement()))?;
        edited.set_law(new.law());
        if current.is_closing() != edited.is_closing() {
            return Err(CamError::ClosingPoint);
        }

        let collision = self
            .order
            .iter()
            .copied()
            .find(|&other| other != id && self.points[other].angle() == edited.angle());
        if let Some(other) = collision {
            debug!(angle = edited.angle(), "edited point replaces existing point");
            self.order.retain(|&p| p != other);
            self.points.remove(other);
        }

        self.points[id] = edited;
        let points = &self.points;
        self.order.sort_by(|&a, &b| points[a].cmp_angle(&points[b]));
        Ok(())
    }

    /// Normalize laws so equal neighbours dwell and different ones move.
    ///
    /// The first point is compared with the closing point. Returns the number
    /// of laws changed.
    pub fn check_cam(&mut self) -> usize {
        let n = self.order.len();
        let mut changed = 0;
        for i in 0..n {
            let prev = self.order[if i == 0 { n - 1 } else { i - 1 }];
            let id = self.order[i];
            let prev_displacement = self.points[prev].displacement();
            let point = &mut self.points[id];
            let law = if point.displacement() == prev_displacement {
                MotionLaw::Linear
            } else if point.law() == MotionLaw::Linear {
                MotionLaw::Sinusoidal
            } else {
                point.law()
            };
            if law != point.law() {
                point.set_law(law);
                changed += 1;
            }
        }
        if changed > 0 {
            debug!(label = %self.label, changed, "normalized segment laws");
        }
        changed
    }

    /// Point before `id` in angular order; `None` for the first point.
    pub fn prev_point(&self, id: PointId) -> Result<Option<PointId>> {
        let index = self.index_of(id)?;
        Ok(index.checked_sub(1).map(|i| self.order[i]))
    }

    /// Point after `id` in angular order; `None` for the last point.
    pub fn next_point(&self, id: PointId) -> Result<Option<PointId>> {
        let index = self.index_of(id)?;
        Ok(self.order.get(index + 1).copied())
    }

    /// Normalize laws and solve every segment.
    ///
    /// The first segment starts at 0° with the closing point's displacement.
    pub fn segments(&mut self) -> Result<Vec<Segment>> {
        self.check_cam();
        let closing = self.closing().ok_or(CamError::ClosingPoint)?;
        let mut start = Point2::new(0.0, closing.displacement());
        let mut segments = Vec::with_capacity(self.order.len());
        for point in self.points() {
            let end = Point2::new(point.angle(), point.displacement());
            segments.push(Segment::solve(point.law(), start, end)?);
            start = end;
        }
        Ok(segments)
    }

    fn curve(&mut self, kind: CurveKind, complete: bool, angle_steps: u32) -> Result<Curve> {
        if angle_steps == 0 {
            return Err(CamError::InvalidSteps(angle_steps));
        }
        let segments = self.segments()?;
        debug!(label = %self.label, ?kind, segments = segments.len(), angle_steps, "sampling profile");
        Ok(Curve::new(segments, kind, complete, angle_steps))
    }

    /// Displacement curve over one revolution.
    ///
    /// With `complete == false` a dwell contributes only its start sample.
    pub fn polyline(&mut self, complete: bool, angle_steps: u32) -> Result<Curve> {
        self.curve(CurveKind::Displacement, complete, angle_steps)
    }

    /// Displacement per radian of rotation.
    pub fn first_derivative(&mut self, angle_steps: u32) -> Result<Curve> {
        self.curve(CurveKind::FirstDerivative, true, angle_steps)
    }

    /// Displacement per radian² of rotation.
    pub fn second_derivative(&mut self, angle_steps: u32) -> Result<Curve> {
        self.curve(CurveKind::SecondDerivative, true, angle_steps)
    }

    /// Reverse the direction of rotation.
    ///
    /// Every point is reflected to `360 - angle` on the angular grid of
    /// `resolution` and takes the law of the point that followed it, since a
    /// reversed segment ends at what was its start. The closing point stays at 360° and takes the first point's law.
    /// Ids follow their points.
    pub fn mirror(&mut self, resolution: &Resolution) {
        let n = self.order.len();
        if n < 2 {
            return;
        }
        let old: Vec<(PointId, CamPoint)> = self.iter().map(|(id, p)| (id, *p)).collect();
        for i in 0..n - 1 {
            let (id, point) = old[i];
            self.points[id] = point.reflected(old[i + 1].1.law(), resolution);
        }
        let (closing, point) = old[n - 1];
        self.points[closing] = point.with_law(old[0].1.law());

        self.order = old[..n - 1].iter().rev().map(|&(id, _)| id).collect();
        self.order.push(closing);
    }

    /// Largest displacement.
    pub fn max_displacement(&self) -> f64 {
        self.points()
            .map(CamPoint::displacement)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Smallest displacement.
    pub fn min_displacement(&self) -> f64 {
        self.points()
            .map(CamPoint::displacement)
            .fold(f64::INFINITY, f64::min)
    }

    /// Displacements in angular order.
    pub fn displacements(&self) -> impl Iterator<Item = f64> + '_ {
        self.points().map(CamPoint::displacement)
    }

    /// Shift every displacement by `delta`. Nothing changes if any point
    /// would go negative.
    pub fn translate(&mut self, delta: f64) -> Result<()> {
        let mut moved = Vec::with_capacity(self.order.len());
        for &id in &self.order {
            let mut point = self.points[id];
            point.offset_displacement(delta)?;
            moved.push((id, point));
        }
        for (id, point) in moved {
            self.points[id] = point;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn pt(angle: f64, displacement: f64, law: MotionLaw) -> CamPoint {
        CamPoint::new(angle, displacement, law).unwrap()
    }

    fn rise_return() -> CamProfile {
        let mut profile = CamProfile::new();
        profile.add_point(pt(90.0, 0.0, MotionLaw::Linear));
        profile.add_point(pt(180.0, 10.0, MotionLaw::Sinusoidal));
        profile.add_point(pt(270.0, 10.0, MotionLaw::Linear));
        profile.add_point(pt(360.0, 0.0, MotionLaw::Parabolic));
        profile
    }

    #[test]
    fn test_new_has_closing_point() {
        let profile = CamProfile::new();
        assert_eq!(profile.len(), 1);
        let closing = profile.get(profile.closing_point().unwrap()).unwrap();
        assert_eq!(closing.angle(), 360.0);
        assert_eq!(profile.height(), DEFAULT_HEIGHT);
        assert_eq!(profile.depth(), DEFAULT_DEPTH);
        assert!(profile.label().is_empty());
    }

    #[test]
    fn test_add_point_sorted_and_replace() {
        let mut profile = CamProfile::new();
        let b = profile.add_point(pt(200.0, 1.0, MotionLaw::Sinusoidal));
        let a = profile.add_point(pt(100.0, 2.0, MotionLaw::Sinusoidal));
        assert!(matches!(a, AddOutcome::Inserted(_)));
        let angles: Vec<f64> = profile.points().map(CamPoint::angle).collect();
        assert_eq!(angles, vec![100.0, 200.0, 360.0]);

        let replaced = profile.add_point(pt(200.0, 7.0, MotionLaw::Parabolic));
        assert_eq!(replaced, AddOutcome::Replaced(b.id()));
        assert_eq!(profile.len(), 3);
        assert_eq!(profile.get(b.id()).unwrap().displacement(), 7.0);
    }

    #[test]
    fn test_del_point() {
        let mut profile = CamProfile::new();
        let id = profile.add_point(pt(100.0, 2.0, MotionLaw::Sinusoidal)).id();
        assert_eq!(profile.del_point(id).unwrap().angle(), 100.0);
        assert!(matches!(profile.del_point(id), Err(CamError::PointNotFound)));
        let closing = profile.closing_point().unwrap();
        assert!(matches!(profile.del_point(closing), Err(CamError::ClosingPoint)));
    }

    #[test]
    fn test_edit_point_keeps_identity() {
        let res = Resolution::new(10, 10).unwrap();
        let mut profile = rise_return();
        let id = profile.ids()[1];
        let new = pt(200.123, 12.345, MotionLaw::Parabolic);
        profile.edit_point(id, &new, &res).unwrap();
        let edited = profile.get(id).unwrap();
        assert_eq!(edited.angle(), 200.1);
        assert_eq!(edited.displacement(), 12.3);
        assert_eq!(edited.law(), MotionLaw::Parabolic);
        assert_eq!(profile.index_of(id).unwrap(), 1);

        // moving past a neighbour re-sorts
        profile.edit_point(id, &pt(300.0, 12.3, MotionLaw::Parabolic), &res).unwrap();
        assert_eq!(profile.index_of(id).unwrap(), 2);
    }

    #[test]
    fn test_edit_point_collision_and_closing() {
        let res = Resolution::new(10, 10).unwrap();
        let mut profile = rise_return();
        let first = profile.ids()[0];
        profile.edit_point(first, &pt(180.0, 3.0, MotionLaw::Sinusoidal), &res).unwrap();
        assert_eq!(profile.len(), 3);
        assert_eq!(profile.ids()[0], first);

        let closing = profile.closing_point().unwrap();
        assert!(matches!(
            profile.edit_point(closing, &pt(300.0, 1.0, MotionLaw::Linear), &res),
            Err(CamError::ClosingPoint)
        ));
        assert!(matches!(
            profile.edit_point(first, &pt(360.0, 1.0, MotionLaw::Linear), &res),
            Err(CamError::ClosingPoint)
        ));
        // the closing point may still change its displacement
        profile.edit_point(closing, &pt(360.0, 2.0, MotionLaw::Linear), &res).unwrap();
        assert_eq!(profile.get(closing).unwrap().displacement(), 2.0);
    }

    #[test]
    fn test_check_cam_rules() {
        let mut profile = rise_return();
        // 270 -> 360 drops from 10 to 0 under Parabolic: kept
        // 90 follows the closing point at 0: dwell
        assert_eq!(profile.check_cam(), 0);

        profile.add_point(pt(270.0, 10.0, MotionLaw::Sinusoidal));
        profile.add_point(pt(360.0, 0.0, MotionLaw::Linear));
        assert_eq!(profile.check_cam(), 2);
        let laws: Vec<MotionLaw> = profile.points().map(CamPoint::law).collect();
        assert_eq!(
            laws,
            vec![
                MotionLaw::Linear,
                MotionLaw::Sinusoidal,
                MotionLaw::Linear,
                MotionLaw::Sinusoidal
            ]
        );
        assert_eq!(profile.check_cam(), 0);
    }

    #[test]
    fn test_neighbours() {
        let profile = rise_return();
        let ids = profile.ids().to_vec();
        assert_eq!(profile.prev_point(ids[0]).unwrap(), None);
        assert_eq!(profile.prev_point(ids[2]).unwrap(), Some(ids[1]));
        assert_eq!(profile.next_point(ids[3]).unwrap(), None);
        assert_eq!(profile.next_point(ids[0]).unwrap(), Some(ids[1]));

        let mut other = rise_return();
        let gone = other.add_point(pt(10.0, 1.0, MotionLaw::Sinusoidal)).id();
        other.del_point(gone).unwrap();
        assert!(matches!(other.prev_point(gone), Err(CamError::PointNotFound)));
        assert!(matches!(other.next_point(gone), Err(CamError::PointNotFound)));
    }

    #[test]
    fn test_polyline_closes_at_full_turn() {
        let mut profile = rise_return();
        for steps in [1, 3, 10] {
            let samples = profile.polyline(true, steps).unwrap().to_vec();
            let last = samples.last().unwrap();
            assert_eq!(last.angle, 360.0);
            assert_eq!(last.value, 0.0);
            assert_eq!(samples.len(), 360 * steps as usize + 1);
        }
        assert!(matches!(
            profile.polyline(true, 0),
            Err(CamError::InvalidSteps(0))
        ));
    }

    #[test]
    fn test_polyline_sparse_dwells() {
        let mut profile = rise_return();
        let samples = profile.polyline(false, 1).unwrap().to_vec();
        // dwell 0..90 and dwell 180..270 collapse to one sample each
        assert_eq!(samples.len(), 1 + 90 + 1 + 90 + 1);
        assert_eq!((samples[0].angle, samples[0].value), (0.0, 0.0));
        assert_eq!(samples[91].angle, 180.0);
        assert_abs_diff_eq!(samples[91].value, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_derivatives() {
        let mut profile = rise_return();
        let first = profile.first_derivative(1).unwrap().to_vec();
        assert_eq!(first.len(), 361);
        assert_eq!(first[45].value, 0.0);
        assert!(first[135].value > 0.0);
        assert!(first[315].value < 0.0);
        assert_abs_diff_eq!(first[360].value, 0.0, epsilon = 1e-6);

        let second = profile.second_derivative(1).unwrap().to_vec();
        assert!(second[100].value > 0.0);
        assert!(second[170].value < 0.0);
    }

    #[test]
    fn test_mirror_reattaches_laws() {
        let mut profile = rise_return();
        profile.mirror(&Resolution::default());
        let got: Vec<(f64, f64, MotionLaw)> = profile
            .points()
            .map(|p| (p.angle(), p.displacement(), p.law()))
            .collect();
        assert_eq!(
            got,
            vec![
                (90.0, 10.0, MotionLaw::Parabolic),
                (180.0, 10.0, MotionLaw::Linear),
                (270.0, 0.0, MotionLaw::Sinusoidal),
                (360.0, 0.0, MotionLaw::Linear),
            ]
        );
    }

    #[test]
    fn test_mirror_involution() {
        let mut profile = rise_return();
        let before: Vec<CamPoint> = profile.points().copied().collect();
        let ids = profile.ids().to_vec();
        profile.mirror(&Resolution::default());
        profile.mirror(&Resolution::default());
        assert_eq!(profile.ids(), &ids[..]);
        for (a, b) in before.iter().zip(profile.points()) {
            assert_abs_diff_eq!(a.angle(), b.angle(), epsilon = 1e-9);
            assert_eq!(a.displacement(), b.displacement());
            assert_eq!(a.law(), b.law());
        }
    }

    #[test]
    fn test_mirrored_angle_matches_quantized_insert() {
        let res = Resolution::default();
        let mut profile = CamProfile::new();
        profile.add_point(CamPoint::new(232.2, 5.0, MotionLaw::Sinusoidal).unwrap());
        profile.mirror(&res);
        let mirrored = profile.points().next().copied().unwrap();
        assert_eq!(mirrored.angle(), 127.8);

        let mut point = CamPoint::new(100.0, 7.0, MotionLaw::Sinusoidal).unwrap();
        point.set_angle(127.8, &res).unwrap();
        assert!(matches!(profile.add_point(point), AddOutcome::Replaced(_)));
        assert_eq!(profile.len(), 2);
    }

    #[test]
    fn test_min_max_translate() {
        let mut profile = rise_return();
        assert_eq!(profile.max_displacement(), 10.0);
        assert_eq!(profile.min_displacement(), 0.0);
        profile.translate(2.5).unwrap();
        assert_eq!(profile.min_displacement(), 2.5);
        assert!(profile.translate(-3.0).is_err());
        assert_eq!(profile.min_displacement(), 2.5);
    }

    #[test]
    fn test_from_points_requires_closing() {
        let points = vec![pt(90.0, 1.0, MotionLaw::Sinusoidal)];
        assert!(matches!(
            CamProfile::from_points(points),
            Err(CamError::ClosingPoint)
        ));
        let profile = CamProfile::from_points(vec![
            pt(360.0, 1.0, MotionLaw::Linear),
            pt(90.0, 1.0, MotionLaw::Linear),
        ])
        .unwrap();
        assert_eq!(profile.points().next().unwrap().angle(), 90.0);
    }

    #[test]
    fn test_dimensions() {
        let mut profile = CamProfile::with_dimensions(20.0, 8.0).unwrap();
        assert_eq!(profile.len(), 1);
        assert!(profile.set_height(0.0).is_err());
        assert!(matches!(
            profile.set_depth(-1.0),
            Err(CamError::InvalidDimension { name: "depth", .. })
        ));
        assert_eq!(profile.depth(), 8.0);
    }
}
