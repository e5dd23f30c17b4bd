//! Sweep descriptions for building cam tracks in an external CAD kernel.
//!
//! A track is a rectangular groove swept along the helix-like path the
//! follower traces on the drum surface. An auxiliary spine, offset upward by
//! half the track height, fixes the section's orientation along the path.

use barrelcam_math::{Dir3, Point2, Point3, Tolerance, Vec3};
use serde::{Deserialize, Serialize};

/// Rectangular track section in the XZ plane at angle 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectSection {
    /// Section centre.
    pub center: [f64; 3],
    /// Radial extent (track depth).
    pub width: f64,
    /// Axial extent (track height).
    pub height: f64,
}

/// Orthonormal frame at one path station.
///
/// `normal` points radially outward and `binormal` toward the auxiliary
/// spine, both perpendicular to the path tangent.
#[derive(Debug, Clone)]
pub struct StationFrame {
    /// Position on the path.
    pub position: Point3,
    /// Unit tangent along the path.
    pub tangent: Dir3,
    /// Unit outward normal.
    pub normal: Dir3,
    /// Unit binormal, toward the auxiliary spine.
    pub binormal: Dir3,
}

impl StationFrame {
    fn new(position: Point3, tangent: Vec3, up: Vec3) -> Self {
        let tol = Tolerance::DEFAULT;
        if tol.is_zero(tangent.norm()) {
            return Self::default_at(position);
        }
        let tangent = Dir3::new_normalize(tangent);
        let up_perp = up - up.dot(tangent.as_ref()) * tangent.as_ref();
        if tol.is_zero(up_perp.norm()) {
            return Self::default_at(position);
        }
        let binormal = Dir3::new_normalize(up_perp);
        let normal = Dir3::new_normalize(tangent.as_ref().cross(binormal.as_ref()));
        Self {
            position,
            tangent,
            normal,
            binormal,
        }
    }

    /// Frame along +Y at angle 0: outward X, upward Z.
    fn default_at(position: Point3) -> Self {
        Self {
            position,
            tangent: Dir3::new_normalize(Vec3::y()),
            normal: Dir3::new_normalize(Vec3::x()),
            binormal: Dir3::new_normalize(Vec3::z()),
        }
    }

    /// Map section coordinates to world coordinates.
    ///
    /// X runs along the normal and Y along the binormal.
    pub fn transform_point(&self, p: Point2) -> Point3 {
        self.position + p.x * self.normal.as_ref() + p.y * self.binormal.as_ref()
    }
}

/// Everything a CAD kernel needs to sweep one track.
#[derive(Debug, Clone)]
pub struct SweepDescription {
    /// Profile label.
    pub label: String,
    /// Centreline on the drum surface.
    pub path: Vec<Point3>,
    /// Path raised by half the track height.
    pub aux_spine: Vec<Point3>,
    /// Section at the start of the path.
    pub section: RectSection,
}

impl SweepDescription {
    /// Whether the path ends where it starts.
    pub fn is_closed(&self) -> bool {
        match (self.path.first(), self.path.last()) {
            (Some(a), Some(b)) => self.path.len() > 2 && Tolerance::DEFAULT.points_equal(a, b),
            _ => false,
        }
    }

    /// Frame at every path station.
    ///
    /// Tangents use central differences. A closed path wraps around its
    /// seam; an open one falls back to one-sided differences at the ends.
    pub fn frames(&self) -> Vec<StationFrame> {
        let n = self.path.len();
        let closed = self.is_closed();
        (0..n)
            .map(|i| {
                let prev = match i {
                    0 if closed => self.path[n - 2],
                    0 => self.path[0],
                    _ => self.path[i - 1],
                };
                let next = match i {
                    _ if i + 1 < n => self.path[i + 1],
                    _ if closed => self.path[1],
                    _ => self.path[i],
                };
                let up = self
                    .aux_spine
                    .get(i)
                    .map_or_else(Vec3::z, |aux| aux - self.path[i]);
                StationFrame::new(self.path[i], next - prev, up)
            })
            .collect()
    }

    /// Section corners carried to every station.
    ///
    /// The groove runs inward from the drum surface, so corners span
    /// `-width..0` along the normal and `±height/2` along the binormal.
    pub fn section_rings(&self) -> Vec<[Point3; 4]> {
        let w = self.section.width;
        let h = self.section.height / 2.0;
        let corners = [
            Point2::new(-w, -h),
            Point2::new(0.0, -h),
            Point2::new(0.0, h),
            Point2::new(-w, h),
        ];
        self.frames()
            .iter()
            .map(|frame| corners.map(|c| frame.transform_point(c)))
            .collect()
    }
}

/// Serializable track record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRecord {
    /// Profile label.
    pub label: String,
    /// Display colour as hex.
    pub color: String,
    /// Centreline points.
    pub path: Vec<[f64; 3]>,
    /// Auxiliary spine points.
    pub aux_spine: Vec<[f64; 3]>,
    /// Track section.
    pub section: RectSection,
}

/// All tracks of a cam, ready for JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepDocument {
    /// Drum radius in mm.
    pub radius: f64,
    /// One record per profile; the final solid is their union.
    pub tracks: Vec<SweepRecord>,
}

fn coords(points: &[Point3]) -> Vec<[f64; 3]> {
    points.iter().map(|p| [p.x, p.y, p.z]).collect()
}

impl SweepDocument {
    /// Bundle sweep descriptions with their colours.
    pub fn new<'a>(
        radius: f64,
        sweeps: impl IntoIterator<Item = (&'a SweepDescription, String)>,
    ) -> Self {
        let tracks = sweeps
            .into_iter()
            .map(|(sweep, color)| SweepRecord {
                label: sweep.label.clone(),
                color,
                path: coords(&sweep.path),
                aux_spine: coords(&sweep.aux_spine),
                section: sweep.section,
            })
            .collect();
        Self { radius, tracks }
    }

    /// Pretty JSON text.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
