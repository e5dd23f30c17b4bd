#![warn(missing_docs)]

//! Manufacturing geometry for barrel cams.
//!
//! Turns sampled cam profiles into a 2D drawing of the unrolled drum
//! ([`cam_to_dxf`]) or into sweep descriptions that an external CAD kernel
//! can turn into solid tracks ([`cam_sweeps`]).

pub mod dxf;
pub mod error;
pub mod sweep;

use std::path::Path;

use barrelcam_core::{Cam, CamError};
use barrelcam_math::{drum_point, Point2};
use tracing::info;

pub use dxf::DxfDocument;
pub use error::{ExportError, Result};
pub use sweep::{RectSection, StationFrame, SweepDescription, SweepDocument};

/// Default number of polyline samples per sweep station.
pub const DEFAULT_SWEEP_STRIDE: usize = 10;

/// Unrolled drawing of every profile.
///
/// X is the arc length along the drum surface, Y the displacement. Each
/// profile gets its own layer named after its label and coloured with the
/// nearest ACI entry. Repeated labels get a ` (2)`, ` (3)`, ... suffix.
pub fn cam_to_dxf(cam: &mut Cam) -> Result<DxfDocument> {
    if cam.is_empty() {
        return Err(ExportError::EmptyCam);
    }
    let mut doc = DxfDocument::new();
    for id in cam.ids().to_vec() {
        let curve = cam.polyline(id, true)?;
        let points: Vec<Point2> = curve
            .iter()
            .map(|s| Point2::new(cam.arc_length(s.angle), s.value))
            .collect();
        let profile = cam.get(id).ok_or(CamError::ProfileNotFound)?;
        let layer = layer_name(&doc, profile.label());
        doc.add_layer(layer.clone(), profile.color().aci());
        doc.add_polyline(layer, points, false);
    }
    info!(profiles = cam.len(), "built DXF drawing");
    Ok(doc)
}

fn layer_name(doc: &DxfDocument, label: &str) -> String {
    if !doc.has_layer(label) {
        return label.to_string();
    }
    (2..)
        .map(|n| format!("{} ({})", label, n))
        .find(|name| !doc.has_layer(name))
        .unwrap_or_else(|| label.to_string())
}

/// Sweep description of every profile.
///
/// Every `stride`-th displacement sample becomes a path station; the sample
/// at 360° is always kept so the path closes.
pub fn cam_sweeps(cam: &mut Cam, stride: usize) -> Result<Vec<SweepDescription>> {
    if cam.is_empty() {
        return Err(ExportError::EmptyCam);
    }
    if stride == 0 {
        return Err(ExportError::InvalidSettings("sweep stride must be > 0".into()));
    }
    let radius = cam.radius();
    let mut sweeps = Vec::with_capacity(cam.len());
    for id in cam.ids().to_vec() {
        let samples = cam.polyline(id, true)?.to_vec();
        let profile = cam.get(id).ok_or(CamError::ProfileNotFound)?;
        let (height, depth) = (profile.height(), profile.depth());

        let last = samples.len().saturating_sub(1);
        let stations: Vec<_> = samples
            .iter()
            .enumerate()
            .filter(|&(i, _)| i % stride == 0 || i == last)
            .map(|(_, s)| s)
            .collect();
        let path = stations
            .iter()
            .map(|s| drum_point(radius, s.angle, -s.value))
            .collect();
        let aux_spine = stations
            .iter()
            .map(|s| drum_point(radius, s.angle, -s.value + height / 2.0))
            .collect();
        let start = samples.first().map_or(0.0, |s| s.value);

        sweeps.push(SweepDescription {
            label: profile.label().to_string(),
            path,
            aux_spine,
            section: RectSection {
                center: [radius - depth / 2.0, 0.0, -start],
                width: depth,
                height,
            },
        });
    }
    info!(profiles = sweeps.len(), stride, "built sweep descriptions");
    Ok(sweeps)
}

/// Serializable document of every track, with profile colours.
pub fn cam_sweep_document(cam: &mut Cam, stride: usize) -> Result<SweepDocument> {
    let sweeps = cam_sweeps(cam, stride)?;
    let colors: Vec<String> = cam.iter().map(|(_, p)| p.color().to_hex()).collect();
    Ok(SweepDocument::new(
        cam.radius(),
        sweeps.iter().zip(colors),
    ))
}

/// Write the unrolled drawing to a DXF file.
pub fn write_dxf(cam: &mut Cam, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    cam_to_dxf(cam)?.export(path)?;
    info!(path = %path.display(), "wrote DXF");
    Ok(())
}

/// Write the sweep document to a JSON file.
pub fn write_sweep_json(cam: &mut Cam, stride: usize, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = cam_sweep_document(cam, stride)?.to_json()?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), "wrote sweep JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use barrelcam_core::{CamPoint, CamProfile, Color, MotionLaw, Resolution};
    use std::f64::consts::PI;

    fn cam() -> Cam {
        let mut cam = Cam::with_settings(20.0, 100.0, Resolution::new(1, 10).unwrap()).unwrap();
        let mut profile = CamProfile::new();
        profile.add_point(CamPoint::new(90.0, 0.0, MotionLaw::Linear).unwrap());
        profile.add_point(CamPoint::new(180.0, 10.0, MotionLaw::Sinusoidal).unwrap());
        profile.add_point(CamPoint::new(270.0, 10.0, MotionLaw::Linear).unwrap());
        profile.set_color(Color::rgb(255, 0, 0));
        cam.add_cam(Some(profile));
        cam
    }

    #[test]
    fn test_empty_cam_rejected() {
        let mut empty = Cam::new();
        assert!(matches!(cam_to_dxf(&mut empty), Err(ExportError::EmptyCam)));
        assert!(matches!(cam_sweeps(&mut empty, 10), Err(ExportError::EmptyCam)));
    }

    #[test]
    fn test_dxf_uses_arc_length() {
        let mut cam = cam();
        let doc = cam_to_dxf(&mut cam).unwrap();
        assert_eq!(doc.layers()[0].name, "Cam 1");
        assert_eq!(doc.layers()[0].color, 1);
        let poly = &doc.polylines()[0];
        assert_eq!(poly.points.len(), 361);
        assert!(!poly.closed);
        let last = poly.points.last().unwrap();
        assert_abs_diff_eq!(last.x, 2.0 * PI * 100.0, epsilon = 1e-9);
        assert_eq!(last.y, 0.0);
        assert_abs_diff_eq!(poly.points[90].x, PI * 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_dxf_repeated_labels_get_own_layers() {
        let mut cam = cam();
        let mut twin = CamProfile::new();
        twin.set_label("Cam 1");
        twin.set_color(Color::rgb(0, 0, 255));
        cam.add_cam(Some(twin));
        let mut third = CamProfile::new();
        third.set_label("Cam 1");
        cam.add_cam(Some(third));

        let doc = cam_to_dxf(&mut cam).unwrap();
        let names: Vec<&str> = doc.layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Cam 1", "Cam 1 (2)", "Cam 1 (3)"]);
        // the first layer keeps its own colour
        assert_eq!(doc.layers()[0].color, 1);
        assert_eq!(doc.layers()[1].color, 5);
        let on: Vec<&str> = doc.polylines().iter().map(|p| p.layer.as_str()).collect();
        assert_eq!(on, names);
    }

    #[test]
    fn test_sweep_stations() {
        let mut cam = cam();
        let sweeps = cam_sweeps(&mut cam, 10).unwrap();
        let sweep = &sweeps[0];
        // 361 samples: every 10th plus the closing one
        assert_eq!(sweep.path.len(), 37);
        assert_eq!(sweep.aux_spine.len(), 37);
        assert!(sweep.is_closed());
        assert_abs_diff_eq!(sweep.path[0].x, 100.0);
        assert_abs_diff_eq!(sweep.aux_spine[0].z - sweep.path[0].z, 35.5 / 2.0);
        // at 180 degrees the follower sits 10 mm down
        assert_abs_diff_eq!(sweep.path[18].z, -10.0, epsilon = 1e-9);
        assert_eq!(sweep.section.center, [100.0 - 16.5 / 2.0, 0.0, 0.0]);

        let sparse = cam_sweeps(&mut cam, 7).unwrap();
        // 0, 7, ..., 357 and 360
        assert_eq!(sparse[0].path.len(), 53);
        assert!(cam_sweeps(&mut cam, 0).is_err());
    }

    #[test]
    fn test_sweep_document_colors() {
        let mut cam = cam();
        let doc = cam_sweep_document(&mut cam, DEFAULT_SWEEP_STRIDE).unwrap();
        assert_eq!(doc.tracks[0].color, "#ff0000");
        assert_eq!(doc.radius, 100.0);
    }

    #[test]
    fn test_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut cam = cam();
        let dxf = dir.path().join("cam.dxf");
        let json = dir.path().join("cam.json");
        write_dxf(&mut cam, &dxf).unwrap();
        write_sweep_json(&mut cam, DEFAULT_SWEEP_STRIDE, &json).unwrap();

        assert!(std::fs::read_to_string(&dxf).unwrap().contains("LWPOLYLINE"));
        let doc: SweepDocument =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(doc.tracks[0].path.len(), 37);
    }
}
