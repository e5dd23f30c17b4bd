//! Binary `.cam` file format.
//!
//! Little-endian, sequential fields: magic, version, reciprocal angle and
//! displacement steps, speed, radius, then every profile with its label,
//! colour, cross-section and points.

use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::cam::Cam;
use crate::color::Color;
use crate::error::{CamError, Result};
use crate::law::MotionLaw;
use crate::point::CamPoint;
use crate::profile::CamProfile;
use crate::resolution::Resolution;

/// First field of every cam file.
pub const MAGIC_NUMBER: u32 = 20140112;
/// Supported format version.
pub const FILE_VERSION: u32 = 1;
/// Conventional file extension.
pub const FILE_EXTENSION: &str = "cam";

fn corrupted(e: io::Error) -> CamError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        CamError::Corrupted("unexpected end of data".into())
    } else {
        CamError::Io(e)
    }
}

fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8> {
    let mut buf = [0u8; 1];
    cursor.read_exact(&mut buf).map_err(corrupted)?;
    Ok(buf[0])
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32> {
    let mut buf = [0u8; 4];
    cursor.read_exact(&mut buf).map_err(corrupted)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_f64(cursor: &mut Cursor<&[u8]>) -> Result<f64> {
    let mut buf = [0u8; 8];
    cursor.read_exact(&mut buf).map_err(corrupted)?;
    Ok(f64::from_le_bytes(buf))
}

fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    let len = cursor.get_ref().len() as u64;
    len.saturating_sub(cursor.position()) as usize
}

fn steps_from_reciprocal(value: f64) -> Result<u32> {
    let steps = (1.0 / value).round();
    if steps.is_finite() && steps >= 1.0 && steps <= f64::from(u32::MAX) {
        Ok(steps as u32)
    } else {
        Err(CamError::Corrupted(format!("invalid resolution {}", value)))
    }
}

fn write_profile(buf: &mut Vec<u8>, profile: &CamProfile) -> io::Result<()> {
    let label = profile.label().as_bytes();
    buf.write_all(&(label.len() as u32).to_le_bytes())?;
    buf.write_all(label)?;
    let c = profile.color();
    buf.write_all(&[c.r, c.g, c.b, c.a])?;
    buf.write_all(&profile.height().to_le_bytes())?;
    buf.write_all(&profile.depth().to_le_bytes())?;
    buf.write_all(&(profile.len() as u32).to_le_bytes())?;
    for point in profile.points() {
        buf.write_all(&point.angle().to_le_bytes())?;
        buf.write_all(&point.displacement().to_le_bytes())?;
        buf.write_all(&[point.law().code()])?;
    }
    Ok(())
}

fn read_profile(cursor: &mut Cursor<&[u8]>) -> Result<CamProfile> {
    let label_len = read_u32(cursor)? as usize;
    if label_len > remaining(cursor) {
        return Err(CamError::Corrupted("label length exceeds data".into()));
    }
    let mut label = vec![0u8; label_len];
    cursor.read_exact(&mut label).map_err(corrupted)?;
    let label = String::from_utf8(label)
        .map_err(|_| CamError::Corrupted("label is not UTF-8".into()))?;

    let mut rgba = [0u8; 4];
    cursor.read_exact(&mut rgba).map_err(corrupted)?;
    let height = read_f64(cursor)?;
    let depth = read_f64(cursor)?;

    let count = read_u32(cursor)? as usize;
    if count == 0 {
        return Err(CamError::Corrupted(format!("profile '{}' has no points", label)));
    }
    // 17 bytes per point
    if count > remaining(cursor) / 17 {
        return Err(CamError::Corrupted("point count exceeds data".into()));
    }
    let mut points: Vec<CamPoint> = Vec::with_capacity(count);
    for _ in 0..count {
        let angle = read_f64(cursor)?;
        let displacement = read_f64(cursor)?;
        let law = MotionLaw::try_from(read_u8(cursor)?)?;
        let point = CamPoint::new(angle, displacement, law)
            .map_err(|e| CamError::Corrupted(e.to_string()))?;
        if points.last().is_some_and(|prev| prev.angle() >= point.angle()) {
            return Err(CamError::Corrupted(format!(
                "profile '{}' points are not strictly increasing",
                label
            )));
        }
        points.push(point);
    }
    if !points.last().is_some_and(CamPoint::is_closing) {
        return Err(CamError::Corrupted(format!(
            "profile '{}' does not end at 360 degrees",
            label
        )));
    }

    let mut profile = CamProfile::from_points(points)?;
    profile.set_label(label);
    profile.set_color(Color {
        r: rgba[0],
        g: rgba[1],
        b: rgba[2],
        a: rgba[3],
    });
    profile
        .set_height(height)
        .and_then(|_| profile.set_depth(depth))
        .map_err(|e| CamError::Corrupted(e.to_string()))?;
    Ok(profile)
}

impl Cam {
    /// Serialize to the binary cam format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        buf.write_all(&MAGIC_NUMBER.to_le_bytes())?;
        buf.write_all(&FILE_VERSION.to_le_bytes())?;
        buf.write_all(&(1.0 / f64::from(self.angle_steps())).to_le_bytes())?;
        buf.write_all(&(1.0 / f64::from(self.displacement_steps())).to_le_bytes())?;
        buf.write_all(&self.speed().to_le_bytes())?;
        buf.write_all(&self.radius().to_le_bytes())?;
        buf.write_all(&(self.len() as u32).to_le_bytes())?;
        for (_, profile) in self.iter() {
            write_profile(&mut buf, profile)?;
        }
        Ok(buf)
    }

    /// Parse the binary cam format into a new, clean cam.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);

        let magic = read_u32(&mut cursor)?;
        if magic != MAGIC_NUMBER {
            return Err(CamError::UnrecognizedFormat(magic));
        }
        let version = read_u32(&mut cursor)?;
        if version != FILE_VERSION {
            return Err(CamError::UnrecognizedVersion(version));
        }

        let angle_steps = steps_from_reciprocal(read_f64(&mut cursor)?)?;
        let displacement_steps = steps_from_reciprocal(read_f64(&mut cursor)?)?;
        let resolution = Resolution::new(angle_steps, displacement_steps)?;
        let speed = read_f64(&mut cursor)?;
        let radius = read_f64(&mut cursor)?;
        let mut cam = Cam::with_settings(speed, radius, resolution)
            .map_err(|e| CamError::Corrupted(e.to_string()))?;

        let count = read_u32(&mut cursor)?;
        for _ in 0..count {
            let profile = read_profile(&mut cursor)?;
            cam.insert_profile(profile);
        }
        if remaining(&cursor) > 0 {
            debug!(trailing = remaining(&cursor), "ignoring trailing bytes");
        }
        cam.set_dirty(false);
        Ok(cam)
    }

    /// Read a cam file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let mut cam = Self::from_bytes(&data)?;
        cam.mark_saved(path);
        info!(path = %path.display(), profiles = cam.len(), "loaded cam");
        Ok(cam)
    }

    /// Replace this cam with the contents of `path`.
    ///
    /// On any error the current state is left untouched.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        *self = Self::open(path)?;
        Ok(())
    }

    /// Write to the current file name.
    pub fn save(&mut self) -> Result<()> {
        let path = self.file_name().ok_or(CamError::NoFileName)?.to_path_buf();
        self.save_as(path)
    }

    /// Write to `path` and make it the current file name.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes()?)?;
        self.mark_saved(path);
        info!(path = %path.display(), profiles = self.len(), "saved cam");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cam() -> Cam {
        let mut cam = Cam::with_settings(12.5, 80.0, Resolution::new(4, 8).unwrap()).unwrap();
        let mut profile = CamProfile::with_dimensions(20.0, 6.0).unwrap();
        profile.set_color(Color::rgb(200, 10, 10));
        profile.add_point(CamPoint::new(45.25, 0.0, MotionLaw::Linear).unwrap());
        profile.add_point(CamPoint::new(120.0, 7.5, MotionLaw::Parabolic).unwrap());
        cam.add_cam(Some(profile));
        cam.add_cam(None);
        cam
    }

    #[test]
    fn test_roundtrip_bytes() {
        let cam = sample_cam();
        let back = Cam::from_bytes(&cam.to_bytes().unwrap()).unwrap();
        assert_eq!(back.angle_steps(), 4);
        assert_eq!(back.displacement_steps(), 8);
        assert_eq!(back.speed(), 12.5);
        assert_eq!(back.radius(), 80.0);
        assert_eq!(back.len(), 2);
        assert!(!back.is_dirty());
        for ((_, a), (_, b)) in cam.iter().zip(back.iter()) {
            assert_eq!(a.label(), b.label());
            assert_eq!(a.color(), b.color());
            assert_eq!(a.height(), b.height());
            assert_eq!(a.depth(), b.depth());
            let pa: Vec<CamPoint> = a.points().copied().collect();
            let pb: Vec<CamPoint> = b.points().copied().collect();
            assert_eq!(pa, pb);
        }
    }

    #[test]
    fn test_roundtrip_keeps_empty_label() {
        let mut cam = sample_cam();
        let id = cam.ids()[1];
        cam.get_mut(id).unwrap().set_label("");
        let back = Cam::from_bytes(&cam.to_bytes().unwrap()).unwrap();
        let labels: Vec<&str> = back.iter().map(|(_, p)| p.label()).collect();
        assert_eq!(labels, vec!["Cam 1", ""]);
    }

    #[test]
    fn test_bad_magic_and_version() {
        let mut data = sample_cam().to_bytes().unwrap();
        data[0] ^= 0xff;
        assert!(matches!(
            Cam::from_bytes(&data),
            Err(CamError::UnrecognizedFormat(_))
        ));

        let mut data = sample_cam().to_bytes().unwrap();
        data[4..8].copy_from_slice(&2u32.to_le_bytes());
        assert!(matches!(
            Cam::from_bytes(&data),
            Err(CamError::UnrecognizedVersion(2))
        ));
    }

    #[test]
    fn test_truncated() {
        let data = sample_cam().to_bytes().unwrap();
        for cut in [0, 3, 9, 40, data.len() - 1] {
            assert!(
                matches!(Cam::from_bytes(&data[..cut]), Err(CamError::Corrupted(_))),
                "cut at {}",
                cut
            );
        }
    }

    #[test]
    fn test_unknown_law_code() {
        let mut data = sample_cam().to_bytes().unwrap();
        let last = data.len() - 1;
        data[last] = 3;
        assert!(matches!(
            Cam::from_bytes(&data),
            Err(CamError::UnsupportedLaw(_))
        ));
    }

    #[test]
    fn test_save_requires_file_name() {
        let mut cam = sample_cam();
        assert!(matches!(cam.save(), Err(CamError::NoFileName)));
    }

    #[test]
    fn test_save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drum.cam");
        let mut cam = sample_cam();
        cam.save_as(&path).unwrap();
        assert!(!cam.is_dirty());
        assert_eq!(cam.file_name(), Some(path.as_path()));

        let opened = Cam::open(&path).unwrap();
        assert_eq!(opened.len(), 2);
        assert_eq!(opened.file_name(), Some(path.as_path()));
    }
}
