//! A barrel cam: profiles sharing one drum, speed and resolution.

use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use slotmap::{new_key_type, SlotMap};
use tracing::{debug, warn};

use crate::config::CamConfig;
use crate::curve::{Curve, Distances};
use crate::error::{CamError, Result};
use crate::profile::CamProfile;
use crate::resolution::Resolution;

/// Default drum radius in mm.
pub const DEFAULT_RADIUS: f64 = 149.0;
/// Default speed in rpm.
pub const DEFAULT_SPEED: f64 = 20.0;

new_key_type! {
    /// Stable handle to a profile of a [`Cam`].
    pub struct ProfileId;
}

/// Peak kinematic values of one profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    /// Largest displacement in mm.
    pub max_displacement: f64,
    /// Largest absolute follower velocity in mm/s.
    pub peak_velocity: f64,
    /// Largest absolute follower acceleration in mm/s².
    pub peak_acceleration: f64,
    /// Largest absolute track slope in degrees.
    pub peak_slope: f64,
}

/// Ordered profiles on one drum.
#[derive(Debug, Clone)]
pub struct Cam {
    profiles: SlotMap<ProfileId, CamProfile>,
    order: Vec<ProfileId>,
    speed: f64,
    radius: f64,
    resolution: Resolution,
    dirty: bool,
    file_name: Option<PathBuf>,
}

impl Default for Cam {
    fn default() -> Self {
        Self::new()
    }
}

fn check_speed(speed: f64) -> Result<()> {
    if speed > 0.0 && speed.is_finite() {
        Ok(())
    } else {
        Err(CamError::InvalidSpeed(speed))
    }
}

fn check_radius(radius: f64) -> Result<()> {
    if radius > 0.0 && radius.is_finite() {
        Ok(())
    } else {
        Err(CamError::InvalidRadius(radius))
    }
}

impl Cam {
    /// Empty cam with default settings.
    pub fn new() -> Self {
        Self {
            profiles: SlotMap::with_key(),
            order: Vec::new(),
            speed: DEFAULT_SPEED,
            radius: DEFAULT_RADIUS,
            resolution: Resolution::default(),
            dirty: false,
            file_name: None,
        }
    }

    /// Empty cam with explicit settings.
    pub fn with_settings(speed: f64, radius: f64, resolution: Resolution) -> Result<Self> {
        check_speed(speed)?;
        check_radius(radius)?;
        Ok(Self {
            speed,
            radius,
            resolution,
            ..Self::new()
        })
    }

    /// Empty cam from configuration defaults.
    pub fn from_config(config: &CamConfig) -> Result<Self> {
        config.validate()?;
        Self::with_settings(config.cam.speed, config.cam.radius, config.resolution()?)
    }

    /// Append a profile, or a fresh one when `None`.
    ///
    /// An unlabeled profile is named `Cam {n}` with `n` one past the current
    /// number of profiles, so labels can repeat after deletions.
    pub fn add_cam(&mut self, profile: Option<CamProfile>) -> ProfileId {
        let mut profile = profile.unwrap_or_default();
        if profile.label().is_empty() {
            profile.set_label(format!("Cam {}", self.order.len() + 1));
        }
        debug!(label = profile.label(), "adding profile");
        self.insert_profile(profile)
    }

    /// Append a profile as is, without labeling.
    pub(crate) fn insert_profile(&mut self, profile: CamProfile) -> ProfileId {
        let id = self.profiles.insert(profile);
        self.order.push(id);
        self.dirty = true;
        id
    }

    /// Remove a profile.
    pub fn del_cam(&mut self, id: ProfileId) -> Result<CamProfile> {
        let index = self.index_of(id)?;
        self.order.remove(index);
        self.dirty = true;
        self.profiles.remove(id).ok_or(CamError::ProfileNotFound)
    }

    /// Swap in a new profile under an existing id, returning the old one.
    pub fn replace(&mut self, id: ProfileId, profile: CamProfile) -> Result<CamProfile> {
        let slot = self.profiles.get_mut(id).ok_or(CamError::ProfileNotFound)?;
        self.dirty = true;
        Ok(std::mem::replace(slot, profile))
    }

    /// Move the profile at `from` to position `to`.
    pub fn move_profile(&mut self, from: usize, to: usize) -> Result<()> {
        if from >= self.order.len() || to >= self.order.len() {
            return Err(CamError::ProfileNotFound);
        }
        let id = self.order.remove(from);
        self.order.insert(to, id);
        self.dirty = true;
        Ok(())
    }

    /// Position of a profile.
    pub fn index_of(&self, id: ProfileId) -> Result<usize> {
        self.order
            .iter()
            .position(|&p| p == id)
            .ok_or(CamError::ProfileNotFound)
    }

    /// Look up a profile.
    pub fn get(&self, id: ProfileId) -> Option<&CamProfile> {
        self.profiles.get(id)
    }

    /// Look up a profile for editing. Marks the cam dirty.
    pub fn get_mut(&mut self, id: ProfileId) -> Option<&mut CamProfile> {
        let profile = self.profiles.get_mut(id)?;
        self.dirty = true;
        Some(profile)
    }

    /// Profile ids in order.
    pub fn ids(&self) -> &[ProfileId] {
        &self.order
    }

    /// Profiles in order.
    pub fn iter(&self) -> impl Iterator<Item = (ProfileId, &CamProfile)> + '_ {
        self.order.iter().map(|&id| (id, &self.profiles[id]))
    }

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether there are no profiles.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Mirror every profile.
    pub fn mirror(&mut self) {
        for profile in self.profiles.values_mut() {
            profile.mirror(&self.resolution);
        }
        self.dirty = true;
    }

    /// Largest displacement over all profiles.
    pub fn max_displacement(&self) -> Result<f64> {
        self.iter()
            .map(|(_, p)| p.max_displacement())
            .reduce(f64::max)
            .ok_or(CamError::EmptyCam)
    }

    /// Speed in rpm.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Set the speed; must be > 0.
    pub fn set_speed(&mut self, speed: f64) -> Result<()> {
        check_speed(speed)?;
        self.speed = speed;
        self.dirty = true;
        Ok(())
    }

    /// Drum radius in mm.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Set the drum radius; must be > 0.
    pub fn set_radius(&mut self, radius: f64) -> Result<()> {
        check_radius(radius)?;
        self.radius = radius;
        self.dirty = true;
        Ok(())
    }

    /// Shared resolution.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Samples per degree.
    pub fn angle_steps(&self) -> u32 {
        self.resolution.angle_steps()
    }

    /// Samples per mm.
    pub fn displacement_steps(&self) -> u32 {
        self.resolution.displacement_steps()
    }

    /// Replace the shared resolution.
    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
        self.dirty = true;
    }

    /// Unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Set or clear the unsaved-changes flag.
    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// File the cam is saved to.
    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    /// Set the target file. Marks the cam dirty.
    pub fn set_file_name(&mut self, path: impl Into<PathBuf>) {
        self.file_name = Some(path.into());
        self.dirty = true;
    }

    pub(crate) fn mark_saved(&mut self, path: &Path) {
        self.file_name = Some(path.to_path_buf());
        self.dirty = false;
    }

    /// Arc length on the drum surface for `angle` degrees.
    pub fn arc_length(&self, angle: f64) -> f64 {
        angle * 2.0 * PI * self.radius / 360.0
    }

    /// Angular velocity in rad/s.
    pub fn angular_velocity(&self) -> f64 {
        self.speed * 2.0 * PI / 60.0
    }

    fn profile_mut(&mut self, id: ProfileId) -> Result<&mut CamProfile> {
        self.profiles.get_mut(id).ok_or(CamError::ProfileNotFound)
    }

    /// Profile with its laws normalized. Any law change marks the cam dirty.
    fn checked_profile(&mut self, id: ProfileId) -> Result<&mut CamProfile> {
        if self.profile_mut(id)?.check_cam() > 0 {
            self.dirty = true;
        }
        self.profile_mut(id)
    }

    /// Displacement curve of a profile at the cam resolution.
    pub fn polyline(&mut self, id: ProfileId, complete: bool) -> Result<Curve> {
        let steps = self.angle_steps();
        self.checked_profile(id)?.polyline(complete, steps)
    }

    /// Follower velocity in mm/s.
    pub fn velocity(&mut self, id: ProfileId) -> Result<Curve> {
        let (steps, omega) = (self.angle_steps(), self.angular_velocity());
        Ok(self.checked_profile(id)?.first_derivative(steps)?.scaled(omega))
    }

    /// Follower acceleration in mm/s².
    pub fn acceleration(&mut self, id: ProfileId) -> Result<Curve> {
        let (steps, omega) = (self.angle_steps(), self.angular_velocity());
        Ok(self
            .checked_profile(id)?
            .second_derivative(steps)?
            .scaled(omega * omega))
    }

    /// Slope of the track on the unrolled drum, in degrees.
    ///
    /// This is the pressure angle seen by a follower moving along the drum
    /// axis. It does not depend on speed.
    pub fn slope_angle(&mut self, id: ProfileId) -> Result<Curve> {
        let (steps, radius) = (self.angle_steps(), self.radius);
        Ok(self
            .checked_profile(id)?
            .first_derivative(steps)?
            .slope_angle(radius))
    }

    /// Displacement of `id` minus displacement of `reference`.
    pub fn distances(&mut self, reference: ProfileId, id: ProfileId) -> Result<Distances> {
        let base = self.polyline(reference, true)?;
        let curve = self.polyline(id, true)?;
        Distances::between(&base, &curve)
    }

    /// Distances of every other profile to the first one.
    ///
    /// Empty for a single profile.
    pub fn profile_distances(&mut self) -> Result<Vec<(ProfileId, Distances)>> {
        let (&reference, others) = self.order.split_first().ok_or(CamError::EmptyCam)?;
        let mut out = Vec::with_capacity(others.len());
        for id in others.to_vec() {
            out.push((id, self.distances(reference, id)?));
        }
        Ok(out)
    }

    /// Peak displacement, velocity, acceleration and slope of a profile.
    pub fn peak_kinematics(&mut self, id: ProfileId) -> Result<Kinematics> {
        let peak_velocity = self.velocity(id)?.peak();
        let peak_acceleration = self.acceleration(id)?.peak();
        let peak_slope = self.slope_angle(id)?.peak();
        let max_displacement = self
            .get(id)
            .ok_or(CamError::ProfileNotFound)?
            .max_displacement();
        Ok(Kinematics {
            max_displacement,
            peak_velocity,
            peak_acceleration,
            peak_slope,
        })
    }

    /// Profiles whose peak acceleration exceeds `limit` mm/s².
    pub fn acceleration_violations(&mut self, limit: f64) -> Result<Vec<(ProfileId, f64)>> {
        let mut over = Vec::new();
        for id in self.order.clone() {
            let peak = self.acceleration(id)?.peak();
            if peak > limit {
                let label = self.profiles[id].label();
                warn!(label, peak, limit, "acceleration limit exceeded");
                over.push((id, peak));
            }
        }
        Ok(over)
    }
}
