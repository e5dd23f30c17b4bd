//! Defaults for new cams and exports, loaded from TOML or JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cam::{DEFAULT_RADIUS, DEFAULT_SPEED};
use crate::color::Color;
use crate::error::{CamError, Result};
use crate::profile::{CamProfile, DEFAULT_DEPTH, DEFAULT_HEIGHT};
use crate::resolution::{Resolution, DEFAULT_ANGLE_STEPS, DEFAULT_DISPLACEMENT_STEPS};

/// Drum settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CamSection {
    /// Drum radius in mm.
    pub radius: f64,
    /// Speed in rpm.
    pub speed: f64,
    /// Samples per degree.
    pub angle_steps: u32,
    /// Samples per mm.
    pub displacement_steps: u32,
}

impl Default for CamSection {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            speed: DEFAULT_SPEED,
            angle_steps: DEFAULT_ANGLE_STEPS,
            displacement_steps: DEFAULT_DISPLACEMENT_STEPS,
        }
    }
}

/// Defaults for new profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSection {
    /// Track height in mm.
    pub height: f64,
    /// Track depth in mm.
    pub depth: f64,
    /// Display colour.
    pub color: Color,
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self {
            height: DEFAULT_HEIGHT,
            depth: DEFAULT_DEPTH,
            color: Color::BLACK,
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// Every n-th polyline sample becomes a sweep path station.
    pub sweep_stride: usize,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self { sweep_stride: 10 }
    }
}

/// Design limits checked by `info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsSection {
    /// Largest acceptable follower acceleration in mm/s².
    pub max_acceleration: Option<f64>,
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CamConfig {
    /// Drum settings.
    pub cam: CamSection,
    /// New profile defaults.
    pub profile: ProfileSection,
    /// Export settings.
    pub export: ExportSection,
    /// Design limits.
    pub limits: LimitsSection,
}

impl CamConfig {
    /// Load from a `.toml` or `.json` file and validate.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .map_err(|e| CamError::Config(format!("invalid JSON config: {}", e)))?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)
                .map_err(|e| CamError::Config(format!("invalid TOML config: {}", e)))?
        } else {
            return Err(CamError::Config(
                "config file must be .json or .toml".to_string(),
            ));
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate and save as `.toml` or `.json`.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)
                .map_err(|e| CamError::Config(format!("failed to serialize config: {}", e)))?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)
                .map_err(|e| CamError::Config(format!("failed to serialize config: {}", e)))?
        } else {
            return Err(CamError::Config(
                "config file must be .json or .toml".to_string(),
            ));
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<()> {
        if !(self.cam.radius > 0.0) {
            return Err(CamError::Config("radius must be > 0".to_string()));
        }
        if !(self.cam.speed > 0.0) {
            return Err(CamError::Config("speed must be > 0".to_string()));
        }
        if self.cam.angle_steps == 0 || self.cam.displacement_steps == 0 {
            return Err(CamError::Config("step counts must be > 0".to_string()));
        }
        if !(self.profile.height > 0.0) || !(self.profile.depth > 0.0) {
            return Err(CamError::Config(
                "profile height and depth must be > 0".to_string(),
            ));
        }
        if self.export.sweep_stride == 0 {
            return Err(CamError::Config("sweep stride must be > 0".to_string()));
        }
        if self.limits.max_acceleration.is_some_and(|a| !(a > 0.0)) {
            return Err(CamError::Config(
                "max acceleration must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolution from the `[cam]` section.
    pub fn resolution(&self) -> Result<Resolution> {
        Resolution::new(self.cam.angle_steps, self.cam.displacement_steps)
    }

    /// Fresh profile with the `[profile]` defaults.
    pub fn new_profile(&self) -> Result<CamProfile> {
        let mut profile = CamProfile::with_dimensions(self.profile.height, self.profile.depth)?;
        profile.set_color(self.profile.color);
        Ok(profile)
    }
}
