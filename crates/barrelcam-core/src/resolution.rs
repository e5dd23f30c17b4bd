//! Sampling and quantization grid shared by every profile of a cam.

use barrelcam_math::{grid_index, snap_down};

use crate::error::{CamError, Result};
use crate::point::FULL_TURN;

/// Default samples per degree.
pub const DEFAULT_ANGLE_STEPS: u32 = 10;
/// Default samples per millimeter.
pub const DEFAULT_DISPLACEMENT_STEPS: u32 = 10;

/// Angular and displacement resolution, in steps per degree and per mm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    angle_steps: u32,
    displacement_steps: u32,
}

impl Resolution {
    /// Build a resolution; both step counts must be > 0.
    pub fn new(angle_steps: u32, displacement_steps: u32) -> Result<Self> {
        if angle_steps == 0 {
            return Err(CamError::InvalidSteps(angle_steps));
        }
        if displacement_steps == 0 {
            return Err(CamError::InvalidSteps(displacement_steps));
        }
        Ok(Self {
            angle_steps,
            displacement_steps,
        })
    }

    /// Samples per degree.
    pub fn angle_steps(&self) -> u32 {
        self.angle_steps
    }

    /// Samples per millimeter.
    pub fn displacement_steps(&self) -> u32 {
        self.displacement_steps
    }

    /// Floor an angle onto the angular grid.
    pub fn quantize_angle(&self, angle: f64) -> f64 {
        snap_down(angle, self.angle_steps)
    }

    /// Reflect an angle to `360 - angle` on the angular grid.
    ///
    /// Works on grid indices so the result is bit-identical to what
    /// [`quantize_angle`](Self::quantize_angle) gives for the same grid
    /// point. The result stays inside (0, 360).
    pub fn reflect_angle(&self, angle: f64) -> f64 {
        let steps = i64::from(self.angle_steps);
        let full = steps * FULL_TURN as i64;
        let index = grid_index(angle, self.angle_steps).clamp(1, full - 1);
        (full - index) as f64 / f64::from(self.angle_steps)
    }

    /// Floor a displacement onto the displacement grid.
    pub fn quantize_displacement(&self, displacement: f64) -> f64 {
        snap_down(displacement, self.displacement_steps)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            angle_steps: DEFAULT_ANGLE_STEPS,
            displacement_steps: DEFAULT_DISPLACEMENT_STEPS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_steps() {
        assert!(matches!(Resolution::new(0, 10), Err(CamError::InvalidSteps(0))));
        assert!(Resolution::new(10, 0).is_err());
    }

    #[test]
    fn test_quantize() {
        let res = Resolution::new(2, 4).unwrap();
        assert_eq!(res.quantize_angle(10.74), 10.5);
        assert_eq!(res.quantize_displacement(3.3), 3.25);
    }

    #[test]
    fn test_reflect_angle_stays_on_grid() {
        let res = Resolution::default();
        assert_eq!(res.reflect_angle(232.2), res.quantize_angle(127.8));
        assert_eq!(res.reflect_angle(232.2), 127.8);
        for index in 1..3600 {
            let angle = res.quantize_angle(f64::from(index) / 10.0);
            let reflected = res.reflect_angle(angle);
            assert_eq!(reflected, res.quantize_angle(reflected), "angle {}", angle);
            assert_eq!(res.reflect_angle(reflected), angle);
        }
        assert_eq!(res.reflect_angle(359.99), 0.1);
    }
}
