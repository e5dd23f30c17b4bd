//! Control points of a cam profile.

use std::cmp::Ordering;

use crate::error::{CamError, Result};
use crate::law::MotionLaw;
use crate::resolution::Resolution;

/// Angle of the point that closes every profile.
pub const FULL_TURN: f64 = 360.0;

/// A control point: where the motion law changes.
///
/// The law describes the segment that *ends* at this point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CamPoint {
    angle: f64,
    displacement: f64,
    law: MotionLaw,
}

fn check_angle(angle: f64) -> Result<()> {
    if angle > 0.0 && angle <= FULL_TURN {
        Ok(())
    } else {
        Err(CamError::InvalidAngle(angle))
    }
}

fn check_displacement(displacement: f64) -> Result<()> {
    if displacement >= 0.0 && displacement.is_finite() {
        Ok(())
    } else {
        Err(CamError::InvalidDisplacement(displacement))
    }
}

impl CamPoint {
    /// Create a point, validating ranges. Values are stored as given.
    pub fn new(angle: f64, displacement: f64, law: MotionLaw) -> Result<Self> {
        check_angle(angle)?;
        check_displacement(displacement)?;
        Ok(Self {
            angle,
            displacement,
            law,
        })
    }

    /// The 360 degree point with the given displacement.
    pub fn closing(displacement: f64) -> Result<Self> {
        Self::new(FULL_TURN, displacement, MotionLaw::Linear)
    }

    pub(crate) const fn closing_zero() -> Self {
        Self {
            angle: FULL_TURN,
            displacement: 0.0,
            law: MotionLaw::Linear,
        }
    }

    /// Reflection at `360 - angle` on the grid, carrying `law`.
    pub(crate) fn reflected(&self, law: MotionLaw, resolution: &Resolution) -> Self {
        Self {
            angle: resolution.reflect_angle(self.angle),
            displacement: self.displacement,
            law,
        }
    }

    pub(crate) fn with_law(mut self, law: MotionLaw) -> Self {
        self.law = law;
        self
    }

    /// Angle in degrees, in (0, 360].
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Displacement in mm.
    pub fn displacement(&self) -> f64 {
        self.displacement
    }

    /// Law of the segment ending here.
    pub fn law(&self) -> MotionLaw {
        self.law
    }

    /// Whether this is the 360 degree point.
    pub fn is_closing(&self) -> bool {
        self.angle == FULL_TURN
    }

    /// Set the angle, floored onto the angular grid.
    pub fn set_angle(&mut self, angle: f64, resolution: &Resolution) -> Result<()> {
        check_angle(angle)?;
        let snapped = resolution.quantize_angle(angle);
        // a tiny positive angle floors to zero
        check_angle(snapped)?;
        self.angle = snapped;
        Ok(())
    }

    /// Set the displacement. Not quantized.
    pub fn set_displacement(&mut self, displacement: f64) -> Result<()> {
        check_displacement(displacement)?;
        self.displacement = displacement;
        Ok(())
    }

    /// Set the law of the segment ending here.
    pub fn set_law(&mut self, law: MotionLaw) {
        self.law = law;
    }

    /// Set the law from its persisted code.
    pub fn set_law_code(&mut self, code: u8) -> Result<()> {
        self.law = MotionLaw::try_from(code)?;
        Ok(())
    }

    /// Shift both coordinates through the validating setters.
    ///
    /// The point is unchanged when either delta is rejected.
    pub fn move_by(
        &mut self,
        delta_angle: f64,
        delta_displacement: f64,
        resolution: &Resolution,
    ) -> Result<&mut Self> {
        let mut moved = *self;
        moved.set_angle(self.angle + delta_angle, resolution)?;
        moved.set_displacement(self.displacement + delta_displacement)?;
        *self = moved;
        Ok(self)
    }

    /// Add `delta` to the displacement.
    pub fn offset_displacement(&mut self, delta: f64) -> Result<&mut Self> {
        self.set_displacement(self.displacement + delta)?;
        Ok(self)
    }

    /// Total order by angle.
    pub fn cmp_angle(&self, other: &Self) -> Ordering {
        self.angle.total_cmp(&other.angle)
    }
}
