#![warn(missing_docs)]

//! Barrel cam profile model.
//!
//! A [`Cam`] owns ordered [`CamProfile`]s on one drum. Each profile is a set
//! of [`CamPoint`]s sorted by angle and closed at 360°, where every point
//! carries the [`MotionLaw`] of the segment that ends at it. Profiles solve
//! each segment in closed form and sample it into displacement, first
//! derivative and second derivative [`Curve`]s.
//!
//! # Example
//!
//! ```
//! use barrelcam_core::{Cam, CamPoint, CamProfile, MotionLaw};
//!
//! let mut profile = CamProfile::new();
//! profile.add_point(CamPoint::new(90.0, 0.0, MotionLaw::Linear)?);
//! profile.add_point(CamPoint::new(180.0, 10.0, MotionLaw::Sinusoidal)?);
//! profile.check_cam();
//!
//! let mut cam = Cam::new();
//! let id = cam.add_cam(Some(profile));
//! let last = cam.polyline(id, true)?.iter().last().unwrap();
//! assert_eq!(last.angle, 360.0);
//! # Ok::<(), barrelcam_core::CamError>(())
//! ```

pub mod cam;
pub mod color;
pub mod config;
pub mod curve;
pub mod error;
pub mod law;
pub mod persist;
pub mod point;
pub mod profile;
pub mod resolution;
pub mod segment;

pub use cam::{Cam, Kinematics, ProfileId};
pub use color::Color;
pub use config::CamConfig;
pub use curve::{Curve, Distances, Sample};
pub use error::{CamError, Result};
pub use law::MotionLaw;
pub use point::{CamPoint, FULL_TURN};
pub use profile::{AddOutcome, CamProfile, PointId};
pub use resolution::Resolution;
pub use segment::{CurveKind, Segment, SegmentFn};
