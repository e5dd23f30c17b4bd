//! Error types for the cam model.

use thiserror::Error;

/// Errors raised by cam model operations.
#[derive(Error, Debug)]
pub enum CamError {
    /// Angle outside (0, 360].
    #[error("angle {0} is outside (0, 360]")]
    InvalidAngle(f64),

    /// Negative or non-finite displacement.
    #[error("displacement {0} must be >= 0")]
    InvalidDisplacement(f64),

    /// Speed must be strictly positive.
    #[error("speed {0} must be > 0")]
    InvalidSpeed(f64),

    /// Drum radius must be strictly positive.
    #[error("radius {0} must be > 0")]
    InvalidRadius(f64),

    /// Resolution step counts must be strictly positive.
    #[error("step count {0} must be > 0")]
    InvalidSteps(u32),

    /// A physical dimension (height, depth) out of range.
    #[error("{name} {value} must be > 0")]
    InvalidDimension {
        /// Dimension name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Law code or name not implemented.
    #[error("unsupported motion law: {0}")]
    UnsupportedLaw(String),

    /// Point id is not a member of the profile.
    #[error("point not found in profile")]
    PointNotFound,

    /// Profile id is not a member of the cam.
    #[error("profile not found in cam")]
    ProfileNotFound,

    /// The 360 degree point closes the cycle and cannot be removed or moved.
    #[error("the closing point at 360 degrees cannot be removed or moved")]
    ClosingPoint,

    /// Operation needs at least one profile.
    #[error("cam has no profiles")]
    EmptyCam,

    /// Two curves do not share a sampling grid.
    #[error("curves are sampled on different grids")]
    MismatchedCurves,

    /// Segment boundary conditions have no solution.
    #[error("segment from {start} to {end} degrees is degenerate")]
    SingularSegment {
        /// Start angle of the segment.
        start: f64,
        /// End angle of the segment.
        end: f64,
    },

    /// File does not start with the cam magic number.
    #[error("unrecognized file format (magic {0})")]
    UnrecognizedFormat(u32),

    /// File format version is not supported.
    #[error("unrecognized file version {0}")]
    UnrecognizedVersion(u32),

    /// File body is truncated or inconsistent.
    #[error("corrupted cam file: {0}")]
    Corrupted(String),

    /// Save requested without a file name.
    #[error("no file name set")]
    NoFileName,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cam model operations.
pub type Result<T> = std::result::Result<T, CamError>;
