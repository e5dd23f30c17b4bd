//! Error types for geometry export.

use barrelcam_core::CamError;
use thiserror::Error;

/// Errors that can occur while exporting a cam.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Nothing to export.
    #[error("cam has no profiles to export")]
    EmptyCam,

    /// Invalid export settings.
    #[error("invalid export settings: {0}")]
    InvalidSettings(String),

    /// Sampling the cam failed.
    #[error(transparent)]
    Cam(#[from] CamError),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
