use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("invalid dimensions {width}x{height}: width and height must be non-zero")]
    InvalidDimension { width: u32, height: u32 },

    #[error("invalid row width 0: rows must hold at least one pixel")]
    ZeroWidth,

    #[error("invalid row layout: {0}")]
    InvalidLayout(String),

    #[error("buffer too small: need {expected} bytes, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },

    #[error("texture format {0:?} has no single copy size")]
    UnsupportedFormat(wgpu::TextureFormat),

    #[error("snapshot missing at {}; rerun with --update or UPDATE_SNAPSHOTS=1 to record it", path.display())]
    SnapshotMissing { path: PathBuf },

    #[error(
        "snapshot length mismatch at {}: expected {expected}, got {actual}",
        path.display()
    )]
    SnapshotLengthMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error(
        "snapshot content mismatch at {} byte {offset}: expected {expected}, got {actual}",
        path.display()
    )]
    SnapshotContentMismatch {
        path: PathBuf,
        offset: usize,
        expected: u8,
        actual: u8,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("buffer map failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("buffer map callback was dropped before completing")]
    MapAborted,

    #[error("device validation failed: {0}")]
    Device(String),

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

impl SnapshotError {
    /// True for the three assertion failures, as opposed to setup or I/O errors.
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            SnapshotError::SnapshotMissing { .. }
                | SnapshotError::SnapshotLengthMismatch { .. }
                | SnapshotError::SnapshotContentMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SnapshotError>;
