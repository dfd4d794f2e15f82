//! Per-test handle tying a store to one test's identity.

use std::path::{Path, PathBuf};

use crate::capture::Capture;
use crate::codec::encode_png;
use crate::error::Result;
use crate::gpu::HeadlessGpu;
use crate::store::{SnapshotMode, SnapshotStore, SnapshotValue, DEFAULT_EXTENSION};

pub const IMAGE_EXTENSION: &str = "png";

pub struct SnapshotTest<'a> {
    store: &'a SnapshotStore,
    source_file: PathBuf,
    name: String,
}

impl<'a> SnapshotTest<'a> {
    pub fn new(store: &'a SnapshotStore, source_file: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            store,
            source_file: source_file.into(),
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    pub fn assert_value(&self, value: &SnapshotValue) -> Result<PathBuf> {
        self.assert_value_in_mode(value, DEFAULT_EXTENSION, SnapshotMode::from_invocation())
    }

    pub fn assert_value_with_extension(
        &self,
        value: &SnapshotValue,
        extension: &str,
    ) -> Result<PathBuf> {
        self.assert_value_in_mode(value, extension, SnapshotMode::from_invocation())
    }

    pub fn assert_value_in_mode(
        &self,
        value: &SnapshotValue,
        extension: &str,
        mode: SnapshotMode,
    ) -> Result<PathBuf> {
        self.store
            .assert_or_update(value, &self.source_file, &self.name, extension, mode)
    }

    /// Reads back a submitted capture and asserts it as a PNG snapshot.
    pub fn assert_capture(&self, gpu: &HeadlessGpu, capture: &Capture) -> Result<PathBuf> {
        self.assert_capture_in_mode(gpu, capture, SnapshotMode::from_invocation())
    }

    pub fn assert_capture_in_mode(
        &self,
        gpu: &HeadlessGpu,
        capture: &Capture,
        mode: SnapshotMode,
    ) -> Result<PathBuf> {
        capture.layout().ensure_png_compatible()?;
        let rgba = capture.read(&gpu.device)?;
        let png = encode_png(&rgba, capture.dimensions())?;
        self.assert_value_in_mode(&SnapshotValue::Bytes(png), IMAGE_EXTENSION, mode)
    }
}
