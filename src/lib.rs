//! Snapshot testing for wgpu-rendered output.
//!
//! A [`Capture`] renders into a texture and copies it to a readback buffer
//! whose rows are padded to the wgpu copy alignment. [`reslice()`] strips that
//! padding, and [`SnapshotStore`] records or compares the result against a
//! file under `__snapshots__` next to the test source.

pub mod capture;
pub mod codec;
pub mod error;
pub mod gpu;
pub mod harness;
pub mod padding;
pub mod reslice;
pub mod resolver;
pub mod store;

pub use capture::{Capture, CaptureLayout, CaptureOptions};
pub use error::{Result, SnapshotError};
pub use gpu::HeadlessGpu;
pub use harness::SnapshotTest;
pub use padding::{compute_row_padding, Dimensions, RowPadding};
pub use reslice::{pad_rows, reslice, reslice_rgba};
pub use resolver::{slugify, SnapshotContext, SnapshotKey};
pub use store::{SnapshotMode, SnapshotStore, SnapshotValue};
