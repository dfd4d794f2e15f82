//! Row stride math for texture <-> buffer copies.
//!
//! wgpu requires every row of an image copy to start at a multiple of
//! `COPY_BYTES_PER_ROW_ALIGNMENT`, so the physical row length of a readback
//! buffer usually differs from the logical one.

use crate::error::{Result, SnapshotError};

pub const DEFAULT_BYTES_PER_PIXEL: u32 = 4;
pub const DEFAULT_ALIGNMENT: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SnapshotError::InvalidDimension { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPadding {
    /// Bytes of pixel data per row.
    pub unpadded: u32,
    /// Bytes per row including alignment padding.
    pub padded: u32,
}

impl RowPadding {
    /// Padding for a 4-byte-per-pixel row at the wgpu copy alignment.
    pub fn for_width(width: u32) -> Result<Self> {
        compute_row_padding(width, DEFAULT_BYTES_PER_PIXEL, DEFAULT_ALIGNMENT)
    }

    /// Size of a readback buffer holding `height` padded rows.
    pub fn buffer_size(&self, height: u32) -> u64 {
        self.padded as u64 * height as u64
    }

    /// Size of the same image once the padding has been stripped.
    pub fn packed_size(&self, height: u32) -> usize {
        self.unpadded as usize * height as usize
    }

    pub fn padding_bytes(&self) -> u32 {
        self.padded - self.unpadded
    }
}

pub fn compute_row_padding(width: u32, bytes_per_pixel: u32, alignment: u32) -> Result<RowPadding> {
    if width == 0 {
        return Err(SnapshotError::ZeroWidth);
    }
    if bytes_per_pixel == 0 {
        return Err(SnapshotError::InvalidLayout(
            "bytes per pixel must be non-zero".into(),
        ));
    }
    if alignment == 0 {
        return Err(SnapshotError::InvalidLayout(
            "alignment must be non-zero".into(),
        ));
    }
    let overflow = || SnapshotError::InvalidLayout(format!("row of {width} pixels overflows u32"));
    let unpadded = width.checked_mul(bytes_per_pixel).ok_or_else(overflow)?;
    let padded = unpadded
        .div_ceil(alignment)
        .checked_mul(alignment)
        .ok_or_else(overflow)?;
    Ok(RowPadding { unpadded, padded })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_rows_round_up_to_alignment() {
        let p = compute_row_padding(32, 4, 256).unwrap();
        assert_eq!(p.unpadded, 128);
        assert_eq!(p.padded, 256);
        assert_eq!(p.padding_bytes(), 128);
    }

    #[test]
    fn aligned_rows_are_untouched() {
        let p = compute_row_padding(64, 4, 256).unwrap();
        assert_eq!(p.unpadded, 256);
        assert_eq!(p.padded, 256);
    }

    #[test]
    fn padded_is_aligned_and_never_shorter() {
        for width in 1..=1100 {
            let p = RowPadding::for_width(width).unwrap();
            assert_eq!(p.padded % 256, 0, "width {width}");
            assert!(p.padded >= width * 4, "width {width}");
            assert!(p.padded - p.unpadded < 256, "width {width}");
        }
    }

    #[test]
    fn zero_width_is_rejected() {
        let err = compute_row_padding(0, 4, 256).unwrap_err();
        assert!(matches!(err, SnapshotError::ZeroWidth));
        assert!(!err.to_string().contains("x0"));
    }

    #[test]
    fn degenerate_layouts_are_rejected() {
        assert!(matches!(
            compute_row_padding(8, 0, 256),
            Err(SnapshotError::InvalidLayout(_))
        ));
        assert!(matches!(
            compute_row_padding(8, 4, 0),
            Err(SnapshotError::InvalidLayout(_))
        ));
    }

    #[test]
    fn sizes_scale_with_height() {
        let p = RowPadding::for_width(32).unwrap();
        assert_eq!(p.buffer_size(32), 8192);
        assert_eq!(p.packed_size(32), 4096);
    }

    #[test]
    fn dimensions_reject_zero() {
        assert!(Dimensions::new(0, 4).is_err());
        assert!(Dimensions::new(4, 0).is_err());
        assert_eq!(Dimensions::new(3, 5).unwrap().extent().depth_or_array_layers, 1);
    }
}
