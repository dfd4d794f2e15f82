use crate::error::{Result, SnapshotError};
use crate::padding::{compute_row_padding, Dimensions, DEFAULT_ALIGNMENT, DEFAULT_BYTES_PER_PIXEL};

/// Strips per-row padding from a buffer filled by a texture-to-buffer copy.
///
/// Row `i` of the input starts at `i * padded`; only its first `unpadded`
/// bytes are pixel data. The result is a fresh `unpadded * height` buffer.
pub fn reslice(buffer: &[u8], width: u32, height: u32, bytes_per_pixel: u32) -> Result<Vec<u8>> {
    reslice_aligned(buffer, width, height, bytes_per_pixel, DEFAULT_ALIGNMENT)
}

pub fn reslice_rgba(buffer: &[u8], dimensions: Dimensions) -> Result<Vec<u8>> {
    reslice(
        buffer,
        dimensions.width,
        dimensions.height,
        DEFAULT_BYTES_PER_PIXEL,
    )
}

/// Same as [`reslice`] with an explicit row alignment.
pub fn reslice_aligned(
    buffer: &[u8],
    width: u32,
    height: u32,
    bytes_per_pixel: u32,
    alignment: u32,
) -> Result<Vec<u8>> {
    if height == 0 {
        return Err(SnapshotError::InvalidDimension { width, height });
    }
    let padding = compute_row_padding(width, bytes_per_pixel, alignment)?;
    let padded = padding.padded as usize;
    let unpadded = padding.unpadded as usize;

    let expected = padded * height as usize;
    if buffer.len() < expected {
        return Err(SnapshotError::BufferTooSmall {
            expected,
            actual: buffer.len(),
        });
    }

    let mut out = Vec::with_capacity(padding.packed_size(height));
    for row in buffer[..expected].chunks_exact(padded) {
        out.extend_from_slice(&row[..unpadded]);
    }
    Ok(out)
}

/// Inverse of [`reslice_aligned`]: spreads tightly packed rows out to the
/// aligned stride, filling the gap after each row with `fill`.
pub fn pad_rows(
    packed: &[u8],
    width: u32,
    height: u32,
    bytes_per_pixel: u32,
    alignment: u32,
    fill: u8,
) -> Result<Vec<u8>> {
    if height == 0 {
        return Err(SnapshotError::InvalidDimension { width, height });
    }
    let padding = compute_row_padding(width, bytes_per_pixel, alignment)?;
    let padded = padding.padded as usize;
    let unpadded = padding.unpadded as usize;

    let expected = padding.packed_size(height);
    if packed.len() < expected {
        return Err(SnapshotError::BufferTooSmall {
            expected,
            actual: packed.len(),
        });
    }

    let mut out = vec![fill; padded * height as usize];
    for (dst, src) in out
        .chunks_exact_mut(padded)
        .zip(packed[..expected].chunks_exact(unpadded))
    {
        dst[..unpadded].copy_from_slice(src);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_row_bytes() {
        // 2x2 pixels of 1 byte each, padded to 4 bytes per row
        let buffer = [1, 2, 0xAA, 0xAA, 3, 4, 0xBB, 0xBB];
        let out = reslice_aligned(&buffer, 2, 2, 1, 4).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    #[test]
    fn ignores_bytes_past_the_last_row() {
        let mut buffer = vec![7u8; 256 * 2];
        buffer.extend_from_slice(&[9; 100]);
        let out = reslice(&buffer, 1, 2, 4).unwrap();
        assert_eq!(out, vec![7; 8]);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let err = reslice(&[0u8; 256 * 3 - 1], 2, 3, 4).unwrap_err();
        match err {
            SnapshotError::BufferTooSmall { expected, actual } => {
                assert_eq!(expected, 768);
                assert_eq!(actual, 767);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_height_is_rejected() {
        assert!(matches!(
            reslice(&[], 4, 0, 4),
            Err(SnapshotError::InvalidDimension { height: 0, .. })
        ));
    }

    #[test]
    fn pad_rows_fills_the_gap() {
        let out = pad_rows(&[1, 2, 3, 4], 2, 2, 1, 4, 0xEE).unwrap();
        assert_eq!(out, vec![1, 2, 0xEE, 0xEE, 3, 4, 0xEE, 0xEE]);
    }
}
