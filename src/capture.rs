//! Offscreen render targets paired with a readback buffer.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, SnapshotError};
use crate::gpu::pop_validation_scope;
use crate::padding::{compute_row_padding, Dimensions, RowPadding, DEFAULT_ALIGNMENT};
use crate::reslice::reslice_aligned;

pub const DEFAULT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureOptions {
    pub format: Option<wgpu::TextureFormat>,
    /// Row alignment override; wgpu itself only accepts multiples of 256.
    pub alignment: Option<u32>,
    /// Extra texture usages on top of render attachment and copy source.
    pub usage: Option<wgpu::TextureUsages>,
}

impl CaptureOptions {
    pub fn with_format(format: wgpu::TextureFormat) -> Self {
        Self {
            format: Some(format),
            ..Self::default()
        }
    }
}

/// Sizing of a capture, independent of any device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureLayout {
    pub dimensions: Dimensions,
    pub format: wgpu::TextureFormat,
    pub bytes_per_pixel: u32,
    pub alignment: u32,
    pub padding: RowPadding,
    pub usage: wgpu::TextureUsages,
}

impl CaptureLayout {
    pub fn new(width: u32, height: u32, options: &CaptureOptions) -> Result<Self> {
        let dimensions = Dimensions::new(width, height)?;
        let format = options.format.unwrap_or(DEFAULT_FORMAT);
        let bytes_per_pixel = format
            .block_copy_size(None)
            .ok_or(SnapshotError::UnsupportedFormat(format))?;
        let alignment = options.alignment.unwrap_or(DEFAULT_ALIGNMENT);
        if alignment == 0 || alignment % DEFAULT_ALIGNMENT != 0 {
            return Err(SnapshotError::InvalidLayout(format!(
                "row alignment {alignment} is not a multiple of {DEFAULT_ALIGNMENT}"
            )));
        }
        let padding = compute_row_padding(width, bytes_per_pixel, alignment)?;
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::TEXTURE_BINDING
            | options.usage.unwrap_or(wgpu::TextureUsages::empty());
        Ok(Self {
            dimensions,
            format,
            bytes_per_pixel,
            alignment,
            padding,
            usage,
        })
    }

    /// Stride the texture-to-buffer copy must use.
    pub fn bytes_per_row(&self) -> u32 {
        self.padding.padded
    }

    pub fn buffer_size(&self) -> u64 {
        self.padding.buffer_size(self.dimensions.height)
    }

    pub fn texture_descriptor(&self) -> wgpu::TextureDescriptor<'static> {
        wgpu::TextureDescriptor {
            label: Some("capture-target"),
            size: self.dimensions.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: self.usage,
            view_formats: &[],
        }
    }

    pub fn buffer_descriptor(&self) -> wgpu::BufferDescriptor<'static> {
        wgpu::BufferDescriptor {
            label: Some("capture-output"),
            size: self.buffer_size(),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }
    }

    /// PNG snapshots hold exactly four bytes per pixel.
    pub fn ensure_png_compatible(&self) -> Result<()> {
        if self.bytes_per_pixel != 4 {
            return Err(SnapshotError::UnsupportedFormat(self.format));
        }
        Ok(())
    }

    pub fn copy_layout(&self) -> wgpu::ImageDataLayout {
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(self.bytes_per_row()),
            rows_per_image: Some(self.dimensions.height),
        }
    }
}

pub struct Capture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub buffer: wgpu::Buffer,
    layout: CaptureLayout,
    scope_open: AtomicBool,
}

impl Capture {
    /// Allocates the target and readback buffer and opens a validation error
    /// scope on `device`. The scope stays open across rendering, copy and
    /// submission and is closed by [`Capture::read`].
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        options: CaptureOptions,
    ) -> Result<Self> {
        let layout = CaptureLayout::new(width, height, &options)?;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = device.create_texture(&layout.texture_descriptor());
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let buffer = device.create_buffer(&layout.buffer_descriptor());
        log::debug!(
            "capture {}x{} {:?}, {} bytes per row",
            width,
            height,
            layout.format,
            layout.bytes_per_row()
        );
        Ok(Self {
            texture,
            view,
            buffer,
            layout,
            scope_open: AtomicBool::new(true),
        })
    }

    pub fn layout(&self) -> &CaptureLayout {
        &self.layout
    }

    pub fn dimensions(&self) -> Dimensions {
        self.layout.dimensions
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.layout.bytes_per_row()
    }

    /// Records the copy of the render target into the readback buffer.
    pub fn encode_copy(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.buffer,
                layout: self.layout.copy_layout(),
            },
            self.layout.dimensions.extent(),
        );
    }

    /// Maps the readback buffer and returns the pixels with row padding removed.
    ///
    /// Fails with [`SnapshotError::Device`] if anything recorded since
    /// [`Capture::new`] failed validation; the buffer is not read in that case.
    pub fn read(&self, device: &wgpu::Device) -> Result<Vec<u8>> {
        if self.scope_open.swap(false, Ordering::SeqCst) {
            pop_validation_scope(device)?;
        }
        let layout = self.layout;
        map_read(device, &self.buffer, |data| {
            reslice_aligned(
                data,
                layout.dimensions.width,
                layout.dimensions.height,
                layout.bytes_per_pixel,
                layout.alignment,
            )
        })?
    }
}

/// Copies the full contents of a `MAP_READ` buffer to the host.
pub fn read_buffer(device: &wgpu::Device, buffer: &wgpu::Buffer) -> Result<Vec<u8>> {
    map_read(device, buffer, |data| data.to_vec())
}

/// Maps `buffer` for reading, blocks until the device has made it visible,
/// hands the mapped bytes to `f` and unmaps.
pub fn map_read<R>(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
    f: impl FnOnce(&[u8]) -> R,
) -> Result<R> {
    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |r| {
        tx.send(r).ok();
    });
    device.poll(wgpu::Maintain::Wait);
    rx.recv().map_err(|_| SnapshotError::MapAborted)??;

    let out = {
        let view = slice.get_mapped_range();
        f(&view)
    };
    buffer.unmap();
    Ok(out)
}
