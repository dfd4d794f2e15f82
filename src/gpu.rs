use wgpu::util::DeviceExt;

use crate::error::{Result, SnapshotError};
use crate::padding::{Dimensions, DEFAULT_ALIGNMENT};
use crate::reslice::pad_rows;

/// Windowless device used to render snapshot scenes.
pub struct HeadlessGpu {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl HeadlessGpu {
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .ok_or(SnapshotError::NoAdapter)?;
        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("snapshot-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    pub fn submit(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(Some(encoder.finish()));
    }
}

/// Closes the innermost error scope on `device`, turning a captured
/// validation error into [`SnapshotError::Device`].
pub fn pop_validation_scope(device: &wgpu::Device) -> Result<()> {
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => {
            log::warn!("device validation error: {err}");
            Err(SnapshotError::Device(err.to_string()))
        }
        None => Ok(()),
    }
}

/// Buffer sizes must be a non-zero multiple of 4 to be mapped at creation.
pub fn padded_contents_size(len: usize) -> u64 {
    (len.max(1) as u64).div_ceil(4) * 4
}

/// Creates a buffer initialised with `contents`, rounded up to 4 bytes.
pub fn create_buffer_with_contents(
    device: &wgpu::Device,
    label: Option<&str>,
    usage: wgpu::BufferUsages,
    contents: &[u8],
) -> wgpu::Buffer {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label,
        size: padded_contents_size(contents.len()),
        usage,
        mapped_at_creation: true,
    });
    {
        let mut view = buffer.slice(..).get_mapped_range_mut();
        view[..contents.len()].copy_from_slice(contents);
    }
    buffer.unmap();
    buffer
}

/// Uploads tightly packed texel data into a new 2D texture.
///
/// Rows go through a staging buffer at the aligned stride, so any format
/// with a single copy size works.
pub fn create_texture_with_data(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: Option<&str>,
    dimensions: Dimensions,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
    data: &[u8],
) -> Result<wgpu::Texture> {
    let bytes_per_pixel = format
        .block_copy_size(None)
        .ok_or(SnapshotError::UnsupportedFormat(format))?;
    let staging = pad_rows(
        data,
        dimensions.width,
        dimensions.height,
        bytes_per_pixel,
        DEFAULT_ALIGNMENT,
        0,
    )?;
    let bytes_per_row = staging.len() as u32 / dimensions.height;

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label,
        size: dimensions.extent(),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: usage | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let staging_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("texture-upload-staging"),
        contents: &staging,
        usage: wgpu::BufferUsages::COPY_SRC,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("texture-upload"),
    });
    encoder.copy_buffer_to_texture(
        wgpu::ImageCopyBuffer {
            buffer: &staging_buf,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(dimensions.height),
            },
        },
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        dimensions.extent(),
    );
    queue.submit(Some(encoder.finish()));
    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_size_rounds_to_four() {
        assert_eq!(padded_contents_size(0), 4);
        assert_eq!(padded_contents_size(1), 4);
        assert_eq!(padded_contents_size(4), 4);
        assert_eq!(padded_contents_size(5), 8);
        assert_eq!(padded_contents_size(12), 12);
    }
}
