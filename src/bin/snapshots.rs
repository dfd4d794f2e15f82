use std::path::PathBuf;

use plutonium_snapshot::capture::read_buffer;
use plutonium_snapshot::gpu::create_buffer_with_contents;
use plutonium_snapshot::{
    Capture, CaptureOptions, HeadlessGpu, SnapshotMode, SnapshotStore, SnapshotTest,
    SnapshotValue,
};

const TRIANGLE_SHADER: &str = r#"
@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    let x = f32(i32(index) - 1);
    let y = f32(i32(index & 1u) * 2 - 1);
    return vec4<f32>(x, y, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.0, 0.0, 1.0);
}
"#;

const STORAGE_SHADER: &str = r#"
@group(0) @binding(0)
var tex: texture_storage_2d<r32uint, write>;

@compute
@workgroup_size(1)
fn cs_main(@builtin(global_invocation_id) id: vec3<u32>) {
    let coord = (id.x & 0xFFu) | ((id.y & 0xFFu) << 8u);
    textureStore(tex, vec2<i32>(id.xy), vec4<u32>(coord, 0u, 0u, 0u));
}
"#;

fn source_file() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("snapshots")
        .join("scenes")
}

fn snapshot_clear(gpu: &HeadlessGpu, test: &SnapshotTest, mode: SnapshotMode) -> anyhow::Result<()> {
    let capture = Capture::new(&gpu.device, 32, 32, CaptureOptions::default())?;
    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("clear-encoder"),
        });
    {
        let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("clear-rpass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &capture.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::RED),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
    }
    capture.encode_copy(&mut encoder);
    gpu.submit(encoder);
    test.assert_capture_in_mode(gpu, &capture, mode)?;
    Ok(())
}

fn snapshot_triangle(
    gpu: &HeadlessGpu,
    test: &SnapshotTest,
    mode: SnapshotMode,
) -> anyhow::Result<()> {
    let format = wgpu::TextureFormat::Rgba8Unorm;
    let capture = Capture::new(&gpu.device, 32, 32, CaptureOptions::with_format(format))?;

    let shader = gpu
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("triangle-shader"),
            source: wgpu::ShaderSource::Wgsl(TRIANGLE_SHADER.into()),
        });
    let pipeline = gpu
        .device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("triangle-pipeline"),
            layout: None,
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("triangle-encoder"),
        });
    {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("triangle-rpass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &capture.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        rpass.set_pipeline(&pipeline);
        rpass.draw(0..3, 0..1);
    }
    capture.encode_copy(&mut encoder);
    gpu.submit(encoder);
    test.assert_capture_in_mode(gpu, &capture, mode)?;
    Ok(())
}

fn snapshot_texture_storage(
    gpu: &HeadlessGpu,
    test: &SnapshotTest,
    mode: SnapshotMode,
) -> anyhow::Result<()> {
    let capture = Capture::new(
        &gpu.device,
        8,
        8,
        CaptureOptions {
            format: Some(wgpu::TextureFormat::R32Uint),
            usage: Some(wgpu::TextureUsages::STORAGE_BINDING),
            ..CaptureOptions::default()
        },
    )?;

    let shader = gpu
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("storage-shader"),
            source: wgpu::ShaderSource::Wgsl(STORAGE_SHADER.into()),
        });
    let pipeline = gpu
        .device
        .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("storage-pipeline"),
            layout: None,
            module: &shader,
            entry_point: Some("cs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });
    let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("storage-bg"),
        layout: &pipeline.get_bind_group_layout(0),
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::TextureView(&capture.view),
        }],
    });

    let dims = capture.dimensions();
    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("storage-encoder"),
        });
    {
        let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("storage-cpass"),
            timestamp_writes: None,
        });
        cpass.set_pipeline(&pipeline);
        cpass.set_bind_group(0, &bind_group, &[]);
        cpass.dispatch_workgroups(dims.width, dims.height, 1);
    }
    capture.encode_copy(&mut encoder);
    gpu.submit(encoder);

    let packed = capture.read(&gpu.device)?;
    test.assert_value_in_mode(&SnapshotValue::Bytes(packed), "snap", mode)?;
    Ok(())
}

fn snapshot_copy_buffer(
    gpu: &HeadlessGpu,
    test: &SnapshotTest,
    mode: SnapshotMode,
) -> anyhow::Result<()> {
    let src = create_buffer_with_contents(
        &gpu.device,
        Some("copy-src"),
        wgpu::BufferUsages::COPY_SRC,
        &[0, 1, 2, 3],
    );
    let dst = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("copy-dst"),
        size: 4,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("copy-encoder"),
        });
    encoder.copy_buffer_to_buffer(&src, 0, &dst, 0, 4);
    gpu.submit(encoder);

    let bytes = read_buffer(&gpu.device, &dst)?;
    test.assert_value_in_mode(&SnapshotValue::structured(&bytes)?, "snap", mode)?;
    Ok(())
}

type Scenario = fn(&HeadlessGpu, &SnapshotTest, SnapshotMode) -> anyhow::Result<()>;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let mode = SnapshotMode::from_invocation();
    let gpu = HeadlessGpu::new()?;
    let store = SnapshotStore::new();
    let source = source_file();

    let scenarios: [(&str, Scenario); 4] = [
        ("clear", snapshot_clear),
        ("triangle", snapshot_triangle),
        ("texture storage", snapshot_texture_storage),
        ("copy buffer", snapshot_copy_buffer),
    ];

    let mut failures = Vec::new();
    for (name, run) in scenarios {
        let test = SnapshotTest::new(&store, &source, name);
        match run(&gpu, &test, mode) {
            Ok(()) => println!("{name} snapshot OK"),
            Err(e) => {
                println!("{name} snapshot FAILED: {e}");
                failures.push(name);
            }
        }
    }

    if !failures.is_empty() {
        anyhow::bail!("{} snapshot(s) failed: {}", failures.len(), failures.join(", "));
    }
    Ok(())
}
