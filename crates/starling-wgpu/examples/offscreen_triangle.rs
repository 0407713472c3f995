//! Offscreen Triangle - headless batch rendering
//!
//! Builds a batch with a colored triangle and an indexed quad, mirrors
//! it to the GPU, and replays the draws into an offscreen texture. No
//! window; run anywhere a GPU adapter exists.

use starling_core::logging;
use starling_graphics::{AttributeData, Batch, DrawMode, FormatSpec};
use starling_wgpu::{GpuContext, GpuMirror, PassSink, TransientStream, vertex, wgpu};

const SHADER: &str = r#"
struct VsOut {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) color: vec4<f32>) -> VsOut {
    var out: VsOut;
    out.position = vec4<f32>(position, 0.0, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

fn main() {
    logging::init();

    let ctx = GpuContext::new_sync().expect("Failed to create GPU context");
    tracing::info!(adapter = %ctx.info().name, "rendering offscreen");

    let mut batch = Batch::new();

    let tri_positions = [-0.8f32, -0.8, -0.2, -0.8, -0.5, 0.2];
    let tri_colors = [255u8, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255];
    batch
        .add(
            3,
            DrawMode::Triangles,
            None,
            &[
                ("v2f", AttributeData::from(&tri_positions)),
                ("c4B", AttributeData::from(&tri_colors)),
            ],
        )
        .expect("Failed to add triangle");

    let quad_positions = [0.2f32, -0.8, 0.8, -0.8, 0.8, 0.2, 0.2, 0.2];
    let quad_colors = [255u8, 255, 0, 255, 255, 255, 0, 255, 255, 255, 0, 255, 255, 255, 0, 255];
    batch
        .add_indexed(
            4,
            DrawMode::Triangles,
            &[0, 1, 2, 2, 3, 0],
            None,
            &[
                ("v2f", AttributeData::from(&quad_positions)),
                ("c4B", AttributeData::from(&quad_colors)),
            ],
        )
        .expect("Failed to add quad");

    // One single-attribute layout per buffer, locations in add() order.
    let position_spec = FormatSpec::parse("v2f").unwrap();
    let color_spec = FormatSpec::parse("c4B").unwrap();
    let position_attr = [vertex::vertex_attribute(&position_spec, 0).unwrap()];
    let color_attr = [vertex::vertex_attribute(&color_spec, 1).unwrap()];
    let layouts = [
        wgpu::VertexBufferLayout {
            array_stride: position_spec.stride_bytes() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &position_attr,
        },
        wgpu::VertexBufferLayout {
            array_stride: color_spec.stride_bytes() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &color_attr,
        },
    ];

    let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Offscreen Shader"),
        source: wgpu::ShaderSource::Wgsl(SHADER.into()),
    });

    let format = wgpu::TextureFormat::Rgba8Unorm;
    let pipeline = ctx
        .device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Offscreen Pipeline"),
            layout: None,
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &layouts,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(format.into())],
            }),
            primitive: wgpu::PrimitiveState {
                topology: vertex::topology(DrawMode::Triangles),
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Target"),
        size: wgpu::Extent3d {
            width: 512,
            height: 512,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let mut mirror = GpuMirror::new();
    mirror.sync(&ctx.device, &ctx.queue, &mut batch);
    tracing::info!(buffers = mirror.buffer_count(), "mirror synced");

    let mut transient = TransientStream::new(&ctx.device, 64 * 1024);
    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Offscreen Encoder"),
        });
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Offscreen Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                depth_slice: None,
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
        pass.set_pipeline(&pipeline);

        let mut sink = PassSink::new(&mut pass, &mirror, &ctx.queue, &mut transient);
        let stats = batch.draw(&mut sink);
        tracing::info!(
            draw_calls = stats.draw_calls,
            replayed = sink.draws(),
            skipped = sink.skipped(),
            "pass recorded"
        );
    }
    ctx.queue.submit(std::iter::once(encoder.finish()));
    let _ = ctx.device.poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: None,
    });

    tracing::info!("offscreen frame rendered");
}
