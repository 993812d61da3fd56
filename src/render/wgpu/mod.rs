use std::{iter, sync::Arc};

use bytemuck::{bytes_of, Pod, Zeroable};
use log::warn;
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingType, BufferBindingType, BufferUsages, Color, CommandEncoder,
    CommandEncoderDescriptor, Device, LoadOp, Operations, Queue, RenderPass,
    RenderPassColorAttachment, RenderPassDepthStencilAttachment, RenderPassDescriptor,
    SamplerBindingType, ShaderStages, StoreOp, TextureFormat, TextureSampleType, TextureView,
    TextureViewDimension,
};

use super::{DrawParams, DrawStyle, RenderBackend, DEFAULT_COLOR};
use crate::asset::{
    mesh::MeshRecord,
    texture::{ImageRecord, SamplerRecord},
};

mod depth_texture;
mod mesh;
mod pipeline;
mod texture;

pub use depth_texture::DEPTH_TEXTURE_FORMAT;
pub use mesh::GpuMesh;
pub use texture::mip_level_count;

use depth_texture::DepthTexture;
use pipeline::{PipelineIdentifier, Pipelines, ShaderType};

/// Per-draw shading parameters as the shaders see them. `normal` is a
/// mat3x3 with 16-byte column stride.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct DrawUniform {
    projection: [[f32; 4]; 4],
    transform: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
    color: [f32; 4],
}

struct FrameState {
    encoder: CommandEncoder,
    render_pass: RenderPass<'static>,
}

/// The wgpu rendition of the shading capability. One render pass per
/// frame; each draw call binds its own uniform buffer, so no shading
/// state leaks between calls.
pub struct WgpuBackend {
    device: Device,
    queue: Queue,
    draw_uniform_layout: BindGroupLayout,
    texture_layout: BindGroupLayout,
    pipelines: Pipelines,
    depth_texture: DepthTexture,
    frame: Option<FrameState>,
}

impl WgpuBackend {
    pub fn new(device: Device, queue: Queue, target_format: TextureFormat, size: (u32, u32)) -> Self {
        let draw_uniform_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("Draw Uniform Bind Group Layout"),
        });
        let texture_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        multisampled: false,
                        view_dimension: TextureViewDimension::D2,
                        sample_type: TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("Texture Bind Group Layout"),
        });
        let pipelines = Pipelines::new(&device, target_format);
        let depth_texture = DepthTexture::new(&device, size);
        Self {
            device,
            queue,
            draw_uniform_layout,
            texture_layout,
            pipelines,
            depth_texture,
            frame: None,
        }
    }

    pub fn resize(&mut self, size: (u32, u32)) {
        if self.depth_texture.size() != size {
            self.depth_texture = DepthTexture::new(&self.device, size);
        }
    }

    /// Open the frame's render pass, clearing color and depth. Draw calls
    /// record into it until `end_frame`.
    pub fn begin_frame(&mut self, target: &TextureView) {
        if self.frame.is_some() {
            warn!("begin_frame while a frame is open, submitting the previous one");
            self.end_frame();
        }
        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        let render_pass = encoder
            .begin_render_pass(&RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color {
                            r: 0.1,
                            g: 0.1,
                            b: 0.1,
                            a: 1.0,
                        }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: self.depth_texture.texture_view(),
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            })
            .forget_lifetime();
        self.frame = Some(FrameState {
            encoder,
            render_pass,
        });
    }

    /// Close the pass and submit the frame's commands.
    pub fn end_frame(&mut self) {
        let Some(frame) = self.frame.take() else {
            warn!("end_frame without an open frame");
            return;
        };
        drop(frame.render_pass);
        self.queue.submit(iter::once(frame.encoder.finish()));
    }
}

impl RenderBackend for WgpuBackend {
    type MeshHandle = Arc<GpuMesh>;
    type TextureHandle = Arc<BindGroup>;

    fn upload_texture(&mut self, image: &ImageRecord, sampler: &SamplerRecord) -> Arc<BindGroup> {
        Arc::new(texture::upload(
            &self.device,
            &self.queue,
            &self.texture_layout,
            image,
            sampler,
        ))
    }

    fn compile_mesh(&mut self, mesh: &MeshRecord) -> Arc<GpuMesh> {
        Arc::new(GpuMesh::from_record(&self.device, mesh))
    }

    fn draw_mesh(&mut self, mesh: &Arc<GpuMesh>, params: &DrawParams<Arc<BindGroup>>) {
        if self.frame.is_none() {
            warn!("draw_mesh outside begin_frame/end_frame, dropping the call");
            return;
        }

        let (shader, color, texture) = match &params.style {
            DrawStyle::Colored { color } => (ShaderType::Color, *color, None),
            DrawStyle::Textured { texture } => {
                (ShaderType::Texture, DEFAULT_COLOR, Some(texture.clone()))
            }
            DrawStyle::Flat { color } => (ShaderType::Flat, *color, None),
        };
        let pipeline = self.pipelines.get(
            &self.device,
            &self.draw_uniform_layout,
            &self.texture_layout,
            PipelineIdentifier {
                shader,
                topology: mesh.topology(),
            },
        );

        let uniform = DrawUniform {
            projection: params.projection.to_cols_array_2d(),
            transform: params.transform.to_cols_array_2d(),
            normal: [
                params.normal.x_axis.extend(0.0).to_array(),
                params.normal.y_axis.extend(0.0).to_array(),
                params.normal.z_axis.extend(0.0).to_array(),
            ],
            color,
        };
        let uniform_buffer = self.device.create_buffer_init(&BufferInitDescriptor {
            label: Some("Draw Uniform"),
            contents: bytes_of(&uniform),
            usage: BufferUsages::UNIFORM,
        });
        let uniform_bind_group = self.device.create_bind_group(&BindGroupDescriptor {
            layout: &self.draw_uniform_layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("Draw Uniform Bind Group"),
        });

        let frame = self.frame.as_mut().unwrap();
        frame.render_pass.set_pipeline(&pipeline);
        frame.render_pass.set_bind_group(0, &uniform_bind_group, &[]);
        if let Some(texture) = &texture {
            frame.render_pass.set_bind_group(1, texture.as_ref(), &[]);
        }
        mesh.draw(&mut frame.render_pass);
    }
}
