use std::{collections::HashMap, sync::Arc};

use wgpu::{
    include_wgsl, BindGroupLayout, BlendComponent, BlendState, ColorTargetState, ColorWrites,
    CompareFunction, DepthBiasState, DepthStencilState, Device, Face, FragmentState, FrontFace,
    MultisampleState, PipelineLayoutDescriptor, PolygonMode, PrimitiveState, PrimitiveTopology,
    RenderPipeline, RenderPipelineDescriptor, ShaderModule, StencilState, TextureFormat,
    VertexState,
};

use super::{
    depth_texture::DEPTH_TEXTURE_FORMAT,
    mesh::{ModelVertex, Vertex},
};

/// Which shading program a draw call runs. `Color` and `Texture` are the
/// lit paths the material resolver picks between; `Flat` is the unlit
/// overlay path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderType {
    Color,
    Texture,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineIdentifier {
    pub shader: ShaderType,
    pub topology: PrimitiveTopology,
}

/// Lazily built pipeline cache keyed by shader and primitive topology.
pub struct Pipelines {
    color_shader: ShaderModule,
    texture_shader: ShaderModule,
    flat_shader: ShaderModule,
    target_format: TextureFormat,
    items: HashMap<PipelineIdentifier, Arc<RenderPipeline>>,
}

impl Pipelines {
    pub fn new(device: &Device, target_format: TextureFormat) -> Self {
        Self {
            color_shader: device.create_shader_module(include_wgsl!("../../shader/color_shader.wgsl")),
            texture_shader: device
                .create_shader_module(include_wgsl!("../../shader/texture_shader.wgsl")),
            flat_shader: device.create_shader_module(include_wgsl!("../../shader/flat_shader.wgsl")),
            target_format,
            items: HashMap::new(),
        }
    }

    fn build(
        &self,
        device: &Device,
        draw_uniform_layout: &BindGroupLayout,
        texture_layout: &BindGroupLayout,
        identifier: PipelineIdentifier,
    ) -> RenderPipeline {
        let shader_module = match identifier.shader {
            ShaderType::Color => &self.color_shader,
            ShaderType::Texture => &self.texture_shader,
            ShaderType::Flat => &self.flat_shader,
        };
        let bind_group_layouts: &[_] = match identifier.shader {
            ShaderType::Color | ShaderType::Flat => &[draw_uniform_layout],
            ShaderType::Texture => &[draw_uniform_layout, texture_layout],
        };
        let label = format!("{:?}", identifier);
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(&label),
            bind_group_layouts,
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: shader_module,
                entry_point: "vs_main",
                compilation_options: Default::default(),
                buffers: &[ModelVertex::desc()],
            },
            fragment: Some(FragmentState {
                module: shader_module,
                entry_point: "fs_main",
                compilation_options: Default::default(),
                targets: &[Some(ColorTargetState {
                    format: self.target_format,
                    blend: Some(BlendState {
                        color: BlendComponent::REPLACE,
                        alpha: BlendComponent::REPLACE,
                    }),
                    write_mask: ColorWrites::all(),
                })],
            }),
            primitive: PrimitiveState {
                topology: identifier.topology,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: Some(Face::Back),
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_TEXTURE_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    pub fn get(
        &mut self,
        device: &Device,
        draw_uniform_layout: &BindGroupLayout,
        texture_layout: &BindGroupLayout,
        identifier: PipelineIdentifier,
    ) -> Arc<RenderPipeline> {
        if let Some(item) = self.items.get(&identifier) {
            return item.clone();
        }
        let item = Arc::new(self.build(device, draw_uniform_layout, texture_layout, identifier));
        self.items.insert(identifier, item.clone());
        item
    }
}
