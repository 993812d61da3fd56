use std::mem::size_of;

use bytemuck::{cast_slice, Pod, Zeroable};
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    vertex_attr_array, Buffer, BufferAddress, BufferUsages, Device, IndexFormat, PrimitiveTopology,
    RenderPass, VertexAttribute, VertexBufferLayout, VertexStepMode,
};

use crate::asset::mesh::{MeshRecord, MeshTopology};

pub trait Vertex: Copy + Clone + Pod + Zeroable {
    const ATTRIBS: &[VertexAttribute];

    fn desc<'a>() -> VertexBufferLayout<'a> {
        VertexBufferLayout {
            array_stride: size_of::<Self>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: Self::ATTRIBS,
        }
    }
}

/// The one vertex layout every pipeline consumes. Meshes without normals
/// or texture coordinates get zero-filled attributes that the flat and
/// color shaders simply never read.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for ModelVertex {
    const ATTRIBS: &[VertexAttribute] = &vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2
    ];
}

#[derive(Debug)]
pub struct GpuMesh {
    vertex_buffer: Buffer,
    index_buffer: Option<Buffer>,
    vertices: u32,
    indices: u32,
    topology: PrimitiveTopology,
}

impl GpuMesh {
    pub fn from_record(device: &Device, record: &MeshRecord) -> Self {
        let vertices: Vec<ModelVertex> = record
            .positions
            .iter()
            .enumerate()
            .map(|(i, position)| ModelVertex {
                position: *position,
                normal: record.normals.get(i).copied().unwrap_or([0.0; 3]),
                tex_coords: record.tex_coords.get(i).copied().unwrap_or([0.0; 2]),
            })
            .collect();
        let vertex_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("Mesh vertices"),
            contents: cast_slice(&vertices),
            usage: BufferUsages::VERTEX,
        });
        let index_buffer = record.indices.as_ref().map(|indices| {
            device.create_buffer_init(&BufferInitDescriptor {
                label: Some("Mesh indices"),
                contents: cast_slice(indices),
                usage: BufferUsages::INDEX,
            })
        });
        Self {
            vertex_buffer,
            index_buffer,
            vertices: vertices.len() as u32,
            indices: record.indices.as_ref().map_or(0, |indices| indices.len()) as u32,
            topology: match record.topology {
                MeshTopology::Points => PrimitiveTopology::PointList,
                MeshTopology::LineList => PrimitiveTopology::LineList,
                MeshTopology::LineStrip => PrimitiveTopology::LineStrip,
                MeshTopology::TriangleList => PrimitiveTopology::TriangleList,
                MeshTopology::TriangleStrip => PrimitiveTopology::TriangleStrip,
            },
        }
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    pub fn draw(&self, render_pass: &mut RenderPass) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        match &self.index_buffer {
            Some(index_buffer) => {
                render_pass.set_index_buffer(index_buffer.slice(..), IndexFormat::Uint32);
                render_pass.draw_indexed(0..self.indices, 0, 0..1);
            }
            None => render_pass.draw(0..self.vertices, 0..1),
        }
    }
}
