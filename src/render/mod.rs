use glam::{Mat3, Mat4};

use crate::asset::{
    mesh::MeshRecord,
    texture::{ImageRecord, SamplerRecord},
};

pub mod wgpu;

/// Opaque white, used whenever the material fallback chain bottoms out.
pub const DEFAULT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// How a mesh is shaded for one draw call.
///
/// `Colored` and `Textured` are the two drawable styles the material
/// resolver can pick; `Flat` is the unlit path used by overlay lines and
/// the coordinate frame.
#[derive(Debug, Clone)]
pub enum DrawStyle<T> {
    Colored { color: [f32; 4] },
    Textured { texture: T },
    Flat { color: [f32; 4] },
}

impl<T> DrawStyle<T> {
    pub fn colored(color: [f32; 4]) -> Self {
        DrawStyle::Colored { color }
    }
}

/// Explicit per-call shading parameters. There is no shading state that
/// outlives a single `draw_mesh` call.
///
/// `transform` is already camera-relative (`view × world`); `normal` is
/// its inverse-transpose upper 3×3.
#[derive(Debug, Clone)]
pub struct DrawParams<T> {
    pub transform: Mat4,
    pub normal: Mat3,
    pub projection: Mat4,
    pub style: DrawStyle<T>,
}

impl<T> DrawParams<T> {
    /// Build parameters from a world transform and the camera's view and
    /// projection matrices, the one composition convention shared by
    /// imported geometry and overlay primitives.
    pub fn for_world(view: Mat4, projection: Mat4, world: Mat4, style: DrawStyle<T>) -> Self {
        let transform = view * world;
        Self {
            normal: Mat3::from_mat4(transform.inverse().transpose()),
            transform,
            projection,
            style,
        }
    }
}

/// The shading capability boundary: uploads resources and draws meshes.
/// This crate only sequences these calls; the math behind them is the
/// backend's business.
///
/// Handles are cheap to clone so the cache can own uploads for the
/// process lifetime while live scenes share them.
pub trait RenderBackend {
    type MeshHandle: Clone;
    type TextureHandle: Clone;

    fn upload_texture(&mut self, image: &ImageRecord, sampler: &SamplerRecord)
        -> Self::TextureHandle;
    fn compile_mesh(&mut self, mesh: &MeshRecord) -> Self::MeshHandle;
    fn draw_mesh(&mut self, mesh: &Self::MeshHandle, params: &DrawParams<Self::TextureHandle>);
}
