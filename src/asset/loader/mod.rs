use std::path::Path;

use super::{
    material::MaterialRecord,
    mesh::MeshRecord,
    node::NodeRecord,
    scene::SceneRecord,
    texture::{ImageRecord, TextureRecord},
};

pub mod gltf;

/// The decoding collaborator: turns a model file into flat lists of raw
/// texture, material and mesh records plus an index-based node tree.
///
/// Every accessor returns `None` for records that failed to decode; the
/// cache converts those into empty slots and keeps going. Accessors are
/// only meaningful after `open` has returned `true` for some path, and
/// refer to that path until the next `open` call.
pub trait ModelDecoder {
    fn open(&mut self, path: &Path) -> bool;

    fn texture_count(&self) -> usize;
    fn texture(&self, index: usize) -> Option<TextureRecord>;
    fn image(&self, index: usize) -> Option<ImageRecord>;

    fn material_count(&self) -> usize;
    fn material(&self, index: usize) -> Option<MaterialRecord>;

    fn mesh_count(&self) -> usize;
    fn mesh(&self, index: usize) -> Option<MeshRecord>;

    fn default_scene(&self) -> Option<usize>;
    fn scene(&self, index: usize) -> Option<SceneRecord>;
    fn node_count(&self) -> usize;
    fn node(&self, index: usize) -> Option<NodeRecord>;
}
