use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use glam::Mat4;
use log::{error, warn};

use crate::{
    asset::{
        loader::ModelDecoder,
        node::{NodeInstance, NodeRecord},
        texture::TextureKind,
    },
    render::RenderBackend,
};

/// Material reduced to the diffuse model, with its texture index already
/// bounds-checked against the asset's texture list.
#[derive(Debug, Clone)]
pub struct MaterialSlot {
    pub diffuse_color: [f32; 4],
    pub diffuse_texture: Option<usize>,
}

/// One node of the cached asset's object tree. Every index stored here
/// was validated when the tree was copied in; an invalid index from the
/// decoder becomes `None` (or is dropped from `children`), never a fault.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub transform: Mat4,
    pub mesh: Option<usize>,
    pub material: Option<usize>,
    pub children: Vec<usize>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY,
            mesh: None,
            material: None,
            children: Vec::new(),
        }
    }
}

/// GPU-resident decoding of one imported model file. Owns every handle it
/// creates; slots are `None` where decoding or upload was rejected.
///
/// `root_nodes` is present only when the asset declares a default scene;
/// without it callers treat `meshes[0]` as a single flat drawable.
pub struct CachedAsset<B: RenderBackend> {
    pub textures: Vec<Option<B::TextureHandle>>,
    pub materials: Vec<Option<MaterialSlot>>,
    pub meshes: Vec<Option<B::MeshHandle>>,
    pub root_nodes: Option<Vec<usize>>,
    pub nodes: Vec<SceneNode>,
}

impl<B: RenderBackend> Default for CachedAsset<B> {
    fn default() -> Self {
        Self {
            textures: Vec::new(),
            materials: Vec::new(),
            meshes: Vec::new(),
            root_nodes: None,
            nodes: Vec::new(),
        }
    }
}

/// Process-lifetime cache mapping a file path to its GPU-resident asset.
/// Entries are never evicted.
pub struct AssetCache<D, B: RenderBackend> {
    decoder: D,
    entries: HashMap<PathBuf, CachedAsset<B>>,
}

impl<D: ModelDecoder, B: RenderBackend> AssetCache<D, B> {
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            entries: HashMap::new(),
        }
    }

    /// Import a model file, decoding and uploading on the first request
    /// for a path and returning the existing entry afterwards.
    ///
    /// A file that cannot be opened yields an entry with all arrays empty;
    /// callers treat that as "nothing to draw". The entry is keyed by path
    /// alone, so a file modified on disk after its first import keeps
    /// serving the stale entry (known limitation, no invalidation).
    pub fn import(&mut self, backend: &mut B, path: &Path) -> &CachedAsset<B> {
        if !self.entries.contains_key(path) {
            let asset = Self::build(&mut self.decoder, backend, path);
            self.entries.insert(path.to_path_buf(), asset);
        }
        &self.entries[path]
    }

    pub fn get(&self, path: &Path) -> Option<&CachedAsset<B>> {
        self.entries.get(path)
    }

    fn build(decoder: &mut D, backend: &mut B, path: &Path) -> CachedAsset<B> {
        if !decoder.open(path) {
            warn!("Cannot import {}, nothing will be drawn for it", path.display());
            return CachedAsset::default();
        }

        let textures: Vec<Option<B::TextureHandle>> = (0..decoder.texture_count())
            .map(|index| {
                let texture = match decoder.texture(index) {
                    Some(texture) if texture.kind == TextureKind::TwoDim => texture,
                    _ => {
                        warn!("Cannot load texture properties, skipping");
                        return None;
                    }
                };
                match decoder.image(texture.image) {
                    Some(image) if image.format.supported() => {
                        Some(backend.upload_texture(&image, &texture.sampler))
                    }
                    _ => {
                        warn!("Cannot load texture image, skipping");
                        None
                    }
                }
            })
            .collect();

        let materials: Vec<Option<MaterialSlot>> = (0..decoder.material_count())
            .map(|index| {
                let Some(record) = decoder.material(index) else {
                    warn!("Cannot load material, skipping");
                    return None;
                };
                let diffuse_texture = record.diffuse_texture.filter(|&texture| {
                    if texture < textures.len() {
                        true
                    } else {
                        warn!("Material texture index {} out of range, ignoring", texture);
                        false
                    }
                });
                Some(MaterialSlot {
                    diffuse_color: record.diffuse_color,
                    diffuse_texture,
                })
            })
            .collect();

        let meshes: Vec<Option<B::MeshHandle>> = (0..decoder.mesh_count())
            .map(|index| match decoder.mesh(index) {
                Some(record) if record.drawable() => Some(backend.compile_mesh(&record)),
                _ => {
                    warn!("Cannot load the mesh, skipping {}", path.display());
                    None
                }
            })
            .collect();

        let mut root_nodes = None;
        let mut nodes = Vec::new();
        if let Some(scene_index) = decoder.default_scene() {
            if let Some(scene) = decoder.scene(scene_index) {
                let node_count = decoder.node_count();
                nodes = (0..node_count)
                    .map(|index| match decoder.node(index) {
                        Some(record) => {
                            scene_node(record, meshes.len(), materials.len(), node_count)
                        }
                        None => {
                            warn!("Cannot import object, skipping");
                            SceneNode::default()
                        }
                    })
                    .collect();
                root_nodes = Some(checked_indices(scene.children, node_count, "root node"));
            } else {
                error!("Cannot load scene from {}", path.display());
            }
        }

        CachedAsset {
            textures,
            materials,
            meshes,
            root_nodes,
            nodes,
        }
    }
}

fn scene_node(
    record: NodeRecord,
    mesh_count: usize,
    material_count: usize,
    node_count: usize,
) -> SceneNode {
    let mesh = match record.instance {
        Some(NodeInstance::Mesh(index)) => {
            if index < mesh_count {
                Some(index)
            } else {
                warn!("Node mesh index {} out of range, ignoring", index);
                None
            }
        }
        _ => None,
    };
    let material = record.material.filter(|&index| {
        if index < material_count {
            true
        } else {
            warn!("Node material index {} out of range, ignoring", index);
            false
        }
    });
    SceneNode {
        transform: record.transform,
        mesh,
        material,
        children: checked_indices(record.children, node_count, "child"),
    }
}

fn checked_indices(indices: Vec<usize>, count: usize, what: &str) -> Vec<usize> {
    indices
        .into_iter()
        .filter(|&index| {
            if index < count {
                true
            } else {
                warn!("{} index {} out of range, ignoring", what, index);
                false
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use glam::Mat4;

    use super::*;
    use crate::{
        asset::{
            material::MaterialRecord,
            mesh::{MeshRecord, MeshTopology},
            node::NodeInstance,
            scene::SceneRecord,
            texture::{ImageFormat, ImageRecord, SamplerRecord, TextureRecord},
        },
        render::testing::RecordingBackend,
    };

    #[derive(Default)]
    pub(crate) struct StubDecoder {
        pub opens: usize,
        pub fail_open: bool,
        pub textures: Vec<Option<TextureRecord>>,
        pub images: Vec<Option<ImageRecord>>,
        pub materials: Vec<Option<MaterialRecord>>,
        pub meshes: Vec<Option<MeshRecord>>,
        pub default_scene: Option<usize>,
        pub scenes: Vec<SceneRecord>,
        pub nodes: Vec<Option<NodeRecord>>,
    }

    impl ModelDecoder for StubDecoder {
        fn open(&mut self, _path: &Path) -> bool {
            self.opens += 1;
            !self.fail_open
        }

        fn texture_count(&self) -> usize {
            self.textures.len()
        }

        fn texture(&self, index: usize) -> Option<TextureRecord> {
            self.textures.get(index)?.clone()
        }

        fn image(&self, index: usize) -> Option<ImageRecord> {
            self.images.get(index)?.clone()
        }

        fn material_count(&self) -> usize {
            self.materials.len()
        }

        fn material(&self, index: usize) -> Option<MaterialRecord> {
            self.materials.get(index)?.clone()
        }

        fn mesh_count(&self) -> usize {
            self.meshes.len()
        }

        fn mesh(&self, index: usize) -> Option<MeshRecord> {
            self.meshes.get(index)?.clone()
        }

        fn default_scene(&self) -> Option<usize> {
            self.default_scene
        }

        fn scene(&self, index: usize) -> Option<SceneRecord> {
            self.scenes.get(index).cloned()
        }

        fn node_count(&self) -> usize {
            self.nodes.len()
        }

        fn node(&self, index: usize) -> Option<NodeRecord> {
            self.nodes.get(index)?.clone()
        }
    }

    pub(crate) fn triangle() -> MeshRecord {
        MeshRecord {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            tex_coords: Vec::new(),
            indices: None,
            topology: MeshTopology::TriangleList,
        }
    }

    fn rgba_image() -> ImageRecord {
        ImageRecord {
            size: (2, 2),
            format: ImageFormat::Rgba8,
            data: vec![0xff; 16],
        }
    }

    fn node(
        instance: Option<NodeInstance>,
        material: Option<usize>,
        children: Vec<usize>,
    ) -> Option<NodeRecord> {
        Some(NodeRecord {
            transform: Mat4::IDENTITY,
            instance,
            material,
            children,
        })
    }

    #[test]
    fn import_is_idempotent() {
        let decoder = StubDecoder {
            meshes: vec![Some(triangle())],
            ..Default::default()
        };
        let mut cache = AssetCache::new(decoder);
        let mut backend = RecordingBackend::default();

        let path = Path::new("model.gltf");
        cache.import(&mut backend, path);
        cache.import(&mut backend, path);

        assert_eq!(cache.decoder.opens, 1);
        assert_eq!(backend.compiled_meshes, 1);
    }

    #[test]
    fn unreadable_file_degrades_to_empty_asset() {
        let _ = env_logger::builder().is_test(true).try_init();
        let decoder = StubDecoder {
            fail_open: true,
            meshes: vec![Some(triangle())],
            ..Default::default()
        };
        let mut cache = AssetCache::new(decoder);
        let mut backend = RecordingBackend::default();

        let asset = cache.import(&mut backend, Path::new("missing.gltf"));
        assert!(asset.textures.is_empty());
        assert!(asset.materials.is_empty());
        assert!(asset.meshes.is_empty());
        assert!(asset.nodes.is_empty());
        assert!(asset.root_nodes.is_none());
        assert_eq!(backend.compiled_meshes, 0);
    }

    #[test]
    fn rejects_non_2d_and_unsupported_textures() {
        let sampler = SamplerRecord::default();
        let decoder = StubDecoder {
            textures: vec![
                Some(TextureRecord {
                    kind: TextureKind::Other,
                    image: 0,
                    sampler: sampler.clone(),
                }),
                Some(TextureRecord {
                    kind: TextureKind::TwoDim,
                    image: 1,
                    sampler: sampler.clone(),
                }),
                Some(TextureRecord {
                    kind: TextureKind::TwoDim,
                    image: 0,
                    sampler,
                }),
                None,
            ],
            images: vec![
                Some(rgba_image()),
                Some(ImageRecord {
                    size: (2, 2),
                    format: ImageFormat::R8,
                    data: vec![0; 4],
                }),
            ],
            ..Default::default()
        };
        let mut cache = AssetCache::new(decoder);
        let mut backend = RecordingBackend::default();

        let asset = cache.import(&mut backend, Path::new("textures.gltf"));
        assert!(asset.textures[0].is_none(), "non-2D texture must be skipped");
        assert!(asset.textures[1].is_none(), "unsupported format must be skipped");
        assert!(asset.textures[2].is_some());
        assert!(asset.textures[3].is_none());
        assert_eq!(backend.uploaded_textures, 1);
    }

    #[test]
    fn mesh_without_normals_or_triangles_is_rejected() {
        let mut line = triangle();
        line.topology = MeshTopology::LineList;
        let mut no_normals = triangle();
        no_normals.normals.clear();

        let decoder = StubDecoder {
            meshes: vec![Some(triangle()), Some(no_normals), Some(line), None],
            ..Default::default()
        };
        let mut cache = AssetCache::new(decoder);
        let mut backend = RecordingBackend::default();

        let asset = cache.import(&mut backend, Path::new("meshes.gltf"));
        assert!(asset.meshes[0].is_some());
        assert!(asset.meshes[1].is_none());
        assert!(asset.meshes[2].is_none());
        assert!(asset.meshes[3].is_none());
    }

    #[test]
    fn out_of_range_indices_are_treated_as_absent() {
        let decoder = StubDecoder {
            meshes: vec![Some(triangle())],
            materials: vec![Some(MaterialRecord {
                diffuse_color: [0.5, 0.5, 0.5, 1.0],
                diffuse_texture: Some(7),
            })],
            default_scene: Some(0),
            scenes: vec![SceneRecord {
                children: vec![0, 9],
            }],
            nodes: vec![node(
                Some(NodeInstance::Mesh(5)),
                Some(8),
                vec![1, 42],
            ), node(Some(NodeInstance::Mesh(0)), Some(0), vec![])],
            ..Default::default()
        };
        let mut cache = AssetCache::new(decoder);
        let mut backend = RecordingBackend::default();

        let asset = cache.import(&mut backend, Path::new("dangling.gltf"));
        assert_eq!(asset.root_nodes.as_deref(), Some(&[0][..]));
        assert_eq!(asset.nodes[0].mesh, None);
        assert_eq!(asset.nodes[0].material, None);
        assert_eq!(asset.nodes[0].children, vec![1]);
        let material = asset.materials[0].as_ref().unwrap();
        assert_eq!(material.diffuse_texture, None);
    }

    #[test]
    fn missing_node_record_becomes_empty_node() {
        let decoder = StubDecoder {
            default_scene: Some(0),
            scenes: vec![SceneRecord { children: vec![0] }],
            nodes: vec![None],
            ..Default::default()
        };
        let mut cache = AssetCache::new(decoder);
        let mut backend = RecordingBackend::default();

        let asset = cache.import(&mut backend, Path::new("broken-node.gltf"));
        assert_eq!(asset.nodes.len(), 1);
        assert!(asset.nodes[0].mesh.is_none());
        assert!(asset.nodes[0].children.is_empty());
    }

    #[test]
    fn robot_scenario_builds_expected_slots() {
        // Two meshes (one without normals), one material referencing a
        // texture whose image fails to decode, two-node tree.
        let mut no_normals = triangle();
        no_normals.normals.clear();
        let decoder = StubDecoder {
            textures: vec![Some(TextureRecord {
                kind: TextureKind::TwoDim,
                image: 0,
                sampler: SamplerRecord::default(),
            })],
            images: vec![None],
            materials: vec![Some(MaterialRecord {
                diffuse_color: [0.8, 0.2, 0.2, 1.0],
                diffuse_texture: Some(0),
            })],
            meshes: vec![Some(triangle()), Some(no_normals)],
            default_scene: Some(0),
            scenes: vec![SceneRecord { children: vec![0] }],
            nodes: vec![
                node(Some(NodeInstance::Mesh(0)), Some(0), vec![1]),
                node(Some(NodeInstance::Mesh(1)), Some(0), vec![]),
            ],
            ..Default::default()
        };
        let mut cache = AssetCache::new(decoder);
        let mut backend = RecordingBackend::default();

        let asset = cache.import(&mut backend, Path::new("robot.dae"));
        assert!(asset.meshes[0].is_some());
        assert!(asset.meshes[1].is_none());
        assert!(asset.textures[0].is_none());
        let material = asset.materials[0].as_ref().unwrap();
        assert_eq!(material.diffuse_color, [0.8, 0.2, 0.2, 1.0]);
        assert_eq!(material.diffuse_texture, Some(0));
    }
}
