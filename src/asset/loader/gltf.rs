use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    path::Path,
};

use glam::Mat4;
use gltf::{
    image::Format,
    mesh::Mode,
    texture::{MagFilter as GltfMagFilter, MinFilter as GltfMinFilter, WrappingMode},
};
use log::warn;

use crate::asset::{
    material::MaterialRecord,
    mesh::{MeshRecord, MeshTopology},
    node::{NodeInstance, NodeRecord},
    scene::SceneRecord,
    texture::{
        ImageFormat, ImageRecord, MagFilter, MinFilter, MipmapFilter, SamplerRecord, TextureKind,
        TextureRecord, WrapMode,
    },
};

use super::ModelDecoder;

#[derive(Debug)]
pub enum GltfDecodeError {
    Gltf(gltf::Error),
}

impl Display for GltfDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GltfDecodeError::Gltf(err) => Display::fmt(&err, f),
        }
    }
}

impl Error for GltfDecodeError {}

impl From<gltf::Error> for GltfDecodeError {
    fn from(value: gltf::Error) -> Self {
        GltfDecodeError::Gltf(value)
    }
}

/// Decoding collaborator backed by the `gltf` crate.
///
/// Everything is materialized at `open` time; the accessors only index
/// into the decoded arrays. glTF attaches materials to primitives rather
/// than nodes, so each primitive becomes one mesh record and nodes whose
/// mesh has several primitives get synthesized, identity-transform child
/// records carrying the per-primitive material index.
#[derive(Default)]
pub struct GltfDecoder {
    decoded: Option<Decoded>,
}

struct Decoded {
    textures: Vec<TextureRecord>,
    images: Vec<Option<ImageRecord>>,
    materials: Vec<Option<MaterialRecord>>,
    meshes: Vec<Option<MeshRecord>>,
    nodes: Vec<Option<NodeRecord>>,
    scenes: Vec<SceneRecord>,
    default_scene: Option<usize>,
}

fn image_format(format: Format) -> Option<ImageFormat> {
    match format {
        Format::R8 => Some(ImageFormat::R8),
        Format::R8G8 => Some(ImageFormat::Rg8),
        Format::R8G8B8 => Some(ImageFormat::Rgb8),
        Format::R8G8B8A8 => Some(ImageFormat::Rgba8),
        Format::R16 => Some(ImageFormat::R16),
        Format::R16G16 => Some(ImageFormat::Rg16),
        Format::R16G16B16 => Some(ImageFormat::Rgb16),
        Format::R16G16B16A16 => Some(ImageFormat::Rgba16),
        Format::R32G32B32FLOAT | Format::R32G32B32A32FLOAT => None,
    }
}

fn sampler_record(sampler: gltf::texture::Sampler) -> SamplerRecord {
    let (min_filter, mipmap_filter) = sampler
        .min_filter()
        .map(|filter| match filter {
            GltfMinFilter::Nearest => (MinFilter::Nearest, MipmapFilter::default()),
            GltfMinFilter::Linear => (MinFilter::Linear, MipmapFilter::default()),
            GltfMinFilter::NearestMipmapNearest => (MinFilter::Nearest, MipmapFilter::Nearest),
            GltfMinFilter::LinearMipmapNearest => (MinFilter::Linear, MipmapFilter::Nearest),
            GltfMinFilter::NearestMipmapLinear => (MinFilter::Nearest, MipmapFilter::Linear),
            GltfMinFilter::LinearMipmapLinear => (MinFilter::Linear, MipmapFilter::Linear),
        })
        .unwrap_or_default();

    fn wrap_mode(mode: WrappingMode) -> WrapMode {
        match mode {
            WrappingMode::ClampToEdge => WrapMode::ClampToEdge,
            WrappingMode::MirroredRepeat => WrapMode::MirroredRepeat,
            WrappingMode::Repeat => WrapMode::Repeat,
        }
    }

    SamplerRecord {
        mag_filter: sampler
            .mag_filter()
            .map(|filter| match filter {
                GltfMagFilter::Nearest => MagFilter::Nearest,
                GltfMagFilter::Linear => MagFilter::Linear,
            })
            .unwrap_or_default(),
        min_filter,
        mipmap_filter,
        wrap_x: wrap_mode(sampler.wrap_s()),
        wrap_y: wrap_mode(sampler.wrap_t()),
    }
}

fn primitive_record(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
) -> Option<MeshRecord> {
    let topology = match primitive.mode() {
        Mode::Points => MeshTopology::Points,
        Mode::Lines => MeshTopology::LineList,
        Mode::LineStrip => MeshTopology::LineStrip,
        Mode::Triangles => MeshTopology::TriangleList,
        Mode::TriangleStrip => MeshTopology::TriangleStrip,
        mode => {
            warn!("Unsupported primitive mode {:?}, skipping", mode);
            return None;
        }
    };
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &*data.0));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let normals = reader
        .read_normals()
        .map(|normals| normals.collect())
        .unwrap_or_default();
    let tex_coords = reader
        .read_tex_coords(0)
        .map(|coords| coords.into_f32().collect())
        .unwrap_or_default();
    let indices = reader.read_indices().map(|indices| indices.into_u32().collect());
    Some(MeshRecord {
        positions,
        normals,
        tex_coords,
        indices,
        topology,
    })
}

impl Decoded {
    fn build(document: &gltf::Document, buffers: &[gltf::buffer::Data], images: &[gltf::image::Data]) -> Self {
        let images: Vec<Option<ImageRecord>> = images
            .iter()
            .map(|image| {
                let format = image_format(image.format)?;
                Some(ImageRecord {
                    size: (image.width, image.height),
                    format,
                    data: image.pixels.clone(),
                })
            })
            .collect();

        let textures = document
            .textures()
            .map(|texture| TextureRecord {
                kind: TextureKind::TwoDim,
                image: texture.source().index(),
                sampler: sampler_record(texture.sampler()),
            })
            .collect();

        let materials = document
            .materials()
            .filter(|material| material.index().is_some())
            .map(|material| {
                let pbr = material.pbr_metallic_roughness();
                Some(MaterialRecord {
                    diffuse_color: pbr.base_color_factor(),
                    diffuse_texture: pbr
                        .base_color_texture()
                        .map(|info| info.texture().index()),
                })
            })
            .collect();

        // One mesh record per primitive; remember which records and
        // materials each glTF mesh flattened into.
        let mut meshes = Vec::new();
        let mut flattened: Vec<Vec<(usize, Option<usize>)>> = Vec::new();
        for mesh in document.meshes() {
            let mut records = Vec::new();
            for primitive in mesh.primitives() {
                records.push((meshes.len(), primitive.material().index()));
                meshes.push(primitive_record(&primitive, buffers));
            }
            flattened.push(records);
        }

        let mut nodes: Vec<Option<NodeRecord>> = document
            .nodes()
            .map(|node| {
                let instance = node
                    .camera()
                    .map(|camera| NodeInstance::Camera(camera.index()));
                Some(NodeRecord {
                    transform: Mat4::from_cols_array_2d(&node.transform().matrix()),
                    instance,
                    material: None,
                    children: node.children().map(|child| child.index()).collect(),
                })
            })
            .collect();
        for node in document.nodes() {
            let Some(mesh) = node.mesh() else { continue };
            match flattened[mesh.index()].as_slice() {
                [] => {}
                [(record, material)] => {
                    let target = nodes[node.index()].as_mut().unwrap();
                    target.instance = Some(NodeInstance::Mesh(*record));
                    target.material = *material;
                }
                records => {
                    for (record, material) in records {
                        let child = nodes.len();
                        nodes.push(Some(NodeRecord {
                            transform: Mat4::IDENTITY,
                            instance: Some(NodeInstance::Mesh(*record)),
                            material: *material,
                            children: Vec::new(),
                        }));
                        nodes[node.index()].as_mut().unwrap().children.push(child);
                    }
                }
            }
        }

        let scenes = document
            .scenes()
            .map(|scene| SceneRecord {
                children: scene.nodes().map(|node| node.index()).collect(),
            })
            .collect();

        Decoded {
            textures,
            images,
            materials,
            meshes,
            nodes,
            scenes,
            default_scene: document.default_scene().map(|scene| scene.index()),
        }
    }
}

impl GltfDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_open(&mut self, path: &Path) -> Result<(), GltfDecodeError> {
        let (document, buffers, images) = gltf::import(path)?;
        self.decoded = Some(Decoded::build(&document, &buffers, &images));
        Ok(())
    }
}

impl ModelDecoder for GltfDecoder {
    fn open(&mut self, path: &Path) -> bool {
        self.decoded = None;
        match self.try_open(path) {
            Ok(()) => true,
            Err(err) => {
                warn!("Cannot open {}: {}", path.display(), err);
                false
            }
        }
    }

    fn texture_count(&self) -> usize {
        self.decoded.as_ref().map_or(0, |d| d.textures.len())
    }

    fn texture(&self, index: usize) -> Option<TextureRecord> {
        self.decoded.as_ref()?.textures.get(index).cloned()
    }

    fn image(&self, index: usize) -> Option<ImageRecord> {
        self.decoded.as_ref()?.images.get(index)?.clone()
    }

    fn material_count(&self) -> usize {
        self.decoded.as_ref().map_or(0, |d| d.materials.len())
    }

    fn material(&self, index: usize) -> Option<MaterialRecord> {
        self.decoded.as_ref()?.materials.get(index)?.clone()
    }

    fn mesh_count(&self) -> usize {
        self.decoded.as_ref().map_or(0, |d| d.meshes.len())
    }

    fn mesh(&self, index: usize) -> Option<MeshRecord> {
        self.decoded.as_ref()?.meshes.get(index)?.clone()
    }

    fn default_scene(&self) -> Option<usize> {
        self.decoded.as_ref()?.default_scene
    }

    fn scene(&self, index: usize) -> Option<SceneRecord> {
        self.decoded.as_ref()?.scenes.get(index).cloned()
    }

    fn node_count(&self) -> usize {
        self.decoded.as_ref().map_or(0, |d| d.nodes.len())
    }

    fn node(&self, index: usize) -> Option<NodeRecord> {
        self.decoded.as_ref()?.nodes.get(index)?.clone()
    }
}
