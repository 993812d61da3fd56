use glam::Mat4;

use crate::{
    cache::CachedAsset,
    render::{DrawStyle, RenderBackend, DEFAULT_COLOR},
};

use super::{GroupId, NodeId, SceneGraph};

/// Decide how a node's mesh is shaded, degrading step by step: no (or
/// unloadable) material → default color; material without texture → its
/// diffuse color; material whose texture failed to load → default color;
/// otherwise the loaded texture. A mesh with a valid handle is therefore
/// always drawable in some style.
pub fn resolve_style<B: RenderBackend>(
    asset: &CachedAsset<B>,
    material: Option<usize>,
) -> DrawStyle<B::TextureHandle> {
    let Some(slot) = material
        .and_then(|index| asset.materials.get(index))
        .and_then(Option::as_ref)
    else {
        return DrawStyle::colored(DEFAULT_COLOR);
    };
    match slot.diffuse_texture {
        None => DrawStyle::colored(slot.diffuse_color),
        Some(index) => match asset.textures.get(index).and_then(Option::as_ref) {
            Some(texture) => DrawStyle::Textured {
                texture: texture.clone(),
            },
            None => DrawStyle::colored(DEFAULT_COLOR),
        },
    }
}

/// Instantiate a cached asset's node tree under `parent`, attaching a
/// drawable into `group` for every node with a loaded mesh.
///
/// Assets without a scene declaration fall back to a single
/// default-colored drawable for `meshes[0]`, directly under `parent` with
/// no transform offset.
pub fn populate<B: RenderBackend>(
    graph: &mut SceneGraph<B>,
    asset: &CachedAsset<B>,
    parent: NodeId,
    group: GroupId,
) {
    match &asset.root_nodes {
        Some(roots) => {
            for &index in roots {
                populate_node(graph, asset, parent, group, index);
            }
        }
        None => {
            if let Some(mesh) = asset.meshes.first().and_then(Option::as_ref) {
                let node = graph.add_node(parent, Mat4::IDENTITY);
                graph.attach_drawable(node, mesh.clone(), DrawStyle::colored(DEFAULT_COLOR), group);
            }
        }
    }
}

fn populate_node<B: RenderBackend>(
    graph: &mut SceneGraph<B>,
    asset: &CachedAsset<B>,
    parent: NodeId,
    group: GroupId,
    index: usize,
) {
    let Some(record) = asset.nodes.get(index) else {
        return;
    };
    let node = graph.add_node(parent, record.transform);
    if let Some(mesh) = record
        .mesh
        .and_then(|mesh| asset.meshes.get(mesh))
        .and_then(Option::as_ref)
    {
        graph.attach_drawable(node, mesh.clone(), resolve_style(asset, record.material), group);
    }
    for &child in &record.children {
        populate_node(graph, asset, node, group, child);
    }
}
