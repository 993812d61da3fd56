use glam::Mat4;
use log::warn;

use crate::{
    camera::Camera,
    render::{DrawParams, DrawStyle, RenderBackend},
};

mod populate;

pub use populate::{populate, resolve_style};

/// Handle to a transform node in the scene graph arena. Stale handles
/// (into a removed subtree) make the touched operation a logged no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Handle to a draw group: the set of drawables rendered together each
/// frame. Membership is what visibility toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

/// A renderable unit attached to one transform node and one draw group.
pub struct Drawable<B: RenderBackend> {
    pub mesh: B::MeshHandle,
    pub style: DrawStyle<B::TextureHandle>,
    group: GroupId,
    hidden: bool,
}

struct GraphNode<B: RenderBackend> {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: Mat4,
    drawable: Option<Drawable<B>>,
}

/// Live scene graph: an arena of transform nodes addressed by index, each
/// carrying a parent index, a children list and at most one drawable.
/// Drawables hold cloned (shared) GPU handles; the asset cache stays the
/// owner of the underlying resources.
pub struct SceneGraph<B: RenderBackend> {
    nodes: Vec<Option<GraphNode<B>>>,
    free: Vec<usize>,
    groups: Vec<Vec<NodeId>>,
    root: NodeId,
}

impl<B: RenderBackend> Default for SceneGraph<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: RenderBackend> SceneGraph<B> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(GraphNode {
                parent: None,
                children: Vec::new(),
                local: Mat4::IDENTITY,
                drawable: None,
            })],
            free: Vec::new(),
            groups: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn add_group(&mut self) -> GroupId {
        self.groups.push(Vec::new());
        GroupId(self.groups.len() - 1)
    }

    pub fn group_members(&self, group: GroupId) -> &[NodeId] {
        &self.groups[group.0]
    }

    /// Create a child transform node under `parent`.
    pub fn add_node(&mut self, parent: NodeId, local: Mat4) -> NodeId {
        let node = GraphNode {
            parent: Some(parent),
            children: Vec::new(),
            local,
            drawable: None,
        };
        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        };
        match self.nodes[parent.0].as_mut() {
            Some(parent) => parent.children.push(id),
            None => warn!("Adding node under removed parent #{}", parent.0),
        }
        id
    }

    pub fn local_transform(&self, node: NodeId) -> Option<Mat4> {
        Some(self.nodes.get(node.0)?.as_ref()?.local)
    }

    pub fn set_local_transform(&mut self, node: NodeId, local: Mat4) {
        match self.nodes.get_mut(node.0).and_then(Option::as_mut) {
            Some(node) => node.local = local,
            None => warn!("Setting transform on removed node #{}", node.0),
        }
    }

    /// Accumulated ancestor transforms × local transform.
    pub fn world_transform(&self, node: NodeId) -> Mat4 {
        let mut world = Mat4::IDENTITY;
        let mut current = Some(node);
        while let Some(id) = current {
            match self.nodes.get(id.0).and_then(Option::as_ref) {
                Some(node) => {
                    world = node.local * world;
                    current = node.parent;
                }
                None => {
                    warn!("World transform through removed node #{}", id.0);
                    break;
                }
            }
        }
        world
    }

    /// Attach a drawable to `node`, replacing any previous one. The
    /// drawable starts visible and joins `group` immediately.
    pub fn attach_drawable(
        &mut self,
        node: NodeId,
        mesh: B::MeshHandle,
        style: DrawStyle<B::TextureHandle>,
        group: GroupId,
    ) {
        let Some(slot) = self.nodes.get_mut(node.0).and_then(Option::as_mut) else {
            warn!("Attaching drawable to removed node #{}", node.0);
            return;
        };
        if let Some(old) = slot.drawable.take() {
            if !old.hidden {
                self.groups[old.group.0].retain(|&member| member != node);
            }
        }
        let slot = self.nodes[node.0].as_mut().unwrap();
        slot.drawable = Some(Drawable {
            mesh,
            style,
            group,
            hidden: false,
        });
        self.groups[group.0].push(node);
    }

    pub fn drawable(&self, node: NodeId) -> Option<&Drawable<B>> {
        self.nodes.get(node.0)?.as_ref()?.drawable.as_ref()
    }

    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.drawable(node).map_or(false, |drawable| drawable.hidden)
    }

    fn collect_subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut stack = vec![node];
        let mut collected = Vec::new();
        while let Some(id) = stack.pop() {
            let Some(entry) = self.nodes.get(id.0).and_then(Option::as_ref) else {
                continue;
            };
            collected.push(id);
            stack.extend(entry.children.iter().copied());
        }
        collected
    }

    /// Hide or show the drawables of `node` and its entire descendant
    /// subtree. Hiding removes each drawable from its draw group, showing
    /// re-inserts it; drawables already in the target state are left
    /// alone, so repeated calls are no-ops.
    pub fn set_hidden(&mut self, node: NodeId, hidden: bool) {
        for id in self.collect_subtree(node) {
            let entry = self.nodes[id.0].as_mut().unwrap();
            let Some(drawable) = entry.drawable.as_mut() else {
                continue;
            };
            if drawable.hidden == hidden {
                continue;
            }
            drawable.hidden = hidden;
            let group = drawable.group.0;
            if hidden {
                self.groups[group].retain(|&member| member != id);
            } else {
                self.groups[group].push(id);
            }
        }
    }

    /// Tear down a subtree: drop its nodes, drawables and group
    /// memberships. The root node cannot be removed.
    pub fn remove_subtree(&mut self, node: NodeId) {
        if node == self.root {
            warn!("Refusing to remove the scene graph root");
            return;
        }
        let subtree = self.collect_subtree(node);
        if let Some(parent) = self
            .nodes
            .get(node.0)
            .and_then(Option::as_ref)
            .and_then(|entry| entry.parent)
        {
            if let Some(parent) = self.nodes[parent.0].as_mut() {
                parent.children.retain(|&child| child != node);
            }
        }
        for id in subtree {
            if let Some(entry) = self.nodes[id.0].take() {
                if let Some(drawable) = entry.drawable {
                    if !drawable.hidden {
                        self.groups[drawable.group.0].retain(|&member| member != id);
                    }
                }
                self.free.push(id.0);
            }
        }
    }

    /// Draw every visible member of `group` with the current camera. One
    /// draw call per drawable: `view × world` transform, inverse-transpose
    /// normal matrix, the camera's projection, and the drawable's style.
    pub fn render(&self, group: GroupId, camera: &Camera, backend: &mut B) {
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();
        for &id in &self.groups[group.0] {
            let Some(entry) = self.nodes.get(id.0).and_then(Option::as_ref) else {
                continue;
            };
            let Some(drawable) = entry.drawable.as_ref() else {
                continue;
            };
            let params = DrawParams::for_world(
                view,
                projection,
                self.world_transform(id),
                drawable.style.clone(),
            );
            backend.draw_mesh(&drawable.mesh, &params);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::render::{
        testing::{RecordedMesh, RecordingBackend},
        DrawStyle, DEFAULT_COLOR,
    };

    fn mesh(id: usize) -> RecordedMesh {
        RecordedMesh { id, vertices: 3 }
    }

    fn colored() -> DrawStyle<usize> {
        DrawStyle::colored(DEFAULT_COLOR)
    }

    #[test]
    fn visibility_cascade_hides_and_restores_descendants() {
        let mut graph: SceneGraph<RecordingBackend> = SceneGraph::new();
        let group = graph.add_group();
        let root = graph.root();

        let a = graph.add_node(root, Mat4::IDENTITY);
        let b = graph.add_node(a, Mat4::IDENTITY);
        let c = graph.add_node(b, Mat4::IDENTITY);
        let outside = graph.add_node(root, Mat4::IDENTITY);
        graph.attach_drawable(a, mesh(0), colored(), group);
        graph.attach_drawable(b, mesh(1), colored(), group);
        graph.attach_drawable(c, mesh(2), colored(), group);
        graph.attach_drawable(outside, mesh(3), colored(), group);
        assert_eq!(graph.group_members(group).len(), 4);

        graph.set_hidden(a, true);
        assert_eq!(graph.group_members(group), &[outside]);
        assert!(graph.is_hidden(b));

        // Hiding twice is the same as hiding once.
        graph.set_hidden(a, true);
        assert_eq!(graph.group_members(group), &[outside]);

        graph.set_hidden(a, false);
        assert_eq!(graph.group_members(group).len(), 4);
        assert!(!graph.is_hidden(c));
    }

    #[test]
    fn render_draws_only_group_members() {
        let mut graph: SceneGraph<RecordingBackend> = SceneGraph::new();
        let group = graph.add_group();
        let other_group = graph.add_group();
        let root = graph.root();

        let a = graph.add_node(root, Mat4::IDENTITY);
        let b = graph.add_node(root, Mat4::IDENTITY);
        graph.attach_drawable(a, mesh(0), colored(), group);
        graph.attach_drawable(b, mesh(1), colored(), other_group);
        graph.set_hidden(b, true);

        let mut backend = RecordingBackend::default();
        let camera = Camera::default();
        graph.render(group, &camera, &mut backend);
        assert_eq!(backend.draws.len(), 1);
        assert_eq!(backend.draws[0].mesh, 0);

        backend.draws.clear();
        graph.render(other_group, &camera, &mut backend);
        assert!(backend.draws.is_empty());
    }

    #[test]
    fn world_transform_accumulates_ancestors() {
        let mut graph: SceneGraph<RecordingBackend> = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_node(root, Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        let b = graph.add_node(a, Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)));

        let world = graph.world_transform(b);
        let expected = Mat4::from_translation(Vec3::new(1.0, 2.0, 0.0));
        assert!(world.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn remove_subtree_clears_group_membership() {
        let mut graph: SceneGraph<RecordingBackend> = SceneGraph::new();
        let group = graph.add_group();
        let root = graph.root();
        let a = graph.add_node(root, Mat4::IDENTITY);
        let b = graph.add_node(a, Mat4::IDENTITY);
        let keep = graph.add_node(root, Mat4::IDENTITY);
        graph.attach_drawable(b, mesh(0), colored(), group);
        graph.attach_drawable(keep, mesh(1), colored(), group);

        graph.remove_subtree(a);
        assert_eq!(graph.group_members(group), &[keep]);
        assert!(graph.drawable(b).is_none());

        // Slots are recycled for later nodes.
        let replacement = graph.add_node(root, Mat4::IDENTITY);
        assert!(graph.local_transform(replacement).is_some());
    }
}
