use glam::Mat4;

/// One node of a decoded asset's object tree. All indices reference the
/// decoder's flat arrays and are validated by the cache when the tree is
/// copied in.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub transform: Mat4,
    pub instance: Option<NodeInstance>,
    pub material: Option<usize>,
    pub children: Vec<usize>,
}

/// What a node instantiates. Non-mesh instances are kept so a decoder can
/// report them faithfully; the cache only acts on `Mesh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeInstance {
    Mesh(usize),
    Camera(usize),
    Light(usize),
}
