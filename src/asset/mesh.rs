/// Raw mesh geometry produced by a decoding collaborator or a procedural
/// shape generator.
///
/// `tex_coords` may be empty when the mesh carries no UVs; the backend
/// zero-fills them. `normals` must be index-aligned with `positions` for
/// the mesh to be compiled (the shading path requires them).
#[derive(Debug, Clone, Default)]
pub struct MeshRecord {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Option<Vec<u32>>,
    pub topology: MeshTopology,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MeshTopology {
    Points,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

impl MeshRecord {
    /// Whether the geometry satisfies the shading capability's
    /// requirements: triangle topology and per-vertex normals.
    pub fn drawable(&self) -> bool {
        self.topology == MeshTopology::TriangleList
            && !self.positions.is_empty()
            && self.normals.len() == self.positions.len()
    }
}
