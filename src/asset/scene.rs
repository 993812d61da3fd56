/// A decoded scene: the indices of its top-level nodes.
#[derive(Debug, Clone)]
pub struct SceneRecord {
    pub children: Vec<usize>,
}
