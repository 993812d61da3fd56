/// Raw material description produced by a decoding collaborator.
///
/// Only the diffuse-color / diffuse-texture model is carried; a decoder
/// returns `None` for materials it cannot express in this shape and the
/// cache leaves the slot empty.
#[derive(Debug, Clone)]
pub struct MaterialRecord {
    pub diffuse_color: [f32; 4],
    pub diffuse_texture: Option<usize>,
}
