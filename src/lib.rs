//! Asset import pipeline and drawable scene graph for a 3D visualization
//! client: decoded model files are cached as GPU-ready resources, scenes
//! are instantiated as transform hierarchies with per-node materials, and
//! overlay primitives are drawn on top each frame.

pub mod asset;
pub mod cache;
pub mod camera;
pub mod graph;
pub mod primitive;
pub mod render;
