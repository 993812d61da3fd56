pub mod loader;
pub mod material;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod texture;
