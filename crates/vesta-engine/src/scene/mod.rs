//! Scene-side value types: camera and geometry.

mod camera;
mod mesh;

pub use camera::{Camera, Ray};
pub use mesh::{Mesh, MeshData, Vertex};
