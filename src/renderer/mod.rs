//! WebGPU rendering module
//!
//! The scene is tessellated on the CPU into vertex-colored triangles in
//! viewport pixels; the pipeline maps them to clip space and draws.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::{RenderError, RenderState};
pub use scene::build_frame;
pub use vertex::Vertex;
