//! Skittles renderer.
//!
//! A single forward pass over opaque meshes, driven through `wgpu` so the same
//! code targets WebGPU and (via the `webgl` feature) WebGL2 canvases.

mod backend;
mod frame;
mod handle;
mod viewport;

pub use backend::ForwardRenderer;
pub use frame::{DirectionalLight, DrawItem, FrameView};
pub use handle::HandleStore;
pub use viewport::Viewport;
