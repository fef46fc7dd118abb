//! Types shared between the Skittles renderer and the web runtime.

pub mod geometry;
pub mod math;
pub mod shaders;
pub mod uniforms;
