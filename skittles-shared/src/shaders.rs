/// Embedded WGSL shader source for the forward rendering pipeline.

pub const FORWARD: &str = include_str!("../shaders/forward.wgsl");
