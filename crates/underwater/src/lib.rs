//! Underwater rendering stage: ocean mask pass, horizon line and post-process parameters.

pub mod ambient;
pub mod camera;
pub mod config;
pub mod effect;
pub mod gpu;
pub mod horizon;
pub mod lod;
pub mod mask;
pub mod post_process;
pub mod targets;
pub mod uniforms;
pub mod vertex;

pub use ambient::*;
pub use camera::*;
pub use config::*;
pub use effect::*;
pub use gpu::*;
pub use horizon::*;
pub use lod::*;
pub use mask::*;
pub use post_process::*;
pub use targets::*;
pub use uniforms::*;
pub use vertex::*;
