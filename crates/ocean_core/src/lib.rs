//! Core math types shared by the underwater rendering stage.
//!
//! This crate provides the engine-independent pieces:
//! - Transform for camera placement
//! - Planes, bounding boxes and frustum plane extraction
//! - Order-2 spherical harmonics for ambient light probes

pub mod geometry;
pub mod sh;
pub mod transform;

pub use geometry::*;
pub use sh::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
