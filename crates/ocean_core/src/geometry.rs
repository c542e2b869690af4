//! Planes, axis-aligned boxes and frustum culling.

use glam::{Mat4, Vec3, Vec4};

/// Half-space `normal · p + distance >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    /// Build from raw `(a, b, c, d)` coefficients, normalising so `normal` is unit length.
    pub fn from_coefficients(v: Vec4) -> Self {
        let normal = v.truncate();
        let len = normal.length();
        if len > 0.0 {
            Self {
                normal: normal / len,
                distance: v.w / len,
            }
        } else {
            Self {
                normal,
                distance: v.w,
            }
        }
    }

    /// Signed distance from the plane (positive on the inside).
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self::new(center - extents, center + extents)
    }

    /// Returns false only when the box lies entirely outside at least one plane.
    ///
    /// Conservative: boxes near frustum corners may pass while being invisible.
    pub fn intersects_planes(&self, planes: &[Plane]) -> bool {
        planes.iter().all(|plane| {
            // Corner furthest along the plane normal
            let positive = Vec3::select(plane.normal.cmpge(Vec3::ZERO), self.max, self.min);
            plane.signed_distance(positive) >= 0.0
        })
    }
}

/// Extract the six frustum planes (left, right, bottom, top, near, far) from a
/// view-projection matrix with a `[0, 1]` clip depth range.
pub fn frustum_planes(view_proj: Mat4) -> [Plane; 6] {
    let r0 = view_proj.row(0);
    let r1 = view_proj.row(1);
    let r2 = view_proj.row(2);
    let r3 = view_proj.row(3);
    [
        Plane::from_coefficients(r3 + r0),
        Plane::from_coefficients(r3 - r0),
        Plane::from_coefficients(r3 + r1),
        Plane::from_coefficients(r3 - r1),
        Plane::from_coefficients(r2),
        Plane::from_coefficients(r3 - r2),
    ]
}
