//! Screen-space horizon: where the far clip plane crosses the sea-level plane.

use glam::{Vec2, Vec3, Vec4};
use thiserror::Error;

use crate::camera::{Eye, FrustumSource};

/// Viewport corners of the far plane, walked as a closed loop.
pub const FAR_PLANE_VIEWPORT_CORNERS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(1.0, 0.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum HorizonError {
    #[error("could not determine if far plane is above or below sea level {sea_level}")]
    Unclassifiable { sea_level: f32 },
    #[error("far plane crosses sea level {count} times, expected at most 2")]
    TooManyCrossings { count: usize },
}

/// Far-plane corners in viewport space and their world-space unprojections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FarPlaneQuad {
    pub screen: [Vec2; 4],
    pub world: [Vec3; 4],
}

impl FarPlaneQuad {
    /// Unproject the far-plane corners of `frustum` for one eye.
    pub fn from_frustum(frustum: &dyn FrustumSource, eye: Eye) -> Self {
        let far = frustum.far_clip();
        let world = FAR_PLANE_VIEWPORT_CORNERS.map(|c| frustum.viewport_to_world(c.extend(far), eye));
        Self {
            screen: FAR_PLANE_VIEWPORT_CORNERS,
            world,
        }
    }
}

/// A point on the horizon line and the line's normal, both in viewport space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Horizon {
    pub position: Vec2,
    pub normal: Vec2,
}

impl Horizon {
    /// Packed as `(pos.x, pos.y, normal.x, normal.y)`.
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.position.x, self.position.y, self.normal.x, self.normal.y)
    }
}

/// Intersect the far-plane quad with the plane `y = sea_level`.
///
/// With two crossings the horizon passes through the first one. The normal is
/// the tangent rotated a quarter turn, negated once when the world-space
/// crossing delta points along `camera_right` and once more when the camera
/// is upside down. Both negations apply independently.
///
/// With fewer crossings the whole far plane is on one side: the first corner
/// not exactly at sea level decides between `(0, 0)` (underwater) and
/// `(0, 1)` (above water), with the normal pointing up.
pub fn locate_horizon(
    quad: &FarPlaneQuad,
    sea_level: f32,
    camera_right: Vec3,
    camera_up: Vec3,
) -> Result<Horizon, HorizonError> {
    let mut screen_hits = [Vec2::ZERO; 2];
    let mut world_hits = [Vec3::ZERO; 2];
    let mut count = 0;

    for i in 0..4 {
        let next = (i + 1) % 4;
        let (y0, y1) = (quad.world[i].y, quad.world[next].y);
        // Opposite signs multiply to a negative
        if (y0 - sea_level) * (y1 - sea_level) < 0.0 {
            if count < 2 {
                let t = (sea_level - y0) / (y1 - y0);
                screen_hits[count] = quad.screen[i].lerp(quad.screen[next], t);
                world_hits[count] = quad.world[i].lerp(quad.world[next], t);
            }
            count += 1;
        }
    }

    if count > 2 {
        return Err(HorizonError::TooManyCrossings { count });
    }

    if count == 2 {
        let tangent = screen_hits[0] - screen_hits[1];
        let mut normal = Vec2::new(-tangent.y, tangent.x);

        if (world_hits[0] - world_hits[1]).dot(camera_right) > 0.0 {
            normal = -normal;
        }

        if camera_up.y <= 0.0 {
            normal = -normal;
        }

        return Ok(Horizon {
            position: screen_hits[0],
            normal,
        });
    }

    for corner in &quad.world {
        if corner.y < sea_level {
            return Ok(Horizon {
                position: Vec2::ZERO,
                normal: Vec2::Y,
            });
        } else if corner.y > sea_level {
            return Ok(Horizon {
                position: Vec2::Y,
                normal: Vec2::Y,
            });
        }
    }

    Err(HorizonError::Unclassifiable { sea_level })
}

/// Horizon for one eye of `frustum`.
pub fn horizon_for_eye(
    frustum: &dyn FrustumSource,
    eye: Eye,
    sea_level: f32,
) -> Result<Horizon, HorizonError> {
    let quad = FarPlaneQuad::from_frustum(frustum, eye);
    locate_horizon(&quad, sea_level, frustum.right(), frustum.up())
}
