//! Ocean mask pass: draws visible ocean chunks into the mask targets.
//!
//! The mask tells the underwater post-process which pixels are covered by
//! ocean surface and from which side. Drawing goes through [`DrawTarget`] so
//! the pass can be recorded into a command list (see [`MaskCommandList`]) and
//! replayed by a GPU backend, or checked in tests.

use glam::Mat4;
use ocean_core::{Aabb, Plane};

use crate::camera::{Eye, FrustumSource};
use crate::targets::{MaskHandles, TargetId};
use crate::uniforms::{SP_OCEAN_MASK_DEPTH_TEXTURE, SP_OCEAN_MASK_TEXTURE, UNDERWATER_MASK_NO_MASK};

/// Command submission for the mask pass.
pub trait DrawTarget {
    /// A drawable ocean surface.
    type Surface;
    /// Material used in place of each surface's own.
    type Material;

    fn set_render_target(&mut self, color: TargetId, depth: TargetId);
    fn clear_render_target(&mut self, clear_depth: bool, clear_color: bool, color: f32);
    fn set_view_projection(&mut self, view: Mat4, projection: Mat4);
    fn draw_surface(&mut self, surface: &Self::Surface, material: &Self::Material);
    /// Publish a texture to later passes in the same frame.
    fn set_global_texture(&mut self, name: &'static str, texture: TargetId);
}

/// One ocean chunk and its world-space bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskChunk<S> {
    pub bounds: Aabb,
    pub surface: S,
}

/// View, projection and culling planes the mask is rendered with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskView {
    pub view: Mat4,
    pub projection: Mat4,
    pub planes: [Plane; 6],
}

impl MaskView {
    pub fn from_frustum(frustum: &dyn FrustumSource) -> Self {
        Self {
            view: frustum.view_matrix(),
            projection: frustum.projection_matrix(Eye::Mono),
            planes: frustum.frustum_planes(),
        }
    }
}

/// Render the ocean mask and publish it. Returns the number of chunks drawn.
pub fn render_mask<D: DrawTarget>(
    draw: &mut D,
    chunks: &[MaskChunk<D::Surface>],
    view: &MaskView,
    targets: MaskHandles,
    mask_material: &D::Material,
) -> usize {
    draw.set_render_target(targets.color, targets.depth);
    draw.clear_render_target(true, true, UNDERWATER_MASK_NO_MASK);
    // Set explicitly: this may be recorded outside the camera's own pass
    draw.set_view_projection(view.view, view.projection);

    let mut drawn = 0;
    for chunk in chunks {
        if chunk.bounds.intersects_planes(&view.planes) {
            draw.draw_surface(&chunk.surface, mask_material);
            drawn += 1;
        }
    }

    draw.set_global_texture(SP_OCEAN_MASK_TEXTURE, targets.color);
    draw.set_global_texture(SP_OCEAN_MASK_DEPTH_TEXTURE, targets.depth);
    drawn
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaskCommand<S> {
    SetRenderTarget { color: TargetId, depth: TargetId },
    Clear { clear_depth: bool, clear_color: bool, color: f32 },
    SetViewProjection { view: Mat4, projection: Mat4 },
    Draw { surface: S },
    SetGlobalTexture { name: &'static str, texture: TargetId },
}

/// Records mask pass commands for later replay.
///
/// The recorded pass has a single mask material, so `Material` is `()`.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskCommandList<S> {
    commands: Vec<MaskCommand<S>>,
}

impl<S> Default for MaskCommandList<S> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

impl<S> MaskCommandList<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[MaskCommand<S>] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Global textures published by the recorded pass, in order.
    pub fn published(&self) -> impl Iterator<Item = (&'static str, TargetId)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            MaskCommand::SetGlobalTexture { name, texture } => Some((*name, *texture)),
            _ => None,
        })
    }
}

impl<S: Clone> DrawTarget for MaskCommandList<S> {
    type Surface = S;
    type Material = ();

    fn set_render_target(&mut self, color: TargetId, depth: TargetId) {
        self.commands.push(MaskCommand::SetRenderTarget { color, depth });
    }

    fn clear_render_target(&mut self, clear_depth: bool, clear_color: bool, color: f32) {
        self.commands.push(MaskCommand::Clear {
            clear_depth,
            clear_color,
            color,
        });
    }

    fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.commands.push(MaskCommand::SetViewProjection { view, projection });
    }

    fn draw_surface(&mut self, surface: &S, _material: &()) {
        self.commands.push(MaskCommand::Draw {
            surface: surface.clone(),
        });
    }

    fn set_global_texture(&mut self, name: &'static str, texture: TargetId) {
        self.commands.push(MaskCommand::SetGlobalTexture { name, texture });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::targets::{tests::CountingAllocator, MaskTargets};
    use glam::Vec3;

    fn chunk(id: u32, center: Vec3) -> MaskChunk<u32> {
        MaskChunk {
            bounds: Aabb::from_center_extents(center, Vec3::new(5.0, 1.0, 5.0)),
            surface: id,
        }
    }

    fn level_camera() -> Camera {
        let mut cam = Camera::new(Vec3::new(0.0, 2.0, 0.0));
        cam.set_yaw_pitch(0.0, -0.2);
        cam
    }

    #[test]
    fn pass_sets_up_target_before_drawing() {
        let mut targets = MaskTargets::new(CountingAllocator::default());
        let handles = targets.ensure_size(800, 600);
        let cam = level_camera();
        let view = MaskView::from_frustum(&cam);
        let mut list = MaskCommandList::new();

        render_mask(&mut list, &[chunk(7, Vec3::new(0.0, 0.0, -20.0))], &view, handles, &());

        let cmds = list.commands();
        assert_eq!(
            cmds[0],
            MaskCommand::SetRenderTarget {
                color: handles.color,
                depth: handles.depth
            }
        );
        assert_eq!(
            cmds[1],
            MaskCommand::Clear {
                clear_depth: true,
                clear_color: true,
                color: UNDERWATER_MASK_NO_MASK
            }
        );
        assert_eq!(
            cmds[2],
            MaskCommand::SetViewProjection {
                view: cam.view_matrix(),
                projection: cam.projection_matrix(Eye::Mono)
            }
        );
        assert_eq!(cmds[3], MaskCommand::Draw { surface: 7 });
    }

    #[test]
    fn chunks_outside_frustum_are_skipped() {
        let mut targets = MaskTargets::new(CountingAllocator::default());
        let handles = targets.ensure_size(320, 240);
        let view = MaskView::from_frustum(&level_camera());
        let chunks = [
            chunk(1, Vec3::new(0.0, 0.0, -30.0)),
            chunk(2, Vec3::new(0.0, 0.0, 60.0)),
            chunk(3, Vec3::new(10.0, 0.0, -80.0)),
            chunk(4, Vec3::new(0.0, 0.0, -5000.0)),
        ];
        let mut list = MaskCommandList::new();

        let drawn = render_mask(&mut list, &chunks, &view, handles, &());

        let surfaces: Vec<u32> = list
            .commands()
            .iter()
            .filter_map(|c| match c {
                MaskCommand::Draw { surface } => Some(*surface),
                _ => None,
            })
            .collect();
        assert_eq!(surfaces, vec![1, 3]);
        assert_eq!(drawn, 2);
    }

    /// Mask and depth are published even when nothing was drawn.
    #[test]
    fn mask_textures_are_published_last() {
        let mut targets = MaskTargets::new(CountingAllocator::default());
        let handles = targets.ensure_size(16, 16);
        let view = MaskView::from_frustum(&level_camera());
        let mut list: MaskCommandList<u32> = MaskCommandList::new();

        render_mask(&mut list, &[], &view, handles, &());

        let published: Vec<_> = list.published().collect();
        assert_eq!(
            published,
            vec![
                (SP_OCEAN_MASK_TEXTURE, handles.color),
                (SP_OCEAN_MASK_DEPTH_TEXTURE, handles.depth)
            ]
        );
        assert!(matches!(
            list.commands().last(),
            Some(MaskCommand::SetGlobalTexture { .. })
        ));
    }
}
