//! Per-frame parameters for the underwater post-process material.

use glam::{Vec3, Vec4};

use crate::ambient::{AmbientProbeSampler, AmbientSample};
use crate::camera::{Eye, FrustumSource};
use crate::horizon::{horizon_for_eye, HorizonError};
use crate::lod::LodLayers;
use crate::targets::TargetId;
use crate::uniforms::{
    TextureBinding, UniformSink, KEYWORD_DEBUG_VIEW_OCEAN_MASK, KEYWORD_FULL_SCREEN_EFFECT,
    SP_AMBIENT_LIGHTING, SP_HORIZON_POS_NORMAL, SP_HORIZON_POS_NORMAL_RIGHT, SP_INSTANCE_DATA,
    SP_INV_VIEW_PROJECTION, SP_INV_VIEW_PROJECTION_RIGHT, SP_LD_SLICE_INDEX, SP_MAIN_TEX,
    SP_OCEAN_HEIGHT,
};

/// Ocean state the post-process reads each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OceanState {
    /// Height of the undisturbed water plane.
    pub sea_level: f32,
    /// Peak-to-peak vertical wave displacement.
    pub max_vertical_displacement: f32,
    /// Viewer altitude within the current LOD level, 0..1.
    pub viewer_altitude_level_alpha: f32,
    pub lod_count: u32,
    /// Where ambient lighting is sampled.
    pub viewpoint: Vec3,
}

impl Default for OceanState {
    fn default() -> Self {
        Self {
            sea_level: 0.0,
            max_vertical_displacement: 0.0,
            viewer_altitude_level_alpha: 0.0,
            lod_count: 7,
            viewpoint: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostProcessOptions {
    /// Copy shared shading parameters from the ocean surface material first.
    pub copy_params_from_ocean_material: bool,
    /// Show the raw mask instead of the effect.
    pub debug_view_ocean_mask: bool,
}

/// Everything one parameter update reads.
pub struct PostProcessInputs<'a, S> {
    /// Colour buffer the effect is applied to.
    pub source: TargetId,
    pub camera: &'a dyn FrustumSource,
    pub ocean: &'a OceanState,
    pub layers: LodLayers<'a>,
    /// Ocean surface material to copy shared parameters from.
    pub ocean_material: Option<&'a S>,
    pub probes: &'a dyn AmbientProbeSampler,
}

/// True when the camera is too deep for any wave crest to reach it, so the
/// effect can cover the whole screen without reading the mask.
pub fn full_screen_effect_required(
    camera_height: f32,
    max_vertical_displacement: f32,
    sea_level: f32,
) -> bool {
    // Displacement is peak-to-peak; half of it rises above sea level
    camera_height + max_vertical_displacement * 0.5 <= sea_level
}

/// Writes the underwater post-process parameters every frame.
#[derive(Debug, Clone, Default)]
pub struct UnderwaterPostProcess {
    pub options: PostProcessOptions,
    ambient: AmbientSample,
}

impl UnderwaterPostProcess {
    pub fn new(options: PostProcessOptions) -> Self {
        Self {
            options,
            ambient: AmbientSample::default(),
        }
    }

    pub fn update<S: UniformSink>(
        &mut self,
        material: &mut S,
        inputs: &PostProcessInputs<'_, S>,
    ) -> Result<(), HorizonError> {
        if self.options.copy_params_from_ocean_material {
            if let Some(ocean_material) = inputs.ocean_material {
                material.copy_properties_from(ocean_material);
            }
        }

        material.set_keyword(KEYWORD_DEBUG_VIEW_OCEAN_MASK, self.options.debug_view_ocean_mask);

        let ocean = inputs.ocean;
        material.set_float(SP_LD_SLICE_INDEX, 0.0);
        material.set_vector(
            SP_INSTANCE_DATA,
            Vec4::new(ocean.viewer_altitude_level_alpha, 0.0, 0.0, ocean.lod_count as f32),
        );

        inputs.layers.bind_all(material);

        let sea_level = ocean.sea_level;
        material.set_float(SP_OCEAN_HEIGHT, sea_level);
        let camera = inputs.camera;
        let full_screen = full_screen_effect_required(
            camera.position().y,
            ocean.max_vertical_displacement,
            sea_level,
        );
        material.set_keyword(KEYWORD_FULL_SCREEN_EFFECT, full_screen);

        // Blit transforms are not world-space, so the inverse matrices are set explicitly
        if camera.stereo_mode().uses_dual_projection() {
            material.set_matrix(SP_INV_VIEW_PROJECTION, camera.inverse_view_projection(Eye::Left));
            let left = horizon_for_eye(camera, Eye::Left, sea_level)?;
            material.set_vector(SP_HORIZON_POS_NORMAL, left.to_vec4());

            material.set_matrix(
                SP_INV_VIEW_PROJECTION_RIGHT,
                camera.inverse_view_projection(Eye::Right),
            );
            let right = horizon_for_eye(camera, Eye::Right, sea_level)?;
            material.set_vector(SP_HORIZON_POS_NORMAL_RIGHT, right.to_vec4());
        } else {
            material.set_matrix(SP_INV_VIEW_PROJECTION, camera.inverse_view_projection(Eye::Mono));
            let mono = horizon_for_eye(camera, Eye::Mono, sea_level)?;
            material.set_vector(SP_HORIZON_POS_NORMAL, mono.to_vec4());
        }

        // The blit does not bind the source itself
        material.set_texture(SP_MAIN_TEX, TextureBinding::Target(inputs.source));

        let ambient = self.ambient.resample(inputs.probes, ocean.viewpoint);
        material.set_vector(SP_AMBIENT_LIGHTING, ambient.extend(1.0));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, StereoMode};
    use crate::lod::{LodLayerKind, TextureLodLayer};
    use crate::uniforms::{MaterialParams, UniformValue};
    use ocean_core::ShL2;

    fn camera_at(height: f32) -> Camera {
        let mut cam = Camera::new(Vec3::new(0.0, height, 0.0));
        cam.set_yaw_pitch(0.0, 0.0);
        cam
    }

    fn ocean(sea_level: f32) -> OceanState {
        OceanState {
            sea_level,
            max_vertical_displacement: 4.0,
            viewer_altitude_level_alpha: 0.25,
            lod_count: 6,
            viewpoint: Vec3::ZERO,
        }
    }

    fn run(
        post: &mut UnderwaterPostProcess,
        material: &mut MaterialParams,
        camera: &Camera,
        ocean: &OceanState,
        layers: LodLayers<'_>,
    ) -> Result<(), HorizonError> {
        let probes = ShL2::from_ambient(Vec3::new(0.2, 0.3, 0.4));
        let inputs = PostProcessInputs {
            source: TargetId::next(),
            camera,
            ocean,
            layers,
            ocean_material: None,
            probes: &probes,
        };
        post.update(material, &inputs)
    }

    #[test]
    fn full_screen_effect_threshold() {
        assert!(full_screen_effect_required(5.0, 4.0, 10.0));
        assert!(!full_screen_effect_required(12.0, 4.0, 10.0));
        // Boundary is inclusive
        assert!(full_screen_effect_required(8.0, 4.0, 10.0));
    }

    #[test]
    fn full_screen_keyword_follows_camera_depth() {
        let mut post = UnderwaterPostProcess::default();
        let mut material = MaterialParams::new();

        run(&mut post, &mut material, &camera_at(5.0), &ocean(10.0), LodLayers::none()).unwrap();
        assert!(material.is_keyword_enabled(KEYWORD_FULL_SCREEN_EFFECT));

        run(&mut post, &mut material, &camera_at(12.0), &ocean(10.0), LodLayers::none()).unwrap();
        assert!(!material.is_keyword_enabled(KEYWORD_FULL_SCREEN_EFFECT));
        assert_eq!(material.float(SP_OCEAN_HEIGHT), Some(10.0));
    }

    /// With every layer absent, each slot is rebound to its null default.
    #[test]
    fn absent_layers_overwrite_every_slot() {
        let mut material = MaterialParams::new();
        let stale = TargetId::next();
        for kind in LodLayerKind::ALL {
            material.set_texture(kind.texture_name(), TextureBinding::Target(stale));
            material.set_vector(kind.params_name(), Vec4::splat(9.0));
        }
        let before = material.clone();

        let mut post = UnderwaterPostProcess::default();
        run(&mut post, &mut material, &camera_at(3.0), &ocean(0.0), LodLayers::none()).unwrap();

        for kind in LodLayerKind::ALL {
            assert_ne!(material.get(kind.texture_name()), before.get(kind.texture_name()));
            assert_ne!(material.get(kind.params_name()), before.get(kind.params_name()));
            assert_eq!(material.texture(kind.texture_name()), Some(TextureBinding::Null));
        }
    }

    #[test]
    fn present_layer_binds_results() {
        let depth = TextureLodLayer {
            kind: LodLayerKind::SeaFloorDepth,
            texture: TargetId::next(),
            params: Vec4::new(0.5, 0.0, 0.0, 1.0),
        };
        let layers = LodLayers {
            sea_floor_depth: Some(&depth),
            ..LodLayers::none()
        };
        let mut material = MaterialParams::new();
        let mut post = UnderwaterPostProcess::default();
        run(&mut post, &mut material, &camera_at(3.0), &ocean(0.0), layers).unwrap();

        assert_eq!(
            material.texture("_LD_TexArray_SeaFloorDepth"),
            Some(TextureBinding::Target(depth.texture))
        );
        assert_eq!(material.texture("_LD_TexArray_AnimatedWaves"), Some(TextureBinding::Null));
    }

    #[test]
    fn mono_camera_writes_only_left_slots() {
        let mut material = MaterialParams::new();
        let cam = camera_at(3.0);
        let mut post = UnderwaterPostProcess::default();
        run(&mut post, &mut material, &cam, &ocean(0.0), LodLayers::none()).unwrap();

        assert_eq!(
            material.matrix(SP_INV_VIEW_PROJECTION),
            Some(cam.inverse_view_projection(Eye::Mono))
        );
        assert!(material.contains(SP_HORIZON_POS_NORMAL));
        assert!(!material.contains(SP_INV_VIEW_PROJECTION_RIGHT));
        assert!(!material.contains(SP_HORIZON_POS_NORMAL_RIGHT));
    }

    /// Multi-pass stereo renders each eye with the camera's own projection.
    #[test]
    fn multi_pass_stereo_writes_one_matrix() {
        let mut material = MaterialParams::new();
        let mut cam = camera_at(3.0);
        cam.stereo_mode = StereoMode::MultiPass;
        let mut post = UnderwaterPostProcess::default();
        run(&mut post, &mut material, &cam, &ocean(0.0), LodLayers::none()).unwrap();

        assert!(material.contains(SP_INV_VIEW_PROJECTION));
        assert!(!material.contains(SP_INV_VIEW_PROJECTION_RIGHT));
    }

    #[test]
    fn single_pass_stereo_writes_both_eyes() {
        let mut material = MaterialParams::new();
        let mut cam = camera_at(3.0);
        cam.stereo_mode = StereoMode::SinglePass;
        let mut post = UnderwaterPostProcess::default();
        run(&mut post, &mut material, &cam, &ocean(0.0), LodLayers::none()).unwrap();

        let left = material.matrix(SP_INV_VIEW_PROJECTION).unwrap();
        let right = material.matrix(SP_INV_VIEW_PROJECTION_RIGHT).unwrap();
        assert_eq!(left, cam.inverse_view_projection(Eye::Left));
        assert_eq!(right, cam.inverse_view_projection(Eye::Right));
        assert_ne!(left, right);
        assert!(material.contains(SP_HORIZON_POS_NORMAL_RIGHT));
    }

    #[test]
    fn writes_frame_constants() {
        let mut material = MaterialParams::new();
        let mut post = UnderwaterPostProcess::new(PostProcessOptions {
            copy_params_from_ocean_material: false,
            debug_view_ocean_mask: true,
        });
        let probes = ShL2::from_ambient(Vec3::new(0.2, 0.3, 0.4));
        let source = TargetId::next();
        let cam = camera_at(3.0);
        let state = ocean(0.0);
        let inputs = PostProcessInputs {
            source,
            camera: &cam,
            ocean: &state,
            layers: LodLayers::none(),
            ocean_material: None,
            probes: &probes,
        };
        post.update(&mut material, &inputs).unwrap();

        assert!(material.is_keyword_enabled(KEYWORD_DEBUG_VIEW_OCEAN_MASK));
        assert_eq!(material.float(SP_LD_SLICE_INDEX), Some(0.0));
        assert_eq!(
            material.vector(SP_INSTANCE_DATA),
            Some(Vec4::new(0.25, 0.0, 0.0, 6.0))
        );
        assert_eq!(material.texture(SP_MAIN_TEX), Some(TextureBinding::Target(source)));
        let ambient = material.vector(SP_AMBIENT_LIGHTING).unwrap();
        assert!((ambient - Vec4::new(0.2, 0.3, 0.4, 1.0)).length() < 1e-5);
    }

    #[test]
    fn copies_ocean_material_only_when_enabled() {
        let mut ocean_material = MaterialParams::new();
        ocean_material.set_float("_Smoothness", 0.8);
        let probes = ShL2::ZERO;
        let cam = camera_at(3.0);
        let state = ocean(0.0);

        for copy in [false, true] {
            let mut material = MaterialParams::new();
            let mut post = UnderwaterPostProcess::new(PostProcessOptions {
                copy_params_from_ocean_material: copy,
                debug_view_ocean_mask: false,
            });
            let inputs = PostProcessInputs {
                source: TargetId::next(),
                camera: &cam,
                ocean: &state,
                layers: LodLayers::none(),
                ocean_material: Some(&ocean_material),
                probes: &probes,
            };
            post.update(&mut material, &inputs).unwrap();
            assert_eq!(
                material.get("_Smoothness"),
                copy.then_some(UniformValue::Float(0.8))
            );
        }
    }
}
