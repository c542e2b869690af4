//! Per-frame driver: mask pass, then post-process parameters.

use crate::ambient::AmbientProbeSampler;
use crate::camera::FrustumSource;
use crate::horizon::HorizonError;
use crate::lod::LodLayers;
use crate::mask::{render_mask, DrawTarget, MaskChunk, MaskView};
use crate::post_process::{OceanState, PostProcessInputs, PostProcessOptions, UnderwaterPostProcess};
use crate::targets::{MaskHandles, MaskTargets, TargetAllocator, TargetId};
use crate::uniforms::UniformSink;

/// The ocean side of a frame: surface chunks, simulation layers and lighting.
pub struct OceanScene<'a, Surface, S> {
    pub state: OceanState,
    pub chunks: &'a [MaskChunk<Surface>],
    pub layers: LodLayers<'a>,
    pub ocean_material: Option<&'a S>,
    pub probes: &'a dyn AmbientProbeSampler,
}

/// Everything one frame of the effect consumes.
pub struct UnderwaterFrame<'a, D: DrawTarget, S> {
    pub camera: Option<&'a dyn FrustumSource>,
    pub ocean: Option<OceanScene<'a, D::Surface, S>>,
    /// Viewport size in pixels.
    pub viewport: (u32, u32),
    /// Colour buffer the post-process reads.
    pub source: TargetId,
    pub mask_material: &'a D::Material,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A required input was missing; nothing was written.
    Skipped,
    Rendered { mask: MaskHandles, chunks_drawn: usize },
}

/// Owns the mask targets and drives the underwater effect each frame.
pub struct UnderwaterEffect<A: TargetAllocator> {
    targets: MaskTargets<A>,
    post_process: UnderwaterPostProcess,
    missing_input_reported: bool,
}

impl<A: TargetAllocator> UnderwaterEffect<A> {
    pub fn new(allocator: A, options: PostProcessOptions) -> Self {
        Self {
            targets: MaskTargets::new(allocator),
            post_process: UnderwaterPostProcess::new(options),
            missing_input_reported: false,
        }
    }

    pub fn targets(&self) -> &MaskTargets<A> {
        &self.targets
    }

    /// Run the mask pass and update `material` for one frame.
    ///
    /// A missing camera or ocean is logged once and the frame is skipped;
    /// the report re-arms after the next complete frame.
    pub fn render_frame<D, S>(
        &mut self,
        frame: &UnderwaterFrame<'_, D, S>,
        draw: &mut D,
        material: &mut S,
    ) -> Result<FrameOutcome, HorizonError>
    where
        D: DrawTarget,
        S: UniformSink,
    {
        let (camera, ocean) = match (frame.camera, frame.ocean.as_ref()) {
            (Some(camera), Some(ocean)) => (camera, ocean),
            (camera, _) => {
                if !self.missing_input_reported {
                    let missing = if camera.is_none() { "camera" } else { "ocean" };
                    log::error!("No {} present, underwater effect will have no effect.", missing);
                    self.missing_input_reported = true;
                }
                return Ok(FrameOutcome::Skipped);
            }
        };

        let (width, height) = frame.viewport;
        let mask = self.targets.ensure_size(width, height);
        let view = MaskView::from_frustum(camera);
        let chunks_drawn = render_mask(draw, ocean.chunks, &view, mask, frame.mask_material);

        let inputs = PostProcessInputs {
            source: frame.source,
            camera,
            ocean: &ocean.state,
            layers: ocean.layers,
            ocean_material: ocean.ocean_material,
            probes: ocean.probes,
        };
        self.post_process.update(material, &inputs)?;

        self.missing_input_reported = false;
        Ok(FrameOutcome::Rendered { mask, chunks_drawn })
    }
}
