//! LOD simulation data layers bound into the underwater material.

use glam::Vec4;

use crate::targets::TargetId;
use crate::uniforms::{TextureBinding, UniformSink};

/// Auxiliary simulation data the underwater shader samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LodLayerKind {
    AnimatedWaves,
    SeaFloorDepth,
    Shadow,
}

impl LodLayerKind {
    pub const ALL: [LodLayerKind; 3] = [
        LodLayerKind::AnimatedWaves,
        LodLayerKind::SeaFloorDepth,
        LodLayerKind::Shadow,
    ];

    pub fn texture_name(self) -> &'static str {
        match self {
            LodLayerKind::AnimatedWaves => "_LD_TexArray_AnimatedWaves",
            LodLayerKind::SeaFloorDepth => "_LD_TexArray_SeaFloorDepth",
            LodLayerKind::Shadow => "_LD_TexArray_Shadow",
        }
    }

    pub fn params_name(self) -> &'static str {
        match self {
            LodLayerKind::AnimatedWaves => "_LD_Params_AnimatedWaves",
            LodLayerKind::SeaFloorDepth => "_LD_Params_SeaFloorDepth",
            LodLayerKind::Shadow => "_LD_Params_Shadow",
        }
    }

    /// Bind the layer's neutral default so no stale data from an earlier frame survives.
    pub fn bind_null(self, sink: &mut dyn UniformSink) {
        sink.set_texture(self.texture_name(), TextureBinding::Null);
        sink.set_vector(self.params_name(), Vec4::ZERO);
    }
}

/// A layer whose current results can be bound into a material.
pub trait LodDataLayer {
    fn kind(&self) -> LodLayerKind;
    fn bind_result_data(&self, sink: &mut dyn UniformSink);
}

/// Layer results held in a texture array plus one parameter vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureLodLayer {
    pub kind: LodLayerKind,
    pub texture: TargetId,
    /// Texel size and LOD scale, layer-defined.
    pub params: Vec4,
}

impl LodDataLayer for TextureLodLayer {
    fn kind(&self) -> LodLayerKind {
        self.kind
    }

    fn bind_result_data(&self, sink: &mut dyn UniformSink) {
        sink.set_texture(self.kind.texture_name(), TextureBinding::Target(self.texture));
        sink.set_vector(self.kind.params_name(), self.params);
    }
}

/// The layers active this frame. `None` means the layer is disabled.
#[derive(Clone, Copy, Default)]
pub struct LodLayers<'a> {
    pub animated_waves: Option<&'a dyn LodDataLayer>,
    pub sea_floor_depth: Option<&'a dyn LodDataLayer>,
    pub shadow: Option<&'a dyn LodDataLayer>,
}

impl<'a> LodLayers<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: LodLayerKind) -> Option<&'a dyn LodDataLayer> {
        match kind {
            LodLayerKind::AnimatedWaves => self.animated_waves,
            LodLayerKind::SeaFloorDepth => self.sea_floor_depth,
            LodLayerKind::Shadow => self.shadow,
        }
    }

    /// Bind every slot: active layers with their results, the rest with null defaults.
    pub fn bind_all(&self, sink: &mut dyn UniformSink) {
        for kind in LodLayerKind::ALL {
            match self.get(kind) {
                Some(layer) => layer.bind_result_data(sink),
                None => kind.bind_null(sink),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::MaterialParams;

    #[test]
    fn active_layer_binds_its_texture() {
        let waves = TextureLodLayer {
            kind: LodLayerKind::AnimatedWaves,
            texture: TargetId::next(),
            params: Vec4::new(1.0, 2.0, 3.0, 4.0),
        };
        let layers = LodLayers {
            animated_waves: Some(&waves),
            ..LodLayers::none()
        };
        let mut m = MaterialParams::new();
        layers.bind_all(&mut m);

        assert_eq!(
            m.texture("_LD_TexArray_AnimatedWaves"),
            Some(TextureBinding::Target(waves.texture))
        );
        assert_eq!(m.vector("_LD_Params_AnimatedWaves"), Some(waves.params));
        assert_eq!(m.texture("_LD_TexArray_SeaFloorDepth"), Some(TextureBinding::Null));
        assert_eq!(m.texture("_LD_TexArray_Shadow"), Some(TextureBinding::Null));
    }

    /// Disabling a layer mid-session replaces its old binding.
    #[test]
    fn disabled_layer_overwrites_previous_binding() {
        let shadow = TextureLodLayer {
            kind: LodLayerKind::Shadow,
            texture: TargetId::next(),
            params: Vec4::ONE,
        };
        let mut m = MaterialParams::new();
        LodLayers {
            shadow: Some(&shadow),
            ..LodLayers::none()
        }
        .bind_all(&mut m);
        LodLayers::none().bind_all(&mut m);

        assert_eq!(m.texture("_LD_TexArray_Shadow"), Some(TextureBinding::Null));
        assert_eq!(m.vector("_LD_Params_Shadow"), Some(Vec4::ZERO));
    }
}
