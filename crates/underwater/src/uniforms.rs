//! Shader property names and the material parameter table they are written into.

use std::collections::{BTreeMap, BTreeSet};

use glam::{Mat4, Vec4};

use crate::targets::TargetId;

// Property names shared with the underwater shaders. Must match verbatim.
pub const SP_OCEAN_MASK_TEXTURE: &str = "_CrestOceanMaskTexture";
pub const SP_OCEAN_MASK_DEPTH_TEXTURE: &str = "_CrestOceanMaskDepthTexture";
pub const SP_OCEAN_HEIGHT: &str = "_OceanHeight";
pub const SP_MAIN_TEX: &str = "_MainTex";
pub const SP_INV_VIEW_PROJECTION: &str = "_InvViewProjection";
pub const SP_INV_VIEW_PROJECTION_RIGHT: &str = "_InvViewProjectionRight";
pub const SP_INSTANCE_DATA: &str = "_InstanceData";
pub const SP_AMBIENT_LIGHTING: &str = "_AmbientLighting";
pub const SP_HORIZON_POS_NORMAL: &str = "_HorizonPosNormal";
pub const SP_HORIZON_POS_NORMAL_RIGHT: &str = "_HorizonPosNormalRight";
pub const SP_LD_SLICE_INDEX: &str = "_LD_SliceIndex";

pub const KEYWORD_FULL_SCREEN_EFFECT: &str = "_FULL_SCREEN_EFFECT";
pub const KEYWORD_DEBUG_VIEW_OCEAN_MASK: &str = "_DEBUG_VIEW_OCEAN_MASK";

/// Mask value for pixels no ocean surface was drawn into. Matches the shader constant.
pub const UNDERWATER_MASK_NO_MASK: f32 = 1.0;
/// Mask value written for ocean surface seen from above.
pub const UNDERWATER_MASK_WATER_SURFACE_ABOVE: f32 = 0.0;
/// Mask value written for ocean surface seen from below.
pub const UNDERWATER_MASK_WATER_SURFACE_BELOW: f32 = 2.0;

/// What a texture slot is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureBinding {
    Target(TargetId),
    /// Explicit "nothing here" default for disabled inputs.
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vector(Vec4),
    Matrix(Mat4),
    Texture(TextureBinding),
}

/// Write-only access to a material's shader properties and keywords.
pub trait UniformSink {
    fn set_float(&mut self, name: &'static str, value: f32);
    fn set_vector(&mut self, name: &'static str, value: Vec4);
    fn set_matrix(&mut self, name: &'static str, value: Mat4);
    fn set_texture(&mut self, name: &'static str, value: TextureBinding);
    fn set_keyword(&mut self, keyword: &'static str, enabled: bool);

    /// Copy every property and keyword of `source` into `self`.
    fn copy_properties_from(&mut self, source: &Self)
    where
        Self: Sized;
}

/// CPU-side property table for one material.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialParams {
    values: BTreeMap<&'static str, UniformValue>,
    keywords: BTreeSet<&'static str>,
}

impl MaterialParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            UniformValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn vector(&self, name: &str) -> Option<Vec4> {
        match self.get(name)? {
            UniformValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn matrix(&self, name: &str) -> Option<Mat4> {
        match self.get(name)? {
            UniformValue::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn texture(&self, name: &str) -> Option<TextureBinding> {
        match self.get(name)? {
            UniformValue::Texture(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_keyword_enabled(&self, keyword: &str) -> bool {
        self.keywords.contains(keyword)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl UniformSink for MaterialParams {
    fn set_float(&mut self, name: &'static str, value: f32) {
        self.values.insert(name, UniformValue::Float(value));
    }

    fn set_vector(&mut self, name: &'static str, value: Vec4) {
        self.values.insert(name, UniformValue::Vector(value));
    }

    fn set_matrix(&mut self, name: &'static str, value: Mat4) {
        self.values.insert(name, UniformValue::Matrix(value));
    }

    fn set_texture(&mut self, name: &'static str, value: TextureBinding) {
        self.values.insert(name, UniformValue::Texture(value));
    }

    fn set_keyword(&mut self, keyword: &'static str, enabled: bool) {
        if enabled {
            self.keywords.insert(keyword);
        } else {
            self.keywords.remove(keyword);
        }
    }

    fn copy_properties_from(&mut self, source: &Self) {
        self.values
            .extend(source.values.iter().map(|(k, v)| (*k, *v)));
        self.keywords = source.keywords.clone();
    }
}
