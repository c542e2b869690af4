//! Ambient light probe sampling for the underwater fill light.

use glam::Vec3;
use ocean_core::ShL2;

/// Interpolated light-probe lookup at a world position.
pub trait AmbientProbeSampler {
    fn interpolated_probe(&self, position: Vec3) -> ShL2;
}

/// A single probe lights the whole scene.
impl AmbientProbeSampler for ShL2 {
    fn interpolated_probe(&self, _position: Vec3) -> ShL2 {
        *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightProbe {
    pub position: Vec3,
    pub sh: ShL2,
}

/// Scattered probes blended by inverse squared distance.
#[derive(Debug, Clone, Default)]
pub struct LightProbeSet {
    probes: Vec<LightProbe>,
}

impl LightProbeSet {
    pub fn new(probes: Vec<LightProbe>) -> Self {
        Self { probes }
    }
}

impl AmbientProbeSampler for LightProbeSet {
    fn interpolated_probe(&self, position: Vec3) -> ShL2 {
        let mut total = 0.0;
        let mut blended = ShL2::ZERO;
        for probe in &self.probes {
            let d2 = probe.position.distance_squared(position);
            if d2 <= f32::EPSILON {
                return probe.sh;
            }
            let w = 1.0 / d2;
            blended.add_scaled(&probe.sh, w);
            total += w;
        }
        if total > 0.0 {
            let mut normalized = ShL2::ZERO;
            normalized.add_scaled(&blended, 1.0 / total);
            normalized
        } else {
            ShL2::ZERO
        }
    }
}

/// Scratch for the single omnidirectional SH evaluation, reused across frames.
#[derive(Debug, Clone)]
pub struct AmbientSample {
    directions: [Vec3; 1],
    colors: [Vec3; 1],
}

impl Default for AmbientSample {
    fn default() -> Self {
        Self {
            // Zero direction: only the direction-independent terms contribute
            directions: [Vec3::ZERO],
            colors: [Vec3::ZERO],
        }
    }
}

impl AmbientSample {
    /// Re-query the probes at `position` and return the ambient colour.
    pub fn resample(&mut self, sampler: &dyn AmbientProbeSampler, position: Vec3) -> Vec3 {
        let sh = sampler.interpolated_probe(position);
        sh.evaluate_into(&self.directions, &mut self.colors);
        self.colors[0]
    }
}
