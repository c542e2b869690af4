//! Order-2 (nine coefficient) spherical harmonics for RGB light probes.

use glam::Vec3;

// Real SH basis normalisation constants
const Y00: f32 = 0.282_095;
const Y1: f32 = 0.488_603;
const Y2_MIXED: f32 = 1.092_548;
const Y20: f32 = 0.315_392;
const Y22: f32 = 0.546_274;

/// RGB spherical harmonics, bands 0..=2. `coefficients[k]` is the RGB weight of basis `k`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShL2 {
    pub coefficients: [[f32; 3]; 9],
}

impl ShL2 {
    pub const ZERO: Self = Self {
        coefficients: [[0.0; 3]; 9],
    };

    /// Constant ambient term: evaluates to `color` in every unit direction.
    pub fn from_ambient(color: Vec3) -> Self {
        let mut sh = Self::ZERO;
        sh.add_ambient(color);
        sh
    }

    pub fn add_ambient(&mut self, color: Vec3) {
        let c = color / Y00;
        for (dst, src) in self.coefficients[0].iter_mut().zip(c.to_array()) {
            *dst += src;
        }
    }

    /// Accumulate `other * weight` into `self`.
    pub fn add_scaled(&mut self, other: &ShL2, weight: f32) {
        for (dst, src) in self.coefficients.iter_mut().zip(other.coefficients.iter()) {
            for c in 0..3 {
                dst[c] += src[c] * weight;
            }
        }
    }

    /// Evaluate the nine basis functions at `dir`.
    ///
    /// `dir` is not normalised, so the zero vector picks up only the
    /// direction-independent terms (an omnidirectional sample).
    pub fn basis(dir: Vec3) -> [f32; 9] {
        let Vec3 { x, y, z } = dir;
        [
            Y00,
            Y1 * y,
            Y1 * z,
            Y1 * x,
            Y2_MIXED * x * y,
            Y2_MIXED * y * z,
            Y20 * (3.0 * z * z - 1.0),
            Y2_MIXED * x * z,
            Y22 * (x * x - y * y),
        ]
    }

    /// Evaluate the RGB radiance in direction `dir`.
    pub fn evaluate(&self, dir: Vec3) -> Vec3 {
        Self::basis(dir)
            .iter()
            .zip(self.coefficients.iter())
            .fold(Vec3::ZERO, |acc, (b, c)| acc + Vec3::from_array(*c) * *b)
    }

    /// Evaluate a batch of directions into `out` (pairs beyond the shorter slice are ignored).
    pub fn evaluate_into(&self, directions: &[Vec3], out: &mut [Vec3]) {
        for (dir, dst) in directions.iter().zip(out.iter_mut()) {
            *dst = self.evaluate(*dir);
        }
    }
}
