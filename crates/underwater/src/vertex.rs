//! Vertex layout for ocean surface geometry drawn into the mask.

use bytemuck::{Pod, Zeroable};

/// Ocean surface vertex. Only position matters to the mask shader; facing is
/// taken from the rasterizer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaskVertex {
    pub position: [f32; 3],
}

impl MaskVertex {
    pub fn new(position: [f32; 3]) -> Self {
        Self { position }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MaskVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Flat grid of `cells x cells` quads spanning `size` on the XZ plane at
/// height `y`, centred on `center`. Triangles wind counter-clockwise seen from +Y.
pub fn flat_grid(center: [f32; 2], y: f32, size: f32, cells: u32) -> (Vec<MaskVertex>, Vec<u32>) {
    let cells = cells.max(1);
    let step = size / cells as f32;
    let origin = [center[0] - size * 0.5, center[1] - size * 0.5];
    let row = cells + 1;

    let mut vertices = Vec::with_capacity((row * row) as usize);
    for z in 0..row {
        for x in 0..row {
            vertices.push(MaskVertex::new([
                origin[0] + x as f32 * step,
                y,
                origin[1] + z as f32 * step,
            ]));
        }
    }

    let mut indices = Vec::with_capacity((cells * cells * 6) as usize);
    for z in 0..cells {
        for x in 0..cells {
            let i = z * row + x;
            indices.extend_from_slice(&[i, i + row, i + 1, i + 1, i + row, i + row + 1]);
        }
    }
    (vertices, indices)
}
