//! wgpu backend: mask textures, the mask pipeline and the post-process uniform block.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;

use crate::camera::StereoMode;
use crate::lod::LodLayerKind;
use crate::mask::{MaskCommand, MaskCommandList};
use crate::targets::{MaskTargets, TargetAllocator, TargetDesc, TargetFormat, TargetId};
use crate::uniforms::{
    MaterialParams, KEYWORD_DEBUG_VIEW_OCEAN_MASK, KEYWORD_FULL_SCREEN_EFFECT, SP_AMBIENT_LIGHTING,
    SP_HORIZON_POS_NORMAL, SP_HORIZON_POS_NORMAL_RIGHT, SP_INSTANCE_DATA, SP_INV_VIEW_PROJECTION,
    SP_INV_VIEW_PROJECTION_RIGHT, SP_LD_SLICE_INDEX, SP_OCEAN_HEIGHT,
};
use crate::vertex::MaskVertex;

impl TargetFormat {
    pub fn wgpu_format(self) -> wgpu::TextureFormat {
        match self {
            TargetFormat::MaskColor => wgpu::TextureFormat::R16Float,
            TargetFormat::MaskDepth => wgpu::TextureFormat::Depth24Plus,
        }
    }
}

/// A mask texture and its default view.
pub struct GpuTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

/// Creates mask textures on a wgpu device.
pub struct GpuTargetAllocator {
    device: Arc<wgpu::Device>,
}

impl GpuTargetAllocator {
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self { device }
    }
}

impl TargetAllocator for GpuTargetAllocator {
    type Target = GpuTarget;

    fn create_target(&mut self, desc: &TargetDesc) -> GpuTarget {
        let format = desc.format.wgpu_format();
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            // wgpu rejects zero-sized textures (minimised window)
            size: wgpu::Extent3d {
                width: desc.width.max(1),
                height: desc.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        GpuTarget {
            texture,
            view,
            format,
        }
    }
}

/// Ocean surface geometry on the GPU.
pub struct MaskMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl MaskMesh {
    pub fn new(device: &wgpu::Device, vertices: &[MaskVertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ocean Mask Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ocean Mask Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct MaskCameraUniform {
    view_proj: [[f32; 4]; 4],
}

/// Render pipeline for the ocean mask. Replays a recorded [`MaskCommandList`]
/// whose surfaces are indices into a mesh slice.
pub struct MaskPipeline {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
}

/// One render pass worth of replayed commands.
struct PendingPass {
    color: TargetId,
    depth: TargetId,
    clear_color: Option<f32>,
    clear_depth: bool,
    draws: Vec<usize>,
}

impl MaskPipeline {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Ocean Mask Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/ocean_mask.wgsl").into()),
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ocean Mask Camera Buffer"),
            contents: bytemuck::cast_slice(&[MaskCameraUniform {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Ocean Mask Camera Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Ocean Mask Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Ocean Mask Pipeline Layout"),
            bind_group_layouts: &[&camera_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Ocean Mask Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[MaskVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TargetFormat::MaskColor.wgpu_format(),
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                // Both sides: the fragment shader tells above from below
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: TargetFormat::MaskDepth.wgpu_format(),
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            camera_buffer,
            camera_bind_group,
        }
    }

    /// Encode the recorded mask pass. Published textures are left to the caller
    /// (see [`MaskCommandList::published`]).
    ///
    /// The camera buffer is written through the queue, so every pass in one
    /// submission sees the last view-projection recorded.
    pub fn execute(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        commands: &MaskCommandList<usize>,
        targets: &MaskTargets<GpuTargetAllocator>,
        meshes: &[MaskMesh],
    ) -> Result<()> {
        let mut pending: Option<PendingPass> = None;

        for command in commands.commands() {
            match command {
                MaskCommand::SetRenderTarget { color, depth } => {
                    if let Some(pass) = pending.take() {
                        self.encode_pass(encoder, &pass, targets, meshes)?;
                    }
                    pending = Some(PendingPass {
                        color: *color,
                        depth: *depth,
                        clear_color: None,
                        clear_depth: false,
                        draws: Vec::new(),
                    });
                }
                MaskCommand::Clear {
                    clear_depth,
                    clear_color,
                    color,
                } => {
                    let pass = pending
                        .as_mut()
                        .ok_or_else(|| anyhow!("mask clear recorded before a render target"))?;
                    pass.clear_depth = *clear_depth;
                    pass.clear_color = clear_color.then_some(*color);
                }
                MaskCommand::SetViewProjection { view, projection } => {
                    let uniform = MaskCameraUniform {
                        view_proj: (*projection * *view).to_cols_array_2d(),
                    };
                    queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
                }
                MaskCommand::Draw { surface } => {
                    pending
                        .as_mut()
                        .ok_or_else(|| anyhow!("mask draw recorded before a render target"))?
                        .draws
                        .push(*surface);
                }
                MaskCommand::SetGlobalTexture { .. } => {}
            }
        }

        if let Some(pass) = pending.take() {
            self.encode_pass(encoder, &pass, targets, meshes)?;
        }
        Ok(())
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pass: &PendingPass,
        targets: &MaskTargets<GpuTargetAllocator>,
        meshes: &[MaskMesh],
    ) -> Result<()> {
        let color = targets
            .target(pass.color)
            .ok_or_else(|| anyhow!("unknown mask colour target {:?}", pass.color))?;
        let depth = targets
            .target(pass.depth)
            .ok_or_else(|| anyhow!("unknown mask depth target {:?}", pass.depth))?;

        let color_load = match pass.clear_color {
            Some(v) => wgpu::LoadOp::Clear(wgpu::Color {
                r: v as f64,
                g: 0.0,
                b: 0.0,
                a: 1.0,
            }),
            None => wgpu::LoadOp::Load,
        };
        let depth_load = if pass.clear_depth {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Ocean Mask Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &color.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        for &index in &pass.draws {
            let mesh = meshes
                .get(index)
                .ok_or_else(|| anyhow!("mask draw references missing mesh {}", index))?;
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
        }
        Ok(())
    }
}

/// Underwater post-process uniform block (must match the underwater shader's layout).
///
/// Textures (`_MainTex`, the mask pair and the LOD texture arrays) are bound
/// through bind groups; this block carries the scalar, vector and matrix uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct UnderwaterUniform {
    pub inv_view_projection: [[f32; 4]; 4],
    pub inv_view_projection_right: [[f32; 4]; 4],
    pub horizon_pos_normal: [f32; 4],
    pub horizon_pos_normal_right: [f32; 4],
    pub ambient_lighting: [f32; 4],
    pub instance_data: [f32; 4],
    /// `_LD_Params_*` in [`LodLayerKind::ALL`] order. Zero when the layer is disabled.
    pub lod_params: [[f32; 4]; 3],
    /// x = ocean height, y = LOD slice index, z = full-screen effect (0 or 1), w = debug mask view (0 or 1)
    pub params: [f32; 4],
}

impl Default for UnderwaterUniform {
    fn default() -> Self {
        Self {
            inv_view_projection: Mat4::IDENTITY.to_cols_array_2d(),
            inv_view_projection_right: Mat4::IDENTITY.to_cols_array_2d(),
            horizon_pos_normal: [0.0; 4],
            horizon_pos_normal_right: [0.0; 4],
            ambient_lighting: [0.0; 4],
            instance_data: [0.0; 4],
            lod_params: [[0.0; 4]; 3],
            params: [0.0; 4],
        }
    }
}

impl UnderwaterUniform {
    /// Pack the post-process parameters for upload. Unset entries keep their defaults.
    ///
    /// Right-eye entries are only read under dual-projection stereo; otherwise the
    /// left-eye values are repeated, whatever an earlier frame left in `params`.
    pub fn from_params(params: &MaterialParams, stereo_mode: StereoMode) -> Self {
        let inv_vp = params.matrix(SP_INV_VIEW_PROJECTION).unwrap_or(Mat4::IDENTITY);
        let horizon = params.vector(SP_HORIZON_POS_NORMAL).unwrap_or(Vec4::ZERO);
        let (inv_vp_right, horizon_right) = if stereo_mode.uses_dual_projection() {
            (
                params.matrix(SP_INV_VIEW_PROJECTION_RIGHT).unwrap_or(inv_vp),
                params.vector(SP_HORIZON_POS_NORMAL_RIGHT).unwrap_or(horizon),
            )
        } else {
            (inv_vp, horizon)
        };
        let flag = |keyword: &str| if params.is_keyword_enabled(keyword) { 1.0 } else { 0.0 };
        let lod_params = LodLayerKind::ALL
            .map(|kind| params.vector(kind.params_name()).unwrap_or(Vec4::ZERO).to_array());

        Self {
            inv_view_projection: inv_vp.to_cols_array_2d(),
            inv_view_projection_right: inv_vp_right.to_cols_array_2d(),
            horizon_pos_normal: horizon.to_array(),
            horizon_pos_normal_right: horizon_right.to_array(),
            ambient_lighting: params.vector(SP_AMBIENT_LIGHTING).unwrap_or(Vec4::ZERO).to_array(),
            instance_data: params.vector(SP_INSTANCE_DATA).unwrap_or(Vec4::ZERO).to_array(),
            lod_params,
            params: [
                params.float(SP_OCEAN_HEIGHT).unwrap_or(0.0),
                params.float(SP_LD_SLICE_INDEX).unwrap_or(0.0),
                flag(KEYWORD_FULL_SCREEN_EFFECT),
                flag(KEYWORD_DEBUG_VIEW_OCEAN_MASK),
            ],
        }
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Underwater Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn upload(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}
