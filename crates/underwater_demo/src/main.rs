//! Headless underwater demo: dives a camera through the sea plane and renders
//! the ocean mask plus post-process parameters each frame.

use std::sync::Arc;

use anyhow::Result;
use glam::{Vec3, Vec4};
use ocean_core::{Aabb, ShL2};
use underwater::{
    flat_grid, Camera, FrameOutcome, FrustumSource, GpuTargetAllocator, LightProbe, LightProbeSet,
    LodLayerKind, LodLayers, MaskChunk, MaskCommandList, MaskMesh, MaskPipeline, MaterialParams,
    OceanScene, StereoMode, TargetId, TextureLodLayer, UnderwaterConfig, UnderwaterEffect,
    UnderwaterFrame, UnderwaterUniform, UniformSink,
};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
/// Ocean tiles per side around the origin.
const TILES: i32 = 4;
const TILE_SIZE: f32 = 64.0;
const FRAMES: u32 = 8;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = UnderwaterConfig::load();
    if std::env::args().any(|a| a == "--write-config") {
        config.save();
    }
    log::info!("Config: {:?}", config);

    pollster::block_on(run(config))
}

async fn run(config: UnderwaterConfig) -> Result<()> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

    log::info!("Using GPU: {:?}", adapter.get_info().name);

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Underwater Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        )
        .await?;
    let device = Arc::new(device);

    // Ocean surface tiles: one mesh per chunk, the chunk's surface is its mesh index
    let half_height = config.max_vertical_displacement * 0.5;
    let mut meshes = Vec::new();
    let mut chunks = Vec::new();
    for tz in -TILES..TILES {
        for tx in -TILES..TILES {
            let center = [(tx as f32 + 0.5) * TILE_SIZE, (tz as f32 + 0.5) * TILE_SIZE];
            let (vertices, indices) = flat_grid(center, config.sea_level, TILE_SIZE, 16);
            chunks.push(MaskChunk {
                bounds: Aabb::from_center_extents(
                    Vec3::new(center[0], config.sea_level, center[1]),
                    Vec3::new(TILE_SIZE * 0.5, half_height, TILE_SIZE * 0.5),
                ),
                surface: meshes.len(),
            });
            meshes.push(MaskMesh::new(&device, &vertices, &indices));
        }
    }
    log::info!("Ocean: {} chunks", chunks.len());

    let animated_waves = TextureLodLayer {
        kind: LodLayerKind::AnimatedWaves,
        texture: TargetId::next(),
        params: Vec4::new(0.25, 1.0, 0.0, 0.0),
    };
    let sea_floor_depth = TextureLodLayer {
        kind: LodLayerKind::SeaFloorDepth,
        texture: TargetId::next(),
        params: Vec4::new(0.25, 1.0, 0.0, 0.0),
    };
    // Shadows disabled: bound to the null texture
    let layers = LodLayers {
        animated_waves: Some(&animated_waves),
        sea_floor_depth: Some(&sea_floor_depth),
        shadow: None,
    };

    let probes = LightProbeSet::new(vec![
        LightProbe {
            position: Vec3::new(0.0, config.sea_level + 20.0, 0.0),
            sh: ShL2::from_ambient(Vec3::new(0.6, 0.7, 0.8)),
        },
        LightProbe {
            position: Vec3::new(0.0, config.sea_level - 20.0, 0.0),
            sh: ShL2::from_ambient(Vec3::new(0.05, 0.2, 0.3)),
        },
    ]);

    let mut ocean_material = MaterialParams::new();
    ocean_material.set_vector("_DiffuseColour", Vec4::new(0.0, 0.12, 0.2, 1.0));
    ocean_material.set_float("_Smoothness", 0.8);

    let mut effect = UnderwaterEffect::new(
        GpuTargetAllocator::new(device.clone()),
        config.post_process_options(),
    );
    let pipeline = MaskPipeline::new(&device);
    let uniform_buffer = UnderwaterUniform::default().create_buffer(&device);
    let scene_color = TargetId::next();

    let mut camera = Camera::new(Vec3::new(0.0, config.sea_level + 6.0, 20.0));
    camera.set_aspect(WIDTH, HEIGHT);
    camera.set_yaw_pitch(0.0, -0.15);

    let mut commands: MaskCommandList<usize> = MaskCommandList::new();
    let mut material = MaterialParams::new();

    for frame_index in 0..FRAMES {
        // Descend from above the surface to below it
        let t = frame_index as f32 / (FRAMES - 1) as f32;
        camera.transform.position.y = config.sea_level + 6.0 - 12.0 * t;
        // Last frames exercise dual-projection stereo
        camera.stereo_mode = if frame_index + 2 >= FRAMES {
            StereoMode::SinglePass
        } else {
            StereoMode::Mono
        };

        let mut state = config.ocean_state();
        state.viewpoint = camera.position();

        let frame: UnderwaterFrame<'_, MaskCommandList<usize>, MaterialParams> = UnderwaterFrame {
            camera: Some(&camera as &dyn FrustumSource),
            ocean: Some(OceanScene {
                state,
                chunks: &chunks,
                layers,
                ocean_material: Some(&ocean_material),
                probes: &probes,
            }),
            viewport: (WIDTH, HEIGHT),
            source: scene_color,
            mask_material: &(),
        };

        commands.clear();
        let outcome = effect.render_frame(&frame, &mut commands, &mut material)?;
        let FrameOutcome::Rendered { mask, chunks_drawn } = outcome else {
            continue;
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Underwater Frame Encoder"),
        });
        pipeline.execute(&queue, &mut encoder, &commands, effect.targets(), &meshes)?;
        let uniform = UnderwaterUniform::from_params(&material, camera.stereo_mode);
        uniform.upload(&queue, &uniform_buffer);
        queue.submit(std::iter::once(encoder.finish()));

        log::info!(
            "Frame {}: camera y={:.2} {:?}, {} chunks into {}x{} mask, published {:?}",
            frame_index,
            camera.transform.position.y,
            camera.stereo_mode,
            chunks_drawn,
            mask.width,
            mask.height,
            commands.published().map(|(name, _)| name).collect::<Vec<_>>(),
        );
        log::info!(
            "  full screen={} horizon={:?} ambient={:?}",
            uniform.params[2] > 0.5,
            uniform.horizon_pos_normal,
            uniform.ambient_lighting,
        );
    }

    let _ = device.poll(wgpu::Maintain::Wait);
    log::info!("Done");
    Ok(())
}
