//! Headless pipeline tests. Each test acquires its own device and skips with
//! a message when no adapter (or the float32-filterable feature) is
//! available, so the suite stays green on GPU-less runners.

use fluid_canvas::sim::{DoubleBuffer, FieldTexture, FluidCanvas, FluidSim, SimConfig, Splat};

fn gpu() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::None,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .ok()?;
    if !adapter
        .features()
        .contains(wgpu::Features::FLOAT32_FILTERABLE)
    {
        eprintln!("skipping: adapter lacks FLOAT32_FILTERABLE");
        return None;
    }
    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("test device"),
        required_features: wgpu::Features::FLOAT32_FILTERABLE,
        experimental_features: wgpu::ExperimentalFeatures::disabled(),
        required_limits: wgpu::Limits::default(),
        memory_hints: Default::default(),
        trace: wgpu::Trace::Off,
    }))
    .ok()
}

macro_rules! require_gpu {
    () => {
        match gpu() {
            Some(pair) => pair,
            None => {
                eprintln!("skipping: no compatible GPU adapter");
                return;
            }
        }
    };
}

/// Copies a field texture back to the CPU as a flat f32 vector (row-major,
/// channels interleaved).
fn read_field(device: &wgpu::Device, queue: &wgpu::Queue, field: &FieldTexture) -> Vec<f32> {
    let bytes_per_pixel = field
        .format
        .block_copy_size(None)
        .expect("uncompressed format");
    let unpadded = field.width * bytes_per_pixel;
    let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback"),
        size: (padded * field.height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &field.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(field.height),
            },
        },
        wgpu::Extent3d {
            width: field.width,
            height: field.height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).expect("map result");
    });
    device.poll(wgpu::PollType::wait_indefinitely()).expect("device poll");
    rx.recv().expect("map callback").expect("buffer map");

    let data = slice.get_mapped_range();
    let mut out = Vec::with_capacity((field.width * field.height * bytes_per_pixel / 4) as usize);
    for row in 0..field.height {
        let start = (row * padded) as usize;
        let end = start + unpadded as usize;
        out.extend_from_slice(bytemuck::cast_slice(&data[start..end]));
    }
    out
}

fn mean_abs(values: &[f32]) -> f32 {
    values.iter().map(|v| v.abs()).sum::<f32>() / values.len() as f32
}

/// Sum of squared velocity magnitudes from an rg readback.
fn kinetic_energy(velocity: &[f32]) -> f32 {
    velocity
        .chunks_exact(2)
        .map(|v| v[0] * v[0] + v[1] * v[1])
        .sum()
}

fn magnitude_at(velocity: &[f32], width: u32, x: u32, y: u32) -> f32 {
    let i = ((y * width + x) * 2) as usize;
    (velocity[i] * velocity[i] + velocity[i + 1] * velocity[i + 1]).sqrt()
}

fn test_config() -> SimConfig {
    let mut cfg = SimConfig::default();
    cfg.set_sim_resolution(64);
    cfg.set_dye_resolution(64);
    cfg.set_dissipation(0.99, 0.98);
    cfg.set_iterations(20);
    cfg.set_splat_radius(0.01);
    cfg
}

fn center_splat() -> Splat {
    Splat {
        position: [0.5, 0.5],
        delta: [1.0, 0.0],
        color: [1.0, 0.4, 0.1],
    }
}

#[test]
fn splat_is_local() {
    let (device, queue) = require_gpu!();
    let mut sim = FluidSim::new(&device, 64, 64).expect("sim init");

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    sim.inject(&device, &queue, &mut encoder, &center_splat(), 0.01);
    queue.submit(Some(encoder.finish()));

    let velocity = read_field(&device, &queue, sim.velocity());
    let center = magnitude_at(&velocity, 64, 32, 32);
    let far = magnitude_at(&velocity, 64, 3, 3);

    assert!(center > 0.5, "center magnitude {center} too small");
    assert!(far < 1e-5, "distant cell perturbed: {far}");
}

#[test]
fn projection_reduces_divergence() {
    let (device, queue) = require_gpu!();
    let mut sim = FluidSim::new(&device, 64, 64).expect("sim init");
    let cfg = test_config();

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    sim.inject(&device, &queue, &mut encoder, &center_splat(), cfg.splat_radius());
    sim.advect(&device, &queue, &mut encoder, 1.0 / 60.0, 1.0, 1.0);
    sim.compute_divergence(&device, &mut encoder);
    queue.submit(Some(encoder.finish()));
    let pre = mean_abs(&read_field(&device, &queue, sim.divergence()));
    assert!(pre > 0.0, "test field should start divergent");

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    sim.solve_pressure(&device, &mut encoder, cfg.pressure_iterations());
    sim.subtract_gradient(&device, &mut encoder);
    sim.compute_divergence(&device, &mut encoder);
    queue.submit(Some(encoder.finish()));
    let post = mean_abs(&read_field(&device, &queue, sim.divergence()));

    assert!(
        post < pre * 0.8,
        "projection did not reduce divergence: {pre} -> {post}"
    );
}

#[test]
fn velocity_decays_without_input() {
    let (device, queue) = require_gpu!();
    let mut sim = FluidSim::new(&device, 64, 64).expect("sim init");
    let cfg = test_config();

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    sim.step(
        &device,
        &queue,
        &mut encoder,
        1.0 / 60.0,
        Some(&center_splat()),
        &cfg,
    );
    queue.submit(Some(encoder.finish()));

    let mut previous = mean_abs(&read_field(&device, &queue, sim.velocity()));
    assert!(previous > 0.0);

    for _ in 0..10 {
        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        sim.step(&device, &queue, &mut encoder, 1.0 / 60.0, None, &cfg);
        queue.submit(Some(encoder.finish()));

        let current = mean_abs(&read_field(&device, &queue, sim.velocity()));
        assert!(
            current <= previous + 1e-4,
            "mean |v| increased without input: {previous} -> {current}"
        );
        previous = current;
    }
}

#[test]
fn impulse_energy_rises_then_decays() {
    let (device, queue) = require_gpu!();
    let mut sim = FluidSim::new(&device, 64, 64).expect("sim init");
    let cfg = test_config();

    let baseline = kinetic_energy(&read_field(&device, &queue, sim.velocity()));
    assert_eq!(baseline, 0.0, "field must start at rest");

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    sim.inject(&device, &queue, &mut encoder, &center_splat(), cfg.splat_radius());
    queue.submit(Some(encoder.finish()));
    let peak = kinetic_energy(&read_field(&device, &queue, sim.velocity()));
    assert!(peak > baseline, "injection must add energy");

    let mut previous = peak;
    for frame in 1..=60u32 {
        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        sim.step(&device, &queue, &mut encoder, 1.0 / 60.0, None, &cfg);
        queue.submit(Some(encoder.finish()));

        let energy = kinetic_energy(&read_field(&device, &queue, sim.velocity()));
        assert!(
            energy <= previous * 1.001,
            "energy rose without input at frame {frame}: {previous} -> {energy}"
        );
        previous = energy;
    }

    // Dissipation 0.99 alone leaves 0.99^120 ~ 0.30 of the injected energy
    // after 60 frames; projection removes at most the irrotational half of
    // the splat. 0.35 is the tightest bound those parameters guarantee.
    assert!(
        previous < peak * 0.35,
        "energy failed to decay: peak {peak}, frame 60 {previous}"
    );
}

#[test]
fn double_buffer_swap_moves_no_data() {
    let (device, queue) = require_gpu!();
    let buffer = DoubleBuffer::new(&device, 8, 8, wgpu::TextureFormat::Rg32Float, "Swap Test");

    let pattern: Vec<f32> = (0..8 * 8 * 2).map(|i| i as f32).collect();
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &buffer.read().texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(&pattern),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(8 * 8),
            rows_per_image: Some(8),
        },
        wgpu::Extent3d {
            width: 8,
            height: 8,
            depth_or_array_layers: 1,
        },
    );

    let mut buffer = buffer;
    buffer.swap();
    // After one swap the freshly allocated (zeroed) half is current.
    let other = read_field(&device, &queue, buffer.read());
    assert!(other.iter().all(|&v| v == 0.0));

    buffer.swap();
    // Two swaps restore the original assignment, contents intact.
    let restored = read_field(&device, &queue, buffer.read());
    assert_eq!(restored, pattern);
}

#[test]
fn grid_reallocation_preserves_config() {
    let (device, queue) = require_gpu!();
    let mut canvas = FluidCanvas::new(
        &device,
        wgpu::TextureFormat::Rgba8UnormSrgb,
        test_config(),
    )
    .expect("canvas init");
    assert_eq!(canvas.solver_resolution(), 64);

    canvas.config_mut().set_sim_resolution(128);
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    canvas.step(&device, &queue, &mut encoder, 1.0 / 60.0);
    queue.submit(Some(encoder.finish()));

    // Buffers changed size; the frame advanced once and every other knob is
    // untouched.
    assert_eq!(canvas.frame(), 1);
    assert_eq!(canvas.solver_resolution(), 128);
    assert_eq!(canvas.config().velocity_dissipation(), 0.99);
    assert_eq!(canvas.config().dye_dissipation(), 0.98);
    assert_eq!(canvas.config().pressure_iterations(), 20);
    assert_eq!(canvas.config().splat_radius(), 0.01);
}
