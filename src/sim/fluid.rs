use anyhow::Context;

use crate::sim::config::SimConfig;
use crate::sim::pipelines::advect::AdvectPipeline;
use crate::sim::pipelines::project::ProjectPipeline;
use crate::sim::pipelines::splat::SplatPipeline;
use crate::sim::pointer::Splat;
use crate::sim::texture::{DoubleBuffer, FieldTexture};

/// Owns the field buffers and compute pipelines and runs the fixed per-frame
/// stage order: force injection, advection, divergence, pressure relaxation,
/// gradient subtraction. The order is load-bearing; each stage reads the
/// output of the previous one on the same queue.
///
/// Every stage is also exposed on its own so tests can measure the fields
/// between stages.
pub struct FluidSim {
    velocity: DoubleBuffer,
    dye: DoubleBuffer,
    pressure: DoubleBuffer,
    divergence: FieldTexture,
    splat_pipeline: SplatPipeline,
    advect_pipeline: AdvectPipeline,
    project_pipeline: ProjectPipeline,
}

impl FluidSim {
    pub fn new(
        device: &wgpu::Device,
        sim_resolution: u32,
        dye_resolution: u32,
    ) -> anyhow::Result<Self> {
        let velocity = DoubleBuffer::new(
            device,
            sim_resolution,
            sim_resolution,
            wgpu::TextureFormat::Rg32Float,
            "Velocity",
        );
        let dye = DoubleBuffer::new(
            device,
            dye_resolution,
            dye_resolution,
            wgpu::TextureFormat::Rgba32Float,
            "Dye",
        );
        let pressure = DoubleBuffer::new(
            device,
            sim_resolution,
            sim_resolution,
            wgpu::TextureFormat::R32Float,
            "Pressure",
        );
        // Fully recomputed every frame from velocity, so single-buffered.
        let divergence = FieldTexture::new(
            device,
            sim_resolution,
            sim_resolution,
            wgpu::TextureFormat::R32Float,
            Some("Divergence"),
        );

        let splat_pipeline = SplatPipeline::new(device).context("splat stage")?;
        let advect_pipeline = AdvectPipeline::new(device).context("advection stage")?;
        let project_pipeline = ProjectPipeline::new(device).context("projection stage")?;

        Ok(Self {
            velocity,
            dye,
            pressure,
            divergence,
            splat_pipeline,
            advect_pipeline,
            project_pipeline,
        })
    }

    /// Current (authoritative) velocity field.
    pub fn velocity(&self) -> &FieldTexture {
        self.velocity.read()
    }

    pub fn dye(&self) -> &FieldTexture {
        self.dye.read()
    }

    pub fn divergence(&self) -> &FieldTexture {
        &self.divergence
    }

    pub fn sim_resolution(&self) -> u32 {
        self.velocity.width()
    }

    pub fn dye_resolution(&self) -> u32 {
        self.dye.width()
    }

    /// Stage 1: Gaussian impulse into velocity and dye.
    pub fn inject(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        splat: &Splat,
        radius: f32,
    ) {
        self.splat_pipeline.write_uniforms(queue, splat, radius);
        self.splat_pipeline.dispatch_velocity(device, encoder, &self.velocity);
        self.velocity.swap();
        self.splat_pipeline.dispatch_dye(device, encoder, &self.dye);
        self.dye.swap();
    }

    /// Stage 2: semi-Lagrangian transport of velocity, then dye.
    pub fn advect(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        dt: f32,
        velocity_dissipation: f32,
        dye_dissipation: f32,
    ) {
        self.advect_pipeline
            .dispatch_velocity(device, queue, encoder, &self.velocity, dt, velocity_dissipation);
        self.velocity.swap();
        self.advect_pipeline.dispatch_field(
            device,
            queue,
            encoder,
            self.velocity.read(),
            &self.dye,
            dt,
            dye_dissipation,
        );
        self.dye.swap();
    }

    /// Stage 3: central-difference divergence of the current velocity.
    pub fn compute_divergence(&self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder) {
        self.project_pipeline
            .dispatch_divergence(device, encoder, self.velocity.read(), &self.divergence);
    }

    /// Stage 4: zero the pressure field, then relax it `iterations` times.
    /// No warm start — the solve restarts from scratch every frame.
    pub fn solve_pressure(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        iterations: u32,
    ) {
        self.project_pipeline.dispatch_clear(device, encoder, self.pressure.write());
        self.pressure.swap();
        for _ in 0..iterations {
            self.project_pipeline
                .dispatch_jacobi(device, encoder, &self.pressure, &self.divergence);
            self.pressure.swap();
        }
    }

    /// Stage 5: subtract the pressure gradient, leaving velocity
    /// approximately divergence-free.
    pub fn subtract_gradient(&mut self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder) {
        self.project_pipeline
            .dispatch_subtract(device, encoder, self.pressure.read(), &self.velocity);
        self.velocity.swap();
    }

    /// Runs stages 1–5 in order for one frame.
    pub fn step(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        dt: f32,
        impulse: Option<&Splat>,
        config: &SimConfig,
    ) {
        if let Some(splat) = impulse {
            self.inject(device, queue, encoder, splat, config.splat_radius());
        }
        self.advect(
            device,
            queue,
            encoder,
            dt,
            config.velocity_dissipation(),
            config.dye_dissipation(),
        );
        self.compute_divergence(device, encoder);
        self.solve_pressure(device, encoder, config.pressure_iterations());
        self.subtract_gradient(device, encoder);
    }

    /// Reallocates all fields at new resolutions. Contents are lost; the
    /// field visually reconverges within a few frames.
    pub fn resize(&mut self, device: &wgpu::Device, sim_resolution: u32, dye_resolution: u32) {
        self.velocity
            .resize(device, sim_resolution, sim_resolution, "Velocity");
        self.pressure
            .resize(device, sim_resolution, sim_resolution, "Pressure");
        self.dye.resize(device, dye_resolution, dye_resolution, "Dye");
        self.divergence = FieldTexture::new(
            device,
            sim_resolution,
            sim_resolution,
            wgpu::TextureFormat::R32Float,
            Some("Divergence"),
        );
    }

    /// Re-zeroes every field without reallocating.
    pub fn clear(&self, queue: &wgpu::Queue) {
        self.velocity.clear(queue);
        self.dye.clear(queue);
        self.pressure.clear(queue);
        self.divergence.clear(queue);
    }
}
