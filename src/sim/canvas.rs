use anyhow::Context;
use rand::Rng;

use crate::sim::clock::SimClock;
use crate::sim::config::SimConfig;
use crate::sim::fluid::FluidSim;
use crate::sim::pipelines::display::DisplayPipeline;
use crate::sim::pointer::Pointer;

/// The whole fluid subsystem as one explicitly owned object: solver, display
/// pass, clock, pointer state, and the config port. The host instantiates it,
/// forwards normalized pointer events, and calls `step` + `render` once per
/// display refresh; it never schedules its own timer.
pub struct FluidCanvas {
    sim: FluidSim,
    display: DisplayPipeline,
    clock: SimClock,
    pointer: Pointer,
    config: SimConfig,
    clear_requested: bool,
}

impl FluidCanvas {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        config: SimConfig,
    ) -> anyhow::Result<Self> {
        let sim = FluidSim::new(device, config.sim_resolution(), config.dye_resolution())
            .context("fluid solver init")?;
        let display = DisplayPipeline::new(device, surface_format).context("display init")?;
        let clock = SimClock::new(config.max_dt());

        log::info!(
            "fluid canvas up: {0}x{0} solver grid, {1}x{1} dye grid",
            config.sim_resolution(),
            config.dye_resolution()
        );

        Ok(Self {
            sim,
            display,
            clock,
            pointer: Pointer::new(),
            config,
            clear_requested: false,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The settings layer mutates parameters through here at any time; the
    /// pipeline reads the current values at the point each stage executes.
    pub fn config_mut(&mut self) -> &mut SimConfig {
        &mut self.config
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        let mut rng = rand::rng();
        let color = [
            rng.random_range(0.2..1.0),
            rng.random_range(0.2..1.0),
            rng.random_range(0.2..1.0),
        ];
        self.pointer.down(x, y, color);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.pointer.move_to(x, y, self.config.splat_force());
    }

    pub fn pointer_up(&mut self) {
        self.pointer.up();
    }

    /// Re-zero all fields before the next step.
    pub fn request_clear(&mut self) {
        self.clear_requested = true;
    }

    /// Advances the simulation one frame. Grid reallocation requested through
    /// the config port is applied here, never mid-pass.
    pub fn step(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        delta_seconds: f32,
    ) {
        if self.sim.sim_resolution() != self.config.sim_resolution()
            || self.sim.dye_resolution() != self.config.dye_resolution()
        {
            log::info!(
                "reallocating grids: {} -> {} (dye {} -> {})",
                self.sim.sim_resolution(),
                self.config.sim_resolution(),
                self.sim.dye_resolution(),
                self.config.dye_resolution()
            );
            self.sim.resize(
                device,
                self.config.sim_resolution(),
                self.config.dye_resolution(),
            );
        }

        if self.clear_requested {
            self.sim.clear(queue);
            self.clear_requested = false;
        }

        self.clock.set_max_dt(self.config.max_dt());
        let dt = self.clock.tick(delta_seconds);
        let impulse = self.pointer.take_impulse();
        self.sim
            .step(device, queue, encoder, dt, impulse.as_ref(), &self.config);
    }

    /// Draws the current fields to the surface.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) {
        self.display.draw(
            device,
            queue,
            encoder,
            target,
            self.sim.velocity(),
            self.sim.dye(),
            &self.config,
        );
    }

    pub fn frame(&self) -> u64 {
        self.clock.frame()
    }

    /// Side of the currently allocated solver grid.
    pub fn solver_resolution(&self) -> u32 {
        self.sim.sim_resolution()
    }
}
