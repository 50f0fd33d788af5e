/// Color mapping applied by the display pass. A fixed, precompiled set —
/// switching modes updates a uniform, never recompiles a shader.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Velocity,
    Rainbow,
    Fire,
    Ocean,
    Neon,
}

impl ColorMode {
    pub const ALL: [ColorMode; 5] = [
        ColorMode::Velocity,
        ColorMode::Rainbow,
        ColorMode::Fire,
        ColorMode::Ocean,
        ColorMode::Neon,
    ];

    pub fn index(self) -> u32 {
        match self {
            ColorMode::Velocity => 0,
            ColorMode::Rainbow => 1,
            ColorMode::Fire => 2,
            ColorMode::Ocean => 3,
            ColorMode::Neon => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorMode::Velocity => "Velocity",
            ColorMode::Rainbow => "Rainbow",
            ColorMode::Fire => "Fire",
            ColorMode::Ocean => "Ocean",
            ColorMode::Neon => "Neon",
        }
    }
}

/// Tunable simulation parameters. The settings layer mutates this through the
/// validating setters; the pipeline only ever reads the current values.
///
/// Resolution changes are observed at the top of the next `step()` and routed
/// through buffer reallocation, never applied mid-pass.
#[derive(Clone, Debug)]
pub struct SimConfig {
    sim_resolution: u32,
    dye_resolution: u32,
    velocity_dissipation: f32,
    dye_dissipation: f32,
    pressure_iterations: u32,
    splat_radius: f32,
    splat_force: f32,
    brightness: f32,
    color_mode: ColorMode,
    max_dt: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sim_resolution: 256,
            dye_resolution: 512,
            velocity_dissipation: 0.99,
            dye_dissipation: 0.98,
            pressure_iterations: 20,
            splat_radius: 0.01,
            splat_force: 6.0,
            brightness: 1.0,
            color_mode: ColorMode::default(),
            max_dt: 1.0 / 60.0,
        }
    }
}

impl SimConfig {
    pub fn sim_resolution(&self) -> u32 {
        self.sim_resolution
    }

    pub fn dye_resolution(&self) -> u32 {
        self.dye_resolution
    }

    pub fn velocity_dissipation(&self) -> f32 {
        self.velocity_dissipation
    }

    pub fn dye_dissipation(&self) -> f32 {
        self.dye_dissipation
    }

    pub fn pressure_iterations(&self) -> u32 {
        self.pressure_iterations
    }

    pub fn splat_radius(&self) -> f32 {
        self.splat_radius
    }

    pub fn splat_force(&self) -> f32 {
        self.splat_force
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn max_dt(&self) -> f32 {
        self.max_dt
    }

    pub fn set_sim_resolution(&mut self, cells: u32) {
        self.sim_resolution = clamp_u32("sim_resolution", cells, 16, 2048);
    }

    pub fn set_dye_resolution(&mut self, cells: u32) {
        self.dye_resolution = clamp_u32("dye_resolution", cells, 16, 4096);
    }

    /// Per-frame multiplicative decay factors in (0, 1].
    pub fn set_dissipation(&mut self, velocity: f32, dye: f32) {
        self.velocity_dissipation = clamp_f32("velocity_dissipation", velocity, 0.5, 1.0);
        self.dye_dissipation = clamp_f32("dye_dissipation", dye, 0.5, 1.0);
    }

    pub fn set_iterations(&mut self, n: u32) {
        self.pressure_iterations = clamp_u32("pressure_iterations", n, 1, 200);
    }

    /// Gaussian falloff scale of an injected splat, in normalized grid units.
    pub fn set_splat_radius(&mut self, r: f32) {
        self.splat_radius = clamp_f32("splat_radius", r, 1e-4, 1.0);
    }

    pub fn set_splat_force(&mut self, gain: f32) {
        self.splat_force = clamp_f32("splat_force", gain, 0.1, 100.0);
    }

    pub fn set_brightness(&mut self, b: f32) {
        self.brightness = clamp_f32("brightness", b, 0.0, 10.0);
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        self.color_mode = mode;
    }

    pub fn set_max_dt(&mut self, ceiling: f32) {
        self.max_dt = clamp_f32("max_dt", ceiling, 1.0 / 240.0, 1.0 / 15.0);
    }
}

fn clamp_f32(name: &str, value: f32, min: f32, max: f32) -> f32 {
    if !value.is_finite() {
        log::warn!("{name}: rejecting non-finite value {value}, keeping {min}");
        return min;
    }
    if value < min || value > max {
        log::warn!("{name}: {value} outside [{min}, {max}], clamping");
    }
    value.clamp(min, max)
}

fn clamp_u32(name: &str, value: u32, min: u32, max: u32) -> u32 {
    if value < min || value > max {
        log::warn!("{name}: {value} outside [{min}, {max}], clamping");
    }
    value.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp_out_of_range_values() {
        let mut cfg = SimConfig::default();
        cfg.set_iterations(0);
        assert_eq!(cfg.pressure_iterations(), 1);
        cfg.set_iterations(10_000);
        assert_eq!(cfg.pressure_iterations(), 200);
        cfg.set_splat_radius(0.0);
        assert!(cfg.splat_radius() > 0.0);
        cfg.set_dissipation(1.5, -2.0);
        assert_eq!(cfg.velocity_dissipation(), 1.0);
        assert_eq!(cfg.dye_dissipation(), 0.5);
        cfg.set_brightness(-1.0);
        assert_eq!(cfg.brightness(), 0.0);
    }

    #[test]
    fn setters_reject_nan() {
        let mut cfg = SimConfig::default();
        cfg.set_splat_radius(f32::NAN);
        assert!(cfg.splat_radius().is_finite());
        cfg.set_dissipation(f32::INFINITY, 0.9);
        assert!(cfg.velocity_dissipation().is_finite());
    }

    #[test]
    fn resolution_setters_keep_other_fields() {
        let mut cfg = SimConfig::default();
        cfg.set_dissipation(0.95, 0.9);
        cfg.set_iterations(30);
        cfg.set_splat_radius(0.02);
        cfg.set_sim_resolution(64);
        cfg.set_dye_resolution(128);
        assert_eq!(cfg.velocity_dissipation(), 0.95);
        assert_eq!(cfg.dye_dissipation(), 0.9);
        assert_eq!(cfg.pressure_iterations(), 30);
        assert_eq!(cfg.splat_radius(), 0.02);
    }
}
