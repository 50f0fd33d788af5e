/// Clamps host frame deltas before they reach the advection stage. A stalled
/// frame (backgrounded window, debugger pause) must not produce a huge
/// backtrace distance.
pub struct SimClock {
    max_dt: f32,
    frame: u64,
}

impl SimClock {
    pub fn new(max_dt: f32) -> Self {
        Self { max_dt, frame: 0 }
    }

    pub fn set_max_dt(&mut self, max_dt: f32) {
        self.max_dt = max_dt;
    }

    /// Returns the effective timestep for this frame.
    pub fn tick(&mut self, delta_seconds: f32) -> f32 {
        self.frame += 1;
        if !delta_seconds.is_finite() || delta_seconds < 0.0 {
            return self.max_dt;
        }
        delta_seconds.min(self.max_dt)
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stall_clamps_to_ceiling() {
        let mut clock = SimClock::new(1.0 / 60.0);
        assert_eq!(clock.tick(5.0), 1.0 / 60.0);
    }

    #[test]
    fn fast_frames_pass_through() {
        let mut clock = SimClock::new(1.0 / 60.0);
        let dt = clock.tick(1.0 / 144.0);
        assert!((dt - 1.0 / 144.0).abs() < f32::EPSILON);
    }

    #[test]
    fn garbage_deltas_fall_back_to_ceiling() {
        let mut clock = SimClock::new(1.0 / 60.0);
        assert_eq!(clock.tick(f32::NAN), 1.0 / 60.0);
        assert_eq!(clock.tick(-1.0), 1.0 / 60.0);
        assert_eq!(clock.frame(), 2);
    }
}
