/// Minimum accumulated delta magnitude that produces a splat. Filters out
/// sub-pixel jitter while the pointer is held still.
const DEADZONE: f32 = 0.01;

/// One force impulse, consumed by the splat pass.
#[derive(Copy, Clone, Debug)]
pub struct Splat {
    /// Normalized [0,1] position.
    pub position: [f32; 2],
    /// Velocity to add, already scaled by the sensitivity gain.
    pub delta: [f32; 2],
    /// Dye color injected alongside the force.
    pub color: [f32; 3],
}

/// Latest-known pointer state. Moves arriving between frames are coalesced:
/// deltas accumulate and only the newest position is kept, so the frame loop
/// consumes at most one impulse per tick.
///
/// Deliberately device-agnostic — mouse, touch, stylus, or a test harness all
/// drive it the same way.
pub struct Pointer {
    position: [f32; 2],
    delta: [f32; 2],
    active: bool,
    color: [f32; 3],
}

impl Default for Pointer {
    fn default() -> Self {
        Self {
            position: [0.5, 0.5],
            delta: [0.0, 0.0],
            active: false,
            color: [1.0, 1.0, 1.0],
        }
    }
}

impl Pointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Press at a normalized position. Resets the delta so a press far from
    /// the last release does not synthesize a huge impulse.
    pub fn down(&mut self, x: f32, y: f32, color: [f32; 3]) {
        self.active = true;
        self.position = [x, y];
        self.delta = [0.0, 0.0];
        self.color = color;
    }

    pub fn move_to(&mut self, x: f32, y: f32, gain: f32) {
        if self.active {
            self.delta[0] += (x - self.position[0]) * gain;
            self.delta[1] += (y - self.position[1]) * gain;
        }
        self.position = [x, y];
    }

    pub fn up(&mut self) {
        self.active = false;
        self.delta = [0.0, 0.0];
    }

    /// Consumes the pending impulse, if any. Called once per frame by the
    /// pipeline; intermediate positions between frames are intentionally lost.
    pub fn take_impulse(&mut self) -> Option<Splat> {
        if !self.active {
            return None;
        }
        let mag = (self.delta[0] * self.delta[0] + self.delta[1] * self.delta[1]).sqrt();
        if mag <= DEADZONE {
            return None;
        }
        let splat = Splat {
            position: self.position,
            delta: self.delta,
            color: self.color,
        };
        self.delta = [0.0, 0.0];
        Some(splat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_pointer_produces_no_impulse() {
        let mut p = Pointer::new();
        p.move_to(0.5, 0.5, 1.0);
        p.move_to(0.9, 0.9, 1.0);
        assert!(p.take_impulse().is_none());
    }

    #[test]
    fn still_pointer_stays_inside_deadzone() {
        let mut p = Pointer::new();
        p.down(0.5, 0.5, [1.0, 0.0, 0.0]);
        p.move_to(0.501, 0.5, 1.0);
        assert!(p.take_impulse().is_none());
    }

    #[test]
    fn moves_between_frames_coalesce() {
        let mut p = Pointer::new();
        p.down(0.2, 0.5, [1.0, 0.0, 0.0]);
        p.move_to(0.3, 0.5, 1.0);
        p.move_to(0.4, 0.5, 1.0);
        let splat = p.take_impulse().expect("accumulated move exceeds deadzone");
        assert!((splat.delta[0] - 0.2).abs() < 1e-6);
        assert_eq!(splat.position, [0.4, 0.5]);
        // Consumed: a second take in the same frame yields nothing.
        assert!(p.take_impulse().is_none());
    }

    #[test]
    fn release_discards_pending_delta() {
        let mut p = Pointer::new();
        p.down(0.2, 0.2, [0.0, 1.0, 0.0]);
        p.move_to(0.8, 0.8, 1.0);
        p.up();
        assert!(p.take_impulse().is_none());
    }

    #[test]
    fn press_after_release_does_not_jump() {
        let mut p = Pointer::new();
        p.down(0.1, 0.1, [0.0, 0.0, 1.0]);
        p.move_to(0.2, 0.1, 1.0);
        p.up();
        p.down(0.9, 0.9, [0.0, 0.0, 1.0]);
        // No movement since the new press, so no impulse.
        assert!(p.take_impulse().is_none());
    }
}
