//! Real-time GPU fluid canvas: an Eulerian velocity field advected and made
//! divergence-free every frame, driven by pointer input and rendered as a
//! continuously evolving color field.
//!
//! The [`sim`] module is the core and has no window dependency; the remaining
//! modules are the demo host shell (winit surface, egui settings panel).

pub mod app;
pub mod gui;
pub mod sim;
pub mod state;
pub mod wgpu_init;
