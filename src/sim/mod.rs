//! GPU-resident Eulerian fluid simulation: a velocity field advected and
//! projected divergence-free every frame, driven by pointer impulses and
//! drawn as a continuously evolving color field.

pub mod canvas;
pub mod clock;
pub mod config;
pub mod fluid;
pub mod pipelines;
pub mod pointer;
pub mod texture;

pub use canvas::FluidCanvas;
pub use clock::SimClock;
pub use config::{ColorMode, SimConfig};
pub use fluid::FluidSim;
pub use pointer::{Pointer, Splat};
pub use texture::{DoubleBuffer, FieldTexture};
