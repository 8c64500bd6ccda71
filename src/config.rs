//! Fixed tuning knobs for the simulation and the renderer.

/// Side length of the square pixel buffer and of the texture it is uploaded to.
pub const TEXTURE_SIZE: u32 = 512;

/// Multiplier applied to every channel at the start of each frame.
pub const DECAY_FACTOR: f64 = 0.9;

/// Map iterations plotted per frame.
pub const ITERATIONS_PER_FRAME: usize = 100_000;

/// Per-frame increments of the two phase accumulators. They differ so the
/// parameters never fall into lock-step.
pub const PHASE_STEP_E: f64 = 0.01;
pub const PHASE_STEP_F: f64 = 0.011;

/// Alpha written by the attractor fragment stage when blending into the trail target.
///
/// Corresponds to `attractor.wgsl#TRAIL_ALPHA`.
pub const TRAIL_ALPHA: f64 = 0.001;

pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

pub const WINDOW_TITLE: &str = "wgpu-attractor";

/// Per-frame work done by [`crate::pipeline::FrameUpdatePipeline`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSettings {
    pub decay_factor: f64,
    pub iterations: usize,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            decay_factor: DECAY_FACTOR,
            iterations: ITERATIONS_PER_FRAME,
        }
    }
}
