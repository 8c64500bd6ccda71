use thiserror::Error;

use crate::program::Stage;

/// Failures while bringing up the window, the device or the shader program.
/// None of them are recoverable; the frame loop must not start.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("pixel buffer side {0} is smaller than 256")]
    BufferSize(u32),
    #[error("WindowBuilder::build failed: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("Instance::request_adapter found no adapter compatible with the surface")]
    NoAdapter,
    #[error("Adapter::request_device failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported texture formats")]
    NoSurfaceFormat,
    #[error("Device::create_shader_module ({stage}) failed: {message}")]
    Compile { stage: Stage, message: String },
    #[error("Device::create_render_pipeline ({label}) failed: {message}")]
    Link { label: &'static str, message: String },
}

/// Failures while presenting a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Surface::get_current_texture failed: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
