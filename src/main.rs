mod attractor;
mod command_buffer;
mod command_encoder;
mod config;
mod error;
mod pipeline;
mod pixel;
mod program;
mod quad;
mod renderer;
mod screen;
mod typed_buffer;
mod var;

use log::{error, warn};
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

use crate::{
    attractor::AttractorState,
    config::{FrameSettings, TEXTURE_SIZE, WINDOW_TITLE},
    error::{FrameError, InitError},
    pipeline::FrameUpdatePipeline,
    pixel::PixelBuffer,
    renderer::Renderer,
};

fn init(event_loop: &EventLoop<()>) -> Result<(Window, FrameUpdatePipeline<Renderer>), InitError> {
    // The fragment stage maps window pixels 1:1 onto the texture, so start the window at its size.
    let window = WindowBuilder::new()
        .with_title(WINDOW_TITLE)
        .with_inner_size(PhysicalSize::new(TEXTURE_SIZE, TEXTURE_SIZE))
        .build(event_loop)?;

    let pixels = PixelBuffer::new(TEXTURE_SIZE)?;
    let renderer = Renderer::new(&window, &pixels)?;

    let pipeline = FrameUpdatePipeline::new(
        pixels,
        AttractorState::new(),
        renderer,
        FrameSettings::default(),
    );
    Ok((window, pipeline))
}

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new();
    let (window, mut pipeline) = match init(&event_loop) {
        Ok(initialised) => initialised,
        Err(err) => {
            error!("initialisation failed: {}", err);
            std::process::exit(1);
        }
    };

    event_loop.run(move |event, _, control_flow| {
        // To present frames in realtime, *don't* set `control_flow` to `Wait`.
        match event {
            Event::MainEventsCleared => {
                window.request_redraw();
            }
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(size) => {
                    pipeline.presenter_mut().resize(size.width, size.height);
                }
                WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                    pipeline
                        .presenter_mut()
                        .resize(new_inner_size.width, new_inner_size.height);
                }
                _ => {}
            },
            Event::RedrawRequested(window_id) if window_id == window.id() => {
                match pipeline.update_frame() {
                    Ok(()) => {}
                    Err(FrameError::Surface(
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                    )) => {
                        warn!("surface lost or outdated, reconfiguring");
                        pipeline.presenter_mut().reconfigure();
                    }
                    Err(FrameError::Surface(wgpu::SurfaceError::Timeout)) => {
                        warn!("timed out acquiring the next frame, skipping it");
                    }
                    Err(err) => {
                        error!("{}", err);
                        *control_flow = ControlFlow::Exit;
                    }
                }
            }
            _ => {}
        }
    });
}
