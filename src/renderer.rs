//! Presents a [`PixelBuffer`] through `wgpu`.
//!
//! Each frame the buffer is uploaded to a texture and drawn over a full-screen quad
//! into the *trail target*, an offscreen texture that is never cleared. The attractor
//! program writes a tiny constant alpha with alpha blending, so the trail target
//! keeps a slowly fading history of earlier frames. A second program copies the
//! trail target onto the swap chain texture, which is cleared every frame and
//! doesn't need to retain anything between presents.

use std::num::NonZeroU32;

use log::{debug, info};
use winit::window::Window;

use crate::{
    command_buffer,
    command_encoder::CommandEncoderExt,
    config::{CLEAR_COLOR, TRAIL_ALPHA},
    error::{FrameError, InitError},
    pipeline::Presenter,
    pixel::PixelBuffer,
    program::{self, GpuProgram, Stage},
    quad::{Vertex, QUAD},
    screen, typed_buffer,
    var::{self, Var},
};

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Half floats, because an 8-bit target would round away increments of `TRAIL_ALPHA`.
const TRAIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

struct Trail {
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

impl Trail {
    fn new(device: &wgpu::Device, present_program: &GpuProgram, size: screen::Size) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("trail-texture"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TRAIL_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = present_program.bind(
            device,
            "present-bind-group",
            vec![wgpu::BindingResource::TextureView(&view)],
        );

        Self { view, bind_group }
    }
}

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_configuration: wgpu::SurfaceConfiguration,
    attractor_program: GpuProgram,
    present_program: GpuProgram,
    texture: wgpu::Texture,
    texture_size: u32,
    attractor_bind_group: wgpu::BindGroup,
    screen: Var<screen::Uniforms>,
    quad: typed_buffer::Buffer<Vertex>,
    trail: Trail,
    /// Swap chain texture acquired by [`Presenter::clear`] and presented by [`Presenter::draw`].
    frame: Option<wgpu::SurfaceTexture>,
}

impl Renderer {
    /// Acquire a surface for `window`, build both programs and upload `pixels` once.
    ///
    /// The window should be about `pixels.side()` square; see `attractor.frag.wgsl`.
    pub fn new(window: &Window, pixels: &PixelBuffer) -> Result<Self, InitError> {
        let size = window.inner_size();
        let texture_size = pixels.side() as u32;

        let instance = wgpu::Instance::new(wgpu::Backends::all());
        let surface = unsafe { instance.create_surface(window) };

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: Default::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        }))
        .ok_or(InitError::NoAdapter)?;
        info!("using adapter {:?}", adapter.get_info());

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("device"),
                features: wgpu::Features::empty(),
                limits: wgpu::Limits::default(),
            },
            None,
        ))?;

        let format = surface
            .get_supported_formats(&adapter)
            .first()
            .copied()
            .ok_or(InitError::NoSurfaceFormat)?;
        debug!("surface format {:?}", format);

        let surface_configuration = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
        };
        surface.configure(&device, &surface_configuration);

        let vertex_shader = program::compile(
            &device,
            Stage::Vertex,
            "quad-vertex-shader",
            include_str!("quad.vert.wgsl"),
        )?;
        let attractor_shader = program::compile(
            &device,
            Stage::Fragment,
            "attractor-fragment-shader",
            include_str!("attractor.frag.wgsl"),
        )?;
        let present_shader = program::compile(
            &device,
            Stage::Fragment,
            "present-fragment-shader",
            include_str!("present.frag.wgsl"),
        )?;

        let attractor_program = program::link(
            &device,
            program::Descriptor {
                label: "attractor-program",
                vertex: &vertex_shader,
                fragment: &attractor_shader,
                vertex_buffers: &[Vertex::layout()],
                uniforms: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
                target: wgpu::ColorTargetState {
                    format: TRAIL_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                },
            },
        )?;

        let present_program = program::link(
            &device,
            program::Descriptor {
                label: "present-program",
                vertex: &vertex_shader,
                fragment: &present_shader,
                vertex_buffers: &[Vertex::layout()],
                uniforms: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                }],
                target: wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                },
            },
        )?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("attractor-texture"),
            size: texture_extent(texture_size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        });
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("attractor-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let viewport = screen::Size {
            width: surface_configuration.width,
            height: surface_configuration.height,
        };
        let screen = var::Builder::new(screen::Uniforms {
            texture: screen::Size {
                width: texture_size,
                height: texture_size,
            },
            viewport,
        })
        .with_label("screen-uniforms")
        .create(&device);

        let attractor_bind_group = attractor_program.bind(
            &device,
            "attractor-bind-group",
            vec![
                wgpu::BindingResource::TextureView(&texture_view),
                wgpu::BindingResource::Sampler(&sampler),
                screen.binding_resource(),
            ],
        );

        let quad = typed_buffer::Builder::from(&QUAD[..])
            .with_label("quad-vertex-buffer")
            .with_usage(wgpu::BufferUsages::VERTEX)
            .create(&device);

        let trail = Trail::new(&device, &present_program, viewport);

        let renderer = Self {
            surface,
            device,
            queue,
            surface_configuration,
            attractor_program,
            present_program,
            texture,
            texture_size,
            attractor_bind_group,
            screen,
            quad,
            trail,
            frame: None,
        };
        renderer.upload(pixels);

        info!(
            "renderer ready: {}x{} texture, {}x{} surface, trail alpha {}",
            texture_size, texture_size, viewport.width, viewport.height, TRAIL_ALPHA
        );
        Ok(renderer)
    }

    /// Follow a window resize. The trail target is recreated, so the history is lost.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            debug!("ignoring resize to {}x{}", width, height);
            return;
        }
        debug!("resizing to {}x{}", width, height);

        self.frame = None;
        self.surface_configuration.width = width;
        self.surface_configuration.height = height;
        self.surface.configure(&self.device, &self.surface_configuration);

        let viewport = screen::Size { width, height };
        self.trail = Trail::new(&self.device, &self.present_program, viewport);
        self.screen.write(
            &self.queue,
            screen::Uniforms {
                texture: screen::Size {
                    width: self.texture_size,
                    height: self.texture_size,
                },
                viewport,
            },
        );
    }

    /// Reconfigure the surface at its current size, after it was lost or went stale.
    pub fn reconfigure(&mut self) {
        self.resize(
            self.surface_configuration.width,
            self.surface_configuration.height,
        );
    }

    fn acquire(&mut self) -> Result<wgpu::SurfaceTexture, FrameError> {
        match self.frame.take() {
            Some(frame) => Ok(frame),
            None => Ok(self.surface.get_current_texture()?),
        }
    }

    /// Replace the whole texture with `pixels`.
    fn upload(&self, pixels: &PixelBuffer) {
        debug_assert_eq!(pixels.side(), self.texture_size as usize);

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels.as_bytes(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: NonZeroU32::new(4 * self.texture_size),
                rows_per_image: NonZeroU32::new(self.texture_size),
            },
            texture_extent(self.texture_size),
        );
    }
}

impl Presenter for Renderer {
    type Error = FrameError;

    fn clear(&mut self) -> Result<(), FrameError> {
        let frame = self.acquire()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let command_buffer = command_buffer::create(&self.device, "clear", |command_encoder| {
            command_encoder.with_render_pass(
                &wgpu::RenderPassDescriptor {
                    label: Some("clear-pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                            store: true,
                        },
                    })],
                    depth_stencil_attachment: None,
                },
                |_| {},
            )
        });
        self.queue.submit([command_buffer]);

        self.frame = Some(frame);
        Ok(())
    }

    fn draw(&mut self, pixels: &PixelBuffer) -> Result<(), FrameError> {
        let frame = self.acquire()?;
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.upload(pixels);

        let command_buffer = command_buffer::create(&self.device, "draw", |command_encoder| {
            command_encoder.with_debug_group("attractor-pass", |command_encoder| {
                command_encoder.with_render_pass(
                    &wgpu::RenderPassDescriptor {
                        label: Some("attractor-pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &self.trail.view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: true,
                            },
                        })],
                        depth_stencil_attachment: None,
                    },
                    |render_pass| {
                        render_pass.set_pipeline(self.attractor_program.pipeline());
                        render_pass.set_bind_group(0, &self.attractor_bind_group, &[]);
                        render_pass.set_vertex_buffer(0, self.quad.slice(..));
                        render_pass.draw(0..self.quad.len(), 0..1);
                    },
                )
            });

            command_encoder.with_debug_group("present-pass", |command_encoder| {
                command_encoder.with_render_pass(
                    &wgpu::RenderPassDescriptor {
                        label: Some("present-pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &surface_view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: true,
                            },
                        })],
                        depth_stencil_attachment: None,
                    },
                    |render_pass| {
                        render_pass.set_pipeline(self.present_program.pipeline());
                        render_pass.set_bind_group(0, &self.trail.bind_group, &[]);
                        render_pass.set_vertex_buffer(0, self.quad.slice(..));
                        render_pass.draw(0..self.quad.len(), 0..1);
                    },
                )
            });
        });

        self.queue.submit([command_buffer]);
        frame.present();
        Ok(())
    }
}

fn texture_extent(side: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: side,
        height: side,
        depth_or_array_layers: 1,
    }
}
