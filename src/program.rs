/*!
Compiling shader stages and linking them into a render program.

`wgpu` reports shader and pipeline validation failures through the device's
uncaptured error handler, which panics by default. Each call here is wrapped in a
validation [error scope](https://www.w3.org/TR/webgpu/#error-scopes) so a bad
shader surfaces as an [`InitError`] carrying the compiler's message instead.
*/

use std::fmt;

use log::debug;

use crate::error::InitError;

/// Entry point name used by every shader in this crate.
const VERTEX_ENTRY_POINT: &str = "vertex_main";
const FRAGMENT_ENTRY_POINT: &str = "fragment_main";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    fn entry_point(self) -> &'static str {
        match self {
            Stage::Vertex => VERTEX_ENTRY_POINT,
            Stage::Fragment => FRAGMENT_ENTRY_POINT,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Vertex => write!(f, "vertex"),
            Stage::Fragment => write!(f, "fragment"),
        }
    }
}

/// A compiled shader module for a single stage.
pub struct Shader {
    stage: Stage,
    module: wgpu::ShaderModule,
}

/// Compile WGSL `source` for `stage`.
pub fn compile(
    device: &wgpu::Device,
    stage: Stage,
    label: &str,
    source: &str,
) -> Result<Shader, InitError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(InitError::Compile {
            stage,
            message: error.to_string(),
        }),
        None => {
            debug!("compiled {} shader {:?}", stage, label);
            Ok(Shader { stage, module })
        }
    }
}

pub struct Descriptor<'a> {
    pub label: &'static str,
    pub vertex: &'a Shader,
    pub fragment: &'a Shader,
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    /// The program's uniforms, all in bind group 0.
    pub uniforms: &'a [wgpu::BindGroupLayoutEntry],
    pub target: wgpu::ColorTargetState,
}

/// A linked vertex + fragment program drawing triangle strips.
pub struct GpuProgram {
    pipeline: wgpu::RenderPipeline,
    uniforms: wgpu::BindGroupLayout,
}

impl GpuProgram {
    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// Bind concrete resources to the program's uniforms, in `Descriptor::uniforms` order.
    pub fn bind(
        &self,
        device: &wgpu::Device,
        label: &str,
        resources: Vec<wgpu::BindingResource>,
    ) -> wgpu::BindGroup {
        let entries: Vec<wgpu::BindGroupEntry> = resources
            .into_iter()
            .enumerate()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource,
            })
            .collect();

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.uniforms,
            entries: &entries,
        })
    }
}

/// Link a vertex and a fragment shader into a [`GpuProgram`].
pub fn link(device: &wgpu::Device, descriptor: Descriptor) -> Result<GpuProgram, InitError> {
    let Descriptor {
        label,
        vertex,
        fragment,
        vertex_buffers,
        uniforms,
        target,
    } = descriptor;

    for (shader, expected) in [(vertex, Stage::Vertex), (fragment, Stage::Fragment)] {
        if shader.stage != expected {
            return Err(InitError::Link {
                label,
                message: format!("expected a {} shader, got a {} shader", expected, shader.stage),
            });
        }
    }

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let uniforms = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: uniforms,
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[&uniforms],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &vertex.module,
            entry_point: vertex.stage.entry_point(),
            buffers: vertex_buffers,
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &fragment.module,
            entry_point: fragment.stage.entry_point(),
            targets: &[Some(target)],
        }),
        multiview: None,
    });

    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(InitError::Link {
            label,
            message: error.to_string(),
        }),
        None => {
            debug!("linked program {:?}", label);
            Ok(GpuProgram { pipeline, uniforms })
        }
    }
}
