use bytemuck::{Pod, Zeroable};

/// Clip-space vertex, bound at `@location(0)` of `quad.vert.wgsl`.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: [f32; 4],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Full-screen quad, drawn as a triangle strip.
pub const QUAD: [Vertex; 4] = [
    Vertex {
        position: [-1.0, 1.0, 0.0, 1.0],
    },
    Vertex {
        position: [-1.0, -1.0, 0.0, 1.0],
    },
    Vertex {
        position: [1.0, 1.0, 0.0, 1.0],
    },
    Vertex {
        position: [1.0, -1.0, 0.0, 1.0],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_covers_clip_space() {
        for corner in [[-1.0f32, 1.0], [-1.0, -1.0], [1.0, 1.0], [1.0, -1.0]] {
            assert!(QUAD
                .iter()
                .any(|vertex| vertex.position[..2] == corner[..]));
        }
        assert!(QUAD.iter().all(|vertex| vertex.position[3] == 1.0));
    }

    #[test]
    fn layout_matches_vertex_size() {
        assert_eq!(Vertex::layout().array_stride, 16);
        assert_eq!(bytemuck::cast_slice::<Vertex, u8>(&QUAD).len(), 64);
    }
}
