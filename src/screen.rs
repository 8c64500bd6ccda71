use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// Mirrors `attractor.frag.wgsl#Screen`.
///
/// The fragment stage divides the fragment position by `texture`, so the picture
/// only fills the window when `viewport` is about the same size as `texture`.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Uniforms {
    pub texture: Size,
    pub viewport: Size,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_are_two_packed_uvec2s() {
        let uniforms = Uniforms {
            texture: Size {
                width: 512,
                height: 512,
            },
            viewport: Size {
                width: 640,
                height: 480,
            },
        };
        let words: &[u32] = bytemuck::cast_slice(std::slice::from_ref(&uniforms));
        assert_eq!(words, &[512, 512, 640, 480]);
    }
}
