/*!
Typed `wgpu` buffers.

[`bytemuck`](https://docs.rs/bytemuck/latest/bytemuck/) casts Rust datatypes to the
bytes the GPU consumes. A raw `wgpu::Buffer` forgets what it was filled with, so
this wrapper carries the element type and element count along with it.
*/

use std::{marker::PhantomData, ops::RangeBounds};

use wgpu::util::DeviceExt;

pub struct Buffer<A> {
    buffer: wgpu::Buffer,
    len: u32,
    phantom_data: PhantomData<A>,
}

impl<A: bytemuck::Pod + bytemuck::Zeroable> Buffer<A> {
    /// Number of `A`s the buffer was created with.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn slice<S: RangeBounds<wgpu::BufferAddress>>(&self, bounds: S) -> wgpu::BufferSlice {
        self.buffer.slice(bounds)
    }
}

pub struct Builder<'a, A> {
    label: Option<&'a str>,
    contents: &'a [A],
    usage: wgpu::BufferUsages,
}

impl<'a, A: bytemuck::Pod + bytemuck::Zeroable> From<&'a [A]> for Builder<'a, A> {
    fn from(value: &'a [A]) -> Self {
        Self {
            label: None,
            contents: value,
            usage: wgpu::BufferUsages::empty(),
        }
    }
}

impl<'a, A: bytemuck::Pod + bytemuck::Zeroable> Builder<'a, A> {
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_usage(mut self, usage: wgpu::BufferUsages) -> Self {
        self.usage |= usage;
        self
    }

    pub fn create(self, device: &wgpu::Device) -> Buffer<A> {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: self.label,
            contents: bytemuck::cast_slice(self.contents),
            usage: self.usage,
        });

        Buffer {
            buffer,
            len: self.contents.len() as u32,
            phantom_data: PhantomData,
        }
    }
}
