//! CPU-side RGBA accumulation buffer.

use bytemuck::{Pod, Zeroable};
use rayon::prelude::{IntoParallelRefMutIterator, ParallelIterator};

use crate::error::InitError;

/// One texel, laid out the way `wgpu::TextureFormat::Rgba8Unorm` expects.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    fn map(self, function: impl Fn(u8) -> u8) -> Self {
        Self {
            r: function(self.r),
            g: function(self.g),
            b: function(self.b),
            a: function(self.a),
        }
    }
}

/// Where a call to [`PixelBuffer::plot`] landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Plot {
    Inside { column: usize, row: usize },
    /// The point fell outside the grid and was pinned to the border.
    Clamped { column: usize, row: usize },
    /// NaN has no position; nothing was written.
    Skipped,
}

/// Square `side * side` grid of [`Rgba`] pixels, row-major.
pub struct PixelBuffer {
    side: usize,
    pixels: Vec<Rgba>,
}

impl PixelBuffer {
    /// The colour mapping divides coordinates by `side / 256`, so `side` must be at least 256.
    pub fn new(side: u32) -> Result<Self, InitError> {
        if side < 256 {
            return Err(InitError::BufferSize(side));
        }
        let side = side as usize;
        Ok(Self {
            side,
            pixels: vec![Rgba::default(); side * side],
        })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixel(&self, column: usize, row: usize) -> Option<Rgba> {
        if column < self.side && row < self.side {
            Some(self.pixels[row * self.side + column])
        } else {
            None
        }
    }

    /// Scale every channel, alpha included, by `factor`, truncating toward zero.
    pub fn decay(&mut self, factor: f64) {
        // `as u8` saturates, so any factor keeps channels inside 0..=255.
        let table: [u8; 256] = std::array::from_fn(|value| (value as f64 * factor) as u8);

        self.pixels
            .par_iter_mut()
            .for_each(|pixel| *pixel = pixel.map(|channel| table[channel as usize]));
    }

    /**
    Write a coordinate-derived colour at the grid position of the attractor point `(x, y)`.

    The point is scaled by `side / 6` around the centre, with `x` mirrored, and each
    coordinate is truncated toward zero then clamped into `0..side`. With
    `div = side / 256`, the colour is `(sx / div, sy / div, sx * sy / div²)`,
    each taken modulo 256. Alpha is left alone.
    */
    pub fn plot(&mut self, x: f64, y: f64) -> Plot {
        if x.is_nan() || y.is_nan() {
            return Plot::Skipped;
        }

        let side = self.side as i64;
        let half = (side / 2) as f64;
        let scale = (side / 6) as f64;

        // Float to int casts saturate, so infinities end up on the border too.
        let raw_column = (half - x * scale) as i64;
        let raw_row = (half + y * scale) as i64;
        let column = raw_column.clamp(0, side - 1);
        let row = raw_row.clamp(0, side - 1);

        let div = side / 256;
        let pixel = &mut self.pixels[(row * side + column) as usize];
        pixel.r = ((column / div) % 256) as u8;
        pixel.g = ((row / div) % 256) as u8;
        pixel.b = ((column * row / (div * div)) % 256) as u8;

        let (column, row) = (column as usize, row as usize);
        if raw_column == column as i64 && raw_row == row as i64 {
            Plot::Inside { column, row }
        } else {
            Plot::Clamped { column, row }
        }
    }
}
