use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Bytes per pixel of every surface (8-bit RGBA).
pub const BYTES_PER_PIXEL: usize = 4;

/// An RGBA8 pixel surface.
///
/// Rows are stored top to bottom, straight (non-premultiplied) alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Raw pixel data.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Create a new frame buffer filled with zeros (transparent black).
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width as usize) * (height as usize) * BYTES_PER_PIXEL;
        Self {
            data: vec![0u8; size],
            width,
            height,
        }
    }

    /// Create a frame buffer filled with a solid color.
    pub fn solid(width: u32, height: u32, color: &crate::Color) -> Self {
        let pixel = color.to_rgba8();
        let pixel_count = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixel_count * BYTES_PER_PIXEL);
        for _ in 0..pixel_count {
            data.extend_from_slice(&pixel);
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Total byte size of the pixel data.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// Reset every pixel to transparent black, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// True when every pixel is fully transparent black.
    pub fn is_clear(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * BYTES_PER_PIXEL
    }

    /// Get the RGBA value at a pixel coordinate. Returns None if out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = self.offset(x, y);
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    /// Alpha channel at a pixel coordinate. Returns None if out of bounds.
    pub fn alpha(&self, x: u32, y: u32) -> Option<u8> {
        self.get_pixel(x, y).map(|p| p[3])
    }

    /// Set the RGBA value at a pixel coordinate. No-op if out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = self.offset(x, y);
        self.data[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&rgba);
    }

    /// Clip a `w`x`h` source placed at (dx, dy) against this surface.
    /// Offsets are widened to `i64` so sources far off-surface clip away
    /// instead of overflowing.
    fn clip(&self, w: u32, h: u32, dx: i32, dy: i32) -> Option<Clip> {
        let (dx, dy) = (dx as i64, dy as i64);
        let start_x = (-dx).max(0);
        let start_y = (-dy).max(0);
        let end_x = (w as i64).min(self.width as i64 - dx);
        let end_y = (h as i64).min(self.height as i64 - dy);

        if start_x >= end_x || start_y >= end_y {
            return None;
        }
        Some(Clip {
            src_x: start_x as usize..end_x as usize,
            src_y: start_y as usize..end_y as usize,
            dst_x: (dx + start_x) as usize,
            dst_y: (dy + start_y) as usize,
        })
    }

    /// Copy `src` into `self` at (dx, dy), replacing the destination pixels
    /// (no blending). Pixels outside `self` are dropped.
    pub fn put(&mut self, src: &FrameBuffer, dx: i32, dy: i32) {
        let Some(clip) = self.clip(src.width, src.height, dx, dy) else {
            return;
        };
        let src_stride = src.width as usize * BYTES_PER_PIXEL;
        let dst_stride = self.width as usize * BYTES_PER_PIXEL;
        let len = clip.src_x.len() * BYTES_PER_PIXEL;

        for (row, sy) in clip.src_y.enumerate() {
            let src_row = sy * src_stride + clip.src_x.start * BYTES_PER_PIXEL;
            let dst_row = (clip.dst_y + row) * dst_stride + clip.dst_x * BYTES_PER_PIXEL;
            self.data[dst_row..dst_row + len].copy_from_slice(&src.data[src_row..src_row + len]);
        }
    }

    /// Alpha-composite `src` on top of `self` at position (dx, dy).
    /// Straight-alpha source-over in integer math; fully opaque source pixels are copied.
    pub fn composite_over(&mut self, src: &FrameBuffer, dx: i32, dy: i32) {
        let Some(clip) = self.clip(src.width, src.height, dx, dy) else {
            return;
        };

        let src_stride = src.width as usize * BYTES_PER_PIXEL;
        let dst_stride = self.width as usize * BYTES_PER_PIXEL;
        let len = clip.src_x.len() * BYTES_PER_PIXEL;

        for (row, sy) in clip.src_y.enumerate() {
            let src_row_start = sy * src_stride + clip.src_x.start * BYTES_PER_PIXEL;
            let dst_row_start = (clip.dst_y + row) * dst_stride + clip.dst_x * BYTES_PER_PIXEL;

            let src_slice = &src.data[src_row_start..src_row_start + len];
            let dst_slice = &mut self.data[dst_row_start..dst_row_start + len];

            for (s, d) in src_slice.chunks_exact(4).zip(dst_slice.chunks_exact_mut(4)) {
                let sa = s[3] as u32;
                if sa == 0 {
                    continue;
                }
                if sa == 255 {
                    d.copy_from_slice(s);
                    continue;
                }

                let da = d[3] as u32;
                let inv_sa = 255 - sa;
                let out_a = sa + ((da * inv_sa) / 255);

                if out_a == 0 { continue; }

                for c in 0..3 {
                    let blended = (s[c] as u32 * sa * 255 + d[c] as u32 * da * inv_sa) / (out_a * 255);
                    d[c] = blended as u8;
                }
                d[3] = out_a as u8;
            }
        }
    }

    /// Stamp an alpha mask onto this surface at (dx, dy) as black ink whose
    /// per-pixel alpha is `mask * opacity`, blended source-over in draw order.
    ///
    /// Repeated stamps saturate towards full opacity rather than summing.
    pub fn stamp_mask(&mut self, mask: &AlphaMask, dx: i32, dy: i32, opacity: f32) {
        let opacity = (opacity.clamp(0.0, 1.0) * 255.0).round() as u32;
        if opacity == 0 {
            return;
        }
        let Some(clip) = self.clip(mask.width, mask.height, dx, dy) else {
            return;
        };

        let dst_stride = self.width as usize * BYTES_PER_PIXEL;
        for (row, sy) in clip.src_y.enumerate() {
            let mask_row = &mask.row(sy as u32)[clip.src_x.clone()];
            let dst_row_start = (clip.dst_y + row) * dst_stride + clip.dst_x * BYTES_PER_PIXEL;
            let dst_row = &mut self.data[dst_row_start..dst_row_start + mask_row.len() * BYTES_PER_PIXEL];

            for (&m, d) in mask_row.iter().zip(dst_row.chunks_exact_mut(4)) {
                let sa = (m as u32 * opacity + 127) / 255;
                if sa == 0 {
                    continue;
                }
                let da = d[3] as u32;
                let inv_sa = 255 - sa;
                let out_a = sa + (da * inv_sa + 127) / 255;
                if out_a == 0 {
                    continue;
                }
                // Source color is black, so only the destination term survives.
                for c in 0..3 {
                    d[c] = ((d[c] as u32 * da * inv_sa) / (out_a * 255)) as u8;
                }
                d[3] = out_a.min(255) as u8;
            }
        }
    }
}

/// Visible part of a source after clipping: source ranges plus the
/// destination pixel that `(src_x.start, src_y.start)` lands on.
struct Clip {
    src_x: Range<usize>,
    src_y: Range<usize>,
    dst_x: usize,
    dst_y: usize,
}

/// A single-channel 8-bit coverage mask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphaMask {
    pub width: u32,
    pub height: u32,
    /// Row-major alpha values, one byte per pixel.
    pub data: Vec<u8>,
}

impl AlphaMask {
    /// Fully transparent mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize],
        }
    }

    /// Build a mask by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u8) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Alpha at (x, y), or None if out of bounds.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y as usize * self.width as usize + x as usize])
    }

    /// One row of the mask.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.width as usize;
        &self.data[start..start + self.width as usize]
    }

    /// Heap bytes held by this mask.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }
}
