//! Palette generation: a 256-entry RGBA lookup table sampled from gradient stops.

use hotspot_core::config::GradientStops;
use hotspot_core::frame::FrameBuffer;
use hotspot_core::Color;

/// Number of palette entries, one per 8-bit intensity.
pub const PALETTE_SIZE: usize = 256;

/// Intensity-indexed color lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [[u8; 4]; PALETTE_SIZE],
}

impl Palette {
    /// Entry for an intensity value.
    pub fn get(&self, intensity: u8) -> [u8; 4] {
        self.entries[intensity as usize]
    }

    pub fn entries(&self) -> &[[u8; 4]; PALETTE_SIZE] {
        &self.entries
    }

    /// Render the palette as a `256 x height` strip, intensity increasing left to right.
    pub fn to_surface(&self, height: u32) -> FrameBuffer {
        let mut surface = FrameBuffer::new(PALETTE_SIZE as u32, height);
        for y in 0..height {
            for (x, entry) in self.entries.iter().enumerate() {
                surface.set_pixel(x as u32, y, *entry);
            }
        }
        surface
    }
}

/// Sample the gradient at 256 evenly spaced positions: entry `i` is the
/// linearly interpolated color at `i / 255`.
///
/// Positions before the first stop take the first stop's color, positions
/// after the last take the last stop's color. `GradientStops` cannot be
/// empty, so this never fails.
pub fn build_palette(gradient: &GradientStops) -> Palette {
    let mut entries = [[0u8; 4]; PALETTE_SIZE];
    for (i, entry) in entries.iter_mut().enumerate() {
        let t = i as f32 / (PALETTE_SIZE - 1) as f32;
        *entry = sample(gradient, t).to_rgba8();
    }
    Palette { entries }
}

fn sample(gradient: &GradientStops, t: f32) -> Color {
    let stops = gradient.stops();
    let first = &stops[0];
    let last = &stops[stops.len() - 1];

    if t <= first.position {
        return first.color;
    }
    if t >= last.position {
        return last.color;
    }

    // t lies strictly inside [first, last], so some segment brackets it.
    let segment = stops
        .windows(2)
        .find(|w| t >= w[0].position && t <= w[1].position);
    match segment {
        Some(w) => {
            let span = w[1].position - w[0].position;
            w[0].color.lerp(&w[1].color, (t - w[0].position) / span)
        }
        None => last.color,
    }
}
