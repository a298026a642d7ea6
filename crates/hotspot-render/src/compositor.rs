//! Colorize pass: turns an accumulated intensity buffer into a colored image.
//!
//! Intensity lives in the alpha channel. Each nonzero pixel takes the RGB of
//! `palette[intensity]` and keeps its intensity as alpha; zero pixels stay
//! transparent and never touch the palette. The map has no dependency
//! between pixels.

use hotspot_core::frame::FrameBuffer;

use crate::palette::Palette;

/// Colorize a copy of `intensity`.
pub fn colorize(intensity: &FrameBuffer, palette: &Palette) -> FrameBuffer {
    let mut out = intensity.clone();
    colorize_in_place(&mut out, palette);
    out
}

/// Colorize `surface` in place. Returns the number of pixels colored.
pub fn colorize_in_place(surface: &mut FrameBuffer, palette: &Palette) -> usize {
    let mut colored = 0;
    for px in surface.data.chunks_exact_mut(4) {
        let alpha = px[3];
        if alpha == 0 {
            continue;
        }
        let [r, g, b, _] = palette.get(alpha);
        px[0] = r;
        px[1] = g;
        px[2] = b;
        colored += 1;
    }
    colored
}
