//! PNG export of tile surfaces.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use hotspot_core::frame::FrameBuffer;
use hotspot_core::{HeatmapError, HeatmapResult};
use image::{ImageFormat, RgbaImage};

use crate::engine::HeatmapEngine;
use crate::palette::Palette;

fn to_image(surface: &FrameBuffer) -> Option<RgbaImage> {
    RgbaImage::from_raw(surface.width, surface.height, surface.data.clone())
}

/// Encode a surface as an in-memory RGBA PNG.
pub fn encode_png(surface: &FrameBuffer) -> HeatmapResult<Vec<u8>> {
    let img = to_image(surface).ok_or_else(|| {
        HeatmapError::Render(format!(
            "surface buffer does not match {}x{}",
            surface.width, surface.height
        ))
    })?;
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| HeatmapError::Render(format!("failed to encode PNG: {}", e)))?;
    Ok(bytes)
}

/// Write a surface to `path` as PNG, creating parent directories.
pub fn write_png(surface: &FrameBuffer, path: &Path) -> HeatmapResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let img = to_image(surface)
        .ok_or_else(|| HeatmapError::export("surface buffer size mismatch", path))?;
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|e| HeatmapError::export(format!("failed to write PNG: {}", e), path))?;
    tracing::debug!("wrote {}x{} PNG to {}", surface.width, surface.height, path.display());
    Ok(())
}

/// Write every tile of `engine` into `dir` as `tile-<index>.png`.
///
/// Returns the written paths in tile order.
pub fn write_tiles(engine: &HeatmapEngine, dir: &Path) -> HeatmapResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(engine.tiles().len());
    for tile in engine.tiles() {
        let path = dir.join(format!("tile-{}.png", tile.index()));
        write_png(tile.surface(), &path)?;
        written.push(path);
    }
    tracing::info!("exported {} tile(s) to {}", written.len(), dir.display());
    Ok(written)
}

/// Write the palette as a `256 x height` legend strip.
pub fn write_palette_png(palette: &Palette, height: u32, path: &Path) -> HeatmapResult<()> {
    write_png(&palette.to_surface(height.max(1)), path)
}
