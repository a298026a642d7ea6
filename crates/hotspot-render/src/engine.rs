//! The render orchestrator.
//!
//! A [`HeatmapEngine`] owns the accumulation surface, the template cache and
//! the tiles. A render pass stamps point templates onto the accumulation
//! surface, colorizes it into the target tile, then does the same for bands.
//! Everything runs synchronously on the caller's thread; the engine is not
//! reentrant and callers are expected to coalesce scroll/data events before
//! calling in.

use hotspot_core::config::{GradientStops, HeatmapConfig};
use hotspot_core::frame::FrameBuffer;
use hotspot_core::hash::{self, ContentHash};
use hotspot_core::{BandNode, HeatmapData, HeatmapError, HeatmapResult, PointNode};

use serde::Serialize;

use crate::compositor::colorize_in_place;
use crate::palette::{build_palette, Palette};
use crate::template::{TemplateCache, TemplateStats};
use crate::tiles::{allocate_tiles, Tile};
use crate::window::{Container, DataWindow, PageWindow};

/// What one `render` call drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    /// 1-based index of the target tile.
    pub tile: u32,
    pub points_drawn: usize,
    pub bands_drawn: usize,
    /// Records dropped as invalid.
    pub skipped: usize,
    /// Colorize passes that wrote into the tile (0, 1 or 2).
    pub passes: usize,
}

/// Viewport reported to the scroll hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScrollPosition {
    pub top: u32,
    pub viewport_height: u32,
}

/// Optional callbacks. An absent slot means nobody is listening.
#[derive(Default)]
pub struct EngineHooks {
    pub on_tile_rendered: Option<Box<dyn FnMut(&Tile, &RenderStats)>>,
    pub on_scroll: Option<Box<dyn FnMut(ScrollPosition)>>,
}

impl std::fmt::Debug for EngineHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHooks")
            .field("on_tile_rendered", &self.on_tile_rendered.is_some())
            .field("on_scroll", &self.on_scroll.is_some())
            .finish()
    }
}

/// How a colorized pass lands on the target tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    /// Replace the tile's pixels wholesale.
    Replace,
    /// Blend over what earlier passes of the same call wrote.
    Over,
}

/// Heatmap rendering engine.
pub struct HeatmapEngine {
    config: HeatmapConfig,
    width: u32,
    height: u32,
    palette: Palette,
    templates: TemplateCache,
    accumulation: FrameBuffer,
    tiles: Vec<Tile>,
    page_count: u32,
    data: HeatmapData,
    window: Box<dyn DataWindow>,
    hooks: EngineHooks,
}

impl HeatmapEngine {
    /// Measure the container, build the palette and allocate the tiles.
    ///
    /// The logical width is the measured width; the logical height is the
    /// larger of `config.max_height` and the measured height. Tiles are
    /// attached to the container in index order.
    pub fn new(mut config: HeatmapConfig, container: &mut dyn Container) -> HeatmapResult<Self> {
        config.validate()?;

        let size = container.size();
        let width = size.width;
        let height = config.max_height.max(size.height);
        if width == 0 {
            return Err(HeatmapError::config("container has zero width"));
        }
        if height == 0 {
            return Err(HeatmapError::config("region height must be at least 1"));
        }
        config.max_width = width;
        config.max_height = height;

        let palette = build_palette(&config.gradient);
        let tile_set = allocate_tiles(width, height, config.pagination.page_size)?;
        for tile in &tile_set.tiles {
            container.attach_tile(tile);
        }

        // One tile's worth of rows is the most a single pass ever draws.
        let scratch_height = tile_set.tiles.iter().map(Tile::height).max().unwrap_or(height);

        tracing::info!(
            "heatmap engine ready: {}x{} in {} tile(s) of up to {} rows",
            width,
            height,
            tile_set.page_count,
            scratch_height
        );

        Ok(Self {
            templates: TemplateCache::new(config.template_cache_capacity),
            accumulation: FrameBuffer::new(width, scratch_height),
            tiles: tile_set.tiles,
            page_count: tile_set.page_count,
            data: HeatmapData::default(),
            window: Box::new(PageWindow),
            hooks: EngineHooks::default(),
            config,
            width,
            height,
            palette,
        })
    }

    /// Replace the per-page slicing function used by batch and scroll renders.
    pub fn with_data_window(mut self, window: impl DataWindow + 'static) -> Self {
        self.window = Box::new(window);
        self
    }

    pub fn with_hooks(mut self, hooks: EngineHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn hooks_mut(&mut self) -> &mut EngineHooks {
        &mut self.hooks
    }

    /// Replace the full dataset. Nothing is redrawn until the next render.
    pub fn set_data(&mut self, data: HeatmapData) {
        tracing::debug!(
            "dataset replaced: {} node(s), {} band(s)",
            data.nodes.len(),
            data.attention.len()
        );
        self.data = data;
    }

    pub fn data(&self) -> &HeatmapData {
        &self.data
    }

    /// Swap the gradient and rebuild the palette.
    pub fn set_gradient(&mut self, gradient: GradientStops) {
        self.palette = build_palette(&gradient);
        self.config.gradient = gradient;
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile by 1-based index.
    pub fn tile(&self, index: u32) -> Option<&Tile> {
        index
            .checked_sub(1)
            .and_then(|i| self.tiles.get(i as usize))
    }

    pub fn template_stats(&self) -> TemplateStats {
        self.templates.stats()
    }

    /// Hash of every tile surface in index order.
    pub fn content_hash(&self) -> ContentHash {
        hash::hash_surfaces(self.tiles.iter().map(Tile::surface))
    }

    /// Render points and bands into tile `tile` (1-based).
    ///
    /// `None` for either list means the engine's full dataset. Invalid records
    /// are skipped and counted; they never abort the pass.
    pub fn render(
        &mut self,
        nodes: Option<&[PointNode]>,
        bands: Option<&[BandNode]>,
        tile: u32,
    ) -> HeatmapResult<RenderStats> {
        let idx = tile
            .checked_sub(1)
            .map(|i| i as usize)
            .filter(|&i| i < self.tiles.len())
            .ok_or_else(|| {
                HeatmapError::Render(format!(
                    "tile {} out of range 1..={}",
                    tile,
                    self.tiles.len()
                ))
            })?;

        let nodes = nodes.unwrap_or(&self.data.nodes);
        let bands = bands.unwrap_or(&self.data.attention);
        let mut stats = RenderStats {
            tile,
            ..RenderStats::default()
        };
        let mut mode = WriteMode::Replace;

        self.accumulation.clear();

        let (drawn, skipped) = stamp_points(
            &mut self.accumulation,
            &mut self.templates,
            nodes,
            self.config.radius,
            self.config.node_blur,
        );
        stats.points_drawn = drawn;
        stats.skipped += skipped;
        if drawn > 0 {
            flush(&mut self.accumulation, &self.palette, self.tiles[idx].surface_mut(), mode);
            stats.passes += 1;
            mode = WriteMode::Over;
            self.accumulation.clear();
        }

        let (drawn, skipped) = stamp_bands(
            &mut self.accumulation,
            &mut self.templates,
            bands,
            self.width,
            self.config.height,
        );
        stats.bands_drawn = drawn;
        stats.skipped += skipped;
        if drawn > 0 {
            flush(&mut self.accumulation, &self.palette, self.tiles[idx].surface_mut(), mode);
            stats.passes += 1;
        }

        tracing::debug!(
            "rendered tile {}: {} point(s), {} band(s), {} skipped",
            tile,
            stats.points_drawn,
            stats.bands_drawn,
            stats.skipped
        );

        if let Some(hook) = self.hooks.on_tile_rendered.as_mut() {
            hook(&self.tiles[idx], &stats);
        }
        Ok(stats)
    }

    /// Render every tile from its data window, one `render` call per tile.
    pub fn render_batch(&mut self) -> HeatmapResult<Vec<RenderStats>> {
        let indices: Vec<u32> = self.tiles.iter().map(Tile::index).collect();
        self.render_pages(&indices)
    }

    /// 1-based indices of the tiles intersecting the viewport.
    pub fn visible_tiles(&self, scroll_top: u32, viewport_height: u32) -> Vec<u32> {
        let rows = scroll_top..scroll_top.saturating_add(viewport_height);
        self.tiles
            .iter()
            .filter(|t| t.intersects(rows.clone()))
            .map(Tile::index)
            .collect()
    }

    /// Re-render only the tiles visible in the viewport.
    pub fn render_visible(
        &mut self,
        scroll_top: u32,
        viewport_height: u32,
    ) -> HeatmapResult<Vec<RenderStats>> {
        if let Some(hook) = self.hooks.on_scroll.as_mut() {
            hook(ScrollPosition {
                top: scroll_top,
                viewport_height,
            });
        }
        let visible = self.visible_tiles(scroll_top, viewport_height);
        self.render_pages(&visible)
    }

    fn render_pages(&mut self, pages: &[u32]) -> HeatmapResult<Vec<RenderStats>> {
        let page_size = self.config.pagination.page_size;
        let mut results = Vec::with_capacity(pages.len());
        for &page in pages {
            let slice = self.window.window(&self.data, page, page_size);
            results.push(self.render(
                Some(slice.nodes.as_slice()),
                Some(slice.attention.as_slice()),
                page,
            )?);
        }
        Ok(results)
    }

    /// Wipe the accumulation surface and every tile, keeping allocations.
    pub fn clear(&mut self) {
        self.accumulation.clear();
        for tile in &mut self.tiles {
            tile.surface_mut().clear();
        }
    }
}

impl std::fmt::Debug for HeatmapEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeatmapEngine")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("page_count", &self.page_count)
            .field("templates", &self.templates.stats())
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Pixel origin of a stamp `size` long starting at `pos` on an axis
/// `extent` long, or None when the stamp cannot touch the surface.
fn stamp_origin(pos: f64, size: u32, extent: u32) -> Option<i32> {
    let pos = pos.round();
    if pos + size as f64 <= 0.0 || pos >= extent as f64 {
        return None;
    }
    i32::try_from(pos as i64).ok()
}

/// Stamp every valid point. Returns (drawn, skipped).
///
/// Valid points entirely off the surface are neither drawn nor skipped.
fn stamp_points(
    surface: &mut FrameBuffer,
    templates: &mut TemplateCache,
    nodes: &[PointNode],
    default_radius: u32,
    blur: f32,
) -> (usize, usize) {
    let mut drawn = 0;
    let mut skipped = 0;
    for node in nodes {
        let radius = match node.resolve_radius(default_radius) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("skipping point ({}, {}): {}", node.x, node.y, e);
                skipped += 1;
                continue;
            }
        };
        let size = radius.saturating_mul(2);
        let origin = stamp_origin(node.x - radius as f64, size, surface.width)
            .zip(stamp_origin(node.y - radius as f64, size, surface.height));
        let Some((dx, dy)) = origin else {
            continue;
        };
        let template = templates.point_template(radius, blur);
        surface.stamp_mask(&template, dx, dy, node.alpha);
        drawn += 1;
    }
    (drawn, skipped)
}

/// Stamp every valid band across the full width. Returns (drawn, skipped).
///
/// Valid bands entirely off the surface are neither drawn nor skipped.
fn stamp_bands(
    surface: &mut FrameBuffer,
    templates: &mut TemplateCache,
    bands: &[BandNode],
    width: u32,
    default_height: u32,
) -> (usize, usize) {
    let mut drawn = 0;
    let mut skipped = 0;
    for band in bands {
        let height = match band.resolve_height(default_height) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!("skipping band at y={}: {}", band.y, e);
                skipped += 1;
                continue;
            }
        };
        let Some(dy) = stamp_origin(band.y, height, surface.height) else {
            continue;
        };
        let template = templates.band_template(width, height);
        surface.stamp_mask(&template, 0, dy, band.alpha);
        drawn += 1;
    }
    (drawn, skipped)
}

/// Colorize the accumulation surface and write it into the target.
fn flush(accumulation: &mut FrameBuffer, palette: &Palette, target: &mut FrameBuffer, mode: WriteMode) {
    colorize_in_place(accumulation, palette);
    match mode {
        WriteMode::Replace => target.put(accumulation, 0, 0),
        WriteMode::Over => target.composite_over(accumulation, 0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::FixedContainer;

    fn config(page_size: u32) -> HeatmapConfig {
        let mut config = HeatmapConfig::default();
        config.pagination.page_size = page_size;
        config.radius = 4;
        config.height = 4;
        config.node_blur = 0.5;
        config
    }

    fn engine(width: u32, height: u32, page_size: u32) -> HeatmapEngine {
        let mut container = FixedContainer::new(width, height);
        HeatmapEngine::new(config(page_size), &mut container).unwrap()
    }

    #[test]
    fn test_new_resolves_region_size() {
        let mut container = FixedContainer::new(32, 20);
        let mut cfg = config(100);
        cfg.max_height = 50;
        let engine = HeatmapEngine::new(cfg, &mut container).unwrap();
        assert_eq!((engine.width(), engine.height()), (32, 50));
        assert_eq!(engine.config().max_width, 32);
        assert_eq!(engine.config().max_height, 50);
        assert_eq!(container.attached, vec![1]);
    }

    #[test]
    fn test_new_rejects_empty_region() {
        let mut container = FixedContainer::new(32, 0);
        let err = HeatmapEngine::new(config(100), &mut container).unwrap_err();
        assert!(err.is_configuration());
        let mut container = FixedContainer::new(0, 10);
        assert!(HeatmapEngine::new(config(100), &mut container).is_err());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut container = FixedContainer::new(32, 32);
        let mut cfg = config(100);
        cfg.node_blur = 2.0;
        assert!(HeatmapEngine::new(cfg, &mut container).unwrap_err().is_configuration());
        assert!(container.attached.is_empty());
    }

    #[test]
    fn test_accumulation_sized_to_tallest_tile() {
        let engine = engine(8, 25, 10);
        assert_eq!(engine.accumulation.height, 10);
        assert_eq!(engine.page_count(), 3);
    }

    #[test]
    fn test_render_empty_leaves_target_untouched() {
        let mut engine = engine(16, 16, 100);
        engine.tiles[0].surface_mut().set_pixel(3, 3, [1, 2, 3, 4]);
        let before = engine.tile(1).unwrap().surface().clone();
        let stats = engine.render(Some(&[]), Some(&[]), 1).unwrap();
        assert_eq!(stats.passes, 0);
        assert_eq!(engine.tile(1).unwrap().surface(), &before);
    }

    #[test]
    fn test_render_point_colors_with_palette() {
        let mut engine = engine(16, 16, 100);
        let stats = engine
            .render(Some(&[PointNode::new(8.0, 8.0, 4, 1.0)]), Some(&[]), 1)
            .unwrap();
        assert_eq!(stats.points_drawn, 1);
        assert_eq!(stats.passes, 1);
        let center = engine.tile(1).unwrap().surface().get_pixel(8, 8).unwrap();
        assert_eq!(center, engine.palette().get(255));
        assert_eq!(engine.tile(1).unwrap().surface().alpha(0, 0), Some(0));
    }

    #[test]
    fn test_render_point_alpha_scales_intensity() {
        let mut engine = engine(16, 16, 100);
        engine
            .render(Some(&[PointNode::new(8.0, 8.0, 4, 0.5)]), Some(&[]), 1)
            .unwrap();
        let [r, g, b, a] = engine.tile(1).unwrap().surface().get_pixel(8, 8).unwrap();
        assert_eq!(a, 128);
        let [pr, pg, pb, _] = engine.palette().get(128);
        assert_eq!([r, g, b], [pr, pg, pb]);
    }

    #[test]
    fn test_render_points_over_composite() {
        let mut engine = engine(16, 16, 100);
        let p = PointNode::new(8.0, 8.0, 4, 0.5);
        engine.render(Some(&[p, p]), Some(&[]), 1).unwrap();
        assert_eq!(engine.tile(1).unwrap().surface().alpha(8, 8), Some(192));
    }

    #[test]
    fn test_render_replaces_previous_points() {
        let mut engine = engine(16, 16, 100);
        engine
            .render(Some(&[PointNode::new(3.0, 3.0, 2, 1.0)]), Some(&[]), 1)
            .unwrap();
        engine
            .render(Some(&[PointNode::new(12.0, 12.0, 2, 1.0)]), Some(&[]), 1)
            .unwrap();
        let surface = engine.tile(1).unwrap().surface();
        assert_eq!(surface.alpha(3, 3), Some(0));
        assert_eq!(surface.alpha(12, 12), Some(255));
    }

    #[test]
    fn test_render_bands_do_not_erase_points() {
        let mut engine = engine(16, 32, 100);
        engine
            .render(
                Some(&[PointNode::new(8.0, 4.0, 3, 1.0)]),
                Some(&[BandNode::new(20.0, 8, 1.0)]),
                1,
            )
            .unwrap();
        let surface = engine.tile(1).unwrap().surface();
        assert_eq!(surface.alpha(8, 4), Some(255));
        assert!(surface.alpha(0, 24).unwrap() > 0);
        assert!(surface.alpha(15, 23).unwrap() > 0);
        // The band pass starts from a clear scratch surface.
        assert_eq!(surface.alpha(0, 4), Some(0));
    }

    #[test]
    fn test_render_uses_default_radius_and_dataset() {
        let mut engine = engine(16, 16, 100);
        engine.set_data(HeatmapData::new(
            vec![PointNode::with_default_radius(8.0, 8.0, 1.0)],
            vec![],
        ));
        let stats = engine.render(None, None, 1).unwrap();
        assert_eq!(stats.points_drawn, 1);
        assert_eq!(engine.template_stats().point_templates, 1);
        // Default radius 4 covers (5, 8) but not (1, 8).
        let surface = engine.tile(1).unwrap().surface();
        assert!(surface.alpha(5, 8).unwrap() > 0);
        assert_eq!(surface.alpha(1, 8), Some(0));
    }

    #[test]
    fn test_render_skips_invalid_records() {
        let mut engine = engine(16, 16, 100);
        let nodes = [
            PointNode::new(8.0, 8.0, 0, 1.0),
            PointNode::new(f64::NAN, 8.0, 2, 1.0),
            PointNode::new(8.0, 8.0, 2, 1.0),
        ];
        let bands = [BandNode::new(2.0, 4, 7.0)];
        let stats = engine.render(Some(&nodes), Some(&bands), 1).unwrap();
        assert_eq!(stats.points_drawn, 1);
        assert_eq!(stats.bands_drawn, 0);
        assert_eq!(stats.skipped, 3);
        assert_eq!(stats.passes, 1);
    }

    #[test]
    fn test_render_far_off_surface_records_clip_away() {
        let mut engine = engine(16, 16, 100);
        engine
            .render(Some(&[PointNode::new(8.0, 8.0, 2, 1.0)]), Some(&[]), 1)
            .unwrap();
        let before = engine.tile(1).unwrap().surface().clone();

        let far = [
            PointNode::new(8.0, 2_147_483_640.0, 40, 1.0),
            PointNode::new(1e12, 8.0, 4, 1.0),
            PointNode::new(-1e12, -1e12, 4, 1.0),
        ];
        for node in far {
            let stats = engine.render(Some(&[node]), Some(&[]), 1).unwrap();
            assert_eq!((stats.points_drawn, stats.skipped), (0, 0));
        }
        let band = [BandNode::new(2_147_483_640.0, 40, 1.0), BandNode::new(-1e15, 40, 1.0)];
        let stats = engine.render(Some(&[]), Some(&band), 1).unwrap();
        assert_eq!(stats.bands_drawn, 0);
        assert_eq!(engine.tile(1).unwrap().surface(), &before);
    }

    #[test]
    fn test_stamp_origin_bounds() {
        assert_eq!(stamp_origin(-3.4, 4, 16), Some(-3));
        assert_eq!(stamp_origin(-4.0, 4, 16), None);
        assert_eq!(stamp_origin(15.6, 4, 16), None);
        assert_eq!(stamp_origin(15.4, 4, 16), Some(15));
        assert_eq!(stamp_origin(1e300, 4, 16), None);
    }

    #[test]
    fn test_render_rejects_unknown_tile() {
        let mut engine = engine(16, 16, 100);
        assert!(engine.render(Some(&[]), Some(&[]), 0).is_err());
        assert!(engine.render(Some(&[]), Some(&[]), 2).is_err());
    }

    #[test]
    fn test_templates_reused_across_renders() {
        let mut engine = engine(16, 16, 100);
        let nodes = [PointNode::new(4.0, 4.0, 3, 1.0), PointNode::new(9.0, 9.0, 3, 0.5)];
        engine.render(Some(&nodes), Some(&[]), 1).unwrap();
        engine.render(Some(&nodes), Some(&[]), 1).unwrap();
        let stats = engine.template_stats();
        assert_eq!(stats.point_templates, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 3);
    }

    #[test]
    fn test_clear_wipes_tiles() {
        let mut engine = engine(8, 25, 10);
        engine
            .render(Some(&[PointNode::new(4.0, 4.0, 2, 1.0)]), Some(&[]), 2)
            .unwrap();
        assert!(!engine.tile(2).unwrap().surface().is_clear());
        engine.clear();
        assert!(engine.tiles().iter().all(|t| t.surface().is_clear()));
        assert_eq!(engine.tile(3).unwrap().height(), 5);
    }

    #[test]
    fn test_set_gradient_rebuilds_palette() {
        let mut engine = engine(8, 8, 100);
        let before = engine.palette().clone();
        engine.set_gradient(
            GradientStops::new([(0.0, hotspot_core::Color::BLACK), (1.0, hotspot_core::Color::WHITE)])
                .unwrap(),
        );
        assert_ne!(engine.palette(), &before);
        assert_eq!(engine.palette().get(100), [100, 100, 100, 255]);
    }

    #[test]
    fn test_visible_tiles() {
        let engine = engine(4, 25, 10);
        assert_eq!(engine.visible_tiles(0, 5), vec![1]);
        assert_eq!(engine.visible_tiles(8, 5), vec![1, 2]);
        assert_eq!(engine.visible_tiles(15, 100), vec![2, 3]);
        assert!(engine.visible_tiles(30, 5).is_empty());
    }
}
