//! Tile management: splitting a tall logical region into fixed-height surfaces.
//!
//! Tiles cover `[0, total_height)` contiguously, in increasing 1-based index
//! order. Every tile is `page_size` tall except the last, which takes the
//! remainder. Allocation is a pure function of its inputs.

use std::ops::Range;

use hotspot_core::frame::FrameBuffer;
use hotspot_core::{HeatmapError, HeatmapResult};
use serde::Serialize;

/// Placement of one tile inside the logical region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileSpec {
    /// 1-based page index.
    pub index: u32,
    /// First logical row covered by the tile.
    pub offset: u32,
    pub height: u32,
}

impl TileSpec {
    /// Logical rows covered by the tile.
    pub fn rows(&self) -> Range<u32> {
        self.offset..self.offset + self.height
    }
}

/// Tile placements plus the number of pages they span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayout {
    pub specs: Vec<TileSpec>,
    pub page_count: u32,
}

/// Compute the tile placements for a region `total_height` rows tall.
///
/// A region shorter than one page is a single tile of `total_height`.
/// Otherwise there are `ceil(total_height / page_size)` tiles.
pub fn plan_tiles(total_height: u32, page_size: u32) -> HeatmapResult<TileLayout> {
    if total_height == 0 {
        return Err(HeatmapError::config("region height must be at least 1"));
    }
    if page_size == 0 {
        return Err(HeatmapError::config("page size must be at least 1"));
    }

    if page_size > total_height {
        return Ok(TileLayout {
            specs: vec![TileSpec {
                index: 1,
                offset: 0,
                height: total_height,
            }],
            page_count: 1,
        });
    }

    let page_count = total_height.div_ceil(page_size);
    let specs = (1..=page_count)
        .map(|index| {
            let offset = (index - 1) * page_size;
            let height = if index == page_count {
                total_height - offset
            } else {
                page_size
            };
            TileSpec {
                index,
                offset,
                height,
            }
        })
        .collect();

    Ok(TileLayout { specs, page_count })
}

/// One fixed-height slice of the logical region with its own pixel surface.
#[derive(Debug, Clone)]
pub struct Tile {
    spec: TileSpec,
    surface: FrameBuffer,
}

impl Tile {
    fn new(width: u32, spec: TileSpec) -> Self {
        Self {
            spec,
            surface: FrameBuffer::new(width, spec.height),
        }
    }

    /// 1-based tile index.
    pub fn index(&self) -> u32 {
        self.spec.index
    }

    pub fn offset(&self) -> u32 {
        self.spec.offset
    }

    pub fn width(&self) -> u32 {
        self.surface.width
    }

    pub fn height(&self) -> u32 {
        self.spec.height
    }

    pub fn spec(&self) -> TileSpec {
        self.spec
    }

    pub fn surface(&self) -> &FrameBuffer {
        &self.surface
    }

    pub(crate) fn surface_mut(&mut self) -> &mut FrameBuffer {
        &mut self.surface
    }

    /// True if any logical row in `rows` falls on this tile.
    pub fn intersects(&self, rows: Range<u32>) -> bool {
        let own = self.spec.rows();
        rows.start < own.end && own.start < rows.end
    }
}

/// Allocated tiles plus the page count that produced them.
#[derive(Debug, Clone)]
pub struct TileSet {
    pub tiles: Vec<Tile>,
    pub page_count: u32,
}

/// Allocate one surface per planned tile, in increasing index order.
pub fn allocate_tiles(total_width: u32, total_height: u32, page_size: u32) -> HeatmapResult<TileSet> {
    if total_width == 0 {
        return Err(HeatmapError::config("region width must be at least 1"));
    }
    let layout = plan_tiles(total_height, page_size)?;
    let tiles = layout
        .specs
        .into_iter()
        .map(|spec| Tile::new(total_width, spec))
        .collect();
    Ok(TileSet {
        tiles,
        page_count: layout.page_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heights(layout: &TileLayout) -> Vec<u32> {
        layout.specs.iter().map(|s| s.height).collect()
    }

    #[test]
    fn test_plan_three_pages_with_remainder() {
        let layout = plan_tiles(25_000, 10_000).unwrap();
        assert_eq!(heights(&layout), vec![10_000, 10_000, 5_000]);
        assert_eq!(layout.page_count, 3);
        let offsets: Vec<u32> = layout.specs.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0, 10_000, 20_000]);
    }

    #[test]
    fn test_plan_single_page_when_shorter() {
        let layout = plan_tiles(8_000, 10_000).unwrap();
        assert_eq!(heights(&layout), vec![8_000]);
        assert_eq!(layout.page_count, 1);
    }

    #[test]
    fn test_plan_evenly_divisible() {
        let layout = plan_tiles(30_000, 10_000).unwrap();
        assert_eq!(heights(&layout), vec![10_000; 3]);
        let layout = plan_tiles(10_000, 10_000).unwrap();
        assert_eq!(heights(&layout), vec![10_000]);
    }

    #[test]
    fn test_plan_covers_region_without_gaps() {
        for (total, page) in [(1, 1), (7, 3), (100, 7), (12_345, 1_000), (999, 1_000)] {
            let layout = plan_tiles(total, page).unwrap();
            assert_eq!(layout.specs.iter().map(|s| s.height).sum::<u32>(), total);
            assert_eq!(layout.specs.len() as u32, layout.page_count);
            let mut next = 0;
            for (i, spec) in layout.specs.iter().enumerate() {
                assert_eq!(spec.index, i as u32 + 1);
                assert_eq!(spec.offset, next);
                next = spec.rows().end;
            }
        }
    }

    #[test]
    fn test_plan_rejects_zero_height() {
        let err = plan_tiles(0, 10_000).unwrap_err();
        assert!(err.is_configuration());
        assert!(plan_tiles(10, 0).is_err());
    }

    #[test]
    fn test_allocate_builds_surfaces() {
        let set = allocate_tiles(4, 25, 10).unwrap();
        assert_eq!(set.page_count, 3);
        assert_eq!(set.tiles.len(), 3);
        let last = &set.tiles[2];
        assert_eq!(last.index(), 3);
        assert_eq!((last.width(), last.height()), (4, 5));
        assert_eq!(last.surface().byte_size(), 4 * 5 * 4);
    }

    #[test]
    fn test_allocate_is_stateless() {
        let a = allocate_tiles(2, 25, 10).unwrap();
        let b = allocate_tiles(2, 25, 10).unwrap();
        assert_eq!(a.page_count, b.page_count);
        assert_eq!(a.tiles[0].index(), b.tiles[0].index());
    }

    #[test]
    fn test_allocate_rejects_zero_width() {
        assert!(allocate_tiles(0, 25, 10).unwrap_err().is_configuration());
    }

    #[test]
    fn test_tile_intersects() {
        let set = allocate_tiles(1, 25, 10).unwrap();
        assert!(set.tiles[0].intersects(5..15));
        assert!(set.tiles[1].intersects(5..15));
        assert!(!set.tiles[2].intersects(5..15));
        assert!(!set.tiles[1].intersects(20..30));
    }
}
