//! Collaborator seams: data slicing per page, and the hosting container.

use hotspot_core::HeatmapData;

use crate::tiles::Tile;

/// Picks the subset of the dataset that belongs on one page.
///
/// Returned records must already be in tile-local coordinates.
pub trait DataWindow {
    fn window(&self, data: &HeatmapData, page: u32, page_size: u32) -> HeatmapData;
}

impl<F> DataWindow for F
where
    F: Fn(&HeatmapData, u32, u32) -> HeatmapData,
{
    fn window(&self, data: &HeatmapData, page: u32, page_size: u32) -> HeatmapData {
        self(data, page, page_size)
    }
}

/// Default window: records whose `y` falls in the page's half-open row range
/// `[(page - 1) * page_size, page * page_size)`, shifted to tile-local rows.
///
/// Windows of different pages never share a record, so a point straddling a
/// page boundary is drawn only on the page holding its center.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageWindow;

impl DataWindow for PageWindow {
    fn window(&self, data: &HeatmapData, page: u32, page_size: u32) -> HeatmapData {
        let start = page.saturating_sub(1) as f64 * page_size as f64;
        let end = start + page_size as f64;
        let on_page = |y: f64| y >= start && y < end;

        HeatmapData {
            nodes: data
                .nodes
                .iter()
                .filter(|n| on_page(n.y))
                .map(|n| n.translated(-start))
                .collect(),
            attention: data
                .attention
                .iter()
                .filter(|b| on_page(b.y))
                .map(|b| b.translated(-start))
                .collect(),
        }
    }
}

/// Measured size of the hosting container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// The host the engine's tiles are displayed in.
pub trait Container {
    /// Available drawing area.
    fn size(&self) -> SurfaceSize;

    /// Called once per tile, in allocation order, during engine init.
    fn attach_tile(&mut self, _tile: &Tile) {}
}

/// A container of fixed size that records the tiles attached to it.
#[derive(Debug, Clone, Default)]
pub struct FixedContainer {
    pub size: SurfaceSize,
    /// Indices of attached tiles, in attach order.
    pub attached: Vec<u32>,
}

impl FixedContainer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: SurfaceSize::new(width, height),
            attached: Vec::new(),
        }
    }
}

impl Container for FixedContainer {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn attach_tile(&mut self, tile: &Tile) {
        self.attached.push(tile.index());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotspot_core::{BandNode, PointNode};

    fn data() -> HeatmapData {
        HeatmapData::new(
            vec![
                PointNode::new(1.0, 5.0, 2, 1.0),
                PointNode::new(1.0, 10.0, 2, 1.0),
                PointNode::new(1.0, 19.9, 2, 1.0),
                PointNode::new(1.0, 25.0, 2, 1.0),
            ],
            vec![BandNode::new(0.0, 4, 0.5), BandNode::new(12.0, 4, 0.5)],
        )
    }

    #[test]
    fn test_page_window_selects_half_open_range() {
        let page = PageWindow.window(&data(), 2, 10);
        let ys: Vec<f64> = page.nodes.iter().map(|n| n.y).collect();
        assert_eq!(ys.len(), 2);
        assert_eq!(ys[0], 0.0);
        assert!((ys[1] - 9.9).abs() < 1e-9);
        assert_eq!(page.attention.len(), 1);
        assert_eq!(page.attention[0].y, 2.0);
    }

    #[test]
    fn test_page_windows_do_not_overlap() {
        let data = data();
        let total: usize = (1..=3).map(|p| PageWindow.window(&data, p, 10).nodes.len()).sum();
        assert_eq!(total, data.nodes.len());
    }

    #[test]
    fn test_closure_window() {
        let window = |d: &HeatmapData, _page: u32, _size: u32| d.clone();
        assert_eq!(window.window(&data(), 1, 10), data());
    }

    #[test]
    fn test_fixed_container_size() {
        let container = FixedContainer::new(300, 200);
        assert_eq!(container.size(), SurfaceSize::new(300, 200));
        assert!(container.attached.is_empty());
    }
}
