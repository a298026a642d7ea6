//! # hotspot-render
//!
//! The Hotspot rendering engine. Turns point and band records into colored
//! RGBA tile surfaces. Single-threaded and CPU-only.

pub mod compositor;
pub mod engine;
pub mod export;
pub mod palette;
pub mod template;
pub mod tiles;
pub mod window;

pub use engine::{EngineHooks, HeatmapEngine, RenderStats, ScrollPosition};
pub use palette::{build_palette, Palette, PALETTE_SIZE};
pub use template::{TemplateCache, TemplateStats};
pub use tiles::{allocate_tiles, plan_tiles, Tile, TileLayout, TileSet, TileSpec};
pub use window::{Container, DataWindow, FixedContainer, PageWindow, SurfaceSize};
