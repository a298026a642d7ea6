//! # hotspot-core
//!
//! Core types shared by the hotspot heatmap crates: colors, pixel surfaces
//! and alpha masks, point/band records, engine settings, and error types.

pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod hash;
pub mod node;

pub use config::*;

pub use color::{Color, ColorError};
pub use error::{HeatmapError, HeatmapResult, InvalidNode};
pub use frame::{AlphaMask, FrameBuffer};
pub use hash::ContentHash;
pub use node::{BandNode, HeatmapData, PointNode};
