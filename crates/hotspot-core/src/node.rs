//! Heatmap input records: weighted points and full-width attention bands.

use serde::{Deserialize, Serialize};

use crate::error::{HeatmapResult, InvalidNode};

/// Smallest band height the engine draws.
pub const MIN_BAND_HEIGHT: u32 = 1;

/// One weighted sample in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointNode {
    pub x: f64,
    pub y: f64,
    /// Falls back to the configured default radius when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<u32>,
    /// Intensity in [0, 1].
    pub alpha: f32,
}

impl PointNode {
    pub fn new(x: f64, y: f64, radius: u32, alpha: f32) -> Self {
        Self {
            x,
            y,
            radius: Some(radius),
            alpha,
        }
    }

    /// A point that uses the engine's default radius.
    pub fn with_default_radius(x: f64, y: f64, alpha: f32) -> Self {
        Self {
            x,
            y,
            radius: None,
            alpha,
        }
    }

    /// Check the record and resolve its radius against `default_radius`.
    pub fn resolve_radius(&self, default_radius: u32) -> Result<u32, InvalidNode> {
        check_coordinate("x", self.x)?;
        check_coordinate("y", self.y)?;
        check_alpha(self.alpha)?;
        match self.radius.unwrap_or(default_radius) {
            0 => Err(InvalidNode::ZeroRadius),
            r => Ok(r),
        }
    }

    /// The same point shifted vertically by `dy`.
    pub fn translated(&self, dy: f64) -> Self {
        Self {
            y: self.y + dy,
            ..*self
        }
    }
}

/// A horizontal attention band spanning the full surface width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandNode {
    /// Top edge of the band.
    pub y: f64,
    /// Falls back to the configured default height when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Intensity in [0, 1].
    pub alpha: f32,
}

impl BandNode {
    pub fn new(y: f64, height: u32, alpha: f32) -> Self {
        Self {
            y,
            height: Some(height),
            alpha,
        }
    }

    /// Check the record and resolve its height against `default_height`.
    pub fn resolve_height(&self, default_height: u32) -> Result<u32, InvalidNode> {
        check_coordinate("y", self.y)?;
        check_alpha(self.alpha)?;
        let height = self.height.unwrap_or(default_height);
        if height < MIN_BAND_HEIGHT {
            return Err(InvalidNode::ZeroHeight);
        }
        Ok(height)
    }

    /// The same band shifted vertically by `dy`.
    pub fn translated(&self, dy: f64) -> Self {
        Self {
            y: self.y + dy,
            ..*self
        }
    }
}

fn check_coordinate(axis: &'static str, value: f64) -> Result<(), InvalidNode> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InvalidNode::NonFiniteCoordinate { axis, value })
    }
}

fn check_alpha(alpha: f32) -> Result<(), InvalidNode> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(InvalidNode::AlphaOutOfRange(alpha))
    }
}

/// A full heatmap dataset: point samples plus attention bands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapData {
    #[serde(default)]
    pub nodes: Vec<PointNode>,
    #[serde(default)]
    pub attention: Vec<BandNode>,
}

#[derive(Deserialize)]
struct RawData {
    #[serde(default)]
    nodes: Vec<serde_json::Value>,
    #[serde(default)]
    attention: Vec<serde_json::Value>,
}

impl HeatmapData {
    pub fn new(nodes: Vec<PointNode>, attention: Vec<BandNode>) -> Self {
        Self { nodes, attention }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.attention.is_empty()
    }

    /// Parse a `{ "nodes": [...], "attention": [...] }` document.
    ///
    /// Each record is decoded on its own; records that fail to decode are
    /// dropped and returned alongside the data instead of failing the
    /// whole document. A document that is not an object of arrays is an error.
    pub fn from_json(json: &str) -> HeatmapResult<(Self, Vec<InvalidNode>)> {
        let raw: RawData = serde_json::from_str(json)?;
        let mut rejected = Vec::new();

        let nodes = decode_records(raw.nodes, &mut rejected);
        let attention = decode_records(raw.attention, &mut rejected);

        Ok((Self { nodes, attention }, rejected))
    }

    /// Serialize to the JSON document shape accepted by [`HeatmapData::from_json`].
    pub fn to_json(&self) -> HeatmapResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn decode_records<T: serde::de::DeserializeOwned>(
    values: Vec<serde_json::Value>,
    rejected: &mut Vec<InvalidNode>,
) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                rejected.push(InvalidNode::Malformed(e.to_string()));
                None
            }
        })
        .collect()
}
