use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{HeatmapError, HeatmapResult};
use crate::Color;

/// One gradient stop: a color pinned at a normalized position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub position: f32,
    pub color: Color,
}

/// Ordered, non-empty set of gradient stops with unique positions in [0, 1].
///
/// In config files this is a table of `"position" = "color"` strings, e.g.
/// `"0.25" = "rgb(0, 0, 255)"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct GradientStops {
    stops: Vec<GradientStop>,
}

impl GradientStops {
    /// Build from (position, color) pairs in any order.
    pub fn new(stops: impl IntoIterator<Item = (f32, Color)>) -> HeatmapResult<Self> {
        let mut stops: Vec<GradientStop> = stops
            .into_iter()
            .map(|(position, color)| GradientStop { position, color })
            .collect();

        if stops.is_empty() {
            return Err(HeatmapError::config("gradient must have at least one stop"));
        }
        if let Some(bad) = stops
            .iter()
            .find(|s| !s.position.is_finite() || !(0.0..=1.0).contains(&s.position))
        {
            return Err(HeatmapError::config(format!(
                "gradient stop position {} outside [0, 1]",
                bad.position
            )));
        }

        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        if let Some(pair) = stops.windows(2).find(|w| w[0].position == w[1].position) {
            return Err(HeatmapError::config(format!(
                "duplicate gradient stop position {}",
                pair[0].position
            )));
        }

        Ok(Self { stops })
    }

    /// Parse (position, color string) pairs, as found in config files.
    pub fn parse<'a>(stops: impl IntoIterator<Item = (&'a str, &'a str)>) -> HeatmapResult<Self> {
        let parsed = stops
            .into_iter()
            .map(|(pos, color)| {
                let position = pos.trim().parse::<f32>().map_err(|_| {
                    HeatmapError::config(format!("invalid gradient stop position '{}'", pos))
                })?;
                let color = color.parse::<Color>().map_err(|e| {
                    HeatmapError::config(format!("invalid gradient color '{}': {}", color, e))
                })?;
                Ok((position, color))
            })
            .collect::<HeatmapResult<Vec<_>>>()?;
        Self::new(parsed)
    }

    /// Stops sorted by ascending position.
    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

impl Default for GradientStops {
    fn default() -> Self {
        Self {
            stops: vec![
                GradientStop { position: 0.25, color: Color::BLUE },
                GradientStop { position: 0.55, color: Color::GREEN },
                GradientStop { position: 0.85, color: Color::YELLOW },
                GradientStop { position: 1.0, color: Color::RED },
            ],
        }
    }
}

impl TryFrom<BTreeMap<String, String>> for GradientStops {
    type Error = HeatmapError;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::parse(map.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

impl From<GradientStops> for BTreeMap<String, String> {
    fn from(stops: GradientStops) -> Self {
        stops
            .stops
            .iter()
            .map(|s| (s.position.to_string(), s.color.to_string()))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaginationConfig {
    /// Height in pixels of one tile.
    pub page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { page_size: 10_000 }
    }
}

/// Settings consumed by the engine at initialization.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Radius used by points that carry none.
    pub radius: u32,
    /// Height used by bands that carry none.
    pub height: u32,
    /// Fraction of the radius drawn at full intensity, in (0, 1].
    /// 1 draws hard-edged disks.
    pub node_blur: f32,
    /// Logical width; replaced by the measured container width at init.
    pub max_width: u32,
    /// Minimum logical height; the measured container height wins if larger.
    pub max_height: u32,
    /// Templates kept per cache before the least recently used is evicted.
    pub template_cache_capacity: usize,
    // Tables last so the TOML output stays valid.
    pub gradient: GradientStops,
    pub pagination: PaginationConfig,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            radius: 40,
            height: 40,
            node_blur: 0.15,
            max_width: 0,
            max_height: 0,
            template_cache_capacity: 256,
            gradient: GradientStops::default(),
            pagination: PaginationConfig::default(),
        }
    }
}

impl HeatmapConfig {
    /// Reject settings the engine cannot render with.
    pub fn validate(&self) -> HeatmapResult<()> {
        if self.radius == 0 {
            return Err(HeatmapError::config("default radius must be at least 1"));
        }
        if self.height == 0 {
            return Err(HeatmapError::config("default band height must be at least 1"));
        }
        if !(self.node_blur > 0.0 && self.node_blur <= 1.0) {
            return Err(HeatmapError::config(format!(
                "node_blur {} outside (0, 1]",
                self.node_blur
            )));
        }
        if self.pagination.page_size == 0 {
            return Err(HeatmapError::config("pagination.page_size must be at least 1"));
        }
        if self.template_cache_capacity == 0 {
            return Err(HeatmapError::config("template_cache_capacity must be at least 1"));
        }
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> HeatmapResult<Self> {
        let config: HeatmapConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> HeatmapResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn save_to_file(&self, path: &Path) -> HeatmapResult<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
