use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RGBA color representation with f32 components in [0.0, 1.0] range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Create a new RGBA color.
    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color (alpha = 1.0).
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create an opaque color from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Create a color from a hex string (e.g., "#FF0000" or "#FF0000FF").
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let hex = hex.trim_start_matches('#');
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or(ColorError::InvalidHex)
        };
        match hex.len() {
            6 => Ok(Self::from_rgb8(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => {
                let a = channel(6..8)?;
                Ok(Self {
                    a: a as f32 / 255.0,
                    ..Self::from_rgb8(channel(0..2)?, channel(2..4)?, channel(4..6)?)
                })
            }
            _ => Err(ColorError::InvalidHex),
        }
    }

    /// Parse a CSS functional color: `rgb(r, g, b)` or `rgba(r, g, b, a)`.
    ///
    /// Channels are 0-255 integers, alpha is a 0-1 float.
    pub fn from_css(css: &str) -> Result<Self, ColorError> {
        let css = css.trim();
        let (body, has_alpha) = if let Some(rest) = css.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = css.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(ColorError::InvalidFunction(css.to_string()));
        };
        let body = body
            .strip_suffix(')')
            .ok_or_else(|| ColorError::InvalidFunction(css.to_string()))?;

        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(ColorError::InvalidFunction(css.to_string()));
        }

        let channel = |s: &str| {
            s.parse::<f32>()
                .ok()
                .filter(|v| (0.0..=255.0).contains(v))
                .map(|v| v / 255.0)
                .ok_or_else(|| ColorError::InvalidChannel(s.to_string()))
        };
        let alpha = if has_alpha {
            parts[3]
                .parse::<f32>()
                .ok()
                .filter(|v| (0.0..=1.0).contains(v))
                .ok_or_else(|| ColorError::InvalidChannel(parts[3].to_string()))?
        } else {
            1.0
        };

        Ok(Self::rgba(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
            alpha,
        ))
    }

    /// Convert to RGBA u8 tuple.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            (self.r * 255.0).round().clamp(0.0, 255.0) as u8,
            (self.g * 255.0).round().clamp(0.0, 255.0) as u8,
            (self.b * 255.0).round().clamp(0.0, 255.0) as u8,
            (self.a * 255.0).round().clamp(0.0, 255.0) as u8,
        ]
    }

    /// Linearly interpolate between two colors.
    pub fn lerp(&self, other: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    // --- Named constants ---

    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const RED: Color = Color {
        r: 1.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const GREEN: Color = Color {
        r: 0.0,
        g: 1.0,
        b: 0.0,
        a: 1.0,
    };
    pub const BLUE: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 1.0,
        a: 1.0,
    };
    pub const YELLOW: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 0.0,
        a: 1.0,
    };
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Accepts `#RRGGBB`, `#RRGGBBAA`, `rgb(...)` and `rgba(...)`.
impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("rgb") {
            Self::from_css(s)
        } else {
            Self::from_hex(s)
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", r, g, b, a)
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ColorError {
    #[error("invalid hex color string")]
    InvalidHex,
    #[error("invalid color function: {0}")]
    InvalidFunction(String),
    #[error("color channel out of range: {0}")]
    InvalidChannel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex_rgb() {
        let c = Color::from_hex("#FF8800").unwrap();
        assert_eq!(c.to_rgba8(), [255, 136, 0, 255]);
    }

    #[test]
    fn test_color_from_hex_rgba() {
        let c = Color::from_hex("#FF880080").unwrap();
        assert_eq!(c.to_rgba8(), [255, 136, 0, 128]);
    }

    #[test]
    fn test_color_from_hex_invalid() {
        assert!(Color::from_hex("invalid").is_err());
        assert!(Color::from_hex("#GG0000").is_err());
    }

    #[test]
    fn test_color_from_css_rgb() {
        let c = Color::from_css("rgb(0, 255, 0)").unwrap();
        assert_eq!(c.to_rgba8(), [0, 255, 0, 255]);
        let c: Color = "rgb(255,255,0)".parse().unwrap();
        assert_eq!(c.to_rgba8(), [255, 255, 0, 255]);
    }

    #[test]
    fn test_color_from_css_rgba() {
        let c = Color::from_css("rgba(0,0,0,0)").unwrap();
        assert_eq!(c.to_rgba8(), [0, 0, 0, 0]);
        let c = Color::from_css("rgba(10, 20, 30, 1)").unwrap();
        assert_eq!(c.to_rgba8(), [10, 20, 30, 255]);
    }

    #[test]
    fn test_color_from_css_invalid() {
        assert!(Color::from_css("rgb(0, 0)").is_err());
        assert!(Color::from_css("rgb(300, 0, 0)").is_err());
        assert!(Color::from_css("rgba(0, 0, 0, 2)").is_err());
        assert!(Color::from_css("hsl(0, 0%, 0%)").is_err());
        assert!("rgb(1, 2, 3".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_lerp() {
        let mid = Color::BLACK.lerp(&Color::WHITE, 0.5);
        assert!((mid.r - 0.5).abs() < 0.01);
        assert!((mid.g - 0.5).abs() < 0.01);
        assert!((mid.b - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_color_lerp_clamps() {
        assert_eq!(Color::RED.lerp(&Color::BLUE, -1.0), Color::RED);
        assert_eq!(Color::RED.lerp(&Color::BLUE, 2.0), Color::BLUE);
    }

    #[test]
    fn test_color_display() {
        assert_eq!(format!("{}", Color::RED), "#FF0000");
        assert_eq!(format!("{}", Color::rgba(1.0, 0.0, 0.0, 0.0)), "#FF000000");
    }

    #[test]
    fn test_color_display_round_trips() {
        let c: Color = "rgb(0, 128, 255)".parse().unwrap();
        let back: Color = c.to_string().parse().unwrap();
        assert_eq!(back.to_rgba8(), c.to_rgba8());
    }
}
