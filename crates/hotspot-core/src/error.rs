/// Core error types for the hotspot engine.
use std::path::PathBuf;

/// A specialized Result type for hotspot operations.
pub type HeatmapResult<T> = Result<T, HeatmapError>;

/// Top-level error type encompassing all hotspot subsystems.
#[derive(Debug, thiserror::Error)]
pub enum HeatmapError {
    /// Invalid settings: empty gradient, zero region height, zero radius, ...
    /// Always fatal; there is nothing to retry.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("export error: {message} ({path:?})")]
    Export { message: String, path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config file error: {0}")]
    Toml(String),
}

impl HeatmapError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        HeatmapError::Configuration(message.into())
    }

    /// Create an export error.
    pub fn export(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        HeatmapError::Export {
            message: message.into(),
            path: path.into(),
        }
    }

    /// True for errors caused by invalid settings.
    pub fn is_configuration(&self) -> bool {
        matches!(self, HeatmapError::Configuration(_))
    }
}

impl From<toml::de::Error> for HeatmapError {
    fn from(e: toml::de::Error) -> Self {
        HeatmapError::Toml(e.to_string())
    }
}

impl From<toml::ser::Error> for HeatmapError {
    fn from(e: toml::ser::Error) -> Self {
        HeatmapError::Toml(e.to_string())
    }
}

/// Why a single point or band record was rejected.
///
/// These never abort a render: the record is dropped and counted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidNode {
    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("non-finite coordinate {axis} = {value}")]
    NonFiniteCoordinate { axis: &'static str, value: f64 },

    #[error("alpha {0} outside [0, 1]")]
    AlphaOutOfRange(f32),

    #[error("radius must be at least 1")]
    ZeroRadius,

    #[error("height must be at least 1")]
    ZeroHeight,
}
