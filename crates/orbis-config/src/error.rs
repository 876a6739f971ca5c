//! Configuration error types.

use orbis_lod::LodError;
use orbis_mesh::TemplateError;
use orbis_terrain::BiomeTableError;

/// Errors that can occur when loading, saving, parsing, or validating
/// configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the config file to disk.
    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to parse RON content.
    #[error("failed to parse config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// Failed to serialize config to RON.
    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] ron::Error),

    /// The file parsed but describes an impossible planet.
    #[error("invalid config: {0}")]
    Invalid(#[from] InvalidConfig),
}

/// Why a parsed config was rejected.
#[derive(Debug, thiserror::Error)]
pub enum InvalidConfig {
    /// Biome content or assignment settings.
    #[error(transparent)]
    Biomes(#[from] BiomeTableError),

    /// Detail distances, depth, or budget.
    #[error(transparent)]
    Lod(#[from] LodError),

    /// Mesh resolution.
    #[error(transparent)]
    Resolution(#[from] TemplateError),

    /// A planet dimension that must be strictly positive.
    #[error("planet {field} is {value}, it must be positive")]
    NonPositive {
        /// Setting name.
        field: &'static str,
        /// Configured value.
        value: f64,
    },
}
