//! Configuration for the planet generator.
//!
//! Settings persist to disk as `config.ron`, accept CLI overrides via clap,
//! and are validated before any generator or LOD system is built from them.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    BiomeConfig, CONFIG_FILE, Config, DebugConfig, DemoConfig, LodConfig, PlanetConfig,
    default_config_dir,
};
pub use error::{ConfigError, InvalidConfig};
