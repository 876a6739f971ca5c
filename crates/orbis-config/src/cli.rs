//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Planet generator command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "orbis", about = "Procedural planet LOD generator")]
pub struct CliArgs {
    /// Terrain reference diameter.
    #[arg(long)]
    pub diameter: Option<f64>,

    /// Water sphere radius.
    #[arg(long)]
    pub sea_level: Option<f64>,

    /// Cells per patch side (even, 2..=64).
    #[arg(long)]
    pub resolution: Option<u32>,

    /// Deepest quadtree split.
    #[arg(long)]
    pub max_depth: Option<u8>,

    /// Noise permutation seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maintenance ticks to run.
    #[arg(long)]
    pub ticks: Option<u32>,

    /// Viewer height above the undisplaced surface.
    #[arg(long)]
    pub altitude: Option<f64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    ///
    /// Overrides are not validated here; call [`Config::validate`] after.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(d) = args.diameter {
            self.planet.diameter = d;
        }
        if let Some(s) = args.sea_level {
            self.planet.sea_level = s;
        }
        if let Some(r) = args.resolution {
            self.lod.mesh_resolution = r;
        }
        if let Some(depth) = args.max_depth {
            self.lod.max_depth = depth;
        }
        if let Some(seed) = args.seed {
            self.planet.seed = Some(seed);
        }
        if let Some(ticks) = args.ticks {
            self.demo.ticks = ticks;
        }
        if let Some(altitude) = args.altitude {
            self.demo.viewer_altitude = altitude;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
