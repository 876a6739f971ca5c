//! Headless planet LOD driver.
//!
//! Loads `config.ron`, flies a viewer around the planet, and runs
//! maintenance ticks on the configured schedule, logging what the quadtrees
//! and generation workers do.
//! Run with `cargo run -p orbis-demo -- --ticks 20 --altitude 10`.

mod orbit;

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use orbis_config::{CliArgs, Config, ConfigError, default_config_dir};
use orbis_lod::{LodError, PlanetLod};
use tracing::{error, info};

use crate::orbit::Orbit;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Lod(#[from] LodError),
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    orbis_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), DemoError> {
    config.validate()?;
    let mut planet = PlanetLod::new(config.patch_generator()?, config.lod_settings()?)?;

    let orbit = Orbit::new(
        config.planet.diameter / 2.0 + config.demo.viewer_altitude,
        config.demo.orbit_ticks,
    );
    let mut timer = config.maintenance_timer(Instant::now());
    let mut tick = 0;
    while tick < config.demo.ticks {
        let now = Instant::now();
        if !timer.poll(now) {
            std::thread::sleep(timer.remaining(now));
            continue;
        }

        let viewer = orbit.position(tick);
        let report = planet.tick(viewer);
        let stats = planet.statistics();
        info!(
            tick,
            leaves = stats.leaves,
            ready = stats.ready,
            stale = stats.stale,
            pending = stats.pending,
            deepest = stats.deepest,
            splits = report.splits,
            merges = report.merges,
            committed = report.committed,
            discarded = report.discarded,
            in_flight = planet.in_flight(),
            "Maintenance tick"
        );
        tick += 1;
    }

    let tail = planet.flush();
    summarize(&planet, tail.committed);
    Ok(())
}

fn summarize(planet: &PlanetLod, flushed: usize) {
    let leaves = planet.leaves();
    let meshes: Vec<_> = leaves.iter().filter_map(|leaf| leaf.mesh).collect();
    let triangles: usize = meshes.iter().map(|m| m.indices().len() / 3).sum();
    let bytes: usize = meshes
        .iter()
        .map(|m| m.terrain_bytes().len() + m.water_bytes().len())
        .sum();
    info!(
        leaves = leaves.len(),
        meshed = meshes.len(),
        triangles,
        vertex_bytes = bytes,
        flushed,
        "Planet summary"
    );
}
