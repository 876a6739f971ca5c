//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use glam::DVec3;
use orbis_lod::{DetailDistances, LodSettings, MaintenanceTimer};
use orbis_mesh::{PatchGenerator, PlanetShape, check_resolution};
use orbis_terrain::{
    BiomeAssignmentSettings, BiomeEntry, BiomeRange, BiomeTable, NoiseField, NoiseSettings,
    NoiseType, TerrainSampler,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, InvalidConfig};

/// File name inside the config directory.
pub const CONFIG_FILE: &str = "config.ron";

/// `<platform config dir>/orbis`, or `./orbis` where the platform has none.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("orbis")
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Planet dimensions and noise seed.
    pub planet: PlanetConfig,
    /// Level-of-detail settings.
    pub lod: LodConfig,
    /// Biome content.
    pub biomes: BiomeConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
    /// Headless demo run.
    pub demo: DemoConfig,
}

/// Planet dimensions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetConfig {
    /// Terrain reference diameter.
    pub diameter: f64,
    /// Radius of the water sphere.
    pub sea_level: f64,
    /// Generate terrain buffers.
    pub draw_terrain: bool,
    /// Generate water buffers.
    pub draw_water: bool,
    /// Permutation seed. `None` uses the reference table.
    pub seed: Option<u64>,
}

/// Quadtree and generation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
    /// Split distance per depth. `inf` forces a split.
    pub detail_distances: Vec<f64>,
    /// Deepest split.
    pub max_depth: u8,
    /// Cells per patch side. Must be even.
    pub mesh_resolution: u32,
    /// Delay before the first maintenance tick, in milliseconds.
    pub initial_delay_ms: u64,
    /// Time between maintenance ticks, in milliseconds.
    pub interval_ms: u64,
    /// Generation threads. Zero means one per core.
    pub workers: usize,
    /// Most patch requests outstanding at once.
    pub in_flight_budget: usize,
}

/// Biome table content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BiomeConfig {
    /// Channels and blend constants.
    pub assignment: BiomeAssignmentSettings,
    /// Displacement subtracted where land weight fades.
    pub ocean: BiomeEntry,
    /// Up to twelve land biomes.
    pub regular: Vec<BiomeEntry>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

/// The viewer path flown by the headless demo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Maintenance ticks to run before exiting.
    pub ticks: u32,
    /// Viewer height above the undisplaced surface.
    pub viewer_altitude: f64,
    /// Ticks per full orbit.
    pub orbit_ticks: u32,
}

// --- Default implementations ---

impl Default for PlanetConfig {
    fn default() -> Self {
        let shape = PlanetShape::default();
        Self {
            diameter: shape.diameter,
            sea_level: shape.sea_level,
            draw_terrain: shape.draw_terrain,
            draw_water: shape.draw_water,
            seed: None,
        }
    }
}

impl Default for LodConfig {
    fn default() -> Self {
        let settings = LodSettings::default();
        Self {
            detail_distances: settings.distances.as_slice().to_vec(),
            max_depth: settings.max_depth,
            mesh_resolution: 10,
            initial_delay_ms: 1_000,
            interval_ms: 250,
            workers: settings.workers,
            in_flight_budget: settings.in_flight_budget,
        }
    }
}

impl Default for BiomeConfig {
    fn default() -> Self {
        Self {
            assignment: BiomeAssignmentSettings::default(),
            ocean: ocean_biome(),
            regular: vec![
                land_biome("tundra", (0.0, 0.35), (0.0, 1.0), 6.0, 0.4),
                land_biome("grassland", (0.3, 0.7), (0.45, 1.0), 4.0, 0.2),
                land_biome("forest", (0.3, 0.75), (0.0, 0.55), 8.0, 0.6),
                land_biome("desert", (0.65, 1.0), (0.0, 1.0), 3.0, 1.0),
            ],
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            ticks: 40,
            viewer_altitude: 30.0,
            orbit_ticks: 160,
        }
    }
}

fn ocean_biome() -> BiomeEntry {
    BiomeEntry {
        name: "ocean".to_string(),
        terrain_height: NoiseSettings {
            offset: DVec3::new(117.0, -53.0, 291.0),
            frequency: 1.5,
            octaves: 3,
            strength: 20.0,
            ..NoiseSettings::default()
        },
        terrain_detail: NoiseSettings {
            frequency: 9.0,
            strength: 1.5,
            ..NoiseSettings::default()
        },
        mountain_height: NoiseSettings::silent(),
        mountain_detail: NoiseSettings::silent(),
        ..BiomeEntry::default()
    }
}

fn land_biome(
    name: &str,
    temperate: (f64, f64),
    fertility: (f64, f64),
    height: f64,
    ruggedness: f64,
) -> BiomeEntry {
    BiomeEntry {
        name: name.to_string(),
        temperate: BiomeRange::new(temperate.0, temperate.1),
        fertility: BiomeRange::new(fertility.0, fertility.1),
        terrain_height: NoiseSettings {
            frequency: 2.0,
            octaves: 4,
            strength: height,
            ..NoiseSettings::default()
        },
        terrain_detail: NoiseSettings {
            frequency: 14.0,
            octaves: 2,
            strength: height * 0.1,
            ..NoiseSettings::default()
        },
        mountain_height: NoiseSettings {
            noise_type: NoiseType::Cellular,
            is_rigid: true,
            frequency: 3.0,
            octaves: 2,
            strength: 10.0 * ruggedness,
            ..NoiseSettings::default()
        },
        mountain_detail: NoiseSettings {
            is_rigid: true,
            frequency: 24.0,
            octaves: 2,
            strength: 2.0 * ruggedness,
            ..NoiseSettings::default()
        },
    }
}

// --- Domain objects ---

impl Config {
    /// Terrain and water sphere geometry.
    #[must_use]
    pub fn planet_shape(&self) -> PlanetShape {
        PlanetShape {
            diameter: self.planet.diameter,
            sea_level: self.planet.sea_level,
            draw_terrain: self.planet.draw_terrain,
            draw_water: self.planet.draw_water,
        }
    }

    /// The noise field for the configured seed.
    #[must_use]
    pub fn noise_field(&self) -> NoiseField {
        self.planet
            .seed
            .map_or_else(NoiseField::default, NoiseField::from_seed)
    }

    /// Validated biome table.
    pub fn biome_table(&self) -> Result<BiomeTable, ConfigError> {
        BiomeTable::new(
            self.biomes.regular.clone(),
            self.biomes.ocean.clone(),
            self.biomes.assignment.clone(),
        )
        .map_err(|e| InvalidConfig::from(e).into())
    }

    /// Validated LOD settings.
    pub fn lod_settings(&self) -> Result<LodSettings, ConfigError> {
        let distances = DetailDistances::new(self.lod.detail_distances.clone())
            .map_err(InvalidConfig::from)?;
        let settings = LodSettings {
            distances,
            max_depth: self.lod.max_depth,
            workers: self.lod.workers,
            in_flight_budget: self.lod.in_flight_budget,
        };
        settings.validate().map_err(InvalidConfig::from)?;
        Ok(settings)
    }

    /// Build the patch generator after validating everything it depends on.
    pub fn patch_generator(&self) -> Result<PatchGenerator, ConfigError> {
        self.check_shape()?;
        let sampler = TerrainSampler::new(self.noise_field(), self.biome_table()?);
        PatchGenerator::new(sampler, self.planet_shape(), self.lod.mesh_resolution)
            .map_err(|e| InvalidConfig::from(e).into())
    }

    /// A maintenance timer starting at `now`.
    #[must_use]
    pub fn maintenance_timer(&self, now: Instant) -> MaintenanceTimer {
        MaintenanceTimer::new(
            now,
            Duration::from_millis(self.lod.initial_delay_ms),
            Duration::from_millis(self.lod.interval_ms),
        )
    }

    /// Check every bound without building any mesh templates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.check_shape()?;
        self.biome_table()?;
        self.lod_settings()?;
        check_resolution(self.lod.mesh_resolution).map_err(InvalidConfig::from)?;
        Ok(())
    }

    fn check_shape(&self) -> Result<(), InvalidConfig> {
        for (field, value) in [
            ("diameter", self.planet.diameter),
            ("sea_level", self.planet.sea_level),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(InvalidConfig::NonPositive { field, value });
            }
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    ///
    /// A changed file that fails validation is an error; the caller keeps
    /// running on the old config.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            new_config.validate()?;
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
