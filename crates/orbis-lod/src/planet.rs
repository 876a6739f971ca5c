//! Whole-planet LOD: six face trees, a shared generator, and the worker
//! pipeline, driven one maintenance tick at a time.

use std::sync::Arc;

use glam::DVec3;
use orbis_cubesphere::{CubeFace, MAX_DEPTH};
use orbis_mesh::PatchGenerator;
use orbis_terrain::{NoiseField, TerrainSampler};
use rand::Rng;
use tracing::{debug, info};

use crate::face_tree::{FaceStatistics, FaceTree, LeafView, PatchKey, PatchResult};
use crate::pipeline::GenerationPipeline;
use crate::{DetailDistances, LodError};

/// Tunables for [`PlanetLod`].
#[derive(Clone, Debug, PartialEq)]
pub struct LodSettings {
    /// Split thresholds per depth.
    pub distances: DetailDistances,
    /// Deepest split.
    pub max_depth: u8,
    /// Worker threads; zero means one per core.
    pub workers: usize,
    /// Most requests outstanding at once.
    pub in_flight_budget: usize,
}

impl Default for LodSettings {
    fn default() -> Self {
        Self {
            distances: DetailDistances::default_planet(),
            max_depth: 4,
            workers: 0,
            in_flight_budget: 64,
        }
    }
}

impl LodSettings {
    /// Check the bounds [`PlanetLod::new`] enforces.
    ///
    /// # Errors
    ///
    /// Fails on a `max_depth` outside `1..=MAX_DEPTH` or a zero in-flight
    /// budget.
    pub fn validate(&self) -> Result<(), LodError> {
        if !(1..=MAX_DEPTH).contains(&self.max_depth) {
            return Err(LodError::DepthOutOfRange(self.max_depth));
        }
        if self.in_flight_budget == 0 {
            return Err(LodError::ZeroBudget);
        }
        Ok(())
    }
}

/// What one tick did, summed over all faces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Leaves split.
    pub splits: usize,
    /// Subtrees merged.
    pub merges: usize,
    /// Leaves whose neighbor mask changed.
    pub remasked: usize,
    /// Requests handed to workers (or generated inline).
    pub dispatched: usize,
    /// Results installed.
    pub committed: usize,
    /// Results thrown away because their leaf moved on.
    pub discarded: usize,
}

/// Level-of-detail driver for a whole planet.
#[derive(Debug)]
pub struct PlanetLod {
    faces: Vec<FaceTree>,
    settings: LodSettings,
    generator: Arc<PatchGenerator>,
    pipeline: GenerationPipeline,
}

impl PlanetLod {
    /// Build the six face roots and start the worker pool.
    ///
    /// # Errors
    ///
    /// Fails on an out-of-range `max_depth` or a zero in-flight budget.
    pub fn new(generator: PatchGenerator, settings: LodSettings) -> Result<Self, LodError> {
        settings.validate()?;
        let half_extent = generator.shape().half_diameter();
        let faces = CubeFace::ALL
            .iter()
            .map(|&face| FaceTree::new(face, half_extent, settings.max_depth))
            .collect::<Result<Vec<_>, _>>()?;
        let pipeline = GenerationPipeline::new(settings.workers, settings.in_flight_budget);
        info!(
            diameter = generator.shape().diameter,
            resolution = generator.templates().resolution(),
            max_depth = settings.max_depth,
            workers = pipeline.worker_count(),
            "Planet LOD ready"
        );
        Ok(Self {
            faces,
            settings,
            generator: Arc::new(generator),
            pipeline,
        })
    }

    /// Face trees in build order.
    #[must_use]
    pub fn faces(&self) -> &[FaceTree] {
        &self.faces
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &LodSettings {
        &self.settings
    }

    /// Current generator.
    #[must_use]
    pub fn generator(&self) -> &Arc<PatchGenerator> {
        &self.generator
    }

    /// Requests still being generated.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pipeline.in_flight_count()
    }

    /// One maintenance tick: sweep, refresh masks, dispatch requests to the
    /// workers, and commit whatever they have finished.
    pub fn tick(&mut self, viewer: DVec3) -> TickReport {
        let mut report = self.sweep(viewer);

        for face in &mut self.faces {
            let requests = face.pending_requests(self.pipeline.available());
            for request in requests {
                match self.pipeline.submit(request, &self.generator) {
                    Ok(()) => report.dispatched += 1,
                    Err(request) => face.release(&request),
                }
            }
        }

        self.commit_all(self.pipeline.drain_results(), &mut report);
        debug!(?report, in_flight = self.pipeline.in_flight_count(), "LOD tick");
        report
    }

    /// Like [`tick`](Self::tick) but generates every request on the calling
    /// thread before returning, so every leaf ends the tick meshed.
    pub fn tick_sync(&mut self, viewer: DVec3) -> TickReport {
        let mut report = self.sweep(viewer);
        let mut results = Vec::new();
        for face in &mut self.faces {
            for request in face.pending_requests(usize::MAX) {
                report.dispatched += 1;
                results.push(PatchResult {
                    key: request.key,
                    generation: request.generation,
                    mesh: self.generator.generate(&request.transform, request.mask),
                });
            }
        }
        self.commit_all(results, &mut report);
        debug!(?report, "LOD tick (sync)");
        report
    }

    /// Wait for the workers to go idle and commit what they produced.
    pub fn flush(&mut self) -> TickReport {
        let mut report = TickReport::default();
        let results = self.pipeline.wait_idle();
        self.commit_all(results, &mut report);
        report
    }

    /// Throw away every tree and mesh. The next tick rebuilds from the
    /// face roots.
    pub fn regenerate(&mut self) {
        self.pipeline.cancel_all();
        for face in &mut self.faces {
            face.reset();
        }
        info!("Planet regenerated");
    }

    /// Swap in a new generator and regenerate.
    pub fn set_generator(&mut self, generator: PatchGenerator) {
        self.generator = Arc::new(generator);
        self.regenerate();
    }

    /// Redraw the noise permutation table.
    pub fn randomize_seed<R: Rng>(&mut self, rng: &mut R) {
        let sampler = TerrainSampler::new(
            NoiseField::randomized(rng),
            self.generator.sampler().biomes().clone(),
        );
        self.set_generator(self.generator.with_sampler(sampler));
    }

    /// Redraw every biome's displacement layers, the ocean's included.
    pub fn randomize_biomes<R: Rng>(&mut self, rng: &mut R) {
        let mut biomes = self.generator.sampler().biomes().clone();
        biomes.randomize_displacement(rng);
        let sampler = TerrainSampler::new(self.generator.sampler().field().clone(), biomes);
        self.set_generator(self.generator.with_sampler(sampler));
    }

    /// Redraw the temperate and fertility noise.
    pub fn randomize_assignment<R: Rng>(&mut self, rng: &mut R) {
        let mut biomes = self.generator.sampler().biomes().clone();
        biomes.randomize_assignment(rng);
        let sampler = TerrainSampler::new(self.generator.sampler().field().clone(), biomes);
        self.set_generator(self.generator.with_sampler(sampler));
    }

    /// Every leaf on every face.
    #[must_use]
    pub fn leaves(&self) -> Vec<LeafView<'_>> {
        self.faces.iter().flat_map(FaceTree::leaves).collect()
    }

    /// Counts summed over all faces.
    #[must_use]
    pub fn statistics(&self) -> FaceStatistics {
        let mut total = FaceStatistics::default();
        for face in &self.faces {
            total += face.statistics();
        }
        total
    }

    fn sweep(&mut self, viewer: DVec3) -> TickReport {
        let mut report = TickReport::default();
        let mut orphaned: Vec<PatchKey> = Vec::new();
        for face in &mut self.faces {
            let sweep = face.update(viewer, &self.settings.distances);
            report.splits += sweep.splits;
            report.merges += sweep.merges;
            orphaned.extend(sweep.orphaned);
        }
        for key in &orphaned {
            self.pipeline.cancel(key);
        }
        for face in &mut self.faces {
            report.remasked += face.refresh_masks();
        }
        report
    }

    fn commit_all(&mut self, results: Vec<PatchResult>, report: &mut TickReport) {
        for result in results {
            let key = result.key;
            let committed = self
                .faces
                .iter_mut()
                .find(|face| face.face() == key.face)
                .is_some_and(|face| face.commit(result));
            if committed {
                report.committed += 1;
            } else {
                report.discarded += 1;
                debug!(?key, "Discarded stale patch");
            }
        }
    }
}
