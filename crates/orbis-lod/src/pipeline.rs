//! Off-thread patch generation.
//!
//! The owning thread submits [`PatchRequest`] snapshots and drains
//! [`PatchResult`]s once per tick. Workers never touch a tree. A request
//! whose node merged away is cancelled: workers skip it if they have not
//! started, and drop its result if they have.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, SendError, Sender};
use dashmap::DashMap;
use orbis_mesh::PatchGenerator;
use tracing::debug;

use crate::face_tree::{PatchKey, PatchRequest, PatchResult};

struct QueuedRequest {
    request: PatchRequest,
    generator: Arc<PatchGenerator>,
    cancelled: Arc<AtomicBool>,
}

type ActiveMap = DashMap<PatchKey, (u64, Arc<AtomicBool>)>;

const IDLE_POLL: Duration = Duration::from_millis(5);

fn run_worker(
    tasks: Receiver<QueuedRequest>,
    results: Sender<PatchResult>,
    in_flight: Arc<AtomicUsize>,
) {
    while let Ok(queued) = tasks.recv() {
        let sent = process(queued, &results);
        // Pairs with the Acquire load in `in_flight_count`.
        in_flight.fetch_sub(1, Ordering::Release);
        if sent.is_err() {
            debug!("Result receiver dropped, stopping patch worker");
            break;
        }
    }
}

fn process(
    queued: QueuedRequest,
    results: &Sender<PatchResult>,
) -> Result<(), SendError<PatchResult>> {
    if queued.cancelled.load(Ordering::Relaxed) {
        return Ok(());
    }
    let request = queued.request;
    let mesh = queued.generator.generate(&request.transform, request.mask);
    if queued.cancelled.load(Ordering::Relaxed) {
        return Ok(());
    }
    results.send(PatchResult {
        key: request.key,
        generation: request.generation,
        mesh,
    })
}

/// Worker pool that turns patch requests into meshes.
pub struct GenerationPipeline {
    task_sender: Option<Sender<QueuedRequest>>,
    result_receiver: Receiver<PatchResult>,
    worker_handles: Vec<JoinHandle<()>>,
    budget: usize,
    in_flight: Arc<AtomicUsize>,
    active: Arc<ActiveMap>,
}

impl GenerationPipeline {
    /// Spawn `worker_count` workers (all cores when zero) sharing an
    /// in-flight `budget`.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to spawn a worker thread.
    pub fn new(worker_count: usize, budget: usize) -> Self {
        let worker_count = if worker_count == 0 {
            num_cpus::get().max(1)
        } else {
            worker_count
        };
        let (task_tx, task_rx) = crossbeam_channel::bounded::<QueuedRequest>(budget.max(1));
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let rx = task_rx.clone();
            let tx = result_tx.clone();
            let flight = Arc::clone(&in_flight);

            let handle = std::thread::Builder::new()
                .name(format!("patch-gen-{index}"))
                .spawn(move || run_worker(rx, tx, flight))
                .expect("failed to spawn patch generation worker");
            handles.push(handle);
        }

        Self {
            task_sender: Some(task_tx),
            result_receiver: result_rx,
            worker_handles: handles,
            budget,
            in_flight,
            active: Arc::new(DashMap::new()),
        }
    }

    /// Queue a request. A newer request for the same node cancels the older
    /// one.
    ///
    /// # Errors
    ///
    /// Hands the request back if the budget is exhausted or the pipeline
    /// has shut down.
    #[allow(clippy::result_large_err)]
    pub fn submit(
        &self,
        request: PatchRequest,
        generator: &Arc<PatchGenerator>,
    ) -> Result<(), PatchRequest> {
        let Some(sender) = &self.task_sender else {
            return Err(request);
        };
        if self.in_flight.load(Ordering::Relaxed) >= self.budget {
            return Err(request);
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let key = request.key;
        let generation = request.generation;
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        let queued = QueuedRequest {
            request,
            generator: Arc::clone(generator),
            cancelled: Arc::clone(&cancelled),
        };
        match sender.try_send(queued) {
            Ok(()) => {
                if let Some((_, (_, previous))) = self.active.remove(&key) {
                    previous.store(true, Ordering::Relaxed);
                }
                self.active.insert(key, (generation, cancelled));
                Ok(())
            }
            Err(e) => {
                self.in_flight.fetch_sub(1, Ordering::Relaxed);
                Err(e.into_inner().request)
            }
        }
    }

    /// Cancel the outstanding request for `key`, if any.
    pub fn cancel(&self, key: &PatchKey) {
        if let Some((_, (_, cancelled))) = self.active.remove(key) {
            cancelled.store(true, Ordering::Relaxed);
        }
    }

    /// Cancel every outstanding request.
    pub fn cancel_all(&self) {
        for entry in self.active.iter() {
            entry.value().1.store(true, Ordering::Relaxed);
        }
        self.active.clear();
    }

    /// Collect every finished result.
    pub fn drain_results(&self) -> Vec<PatchResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_receiver.try_recv() {
            self.forget(&result);
            results.push(result);
        }
        results
    }

    fn forget(&self, result: &PatchResult) {
        self.active
            .remove_if(&result.key, |_, (generation, _)| *generation == result.generation);
    }

    /// Requests queued or running.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Block until every queued or running request has finished, and
    /// return all results delivered meanwhile.
    ///
    /// Returns early if every worker has exited.
    pub fn wait_idle(&self) -> Vec<PatchResult> {
        let mut results = self.drain_results();
        while self.in_flight_count() > 0 {
            match self.result_receiver.recv_timeout(IDLE_POLL) {
                Ok(result) => {
                    self.forget(&result);
                    results.push(result);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        results.extend(self.drain_results());
        results
    }

    /// Room left in the budget.
    pub fn available(&self) -> usize {
        self.budget.saturating_sub(self.in_flight_count())
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.worker_handles.len()
    }

    /// Stop accepting work and join every worker.
    pub fn shutdown(&mut self) {
        self.task_sender.take();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for GenerationPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for GenerationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationPipeline")
            .field("workers", &self.worker_handles.len())
            .field("budget", &self.budget)
            .field("in_flight", &self.in_flight_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use orbis_cubesphere::{CubeFace, NeighborMask};
    use orbis_mesh::{PatchTransform, PlanetShape};
    use orbis_terrain::{
        BiomeAssignmentSettings, BiomeEntry, BiomeTable, NoiseField, TerrainSampler,
    };

    use super::*;

    fn generator() -> Arc<PatchGenerator> {
        let table =
            BiomeTable::new(Vec::new(), BiomeEntry::padding(), BiomeAssignmentSettings::default())
                .unwrap();
        Arc::new(
            PatchGenerator::new(
                TerrainSampler::new(NoiseField::default(), table),
                PlanetShape::default(),
                4,
            )
            .unwrap(),
        )
    }

    fn request(hash: u64, generation: u64) -> PatchRequest {
        let basis = CubeFace::PosZ.basis();
        PatchRequest {
            key: PatchKey {
                face: CubeFace::PosZ,
                detail_level: 1,
                hash,
            },
            generation,
            transform: PatchTransform {
                basis,
                center: basis.local_up * 500.0,
                radius: 250.0,
            },
            mask: NeighborMask::NONE,
        }
    }

    fn wait_for(pipeline: &GenerationPipeline, count: usize) -> Vec<PatchResult> {
        let start = Instant::now();
        let mut results = Vec::new();
        while results.len() < count {
            results.extend(pipeline.drain_results());
            assert!(start.elapsed() < Duration::from_secs(10), "timed out waiting for results");
            std::thread::sleep(Duration::from_millis(1));
        }
        results
    }

    #[test]
    fn test_submitted_request_produces_result() {
        let pipeline = GenerationPipeline::new(2, 8);
        let generator = generator();
        assert!(pipeline.submit(request(0, 7), &generator).is_ok());
        let results = wait_for(&pipeline, 1);
        assert_eq!(results[0].key.hash, 0);
        assert_eq!(results[0].generation, 7);
        assert_eq!(results[0].mesh.terrain().len(), 25);
        assert!(!pipeline.active.contains_key(&results[0].key));
    }

    #[test]
    fn test_many_requests_all_complete() {
        let pipeline = GenerationPipeline::new(4, 16);
        let generator = generator();
        for hash in 0..4 {
            assert!(pipeline.submit(request(hash, hash), &generator).is_ok());
        }
        let mut hashes: Vec<u64> = wait_for(&pipeline, 4).iter().map(|r| r.key.hash).collect();
        hashes.sort_unstable();
        assert_eq!(hashes, vec![0, 1, 2, 3]);
        wait_idle(&pipeline);
        assert_eq!(pipeline.available(), 16);
    }

    #[test]
    fn test_budget_rejects_excess() {
        let pipeline = GenerationPipeline::new(1, 2);
        let generator = generator();
        let accepted = (0..10)
            .filter(|&i| pipeline.submit(request(i, i), &generator).is_ok())
            .count();
        assert!(accepted >= 2, "budget allows at least two");
        assert!(pipeline.in_flight_count() <= 2);
    }

    #[test]
    fn test_submit_after_shutdown_is_rejected() {
        let mut pipeline = GenerationPipeline::new(1, 4);
        pipeline.shutdown();
        let rejected = pipeline.submit(request(0, 0), &generator());
        assert_eq!(rejected.unwrap_err().generation, 0);
    }

    fn wait_idle(pipeline: &GenerationPipeline) {
        let start = Instant::now();
        while pipeline.in_flight_count() > 0 {
            assert!(start.elapsed() < Duration::from_secs(10), "workers never went idle");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_cancelled_request_is_skipped() {
        let pipeline = GenerationPipeline::new(1, 4);
        let sender = pipeline.task_sender.as_ref().unwrap();
        pipeline.in_flight.fetch_add(1, Ordering::Relaxed);
        sender
            .send(QueuedRequest {
                request: request(0, 0),
                generator: generator(),
                cancelled: Arc::new(AtomicBool::new(true)),
            })
            .unwrap();
        wait_idle(&pipeline);
        assert!(pipeline.drain_results().is_empty(), "a cancelled request must not deliver");
    }

    #[test]
    fn test_cancel_flags_outstanding_request() {
        let pipeline = GenerationPipeline::new(1, 4);
        let key = request(3, 9).key;
        assert!(pipeline.submit(request(3, 9), &generator()).is_ok());
        let flag = pipeline.active.get(&key).map(|entry| Arc::clone(&entry.value().1));
        pipeline.cancel(&key);
        assert!(!pipeline.active.contains_key(&key));
        if let Some(flag) = flag {
            assert!(flag.load(Ordering::Relaxed));
        }
        wait_idle(&pipeline);
    }

    #[test]
    fn test_newer_request_supersedes_older() {
        let pipeline = GenerationPipeline::new(2, 8);
        let generator = generator();
        assert!(pipeline.submit(request(5, 1), &generator).is_ok());
        assert!(pipeline.submit(request(5, 2), &generator).is_ok());
        wait_idle(&pipeline);
        let results = pipeline.drain_results();
        assert!(results.iter().any(|r| r.generation == 2));
        assert!(!pipeline.active.contains_key(&request(5, 2).key));
    }

    #[test]
    fn test_wait_idle_returns_every_result() {
        let pipeline = GenerationPipeline::new(2, 8);
        let generator = generator();
        for hash in 0..6 {
            assert!(pipeline.submit(request(hash, hash), &generator).is_ok());
        }
        let results = pipeline.wait_idle();
        assert_eq!(results.len(), 6, "every accepted request should deliver");
        assert_eq!(pipeline.in_flight_count(), 0);
        assert!(pipeline.active.is_empty(), "delivered keys are no longer outstanding");
        assert!(pipeline.drain_results().is_empty());
    }

    #[test]
    fn test_wait_idle_on_shut_down_pipeline_returns() {
        let mut pipeline = GenerationPipeline::new(1, 4);
        assert!(pipeline.submit(request(1, 1), &generator()).is_ok());
        pipeline.shutdown();
        let results = pipeline.wait_idle();
        assert_eq!(results.len(), 1, "queued work finishes before workers exit");
        assert_eq!(pipeline.in_flight_count(), 0);
    }

    #[test]
    fn test_worker_stops_when_results_are_dropped() {
        let (task_tx, task_rx) = crossbeam_channel::unbounded();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<PatchResult>();
        drop(result_rx);
        let in_flight = Arc::new(AtomicUsize::new(2));
        for hash in 0..2 {
            task_tx
                .send(QueuedRequest {
                    request: request(hash, hash),
                    generator: generator(),
                    cancelled: Arc::new(AtomicBool::new(false)),
                })
                .unwrap();
        }

        let flight = Arc::clone(&in_flight);
        let handle = std::thread::spawn(move || run_worker(task_rx, result_tx, flight));
        let start = Instant::now();
        while !handle.is_finished() {
            assert!(
                start.elapsed() < Duration::from_secs(10),
                "worker kept waiting for tasks after its results were dropped"
            );
            std::thread::sleep(Duration::from_millis(1));
        }
        handle.join().unwrap();
        assert_eq!(
            in_flight.load(Ordering::Acquire),
            1,
            "only the request whose send failed is accounted for"
        );
        drop(task_tx);
    }
}
