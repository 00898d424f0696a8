//! # Engine Orchestrator
//!
//! Owns the buffer pool, the frame exchange, and the two thread loops.
//! The simulation loop runs on the caller's thread; the render loop runs
//! on a dedicated named thread that owns the driver and resource
//! provider (the graphics context never leaves it).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Sender};
use thiserror::Error;
use tracing::debug;

use phosphor_core::{BufferPool, BufferTag, FrameExchange, MemoryError, StackAllocator};
use phosphor_rendering::{
    dispatch, CommandBucket, CommandKind, DeferredPipeline, Driver, FramePacket, RenderError,
    ResourceProvider, Scene,
};

use crate::config::EngineConfig;
use crate::stats::{FrameStats, FrameStatsAccumulator};

/// Errors that can occur while running the engine.
///
/// All of them are fatal: deferred rendering has no degraded
/// partial-frame mode.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Scene snapshot or pipeline failure.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Frame memory failure.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// The render thread could not be spawned or died.
    #[error("render thread failure: {0}")]
    RenderThread(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Summary of a finished run.
#[derive(Clone, Copy, Debug, Default)]
pub struct EngineReport {
    /// Frames fully published by the simulation loop.
    pub frames_simulated: u64,
    /// Frames fully consumed by the render loop.
    pub frames_rendered: u64,
    /// Accumulated render-side statistics.
    pub stats: FrameStatsAccumulator,
}

/// External control over a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    stop: Arc<AtomicBool>,
    exchange: Arc<FrameExchange<FramePacket>>,
}

impl EngineHandle {
    /// Requests cooperative shutdown, waking any blocked thread.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
        self.exchange.shutdown();
    }

    /// Frames fully published so far.
    #[must_use]
    pub fn simulated_frames(&self) -> u64 {
        self.exchange.simulated_frames()
    }

    /// Frames fully consumed so far.
    #[must_use]
    pub fn rendered_frames(&self) -> u64 {
        self.exchange.rendered_frames()
    }
}

/// The engine: scene, memory, exchange, and the two loops.
pub struct Engine {
    config: EngineConfig,
    pool: Arc<BufferPool>,
    exchange: Arc<FrameExchange<FramePacket>>,
    scene: Scene,
    stop: Arc<AtomicBool>,
}

impl Engine {
    /// Creates an engine from configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let slots = config.slots.max(2);
        Self {
            config,
            pool: Arc::new(BufferPool::new()),
            exchange: Arc::new(FrameExchange::new(slots)),
            scene: Scene::new(),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The authored scene, for population before `run`.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// A handle for stopping the engine from another thread.
    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            stop: Arc::clone(&self.stop),
            exchange: Arc::clone(&self.exchange),
        }
    }

    /// The buffer pool, for diagnostics.
    #[must_use]
    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    /// Runs the engine to completion.
    ///
    /// Spawns the render thread (which takes ownership of `driver` and
    /// `resources`), then runs the simulation loop inline: every tick the
    /// updater mutates the scene and returns whether to continue, a
    /// packet is snapshotted into the next arena slot, and publication
    /// applies backpressure against the renderer. Returns once the
    /// updater quits or [`EngineHandle::stop`] is called.
    pub fn run<U, D, R>(
        mut self,
        mut updater: U,
        driver: D,
        resources: R,
    ) -> EngineResult<EngineReport>
    where
        U: FnMut(&mut Scene, f32) -> bool,
        D: Driver + Send + 'static,
        R: ResourceProvider + Send + 'static,
    {
        let (stats_tx, stats_rx) = bounded(self.config.stats_channel_capacity.max(1));
        let pipeline = DeferredPipeline::new(self.config.pipeline);
        let exchange = Arc::clone(&self.exchange);

        let render = thread::Builder::new()
            .name("phosphor-render".into())
            .spawn(move || render_loop(&exchange, &pipeline, driver, resources, &stats_tx))
            .map_err(|e| EngineError::RenderThread(e.to_string()))?;

        let frame_budget = (self.config.target_fps > 0)
            .then(|| Duration::from_secs_f64(1.0 / f64::from(self.config.target_fps)));
        let mut last = Instant::now();

        loop {
            if self.stop.load(Ordering::Acquire) || !self.exchange.is_running() {
                break;
            }

            let now = Instant::now();
            // Clamp delta time so a pause cannot explode the simulation.
            let dt = now.duration_since(last).as_secs_f32().min(0.1);
            last = now;

            if !updater(&mut self.scene, dt) {
                break;
            }
            if !self.prepare_frame_packet()? {
                break;
            }

            if let Some(budget) = frame_budget {
                let spent = last.elapsed();
                if spent < budget {
                    thread::sleep(budget - spent);
                }
            }
        }

        self.exchange.shutdown();
        render
            .join()
            .map_err(|_| EngineError::RenderThread("render thread panicked".into()))?;

        let mut stats = FrameStatsAccumulator::new();
        for frame_stats in stats_rx.try_iter() {
            stats.record(frame_stats);
        }

        Ok(EngineReport {
            frames_simulated: self.exchange.simulated_frames(),
            frames_rendered: self.exchange.rendered_frames(),
            stats,
        })
    }

    /// Builds and publishes the next frame's packet.
    ///
    /// Reclaims the slot's stale occupant first - safe because the
    /// previous publish already observed the renderer past it - then
    /// snapshots the scene into a freshly acquired arena slot. Returns
    /// `false` if the exchange shut down during the publish wait.
    fn prepare_frame_packet(&mut self) -> EngineResult<bool> {
        let frame = self.exchange.simulated_frames();
        let slot = (frame % self.exchange.slot_count() as u64) as u32;

        if let Some(stale) = self.exchange.reclaim_slot() {
            drop(stale);
            let reclaimed = self.pool.free_slot(BufferTag::Primary, slot);
            debug!(frame, slot, reclaimed, "reclaimed stale frame slot");
        }

        let alloc = StackAllocator::new(Arc::clone(&self.pool), BufferTag::Primary, slot);
        let packet = FramePacket::snapshot(&self.scene, self.config.primary_pass, alloc, frame)?;
        Ok(self.exchange.publish(packet))
    }
}

/// The render thread body: consume packets in order until shutdown.
fn render_loop<D: Driver, R: ResourceProvider>(
    exchange: &FrameExchange<FramePacket>,
    pipeline: &DeferredPipeline,
    mut driver: D,
    resources: R,
    stats_tx: &Sender<FrameStats>,
) {
    loop {
        let consumed = exchange.render_frame(|packet| {
            let start = Instant::now();

            driver.begin_frame();
            // A fresh bucket per frame: command lifetime is frame-local.
            let mut bucket = CommandBucket::new();
            pipeline.execute(packet, &resources, &mut bucket);
            let commands = bucket.len() as u32;
            let draw_calls = bucket.count_of(CommandKind::DrawElements) as u32;
            dispatch(&mut bucket, &mut driver);
            driver.present();

            // Stats are advisory: drop them rather than stall the frame.
            let _ = stats_tx.try_send(FrameStats {
                frame: packet.frame(),
                total_us: start.elapsed().as_micros() as u64,
                commands,
                draw_calls,
                meshes: packet.mesh_nodes().len() as u32,
                lights: packet.lights().len() as u32,
            });
        });
        if !consumed {
            break;
        }
    }
    debug!("render loop exited");
}
