//! Whiteboard simulation — several replicas drawing on one shared board.
//!
//! Each peer joins a `LoopbackFabric`, scribbles random strokes through its
//! own `MarkerGate`, and applies every frame the fabric delivers (its own
//! included) to its replica. Replicas tick on a shared virtual clock. After
//! the last round the erase queues are drained, every replica is compared
//! pixel for pixel, and a late joiner is hydrated from the exported history
//! and compared as well.
//!
//! ```text
//! RUST_LOG=debug WHITEBOARD_WIDTH=512 WHITEBOARD_HEIGHT=512 cargo run
//! ```
//!
//! `WHITEBOARD_SIM_PEERS`, `WHITEBOARD_SIM_ROUNDS` and `WHITEBOARD_SIM_SEED`
//! shape the run. Set `WHITEBOARD_HISTORY_PATH` to keep the history file.

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

use std::cell::Cell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use whiteboard::canvas::{Canvas, DisplayTarget, FlushRegion, Rgba};
use whiteboard::config::{WhiteboardConfig, env_parse};
use whiteboard::marker::{ColorSource, MarkerGate, Sample, ToolMode, ToolModeSource, Vec3};
use whiteboard::net::{Dispatcher, LoopbackFabric, Peer, dispatch};
use whiteboard::runtime::{self, FramePublisher};
use whiteboard::session::{History, LogError, SessionError, WhiteboardSession};

const PALETTE: [Rgba; 4] = [Rgba::BLACK, Rgba::RED, Rgba::GREEN, Rgba::BLUE];

/// World units spanned by the board along each axis.
const BOARD_SCALE: f32 = 2.0;

/// Pointer sampling period of a simulated user.
const SAMPLE_SPACING: Duration = Duration::from_millis(16);

#[derive(Debug, thiserror::Error)]
enum SimError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Log(#[from] LogError),
    #[error("history file: {0}")]
    Io(#[from] std::io::Error),
    #[error("replica {peer} diverged from {reference}")]
    Diverged { peer: String, reference: String },
    #[error("late joiner replayed a different canvas")]
    ReplayMismatch,
}

// =============================================================================
// SIMULATED USERS
// =============================================================================

/// Toolbar state a simulated user flips between strokes.
struct Controls {
    color: Cell<Rgba>,
    mode: Cell<ToolMode>,
}

impl Controls {
    fn new() -> Self {
        Self { color: Cell::new(Rgba::BLACK), mode: Cell::new(ToolMode::Pen) }
    }
}

impl ColorSource for Controls {
    fn color(&self) -> Rgba {
        self.color.get()
    }
}

impl ToolModeSource for Controls {
    fn mode(&self) -> ToolMode {
        self.mode.get()
    }
}

/// One random stroke: pick a tool, press, wander, release. Returns the
/// number of frames sent.
fn scribble(
    rng: &mut StdRng,
    gate: &mut MarkerGate<&Controls, &Controls>,
    controls: &Controls,
    peer: &Peer,
    clock: &mut Instant,
) -> usize {
    let mode = if rng.random_bool(0.25) { ToolMode::Eraser } else { ToolMode::Pen };
    controls.mode.set(mode);
    controls.color.set(PALETTE[rng.random_range(0..PALETTE.len())]);
    gate.set_pen_size(rng.random_range(5..=20));
    gate.set_eraser_size(rng.random_range(50..=100));

    let (mut u, mut v) = (rng.random_range(0.1_f32..0.9), rng.random_range(0.1_f32..0.9));
    let heading = rng.random_range(0.0..std::f32::consts::TAU);
    let step = rng.random_range(0.002_f32..0.06);
    let samples = rng.random_range(8..32);

    let mut sent = 0;
    gate.press();
    for _ in 0..samples {
        *clock += SAMPLE_SPACING;
        let sample = Sample::new(Vec3::new(u * BOARD_SCALE, v * BOARD_SCALE, 0.0), u, v);
        if let Some(event) = gate.sample_at(*clock, sample) {
            peer.send(dispatch::encode(&event));
            sent += 1;
        }
        u = (u + step * heading.cos()).clamp(0.0, 1.0);
        v = (v + step * heading.sin()).clamp(0.0, 1.0);
    }
    gate.release();
    sent
}

// =============================================================================
// REPLICAS
// =============================================================================

struct Replica {
    peer: Peer,
    session: WhiteboardSession,
    rejected: usize,
}

impl Replica {
    /// Apply every frame delivered since the last call.
    fn apply_inbox(&mut self, dispatcher: &Dispatcher) {
        for frame in self.peer.drain() {
            let reply = dispatcher.handle(&mut self.session, &frame);
            if reply.is_error() {
                self.rejected += 1;
            }
        }
    }
}

/// Stand-in display that only counts uploads.
#[derive(Debug, Default)]
struct FlushCounter {
    partial: usize,
    full: usize,
}

impl DisplayTarget for FlushCounter {
    fn upload(&mut self, region: FlushRegion, _canvas: &Canvas) {
        match region {
            FlushRegion::Partial(_) => self.partial += 1,
            FlushRegion::Full => self.full += 1,
        }
    }
}

/// Tick every replica until no erase is left queued anywhere.
fn settle(
    replicas: &mut [Replica],
    dispatcher: &Dispatcher,
    flushes: &mut FlushCounter,
    clock: &mut Instant,
    interval: Duration,
) {
    loop {
        *clock += interval;
        let mut remaining = 0;
        for replica in replicas.iter_mut() {
            replica.apply_inbox(dispatcher);
            remaining += replica.session.tick_at(*clock, flushes).remaining;
        }
        if remaining == 0 {
            return;
        }
        debug!(remaining, "settling erase queues");
    }
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "simulation failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), SimError> {
    let config = WhiteboardConfig::from_env();
    let peers = env_parse("WHITEBOARD_SIM_PEERS", 3_usize).max(1);
    let rounds = env_parse("WHITEBOARD_SIM_ROUNDS", 40_usize);
    let seed = env_parse("WHITEBOARD_SIM_SEED", 7_u64);
    let mut rng = StdRng::seed_from_u64(seed);

    let fabric = LoopbackFabric::new();
    let dispatcher = Dispatcher::default();
    let mut replicas = Vec::with_capacity(peers);
    for index in 0..peers {
        let session = WhiteboardSession::create(config)?;
        replicas.push(Replica { peer: fabric.join(format!("peer-{index}")), session, rejected: 0 });
    }
    let controls: Vec<Controls> = (0..peers).map(|_| Controls::new()).collect();
    let mut gates: Vec<_> =
        controls.iter().map(|source| MarkerGate::new(config.width, config.height, source, source)).collect();

    info!(peers, rounds, seed, width = config.width, height = config.height, "simulation started");

    let mut clock = Instant::now();
    let mut flushes = FlushCounter::default();
    let mut sent = 0;
    for _ in 0..rounds {
        for ((gate, source), replica) in gates.iter_mut().zip(&controls).zip(&replicas) {
            sent += scribble(&mut rng, gate, source, &replica.peer, &mut clock);
        }
        clock += config.update_interval;
        for replica in &mut replicas {
            replica.apply_inbox(&dispatcher);
            replica.session.tick_at(clock, &mut flushes);
        }
    }
    settle(&mut replicas, &dispatcher, &mut flushes, &mut clock, config.update_interval);

    let Some((reference, rest)) = replicas.split_first() else {
        return Ok(());
    };
    for replica in rest {
        if replica.session.canvas() != reference.session.canvas() {
            return Err(SimError::Diverged {
                peer: replica.peer.name().to_owned(),
                reference: reference.peer.name().to_owned(),
            });
        }
    }
    let rejected: usize = replicas.iter().map(|replica| replica.rejected).sum();
    if rejected > 0 {
        warn!(rejected, "frames rejected by dispatch");
    }
    info!(
        sent,
        applied = reference.session.log().len(),
        partial_flushes = flushes.partial,
        full_flushes = flushes.full,
        "replicas converged"
    );

    let history = reference.session.history();
    let mut encoded = Vec::new();
    history.write_jsonl(&mut encoded)?;
    let restored = History::read_jsonl(encoded.as_slice())?;
    let late = WhiteboardSession::from_history(config, &restored)?;
    if late.canvas() != reference.session.canvas() {
        return Err(SimError::ReplayMismatch);
    }
    info!(records = restored.entries.len(), bytes = encoded.len(), "late joiner matches");

    if let Ok(path) = std::env::var("WHITEBOARD_HISTORY_PATH") {
        let mut writer = BufWriter::new(File::create(&path)?);
        history.write_jsonl(&mut writer)?;
        writer.flush()?;
        info!(%path, "history written");
    }

    host(late, config.update_interval).await;
    Ok(())
}

/// Run the late joiner under the background tick task until its first frame
/// reaches a renderer.
async fn host(session: WhiteboardSession, period: Duration) {
    let shared = runtime::shared(session);
    let publisher = FramePublisher::new();
    let mut frames = publisher.subscribe();
    let task = runtime::spawn_tick_task(shared, publisher, period);

    match tokio::time::timeout(period * 10, frames.next()).await {
        Ok(Some(frame)) => info!(generation = frame.generation, region = ?frame.region, "first frame rendered"),
        Ok(None) | Err(_) => warn!("hosted replica published no frame"),
    }
    task.abort();
}
