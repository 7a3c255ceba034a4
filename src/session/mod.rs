//! Trace session: one run of the tracer and the playback over its frames
//!
//! [`TraceSession`] is the controls surface a UI drives:
//! [`load_trace`](TraceSession::load_trace), `play`, `pause`, `step`, `seek`,
//! `set_speed`, plus [`current_view`](TraceSession::current_view) for the
//! render-ready [`StepView`].
//!
//! # Requests
//!
//! `load_trace` resets playback and the carry-forward cache immediately, then
//! runs the tracer on a worker thread. Each request carries a generation
//! number; [`poll`](TraceSession::poll) applies only the reply of the latest
//! generation, so a slow answer to an older request never touches the current
//! state.
//!
//! # Cache ordering
//!
//! The view of frame `i` sees the cache folded over frames `0..i`, in order,
//! however the index got there. Seeking forward replays every skipped frame;
//! seeking backward keeps what was already folded.

pub mod errors;
pub mod tracer;

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::diff::{build_step_view, CarryForwardCache, StepView};
use crate::playback::{PlaybackController, PlaybackError, PlaybackState};
use crate::snapshot::Trace;
pub use errors::{SessionError, TracerError};
pub use tracer::{decode_response, FileTracer, HttpTracer, TraceResponse, Tracer};

/// What applying a tracer reply did to the session
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded { frames: usize },
    /// Well-formed response without frames; nothing to play
    Empty,
    Failed(SessionError),
}

struct TracerReply {
    generation: u64,
    result: Result<TraceResponse, TracerError>,
}

pub struct TraceSession {
    tracer: Arc<dyn Tracer>,
    trace: Trace,
    complexity: Option<String>,
    controller: PlaybackController,
    cache: CarryForwardCache,
    /// Number of leading frames already folded into `cache`
    observed: usize,
    generation: u64,
    pending: bool,
    last_error: Option<SessionError>,
    source: Option<String>,
    replies_tx: Sender<TracerReply>,
    replies_rx: Receiver<TracerReply>,
}

impl TraceSession {
    pub fn new(tracer: Arc<dyn Tracer>) -> Self {
        let (replies_tx, replies_rx) = mpsc::channel();
        TraceSession {
            tracer,
            trace: Trace::default(),
            complexity: None,
            controller: PlaybackController::new(),
            cache: CarryForwardCache::new(),
            observed: 0,
            generation: 0,
            pending: false,
            last_error: None,
            source: None,
            replies_tx,
            replies_rx,
        }
    }

    /// Start a new run. State is reset now; frames arrive through [`poll`](Self::poll).
    pub fn load_trace(&mut self, source: &str) {
        let generation = self.begin_run(source);

        let tracer = Arc::clone(&self.tracer);
        let tx = self.replies_tx.clone();
        let source = source.to_string();
        let spawned = thread::Builder::new()
            .name(format!("tracer-request-{}", generation))
            .spawn(move || {
                let result = tracer.trace(&source);
                // The session may be gone by now; nobody is left to tell
                let _ = tx.send(TracerReply { generation, result });
            });

        if let Err(e) = spawned {
            self.apply(Err(TracerError::Unreachable {
                message: format!("could not start tracer request: {}", e),
            }));
        }
    }

    /// Run the tracer on the calling thread and apply its reply
    pub fn load_trace_blocking(&mut self, source: &str) -> LoadOutcome {
        self.begin_run(source);
        let result = self.tracer.trace(source);
        self.apply(result)
    }

    /// Re-run the last loaded source, if any
    pub fn rerun(&mut self) -> bool {
        match self.source.clone() {
            Some(source) => {
                self.load_trace(&source);
                true
            }
            None => false,
        }
    }

    /// Apply any reply that has arrived for the latest request, without blocking
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        let mut outcome = None;
        while let Ok(reply) = self.replies_rx.try_recv() {
            if let Some(applied) = self.accept(reply) {
                outcome = Some(applied);
            }
        }
        outcome
    }

    /// Block until the latest request is answered or `timeout` passes
    pub fn wait(&mut self, timeout: Duration) -> Option<LoadOutcome> {
        let deadline = Instant::now() + timeout;
        while self.pending {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.replies_rx.recv_timeout(remaining) {
                Ok(reply) => {
                    if let Some(outcome) = self.accept(reply) {
                        return Some(outcome);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None
                }
            }
        }
        None
    }

    fn begin_run(&mut self, source: &str) -> u64 {
        self.generation += 1;
        self.reset();
        self.pending = true;
        self.last_error = None;
        self.source = Some(source.to_string());
        info!(generation = self.generation, "trace requested");
        self.generation
    }

    fn accept(&mut self, reply: TracerReply) -> Option<LoadOutcome> {
        if reply.generation != self.generation {
            debug!(
                stale = reply.generation,
                current = self.generation,
                "dropping reply to an outdated request"
            );
            return None;
        }
        Some(self.apply(reply.result))
    }

    fn apply(&mut self, result: Result<TraceResponse, TracerError>) -> LoadOutcome {
        self.pending = false;
        self.reset();

        match result {
            Ok(response) => {
                let frames = response.frames.len();
                self.trace = Trace::new(response.frames);
                self.complexity = response.complexity;
                self.controller.load(frames);
                if frames == 0 {
                    info!("tracer returned no frames");
                    LoadOutcome::Empty
                } else {
                    info!(frames, "trace loaded");
                    LoadOutcome::Loaded { frames }
                }
            }
            Err(err) => {
                warn!(error = %err, "trace failed");
                let err = SessionError::from(err);
                self.last_error = Some(err.clone());
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Clear frames, cache and playback position together
    fn reset(&mut self) {
        self.trace = Trace::default();
        self.complexity = None;
        self.cache.clear();
        self.observed = 0;
        self.controller.reset();
    }

    // ========== Controls ==========

    pub fn play(&mut self, now: Instant) {
        self.controller.play(now);
    }

    pub fn pause(&mut self) {
        self.controller.pause();
    }

    pub fn toggle_play(&mut self, now: Instant) {
        self.controller.toggle(now);
    }

    pub fn step(&mut self, delta: isize) {
        self.controller.step(delta);
    }

    pub fn seek(&mut self, index: usize) {
        self.controller.seek(index);
    }

    pub fn seek_end(&mut self) {
        self.controller.seek(usize::MAX);
    }

    pub fn set_speed(&mut self, speed: f64, now: Instant) -> Result<(), PlaybackError> {
        self.controller.set_speed(speed, now)
    }

    /// Drive auto-advance; returns whether the displayed frame changed
    pub fn tick(&mut self, now: Instant) -> bool {
        self.controller.tick(now)
    }

    // ========== Views ==========

    /// The view of the current frame, or `None` when there is nothing to show
    pub fn current_view(&mut self) -> Option<StepView> {
        let index = self.controller.current_index();
        self.replay_cache_to(index);
        let (previous, current) = self.trace.pair(index)?;
        Some(build_step_view(index, current, previous, &self.cache))
    }

    /// Fold every frame before `index` that has not been folded yet
    fn replay_cache_to(&mut self, index: usize) {
        let target = index.min(self.trace.len());
        while self.observed < target {
            if let Some(frame) = self.trace.get(self.observed) {
                self.cache.observe(frame);
            }
            self.observed += 1;
        }
    }

    // ========== Getters ==========

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn cache(&self) -> &CarryForwardCache {
        &self.cache
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn current_index(&self) -> usize {
        self.controller.current_index()
    }

    pub fn complexity(&self) -> Option<&str> {
        self.complexity.as_deref()
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}
