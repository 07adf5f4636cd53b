//! Session lifecycle and the frame loop

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use poise_core::{FeedbackMessage, Modality, SessionTime, Snapshots};
use poise_feedback::{EngineSummary, FeedbackEngine, SignalReadout};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::{
    FrameSource, Generations, LandmarkProvider, ProviderError, SessionClock, SessionConfig,
    SessionError, SessionResult, SnapshotStore, VideoFrame,
};

/// What the display shows after one tick
#[derive(Debug, Clone, Default)]
pub struct DisplayFrame {
    /// Tick that produced this frame; zero before the first tick
    pub tick: u64,
    pub now: SessionTime,
    /// Visible messages in catalog order
    pub messages: Vec<FeedbackMessage>,
    pub readout: SignalReadout,
    /// Raw landmarks the tick used, for overlays
    pub snapshots: Snapshots,
    /// Providers that delivered since the previous tick
    pub fresh: Vec<Modality>,
    /// Extraction was skipped and `messages` carries over from the last good tick
    pub skipped: bool,
}

impl DisplayFrame {
    /// Message texts in display order
    pub fn texts(&self) -> Vec<&'static str> {
        self.messages.iter().map(|m| m.text()).collect()
    }
}

/// Frame loop counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub ticks: u64,
    /// Ticks whose extraction was skipped after a provider failure
    pub skipped_ticks: u64,
    pub provider_failures: u64,
    /// Camera frames handed to the providers, once per frame
    pub frames_submitted: u64,
    pub last_tick_duration: Duration,
}

/// Returned by [`SessionHandle::stop`]
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Session time when the loop stopped
    pub duration: Duration,
    pub stats: SessionStats,
    pub summary: EngineSummary,
}

impl SessionReport {
    pub fn total_blinks(&self) -> u64 {
        self.summary.total_blinks
    }

    pub fn yawns(&self) -> u32 {
        self.summary.yawns
    }

    pub fn activations(&self, message: FeedbackMessage) -> u64 {
        self.summary.activations.get(&message).copied().unwrap_or(0)
    }
}

/// A session that has not started yet
pub struct Session {
    config: SessionConfig,
    source: Box<dyn FrameSource>,
    providers: Vec<Box<dyn LandmarkProvider>>,
}

impl Session {
    pub fn new(config: SessionConfig, source: impl FrameSource + 'static) -> Self {
        Self {
            config,
            source: Box::new(source),
            providers: Vec::new(),
        }
    }

    /// Register a landmark provider. At most one per modality.
    pub fn with_provider(mut self, provider: impl LandmarkProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Acquire the frame source and providers, then start the frame loop
    ///
    /// Acquisition failures are returned here. Nothing is left running and
    /// an already opened frame source is released.
    pub fn start(self) -> SessionResult<SessionHandle> {
        let Session {
            config,
            mut source,
            mut providers,
        } = self;

        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SessionError::NoRuntime)?;

        let mut registered: Vec<Modality> = Vec::with_capacity(providers.len());
        for provider in &providers {
            let modality = provider.modality();
            if registered.contains(&modality) {
                return Err(SessionError::DuplicateProvider(modality));
            }
            registered.push(modality);
        }

        source.open()?;

        let store = Arc::new(SnapshotStore::new());
        for provider in providers.iter_mut() {
            let modality = provider.modality();
            if let Err(err) = provider.configure(config.providers.get(modality)) {
                warn!(%modality, %err, "provider configuration failed");
                source.release();
                return Err(err.into());
            }
            provider.on_result(store.sink(modality));
        }

        let clock = SessionClock::start();
        let stats = Arc::new(Mutex::new(SessionStats::default()));
        let (display_tx, display_rx) = watch::channel(DisplayFrame::default());
        let (stop_tx, stop_rx) = oneshot::channel();

        let frame_loop = FrameLoop {
            tick_interval: config.tick_interval,
            clock,
            engine: FeedbackEngine::with_config(config.engine.clone()),
            source,
            providers,
            store,
            seen: Generations::default(),
            display: display_tx,
            stats: Arc::clone(&stats),
            ticks: 0,
        };

        info!(
            tick_interval = ?config.tick_interval,
            providers = ?registered,
            "session started"
        );
        let task = runtime.spawn(frame_loop.run(stop_rx));

        Ok(SessionHandle {
            clock,
            display: display_rx,
            stats,
            stop: stop_tx,
            task,
        })
    }
}

/// A running session
///
/// Dropping the handle without calling [`stop`](Self::stop) also stops the
/// loop and releases the frame source, but discards the report.
pub struct SessionHandle {
    clock: SessionClock,
    display: watch::Receiver<DisplayFrame>,
    stats: Arc<Mutex<SessionStats>>,
    stop: oneshot::Sender<()>,
    task: JoinHandle<EngineSummary>,
}

impl SessionHandle {
    /// Subscribe to display updates, one per tick
    pub fn display(&self) -> watch::Receiver<DisplayFrame> {
        self.display.clone()
    }

    /// The most recently published display frame
    pub fn latest(&self) -> DisplayFrame {
        self.display.borrow().clone()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.lock().clone()
    }

    pub fn elapsed(&self) -> SessionTime {
        self.clock.now()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the loop between ticks and release the frame source
    pub async fn stop(self) -> SessionResult<SessionReport> {
        let SessionHandle {
            clock,
            stats,
            stop,
            task,
            ..
        } = self;

        // The loop may already have exited; the join below still reports it
        let _ = stop.send(());
        let summary = task
            .await
            .map_err(|e| SessionError::LoopFailed(e.to_string()))?;

        let report = SessionReport {
            duration: clock.now() - SessionTime::ZERO,
            stats: stats.lock().clone(),
            summary,
        };
        info!(
            duration = ?report.duration,
            ticks = report.stats.ticks,
            skipped = report.stats.skipped_ticks,
            blinks = report.summary.total_blinks,
            yawns = report.summary.yawns,
            "session stopped"
        );
        Ok(report)
    }
}

/// State owned by the loop task
struct FrameLoop {
    tick_interval: Duration,
    clock: SessionClock,
    engine: FeedbackEngine,
    source: Box<dyn FrameSource>,
    providers: Vec<Box<dyn LandmarkProvider>>,
    store: Arc<SnapshotStore>,
    /// Generations seen by the previous tick
    seen: Generations,
    display: watch::Sender<DisplayFrame>,
    stats: Arc<Mutex<SessionStats>>,
    ticks: u64,
}

impl FrameLoop {
    async fn run(mut self, mut stop: oneshot::Receiver<()>) -> EngineSummary {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                // A dropped handle counts as a stop request
                _ = &mut stop => break,
                _ = interval.tick() => self.tick(),
            }
        }

        self.source.release();
        debug!(ticks = self.ticks, "frame loop exited");
        self.engine.summary()
    }

    /// Execute one tick of the frame loop
    fn tick(&mut self) {
        let started = std::time::Instant::now();
        let now = self.clock.now();
        self.ticks += 1;
        let tick = self.ticks;

        // Stage 1: Feed the providers
        let mut submitted = 0;
        let mut failures = 0;
        if let Some(frame) = self.source.next_frame(now) {
            submitted = 1;
            failures = self.submit(&frame);
        }

        if failures > 0 {
            // Stage 2 (failed): keep the previous messages on screen
            self.display.send_modify(|frame| {
                frame.tick = tick;
                frame.now = now;
                frame.fresh.clear();
                frame.skipped = true;
            });
        } else {
            // Stage 2: Load the latest results
            let view = self.store.load();
            let fresh = view.generations.fresh_since(&self.seen);
            self.seen = view.generations;

            // Stage 3: Extract, classify, decay
            let output = self.engine.tick(&view.snapshots, now);
            let readout = output.signals.readout();
            trace!(tick, %now, ?readout, emitted = output.emitted.len(), "tick");

            // Stage 4: Publish
            self.display.send_replace(DisplayFrame {
                tick,
                now,
                messages: output.visible,
                readout,
                snapshots: view.snapshots,
                fresh,
                skipped: false,
            });
        }

        let mut stats = self.stats.lock();
        stats.ticks += 1;
        stats.frames_submitted += submitted;
        if failures > 0 {
            stats.skipped_ticks += 1;
            stats.provider_failures += failures;
        }
        stats.last_tick_duration = started.elapsed();
    }

    /// Submit a frame to every provider, returning how many failed
    fn submit(&mut self, frame: &VideoFrame) -> u64 {
        let mut failed = 0;
        for provider in self.providers.iter_mut() {
            if let Err(err) = provider.submit(frame) {
                failed += 1;
                log_provider_failure(frame.sequence, &err);
            }
        }
        failed
    }
}

fn log_provider_failure(sequence: u64, err: &ProviderError) {
    warn!(
        modality = %err.modality(),
        frame = sequence,
        %err,
        "provider failed, skipping extraction"
    );
}
