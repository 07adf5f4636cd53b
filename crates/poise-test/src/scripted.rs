//! Scripted frame source and providers
//!
//! The source renders a [`SyntheticSubject`] following a [`Script`] for every
//! frame it hands out. Scripted providers read the rendered landmarks for
//! the submitted frame and publish them, so a real [`Session`] can be driven
//! end to end without a camera or models.
//!
//! [`Session`]: poise_runtime::Session

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use poise_core::{Detections, Modality, SessionTime};
use poise_runtime::{
    FrameSource, LandmarkProvider, ProviderError, ProviderOptions, ResultSink, SourceError,
    VideoFrame,
};

use crate::{Behaviour, RenderedFrame, SyntheticSubject};

/// A behaviour timeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    /// `(start, behaviour)` pairs, sorted by start
    steps: Vec<(Duration, Behaviour)>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// One behaviour for the whole run
    pub fn constant(behaviour: Behaviour) -> Self {
        Self::new().then(Duration::ZERO, behaviour)
    }

    /// Switch to `behaviour` at `at`
    pub fn then(mut self, at: Duration, behaviour: Behaviour) -> Self {
        let index = self.steps.partition_point(|(start, _)| *start <= at);
        self.steps.insert(index, (at, behaviour));
        self
    }

    /// Behaviour in effect at `t`; centred before the first step
    pub fn behaviour_at(&self, t: SessionTime) -> Behaviour {
        let elapsed = t - SessionTime::ZERO;
        self.steps
            .iter()
            .rev()
            .find(|(start, _)| *start <= elapsed)
            .map_or(Behaviour::Centered, |(_, behaviour)| *behaviour)
    }

    /// Start of the last step
    pub fn last_change(&self) -> Duration {
        self.steps.last().map_or(Duration::ZERO, |(start, _)| *start)
    }

    pub fn steps(&self) -> &[(Duration, Behaviour)] {
        &self.steps
    }

    /// Twelve-second mock interview
    pub fn interview() -> Self {
        Self::new()
            .then(Duration::ZERO, Behaviour::Centered)
            .then(Duration::from_secs(2), Behaviour::Leaning)
            .then(Duration::from_secs(4), Behaviour::Centered)
            .then(Duration::from_secs(5), Behaviour::LookingAway)
            .then(Duration::from_secs(7), Behaviour::Centered)
            .then(Duration::from_secs(8), Behaviour::Fidgeting)
            .then(Duration::from_secs(10), Behaviour::Centered)
    }
}

/// Landmarks rendered for the most recent frame, shared with the providers
#[derive(Debug, Clone, Default)]
pub struct SubjectFeed {
    latest: Arc<Mutex<Option<(u64, RenderedFrame)>>>,
}

impl SubjectFeed {
    fn store(&self, sequence: u64, frame: RenderedFrame) {
        *self.latest.lock() = Some((sequence, frame));
    }

    /// Result for one modality, if `sequence` is the latest rendered frame
    pub fn detections(&self, modality: Modality, sequence: u64) -> Option<Detections> {
        let latest = self.latest.lock();
        match latest.as_ref() {
            Some((seq, frame)) if *seq == sequence => Some(frame.get(modality).clone()),
            _ => None,
        }
    }
}

/// Lifecycle counters of a scripted source, readable after it moved into a session
#[derive(Debug, Clone, Default)]
pub struct SourceProbe {
    opened: Arc<AtomicU32>,
    released: Arc<AtomicU32>,
}

impl SourceProbe {
    pub fn opened(&self) -> u32 {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u32 {
        self.released.load(Ordering::SeqCst)
    }
}

/// Frame source that renders a scripted subject
pub struct ScriptedFrameSource {
    script: Script,
    subject: SyntheticSubject,
    feed: SubjectFeed,
    probe: SourceProbe,
    sequence: u64,
    deny_open: bool,
}

impl ScriptedFrameSource {
    pub fn new(script: Script, seed: u64) -> Self {
        Self {
            script,
            subject: SyntheticSubject::new(seed),
            feed: SubjectFeed::default(),
            probe: SourceProbe::default(),
            sequence: 0,
            deny_open: false,
        }
    }

    /// Fail `open` as if camera permission was refused
    pub fn denied(mut self) -> Self {
        self.deny_open = true;
        self
    }

    pub fn feed(&self) -> SubjectFeed {
        self.feed.clone()
    }

    pub fn probe(&self) -> SourceProbe {
        self.probe.clone()
    }

    /// A provider reading this source's landmarks
    pub fn provider(&self, modality: Modality) -> ScriptedProvider {
        ScriptedProvider::new(modality, self.feed())
    }
}

impl FrameSource for ScriptedFrameSource {
    fn open(&mut self) -> Result<(), SourceError> {
        if self.deny_open {
            return Err(SourceError::PermissionDenied);
        }
        self.probe.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn next_frame(&mut self, now: SessionTime) -> Option<VideoFrame> {
        let behaviour = self.script.behaviour_at(now);
        if behaviour != self.subject.behaviour() {
            tracing::debug!(behaviour = behaviour.name(), %now, "subject changed behaviour");
            self.subject.set_behaviour(behaviour);
        }

        let sequence = self.sequence;
        self.sequence += 1;
        self.feed.store(sequence, self.subject.render());
        Some(VideoFrame::blank(sequence, now, 640, 480))
    }

    fn release(&mut self) {
        self.probe.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Provider that publishes the scripted subject's landmarks
pub struct ScriptedProvider {
    modality: Modality,
    feed: SubjectFeed,
    sink: Option<ResultSink>,
    options: ProviderOptions,
    /// Publish on every n-th frame only
    every: u64,
    fail_on: Vec<u64>,
    reject_options: bool,
}

impl ScriptedProvider {
    pub fn new(modality: Modality, feed: SubjectFeed) -> Self {
        Self {
            modality,
            feed,
            sink: None,
            options: ProviderOptions::for_modality(modality),
            every: 1,
            fail_on: Vec::new(),
            reject_options: false,
        }
    }

    /// Deliver results for every n-th frame, like a model slower than the camera
    pub fn every(mut self, n: u64) -> Self {
        self.every = n.max(1);
        self
    }

    /// Reject `submit` for these frame sequence numbers
    pub fn failing_on(mut self, sequences: impl IntoIterator<Item = u64>) -> Self {
        self.fail_on.extend(sequences);
        self
    }

    /// Reject `configure`
    pub fn rejecting_options(mut self) -> Self {
        self.reject_options = true;
        self
    }
}

impl LandmarkProvider for ScriptedProvider {
    fn modality(&self) -> Modality {
        self.modality
    }

    fn configure(&mut self, options: &ProviderOptions) -> Result<(), ProviderError> {
        if self.reject_options {
            return Err(ProviderError::InvalidOptions {
                modality: self.modality,
                reason: "scripted rejection".into(),
            });
        }
        self.options = options.clone();
        Ok(())
    }

    fn on_result(&mut self, sink: ResultSink) {
        self.sink = Some(sink);
    }

    fn submit(&mut self, frame: &VideoFrame) -> Result<(), ProviderError> {
        if self.fail_on.contains(&frame.sequence) {
            return Err(ProviderError::Rejected {
                modality: self.modality,
                reason: format!("scripted failure on frame {}", frame.sequence),
            });
        }
        if frame.sequence % self.every != 0 {
            return Ok(());
        }

        let Some(sink) = &self.sink else {
            return Err(ProviderError::Unavailable {
                modality: self.modality,
                reason: "no result sink registered".into(),
            });
        };
        if let Some(detections) = self.feed.detections(self.modality, frame.sequence) {
            let limited = detections
                .instances()
                .iter()
                .take(self.options.max_instances)
                .cloned()
                .collect();
            sink.publish(Detections::new(limited));
        }
        Ok(())
    }
}
