//! Feedback engine - one core tick over the current snapshots

use std::collections::BTreeMap;

use poise_core::{FeedbackMessage, PoiseResult, SessionTime, Snapshots};
use poise_signals::{
    BlinkYawnConfig, BlinkYawnExtractor, GazeConfig, GazeExtractor, HandMotionConfig,
    HandMotionExtractor, PostureConfig, PostureExtractor,
};
use serde::{Deserialize, Serialize};

use crate::{classify, ActiveSet, DecayConfig, DecayStore, DecayUpdate, FrameSignals};

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub gaze: GazeConfig,
    pub blink: BlinkYawnConfig,
    pub posture: PostureConfig,
    pub hands: HandMotionConfig,
    pub decay: DecayConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> PoiseResult<()> {
        self.gaze.validate()?;
        self.blink.validate()?;
        self.posture.validate()?;
        self.hands.validate()?;
        self.decay.validate()
    }
}

/// Result of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    /// Time of the tick
    pub now: SessionTime,
    /// Raw extractor readings
    pub signals: FrameSignals,
    /// Messages the classifier asked for on this frame
    pub emitted: ActiveSet,
    /// Messages visible after the decay step, in catalog order
    pub visible: Vec<FeedbackMessage>,
    /// Activations and expiries caused by this tick
    pub changes: DecayUpdate,
}

/// Cumulative counters over the engine's lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineSummary {
    pub ticks: u64,
    pub total_blinks: u64,
    pub yawns: u32,
    /// How often each message went from hidden to visible
    pub activations: BTreeMap<FeedbackMessage, u64>,
}

/// Feedback engine: extractors, classifier and decay store
pub struct FeedbackEngine {
    gaze: GazeExtractor,
    blink: BlinkYawnExtractor,
    posture: PostureExtractor,
    hands: HandMotionExtractor,
    decay: DecayStore,
    ticks: u64,
    activations: BTreeMap<FeedbackMessage, u64>,
}

impl FeedbackEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            gaze: GazeExtractor::with_config(config.gaze),
            blink: BlinkYawnExtractor::with_config(config.blink),
            posture: PostureExtractor::with_config(config.posture),
            hands: HandMotionExtractor::with_config(config.hands),
            decay: DecayStore::with_config(config.decay),
            ticks: 0,
            activations: BTreeMap::new(),
        }
    }

    /// Run the extractors over the snapshots without touching the decay store
    pub fn extract(&mut self, snapshots: &Snapshots, now: SessionTime) -> FrameSignals {
        FrameSignals {
            orientation: self.gaze.extract(snapshots.face()),
            activity: self.blink.update(snapshots.face(), now),
            posture: self.posture.extract(snapshots.pose()),
            hands: self.hands.update(snapshots.hands()),
        }
    }

    /// One tick: extract, classify, decay
    pub fn tick(&mut self, snapshots: &Snapshots, now: SessionTime) -> TickOutput {
        self.ticks += 1;

        let signals = self.extract(snapshots, now);
        let emitted = classify(&signals);
        let changes = self.decay.advance(emitted.iter().copied(), now);

        for message in &changes.activated {
            *self.activations.entry(*message).or_default() += 1;
            tracing::debug!(message = message.text(), %now, "feedback shown");
        }
        for message in &changes.expired {
            tracing::debug!(message = message.text(), %now, "feedback expired");
        }

        TickOutput {
            now,
            signals,
            emitted,
            visible: self.decay.active(),
            changes,
        }
    }

    /// Messages currently visible
    pub fn visible(&self) -> Vec<FeedbackMessage> {
        self.decay.active()
    }

    pub fn decay_store(&self) -> &DecayStore {
        &self.decay
    }

    pub fn summary(&self) -> EngineSummary {
        EngineSummary {
            ticks: self.ticks,
            total_blinks: self.blink.total_blinks(),
            yawns: self.blink.yawn_count(),
            activations: self.activations.clone(),
        }
    }

    /// Full restart: clear every extractor's rolling state and the decay store
    pub fn reset(&mut self) {
        self.blink.reset();
        self.hands.reset();
        self.decay.clear();
        self.ticks = 0;
        self.activations.clear();
    }
}

impl Default for FeedbackEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poise_core::{face_mesh, hand, pose, Detections, Landmark, LandmarkSet, Modality};

    fn at(ms: i64) -> SessionTime {
        SessionTime::from_millis(ms)
    }

    fn body(left_y: f32, right_y: f32) -> Detections {
        let mut body = LandmarkSet::filled(pose::POINTS, 0.5, 0.5);
        body.set(pose::LEFT_SHOULDER, Landmark::new(0.65, left_y));
        body.set(pose::RIGHT_SHOULDER, Landmark::new(0.35, right_y));
        Detections::single(body)
    }

    fn face_with_nose(x: f32) -> Detections {
        let mut face = LandmarkSet::filled(face_mesh::REFINED_POINTS, 0.5, 0.5);
        face.set(face_mesh::NOSE_TIP, Landmark::new(x, 0.5));
        Detections::single(face)
    }

    #[test]
    fn test_empty_snapshots_are_quiet() {
        let mut engine = FeedbackEngine::new();
        let output = engine.tick(&Snapshots::empty(), at(0));

        assert!(output.emitted.is_empty());
        assert!(output.visible.is_empty());
        assert_eq!(output.signals, FrameSignals::default());
    }

    #[test]
    fn test_nose_left_emits_move_right() {
        let mut engine = FeedbackEngine::new();
        let snapshots = Snapshots::empty()
            .with(Modality::Face, face_with_nose(0.2))
            .with(Modality::Pose, body(0.40, 0.42));

        let output = engine.tick(&snapshots, at(0));
        assert!(output.emitted.contains(&FeedbackMessage::MoveRight));
        assert_eq!(output.visible, vec![FeedbackMessage::MoveRight]);
    }

    #[test]
    fn test_leaning_persists_after_correction() {
        let mut engine = FeedbackEngine::new();
        let leaning = Snapshots::empty().with(Modality::Pose, body(0.40, 0.55));
        let upright = Snapshots::empty().with(Modality::Pose, body(0.40, 0.45));

        engine.tick(&leaning, at(0));
        let output = engine.tick(&upright, at(1000));
        assert!(output.emitted.is_empty());
        assert_eq!(output.visible, vec![FeedbackMessage::Leaning]);

        let output = engine.tick(&upright, at(3000));
        assert!(output.visible.is_empty());
        assert_eq!(output.changes.expired, vec![FeedbackMessage::Leaning]);
    }

    #[test]
    fn test_summary_counts_activations() {
        let mut engine = FeedbackEngine::new();
        let leaning = Snapshots::empty().with(Modality::Pose, body(0.40, 0.55));
        let upright = Snapshots::empty().with(Modality::Pose, body(0.40, 0.45));

        engine.tick(&leaning, at(0));
        engine.tick(&leaning, at(500));
        engine.tick(&upright, at(4000));
        engine.tick(&leaning, at(5000));

        let summary = engine.summary();
        assert_eq!(summary.ticks, 4);
        assert_eq!(summary.activations.get(&FeedbackMessage::Leaning), Some(&2));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut engine = FeedbackEngine::new();
        let hands = Detections::single(LandmarkSet::filled(hand::POINTS, 0.5, 0.5));
        let snapshots = Snapshots::empty()
            .with(Modality::Pose, body(0.40, 0.55))
            .with(Modality::Hands, hands);

        engine.tick(&snapshots, at(0));
        assert!(!engine.visible().is_empty());

        engine.reset();
        assert!(engine.visible().is_empty());
        assert_eq!(engine.summary(), EngineSummary::default());
    }

    #[test]
    fn test_config_from_json() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"posture":{"max_shoulder_tilt":0.2},"decay":{"ttl":"5s"}}"#)
                .unwrap();
        assert!((config.posture.max_shoulder_tilt - 0.2).abs() < 1e-6);
        assert_eq!(config.decay.ttl, std::time::Duration::from_secs(5));
        assert_eq!(config.gaze, GazeConfig::default());
        assert!(config.validate().is_ok());
    }
}
