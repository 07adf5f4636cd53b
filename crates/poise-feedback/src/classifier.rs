//! Feedback classifier - the readings of one frame to a set of messages

use std::collections::BTreeSet;

use poise_core::FeedbackMessage;
use poise_signals::{
    BlinkReading, FaceActivity, FaceOrientation, FeedbackSignal, GazeReading,
    HandMotionReading, HeadPositionReading, PostureReading, YawnReading,
};
use serde::Serialize;

/// Messages asked for by one frame, ordered by catalog position
pub type ActiveSet = BTreeSet<FeedbackMessage>;

/// Every extractor reading of one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameSignals {
    pub orientation: FaceOrientation,
    pub activity: FaceActivity,
    pub posture: PostureReading,
    pub hands: HandMotionReading,
}

impl FrameSignals {
    pub fn gaze(&self) -> &GazeReading {
        &self.orientation.gaze
    }

    pub fn head(&self) -> &HeadPositionReading {
        &self.orientation.head
    }

    pub fn blink(&self) -> &BlinkReading {
        &self.activity.blink
    }

    pub fn yawn(&self) -> &YawnReading {
        &self.activity.yawn
    }

    /// All readings, one per signal kind
    pub fn readout(&self) -> SignalReadout {
        SignalReadout::from(self)
    }

    pub fn readings(&self) -> [&dyn FeedbackSignal; 6] {
        [
            &self.orientation.gaze,
            &self.orientation.head,
            &self.activity.blink,
            &self.activity.yawn,
            &self.posture,
            &self.hands,
        ]
    }
}

/// Flat numeric view of one frame's readings, for overlays and traces
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SignalReadout {
    pub iris_position: Option<f32>,
    pub nose_x: Option<f32>,
    pub eye_aperture: Option<f32>,
    pub mouth_open: Option<f32>,
    pub window_blinks: usize,
    pub yawns: u32,
    pub shoulder_tilt: Option<f32>,
    pub hand_energy: Option<f32>,
}

impl From<&FrameSignals> for SignalReadout {
    fn from(signals: &FrameSignals) -> Self {
        Self {
            iris_position: signals.gaze().iris_position,
            nose_x: signals.head().nose_x,
            eye_aperture: signals.blink().aperture,
            mouth_open: signals.yawn().mouth_open,
            window_blinks: signals.blink().window_blinks,
            yawns: signals.yawn().yawn_count,
            shoulder_tilt: signals.posture.shoulder_tilt,
            hand_energy: signals.hands.energy,
        }
    }
}

/// Collect the messages the readings ask for this frame
///
/// Every reading owns its own slice of the catalog, so the union never
/// contains two messages from one kind and never contains duplicates.
pub fn classify(signals: &FrameSignals) -> ActiveSet {
    let mut active = ActiveSet::new();
    for reading in signals.readings() {
        if let Some(message) = reading.feedback() {
            debug_assert_eq!(message.kind(), reading.kind());
            active.insert(message);
        }
    }
    active
}
