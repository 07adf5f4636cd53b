//! Posture - shoulder tilt from the body pose
//!
//! Recomputed fresh every frame. Keeping the message on screen after a brief
//! correction is the decay store's job, not this extractor's.

use poise_core::{pose, FeedbackMessage, LandmarkSet, PoiseError, PoiseResult, SignalKind};
use serde::{Deserialize, Serialize};

use crate::FeedbackSignal;

/// Posture extractor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureConfig {
    /// Shoulder height difference (normalized frame height) above which the candidate leans
    pub max_shoulder_tilt: f32,
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            max_shoulder_tilt: 0.1,
        }
    }
}

impl PostureConfig {
    pub fn validate(&self) -> PoiseResult<()> {
        PoiseError::check_threshold("max_shoulder_tilt", self.max_shoulder_tilt)
    }
}

/// Posture reading for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PostureReading {
    /// `|left_shoulder.y - right_shoulder.y|`
    pub shoulder_tilt: Option<f32>,
    pub leaning: bool,
}

impl FeedbackSignal for PostureReading {
    fn kind(&self) -> SignalKind {
        SignalKind::Posture
    }

    fn feedback(&self) -> Option<FeedbackMessage> {
        self.leaning.then_some(FeedbackMessage::Leaning)
    }
}

/// Posture extractor
#[derive(Debug, Clone, Default)]
pub struct PostureExtractor {
    config: PostureConfig,
}

impl PostureExtractor {
    pub fn new() -> Self {
        Self::with_config(PostureConfig::default())
    }

    pub fn with_config(config: PostureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PostureConfig {
        &self.config
    }

    pub fn extract(&self, body: Option<&LandmarkSet>) -> PostureReading {
        let shoulders = body.and_then(|body| {
            Some((body.get(pose::LEFT_SHOULDER)?, body.get(pose::RIGHT_SHOULDER)?))
        });
        let Some((left, right)) = shoulders else {
            return PostureReading::default();
        };

        let tilt = left.vertical_gap(right);
        PostureReading {
            shoulder_tilt: Some(tilt),
            leaning: tilt > self.config.max_shoulder_tilt,
        }
    }
}
