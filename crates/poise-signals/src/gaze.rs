//! Gaze and head position
//!
//! Gaze is estimated from where each iris sits between the corners of its
//! eye; head position from where the nose tip sits across the frame width.
//! Both are pure functions of the face snapshot: the extractor keeps no
//! memory between frames.

use poise_core::{face_mesh, FeedbackMessage, LandmarkSet, PoiseError, PoiseResult, SignalKind};
use serde::{Deserialize, Serialize};

use crate::FeedbackSignal;

/// Gaze extractor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    /// Average iris position below this reads as looking left
    pub look_left_below: f32,
    /// Average iris position above this reads as looking right
    pub look_right_above: f32,
    /// Nose tip `x` below this means the candidate sits too far left in frame
    pub head_left_bound: f32,
    /// Nose tip `x` above this means the candidate sits too far right in frame
    pub head_right_bound: f32,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            look_left_below: 0.35,
            look_right_above: 0.65,
            head_left_bound: 0.35,
            head_right_bound: 0.65,
        }
    }
}

impl GazeConfig {
    pub fn validate(&self) -> PoiseResult<()> {
        PoiseError::check_band("gaze", self.look_left_below, self.look_right_above)?;
        PoiseError::check_band("head_position", self.head_left_bound, self.head_right_bound)
    }
}

/// Horizontal gaze classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GazeDirection {
    Left,
    Centered,
    Right,
}

/// Where the candidate sits across the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadOffset {
    /// Nose tip left of the bound (in image coordinates)
    Left,
    Centered,
    /// Nose tip right of the bound (in image coordinates)
    Right,
}

/// Gaze reading for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GazeReading {
    /// Average normalized iris position (0 = inner corner, 1 = outer corner)
    pub iris_position: Option<f32>,
    pub direction: Option<GazeDirection>,
}

impl FeedbackSignal for GazeReading {
    fn kind(&self) -> SignalKind {
        SignalKind::Gaze
    }

    fn feedback(&self) -> Option<FeedbackMessage> {
        match self.direction? {
            GazeDirection::Left => Some(FeedbackMessage::LookingLeft),
            GazeDirection::Right => Some(FeedbackMessage::LookingRight),
            GazeDirection::Centered => None,
        }
    }
}

/// Head position reading for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeadPositionReading {
    /// Nose tip `x` in normalized frame coordinates
    pub nose_x: Option<f32>,
    pub offset: Option<HeadOffset>,
}

impl FeedbackSignal for HeadPositionReading {
    fn kind(&self) -> SignalKind {
        SignalKind::HeadPosition
    }

    // The guidance is phrased from the candidate's point of view, so an
    // image-left offset asks them to move right.
    fn feedback(&self) -> Option<FeedbackMessage> {
        match self.offset? {
            HeadOffset::Left => Some(FeedbackMessage::MoveRight),
            HeadOffset::Right => Some(FeedbackMessage::MoveLeft),
            HeadOffset::Centered => None,
        }
    }
}

/// Both face-orientation readings of a frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaceOrientation {
    pub gaze: GazeReading,
    pub head: HeadPositionReading,
}

/// Gaze extractor
#[derive(Debug, Clone, Default)]
pub struct GazeExtractor {
    config: GazeConfig,
}

impl GazeExtractor {
    pub fn new() -> Self {
        Self::with_config(GazeConfig::default())
    }

    pub fn with_config(config: GazeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GazeConfig {
        &self.config
    }

    /// Read gaze and head position from the latest face snapshot
    pub fn extract(&self, face: Option<&LandmarkSet>) -> FaceOrientation {
        let Some(face) = face else {
            return FaceOrientation::default();
        };

        FaceOrientation {
            gaze: self.read_gaze(face),
            head: self.read_head(face),
        }
    }

    fn read_gaze(&self, face: &LandmarkSet) -> GazeReading {
        let left = iris_position(
            face,
            face_mesh::LEFT_IRIS_CENTER,
            face_mesh::LEFT_EYE_INNER,
            face_mesh::LEFT_EYE_OUTER,
        );
        let right = iris_position(
            face,
            face_mesh::RIGHT_IRIS_CENTER,
            face_mesh::RIGHT_EYE_INNER,
            face_mesh::RIGHT_EYE_OUTER,
        );

        let (Some(left), Some(right)) = (left, right) else {
            return GazeReading::default();
        };

        let avg = (left + right) / 2.0;
        let direction = if avg < self.config.look_left_below {
            GazeDirection::Left
        } else if avg > self.config.look_right_above {
            GazeDirection::Right
        } else {
            GazeDirection::Centered
        };

        tracing::trace!(avg, ?direction, "gaze");

        GazeReading {
            iris_position: Some(avg),
            direction: Some(direction),
        }
    }

    fn read_head(&self, face: &LandmarkSet) -> HeadPositionReading {
        let Some(nose) = face.get(face_mesh::NOSE_TIP) else {
            return HeadPositionReading::default();
        };

        let offset = if nose.x < self.config.head_left_bound {
            HeadOffset::Left
        } else if nose.x > self.config.head_right_bound {
            HeadOffset::Right
        } else {
            HeadOffset::Centered
        };

        HeadPositionReading {
            nose_x: Some(nose.x),
            offset: Some(offset),
        }
    }
}

/// Normalized horizontal iris position within one eye
///
/// `None` when any of the three points is missing or the eye span is degenerate.
fn iris_position(face: &LandmarkSet, iris: usize, inner: usize, outer: usize) -> Option<f32> {
    let iris = face.get(iris)?;
    let inner = face.get(inner)?;
    let outer = face.get(outer)?;

    let span = outer.x - inner.x;
    if span.abs() < f32::EPSILON {
        return None;
    }

    let pos = (iris.x - inner.x) / span;
    pos.is_finite().then_some(pos)
}
