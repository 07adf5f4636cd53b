//! Provider boundary - camera frames in, landmark results out
//!
//! The camera and the three landmark models live outside the core. The
//! session drives them through these traits; models deliver results through
//! a [`ResultSink`] whenever they finish, independent of the tick rate.

use bytes::Bytes;
use poise_core::{Modality, PoiseError, PoiseResult, SessionTime};
use serde::{Deserialize, Serialize};

use crate::{ProviderError, ResultSink, SourceError};

/// One captured camera frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Capture counter, starting at zero
    pub sequence: u64,
    pub captured_at: SessionTime,
    pub width: u32,
    pub height: u32,
    /// Packed RGBA pixels
    pub pixels: Bytes,
}

impl VideoFrame {
    /// A frame with no pixel payload, for sources that only signal timing
    pub fn blank(sequence: u64, captured_at: SessionTime, width: u32, height: u32) -> Self {
        Self {
            sequence,
            captured_at,
            width,
            height,
            pixels: Bytes::new(),
        }
    }
}

/// Camera or any other frame producer
pub trait FrameSource: Send {
    /// Acquire the device
    fn open(&mut self) -> Result<(), SourceError>;

    /// Latest frame, or `None` when nothing new was captured since the last call
    fn next_frame(&mut self, now: SessionTime) -> Option<VideoFrame>;

    /// Release the device. Called once when the session stops.
    fn release(&mut self);
}

/// Model options handed to a provider before the loop starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderOptions {
    /// Maximum instances reported per result
    pub max_instances: usize,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    /// Face only: report the ten iris points after the mesh
    pub refine_landmarks: bool,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            max_instances: 1,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            refine_landmarks: false,
        }
    }
}

impl ProviderOptions {
    pub fn validate(&self) -> PoiseResult<()> {
        PoiseError::check_threshold("max_instances", self.max_instances as f32)?;
        PoiseError::check_threshold("min_detection_confidence", self.min_detection_confidence)?;
        PoiseError::check_threshold("min_tracking_confidence", self.min_tracking_confidence)
    }

    /// Options the extractors expect from each model
    pub fn for_modality(modality: Modality) -> Self {
        match modality {
            Modality::Face => Self {
                refine_landmarks: true,
                ..Self::default()
            },
            Modality::Pose => Self::default(),
            Modality::Hands => Self {
                max_instances: poise_core::hand::MAX_HANDS,
                ..Self::default()
            },
        }
    }
}

/// Per-modality provider options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub face: ProviderOptions,
    pub pose: ProviderOptions,
    pub hands: ProviderOptions,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            face: ProviderOptions::for_modality(Modality::Face),
            pose: ProviderOptions::for_modality(Modality::Pose),
            hands: ProviderOptions::for_modality(Modality::Hands),
        }
    }
}

impl ProvidersConfig {
    pub fn validate(&self) -> PoiseResult<()> {
        self.face.validate()?;
        self.pose.validate()?;
        self.hands.validate()
    }

    pub fn get(&self, modality: Modality) -> &ProviderOptions {
        match modality {
            Modality::Face => &self.face,
            Modality::Pose => &self.pose,
            Modality::Hands => &self.hands,
        }
    }
}

/// A landmark model for one modality
pub trait LandmarkProvider: Send {
    fn modality(&self) -> Modality;

    /// Apply model options. Called once before the first frame.
    fn configure(&mut self, options: &ProviderOptions) -> Result<(), ProviderError>;

    /// Register where results go. Called once before the first frame.
    fn on_result(&mut self, sink: ResultSink);

    /// Hand a frame to the model. Results may arrive later, or never.
    fn submit(&mut self, frame: &VideoFrame) -> Result<(), ProviderError>;
}
