//! Blink and yawn detection
//!
//! Two independent face signals sharing one extractor:
//! - Blinks: eyelid aperture below threshold, debounced, counted over a
//!   sliding window. A high windowed count reads as nervousness.
//! - Yawns: mouth opening crossing a threshold, edge-triggered through a
//!   latch so one long yawn counts once. The yawn count is cumulative over
//!   the whole session (it is never windowed).

use std::collections::VecDeque;
use std::time::Duration;

use poise_core::{
    duration_format, face_mesh, FeedbackMessage, LandmarkSet, PoiseError, PoiseResult,
    SessionTime, SignalKind,
};
use serde::{Deserialize, Serialize};

use crate::FeedbackSignal;

/// Blink/yawn extractor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkYawnConfig {
    /// Average eyelid aperture below this counts as closed eyes
    pub blink_aperture_below: f32,
    /// Minimum gap between two counted blinks
    #[serde(with = "duration_format")]
    pub blink_debounce: Duration,
    /// Sliding window for the blink count
    #[serde(with = "duration_format")]
    pub blink_window: Duration,
    /// Windowed blink count above this reads as nervousness
    pub max_blinks_per_window: usize,
    /// Lip gap above this counts as an open mouth
    pub yawn_open_above: f32,
    /// Session yawn count above this reads as drowsiness
    pub max_yawns: u32,
}

impl Default for BlinkYawnConfig {
    fn default() -> Self {
        Self {
            blink_aperture_below: 0.23,
            blink_debounce: Duration::from_millis(300),
            blink_window: Duration::from_secs(60),
            max_blinks_per_window: 20,
            yawn_open_above: 0.05,
            max_yawns: 2,
        }
    }
}

impl BlinkYawnConfig {
    pub fn validate(&self) -> PoiseResult<()> {
        PoiseError::check_threshold("blink_aperture_below", self.blink_aperture_below)?;
        PoiseError::check_threshold("yawn_open_above", self.yawn_open_above)?;
        PoiseError::check_duration("blink_window", self.blink_window)
    }
}

/// Blink reading for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlinkReading {
    /// Average eyelid aperture of both eyes
    pub aperture: Option<f32>,
    /// A blink was counted on this frame
    pub blink_counted: bool,
    /// Blinks inside the sliding window
    pub window_blinks: usize,
    pub high_rate: bool,
}

impl FeedbackSignal for BlinkReading {
    fn kind(&self) -> SignalKind {
        SignalKind::Blink
    }

    fn feedback(&self) -> Option<FeedbackMessage> {
        self.high_rate.then_some(FeedbackMessage::HighBlinkRate)
    }
}

/// Yawn reading for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct YawnReading {
    /// Vertical gap between the inner lips
    pub mouth_open: Option<f32>,
    /// A new yawn started on this frame
    pub yawn_started: bool,
    /// Yawns counted since the session started
    pub yawn_count: u32,
    pub drowsy: bool,
}

impl FeedbackSignal for YawnReading {
    fn kind(&self) -> SignalKind {
        SignalKind::Yawn
    }

    fn feedback(&self) -> Option<FeedbackMessage> {
        self.drowsy.then_some(FeedbackMessage::Yawning)
    }
}

/// Both readings of a frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaceActivity {
    pub blink: BlinkReading,
    pub yawn: YawnReading,
}

/// Blink/yawn extractor
#[derive(Debug, Clone)]
pub struct BlinkYawnExtractor {
    config: BlinkYawnConfig,
    // Blink state
    last_blink: Option<SessionTime>,
    blink_history: VecDeque<SessionTime>,
    total_blinks: u64,
    // Yawn state
    yawn_latch: bool,
    yawn_count: u32,
}

impl BlinkYawnExtractor {
    pub fn new() -> Self {
        Self::with_config(BlinkYawnConfig::default())
    }

    pub fn with_config(config: BlinkYawnConfig) -> Self {
        Self {
            config,
            last_blink: None,
            blink_history: VecDeque::with_capacity(64),
            total_blinks: 0,
            yawn_latch: false,
            yawn_count: 0,
        }
    }

    pub fn config(&self) -> &BlinkYawnConfig {
        &self.config
    }

    /// Eyelid aperture averaged over both eyes
    pub fn eye_aperture(face: &LandmarkSet) -> Option<f32> {
        let left = face
            .get(face_mesh::LEFT_EYE_UPPER_LID)?
            .vertical_gap(face.get(face_mesh::LEFT_EYE_LOWER_LID)?);
        let right = face
            .get(face_mesh::RIGHT_EYE_UPPER_LID)?
            .vertical_gap(face.get(face_mesh::RIGHT_EYE_LOWER_LID)?);
        Some((left + right) / 2.0)
    }

    /// Vertical gap between the inner lips
    pub fn mouth_opening(face: &LandmarkSet) -> Option<f32> {
        let upper = face.get(face_mesh::UPPER_LIP_INNER)?;
        let lower = face.get(face_mesh::LOWER_LIP_INNER)?;
        Some(upper.vertical_gap(lower))
    }

    /// Advance blink and yawn state with the latest face snapshot
    pub fn update(&mut self, face: Option<&LandmarkSet>, now: SessionTime) -> FaceActivity {
        self.prune_blinks(now);

        let Some(face) = face else {
            return FaceActivity {
                blink: BlinkReading {
                    window_blinks: self.blink_history.len(),
                    ..Default::default()
                },
                yawn: YawnReading {
                    yawn_count: self.yawn_count,
                    ..Default::default()
                },
            };
        };

        FaceActivity {
            blink: self.update_blink(face, now),
            yawn: self.update_yawn(face),
        }
    }

    fn update_blink(&mut self, face: &LandmarkSet, now: SessionTime) -> BlinkReading {
        let Some(aperture) = Self::eye_aperture(face) else {
            return BlinkReading {
                window_blinks: self.blink_history.len(),
                ..Default::default()
            };
        };

        let debounced = self
            .last_blink
            .map_or(true, |last| now - last >= self.config.blink_debounce);
        let blink_counted = aperture < self.config.blink_aperture_below && debounced;

        if blink_counted {
            self.blink_history.push_back(now);
            self.last_blink = Some(now);
            self.total_blinks += 1;
            tracing::debug!(aperture, window = self.blink_history.len(), "blink counted");
        }

        let window_blinks = self.blink_history.len();
        BlinkReading {
            aperture: Some(aperture),
            blink_counted,
            window_blinks,
            high_rate: window_blinks > self.config.max_blinks_per_window,
        }
    }

    fn update_yawn(&mut self, face: &LandmarkSet) -> YawnReading {
        let Some(mouth_open) = Self::mouth_opening(face) else {
            return YawnReading {
                yawn_count: self.yawn_count,
                ..Default::default()
            };
        };

        let is_open = mouth_open > self.config.yawn_open_above;
        let yawn_started = is_open && !self.yawn_latch;
        if yawn_started {
            self.yawn_count += 1;
            tracing::debug!(mouth_open, count = self.yawn_count, "yawn counted");
        }
        self.yawn_latch = is_open;

        YawnReading {
            mouth_open: Some(mouth_open),
            yawn_started,
            yawn_count: self.yawn_count,
            drowsy: self.yawn_count > self.config.max_yawns,
        }
    }

    /// Drop blinks older than the window (a blink exactly one window old is kept)
    fn prune_blinks(&mut self, now: SessionTime) {
        while let Some(&oldest) = self.blink_history.front() {
            if now - oldest > self.config.blink_window {
                self.blink_history.pop_front();
            } else {
                break;
            }
        }
    }

    /// Blinks currently inside the window
    pub fn window_blinks(&self) -> usize {
        self.blink_history.len()
    }

    /// Blinks counted since the session started
    pub fn total_blinks(&self) -> u64 {
        self.total_blinks
    }

    pub fn yawn_count(&self) -> u32 {
        self.yawn_count
    }

    pub fn last_blink(&self) -> Option<SessionTime> {
        self.last_blink
    }

    /// Reset all rolling state
    pub fn reset(&mut self) {
        self.last_blink = None;
        self.blink_history.clear();
        self.total_blinks = 0;
        self.yawn_latch = false;
        self.yawn_count = 0;
    }
}

impl Default for BlinkYawnExtractor {
    fn default() -> Self {
        Self::new()
    }
}
