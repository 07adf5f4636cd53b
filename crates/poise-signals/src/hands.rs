//! Hand motion - frame-to-frame movement energy of the detected hands
//!
//! Energy is the sum of squared landmark displacements between the current
//! hands and the hands seen on the previous frame that had any. Hands and
//! landmarks are matched by index; a hand or landmark without a counterpart
//! contributes nothing, so a hand entering the frame reads as still.

use poise_core::{hand, FeedbackMessage, LandmarkSet, PoiseError, PoiseResult, SignalKind};
use serde::{Deserialize, Serialize};

use crate::FeedbackSignal;

/// Hand-motion extractor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandMotionConfig {
    /// Movement energy above which hand movement is excessive
    pub max_energy: f32,
}

impl Default for HandMotionConfig {
    fn default() -> Self {
        Self { max_energy: 0.02 }
    }
}

impl HandMotionConfig {
    pub fn validate(&self) -> PoiseResult<()> {
        PoiseError::check_threshold("max_energy", self.max_energy)
    }
}

/// Hand-motion reading for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HandMotionReading {
    /// Summed squared displacement; `None` on frames without hands
    pub energy: Option<f32>,
    pub hands: usize,
    pub excessive: bool,
}

impl FeedbackSignal for HandMotionReading {
    fn kind(&self) -> SignalKind {
        SignalKind::HandMotion
    }

    fn feedback(&self) -> Option<FeedbackMessage> {
        self.excessive.then_some(FeedbackMessage::ExcessiveHandMovement)
    }
}

/// Hand-motion extractor
#[derive(Debug, Clone, Default)]
pub struct HandMotionExtractor {
    config: HandMotionConfig,
    last_hands: Vec<LandmarkSet>,
}

impl HandMotionExtractor {
    pub fn new() -> Self {
        Self::with_config(HandMotionConfig::default())
    }

    pub fn with_config(config: HandMotionConfig) -> Self {
        Self {
            config,
            last_hands: Vec::with_capacity(hand::MAX_HANDS),
        }
    }

    pub fn config(&self) -> &HandMotionConfig {
        &self.config
    }

    /// Movement energy between two hand snapshots
    pub fn movement_energy(previous: &[LandmarkSet], current: &[LandmarkSet]) -> f32 {
        current
            .iter()
            .zip(previous)
            .map(|(now, before)| {
                (0..now.len().min(before.len()))
                    .filter_map(|i| Some(now.get(i)?.planar_distance_sq(before.get(i)?)))
                    .sum::<f32>()
            })
            .sum()
    }

    pub fn update(&mut self, hands: &[LandmarkSet]) -> HandMotionReading {
        if hands.is_empty() {
            return HandMotionReading::default();
        }

        let energy = Self::movement_energy(&self.last_hands, hands);
        self.last_hands.clear();
        self.last_hands.extend_from_slice(hands);

        let excessive = energy > self.config.max_energy;
        if excessive {
            tracing::trace!(energy, hands = hands.len(), "excessive hand movement");
        }

        HandMotionReading {
            energy: Some(energy),
            hands: hands.len(),
            excessive,
        }
    }

    /// Hands remembered from the last frame that had any
    pub fn last_hands(&self) -> &[LandmarkSet] {
        &self.last_hands
    }

    pub fn reset(&mut self) {
        self.last_hands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poise_core::Landmark;

    fn open_hand(x: f32, y: f32) -> LandmarkSet {
        LandmarkSet::new(
            (0..hand::POINTS)
                .map(|i| Landmark::new(x + i as f32 * 0.005, y - i as f32 * 0.004))
                .collect(),
        )
    }

    #[test]
    fn test_identical_snapshots_have_zero_energy() {
        let mut extractor = HandMotionExtractor::new();
        let hands = vec![open_hand(0.3, 0.7), open_hand(0.6, 0.7)];

        extractor.update(&hands);
        let reading = extractor.update(&hands);
        assert_eq!(reading.energy, Some(0.0));
        assert_eq!(reading.feedback(), None);
    }

    #[test]
    fn test_single_landmark_displacement() {
        let mut extractor = HandMotionExtractor::new();
        let before = vec![open_hand(0.3, 0.7)];
        let mut after = before.clone();
        let tip = *before[0].get(hand::INDEX_FINGER_TIP).unwrap();
        after[0].set(hand::INDEX_FINGER_TIP, Landmark::new(tip.x + 0.03, tip.y - 0.04));

        extractor.update(&before);
        let reading = extractor.update(&after);
        let expected = 0.03f32 * 0.03 + 0.04 * 0.04;
        assert!((reading.energy.unwrap() - expected).abs() < 1e-6);
        assert!(!reading.excessive);
    }

    #[test]
    fn test_excessive_movement() {
        let mut extractor = HandMotionExtractor::new();
        extractor.update(&[open_hand(0.3, 0.7)]);

        // Every landmark moves 0.05 in x: 21 * 0.0025 = 0.0525
        let reading = extractor.update(&[open_hand(0.35, 0.7)]);
        assert!(reading.excessive);
        assert_eq!(reading.feedback(), Some(FeedbackMessage::ExcessiveHandMovement));
    }

    #[test]
    fn test_first_frame_reads_still() {
        let mut extractor = HandMotionExtractor::new();
        let reading = extractor.update(&[open_hand(0.3, 0.7)]);
        assert_eq!(reading.energy, Some(0.0));
        assert_eq!(reading.hands, 1);
    }

    #[test]
    fn test_new_hand_without_counterpart() {
        let mut extractor = HandMotionExtractor::new();
        extractor.update(&[open_hand(0.3, 0.7)]);

        let reading = extractor.update(&[open_hand(0.3, 0.7), open_hand(0.9, 0.1)]);
        assert_eq!(reading.energy, Some(0.0));
        assert_eq!(reading.hands, 2);
        assert_eq!(extractor.last_hands().len(), 2);
    }

    #[test]
    fn test_empty_frame_keeps_previous_hands() {
        let mut extractor = HandMotionExtractor::new();
        extractor.update(&[open_hand(0.3, 0.7)]);

        assert_eq!(extractor.update(&[]), HandMotionReading::default());
        assert_eq!(extractor.last_hands().len(), 1);

        // Compared against the hand seen before the gap
        let reading = extractor.update(&[open_hand(0.35, 0.7)]);
        assert!(reading.excessive);
    }

    #[test]
    fn test_last_hands_updated_even_when_firing() {
        let mut extractor = HandMotionExtractor::new();
        extractor.update(&[open_hand(0.3, 0.7)]);
        assert!(extractor.update(&[open_hand(0.4, 0.7)]).excessive);

        let still = extractor.update(&[open_hand(0.4, 0.7)]);
        assert_eq!(still.energy, Some(0.0));
    }
}
