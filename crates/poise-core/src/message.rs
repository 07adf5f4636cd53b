//! Feedback message catalog
//!
//! Messages are never parameterized: the same condition always yields the
//! same text, and the message itself is the key used for deduplication and
//! decay. Each signal extractor owns a disjoint slice of the catalog.

use serde::{Deserialize, Serialize};

/// Which extractor family a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Gaze,
    HeadPosition,
    Blink,
    Yawn,
    Posture,
    HandMotion,
}

/// A coaching message from the fixed catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackMessage {
    LookingLeft,
    LookingRight,
    MoveRight,
    MoveLeft,
    HighBlinkRate,
    Yawning,
    Leaning,
    ExcessiveHandMovement,
}

impl FeedbackMessage {
    /// Every catalog entry, in display order
    pub fn all() -> &'static [FeedbackMessage] {
        &[
            FeedbackMessage::LookingLeft,
            FeedbackMessage::LookingRight,
            FeedbackMessage::MoveRight,
            FeedbackMessage::MoveLeft,
            FeedbackMessage::HighBlinkRate,
            FeedbackMessage::Yawning,
            FeedbackMessage::Leaning,
            FeedbackMessage::ExcessiveHandMovement,
        ]
    }

    /// Text shown to the candidate
    pub fn text(self) -> &'static str {
        match self {
            FeedbackMessage::LookingLeft => "Looking left or off-screen",
            FeedbackMessage::LookingRight => "Looking right or off-screen",
            FeedbackMessage::MoveRight => "Move slightly to your right.",
            FeedbackMessage::MoveLeft => "Move slightly to your left.",
            FeedbackMessage::HighBlinkRate => "High blink rate, possible nervousness.",
            FeedbackMessage::Yawning => "Yawning detected, possible drowsiness.",
            FeedbackMessage::Leaning => "Sit straight, you're leaning.",
            FeedbackMessage::ExcessiveHandMovement => "Excessive hand movement.",
        }
    }

    pub fn kind(self) -> SignalKind {
        match self {
            FeedbackMessage::LookingLeft | FeedbackMessage::LookingRight => SignalKind::Gaze,
            FeedbackMessage::MoveRight | FeedbackMessage::MoveLeft => SignalKind::HeadPosition,
            FeedbackMessage::HighBlinkRate => SignalKind::Blink,
            FeedbackMessage::Yawning => SignalKind::Yawn,
            FeedbackMessage::Leaning => SignalKind::Posture,
            FeedbackMessage::ExcessiveHandMovement => SignalKind::HandMotion,
        }
    }

    /// Reverse lookup from display text
    pub fn from_text(text: &str) -> Option<FeedbackMessage> {
        Self::all().iter().copied().find(|m| m.text() == text)
    }
}

impl std::fmt::Display for FeedbackMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

impl AsRef<str> for FeedbackMessage {
    fn as_ref(&self) -> &str {
        self.text()
    }
}
