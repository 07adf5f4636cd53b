//! POISE Signals - behavioural signals from landmark snapshots
//!
//! Landmarks are coordinates; signals are MEANING. Each extractor turns the
//! latest snapshot of one provider (plus a little rolling memory) into a
//! reading, and each reading decides on at most one catalog message.
//!
//! # Extractors
//!
//! - `gaze`: iris position within the eye span, horizontal head offset
//! - `blink`: eyelid aperture blinks (debounced, windowed) and yawns (latched)
//! - `posture`: shoulder tilt
//! - `hands`: frame-to-frame hand movement energy
//!
//! Missing or short landmark sequences are never an error: the reading simply
//! holds no opinion for that frame.

pub mod blink;
pub mod gaze;
pub mod hands;
pub mod posture;

pub use blink::*;
pub use gaze::*;
pub use hands::*;
pub use posture::*;

use poise_core::{FeedbackMessage, SignalKind};

/// A per-frame reading that maps to zero or one catalog message
pub trait FeedbackSignal {
    /// The slice of the catalog this reading may emit from
    fn kind(&self) -> SignalKind;

    /// The message this reading asks for this frame, if any
    fn feedback(&self) -> Option<FeedbackMessage>;
}
