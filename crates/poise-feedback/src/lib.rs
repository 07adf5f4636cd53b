//! POISE Feedback - from signals to the messages on screen
//!
//! One engine tick:
//! 1. Run the four extractors over the current snapshots
//! 2. Classify their readings into this frame's messages
//! 3. Refresh and prune the decay store
//! 4. Report the visible set
//!
//! The engine is synchronous and owns all rolling state; it is driven by a
//! single frame loop and never shared across threads.

pub mod classifier;
pub mod decay;
pub mod engine;

pub use classifier::*;
pub use decay::*;
pub use engine::*;
