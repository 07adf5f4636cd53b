//! POISE Runtime - session lifecycle and the frame loop
//!
//! One tick of the loop:
//! 1. Stamp the tick with session time
//! 2. Pull the next camera frame (if any) and submit it to every provider
//! 3. Load the latest provider snapshots (stale-but-valid)
//! 4. Run the feedback engine (extract, classify, decay)
//! 5. Publish a display frame
//!
//! Providers deliver results asynchronously into the snapshot store; that
//! hand-off is the only state shared across threads. Everything else is
//! owned by the loop task.

pub mod clock;
pub mod config;
pub mod error;
pub mod provider;
pub mod session;
pub mod snapshot;
pub mod telemetry;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use provider::*;
pub use session::*;
pub use snapshot::*;
pub use telemetry::*;
