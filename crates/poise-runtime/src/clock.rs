//! Session clock

use tokio::time::Instant;

use poise_core::SessionTime;

/// Monotonic session clock
/// INVARIANT: successive readings never decrease
///
/// Built on Tokio's clock so paused-time tests drive it deterministically.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    origin: Instant,
}

impl SessionClock {
    /// Start a clock at zero
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Current session time
    pub fn now(&self) -> SessionTime {
        let elapsed = Instant::now().duration_since(self.origin);
        SessionTime::from_micros(elapsed.as_micros().min(i64::MAX as u128) as i64)
    }

    /// The instant the clock started
    pub fn origin(&self) -> Instant {
        self.origin
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::start()
    }
}
