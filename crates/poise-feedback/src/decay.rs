//! Message decay store
//!
//! Each message is either absent or active with an expiry time. A message
//! seen this frame is (re-)armed to `now + ttl`; a message whose expiry has
//! been reached is dropped. The result is a sliding highlight: a condition
//! that flickers within the TTL stays on screen, one gone for a full TTL
//! disappears.
//!
//! INVARIANT: a message is visible at `now` only while `now < expiry`.

use std::collections::BTreeMap;
use std::time::Duration;

use poise_core::{duration_format, FeedbackMessage, PoiseError, PoiseResult, SessionTime};
use serde::{Deserialize, Serialize};

/// Decay store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// How long a message stays visible after it was last emitted
    #[serde(with = "duration_format")]
    pub ttl: Duration,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_millis(3000),
        }
    }
}

impl DecayConfig {
    pub fn validate(&self) -> PoiseResult<()> {
        PoiseError::check_duration("ttl", self.ttl)
    }
}

/// What changed during one [`DecayStore::advance`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecayUpdate {
    /// Messages that went from absent to visible
    pub activated: Vec<FeedbackMessage>,
    /// Messages whose TTL ran out
    pub expired: Vec<FeedbackMessage>,
}

/// Time-decayed set of active messages
#[derive(Debug, Clone)]
pub struct DecayStore {
    ttl: Duration,
    entries: BTreeMap<FeedbackMessage, SessionTime>,
}

impl DecayStore {
    pub fn new() -> Self {
        Self::with_config(DecayConfig::default())
    }

    pub fn with_config(config: DecayConfig) -> Self {
        Self {
            ttl: config.ttl,
            entries: BTreeMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or re-arm every message to `now + ttl`
    ///
    /// Returns the messages that were not tracked before.
    pub fn refresh<I>(&mut self, messages: I, now: SessionTime) -> Vec<FeedbackMessage>
    where
        I: IntoIterator<Item = FeedbackMessage>,
    {
        let expiry = now + self.ttl;
        messages
            .into_iter()
            .filter(|message| self.entries.insert(*message, expiry).is_none())
            .collect()
    }

    /// Drop every message whose expiry has been reached; returns the dropped ones
    pub fn prune(&mut self, now: SessionTime) -> Vec<FeedbackMessage> {
        let expired: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, expiry)| **expiry <= now)
            .map(|(message, _)| *message)
            .collect();

        for message in &expired {
            self.entries.remove(message);
        }
        expired
    }

    /// One frame: refresh with this frame's messages, then prune
    pub fn advance<I>(&mut self, emitted: I, now: SessionTime) -> DecayUpdate
    where
        I: IntoIterator<Item = FeedbackMessage>,
    {
        let activated = self.refresh(emitted, now);
        let expired = self.prune(now);
        DecayUpdate { activated, expired }
    }

    /// Messages surviving the last prune, in catalog order
    pub fn active(&self) -> Vec<FeedbackMessage> {
        self.entries.keys().copied().collect()
    }

    /// Messages still visible at `now`, without mutating the store
    pub fn active_at(&self, now: SessionTime) -> Vec<FeedbackMessage> {
        self.entries
            .iter()
            .filter(|(_, expiry)| now < **expiry)
            .map(|(message, _)| *message)
            .collect()
    }

    pub fn is_active(&self, message: FeedbackMessage) -> bool {
        self.entries.contains_key(&message)
    }

    pub fn expiry_of(&self, message: FeedbackMessage) -> Option<SessionTime> {
        self.entries.get(&message).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for DecayStore {
    fn default() -> Self {
        Self::new()
    }
}
