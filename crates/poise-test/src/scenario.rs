//! Scenario runner - the feedback engine on a simulated clock
//!
//! Simulates:
//! - A scripted candidate rendered every tick
//! - A fixed tick interval with no wall-clock dependency
//! - Per-tick visibility of every message

use std::time::Duration;

use poise_core::{FeedbackMessage, SessionTime};
use poise_feedback::{EngineConfig, EngineSummary, FeedbackEngine, TickOutput};

use crate::{Behaviour, Script, SyntheticSubject};

/// What one simulated tick produced
#[derive(Debug, Clone, PartialEq)]
pub struct TickRecord {
    pub now: SessionTime,
    pub behaviour: Behaviour,
    pub emitted: Vec<FeedbackMessage>,
    pub visible: Vec<FeedbackMessage>,
}

/// Simulation result and statistics
#[derive(Debug, Clone, Default)]
pub struct ScenarioResult {
    pub records: Vec<TickRecord>,
    pub summary: EngineSummary,
}

impl ScenarioResult {
    pub fn total_ticks(&self) -> usize {
        self.records.len()
    }

    /// Visible messages at the last tick at or before `t`
    pub fn visible_at(&self, t: SessionTime) -> &[FeedbackMessage] {
        self.records
            .iter()
            .take_while(|r| r.now <= t)
            .last()
            .map(|r| r.visible.as_slice())
            .unwrap_or_default()
    }

    pub fn first_shown(&self, message: FeedbackMessage) -> Option<SessionTime> {
        self.records
            .iter()
            .find(|r| r.visible.contains(&message))
            .map(|r| r.now)
    }

    pub fn last_shown(&self, message: FeedbackMessage) -> Option<SessionTime> {
        self.records
            .iter()
            .rev()
            .find(|r| r.visible.contains(&message))
            .map(|r| r.now)
    }

    /// Last tick whose classifier asked for `message`
    pub fn last_emitted(&self, message: FeedbackMessage) -> Option<SessionTime> {
        self.records
            .iter()
            .rev()
            .find(|r| r.emitted.contains(&message))
            .map(|r| r.now)
    }

    /// First tick after `after` where `message` is hidden
    pub fn hidden_after(&self, message: FeedbackMessage, after: SessionTime) -> Option<SessionTime> {
        self.records
            .iter()
            .find(|r| r.now > after && !r.visible.contains(&message))
            .map(|r| r.now)
    }

    /// Whether `message` is visible on every tick in `[from, to]`
    pub fn visible_throughout(&self, message: FeedbackMessage, from: SessionTime, to: SessionTime) -> bool {
        self.records
            .iter()
            .filter(|r| r.now >= from && r.now <= to)
            .all(|r| r.visible.contains(&message))
    }

    /// Whether `message` never became visible
    pub fn never_shown(&self, message: FeedbackMessage) -> bool {
        self.first_shown(message).is_none()
    }

    /// Ticks with at least one visible message
    pub fn busy_ticks(&self) -> usize {
        self.records.iter().filter(|r| !r.visible.is_empty()).count()
    }
}

/// Drives a [`FeedbackEngine`] with a scripted subject
pub struct ScenarioRunner {
    engine: FeedbackEngine,
    subject: SyntheticSubject,
    script: Script,
    tick_interval: Duration,
    now: SessionTime,
}

impl ScenarioRunner {
    pub fn new(script: Script, seed: u64) -> Self {
        Self::with_config(script, seed, EngineConfig::default())
    }

    pub fn with_config(script: Script, seed: u64, config: EngineConfig) -> Self {
        Self {
            engine: FeedbackEngine::with_config(config),
            subject: SyntheticSubject::new(seed),
            script,
            tick_interval: Duration::from_millis(33),
            now: SessionTime::ZERO,
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn now(&self) -> SessionTime {
        self.now
    }

    pub fn engine(&self) -> &FeedbackEngine {
        &self.engine
    }

    /// Execute one simulated tick, then advance the clock
    pub fn step(&mut self) -> TickOutput {
        let behaviour = self.script.behaviour_at(self.now);
        self.subject.set_behaviour(behaviour);

        let snapshots = self.subject.snapshots();
        let output = self.engine.tick(&snapshots, self.now);
        self.now = self.now + self.tick_interval;
        output
    }

    /// Run for a duration
    pub fn run(&mut self, duration: Duration) -> ScenarioResult {
        let ticks = duration.as_micros() / self.tick_interval.as_micros().max(1);
        let mut result = ScenarioResult::default();

        for _ in 0..ticks {
            let behaviour = self.script.behaviour_at(self.now);
            let output = self.step();
            result.records.push(TickRecord {
                now: output.now,
                behaviour,
                emitted: output.emitted.into_iter().collect(),
                visible: output.visible,
            });
        }

        result.summary = self.engine.summary();
        result
    }
}

/// Predefined scenarios
pub mod scenarios {
    use super::*;

    /// A candidate who does everything right
    pub fn composed(seed: u64) -> ScenarioRunner {
        ScenarioRunner::new(Script::constant(Behaviour::Centered), seed)
    }

    /// Leans for five seconds, then straightens up
    pub fn leaning_then_upright(seed: u64) -> ScenarioRunner {
        ScenarioRunner::new(
            Script::new()
                .then(Duration::ZERO, Behaviour::Leaning)
                .then(Duration::from_secs(5), Behaviour::Centered),
            seed,
        )
    }

    /// The twelve-second mock interview
    pub fn interview(seed: u64) -> ScenarioRunner {
        ScenarioRunner::new(Script::interview(), seed)
    }

    /// Blinks far too often
    pub fn nervous(seed: u64) -> ScenarioRunner {
        ScenarioRunner::new(Script::constant(Behaviour::Blinking), seed)
    }

    /// Keeps yawning
    pub fn drowsy(seed: u64) -> ScenarioRunner {
        ScenarioRunner::new(Script::constant(Behaviour::Yawning), seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ms(ms: i64) -> SessionTime {
        SessionTime::from_millis(ms)
    }

    #[test]
    fn test_composed_candidate_is_silent() {
        let mut runner = scenarios::composed(1);
        let result = runner.run(Duration::from_secs(10));

        assert_eq!(result.total_ticks(), 303);
        assert_eq!(result.busy_ticks(), 0);
        assert_eq!(result.summary.total_blinks, 0);
    }

    #[test]
    fn test_leaning_decays_after_correction() {
        let mut runner = scenarios::leaning_then_upright(2);
        let result = runner.run(Duration::from_secs(10));
        let leaning = FeedbackMessage::Leaning;

        let last_emit = result.last_emitted(leaning).unwrap();
        assert!(last_emit < ms(5000));
        assert!(result.visible_throughout(leaning, ms(0), last_emit));

        let hidden = result.hidden_after(leaning, last_emit).unwrap();
        let gap = hidden - last_emit;
        assert!(gap >= Duration::from_millis(3000));
        assert!(gap < Duration::from_millis(3033));
        assert_eq!(result.summary.activations.get(&leaning), Some(&1));
    }

    #[test]
    fn test_interview_shows_each_issue() {
        let mut runner = scenarios::interview(3);
        let result = runner.run(Duration::from_secs(12));

        let leaning = result.first_shown(FeedbackMessage::Leaning).unwrap();
        assert!(leaning >= ms(2000) && leaning < ms(2100));

        let looking = result.first_shown(FeedbackMessage::LookingLeft).unwrap();
        assert!(looking >= ms(5000) && looking < ms(5100));

        let hands = result.first_shown(FeedbackMessage::ExcessiveHandMovement).unwrap();
        assert!(hands >= ms(8000) && hands < ms(8100));

        // Messages outlive their cause by the decay period
        assert!(result.visible_at(ms(6500)).contains(&FeedbackMessage::LookingLeft));
        assert!(!result.visible_at(ms(10_500)).contains(&FeedbackMessage::LookingLeft));

        assert!(result.never_shown(FeedbackMessage::Yawning));
        assert!(result.never_shown(FeedbackMessage::HighBlinkRate));
        assert!(result.visible_at(ms(1900)).is_empty());
    }

    #[test]
    fn test_nervous_candidate_triggers_blink_rate() {
        let mut runner = scenarios::nervous(4);
        let result = runner.run(Duration::from_secs(10));

        let shown = result.first_shown(FeedbackMessage::HighBlinkRate).unwrap();
        // One blink per 330ms once debounced; the 21st lands a little after 6.6s
        assert!(shown > ms(6000) && shown < ms(7500));
        assert!(result.summary.total_blinks >= 21);
    }

    #[test]
    fn test_drowsy_candidate_triggers_yawning() {
        let mut runner = scenarios::drowsy(5);
        let result = runner.run(Duration::from_secs(5));

        // Third yawn starts on frame 40
        assert_eq!(result.first_shown(FeedbackMessage::Yawning), Some(ms(40 * 33)));
        assert!(result.summary.yawns >= 3);
    }

    #[test]
    fn test_absent_candidate_clears_display() {
        let script = Script::new()
            .then(Duration::ZERO, Behaviour::OffCenter)
            .then(Duration::from_secs(1), Behaviour::Absent);
        let mut runner = ScenarioRunner::new(script, 6);
        let result = runner.run(Duration::from_secs(6));

        assert!(result.visible_at(ms(500)).contains(&FeedbackMessage::MoveRight));
        assert!(result.visible_at(ms(5000)).is_empty());
    }

    #[test]
    fn test_custom_tick_interval() {
        let mut runner = scenarios::composed(1).with_tick_interval(Duration::from_millis(16));
        let result = runner.run(Duration::from_secs(1));
        assert_eq!(result.total_ticks(), 62);
        assert_eq!(runner.now(), ms(62 * 16));
    }

    proptest! {
        #[test]
        fn prop_scenarios_are_deterministic(seed in 0u64..1000) {
            let a = scenarios::interview(seed).run(Duration::from_secs(3));
            let b = scenarios::interview(seed).run(Duration::from_secs(3));
            prop_assert_eq!(a.records, b.records);
        }
    }
}
