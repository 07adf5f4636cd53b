//! End-to-end helpers - a real session driven by scripted providers

use std::time::Duration;

use poise_core::Modality;
use poise_runtime::{Session, SessionConfig, SessionReport, SessionResult};

use crate::{Script, ScriptedFrameSource, SourceProbe};

/// Build a session with a scripted camera and all three scripted providers
pub fn scripted_session(config: SessionConfig, script: Script, seed: u64) -> (Session, SourceProbe) {
    let source = ScriptedFrameSource::new(script, seed);
    let probe = source.probe();
    let face = source.provider(Modality::Face);
    let pose = source.provider(Modality::Pose);
    let hands = source.provider(Modality::Hands);

    let session = Session::new(config, source)
        .with_provider(face)
        .with_provider(pose)
        .with_provider(hands);
    (session, probe)
}

/// Run a scripted session for `duration` and return its report
///
/// Must be called inside a Tokio runtime. Under paused time the run is
/// deterministic per seed.
pub async fn run_scripted(
    config: SessionConfig,
    script: Script,
    seed: u64,
    duration: Duration,
) -> SessionResult<SessionReport> {
    let (session, _probe) = scripted_session(config, script, seed);
    let handle = session.start()?;
    tokio::time::sleep(duration).await;
    handle.stop().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Behaviour, ScriptedProvider};
    use poise_core::FeedbackMessage;
    use poise_runtime::SessionError;

    #[tokio::test(start_paused = true)]
    async fn test_interview_through_session() {
        let report = run_scripted(
            SessionConfig::default(),
            Script::interview(),
            11,
            Duration::from_secs(12),
        )
        .await
        .unwrap();

        assert!(report.stats.ticks >= 700);
        assert_eq!(report.stats.skipped_ticks, 0);
        assert_eq!(report.activations(FeedbackMessage::Leaning), 1);
        assert_eq!(report.activations(FeedbackMessage::LookingLeft), 1);
        assert!(report.activations(FeedbackMessage::ExcessiveHandMovement) >= 1);
        assert_eq!(report.activations(FeedbackMessage::Yawning), 0);
        assert_eq!(report.total_blinks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_display_follows_subject() {
        let script = Script::constant(Behaviour::OffCenter);
        let (session, probe) = scripted_session(SessionConfig::default(), script, 12);
        let handle = session.start().unwrap();
        assert_eq!(probe.opened(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let frame = handle.latest();
        assert_eq!(frame.messages, vec![FeedbackMessage::MoveRight]);
        assert_eq!(frame.readout.nose_x.map(|x| (x * 10.0).round()), Some(2.0));
        assert_eq!(frame.snapshots.hands().len(), 2);

        handle.stop().await.unwrap();
        assert_eq!(probe.released(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flaky_hand_model_skips_ticks() {
        let source = ScriptedFrameSource::new(Script::constant(Behaviour::Leaning), 13);
        let hands = source.provider(Modality::Hands).failing_on([2, 3, 10]);
        let pose = source.provider(Modality::Pose);

        let handle = Session::new(SessionConfig::default(), source)
            .with_provider(pose)
            .with_provider(hands)
            .start()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        let report = handle.stop().await.unwrap();

        assert_eq!(report.stats.skipped_ticks, 3);
        assert_eq!(report.stats.provider_failures, 3);
        assert_eq!(report.activations(FeedbackMessage::Leaning), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_face_model_still_tracks() {
        let source = ScriptedFrameSource::new(Script::constant(Behaviour::LookingAway), 14);
        let face: ScriptedProvider = source.provider(Modality::Face).every(3);

        let handle = Session::new(SessionConfig::default(), source)
            .with_provider(face)
            .start()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        // Stale results still drive every tick
        let frame = handle.latest();
        assert_eq!(frame.messages, vec![FeedbackMessage::LookingLeft]);
        let report = handle.stop().await.unwrap();
        assert_eq!(report.stats.frames_submitted, report.stats.ticks);
    }

    #[tokio::test]
    async fn test_denied_camera() {
        let source = ScriptedFrameSource::new(Script::new(), 15).denied();
        let probe = source.probe();
        let face = source.provider(Modality::Face);

        let result = Session::new(SessionConfig::default(), source)
            .with_provider(face)
            .start();
        assert!(matches!(result, Err(SessionError::Source(_))));
        assert_eq!(probe.released(), 0);
    }

    #[tokio::test]
    async fn test_rejected_options_release_camera() {
        let source = ScriptedFrameSource::new(Script::new(), 16);
        let probe = source.probe();
        let pose = source.provider(Modality::Pose).rejecting_options();

        let result = Session::new(SessionConfig::default(), source)
            .with_provider(pose)
            .start();
        assert!(matches!(result, Err(SessionError::Provider(_))));
        assert_eq!(probe.opened(), 1);
        assert_eq!(probe.released(), 1);
    }
}
