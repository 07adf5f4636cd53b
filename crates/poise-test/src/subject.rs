//! Synthetic subject - renders provider-shaped landmarks for a behaviour
//!
//! The geometry is deliberately exaggerated: every behaviour lands well
//! clear of the extractor thresholds, and the seeded jitter stays far below
//! them, so scenarios are deterministic per seed.

use poise_core::{face_mesh, hand, pose, Detections, Landmark, LandmarkSet, Modality, Snapshots};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Eyelid gap of an open eye
pub const EYE_OPEN_GAP: f32 = 0.30;
/// Eyelid gap of a closed eye
pub const EYE_CLOSED_GAP: f32 = 0.02;
/// Inner-lip gap of a closed mouth
pub const MOUTH_CLOSED_GAP: f32 = 0.01;
/// Inner-lip gap during a yawn
pub const MOUTH_YAWN_GAP: f32 = 0.10;

/// Frames per yawn cycle (half open, half closed)
const YAWN_CYCLE: u64 = 20;

/// What the candidate is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Behaviour {
    /// Upright, centred, looking at the camera
    Centered,
    /// Eyes turned to the left
    LookingAway,
    /// Eyes turned to the right
    LookingRight,
    /// Head near the left edge of the frame
    OffCenter,
    /// One shoulder dropped
    Leaning,
    /// Hands moving back and forth every frame
    Fidgeting,
    /// Mouth opening and closing in long cycles
    Yawning,
    /// Eyes closing every other frame
    Blinking,
    /// Nobody in frame
    Absent,
}

impl Behaviour {
    pub fn all() -> &'static [Behaviour] {
        &[
            Behaviour::Centered,
            Behaviour::LookingAway,
            Behaviour::LookingRight,
            Behaviour::OffCenter,
            Behaviour::Leaning,
            Behaviour::Fidgeting,
            Behaviour::Yawning,
            Behaviour::Blinking,
            Behaviour::Absent,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Behaviour::Centered => "centered",
            Behaviour::LookingAway => "looking away",
            Behaviour::LookingRight => "looking right",
            Behaviour::OffCenter => "off center",
            Behaviour::Leaning => "leaning",
            Behaviour::Fidgeting => "fidgeting",
            Behaviour::Yawning => "yawning",
            Behaviour::Blinking => "blinking",
            Behaviour::Absent => "absent",
        }
    }
}

/// One rendered frame of the subject, per provider
#[derive(Debug, Clone, Default)]
pub struct RenderedFrame {
    pub face: Detections,
    pub pose: Detections,
    pub hands: Detections,
}

impl RenderedFrame {
    pub fn get(&self, modality: Modality) -> &Detections {
        match modality {
            Modality::Face => &self.face,
            Modality::Pose => &self.pose,
            Modality::Hands => &self.hands,
        }
    }

    /// All three results as a snapshot set
    pub fn to_snapshots(&self) -> Snapshots {
        Snapshots::empty()
            .with(Modality::Face, self.face.clone())
            .with(Modality::Pose, self.pose.clone())
            .with(Modality::Hands, self.hands.clone())
    }
}

/// A synthetic interview candidate
pub struct SyntheticSubject {
    rng: StdRng,
    jitter: f32,
    behaviour: Behaviour,
    /// Frames rendered so far
    phase: u64,
}

impl SyntheticSubject {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            jitter: 0.001,
            behaviour: Behaviour::Centered,
            phase: 0,
        }
    }

    /// Per-coordinate jitter amplitude
    pub fn with_jitter(mut self, jitter: f32) -> Self {
        self.jitter = jitter.abs();
        self
    }

    pub fn behaviour(&self) -> Behaviour {
        self.behaviour
    }

    pub fn set_behaviour(&mut self, behaviour: Behaviour) {
        self.behaviour = behaviour;
    }

    pub fn frames_rendered(&self) -> u64 {
        self.phase
    }

    /// Render the next frame
    pub fn render(&mut self) -> RenderedFrame {
        let frame = if self.behaviour == Behaviour::Absent {
            RenderedFrame::default()
        } else {
            RenderedFrame {
                face: Detections::single(self.face()),
                pose: Detections::single(self.body()),
                hands: Detections::new(self.hands()),
            }
        };
        self.phase += 1;
        frame
    }

    /// Render the next frame as snapshots
    pub fn snapshots(&mut self) -> Snapshots {
        self.render().to_snapshots()
    }

    fn noise(&mut self) -> f32 {
        if self.jitter > 0.0 {
            self.rng.gen_range(-self.jitter..=self.jitter)
        } else {
            0.0
        }
    }

    fn point(&mut self, x: f32, y: f32) -> Landmark {
        let dx = self.noise();
        let dy = self.noise();
        Landmark::new(x + dx, y + dy)
    }

    fn head_x(&self) -> f32 {
        match self.behaviour {
            Behaviour::OffCenter => 0.2,
            _ => 0.5,
        }
    }

    fn face(&mut self) -> LandmarkSet {
        let cx = self.head_x();
        let gaze = match self.behaviour {
            Behaviour::LookingAway => 0.15,
            Behaviour::LookingRight => 0.85,
            _ => 0.5,
        };
        let eye_gap = if self.behaviour == Behaviour::Blinking && self.phase % 2 == 1 {
            EYE_CLOSED_GAP
        } else {
            EYE_OPEN_GAP
        };
        let mouth_gap = if self.behaviour == Behaviour::Yawning && self.phase % YAWN_CYCLE < YAWN_CYCLE / 2 {
            MOUTH_YAWN_GAP
        } else {
            MOUTH_CLOSED_GAP
        };

        let mut face = LandmarkSet::filled(face_mesh::REFINED_POINTS, cx, 0.5);
        let eye_y = 0.4;

        // Eye corners span 0.1 each; the iris sits `gaze` of the way from inner to outer
        let eyes = [
            (
                cx - 0.05,
                cx - 0.15,
                face_mesh::LEFT_EYE_INNER,
                face_mesh::LEFT_EYE_OUTER,
                face_mesh::LEFT_IRIS_CENTER,
                face_mesh::LEFT_EYE_UPPER_LID,
                face_mesh::LEFT_EYE_LOWER_LID,
            ),
            (
                cx + 0.05,
                cx + 0.15,
                face_mesh::RIGHT_EYE_INNER,
                face_mesh::RIGHT_EYE_OUTER,
                face_mesh::RIGHT_IRIS_CENTER,
                face_mesh::RIGHT_EYE_UPPER_LID,
                face_mesh::RIGHT_EYE_LOWER_LID,
            ),
        ];
        for (inner_x, outer_x, inner, outer, iris, upper, lower) in eyes {
            let iris_x = inner_x + (outer_x - inner_x) * gaze;
            let mid_x = (inner_x + outer_x) / 2.0;
            let p = self.point(inner_x, eye_y);
            face.set(inner, p);
            let p = self.point(outer_x, eye_y);
            face.set(outer, p);
            let p = self.point(iris_x, eye_y);
            face.set(iris, p);
            let p = self.point(mid_x, eye_y - eye_gap / 2.0);
            face.set(upper, p);
            let p = self.point(mid_x, eye_y + eye_gap / 2.0);
            face.set(lower, p);
        }

        let p = self.point(cx, 0.5);
        face.set(face_mesh::NOSE_TIP, p);
        let p = self.point(cx, 0.65 - mouth_gap / 2.0);
        face.set(face_mesh::UPPER_LIP_INNER, p);
        let p = self.point(cx, 0.65 + mouth_gap / 2.0);
        face.set(face_mesh::LOWER_LIP_INNER, p);
        face
    }

    fn body(&mut self) -> LandmarkSet {
        let cx = self.head_x();
        let tilt = if self.behaviour == Behaviour::Leaning { 0.15 } else { 0.0 };

        let mut body = LandmarkSet::filled(pose::POINTS, cx, 0.7);
        let p = self.point(cx, 0.3);
        body.set(pose::NOSE, p);
        let p = self.point(cx + 0.15, 0.55 - tilt / 2.0);
        body.set(pose::LEFT_SHOULDER, p);
        let p = self.point(cx - 0.15, 0.55 + tilt / 2.0);
        body.set(pose::RIGHT_SHOULDER, p);
        body
    }

    fn hands(&mut self) -> Vec<LandmarkSet> {
        let swing = match self.behaviour {
            Behaviour::Fidgeting if self.phase % 2 == 0 => 0.03,
            Behaviour::Fidgeting => -0.03,
            _ => 0.0,
        };

        [0.3, 0.7]
            .into_iter()
            .map(|wrist_x| {
                let points = (0..hand::POINTS)
                    .map(|i| {
                        let spread = i as f32 * 0.004;
                        self.point(wrist_x + spread + swing, 0.85 - spread)
                    })
                    .collect();
                LandmarkSet::new(points)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poise_feedback::FeedbackEngine;
    use poise_core::{FeedbackMessage, SessionTime};

    #[test]
    fn test_same_seed_same_landmarks() {
        let mut a = SyntheticSubject::new(7);
        let mut b = SyntheticSubject::new(7);
        for _ in 0..5 {
            let fa = a.render();
            let fb = b.render();
            assert_eq!(fa.face, fb.face);
            assert_eq!(fa.hands, fb.hands);
        }
    }

    #[test]
    fn test_absent_renders_no_instances() {
        let mut subject = SyntheticSubject::new(1);
        subject.set_behaviour(Behaviour::Absent);
        let frame = subject.render();
        assert!(frame.face.is_empty());
        assert!(frame.pose.is_empty());
        assert!(frame.hands.is_empty());
    }

    #[test]
    fn test_shapes_match_providers() {
        let mut subject = SyntheticSubject::new(1);
        let snapshots = subject.snapshots();
        assert_eq!(snapshots.face().map(LandmarkSet::len), Some(face_mesh::REFINED_POINTS));
        assert_eq!(snapshots.pose().map(LandmarkSet::len), Some(pose::POINTS));
        assert_eq!(snapshots.hands().len(), hand::MAX_HANDS);
    }

    #[test]
    fn test_single_frame_behaviours() {
        let cases = [
            (Behaviour::Centered, None),
            (Behaviour::LookingAway, Some(FeedbackMessage::LookingLeft)),
            (Behaviour::LookingRight, Some(FeedbackMessage::LookingRight)),
            (Behaviour::OffCenter, Some(FeedbackMessage::MoveRight)),
            (Behaviour::Leaning, Some(FeedbackMessage::Leaning)),
        ];

        for (behaviour, expected) in cases {
            let mut subject = SyntheticSubject::new(3);
            subject.set_behaviour(behaviour);
            let mut engine = FeedbackEngine::new();
            let output = engine.tick(&subject.snapshots(), SessionTime::ZERO);
            let emitted: Vec<_> = output.emitted.into_iter().collect();
            assert_eq!(emitted, expected.into_iter().collect::<Vec<_>>(), "{}", behaviour.name());
        }
    }

    #[test]
    fn test_fidgeting_moves_hands() {
        let mut subject = SyntheticSubject::new(3);
        subject.set_behaviour(Behaviour::Fidgeting);
        let mut engine = FeedbackEngine::new();

        engine.tick(&subject.snapshots(), SessionTime::ZERO);
        let output = engine.tick(&subject.snapshots(), SessionTime::from_millis(33));
        assert!(output.emitted.contains(&FeedbackMessage::ExcessiveHandMovement));
    }

    #[test]
    fn test_still_hands_stay_quiet() {
        let mut subject = SyntheticSubject::new(3);
        let mut engine = FeedbackEngine::new();

        for i in 0..30 {
            let output = engine.tick(&subject.snapshots(), SessionTime::from_millis(i * 33));
            assert!(output.emitted.is_empty(), "tick {}", i);
        }
    }
}
