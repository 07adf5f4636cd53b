//! Landmarks - normalized points produced by external perception models
//!
//! POISE does not detect anything itself. Face mesh, body pose and hand
//! tracking providers hand over fixed-index landmark sequences; the index
//! meaning follows the MediaPipe convention and is owned by the provider.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Face mesh landmark indices (468 mesh points, 478 with iris refinement)
pub mod face_mesh {
    pub const MESH_POINTS: usize = 468;
    pub const REFINED_POINTS: usize = 478;

    pub const NOSE_TIP: usize = 1;

    pub const LEFT_EYE_INNER: usize = 133;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const RIGHT_EYE_OUTER: usize = 263;

    pub const LEFT_IRIS_CENTER: usize = 468;
    pub const RIGHT_IRIS_CENTER: usize = 473;

    pub const LEFT_EYE_UPPER_LID: usize = 159;
    pub const LEFT_EYE_LOWER_LID: usize = 145;
    pub const RIGHT_EYE_UPPER_LID: usize = 386;
    pub const RIGHT_EYE_LOWER_LID: usize = 374;

    pub const UPPER_LIP_INNER: usize = 13;
    pub const LOWER_LIP_INNER: usize = 14;
}

/// Body pose landmark indices (33 points)
pub mod pose {
    pub const POINTS: usize = 33;

    pub const NOSE: usize = 0;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
}

/// Hand landmark indices (21 points per hand)
pub mod hand {
    pub const POINTS: usize = 21;
    pub const MAX_HANDS: usize = 2;

    pub const INDEX_FINGER_TIP: usize = 8;
}

/// Which external provider produced a landmark result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Face,
    Pose,
    Hands,
}

impl Modality {
    /// All modalities in tick order
    pub fn all() -> &'static [Modality] {
        &[Modality::Face, Modality::Pose, Modality::Hands]
    }

    pub fn name(self) -> &'static str {
        match self {
            Modality::Face => "face",
            Modality::Pose => "pose",
            Modality::Hands => "hands",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A normalized point, `x`/`y` in [0, 1] relative to the frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Depth, zero when the provider is 2-D only
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn with_depth(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared planar displacement to another landmark
    #[inline]
    pub fn planar_distance_sq(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Vertical gap to another landmark
    #[inline]
    pub fn vertical_gap(&self, other: &Landmark) -> f32 {
        (self.y - other.y).abs()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Ordered landmark sequence for one detected instance (one face, one body, one hand)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// Build a set of `count` points all at (x, y)
    pub fn filled(count: usize, x: f32, y: f32) -> Self {
        Self::new(vec![Landmark::new(x, y); count])
    }

    /// Landmark at `index`; `None` when the sequence is too short or the point is non-finite
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index).filter(|p| p.is_finite())
    }

    /// Replace the landmark at `index`, ignoring out-of-range indices
    pub fn set(&mut self, index: usize, landmark: Landmark) {
        if let Some(slot) = self.points.get_mut(index) {
            *slot = landmark;
        }
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl From<Vec<Landmark>> for LandmarkSet {
    fn from(points: Vec<Landmark>) -> Self {
        Self::new(points)
    }
}

/// One provider result: zero or more detected instances
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Detections {
    instances: Vec<LandmarkSet>,
}

impl Detections {
    pub fn new(instances: Vec<LandmarkSet>) -> Self {
        Self { instances }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(instance: LandmarkSet) -> Self {
        Self::new(vec![instance])
    }

    /// First detected instance (face and pose run with a single instance)
    pub fn primary(&self) -> Option<&LandmarkSet> {
        self.instances.first()
    }

    pub fn instances(&self) -> &[LandmarkSet] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// The latest result of every provider, as seen by one tick
///
/// Each slot is an immutable, shared result that was replaced wholesale when
/// the provider last emitted. `None` means the provider has not delivered yet.
#[derive(Debug, Clone, Default)]
pub struct Snapshots {
    pub face: Option<Arc<Detections>>,
    pub pose: Option<Arc<Detections>>,
    pub hands: Option<Arc<Detections>>,
}

impl Snapshots {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, modality: Modality) -> Option<&Arc<Detections>> {
        match modality {
            Modality::Face => self.face.as_ref(),
            Modality::Pose => self.pose.as_ref(),
            Modality::Hands => self.hands.as_ref(),
        }
    }

    pub fn set(&mut self, modality: Modality, detections: Detections) {
        let slot = match modality {
            Modality::Face => &mut self.face,
            Modality::Pose => &mut self.pose,
            Modality::Hands => &mut self.hands,
        };
        *slot = Some(Arc::new(detections));
    }

    /// Builder-style variant of [`Snapshots::set`]
    pub fn with(mut self, modality: Modality, detections: Detections) -> Self {
        self.set(modality, detections);
        self
    }

    pub fn face(&self) -> Option<&LandmarkSet> {
        self.face.as_deref().and_then(Detections::primary)
    }

    pub fn pose(&self) -> Option<&LandmarkSet> {
        self.pose.as_deref().and_then(Detections::primary)
    }

    pub fn hands(&self) -> &[LandmarkSet] {
        self.hands
            .as_deref()
            .map(Detections::instances)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_out_of_range() {
        let set = LandmarkSet::filled(10, 0.5, 0.5);
        assert!(set.get(9).is_some());
        assert!(set.get(10).is_none());
    }

    #[test]
    fn test_get_rejects_non_finite() {
        let mut set = LandmarkSet::filled(3, 0.5, 0.5);
        set.set(1, Landmark::new(f32::NAN, 0.5));
        assert!(set.get(1).is_none());
        assert!(set.get(2).is_some());
    }

    #[test]
    fn test_planar_distance() {
        let a = Landmark::new(0.1, 0.2);
        let b = Landmark::with_depth(0.4, 0.6, 9.0);
        assert!((a.planar_distance_sq(&b) - 0.25).abs() < 1e-6);
        assert!((a.vertical_gap(&b) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_snapshots_accessors() {
        let snapshots = Snapshots::empty()
            .with(Modality::Face, Detections::single(LandmarkSet::filled(478, 0.5, 0.5)))
            .with(Modality::Hands, Detections::none());

        assert_eq!(snapshots.face().map(LandmarkSet::len), Some(478));
        assert!(snapshots.pose().is_none());
        assert!(snapshots.hands().is_empty());
        assert!(snapshots.get(Modality::Hands).is_some());
    }
}
