//! Landmark snapshot store
//!
//! Holds the most recent result of every provider. Providers publish from
//! whatever thread their inference runs on; the frame loop loads a view once
//! per tick. Each slot holds an immutable `Arc` that is swapped wholesale,
//! so a tick sees either the old or the new result, never a mix.

use std::sync::Arc;

use parking_lot::RwLock;
use poise_core::{Detections, Modality, Snapshots};

#[derive(Debug, Default)]
struct Slot {
    latest: Option<Arc<Detections>>,
    /// Number of publications so far
    generation: u64,
}

/// Publication counters for each provider, as seen by one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Generations {
    pub face: u64,
    pub pose: u64,
    pub hands: u64,
}

impl Generations {
    pub fn get(&self, modality: Modality) -> u64 {
        match modality {
            Modality::Face => self.face,
            Modality::Pose => self.pose,
            Modality::Hands => self.hands,
        }
    }

    /// Modalities that published since `earlier`
    pub fn fresh_since(&self, earlier: &Generations) -> Vec<Modality> {
        Modality::all()
            .iter()
            .copied()
            .filter(|m| self.get(*m) > earlier.get(*m))
            .collect()
    }
}

/// A consistent view of the store for one tick
#[derive(Debug, Clone, Default)]
pub struct SnapshotView {
    pub snapshots: Snapshots,
    pub generations: Generations,
}

/// Latest-result store, one slot per provider
#[derive(Debug, Default)]
pub struct SnapshotStore {
    face: RwLock<Slot>,
    pose: RwLock<Slot>,
    hands: RwLock<Slot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, modality: Modality) -> &RwLock<Slot> {
        match modality {
            Modality::Face => &self.face,
            Modality::Pose => &self.pose,
            Modality::Hands => &self.hands,
        }
    }

    /// Replace the latest result of one provider
    pub fn publish(&self, modality: Modality, detections: Detections) {
        let detections = Arc::new(detections);
        let mut slot = self.slot(modality).write();
        slot.latest = Some(detections);
        slot.generation += 1;
    }

    /// Latest result of one provider
    pub fn latest(&self, modality: Modality) -> Option<Arc<Detections>> {
        self.slot(modality).read().latest.clone()
    }

    pub fn generation(&self, modality: Modality) -> u64 {
        self.slot(modality).read().generation
    }

    /// Snapshot every provider's latest result
    pub fn load(&self) -> SnapshotView {
        let mut view = SnapshotView::default();
        for modality in Modality::all() {
            let slot = self.slot(*modality).read();
            if let Some(latest) = &slot.latest {
                match modality {
                    Modality::Face => view.snapshots.face = Some(Arc::clone(latest)),
                    Modality::Pose => view.snapshots.pose = Some(Arc::clone(latest)),
                    Modality::Hands => view.snapshots.hands = Some(Arc::clone(latest)),
                }
            }
            match modality {
                Modality::Face => view.generations.face = slot.generation,
                Modality::Pose => view.generations.pose = slot.generation,
                Modality::Hands => view.generations.hands = slot.generation,
            }
        }
        view
    }

    /// A sink that publishes into this store for one provider
    pub fn sink(self: &Arc<Self>, modality: Modality) -> ResultSink {
        ResultSink {
            modality,
            store: Arc::clone(self),
        }
    }
}

/// Where a provider delivers its results
///
/// Cheap to clone and `Send`, so providers may move it onto their own
/// inference thread.
#[derive(Debug, Clone)]
pub struct ResultSink {
    modality: Modality,
    store: Arc<SnapshotStore>,
}

impl ResultSink {
    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn publish(&self, detections: Detections) {
        tracing::trace!(modality = %self.modality, instances = detections.len(), "result");
        self.store.publish(self.modality, detections);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poise_core::{hand, LandmarkSet};

    #[test]
    fn test_empty_store() {
        let store = SnapshotStore::new();
        let view = store.load();
        assert!(view.snapshots.face.is_none());
        assert_eq!(view.generations, Generations::default());
    }

    #[test]
    fn test_publish_replaces_wholesale() {
        let store = Arc::new(SnapshotStore::new());
        let sink = store.sink(Modality::Hands);

        sink.publish(Detections::new(vec![
            LandmarkSet::filled(hand::POINTS, 0.2, 0.2),
            LandmarkSet::filled(hand::POINTS, 0.8, 0.2),
        ]));
        sink.publish(Detections::single(LandmarkSet::filled(hand::POINTS, 0.5, 0.5)));

        let view = store.load();
        assert_eq!(view.snapshots.hands().len(), 1);
        assert_eq!(view.generations.hands, 2);
        assert_eq!(store.generation(Modality::Face), 0);
    }

    #[test]
    fn test_view_is_stable_after_publish() {
        let store = Arc::new(SnapshotStore::new());
        let sink = store.sink(Modality::Pose);
        sink.publish(Detections::single(LandmarkSet::filled(33, 0.1, 0.1)));

        let view = store.load();
        sink.publish(Detections::none());

        // The loaded view keeps the result it saw
        assert_eq!(view.snapshots.pose().map(LandmarkSet::len), Some(33));
        assert!(store.latest(Modality::Pose).unwrap().is_empty());
    }

    #[test]
    fn test_fresh_since() {
        let store = Arc::new(SnapshotStore::new());
        let before = store.load().generations;
        store.sink(Modality::Face).publish(Detections::none());

        let after = store.load().generations;
        assert_eq!(after.fresh_since(&before), vec![Modality::Face]);
        assert!(after.fresh_since(&after).is_empty());
    }

    #[test]
    fn test_concurrent_publishers() {
        let store = Arc::new(SnapshotStore::new());
        let threads: Vec<_> = (0..4)
            .map(|i| {
                let sink = store.sink(Modality::Hands);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let x = i as f32 / 4.0;
                        sink.publish(Detections::single(LandmarkSet::filled(hand::POINTS, x, x)));
                    }
                })
            })
            .collect();

        for _ in 0..100 {
            let view = store.load();
            // Every landmark of a loaded hand comes from the same publication
            if let Some(hand) = view.snapshots.hands().first() {
                let first = hand.points()[0];
                assert!(hand.points().iter().all(|p| *p == first));
            }
        }
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(store.generation(Modality::Hands), 400);
    }
}
