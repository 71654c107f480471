use cadence_common::{EntityId, EntityState, EntityTransform, TypeKey};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// The world collaborator's view of one live entity, read only during the
/// extraction pass on the simulation thread.
pub trait SourceEntity {
    fn id(&self) -> EntityId;
    fn uuid(&self) -> Uuid;
    fn type_key(&self) -> &TypeKey;
    fn state(&self) -> &EntityState;
}

/// A pooled, reusable copy of one entity's render-relevant state.
///
/// Overwritten in place when an entity is updated again within a pass; holds
/// no references into the live entity it was copied from.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub uuid: Uuid,
    pub type_key: TypeKey,
    pub partial_ticks: f32,
    pub current: EntityTransform,
    pub previous: EntityTransform,
}

impl EntitySnapshot {
    fn from_source<E: SourceEntity + ?Sized>(entity: &E, partial_ticks: f32) -> Self {
        let state = entity.state();
        Self {
            id: entity.id(),
            uuid: entity.uuid(),
            type_key: entity.type_key().clone(),
            partial_ticks,
            current: state.current,
            previous: state.previous,
        }
    }

    fn overwrite_from<E: SourceEntity + ?Sized>(&mut self, entity: &E, partial_ticks: f32) {
        let state = entity.state();
        self.id = entity.id();
        self.uuid = entity.uuid();
        self.type_key.0.clone_from(&entity.type_key().0);
        self.partial_ticks = partial_ticks;
        self.current = state.current;
        self.previous = state.previous;
    }

    /// The transform this snapshot should be drawn at.
    pub fn interpolated(&self) -> EntityTransform {
        EntityState {
            current: self.current,
            previous: self.previous,
        }
        .interpolate(self.partial_ticks)
    }
}

pub type SnapshotMap = HashMap<EntityId, EntitySnapshot>;

struct Shared {
    presented: Mutex<Arc<SnapshotMap>>,
}

/// Writer half of the double buffer. Owned by the simulation thread.
///
/// Two maps cycle through the roles of *active* (being written this pass)
/// and *presented* (read by the render thread). `publish` swaps them under a
/// single O(1) lock; a previously presented map is recycled as the next
/// active buffer once the render thread has released it, cleared but with
/// its allocation kept, so maps are reused rather than reallocated every
/// tick.
///
/// A single shared mutable map read by one thread while written by another
/// is a data race; this type exists so that variant cannot be expressed.
pub struct SnapshotPool {
    active: SnapshotMap,
    spare: Option<SnapshotMap>,
    seen: HashSet<EntityId>,
    shared: Arc<Shared>,
}

impl SnapshotPool {
    pub fn new() -> Self {
        Self {
            active: SnapshotMap::new(),
            spare: None,
            seen: HashSet::new(),
            shared: Arc::new(Shared {
                presented: Mutex::new(Arc::new(SnapshotMap::new())),
            }),
        }
    }

    /// A cloneable read handle for the render thread.
    pub fn view(&self) -> SnapshotView {
        SnapshotView {
            shared: self.shared.clone(),
        }
    }

    /// Get-or-create the snapshot for `entity` and overwrite it with the
    /// entity's current identity, transforms, and `partial_ticks`.
    pub fn update_snapshot<E: SourceEntity + ?Sized>(&mut self, entity: &E, partial_ticks: f32) {
        match self.active.entry(entity.id()) {
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                slot.get_mut().overwrite_from(entity, partial_ticks);
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(EntitySnapshot::from_source(entity, partial_ticks));
            }
        }
    }

    /// Evict the snapshot for a removed entity.
    pub fn remove_snapshot(&mut self, id: EntityId) -> bool {
        self.active.remove(&id).is_some()
    }

    /// Run a whole extraction pass: update a snapshot per live entity and
    /// evict ids not seen this pass. Does not publish.
    pub fn extract<'a, E, I>(&mut self, entities: I, partial_ticks: f32)
    where
        E: SourceEntity + 'a + ?Sized,
        I: IntoIterator<Item = &'a E>,
    {
        self.seen.clear();
        // Pull `seen` out so updating can borrow `self` mutably in the loop.
        let mut seen = std::mem::take(&mut self.seen);
        for entity in entities {
            seen.insert(entity.id());
            self.update_snapshot(entity, partial_ticks);
        }
        self.active.retain(|id, _| seen.contains(id));
        self.seen = seen;
    }

    /// Swap the active map into the presented slot. One short critical
    /// section; the simulation thread never waits for readers.
    pub fn publish(&mut self) {
        let next_active = self.spare.take().unwrap_or_default();
        let outgoing = Arc::new(std::mem::replace(&mut self.active, next_active));

        let released = {
            let mut presented = self
                .shared
                .presented
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::replace(&mut *presented, outgoing)
        };

        // Recycle the old presented map if no reader still holds it. It must
        // start empty: stale entries would resurrect entities evicted since
        // that map was last active.
        if let Ok(mut map) = Arc::try_unwrap(released) {
            map.clear();
            self.spare = Some(map);
        }
    }

    /// Number of snapshots in the active (unpublished) buffer.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

impl Default for SnapshotPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader half of the double buffer. `Clone + Send`; hand one to the render
/// thread.
#[derive(Clone)]
pub struct SnapshotView {
    shared: Arc<Shared>,
}

impl SnapshotView {
    /// The most recently published snapshot map. Clones an `Arc` under a
    /// short lock; iteration afterwards is lock-free and never observes a
    /// partially written pass.
    pub fn latest(&self) -> Arc<SnapshotMap> {
        self.shared
            .presented
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    struct TestEntity {
        id: EntityId,
        uuid: Uuid,
        type_key: TypeKey,
        state: EntityState,
    }

    impl TestEntity {
        fn new(id: u32, x: f32) -> Self {
            let mut state = EntityState::default();
            state.current.position = Vec3::new(x, 0.0, 0.0);
            Self {
                id: EntityId(id),
                uuid: Uuid::new_v4(),
                type_key: TypeKey::new("creature/wolf"),
                state,
            }
        }
    }

    impl SourceEntity for TestEntity {
        fn id(&self) -> EntityId {
            self.id
        }
        fn uuid(&self) -> Uuid {
            self.uuid
        }
        fn type_key(&self) -> &TypeKey {
            &self.type_key
        }
        fn state(&self) -> &EntityState {
            &self.state
        }
    }

    #[test]
    fn update_creates_then_overwrites() {
        let mut pool = SnapshotPool::new();
        let mut entity = TestEntity::new(1, 1.0);

        pool.update_snapshot(&entity, 0.25);
        assert_eq!(pool.len(), 1);

        entity.state.begin_tick();
        entity.state.current.position.x = 5.0;
        pool.update_snapshot(&entity, 0.75);

        pool.publish();
        let view = pool.view();
        let map = view.latest();
        let snap = &map[&EntityId(1)];
        assert_eq!(snap.partial_ticks, 0.75);
        assert_eq!(snap.current.position.x, 5.0);
        assert_eq!(snap.previous.position.x, 1.0);
        assert_eq!(snap.type_key.as_str(), "creature/wolf");
    }

    #[test]
    fn remove_evicts() {
        let mut pool = SnapshotPool::new();
        let entity = TestEntity::new(1, 0.0);
        pool.update_snapshot(&entity, 0.0);
        assert!(pool.remove_snapshot(EntityId(1)));
        assert!(!pool.remove_snapshot(EntityId(1)));
        assert!(pool.is_empty());
    }

    #[test]
    fn extract_evicts_entities_not_seen() {
        let mut pool = SnapshotPool::new();
        let a = TestEntity::new(1, 0.0);
        let b = TestEntity::new(2, 0.0);
        pool.extract([&a, &b], 0.0);
        assert_eq!(pool.len(), 2);

        pool.extract([&a], 0.5);
        assert_eq!(pool.len(), 1);
        pool.publish();
        assert!(pool.view().latest().contains_key(&EntityId(1)));
        assert!(!pool.view().latest().contains_key(&EntityId(2)));
    }

    #[test]
    fn view_before_first_publish_is_empty() {
        let pool = SnapshotPool::new();
        assert!(pool.view().latest().is_empty());
    }

    #[test]
    fn reader_keeps_old_map_across_publish() {
        let mut pool = SnapshotPool::new();
        let entity = TestEntity::new(1, 1.0);
        pool.update_snapshot(&entity, 0.0);
        pool.publish();

        let view = pool.view();
        let held = view.latest();
        assert_eq!(held[&EntityId(1)].current.position.x, 1.0);

        // Writer publishes an empty pass; the held map is unaffected.
        pool.extract(std::iter::empty::<&TestEntity>(), 0.0);
        pool.publish();
        assert_eq!(held[&EntityId(1)].current.position.x, 1.0);
        assert!(view.latest().is_empty());
    }

    #[test]
    fn removed_entity_never_resurfaces_from_a_recycled_buffer() {
        let mut pool = SnapshotPool::new();
        let a = TestEntity::new(1, 0.0);
        let b = TestEntity::new(2, 0.0);
        pool.update_snapshot(&a, 0.0);
        pool.update_snapshot(&b, 0.0);
        pool.publish();

        pool.update_snapshot(&a, 0.1);
        pool.update_snapshot(&b, 0.1);
        assert!(pool.remove_snapshot(EntityId(2)));
        pool.publish();

        // The third pass updates only entity 1. Its active buffer is the
        // recycled map that held both entities two passes ago; entity 2 must
        // not ride back in with stale data.
        pool.update_snapshot(&a, 0.2);
        pool.publish();
        let map = pool.view().latest();
        assert!(map.contains_key(&EntityId(1)));
        assert!(!map.contains_key(&EntityId(2)));
    }

    #[test]
    fn buffer_is_recycled_when_reader_releases() {
        let mut pool = SnapshotPool::new();
        let entity = TestEntity::new(1, 1.0);
        pool.update_snapshot(&entity, 0.0);
        pool.publish();
        // No reader holds the old presented map, so the second publish
        // recycles it.
        pool.update_snapshot(&entity, 0.5);
        pool.publish();
        assert!(pool.spare.is_some());
    }

    #[test]
    fn readers_never_observe_a_torn_pass() {
        // Writer publishes passes where every snapshot in a pass carries the
        // same partial_ticks marker. A reader must never see two markers in
        // one map.
        let mut pool = SnapshotPool::new();
        let view = pool.view();

        let reader = std::thread::spawn(move || {
            for _ in 0..2000 {
                let map = view.latest();
                let mut markers: Vec<f32> =
                    map.values().map(|s| s.partial_ticks).collect();
                markers.dedup();
                assert!(markers.len() <= 1, "torn pass observed: {markers:?}");
            }
        });

        for pass in 0..500u32 {
            let marker = pass as f32 / 1000.0;
            let entities: Vec<TestEntity> =
                (0..8).map(|i| TestEntity::new(i, pass as f32)).collect();
            pool.extract(entities.iter(), marker);
            pool.publish();
        }

        reader.join().unwrap();
    }
}
