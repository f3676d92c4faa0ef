use crate::{Entity, GraphError, Result};
use lanefix_savefile::{entity_id_from_key, entity_key};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Ids at or above this value are reserved/sentinel values written by the
/// game and never participate in max-id computation.
pub const RESERVED_ID_FLOOR: u64 = 4_294_967_295;

/// Integer-keyed entity store.
///
/// The `(ID=n)` key convention exists only at the container boundary;
/// everything in here works with plain ids. Container entries that are not
/// id-keyed entity objects are preserved verbatim for the round trip.
#[derive(Debug, Default)]
pub struct EntityGraph {
    entities: BTreeMap<u64, Entity>,
    /// Pass-through container entries (unparseable keys or non-object values).
    extras: Vec<(String, Value)>,
    /// Highest non-reserved id seen or allocated so far.
    max_id: u64,
}

impl EntityGraph {
    /// Build a graph from the archive's entity container map.
    pub fn from_container(container: Map<String, Value>) -> Self {
        let mut graph = EntityGraph::default();
        for (key, value) in container {
            match entity_id_from_key(&key) {
                Some(id) if value.is_object() => {
                    if id < RESERVED_ID_FLOOR && id > graph.max_id {
                        graph.max_id = id;
                    }
                    graph.entities.insert(id, Entity::new(value));
                }
                _ => graph.extras.push((key, value)),
            }
        }
        log::debug!(
            "entity graph: {} entities, {} pass-through entries, max id {}",
            graph.entities.len(),
            graph.extras.len(),
            graph.max_id
        );
        graph
    }

    /// Serialize back into a container map with `(ID=n)` keys.
    pub fn into_container(self) -> Map<String, Value> {
        let mut map = Map::new();
        for (id, entity) in self.entities {
            map.insert(entity_key(id), entity.into_value());
        }
        for (key, value) in self.extras {
            map.insert(key, value);
        }
        map
    }

    pub fn get(&self, id: u64) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.entities.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &Entity)> {
        self.entities.iter().map(|(id, e)| (*id, e))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u64, &mut Entity)> {
        self.entities.iter_mut().map(|(id, e)| (*id, e))
    }

    /// Insert a new entity; an occupied id is a caller bug, not a merge.
    pub fn insert(&mut self, id: u64, entity: Entity) -> Result<()> {
        if self.entities.contains_key(&id) {
            return Err(GraphError::DuplicateId(id));
        }
        if id < RESERVED_ID_FLOOR && id > self.max_id {
            self.max_id = id;
        }
        self.entities.insert(id, entity);
        Ok(())
    }

    /// Delete an entity, freeing its id.
    pub fn remove(&mut self, id: u64) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Highest non-reserved id seen or allocated.
    pub fn max_id(&self) -> u64 {
        self.max_id
    }

    /// Next free id without claiming it.
    pub fn next_id(&self) -> u64 {
        self.max_id + 1
    }

    /// Claim and return a fresh id, strictly greater than every id seen or
    /// allocated before it. Safe to call repeatedly before the entities are
    /// actually inserted (plan-then-apply).
    pub fn alloc_id(&mut self) -> u64 {
        self.max_id += 1;
        self.max_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn container() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("(ID=3)".into(), json!({"tags": []}));
        map.insert("(ID=17)".into(), json!({"tags": []}));
        // Reserved sentinel, excluded from max-id computation.
        map.insert("(ID=4294967295)".into(), json!({"tags": []}));
        // Pass-through entries.
        map.insert("metadata".into(), json!({"version": 2}));
        map
    }

    #[test]
    fn builds_from_container_and_round_trips() {
        let graph = EntityGraph::from_container(container());
        assert_eq!(graph.len(), 3);
        assert!(graph.contains(3));
        assert!(graph.contains(4_294_967_295));

        let map = graph.into_container();
        assert_eq!(map.len(), 4);
        assert_eq!(map["metadata"], json!({"version": 2}));
        assert!(map.contains_key("(ID=17)"));
    }

    #[test]
    fn reserved_ids_do_not_drive_allocation() {
        let graph = EntityGraph::from_container(container());
        assert_eq!(graph.max_id(), 17);
        assert_eq!(graph.next_id(), 18);
    }

    #[test]
    fn alloc_id_is_monotonic_and_collision_free() {
        let mut graph = EntityGraph::from_container(container());
        let a = graph.alloc_id();
        let b = graph.alloc_id();
        assert_eq!((a, b), (18, 19));

        graph.insert(a, Entity::new(json!({}))).unwrap();
        graph.insert(b, Entity::new(json!({}))).unwrap();
        assert_eq!(graph.alloc_id(), 20);
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut graph = EntityGraph::from_container(container());
        let err = graph.insert(17, Entity::new(json!({}))).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateId(17)));
    }

    #[test]
    fn insert_of_high_id_advances_allocator() {
        let mut graph = EntityGraph::from_container(container());
        graph.insert(100, Entity::new(json!({}))).unwrap();
        assert_eq!(graph.next_id(), 101);
    }

    #[test]
    fn remove_frees_the_record() {
        let mut graph = EntityGraph::from_container(container());
        assert!(graph.remove(3).is_some());
        assert!(!graph.contains(3));
        assert!(graph.remove(3).is_none());
    }
}
