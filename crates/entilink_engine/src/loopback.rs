//! In-process loopback transport backed by an entity store.
//!
//! Every transaction is routed through the wire codec, so a client running
//! against the loopback exercises the same encode/decode path as one
//! talking to a real server, without network overhead.

use crate::error::EngineResult;
use crate::flags::TransactionFlags;
use crate::transport::{RetrieveRequest, Transport};
use entilink_model::{Container, Entity, EntityId, Message, Role};
use entilink_wire::{container_from_element, encode_request, encode_response, RawElement};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug)]
struct StoreState {
    entities: HashMap<i64, Entity>,
    next_id: i64,
    request_counter: u64,
}

/// An in-memory entity store acting as the server side of a transport.
#[derive(Debug)]
pub struct LoopbackStore {
    state: Mutex<StoreState>,
}

impl Default for LoopbackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                entities: HashMap::new(),
                next_id: 1,
                request_counter: 0,
            }),
        }
    }

    /// Number of stored entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entities.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if an entity with the given id is stored.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.state.lock().unwrap().entities.contains_key(&id.as_i64())
    }

    /// Builds a response container and routes it through the codec.
    fn respond(&self, entities: Vec<Entity>) -> EngineResult<Container> {
        let counter = {
            let mut state = self.state.lock().unwrap();
            state.request_counter += 1;
            state.request_counter
        };
        let mut response: Container = entities.into_iter().collect();
        response.timestamp = Some(counter.to_string());
        response.srid = Some(format!("loopback-{counter}"));

        let element = encode_response(&response);
        Ok(container_from_element(&element)?)
    }

    fn missing(id: Option<EntityId>, name: Option<&str>) -> Entity {
        let mut entity = Entity::new(Role::Entity);
        if let Some(id) = id {
            // The id of a missing entity is echoed so the client can match
            // the error to its request entity.
            let _ = entity.set_id(id);
        }
        if let Some(name) = name {
            entity.set_name(name);
        }
        entity.add_message(Message::error(Some(101), "entity does not exist"));
        entity
    }

    /// Decodes the request the way a server would: through the codec.
    fn decode_request(request: &Container) -> EngineResult<Container> {
        let element = encode_request(request);
        Ok(container_from_element(&element)?)
    }
}

/// Replaces temporary (negative) ids in an element tree with permanent
/// ones, consistently across references.
fn remap_tmp_ids(element: &mut RawElement, map: &mut HashMap<i64, i64>, next: &mut i64) {
    if let Some(raw) = element.attribute("id") {
        if let Ok(id) = raw.parse::<i64>() {
            if id < 0 {
                let assigned = *map.entry(id).or_insert_with(|| {
                    let assigned = *next;
                    *next += 1;
                    assigned
                });
                element.set_attribute("id", assigned.to_string());
            }
        }
    }
    for child in &mut element.children {
        remap_tmp_ids(child, map, next);
    }
}

impl Transport for LoopbackStore {
    fn retrieve(
        &self,
        request: &RetrieveRequest,
        _flags: &TransactionFlags,
    ) -> EngineResult<Container> {
        let found: Vec<Entity> = {
            let state = self.state.lock().unwrap();
            match request {
                RetrieveRequest::Ids(ids) => ids
                    .iter()
                    .map(|id| {
                        state
                            .entities
                            .get(&id.as_i64())
                            .cloned()
                            .unwrap_or_else(|| Self::missing(Some(*id), None))
                    })
                    .collect(),
                RetrieveRequest::Names(names) => names
                    .iter()
                    .map(|name| {
                        state
                            .entities
                            .values()
                            .find(|e| e.name() == Some(name.as_str()))
                            .cloned()
                            .unwrap_or_else(|| Self::missing(None, Some(name)))
                    })
                    .collect(),
                RetrieveRequest::Paths(paths) => paths
                    .iter()
                    .map(|path| {
                        state
                            .entities
                            .values()
                            .find(|e| e.path() == Some(path.as_str()))
                            .cloned()
                            .unwrap_or_else(|| Self::missing(None, Some(path)))
                    })
                    .collect(),
            }
        };
        self.respond(found)
    }

    fn insert(&self, request: &Container, _flags: &TransactionFlags) -> EngineResult<Container> {
        let mut element = encode_request(request);
        {
            let mut state = self.state.lock().unwrap();
            let mut map = HashMap::new();
            let mut next = state.next_id;
            remap_tmp_ids(&mut element, &mut map, &mut next);
            state.next_id = next;
        }
        let decoded = container_from_element(&element)?;

        let mut stored = Vec::with_capacity(decoded.len());
        {
            let mut state = self.state.lock().unwrap();
            for entity in decoded {
                if let Some(id) = entity.id() {
                    state.entities.insert(id.as_i64(), entity.clone());
                }
                stored.push(entity);
            }
        }
        self.respond(stored)
    }

    fn update(&self, request: &Container, _flags: &TransactionFlags) -> EngineResult<Container> {
        let decoded = Self::decode_request(request)?;
        let mut result = Vec::with_capacity(decoded.len());
        {
            let mut state = self.state.lock().unwrap();
            for entity in decoded {
                match entity.id() {
                    Some(id) if state.entities.contains_key(&id.as_i64()) => {
                        state.entities.insert(id.as_i64(), entity.clone());
                        result.push(entity);
                    }
                    id => result.push(Self::missing(id, entity.name())),
                }
            }
        }
        self.respond(result)
    }

    fn delete(&self, ids: &[EntityId], _flags: &TransactionFlags) -> EngineResult<Container> {
        let mut result = Vec::with_capacity(ids.len());
        {
            let mut state = self.state.lock().unwrap();
            for id in ids {
                match state.entities.remove(&id.as_i64()) {
                    Some(mut entity) => {
                        entity.set_deleted(true);
                        result.push(entity);
                    }
                    None => result.push(Self::missing(Some(*id), None)),
                }
            }
        }
        self.respond(result)
    }
}
