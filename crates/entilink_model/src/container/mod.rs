//! Ordered entity container with transaction-level state.

mod linearize;
mod sync;

pub use sync::{SyncOptions, SyncReport};

use crate::entity::{Entity, Message, MessageSet};
use crate::types::EntityId;

/// An ordered mutable collection of entities plus collection-level
/// messages and transaction metadata.
///
/// Entity order is transaction-significant: requests are issued and
/// responses matched in container order. The `timestamp` and `srid`
/// metadata reflect the most recent response.
#[derive(Debug, Clone, Default)]
pub struct Container {
    entities: Vec<Entity>,
    /// Container-level messages from the most recent transaction.
    pub messages: MessageSet,
    /// Server timestamp of the most recent response.
    pub timestamp: Option<String>,
    /// Server request id of the most recent response.
    pub srid: Option<String>,
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entity.
    pub fn push(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Appends all entities of an iterator.
    pub fn extend(&mut self, entities: impl IntoIterator<Item = Entity>) {
        self.entities.extend(entities);
    }

    /// Returns the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the container holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns the entity at the given position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    /// Returns a mutable reference to the entity at the given position.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.entities.get_mut(index)
    }

    /// Returns the first entity with the given id.
    #[must_use]
    pub fn get_by_id(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == Some(id))
    }

    /// Returns the first entity with the given name (exact match).
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name() == Some(name))
    }

    /// Iterates over the entities in order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Iterates mutably over the entities in order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    /// Returns the non-null ids of all entities, in container order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.iter().filter_map(Entity::id).collect()
    }

    /// Returns true if the container or any entity carries an error
    /// message.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.messages.has_errors() || self.entities.iter().any(Entity::has_errors)
    }

    /// Returns the container-level error messages in insertion order.
    #[must_use]
    pub fn get_errors(&self) -> Vec<&Message> {
        self.messages.errors().collect()
    }

    /// Clears the reserved server message types on the container and on
    /// every entity (recursively through properties and parents).
    pub fn clear_server_messages(&mut self) {
        self.messages.clear_server_messages();
        for entity in &mut self.entities {
            entity.clear_server_messages();
        }
    }

    /// Re-types every warning as an error, on the container and on every
    /// entity (recursively). Used by the strict transaction mode.
    pub fn promote_warnings(&mut self) {
        self.messages.promote_warnings();
        for entity in &mut self.entities {
            promote_entity_warnings(entity);
        }
    }
}

fn promote_entity_warnings(entity: &mut Entity) {
    entity.messages.promote_warnings();
    for entry in entity.properties.iter_mut() {
        promote_entity_warnings(&mut entry.entity);
    }
    for entry in entity.parents.iter_mut() {
        promote_entity_warnings(&mut entry.entity);
    }
}

impl FromIterator<Entity> for Container {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut container = Container::new();
        container.extend(iter);
        container
    }
}

impl IntoIterator for Container {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}

impl<'a> IntoIterator for &'a Container {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

impl std::ops::Index<usize> for Container {
    type Output = Entity;

    fn index(&self, index: usize) -> &Entity {
        &self.entities[index]
    }
}
