//! Ordered property list with id and name indexes.

use crate::entity::{Entity, EntityKey};
use crate::types::{Importance, Inheritance};
use std::collections::HashMap;

/// One entry in a property list.
///
/// Importance and inheritance are edge attributes: they belong to the
/// owning entity's view of the property, not to the property entity itself.
#[derive(Debug, Clone)]
pub struct PropertyEntry {
    /// The property entity.
    pub entity: Entity,
    /// Caller-defined importance tag of this edge.
    pub importance: Option<Importance>,
    /// Inheritance mode of this edge.
    pub inheritance: Inheritance,
}

/// An ordered, index-backed list of property entries.
///
/// Duplicate names under different backing entities are allowed in the
/// sequence; by-name lookup returns the first occurrence. Lookups by id and
/// name are O(1) via hash indexes maintained on insert and removal.
#[derive(Debug, Clone, Default)]
pub struct PropertyList {
    entries: Vec<PropertyEntry>,
    by_id: HashMap<i64, usize>,
    by_name: HashMap<String, usize>,
}

impl PropertyList {
    /// Creates an empty property list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry and updates the indexes.
    pub fn push(&mut self, entry: PropertyEntry) {
        let idx = self.entries.len();
        if let Some(id) = entry.entity.id() {
            self.by_id.entry(id.as_i64()).or_insert(idx);
        }
        if let Some(name) = entry.entity.name() {
            self.by_name.entry(name.to_string()).or_insert(idx);
        }
        self.entries.push(entry);
    }

    /// Returns the entry matching the key, id lookup taking priority
    /// over name lookup.
    #[must_use]
    pub fn get(&self, key: &EntityKey) -> Option<&PropertyEntry> {
        self.position(key).map(|idx| &self.entries[idx])
    }

    /// Returns a mutable reference to the entry matching the key.
    pub fn get_mut(&mut self, key: &EntityKey) -> Option<&mut PropertyEntry> {
        self.position(key).map(|idx| &mut self.entries[idx])
    }

    /// Removes and returns the entry matching the key.
    ///
    /// The indexes are rebuilt because positions shift.
    pub fn remove(&mut self, key: &EntityKey) -> Option<PropertyEntry> {
        let idx = self.position(key)?;
        let entry = self.entries.remove(idx);
        self.rebuild_indexes();
        Some(entry)
    }

    fn position(&self, key: &EntityKey) -> Option<usize> {
        match key {
            EntityKey::Id(id) => self.by_id.get(&id.as_i64()).copied(),
            EntityKey::Name(name) => self.by_name.get(name.as_str()).copied(),
        }
    }

    fn rebuild_indexes(&mut self) {
        self.by_id.clear();
        self.by_name.clear();
        for (idx, entry) in self.entries.iter().enumerate() {
            if let Some(id) = entry.entity.id() {
                self.by_id.entry(id.as_i64()).or_insert(idx);
            }
            if let Some(name) = entry.entity.name() {
                self.by_name.entry(name.to_string()).or_insert(idx);
            }
        }
    }

    /// Re-keys the indexes after entity ids or names changed in place.
    ///
    /// Linearization assigns ids to property entities after they were
    /// added, so the by-id index has to catch up.
    pub(crate) fn refresh_indexes(&mut self) {
        self.rebuild_indexes();
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyEntry> {
        self.entries.iter()
    }

    /// Iterates mutably over the entries in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PropertyEntry> {
        self.entries.iter_mut()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a PropertyList {
    type Item = &'a PropertyEntry;
    type IntoIter = std::slice::Iter<'a, PropertyEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
