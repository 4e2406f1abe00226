//! Parent set with set-like semantics over type-inheritance edges.

use crate::entity::{Entity, EntityKey};
use crate::types::Inheritance;

/// One entry in a parent set.
#[derive(Debug, Clone)]
pub struct ParentEntry {
    /// The parent entity.
    pub entity: Entity,
    /// Inheritance mode of this edge.
    pub inheritance: Inheritance,
}

/// A sequence of parent edges with set semantics.
///
/// No two entries share an id and no two entries share a name. Inserting a
/// duplicate replaces the existing entry in place, preserving order.
#[derive(Debug, Clone, Default)]
pub struct ParentSet {
    entries: Vec<ParentEntry>,
}

impl ParentSet {
    /// Creates an empty parent set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, replacing any existing entry with an equal id or
    /// an equal name.
    pub fn insert(&mut self, entry: ParentEntry) {
        let duplicate = self.entries.iter().position(|existing| {
            let same_id = match (existing.entity.id(), entry.entity.id()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
            let same_name = match (existing.entity.name(), entry.entity.name()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
            same_id || same_name
        });

        match duplicate {
            Some(idx) => self.entries[idx] = entry,
            None => self.entries.push(entry),
        }
    }

    /// Returns the entry matching the key, id lookup taking priority over
    /// name lookup.
    #[must_use]
    pub fn get(&self, key: &EntityKey) -> Option<&ParentEntry> {
        self.position(key).map(|idx| &self.entries[idx])
    }

    /// Returns a mutable reference to the entry matching the key.
    pub fn get_mut(&mut self, key: &EntityKey) -> Option<&mut ParentEntry> {
        self.position(key).map(|idx| &mut self.entries[idx])
    }

    /// Removes and returns the entry matching the key.
    pub fn remove(&mut self, key: &EntityKey) -> Option<ParentEntry> {
        let idx = self.position(key)?;
        Some(self.entries.remove(idx))
    }

    fn position(&self, key: &EntityKey) -> Option<usize> {
        match key {
            EntityKey::Id(id) => self
                .entries
                .iter()
                .position(|e| e.entity.id() == Some(*id)),
            EntityKey::Name(name) => self
                .entries
                .iter()
                .position(|e| e.entity.name() == Some(name.as_str())),
        }
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ParentEntry> {
        self.entries.iter()
    }

    /// Iterates mutably over the entries in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ParentEntry> {
        self.entries.iter_mut()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ParentSet {
    type Item = &'a ParentEntry;
    type IntoIter = std::slice::Iter<'a, ParentEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityId, Role};

    fn parent(name: &str, id: Option<i64>, inheritance: Inheritance) -> ParentEntry {
        let mut entity = Entity::new(Role::RecordType).with_name(name);
        if let Some(id) = id {
            entity.set_id(EntityId::new(id)).unwrap();
        }
        ParentEntry {
            entity,
            inheritance,
        }
    }

    #[test]
    fn insert_replaces_equal_name() {
        let mut set = ParentSet::new();
        set.insert(parent("Base", None, Inheritance::Fix));
        set.insert(parent("Base", None, Inheritance::Obligatory));

        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get(&EntityKey::name("Base")).unwrap().inheritance,
            Inheritance::Obligatory
        );
    }

    #[test]
    fn insert_replaces_equal_id() {
        let mut set = ParentSet::new();
        set.insert(parent("A", Some(7), Inheritance::Fix));
        set.insert(parent("Renamed", Some(7), Inheritance::Fix));

        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get(&EntityKey::id(7)).unwrap().entity.name(),
            Some("Renamed")
        );
    }

    #[test]
    fn distinct_parents_accumulate_in_order() {
        let mut set = ParentSet::new();
        set.insert(parent("A", Some(1), Inheritance::Fix));
        set.insert(parent("B", Some(2), Inheritance::Fix));

        let names: Vec<_> = set.iter().map(|e| e.entity.name().unwrap().to_string()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn remove_by_name() {
        let mut set = ParentSet::new();
        set.insert(parent("A", Some(1), Inheritance::Fix));
        assert!(set.remove(&EntityKey::name("A")).is_some());
        assert!(set.is_empty());
    }
}
