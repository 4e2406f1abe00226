//! Pre-transaction linearization: temporary ids, cuids and by-name
//! dereferencing.
//!
//! Insert and update payloads may contain entities that reference each
//! other before any of them has a permanent id. Linearization makes such a
//! batch self-consistent: every unsaved entity gets a temporary negative
//! id and a cuid, and every property or parent that names another entity
//! of the same batch is turned into a direct reference carrying that
//! entity's temporary id.

use crate::container::Container;
use crate::entity::Entity;
use crate::types::{Cuid, EntityId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

impl Container {
    /// Prepares the container for an insert or update transaction.
    ///
    /// Temporary ids are strictly negative, pairwise distinct and strictly
    /// below every id already present in the local graph, so they can
    /// never collide within the batch. Entities that already carry ids and
    /// cuids are untouched, making the pass idempotent.
    pub fn linearize(&mut self) {
        // By-name references resolve against the names of the container's
        // own entities; such children must not be mistaken for new
        // entities of their own.
        let reference_names: HashSet<String> = self
            .iter()
            .filter_map(|e| e.name().map(str::to_string))
            .collect();

        let mut floor: i64 = 0;
        for entity in self.iter() {
            collect_min_id(entity, &mut floor);
        }

        let mut next = floor;
        let mut assigned = 0usize;
        for entity in self.iter_mut() {
            assign_tmp_ids(entity, &reference_names, true, &mut next, &mut assigned);
        }

        for entity in self.iter_mut() {
            assign_cuids(entity, &reference_names, true);
        }

        let targets: HashMap<String, Entity> = {
            let mut map = HashMap::new();
            for entity in self.iter() {
                if let Some(name) = entity.name() {
                    map.entry(name.to_string()).or_insert_with(|| entity.clone());
                }
            }
            map
        };
        for entity in self.iter_mut() {
            dereference(entity, &targets);
        }

        debug!(assigned, floor = next, "linearized container");
    }
}

/// Tracks the minimum id over the whole graph: entities and, recursively,
/// their properties.
fn collect_min_id(entity: &Entity, min: &mut i64) {
    if let Some(id) = entity.id() {
        *min = (*min).min(id.as_i64());
    }
    for entry in entity.properties.iter() {
        collect_min_id(&entry.entity, min);
    }
}

fn is_reference(entity: &Entity, reference_names: &HashSet<String>) -> bool {
    entity.id().is_none()
        && entity
            .name()
            .is_some_and(|name| reference_names.contains(name))
}

fn assign_tmp_ids(
    entity: &mut Entity,
    reference_names: &HashSet<String>,
    top_level: bool,
    next: &mut i64,
    assigned: &mut usize,
) {
    // Children that merely name another entity of the batch are resolved
    // by dereferencing instead of getting an id of their own.
    let skip = !top_level && is_reference(entity, reference_names);
    if entity.id().is_none() && !skip {
        *next -= 1;
        entity.assign_tmp_id(EntityId::new(*next));
        *assigned += 1;
    }
    for entry in entity.properties.iter_mut() {
        assign_tmp_ids(&mut entry.entity, reference_names, false, next, assigned);
    }
    entity.properties.refresh_indexes();
}

fn assign_cuids(entity: &mut Entity, reference_names: &HashSet<String>, top_level: bool) {
    let skip = !top_level && is_reference(entity, reference_names);
    if entity.cuid().is_none() && !skip {
        entity.set_cuid(Cuid::generate(entity.id()));
    }
    for entry in entity.properties.iter_mut() {
        assign_cuids(&mut entry.entity, reference_names, false);
    }
}

fn dereference(entity: &mut Entity, targets: &HashMap<String, Entity>) {
    for entry in entity.properties.iter_mut() {
        try_wrap(&mut entry.entity, targets);
        dereference(&mut entry.entity, targets);
    }
    for entry in entity.parents.iter_mut() {
        try_wrap(&mut entry.entity, targets);
    }
    entity.properties.refresh_indexes();
}

fn try_wrap(child: &mut Entity, targets: &HashMap<String, Entity>) {
    if child.id().is_some() || child.wrapped().is_some() {
        return;
    }
    let Some(target) = child.name().and_then(|name| targets.get(name)) else {
        return;
    };
    child.wrap(target.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use proptest::prelude::*;

    fn tmp_ids(container: &Container) -> Vec<i64> {
        container
            .iter()
            .filter_map(|e| e.id())
            .filter(|id| id.is_temporary())
            .map(|id| id.as_i64())
            .collect()
    }

    #[test]
    fn two_unsaved_entities_get_minus_one_and_minus_two() {
        let mut container = Container::new();
        container.push(Entity::record("A"));
        container.push(Entity::record("B"));

        container.linearize();
        assert_eq!(tmp_ids(&container), vec![-1, -2]);
    }

    #[test]
    fn tmp_ids_stay_below_existing_minimum() {
        let mut container = Container::new();
        let mut existing = Entity::record("old");
        existing.assign_tmp_id(EntityId::new(-5));
        container.push(existing);
        container.push(Entity::record("new"));

        container.linearize();
        assert_eq!(container[1].id(), Some(EntityId::new(-6)));
    }

    #[test]
    fn property_ids_count_toward_the_minimum() {
        let mut container = Container::new();
        let mut record = Entity::record("r");
        let mut prop = Entity::property("p");
        prop.assign_tmp_id(EntityId::new(-3));
        record.add_property(prop);
        container.push(record);

        container.linearize();
        // The record itself was id-less and starts below the property id.
        assert_eq!(container[0].id(), Some(EntityId::new(-4)));
    }

    #[test]
    fn unsaved_properties_get_ids_and_cuids() {
        let mut container = Container::new();
        let mut record = Entity::record("r");
        record.add_property(Entity::property("measurement"));
        container.push(record);

        container.linearize();
        let entry = container[0].get_property("measurement").unwrap();
        assert!(entry.entity.id().unwrap().is_temporary());
        assert!(entry.entity.cuid().is_some());
        assert_ne!(container[0].id(), entry.entity.id());
    }

    #[test]
    fn every_entity_gets_a_cuid_embedding_its_tmp_id() {
        let mut container = Container::new();
        container.push(Entity::record("A"));

        container.linearize();
        let cuid = container[0].cuid().unwrap();
        assert!(cuid.as_str().starts_with("-1--"));
    }

    #[test]
    fn by_name_property_reference_is_dereferenced() {
        // One batch creates the record type and a property pointing at it.
        let mut container = Container::new();
        container.push(Entity::record_type("Person"));
        let mut record = Entity::record("r");
        record.add_property(Entity::new(crate::types::Role::Property).with_name("Person"));
        container.push(record);

        container.linearize();

        let person_id = container[0].id().unwrap();
        assert!(person_id.is_temporary());

        let entry = container[1].get_property("Person").unwrap();
        // The reference carries the target's temporary id via delegation,
        // not an id of its own.
        assert_eq!(entry.entity.id(), Some(person_id));
        assert!(entry.entity.wrapped().is_some());
    }

    #[test]
    fn by_name_parent_reference_is_dereferenced() {
        let mut container = Container::new();
        container.push(Entity::record_type("Base"));
        let mut record = Entity::record("r");
        record.add_parent(Entity::new(crate::types::Role::Parent).with_name("Base"));
        container.push(record);

        container.linearize();

        let base_id = container[0].id().unwrap();
        let parent = container[1].get_parent("Base").unwrap();
        assert_eq!(parent.entity.id(), Some(base_id));
    }

    #[test]
    fn linearize_is_idempotent() {
        let mut container = Container::new();
        container.push(Entity::record("A"));
        container.push(Entity::record("B"));

        container.linearize();
        let ids = tmp_ids(&container);
        let cuids: Vec<_> = container
            .iter()
            .map(|e| e.cuid().unwrap().clone())
            .collect();

        container.linearize();
        assert_eq!(tmp_ids(&container), ids);
        let cuids_after: Vec<_> = container
            .iter()
            .map(|e| e.cuid().unwrap().clone())
            .collect();
        assert_eq!(cuids_after, cuids);
    }

    proptest! {
        #[test]
        fn tmp_ids_are_negative_distinct_and_below_existing(
            existing in prop::collection::vec(-1000i64..1000, 0..20),
            unsaved in 1usize..20,
        ) {
            let mut container = Container::new();
            let mut seen = HashSet::new();
            for id in &existing {
                if !seen.insert(*id) {
                    continue;
                }
                let mut entity = Entity::record(format!("e{id}"));
                // Direct assignment covers negative pre-existing ids too.
                entity.assign_tmp_id(EntityId::new(*id));
                container.push(entity);
            }
            for i in 0..unsaved {
                container.push(Entity::record(format!("new{i}")));
            }

            container.linearize();

            let pre_min = existing.iter().copied().min().unwrap_or(0).min(0);
            let new_ids: Vec<i64> = container
                .iter()
                .skip(seen.len())
                .map(|e| e.id().unwrap().as_i64())
                .collect();

            let mut distinct = HashSet::new();
            for id in &new_ids {
                prop_assert!(*id < 0, "tmp id {id} not negative");
                prop_assert!(*id < pre_min, "tmp id {id} not below {pre_min}");
                prop_assert!(distinct.insert(*id), "tmp id {id} duplicated");
            }
        }
    }
}
