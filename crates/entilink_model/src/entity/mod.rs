//! The entity model: typed records with properties, parents and messages.

mod message;
mod parents;
mod properties;

pub use message::{Message, MessageSet};
pub use parents::{ParentEntry, ParentSet};
pub use properties::{PropertyEntry, PropertyList};

use crate::acl::{Acl, Permission};
use crate::error::{ModelError, ModelResult};
use crate::types::{Cuid, EntityId, Importance, Inheritance, Role};
use std::collections::{HashSet, VecDeque};

/// Key for property and parent lookups.
///
/// Id lookup takes priority over name lookup wherever both could apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKey {
    /// Match by entity id.
    Id(EntityId),
    /// Match by entity name (exact).
    Name(String),
}

impl EntityKey {
    /// Creates an id key.
    #[must_use]
    pub fn id(id: i64) -> Self {
        Self::Id(EntityId::new(id))
    }

    /// Creates a name key.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

impl From<EntityId> for EntityKey {
    fn from(id: EntityId) -> Self {
        Self::Id(id)
    }
}

impl From<i64> for EntityKey {
    fn from(id: i64) -> Self {
        Self::Id(EntityId::new(id))
    }
}

impl From<&str> for EntityKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for EntityKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// A typed node of the record graph.
///
/// An entity may wrap another entity (single-level delegation): attribute
/// accessors fall through to the wrapped entity when the local value is
/// unset. This models "retrieved, then partially overridden" entities and
/// carries temporary ids through by-name references during linearization.
#[derive(Debug, Clone)]
pub struct Entity {
    id: Option<EntityId>,
    cuid: Option<Cuid>,
    role: Role,
    name: Option<String>,
    description: Option<String>,
    path: Option<String>,
    value: Option<String>,
    datatype: Option<String>,
    unit: Option<String>,
    checksum: Option<String>,
    size: Option<u64>,
    version: Option<String>,
    wrapped: Option<Box<Entity>>,
    /// Ordered property list of this entity.
    pub properties: PropertyList,
    /// Parent (type-inheritance) edges of this entity.
    pub parents: ParentSet,
    /// Messages attached to this entity.
    pub messages: MessageSet,
    /// Access control list, if the server reported one.
    pub acl: Option<Acl>,
    /// Effective permissions of the requesting user, as reported by the
    /// server.
    pub permissions: HashSet<Permission>,
    is_valid: bool,
    is_deleted: bool,
}

impl Default for Entity {
    fn default() -> Self {
        Self::new(Role::Entity)
    }
}

impl Entity {
    /// Creates an empty entity with the given role.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            id: None,
            cuid: None,
            role,
            name: None,
            description: None,
            path: None,
            value: None,
            datatype: None,
            unit: None,
            checksum: None,
            size: None,
            version: None,
            wrapped: None,
            properties: PropertyList::new(),
            parents: ParentSet::new(),
            messages: MessageSet::new(),
            acl: None,
            permissions: HashSet::new(),
            is_valid: true,
            is_deleted: false,
        }
    }

    /// Creates a record with a name.
    pub fn record(name: impl Into<String>) -> Self {
        Self::new(Role::Record).with_name(name)
    }

    /// Creates a record type with a name.
    pub fn record_type(name: impl Into<String>) -> Self {
        Self::new(Role::RecordType).with_name(name)
    }

    /// Creates a property with a name.
    pub fn property(name: impl Into<String>) -> Self {
        Self::new(Role::Property).with_name(name)
    }

    /// Creates a file entity with a name and a path.
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        let mut entity = Self::new(Role::File).with_name(name);
        entity.path = Some(path.into());
        entity
    }

    // --- builders -------------------------------------------------------

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the datatype.
    #[must_use]
    pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = Some(datatype.into());
        self
    }

    /// Sets the unit.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets the path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    // --- delegating accessors -------------------------------------------

    /// The entity id; falls through to the wrapped entity when unset.
    #[must_use]
    pub fn id(&self) -> Option<EntityId> {
        self.id.or_else(|| self.wrapped.as_ref().and_then(|w| w.id()))
    }

    /// The name; falls through to the wrapped entity when unset.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or_else(|| self.wrapped.as_ref().and_then(|w| w.name()))
    }

    /// The description; falls through to the wrapped entity when unset.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or_else(|| self.wrapped.as_ref().and_then(|w| w.description()))
    }

    /// The path; falls through to the wrapped entity when unset.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path
            .as_deref()
            .or_else(|| self.wrapped.as_ref().and_then(|w| w.path()))
    }

    /// The value; falls through to the wrapped entity when unset.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value
            .as_deref()
            .or_else(|| self.wrapped.as_ref().and_then(|w| w.value()))
    }

    /// The datatype; falls through to the wrapped entity when unset.
    #[must_use]
    pub fn datatype(&self) -> Option<&str> {
        self.datatype
            .as_deref()
            .or_else(|| self.wrapped.as_ref().and_then(|w| w.datatype()))
    }

    /// The unit; falls through to the wrapped entity when unset.
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.unit
            .as_deref()
            .or_else(|| self.wrapped.as_ref().and_then(|w| w.unit()))
    }

    /// The checksum; falls through to the wrapped entity when unset.
    #[must_use]
    pub fn checksum(&self) -> Option<&str> {
        self.checksum
            .as_deref()
            .or_else(|| self.wrapped.as_ref().and_then(|w| w.checksum()))
    }

    /// The file size; falls through to the wrapped entity when unset.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        self.size
            .or_else(|| self.wrapped.as_ref().and_then(|w| w.size()))
    }

    /// The version; falls through to the wrapped entity when unset.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.wrapped.as_ref().and_then(|w| w.version()))
    }

    /// The client correlation id. Never delegated: a cuid identifies this
    /// object within one transaction, not the wrapped one.
    #[must_use]
    pub fn cuid(&self) -> Option<&Cuid> {
        self.cuid.as_ref()
    }

    /// The entity role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// The wrapped entity, if any.
    #[must_use]
    pub fn wrapped(&self) -> Option<&Entity> {
        self.wrapped.as_deref()
    }

    // --- setters --------------------------------------------------------

    /// Assigns the id.
    ///
    /// An id, once set, never changes; reassigning a different id is an
    /// error. Assigning the same id again is a no-op.
    pub fn set_id(&mut self, id: EntityId) -> ModelResult<()> {
        match self.id {
            Some(existing) if existing != id => {
                Err(ModelError::id_already_assigned(existing.as_i64(), id.as_i64()))
            }
            _ => {
                self.id = Some(id);
                Ok(())
            }
        }
    }

    /// Sets the cuid.
    pub fn set_cuid(&mut self, cuid: Cuid) {
        self.cuid = Some(cuid);
    }

    /// Sets the role.
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    /// Sets the name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Sets the path.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = Some(path.into());
    }

    /// Sets the value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }

    /// Sets the datatype.
    pub fn set_datatype(&mut self, datatype: impl Into<String>) {
        self.datatype = Some(datatype.into());
    }

    /// Sets the unit.
    pub fn set_unit(&mut self, unit: impl Into<String>) {
        self.unit = Some(unit.into());
    }

    /// Sets the checksum.
    pub fn set_checksum(&mut self, checksum: impl Into<String>) {
        self.checksum = Some(checksum.into());
    }

    /// Sets the file size.
    pub fn set_size(&mut self, size: u64) {
        self.size = Some(size);
    }

    /// Sets the version.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = Some(version.into());
    }

    /// Wraps another entity; unset local attributes now fall through to it.
    pub fn wrap(&mut self, entity: Entity) {
        self.wrapped = Some(Box::new(entity));
    }

    // --- lifecycle ------------------------------------------------------

    /// Returns true if the entity is valid (has not been deleted).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Returns true if a delete transaction reported this entity deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Marks the entity dead after a delete transaction confirmed removal:
    /// the id is cleared and the entity becomes not-valid.
    pub fn invalidate(&mut self) {
        self.id = None;
        self.is_valid = false;
    }

    // --- properties and parents -----------------------------------------

    /// Adds a property with importance and inheritance defaults taken from
    /// this entity's role.
    pub fn add_property(&mut self, property: Entity) {
        self.add_property_with(property, None, None);
    }

    /// Adds a property with explicit edge attributes.
    ///
    /// Missing importance or inheritance defaults from the role table.
    pub fn add_property_with(
        &mut self,
        property: Entity,
        importance: Option<Importance>,
        inheritance: Option<Inheritance>,
    ) {
        let importance = importance.or_else(|| Some(self.role.default_importance()));
        let inheritance = inheritance.unwrap_or_else(|| self.role.default_inheritance());
        self.properties.push(PropertyEntry {
            entity: property,
            importance,
            inheritance,
        });
    }

    /// Adds a parent edge with the role's default inheritance mode.
    pub fn add_parent(&mut self, parent: Entity) {
        self.add_parent_with(parent, None);
    }

    /// Adds a parent edge with an explicit inheritance mode.
    pub fn add_parent_with(&mut self, parent: Entity, inheritance: Option<Inheritance>) {
        let inheritance = inheritance.unwrap_or_else(|| self.role.default_inheritance());
        self.parents.insert(ParentEntry {
            entity: parent,
            inheritance,
        });
    }

    /// Returns the property matching the key.
    #[must_use]
    pub fn get_property(&self, key: impl Into<EntityKey>) -> Option<&PropertyEntry> {
        self.properties.get(&key.into())
    }

    /// Removes and returns the property matching the key.
    pub fn remove_property(&mut self, key: impl Into<EntityKey>) -> Option<PropertyEntry> {
        self.properties.remove(&key.into())
    }

    /// Returns the parent edge matching the key.
    #[must_use]
    pub fn get_parent(&self, key: impl Into<EntityKey>) -> Option<&ParentEntry> {
        self.parents.get(&key.into())
    }

    /// Removes and returns the parent edge matching the key.
    pub fn remove_parent(&mut self, key: impl Into<EntityKey>) -> Option<ParentEntry> {
        self.parents.remove(&key.into())
    }

    /// Collects all transitive parents, breadth-first.
    ///
    /// Entities already visited (same id, or same name when id-less) are
    /// skipped, so diamonds and cycles terminate.
    #[must_use]
    pub fn ancestors(&self) -> Vec<&Entity> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<&Entity> =
            self.parents.iter().map(|p| &p.entity).collect();
        let mut out = Vec::new();

        while let Some(entity) = queue.pop_front() {
            let key = match entity.id() {
                Some(id) => format!("#{id}"),
                None => format!("@{}", entity.name().unwrap_or_default()),
            };
            if !visited.insert(key) {
                continue;
            }
            out.push(entity);
            for parent in entity.parents.iter() {
                queue.push_back(&parent.entity);
            }
        }
        out
    }

    // --- messages -------------------------------------------------------

    /// Attaches a message, overwriting an equal `(type, code)` key.
    pub fn add_message(&mut self, message: Message) {
        self.messages.set(message);
    }

    /// Returns true if this entity carries at least one error message.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.messages.has_errors()
    }

    /// Returns this entity's error messages in insertion order.
    #[must_use]
    pub fn get_errors(&self) -> Vec<&Message> {
        self.messages.errors().collect()
    }

    /// Clears the reserved server message types on this entity and,
    /// recursively, on its properties and parents.
    pub fn clear_server_messages(&mut self) {
        self.messages.clear_server_messages();
        for entry in self.properties.iter_mut() {
            entry.entity.clear_server_messages();
        }
        for entry in self.parents.iter_mut() {
            entry.entity.clear_server_messages();
        }
    }

    // --- crate-internal mutation ----------------------------------------

    /// The locally stored id, ignoring delegation.
    pub(crate) fn local_id(&self) -> Option<EntityId> {
        self.id
    }

    /// Assigns a temporary id during linearization, bypassing the
    /// reassignment check (the entity has no id at this point).
    pub(crate) fn assign_tmp_id(&mut self, id: EntityId) {
        debug_assert!(self.id.is_none());
        self.id = Some(id);
    }

    /// Overwrites this entity's state with remote truth.
    ///
    /// This is the full-overwrite merge of the synchronization algorithm:
    /// every synchronized field is copied from the remote entity; nothing
    /// is merged recursively and no aliasing of remote state remains.
    pub(crate) fn adopt(&mut self, remote: Entity) {
        self.id = remote.id;
        if remote.cuid.is_some() {
            self.cuid = remote.cuid;
        }
        self.role = remote.role;
        self.name = remote.name;
        self.description = remote.description;
        self.path = remote.path;
        self.checksum = remote.checksum;
        self.size = remote.size;
        self.datatype = remote.datatype;
        self.unit = remote.unit;
        self.value = remote.value;
        self.properties = remote.properties;
        self.parents = remote.parents;
        self.messages = remote.messages;
        self.acl = remote.acl;
        self.permissions = remote.permissions;
        self.is_valid = remote.is_valid;
        self.is_deleted = remote.is_deleted;
        self.version = remote.version;
        // Local overrides are obsolete once remote truth arrived.
        self.wrapped = None;
    }

    /// Marks the entity as reported deleted by the server. Set while
    /// parsing delete responses; the delete transaction invalidates the
    /// entity afterwards.
    pub fn set_deleted(&mut self, deleted: bool) {
        self.is_deleted = deleted;
    }
}
