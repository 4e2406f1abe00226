//! Core type definitions for the entity model.

use std::fmt;
use uuid::Uuid;

/// Identifier of a persisted entity.
///
/// Positive ids are permanent and assigned by the server. Negative ids are
/// temporary (tmpids) assigned by linearization before an insert; they are
/// unique within one transaction and never collide with permanent ids in
/// the same batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub i64);

impl EntityId {
    /// Creates a new entity ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Returns true if this is a temporary id assigned by linearization.
    #[must_use]
    pub const fn is_temporary(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Client-generated correlation id.
///
/// A cuid re-identifies an entity across a request/response round trip
/// before the entity has a permanent id. It is unique within a single
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cuid(String);

impl Cuid {
    /// Creates a cuid from an existing string (e.g. parsed from a response).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh cuid.
    ///
    /// The id part keeps generated cuids readable in traces; the random
    /// token guarantees uniqueness.
    #[must_use]
    pub fn generate(id: Option<EntityId>) -> Self {
        let id_part = id.map(|i| i.to_string()).unwrap_or_default();
        Self(format!("{id_part}--{}", Uuid::new_v4()))
    }

    /// Returns the cuid as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cuid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Cuid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The role of an entity within the record model.
///
/// One concrete [`Entity`](crate::Entity) type carries a role tag instead
/// of a subclass per role; the role only selects defaults when properties
/// and parents are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// A concrete record.
    Record,
    /// A record type other records inherit from.
    RecordType,
    /// A property definition.
    Property,
    /// A parent reference.
    Parent,
    /// A file-like entity addressed by path.
    File,
    /// A generic entity without a specific role.
    #[default]
    Entity,
}

impl Role {
    /// Default importance for properties added to an entity of this role.
    #[must_use]
    pub fn default_importance(self) -> Importance {
        match self {
            Role::RecordType => Importance::recommended(),
            _ => Importance::fix(),
        }
    }

    /// Default inheritance mode for property and parent edges added to an
    /// entity of this role.
    #[must_use]
    pub fn default_inheritance(self) -> Inheritance {
        Inheritance::Fix
    }

    /// Returns the canonical tag name of this role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Record => "Record",
            Role::RecordType => "RecordType",
            Role::Property => "Property",
            Role::Parent => "Parent",
            Role::File => "File",
            Role::Entity => "Entity",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-defined importance tag on a property edge.
///
/// Any string is accepted; the conventional values have constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Importance(String);

impl Importance {
    /// Creates an importance tag from an arbitrary string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The conventional `OBLIGATORY` importance.
    #[must_use]
    pub fn obligatory() -> Self {
        Self("OBLIGATORY".into())
    }

    /// The conventional `RECOMMENDED` importance.
    #[must_use]
    pub fn recommended() -> Self {
        Self("RECOMMENDED".into())
    }

    /// The conventional `SUGGESTED` importance.
    #[must_use]
    pub fn suggested() -> Self {
        Self("SUGGESTED".into())
    }

    /// The conventional `FIX` importance.
    #[must_use]
    pub fn fix() -> Self {
        Self("FIX".into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Importance {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Inheritance mode of a property or parent edge.
///
/// Controls how the edge is treated across type hierarchies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Inheritance {
    /// The edge is fixed to the entity it was declared on.
    #[default]
    Fix,
    /// The edge is obligatory for inheriting entities.
    Obligatory,
    /// The edge is recommended for inheriting entities.
    Recommended,
    /// The edge is suggested for inheriting entities.
    Suggested,
}

impl Inheritance {
    /// Parses an inheritance mode, case-insensitively.
    ///
    /// Accepts both `fix` and `fixed` for the default mode.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "fix" | "fixed" => Some(Inheritance::Fix),
            "obligatory" => Some(Inheritance::Obligatory),
            "recommended" => Some(Inheritance::Recommended),
            "suggested" => Some(Inheritance::Suggested),
            _ => None,
        }
    }

    /// Returns the canonical lower-case name of this mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Inheritance::Fix => "fix",
            Inheritance::Obligatory => "obligatory",
            Inheritance::Recommended => "recommended",
            Inheritance::Suggested => "suggested",
        }
    }
}

impl fmt::Display for Inheritance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_ids_are_negative() {
        assert!(EntityId::new(-1).is_temporary());
        assert!(!EntityId::new(0).is_temporary());
        assert!(!EntityId::new(42).is_temporary());
    }

    #[test]
    fn generated_cuids_are_unique() {
        let a = Cuid::generate(Some(EntityId::new(-1)));
        let b = Cuid::generate(Some(EntityId::new(-1)));
        assert_ne!(a, b);
    }

    #[test]
    fn generated_cuid_embeds_id() {
        let cuid = Cuid::generate(Some(EntityId::new(-7)));
        assert!(cuid.as_str().starts_with("-7--"));

        let anonymous = Cuid::generate(None);
        assert!(anonymous.as_str().starts_with("--"));
    }

    #[test]
    fn inheritance_parse_is_case_insensitive() {
        assert_eq!(Inheritance::parse("OBLIGATORY"), Some(Inheritance::Obligatory));
        assert_eq!(Inheritance::parse("Fixed"), Some(Inheritance::Fix));
        assert_eq!(Inheritance::parse("fix"), Some(Inheritance::Fix));
        assert_eq!(Inheritance::parse("bogus"), None);
    }

    #[test]
    fn role_defaults() {
        assert_eq!(Role::RecordType.default_importance(), Importance::recommended());
        assert_eq!(Role::Record.default_importance(), Importance::fix());
        assert_eq!(Role::Record.default_inheritance(), Inheritance::Fix);
    }

    #[test]
    fn display_round_trip() {
        assert_eq!(format!("{}", EntityId::new(-3)), "-3");
        assert_eq!(Inheritance::parse(Inheritance::Recommended.as_str()), Some(Inheritance::Recommended));
    }
}
