//! Access control resolution with priority overrides.
//!
//! Permissions are resolved over four sets of access control items:
//! grants, denials, priority grants and priority denials. The precedence
//! is fixed: priority beats non-priority, and denial beats grant within a
//! tier. There is no further tie-break.

use std::collections::HashSet;
use std::fmt;

/// A named permission, e.g. `RETRIEVE_ENTITY` or `UPDATE:NAME`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permission(String);

impl Permission {
    /// Creates a permission from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the permission name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// The subject of an access control item: either a user (optionally
/// qualified by a realm) or a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    /// A user, optionally within an authentication realm.
    User {
        /// User name.
        username: String,
        /// Authentication realm, if any.
        realm: Option<String>,
    },
    /// A role granted to many users.
    Role(String),
}

impl Subject {
    /// Creates a user subject without a realm.
    pub fn user(username: impl Into<String>) -> Self {
        Self::User {
            username: username.into(),
            realm: None,
        }
    }

    /// Creates a user subject within a realm.
    pub fn user_in_realm(username: impl Into<String>, realm: impl Into<String>) -> Self {
        Self::User {
            username: username.into(),
            realm: Some(realm.into()),
        }
    }

    /// Creates a role subject.
    pub fn role(name: impl Into<String>) -> Self {
        Self::Role(name.into())
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::User {
                username,
                realm: Some(realm),
            } => write!(f, "{realm}/{username}"),
            Subject::User { username, .. } => f.write_str(username),
            Subject::Role(role) => write!(f, "role:{role}"),
        }
    }
}

/// One access control item: a subject/permission pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Aci {
    /// The subject the item applies to.
    pub subject: Subject,
    /// The permission the item grants or denies.
    pub permission: Permission,
}

impl Aci {
    /// Creates an access control item.
    pub fn new(subject: Subject, permission: Permission) -> Self {
        Self {
            subject,
            permission,
        }
    }
}

/// An access control list with two priority tiers.
///
/// Invariant: an ACI lives in at most one of the four sets. Every mutation
/// first evicts the equal ACI from all sets, so an item is never granted
/// and denied at the same time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acl {
    grants: HashSet<Aci>,
    denials: HashSet<Aci>,
    priority_grants: HashSet<Aci>,
    priority_denials: HashSet<Aci>,
}

impl Acl {
    /// Creates an empty ACL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn evict(&mut self, aci: &Aci) {
        self.grants.remove(aci);
        self.denials.remove(aci);
        self.priority_grants.remove(aci);
        self.priority_denials.remove(aci);
    }

    /// Grants a permission to a subject, at normal or priority tier.
    pub fn grant(&mut self, subject: Subject, permission: Permission, priority: bool) {
        let aci = Aci::new(subject, permission);
        self.evict(&aci);
        if priority {
            self.priority_grants.insert(aci);
        } else {
            self.grants.insert(aci);
        }
    }

    /// Denies a permission to a subject, at normal or priority tier.
    pub fn deny(&mut self, subject: Subject, permission: Permission, priority: bool) {
        let aci = Aci::new(subject, permission);
        self.evict(&aci);
        if priority {
            self.priority_denials.insert(aci);
        } else {
            self.denials.insert(aci);
        }
    }

    /// Revokes a grant. The item is removed from every set.
    pub fn revoke_grant(&mut self, subject: Subject, permission: Permission) {
        self.evict(&Aci::new(subject, permission));
    }

    /// Revokes a denial. The item is removed from every set.
    pub fn revoke_denial(&mut self, subject: Subject, permission: Permission) {
        self.evict(&Aci::new(subject, permission));
    }

    /// Resolves the effective permission set of a subject.
    ///
    /// `effective = ((grants − denials) ∪ priority_grants) − priority_denials`
    #[must_use]
    pub fn permissions_for(&self, subject: &Subject) -> HashSet<Permission> {
        let of = |set: &HashSet<Aci>| -> HashSet<Permission> {
            set.iter()
                .filter(|aci| &aci.subject == subject)
                .map(|aci| aci.permission.clone())
                .collect()
        };

        let grants = of(&self.grants);
        let denials = of(&self.denials);
        let priority_grants = of(&self.priority_grants);
        let priority_denials = of(&self.priority_denials);

        let mut effective: HashSet<Permission> =
            grants.difference(&denials).cloned().collect();
        effective.extend(priority_grants);
        effective.difference(&priority_denials).cloned().collect()
    }

    /// Returns true if the subject holds the permission.
    #[must_use]
    pub fn is_permitted(&self, subject: &Subject, permission: &Permission) -> bool {
        self.permissions_for(subject).contains(permission)
    }

    /// Returns true if no set contains any item.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
            && self.denials.is_empty()
            && self.priority_grants.is_empty()
            && self.priority_denials.is_empty()
    }

    /// Removes every item from every set.
    pub fn clear(&mut self) {
        self.grants.clear();
        self.denials.clear();
        self.priority_grants.clear();
        self.priority_denials.clear();
    }

    /// Iterates over the normal-tier grants.
    pub fn grants(&self) -> impl Iterator<Item = &Aci> {
        self.grants.iter()
    }

    /// Iterates over the normal-tier denials.
    pub fn denials(&self) -> impl Iterator<Item = &Aci> {
        self.denials.iter()
    }

    /// Iterates over the priority grants.
    pub fn priority_grants(&self) -> impl Iterator<Item = &Aci> {
        self.priority_grants.iter()
    }

    /// Iterates over the priority denials.
    pub fn priority_denials(&self) -> impl Iterator<Item = &Aci> {
        self.priority_denials.iter()
    }
}
