//! Structured transaction-error aggregation.
//!
//! After a failed transaction, entities and containers carry raw error
//! messages with numeric codes. This module walks an entity or container
//! tree, maps the codes to fixed error kinds and builds one hierarchical
//! failure out of them.
//!
//! The collapsing rule is uniform: zero errors means success, exactly one
//! error is raised directly, two or more are wrapped in an aggregate node
//! holding the list in walk order.

use crate::container::Container;
use crate::entity::{Entity, Message};
use crate::error::ModelResult;
use std::fmt;

/// The fixed error kinds raw codes map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityErrorKind {
    /// Code 101: the entity does not exist.
    EntityNotFound,
    /// Code 110: the entity has no datatype.
    EntityHasNoDatatype,
    /// Code 403: the caller is not authorized.
    NotAuthorized,
    /// Code 114: one or more properties are unqualified; sub-errors
    /// describe which.
    UnqualifiedProperties,
    /// Code 116: one or more parents are unqualified; sub-errors describe
    /// which.
    UnqualifiedParents,
    /// Code 152: the name is not unique.
    DuplicateName,
    /// Code 12, container level only: the transaction was rolled back
    /// because one entity failed.
    AtomicityViolation,
    /// Any other code: a generic entity error.
    Generic,
    /// A composite holding two or more sub-errors.
    Aggregate,
}

impl EntityErrorKind {
    /// Maps an entity-level error code to its kind.
    #[must_use]
    pub fn from_entity_code(code: Option<i64>) -> Self {
        match code {
            Some(101) => EntityErrorKind::EntityNotFound,
            Some(110) => EntityErrorKind::EntityHasNoDatatype,
            Some(403) => EntityErrorKind::NotAuthorized,
            Some(114) => EntityErrorKind::UnqualifiedProperties,
            Some(116) => EntityErrorKind::UnqualifiedParents,
            Some(152) => EntityErrorKind::DuplicateName,
            _ => EntityErrorKind::Generic,
        }
    }

    /// Maps a container-level error code to its kind.
    #[must_use]
    pub fn from_container_code(code: Option<i64>) -> Self {
        match code {
            Some(12) => EntityErrorKind::AtomicityViolation,
            _ => EntityErrorKind::Generic,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            EntityErrorKind::EntityNotFound => "entity does not exist",
            EntityErrorKind::EntityHasNoDatatype => "entity has no datatype",
            EntityErrorKind::NotAuthorized => "not authorized",
            EntityErrorKind::UnqualifiedProperties => "unqualified properties",
            EntityErrorKind::UnqualifiedParents => "unqualified parents",
            EntityErrorKind::DuplicateName => "name is not unique",
            EntityErrorKind::AtomicityViolation => "transaction rolled back",
            EntityErrorKind::Generic => "entity error",
            EntityErrorKind::Aggregate => "multiple errors",
        }
    }
}

/// One node of a structured transaction failure.
#[derive(Debug, Clone)]
pub struct TransactionError {
    /// The error kind.
    pub kind: EntityErrorKind,
    /// The raw code of the originating message, if any.
    pub code: Option<i64>,
    /// Description of the originating message.
    pub description: Option<String>,
    /// Label of the entity the error belongs to (name, id or path).
    pub subject: Option<String>,
    /// Sub-errors in walk order.
    pub errors: Vec<TransactionError>,
}

impl TransactionError {
    fn from_message(kind: EntityErrorKind, message: &Message, subject: Option<String>) -> Self {
        Self {
            kind,
            code: message.code,
            description: message.description.clone(),
            subject,
            errors: Vec::new(),
        }
    }

    /// Creates an aggregate node over two or more sub-errors.
    #[must_use]
    pub fn aggregate(errors: Vec<TransactionError>, subject: Option<String>) -> Self {
        Self {
            kind: EntityErrorKind::Aggregate,
            code: None,
            description: None,
            subject,
            errors,
        }
    }

    /// Returns true if this node or any descendant has the given kind.
    #[must_use]
    pub fn contains_kind(&self, kind: EntityErrorKind) -> bool {
        self.kind == kind || self.errors.iter().any(|e| e.contains_kind(kind))
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            f.write_str("  ")?;
        }
        f.write_str(self.kind.describe())?;
        if let Some(code) = self.code {
            write!(f, " ({code})")?;
        }
        if let Some(ref subject) = self.subject {
            write!(f, " [{subject}]")?;
        }
        if let Some(ref description) = self.description {
            write!(f, ": {description}")?;
        }
        for child in &self.errors {
            f.write_str("\n")?;
            child.render(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

impl std::error::Error for TransactionError {}

fn entity_label(entity: &Entity) -> Option<String> {
    entity
        .name()
        .map(str::to_string)
        .or_else(|| entity.id().map(|id| id.to_string()))
        .or_else(|| entity.path().map(str::to_string))
}

/// Walks one entity and returns its structured errors in walk order.
///
/// Codes 114 and 116 recurse into properties respectively parents for
/// sub-errors and suppress the later generic scan over the same children;
/// without them, properties and then parents are scanned generically.
#[must_use]
pub fn entity_errors(entity: &Entity) -> Vec<TransactionError> {
    let mut out = Vec::new();
    let mut suppress_properties = false;
    let mut suppress_parents = false;

    for message in entity.messages.errors() {
        let kind = EntityErrorKind::from_entity_code(message.code);
        let mut node = TransactionError::from_message(kind, message, entity_label(entity));
        match kind {
            EntityErrorKind::UnqualifiedProperties => {
                suppress_properties = true;
                for entry in entity.properties.iter() {
                    node.errors.extend(entity_errors(&entry.entity));
                }
            }
            EntityErrorKind::UnqualifiedParents => {
                suppress_parents = true;
                for entry in entity.parents.iter() {
                    node.errors.extend(entity_errors(&entry.entity));
                }
            }
            _ => {}
        }
        out.push(node);
    }

    if !suppress_properties {
        for entry in entity.properties.iter() {
            out.extend(entity_errors(&entry.entity));
        }
    }
    if !suppress_parents {
        for entry in entity.parents.iter() {
            out.extend(entity_errors(&entry.entity));
        }
    }
    out
}

/// Walks a container and returns its structured errors in walk order.
///
/// Unlike the entity walk, every entity of the container is always
/// scanned; a container-level atomicity violation (code 12) adopts the
/// entity errors as its sub-errors instead of leaving them at top level.
#[must_use]
pub fn container_errors(container: &Container) -> Vec<TransactionError> {
    let entity_subs: Vec<TransactionError> =
        container.iter().flat_map(entity_errors).collect();

    let mut out = Vec::new();
    let mut adopted = false;
    for message in container.messages.errors() {
        let kind = EntityErrorKind::from_container_code(message.code);
        let mut node = TransactionError::from_message(kind, message, None);
        if kind == EntityErrorKind::AtomicityViolation && !adopted {
            node.errors = entity_subs.clone();
            adopted = true;
        }
        out.push(node);
    }
    if !adopted {
        out.extend(entity_subs);
    }
    out
}

fn collapse(
    mut errors: Vec<TransactionError>,
    subject: Option<String>,
) -> Option<TransactionError> {
    match errors.len() {
        0 => None,
        1 => Some(errors.remove(0)),
        _ => Some(TransactionError::aggregate(errors, subject)),
    }
}

/// Raises the structured failure of an entity, if it has errors.
pub fn raise_entity_errors(entity: &Entity) -> ModelResult<()> {
    match collapse(entity_errors(entity), entity_label(entity)) {
        None => Ok(()),
        Some(error) => Err(error.into()),
    }
}

/// Raises the structured failure of a container, if it has errors.
pub fn raise_container_errors(container: &Container) -> ModelResult<()> {
    match collapse(container_errors(container), None) {
        None => Ok(()),
        Some(error) => Err(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    fn entity_with_error(name: &str, code: i64) -> Entity {
        let mut entity = Entity::record(name);
        entity.add_message(Message::error(Some(code), format!("code {code}")));
        entity
    }

    #[test]
    fn single_error_collapses_to_its_kind() {
        let entity = entity_with_error("r", 101);
        let err = raise_entity_errors(&entity).unwrap_err();
        let ModelError::Transaction(tree) = err else {
            panic!("expected transaction error");
        };
        assert_eq!(tree.kind, EntityErrorKind::EntityNotFound);
        assert!(tree.errors.is_empty());
    }

    #[test]
    fn two_errors_collapse_to_an_aggregate() {
        let mut entity = Entity::record("r");
        entity.add_message(Message::error(Some(101), "gone"));
        entity.add_message(Message::error(Some(403), "forbidden"));

        let err = raise_entity_errors(&entity).unwrap_err();
        let ModelError::Transaction(tree) = err else {
            panic!("expected transaction error");
        };
        assert_eq!(tree.kind, EntityErrorKind::Aggregate);
        assert_eq!(tree.errors.len(), 2);
        assert_eq!(tree.errors[0].kind, EntityErrorKind::EntityNotFound);
        assert_eq!(tree.errors[1].kind, EntityErrorKind::NotAuthorized);
    }

    #[test]
    fn unqualified_properties_recurse_in_property_order() {
        // Spec'd shape: 114 with nested 101 and 152.
        let mut entity = Entity::record("r");
        entity.add_message(Message::error(Some(114), "unqualified"));
        entity.add_property(entity_with_error("missing", 101));
        entity.add_property(entity_with_error("dup", 152));

        let err = raise_entity_errors(&entity).unwrap_err();
        let ModelError::Transaction(tree) = err else {
            panic!("expected transaction error");
        };
        assert_eq!(tree.kind, EntityErrorKind::UnqualifiedProperties);
        let kinds: Vec<_> = tree.errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            [
                EntityErrorKind::EntityNotFound,
                EntityErrorKind::DuplicateName
            ]
        );
    }

    #[test]
    fn code_114_suppresses_only_the_property_scan() {
        // A parent error must still surface even when 114 is present.
        let mut entity = Entity::record("r");
        entity.add_message(Message::error(Some(114), "unqualified"));
        entity.add_property(entity_with_error("p", 101));
        entity.add_parent(entity_with_error("base", 403));

        let errors = entity_errors(&entity);
        // The 114 node (holding the property error) plus the parent error.
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].kind, EntityErrorKind::UnqualifiedProperties);
        assert_eq!(errors[0].errors.len(), 1);
        assert_eq!(errors[1].kind, EntityErrorKind::NotAuthorized);
    }

    #[test]
    fn generic_child_scan_runs_without_114() {
        let mut entity = Entity::record("r");
        entity.add_property(entity_with_error("p", 101));

        let errors = entity_errors(&entity);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, EntityErrorKind::EntityNotFound);
    }

    #[test]
    fn unknown_code_maps_to_generic() {
        let entity = entity_with_error("r", 999);
        let errors = entity_errors(&entity);
        assert_eq!(errors[0].kind, EntityErrorKind::Generic);
    }

    #[test]
    fn atomicity_violation_adopts_entity_errors() {
        let mut container = Container::new();
        container
            .messages
            .set(Message::error(Some(12), "rolled back"));
        container.push(entity_with_error("a", 101));
        container.push(entity_with_error("b", 152));

        let err = raise_container_errors(&container).unwrap_err();
        let ModelError::Transaction(tree) = err else {
            panic!("expected transaction error");
        };
        assert_eq!(tree.kind, EntityErrorKind::AtomicityViolation);
        let kinds: Vec<_> = tree.errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            [
                EntityErrorKind::EntityNotFound,
                EntityErrorKind::DuplicateName
            ]
        );
    }

    #[test]
    fn container_without_code_12_reports_entities_directly() {
        let mut container = Container::new();
        container.push(entity_with_error("a", 101));

        let err = raise_container_errors(&container).unwrap_err();
        let ModelError::Transaction(tree) = err else {
            panic!("expected transaction error");
        };
        assert_eq!(tree.kind, EntityErrorKind::EntityNotFound);
    }

    #[test]
    fn clean_container_raises_nothing() {
        let mut container = Container::new();
        container.push(Entity::record("fine"));
        assert!(raise_container_errors(&container).is_ok());
    }

    #[test]
    fn display_renders_the_tree() {
        let mut entity = Entity::record("r");
        entity.add_message(Message::error(Some(114), "unqualified"));
        entity.add_property(entity_with_error("p", 101));

        let errors = entity_errors(&entity);
        let rendered = errors[0].to_string();
        assert!(rendered.contains("unqualified properties"));
        assert!(rendered.contains("entity does not exist"));
    }
}
