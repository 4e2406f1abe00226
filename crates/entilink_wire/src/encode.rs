//! Typed encoding of containers and entities into wire elements.

use crate::element::RawElement;
use crate::tag::NodeTag;
use entilink_model::{Acl, Container, Entity, Message, Subject};
use std::collections::BTreeMap;

/// Encodes a request document: the container's entities under a
/// `Request` root. Requests carry no messages.
#[must_use]
pub fn encode_request(container: &Container) -> RawElement {
    let mut root = RawElement::new(NodeTag::Request.as_str());
    for entity in container.iter() {
        root.push_child(entity_to_element(entity));
    }
    root
}

/// Encodes a response document: entities, container messages and the
/// `timestamp`/`srid` metadata under a `Response` root.
#[must_use]
pub fn encode_response(container: &Container) -> RawElement {
    let mut root = RawElement::new(NodeTag::Response.as_str());
    if let Some(ref timestamp) = container.timestamp {
        root.set_attribute("timestamp", timestamp);
    }
    if let Some(ref srid) = container.srid {
        root.set_attribute("srid", srid);
    }
    for message in &container.messages {
        if let Some(element) = message_to_element(message) {
            root.push_child(element);
        }
    }
    for entity in container.iter() {
        root.push_child(entity_to_element(entity));
    }
    root
}

/// Encodes one entity with its value, properties, parents, messages, ACL
/// and version.
///
/// Attribute values come from the delegating accessors, so a property
/// that merely wraps another entity serializes with that entity's
/// (temporary) id.
#[must_use]
pub fn entity_to_element(entity: &Entity) -> RawElement {
    let mut element = RawElement::new(NodeTag::for_role(entity.role()).as_str());

    set_attr(&mut element, "id", entity.id().map(|id| id.to_string()));
    set_attr(&mut element, "cuid", entity.cuid().map(|c| c.as_str().to_string()));
    set_attr(&mut element, "name", entity.name().map(str::to_string));
    set_attr(&mut element, "description", entity.description().map(str::to_string));
    set_attr(&mut element, "path", entity.path().map(str::to_string));
    set_attr(&mut element, "datatype", entity.datatype().map(str::to_string));
    set_attr(&mut element, "unit", entity.unit().map(str::to_string));
    set_attr(&mut element, "checksum", entity.checksum().map(str::to_string));
    set_attr(&mut element, "size", entity.size().map(|s| s.to_string()));

    if entity.is_deleted() {
        append_flag(&mut element, "deleted", None);
    }

    // An explicit empty string gets its marker element; null gets nothing.
    match entity.value() {
        Some("") => element.push_child(RawElement::new(NodeTag::EmptyString.as_str())),
        Some(value) => {
            element.push_child(RawElement::new(NodeTag::Value.as_str()).with_text(value));
        }
        None => {}
    }

    for entry in entity.properties.iter() {
        let mut child = entity_to_element(&entry.entity);
        if let Some(ref importance) = entry.importance {
            child.set_attribute("importance", importance.as_str());
        }
        append_flag(&mut child, "inheritance", Some(entry.inheritance.as_str()));
        element.push_child(child);
    }

    for entry in entity.parents.iter() {
        let mut child = RawElement::new(NodeTag::Parent.as_str());
        set_attr(&mut child, "id", entry.entity.id().map(|id| id.to_string()));
        set_attr(&mut child, "name", entry.entity.name().map(str::to_string));
        set_attr(
            &mut child,
            "description",
            entry.entity.description().map(str::to_string),
        );
        append_flag(&mut child, "inheritance", Some(entry.inheritance.as_str()));
        element.push_child(child);
    }

    for message in &entity.messages {
        if let Some(child) = message_to_element(message) {
            element.push_child(child);
        }
    }

    if let Some(ref acl) = entity.acl {
        if !acl.is_empty() {
            element.push_child(acl_to_element(acl));
        }
    }

    if let Some(version) = entity.version() {
        element.push_child(
            RawElement::new(NodeTag::Version.as_str()).with_attribute("id", version),
        );
    }

    element
}

/// Encodes a server-typed message. Client-defined message types stay
/// local and encode to nothing.
fn message_to_element(message: &Message) -> Option<RawElement> {
    let tag = if message.is_error() {
        NodeTag::Error
    } else if message.is_warning() {
        NodeTag::Warning
    } else if message.is_info() {
        NodeTag::Info
    } else {
        return None;
    };

    let mut element = RawElement::new(tag.as_str());
    if let Some(code) = message.code {
        element.set_attribute("code", code.to_string());
    }
    if let Some(ref description) = message.description {
        element.set_attribute("description", description);
    }
    if let Some(ref body) = message.body {
        element.text = Some(body.clone());
    }
    Some(element)
}

fn acl_to_element(acl: &Acl) -> RawElement {
    let mut element = RawElement::new(NodeTag::Acl.as_str());
    for (deny, priority, items) in [
        (false, false, acl.grants().collect::<Vec<_>>()),
        (false, true, acl.priority_grants().collect()),
        (true, false, acl.denials().collect()),
        (true, true, acl.priority_denials().collect()),
    ] {
        // Group by subject for one element per (subject, tier).
        let mut groups: BTreeMap<String, (&Subject, Vec<String>)> = BTreeMap::new();
        for aci in items {
            let entry = groups
                .entry(aci.subject.to_string())
                .or_insert((&aci.subject, Vec::new()));
            entry.1.push(aci.permission.as_str().to_string());
        }
        for (_, (subject, mut permissions)) in groups {
            permissions.sort();
            let tag = if deny { NodeTag::Deny } else { NodeTag::Grant };
            let mut child = RawElement::new(tag.as_str())
                .with_attribute("priority", priority.to_string());
            match subject {
                Subject::User { username, realm } => {
                    child.set_attribute("username", username);
                    if let Some(realm) = realm {
                        child.set_attribute("realm", realm);
                    }
                }
                Subject::Role(role) => child.set_attribute("role", role),
            }
            for permission in permissions {
                child.push_child(
                    RawElement::new(NodeTag::Permission.as_str())
                        .with_attribute("name", permission),
                );
            }
            element.push_child(child);
        }
    }
    element
}

fn set_attr(element: &mut RawElement, key: &str, value: Option<String>) {
    if let Some(value) = value {
        element.set_attribute(key, value);
    }
}

/// Appends a `key` or `key:value` pair to the comma-joined `flag`
/// attribute.
fn append_flag(element: &mut RawElement, key: &str, value: Option<&str>) {
    let pair = match value {
        Some(value) => format!("{key}:{value}"),
        None => key.to_string(),
    };
    let flag = match element.attribute("flag") {
        Some(existing) => format!("{existing},{pair}"),
        None => pair,
    };
    element.set_attribute("flag", flag);
}

#[cfg(test)]
mod tests {
    use super::*;
    use entilink_model::{EntityId, Importance, Inheritance, Permission};

    #[test]
    fn entity_attributes_are_encoded() {
        let mut entity = Entity::record("r")
            .with_description("a record")
            .with_datatype("TEXT")
            .with_unit("m");
        entity.set_id(EntityId::new(5)).unwrap();

        let element = entity_to_element(&entity);
        assert_eq!(element.tag, "Record");
        assert_eq!(element.attribute("id"), Some("5"));
        assert_eq!(element.attribute("name"), Some("r"));
        assert_eq!(element.attribute("description"), Some("a record"));
        assert_eq!(element.attribute("datatype"), Some("TEXT"));
        assert_eq!(element.attribute("unit"), Some("m"));
    }

    #[test]
    fn empty_string_value_gets_a_marker() {
        let entity = Entity::record("r").with_value("");
        let element = entity_to_element(&entity);
        assert!(element.children.iter().any(|c| c.tag == "EmptyString"));

        let entity = Entity::record("r");
        let element = entity_to_element(&entity);
        assert!(element.children.is_empty());

        let entity = Entity::record("r").with_value("42");
        let element = entity_to_element(&entity);
        let value = element.children.iter().find(|c| c.tag == "Value").unwrap();
        assert_eq!(value.text.as_deref(), Some("42"));
    }

    #[test]
    fn property_edges_carry_importance_and_flag() {
        let mut record = Entity::record("r");
        record.add_property_with(
            Entity::property("p"),
            Some(Importance::obligatory()),
            Some(Inheritance::Recommended),
        );

        let element = entity_to_element(&record);
        let prop = element.children.iter().find(|c| c.tag == "Property").unwrap();
        assert_eq!(prop.attribute("importance"), Some("OBLIGATORY"));
        assert_eq!(prop.attribute("flag"), Some("inheritance:recommended"));
    }

    #[test]
    fn deleted_flag_joins_the_flag_attribute() {
        let mut record = Entity::record("r");
        record.set_deleted(true);
        let mut parent_owner = Entity::record("o");
        parent_owner.add_property(record);

        let element = entity_to_element(&parent_owner);
        let child = element.children.first().unwrap();
        assert_eq!(child.attribute("flag"), Some("deleted,inheritance:fix"));
    }

    #[test]
    fn acl_groups_by_subject_and_tier() {
        let mut acl = Acl::new();
        acl.grant(Subject::user("alice"), Permission::new("A"), false);
        acl.grant(Subject::user("alice"), Permission::new("B"), false);
        acl.deny(Subject::role("guests"), Permission::new("A"), true);

        let mut entity = Entity::record("r");
        entity.acl = Some(acl);

        let element = entity_to_element(&entity);
        let acl_el = element.children.iter().find(|c| c.tag == "ACL").unwrap();
        assert_eq!(acl_el.children.len(), 2);

        let grant = acl_el.children.iter().find(|c| c.tag == "Grant").unwrap();
        assert_eq!(grant.attribute("username"), Some("alice"));
        assert_eq!(grant.attribute("priority"), Some("false"));
        assert_eq!(grant.children.len(), 2);

        let deny = acl_el.children.iter().find(|c| c.tag == "Deny").unwrap();
        assert_eq!(deny.attribute("role"), Some("guests"));
        assert_eq!(deny.attribute("priority"), Some("true"));
    }

    #[test]
    fn response_root_carries_metadata() {
        let mut container = Container::new();
        container.timestamp = Some("1700".into());
        container.srid = Some("req-9".into());
        container.push(Entity::record("r"));

        let element = encode_response(&container);
        assert_eq!(element.tag, "Response");
        assert_eq!(element.attribute("timestamp"), Some("1700"));
        assert_eq!(element.attribute("srid"), Some("req-9"));
        assert_eq!(element.children.len(), 1);
    }
}
