//! Typed decoding of wire elements into containers and entities.

use crate::element::RawElement;
use crate::error::{WireError, WireResult};
use crate::tag::NodeTag;
use entilink_model::{
    Acl, Container, Cuid, Entity, EntityId, Importance, Inheritance, Message, ParentEntry,
    PropertyEntry, Subject,
};

/// Decodes a full document. The root must be a `Request` or `Response`
/// element; `timestamp` and `srid` attributes become container metadata.
pub fn container_from_element(element: &RawElement) -> WireResult<Container> {
    let tag = NodeTag::from_tag(&element.tag)
        .ok_or_else(|| WireError::unknown_tag(&element.tag))?;
    if !matches!(tag, NodeTag::Request | NodeTag::Response) {
        return Err(WireError::unexpected_element(&element.tag, "document root"));
    }

    let mut container = Container::new();
    container.timestamp = element.attribute("timestamp").map(str::to_string);
    container.srid = element.attribute("srid").map(str::to_string);

    for child in &element.children {
        let child_tag = NodeTag::from_tag(&child.tag)
            .ok_or_else(|| WireError::unknown_tag(&child.tag))?;
        match child_tag {
            NodeTag::Record
            | NodeTag::RecordType
            | NodeTag::Property
            | NodeTag::File
            | NodeTag::Entity => container.push(entity_from_element(child)?),
            NodeTag::Error | NodeTag::Warning | NodeTag::Info => {
                container.messages.set(message_from_element(child, child_tag)?);
            }
            _ => {
                return Err(WireError::unexpected_element(&child.tag, &element.tag));
            }
        }
    }
    Ok(container)
}

/// Decodes one entity element, including its value, property and parent
/// edges, messages, ACL and version.
pub fn entity_from_element(element: &RawElement) -> WireResult<Entity> {
    let tag = NodeTag::from_tag(&element.tag)
        .ok_or_else(|| WireError::unknown_tag(&element.tag))?;
    let role = tag
        .role()
        .ok_or_else(|| WireError::unexpected_element(&element.tag, "entity position"))?;

    let mut entity = Entity::new(role);

    if let Some(raw) = element.attribute("id") {
        let id: i64 = raw
            .parse()
            .map_err(|_| WireError::invalid_attribute("id", raw))?;
        entity
            .set_id(EntityId::new(id))
            .map_err(|_| WireError::invalid_attribute("id", raw))?;
    }
    if let Some(cuid) = element.attribute("cuid") {
        entity.set_cuid(Cuid::new(cuid));
    }
    if let Some(name) = element.attribute("name") {
        entity.set_name(name);
    }
    if let Some(description) = element.attribute("description") {
        entity.set_description(description);
    }
    if let Some(path) = element.attribute("path") {
        entity.set_path(path);
    }
    if let Some(datatype) = element.attribute("datatype") {
        entity.set_datatype(datatype);
    }
    if let Some(unit) = element.attribute("unit") {
        entity.set_unit(unit);
    }
    if let Some(checksum) = element.attribute("checksum") {
        entity.set_checksum(checksum);
    }
    if let Some(raw) = element.attribute("size") {
        let size: u64 = raw
            .parse()
            .map_err(|_| WireError::invalid_attribute("size", raw))?;
        entity.set_size(size);
    }

    // The entity-level flag the protocol knows is "deleted"; edge-level
    // pairs like "inheritance" are read by the enclosing element.
    for (key, _) in parse_flags(element.attribute("flag")) {
        if key == "deleted" {
            entity.set_deleted(true);
        }
    }

    for child in &element.children {
        let child_tag = NodeTag::from_tag(&child.tag)
            .ok_or_else(|| WireError::unknown_tag(&child.tag))?;
        match child_tag {
            NodeTag::Record
            | NodeTag::RecordType
            | NodeTag::Property
            | NodeTag::File
            | NodeTag::Entity => {
                // A property edge: importance and inheritance describe the
                // edge, not the property entity. Importance stays absent
                // when the element does not carry it.
                let property = entity_from_element(child)?;
                let importance = child.attribute("importance").map(Importance::new);
                let inheritance = edge_inheritance(child)?;
                entity.properties.push(PropertyEntry {
                    entity: property,
                    importance,
                    inheritance,
                });
            }
            NodeTag::Parent => {
                let parent = entity_from_element(child)?;
                let inheritance = edge_inheritance(child)?;
                entity.parents.insert(ParentEntry {
                    entity: parent,
                    inheritance,
                });
            }
            NodeTag::Value => {
                entity.set_value(child.text.clone().unwrap_or_default());
            }
            NodeTag::EmptyString => entity.set_value(""),
            NodeTag::Error | NodeTag::Warning | NodeTag::Info => {
                entity.messages.set(message_from_element(child, child_tag)?);
            }
            NodeTag::Acl => entity.acl = Some(acl_from_element(child)?),
            NodeTag::Version => {
                let id = child
                    .attribute("id")
                    .ok_or_else(|| WireError::missing_attribute(&child.tag, "id"))?;
                entity.set_version(id);
            }
            _ => {
                return Err(WireError::unexpected_element(&child.tag, &element.tag));
            }
        }
    }

    Ok(entity)
}

fn message_from_element(element: &RawElement, tag: NodeTag) -> WireResult<Message> {
    let mtype = match tag {
        NodeTag::Error => "error",
        NodeTag::Warning => "warning",
        _ => "info",
    };
    let code = match element.attribute("code") {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| WireError::invalid_attribute("code", raw))?,
        ),
        None => None,
    };

    let mut message = Message::new(mtype, code);
    message.description = element.attribute("description").map(str::to_string);
    message.body = element.text.clone();
    Ok(message)
}

fn acl_from_element(element: &RawElement) -> WireResult<Acl> {
    let mut acl = Acl::new();
    for child in &element.children {
        let tag = NodeTag::from_tag(&child.tag)
            .ok_or_else(|| WireError::unknown_tag(&child.tag))?;
        let deny = match tag {
            NodeTag::Grant => false,
            NodeTag::Deny => true,
            _ => return Err(WireError::unexpected_element(&child.tag, &element.tag)),
        };
        let priority = match child.attribute("priority") {
            Some(raw) => raw
                .parse::<bool>()
                .map_err(|_| WireError::invalid_attribute("priority", raw))?,
            None => false,
        };
        let subject = subject_from_element(child)?;

        for item in &child.children {
            match NodeTag::from_tag(&item.tag) {
                Some(NodeTag::Permission) => {
                    let name = item
                        .attribute("name")
                        .ok_or_else(|| WireError::missing_attribute(&item.tag, "name"))?;
                    if deny {
                        acl.deny(subject.clone(), name.into(), priority);
                    } else {
                        acl.grant(subject.clone(), name.into(), priority);
                    }
                }
                Some(_) => {
                    return Err(WireError::unexpected_element(&item.tag, &child.tag));
                }
                None => return Err(WireError::unknown_tag(&item.tag)),
            }
        }
    }
    Ok(acl)
}

fn subject_from_element(element: &RawElement) -> WireResult<Subject> {
    if let Some(role) = element.attribute("role") {
        return Ok(Subject::role(role));
    }
    let username = element
        .attribute("username")
        .ok_or_else(|| WireError::missing_attribute(&element.tag, "username"))?;
    Ok(match element.attribute("realm") {
        Some(realm) => Subject::user_in_realm(username, realm),
        None => Subject::user(username),
    })
}

/// Reads the `inheritance` pair of a child element's flag attribute,
/// defaulting to [`Inheritance::Fix`] when absent.
fn edge_inheritance(element: &RawElement) -> WireResult<Inheritance> {
    for (key, value) in parse_flags(element.attribute("flag")) {
        if key == "inheritance" {
            let value = value.unwrap_or_default();
            return Inheritance::parse(value)
                .ok_or_else(|| WireError::invalid_attribute("flag", value));
        }
    }
    Ok(Inheritance::default())
}

/// Splits a comma-joined flag attribute into `key` / `key:value` pairs.
fn parse_flags(flag: Option<&str>) -> Vec<(&str, Option<&str>)> {
    match flag {
        Some(flag) => flag
            .split(',')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once(':') {
                Some((key, value)) => (key, Some(value)),
                None => (pair, None),
            })
            .collect(),
        None => Vec::new(),
    }
}
