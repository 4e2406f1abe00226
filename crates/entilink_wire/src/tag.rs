//! The closed set of element kinds the protocol knows.

use entilink_model::Role;

/// Kind of a wire element, decoded from its tag before any typed parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTag {
    /// A record entity.
    Record,
    /// A record type entity.
    RecordType,
    /// A property entity (or property edge of an entity).
    Property,
    /// A parent edge.
    Parent,
    /// A file entity.
    File,
    /// A generic entity.
    Entity,
    /// A value with text content.
    Value,
    /// The marker for an explicit empty-string value.
    EmptyString,
    /// An error message.
    Error,
    /// A warning message.
    Warning,
    /// An info message.
    Info,
    /// An access control list.
    Acl,
    /// A grant tier within an ACL.
    Grant,
    /// A denial tier within an ACL.
    Deny,
    /// A permission name within a grant or denial.
    Permission,
    /// An entity version.
    Version,
    /// A request document root.
    Request,
    /// A response document root.
    Response,
}

impl NodeTag {
    /// Decodes a tag name, case-insensitively.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "record" => Some(NodeTag::Record),
            "recordtype" => Some(NodeTag::RecordType),
            "property" => Some(NodeTag::Property),
            "parent" => Some(NodeTag::Parent),
            "file" => Some(NodeTag::File),
            "entity" => Some(NodeTag::Entity),
            "value" => Some(NodeTag::Value),
            "emptystring" => Some(NodeTag::EmptyString),
            "error" => Some(NodeTag::Error),
            "warning" => Some(NodeTag::Warning),
            "info" => Some(NodeTag::Info),
            "acl" => Some(NodeTag::Acl),
            "grant" => Some(NodeTag::Grant),
            "deny" => Some(NodeTag::Deny),
            "permission" => Some(NodeTag::Permission),
            "version" => Some(NodeTag::Version),
            "request" => Some(NodeTag::Request),
            "response" => Some(NodeTag::Response),
            _ => None,
        }
    }

    /// Returns the canonical tag name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NodeTag::Record => "Record",
            NodeTag::RecordType => "RecordType",
            NodeTag::Property => "Property",
            NodeTag::Parent => "Parent",
            NodeTag::File => "File",
            NodeTag::Entity => "Entity",
            NodeTag::Value => "Value",
            NodeTag::EmptyString => "EmptyString",
            NodeTag::Error => "Error",
            NodeTag::Warning => "Warning",
            NodeTag::Info => "Info",
            NodeTag::Acl => "ACL",
            NodeTag::Grant => "Grant",
            NodeTag::Deny => "Deny",
            NodeTag::Permission => "Permission",
            NodeTag::Version => "Version",
            NodeTag::Request => "Request",
            NodeTag::Response => "Response",
        }
    }

    /// Returns the entity role this tag stands for, if it is entity-like.
    #[must_use]
    pub fn role(self) -> Option<Role> {
        match self {
            NodeTag::Record => Some(Role::Record),
            NodeTag::RecordType => Some(Role::RecordType),
            NodeTag::Property => Some(Role::Property),
            NodeTag::Parent => Some(Role::Parent),
            NodeTag::File => Some(Role::File),
            NodeTag::Entity => Some(Role::Entity),
            _ => None,
        }
    }

    /// Returns the tag for an entity role.
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Record => NodeTag::Record,
            Role::RecordType => NodeTag::RecordType,
            Role::Property => NodeTag::Property,
            Role::Parent => NodeTag::Parent,
            Role::File => NodeTag::File,
            Role::Entity => NodeTag::Entity,
        }
    }
}
