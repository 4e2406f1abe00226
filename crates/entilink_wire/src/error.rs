//! Error types for the wire codec.

use thiserror::Error;

/// Result type for codec operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors that can occur while decoding wire elements.
#[derive(Debug, Error)]
pub enum WireError {
    /// The element tag is not part of the protocol.
    #[error("unknown element tag: {tag}")]
    UnknownTag {
        /// The offending tag.
        tag: String,
    },

    /// An attribute value could not be parsed.
    #[error("invalid attribute {attribute}: {value}")]
    InvalidAttribute {
        /// Attribute name.
        attribute: String,
        /// The unparseable value.
        value: String,
    },

    /// A required attribute is missing.
    #[error("element <{tag}> is missing attribute {attribute}")]
    MissingAttribute {
        /// Element tag.
        tag: String,
        /// Missing attribute name.
        attribute: String,
    },

    /// An element appeared where the protocol does not allow it.
    #[error("unexpected element <{tag}> inside <{context}>")]
    UnexpectedElement {
        /// The offending tag.
        tag: String,
        /// The enclosing element's tag.
        context: String,
    },
}

impl WireError {
    /// Creates an unknown-tag error.
    pub fn unknown_tag(tag: impl Into<String>) -> Self {
        Self::UnknownTag { tag: tag.into() }
    }

    /// Creates an invalid-attribute error.
    pub fn invalid_attribute(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates a missing-attribute error.
    pub fn missing_attribute(tag: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            tag: tag.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an unexpected-element error.
    pub fn unexpected_element(tag: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UnexpectedElement {
            tag: tag.into(),
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = WireError::unknown_tag("Widget");
        assert_eq!(err.to_string(), "unknown element tag: Widget");

        let err = WireError::missing_attribute("Grant", "username");
        assert!(err.to_string().contains("Grant"));
        assert!(err.to_string().contains("username"));
    }
}
