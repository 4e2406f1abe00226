//! Generic element tree as handed over by an XML decoder.

use std::collections::BTreeMap;

/// One decoded element: tag, attributes, text content and child elements.
///
/// Transports decode XML bytes into this shape before the typed decoder
/// takes over, and encode it back into bytes after the typed encoder ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawElement {
    /// Element tag.
    pub tag: String,
    /// Attributes in deterministic order.
    pub attributes: BTreeMap<String, String>,
    /// Text content, if any.
    pub text: Option<String>,
    /// Child elements in document order.
    pub children: Vec<RawElement>,
}

impl RawElement {
    /// Creates an element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Sets an attribute (builder form).
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sets the text content (builder form).
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Appends a child element (builder form).
    #[must_use]
    pub fn with_child(mut self, child: RawElement) -> Self {
        self.children.push(child);
        self
    }

    /// Sets an attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Appends a child element.
    pub fn push_child(&mut self, child: RawElement) {
        self.children.push(child);
    }
}
