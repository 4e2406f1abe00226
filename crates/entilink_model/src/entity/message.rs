//! Server and client messages attached to entities and containers.

use std::fmt;

/// Message types the server owns; these are cleared before every
/// transaction so stale results never survive a retry.
const SERVER_MESSAGE_TYPES: [&str; 3] = ["error", "warning", "info"];

/// A message attached to an entity or container.
///
/// `(type, code)` identifies a message within one message set; the type is
/// compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message type, e.g. `error`, `warning`, `info` or a client-defined tag.
    pub mtype: String,
    /// Numeric code, if any.
    pub code: Option<i64>,
    /// Human-readable description.
    pub description: Option<String>,
    /// Free-form body.
    pub body: Option<String>,
}

impl Message {
    /// Creates a new message.
    pub fn new(mtype: impl Into<String>, code: Option<i64>) -> Self {
        Self {
            mtype: mtype.into(),
            code,
            description: None,
            body: None,
        }
    }

    /// Creates an error message.
    pub fn error(code: Option<i64>, description: impl Into<String>) -> Self {
        Self::new("error", code).with_description(description)
    }

    /// Creates a warning message.
    pub fn warning(code: Option<i64>, description: impl Into<String>) -> Self {
        Self::new("warning", code).with_description(description)
    }

    /// Creates an info message.
    pub fn info(code: Option<i64>, description: impl Into<String>) -> Self {
        Self::new("info", code).with_description(description)
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns true if this is an error message.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.mtype.eq_ignore_ascii_case("error")
    }

    /// Returns true if this is a warning message.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.mtype.eq_ignore_ascii_case("warning")
    }

    /// Returns true if this is an info message.
    #[must_use]
    pub fn is_info(&self) -> bool {
        self.mtype.eq_ignore_ascii_case("info")
    }

    /// Returns true if this message's type is owned by the server.
    #[must_use]
    pub fn is_server_message(&self) -> bool {
        SERVER_MESSAGE_TYPES
            .iter()
            .any(|t| self.mtype.eq_ignore_ascii_case(t))
    }

    fn key_matches(&self, mtype: &str, code: Option<i64>) -> bool {
        self.mtype.eq_ignore_ascii_case(mtype) && self.code == code
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mtype)?;
        if let Some(code) = self.code {
            write!(f, "({code})")?;
        }
        if let Some(ref description) = self.description {
            write!(f, ": {description}")?;
        }
        Ok(())
    }
}

/// An ordered set of messages keyed by `(type, code)`.
///
/// Setting a message whose key already exists overwrites the previous
/// body/description in place, keeping the original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSet {
    entries: Vec<Message>,
}

impl MessageSet {
    /// Creates an empty message set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a message, overwriting any message with an equal key.
    pub fn set(&mut self, message: Message) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|m| m.key_matches(&message.mtype, message.code))
        {
            *existing = message;
        } else {
            self.entries.push(message);
        }
    }

    /// Returns the message with the given key, if any.
    #[must_use]
    pub fn get(&self, mtype: &str, code: Option<i64>) -> Option<&Message> {
        self.entries.iter().find(|m| m.key_matches(mtype, code))
    }

    /// Removes the message with the given key, returning it.
    pub fn remove(&mut self, mtype: &str, code: Option<i64>) -> Option<Message> {
        let idx = self.entries.iter().position(|m| m.key_matches(mtype, code))?;
        Some(self.entries.remove(idx))
    }

    /// Removes all messages with the reserved server types
    /// (`error`, `warning`, `info`).
    pub fn clear_server_messages(&mut self) {
        self.entries.retain(|m| !m.is_server_message());
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates over all messages in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    /// Iterates over the error messages in insertion order.
    pub fn errors(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().filter(|m| m.is_error())
    }

    /// Iterates over the warning messages in insertion order.
    pub fn warnings(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().filter(|m| m.is_warning())
    }

    /// Returns true if the set contains at least one error message.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(Message::is_error)
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-types every warning message as an error, in place.
    ///
    /// Used by the strict transaction mode, where server warnings must be
    /// treated as failures.
    pub fn promote_warnings(&mut self) {
        for message in &mut self.entries {
            if message.is_warning() {
                message.mtype = "error".into();
            }
        }
    }
}

impl<'a> IntoIterator for &'a MessageSet {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_same_key() {
        let mut set = MessageSet::new();
        set.set(Message::error(Some(101), "first"));
        set.set(Message::info(None, "keep me"));
        set.set(Message::error(Some(101), "second"));

        assert_eq!(set.len(), 2);
        let msg = set.get("error", Some(101)).unwrap();
        assert_eq!(msg.description.as_deref(), Some("second"));
    }

    #[test]
    fn key_type_is_case_insensitive() {
        let mut set = MessageSet::new();
        set.set(Message::new("Error", Some(1)).with_description("a"));
        set.set(Message::new("ERROR", Some(1)).with_description("b"));

        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get("error", Some(1)).unwrap().description.as_deref(),
            Some("b")
        );
    }

    #[test]
    fn clear_server_messages_keeps_custom_types() {
        let mut set = MessageSet::new();
        set.set(Message::error(Some(101), "gone"));
        set.set(Message::warning(None, "gone"));
        set.set(Message::info(None, "gone"));
        set.set(Message::new("history", None).with_body("stays"));

        set.clear_server_messages();
        assert_eq!(set.len(), 1);
        assert!(set.get("history", None).is_some());
    }

    #[test]
    fn promote_warnings_retypes() {
        let mut set = MessageSet::new();
        set.set(Message::warning(Some(3), "suspicious"));
        assert!(!set.has_errors());

        set.promote_warnings();
        assert!(set.has_errors());
        assert_eq!(set.errors().count(), 1);
    }

    #[test]
    fn different_codes_are_different_messages() {
        let mut set = MessageSet::new();
        set.set(Message::error(Some(1), "one"));
        set.set(Message::error(Some(2), "two"));
        set.set(Message::error(None, "none"));
        assert_eq!(set.len(), 3);
    }
}
