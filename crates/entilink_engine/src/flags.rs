//! Per-transaction behavior flags.

/// Flags controlling how one transaction is executed and how its response
/// is interpreted.
#[derive(Debug, Clone)]
pub struct TransactionFlags {
    /// Treat server warnings as errors (the `strict` transaction option).
    pub strict: bool,
    /// Reject ambiguous name matches when merging the response (the
    /// `uniquename` transaction option).
    pub unique_name: bool,
    /// Raise a structured failure when the response carries errors. When
    /// false, errors stay attached as messages and the call returns
    /// normally.
    pub raise_on_error: bool,
}

impl TransactionFlags {
    /// Creates the default flags.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets strict mode.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the unique-name policy.
    #[must_use]
    pub fn with_unique_name(mut self, unique: bool) -> Self {
        self.unique_name = unique;
        self
    }

    /// Sets whether response errors raise.
    #[must_use]
    pub fn with_raise_on_error(mut self, raise: bool) -> Self {
        self.raise_on_error = raise;
        self
    }

    /// Renders the flags the server cares about as key/value pairs for the
    /// request line. `raise_on_error` is client-side only and not
    /// included.
    #[must_use]
    pub fn as_pairs(&self) -> Vec<(&'static str, &'static str)> {
        let mut pairs = Vec::new();
        if self.strict {
            pairs.push(("strict", "true"));
        }
        if self.unique_name {
            pairs.push(("uniquename", "true"));
        }
        pairs
    }
}

impl Default for TransactionFlags {
    fn default() -> Self {
        Self {
            strict: false,
            unique_name: false,
            raise_on_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_raise_on_error() {
        let flags = TransactionFlags::new();
        assert!(flags.raise_on_error);
        assert!(!flags.strict);
        assert!(!flags.unique_name);
        assert!(flags.as_pairs().is_empty());
    }

    #[test]
    fn server_side_flags_render_as_pairs() {
        let flags = TransactionFlags::new()
            .with_strict(true)
            .with_unique_name(true)
            .with_raise_on_error(false);
        assert_eq!(
            flags.as_pairs(),
            vec![("strict", "true"), ("uniquename", "true")]
        );
    }
}
