//! MIME-style `Key: value` header lists.

use std::fmt;

use thiserror::Error;

/// Header name of the transfer encoding selector.
pub const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";

/// Header name of the media type.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Raised when header text cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed header line {line}: {text:?}")]
pub struct HeaderParseError {
    /// One-based line number.
    pub line: usize,
    /// Offending text.
    pub text: String,
}

/// Ordered list of header fields. Names compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    fields: Vec<(String, String)>,
}

impl HeaderList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses newline-separated header text.
    ///
    /// Lines starting with whitespace continue the previous field. Blank
    /// lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderParseError`] for a line without a colon, an empty
    /// name, or a continuation with nothing to continue.
    pub fn parse(text: &str) -> Result<Self, HeaderParseError> {
        let mut list = Self::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let malformed = || HeaderParseError {
                line: index + 1,
                text: line.to_owned(),
            };
            if line.starts_with([' ', '\t']) {
                let (_, value) = list.fields.last_mut().ok_or_else(malformed)?;
                value.push(' ');
                value.push_str(line.trim());
                continue;
            }
            let (name, value) = line.split_once(':').ok_or_else(malformed)?;
            let name = name.trim();
            if name.is_empty() || name.contains([' ', '\t']) {
                return Err(malformed());
            }
            list.push(name, value.trim());
        }
        Ok(list)
    }

    /// Appends a field.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Replaces the first field called `name`, or appends it.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        match self
            .fields
            .iter_mut()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
        {
            Some((_, slot)) => *slot = value.into(),
            None => self.push(name, value),
        }
    }

    /// Value of the first field called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Requested transfer encoding, unless it is an identity encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> Option<&str> {
        self.get(CONTENT_TRANSFER_ENCODING)
            .filter(|value| !is_identity_encoding(value))
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when no fields are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn is_identity_encoding(value: &str) -> bool {
    ["7bit", "8bit", "binary"]
        .iter()
        .any(|identity| value.trim().eq_ignore_ascii_case(identity))
}

impl fmt::Display for HeaderList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.fields {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}
