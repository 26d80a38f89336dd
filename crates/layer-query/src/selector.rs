//! Identifier selectors used in the three key positions of an entry.

use std::fmt;

/// The token that means "all" in any key position.
pub const WILDCARD: &str = "*";

/// One key position of an [`Entry`](crate::Entry): a layer, area or filter id.
///
/// An empty string is [`Selector::Unspecified`] and never matches anything
/// specific. `"*"` is [`Selector::Wildcard`]. Anything else is a concrete id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "String", into = "String")
)]
pub enum Selector {
    /// No value was given.
    #[default]
    Unspecified,
    /// Matches every value known at expansion time.
    Wildcard,
    /// A concrete identifier.
    Id(String),
}

impl Selector {
    /// Creates a selector from its string form.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        match value.as_str() {
            "" => Selector::Unspecified,
            WILDCARD => Selector::Wildcard,
            _ => Selector::Id(value),
        }
    }

    /// Returns true for `*`.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Selector::Wildcard)
    }

    /// Returns true when no value was given.
    pub fn is_unspecified(&self) -> bool {
        matches!(self, Selector::Unspecified)
    }

    /// Returns true for a concrete identifier.
    pub fn is_concrete(&self) -> bool {
        matches!(self, Selector::Id(_))
    }

    /// Returns the concrete identifier, if any.
    pub fn as_id(&self) -> Option<&str> {
        match self {
            Selector::Id(id) => Some(id),
            _ => None,
        }
    }

    /// Returns the string form (`""`, `"*"` or the id).
    pub fn as_str(&self) -> &str {
        match self {
            Selector::Unspecified => "",
            Selector::Wildcard => WILDCARD,
            Selector::Id(id) => id,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Selector::new(value)
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        Selector::new(value)
    }
}

impl From<&String> for Selector {
    fn from(value: &String) -> Self {
        Selector::new(value.as_str())
    }
}

impl From<Selector> for String {
    fn from(value: Selector) -> Self {
        match value {
            Selector::Id(id) => id,
            other => other.as_str().to_string(),
        }
    }
}

impl PartialEq<str> for Selector {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Selector {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
