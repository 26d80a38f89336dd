//! How an area is used across the entry set.

use std::fmt;

/// Whether an area is used as an inclusion, an exclusion, or both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AreaState {
    /// Not used by any active entry.
    #[default]
    None,
    /// Only used as an inclusion area.
    Inclusion,
    /// Only used as an exclusion area.
    Exclusion,
    /// Included for some layers and excluded for others.
    Both,
}

impl AreaState {
    /// Folds one more usage into the state.
    pub fn with_usage(self, include_area: bool) -> Self {
        match (self, include_area) {
            (AreaState::None, true) | (AreaState::Inclusion, true) => AreaState::Inclusion,
            (AreaState::None, false) | (AreaState::Exclusion, false) => AreaState::Exclusion,
            _ => AreaState::Both,
        }
    }
}

impl fmt::Display for AreaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AreaState::None => "none",
            AreaState::Inclusion => "inclusion",
            AreaState::Exclusion => "exclusion",
            AreaState::Both => "both",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_usage() {
        assert_eq!(AreaState::None.with_usage(true), AreaState::Inclusion);
        assert_eq!(AreaState::None.with_usage(false), AreaState::Exclusion);
        assert_eq!(AreaState::Inclusion.with_usage(true), AreaState::Inclusion);
        assert_eq!(AreaState::Inclusion.with_usage(false), AreaState::Both);
        assert_eq!(AreaState::Exclusion.with_usage(true), AreaState::Both);
        assert_eq!(AreaState::Both.with_usage(true), AreaState::Both);
    }
}
