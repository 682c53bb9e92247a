//! Comparison modes of a filter leaf.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// The comparison a filter applies to its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Unrecognised mode. Never compiles.
    Invalid,
    /// `field = v`
    Equal,
    /// `field != v`
    NotEqual,
    /// `field > v`
    Gt,
    /// `field >= v`
    Ge,
    /// `field < v`
    Lt,
    /// `field <= v`
    Le,
    /// `field` is one of a list.
    In,
    /// `field` is none of a list.
    NotIn,
    /// `lo <= field <= hi`
    Range,
    /// `field` matches a regular expression.
    Regexp,
}

impl FilterMode {
    /// Returns true for modes a contiguous key range can serve.
    ///
    /// In, NotIn, NotEqual and Regexp never qualify; they are always
    /// verified row by row.
    pub const fn is_range_scannable(self) -> bool {
        matches!(
            self,
            FilterMode::Equal
                | FilterMode::Lt
                | FilterMode::Le
                | FilterMode::Gt
                | FilterMode::Ge
                | FilterMode::Range
        )
    }

    /// Parses a short mode tag such as `ge` or `in`.
    ///
    /// Unknown tags yield [`FilterMode::Invalid`].
    pub fn parse(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "eq" => FilterMode::Equal,
            "ne" => FilterMode::NotEqual,
            "gt" => FilterMode::Gt,
            "ge" | "gte" => FilterMode::Ge,
            "lt" => FilterMode::Lt,
            "le" | "lte" => FilterMode::Le,
            "in" => FilterMode::In,
            "ni" | "nin" => FilterMode::NotIn,
            "rg" => FilterMode::Range,
            "re" => FilterMode::Regexp,
            _ => FilterMode::Invalid,
        }
    }

    /// Returns the short tag of the mode.
    pub const fn tag(self) -> &'static str {
        match self {
            FilterMode::Invalid => "invalid",
            FilterMode::Equal => "eq",
            FilterMode::NotEqual => "ne",
            FilterMode::Gt => "gt",
            FilterMode::Ge => "ge",
            FilterMode::Lt => "lt",
            FilterMode::Le => "le",
            FilterMode::In => "in",
            FilterMode::NotIn => "ni",
            FilterMode::Range => "rg",
            FilterMode::Regexp => "re",
        }
    }

    /// Returns the operator symbol used when printing conditions.
    pub const fn symbol(self) -> &'static str {
        match self {
            FilterMode::Invalid => "?",
            FilterMode::Equal => "=",
            FilterMode::NotEqual => "!=",
            FilterMode::Gt => ">",
            FilterMode::Ge => ">=",
            FilterMode::Lt => "<",
            FilterMode::Le => "<=",
            FilterMode::In => "IN",
            FilterMode::NotIn => "NOT IN",
            FilterMode::Range => "BETWEEN",
            FilterMode::Regexp => "~",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for FilterMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::parse(s) {
            FilterMode::Invalid => Err(CoreError::invalid_condition(format!(
                "unknown filter mode {s:?}"
            ))),
            mode => Ok(mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_scannable_modes() {
        let scannable = [
            FilterMode::Equal,
            FilterMode::Lt,
            FilterMode::Le,
            FilterMode::Gt,
            FilterMode::Ge,
            FilterMode::Range,
        ];
        for mode in scannable {
            assert!(mode.is_range_scannable(), "{mode:?}");
        }
        for mode in [
            FilterMode::Invalid,
            FilterMode::NotEqual,
            FilterMode::In,
            FilterMode::NotIn,
            FilterMode::Regexp,
        ] {
            assert!(!mode.is_range_scannable(), "{mode:?}");
        }
    }

    #[test]
    fn tags_round_trip() {
        for tag in ["eq", "ne", "gt", "ge", "lt", "le", "in", "ni", "rg", "re"] {
            assert_eq!(FilterMode::parse(tag).tag(), tag);
        }
        assert_eq!(FilterMode::parse("GTE"), FilterMode::Ge);
        assert_eq!(FilterMode::parse("like"), FilterMode::Invalid);
        assert!("like".parse::<FilterMode>().is_err());
    }

    #[test]
    fn display_symbols() {
        assert_eq!(FilterMode::Ge.to_string(), ">=");
        assert_eq!(FilterMode::NotIn.to_string(), "NOT IN");
    }
}
