//! Canonical hotkey representation.
//!
//! A hotkey is an *unordered set* of key symbols that must all be pressed
//! within the trigger window for its macro to fire.  Users write hotkeys in
//! whatever order feels natural (`"ctrl_l+alt_l+r"`), so the canonical form
//! sorts and deduplicates the symbols before joining them with `+`:
//!
//! ```text
//! "ctrl_l+alt_l+r"   ──►  "alt_l+ctrl_l+r"
//! " r + ctrl_l+r "   ──►  "ctrl_l+r"
//! ```
//!
//! Because the canonical string is what gets compared, hashed, persisted and
//! sent over the wire, two peers that typed the same combination in a
//! different order still agree on the macro's identity.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between key symbols in the textual form.
pub const KEY_SEPARATOR: char = '+';

/// Errors produced when parsing a hotkey string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HotkeyError {
    /// The string contained no key symbols after trimming.
    #[error("hotkey must contain at least one key")]
    Empty,
}

/// A canonical, non-empty set of key symbols.
///
/// # Examples
///
/// ```rust
/// use macrolink_core::Hotkey;
///
/// let a: Hotkey = "ctrl_l+alt_l+r".parse().unwrap();
/// let b: Hotkey = "r+alt_l+ctrl_l".parse().unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "alt_l+ctrl_l+r");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hotkey {
    canonical: String,
}

impl Hotkey {
    /// Parses and canonicalises a `+`-separated key list.
    ///
    /// # Errors
    ///
    /// Returns [`HotkeyError::Empty`] when no key symbol remains after trimming.
    pub fn parse(raw: &str) -> Result<Self, HotkeyError> {
        let keys: BTreeSet<&str> = raw
            .split(KEY_SEPARATOR)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect();

        if keys.is_empty() {
            return Err(HotkeyError::Empty);
        }

        let canonical = keys.into_iter().collect::<Vec<_>>().join("+");
        Ok(Self { canonical })
    }

    /// Returns the canonical string form.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Iterates the constituent key symbols in canonical (sorted) order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.canonical.split(KEY_SEPARATOR)
    }

    /// Number of distinct keys in the combination.
    pub fn len(&self) -> usize {
        self.keys().count()
    }

    /// Always `false`; a parsed hotkey has at least one key.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl FromStr for Hotkey {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Hotkey {
    type Error = HotkeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Hotkey> for String {
    fn from(value: Hotkey) -> Self {
        value.canonical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sorts_keys_into_canonical_order() {
        // Arrange / Act
        let hotkey = Hotkey::parse("ctrl_l+alt_l+r").unwrap();

        // Assert
        assert_eq!(hotkey.as_str(), "alt_l+ctrl_l+r");
    }

    #[test]
    fn test_parse_trims_and_deduplicates() {
        let hotkey = Hotkey::parse(" r + ctrl_l+r ").unwrap();
        assert_eq!(hotkey.as_str(), "ctrl_l+r");
        assert_eq!(hotkey.len(), 2);
    }

    #[test]
    fn test_parse_ignores_empty_segments() {
        let hotkey = Hotkey::parse("ctrl_l++f").unwrap();
        assert_eq!(hotkey.keys().collect::<Vec<_>>(), vec!["ctrl_l", "f"]);
    }

    #[test]
    fn test_parse_rejects_blank_input() {
        assert_eq!(Hotkey::parse(""), Err(HotkeyError::Empty));
        assert_eq!(Hotkey::parse(" + + "), Err(HotkeyError::Empty));
    }

    #[test]
    fn test_different_orders_compare_equal() {
        let a = Hotkey::parse("alt_l+ctrl_l+.").unwrap();
        let b = Hotkey::parse(".+ctrl_l+alt_l").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        // Arrange
        let hotkey = Hotkey::parse("ctrl_l+alt_l+r").unwrap();

        // Act
        let json = serde_json::to_string(&hotkey).unwrap();
        let back: Hotkey = serde_json::from_str("\"r+ctrl_l+alt_l\"").unwrap();

        // Assert
        assert_eq!(json, "\"alt_l+ctrl_l+r\"");
        assert_eq!(back, hotkey);
    }

    #[test]
    fn test_serde_rejects_empty_hotkey() {
        let result: Result<Hotkey, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
