//! Macro actions and their textual encoding.
//!
//! Each macro is an ordered list of actions.  Actions are stored and
//! replicated in a compact prefixed string form:
//!
//! | Text form          | Meaning                                   |
//! |--------------------|-------------------------------------------|
//! | `TEXT:<literal>`   | Type the literal text                     |
//! | `KEYS:<k1>+<k2>`   | Press and release the key combination     |
//! | `EXIT:`            | Ask the responder to end the session      |
//! | `MOVE:<x>,<y>`     | Move the cursor to an absolute position   |
//! | `MOVE_REL:<dx>,<dy>` | Move the cursor relative to its position |
//!
//! The initiator turns each action into exactly one wire message when a
//! macro fires (see [`crate::protocol::messages::WireMessage::from_action`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const TEXT_PREFIX: &str = "TEXT:";
const KEYS_PREFIX: &str = "KEYS:";
const EXIT_PREFIX: &str = "EXIT:";
const MOVE_PREFIX: &str = "MOVE:";
const MOVE_REL_PREFIX: &str = "MOVE_REL:";

/// Errors produced when parsing an action string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    /// The string does not start with a known prefix.
    #[error("invalid action {0:?}: expected a TEXT:, KEYS:, EXIT:, MOVE: or MOVE_REL: prefix")]
    UnknownPrefix(String),

    /// A `KEYS:` action named no keys.
    #[error("KEYS: action must name at least one key")]
    EmptyKeys,

    /// A `MOVE:`/`MOVE_REL:` action did not carry two integers.
    #[error("invalid coordinates {0:?}: expected two comma-separated integers")]
    BadCoordinates(String),

    /// A key name that cannot be written inside a `KEYS:` combination.
    #[error("invalid key name {0:?}: must be non-empty, without '+' or surrounding spaces")]
    InvalidKey(String),
}

/// A single step of a macro.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Action {
    /// Type literal text.
    Text(String),
    /// Press a key combination (all keys down, then all up).
    Keys(Vec<String>),
    /// End the remote session.
    Exit,
    /// Move the cursor to absolute screen coordinates.
    MoveTo { x: i32, y: i32 },
    /// Move the cursor by a relative offset.
    MoveBy { dx: i32, dy: i32 },
}

impl Action {
    /// Parses the prefixed textual form.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] for unknown prefixes, empty key lists, or
    /// unparsable coordinates.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use macrolink_core::Action;
    ///
    /// assert_eq!(Action::parse("TEXT:Hello").unwrap(), Action::Text("Hello".into()));
    /// assert_eq!(
    ///     Action::parse("KEYS:ctrl_l+right").unwrap(),
    ///     Action::Keys(vec!["ctrl_l".into(), "right".into()])
    /// );
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ActionError> {
        let raw = raw.trim_start();

        if let Some(rest) = raw.strip_prefix(MOVE_REL_PREFIX) {
            let (dx, dy) = parse_pair(rest)?;
            return Ok(Action::MoveBy { dx, dy });
        }
        if let Some(rest) = raw.strip_prefix(MOVE_PREFIX) {
            let (x, y) = parse_pair(rest)?;
            return Ok(Action::MoveTo { x, y });
        }
        if let Some(rest) = raw.strip_prefix(TEXT_PREFIX) {
            return Ok(Action::Text(rest.to_string()));
        }
        if let Some(rest) = raw.strip_prefix(KEYS_PREFIX) {
            let keys: Vec<String> = rest
                .split('+')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();
            if keys.is_empty() {
                return Err(ActionError::EmptyKeys);
            }
            return Ok(Action::Keys(keys));
        }
        if raw.starts_with(EXIT_PREFIX) {
            return Ok(Action::Exit);
        }

        Err(ActionError::UnknownPrefix(raw.to_string()))
    }

    /// Parses a comma-separated action list, the format used by the console
    /// (`"KEYS:right, TEXT:Hello"`).
    ///
    /// Unlike [`Action::parse`], text literals are trimmed: spaces around a
    /// list item are separator padding, not part of the text.
    ///
    /// # Errors
    ///
    /// Returns the first [`ActionError`] encountered.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, ActionError> {
        split_list(raw)
            .into_iter()
            .map(|item| {
                Action::parse(item).map(|action| match action {
                    Action::Text(text) => Action::Text(text.trim().to_string()),
                    other => other,
                })
            })
            .collect()
    }

    /// Checks that the textual form of this action parses back to it.
    ///
    /// Only `KEYS:` can fail: the variant accepts any strings, but the text
    /// form joins keys with `+` and drops blank names.
    ///
    /// # Errors
    ///
    /// [`ActionError::EmptyKeys`] or [`ActionError::InvalidKey`].
    pub fn validate(&self) -> Result<(), ActionError> {
        let Action::Keys(keys) = self else {
            return Ok(());
        };
        if keys.is_empty() {
            return Err(ActionError::EmptyKeys);
        }
        match keys
            .iter()
            .find(|k| k.is_empty() || k.contains('+') || k.trim() != k.as_str())
        {
            Some(bad) => Err(ActionError::InvalidKey(bad.clone())),
            None => Ok(()),
        }
    }
}

/// Splits a comma-separated action list while keeping the comma inside
/// `MOVE:`/`MOVE_REL:` coordinates attached to their action.
fn split_list(raw: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut start = 0;
    let bytes = raw.as_bytes();

    for (i, &b) in bytes.iter().enumerate() {
        if b != b',' {
            continue;
        }
        let current = raw[start..i].trim_start();
        let is_coordinate_comma = (current.starts_with(MOVE_PREFIX)
            || current.starts_with(MOVE_REL_PREFIX))
            && !current.contains(',');
        if is_coordinate_comma {
            continue;
        }
        items.push(raw[start..i].trim());
        start = i + 1;
    }
    items.push(raw[start..].trim());
    items.into_iter().filter(|s| !s.is_empty()).collect()
}

fn parse_pair(raw: &str) -> Result<(i32, i32), ActionError> {
    let bad = || ActionError::BadCoordinates(raw.to_string());
    let (a, b) = raw.split_once(',').ok_or_else(bad)?;
    let a = a.trim().parse::<i32>().map_err(|_| bad())?;
    let b = b.trim().parse::<i32>().map_err(|_| bad())?;
    Ok((a, b))
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Text(text) => write!(f, "{TEXT_PREFIX}{text}"),
            Action::Keys(keys) => write!(f, "{KEYS_PREFIX}{}", keys.join("+")),
            Action::Exit => f.write_str(EXIT_PREFIX),
            Action::MoveTo { x, y } => write!(f, "{MOVE_PREFIX}{x},{y}"),
            Action::MoveBy { dx, dy } => write!(f, "{MOVE_REL_PREFIX}{dx},{dy}"),
        }
    }
}

impl FromStr for Action {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Action {
    type Error = ActionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Action> for String {
    fn from(value: Action) -> Self {
        value.to_string()
    }
}
