//! The `Macro` entity and the built-in default table.

use serde::{Deserialize, Serialize};

use crate::domain::action::Action;
use crate::domain::hotkey::Hotkey;

/// A hotkey bound to an ordered, non-empty list of actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macro {
    /// Canonical hotkey; unique within a store.
    pub hotkey: Hotkey,
    /// Actions executed in order when the hotkey fires.
    pub actions: Vec<Action>,
}

impl Macro {
    pub fn new(hotkey: Hotkey, actions: Vec<Action>) -> Self {
        Self { hotkey, actions }
    }
}

/// Macros installed into an empty store on first run.
///
/// Cursor-word navigation and a greeting, bound to `ctrl_l+alt_l+<key>`.
pub fn default_macros() -> Vec<Macro> {
    const DEFAULTS: &[(&str, &[&str])] = &[
        ("ctrl_l+alt_l+r", &["KEYS:right", "TEXT:Hello"]),
        ("ctrl_l+alt_l+l", &["KEYS:left"]),
        ("ctrl_l+alt_l+f", &["KEYS:f8"]),
        ("ctrl_l+alt_l+.", &["KEYS:ctrl_l+right"]),
        ("ctrl_l+alt_l+/", &["KEYS:ctrl_l+left"]),
    ];

    DEFAULTS
        .iter()
        .filter_map(|(hotkey, actions)| {
            let hotkey = Hotkey::parse(hotkey).ok()?;
            let actions = actions
                .iter()
                .map(|a| Action::parse(a))
                .collect::<Result<Vec<_>, _>>()
                .ok()?;
            Some(Macro::new(hotkey, actions))
        })
        .collect()
}
