//! In-memory [`MacroStore`].

use std::collections::BTreeMap;

use crate::domain::action::Action;
use crate::domain::hotkey::Hotkey;
use crate::domain::macros::Macro;
use crate::storage::{MacroStore, StorageError};

/// A `BTreeMap`-backed store that never fails.
#[derive(Debug, Default, Clone)]
pub struct MemoryMacroStore {
    macros: BTreeMap<Hotkey, Vec<Action>>,
}

impl MemoryMacroStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `macros`; later duplicates overwrite earlier ones.
    pub fn with_macros(macros: impl IntoIterator<Item = Macro>) -> Self {
        Self {
            macros: macros.into_iter().map(|m| (m.hotkey, m.actions)).collect(),
        }
    }
}

impl MacroStore for MemoryMacroStore {
    fn upsert(&mut self, hotkey: &Hotkey, actions: &[Action]) -> Result<(), StorageError> {
        self.macros.insert(hotkey.clone(), actions.to_vec());
        Ok(())
    }

    fn delete(&mut self, hotkey: &Hotkey) -> Result<(), StorageError> {
        self.macros.remove(hotkey);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Macro>, StorageError> {
        Ok(self
            .macros
            .iter()
            .map(|(hotkey, actions)| Macro::new(hotkey.clone(), actions.clone()))
            .collect())
    }
}
