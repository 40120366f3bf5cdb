//! Persistent macro storage.
//!
//! The registry talks to storage only through [`MacroStore`].  Two adapters
//! ship with the crate:
//!
//! - [`memory::MemoryMacroStore`]: process-local, used when no macro file is
//!   configured and throughout the tests.
//! - [`toml_store::TomlMacroStore`]: a TOML file of `[[macros]]` tables,
//!   rewritten in full on every mutation.

pub mod memory;
pub mod toml_store;

use std::path::PathBuf;

use thiserror::Error;

use crate::config::StorageConfig;
use crate::domain::action::Action;
use crate::domain::hotkey::Hotkey;
use crate::domain::macros::Macro;

/// Errors raised by a [`MacroStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// A file system operation failed.
    #[error("I/O error accessing macro store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The macro file is not valid TOML.
    #[error("failed to parse macro file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The macro table could not be serialised.
    #[error("failed to serialize macro file: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A stored record has an unparsable hotkey or action list.
    #[error("invalid macro record #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// Key/value persistence for macros, keyed by canonical hotkey.
///
/// Implementations must leave their contents unchanged when a method
/// returns an error.
#[cfg_attr(test, mockall::automock)]
pub trait MacroStore: Send {
    /// Inserts or overwrites the macro for `hotkey`.
    fn upsert(&mut self, hotkey: &Hotkey, actions: &[Action]) -> Result<(), StorageError>;

    /// Removes the macro for `hotkey`; absent keys are not an error.
    fn delete(&mut self, hotkey: &Hotkey) -> Result<(), StorageError>;

    /// Moves a macro from `old` to `new` with `actions`.  When `old` and
    /// `new` are the same hotkey only the actions change.
    ///
    /// The default performs an upsert followed by a delete; stores that can
    /// do both in one write should override it.
    fn rename(&mut self, old: &Hotkey, new: &Hotkey, actions: &[Action]) -> Result<(), StorageError> {
        self.upsert(new, actions)?;
        if old == new {
            return Ok(());
        }
        self.delete(old)
    }

    /// All stored macros, ordered by canonical hotkey.
    fn list(&self) -> Result<Vec<Macro>, StorageError>;
}

/// Opens the store selected by `config`: the TOML file when
/// `macro_file` is set, otherwise an empty in-memory store.
///
/// # Errors
///
/// Propagates [`toml_store::TomlMacroStore::open`] failures.
pub fn open_configured(config: &StorageConfig) -> Result<Box<dyn MacroStore>, StorageError> {
    match &config.macro_file {
        Some(path) => Ok(Box::new(toml_store::TomlMacroStore::open(path.clone())?)),
        None => Ok(Box::new(memory::MemoryMacroStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Implements only the required methods, so `rename` is the default.
    #[derive(Default)]
    struct PlainStore(BTreeMap<Hotkey, Vec<Action>>);

    impl MacroStore for PlainStore {
        fn upsert(&mut self, hotkey: &Hotkey, actions: &[Action]) -> Result<(), StorageError> {
            self.0.insert(hotkey.clone(), actions.to_vec());
            Ok(())
        }

        fn delete(&mut self, hotkey: &Hotkey) -> Result<(), StorageError> {
            self.0.remove(hotkey);
            Ok(())
        }

        fn list(&self) -> Result<Vec<Macro>, StorageError> {
            Ok(self
                .0
                .iter()
                .map(|(h, a)| Macro::new(h.clone(), a.clone()))
                .collect())
        }
    }

    fn hk(raw: &str) -> Hotkey {
        Hotkey::parse(raw).unwrap()
    }

    #[test]
    fn test_default_rename_to_same_hotkey_keeps_macro() {
        // Arrange
        let mut store = PlainStore::default();
        store.upsert(&hk("a"), &[Action::Text("1".into())]).unwrap();

        // Act
        store.rename(&hk("a"), &hk("a"), &[Action::Text("2".into())]).unwrap();

        // Assert
        assert_eq!(
            store.list().unwrap(),
            vec![Macro::new(hk("a"), vec![Action::Text("2".into())])]
        );
    }

    #[test]
    fn test_default_rename_moves_macro() {
        let mut store = PlainStore::default();
        store.upsert(&hk("a"), &[Action::Exit]).unwrap();

        store.rename(&hk("a"), &hk("b"), &[Action::Exit]).unwrap();

        assert_eq!(store.list().unwrap(), vec![Macro::new(hk("b"), vec![Action::Exit])]);
    }
}
