//! TOML file-backed [`MacroStore`].
//!
//! File layout:
//!
//! ```toml
//! [[macros]]
//! hotkey = "alt_l+ctrl_l+r"
//! actions = ["KEYS:right", "TEXT:Hello"]
//! ```
//!
//! The whole table is kept in memory and the file is rewritten on every
//! mutation.  Writes go to a sibling `*.tmp` file that is then renamed over
//! the original, so a crash mid-write leaves the previous version intact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::action::Action;
use crate::domain::hotkey::Hotkey;
use crate::domain::macros::Macro;
use crate::storage::{MacroStore, StorageError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct MacroFile {
    #[serde(default)]
    macros: Vec<MacroRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MacroRecord {
    hotkey: String,
    actions: Vec<String>,
}

/// Macro store persisted as a TOML file.
#[derive(Debug)]
pub struct TomlMacroStore {
    path: PathBuf,
    macros: BTreeMap<Hotkey, Vec<Action>>,
}

impl TomlMacroStore {
    /// Opens the store at `path`.  A missing file is an empty store; the
    /// file is created on the first mutation.
    ///
    /// # Errors
    ///
    /// [`StorageError::Io`] for read failures other than "not found",
    /// [`StorageError::Parse`] for invalid TOML and
    /// [`StorageError::InvalidRecord`] for an unparsable entry.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let macros = match std::fs::read_to_string(&path) {
            Ok(content) => parse_file(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        debug!(path = %path.display(), count = macros.len(), "macro file loaded");
        Ok(Self { path, macros })
    }

    /// Applies `change` to a copy of the table, persists it, then commits.
    fn mutate(
        &mut self,
        change: impl FnOnce(&mut BTreeMap<Hotkey, Vec<Action>>),
    ) -> Result<(), StorageError> {
        let mut next = self.macros.clone();
        change(&mut next);
        write_file(&self.path, &next)?;
        self.macros = next;
        Ok(())
    }
}

impl MacroStore for TomlMacroStore {
    fn upsert(&mut self, hotkey: &Hotkey, actions: &[Action]) -> Result<(), StorageError> {
        self.mutate(|m| {
            m.insert(hotkey.clone(), actions.to_vec());
        })
    }

    fn delete(&mut self, hotkey: &Hotkey) -> Result<(), StorageError> {
        if !self.macros.contains_key(hotkey) {
            return Ok(());
        }
        self.mutate(|m| {
            m.remove(hotkey);
        })
    }

    fn rename(&mut self, old: &Hotkey, new: &Hotkey, actions: &[Action]) -> Result<(), StorageError> {
        self.mutate(|m| {
            m.remove(old);
            m.insert(new.clone(), actions.to_vec());
        })
    }

    fn list(&self) -> Result<Vec<Macro>, StorageError> {
        Ok(self
            .macros
            .iter()
            .map(|(hotkey, actions)| Macro::new(hotkey.clone(), actions.clone()))
            .collect())
    }
}

fn parse_file(content: &str) -> Result<BTreeMap<Hotkey, Vec<Action>>, StorageError> {
    let file: MacroFile = toml::from_str(content)?;
    let mut macros = BTreeMap::new();

    for (index, record) in file.macros.into_iter().enumerate() {
        let invalid = |reason: String| StorageError::InvalidRecord { index, reason };

        let hotkey = Hotkey::parse(&record.hotkey).map_err(|e| invalid(e.to_string()))?;
        let actions = record
            .actions
            .iter()
            .map(|a| Action::parse(a))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid(e.to_string()))?;
        if actions.is_empty() {
            return Err(invalid(format!("macro {hotkey} has no actions")));
        }
        macros.insert(hotkey, actions);
    }

    Ok(macros)
}

fn write_file(path: &Path, macros: &BTreeMap<Hotkey, Vec<Action>>) -> Result<(), StorageError> {
    let file = MacroFile {
        macros: macros
            .iter()
            .map(|(hotkey, actions)| MacroRecord {
                hotkey: hotkey.to_string(),
                actions: actions.iter().map(ToString::to_string).collect(),
            })
            .collect(),
    };
    let content = toml::to_string_pretty(&file)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content).map_err(|source| StorageError::Io {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("macrolink-test-{}", Uuid::new_v4()))
            .join("macros.toml")
    }

    fn hk(raw: &str) -> Hotkey {
        Hotkey::parse(raw).unwrap()
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_open_missing_file_yields_empty_store() {
        let path = temp_path();
        let store = TomlMacroStore::open(&path).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(!path.exists(), "opening must not create the file");
    }

    #[test]
    fn test_mutations_persist_across_reopen() {
        // Arrange
        let path = temp_path();
        let mut store = TomlMacroStore::open(&path).unwrap();

        // Act
        store
            .upsert(
                &hk("ctrl_l+alt_l+r"),
                &[Action::Keys(vec!["right".into()]), Action::Text("Hello".into())],
            )
            .unwrap();
        store.upsert(&hk("f"), &[Action::Exit]).unwrap();
        store.delete(&hk("f")).unwrap();
        let reopened = TomlMacroStore::open(&path).unwrap();

        // Assert
        assert_eq!(
            reopened.list().unwrap(),
            vec![Macro::new(
                hk("alt_l+ctrl_l+r"),
                vec![Action::Keys(vec!["right".into()]), Action::Text("Hello".into())]
            )]
        );
        cleanup(&path);
    }

    #[test]
    fn test_rename_replaces_entry_in_one_write() {
        let path = temp_path();
        let mut store = TomlMacroStore::open(&path).unwrap();
        store.upsert(&hk("a"), &[Action::Exit]).unwrap();

        store.rename(&hk("a"), &hk("b"), &[Action::Text("x".into())]).unwrap();

        let reopened = TomlMacroStore::open(&path).unwrap();
        assert_eq!(
            reopened.list().unwrap(),
            vec![Macro::new(hk("b"), vec![Action::Text("x".into())])]
        );
        assert!(!path.with_extension("tmp").exists());
        cleanup(&path);
    }

    #[test]
    fn test_file_uses_canonical_strings() {
        let path = temp_path();
        let mut store = TomlMacroStore::open(&path).unwrap();
        store.upsert(&hk("r+ctrl_l"), &[Action::Keys(vec!["left".into()])]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();

        assert!(content.contains("[[macros]]"));
        assert!(content.contains("hotkey = \"ctrl_l+r\""));
        assert!(content.contains("KEYS:left"));
        cleanup(&path);
    }

    #[test]
    fn test_padded_text_persists_verbatim() {
        // Arrange
        let path = temp_path();
        let mut store = TomlMacroStore::open(&path).unwrap();
        let actions = vec![Action::Text(" hi ".into()), Action::Keys(vec!["enter".into()])];

        // Act
        store.upsert(&hk("h"), &actions).unwrap();
        let reopened = TomlMacroStore::open(&path).unwrap();

        // Assert
        assert_eq!(reopened.list().unwrap(), vec![Macro::new(hk("h"), actions)]);
        cleanup(&path);
    }

    #[test]
    fn test_invalid_action_is_reported_with_record_index() {
        let content = r#"
            [[macros]]
            hotkey = "a"
            actions = ["TEXT:ok"]

            [[macros]]
            hotkey = "b"
            actions = ["JUMP:high"]
        "#;

        let result = parse_file(content);

        assert!(matches!(result, Err(StorageError::InvalidRecord { index: 1, .. })));
    }

    #[test]
    fn test_empty_action_list_is_invalid() {
        let result = parse_file("[[macros]]\nhotkey = \"a\"\nactions = []\n");
        assert!(matches!(result, Err(StorageError::InvalidRecord { index: 0, .. })));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(matches!(parse_file("[[macros"), Err(StorageError::Parse(_))));
    }

    #[test]
    fn test_empty_file_is_empty_store() {
        assert!(parse_file("").unwrap().is_empty());
    }
}
