//! The macro registry: single owner of the macro table.
//!
//! Every successful local mutation goes through three steps, in order:
//!
//! 1. persist through the [`MacroStore`],
//! 2. update the in-memory cache and append a [`Transaction`] to the log
//!    (both under the registry lock, so log order equals mutation order),
//! 3. publish the transaction on the [`ObserverHub`] after the lock is
//!    released.
//!
//! If step 1 fails nothing else happens: the cache, the log and the
//! observers never see a change the store did not accept.
//!
//! [`MacroRegistry::replay`] applies transactions received from the peer.
//! Replay uses lenient rules (absent keys are skipped, not errors) and does
//! not append to the local log, so replayed changes are never echoed back.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, warn};

use crate::application::observer::ObserverHub;
use crate::domain::action::{Action, ActionError};
use crate::domain::hotkey::Hotkey;
use crate::domain::macros::Macro;
use crate::domain::transaction::{Operation, Transaction, TransactionLog};
use crate::storage::memory::MemoryMacroStore;
use crate::storage::{MacroStore, StorageError};

/// Errors returned by direct registry mutations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("a macro is already bound to {0}")]
    DuplicateHotkey(Hotkey),

    #[error("no macro is bound to {0}")]
    NotFound(Hotkey),

    #[error("a macro needs at least one action")]
    EmptyActions,

    #[error("action cannot be stored or replicated: {0}")]
    InvalidAction(#[from] ActionError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Outcome of [`MacroRegistry::replay`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    /// Transactions that changed the table.
    pub applied: usize,
    /// Transactions whose precondition did not hold.
    pub skipped: usize,
    /// Transactions the store refused.
    pub failed: usize,
}

struct RegistryInner {
    store: Box<dyn MacroStore>,
    cache: BTreeMap<Hotkey, Vec<Action>>,
}

/// Owns the macro table, its transaction log and its observer hub.
pub struct MacroRegistry {
    inner: Mutex<RegistryInner>,
    log: TransactionLog,
    hub: ObserverHub,
}

impl std::fmt::Debug for MacroRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacroRegistry")
            .field("macros", &self.len())
            .field("pending", &self.log.len())
            .field("observers", &self.hub.len())
            .finish()
    }
}

impl MacroRegistry {
    /// Loads every macro from `store` into the cache.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Storage`] if the store cannot be listed.
    pub fn open(store: impl MacroStore + 'static) -> Result<Self, RegistryError> {
        Self::open_boxed(Box::new(store))
    }

    /// [`MacroRegistry::open`] for a store chosen at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Storage`] if the store cannot be listed.
    pub fn open_boxed(store: Box<dyn MacroStore>) -> Result<Self, RegistryError> {
        let cache = store
            .list()?
            .into_iter()
            .map(|m| (m.hotkey, m.actions))
            .collect();

        Ok(Self {
            inner: Mutex::new(RegistryInner { store, cache }),
            log: TransactionLog::new(),
            hub: ObserverHub::new(),
        })
    }

    /// An empty registry over a [`MemoryMacroStore`].
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                store: Box::new(MemoryMacroStore::new()),
                cache: BTreeMap::new(),
            }),
            log: TransactionLog::new(),
            hub: ObserverHub::new(),
        }
    }

    /// Installs `defaults` if the table is empty.
    ///
    /// Seeding is not a user mutation: nothing is logged or published.
    /// Returns how many macros were installed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Storage`] on the first store failure.
    pub fn seed_if_empty(&self, defaults: Vec<Macro>) -> Result<usize, RegistryError> {
        let mut inner = self.lock();
        if !inner.cache.is_empty() {
            return Ok(0);
        }

        let mut seeded = 0;
        for m in defaults {
            if m.actions.is_empty() {
                continue;
            }
            inner.store.upsert(&m.hotkey, &m.actions)?;
            inner.cache.insert(m.hotkey, m.actions);
            seeded += 1;
        }
        debug!(count = seeded, "seeded default macros");
        Ok(seeded)
    }

    /// Binds a new macro.
    ///
    /// # Errors
    ///
    /// [`RegistryError::EmptyActions`], [`RegistryError::InvalidAction`],
    /// [`RegistryError::DuplicateHotkey`] or [`RegistryError::Storage`].
    pub fn add(&self, hotkey: Hotkey, actions: Vec<Action>) -> Result<(), RegistryError> {
        check_actions(&actions)?;

        let transaction = {
            let mut inner = self.lock();
            if inner.cache.contains_key(&hotkey) {
                return Err(RegistryError::DuplicateHotkey(hotkey));
            }
            inner.store.upsert(&hotkey, &actions)?;
            inner.cache.insert(hotkey.clone(), actions.clone());

            let transaction = Transaction::add(hotkey, actions);
            self.log.append(transaction.clone());
            transaction
        };

        self.hub.publish(&transaction);
        Ok(())
    }

    /// Replaces the macro at `old_hotkey`, renaming it when `new_hotkey`
    /// differs.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if `old_hotkey` is unbound,
    /// [`RegistryError::DuplicateHotkey`] if a rename targets another bound
    /// hotkey, [`RegistryError::EmptyActions`],
    /// [`RegistryError::InvalidAction`] or [`RegistryError::Storage`].
    pub fn edit(
        &self,
        old_hotkey: Hotkey,
        new_hotkey: Hotkey,
        actions: Vec<Action>,
    ) -> Result<(), RegistryError> {
        check_actions(&actions)?;

        let transaction = {
            let mut inner = self.lock();
            if !inner.cache.contains_key(&old_hotkey) {
                return Err(RegistryError::NotFound(old_hotkey));
            }

            if old_hotkey == new_hotkey {
                inner.store.upsert(&new_hotkey, &actions)?;
            } else {
                if inner.cache.contains_key(&new_hotkey) {
                    return Err(RegistryError::DuplicateHotkey(new_hotkey));
                }
                inner.store.rename(&old_hotkey, &new_hotkey, &actions)?;
                inner.cache.remove(&old_hotkey);
            }
            inner.cache.insert(new_hotkey.clone(), actions.clone());

            let transaction = Transaction::edit(old_hotkey, new_hotkey, actions);
            self.log.append(transaction.clone());
            transaction
        };

        self.hub.publish(&transaction);
        Ok(())
    }

    /// Unbinds a macro.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] or [`RegistryError::Storage`].
    pub fn delete(&self, hotkey: Hotkey) -> Result<(), RegistryError> {
        let transaction = {
            let mut inner = self.lock();
            if !inner.cache.contains_key(&hotkey) {
                return Err(RegistryError::NotFound(hotkey));
            }
            inner.store.delete(&hotkey)?;
            inner.cache.remove(&hotkey);

            let transaction = Transaction::delete(hotkey);
            self.log.append(transaction.clone());
            transaction
        };

        self.hub.publish(&transaction);
        Ok(())
    }

    pub fn get(&self, hotkey: &Hotkey) -> Option<Macro> {
        self.lock()
            .cache
            .get(hotkey)
            .map(|actions| Macro::new(hotkey.clone(), actions.clone()))
    }

    pub fn contains(&self, hotkey: &Hotkey) -> bool {
        self.lock().cache.contains_key(hotkey)
    }

    /// Snapshot of the table, ordered by canonical hotkey.
    pub fn list(&self) -> Vec<Macro> {
        self.lock()
            .cache
            .iter()
            .map(|(hotkey, actions)| Macro::new(hotkey.clone(), actions.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().cache.is_empty()
    }

    /// Applies transactions received from the peer, in order.
    ///
    /// | operation | applied when                   | effect                          |
    /// |-----------|--------------------------------|---------------------------------|
    /// | add       | `hotkey` is unbound            | bind                            |
    /// | edit      | `old_hotkey` differs           | drop `old_hotkey` if bound, bind|
    /// | edit      | `hotkey` bound, no rename      | replace actions                 |
    /// | delete    | `hotkey` is bound              | unbind                          |
    ///
    /// Anything else, including add/edit without actions, is skipped.
    /// Applied transactions are published but never appended to the log.
    pub fn replay(&self, transactions: &[Transaction]) -> ReplayReport {
        let mut report = ReplayReport::default();

        for transaction in transactions {
            let outcome = {
                let mut inner = self.lock();
                apply_replayed(&mut inner, transaction)
            };

            match outcome {
                Ok(true) => {
                    report.applied += 1;
                    self.hub.publish(transaction);
                }
                Ok(false) => {
                    report.skipped += 1;
                    debug!(%transaction, "replay skipped");
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(%transaction, error = %e, "replay could not be stored");
                }
            }
        }

        report
    }

    /// Mutations not yet delivered to the peer.
    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    pub fn hub(&self) -> &ObserverHub {
        &self.hub
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Every stored action must survive the text form used on the wire and on
/// disk, or the peer and the next start would see a different table.
fn check_actions(actions: &[Action]) -> Result<(), RegistryError> {
    if actions.is_empty() {
        return Err(RegistryError::EmptyActions);
    }
    for action in actions {
        action.validate()?;
    }
    Ok(())
}

/// `Ok(true)` if the table changed, `Ok(false)` if the transaction was skipped.
fn apply_replayed(inner: &mut RegistryInner, transaction: &Transaction) -> Result<bool, StorageError> {
    let hotkey = transaction.hotkey();

    match transaction.operation() {
        Operation::Add => {
            let Some(actions) = transaction.actions().filter(|a| !a.is_empty()) else {
                return Ok(false);
            };
            if inner.cache.contains_key(hotkey) {
                return Ok(false);
            }
            inner.store.upsert(hotkey, actions)?;
            inner.cache.insert(hotkey.clone(), actions.to_vec());
            Ok(true)
        }

        Operation::Edit => {
            let Some(actions) = transaction.actions().filter(|a| !a.is_empty()) else {
                return Ok(false);
            };
            match transaction.old_hotkey().filter(|old| *old != hotkey) {
                Some(old) => {
                    if inner.cache.contains_key(old) {
                        inner.store.rename(old, hotkey, actions)?;
                        inner.cache.remove(old);
                    } else {
                        inner.store.upsert(hotkey, actions)?;
                    }
                }
                None => {
                    if !inner.cache.contains_key(hotkey) {
                        return Ok(false);
                    }
                    inner.store.upsert(hotkey, actions)?;
                }
            }
            inner.cache.insert(hotkey.clone(), actions.to_vec());
            Ok(true)
        }

        Operation::Delete => {
            if !inner.cache.contains_key(hotkey) {
                return Ok(false);
            }
            inner.store.delete(hotkey)?;
            inner.cache.remove(hotkey);
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::observer::ChannelObserver;
    use crate::domain::macros::default_macros;
    use crate::storage::MockMacroStore;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    fn hk(raw: &str) -> Hotkey {
        Hotkey::parse(raw).unwrap()
    }

    fn text(s: &str) -> Vec<Action> {
        vec![Action::Text(s.to_string())]
    }

    /// Store relying on the default `rename`, inspectable after the
    /// registry takes ownership.
    #[derive(Clone, Default)]
    struct SharedStore(Arc<Mutex<BTreeMap<Hotkey, Vec<Action>>>>);

    impl MacroStore for SharedStore {
        fn upsert(&mut self, hotkey: &Hotkey, actions: &[Action]) -> Result<(), StorageError> {
            self.0.lock().unwrap().insert(hotkey.clone(), actions.to_vec());
            Ok(())
        }

        fn delete(&mut self, hotkey: &Hotkey) -> Result<(), StorageError> {
            self.0.lock().unwrap().remove(hotkey);
            Ok(())
        }

        fn list(&self) -> Result<Vec<Macro>, StorageError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .map(|(h, a)| Macro::new(h.clone(), a.clone()))
                .collect())
        }
    }

    fn io_failure() -> StorageError {
        StorageError::Io {
            path: PathBuf::from("macros.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        }
    }

    // ── Direct mutations ──────────────────────────────────────────────────────

    #[test]
    fn test_add_stores_logs_and_publishes() {
        // Arrange
        let registry = MacroRegistry::in_memory();
        let (observer, mut rx) = ChannelObserver::new();
        registry.hub().subscribe(Arc::new(observer));

        // Act
        registry.add(hk("ctrl_l+alt_l+r"), text("Hello")).unwrap();

        // Assert
        assert_eq!(registry.get(&hk("alt_l+ctrl_l+r")).unwrap().actions, text("Hello"));
        assert_eq!(registry.log().len(), 1);
        let published = rx.try_recv().unwrap();
        assert_eq!(published.operation(), Operation::Add);
    }

    #[test]
    fn test_add_duplicate_is_rejected() {
        let registry = MacroRegistry::in_memory();
        registry.add(hk("a+b"), text("x")).unwrap();

        let result = registry.add(hk("b+a"), text("y"));

        assert!(matches!(result, Err(RegistryError::DuplicateHotkey(_))));
        assert_eq!(registry.log().len(), 1);
    }

    #[test]
    fn test_add_without_actions_is_rejected() {
        let registry = MacroRegistry::in_memory();
        assert!(matches!(
            registry.add(hk("a"), vec![]),
            Err(RegistryError::EmptyActions)
        ));
        assert!(registry.log().is_empty());
    }

    #[test]
    fn test_add_rejects_actions_without_a_text_form() {
        // Arrange
        let registry = MacroRegistry::in_memory();
        let (observer, mut rx) = ChannelObserver::new();
        registry.hub().subscribe(Arc::new(observer));
        let actions = vec![Action::Text("ok".into()), Action::Keys(vec![])];

        // Act
        let result = registry.add(hk("a"), actions);

        // Assert
        assert!(matches!(
            result,
            Err(RegistryError::InvalidAction(ActionError::EmptyKeys))
        ));
        assert!(registry.is_empty());
        assert!(registry.log().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_edit_rejects_key_names_joined_by_plus() {
        // Arrange
        let registry = MacroRegistry::in_memory();
        registry.add(hk("a"), text("old")).unwrap();

        // Act
        let result = registry.edit(hk("a"), hk("a"), vec![Action::Keys(vec!["ctrl_l+c".into()])]);

        // Assert
        assert!(matches!(
            result,
            Err(RegistryError::InvalidAction(ActionError::InvalidKey(_)))
        ));
        assert_eq!(registry.get(&hk("a")).unwrap().actions, text("old"));
        assert_eq!(registry.log().len(), 1);
    }

    #[test]
    fn test_edit_same_hotkey_replaces_actions() {
        // Arrange
        let registry = MacroRegistry::in_memory();
        registry.add(hk("a"), text("old")).unwrap();

        // Act
        registry.edit(hk("a"), hk("a"), text("new")).unwrap();

        // Assert
        assert_eq!(registry.get(&hk("a")).unwrap().actions, text("new"));
        let log = registry.log().get_all();
        assert_eq!(log[1].operation(), Operation::Edit);
        assert_eq!(log[1].old_hotkey(), None);
    }

    #[test]
    fn test_edit_with_rename_moves_macro() {
        // Arrange
        let registry = MacroRegistry::in_memory();
        registry.add(hk("ctrl_l+alt_l+r"), text("Hello")).unwrap();

        // Act
        registry
            .edit(hk("ctrl_l+alt_l+r"), hk("ctrl_l+alt_l+x"), text("Bye"))
            .unwrap();

        // Assert
        assert!(registry.get(&hk("ctrl_l+alt_l+r")).is_none());
        assert_eq!(registry.get(&hk("ctrl_l+alt_l+x")).unwrap().actions, text("Bye"));
        let last = registry.log().get_all().pop().unwrap();
        assert_eq!(last.old_hotkey(), Some(&hk("ctrl_l+alt_l+r")));
    }

    #[test]
    fn test_edit_absent_hotkey_is_not_found() {
        let registry = MacroRegistry::in_memory();
        assert!(matches!(
            registry.edit(hk("a"), hk("b"), text("x")),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_edit_rename_onto_existing_hotkey_is_duplicate() {
        let registry = MacroRegistry::in_memory();
        registry.add(hk("a"), text("1")).unwrap();
        registry.add(hk("b"), text("2")).unwrap();

        let result = registry.edit(hk("a"), hk("b"), text("3"));

        assert!(matches!(result, Err(RegistryError::DuplicateHotkey(_))));
        assert_eq!(registry.get(&hk("a")).unwrap().actions, text("1"));
        assert_eq!(registry.get(&hk("b")).unwrap().actions, text("2"));
    }

    #[test]
    fn test_delete_removes_and_logs() {
        let registry = MacroRegistry::in_memory();
        registry.add(hk("a"), text("x")).unwrap();

        registry.delete(hk("a")).unwrap();

        assert!(registry.is_empty());
        assert_eq!(registry.log().get_all()[1].operation(), Operation::Delete);
    }

    #[test]
    fn test_delete_absent_hotkey_is_not_found() {
        let registry = MacroRegistry::in_memory();
        assert!(matches!(
            registry.delete(hk("a")),
            Err(RegistryError::NotFound(_))
        ));
        assert!(registry.log().is_empty());
    }

    #[test]
    fn test_list_is_ordered_by_canonical_hotkey() {
        let registry = MacroRegistry::in_memory();
        registry.add(hk("z"), text("1")).unwrap();
        registry.add(hk("m"), text("2")).unwrap();

        let order: Vec<_> = registry.list().into_iter().map(|m| m.hotkey).collect();

        assert_eq!(order, vec![hk("m"), hk("z")]);
    }

    // ── Storage failures ──────────────────────────────────────────────────────

    #[test]
    fn test_storage_failure_commits_nothing() {
        // Arrange
        let mut store = MockMacroStore::new();
        store.expect_list().returning(|| Ok(vec![]));
        store.expect_upsert().returning(|_, _| Err(io_failure()));
        let registry = MacroRegistry::open(store).unwrap();
        let (observer, mut rx) = ChannelObserver::new();
        registry.hub().subscribe(Arc::new(observer));

        // Act
        let result = registry.add(hk("a"), text("x"));

        // Assert
        assert!(matches!(result, Err(RegistryError::Storage(_))));
        assert!(registry.get(&hk("a")).is_none());
        assert!(registry.log().is_empty());
        assert!(rx.try_recv().is_err(), "observers must not be notified");
    }

    #[test]
    fn test_open_surfaces_list_failure() {
        let mut store = MockMacroStore::new();
        store.expect_list().returning(|| Err(io_failure()));

        assert!(matches!(
            MacroRegistry::open(store),
            Err(RegistryError::Storage(_))
        ));
    }

    #[test]
    fn test_open_loads_existing_macros() {
        let store = MemoryMacroStore::with_macros([Macro::new(hk("a"), text("x"))]);

        let registry = MacroRegistry::open(store).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.log().is_empty());
    }

    #[test]
    fn test_replay_counts_store_failures() {
        let mut store = MockMacroStore::new();
        store.expect_list().returning(|| Ok(vec![]));
        store.expect_upsert().times(1).returning(|_, _| Err(io_failure()));
        let registry = MacroRegistry::open(store).unwrap();

        let report = registry.replay(&[Transaction::add(hk("a"), text("x"))]);

        assert_eq!(report.failed, 1);
        assert!(registry.is_empty());
    }

    // ── Seeding ───────────────────────────────────────────────────────────────

    #[test]
    fn test_seed_if_empty_installs_defaults_without_logging() {
        let registry = MacroRegistry::in_memory();

        let seeded = registry.seed_if_empty(default_macros()).unwrap();

        assert_eq!(seeded, 5);
        assert_eq!(registry.len(), 5);
        assert!(registry.log().is_empty());
    }

    #[test]
    fn test_seed_if_empty_leaves_populated_table_alone() {
        let registry = MacroRegistry::in_memory();
        registry.add(hk("a"), text("x")).unwrap();

        assert_eq!(registry.seed_if_empty(default_macros()).unwrap(), 0);
        assert_eq!(registry.len(), 1);
    }

    // ── Replay ────────────────────────────────────────────────────────────────

    #[test]
    fn test_replay_add_only_when_absent() {
        // Arrange
        let registry = MacroRegistry::in_memory();
        registry.add(hk("a"), text("local")).unwrap();
        registry.log().clear();

        // Act
        let report = registry.replay(&[
            Transaction::add(hk("a"), text("remote")),
            Transaction::add(hk("b"), text("remote")),
        ]);

        // Assert
        assert_eq!(report, ReplayReport { applied: 1, skipped: 1, failed: 0 });
        assert_eq!(registry.get(&hk("a")).unwrap().actions, text("local"));
        assert_eq!(registry.get(&hk("b")).unwrap().actions, text("remote"));
    }

    #[test]
    fn test_replay_does_not_append_to_log() {
        let registry = MacroRegistry::in_memory();

        registry.replay(&[Transaction::add(hk("a"), text("x"))]);

        assert!(registry.log().is_empty());
    }

    #[test]
    fn test_replay_publishes_applied_transactions() {
        let registry = MacroRegistry::in_memory();
        let (observer, mut rx) = ChannelObserver::new();
        registry.hub().subscribe(Arc::new(observer));

        registry.replay(&[
            Transaction::delete(hk("missing")),
            Transaction::add(hk("a"), text("x")),
        ]);

        assert_eq!(rx.try_recv().unwrap().operation(), Operation::Add);
        assert!(rx.try_recv().is_err(), "skipped delete is not published");
    }

    #[test]
    fn test_replay_edit_with_old_hotkey_renames() {
        let registry = MacroRegistry::in_memory();
        registry.replay(&[Transaction::add(hk("a"), text("1"))]);

        registry.replay(&[Transaction::edit(hk("a"), hk("b"), text("2"))]);

        assert!(!registry.contains(&hk("a")));
        assert_eq!(registry.get(&hk("b")).unwrap().actions, text("2"));
    }

    #[test]
    fn test_replay_edit_with_old_hotkey_binds_even_if_old_absent() {
        let registry = MacroRegistry::in_memory();

        let report = registry.replay(&[Transaction::edit(hk("a"), hk("b"), text("2"))]);

        assert_eq!(report.applied, 1);
        assert_eq!(registry.get(&hk("b")).unwrap().actions, text("2"));
    }

    #[test]
    fn test_replay_edit_without_rename_requires_existing_hotkey() {
        let registry = MacroRegistry::in_memory();

        let report = registry.replay(&[Transaction::edit(hk("a"), hk("a"), text("x"))]);

        assert_eq!(report.skipped, 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_replay_edit_naming_itself_as_old_hotkey_keeps_stored_macro() {
        // Arrange
        let store = SharedStore::default();
        let registry = MacroRegistry::open(store.clone()).unwrap();
        registry.replay(&[Transaction::add(hk("a"), text("1"))]);
        let tx: Transaction = serde_json::from_str(
            r#"{"operation":"edit","hotkey":"a","actions":["TEXT:2"],"old_hotkey":"a"}"#,
        )
        .unwrap();

        // Act
        let report = registry.replay(&[tx]);

        // Assert
        assert_eq!(report.applied, 1);
        assert_eq!(registry.get(&hk("a")).unwrap().actions, text("2"));
        assert_eq!(
            store.list().unwrap(),
            vec![Macro::new(hk("a"), text("2"))],
            "store must agree with the cache"
        );
    }

    #[test]
    fn test_replay_rename_through_default_store_rename() {
        let store = SharedStore::default();
        let registry = MacroRegistry::open(store.clone()).unwrap();
        registry.replay(&[Transaction::add(hk("a"), text("1"))]);

        registry.replay(&[Transaction::edit(hk("a"), hk("b"), text("2"))]);

        assert_eq!(store.list().unwrap(), vec![Macro::new(hk("b"), text("2"))]);
    }

    #[test]
    fn test_replay_delete_absent_is_silent_noop() {
        let registry = MacroRegistry::in_memory();

        let report = registry.replay(&[Transaction::delete(hk("a"))]);

        assert_eq!(report, ReplayReport { applied: 0, skipped: 1, failed: 0 });
    }

    #[test]
    fn test_replay_skips_add_without_actions() {
        let registry = MacroRegistry::in_memory();
        let tx: Transaction =
            serde_json::from_str(r#"{"operation":"add","hotkey":"a","actions":null}"#).unwrap();

        let report = registry.replay(&[tx]);

        assert_eq!(report.skipped, 1);
        assert!(registry.is_empty());
    }
}
