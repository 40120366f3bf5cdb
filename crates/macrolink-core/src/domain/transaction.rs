//! Transactions and the append-only transaction log.
//!
//! Every local mutation of the macro table (add, edit, delete) produces one
//! immutable [`Transaction`].  Transactions accumulate in the
//! [`TransactionLog`] until the initiator pushes them to its peer inside a
//! `SYNC_MACROS` message, where they are replayed in order.
//!
//! # Wire shape
//!
//! ```json
//! {"operation":"edit","hotkey":"alt_l+ctrl_l+x","actions":["TEXT:hi"],"old_hotkey":"alt_l+ctrl_l+r"}
//! ```
//!
//! `actions` is `null` for deletes; `old_hotkey` is non-null only for an
//! edit that renamed the hotkey.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::domain::action::Action;
use crate::domain::hotkey::Hotkey;

/// Kind of mutation recorded by a [`Transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Edit,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Add => "add",
            Operation::Edit => "edit",
            Operation::Delete => "delete",
        })
    }
}

/// One recorded mutation of the macro table.
///
/// Fields are private so a transaction cannot be altered once built; use
/// the constructors and accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    operation: Operation,
    hotkey: Hotkey,
    #[serde(default)]
    actions: Option<Vec<Action>>,
    #[serde(default)]
    old_hotkey: Option<Hotkey>,
}

impl Transaction {
    /// A new macro was added.
    pub fn add(hotkey: Hotkey, actions: Vec<Action>) -> Self {
        Self {
            operation: Operation::Add,
            hotkey,
            actions: Some(actions),
            old_hotkey: None,
        }
    }

    /// An existing macro was replaced.
    ///
    /// `old_hotkey` is kept only when it differs from `hotkey` (a rename).
    pub fn edit(old_hotkey: Hotkey, hotkey: Hotkey, actions: Vec<Action>) -> Self {
        let old_hotkey = (old_hotkey != hotkey).then_some(old_hotkey);
        Self {
            operation: Operation::Edit,
            hotkey,
            actions: Some(actions),
            old_hotkey,
        }
    }

    /// A macro was removed.
    pub fn delete(hotkey: Hotkey) -> Self {
        Self {
            operation: Operation::Delete,
            hotkey,
            actions: None,
            old_hotkey: None,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn hotkey(&self) -> &Hotkey {
        &self.hotkey
    }

    pub fn actions(&self) -> Option<&[Action]> {
        self.actions.as_deref()
    }

    /// The previous hotkey of a renaming edit.
    pub fn old_hotkey(&self) -> Option<&Hotkey> {
        self.old_hotkey.as_ref()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.old_hotkey {
            Some(old) => write!(f, "{} {} -> {}", self.operation, old, self.hotkey),
            None => write!(f, "{} {}", self.operation, self.hotkey),
        }
    }
}

/// FIFO of transactions not yet delivered to the peer.
///
/// Interior mutability lets the registry append while a session task drains
/// concurrently; every method takes the lock for one short operation only.
#[derive(Debug, Default)]
pub struct TransactionLog {
    entries: Mutex<VecDeque<Transaction>>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transaction at the tail.
    pub fn append(&self, transaction: Transaction) {
        self.lock().push_back(transaction);
    }

    /// Returns a copy of all pending transactions in append order.
    pub fn get_all(&self) -> Vec<Transaction> {
        self.lock().iter().cloned().collect()
    }

    /// Discards all pending transactions.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Atomically removes and returns all pending transactions.
    ///
    /// Unlike `get_all` followed by `clear`, nothing appended in between can
    /// be lost.
    pub fn take_all(&self) -> Vec<Transaction> {
        self.lock().drain(..).collect()
    }

    /// Puts a batch that failed to send back in front of anything appended
    /// since it was taken, preserving the original order.
    pub fn requeue_front(&self, batch: Vec<Transaction>) {
        let mut entries = self.lock();
        for transaction in batch.into_iter().rev() {
            entries.push_front(transaction);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Transaction>> {
        // A poisoned log still holds valid transactions; keep using it.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
