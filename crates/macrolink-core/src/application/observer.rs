//! Typed fan-out of macro-table changes.
//!
//! # What is an observer hub? (for beginners)
//!
//! The registry should not know who cares about its changes: a console view,
//! a log line, a test.  Instead, interested parties *subscribe* an object
//! implementing [`TransactionObserver`] and the registry *publishes* each
//! [`Transaction`] to the hub, which calls every subscriber in turn.
//!
//! A subscriber that fails does not stop the others: its error is logged and
//! delivery continues with the next subscriber.  A subscriber that panics is
//! treated the same way.
//!
//! # Locking
//!
//! Subscribers are invoked on a snapshot taken under the hub's lock, after
//! the lock has been released.  An observer may therefore subscribe or
//! unsubscribe from inside its own callback without deadlocking.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::transaction::Transaction;

/// Returned by an observer that could not handle a notification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObserverError {
    #[error("observer rejected transaction: {0}")]
    Rejected(String),
}

/// Receives every committed macro-table change.
pub trait TransactionObserver: Send + Sync {
    /// Called synchronously, once per transaction, in publish order.
    fn on_transaction(&self, transaction: &Transaction) -> Result<(), ObserverError>;
}

/// Opaque token identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

type Subscribers = Vec<(SubscriptionId, Arc<dyn TransactionObserver>)>;

/// Synchronous, ordered, error-isolating publisher.
#[derive(Default)]
pub struct ObserverHub {
    next_id: AtomicU64,
    subscribers: Mutex<Subscribers>,
}

impl fmt::Debug for ObserverHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverHub")
            .field("subscribers", &self.len())
            .finish()
    }
}

impl ObserverHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `observer` after all existing subscribers.
    pub fn subscribe(&self, observer: Arc<dyn TransactionObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, observer));
        id
    }

    /// Removes a subscription.  Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    /// Delivers `transaction` to every subscriber in subscription order.
    ///
    /// Returns the number of subscribers that accepted it.  Errors and
    /// panics from a subscriber are logged and not counted.
    pub fn publish(&self, transaction: &Transaction) -> usize {
        let snapshot: Subscribers = self.lock().clone();

        let mut delivered = 0;
        for (id, observer) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| observer.on_transaction(transaction))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => warn!(subscription = %id, error = %e, %transaction, "observer failed"),
                Err(panic) => warn!(
                    subscription = %id,
                    panic = panic_message(panic.as_ref()),
                    %transaction,
                    "observer panicked"
                ),
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn panic_message<'a>(payload: &'a (dyn std::any::Any + Send + 'static)) -> &'a str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Logs every transaction at `info`.
#[derive(Debug, Default, Clone)]
pub struct TracingObserver {
    role: &'static str,
}

impl TracingObserver {
    /// `role` is added as a field to each log line (e.g. `"initiator"`).
    pub fn new(role: &'static str) -> Self {
        Self { role }
    }
}

impl TransactionObserver for TracingObserver {
    fn on_transaction(&self, transaction: &Transaction) -> Result<(), ObserverError> {
        info!(
            role = self.role,
            operation = %transaction.operation(),
            hotkey = %transaction.hotkey(),
            "macro table changed"
        );
        Ok(())
    }
}

/// Forwards clones of each transaction into a Tokio channel.
///
/// Lets an async presentation task consume changes without blocking the
/// publisher.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<Transaction>,
}

impl ChannelObserver {
    /// Creates the observer and the receiving end it feeds.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Transaction>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl TransactionObserver for ChannelObserver {
    fn on_transaction(&self, transaction: &Transaction) -> Result<(), ObserverError> {
        self.tx
            .send(transaction.clone())
            .map_err(|_| ObserverError::Rejected("receiver dropped".to_string()))
    }
}
