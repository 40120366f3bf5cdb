//! Session lifecycle state and cooperative cancellation.
//!
//! [`session_pair`] returns the two ends of one session's control plane:
//!
//! - [`SessionHandle`] is held by whoever supervises the session (the
//!   binary's Ctrl-C handler, the console task, a test).  It can request a
//!   shutdown and observe the current [`SessionState`].
//! - [`SessionControl`] is owned by the session loop.  It publishes state
//!   transitions and exposes the shutdown request as a future that can sit
//!   in a `tokio::select!` next to the socket read.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticating,
    Ready,
    Active,
    Closing,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Authenticating => "authenticating",
            SessionState::Ready => "ready",
            SessionState::Active => "active",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Creates the supervisor and loop ends for a new session.
pub fn session_pair() -> (SessionHandle, SessionControl) {
    let id = Uuid::new_v4();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (state_tx, state_rx) = watch::channel(SessionState::Disconnected);

    (
        SessionHandle {
            id,
            shutdown: Arc::new(shutdown_tx),
            state: state_rx,
        },
        SessionControl {
            id,
            shutdown: shutdown_rx,
            state: state_tx,
        },
    )
}

/// Supervisor's end: request shutdown, observe state.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    shutdown: Arc<watch::Sender<bool>>,
    state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Asks the session loop to stop.  Idempotent.
    pub fn close(&self) {
        self.shutdown.send_replace(true);
    }

    /// The most recently published state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// A receiver that is notified on every state change.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Waits until the session reaches `target`.
    ///
    /// Returns `false` if the session was dropped first without reaching it.
    pub async fn wait_for(&self, target: SessionState) -> bool {
        let mut rx = self.state.clone();
        let reached = rx.wait_for(|state| *state == target).await.is_ok();
        reached
    }
}

/// Loop's end: publish transitions, await shutdown.
#[derive(Debug)]
pub struct SessionControl {
    id: Uuid,
    shutdown: watch::Receiver<bool>,
    state: watch::Sender<SessionState>,
}

impl SessionControl {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Publishes a transition.  Works even when no supervisor is watching.
    pub fn set_state(&self, next: SessionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!(session = %self.id, from = %prev, to = %next, "session state");
        }
    }

    /// `true` once [`SessionHandle::close`] has been called.
    pub fn is_shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Resolves when shutdown is requested.
    ///
    /// Never resolves if every [`SessionHandle`] was dropped without calling
    /// `close`.  Cancel-safe.
    pub async fn shutdown_requested(&mut self) {
        loop {
            if *self.shutdown.borrow_and_update() {
                return;
            }
            if self.shutdown.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_session_starts_disconnected() {
        let (handle, control) = session_pair();
        assert_eq!(handle.state(), SessionState::Disconnected);
        assert_eq!(control.state(), SessionState::Disconnected);
        assert_eq!(handle.id(), control.id());
    }

    #[test]
    fn test_state_changes_are_visible_to_handle() {
        let (handle, control) = session_pair();
        control.set_state(SessionState::Authenticating);
        assert_eq!(handle.state(), SessionState::Authenticating);
    }

    #[test]
    fn test_close_is_observed_by_control() {
        let (handle, control) = session_pair();
        assert!(!control.is_shutdown_requested());

        handle.clone().close();

        assert!(control.is_shutdown_requested());
    }

    #[tokio::test]
    async fn test_shutdown_requested_resolves_after_close() {
        // Arrange
        let (handle, mut control) = session_pair();
        let waiter = tokio::spawn(async move {
            control.shutdown_requested().await;
        });

        // Act
        handle.close();

        // Assert
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("shutdown future should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_requested_stays_pending_when_handle_dropped() {
        let (handle, mut control) = session_pair();
        drop(handle);

        let result =
            tokio::time::timeout(Duration::from_millis(50), control.shutdown_requested()).await;

        assert!(result.is_err(), "dropping the handle must not cancel the session");
    }

    #[tokio::test]
    async fn test_wait_for_sees_later_transition() {
        // Arrange
        let (handle, control) = session_pair();

        // Act
        let waiter = tokio::spawn({
            let handle = handle.clone();
            async move { handle.wait_for(SessionState::Closed).await }
        });
        control.set_state(SessionState::Active);
        control.set_state(SessionState::Closed);

        // Assert
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_for_reports_dropped_session() {
        let (handle, control) = session_pair();
        drop(control);

        assert!(!handle.wait_for(SessionState::Active).await);
    }
}
