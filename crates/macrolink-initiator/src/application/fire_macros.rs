//! MacroFiringUseCase: turns satisfied hotkeys into outbound messages.
//!
//! One call to [`MacroFiringUseCase::poll_once`] is one cycle of the
//! initiator's active loop: walk a snapshot of the macro table, ask the
//! [`HotkeyTrigger`] whether each hotkey should fire, and for every macro
//! that fires send one message per action, in order, through the
//! [`CommandSink`].
//!
//! # Architecture
//!
//! The use case depends only on the `CommandSink` trait and on core types.
//! The network session supplies a sink backed by the framed TCP channel;
//! tests supply a recording sink.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use macrolink_core::{ChannelError, Hotkey, HotkeyTrigger, MacroRegistry, WireMessage};
use thiserror::Error;
use tracing::{debug, info};

/// Error type for the macro-firing use case.
#[derive(Debug, Error)]
pub enum FireError {
    #[error("failed to send {message_type} for macro {hotkey}: {source}")]
    Send {
        hotkey: Hotkey,
        message_type: &'static str,
        #[source]
        source: ChannelError,
    },
}

impl FireError {
    /// The channel error that caused the failure.
    pub fn channel_error(&self) -> &ChannelError {
        match self {
            FireError::Send { source, .. } => source,
        }
    }

    pub fn into_channel_error(self) -> ChannelError {
        match self {
            FireError::Send { source, .. } => source,
        }
    }
}

/// Trait for delivering messages to the responder.
///
/// Infrastructure implementation writes framed JSON to the socket; test
/// implementations record calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandSink: Send {
    async fn send(&mut self, message: &WireMessage) -> Result<(), ChannelError>;
}

/// What one poll cycle did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FireOutcome {
    /// Macros whose hotkey fired this cycle.
    pub fired: usize,
    /// An `exit` message was sent; the session must close.
    pub exit_sent: bool,
}

/// Polls the trigger against the registry and sends fired macros.
pub struct MacroFiringUseCase {
    registry: Arc<MacroRegistry>,
    trigger: Arc<HotkeyTrigger>,
    /// Pause after each fired macro.
    cooldown: Duration,
}

impl MacroFiringUseCase {
    pub fn new(registry: Arc<MacroRegistry>, trigger: Arc<HotkeyTrigger>, cooldown: Duration) -> Self {
        Self {
            registry,
            trigger,
            cooldown,
        }
    }

    /// Runs one poll cycle.
    ///
    /// Stops immediately after an `exit` action has been sent; later actions
    /// and macros are not sent.
    ///
    /// # Errors
    ///
    /// Returns [`FireError::Send`] on the first failed send.
    pub async fn poll_once(&self, sink: &mut dyn CommandSink) -> Result<FireOutcome, FireError> {
        let mut outcome = FireOutcome::default();

        for m in self.registry.list() {
            if !self.trigger.should_fire(&m.hotkey) {
                continue;
            }
            info!(hotkey = %m.hotkey, actions = m.actions.len(), "macro fired");
            outcome.fired += 1;

            for action in &m.actions {
                let message = WireMessage::from_action(action);
                sink.send(&message).await.map_err(|source| FireError::Send {
                    hotkey: m.hotkey.clone(),
                    message_type: message.type_name(),
                    source,
                })?;
                debug!(hotkey = %m.hotkey, %action, "action sent");

                if matches!(message, WireMessage::Exit) {
                    outcome.exit_sent = true;
                    return Ok(outcome);
                }
            }

            if !self.cooldown.is_zero() {
                tokio::time::sleep(self.cooldown).await;
            }
        }

        Ok(outcome)
    }
}
