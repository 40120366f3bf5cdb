//! ExecuteCommandUseCase: applies messages received from the initiator.
//!
//! This use case sits at the application layer and delegates input to an
//! [`InputInjector`] trait object.  Concrete injectors live in the
//! infrastructure layer.

use std::sync::Arc;

use macrolink_core::{MacroRegistry, ReplayReport, WireMessage};
use thiserror::Error;
use tracing::{debug, info};

/// Error type for input injection.
#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("platform error: {0}")]
    Platform(String),
}

/// Platform-agnostic input injection.
#[cfg_attr(test, mockall::automock)]
pub trait InputInjector: Send + Sync {
    /// Presses every key in `keys` together, then releases them.
    fn press_combo(&self, keys: &[String]) -> Result<(), InjectionError>;

    /// Types literal text.
    fn type_text(&self, text: &str) -> Result<(), InjectionError>;

    /// Moves the cursor to absolute screen coordinates.
    fn move_to(&self, x: i32, y: i32) -> Result<(), InjectionError>;

    /// Moves the cursor by a relative offset.
    fn move_by(&self, dx: i32, dy: i32) -> Result<(), InjectionError>;
}

/// What handling one message did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Input was injected.
    Injected,
    /// A `SYNC_MACROS` batch was replayed.
    Synced(ReplayReport),
    /// The initiator asked to end the session.
    Exit,
}

/// The Execute Command use case.
pub struct ExecuteCommandUseCase {
    injector: Arc<dyn InputInjector>,
    registry: Arc<MacroRegistry>,
}

impl ExecuteCommandUseCase {
    pub fn new(injector: Arc<dyn InputInjector>, registry: Arc<MacroRegistry>) -> Self {
        Self { injector, registry }
    }

    /// Handles one message from the initiator.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] if the injector fails.  Replay never fails
    /// as a whole; per-transaction failures are counted in the report.
    pub fn execute(&self, message: &WireMessage) -> Result<CommandOutcome, InjectionError> {
        match message {
            WireMessage::Text(text) => self.injector.type_text(text)?,
            WireMessage::Keys(keys) => self.injector.press_combo(keys)?,
            WireMessage::MouseMove { x, y } => self.injector.move_to(*x, *y)?,
            WireMessage::MouseMoveRel { dx, dy } => self.injector.move_by(*dx, *dy)?,
            WireMessage::SyncMacros(batch) => {
                let report = self.registry.replay(batch);
                info!(
                    received = batch.len(),
                    applied = report.applied,
                    skipped = report.skipped,
                    failed = report.failed,
                    "macro sync replayed"
                );
                return Ok(CommandOutcome::Synced(report));
            }
            WireMessage::Exit => return Ok(CommandOutcome::Exit),
        }
        debug!(msg_type = message.type_name(), "input injected");
        Ok(CommandOutcome::Injected)
    }
}
