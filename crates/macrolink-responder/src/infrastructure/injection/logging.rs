//! Injector for headless runs: every call becomes an `info!` event.

use tracing::info;

use crate::application::execute_command::{InjectionError, InputInjector};

/// Reports injected input through `tracing` instead of the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingInjector;

impl LoggingInjector {
    pub fn new() -> Self {
        Self
    }
}

impl InputInjector for LoggingInjector {
    fn press_combo(&self, keys: &[String]) -> Result<(), InjectionError> {
        info!(keys = %keys.join("+"), "press combo");
        Ok(())
    }

    fn type_text(&self, text: &str) -> Result<(), InjectionError> {
        info!(text, "type text");
        Ok(())
    }

    fn move_to(&self, x: i32, y: i32) -> Result<(), InjectionError> {
        info!(x, y, "move cursor");
        Ok(())
    }

    fn move_by(&self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        info!(dx, dy, "move cursor relative");
        Ok(())
    }
}
