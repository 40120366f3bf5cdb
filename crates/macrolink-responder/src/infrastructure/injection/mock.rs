//! Recording injector for unit and integration tests.
//!
//! # Why a recording injector?
//!
//! A real injector would move the cursor or press keys on the machine
//! running the tests, and its effects cannot be observed from Rust code.
//! `RecordingInjector` replaces every call with an entry in a
//! `Mutex<Vec<Injected>>` so assertions can check exactly what was injected
//! and in what order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let injector = Arc::new(RecordingInjector::new());
//! let use_case = ExecuteCommandUseCase::new(injector.clone(), registry);
//!
//! use_case.execute(&WireMessage::Text("hi".into())).unwrap();
//!
//! assert_eq!(injector.calls(), vec![Injected::Text("hi".into())]);
//! ```

use std::sync::Mutex;

use crate::application::execute_command::{InjectionError, InputInjector};

/// One recorded injector call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injected {
    Combo(Vec<String>),
    Text(String),
    MoveTo(i32, i32),
    MoveBy(i32, i32),
}

/// An injector that records calls without touching the OS.
#[derive(Debug, Default)]
pub struct RecordingInjector {
    calls: Mutex<Vec<Injected>>,
    /// When `true`, every method returns [`InjectionError::Platform`].
    should_fail: bool,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// An injector whose every call fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of the calls recorded so far.
    pub fn calls(&self) -> Vec<Injected> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, call: Injected) -> Result<(), InjectionError> {
        if self.should_fail {
            return Err(InjectionError::Platform("injection disabled".to_string()));
        }
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
        Ok(())
    }
}

impl InputInjector for RecordingInjector {
    fn press_combo(&self, keys: &[String]) -> Result<(), InjectionError> {
        self.record(Injected::Combo(keys.to_vec()))
    }

    fn type_text(&self, text: &str) -> Result<(), InjectionError> {
        self.record(Injected::Text(text.to_string()))
    }

    fn move_to(&self, x: i32, y: i32) -> Result<(), InjectionError> {
        self.record(Injected::MoveTo(x, y))
    }

    fn move_by(&self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        self.record(Injected::MoveBy(dx, dy))
    }
}
