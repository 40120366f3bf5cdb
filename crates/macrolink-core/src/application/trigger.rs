//! Time-windowed hotkey matching.
//!
//! The key-capture side calls [`HotkeyTrigger::on_key_press`] for every key
//! it sees; the session loop polls [`HotkeyTrigger::should_fire`] for each
//! macro.  A hotkey fires when every one of its keys was pressed within the
//! last `window` (inclusive).  Firing evicts those keys from the ledger, so
//! the same presses cannot fire the hotkey a second time.
//!
//! Hotkeys that share keys have no priority rule: if `ctrl_l+r` and `r` are
//! both satisfied, whichever is polled first wins the shared `r` and may
//! starve the other for that cycle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::domain::hotkey::Hotkey;

/// Source of "now" for the trigger.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The monotonic system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Key-press ledger plus the matching window.
pub struct HotkeyTrigger {
    ledger: Mutex<HashMap<String, Instant>>,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for HotkeyTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotkeyTrigger")
            .field("window", &self.window)
            .field("tracked_keys", &self.lock().len())
            .finish()
    }
}

impl HotkeyTrigger {
    /// A trigger reading the system clock.
    pub fn new(window: Duration) -> Self {
        Self::with_clock(window, Arc::new(SystemClock))
    }

    pub fn with_clock(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger: Mutex::new(HashMap::new()),
            window,
            clock,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records that `key` was pressed now.
    pub fn on_key_press(&self, key: &str) {
        let now = self.clock.now();
        self.lock().insert(key.trim().to_string(), now);
        trace!(key, "key press recorded");
    }

    /// `true` when every key in `keys` was pressed within the window.
    ///
    /// An empty key list is never "recent".
    pub fn keys_pressed_recently<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> bool {
        let now = self.clock.now();
        let ledger = self.lock();
        all_within(&ledger, keys, now, self.window)
    }

    /// Checks `hotkey` and, if it matches, evicts its keys so it cannot
    /// fire again from the same presses.  Check and eviction happen under
    /// one lock acquisition.
    pub fn should_fire(&self, hotkey: &Hotkey) -> bool {
        let now = self.clock.now();
        let mut ledger = self.lock();

        if !all_within(&ledger, hotkey.keys(), now, self.window) {
            return false;
        }
        for key in hotkey.keys() {
            ledger.remove(key);
        }
        true
    }

    /// Forgets every recorded press.
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.ledger.lock().unwrap_or_else(|p| p.into_inner())
    }
}

fn all_within<'a>(
    ledger: &HashMap<String, Instant>,
    keys: impl IntoIterator<Item = &'a str>,
    now: Instant,
    window: Duration,
) -> bool {
    let mut any = false;
    for key in keys {
        any = true;
        match ledger.get(key) {
            Some(pressed) if now.saturating_duration_since(*pressed) <= window => {}
            _ => return false,
        }
    }
    any
}
