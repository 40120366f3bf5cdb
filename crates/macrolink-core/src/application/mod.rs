//! Application services shared by both peers.
//!
//! - [`registry::MacroRegistry`] owns the macro table, its transaction log
//!   and its observer hub.
//! - [`observer`] fans committed changes out to subscribers.
//! - [`trigger::HotkeyTrigger`] decides when a hotkey has been pressed.

pub mod observer;
pub mod registry;
pub mod trigger;
