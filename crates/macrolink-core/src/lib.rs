//! # macrolink-core
//!
//! Shared library for macrolink containing the peer protocol, the macro
//! domain, the replication log and the hotkey matcher.
//!
//! This crate is used by both the initiator and the responder.  It has no
//! dependency on OS input APIs or on any particular UI.
//!
//! # Architecture overview (for beginners)
//!
//! macrolink lets one machine (the *initiator*) drive keyboard and mouse
//! input on another machine (the *responder*) by firing hotkey-bound
//! macros, and keeps the table of macros identical on both sides.
//!
//! - **`domain`** – Pure data: hotkeys, actions, macros, and the
//!   transactions that describe changes to the macro table.
//!
//! - **`protocol`** – How bytes travel between the peers.  Every frame is a
//!   4-byte length followed by a payload; the payload is a text token during
//!   the challenge/response handshake and a JSON message afterwards.
//!
//! - **`application`** – The macro registry (single owner of the table, its
//!   transaction log and observer hub) and the time-windowed hotkey trigger.
//!
//! - **`storage`** – Where macros persist: in memory or in a TOML file.
//!
//! - **`config`** – The TOML configuration both binaries load.
//!
//! ```rust
//! use macrolink_core::{Action, Hotkey, MacroRegistry};
//!
//! let registry = MacroRegistry::in_memory();
//! registry
//!     .add(Hotkey::parse("ctrl_l+alt_l+r").unwrap(), vec![Action::parse("TEXT:Hello").unwrap()])
//!     .unwrap();
//!
//! // The change is waiting in the log for the next sync.
//! assert_eq!(registry.log().len(), 1);
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod protocol;
pub mod storage;

// Re-export the most-used types at the crate root so callers can write
// `macrolink_core::Hotkey` instead of `macrolink_core::domain::hotkey::Hotkey`.
pub use application::observer::{
    ChannelObserver, ObserverError, ObserverHub, SubscriptionId, TracingObserver,
    TransactionObserver,
};
pub use application::registry::{MacroRegistry, RegistryError, ReplayReport};
pub use application::trigger::{Clock, HotkeyTrigger, ManualClock, SystemClock};
pub use config::{ConfigError, PeerConfig};
pub use domain::action::{Action, ActionError};
pub use domain::hotkey::{Hotkey, HotkeyError};
pub use domain::macros::{default_macros, Macro};
pub use domain::transaction::{Operation, Transaction, TransactionLog};
pub use protocol::channel::{ChannelError, MessageChannel};
pub use protocol::codec::CodecError;
pub use protocol::handshake::HandshakeError;
pub use protocol::messages::WireMessage;
pub use protocol::session::{session_pair, SessionControl, SessionHandle, SessionState};
pub use storage::{MacroStore, StorageError};
