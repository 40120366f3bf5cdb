//! Application layer use cases for the responder.
//!
//! # What use cases does the responder have?
//!
//! - **`execute_command`** – Turns each received `WireMessage` into an
//!   effect: input messages go to an [`execute_command::InputInjector`]
//!   supplied at construction time, `SYNC_MACROS` batches are replayed into
//!   the local macro registry, and `exit` tells the session to close.

pub mod execute_command;
