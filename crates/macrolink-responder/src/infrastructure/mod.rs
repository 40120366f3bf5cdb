//! Infrastructure layer for the responder.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `macrolink_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`injection`** – `InputInjector` implementations: a recording injector
//!   for tests and a logging injector for headless runs.
//!
//! - **`network`** – TCP listener side of the session: accepts one
//!   initiator, runs the handshake and the dispatch loop.

pub mod injection;
pub mod network;
