//! Infrastructure layer for the initiator.
//!
//! Contains the I/O-facing adapters: the TCP session that drives the
//! application use cases, and the stdin console that feeds key presses and
//! macro edits into the shared registry and trigger.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `macrolink_core`, but MUST NOT be imported by the `application` layer.

pub mod console;
pub mod network;
