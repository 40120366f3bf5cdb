//! Application layer of the initiator.
//!
//! Use cases depend on the [`fire_macros::CommandSink`] trait and on
//! `macrolink-core` types only; the network session wires them to a real
//! connection.

pub mod fire_macros;
pub mod replicate;
