//! Library half of the `macrolink-responder` binary.
//!
//! `main.rs` and the end-to-end tests share this module tree.

pub mod application;
pub mod infrastructure;
