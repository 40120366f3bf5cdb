//! Library half of the `macrolink-initiator` binary.
//!
//! The binary and the integration tests in `tests/` both build on this
//! module tree: `application` holds the firing and replication use cases,
//! `infrastructure` the TCP session and the stdin console.

pub mod application;
pub mod infrastructure;
