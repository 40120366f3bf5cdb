//! Network side of the responder.

pub mod session;
