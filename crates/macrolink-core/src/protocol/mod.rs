//! Wire protocol: challenge/response authentication, framing, typed
//! messages and session lifecycle.
//!
//! The layering, bottom-up:
//!
//! | Module        | Concern                                              |
//! |---------------|------------------------------------------------------|
//! | `codec`       | 4-byte length framing and JSON payload encode/decode |
//! | `messages`    | [`WireMessage`] and its JSON shape                   |
//! | `channel`     | async send/receive of frames over one stream         |
//! | `challenge`   | challenge generation and digest validation           |
//! | `handshake`   | the two halves of the authentication exchange        |
//! | `session`     | lifecycle state and cooperative cancellation         |
//!
//! [`WireMessage`]: messages::WireMessage

pub mod challenge;
pub mod channel;
pub mod codec;
pub mod handshake;
pub mod messages;
pub mod session;
