//! Application message types carried by the framed channel.
//!
//! Each message is a JSON object with a `"type"` discriminant and, for all
//! types except `exit`, a `"data"` payload:
//!
//! ```json
//! {"type":"exit"}
//! {"type":"text","data":"Hello"}
//! {"type":"keys","data":["ctrl_l","right"]}
//! {"type":"mouse_move","data":{"x":10,"y":20}}
//! {"type":"mouse_move_rel","data":{"dx":-3,"dy":4}}
//! {"type":"SYNC_MACROS","data":[{"operation":"add","hotkey":"a+b","actions":["TEXT:x"],"old_hotkey":null}]}
//! ```
//!
//! Serde's adjacently tagged representation (`tag = "type"`,
//! `content = "data"`) produces exactly this shape.

use serde::{Deserialize, Serialize};

use crate::domain::action::Action;
use crate::domain::transaction::Transaction;

/// Every `type` value this implementation understands.
pub const KNOWN_TYPES: &[&str] = &[
    "exit",
    "text",
    "keys",
    "mouse_move",
    "mouse_move_rel",
    "SYNC_MACROS",
];

/// A message exchanged after the handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WireMessage {
    /// The receiver should close the session after processing this message.
    #[serde(rename = "exit")]
    Exit,

    /// Type literal text.
    #[serde(rename = "text")]
    Text(String),

    /// Press a key combination.
    #[serde(rename = "keys")]
    Keys(Vec<String>),

    /// Move the cursor to absolute coordinates.
    #[serde(rename = "mouse_move")]
    MouseMove { x: i32, y: i32 },

    /// Move the cursor by a relative offset.
    #[serde(rename = "mouse_move_rel")]
    MouseMoveRel { dx: i32, dy: i32 },

    /// Ordered batch of macro mutations for the peer to replay.
    #[serde(rename = "SYNC_MACROS")]
    SyncMacros(Vec<Transaction>),
}

impl WireMessage {
    /// The wire `type` string, for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            WireMessage::Exit => "exit",
            WireMessage::Text(_) => "text",
            WireMessage::Keys(_) => "keys",
            WireMessage::MouseMove { .. } => "mouse_move",
            WireMessage::MouseMoveRel { .. } => "mouse_move_rel",
            WireMessage::SyncMacros(_) => "SYNC_MACROS",
        }
    }

    /// The message a firing macro sends for one of its actions.
    pub fn from_action(action: &Action) -> Self {
        match action {
            Action::Text(text) => WireMessage::Text(text.clone()),
            Action::Keys(keys) => WireMessage::Keys(keys.clone()),
            Action::Exit => WireMessage::Exit,
            Action::MoveTo { x, y } => WireMessage::MouseMove { x: *x, y: *y },
            Action::MoveBy { dx, dy } => WireMessage::MouseMoveRel { dx: *dx, dy: *dy },
        }
    }
}
