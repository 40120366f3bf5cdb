//! Integration tests for macro replication.
//!
//! These tests drive two independent registries (one per peer) through the
//! public API and move transaction batches between them through the real
//! wire codec, the way a session does.

use macrolink_core::protocol::codec::{decode_message, encode_message};
use macrolink_core::storage::memory::MemoryMacroStore;
use macrolink_core::storage::toml_store::TomlMacroStore;
use macrolink_core::{
    default_macros, Action, Hotkey, Macro, MacroRegistry, Transaction, WireMessage,
};

fn hk(raw: &str) -> Hotkey {
    Hotkey::parse(raw).expect("valid hotkey")
}

fn actions(raw: &str) -> Vec<Action> {
    Action::parse_list(raw).expect("valid actions")
}

/// Sends the initiator's pending log through the codec and replays it on
/// the responder, as one `SYNC_MACROS` message.
fn sync(initiator: &MacroRegistry, responder: &MacroRegistry) {
    let batch = initiator.log().take_all();
    let bytes = encode_message(&WireMessage::SyncMacros(batch)).expect("encode");
    match decode_message(&bytes).expect("decode") {
        WireMessage::SyncMacros(received) => {
            responder.replay(&received);
        }
        other => panic!("unexpected message {other:?}"),
    }
}

#[test]
fn test_added_macro_reaches_responder_exactly() {
    // Arrange
    let initiator = MacroRegistry::in_memory();
    let responder = MacroRegistry::in_memory();

    // Act
    initiator
        .add(hk("ctrl_l+alt_l+r"), actions("KEYS:right, TEXT:Hello"))
        .unwrap();
    sync(&initiator, &responder);

    // Assert
    assert_eq!(
        responder.list(),
        vec![Macro::new(
            hk("ctrl_l+alt_l+r"),
            vec![Action::Keys(vec!["right".into()]), Action::Text("Hello".into())]
        )]
    );
    assert!(initiator.log().is_empty(), "delivered transactions leave the log");
    assert!(responder.log().is_empty(), "replay never echoes back");
}

#[test]
fn test_replaying_same_batch_twice_is_idempotent() {
    // Arrange
    let responder = MacroRegistry::in_memory();
    let batch = vec![
        Transaction::add(hk("a"), actions("TEXT:1")),
        Transaction::add(hk("b"), actions("TEXT:2")),
        Transaction::edit(hk("a"), hk("c"), actions("TEXT:3")),
        Transaction::delete(hk("b")),
    ];

    // Act
    responder.replay(&batch);
    let once = responder.list();
    let second = responder.replay(&batch);

    // Assert
    assert_eq!(responder.list(), once);
    assert_eq!(once, vec![Macro::new(hk("c"), actions("TEXT:3"))]);
    assert_eq!(second.failed, 0);
}

#[test]
fn test_replay_is_order_sensitive() {
    // Arrange
    let add = Transaction::add(hk("ctrl_l+x"), actions("EXIT:"));
    let delete = Transaction::delete(hk("ctrl_l+x"));
    let add_then_delete = MacroRegistry::in_memory();
    let delete_then_add = MacroRegistry::in_memory();

    // Act
    add_then_delete.replay(&[add.clone(), delete.clone()]);
    delete_then_add.replay(&[delete, add]);

    // Assert
    assert!(add_then_delete.is_empty());
    assert_eq!(delete_then_add.len(), 1);
}

#[test]
fn test_edit_and_delete_sequence_converges() {
    // Arrange – both sides start from the same seeded table
    let initiator = MacroRegistry::in_memory();
    let responder = MacroRegistry::in_memory();
    initiator.seed_if_empty(default_macros()).unwrap();
    responder.seed_if_empty(default_macros()).unwrap();

    // Act
    initiator
        .edit(hk("ctrl_l+alt_l+r"), hk("ctrl_l+alt_l+x"), actions("TEXT:Bye"))
        .unwrap();
    initiator.delete(hk("ctrl_l+alt_l+f")).unwrap();
    initiator.add(hk("ctrl_l+alt_l+m"), actions("MOVE:10,20")).unwrap();
    sync(&initiator, &responder);

    // Assert
    assert_eq!(responder.list(), initiator.list());
}

#[test]
fn test_mutations_between_syncs_are_delivered_in_later_batch() {
    let initiator = MacroRegistry::in_memory();
    let responder = MacroRegistry::in_memory();

    initiator.add(hk("a"), actions("TEXT:1")).unwrap();
    sync(&initiator, &responder);
    initiator.edit(hk("a"), hk("a"), actions("TEXT:2")).unwrap();
    sync(&initiator, &responder);

    assert_eq!(responder.get(&hk("a")).unwrap().actions, actions("TEXT:2"));
}

#[test]
fn test_replayed_macros_persist_to_toml_store() {
    // Arrange
    let dir = std::env::temp_dir().join(format!("macrolink-replay-{}", uuid::Uuid::new_v4()));
    let path = dir.join("macros.toml");
    let responder = MacroRegistry::open(TomlMacroStore::open(&path).unwrap()).unwrap();

    // Act
    responder.replay(&[Transaction::add(hk("ctrl_l+alt_l+r"), actions("TEXT:Hello"))]);
    drop(responder);
    let reopened = MacroRegistry::open(TomlMacroStore::open(&path).unwrap()).unwrap();

    // Assert
    assert_eq!(reopened.get(&hk("ctrl_l+alt_l+r")).unwrap().actions, actions("TEXT:Hello"));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_padded_text_replicates_and_persists_unchanged() {
    // Arrange
    let dir = std::env::temp_dir().join(format!("macrolink-padded-{}", uuid::Uuid::new_v4()));
    let path = dir.join("macros.toml");
    let initiator = MacroRegistry::in_memory();
    let responder = MacroRegistry::open(TomlMacroStore::open(&path).unwrap()).unwrap();
    let padded = vec![Action::Text(" hi ".into()), Action::Keys(vec!["enter".into()])];

    // Act
    initiator.add(hk("h"), padded.clone()).unwrap();
    sync(&initiator, &responder);
    drop(responder);
    let reopened = MacroRegistry::open(TomlMacroStore::open(&path).unwrap()).unwrap();

    // Assert
    assert_eq!(reopened.list(), initiator.list());
    assert_eq!(reopened.get(&hk("h")).unwrap().actions, padded);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_rejected_action_does_not_poison_the_next_batch() {
    // Arrange
    let initiator = MacroRegistry::in_memory();
    let responder = MacroRegistry::in_memory();

    // Act
    initiator.add(hk("a"), actions("TEXT:1")).unwrap();
    let rejected = initiator.add(hk("b"), vec![Action::Keys(vec![])]);
    sync(&initiator, &responder);

    // Assert
    assert!(rejected.is_err());
    assert_eq!(responder.list(), vec![Macro::new(hk("a"), actions("TEXT:1"))]);
}

#[test]
fn test_open_with_prepopulated_store() {
    let store = MemoryMacroStore::with_macros(default_macros());
    let registry = MacroRegistry::open(store).unwrap();
    assert_eq!(registry.seed_if_empty(default_macros()).unwrap(), 0);
    assert_eq!(registry.len(), 5);
}
