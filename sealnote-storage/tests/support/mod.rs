//! Fixtures shared by the storage integration tests.

#![allow(dead_code)]

use sealnote_storage::{LinkEnvelope, ManualClock, NewNote, NewUser, Store, UserRecord};
use sealnote_types::{NoteId, Username};
use std::sync::Arc;

pub const T0: i64 = 1_700_000_000;

pub fn store() -> (Store, ManualClock) {
    let clock = ManualClock::new(T0);
    let store = Store::in_memory_with_clock(Arc::new(clock.clone())).unwrap();
    (store, clock)
}

pub fn name(s: &str) -> Username {
    Username::parse(s).unwrap()
}

pub fn user(store: &Store, username: &str) -> UserRecord {
    store
        .create_user(NewUser {
            username: name(username),
            password_hash: format!("$argon2id$v=19${username}"),
            password_salt: "0f".repeat(16),
            public_key: format!("04{}", "ab".repeat(64)),
        })
        .unwrap()
}

pub fn note(store: &Store, owner: &UserRecord, filename: &str) -> NoteId {
    store
        .put_note(NewNote {
            owner_id: owner.id,
            filename: filename.to_string(),
            ciphertext: "Y2lwaGVydGV4dA==".to_string(),
            wrapped_key: format!("wrapped-for-{}", owner.username),
            iv: "00".repeat(16),
        })
        .unwrap()
}

pub fn envelope(username: &str) -> LinkEnvelope {
    LinkEnvelope {
        username: name(username),
        ephemeral_public_key: format!("04-ephemeral-{username}"),
        wrapped_key: format!("wrapped-for-{username}"),
    }
}
