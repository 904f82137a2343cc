mod support;

use pretty_assertions::assert_eq;
use sealnote_storage::{
    CascadeReport, NewDirectShare, PurgeReport, StorageError, Store, SystemClock, UserRecord,
};
use sealnote_types::{LinkToken, NoteId, ShareId};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use support::{envelope, name, note, store, user, T0};

fn direct_share(
    note_id: NoteId,
    sender: &UserRecord,
    recipient: &UserRecord,
    ttl_secs: i64,
) -> NewDirectShare {
    NewDirectShare {
        note_id,
        sender_id: sender.id,
        recipient_id: recipient.id,
        ephemeral_public_key: "04-eph".into(),
        wrapped_key: format!("wrapped-for-{}", recipient.username),
        ttl_secs,
    }
}

// ── Notes ────────────────────────────────────────────────────────

#[test]
fn notes_are_listed_per_owner() {
    let (store, _) = store();
    let alice = user(&store, "alice");
    let bob = user(&store, "bob");
    let a1 = note(&store, &alice, "a1.txt");
    let a2 = note(&store, &alice, "a2.txt");
    note(&store, &bob, "b1.txt");

    let listed: Vec<NoteId> = store.list_notes(&alice.id).unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(listed, vec![a1, a2]);

    let stored = store.get_note(&a1).unwrap().unwrap();
    assert_eq!(stored.owner, name("alice"));
    assert_eq!(stored.filename, "a1.txt");
    assert_eq!(stored.created_at, T0);
}

#[test]
fn only_owner_can_delete_note() {
    let (store, _) = store();
    let alice = user(&store, "alice");
    let bob = user(&store, "bob");
    let id = note(&store, &alice, "mine.txt");

    assert!(matches!(store.delete_note(&id, &bob.id), Err(StorageError::Forbidden)));
    assert!(store.get_note(&id).unwrap().is_some());
    assert!(matches!(
        store.delete_note(&NoteId::new(), &alice.id),
        Err(StorageError::NotFound)
    ));
}

// ── Direct shares ────────────────────────────────────────────────

#[test]
fn direct_share_resolves_for_recipient_only() {
    let (store, _) = store();
    let alice = user(&store, "alice");
    let bob = user(&store, "bob");
    let charlie = user(&store, "charlie");
    let id = note(&store, &alice, "plan.txt");

    let grant = store.create_direct_share(direct_share(id, &alice, &bob, 3600)).unwrap();
    assert_eq!(grant.expires_at, T0 + 3600);

    let record = store.resolve_direct_share(&grant.id, &bob.id).unwrap().unwrap();
    assert_eq!(record.share.sender, name("alice"));
    assert_eq!(record.share.wrapped_key, "wrapped-for-bob");
    assert_eq!(record.note.id, id);

    assert!(store.resolve_direct_share(&grant.id, &charlie.id).unwrap().is_none());
    assert!(store.resolve_direct_share(&ShareId::new(), &bob.id).unwrap().is_none());
}

#[test]
fn direct_share_requires_ownership_and_positive_ttl() {
    let (store, _) = store();
    let alice = user(&store, "alice");
    let bob = user(&store, "bob");
    let id = note(&store, &alice, "plan.txt");

    assert!(matches!(
        store.create_direct_share(direct_share(id, &bob, &alice, 60)),
        Err(StorageError::Forbidden)
    ));
    assert!(matches!(
        store.create_direct_share(direct_share(NoteId::new(), &alice, &bob, 60)),
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        store.create_direct_share(direct_share(id, &alice, &bob, 0)),
        Err(StorageError::InvalidInput(_))
    ));
}

#[test]
fn expired_direct_share_is_gone_and_purged() {
    let (store, clock) = store();
    let alice = user(&store, "alice");
    let bob = user(&store, "bob");
    let id = note(&store, &alice, "plan.txt");
    let grant = store.create_direct_share(direct_share(id, &alice, &bob, 60)).unwrap();

    clock.advance(59);
    assert!(store.resolve_direct_share(&grant.id, &bob.id).unwrap().is_some());
    assert_eq!(store.list_direct_shares(&bob.id).unwrap().len(), 1);

    clock.advance(1);
    assert!(store.resolve_direct_share(&grant.id, &bob.id).unwrap().is_none());

    // still gone after rewinding: the access path deleted it
    clock.set(T0);
    assert!(store.resolve_direct_share(&grant.id, &bob.id).unwrap().is_none());
    assert!(store.list_direct_shares(&bob.id).unwrap().is_empty());
}

// ── Share links ──────────────────────────────────────────────────

#[test]
fn whitelist_isolation() {
    let (store, _) = store();
    let alice = user(&store, "alice");
    let id = note(&store, &alice, "secret.txt");

    let grant = store
        .create_share_link(&id, &alice.id, &[envelope("bob"), envelope("dave")], 3600)
        .unwrap();

    let bob = store.resolve_share_link(&grant.token, &name("bob")).unwrap().unwrap();
    assert_eq!(bob.envelope.wrapped_key, "wrapped-for-bob");
    assert_eq!(bob.note.id, id);

    let dave = store.resolve_share_link(&grant.token, &name("dave")).unwrap().unwrap();
    assert_eq!(dave.envelope.wrapped_key, "wrapped-for-dave");
    assert_ne!(bob.envelope, dave.envelope);

    assert!(store.resolve_share_link(&grant.token, &name("charlie")).unwrap().is_none());
}

#[test]
fn link_expiration_boundary() {
    let (store, clock) = store();
    let alice = user(&store, "alice");
    let id = note(&store, &alice, "secret.txt");

    let live = store.create_share_link(&id, &alice.id, &[envelope("bob")], 3600).unwrap();
    let dead = store.create_share_link(&id, &alice.id, &[envelope("bob")], 1).unwrap();
    clock.advance(2);

    // expires_at = now + 3598 is live; expires_at = now - 1 is gone
    assert!(store.resolve_share_link(&live.token, &name("bob")).unwrap().is_some());
    assert!(store.resolve_share_link(&dead.token, &name("bob")).unwrap().is_none());

    clock.set(live.expires_at);
    assert!(store.resolve_share_link(&live.token, &name("bob")).unwrap().is_none());
}

#[test]
fn link_with_short_ttl_expires_in_real_time() {
    let store = Store::in_memory_with_clock(Arc::new(SystemClock)).unwrap();
    let alice = user(&store, "alice");
    let id = note(&store, &alice, "secret.txt");

    let grant = store.create_share_link(&id, &alice.id, &[envelope("bob")], 2).unwrap();
    assert!(store.resolve_share_link(&grant.token, &name("bob")).unwrap().is_some());

    thread::sleep(Duration::from_secs(3));
    assert!(store.resolve_share_link(&grant.token, &name("bob")).unwrap().is_none());
}

#[test]
fn link_creation_validates_whitelist() {
    let (store, _) = store();
    let alice = user(&store, "alice");
    let mallory = user(&store, "mallory");
    let id = note(&store, &alice, "secret.txt");

    assert!(matches!(
        store.create_share_link(&id, &alice.id, &[], 60),
        Err(StorageError::InvalidInput(_))
    ));
    assert!(matches!(
        store.create_share_link(&id, &alice.id, &[envelope("bob"), envelope("bob")], 60),
        Err(StorageError::InvalidInput(_))
    ));
    assert!(matches!(
        store.create_share_link(&id, &mallory.id, &[envelope("bob")], 60),
        Err(StorageError::Forbidden)
    ));
}

#[test]
fn revoke_requires_owner_and_hides_existence() {
    let (store, _) = store();
    let alice = user(&store, "alice");
    let mallory = user(&store, "mallory");
    let id = note(&store, &alice, "secret.txt");
    let grant = store.create_share_link(&id, &alice.id, &[envelope("bob")], 3600).unwrap();

    assert!(matches!(
        store.revoke_share_link(&grant.token, &mallory.id),
        Err(StorageError::Forbidden)
    ));
    assert!(store.resolve_share_link(&grant.token, &name("bob")).unwrap().is_some());

    store.revoke_share_link(&grant.token, &alice.id).unwrap();
    assert!(store.resolve_share_link(&grant.token, &name("bob")).unwrap().is_none());

    // second revoke looks the same as revoking a token that never existed
    assert!(matches!(
        store.revoke_share_link(&grant.token, &alice.id),
        Err(StorageError::Forbidden)
    ));
    let unknown = LinkToken::from_bytes(&[7u8; 32]);
    assert!(matches!(
        store.revoke_share_link(&unknown, &alice.id),
        Err(StorageError::Forbidden)
    ));
}

#[test]
fn owner_lists_live_links_with_whitelists() {
    let (store, clock) = store();
    let alice = user(&store, "alice");
    let id = note(&store, &alice, "secret.txt");

    let short = store.create_share_link(&id, &alice.id, &[envelope("bob")], 10).unwrap();
    let long = store
        .create_share_link(&id, &alice.id, &[envelope("dave"), envelope("bob")], 100)
        .unwrap();

    let links = store.list_share_links(&alice.id).unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].token, short.token);
    assert_eq!(links[1].token, long.token);
    assert_eq!(links[1].shared_with, vec![name("bob"), name("dave")]);

    clock.advance(10);
    let links = store.list_share_links(&alice.id).unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].token, long.token);
}

// ── Cascade and purge ────────────────────────────────────────────

#[test]
fn cascade_delete_leaves_nothing_resolvable() {
    let (store, _) = store();
    let alice = user(&store, "alice");
    let bob = user(&store, "bob");
    let id = note(&store, &alice, "doomed.txt");
    let other = note(&store, &alice, "survivor.txt");

    let share = store.create_direct_share(direct_share(id, &alice, &bob, 3600)).unwrap();
    let link = store
        .create_share_link(&id, &alice.id, &[envelope("bob"), envelope("charlie")], 3600)
        .unwrap();
    let other_link = store.create_share_link(&other, &alice.id, &[envelope("bob")], 3600).unwrap();

    let report = store.delete_note(&id, &alice.id).unwrap();
    assert_eq!(
        report,
        CascadeReport {
            link_entries: 2,
            share_links: 1,
            direct_shares: 1,
        }
    );

    assert!(store.get_note(&id).unwrap().is_none());
    assert!(store.resolve_direct_share(&share.id, &bob.id).unwrap().is_none());
    assert!(store.resolve_share_link(&link.token, &name("bob")).unwrap().is_none());
    assert!(store.resolve_share_link(&link.token, &name("charlie")).unwrap().is_none());
    assert!(store.list_direct_shares(&bob.id).unwrap().is_empty());
    assert!(store.list_share_links(&alice.id).unwrap().iter().all(|l| l.note_id != id));

    // unrelated note keeps its link
    assert!(store.resolve_share_link(&other_link.token, &name("bob")).unwrap().is_some());
}

#[test]
fn purge_expired_sweeps_everything_past_expiry() {
    let (store, clock) = store();
    let alice = user(&store, "alice");
    let bob = user(&store, "bob");
    let id = note(&store, &alice, "plan.txt");

    store.create_direct_share(direct_share(id, &alice, &bob, 5)).unwrap();
    store.create_direct_share(direct_share(id, &alice, &bob, 500)).unwrap();
    store.create_share_link(&id, &alice.id, &[envelope("bob")], 5).unwrap();

    assert_eq!(store.purge_expired().unwrap(), PurgeReport::default());
    clock.advance(5);
    assert_eq!(
        store.purge_expired().unwrap(),
        PurgeReport {
            direct_shares: 1,
            share_links: 1,
        }
    );
    assert_eq!(store.list_direct_shares(&bob.id).unwrap().len(), 1);
}

// ── Concurrency ──────────────────────────────────────────────────

#[test]
fn concurrent_readers_of_expired_link_agree() {
    let (store, clock) = store();
    let alice = user(&store, "alice");
    let id = note(&store, &alice, "secret.txt");
    let grant = store.create_share_link(&id, &alice.id, &[envelope("bob")], 10).unwrap();
    clock.advance(11);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            let token = grant.token.clone();
            thread::spawn(move || store.resolve_share_link(&token, &name("bob")).unwrap())
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap().is_none());
    }
    assert_eq!(store.purge_expired().unwrap(), PurgeReport::default());
}

#[test]
fn revoke_and_read_race_resolves_consistently() {
    for _ in 0..20 {
        let (store, _) = store();
        let alice = user(&store, "alice");
        let id = note(&store, &alice, "secret.txt");
        let grant = store.create_share_link(&id, &alice.id, &[envelope("bob")], 3600).unwrap();

        let reader = {
            let store = store.clone();
            let token = grant.token.clone();
            thread::spawn(move || store.resolve_share_link(&token, &name("bob")).unwrap())
        };
        let revoker = {
            let store = store.clone();
            let token = grant.token.clone();
            let owner = alice.id;
            thread::spawn(move || store.revoke_share_link(&token, &owner))
        };

        let read = reader.join().unwrap();
        revoker.join().unwrap().unwrap();

        // a successful read saw the whole envelope; afterwards the link is gone
        if let Some(resolved) = read {
            assert_eq!(resolved.envelope.wrapped_key, "wrapped-for-bob");
        }
        assert!(store.resolve_share_link(&grant.token, &name("bob")).unwrap().is_none());
    }
}

// ── Persistence ──────────────────────────────────────────────────

#[test]
fn rows_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.duckdb");
    let clock = sealnote_storage::ManualClock::new(T0);

    let (token, note_id) = {
        let store = Store::open_with_clock(&path, Arc::new(clock.clone())).unwrap();
        let alice = user(&store, "alice");
        user(&store, "bob");
        let note_id = note(&store, &alice, "kept.txt");
        let grant = store
            .create_share_link(&note_id, &alice.id, &[envelope("bob")], 600)
            .unwrap();
        (grant.token, note_id)
    };

    let store = Store::open_with_clock(&path, Arc::new(clock)).unwrap();
    assert!(store.find_user(&name("alice")).unwrap().is_some());
    assert_eq!(store.get_note(&note_id).unwrap().unwrap().filename, "kept.txt");
    let resolved = store.resolve_share_link(&token, &name("bob")).unwrap().unwrap();
    assert_eq!(resolved.note.id, note_id);
}

#[test]
fn failed_open_keeps_the_wal() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the database file should be makes every open fail.
    let path = dir.path().join("notes.duckdb");
    std::fs::create_dir(&path).unwrap();
    let wal = dir.path().join("notes.duckdb.wal");
    std::fs::write(&wal, b"committed-but-not-checkpointed").unwrap();

    assert!(matches!(Store::open(&path), Err(StorageError::DuckDb(_))));
    assert_eq!(std::fs::read(&wal).unwrap(), b"committed-but-not-checkpointed");
}
