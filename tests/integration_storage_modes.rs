//! Integration tests for the three storage modes

use profile_store::workload::SnapshotPolicy;
use profile_store::{Aggregate, ModeKind, ProfileState, SessionEvent, StorageError, StorageMode, PROFILE_ID};

mod common;

async fn open_mode(kind: ModeKind) -> (common::TestDb, StorageMode) {
    let test_db = common::setup_test_db().await;
    let mut storage = StorageMode::open(kind, test_db.db.clone());
    storage.initialize().await.unwrap();
    (test_db, storage)
}

/// Persist `events` the way the workload driver does, returning the final state
async fn persist_all(storage: &StorageMode, events: &[SessionEvent], policy: SnapshotPolicy) -> ProfileState {
    let mut profile = ProfileState::create_default();
    for event in events {
        profile = profile.apply(event);
        storage
            .persist(event, &profile, policy.is_boundary(event.seq))
            .await
            .unwrap();
    }
    profile
}

#[tokio::test]
async fn test_restore_on_empty_store_returns_default() {
    for kind in ModeKind::ALL {
        let (_test_db, storage) = open_mode(kind).await;
        let restored = storage.restore(100).await.unwrap();
        assert_eq!(restored, ProfileState::create_default(), "{kind}");
    }
}

#[tokio::test]
async fn test_single_event_scenario() {
    let event = SessionEvent::new(1, "a")
        .with_outcome(1.0, 0.0, 1)
        .with_seed(7)
        .with_versions("v1", "", "");

    for kind in ModeKind::ALL {
        let (_test_db, storage) = open_mode(kind).await;
        let state = ProfileState::create_default().apply(&event);
        storage.persist(&event, &state, false).await.unwrap();

        let restored = storage.restore(1).await.unwrap();
        assert!((restored.accuracy() - 0.515).abs() < 1e-12, "{kind}");
        assert!((restored.fatigue() - 0.41).abs() < 1e-12, "{kind}");
        assert!((restored.skill_level() - 0.5505).abs() < 1e-12, "{kind}");
        assert_eq!(restored.seed(), 7);
        assert_eq!(restored, state);
    }
}

#[tokio::test]
async fn test_hybrid_matches_event_sourcing_with_snapshot_at_five() {
    let events = common::events(10);

    let (_es_db, event_sourcing) = open_mode(ModeKind::EventSourcing).await;
    let (_hy_db, hybrid) = open_mode(ModeKind::Hybrid).await;

    let mut profile = ProfileState::create_default();
    for event in &events {
        profile = profile.apply(event);
        event_sourcing.persist(event, &profile, false).await.unwrap();
        hybrid.persist(event, &profile, event.seq == 5).await.unwrap();
    }

    let replayed = event_sourcing.restore(10).await.unwrap();
    assert_eq!(hybrid.restore(10).await.unwrap(), replayed);
    assert_eq!(replayed, profile);
}

#[tokio::test]
async fn test_hybrid_matches_event_sourcing_at_every_seq() {
    let events = common::events(60);
    let policy = SnapshotPolicy::every(7);

    let (_es_db, event_sourcing) = open_mode(ModeKind::EventSourcing).await;
    let (_hy_db, hybrid) = open_mode(ModeKind::Hybrid).await;
    persist_all(&event_sourcing, &events, policy).await;
    persist_all(&hybrid, &events, policy).await;

    // Latest snapshot is at 56; targets below it replay from the start
    for upto_seq in 0..=65 {
        let replayed = event_sourcing.restore(upto_seq).await.unwrap();
        let restored = hybrid.restore(upto_seq).await.unwrap();
        assert_eq!(restored, replayed, "mismatch at seq {upto_seq}");

        let expected = ProfileState::create_default()
            .fold(events.iter().take(upto_seq.clamp(0, 60) as usize));
        assert_eq!(replayed, expected, "replay differs at seq {upto_seq}");
    }
}

#[tokio::test]
async fn test_snapshot_idempotence_at_boundary() {
    let events = common::events(12);
    let (_test_db, hybrid) = open_mode(ModeKind::Hybrid).await;

    let state = persist_all(&hybrid, &events, SnapshotPolicy::every(12)).await;
    assert_eq!(hybrid.restore(12).await.unwrap(), state);

    if let StorageMode::Hybrid(store) = &hybrid {
        let snapshot = store
            .snapshots()
            .read_latest_at_or_below(PROFILE_ID, 12)
            .await
            .unwrap()
            .expect("snapshot at 12");
        assert_eq!(snapshot.upto_seq, 12);
        assert_eq!(snapshot.decode_state().unwrap(), state);
    } else {
        panic!("expected hybrid store");
    }
}

#[tokio::test]
async fn test_hybrid_restore_starts_from_snapshot() {
    let events = common::events(10);
    let (_test_db, hybrid) = open_mode(ModeKind::Hybrid).await;

    persist_all(&hybrid, &events[..3], SnapshotPolicy::every(0)).await;

    // Snapshot a state the log alone cannot produce
    let written = ProfileState::create_default().apply(
        &SessionEvent::new(99, "zzz")
            .with_outcome(0.9, 12.0, 2)
            .with_seed(1),
    );
    assert_ne!(written, ProfileState::create_default().fold(&events[..4]));
    hybrid.persist(&events[3], &written, true).await.unwrap();
    for event in &events[4..] {
        hybrid.persist(event, &written, false).await.unwrap();
    }

    assert_eq!(hybrid.restore(4).await.unwrap(), written);
    for upto_seq in 5..=10 {
        let expected = written.clone().fold(&events[4..upto_seq as usize]);
        assert_eq!(hybrid.restore(upto_seq).await.unwrap(), expected, "seq {upto_seq}");
    }

    // Below the snapshot only the log is used
    assert_eq!(
        hybrid.restore(3).await.unwrap(),
        ProfileState::create_default().fold(&events[..3])
    );
}

#[tokio::test]
async fn test_overwrite_keeps_only_latest() {
    let events = common::events(20);
    let (test_db, overwrite) = open_mode(ModeKind::Overwrite).await;

    let last = persist_all(&overwrite, &events, SnapshotPolicy::every(0)).await;

    // Overwrite ignores the target
    assert_eq!(overwrite.restore(3).await.unwrap(), last);
    assert_eq!(overwrite.restore(20).await.unwrap(), last);

    let (rows, version): (i64, i64) = sqlx::query_as("SELECT COUNT(*), MAX(version) FROM profile")
        .fetch_one(test_db.db.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(version, 20);
}

#[tokio::test]
async fn test_event_sourcing_rejects_duplicate_seq() {
    let events = common::events(3);
    let (_test_db, event_sourcing) = open_mode(ModeKind::EventSourcing).await;
    let state = persist_all(&event_sourcing, &events, SnapshotPolicy::every(0)).await;

    let result = event_sourcing.persist(&events[1], &state, false).await;
    let err = result.unwrap_err();
    assert!(err.is_duplicate_sequence());

    assert_eq!(event_sourcing.restore(3).await.unwrap(), state);
}

#[tokio::test]
async fn test_hybrid_duplicate_seq_writes_no_snapshot() {
    let events = common::events(4);
    let (_test_db, hybrid) = open_mode(ModeKind::Hybrid).await;
    let state = persist_all(&hybrid, &events, SnapshotPolicy::every(0)).await;

    let bogus = ProfileState::create_default();
    let result = hybrid.persist(&events[3], &bogus, true).await;
    assert!(matches!(result, Err(StorageError::DuplicateSequence { seq: 4 })));

    assert_eq!(hybrid.restore(4).await.unwrap(), state);
}

#[tokio::test]
async fn test_operations_before_initialize_fail() {
    for kind in ModeKind::ALL {
        let test_db = common::setup_test_db().await;
        let storage = StorageMode::open(kind, test_db.db.clone());
        let event = SessionEvent::new(1, "a");

        assert!(!storage.is_initialized());
        assert!(matches!(
            storage.persist(&event, &ProfileState::create_default(), true).await,
            Err(StorageError::NotInitialized)
        ));
        assert!(matches!(storage.restore(1).await, Err(StorageError::NotInitialized)));
        assert!(matches!(storage.size_bytes().await, Err(StorageError::NotInitialized)));
    }
}

#[tokio::test]
async fn test_size_grows_with_history_only() {
    let events = common::events(300);

    let (_ow_db, overwrite) = open_mode(ModeKind::Overwrite).await;
    let (_es_db, event_sourcing) = open_mode(ModeKind::EventSourcing).await;

    persist_all(&overwrite, &events[..10], SnapshotPolicy::every(0)).await;
    persist_all(&event_sourcing, &events[..10], SnapshotPolicy::every(0)).await;
    let overwrite_small = overwrite.size_bytes().await.unwrap();
    let events_small = event_sourcing.size_bytes().await.unwrap();

    let mut profile = ProfileState::create_default().fold(&events[..10]);
    for event in &events[10..] {
        profile = profile.apply(event);
        overwrite.persist(event, &profile, false).await.unwrap();
        event_sourcing.persist(event, &profile, false).await.unwrap();
    }

    let overwrite_large = overwrite.size_bytes().await.unwrap();
    let events_large = event_sourcing.size_bytes().await.unwrap();
    assert!(overwrite_large <= overwrite_small * 2);
    assert!(events_large > events_small);
    assert!(events_large > overwrite_large);
}
