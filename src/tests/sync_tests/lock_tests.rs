use crate::db::locks;
use crate::errors::SyncError;
use crate::tests::utils::init_test_db;

#[test]
fn second_acquire_is_refused_while_held() {
    let db = init_test_db();

    db.with_conn(|conn| locks::acquire(conn, locks::EXPORT_LOCK, locks::DEFAULT_TTL_SECS, 1000))
        .unwrap();

    let err = db
        .with_conn(|conn| locks::acquire(conn, locks::EXPORT_LOCK, locks::DEFAULT_TTL_SECS, 1001))
        .unwrap_err();
    assert!(matches!(err, SyncError::Locked(_)), "{err}");
}

#[test]
fn release_makes_the_lock_available_again() {
    let db = init_test_db();

    db.with_conn(|conn| locks::acquire(conn, locks::IMPORT_LOCK, locks::DEFAULT_TTL_SECS, 1000))
        .unwrap();
    db.with_conn(|conn| locks::release(conn, locks::IMPORT_LOCK))
        .unwrap();
    db.with_conn(|conn| locks::acquire(conn, locks::IMPORT_LOCK, locks::DEFAULT_TTL_SECS, 1002))
        .unwrap();
}

#[test]
fn expired_lock_is_reclaimed() {
    let db = init_test_db();

    // Holder crashed without releasing; the flag must not stick forever.
    db.with_conn(|conn| locks::acquire(conn, locks::EXPORT_LOCK, 60, 1000))
        .unwrap();

    let err = db
        .with_conn(|conn| locks::acquire(conn, locks::EXPORT_LOCK, 60, 1059))
        .unwrap_err();
    assert!(matches!(err, SyncError::Locked(_)));

    db.with_conn(|conn| locks::acquire(conn, locks::EXPORT_LOCK, 60, 1061))
        .unwrap();
}

#[test]
fn export_and_import_locks_are_independent() {
    let db = init_test_db();

    db.with_conn(|conn| locks::acquire(conn, locks::EXPORT_LOCK, locks::DEFAULT_TTL_SECS, 1000))
        .unwrap();
    db.with_conn(|conn| locks::acquire(conn, locks::IMPORT_LOCK, locks::DEFAULT_TTL_SECS, 1000))
        .unwrap();
}
