use crate::db::runs;
use crate::tests::utils::init_test_db;

#[test]
fn run_rows_record_the_outcome() {
    let db = init_test_db();

    let run_id = db
        .with_conn(|conn| runs::start_run(conn, "import", "https://feeds.example.com/boats.xml", 5000))
        .unwrap();
    db.with_conn(|conn| runs::end_run(conn, run_id, 5060, 12, 2, true, None))
        .unwrap();

    let run = db
        .with_conn(|conn| runs::last_successful_run(conn, "import"))
        .unwrap()
        .expect("no run recorded");
    assert_eq!(run.id, run_id);
    assert_eq!(run.kind, "import");
    assert_eq!(run.source, "https://feeds.example.com/boats.xml");
    assert_eq!(run.started_at, 5000);
    assert_eq!(run.finished_at, Some(5060));
    assert_eq!(run.items_processed, Some(12));
    assert_eq!(run.warnings, Some(2));
    assert_eq!(run.success, Some(true));
    assert_eq!(run.error_message, None);
}

#[test]
fn failed_runs_do_not_count_as_last_success() {
    let db = init_test_db();

    let run_id = db
        .with_conn(|conn| runs::start_run(conn, "export", "feed.xml", 1000))
        .unwrap();
    db.with_conn(|conn| {
        runs::end_run(conn, run_id, 1001, 0, 0, false, Some("disk full".into()))
    })
    .unwrap();

    let last = db
        .with_conn(|conn| runs::last_successful_run(conn, "export"))
        .unwrap();
    assert!(last.is_none());
}

#[test]
fn export_due_follows_the_schedule() {
    let db = init_test_db();

    // Never exported: due immediately.
    assert!(db.with_conn(|conn| runs::export_due(conn, 24, 0)).unwrap());

    let run_id = db
        .with_conn(|conn| runs::start_run(conn, "export", "feed.xml", 10_000))
        .unwrap();
    db.with_conn(|conn| runs::end_run(conn, run_id, 10_005, 3, 0, true, None))
        .unwrap();

    // One hour later on a 24h schedule: not due.
    assert!(!db
        .with_conn(|conn| runs::export_due(conn, 24, 10_000 + 3600))
        .unwrap());
    // But due on a 1h schedule.
    assert!(db
        .with_conn(|conn| runs::export_due(conn, 1, 10_000 + 3600))
        .unwrap());
    // And due once 24h have passed.
    assert!(db
        .with_conn(|conn| runs::export_due(conn, 24, 10_000 + 24 * 3600))
        .unwrap());
}
