use crate::config::Disposition;
use crate::db::boats;
use crate::domain::boat::taxonomy;
use crate::domain::status::BoatStatus;
use crate::import::reconcile::reconcile_missing;
use crate::tests::utils::{import_clean_csv, init_test_db};
use std::collections::HashSet;

fn seed(db: &crate::db::Database) {
    import_clean_csv(
        db,
        "ref,title,status\n\
         KEEP-1,Still listed,Active\n\
         GONE-1,Fell out,Active",
    );
}

fn seen_only_keep() -> HashSet<String> {
    HashSet::from(["KEEP-1".to_string()])
}

#[test]
fn delete_removes_the_missing_boat() {
    let db = init_test_db();
    seed(&db);

    let affected = db
        .with_conn(|conn| reconcile_missing(conn, &seen_only_keep(), Disposition::Delete))
        .unwrap();
    assert_eq!(affected, 1);

    db.with_conn(|conn| {
        assert!(boats::find_id_by_reference(conn, "KEEP-1")?.is_some());
        assert!(boats::find_id_by_reference(conn, "GONE-1")?.is_none());
        Ok(())
    })
    .unwrap();
}

#[test]
fn draft_and_hide_only_change_visibility() {
    for (disposition, expected) in [
        (Disposition::Draft, boats::visibility::DRAFT),
        (Disposition::Hide, boats::visibility::HIDDEN),
    ] {
        let db = init_test_db();
        seed(&db);

        db.with_conn(|conn| reconcile_missing(conn, &seen_only_keep(), disposition))
            .unwrap();

        let gone = db
            .with_conn(|conn| {
                let id = boats::find_id_by_reference(conn, "GONE-1")?.unwrap();
                let vis: String = conn
                    .query_row(
                        "SELECT visibility FROM boats WHERE id = ?1",
                        [id],
                        |row| row.get(0),
                    )
                    .map_err(|e| crate::errors::SyncError::Db(e.to_string()))?;
                Ok((boats::load_boat(conn, id)?, vis))
            })
            .unwrap();
        // The record survives with its status intact.
        assert_eq!(gone.0.status, BoatStatus::Active);
        assert_eq!(gone.1, expected);

        // No export either way.
        let exported = db
            .with_conn(|conn| boats::exportable_boats(conn, true))
            .unwrap();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].reference, "KEEP-1");
    }
}

#[test]
fn mark_sold_flips_status_and_taxonomy() {
    let db = init_test_db();
    seed(&db);

    db.with_conn(|conn| reconcile_missing(conn, &seen_only_keep(), Disposition::MarkSold))
        .unwrap();

    let (boat, terms) = db
        .with_conn(|conn| {
            let id = boats::find_id_by_reference(conn, "GONE-1")?.unwrap();
            Ok((
                boats::load_boat(conn, id)?,
                boats::terms_for(conn, id, taxonomy::BOAT_STATUS)?,
            ))
        })
        .unwrap();
    assert_eq!(boat.status, BoatStatus::Sold);
    assert_eq!(terms, vec!["sold"]);

    // Untouched boat keeps its listing.
    let kept = db
        .with_conn(|conn| {
            let id = boats::find_id_by_reference(conn, "KEEP-1")?.unwrap();
            boats::load_boat(conn, id)
        })
        .unwrap();
    assert_eq!(kept.status, BoatStatus::Active);
}

#[test]
fn empty_seen_set_reconciles_everything() {
    let db = init_test_db();
    seed(&db);

    let affected = db
        .with_conn(|conn| reconcile_missing(conn, &HashSet::new(), Disposition::MarkSold))
        .unwrap();
    assert_eq!(affected, 2);
}
