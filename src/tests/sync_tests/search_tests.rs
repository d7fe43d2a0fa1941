use crate::db::boats::{search_boats, BoatSearch};
use crate::domain::status::BoatStatus;
use crate::errors::SyncError;
use crate::tests::utils::{import_clean_csv, init_test_db};

fn seed(db: &crate::db::Database) {
    import_clean_csv(
        db,
        "ref,title,status,price,build.year\n\
         SR-1,Old cheap,Active,20000,1995\n\
         SR-2,New dear,Active,350000,2022\n\
         SR-3,Long gone,Sold,90000,2010",
    );
}

#[test]
fn filters_combine() {
    let db = init_test_db();
    seed(&db);

    let hits = db
        .with_conn(|conn| {
            search_boats(
                conn,
                &BoatSearch {
                    year_min: Some(2000),
                    price_max: Some(100000.0),
                    status: Some(BoatStatus::Sold),
                    ..Default::default()
                },
            )
        })
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].reference, "SR-3");
    assert_eq!(hits[0].title, "Long gone");
    assert_eq!(hits[0].status, BoatStatus::Sold);
}

#[test]
fn no_filters_returns_everything() {
    let db = init_test_db();
    seed(&db);

    let hits = db
        .with_conn(|conn| search_boats(conn, &BoatSearch::default()))
        .unwrap();
    assert_eq!(hits.len(), 3);
    // Stable id order.
    assert!(hits.windows(2).all(|w| w[0].id < w[1].id));
}

#[test]
fn inverted_ranges_are_rejected() {
    let db = init_test_db();
    seed(&db);

    let err = db
        .with_conn(|conn| {
            search_boats(
                conn,
                &BoatSearch {
                    year_min: Some(2020),
                    year_max: Some(2000),
                    ..Default::default()
                },
            )
        })
        .unwrap_err();
    assert!(matches!(err, SyncError::InvalidRange(_)), "{err}");

    let err = db
        .with_conn(|conn| {
            search_boats(
                conn,
                &BoatSearch {
                    price_min: Some(50000.0),
                    price_max: Some(10.0),
                    ..Default::default()
                },
            )
        })
        .unwrap_err();
    assert!(matches!(err, SyncError::InvalidRange(_)));
}
