use crate::db::boats;
use crate::domain::boat::taxonomy;
use crate::domain::catalog::Category;
use crate::domain::status::BoatStatus;
use crate::errors::SyncError;
use crate::import::csv::parse_csv;
use crate::import::record::ImportRecord;
use crate::import::xml::parse_feed;
use crate::import::{apply_records, reconcile, upsert};
use crate::tests::utils::{import_clean_csv, init_test_db, NullMediaStore};
use chrono::Utc;

#[test]
fn csv_import_creates_and_updates() {
    let db = init_test_db();

    let summary = import_clean_csv(
        &db,
        "ref,title,price,currency,status\n\
         OM-1,First boat,125000,GBP,Active",
    );
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.created, 1);

    // Second run: partial update, other fields untouched.
    let summary = import_clean_csv(&db, "ref,price\nOM-1,99000");
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.created, 0);

    let boat = db
        .with_conn(|conn| {
            let id = boats::find_id_by_reference(conn, "OM-1")?.expect("boat missing");
            boats::load_boat(conn, id)
        })
        .unwrap();
    assert_eq!(boat.title, "First boat");
    assert_eq!(boat.price.amount, Some(99000.0));
    assert_eq!(boat.status, BoatStatus::Active);
}

#[test]
fn later_duplicate_reference_wins() {
    let db = init_test_db();

    import_clean_csv(
        &db,
        "ref,title,price\n\
         DUP-1,Early title,1000\n\
         DUP-1,Late title,2000",
    );

    let boat = db
        .with_conn(|conn| {
            let id = boats::find_id_by_reference(conn, "DUP-1")?.expect("boat missing");
            boats::load_boat(conn, id)
        })
        .unwrap();
    assert_eq!(boat.title, "Late title");
    assert_eq!(boat.price.amount, Some(2000.0));
}

#[test]
fn malformed_rows_warn_and_the_rest_import() {
    let db = init_test_db();

    let raw = "ref,title,price,currency,status\n\
               A-1,First,1000,GBP,Active\n\
               A-2,Short row\n\
               A-3,Third,3000,GBP,Active";
    let (records, warnings) = parse_csv(raw.as_bytes()).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].context, "row 2");

    let summary = apply_records(&db, &records, &NullMediaStore).unwrap();
    assert_eq!(summary.processed, 3);

    db.with_conn(|conn| {
        assert!(boats::find_id_by_reference(conn, "A-2")?.is_some());
        assert!(boats::find_id_by_reference(conn, "A-3")?.is_some());
        Ok(())
    })
    .unwrap();
}

#[test]
fn feed_import_maps_attributes_and_taxonomies() {
    let db = init_test_db();

    let feed = r#"<?xml version="1.0" encoding="UTF-8"?>
<open_marine version="1.7">
  <broker code="BRK01">
    <adverts>
      <advert ref="XML-1" status="Available">
        <advert_features>
          <title>Feed boat</title>
          <manufacturer>Najad</manufacturer>
          <boat_category>Cruiser</boat_category>
          <vessel_lying country="SE">Orust</vessel_lying>
          <asking_price poa="false" currency="€" vat_included="true" vat_type="Tax Paid">180000</asking_price>
        </advert_features>
        <boat_features>
          <dimensions>
            <item name="loa" unit="metres">11.6</item>
          </dimensions>
        </boat_features>
      </advert>
    </adverts>
  </broker>
</open_marine>"#;

    let (records, parse_warnings) = parse_feed(feed.as_bytes()).unwrap();
    assert_eq!(records.len(), 1);
    // "€" normalizes to EUR without complaint.
    assert!(parse_warnings.is_empty(), "{parse_warnings:?}");

    let summary = apply_records(&db, &records, &NullMediaStore).unwrap();
    assert_eq!(summary.created, 1);
    assert!(summary.seen_references.contains("XML-1"));

    let boat = db
        .with_conn(|conn| {
            let id = boats::find_id_by_reference(conn, "XML-1")?.expect("boat missing");
            boats::load_boat(conn, id)
        })
        .unwrap();
    assert_eq!(boat.title, "Feed boat");
    assert_eq!(boat.status, BoatStatus::Active);
    assert_eq!(boat.price.currency, "EUR");
    assert_eq!(boat.price.amount, Some(180000.0));
    assert_eq!(boat.price.vat_included, Some(true));
    assert_eq!(boat.vessel_lying, "Orust");
    assert_eq!(boat.vessel_lying_country, "SE");
    let loa = boat.field(Category::Dimensions, "loa").expect("loa missing");
    assert_eq!(loa.value, "11.6");
    assert_eq!(loa.unit.as_deref(), Some("metres"));

    let manufacturers = db
        .with_conn(|conn| {
            let id = boats::find_id_by_reference(conn, "XML-1")?.unwrap();
            boats::terms_for(conn, id, taxonomy::MANUFACTURER)
        })
        .unwrap();
    assert_eq!(manufacturers, vec!["Najad"]);
}

#[test]
fn entry_without_reference_gets_one_generated() {
    let db = init_test_db();

    let feed = r#"<open_marine><broker><adverts>
      <advert status="Available">
        <advert_features><title>No ref</title></advert_features>
      </advert>
    </adverts></broker></open_marine>"#;

    let (records, _) = parse_feed(feed.as_bytes()).unwrap();
    let summary = apply_records(&db, &records, &NullMediaStore).unwrap();
    assert_eq!(summary.created, 1);
    assert!(summary
        .warnings
        .iter()
        .any(|w| w.message.contains("generated")));

    let generated: Vec<String> = summary.seen_references.iter().cloned().collect();
    assert_eq!(generated.len(), 1);
    assert!(generated[0].starts_with("boat-"));

    // The generated reference counts as seen, so reconciliation leaves the
    // fresh boat alone.
    let affected = db
        .with_conn(|conn| {
            reconcile::reconcile_missing(
                conn,
                &summary.seen_references,
                crate::config::Disposition::Delete,
            )
        })
        .unwrap();
    assert_eq!(affected, 0);
}

#[test]
fn upsert_returns_the_stored_boat_id() {
    let db = init_test_db();
    import_clean_csv(&db, "ref,title\nID-9,Known boat");

    let record = ImportRecord {
        source_row: 1,
        reference: Some("ID-9".to_string()),
        title: Some("Renamed".to_string()),
        ..Default::default()
    };
    let outcome = db
        .with_conn(|conn| {
            let tx = conn
                .transaction()
                .map_err(|e| SyncError::Db(e.to_string()))?;
            let mut warnings = Vec::new();
            let outcome = upsert::upsert_record(
                &tx,
                &record,
                &NullMediaStore,
                Utc::now().naive_utc(),
                &mut warnings,
            )?;
            tx.commit().map_err(|e| SyncError::Db(e.to_string()))?;
            Ok(outcome)
        })
        .unwrap();
    assert!(!outcome.created);

    let id = db
        .with_conn(|conn| boats::find_id_by_reference(conn, "ID-9"))
        .unwrap()
        .expect("boat missing");
    assert_eq!(outcome.boat_id, id);
}

#[test]
fn unknown_status_keeps_the_stored_one() {
    let db = init_test_db();
    import_clean_csv(&db, "ref,status\nST-1,Active");

    let (records, _) = parse_csv(b"ref,status\nST-1,definitely-not-a-status").unwrap();
    let summary = apply_records(&db, &records, &NullMediaStore).unwrap();
    assert!(summary
        .warnings
        .iter()
        .any(|w| w.message.contains("unknown status")));

    let boat = db
        .with_conn(|conn| {
            let id = boats::find_id_by_reference(conn, "ST-1")?.unwrap();
            boats::load_boat(conn, id)
        })
        .unwrap();
    assert_eq!(boat.status, BoatStatus::Active);
}
