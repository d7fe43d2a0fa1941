use crate::db::boats;
use crate::domain::catalog::Category;
use crate::domain::status::BoatStatus;
use crate::export::xml::{serialize, ExportContext};
use crate::import::xml::parse_feed;
use crate::import::apply_records;
use crate::tests::utils::{import_clean_csv, init_test_db, NullMediaStore};
use chrono::NaiveDate;

fn ctx() -> ExportContext<'static> {
    ExportContext {
        site_name: "Harbour Yachts",
        broker_code: "BRK01",
        office_id: "1",
        offices: &[],
        generated_at: NaiveDate::from_ymd_opt(2026, 8, 25)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap(),
    }
}

fn export_xml(db: &crate::db::Database, include_sold: bool) -> String {
    let records = db
        .with_conn(|conn| boats::exportable_boats(conn, include_sold))
        .unwrap();
    let (bytes, warnings) = serialize(&records, &ctx()).unwrap();
    assert!(warnings.is_empty(), "{warnings:?}");
    String::from_utf8(bytes).unwrap()
}

#[test]
fn export_and_reimport_preserve_the_record() {
    let db = init_test_db();
    import_clean_csv(
        &db,
        "ref,title,description,status,manufacturer,model,price,currency,vat_included,vessel_lying,vessel_lying_country,dimensions.loa,dimensions.loa_unit,engine.make,engine.hours\n\
         RT-1,Roundtrip 36,\"Cared for, dry sailed.\",Active,Najad,360,150000,GBP,incl. VAT,Orust,SE,35,ft,Volvo Penta,0",
    );

    let xml = export_xml(&db, false);

    // Feed a second database with our own export.
    let other = init_test_db();
    let (records, warnings) = parse_feed(xml.as_bytes()).unwrap();
    assert!(warnings.is_empty(), "{warnings:?}");
    apply_records(&other, &records, &NullMediaStore).unwrap();

    let (a, b) = {
        let a = db
            .with_conn(|conn| {
                let id = boats::find_id_by_reference(conn, "RT-1")?.unwrap();
                boats::load_boat(conn, id)
            })
            .unwrap();
        let b = other
            .with_conn(|conn| {
                let id = boats::find_id_by_reference(conn, "RT-1")?.unwrap();
                boats::load_boat(conn, id)
            })
            .unwrap();
        (a, b)
    };

    assert_eq!(a.title, b.title);
    assert_eq!(a.description, b.description);
    assert_eq!(a.status, b.status);
    assert_eq!(a.manufacturer, b.manufacturer);
    assert_eq!(a.model, b.model);
    assert_eq!(a.price.amount, b.price.amount);
    assert_eq!(a.price.currency, b.price.currency);
    assert_eq!(a.price.vat_included, b.price.vat_included);
    assert_eq!(a.vessel_lying, b.vessel_lying);
    assert_eq!(a.vessel_lying_country, b.vessel_lying_country);
    assert_eq!(
        a.field(Category::Dimensions, "loa"),
        b.field(Category::Dimensions, "loa")
    );
    // "0" hours survive; they are data, not absence.
    assert_eq!(
        b.field(Category::Engine, "hours").map(|f| f.value.as_str()),
        Some("0")
    );
}

#[test]
fn exporting_twice_yields_the_same_document() {
    let db = init_test_db();
    import_clean_csv(&db, "ref,title,price\nID-1,Same boat,50000");

    let first = export_xml(&db, false);
    let second = export_xml(&db, false);
    assert_eq!(first, second);
}

#[test]
fn sold_boats_are_filtered_unless_configured_in() {
    let db = init_test_db();
    import_clean_csv(
        &db,
        "ref,title,status\n\
         S-1,For sale,Active\n\
         S-2,Gone,Sold",
    );

    let without = export_xml(&db, false);
    assert!(without.contains("ref=\"S-1\""));
    assert!(!without.contains("ref=\"S-2\""));

    let with = export_xml(&db, true);
    assert!(with.contains("ref=\"S-1\""));
    assert!(with.contains("ref=\"S-2\""));
    assert!(with.contains("status=\"Sold\""));
}

#[test]
fn removed_and_inactive_never_export() {
    let db = init_test_db();
    import_clean_csv(&db, "ref,title,status\nR-1,Withdrawn,Removed");

    let xml = export_xml(&db, true);
    assert!(!xml.contains("ref=\"R-1\""));
}

#[test]
fn statuses_map_to_wire_values() {
    let db = init_test_db();
    import_clean_csv(
        &db,
        "ref,status\n\
         W-1,Active\n\
         W-2,Under Offer",
    );

    let xml = export_xml(&db, false);
    assert!(xml.contains("ref=\"W-1\" status=\"Available\""));
    assert!(xml.contains("ref=\"W-2\" status=\"UnderOffer\""));
}

#[test]
fn hidden_boats_stay_out_of_the_export() {
    let db = init_test_db();
    import_clean_csv(&db, "ref,title\nH-1,Hidden boat");

    db.with_conn(|conn| {
        let id = boats::find_id_by_reference(conn, "H-1")?.unwrap();
        boats::set_visibility(conn, id, boats::visibility::HIDDEN)
    })
    .unwrap();

    let records = db
        .with_conn(|conn| boats::exportable_boats(conn, true))
        .unwrap();
    assert!(records.is_empty());
}
