use crate::domain::boat::{BoatRecord, FieldMap, FieldValue, MediaItem, PriceInfo, VatType};
use crate::domain::catalog::Category;
use crate::domain::status::BoatStatus;
use crate::errors::SyncError;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;

/// Boat visibility in the store. Only published boats export; draft/hidden
/// are the reconciler's soft-removal states.
pub mod visibility {
    pub const PUBLISHED: &str = "published";
    pub const DRAFT: &str = "draft";
    pub const HIDDEN: &str = "hidden";
}

fn db_err(e: rusqlite::Error) -> SyncError {
    SyncError::Db(e.to_string())
}

/// Create an empty boat under `reference`. The reference is the upsert key
/// and immutable after this point.
pub fn create_boat(
    conn: &Connection,
    reference: &str,
    now: NaiveDateTime,
) -> Result<i64, SyncError> {
    conn.execute(
        "INSERT INTO boats (reference, created_at, last_modified) VALUES (?1, ?2, ?3)",
        params![reference, now, now],
    )
    .map_err(db_err)?;
    Ok(conn.last_insert_rowid())
}

/// Exact, case-sensitive reference lookup.
pub fn find_id_by_reference(conn: &Connection, reference: &str) -> Result<Option<i64>, SyncError> {
    conn.query_row(
        "SELECT id FROM boats WHERE reference = ?1",
        params![reference],
        |row| row.get(0),
    )
    .optional()
    .map_err(db_err)
}

pub fn all_references(conn: &Connection) -> Result<Vec<(i64, String)>, SyncError> {
    let mut stmt = conn
        .prepare("SELECT id, reference FROM boats ORDER BY id")
        .map_err(db_err)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(db_err)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(db_err)?);
    }
    Ok(out)
}

pub fn touch_last_modified(
    conn: &Connection,
    boat_id: i64,
    now: NaiveDateTime,
) -> Result<(), SyncError> {
    conn.execute(
        "UPDATE boats SET last_modified = ?1 WHERE id = ?2",
        params![now, boat_id],
    )
    .map_err(db_err)?;
    Ok(())
}

pub fn set_status(conn: &Connection, boat_id: i64, status: BoatStatus) -> Result<(), SyncError> {
    conn.execute(
        "UPDATE boats SET status = ?1 WHERE id = ?2",
        params![status.as_db_str(), boat_id],
    )
    .map_err(db_err)?;
    Ok(())
}

pub fn set_visibility(conn: &Connection, boat_id: i64, vis: &str) -> Result<(), SyncError> {
    conn.execute(
        "UPDATE boats SET visibility = ?1 WHERE id = ?2",
        params![vis, boat_id],
    )
    .map_err(db_err)?;
    Ok(())
}

pub fn delete_boat(conn: &Connection, boat_id: i64) -> Result<(), SyncError> {
    conn.execute("DELETE FROM boats WHERE id = ?1", params![boat_id])
        .map_err(db_err)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// feature fields

pub fn upsert_field(
    conn: &Connection,
    boat_id: i64,
    category: Category,
    engine_slot: i64,
    name: &str,
    value: &FieldValue,
) -> Result<(), SyncError> {
    conn.execute(
        r#"
        INSERT INTO boat_fields (boat_id, category, engine_slot, name, value, unit)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(boat_id, category, engine_slot, name) DO UPDATE SET
            value = excluded.value,
            unit = excluded.unit
        "#,
        params![
            boat_id,
            category.wire_name(),
            engine_slot,
            name,
            value.value,
            value.unit
        ],
    )
    .map_err(db_err)?;
    Ok(())
}

/// Slots >= 1 are replaced wholesale; the feed is authoritative for how many
/// extra engines a boat has.
pub fn replace_other_engines(
    conn: &Connection,
    boat_id: i64,
    engines: &[FieldMap],
) -> Result<(), SyncError> {
    conn.execute(
        "DELETE FROM boat_fields WHERE boat_id = ?1 AND category = 'engine' AND engine_slot >= 1",
        params![boat_id],
    )
    .map_err(db_err)?;

    for (i, engine) in engines.iter().enumerate() {
        let slot = (i + 1) as i64;
        for (name, value) in engine {
            upsert_field(conn, boat_id, Category::Engine, slot, name, value)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// media / videos

pub fn primary_image_url(conn: &Connection, boat_id: i64) -> Result<Option<String>, SyncError> {
    conn.query_row(
        "SELECT url FROM boat_media WHERE boat_id = ?1 AND is_primary = 1",
        params![boat_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(db_err)
}

pub fn add_media(conn: &Connection, boat_id: i64, item: &MediaItem) -> Result<(), SyncError> {
    if item.is_primary {
        // At most one primary per boat.
        conn.execute(
            "UPDATE boat_media SET is_primary = 0 WHERE boat_id = ?1",
            params![boat_id],
        )
        .map_err(db_err)?;
    }
    conn.execute(
        r#"
        INSERT INTO boat_media (boat_id, position, url, mime_type, is_primary, caption, file_mtime)
        VALUES (
            ?1,
            COALESCE((SELECT MAX(position) + 1 FROM boat_media WHERE boat_id = ?1), 0),
            ?2, ?3, ?4, ?5, ?6
        )
        ON CONFLICT(boat_id, url) DO UPDATE SET
            mime_type = excluded.mime_type,
            is_primary = excluded.is_primary,
            caption = excluded.caption,
            file_mtime = excluded.file_mtime
        "#,
        params![
            boat_id,
            item.url,
            item.mime_type,
            item.is_primary,
            item.caption,
            item.file_mtime
        ],
    )
    .map_err(db_err)?;
    Ok(())
}

pub fn add_video(conn: &Connection, boat_id: i64, url: &str) -> Result<(), SyncError> {
    conn.execute(
        r#"
        INSERT INTO boat_videos (boat_id, position, url)
        VALUES (
            ?1,
            COALESCE((SELECT MAX(position) + 1 FROM boat_videos WHERE boat_id = ?1), 0),
            ?2
        )
        ON CONFLICT(boat_id, url) DO NOTHING
        "#,
        params![boat_id, url],
    )
    .map_err(db_err)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// taxonomy

pub fn assign_term(
    conn: &Connection,
    boat_id: i64,
    taxonomy: &str,
    term: &str,
) -> Result<(), SyncError> {
    conn.execute(
        r#"
        INSERT INTO boat_taxonomy (boat_id, taxonomy, term)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(boat_id, taxonomy, term) DO NOTHING
        "#,
        params![boat_id, taxonomy, term],
    )
    .map_err(db_err)?;
    Ok(())
}

/// Singular taxonomies: remove every opposing term before assigning, so a
/// boat never carries both "sold" and "available".
pub fn replace_terms(
    conn: &Connection,
    boat_id: i64,
    taxonomy: &str,
    terms: &[&str],
) -> Result<(), SyncError> {
    conn.execute(
        "DELETE FROM boat_taxonomy WHERE boat_id = ?1 AND taxonomy = ?2",
        params![boat_id, taxonomy],
    )
    .map_err(db_err)?;
    for term in terms {
        assign_term(conn, boat_id, taxonomy, term)?;
    }
    Ok(())
}

pub fn terms_for(
    conn: &Connection,
    boat_id: i64,
    taxonomy: &str,
) -> Result<Vec<String>, SyncError> {
    let mut stmt = conn
        .prepare("SELECT term FROM boat_taxonomy WHERE boat_id = ?1 AND taxonomy = ?2 ORDER BY term")
        .map_err(db_err)?;
    let rows = stmt
        .query_map(params![boat_id, taxonomy], |row| row.get(0))
        .map_err(db_err)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(db_err)?);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// assembly

/// Load one boat with everything attached.
pub fn load_boat(conn: &Connection, boat_id: i64) -> Result<BoatRecord, SyncError> {
    let mut boat = conn
        .query_row(
            r#"
            SELECT reference, title, description, short_description, status,
                   manufacturer, model, boat_type, boat_category, new_or_used,
                   vessel_lying, vessel_lying_country,
                   price_amount, price_poa, currency, vat_included, vat_type, vat_country,
                   last_modified
            FROM boats WHERE id = ?1
            "#,
            params![boat_id],
            |row| {
                let status: String = row.get(4)?;
                let vat_type: String = row.get(16)?;
                Ok(BoatRecord {
                    id: boat_id,
                    reference: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    short_description: row.get(3)?,
                    status: BoatStatus::from_db_str(&status),
                    manufacturer: row.get(5)?,
                    model: row.get(6)?,
                    boat_type: row.get(7)?,
                    boat_category: row.get(8)?,
                    new_or_used: row.get(9)?,
                    vessel_lying: row.get(10)?,
                    vessel_lying_country: row.get(11)?,
                    price: PriceInfo {
                        amount: row.get(12)?,
                        poa: row.get(13)?,
                        currency: row.get(14)?,
                        vat_included: row.get(15)?,
                        vat_type: VatType::parse(&vat_type),
                        vat_country: row.get(17)?,
                    },
                    features: BTreeMap::new(),
                    other_engines: Vec::new(),
                    media: Vec::new(),
                    videos: Vec::new(),
                    taxonomies: BTreeMap::new(),
                    last_modified: row.get(18)?,
                })
            },
        )
        .map_err(db_err)?;

    // Feature fields, other_engines included.
    let mut stmt = conn
        .prepare(
            "SELECT category, engine_slot, name, value, unit
             FROM boat_fields WHERE boat_id = ?1 ORDER BY engine_slot, category, name",
        )
        .map_err(db_err)?;
    let rows = stmt
        .query_map(params![boat_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })
        .map_err(db_err)?;

    for r in rows {
        let (category, slot, name, value, unit) = r.map_err(db_err)?;
        let Some(category) = Category::from_wire(&category) else {
            continue; // unknown category rows are ignored, not fatal
        };
        let fv = FieldValue { value, unit };
        if category == Category::Engine && slot >= 1 {
            let idx = (slot - 1) as usize;
            while boat.other_engines.len() <= idx {
                boat.other_engines.push(FieldMap::new());
            }
            boat.other_engines[idx].insert(name, fv);
        } else {
            boat.features.entry(category).or_default().insert(name, fv);
        }
    }

    // Media, in gallery order.
    let mut stmt = conn
        .prepare(
            "SELECT url, mime_type, is_primary, caption, file_mtime
             FROM boat_media WHERE boat_id = ?1 ORDER BY position",
        )
        .map_err(db_err)?;
    let rows = stmt
        .query_map(params![boat_id], |row| {
            Ok(MediaItem {
                url: row.get(0)?,
                mime_type: row.get(1)?,
                is_primary: row.get(2)?,
                caption: row.get(3)?,
                file_mtime: row.get(4)?,
            })
        })
        .map_err(db_err)?;
    for r in rows {
        boat.media.push(r.map_err(db_err)?);
    }

    let mut stmt = conn
        .prepare("SELECT url FROM boat_videos WHERE boat_id = ?1 ORDER BY position")
        .map_err(db_err)?;
    let rows = stmt
        .query_map(params![boat_id], |row| row.get(0))
        .map_err(db_err)?;
    for r in rows {
        boat.videos.push(r.map_err(db_err)?);
    }

    let mut stmt = conn
        .prepare("SELECT taxonomy, term FROM boat_taxonomy WHERE boat_id = ?1 ORDER BY taxonomy, term")
        .map_err(db_err)?;
    let rows = stmt
        .query_map(params![boat_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(db_err)?;
    for r in rows {
        let (taxonomy, term) = r.map_err(db_err)?;
        boat.taxonomies.entry(taxonomy).or_default().push(term);
    }

    Ok(boat)
}

/// All boats that should appear in the export, in stable fetch order
/// (insertion order, never re-sorted).
pub fn exportable_boats(
    conn: &Connection,
    include_sold: bool,
) -> Result<Vec<BoatRecord>, SyncError> {
    let mut stmt = conn
        .prepare("SELECT id, status FROM boats WHERE visibility = 'published' ORDER BY id")
        .map_err(db_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(db_err)?;

    let mut ids = Vec::new();
    for r in rows {
        let (id, status) = r.map_err(db_err)?;
        if BoatStatus::from_db_str(&status).exportable(include_sold) {
            ids.push(id);
        }
    }

    let mut boats = Vec::with_capacity(ids.len());
    for id in ids {
        boats.push(load_boat(conn, id)?);
    }
    Ok(boats)
}

// ---------------------------------------------------------------------------
// search

#[derive(Debug, Default)]
pub struct BoatSearch {
    pub year_min: Option<i64>,
    pub year_max: Option<i64>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub status: Option<BoatStatus>,
}

#[derive(Debug)]
pub struct BoatSummary {
    pub id: i64,
    pub reference: String,
    pub title: String,
    pub status: BoatStatus,
}

pub fn search_boats(conn: &Connection, search: &BoatSearch) -> Result<Vec<BoatSummary>, SyncError> {
    if let (Some(min), Some(max)) = (search.year_min, search.year_max) {
        if min > max {
            return Err(SyncError::InvalidRange(format!(
                "year range {min}..{max} has min > max"
            )));
        }
    }
    if let (Some(min), Some(max)) = (search.price_min, search.price_max) {
        if min > max {
            return Err(SyncError::InvalidRange(format!(
                "price range {min}..{max} has min > max"
            )));
        }
    }

    let mut stmt = conn
        .prepare(
            r#"
            SELECT b.id, b.reference, b.title, b.status
            FROM boats b
            LEFT JOIN boat_fields y
                   ON y.boat_id = b.id AND y.category = 'build'
                  AND y.name = 'year' AND y.engine_slot = 0
            WHERE (?1 IS NULL OR CAST(y.value AS INTEGER) >= ?1)
              AND (?2 IS NULL OR CAST(y.value AS INTEGER) <= ?2)
              AND (?3 IS NULL OR b.price_amount >= ?3)
              AND (?4 IS NULL OR b.price_amount <= ?4)
              AND (?5 IS NULL OR b.status = ?5)
            ORDER BY b.id
            "#,
        )
        .map_err(db_err)?;

    let status = search.status.map(|s| s.as_db_str());
    let rows = stmt
        .query_map(
            params![
                search.year_min,
                search.year_max,
                search.price_min,
                search.price_max,
                status
            ],
            |row| {
                let status: String = row.get(3)?;
                Ok(BoatSummary {
                    id: row.get(0)?,
                    reference: row.get(1)?,
                    title: row.get(2)?,
                    status: BoatStatus::from_db_str(&status),
                })
            },
        )
        .map_err(db_err)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(db_err)?);
    }
    Ok(out)
}
