// src/import/upsert.rs
//
// Resolves a parsed feed entry to a stored boat (by exact reference match)
// and applies it as a partial update. Fields absent from the feed keep their
// stored values; that is what makes re-running the same feed a no-op.

use crate::db::boats;
use crate::domain::boat::{taxonomy, FieldValue, MediaItem};
use crate::domain::catalog::Category;
use crate::domain::status::BoatStatus;
use crate::errors::{SyncError, SyncWarning};
use crate::import::media::MediaStore;
use crate::import::record::ImportRecord;
use chrono::NaiveDateTime;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rusqlite::{params, Connection};

#[derive(Debug)]
pub struct UpsertOutcome {
    pub boat_id: i64,
    pub reference: String,
    pub created: bool,
}

/// Fallback reference for feed entries that omit one.
pub fn generate_reference() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    format!("boat-{}", suffix.to_lowercase())
}

pub fn upsert_record(
    conn: &Connection,
    record: &ImportRecord,
    media: &dyn MediaStore,
    now: NaiveDateTime,
    warnings: &mut Vec<SyncWarning>,
) -> Result<UpsertOutcome, SyncError> {
    let reference = match &record.reference {
        Some(r) => r.clone(),
        None => {
            let generated = generate_reference();
            warnings.push(SyncWarning::row(
                record.source_row,
                format!("feed entry has no reference, generated {generated:?}"),
            ));
            generated
        }
    };

    let (boat_id, created) = match boats::find_id_by_reference(conn, &reference)? {
        Some(id) => (id, false),
        None => (boats::create_boat(conn, &reference, now)?, true),
    };

    apply_core_fields(conn, boat_id, record)?;
    apply_status(conn, boat_id, record, warnings)?;
    apply_features(conn, boat_id, record)?;
    apply_taxonomies(conn, boat_id, record)?;
    apply_media(conn, boat_id, &reference, record, media, warnings)?;

    boats::touch_last_modified(conn, boat_id, now)?;

    Ok(UpsertOutcome {
        boat_id,
        reference,
        created,
    })
}

/// One static UPDATE; absent fields come through as NULL and COALESCE keeps
/// the stored value.
fn apply_core_fields(
    conn: &Connection,
    boat_id: i64,
    record: &ImportRecord,
) -> Result<(), SyncError> {
    conn.execute(
        r#"
        UPDATE boats SET
            title = COALESCE(?1, title),
            description = COALESCE(?2, description),
            short_description = COALESCE(?3, short_description),
            manufacturer = COALESCE(?4, manufacturer),
            model = COALESCE(?5, model),
            boat_type = COALESCE(?6, boat_type),
            boat_category = COALESCE(?7, boat_category),
            new_or_used = COALESCE(?8, new_or_used),
            vessel_lying = COALESCE(?9, vessel_lying),
            vessel_lying_country = COALESCE(?10, vessel_lying_country),
            price_amount = COALESCE(?11, price_amount),
            price_poa = COALESCE(?12, price_poa),
            currency = COALESCE(?13, currency),
            vat_country = COALESCE(?14, vat_country)
        WHERE id = ?15
        "#,
        params![
            record.title,
            record.description,
            record.short_description,
            record.manufacturer,
            record.model,
            record.boat_type,
            record.boat_category,
            record.new_or_used,
            record.vessel_lying,
            record.vessel_lying_country,
            record.price.amount,
            record.price.poa,
            record.price.currency,
            record.price.vat_country,
            boat_id
        ],
    )
    .map_err(|e| SyncError::Db(e.to_string()))?;

    // Tri-state VAT fields can legitimately set NULL/empty, so COALESCE
    // doesn't work for them.
    if let Some(flag) = record.price.vat_included {
        conn.execute(
            "UPDATE boats SET vat_included = ?1 WHERE id = ?2",
            params![flag.as_option(), boat_id],
        )
        .map_err(|e| SyncError::Db(e.to_string()))?;
    }
    if let Some(vat_type) = record.price.vat_type {
        conn.execute(
            "UPDATE boats SET vat_type = ?1 WHERE id = ?2",
            params![vat_type.to_wire(), boat_id],
        )
        .map_err(|e| SyncError::Db(e.to_string()))?;
    }
    Ok(())
}

fn apply_status(
    conn: &Connection,
    boat_id: i64,
    record: &ImportRecord,
    warnings: &mut Vec<SyncWarning>,
) -> Result<(), SyncError> {
    let Some(raw) = &record.status else {
        return Ok(());
    };
    match BoatStatus::from_wire(raw) {
        Some(status) => {
            boats::set_status(conn, boat_id, status)?;
            // boat-status is singular: drop the opposing term so a boat is
            // never both "sold" and "available".
            boats::replace_terms(
                conn,
                boat_id,
                taxonomy::BOAT_STATUS,
                &[status.taxonomy_term()],
            )?;
        }
        None => warnings.push(SyncWarning::row(
            record.source_row,
            format!("unknown status {raw:?}, keeping stored status"),
        )),
    }
    Ok(())
}

fn apply_features(
    conn: &Connection,
    boat_id: i64,
    record: &ImportRecord,
) -> Result<(), SyncError> {
    for (category, fields) in &record.features {
        for (name, value) in fields {
            boats::upsert_field(conn, boat_id, *category, 0, name, value)?;
        }
    }
    if !record.other_engines.is_empty() {
        boats::replace_other_engines(conn, boat_id, &record.other_engines)?;
    }
    Ok(())
}

fn apply_taxonomies(
    conn: &Connection,
    boat_id: i64,
    record: &ImportRecord,
) -> Result<(), SyncError> {
    // Multi-value taxonomies accumulate across imports.
    if let Some(manufacturer) = &record.manufacturer {
        boats::assign_term(conn, boat_id, taxonomy::MANUFACTURER, manufacturer)?;
    }
    if let Some(designer) = &record.designer {
        boats::assign_term(conn, boat_id, taxonomy::DESIGNER, designer)?;
        // Designer also lives as a build feature for export.
        boats::upsert_field(
            conn,
            boat_id,
            Category::Build,
            0,
            "designer",
            &FieldValue::text(designer.clone()),
        )?;
    }

    // Singular taxonomies replace.
    if let Some(category) = &record.boat_category {
        boats::replace_terms(conn, boat_id, taxonomy::BOAT_CATEGORY, &[category.as_str()])?;
    }
    if let Some(boat_type) = &record.boat_type {
        boats::replace_terms(conn, boat_id, taxonomy::BOAT_TYPE, &[boat_type.as_str()])?;
    }
    if let Some(condition) = &record.new_or_used {
        boats::replace_terms(conn, boat_id, taxonomy::CONDITION, &[condition.as_str()])?;
    }
    Ok(())
}

fn apply_media(
    conn: &Connection,
    boat_id: i64,
    reference: &str,
    record: &ImportRecord,
    media: &dyn MediaStore,
    warnings: &mut Vec<SyncWarning>,
) -> Result<(), SyncError> {
    let mut current_primary = boats::primary_image_url(conn, boat_id)?;

    if let Some(url) = &record.featured_image {
        if current_primary.as_deref() != Some(url.as_str()) {
            match media.attach(reference, url) {
                Ok(_) => {
                    boats::add_media(
                        conn,
                        boat_id,
                        &MediaItem {
                            url: url.clone(),
                            mime_type: guess_image_mime(url),
                            is_primary: true,
                            caption: String::new(),
                            file_mtime: String::new(),
                        },
                    )?;
                    current_primary = Some(url.clone());
                }
                Err(e) => warnings.push(SyncWarning::reference(
                    reference,
                    format!("featured image {url} failed: {e}"),
                )),
            }
        }
    }

    for url in &record.media_urls {
        // A gallery URL matching the current cover image is skipped, so the
        // cover never duplicates into the gallery.
        if current_primary.as_deref() == Some(url.as_str()) {
            continue;
        }
        match media.attach(reference, url) {
            Ok(_) => {
                boats::add_media(
                    conn,
                    boat_id,
                    &MediaItem {
                        url: url.clone(),
                        mime_type: guess_image_mime(url),
                        is_primary: false,
                        caption: String::new(),
                        file_mtime: String::new(),
                    },
                )?;
            }
            Err(e) => warnings.push(SyncWarning::reference(
                reference,
                format!("image {url} failed: {e}"),
            )),
        }
    }

    for url in &record.video_urls {
        boats::add_video(conn, boat_id, url)?;
    }
    Ok(())
}

fn guess_image_mime(url: &str) -> String {
    let lower = url.to_lowercase();
    let mime = if lower.ends_with(".png") {
        mime::IMAGE_PNG
    } else if lower.ends_with(".gif") {
        mime::IMAGE_GIF
    } else {
        mime::IMAGE_JPEG
    };
    mime.to_string()
}
