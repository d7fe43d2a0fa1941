// src/import/csv.rs
//
// CSV import: header row + data rows zipped into flat key/value maps, then
// mapped onto ImportRecords with the same field names the XML side uses.
// Feature columns are dotted: "dimensions.loa", "dimensions.loa_unit",
// "rig_sails.genoa_material".

use crate::domain::boat::{parse_vat_included, FieldValue, VatType};
use crate::domain::catalog::{flat_feature_headers, Category};
use crate::domain::units::{currency_code_for, looks_like_iso_currency, parse_decimal};
use crate::errors::{SyncError, SyncWarning};
use crate::import::record::{ImportRecord, VatFlag};

/// Scalar columns preceding the feature columns. `ref` is the upsert key.
pub const CORE_COLUMNS: &[&str] = &[
    "ref",
    "status",
    "title",
    "description",
    "short_description",
    "manufacturer",
    "model",
    "boat_type",
    "boat_category",
    "new_or_used",
    "designer",
    "vessel_lying",
    "vessel_lying_country",
    "price",
    "poa",
    "currency",
    "vat_included",
    "vat_type",
    "vat_country",
    "featured_image",
    "boat_media",
    "boat_videos",
];

/// Full header contract, shared with the downloadable template.
pub fn csv_headers() -> Vec<String> {
    let mut headers: Vec<String> = CORE_COLUMNS.iter().map(|s| s.to_string()).collect();
    headers.extend(flat_feature_headers());
    headers
}

/// Parse CSV bytes into import records. Row numbers in warnings are 1-based
/// data rows (the header row is not counted). Ragged rows are padded or
/// truncated to the header length with a warning; only an unreadable file is
/// fatal.
pub fn parse_csv(raw: &[u8]) -> Result<(Vec<ImportRecord>, Vec<SyncWarning>), SyncError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(raw);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SyncError::Csv(format!("Failed to read header row: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        return Err(SyncError::Csv("CSV has no header row".into()));
    }

    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for (i, row) in reader.records().enumerate() {
        let row_no = i + 1;
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                warnings.push(SyncWarning::row(row_no, format!("unreadable row: {e}")));
                continue;
            }
        };

        if row.len() != headers.len() {
            warnings.push(SyncWarning::row(
                row_no,
                format!(
                    "row has {} columns, header has {}; padding/truncating",
                    row.len(),
                    headers.len()
                ),
            ));
        }

        let mut record = ImportRecord {
            source_row: row_no,
            ..Default::default()
        };
        // Zip against the header; short rows read as empty (absent), long
        // rows lose their overflow.
        for (key, value) in headers.iter().zip(row.iter().chain(std::iter::repeat(""))) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            apply_flat(&mut record, key, value, row_no, &mut warnings);
        }

        if record.is_blank() {
            warnings.push(SyncWarning::row(row_no, "blank row skipped"));
            continue;
        }
        records.push(record);
    }

    Ok((records, warnings))
}

fn apply_flat(
    record: &mut ImportRecord,
    key: &str,
    value: &str,
    row_no: usize,
    warnings: &mut Vec<SyncWarning>,
) {
    match key {
        "ref" => record.reference = Some(value.to_string()),
        "status" => record.status = Some(value.to_string()),
        "title" => record.title = Some(value.to_string()),
        "description" => record.description = Some(value.to_string()),
        "short_description" => record.short_description = Some(value.to_string()),
        "manufacturer" => record.manufacturer = Some(value.to_string()),
        "model" => record.model = Some(value.to_string()),
        "boat_type" => record.boat_type = Some(value.to_string()),
        "boat_category" => record.boat_category = Some(value.to_string()),
        "new_or_used" => record.new_or_used = Some(value.to_string()),
        "designer" => record.designer = Some(value.to_string()),
        "vessel_lying" => record.vessel_lying = Some(value.to_string()),
        "vessel_lying_country" => record.vessel_lying_country = Some(value.to_string()),
        "price" => match parse_decimal(value) {
            Some(v) => record.price.amount = Some(v),
            None => warnings.push(SyncWarning::row(row_no, format!("unparseable price {value:?}"))),
        },
        "poa" => record.price.poa = Some(matches!(value, "true" | "1" | "yes")),
        "currency" => {
            let code = currency_code_for(value);
            if !looks_like_iso_currency(&code) {
                warnings.push(SyncWarning::row(
                    row_no,
                    format!("currency {code:?} is not an ISO-4217 code, keeping as-is"),
                ));
            }
            record.price.currency = Some(code);
        }
        "vat_included" => {
            record.price.vat_included = Some(match parse_vat_included(value) {
                Some(true) => VatFlag::Included,
                Some(false) => VatFlag::Excluded,
                None => VatFlag::Unspecified,
            });
        }
        "vat_type" => record.price.vat_type = Some(VatType::parse(value)),
        "vat_country" => record.price.vat_country = Some(value.to_string()),
        "featured_image" => record.featured_image = Some(value.to_string()),
        "boat_media" => {
            record
                .media_urls
                .extend(split_url_list(value));
        }
        "boat_videos" => {
            record
                .video_urls
                .extend(split_url_list(value));
        }
        _ => apply_feature_column(record, key, value, row_no, warnings),
    }
}

fn apply_feature_column(
    record: &mut ImportRecord,
    key: &str,
    value: &str,
    row_no: usize,
    warnings: &mut Vec<SyncWarning>,
) {
    let Some((cat_name, field_name)) = key.split_once('.') else {
        warnings.push(SyncWarning::row(row_no, format!("unknown column {key:?}")));
        return;
    };
    let Some(category) = Category::from_wire(cat_name) else {
        warnings.push(SyncWarning::row(
            row_no,
            format!("unknown feature category {cat_name:?}"),
        ));
        return;
    };

    // Unit columns attach to their base field instead of standing alone.
    if let Some(base) = field_name.strip_suffix("_unit") {
        record
            .features
            .entry(category)
            .or_default()
            .entry(base.to_string())
            .or_insert_with(|| FieldValue::text(""))
            .unit = Some(value.to_string());
        return;
    }

    record
        .features
        .entry(category)
        .or_default()
        .entry(field_name.to_string())
        .and_modify(|fv| fv.value = value.to_string())
        .or_insert_with(|| FieldValue::text(value));
}

fn split_url_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
