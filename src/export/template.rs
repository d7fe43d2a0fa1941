// src/export/template.rs
//
// Writes a starter CSV with the full importable header set and one example
// row, so brokers don't have to guess the column names.

use crate::errors::SyncError;
use crate::import::csv::csv_headers;
use std::path::Path;

/// Example values for the columns worth demonstrating; everything else stays
/// blank.
fn example_value(header: &str) -> &'static str {
    match header {
        "ref" => "OM-1001",
        "status" => "Active",
        "title" => "Hallberg-Rassy 342",
        "description" => "Well maintained blue-water cruiser.",
        "short_description" => "Well maintained.",
        "manufacturer" => "Hallberg-Rassy",
        "model" => "342",
        "boat_type" => "Sail",
        "boat_category" => "Cruiser",
        "new_or_used" => "used",
        "designer" => "German Frers",
        "vessel_lying" => "Hamble",
        "vessel_lying_country" => "GB",
        "price" => "125000",
        "poa" => "false",
        "currency" => "GBP",
        "vat_included" => "incl. VAT",
        "vat_type" => "Tax Paid",
        "vat_country" => "GB",
        "featured_image" => "https://example.com/boats/1001/cover.jpg",
        "boat_media" => "https://example.com/boats/1001/deck.jpg,https://example.com/boats/1001/saloon.jpg",
        "boat_videos" => "https://example.com/boats/1001/tour.mp4",
        "dimensions.loa" => "35",
        "dimensions.loa_unit" => "ft",
        "dimensions.beam" => "3.42",
        "dimensions.beam_unit" => "metres",
        "build.year" => "2008",
        "engine.make" => "Volvo Penta",
        "engine.horse_power" => "40",
        "rig_sails.genoa_material" => "dacron",
        "rig_sails.genoa_furling" => "yes",
        _ => "",
    }
}

pub fn write_template(path: impl AsRef<Path>) -> Result<(), SyncError> {
    let headers = csv_headers();
    let mut writer = csv::Writer::from_path(path.as_ref())
        .map_err(|e| SyncError::Io(format!("Failed to create template: {e}")))?;
    writer.write_record(&headers)?;
    let row: Vec<&str> = headers.iter().map(|h| example_value(h)).collect();
    writer.write_record(&row)?;
    writer
        .flush()
        .map_err(|e| SyncError::Io(format!("Failed to flush template: {e}")))?;
    Ok(())
}
