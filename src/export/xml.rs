// src/export/xml.rs
//
// Open Marine 1.7 serializer. One document per run; adverts appear in fetch
// order. A boat that can't be serialized is skipped with a warning and the
// rest of the batch carries on.

use crate::config::Office;
use crate::domain::boat::{BoatRecord, FieldValue};
use crate::domain::catalog::{Category, CategoryDef, FieldDef, CATALOG};
use crate::domain::units::{length_to_metres, parse_decimal};
use crate::errors::{SyncError, SyncWarning};
use chrono::NaiveDateTime;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

pub struct ExportContext<'a> {
    pub site_name: &'a str,
    pub broker_code: &'a str,
    pub office_id: &'a str,
    pub offices: &'a [Office],
    pub generated_at: NaiveDateTime,
}

type Xml = Writer<Vec<u8>>;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Serialize the full document. Returns the bytes plus one warning per boat
/// that had to be left out.
pub fn serialize(
    records: &[BoatRecord],
    ctx: &ExportContext,
) -> Result<(Vec<u8>, Vec<SyncWarning>), SyncError> {
    let mut warnings = Vec::new();
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);

    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let date = ctx.generated_at.format(DATE_FORMAT).to_string();
    let mut root = BytesStart::new("open_marine");
    root.push_attribute(("version", "1.7"));
    root.push_attribute(("language", "en"));
    root.push_attribute(("origin", ctx.site_name));
    root.push_attribute(("date", date.as_str()));
    w.write_event(Event::Start(root))?;

    let mut broker = BytesStart::new("broker");
    broker.push_attribute(("code", ctx.broker_code));
    w.write_event(Event::Start(broker))?;

    write_offices(&mut w, ctx.offices)?;

    w.write_event(Event::Start(BytesStart::new("adverts")))?;
    for boat in records {
        if boat.reference.is_empty() {
            warnings.push(SyncWarning::reference(
                "(none)",
                format!("boat {} has no reference, skipped", boat.id),
            ));
            continue;
        }
        write_advert(&mut w, boat, ctx)?;
    }
    w.write_event(Event::End(BytesEnd::new("adverts")))?;

    w.write_event(Event::End(BytesEnd::new("broker")))?;
    w.write_event(Event::End(BytesEnd::new("open_marine")))?;

    Ok((w.into_inner(), warnings))
}

fn write_offices(w: &mut Xml, offices: &[Office]) -> Result<(), SyncError> {
    w.write_event(Event::Start(BytesStart::new("offices")))?;
    for office in offices {
        let mut el = BytesStart::new("office");
        el.push_attribute(("id", office.id.as_str()));
        w.write_event(Event::Start(el))?;

        text_el(w, "office_name", &office.office_name)?;
        text_el(w, "email", &office.email)?;

        w.write_event(Event::Start(BytesStart::new("name")))?;
        text_el(w, "title", &office.title)?;
        text_el(w, "forename", &office.forename)?;
        text_el(w, "surname", &office.surname)?;
        w.write_event(Event::End(BytesEnd::new("name")))?;

        text_el(w, "address", &office.address)?;
        text_el(w, "town", &office.town)?;
        text_el(w, "county", &office.county)?;
        text_el(w, "postcode", &office.postcode)?;
        text_el(w, "country", &office.country)?;
        text_el(w, "daytime_phone", &office.daytime_phone)?;
        text_el(w, "evening_phone", &office.evening_phone)?;
        text_el(w, "mobile", &office.mobile)?;
        text_el(w, "fax", &office.fax)?;
        text_el(w, "website", &office.website)?;

        w.write_event(Event::End(BytesEnd::new("office")))?;
    }
    w.write_event(Event::End(BytesEnd::new("offices")))?;
    Ok(())
}

fn write_advert(w: &mut Xml, boat: &BoatRecord, ctx: &ExportContext) -> Result<(), SyncError> {
    let last_modified = boat.last_modified.format(DATE_FORMAT).to_string();
    let mut advert = BytesStart::new("advert");
    advert.push_attribute(("ref", boat.reference.as_str()));
    advert.push_attribute(("status", boat.status.to_wire()));
    advert.push_attribute(("last_modified", last_modified.as_str()));
    advert.push_attribute(("office_id", ctx.office_id));
    w.write_event(Event::Start(advert))?;

    write_advert_media(w, boat)?;
    write_advert_features(w, boat)?;
    write_boat_features(w, boat)?;

    w.write_event(Event::End(BytesEnd::new("advert")))?;
    Ok(())
}

fn write_advert_media(w: &mut Xml, boat: &BoatRecord) -> Result<(), SyncError> {
    w.write_event(Event::Start(BytesStart::new("advert_media")))?;
    for item in &boat.media {
        if item.url.is_empty() {
            continue;
        }
        let mut el = BytesStart::new("media");
        el.push_attribute(("type", item.mime_type.as_str()));
        el.push_attribute(("primary", if item.is_primary { "true" } else { "false" }));
        el.push_attribute(("caption", item.caption.as_str()));
        el.push_attribute(("file_mtime", item.file_mtime.as_str()));
        w.write_event(Event::Start(el))?;
        w.write_event(Event::Text(BytesText::new(&item.url)))?;
        w.write_event(Event::End(BytesEnd::new("media")))?;
    }
    for url in &boat.videos {
        let mut el = BytesStart::new("media");
        el.push_attribute(("type", "video/mp4"));
        el.push_attribute(("primary", "false"));
        w.write_event(Event::Start(el))?;
        w.write_event(Event::Text(BytesText::new(url)))?;
        w.write_event(Event::End(BytesEnd::new("media")))?;
    }
    w.write_event(Event::End(BytesEnd::new("advert_media")))?;
    Ok(())
}

fn write_advert_features(w: &mut Xml, boat: &BoatRecord) -> Result<(), SyncError> {
    w.write_event(Event::Start(BytesStart::new("advert_features")))?;

    text_el_skip_empty(w, "title", &boat.title)?;
    text_el_skip_empty(w, "boat_type", &boat.boat_type)?;
    text_el_skip_empty(w, "boat_category", &boat.boat_category)?;
    text_el_skip_empty(w, "new_or_used", &boat.new_or_used)?;

    if !boat.vessel_lying.is_empty() || !boat.vessel_lying_country.is_empty() {
        let mut el = BytesStart::new("vessel_lying");
        el.push_attribute(("country", boat.vessel_lying_country.as_str()));
        w.write_event(Event::Start(el))?;
        w.write_event(Event::Text(BytesText::new(&boat.vessel_lying)))?;
        w.write_event(Event::End(BytesEnd::new("vessel_lying")))?;
    }

    // The price node and its VAT attributes always emit, empty or not.
    let price = &boat.price;
    let mut el = BytesStart::new("asking_price");
    el.push_attribute(("poa", if price.poa { "true" } else { "false" }));
    el.push_attribute(("currency", price.currency.as_str()));
    el.push_attribute(("vat_included", price.vat_included_text()));
    el.push_attribute(("vat_type", price.vat_type.to_wire()));
    el.push_attribute(("vat_country", price.vat_country.as_str()));
    let amount = price.amount_text();
    if amount.is_empty() {
        w.write_event(Event::Empty(el))?;
    } else {
        w.write_event(Event::Start(el))?;
        w.write_event(Event::Text(BytesText::new(&amount)))?;
        w.write_event(Event::End(BytesEnd::new("asking_price")))?;
    }

    if !boat.description.is_empty() || !boat.short_description.is_empty() {
        w.write_event(Event::Start(BytesStart::new("marketing_descs")))?;
        if !boat.description.is_empty() {
            cdata_el(w, "marketing_desc", &boat.description)?;
        }
        if !boat.short_description.is_empty() {
            cdata_el(w, "marketing_short_desc", &boat.short_description)?;
        }
        w.write_event(Event::End(BytesEnd::new("marketing_descs")))?;
    }

    text_el_skip_empty(w, "manufacturer", &boat.manufacturer)?;
    text_el_skip_empty(w, "model", &boat.model)?;

    w.write_event(Event::End(BytesEnd::new("advert_features")))?;
    Ok(())
}

fn write_boat_features(w: &mut Xml, boat: &BoatRecord) -> Result<(), SyncError> {
    w.write_event(Event::Start(BytesStart::new("boat_features")))?;

    for cat_def in CATALOG {
        match cat_def.category {
            Category::Engine => write_engine_category(w, boat, cat_def)?,
            Category::Additional => write_additional_category(w, boat, cat_def)?,
            _ => write_plain_category(w, boat, cat_def)?,
        }
    }

    w.write_event(Event::End(BytesEnd::new("boat_features")))?;
    Ok(())
}

fn write_plain_category(
    w: &mut Xml,
    boat: &BoatRecord,
    cat_def: &CategoryDef,
) -> Result<(), SyncError> {
    let Some(fields) = boat.features.get(&cat_def.category) else {
        return Ok(());
    };
    if !category_has_content(cat_def, fields) {
        return Ok(());
    }

    w.write_event(Event::Start(BytesStart::new(cat_def.name)))?;
    for field_def in cat_def.fields {
        write_catalog_item(w, field_def, fields)?;
    }
    w.write_event(Event::End(BytesEnd::new(cat_def.name)))?;
    Ok(())
}

fn write_engine_category(
    w: &mut Xml,
    boat: &BoatRecord,
    cat_def: &CategoryDef,
) -> Result<(), SyncError> {
    let empty = Default::default();
    let fields = boat.features.get(&cat_def.category).unwrap_or(&empty);
    if !category_has_content(cat_def, fields) && boat.other_engines.is_empty() {
        return Ok(());
    }

    w.write_event(Event::Start(BytesStart::new(cat_def.name)))?;
    for field_def in cat_def.fields {
        write_catalog_item(w, field_def, fields)?;
    }

    if !boat.other_engines.is_empty() {
        w.write_event(Event::Start(BytesStart::new("other_engines")))?;
        for engine in &boat.other_engines {
            w.write_event(Event::Start(BytesStart::new("engine")))?;
            for field_def in cat_def.fields {
                write_catalog_item(w, field_def, engine)?;
            }
            w.write_event(Event::End(BytesEnd::new("engine")))?;
        }
        w.write_event(Event::End(BytesEnd::new("other_engines")))?;
    }

    w.write_event(Event::End(BytesEnd::new(cat_def.name)))?;
    Ok(())
}

/// The additional block carries the synthesized loa_m alongside its stored
/// fields.
fn write_additional_category(
    w: &mut Xml,
    boat: &BoatRecord,
    cat_def: &CategoryDef,
) -> Result<(), SyncError> {
    let loa_m = synthesize_loa_m(boat);
    let empty = Default::default();
    let fields = boat.features.get(&cat_def.category).unwrap_or(&empty);
    if loa_m.is_none() && !category_has_content(cat_def, fields) {
        return Ok(());
    }

    w.write_event(Event::Start(BytesStart::new(cat_def.name)))?;
    for field_def in cat_def.fields {
        if field_def.name == "loa_m" {
            if let Some(metres) = &loa_m {
                write_item(w, "loa_m", metres, Some("metres"), &[])?;
                continue;
            }
        }
        write_catalog_item(w, field_def, fields)?;
    }
    w.write_event(Event::End(BytesEnd::new(cat_def.name)))?;
    Ok(())
}

/// loa in metres, derived from dimensions.loa after comma->dot cleanup.
/// Only emitted when the result is positive.
fn synthesize_loa_m(boat: &BoatRecord) -> Option<String> {
    let loa = boat.field(Category::Dimensions, "loa")?;
    let value = parse_decimal(&loa.value)?;
    let unit = loa
        .unit
        .as_deref()
        .unwrap_or("")
        .trim()
        .to_lowercase();
    let metres = length_to_metres(value, &unit);
    if metres > 0.0 {
        Some(format_number(metres))
    } else {
        None
    }
}

fn write_catalog_item(
    w: &mut Xml,
    field_def: &FieldDef,
    fields: &std::collections::BTreeMap<String, FieldValue>,
) -> Result<(), SyncError> {
    let value = fields.get(field_def.name);
    let value_text = value.map(|v| v.value.as_str()).unwrap_or("");

    // Companion attributes (rig/sails material, furling).
    let mut extra: Vec<(&str, &str)> = Vec::new();
    for attr in field_def.attrs {
        if let Some(companion) = fields.get(&format!("{}_{attr}", field_def.name)) {
            if !companion.value.is_empty() {
                extra.push((*attr, companion.value.as_str()));
            }
        }
    }

    let emit_value = value.map(|v| v.is_emittable()).unwrap_or(false);
    if !emit_value && extra.is_empty() {
        return Ok(());
    }

    let unit = value
        .and_then(|v| v.unit.as_deref())
        .filter(|u| !u.is_empty())
        .filter(|_| field_def.unit_field.is_some());

    write_item(
        w,
        field_def.name,
        if emit_value { value_text } else { "" },
        unit,
        &extra,
    )
}

fn write_item(
    w: &mut Xml,
    name: &str,
    value: &str,
    unit: Option<&str>,
    extra: &[(&str, &str)],
) -> Result<(), SyncError> {
    let mut el = BytesStart::new("item");
    el.push_attribute(("name", name));
    if let Some(unit) = unit {
        el.push_attribute(("unit", unit));
    }
    for (attr, attr_value) in extra {
        el.push_attribute((*attr, *attr_value));
    }

    if value.is_empty() {
        w.write_event(Event::Empty(el))?;
    } else {
        w.write_event(Event::Start(el))?;
        w.write_event(Event::Text(BytesText::new(value)))?;
        w.write_event(Event::End(BytesEnd::new("item")))?;
    }
    Ok(())
}

/// True when at least one catalog field (or companion attribute) of the
/// category would emit. Empty categories produce no element at all.
fn category_has_content(
    cat_def: &CategoryDef,
    fields: &std::collections::BTreeMap<String, FieldValue>,
) -> bool {
    cat_def.fields.iter().any(|f| {
        fields.get(f.name).map(|v| v.is_emittable()).unwrap_or(false)
            || f.attrs.iter().any(|attr| {
                fields
                    .get(&format!("{}_{attr}", f.name))
                    .map(|v| !v.value.is_empty())
                    .unwrap_or(false)
            })
    })
}

fn text_el(w: &mut Xml, name: &str, text: &str) -> Result<(), SyncError> {
    if text.is_empty() {
        w.write_event(Event::Empty(BytesStart::new(name)))?;
    } else {
        w.write_event(Event::Start(BytesStart::new(name)))?;
        w.write_event(Event::Text(BytesText::new(text)))?;
        w.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(())
}

fn text_el_skip_empty(w: &mut Xml, name: &str, text: &str) -> Result<(), SyncError> {
    if text.is_empty() {
        return Ok(());
    }
    text_el(w, name, text)
}

fn cdata_el(w: &mut Xml, name: &str, text: &str) -> Result<(), SyncError> {
    let mut el = BytesStart::new(name);
    el.push_attribute(("language", "en"));
    w.write_event(Event::Start(el))?;
    w.write_event(Event::CData(BytesCData::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Trim a float to at most 2 decimal places without trailing zeros
/// ("10.67", "10.5", "11").
pub fn format_number(value: f64) -> String {
    let s = format!("{value:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::boat::{MediaItem, PriceInfo, VatType};
    use crate::domain::status::BoatStatus;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn sample_boat() -> BoatRecord {
        let mut boat = BoatRecord {
            id: 1,
            reference: "OM-1001".into(),
            title: "Hallberg-Rassy 342".into(),
            description: "Lovely & well kept <cruiser>.".into(),
            short_description: "Well kept.".into(),
            status: BoatStatus::Active,
            manufacturer: "Hallberg-Rassy".into(),
            model: "342".into(),
            boat_type: "Sail".into(),
            boat_category: "Cruiser".into(),
            new_or_used: "used".into(),
            vessel_lying: "Hamble".into(),
            vessel_lying_country: "GB".into(),
            price: PriceInfo {
                amount: Some(125000.0),
                poa: false,
                currency: "GBP".into(),
                vat_included: Some(true),
                vat_type: VatType::TaxPaid,
                vat_country: "GB".into(),
            },
            features: BTreeMap::new(),
            other_engines: Vec::new(),
            media: vec![MediaItem {
                url: "https://cdn.example.com/1001/cover.jpg".into(),
                mime_type: "image/jpeg".into(),
                is_primary: true,
                caption: "Cover".into(),
                file_mtime: "2026-01-02T03:04:05".into(),
            }],
            videos: vec!["https://cdn.example.com/1001/tour.mp4".into()],
            taxonomies: BTreeMap::new(),
            last_modified: NaiveDate::from_ymd_opt(2026, 8, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        };
        boat.set_field(Category::Dimensions, "loa", FieldValue::with_unit("35", "ft"));
        boat.set_field(Category::Dimensions, "beam", FieldValue::with_unit("3.42", "m"));
        boat.set_field(Category::Engine, "make", FieldValue::text("Volvo Penta"));
        boat.set_field(Category::Engine, "hours", FieldValue::text("0"));
        boat.set_field(Category::RigSails, "genoa_material", FieldValue::text("dacron"));
        boat.set_field(Category::RigSails, "genoa_furling", FieldValue::text("yes"));
        boat
    }

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

    fn render(boats: &[BoatRecord]) -> String {
        let (bytes, warnings) = serialize(boats, &ctx()).unwrap();
        assert!(warnings.is_empty(), "{warnings:?}");
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn document_shape() {
        let xml = render(&[sample_boat()]);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<open_marine version=\"1.7\" language=\"en\" origin=\"Harbour Yachts\""));
        assert!(xml.contains("<broker code=\"BRK01\">"));
        assert!(xml.contains("<advert ref=\"OM-1001\" status=\"Available\""));
    }

    #[test]
    fn status_maps_to_available() {
        let mut boat = sample_boat();
        boat.status = BoatStatus::UnderOffer;
        let xml = render(&[boat]);
        assert!(xml.contains("status=\"UnderOffer\""));
    }

    #[test]
    fn price_attributes_always_emit() {
        let mut boat = sample_boat();
        boat.price = PriceInfo {
            amount: None,
            poa: true,
            currency: "EUR".into(),
            vat_included: None,
            vat_type: VatType::Unset,
            vat_country: String::new(),
        };
        let xml = render(&[boat]);
        assert!(xml.contains(
            "<asking_price poa=\"true\" currency=\"EUR\" vat_included=\"\" vat_type=\"\" vat_country=\"\"/>"
        ));
    }

    #[test]
    fn empty_fields_are_omitted_but_zero_is_kept() {
        let mut boat = sample_boat();
        boat.set_field(Category::Dimensions, "draft", FieldValue::text(""));
        let xml = render(&[boat]);
        assert!(!xml.contains("name=\"draft\""));
        assert!(xml.contains("<item name=\"hours\">0</item>"));
    }

    #[test]
    fn loa_m_is_synthesized_from_feet() {
        let xml = render(&[sample_boat()]);
        assert!(xml.contains("<item name=\"loa_m\" unit=\"metres\">10.67</item>"));
    }

    #[test]
    fn loa_m_handles_comma_decimals() {
        let mut boat = sample_boat();
        boat.set_field(Category::Dimensions, "loa", FieldValue::with_unit("10,5", "m"));
        let xml = render(&[boat]);
        assert!(xml.contains("<item name=\"loa_m\" unit=\"metres\">10.5</item>"));
    }

    #[test]
    fn non_numeric_loa_emits_no_loa_m() {
        let mut boat = sample_boat();
        boat.set_field(Category::Dimensions, "loa", FieldValue::with_unit("tba", "ft"));
        let xml = render(&[boat]);
        assert!(!xml.contains("loa_m"));
    }

    #[test]
    fn genoa_carries_material_and_furling_attributes() {
        let xml = render(&[sample_boat()]);
        assert!(xml.contains("<item name=\"genoa\" material=\"dacron\" furling=\"yes\"/>"));
        // Companions never appear as items of their own.
        assert!(!xml.contains("name=\"genoa_material\""));
    }

    #[test]
    fn descriptions_are_cdata() {
        let xml = render(&[sample_boat()]);
        assert!(xml.contains("<![CDATA[Lovely & well kept <cruiser>.]]>"));
    }

    #[test]
    fn boat_without_reference_is_skipped_not_fatal() {
        let mut bad = sample_boat();
        bad.reference = String::new();
        let good = sample_boat();
        let (bytes, warnings) = serialize(&[bad, good], &ctx()).unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(xml.matches("<advert ").count(), 1);
    }

    #[test]
    fn idempotent_for_fixed_timestamps() {
        let boats = [sample_boat()];
        let first = render(&boats);
        let second = render(&boats);
        assert_eq!(first, second);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(10.668), "10.67");
        assert_eq!(format_number(10.5), "10.5");
        assert_eq!(format_number(11.0), "11");
    }
}
