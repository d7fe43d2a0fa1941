// src/import/xml.rs
//
// Feed XML -> ImportRecords. The document is read into a small element tree
// first; the catalog-driven walk then inverts the export shape. A document
// that doesn't parse is a hard abort; a single bad advert is a warning.

use crate::domain::boat::{FieldValue, VatType};
use crate::domain::catalog::{Category, CATALOG};
use crate::domain::units::{currency_code_for, looks_like_iso_currency, parse_decimal};
use crate::errors::{SyncError, SyncWarning};
use crate::import::record::{ImportRecord, VatFlag};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct XmlNode {
    pub name: String,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Depth-first search for the first descendant with this name.
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

/// Parse raw feed bytes into an element tree. Empty bodies and non-XML
/// prefixes fail here, before any per-advert work happens.
pub fn parse_tree(raw: &[u8]) -> Result<XmlNode, SyncError> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| SyncError::XmlParse(format!("Feed is not valid UTF-8: {e}")))?;
    let trimmed = text.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Err(SyncError::XmlParse("Feed body is empty".into()));
    }
    if !trimmed.starts_with('<') {
        return Err(SyncError::XmlParse(
            "Feed does not start with an XML tag".into(),
        ));
    }

    let mut reader = Reader::from_str(trimmed);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = vec![XmlNode::default()];
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let mut node = XmlNode {
                    name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    ..Default::default()
                };
                for attr in e.attributes() {
                    let attr = attr
                        .map_err(|e| SyncError::XmlParse(format!("Bad attribute: {e}")))?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .unescape_value()
                        .map_err(|e| SyncError::XmlParse(format!("Bad attribute value: {e}")))?
                        .into_owned();
                    node.attrs.insert(key, value);
                }
                stack.push(node);
            }
            Ok(Event::Empty(e)) => {
                let mut node = XmlNode {
                    name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    ..Default::default()
                };
                for attr in e.attributes() {
                    let attr = attr
                        .map_err(|e| SyncError::XmlParse(format!("Bad attribute: {e}")))?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .unescape_value()
                        .map_err(|e| SyncError::XmlParse(format!("Bad attribute value: {e}")))?
                        .into_owned();
                    node.attrs.insert(key, value);
                }
                let parent = stack.last_mut().expect("stack never empty");
                parent.children.push(node);
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| SyncError::XmlParse(format!("Bad text node: {e}")))?;
                stack
                    .last_mut()
                    .expect("stack never empty")
                    .text
                    .push_str(&text);
            }
            Ok(Event::CData(t)) => {
                let bytes = t.into_inner();
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| SyncError::XmlParse(format!("Bad CDATA: {e}")))?;
                stack
                    .last_mut()
                    .expect("stack never empty")
                    .text
                    .push_str(text);
            }
            Ok(Event::End(_)) => {
                let node = stack.pop().expect("stack never empty");
                let parent = stack
                    .last_mut()
                    .ok_or_else(|| SyncError::XmlParse("Unbalanced end tag".into()))?;
                parent.children.push(node);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {} // decl, comments, PIs
            Err(e) => return Err(SyncError::XmlParse(format!("Malformed XML: {e}"))),
        }
    }

    let mut root = stack.pop().ok_or_else(|| SyncError::XmlParse("No root".into()))?;
    if !stack.is_empty() {
        return Err(SyncError::XmlParse("Unclosed tags at end of feed".into()));
    }
    if root.children.is_empty() {
        return Err(SyncError::XmlParse("Feed has no root element".into()));
    }
    Ok(root.children.remove(0))
}

/// Parse a feed document into import records. Returns the records in
/// document order (later duplicates of a reference must win) plus per-advert
/// warnings.
pub fn parse_feed(raw: &[u8]) -> Result<(Vec<ImportRecord>, Vec<SyncWarning>), SyncError> {
    let root = parse_tree(raw)?;

    // adverts/advert, tolerating a single advert not wrapped in a list.
    let adverts: Vec<&XmlNode> = if let Some(list) = root.find("adverts") {
        list.children_named("advert").collect()
    } else if let Some(single) = root.find("advert") {
        vec![single]
    } else {
        return Err(SyncError::XmlParse(
            "Feed root contains no adverts/advert elements".into(),
        ));
    };

    let mut records = Vec::with_capacity(adverts.len());
    let mut warnings = Vec::new();
    for (i, advert) in adverts.iter().enumerate() {
        let row = i + 1;
        match parse_advert(advert, row, &mut warnings) {
            Ok(record) => records.push(record),
            Err(e) => warnings.push(SyncWarning::row(row, format!("advert skipped: {e}"))),
        }
    }
    Ok((records, warnings))
}

fn parse_advert(
    advert: &XmlNode,
    row: usize,
    warnings: &mut Vec<SyncWarning>,
) -> Result<ImportRecord, SyncError> {
    let mut record = ImportRecord {
        source_row: row,
        ..Default::default()
    };

    record.reference = advert.attr("ref").map(str::to_string).filter(|s| !s.is_empty());
    record.status = advert.attr("status").map(str::to_string).filter(|s| !s.is_empty());

    if let Some(features) = advert.child("advert_features") {
        record.title = child_text(features, "title");
        record.boat_type = child_text(features, "boat_type");
        record.boat_category = child_text(features, "boat_category");
        record.new_or_used = child_text(features, "new_or_used");
        record.manufacturer = child_text(features, "manufacturer");
        record.model = child_text(features, "model");

        if let Some(lying) = features.child("vessel_lying") {
            record.vessel_lying = Some(lying.text.clone());
            record.vessel_lying_country = lying.attr("country").map(str::to_string);
        }

        if let Some(price) = features.child("asking_price") {
            record.price.poa = price.attr("poa").map(|v| v == "true");
            record.price.currency = price.attr("currency").map(|raw| {
                let code = currency_code_for(raw);
                if !looks_like_iso_currency(&code) {
                    warnings.push(SyncWarning::row(
                        row,
                        format!("currency {code:?} is not an ISO-4217 code, keeping as-is"),
                    ));
                }
                code
            });
            record.price.vat_included = price.attr("vat_included").map(|v| match v {
                "true" => VatFlag::Included,
                "false" => VatFlag::Excluded,
                _ => VatFlag::Unspecified,
            });
            record.price.vat_type = price.attr("vat_type").map(VatType::parse);
            record.price.vat_country = price.attr("vat_country").map(str::to_string);

            let amount_text = price.text.trim();
            if !amount_text.is_empty() {
                match parse_decimal(amount_text) {
                    Some(v) => record.price.amount = Some(v),
                    None => warnings.push(SyncWarning::row(
                        row,
                        format!("unparseable asking_price {amount_text:?}"),
                    )),
                }
            }
        }

        if let Some(descs) = features.child("marketing_descs") {
            record.description = child_text(descs, "marketing_desc");
            record.short_description = child_text(descs, "marketing_short_desc");
        }
    }

    if let Some(media) = advert.child("advert_media") {
        for m in media.children_named("media") {
            let url = m.text.trim().to_string();
            if url.is_empty() {
                continue;
            }
            if m.attr("type") == Some("video/mp4") {
                record.video_urls.push(url);
            } else {
                if m.attr("primary") == Some("true") {
                    record.featured_image = Some(url.clone());
                }
                record.media_urls.push(url);
            }
        }
    }

    if let Some(boat_features) = advert.child("boat_features") {
        for cat_def in CATALOG {
            let Some(cat_node) = boat_features.child(cat_def.name) else {
                continue;
            };
            collect_items(cat_node, cat_def.category, &mut record);

            if cat_def.repeatable {
                if let Some(others) = cat_node.child("other_engines") {
                    for engine in others.children_named("engine") {
                        let mut map = BTreeMap::new();
                        for item in engine.children_named("item") {
                            if let Some((name, value)) = item_value(item) {
                                map.insert(name, value);
                            }
                        }
                        if !map.is_empty() {
                            record.other_engines.push(map);
                        }
                    }
                }
            }
        }
    }

    Ok(record)
}

/// Pull every <item name=".." unit=".."> of a category node into the record,
/// expanding extra attributes (material/furling) into companion fields.
fn collect_items(cat_node: &XmlNode, category: Category, record: &mut ImportRecord) {
    for item in cat_node.children_named("item") {
        let Some((name, value)) = item_value(item) else {
            continue;
        };
        for (attr, attr_value) in &item.attrs {
            if attr == "name" || attr == "unit" || attr_value.is_empty() {
                continue;
            }
            record.set_feature(
                category,
                &format!("{name}_{attr}"),
                FieldValue::text(attr_value.clone()),
            );
        }
        record.set_feature(category, &name, value);
    }
}

fn item_value(item: &XmlNode) -> Option<(String, FieldValue)> {
    let name = item.attr("name")?.to_string();
    if name.is_empty() {
        return None;
    }
    let value = FieldValue {
        value: item.text.trim().to_string(),
        unit: item.attr("unit").map(str::to_string).filter(|u| !u.is_empty()),
    };
    Some((name, value))
}

fn child_text(node: &XmlNode, name: &str) -> Option<String> {
    node.child(name).map(|c| c.text.clone()).filter(|t| !t.is_empty())
}
