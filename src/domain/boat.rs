// src/domain/boat.rs
//
// In-memory model of one boat listing: core advert fields, the per-category
// feature maps keyed by catalog field names, media, and taxonomy terms.

use crate::domain::catalog::Category;
use crate::domain::status::BoatStatus;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

/// One feature value plus its optional unit ("35" / "ft").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValue {
    pub value: String,
    pub unit: Option<String>,
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            unit: None,
        }
    }

    pub fn with_unit(value: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            unit: Some(unit.into()),
        }
    }

    /// Export omits empty values, but the literal "0" is real data
    /// (e.g. zero engine hours).
    pub fn is_emittable(&self) -> bool {
        !self.value.is_empty()
    }
}

pub type FieldMap = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VatType {
    TaxPaid,
    TaxNotPaid,
    #[default]
    Unset,
}

impl VatType {
    /// Only the two exact phrases survive to the wire; anything else is
    /// emitted as an empty string.
    pub fn to_wire(self) -> &'static str {
        match self {
            VatType::TaxPaid => "Tax Paid",
            VatType::TaxNotPaid => "Tax Not Paid",
            VatType::Unset => "",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Tax Paid" => VatType::TaxPaid,
            "Tax Not Paid" => VatType::TaxNotPaid,
            _ => VatType::Unset,
        }
    }
}

/// Normalize the free-text VAT flags brokers use into a tri-state.
/// Feeds write anything from "incl. VAT" to "inc VAT".
pub fn parse_vat_included(raw: &str) -> Option<bool> {
    match raw.trim() {
        "incl. VAT" | "inc. VAT" | "incl VAT" | "inc VAT" | "true" | "yes" => Some(true),
        "excl. VAT" | "exc. VAT" | "excl VAT" | "exc VAT" | "ex VAT" | "false" | "no" => {
            Some(false)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceInfo {
    pub amount: Option<f64>,
    /// Price on application. When set, `amount` is not meaningfully rendered.
    pub poa: bool,
    pub currency: String,
    pub vat_included: Option<bool>,
    pub vat_type: VatType,
    pub vat_country: String,
}

impl Default for PriceInfo {
    fn default() -> Self {
        Self {
            amount: None,
            poa: false,
            currency: "GBP".to_string(),
            vat_included: None,
            vat_type: VatType::Unset,
            vat_country: String::new(),
        }
    }
}

impl PriceInfo {
    /// Wire form of the amount: integers without a decimal point, otherwise
    /// two decimal places. Empty when absent or POA.
    pub fn amount_text(&self) -> String {
        match self.amount {
            Some(v) if !self.poa => {
                if (v - v.trunc()).abs() < f64::EPSILON {
                    format!("{}", v.trunc() as i64)
                } else {
                    format!("{v:.2}")
                }
            }
            _ => String::new(),
        }
    }

    pub fn vat_included_text(&self) -> &'static str {
        match self.vat_included {
            Some(true) => "true",
            Some(false) => "false",
            None => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub url: String,
    pub mime_type: String,
    pub is_primary: bool,
    pub caption: String,
    pub file_mtime: String,
}

/// Taxonomy names used by the store. Manufacturer and designer are
/// multi-value; the rest are singular (assignment replaces).
pub mod taxonomy {
    pub const MANUFACTURER: &str = "manufacturer";
    pub const DESIGNER: &str = "designer";
    pub const BOAT_STATUS: &str = "boat-status";
    pub const BOAT_CATEGORY: &str = "boat-category";
    pub const BOAT_TYPE: &str = "boat-type";
    pub const CONDITION: &str = "condition";
}

#[derive(Debug, Clone)]
pub struct BoatRecord {
    pub id: i64,
    pub reference: String,
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub status: BoatStatus,

    pub manufacturer: String,
    pub model: String,
    pub boat_type: String,
    pub boat_category: String,
    pub new_or_used: String,
    pub vessel_lying: String,
    pub vessel_lying_country: String,

    pub price: PriceInfo,

    /// Catalog-keyed feature maps. The engine entry is the main engine;
    /// additional engines live in `other_engines`.
    pub features: BTreeMap<Category, FieldMap>,
    pub other_engines: Vec<FieldMap>,

    pub media: Vec<MediaItem>,
    pub videos: Vec<String>,
    pub taxonomies: BTreeMap<String, Vec<String>>,

    pub last_modified: NaiveDateTime,
}

impl BoatRecord {
    pub fn field(&self, category: Category, name: &str) -> Option<&FieldValue> {
        self.features.get(&category).and_then(|m| m.get(name))
    }

    pub fn set_field(&mut self, category: Category, name: &str, value: FieldValue) {
        self.features
            .entry(category)
            .or_default()
            .insert(name.to_string(), value);
    }

}
