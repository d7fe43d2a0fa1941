// src/import/record.rs

use crate::domain::boat::{FieldMap, VatType};
use crate::domain::catalog::Category;
use serde::Serialize;
use std::collections::BTreeMap;

/// Tri-state VAT flag as it appears on the wire: "true", "false" or "".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VatFlag {
    Included,
    Excluded,
    Unspecified,
}

impl VatFlag {
    pub fn as_option(self) -> Option<bool> {
        match self {
            VatFlag::Included => Some(true),
            VatFlag::Excluded => Some(false),
            VatFlag::Unspecified => None,
        }
    }
}

/// Price fields present in the feed. Absent members leave the stored value
/// untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricePatch {
    pub amount: Option<f64>,
    pub poa: Option<bool>,
    pub currency: Option<String>,
    pub vat_included: Option<VatFlag>,
    pub vat_type: Option<VatType>,
    pub vat_country: Option<String>,
}

impl PricePatch {
    pub fn is_empty(&self) -> bool {
        *self == PricePatch::default()
    }
}

/// One parsed feed entry, expressed as a patch: every member is optional,
/// and absence means "leave the stored field alone". This is what makes
/// repeated imports idempotent partial updates rather than replacements.
#[derive(Debug, Clone, Default)]
pub struct ImportRecord {
    /// 1-based position in the source file, for warnings.
    pub source_row: usize,

    pub reference: Option<String>,
    pub status: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,

    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub boat_type: Option<String>,
    pub boat_category: Option<String>,
    pub new_or_used: Option<String>,
    pub designer: Option<String>,
    pub vessel_lying: Option<String>,
    pub vessel_lying_country: Option<String>,

    pub price: PricePatch,

    /// Only categories/fields actually present in the feed.
    pub features: BTreeMap<Category, FieldMap>,
    pub other_engines: Vec<FieldMap>,

    pub featured_image: Option<String>,
    pub media_urls: Vec<String>,
    pub video_urls: Vec<String>,
}

impl ImportRecord {
    pub fn set_feature(&mut self, category: Category, name: &str, value: crate::domain::boat::FieldValue) {
        self.features
            .entry(category)
            .or_default()
            .insert(name.to_string(), value);
    }

    /// True when the entry carries nothing worth writing. Such rows are
    /// skipped with a warning instead of creating empty boats.
    pub fn is_blank(&self) -> bool {
        self.reference.is_none()
            && self.title.is_none()
            && self.features.is_empty()
            && self.price.is_empty()
            && self.media_urls.is_empty()
            && self.featured_image.is_none()
    }
}
