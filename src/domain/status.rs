// src/domain/status.rs

use std::fmt;

/// Lifecycle status of a boat listing. Sold/Removed/Inactive is the
/// deletion-equivalent signal: imports never hard-delete, they flip status,
/// and export filtering does the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoatStatus {
    Active,
    UnderOffer,
    Sold,
    Removed,
    Inactive,
}

impl BoatStatus {
    /// Status attribute in the open_marine advert. Active maps to
    /// "Available", Under Offer loses its space, everything else passes
    /// through unchanged.
    pub fn to_wire(self) -> &'static str {
        match self {
            BoatStatus::Active => "Available",
            BoatStatus::UnderOffer => "UnderOffer",
            BoatStatus::Sold => "Sold",
            BoatStatus::Removed => "Removed",
            BoatStatus::Inactive => "Inactive",
        }
    }

    /// Accepts both our own wire form and the spellings brokers send.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Available" | "Active" | "active" | "available" => Some(BoatStatus::Active),
            "UnderOffer" | "Under Offer" | "under offer" => Some(BoatStatus::UnderOffer),
            "Sold" | "sold" => Some(BoatStatus::Sold),
            "Removed" | "removed" => Some(BoatStatus::Removed),
            "Inactive" | "inactive" => Some(BoatStatus::Inactive),
            _ => None,
        }
    }

    pub fn as_db_str(self) -> &'static str {
        match self {
            BoatStatus::Active => "Active",
            BoatStatus::UnderOffer => "Under Offer",
            BoatStatus::Sold => "Sold",
            BoatStatus::Removed => "Removed",
            BoatStatus::Inactive => "Inactive",
        }
    }

    pub fn from_db_str(raw: &str) -> Self {
        Self::from_wire(raw).unwrap_or(BoatStatus::Active)
    }

    /// Term slug in the boat-status taxonomy. Singular: assigning one
    /// removes the others.
    pub fn taxonomy_term(self) -> &'static str {
        match self {
            BoatStatus::Active => "available",
            BoatStatus::UnderOffer => "under-offer",
            BoatStatus::Sold => "sold",
            BoatStatus::Removed => "removed",
            BoatStatus::Inactive => "inactive",
        }
    }

    /// Export filter. Removed/Inactive never export; Sold only when the
    /// include-sold flag is set.
    pub fn exportable(self, include_sold: bool) -> bool {
        match self {
            BoatStatus::Active | BoatStatus::UnderOffer => true,
            BoatStatus::Sold => include_sold,
            BoatStatus::Removed | BoatStatus::Inactive => false,
        }
    }
}

impl fmt::Display for BoatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}
