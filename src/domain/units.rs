// src/domain/units.rs
//
// Pure normalization helpers for the values brokers actually send us:
// currency symbols/names instead of ISO codes, and lengths in feet.

/// Map a currency symbol or common name to its ISO-4217 code.
///
/// Unknown input is passed through unchanged; the import path decides
/// whether to warn about it. Rejecting here would break reimports of feeds
/// that already carry odd values.
pub fn currency_code_for(symbol_or_name: &str) -> String {
    let trimmed = symbol_or_name.trim();
    let code = match trimmed {
        "£" => "GBP",
        "€" | "Euro" | "Euros" | "euros" => "EUR",
        "$" | "US$" => "USD",
        "¥" => "JPY",
        "₣" => "CHF",
        "₹" => "INR",
        "₽" => "RUB",
        "₩" => "KRW",
        "₺" => "TRY",
        "₪" => "ILS",
        "₫" => "VND",
        "₦" => "NGN",
        "A$" | "AU$" => "AUD",
        "C$" | "CA$" => "CAD",
        "NZ$" => "NZD",
        "R$" => "BRL",
        "₱" => "PHP",
        "฿" => "THB",
        "₴" => "UAH",
        "د.إ" => "AED",
        "₲" => "PYG",
        "kr" => "SEK",
        "zł" => "PLN",
        "Kč" => "CZK",
        other => other,
    };
    code.to_string()
}

/// True when a value is plausibly an ISO-4217 code already.
pub fn looks_like_iso_currency(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
}

const FEET_UNITS: &[&str] = &["ft", "ft.", "feet", "foot", "'"];
const FEET_TO_METRES: f64 = 0.3048;

/// Convert a length to metres, rounded to 2 decimal places.
///
/// Only feet are converted; any other unit (metres included) passes through
/// and is just rounded.
pub fn length_to_metres(value: f64, unit: &str) -> f64 {
    let metres = if FEET_UNITS.contains(&unit.trim().to_lowercase().as_str()) {
        value * FEET_TO_METRES
    } else {
        value
    };
    round2(metres)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Brokers write decimals with commas often enough that we normalize before
/// parsing ("10,67" -> 10.67).
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', ".");
    cleaned.parse::<f64>().ok()
}
