//! # Field Normalization Module
//!
//! Stateless cleaning and standardization for the loosely-typed values found
//! in scraped product records: free text, numbers, booleans, lists, URLs,
//! categories, prices, and weight/volume measurements.
//!
//! ## Features
//!
//! - Null-token aware text normalization (`"N/A"`, `"none"`, `"-"` → null)
//! - Numeric extraction with currency and thousands-separator stripping
//! - Unit standardization ("500 millilitres" → "500ml", "4 x 330 ml" → "4x330ml")
//! - Weight conversion to grams and volume conversion to milliliters
//! - Category synonym mapping and packaging-type detection

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::name_cleaner::standardize_casing;
use crate::record::value_to_text;

/// Literal tokens treated as null wherever they appear as a field value
const NULL_TOKENS: &[&str] = &["null", "none", "n/a", "na", "-", ""];

/// Long-form unit spellings and their short forms, applied in listed order
const UNIT_MAPPINGS: &[(&str, &str)] = &[
    // Volume
    ("millilitre", "ml"),
    ("millilitres", "ml"),
    ("milliliter", "ml"),
    ("milliliters", "ml"),
    ("litre", "l"),
    ("litres", "l"),
    ("liter", "l"),
    ("liters", "l"),
    // Weight
    ("gram", "g"),
    ("grams", "g"),
    ("kilogram", "kg"),
    ("kilograms", "kg"),
    ("kilo", "kg"),
    ("kilos", "kg"),
    // Fluid ounces
    ("fl oz", "fl oz"),
    ("fluid ounce", "fl oz"),
    ("fluid ounces", "fl oz"),
    // Ounces
    ("ounce", "oz"),
    ("ounces", "oz"),
    // Centiliters
    ("centilitre", "cl"),
    ("centilitres", "cl"),
    ("centiliter", "cl"),
    ("centiliters", "cl"),
];

/// Packaging synonyms and their canonical names; first match in table order wins
const PACKAGING_TYPES: &[(&str, &str)] = &[
    ("can", "Can"),
    ("cans", "Can"),
    ("bottle", "Bottle"),
    ("bottles", "Bottle"),
    ("btl", "Bottle"),
    ("bar", "Bar"),
    ("bars", "Bar"),
    ("bag", "Bag"),
    ("bags", "Bag"),
    ("pack", "Pack"),
    ("packs", "Pack"),
    ("box", "Box"),
    ("boxes", "Box"),
    ("pouch", "Pouch"),
    ("carton", "Carton"),
    ("tub", "Tub"),
    ("jar", "Jar"),
    ("sachet", "Sachet"),
    ("tin", "Tin"),
];

/// Standard category names and the synonyms that map to them
const CATEGORY_MAPPINGS: &[(&str, &[&str])] = &[
    ("Beverages", &["beverage", "beverages", "drinks", "drink", "soft drinks"]),
    ("Dairy", &["dairy", "dairy products"]),
    ("Snacks", &["snacks", "snack", "snack food", "crisps"]),
    ("Bakery", &["bakery", "baked goods", "bread"]),
    ("Canned Goods", &["canned", "canned goods", "canned food", "tinned"]),
    ("Frozen Foods", &["frozen", "frozen food", "frozen foods"]),
    ("Meat & Seafood", &["meat", "seafood", "fish", "poultry"]),
    ("Produce", &["produce", "fruits", "vegetables", "fresh"]),
    ("Condiments", &["condiments", "sauces", "dressings"]),
    ("Cereals", &["cereal", "cereals", "breakfast"]),
    ("Pantry", &["pantry", "dry goods"]),
    ("Confectionery", &["sweets", "candy", "chocolate", "confectionery"]),
    ("Coffee & Tea", &["coffee", "tea", "hot beverages"]),
];

lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    static ref NUMBER_RE: Regex = Regex::new(r"(\d+\.?\d*)").unwrap();
    static ref SHORT_UNIT_RE: Regex =
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(ml|g|kg|l|oz|cl|fl\s*oz)\b").unwrap();
    static ref MULTIPACK_UNIT_RE: Regex =
        Regex::new(r"(?i)(\d+)\s*[xX×]\s*(\d+(?:\.\d+)?)\s*(ml|g|kg|l|cl|oz)\b").unwrap();
    static ref VOLUME_RE: Regex =
        Regex::new(r"(?i)(\d+(?:\.\d+)?)(ml|l|cl|fl\s*oz)\b").unwrap();
    static ref WEIGHT_RE: Regex = Regex::new(r"(?i)(\d+(?:\.\d+)?)(g|kg|oz)\b").unwrap();
    static ref WEIGHT_VALUE_RE: Regex =
        Regex::new(r"(\d+\.?\d*)\s*(g|kg|oz|lb|mg)?").unwrap();
    static ref VOLUME_VALUE_RE: Regex =
        Regex::new(r"(\d+\.?\d*)\s*(ml|l|cl|fl\s*oz|gal)?").unwrap();
    static ref LONG_UNIT_RES: Vec<(Regex, &'static str)> = UNIT_MAPPINGS
        .iter()
        .map(|(long, short)| {
            let pattern = format!(r"(?i)(\d+(?:\.\d+)?)\s*{}\b", regex::escape(long));
            (Regex::new(&pattern).unwrap(), *short)
        })
        .collect();
    static ref PACKAGING_RES: Vec<(Regex, &'static str)> = PACKAGING_TYPES
        .iter()
        .map(|(variant, standard)| {
            let pattern = format!(r"\b{}\b", regex::escape(variant));
            (Regex::new(&pattern).unwrap(), *standard)
        })
        .collect();
}

/// Whether a lowercased token is one of the recognized null markers
fn is_null_token(text: &str) -> bool {
    NULL_TOKENS.contains(&text)
}

/// Normalize a text field: stringify, collapse whitespace, trim; null tokens
/// and empty strings become None.
pub fn normalize_text(value: &Value) -> Option<String> {
    let text = value_to_text(value)?;
    let text = WHITESPACE_RE.replace_all(text.trim(), " ").to_string();
    if is_null_token(&text.to_lowercase()) {
        return None;
    }
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Normalize a numeric field: pass numbers through, otherwise strip currency
/// symbols and thousands separators and extract the first number.
pub fn normalize_number(value: &Value) -> Option<f64> {
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    let text = value_to_text(value)?.trim().to_lowercase();
    if is_null_token(&text) {
        return None;
    }
    let text = text.replace('£', "").replace('$', "").replace(',', "");
    let captures = NUMBER_RE.captures(&text)?;
    captures[1].parse::<f64>().ok()
}

/// Normalize a boolean field: yes/no tokens to bool, anything else to None
pub fn normalize_boolean(value: &Value) -> Option<bool> {
    if let Some(b) = value.as_bool() {
        return Some(b);
    }
    let text = value_to_text(value)?.trim().to_lowercase();
    match text.as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Normalize a list field: clean each element of a sequence, or split a
/// string on commas/semicolons. Empty results become None.
pub fn normalize_list(value: &Value) -> Option<Vec<String>> {
    let cleaned: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(normalize_text).collect(),
        _ => {
            let text = normalize_text(value)?;
            text.split([',', ';'])
                .filter_map(|item| normalize_text(&Value::String(item.to_string())))
                .collect()
        }
    };
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Normalize a URL field, assuming https when no scheme is present
pub fn normalize_url(value: &Value) -> Option<String> {
    let url = normalize_text(value)?;
    if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//") {
        Some(url)
    } else {
        Some(format!("https://{}", url))
    }
}

/// Normalize a category name onto the standard category list; unmapped values
/// are returned title-cased.
pub fn normalize_category(value: &Value) -> Option<String> {
    let category = normalize_text(value)?;
    let category_lower = category.to_lowercase();

    for (standard, variations) in CATEGORY_MAPPINGS {
        if variations.contains(&category_lower.as_str()) {
            return Some((*standard).to_string());
        }
    }

    Some(standardize_casing(&category))
}

/// Normalize a price value: strip currency, convert to float
pub fn normalize_price(value: &Value) -> Option<f64> {
    if let Some(text) = value_to_text(value) {
        if matches!(text.to_uppercase().as_str(), "N/A" | "NA" | "NONE" | "NULL") {
            return None;
        }
    }
    normalize_number(value)
}

/// Normalize a weight value to grams. Unitless numbers are taken as grams.
pub fn normalize_weight(value: &Value) -> Option<f64> {
    let text = value_to_text(value)?.trim().to_lowercase();
    if is_null_token(&text) {
        return None;
    }
    let captures = WEIGHT_VALUE_RE.captures(&text)?;
    let number: f64 = captures[1].parse().ok()?;
    let unit = captures.get(2).map(|m| m.as_str()).unwrap_or("g");
    let factor = match unit {
        "g" => 1.0,
        "kg" => 1000.0,
        "mg" => 0.001,
        "oz" => 28.3495,
        "lb" => 453.592,
        _ => 1.0,
    };
    Some(number * factor)
}

/// Normalize a volume value to milliliters. Unitless numbers are taken as ml.
pub fn normalize_volume(value: &Value) -> Option<f64> {
    let text = value_to_text(value)?.trim().to_lowercase();
    if is_null_token(&text) {
        return None;
    }
    let captures = VOLUME_VALUE_RE.captures(&text)?;
    let number: f64 = captures[1].parse().ok()?;
    let unit = captures
        .get(2)
        .map(|m| m.as_str().replace(' ', ""))
        .unwrap_or_else(|| "ml".to_string());
    let factor = match unit.as_str() {
        "ml" => 1.0,
        "l" => 1000.0,
        "cl" => 10.0,
        "floz" => 29.5735,
        "gal" => 3785.41,
        _ => 1.0,
    };
    Some(number * factor)
}

/// Standardize all unit measurements in a piece of text: long-form unit words
/// to short form, spacing squeezed out of `<number> <unit>` tokens, and
/// multipack tokens rewritten as `<count>x<size><unit>`.
pub fn standardize_units(text: &str) -> String {
    let mut result = text.to_string();

    for (re, short) in LONG_UNIT_RES.iter() {
        result = re
            .replace_all(&result, |caps: &regex::Captures| {
                format!("{}{}", &caps[1], short)
            })
            .to_string();
    }

    result = SHORT_UNIT_RE
        .replace_all(&result, |caps: &regex::Captures| {
            format!("{}{}", &caps[1], caps[2].to_lowercase().replace(' ', ""))
        })
        .to_string();

    result = MULTIPACK_UNIT_RE
        .replace_all(&result, |caps: &regex::Captures| {
            format!("{}x{}{}", &caps[1], &caps[2], caps[3].to_lowercase())
        })
        .to_string();

    result
}

/// Whether a measurement is a volume or a weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureKind {
    Volume,
    Weight,
}

/// A measurement found in free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeWeight {
    pub value: f64,
    pub unit: String,
    pub kind: MeasureKind,
}

impl VolumeWeight {
    /// Compact rendering such as `"330ml"` or `"14.2g"`
    pub fn label(&self) -> String {
        format!("{}{}", format_quantity(self.value), self.unit)
    }
}

/// Extract the first volume or weight measurement from text. Volume units are
/// tried before weight units; units are standardized first.
pub fn extract_volume_weight(text: &str) -> Option<VolumeWeight> {
    if text.trim().is_empty() {
        return None;
    }
    let standardized = standardize_units(text);

    if let Some(caps) = VOLUME_RE.captures(&standardized) {
        return Some(VolumeWeight {
            value: caps[1].parse().ok()?,
            unit: caps[2].to_lowercase().replace(' ', ""),
            kind: MeasureKind::Volume,
        });
    }

    if let Some(caps) = WEIGHT_RE.captures(&standardized) {
        return Some(VolumeWeight {
            value: caps[1].parse().ok()?,
            unit: caps[2].to_lowercase(),
            kind: MeasureKind::Weight,
        });
    }

    None
}

/// Detect the packaging type mentioned in text, if any
pub fn detect_packaging_type(text: &str) -> Option<&'static str> {
    if text.trim().is_empty() {
        return None;
    }
    let text_lower = text.to_lowercase();
    for (re, standard) in PACKAGING_RES.iter() {
        if re.is_match(&text_lower) {
            return Some(standard);
        }
    }
    None
}

/// Render a quantity without a trailing `.0` ("330", "14.2")
pub fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_text_collapses_whitespace() {
        assert_eq!(
            normalize_text(&json!("  Red   Bull\t Energy ")),
            Some("Red Bull Energy".to_string())
        );
    }

    #[test]
    fn test_normalize_text_null_tokens() {
        for token in ["null", "NONE", "n/a", "NA", "-", "", "  "] {
            assert_eq!(normalize_text(&json!(token)), None, "token: {:?}", token);
        }
    }

    #[test]
    fn test_normalize_number_from_strings() {
        assert_eq!(normalize_number(&json!("£1.29")), Some(1.29));
        assert_eq!(normalize_number(&json!("$2,500")), Some(2500.0));
        assert_eq!(normalize_number(&json!("about 12 units")), Some(12.0));
        assert_eq!(normalize_number(&json!("no digits")), None);
        assert_eq!(normalize_number(&json!(3)), Some(3.0));
        assert_eq!(normalize_number(&json!("N/A")), None);
    }

    #[test]
    fn test_normalize_boolean() {
        assert_eq!(normalize_boolean(&json!("Yes")), Some(true));
        assert_eq!(normalize_boolean(&json!("off")), Some(false));
        assert_eq!(normalize_boolean(&json!("1")), Some(true));
        assert_eq!(normalize_boolean(&json!(true)), Some(true));
        assert_eq!(normalize_boolean(&json!("maybe")), None);
        assert_eq!(normalize_boolean(&json!("n/a")), None);
    }

    #[test]
    fn test_normalize_list_from_string() {
        assert_eq!(
            normalize_list(&json!("milk, sugar; cocoa")),
            Some(vec!["milk".to_string(), "sugar".to_string(), "cocoa".to_string()])
        );
    }

    #[test]
    fn test_normalize_list_drops_null_items() {
        assert_eq!(
            normalize_list(&json!(["milk", "n/a", "  ", "sugar"])),
            Some(vec!["milk".to_string(), "sugar".to_string()])
        );
        assert_eq!(normalize_list(&json!(["n/a", ""])), None);
    }

    #[test]
    fn test_normalize_url_adds_scheme() {
        assert_eq!(
            normalize_url(&json!("example.com/p/1")),
            Some("https://example.com/p/1".to_string())
        );
        assert_eq!(
            normalize_url(&json!("http://example.com")),
            Some("http://example.com".to_string())
        );
    }

    #[test]
    fn test_normalize_category_synonyms() {
        assert_eq!(normalize_category(&json!("soft drinks")), Some("Beverages".to_string()));
        assert_eq!(normalize_category(&json!("Crisps")), Some("Snacks".to_string()));
        assert_eq!(normalize_category(&json!("tinned")), Some("Canned Goods".to_string()));
        // Unmapped values come back title-cased
        assert_eq!(normalize_category(&json!("pet FOOD")), Some("Pet Food".to_string()));
    }

    #[test]
    fn test_normalize_weight_conversions() {
        assert_eq!(normalize_weight(&json!("2kg")), Some(2000.0));
        assert_eq!(normalize_weight(&json!("500 g")), Some(500.0));
        assert_eq!(normalize_weight(&json!("1 lb")), Some(453.592));
        assert_eq!(normalize_weight(&json!("250")), Some(250.0));
    }

    #[test]
    fn test_normalize_volume_conversions() {
        assert_eq!(normalize_volume(&json!("50cl")), Some(500.0));
        assert_eq!(normalize_volume(&json!("1.5l")), Some(1500.0));
        assert_eq!(normalize_volume(&json!("330ml")), Some(330.0));
        assert_eq!(normalize_volume(&json!("330")), Some(330.0));
    }

    #[test]
    fn test_standardize_units() {
        assert_eq!(standardize_units("500 millilitres"), "500ml");
        assert_eq!(standardize_units("2 kilograms flour"), "2kg flour");
        assert_eq!(standardize_units("4 x 330 ml"), "4x330ml");
        assert_eq!(standardize_units("250 ML"), "250ml");
    }

    #[test]
    fn test_extract_volume_weight_prefers_volume() {
        let vw = extract_volume_weight("Squash 750ml").unwrap();
        assert_eq!(vw.kind, MeasureKind::Volume);
        assert_eq!(vw.value, 750.0);
        assert_eq!(vw.unit, "ml");

        let vw = extract_volume_weight("Rice 2 kilograms").unwrap();
        assert_eq!(vw.kind, MeasureKind::Weight);
        assert_eq!(vw.value, 2.0);
        assert_eq!(vw.unit, "kg");

        assert!(extract_volume_weight("no sizes here").is_none());
    }

    #[test]
    fn test_volume_weight_label() {
        let vw = extract_volume_weight("330 ml").unwrap();
        assert_eq!(vw.label(), "330ml");
        let vw = extract_volume_weight("14.2g").unwrap();
        assert_eq!(vw.label(), "14.2g");
    }

    #[test]
    fn test_detect_packaging_type() {
        assert_eq!(detect_packaging_type("Coke Zero Cans"), Some("Can"));
        assert_eq!(detect_packaging_type("Squash btl 750ml"), Some("Bottle"));
        assert_eq!(detect_packaging_type("Plain water"), None);
        // Whole-word only: "canned" is not "can"
        assert_eq!(detect_packaging_type("canned peaches"), None);
    }
}
