//! # Product Name Cleaning Module
//!
//! Turns noisy scraped product titles into clean display names: strips
//! embedded barcodes, multipack and size tokens, promotional price marks, and
//! generic descriptors, then standardizes casing. Also home to multipack
//! detection, pack-size extraction, and slug generation, which all work off
//! the same title text.
//!
//! The price-mark patterns are applied in listed order and each removes all
//! of its matches; reordering them changes output.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::SLUG_MAX_LENGTH;

/// Price-mark phrases removed from product names, in application order
const PRICE_MARK_PATTERNS: &[&str] = &[
    r"(?i)\bPMP\s*£?\s*\d+\.?\d*\b",      // PMP £1.25
    r"(?i)\bPM\s*£?\s*\d+\.?\d*\b",       // PM £1.79
    r"(?i)\bP\.?M\.?\s*£?\s*\d+\.?\d*\b", // P.M. £1.00
    r"(?i)\bPRICE\s*MARK(?:ED)?\s*£?\s*\d+\.?\d*\b",
    r"(?i)\b£\s*\d+\.?\d*\s*(PMP|PM)\b", // £1.25 PMP
    r"(?i)\bRRP\s*£?\s*\d+\.?\d*\b",
    r"(?i)\bNOW\s*£?\s*\d+\.?\d*\b",
    r"(?i)\bWAS\s*£?\s*\d+\.?\d*\b",
    r"(?i)\bONLY\s*£?\s*\d+\.?\d*\b",
    r"(?i)\b\d+\s*FOR\s*£?\s*\d+\.?\d*\b", // 2 FOR £1.00
    r"£\s*\d+(\.\d+)?",                    // £1.65
    r"(?i)\b\d+\s*p\b",                    // 75p
];

/// Generic descriptors removed from product names
const DESCRIPTOR_PATTERNS: &[&str] = &[
    r"(?i)\b(single|singles)\b",
    r"(?i)\b(new|new!|new!!)\b",
    r"(?i)\b(limited\s*edition)\b",
    r"(?i)\b(special\s*edition)\b",
];

/// Words kept lowercase unless they lead the title
const STOP_WORDS: &[&str] = &[
    "and", "or", "the", "a", "an", "of", "for", "with", "in", "on", "&",
];

/// Unit tokens and abbreviations with a fixed canonical casing
const CASING_SPECIAL_CASES: &[(&str, &str)] = &[
    ("ml", "ml"),
    ("g", "g"),
    ("kg", "kg"),
    ("l", "l"),
    ("oz", "oz"),
    ("cl", "cl"),
    ("pk", "pk"),
    ("uk", "UK"),
    ("usa", "USA"),
];

lazy_static! {
    static ref PRICE_MARK_RES: Vec<Regex> = PRICE_MARK_PATTERNS
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect();
    static ref DESCRIPTOR_RES: Vec<Regex> = DESCRIPTOR_PATTERNS
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect();
    static ref TRAILING_BARCODE_RE: Regex = Regex::new(r"\s+\d{10,}$").unwrap();
    static ref MULTIPACK_SPLIT_RE: Regex =
        Regex::new(r"(?i)\d+\s*[×xX]\s*\d+(?:\.\d+)?\s*(?:ml|g|l|kg|cl|oz)").unwrap();
    static ref SIZE_TOKEN_RE: Regex =
        Regex::new(r"(?i)\s*\d+(?:\.\d+)?\s*(?:ml|g|l|kg|cl|oz|fl\s*oz)\b").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    static ref SPACE_BEFORE_PUNCT_RE: Regex = Regex::new(r"\s+([,.])").unwrap();
    static ref MEASUREMENT_WORD_RE: Regex = Regex::new(r"^\d+(?:\.\d+)?[a-z]+$").unwrap();
    static ref MULTIPACK_WORD_RE: Regex = Regex::new(r"^\d+x\d+[a-z]+$").unwrap();
    static ref MULTIPACK_FULL_RE: Regex =
        Regex::new(r"(?i)(\d+)\s*[xX×]\s*(\d+(?:\.\d+)?)\s*(ml|g|l|kg)").unwrap();
    static ref PACK_COUNT_RES: Vec<Regex> = vec![
        Regex::new(r"(?i)(\d+)\s*(?:pack|pk|pck)\b").unwrap(),
        Regex::new(r"(?i)pack\s*of\s*(\d+)").unwrap(),
        Regex::new(r"(?i)(\d+)'?s\b").unwrap(),
        Regex::new(r"(?i)(\d+)\s*multi\s*pack").unwrap(),
    ];
    static ref PACK_SIZE_MULTI_RE: Regex =
        Regex::new(r"(?i)(\d+)\s*[xX×]\s*(\d+(?:\.\d+)?)\s*(ml|g|kg|l|oz|fl\s*oz)\b").unwrap();
    static ref PACK_SIZE_SINGLE_RE: Regex =
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(ml|g|kg|l|oz|fl\s*oz)\b").unwrap();
    static ref SLUG_CHARSET_RE: Regex = Regex::new(r"[^a-z0-9\s-]").unwrap();
    static ref SLUG_HYPHENS_RE: Regex = Regex::new(r"-+").unwrap();
}

/// Clean a raw product title into a display name.
///
/// Removes, in order: a trailing barcode run, everything from the first
/// multipack-size token onwards, price marks, generic descriptors, and any
/// remaining standalone size tokens; then standardizes casing and whitespace.
pub fn clean_product_name(name: &str) -> String {
    if name.trim().is_empty() {
        return String::new();
    }

    let mut cleaned = TRAILING_BARCODE_RE.replace(name, "").to_string();

    // Truncate at the first multipack token ("6x330ml" and friends)
    if let Some(first) = MULTIPACK_SPLIT_RE.splitn(&cleaned, 2).next() {
        cleaned = first.to_string();
    }

    for re in PRICE_MARK_RES.iter() {
        cleaned = re.replace_all(&cleaned, "").to_string();
    }

    for re in DESCRIPTOR_RES.iter() {
        cleaned = re.replace_all(&cleaned, "").to_string();
    }

    cleaned = SIZE_TOKEN_RE.replace_all(&cleaned, "").to_string();

    cleaned = standardize_casing(&cleaned);

    clean_whitespace(&cleaned)
}

/// Title-case a product name with exceptions: unit abbreviations keep their
/// canonical form, measurement tokens stay lowercase, and stop-words stay
/// lowercase unless they lead the title.
pub fn standardize_casing(name: &str) -> String {
    let words: Vec<String> = name
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            let word_lower = word.to_lowercase();
            if let Some((_, canonical)) = CASING_SPECIAL_CASES
                .iter()
                .find(|(key, _)| *key == word_lower)
            {
                (*canonical).to_string()
            } else if MEASUREMENT_WORD_RE.is_match(&word_lower)
                || MULTIPACK_WORD_RE.is_match(&word_lower)
            {
                word_lower
            } else if i > 0 && STOP_WORDS.contains(&word_lower.as_str()) {
                word_lower
            } else {
                capitalize(word)
            }
        })
        .collect();

    words.join(" ")
}

/// Uppercase the first letter, lowercase the rest
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn clean_whitespace(name: &str) -> String {
    let result = WHITESPACE_RE.replace_all(name, " ");
    let result = result.trim();
    SPACE_BEFORE_PUNCT_RE.replace_all(result, "$1").to_string()
}

/// A detected multipack: N units of an optional per-unit size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Multipack {
    /// Number of units in the pack
    pub count: u32,
    /// Per-unit size, when the title spells it out
    pub size: Option<f64>,
    /// Unit of the per-unit size
    pub unit: Option<String>,
    /// Compact rendering: "7x14.2g" or "6pk"
    pub format: String,
}

/// Detect multipack information in a product title.
///
/// Tries, in order: `<n> x <size><unit>`, `<n> pack`, `pack of <n>`,
/// `<n>'s`, `<n> multi pack`. The first matching pattern wins.
pub fn detect_multipack(name: &str) -> Option<Multipack> {
    if name.trim().is_empty() {
        return None;
    }

    if let Some(caps) = MULTIPACK_FULL_RE.captures(name) {
        let unit = caps[3].to_lowercase();
        return Some(Multipack {
            count: caps[1].parse().ok()?,
            size: Some(caps[2].parse().ok()?),
            unit: Some(unit.clone()),
            format: format!("{}x{}{}", &caps[1], &caps[2], unit),
        });
    }

    for re in PACK_COUNT_RES.iter() {
        if let Some(caps) = re.captures(name) {
            return Some(Multipack {
                count: caps[1].parse().ok()?,
                size: None,
                unit: None,
                format: format!("{}pk", &caps[1]),
            });
        }
    }

    None
}

/// Single unit vs. bundle of identical units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Single,
    Multipack,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Single => "single",
            ProductType::Multipack => "multipack",
        }
    }
}

/// Classify a title as a single unit or a multipack
pub fn product_type(name: &str) -> ProductType {
    if detect_multipack(name).is_some() {
        ProductType::Multipack
    } else {
        ProductType::Single
    }
}

/// Extract a standardized pack-size string from a title: `"7x14.2g"` for
/// multipacks, `"500ml"` for single sizes, None when the title carries no
/// size token.
pub fn extract_pack_size(name: &str) -> Option<String> {
    if name.trim().is_empty() {
        return None;
    }

    if let Some(caps) = PACK_SIZE_MULTI_RE.captures(name) {
        let unit = caps[3].to_lowercase().replace(' ', "");
        return Some(format!("{}x{}{}", &caps[1], &caps[2], unit));
    }

    if let Some(caps) = PACK_SIZE_SINGLE_RE.captures(name) {
        let unit = caps[2].to_lowercase().replace(' ', "");
        return Some(format!("{}{}", &caps[1], unit));
    }

    None
}

/// Generate a URL-friendly slug from a product title. The title is cleaned
/// first, so size and price tokens never reach the slug.
pub fn generate_slug(name: &str) -> String {
    if name.trim().is_empty() {
        return String::new();
    }

    let cleaned = clean_product_name(name);
    let slug = cleaned.to_lowercase().replace('&', "and");
    let slug = SLUG_CHARSET_RE.replace_all(&slug, "");
    let slug = WHITESPACE_RE.replace_all(&slug, "-");
    let slug = SLUG_HYPHENS_RE.replace_all(&slug, "-");
    let mut slug = slug.trim_matches('-').to_string();

    if slug.len() > SLUG_MAX_LENGTH {
        slug.truncate(SLUG_MAX_LENGTH);
        if let Some(last_hyphen) = slug.rfind('-') {
            if last_hyphen > SLUG_MAX_LENGTH / 2 {
                slug.truncate(last_hyphen);
            }
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_price_marks() {
        assert_eq!(
            clean_product_name("Red Bull Energy Drink 250ml PMP £1.29"),
            "Red Bull Energy Drink"
        );
        assert_eq!(clean_product_name("Coke Zero NOW £1.00"), "Coke Zero");
        assert_eq!(clean_product_name("Freddo 75p"), "Freddo");
        assert_eq!(clean_product_name("Walkers Crisps 2 FOR £1.50"), "Walkers Crisps");
    }

    #[test]
    fn test_clean_removes_trailing_barcode() {
        assert_eq!(
            clean_product_name("Vimto Squash 725ml 5000382100818"),
            "Vimto Squash"
        );
    }

    #[test]
    fn test_clean_truncates_multipack() {
        assert_eq!(
            clean_product_name("Coca-Cola Original 6x330ml Cans"),
            "Coca-cola Original"
        );
    }

    #[test]
    fn test_clean_removes_descriptors() {
        assert_eq!(
            clean_product_name("Twix Limited Edition Single 50g"),
            "Twix"
        );
    }

    #[test]
    fn test_clean_is_idempotent() {
        let samples = [
            "Red Bull Energy Drink 250ml PMP £1.29",
            "Nescafe Coffee Sachets 7 x 14.2g",
            "Heinz Beanz 415g WAS £1.40",
            "Monster Energy Ultra 500ml",
        ];
        for sample in samples {
            let once = clean_product_name(sample);
            assert_eq!(clean_product_name(&once), once, "sample: {}", sample);
        }
    }

    #[test]
    fn test_standardize_casing() {
        assert_eq!(
            standardize_casing("JACK DANIELS tennessee WHISKEY"),
            "Jack Daniels Tennessee Whiskey"
        );
        // Stop-words lowercase unless first
        assert_eq!(standardize_casing("cream OF tomato"), "Cream of Tomato");
        assert_eq!(standardize_casing("of the month"), "Of the Month");
        // Units and abbreviations keep canonical form
        assert_eq!(standardize_casing("made in the uk"), "Made in the UK");
        assert_eq!(standardize_casing("250ML bottle"), "250ml Bottle");
        assert_eq!(standardize_casing("6x330ml cans"), "6x330ml Cans");
    }

    #[test]
    fn test_detect_multipack_full_descriptor() {
        let mp = detect_multipack("Nescafe Coffee Sachets 7 x 14.2g").unwrap();
        assert_eq!(mp.count, 7);
        assert_eq!(mp.size, Some(14.2));
        assert_eq!(mp.unit.as_deref(), Some("g"));
        assert_eq!(mp.format, "7x14.2g");
    }

    #[test]
    fn test_detect_multipack_count_only() {
        let mp = detect_multipack("Walkers Variety 12 Pack").unwrap();
        assert_eq!(mp.count, 12);
        assert_eq!(mp.size, None);
        assert_eq!(mp.format, "12pk");

        let mp = detect_multipack("Pack of 4 Scotch Eggs").unwrap();
        assert_eq!(mp.count, 4);

        let mp = detect_multipack("Crunchie 6's").unwrap();
        assert_eq!(mp.count, 6);
    }

    #[test]
    fn test_detect_multipack_none() {
        assert!(detect_multipack("Heinz Tomato Ketchup 460g").is_none());
        assert!(detect_multipack("").is_none());
    }

    #[test]
    fn test_product_type() {
        assert_eq!(product_type("Coke 6x330ml"), ProductType::Multipack);
        assert_eq!(product_type("Coke 330ml"), ProductType::Single);
        assert_eq!(ProductType::Multipack.as_str(), "multipack");
    }

    #[test]
    fn test_extract_pack_size() {
        assert_eq!(
            extract_pack_size("Nescafe Sachets 7 x 14.2g").as_deref(),
            Some("7x14.2g")
        );
        assert_eq!(extract_pack_size("Pepsi Max 500ml").as_deref(), Some("500ml"));
        assert_eq!(extract_pack_size("Sponge Cake"), None);
    }

    #[test]
    fn test_generate_slug() {
        assert_eq!(
            generate_slug("Coca-Cola Original 330ml"),
            "coca-cola-original"
        );
        assert_eq!(
            generate_slug("Marks & Spencer Shortbread"),
            "marks-and-spencer-shortbread"
        );
        assert_eq!(generate_slug(""), "");
    }

    #[test]
    fn test_generate_slug_length_cap() {
        let long_name = "very ".repeat(40) + "long product";
        let slug = generate_slug(&long_name);
        assert!(slug.len() <= SLUG_MAX_LENGTH);
        assert!(!slug.ends_with('-'));
    }
}
