//! # Description Extraction Module
//!
//! Mines unstructured product descriptions and allergy warnings for
//! structured facts: nutrition values, allergens, ingredient lists, country
//! of origin, certifications, and storage instructions.
//!
//! Every extractor is pure and total: missing or empty input yields None,
//! never an error. The nutrition label patterns are tried in listed order per
//! field and the first match wins.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::{KJ_PER_KCAL, MAX_INGREDIENT_ITEMS, MAX_STORAGE_LEN, SALT_TO_SODIUM_FACTOR};

/// Countries accepted as a country of origin
const COMMON_COUNTRIES: &[&str] = &[
    "India", "UK", "USA", "China", "Pakistan", "Sri Lanka", "Bangladesh",
    "Italy", "France", "Spain", "Germany", "Netherlands", "Thailand",
    "Mexico", "Brazil", "Poland", "United Kingdom", "United States",
];

/// A nutrition label pattern: capture group 1 is the value, scaled into the
/// target field's unit
struct NutritionPattern {
    re: Regex,
    scale: f64,
}

impl NutritionPattern {
    fn new(pattern: &str, scale: f64) -> Self {
        Self {
            re: Regex::new(pattern).unwrap(),
            scale,
        }
    }
}

struct NutritionRule {
    field: &'static str,
    patterns: Vec<NutritionPattern>,
}

lazy_static! {
    /// Label patterns per nutrition field (UK/EU format), in match order.
    /// Energy in kJ and salt in grams are converted to kcal and mg of sodium.
    static ref NUTRITION_RULES: Vec<NutritionRule> = vec![
        NutritionRule {
            field: "Calories (kcal)",
            patterns: vec![
                NutritionPattern::new(r"(?i)Energy[:\s]*(\d+(?:\.\d+)?)\s*kcal", 1.0),
                NutritionPattern::new(r"(?i)(\d+(?:\.\d+)?)\s*kcal", 1.0),
                NutritionPattern::new(r"(?i)Energy[:\s]*(\d+(?:\.\d+)?)\s*kJ", 1.0 / KJ_PER_KCAL),
            ],
        },
        NutritionRule {
            field: "Total Fat (g)",
            patterns: vec![
                NutritionPattern::new(r"(?i)Fat[:\s]*(\d+(?:\.\d+)?)\s*g", 1.0),
                NutritionPattern::new(r"(?i)Total\s+Fat[:\s]*(\d+(?:\.\d+)?)\s*g", 1.0),
            ],
        },
        NutritionRule {
            field: "Saturated Fat (g)",
            patterns: vec![
                NutritionPattern::new(
                    r"(?i)(?:of which[:\s]*)?saturates?[:\s]*(\d+(?:\.\d+)?)\s*g",
                    1.0,
                ),
                NutritionPattern::new(r"(?i)Saturated\s+Fat[:\s]*(\d+(?:\.\d+)?)\s*g", 1.0),
            ],
        },
        NutritionRule {
            field: "Total Carbohydrates (g)",
            patterns: vec![
                NutritionPattern::new(r"(?i)Carbohydrates?[:\s]*(\d+(?:\.\d+)?)\s*g", 1.0),
                NutritionPattern::new(r"(?i)Total\s+Carbohydrates?[:\s]*(\d+(?:\.\d+)?)\s*g", 1.0),
            ],
        },
        NutritionRule {
            field: "Total Sugars (g)",
            patterns: vec![NutritionPattern::new(
                r"(?i)(?:of which[:\s]*)?sugars?[:\s]*(\d+(?:\.\d+)?)\s*g",
                1.0,
            )],
        },
        NutritionRule {
            field: "Dietary Fiber (g)",
            patterns: vec![
                NutritionPattern::new(r"(?i)Fibre[:\s]*(\d+(?:\.\d+)?)\s*g", 1.0),
                NutritionPattern::new(r"(?i)Fiber[:\s]*(\d+(?:\.\d+)?)\s*g", 1.0),
                NutritionPattern::new(r"(?i)Dietary\s+Fibre[:\s]*(\d+(?:\.\d+)?)\s*g", 1.0),
            ],
        },
        NutritionRule {
            field: "Protein (g)",
            patterns: vec![NutritionPattern::new(
                r"(?i)Protein[:\s]*(\d+(?:\.\d+)?)\s*g",
                1.0,
            )],
        },
        NutritionRule {
            field: "Sodium (mg)",
            patterns: vec![
                NutritionPattern::new(r"(?i)Salt[:\s]*(\d+(?:\.\d+)?)\s*g", SALT_TO_SODIUM_FACTOR),
                NutritionPattern::new(r"(?i)Sodium[:\s]*(\d+(?:\.\d+)?)\s*mg", 1.0),
            ],
        },
    ];

    /// Allergen categories and their whole-word keyword patterns
    static ref ALLERGEN_RULES: Vec<(&'static str, Vec<Regex>)> = [
        ("Peanuts", vec![r"\bpeanuts?\b", r"\bgroundnuts?\b"]),
        ("Tree Nuts", vec![
            r"\btree nuts?\b", r"\bnuts?\b", r"\balmonds?\b", r"\bcashews?\b",
            r"\bwalnuts?\b", r"\bpecans?\b", r"\bhazelnuts?\b", r"\bpistachios?\b",
        ]),
        ("Milk", vec![
            r"\bmilk\b", r"\bdairy\b", r"\blactose\b", r"\bwhey\b",
            r"\bcasein\b", r"\bcream\b",
        ]),
        ("Eggs", vec![r"\beggs?\b", r"\balbumin\b"]),
        ("Wheat", vec![r"\bwheat\b", r"\bgluten\b"]),
        ("Soy", vec![r"\bsoy\b", r"\bsoya\b", r"\bsoybeans?\b"]),
        ("Fish", vec![r"\bfish\b", r"\banchovies\b", r"\btuna\b", r"\bsalmon\b", r"\bcod\b"]),
        ("Shellfish", vec![
            r"\bshellfish\b", r"\bcrustaceans?\b", r"\bshrimp\b", r"\bcrab\b",
            r"\blobster\b", r"\bmussels?\b", r"\boysters?\b",
        ]),
        ("Sesame", vec![r"\bsesame\b", r"\btahini\b"]),
        ("Mustard", vec![r"\bmustard\b"]),
        ("Celery", vec![r"\bcelery\b"]),
        ("Lupin", vec![r"\blupin\b"]),
        ("Sulphites", vec![r"\bsulphites?\b", r"\bsulfites?\b", r"\bsulphur dioxide\b"]),
    ]
    .into_iter()
    .map(|(name, patterns)| {
        (name, patterns.into_iter().map(|p| Regex::new(p).unwrap()).collect())
    })
    .collect();

    /// Certification labels and their keyword patterns
    static ref CERTIFICATION_RULES: Vec<(&'static str, Vec<Regex>)> = [
        ("USDA Organic", vec![r"(?i)\bUSDA\s+Organic\b"]),
        ("Organic", vec![r"(?i)\borganic\b", r"(?i)\bcertified organic\b"]),
        ("Vegan", vec![r"(?i)\bvegan\b", r"(?i)\bplant-based\b"]),
        ("Vegetarian", vec![r"(?i)\bvegetarian\b", r"(?i)\bveggie\b"]),
        ("Halal", vec![r"(?i)\bhalal\b", r"(?i)\bcertified halal\b"]),
        ("Kosher", vec![r"(?i)\bkosher\b", r"(?i)\bcertified kosher\b"]),
        ("Gluten-Free", vec![r"(?i)\bgluten[- ]free\b", r"(?i)\bno gluten\b"]),
        ("Dairy-Free", vec![r"(?i)\bdairy[- ]free\b", r"(?i)\blactose[- ]free\b"]),
        ("Nut-Free", vec![r"(?i)\bnut[- ]free\b"]),
        ("Non-GMO", vec![r"(?i)\bnon[- ]GMO\b", r"(?i)\bGMO[- ]free\b"]),
        ("Fair Trade", vec![r"(?i)\bfair\s+trade\b", r"(?i)\bfairtrade\b"]),
        ("Rainforest Alliance", vec![r"(?i)\bRainforest\s+Alliance\b"]),
    ]
    .into_iter()
    .map(|(name, patterns)| {
        (name, patterns.into_iter().map(|p| Regex::new(p).unwrap()).collect())
    })
    .collect();

    static ref INGREDIENT_SECTION_RES: Vec<Regex> = vec![
        Regex::new(
            r"(?is)Ingredients?[:\s]+(.*?)(?:\n\n|\.|Storage|Allergy|Nutrition|Contains:|May contain)"
        )
        .unwrap(),
        Regex::new(r"(?is)Contains?[:\s]+(.*?)(?:\n\n|\.|Storage|Allergy|Nutrition)").unwrap(),
    ];
    static ref PERCENTAGE_NOTE_RE: Regex = Regex::new(r"\s*\(\d+%?\)").unwrap();
    static ref ALLERGEN_NOTE_RE: Regex =
        Regex::new(r"(?i)\s*\([^)]*allergen[^)]*\)").unwrap();
    static ref COUNTRY_RES: Vec<Regex> = vec![
        Regex::new(r"(?:Product of|Made in)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").unwrap(),
        Regex::new(r"(?:Country of origin|Origin)[:\s]+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").unwrap(),
        Regex::new(r"([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\s+origin").unwrap(),
        Regex::new(r"Produce of\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").unwrap(),
    ];
    static ref STORAGE_RES: Vec<Regex> = vec![
        Regex::new(r"(?is)Storage[:\s]+(.*?)(?:\n\n|\.|Allergy|Nutrition|Ingredients)").unwrap(),
        Regex::new(r"(?is)Store\s+in\s+(.*?)(?:\n\n|\.|Allergy|Nutrition|Ingredients)").unwrap(),
        Regex::new(r"(?is)Keep\s+(.*?)(?:\n\n|\.|Allergy|Nutrition|Ingredients)").unwrap(),
    ];
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Extract nutrition values from description text, mapped to schema fields.
/// First matching pattern per field wins. None when nothing matched.
pub fn extract_nutrition(text: &str) -> Option<Vec<(&'static str, f64)>> {
    if text.trim().is_empty() {
        return None;
    }

    let mut nutrition = Vec::new();
    for rule in NUTRITION_RULES.iter() {
        for pattern in &rule.patterns {
            if let Some(caps) = pattern.re.captures(text) {
                if let Ok(value) = caps[1].parse::<f64>() {
                    let mut scaled = value * pattern.scale;
                    if pattern.scale != 1.0 {
                        scaled = (scaled * 10.0).round() / 10.0;
                    }
                    nutrition.push((rule.field, scaled));
                }
                break;
            }
        }
    }

    if nutrition.is_empty() {
        None
    } else {
        Some(nutrition)
    }
}

/// Extract allergen categories mentioned in a description and an optional
/// allergy warning. Output is sorted; None when nothing matched.
pub fn extract_allergens(description: &str, warning: &str) -> Option<Vec<String>> {
    let full_text = format!("{} {}", description, warning).to_lowercase();
    if full_text.trim().is_empty() {
        return None;
    }

    let mut allergens: Vec<String> = ALLERGEN_RULES
        .iter()
        .filter(|(_, patterns)| patterns.iter().any(|re| re.is_match(&full_text)))
        .map(|(name, _)| (*name).to_string())
        .collect();

    if allergens.is_empty() {
        return None;
    }
    allergens.sort();
    Some(allergens)
}

/// Extract the ingredients list from an "Ingredients:" or "Contains:"
/// section. Items are trimmed, percentage and allergen parentheticals are
/// dropped, items of two characters or fewer are skipped, and the list is
/// capped at 30 entries.
pub fn extract_ingredients(text: &str) -> Option<Vec<String>> {
    if text.trim().is_empty() {
        return None;
    }

    for re in INGREDIENT_SECTION_RES.iter() {
        if let Some(caps) = re.captures(text) {
            let section = caps[1].trim().to_string();
            let cleaned: Vec<String> = section
                .split([',', ';'])
                .map(|item| {
                    let item = item.trim();
                    let item = PERCENTAGE_NOTE_RE.replace_all(item, "");
                    ALLERGEN_NOTE_RE.replace_all(&item, "").trim().to_string()
                })
                .filter(|item| item.chars().count() > 2)
                .take(MAX_INGREDIENT_ITEMS)
                .collect();

            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }

    None
}

/// Extract a country of origin from phrases like "Product of Italy" or
/// "Made in France", validated against the known-country list.
pub fn extract_country_of_origin(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }

    for re in COUNTRY_RES.iter() {
        if let Some(caps) = re.captures(text) {
            let country = caps[1].trim();
            if COMMON_COUNTRIES
                .iter()
                .any(|c| c.eq_ignore_ascii_case(country))
            {
                return Some(country.to_string());
            }
        }
    }

    None
}

/// Extract certification labels mentioned in a description. Output is
/// sorted; None when nothing matched.
pub fn extract_certifications(text: &str) -> Option<Vec<String>> {
    if text.trim().is_empty() {
        return None;
    }

    let mut certifications: Vec<String> = CERTIFICATION_RULES
        .iter()
        .filter(|(_, patterns)| patterns.iter().any(|re| re.is_match(text)))
        .map(|(name, _)| (*name).to_string())
        .collect();

    if certifications.is_empty() {
        return None;
    }
    certifications.sort();
    Some(certifications)
}

/// Extract storage instructions ("Storage:", "Store in", "Keep"), collapsed
/// to single spaces and truncated to 200 characters.
pub fn extract_storage_instructions(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }

    for re in STORAGE_RES.iter() {
        if let Some(caps) = re.captures(text) {
            let storage = WHITESPACE_RE
                .replace_all(caps[1].trim(), " ")
                .to_string();
            let truncated: String = storage.chars().take(MAX_STORAGE_LEN).collect();
            if !truncated.is_empty() {
                return Some(truncated);
            }
        }
    }

    None
}
