//! # Inference Engine Module
//!
//! Derives missing fields from whatever data a record already carries:
//! brand, category, dietary flags, allergens and their boolean flags,
//! packaging flags, and nutrition-threshold flags.
//!
//! Every rule honors the fill-don't-overwrite policy: inferred values are
//! written only into fields that are currently unset. A per-field conversion
//! failure simply leaves that field unset.

use lazy_static::lazy_static;
use regex::Regex;

use crate::record::ProductRecord;

/// Company keyword table for brand inference
const BRAND_PATTERNS: &[(&str, &[&str])] = &[
    ("Nestle", &["nestle", "nescafe", "kitkat", "maggi"]),
    ("Unilever", &["dove", "axe", "knorr", "lipton"]),
    ("PepsiCo", &["pepsi", "lays", "doritos", "gatorade", "tropicana"]),
    ("Coca-Cola", &["coca-cola", "coke", "sprite", "fanta", "dasani"]),
    ("Kraft Heinz", &["kraft", "heinz", "philadelphia", "oscar mayer"]),
    ("Kellogg's", &["kelloggs", "pringles", "special k", "frosted flakes"]),
];

/// Dietary schema fields and the keywords that imply them
const DIETARY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Vegan", &["vegan", "100% plant", "plant-based"]),
    ("Vegetarian", &["vegetarian", "veggie"]),
    ("Gluten-Free", &["gluten-free", "gluten free", "gf"]),
    ("Dairy-Free", &["dairy-free", "dairy free", "lactose-free"]),
    ("Organic", &["organic", "bio", "usda organic"]),
    ("Non-GMO", &["non-gmo", "non gmo", "gmo-free"]),
    ("Keto-Friendly", &["keto", "ketogenic", "keto-friendly"]),
    ("Paleo-Friendly", &["paleo", "paleo-friendly"]),
    ("Kosher", &["kosher", "certified kosher"]),
    ("Halal", &["halal", "certified halal"]),
];

/// Allergen names and ingredient keywords implying them
const ALLERGEN_KEYWORDS: &[(&str, &[&str])] = &[
    ("Peanuts", &["peanut", "groundnut"]),
    ("Tree Nuts", &["almond", "cashew", "walnut", "pecan", "hazelnut", "pistachio", "macadamia"]),
    ("Milk", &["milk", "dairy", "lactose", "whey", "casein", "cheese", "butter", "cream", "yogurt"]),
    ("Eggs", &["egg", "albumin", "mayonnaise"]),
    ("Wheat", &["wheat", "flour", "gluten"]),
    ("Soy", &["soy", "soya", "tofu", "edamame", "miso"]),
    ("Fish", &["fish", "salmon", "tuna", "cod", "anchovy"]),
    ("Shellfish", &["shrimp", "crab", "lobster", "prawn", "mussel", "oyster", "clam"]),
    ("Sesame", &["sesame", "tahini"]),
];

/// Allergen boolean schema fields and the allergen name each tracks
const ALLERGEN_FLAGS: &[(&str, &str)] = &[
    ("Contains Peanuts", "Peanuts"),
    ("Contains Tree Nuts", "Tree Nuts"),
    ("Contains Milk", "Milk"),
    ("Contains Eggs", "Eggs"),
    ("Contains Wheat", "Wheat"),
    ("Contains Soybeans", "Soy"),
    ("Contains Fish", "Fish"),
    ("Contains Shellfish", "Shellfish"),
    ("Contains Sesame", "Sesame"),
];

/// Category keyword table, first match wins
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Beverages", &["juice", "soda", "water", "tea", "coffee", "drink"]),
    ("Dairy", &["milk", "cheese", "yogurt", "butter", "cream"]),
    ("Snacks", &["chips", "crackers", "popcorn", "nuts", "snack"]),
    ("Bakery", &["bread", "cookies", "cake", "pastry", "muffin"]),
    ("Canned Goods", &["canned", "can"]),
    ("Frozen Foods", &["frozen"]),
    ("Condiments", &["sauce", "ketchup", "mustard", "mayo", "dressing"]),
];

/// Ingredient keywords that rule out a vegan inference
const ANIMAL_PRODUCTS: &[&str] = &[
    "meat", "chicken", "beef", "pork", "fish", "egg", "milk", "honey", "gelatin",
];

/// Keywords marking a canned product
const CANNED_KEYWORDS: &[&str] = &["canned", "can", "tinned", "tin"];

lazy_static! {
    static ref LEADING_BRAND_RE: Regex = Regex::new(r"^([A-Z][a-zA-Z0-9&'\-]+)").unwrap();
}

/// Rule-based enrichment over a partially-normalized record
#[derive(Debug, Default)]
pub struct InferenceEngine;

impl InferenceEngine {
    pub fn new() -> Self {
        Self
    }

    /// Combined lowercased text of the given string/list fields
    fn combined_text(record: &ProductRecord, fields: &[&str]) -> String {
        let mut parts: Vec<String> = Vec::new();
        for field in fields {
            if let Some(text) = record.get_str(field) {
                parts.push(text.to_string());
            } else {
                let items = record.get_str_list(field);
                if !items.is_empty() {
                    parts.push(items.join(" "));
                }
            }
        }
        parts.join(" ").to_lowercase()
    }

    /// Infer a brand from the company keyword table, falling back to the
    /// leading capitalized token of the product name.
    pub fn infer_brand(&self, record: &ProductRecord) -> Option<String> {
        let text = Self::combined_text(
            record,
            &["Product Name", "Short Description", "Long Description"],
        );

        for (brand, keywords) in BRAND_PATTERNS {
            if keywords.iter().any(|kw| text.contains(kw)) {
                return Some((*brand).to_string());
            }
        }

        let name = record.get_str("Product Name")?;
        LEADING_BRAND_RE
            .captures(name.trim())
            .map(|caps| caps[1].to_string())
    }

    /// Infer a category from product-name keywords, first match wins
    pub fn infer_category(&self, record: &ProductRecord) -> Option<String> {
        let text = record.get_str("Product Name")?.to_lowercase();

        for (category, keywords) in CATEGORY_KEYWORDS {
            if keywords.iter().any(|kw| text.contains(kw)) {
                return Some((*category).to_string());
            }
        }

        None
    }

    /// Dietary flags found by keyword search across name, descriptions, tags,
    /// certifications, and ingredients. Only positive findings are reported.
    pub fn infer_dietary_flags(&self, record: &ProductRecord) -> Vec<&'static str> {
        let text = Self::combined_text(
            record,
            &[
                "Product Name",
                "Short Description",
                "Long Description",
                "Tags",
                "Product Certifications",
                "Ingredients List",
            ],
        );

        let mut flags: Vec<&'static str> = DIETARY_KEYWORDS
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
            .map(|(field, _)| *field)
            .collect();

        // Secondary rule: an ingredients list free of animal products implies
        // vegan even without an explicit claim
        if !flags.contains(&"Vegan") {
            let ingredients = record.get_str_list("Ingredients List");
            if !ingredients.is_empty() {
                let has_animal = ingredients.iter().any(|ing| {
                    let ing = ing.to_lowercase();
                    ANIMAL_PRODUCTS.iter().any(|ap| ing.contains(ap))
                });
                if !has_animal {
                    flags.push("Vegan");
                }
            }
        }

        flags
    }

    /// Detect allergens from the ingredients list and the name/description
    /// text. Output is sorted.
    pub fn infer_allergens(&self, record: &ProductRecord) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();

        let ingredients_text = record.get_str_list("Ingredients List").join(" ").to_lowercase();
        let info_text = Self::combined_text(record, &["Product Name", "Short Description"]);

        for (allergen, keywords) in ALLERGEN_KEYWORDS {
            let in_ingredients =
                !ingredients_text.is_empty() && keywords.iter().any(|kw| ingredients_text.contains(kw));
            let in_info = keywords.iter().any(|kw| info_text.contains(kw));
            if (in_ingredients || in_info) && !found.iter().any(|f| f == allergen) {
                found.push((*allergen).to_string());
            }
        }

        found.sort();
        found
    }

    /// Whether the product is canned, judged from name, package size, and
    /// short description
    pub fn infer_canned(&self, record: &ProductRecord) -> bool {
        let text = Self::combined_text(
            record,
            &["Product Name", "Package Size", "Short Description"],
        );
        CANNED_KEYWORDS.iter().any(|kw| text.contains(kw))
    }

    /// Nutrition-threshold flags, reported only for fields that are present
    pub fn infer_nutrition_flags(&self, record: &ProductRecord) -> Vec<(&'static str, bool)> {
        let mut flags = Vec::new();

        if let Some(protein) = numeric_field(record, "Protein (g)") {
            flags.push(("High Protein", protein > 10.0));
        }
        if let Some(fiber) = numeric_field(record, "Dietary Fiber (g)") {
            flags.push(("High Fiber", fiber > 5.0));
        }
        if let Some(sugars) = numeric_field(record, "Total Sugars (g)") {
            flags.push(("Low Sugar", sugars < 5.0));
        }
        if let Some(sodium) = numeric_field(record, "Sodium (mg)") {
            flags.push(("Low Sodium", sodium < 140.0));
        }
        if let Some(carbs) = numeric_field(record, "Total Carbohydrates (g)") {
            flags.push(("Low Carb", carbs < 10.0));
        }

        flags
    }

    /// Apply every inference rule, filling only unset fields
    pub fn apply_all(&self, record: &mut ProductRecord) {
        if record.is_unset("Brand") {
            if let Some(brand) = self.infer_brand(record) {
                record.fill("Brand", brand.into());
            }
        }

        if record.is_unset("Category") {
            if let Some(category) = self.infer_category(record) {
                record.fill("Category", category.into());
            }
        }

        for field in self.infer_dietary_flags(record) {
            record.fill(field, true.into());
        }

        let allergens = if record.is_unset("Allergens") {
            let detected = self.infer_allergens(record);
            if !detected.is_empty() {
                record.merge_list("Allergens", &detected);
            }
            detected
        } else {
            record.get_str_list("Allergens")
        };

        for &(flag, allergen) in ALLERGEN_FLAGS {
            record.fill(flag, allergens.iter().any(|a| a == allergen).into());
        }

        let has_nuts = allergens.iter().any(|a| a == "Peanuts" || a == "Tree Nuts");
        record.fill("Nut-Free", (!has_nuts).into());

        let is_canned = self.infer_canned(record);
        record.fill("Canned Food", is_canned.into());
        record.fill("Non Canned Food", (!is_canned).into());

        for (flag, value) in self.infer_nutrition_flags(record) {
            record.fill(flag, value.into());
        }
    }
}

/// Numeric view of a field, tolerating number-like strings; anything else is
/// treated as absent
fn numeric_field(record: &ProductRecord, field: &str) -> Option<f64> {
    if let Some(n) = record.get_f64(field) {
        return Some(n);
    }
    record.get_str(field)?.trim().parse::<f64>().ok()
}
