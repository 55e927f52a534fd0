//! # Product Schema Module
//!
//! The fixed, ordered field list every final record must carry, and the
//! enforcement step that maps an enriched record onto it.

use serde_json::{Map, Value};

use crate::record::ProductRecord;

/// The output schema, in serialization order. A final record contains exactly
/// these fields: enriched values where available, null everywhere else.
pub const PRODUCT_SCHEMA: &[&str] = &[
    // Identity & naming
    "Product ID",
    "Product Name",
    "Brand",
    "Category",
    "Subcategory",
    "Tags",
    // Descriptions
    "Short Description",
    "Long Description",
    // Identification & sizing
    "Barcode (EAN/UPC)",
    "Package Size",
    "Volume for Liquids (ml/L)",
    "Country of Origin",
    "Storage Instructions",
    "Ingredients List",
    "Allergens",
    "Product Certifications",
    // Nutrition facts (per serving)
    "Calories (kcal)",
    "Total Fat (g)",
    "Saturated Fat (g)",
    "Total Carbohydrates (g)",
    "Total Sugars (g)",
    "Dietary Fiber (g)",
    "Protein (g)",
    "Sodium (mg)",
    // Dietary flags
    "Vegan",
    "Vegetarian",
    "Gluten-Free",
    "Dairy-Free",
    "Egg-Free",
    "Soy-Free",
    "Shellfish-Free",
    "Nut-Free",
    "Organic",
    "Non-GMO",
    "Keto-Friendly",
    "Paleo-Friendly",
    "Kosher",
    "Halal",
    "No Preservatives",
    "Natural Ingredients",
    // Allergen presence flags
    "Contains Peanuts",
    "Contains Tree Nuts",
    "Contains Milk",
    "Contains Eggs",
    "Contains Wheat",
    "Contains Soybeans",
    "Contains Fish",
    "Contains Shellfish",
    "Contains Sesame",
    // Nutrition-derived flags
    "High Protein",
    "High Fiber",
    "Low Sugar",
    "Low Sodium",
    "Low Carb",
    // Packaging flags
    "Canned Food",
    "Non Canned Food",
    // Media
    "Featured Image URL",
    // Source tracking
    "Source Website Name",
    "Source Website URL",
    "Scraped At",
];

/// A schema-enforced output record
pub type FinalProduct = Map<String, Value>;

/// Check whether a field name belongs to the schema
pub fn is_schema_field(name: &str) -> bool {
    PRODUCT_SCHEMA.contains(&name)
}

/// Map an enriched record onto the schema: exactly the schema's fields, in
/// schema order, missing values as null, unrecognized fields dropped.
pub fn enforce_schema(record: &ProductRecord) -> FinalProduct {
    let mut out = Map::with_capacity(PRODUCT_SCHEMA.len());
    for &field in PRODUCT_SCHEMA {
        let value = record.raw_get(field).cloned().unwrap_or(Value::Null);
        out.insert(field.to_string(), value);
    }
    out
}
