//! # Pipeline Orchestrator Module
//!
//! Runs a raw scraped record through the four processing stages:
//!
//! 1. Clean & normalize — name cleaning, brand resolution, field mapping
//! 2. Enrich — inference rules, then description mining, filling only unset
//!    fields and set-union merging allergens/certifications
//! 3. Source metadata — website name/URL, scrape timestamp, ID synthesis
//! 4. Schema enforcement — fixed ordered field list, nulls for gaps
//!
//! Batch processing skips invalid records (missing identifier or name,
//! placeholder names) without aborting; skips are counted and logged.

use std::fmt;

use chrono::Utc;
use log::{debug, info, warn};
use serde_json::Value;

use crate::brands::{alnum_key, BrandRegistry};
use crate::config::{PipelineConfig, KJ_PER_KCAL, PRODUCT_ID_PREFIX_LEN, SALT_TO_SODIUM_FACTOR};
use crate::extract;
use crate::inference::InferenceEngine;
use crate::name_cleaner::{clean_product_name, extract_pack_size};
use crate::normalize::{
    detect_packaging_type, extract_volume_weight, normalize_category, normalize_number,
    normalize_text, normalize_url, normalize_volume, MeasureKind,
};
use crate::record::{ProductRecord, RawProduct};
use crate::schema::{enforce_schema, FinalProduct};

/// Placeholder tokens that disqualify a product name
const PLACEHOLDER_NAMES: &[&str] = &["N/A", "NA", "NONE", "NULL"];

/// Structured nutrition keys and the schema fields they feed. Energy and Salt
/// get unit conversions; the rest go through numeric normalization.
const NUTRITION_FIELD_MAPPINGS: &[(&str, &str)] = &[
    ("Energy", "Calories (kcal)"),
    ("Fat", "Total Fat (g)"),
    ("of which saturates", "Saturated Fat (g)"),
    ("Carbohydrate", "Total Carbohydrates (g)"),
    ("of which sugars", "Total Sugars (g)"),
    ("Protein", "Protein (g)"),
    ("Salt", "Sodium (mg)"),
];

/// Why a record was skipped rather than processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// No product_id/id/Product ID key with a usable value
    MissingIdentifier,
    /// No name/Product Name key with a usable value
    MissingName,
    /// The name is a placeholder token such as "N/A"
    PlaceholderName(String),
    /// The record is not a JSON object
    NotAnObject,
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::MissingIdentifier => write!(f, "product has no identifier"),
            ProcessError::MissingName => write!(f, "product has no name"),
            ProcessError::PlaceholderName(name) => {
                write!(f, "placeholder product name: {name}")
            }
            ProcessError::NotAnObject => write!(f, "record is not a JSON object"),
        }
    }
}

impl std::error::Error for ProcessError {}

/// Counts from a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
}

/// The four-stage product processing pipeline. Owns the brand registry; the
/// registry is flushed at the end of every batch.
pub struct Pipeline {
    registry: BrandRegistry,
    inference: InferenceEngine,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let registry = match &config.brands_file {
            Some(path) => BrandRegistry::load_or_default(path),
            None => BrandRegistry::with_defaults(),
        };
        Self {
            registry,
            inference: InferenceEngine::new(),
            config,
        }
    }

    /// Build a pipeline around an existing registry
    pub fn with_registry(registry: BrandRegistry, config: PipelineConfig) -> Self {
        Self {
            registry,
            inference: InferenceEngine::new(),
            config,
        }
    }

    pub fn registry(&self) -> &BrandRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BrandRegistry {
        &mut self.registry
    }

    /// Process one raw product through all four stages
    pub fn process_product(
        &mut self,
        raw: &RawProduct,
        source_name: &str,
        source_url: &str,
    ) -> Result<FinalProduct, ProcessError> {
        let product_id = raw.str_of(&["product_id", "id", "Product ID"]);
        let product_name = raw.str_of(&["name", "Product Name"]);

        if product_id.is_none() {
            return Err(ProcessError::MissingIdentifier);
        }
        let product_name = product_name.ok_or(ProcessError::MissingName)?;
        if PLACEHOLDER_NAMES.contains(&product_name.trim().to_uppercase().as_str()) {
            return Err(ProcessError::PlaceholderName(product_name));
        }

        let mut record = self.clean_and_normalize(raw);
        self.enrich(&mut record, raw);
        self.add_source_metadata(&mut record, source_name, source_url);
        Ok(enforce_schema(&record))
    }

    /// Stage 1: clean the name, resolve the brand, and map every recognized
    /// raw field into the canonical record.
    fn clean_and_normalize(&mut self, raw: &RawProduct) -> ProductRecord {
        let mut record = ProductRecord::new();
        let original_name = raw.str_of(&["name", "Product Name"]).unwrap_or_default();

        if !original_name.is_empty() {
            record.set("Product Name", clean_product_name(&original_name).into());
        }

        if let Some(id) = raw.str_of(&["product_id", "id", "Product ID"]) {
            if let Some(id) = normalize_text(&Value::String(id)) {
                record.set("Product ID", id.into());
            }
        }

        // Explicit brand wins over detection; explicit brands are learned
        let explicit_brand = raw
            .str_of(&["brand", "Brand"])
            .filter(|b| !PLACEHOLDER_NAMES.contains(&b.trim().to_uppercase().as_str()))
            .and_then(|b| normalize_text(&Value::String(b)));
        match explicit_brand {
            Some(brand) => {
                record.set("Brand", brand.clone().into());
                if self.config.learn_brands {
                    self.registry.learn_brand(&original_name, &brand);
                }
            }
            None => {
                if let Some(detected) = self.registry.detect_brand(&original_name) {
                    record.set("Brand", detected.into());
                }
            }
        }

        // Hierarchical category: "Grocery > Soft Drinks > 1.5 Ltr Bottles"
        if let Some(category_raw) = raw.str_of(&["category", "Category"]) {
            let parts: Vec<&str> = category_raw.split('>').map(str::trim).collect();
            if let Some(first) = parts.first() {
                if let Some(category) = normalize_category(&Value::String((*first).to_string())) {
                    record.set("Category", category.into());
                }
            }
            if let Some(second) = parts.get(1) {
                if let Some(sub) = normalize_text(&Value::String((*second).to_string())) {
                    record.set("Subcategory", sub.into());
                }
            }
        }

        if let Some(barcode) = raw.str_of(&["Retail Ean", "product_code", "sku"]) {
            if let Some(barcode) = normalize_text(&Value::String(barcode)) {
                record.fill("Barcode (EAN/UPC)", barcode.into());
            }
        }

        if let Some(description) = raw.str_of(&["description", "description_text"]) {
            if let Some(description) = normalize_text(&Value::String(description)) {
                record.fill("Long Description", description.into());
            }
        }
        if let Some(short) = raw.str_of(&["product"]) {
            if let Some(short) = normalize_text(&Value::String(short)) {
                record.fill("Short Description", short.into());
            }
        }
        if let Some(image) = raw.first_of(&["image"]) {
            if let Some(url) = normalize_url(image) {
                record.fill("Featured Image URL", url.into());
            }
        }

        self.map_package_size(&mut record, raw, &original_name);
        self.map_structured_nutrition(&mut record, raw);
        self.map_other_info(&mut record, raw);

        if let Some(packaging) = detect_packaging_type(&original_name) {
            record.merge_list("Tags", &[packaging.to_string()]);
        }

        self.map_description_bullets(&mut record, raw);

        record
    }

    /// Package size and liquid volume, from the explicit size field first,
    /// then from the product name
    fn map_package_size(&self, record: &mut ProductRecord, raw: &RawProduct, name: &str) {
        if let Some(size_raw) = raw.str_of(&["size", "Size"]) {
            if let Some(size) = normalize_text(&Value::String(size_raw.clone())) {
                record.fill("Package Size", size.into());
            }
            if let Some(vw) = extract_volume_weight(&size_raw) {
                if vw.kind == MeasureKind::Volume {
                    if let Some(ml) = normalize_volume(&Value::String(vw.label())) {
                        record.fill("Volume for Liquids (ml/L)", ml.into());
                    }
                }
            }
        }

        if record.is_unset("Package Size") {
            if let Some(pack_size) = extract_pack_size(name) {
                record.fill("Package Size", pack_size.into());
            }
        }
        if record.is_unset("Volume for Liquids (ml/L)") {
            if let Some(vw) = extract_volume_weight(name) {
                if vw.kind == MeasureKind::Volume {
                    if let Some(ml) = normalize_volume(&Value::String(vw.label())) {
                        record.fill("Volume for Liquids (ml/L)", ml.into());
                    }
                }
            }
        }
    }

    /// Nutrition values from the structured `ingredients_description`
    /// sub-object. Energy arrives in kJ and is converted to kcal; salt
    /// arrives in grams and is converted to mg of sodium.
    fn map_structured_nutrition(&self, record: &mut ProductRecord, raw: &RawProduct) {
        let Some(nutrition) = raw.map_of(&["ingredients_description"]) else {
            return;
        };

        for &(raw_key, schema_key) in NUTRITION_FIELD_MAPPINGS {
            let Some(value) = nutrition.get(raw_key) else {
                continue;
            };
            let converted = match raw_key {
                "Energy" => normalize_number(value).map(|kj| round1(kj / KJ_PER_KCAL)),
                "Salt" => normalize_number(value).map(|g| round1(g * SALT_TO_SODIUM_FACTOR)),
                _ => normalize_number(value),
            };
            if let Some(number) = converted {
                record.fill(schema_key, number.into());
            } else {
                debug!("Unparseable nutrition value for {}: {}", raw_key, value);
            }
        }
    }

    /// Free-from claims and certifications from the `other_info` list.
    /// "Free From X" sets the matching *-Free flag; it never enters the
    /// Allergens list (the product does not contain X).
    fn map_other_info(&self, record: &mut ProductRecord, raw: &RawProduct) {
        let Some(items) = raw.list_of(&["other_info"]) else {
            return;
        };

        for info in items.iter().filter_map(|v| v.as_str()) {
            if let Some(subject) = info.split("Free From").nth(1) {
                let subject = subject.trim();
                if subject.contains("Gluten") {
                    record.fill("Gluten-Free", true.into());
                } else if subject.contains("Milk") || subject.contains("Dairy") {
                    record.fill("Dairy-Free", true.into());
                } else if subject.contains("Egg") {
                    record.fill("Egg-Free", true.into());
                } else if subject.contains("Nut") || subject.contains("Peanut") {
                    record.fill("Nut-Free", true.into());
                } else if subject.contains("Soya") || subject.contains("Soy") {
                    record.fill("Soy-Free", true.into());
                } else if subject.contains("Shellfish") || subject.contains("Crustacean") {
                    record.fill("Shellfish-Free", true.into());
                }
            } else if info.contains("Genetically Modified") {
                record.fill("Non-GMO", true.into());
                record.merge_list("Product Certifications", &["Non-GMO".to_string()]);
            }
        }
    }

    /// Dietary keywords from the `description_bullets` list; the first
    /// matching keyword per bullet wins
    fn map_description_bullets(&self, record: &mut ProductRecord, raw: &RawProduct) {
        let Some(bullets) = raw.list_of(&["description_bullets"]) else {
            return;
        };

        for bullet in bullets.iter().filter_map(|v| v.as_str()) {
            let bullet = bullet.to_lowercase();
            if bullet.contains("vegan") {
                record.fill("Vegan", true.into());
            } else if bullet.contains("vegetarian") {
                record.fill("Vegetarian", true.into());
            } else if bullet.contains("gluten") && bullet.contains("free") {
                record.fill("Gluten-Free", true.into());
            } else if bullet.contains("organic") {
                record.fill("Organic", true.into());
            } else if bullet.contains("gmo") && bullet.contains("free") {
                record.fill("Non-GMO", true.into());
            } else if bullet.contains("no preservatives") {
                record.fill("No Preservatives", true.into());
            } else if bullet.contains("natural") {
                record.fill("Natural Ingredients", true.into());
            }
        }
    }

    /// Stage 2: description mining, then the inference rules. Extraction runs
    /// first so the dietary and allergen flags see extracted ingredients and
    /// allergens. Allergens and certifications merge as set unions;
    /// everything else fills only gaps.
    fn enrich(&self, record: &mut ProductRecord, raw: &RawProduct) {
        let description = record
            .get_str("Long Description")
            .unwrap_or_default()
            .to_string();
        let warning = raw
            .str_of(&["allergy_warning"])
            .unwrap_or_else(|| record.get_str_list("Allergens").join(", "));

        if let Some(nutrition) = extract::extract_nutrition(&description) {
            for (field, value) in nutrition {
                record.fill(field, value.into());
            }
        }

        if let Some(allergens) = extract::extract_allergens(&description, &warning) {
            record.merge_list("Allergens", &allergens);
        }

        if record.is_unset("Ingredients List") {
            if let Some(ingredients) = extract::extract_ingredients(&description) {
                record.set("Ingredients List", ingredients.into());
            }
        }

        if let Some(country) = extract::extract_country_of_origin(&description) {
            record.fill("Country of Origin", country.into());
        }

        if let Some(certifications) = extract::extract_certifications(&description) {
            record.merge_list("Product Certifications", &certifications);
        }

        if let Some(storage) = extract::extract_storage_instructions(&description) {
            record.fill("Storage Instructions", storage.into());
        }

        self.inference.apply_all(record);
    }

    /// Stage 3: stamp source tracking fields and synthesize a product ID when
    /// the source record carried none
    fn add_source_metadata(&self, record: &mut ProductRecord, source_name: &str, source_url: &str) {
        let now = Utc::now();
        record.set("Source Website Name", source_name.into());
        record.set("Source Website URL", source_url.into());
        record.set("Scraped At", now.to_rfc3339().into());

        if record.is_unset("Product ID") {
            let prefix: String = alnum_key(source_name)
                .chars()
                .take(PRODUCT_ID_PREFIX_LEN)
                .collect();
            let id = format!("{}_{}", prefix, now.format("%Y%m%d%H%M%S%6f"));
            record.set("Product ID", id.into());
        }
    }

    /// Process a list of raw records, skipping invalid ones. Returns the
    /// successfully produced records and the batch counts; the brand registry
    /// is flushed before returning.
    pub fn process_batch(
        &mut self,
        raws: &[Value],
        source_name: &str,
        source_url: &str,
    ) -> (Vec<FinalProduct>, BatchSummary) {
        let mut products = Vec::new();
        let mut summary = BatchSummary::default();

        for (index, value) in raws.iter().enumerate() {
            let outcome = match RawProduct::from_value(value.clone()) {
                Some(raw) => self.process_product(&raw, source_name, source_url),
                None => Err(ProcessError::NotAnObject),
            };
            match outcome {
                Ok(product) => {
                    products.push(product);
                    summary.processed += 1;
                }
                Err(err) => {
                    warn!("Skipping product {}: {}", index, err);
                    summary.skipped += 1;
                }
            }
        }

        self.registry.save_if_dirty();

        info!(
            "Batch from {} complete: {} processed, {} skipped",
            source_name, summary.processed, summary.skipped
        );
        (products, summary)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Per-field completeness over a processed batch: how many records carry a
/// non-null, non-empty value for each schema field, in schema order.
pub fn field_completeness(products: &[FinalProduct]) -> Vec<(&'static str, usize)> {
    crate::schema::PRODUCT_SCHEMA
        .iter()
        .map(|&field| {
            let filled = products
                .iter()
                .filter(|p| match p.get(field) {
                    None | Some(Value::Null) => false,
                    Some(Value::Array(items)) => !items.is_empty(),
                    Some(Value::String(s)) => !s.is_empty(),
                    Some(_) => true,
                })
                .count();
            (field, filled)
        })
        .collect()
}
