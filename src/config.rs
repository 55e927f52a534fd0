//! # Pipeline Configuration Module
//!
//! Constants and configuration structures shared across the normalization
//! pipeline.

use std::path::PathBuf;

/// Grams of salt to milligrams of sodium (sodium is ~40% of salt by mass)
pub const SALT_TO_SODIUM_FACTOR: f64 = 400.0;
/// Kilojoules per kilocalorie
pub const KJ_PER_KCAL: f64 = 4.184;
/// Maximum number of items kept from an extracted ingredients list
pub const MAX_INGREDIENT_ITEMS: usize = 30;
/// Maximum length of extracted storage instructions, in characters
pub const MAX_STORAGE_LEN: usize = 200;
/// Minimum digit run at the end of a title treated as an embedded barcode
pub const BARCODE_MIN_DIGITS: usize = 10;
/// Maximum slug length; longer slugs are cut back to a hyphen boundary
pub const SLUG_MAX_LENGTH: usize = 100;
/// Characters of the source name used as a synthesized product ID prefix
pub const PRODUCT_ID_PREFIX_LEN: usize = 3;

/// Configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Backing file for the brand registry. None keeps the registry in memory.
    pub brands_file: Option<PathBuf>,
    /// Whether explicitly-provided brands are learned into the registry
    pub learn_brands: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            brands_file: None,
            learn_brands: true,
        }
    }
}

impl PipelineConfig {
    /// Configuration with a JSON-backed brand registry
    pub fn with_brands_file(path: impl Into<PathBuf>) -> Self {
        Self {
            brands_file: Some(path.into()),
            ..Default::default()
        }
    }
}
