//! # Brand Registry Module
//!
//! A JSON-file-backed registry of known brand names and their spelling
//! variations, with auto-learning of newly confirmed brands.
//!
//! ## Features
//!
//! - Variation lookup ("redbull" → "Red Bull") by case-insensitive substring
//! - Whole-word canonical matching, longest name first, so "Ferrero Rocher"
//!   wins over "Ferrero"
//! - Learning: explicitly-provided brands are added and persisted
//! - Persistence to a single JSON document; a bare JSON array is accepted on
//!   load as the legacy canonical-only format
//!
//! Persistence failures never surface to callers: a failed load falls back to
//! the built-in seed set, a failed save is logged and the registry stays
//! dirty for the next attempt.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use serde_json::{json, Value};

/// Built-in canonical brand names used to seed a fresh registry
const DEFAULT_BRANDS: &[&str] = &[
    // Soft drinks
    "Coca-Cola", "Pepsi", "PepsiCo", "Fanta", "Sprite", "7UP", "Dr Pepper",
    "Mountain Dew", "Schweppes", "Tango", "Irn-Bru", "Ribena", "Vimto",
    "Robinsons", "Oasis", "Tropicana", "Capri-Sun", "Fruit Shoot",
    "Starbucks", "Costa Coffee", "Rubicon", "Appletiser",
    // Energy drinks
    "Red Bull", "Monster Energy", "Monster", "Lucozade", "Relentless",
    "Rockstar", "Prime", "Boost", "Emerge", "Reign", "Celsius", "Nestle",
    "Nescafe", "Alpro", "Lipton", "Fever-Tree", "Cawston Press", "Barr",
    "London Essence",
    // Water & sports drinks
    "Evian", "Volvic", "Highland Spring", "Buxton", "Perrier",
    "San Pellegrino", "Powerade", "Gatorade",
    // Confectionery & chocolate
    "Galaxy", "Mars", "Snickers", "Twix", "Milky Way", "Maltesers", "Lindt",
    "Ferrero Rocher", "Ferrero", "Kinder", "Haribo", "Maynards", "Bassetts",
    "Rowntree's", "Skittles", "Starburst", "Double Decker", "Reese's",
    "Hershey's", "Oreo", "Toblerone", "Terry's", "Quality Street",
    "Celebrations", "Roses", "Heroes",
    // Other
    "Copella", "Ocean Spray", "Princes", "Del Monte", "Heinz", "Pipers",
];

/// Built-in spelling variations and the canonical brand each maps to
const DEFAULT_VARIATIONS: &[(&str, &str)] = &[
    ("coca cola", "Coca-Cola"),
    ("coke", "Coca-Cola"),
    ("7-up", "7UP"),
    ("seven up", "7UP"),
    ("dr. pepper", "Dr Pepper"),
    ("mtn dew", "Mountain Dew"),
    ("irn bru", "Irn-Bru"),
    ("redbull", "Red Bull"),
    ("capri sun", "Capri-Sun"),
    ("s.pellegrino", "San Pellegrino"),
    ("reeses", "Reese's"),
    ("rowntrees", "Rowntree's"),
    ("hersheys", "Hershey's"),
    ("terrys", "Terry's"),
];

lazy_static! {
    static ref NON_ALNUM_RE: Regex = Regex::new(r"[^a-z0-9]").unwrap();
}

/// Registry of canonical brand names and their spelling variations
#[derive(Debug)]
pub struct BrandRegistry {
    /// Canonical brand names
    brands: BTreeSet<String>,
    /// Lowercased variation → canonical brand name. Every value is a member
    /// of `brands`.
    variations: BTreeMap<String, String>,
    /// Canonical names sorted longest-first with compiled word-boundary
    /// matchers, rebuilt on mutation
    matchers: Vec<(String, Regex)>,
    /// Backing file, when persisted
    path: Option<PathBuf>,
    /// Unsaved mutations pending
    dirty: bool,
}

impl BrandRegistry {
    /// An empty, in-memory registry
    pub fn new() -> Self {
        Self {
            brands: BTreeSet::new(),
            variations: BTreeMap::new(),
            matchers: Vec::new(),
            path: None,
            dirty: false,
        }
    }

    /// A registry seeded with the built-in brand list and variation map
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for brand in DEFAULT_BRANDS {
            registry.brands.insert((*brand).to_string());
        }
        for (variation, canonical) in DEFAULT_VARIATIONS {
            registry.brands.insert((*canonical).to_string());
            registry
                .variations
                .insert((*variation).to_string(), (*canonical).to_string());
        }
        registry.rebuild_matchers();
        registry
    }

    /// Load a registry from a JSON file, layered over the built-in seed set.
    /// Read or parse failures are logged and yield the seed set alone; the
    /// registry stays bound to the path for later saves either way.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut registry = Self::with_defaults();
        registry.path = Some(path.to_path_buf());

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!(
                    "Could not read brands file {}: {} (starting from seed set)",
                    path.display(),
                    err
                );
                return registry;
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(items)) => {
                // Legacy format: a bare list of canonical names
                for item in items.iter().filter_map(|v| v.as_str()) {
                    registry.brands.insert(item.to_string());
                }
            }
            Ok(Value::Object(map)) => {
                if let Some(items) = map.get("brands").and_then(|v| v.as_array()) {
                    for item in items.iter().filter_map(|v| v.as_str()) {
                        registry.brands.insert(item.to_string());
                    }
                }
                if let Some(mapping) = map.get("brand_mapping").and_then(|v| v.as_object()) {
                    for (variation, canonical) in mapping {
                        if let Some(canonical) = canonical.as_str() {
                            registry.brands.insert(canonical.to_string());
                            registry
                                .variations
                                .insert(variation.to_lowercase(), canonical.to_string());
                        }
                    }
                }
            }
            Ok(_) | Err(_) => {
                warn!(
                    "Brands file {} is not valid JSON (starting from seed set)",
                    path.display()
                );
            }
        }

        registry.rebuild_matchers();
        info!(
            "Brand registry loaded: {} brands, {} variations",
            registry.brands.len(),
            registry.variations.len()
        );
        registry
    }

    fn rebuild_matchers(&mut self) {
        let mut ordered: Vec<&String> = self.brands.iter().collect();
        // Longest first so more specific names win; alphabetical to break ties
        ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        self.matchers = ordered
            .into_iter()
            .filter_map(|brand| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(brand));
                Regex::new(&pattern).ok().map(|re| (brand.clone(), re))
            })
            .collect();
    }

    /// Detect the brand mentioned in a piece of text. Known variations are
    /// checked first as case-insensitive substrings; canonical names are then
    /// matched whole-word, longest name first.
    pub fn detect_brand(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }

        let text_lower = text.to_lowercase();
        for (variation, canonical) in &self.variations {
            if text_lower.contains(variation.as_str()) {
                debug!("Brand variation '{}' matched → {}", variation, canonical);
                return Some(canonical.clone());
            }
        }

        for (brand, re) in &self.matchers {
            if re.is_match(text) {
                return Some(brand.clone());
            }
        }

        None
    }

    /// Detect every brand mentioned in a piece of text, de-duplicated by
    /// canonical name, in discovery order.
    pub fn detect_all_brands(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut found = Vec::new();
        let text_lower = text.to_lowercase();

        for (variation, canonical) in &self.variations {
            if text_lower.contains(variation.as_str()) && !found.contains(canonical) {
                found.push(canonical.clone());
            }
        }

        for (brand, re) in &self.matchers {
            if re.is_match(text) {
                let canonical = self
                    .variations
                    .get(&brand.to_lowercase())
                    .unwrap_or(brand)
                    .clone();
                if !found.contains(&canonical) {
                    found.push(canonical);
                }
            }
        }

        found
    }

    /// Add a canonical brand. Returns false when it is already known.
    pub fn add_brand(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.brands.contains(name) {
            return false;
        }
        self.brands.insert(name.to_string());
        self.rebuild_matchers();
        self.dirty = true;
        true
    }

    /// Register a spelling variation of a canonical brand, adding the
    /// canonical name itself when missing. Returns false when the variation
    /// is already mapped.
    pub fn add_variation(&mut self, variation: &str, canonical: &str) -> bool {
        let key = variation.trim().to_lowercase();
        if key.is_empty() || self.variations.contains_key(&key) {
            return false;
        }
        if self.brands.insert(canonical.trim().to_string()) {
            self.rebuild_matchers();
        }
        self.variations.insert(key, canonical.trim().to_string());
        self.dirty = true;
        true
    }

    /// Learn a brand confirmed by upstream data: register it as canonical and
    /// persist immediately when it is new. Returns whether anything was
    /// learned.
    pub fn learn_brand(&mut self, product_text: &str, confirmed_brand: &str) -> bool {
        if !self.add_brand(confirmed_brand) {
            return false;
        }
        debug!(
            "Learned brand '{}' from product '{}'",
            confirmed_brand, product_text
        );
        self.save_if_dirty();
        true
    }

    /// Persist the registry to its backing file: canonical brands sorted
    /// alphabetically, the variation map sorted by key, one JSON document.
    pub fn save(&self) -> Result<()> {
        let path = self
            .path
            .as_ref()
            .context("brand registry has no backing file")?;

        let document = json!({
            "brands": self.brands.iter().collect::<Vec<_>>(),
            "brand_mapping": &self.variations,
        });
        let content =
            serde_json::to_string_pretty(&document).context("Failed to serialize brands")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write brands file {}", path.display()))?;

        info!(
            "Brand registry saved to {} ({} brands)",
            path.display(),
            self.brands.len()
        );
        Ok(())
    }

    /// Flush to disk when there are unsaved mutations and a backing file.
    /// Returns whether a save happened; failures are logged, not raised.
    pub fn save_if_dirty(&mut self) -> bool {
        if !self.dirty || self.path.is_none() {
            return false;
        }
        match self.save() {
            Ok(()) => {
                self.dirty = false;
                true
            }
            Err(err) => {
                warn!("Brand registry save failed: {:#}", err);
                false
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn brand_count(&self) -> usize {
        self.brands.len()
    }

    pub fn variation_count(&self) -> usize {
        self.variations.len()
    }

    pub fn contains(&self, brand: &str) -> bool {
        self.brands.contains(brand)
    }
}

impl Default for BrandRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Lowercased alphanumeric-only view of a name, used for ID prefixes
pub fn alnum_key(name: &str) -> String {
    NON_ALNUM_RE.replace_all(&name.to_lowercase(), "").to_string()
}
