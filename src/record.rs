//! # Product Record Types
//!
//! Working representations for the pipeline: the raw scraper output with no
//! guaranteed shape, and the canonical record that accumulates normalized
//! fields stage by stage.
//!
//! ## Core Concepts
//!
//! - **RawProduct**: an arbitrary string-keyed JSON mapping from a scraper.
//!   Field access goes through explicit try-these-keys-in-order accessors so
//!   missing-field handling stays visible and testable.
//! - **ProductRecord**: the canonical working record, keyed by schema field
//!   names. Mutators encode the fill-don't-overwrite enrichment policy: a
//!   field set by an earlier stage is never replaced by a later one, except
//!   for explicit set-union merges (allergens, certifications).

use serde_json::{Map, Value};

/// A raw product record as handed over by a scraper
#[derive(Debug, Clone, Default)]
pub struct RawProduct(Map<String, Value>);

impl RawProduct {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Accept any JSON value; non-objects yield None
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// First non-null value among the given keys, tried in order
    pub fn first_of(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .find(|v| !v.is_null())
    }

    /// First key that resolves to a non-empty string, rendered as owned text.
    /// Numbers and booleans are stringified; lists, objects, and empty
    /// strings are skipped in favor of later keys.
    pub fn str_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .find_map(value_to_text)
    }

    /// First key that resolves to a list of values
    pub fn list_of(&self, keys: &[&str]) -> Option<&Vec<Value>> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .find_map(|v| v.as_array())
    }

    /// First key that resolves to a nested mapping
    pub fn map_of(&self, keys: &[&str]) -> Option<&Map<String, Value>> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .find_map(|v| v.as_object())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }
}

/// Render a scalar JSON value as text, None for empty strings and non-scalars
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The canonical working record, mutated in place through the pipeline stages
#[derive(Debug, Clone, Default)]
pub struct ProductRecord(Map<String, Value>);

impl ProductRecord {
    /// A fresh, empty record. One is allocated per pipeline invocation; the
    /// working state is never shared between products.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Get a field, treating an explicit null the same as an absent field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    /// Get a field including explicit nulls (used by schema enforcement)
    pub fn raw_get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Whether the field currently has no usable value
    pub fn is_unset(&self, field: &str) -> bool {
        self.get(field).is_none()
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(|v| v.as_str())
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(|v| v.as_f64())
    }

    pub fn get_list(&self, field: &str) -> Option<&Vec<Value>> {
        self.get(field).and_then(|v| v.as_array())
    }

    /// String items of a list field
    pub fn get_str_list(&self, field: &str) -> Vec<String> {
        self.get_list(field)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Unconditional write. Stage-internal use only; enrichment goes through
    /// `fill` and `merge_list`.
    pub fn set(&mut self, field: &str, value: Value) {
        self.0.insert(field.to_string(), value);
    }

    /// Write only when the field is currently unset. Returns whether the
    /// value was written. Null values are never written.
    pub fn fill(&mut self, field: &str, value: Value) -> bool {
        if value.is_null() || !self.is_unset(field) {
            return false;
        }
        self.0.insert(field.to_string(), value);
        true
    }

    /// Set-union merge for accumulating list fields (allergens,
    /// certifications): existing items are kept, new ones appended,
    /// duplicates dropped, output sorted.
    pub fn merge_list(&mut self, field: &str, items: &[String]) {
        if items.is_empty() {
            return;
        }
        let mut merged = self.get_str_list(field);
        for item in items {
            if !merged.iter().any(|existing| existing == item) {
                merged.push(item.clone());
            }
        }
        merged.sort();
        let values = merged.into_iter().map(Value::String).collect();
        self.0.insert(field.to_string(), Value::Array(values));
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}
