#[cfg(test)]
mod tests {
    use listings::brands::BrandRegistry;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("brands.json");

        let mut registry = BrandRegistry::load_or_default(&path);
        registry.add_brand("Karma Drinks");
        registry.add_variation("karma cola", "Karma Drinks");
        assert!(registry.is_dirty());
        assert!(registry.save_if_dirty());
        assert!(!registry.is_dirty());

        let reloaded = BrandRegistry::load_or_default(&path);
        assert!(reloaded.contains("Karma Drinks"));
        assert_eq!(
            reloaded.detect_brand("karma cola lemony 300ml"),
            Some("Karma Drinks".to_string())
        );
    }

    #[test]
    fn test_persisted_document_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("brands.json");

        let mut registry = BrandRegistry::load_or_default(&path);
        registry.add_brand("Zeo");
        registry.save_if_dirty();

        let content = fs::read_to_string(&path).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&content).unwrap();

        let brands = doc["brands"].as_array().unwrap();
        assert!(brands.iter().any(|b| b == "Zeo"));
        // Canonical names are sorted alphabetically
        let names: Vec<&str> = brands.iter().filter_map(|b| b.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);

        assert!(doc["brand_mapping"].is_object());
    }

    #[test]
    fn test_legacy_bare_array_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("brands.json");
        fs::write(&path, r#"["Folkington's", "Dalston's"]"#).unwrap();

        let registry = BrandRegistry::load_or_default(&path);

        assert!(registry.contains("Folkington's"));
        assert!(registry.contains("Dalston's"));
        // Seed set is still present underneath
        assert!(registry.contains("Coca-Cola"));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_seed_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("brands.json");
        fs::write(&path, "{not json at all").unwrap();

        let registry = BrandRegistry::load_or_default(&path);

        assert!(registry.brand_count() > 0);
        assert_eq!(
            registry.detect_brand("Ferrero Rocher Chocolates"),
            Some("Ferrero Rocher".to_string())
        );
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does-not-exist.json");

        let registry = BrandRegistry::load_or_default(&path);
        assert!(registry.contains("Red Bull"));
        assert!(!registry.is_dirty());
    }

    #[test]
    fn test_save_if_dirty_saves_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("brands.json");

        let mut registry = BrandRegistry::load_or_default(&path);
        registry.add_brand("Purdey's");

        assert!(registry.save_if_dirty());
        // Nothing left to save
        assert!(!registry.save_if_dirty());
    }

    #[test]
    fn test_in_memory_registry_never_saves() {
        let mut registry = BrandRegistry::with_defaults();
        registry.add_brand("Tenzing");
        // Dirty but no backing file
        assert!(!registry.save_if_dirty());
        assert!(registry.is_dirty());
    }
}
