#[cfg(test)]
mod tests {
    use listings::config::PipelineConfig;
    use listings::pipeline::{Pipeline, ProcessError};
    use listings::record::RawProduct;
    use listings::schema::PRODUCT_SCHEMA;
    use serde_json::{json, Value};

    fn pipeline() -> Pipeline {
        Pipeline::new(PipelineConfig::default())
    }

    fn raw(value: Value) -> RawProduct {
        RawProduct::from_value(value).unwrap()
    }

    #[test]
    fn test_end_to_end_energy_drink() {
        let mut pipeline = pipeline();
        let product = raw(json!({
            "id": "1",
            "name": "Red Bull Energy Drink 250ml PMP £1.29",
            "brand": null
        }));

        let out = pipeline
            .process_product(&product, "Bestway", "https://www.bestwaywholesale.co.uk")
            .unwrap();

        assert_eq!(out["Product Name"], json!("Red Bull Energy Drink"));
        assert_eq!(out["Brand"], json!("Red Bull"));
        assert_eq!(out["Package Size"], json!("250ml"));
        assert_eq!(out["Source Website Name"], json!("Bestway"));
        assert!(out["Scraped At"].is_string());
    }

    #[test]
    fn test_schema_closure_for_arbitrary_input() {
        let mut pipeline = pipeline();
        let product = raw(json!({
            "id": "weird-1",
            "name": "Thing 100g",
            "unexpected_key": {"nested": [1, 2, 3]},
            "another": "value"
        }));

        let out = pipeline.process_product(&product, "S", "https://s").unwrap();

        assert_eq!(out.len(), PRODUCT_SCHEMA.len());
        let keys: Vec<&str> = out.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, PRODUCT_SCHEMA.to_vec());
        assert!(!out.contains_key("unexpected_key"));
    }

    #[test]
    fn test_whey_ingredient_infers_milk_and_vegan_rules() {
        let mut pipeline = pipeline();
        let product = raw(json!({
            "id": "2",
            "name": "Protein Shake Mix 500g",
            "description": "Ingredients: whey protein concentrate, cocoa powder, sweetener. \
                Store in a cool dry place."
        }));

        let out = pipeline.process_product(&product, "S", "https://s").unwrap();

        let allergens = out["Allergens"].as_array().unwrap();
        assert!(allergens.contains(&json!("Milk")));
        assert_eq!(out["Contains Milk"], json!(true));
    }

    #[test]
    fn test_clean_ingredients_infer_vegan() {
        let mut pipeline = pipeline();
        let product = raw(json!({
            "id": "3",
            "name": "Fruit Snack Bar 35g",
            "description": "Ingredients: dates, raisins, cocoa, rice crisps."
        }));

        let out = pipeline.process_product(&product, "S", "https://s").unwrap();

        assert_eq!(out["Vegan"], json!(true));
    }

    #[test]
    fn test_description_mining_fills_fields() {
        let mut pipeline = pipeline();
        let product = raw(json!({
            "id": "4",
            "name": "Tomato Pasta Sauce Jar 350g",
            "description": "Made in Italy. Energy: 45kcal, Fat: 1.1g, of which sugars: 6.2g, \
                Salt: 0.7g per 100g. Storage: refrigerate after opening and eat within 3 days."
        }));

        let out = pipeline.process_product(&product, "S", "https://s").unwrap();

        assert_eq!(out["Country of Origin"], json!("Italy"));
        assert_eq!(out["Calories (kcal)"], json!(45.0));
        assert_eq!(out["Total Fat (g)"], json!(1.1));
        assert_eq!(out["Total Sugars (g)"], json!(6.2));
        assert_eq!(out["Sodium (mg)"], json!(280.0));
        assert_eq!(
            out["Storage Instructions"],
            json!("refrigerate after opening and eat within 3 days")
        );
    }

    #[test]
    fn test_fill_dont_overwrite_is_honored() {
        let mut pipeline = pipeline();
        let product = raw(json!({
            "id": "5",
            "name": "Nescafe Original Coffee 200g",
            "brand": "Shopkeeper's Choice",
            "category": "Coffee & Tea",
            "description": "The nation's favourite instant coffee."
        }));

        let out = pipeline.process_product(&product, "S", "https://s").unwrap();

        assert_eq!(out["Brand"], json!("Shopkeeper's Choice"));
        assert_eq!(out["Category"], json!("Coffee & Tea"));
    }

    #[test]
    fn test_allergen_merge_is_set_union() {
        let mut pipeline = pipeline();
        let product = raw(json!({
            "id": "6",
            "name": "Chocolate Hazelnut Spread 400g",
            "description": "Ingredients: sugar, hazelnuts, cocoa, skimmed milk powder.",
            "allergy_warning": "May contain other tree nuts and soya"
        }));

        let out = pipeline.process_product(&product, "S", "https://s").unwrap();

        let allergens: Vec<&str> = out["Allergens"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();

        assert!(allergens.contains(&"Tree Nuts"));
        assert!(allergens.contains(&"Milk"));
        assert!(allergens.contains(&"Soy"));
        // Sorted, de-duplicated union
        let mut sorted = allergens.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(allergens, sorted);
        assert_eq!(out["Nut-Free"], json!(false));
        assert_eq!(out["Contains Tree Nuts"], json!(true));
    }

    #[test]
    fn test_batch_skips_malformed_records() {
        let mut pipeline = pipeline();
        let raws = vec![
            json!({"id": "1", "name": "Fanta Orange 330ml"}),
            json!(42),
            json!({"name": "Missing Identifier 500ml"}),
            json!({"id": "2", "name": "NONE"}),
            json!({"id": "3", "name": "Sprite 330ml"}),
            json!({"id": "4", "name": "Tango Apple 330ml"}),
        ];

        let (products, summary) = pipeline.process_batch(&raws, "S", "https://s");

        assert_eq!(products.len(), 3);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.skipped, 3);
        for product in &products {
            assert_eq!(product.len(), PRODUCT_SCHEMA.len());
        }
    }

    #[test]
    fn test_placeholder_name_error_reporting() {
        let mut pipeline = pipeline();
        let product = raw(json!({"id": "1", "name": "null"}));
        match pipeline.process_product(&product, "S", "https://s") {
            Err(ProcessError::PlaceholderName(name)) => assert_eq!(name, "null"),
            other => panic!("expected placeholder skip, got {:?}", other),
        }
    }

    #[test]
    fn test_source_metadata_stamping() {
        let mut pipeline = pipeline();
        let product = raw(json!({"id": "abc-123", "name": "Oasis Summer Fruits 500ml"}));

        let out = pipeline
            .process_product(&product, "Laxmi Wholesale", "https://laxmi.example")
            .unwrap();

        assert_eq!(out["Product ID"], json!("abc-123"));
        assert_eq!(out["Source Website Name"], json!("Laxmi Wholesale"));
        assert_eq!(out["Source Website URL"], json!("https://laxmi.example"));
        let stamp = out["Scraped At"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn test_multipack_title_yields_pack_size() {
        let mut pipeline = pipeline();
        let product = raw(json!({
            "id": "7",
            "name": "Nescafe Cappuccino Sachets 7 x 14.2g"
        }));

        let out = pipeline.process_product(&product, "S", "https://s").unwrap();

        assert_eq!(out["Package Size"], json!("7x14.2g"));
        assert_eq!(out["Product Name"], json!("Nescafe Cappuccino Sachets"));
    }
}
