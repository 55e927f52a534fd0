use std::env;
use std::fs;

use anyhow::{Context, Result};
use log::info;
use serde_json::Value;

use listings::config::PipelineConfig;
use listings::pipeline::{field_completeness, Pipeline};

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let input_file = env::var("INPUT_FILE").expect("INPUT_FILE must be set");
    let output_file = env::var("OUTPUT_FILE").unwrap_or_else(|_| "master_products.json".into());
    let source_name = env::var("SOURCE_NAME").expect("SOURCE_NAME must be set");
    let source_url = env::var("SOURCE_URL").expect("SOURCE_URL must be set");

    info!("Processing {} from {}", input_file, source_name);

    let content = fs::read_to_string(&input_file)
        .with_context(|| format!("Failed to read input file {input_file}"))?;
    let data: Value =
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {input_file}"))?;

    // Accept a bare array or a {"products": [...]} wrapper
    let raw_products: Vec<Value> = match data {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("products") {
            Some(Value::Array(items)) => items,
            _ => vec![Value::Object(map)],
        },
        _ => anyhow::bail!("Invalid JSON format: expected list or object"),
    };

    info!("Loaded {} raw products", raw_products.len());

    let config = match env::var("BRANDS_FILE") {
        Ok(path) => PipelineConfig::with_brands_file(path),
        Err(_) => PipelineConfig::default(),
    };
    let mut pipeline = Pipeline::new(config);

    let (products, summary) = pipeline.process_batch(&raw_products, &source_name, &source_url);

    let output = serde_json::to_string_pretty(&products).context("Failed to serialize output")?;
    fs::write(&output_file, output)
        .with_context(|| format!("Failed to write output file {output_file}"))?;

    // The batch flushes the registry itself; this covers the no-batch path
    pipeline.registry_mut().save_if_dirty();

    info!(
        "Done: {} processed, {} skipped, written to {}",
        summary.processed, summary.skipped, output_file
    );

    for (field, count) in field_completeness(&products).iter().take(15) {
        info!("  {}: {}/{}", field, count, products.len());
    }

    Ok(())
}
