//! services/api/src/adapters/items_llm.rs
//!
//! This module contains the adapter that lists the furniture in a design.
//! It implements the `ItemExtractionService` port from the `core` crate.

const ITEM_LIST_PROMPT: &str = "Analyze the provided image of a decorated room. Identify up to 8 key furniture and decor items. For each item, provide a descriptive name, an estimated price range, its dominant color, a short description, estimated dimensions, key materials, and relevant style tags. Return this information as a valid JSON array of objects.";

use crate::adapters::gemini::{GeminiClient, GenerateContentRequest, GenerationConfig, Part};
use async_trait::async_trait;
use palazzo_core::domain::{ImageData, PartialItem};
use palazzo_core::ports::{ItemExtractionService, PortError, PortResult};
use serde_json::{json, Map, Value};
use std::time::Instant;
use tracing::{error, info};

/// The response shape the model is asked to follow.
fn item_list_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING", "description": "Descriptive name of the furniture or decor item." },
                "price": { "type": "STRING", "description": "An estimated, plausible price range for the item (e.g., \"$400 - $600\")." },
                "color": { "type": "STRING", "description": "The dominant color of the item (e.g., \"Natural Oak\")." },
                "description": { "type": "STRING", "description": "A brief, engaging one-sentence description of the item." },
                "dimensions": { "type": "STRING", "description": "Estimated dimensions of the item (e.g., \"W: 85\\\" x D: 38\\\" x H: 35\\\"\")." },
                "materials": { "type": "ARRAY", "items": { "type": "STRING" }, "description": "A list of key materials (e.g., [\"Oak wood\", \"Leather\"])." },
                "styleTags": { "type": "ARRAY", "items": { "type": "STRING" }, "description": "A list of relevant style tags (e.g., [\"Modern\", \"Minimalist\"])." }
            },
            "required": ["name", "price", "color", "description", "dimensions", "materials", "styleTags"]
        }
    })
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct GeminiItemsAdapter {
    client: GeminiClient,
    model: String,
}

impl GeminiItemsAdapter {
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `ItemExtractionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ItemExtractionService for GeminiItemsAdapter {
    async fn extract_items(&self, image: &ImageData) -> PortResult<Vec<PartialItem>> {
        let request =
            GenerateContentRequest::from_parts(vec![Part::image(image), Part::text(ITEM_LIST_PROMPT)])
                .with_config(GenerationConfig::json(item_list_schema()));

        let start = Instant::now();
        let response = self.client.generate_content(&self.model, &request).await?;
        let raw = response.text();
        info!("⏱️ Item listing took: {:?}", start.elapsed());

        parse_item_list(&raw).map_err(|e| {
            error!("Failed to parse furniture list JSON: {}", raw);
            e
        })
    }
}

/// Turns the model's JSON answer into partial items, in the order given.
/// Missing or mistyped fields fall back to readable placeholders.
pub fn parse_item_list(raw: &str) -> PortResult<Vec<PartialItem>> {
    let value: Value = serde_json::from_str(raw.trim()).map_err(|_| {
        PortError::ParseFailed("Could not parse the furniture list from the AI response.".to_string())
    })?;

    let Value::Array(entries) = value else {
        return Err(PortError::ParseFailed(
            "AI response for furniture list was not an array.".to_string(),
        ));
    };

    let empty = Map::new();
    Ok(entries
        .iter()
        .map(|entry| {
            let fields = entry.as_object().unwrap_or(&empty);
            PartialItem {
                name: string_field(fields, "name", "Unnamed Item"),
                price_estimate: string_field(fields, "price", "N/A"),
                color: string_field(fields, "color", "N/A"),
                description: string_field(fields, "description", "No description available."),
                dimensions: string_field(fields, "dimensions", "Not available"),
                materials: list_field(fields, "materials"),
                style_tags: list_field(fields, "styleTags"),
            }
        })
        .collect())
}

fn string_field(fields: &Map<String, Value>, key: &str, fallback: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn list_field(fields: &Map<String, Value>, key: &str) -> Vec<String> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
