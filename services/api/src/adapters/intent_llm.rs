//! services/api/src/adapters/intent_llm.rs
//!
//! This module contains the adapter that decides whether a chat message is
//! about the image or about the caption.
//! It implements the `IntentClassificationService` port from the `core` crate.

const ROUTER_TEMPLATE: &str = r#"Analyze the user's request: "{request}". Does the user want to change the image (e.g., "add a cat", "make it brighter", "change the background") or just the text of the social media post (e.g., "make it funnier", "add more hashtags", "write a shorter caption")?
Respond with only the word 'IMAGE' if they want to change the visual content, or only the word 'TEXT' if they only want to change the written content."#;

use crate::adapters::gemini::{GeminiClient, GenerateContentRequest, GenerationConfig, Part};
use async_trait::async_trait;
use palazzo_core::intent::Intent;
use palazzo_core::ports::{IntentClassificationService, PortResult};
use tracing::info;

#[derive(Clone)]
pub struct GeminiIntentAdapter {
    client: GeminiClient,
    model: String,
}

impl GeminiIntentAdapter {
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl IntentClassificationService for GeminiIntentAdapter {
    async fn classify_intent(&self, text: &str) -> PortResult<Intent> {
        let request = GenerateContentRequest::from_parts(vec![Part::text(
            ROUTER_TEMPLATE.replace("{request}", text),
        )])
        .with_config(GenerationConfig::deterministic());

        let response = self.client.generate_content(&self.model, &request).await?;
        let raw = response.text();
        info!("Intent classifier answered '{}'", raw.trim());
        Ok(Intent::from_response(&raw))
    }
}
