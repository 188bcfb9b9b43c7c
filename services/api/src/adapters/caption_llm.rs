//! services/api/src/adapters/caption_llm.rs
//!
//! This module contains the adapter for the social caption writer.
//! It implements the `CaptionService` port from the `core` crate.

const CAPTION_TEMPLATE: &str = r#"Based on the provided image, write a short and engaging social media post.
The user's desired style is "{style}" and their prompt was "{prompt}".
The post should be suitable for platforms like Instagram. Include a catchy caption and 3-5 relevant hashtags.
Keep the tone upbeat and professional, aligned with the visual style of the image. Just return the text for the post, nothing else."#;

const REWRITE_TEMPLATE: &str = r#"Based on the provided image and the user's latest request ("{instruction}"), rewrite the social media post.
The post should be short, engaging, suitable for platforms like Instagram, and include a catchy caption and relevant hashtags.
Keep the tone upbeat and professional, aligned with the visual. Just return the text for the post."#;

const RECAPTION_TEMPLATE: &str = r#"Based on the newly edited image and the user's latest request ("{instruction}"), rewrite the social media post.
The post should be short, engaging, suitable for platforms like Instagram, and include a catchy caption and relevant hashtags.
Keep the tone upbeat and professional, aligned with the new visual. Just return the text for the post."#;

use crate::adapters::gemini::{GeminiClient, GenerateContentRequest, Part};
use async_trait::async_trait;
use palazzo_core::domain::ImageData;
use palazzo_core::ports::{CaptionService, PortResult};
use std::time::Instant;
use tracing::info;

/// An adapter that implements `CaptionService` using a Gemini text model.
#[derive(Clone)]
pub struct GeminiCaptionAdapter {
    client: GeminiClient,
    model: String,
}

impl GeminiCaptionAdapter {
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }

    async fn write(&self, image: &ImageData, instruction: String) -> PortResult<String> {
        let request =
            GenerateContentRequest::from_parts(vec![Part::image(image), Part::text(instruction)]);

        let start = Instant::now();
        let caption = self
            .client
            .generate_content(&self.model, &request)
            .await?
            .into_text()?;
        info!("⏱️ Caption took: {:?}", start.elapsed());
        Ok(caption)
    }
}

#[async_trait]
impl CaptionService for GeminiCaptionAdapter {
    async fn generate_caption(
        &self,
        image: &ImageData,
        style: &str,
        prompt: &str,
    ) -> PortResult<String> {
        let prompt = if prompt.trim().is_empty() { "None" } else { prompt };
        let instruction = CAPTION_TEMPLATE
            .replace("{style}", style)
            .replace("{prompt}", prompt);
        self.write(image, instruction).await
    }

    async fn rewrite_caption(&self, image: &ImageData, instruction: &str) -> PortResult<String> {
        self.write(image, REWRITE_TEMPLATE.replace("{instruction}", instruction))
            .await
    }

    async fn recaption_edit(&self, edited: &ImageData, instruction: &str) -> PortResult<String> {
        self.write(edited, RECAPTION_TEMPLATE.replace("{instruction}", instruction))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recaption_prompt_refers_to_the_edited_image() {
        let prompt = RECAPTION_TEMPLATE.replace("{instruction}", "add a cat");
        assert!(prompt.starts_with("Based on the newly edited image"));
        assert!(prompt.contains("(\"add a cat\")"));
        assert!(prompt.contains("aligned with the new visual"));
    }

    #[test]
    fn rewrite_prompt_keeps_the_current_image_wording() {
        let prompt = REWRITE_TEMPLATE.replace("{instruction}", "make it funnier");
        assert!(prompt.starts_with("Based on the provided image"));
        assert!(prompt.contains("(\"make it funnier\")"));
    }
}
