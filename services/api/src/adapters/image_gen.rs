//! services/api/src/adapters/image_gen.rs
//!
//! This module contains the adapter for the image model.
//! It implements the `ImageGenerationService` and `ProductPhotoService` ports
//! from the `core` crate.

const STAGING_TEMPLATE: &str = r#"You are an expert interior designer AI. A user has provided an image of an empty or sparsely furnished room.
Your task is to completely restage the room based on the user's desired style.
**Desired Style:** {style}.
**Additional User Instructions:** {prompt}.
**Strictly preserve the original room's architecture: walls, windows, doors, and flooring must remain unchanged.**
Generate a new, photorealistic image of the room fully furnished and decorated in the specified style."#;

const CONTENT_TEMPLATE: &str = r#"You are a creative AI content designer. A user has provided an image and wants to enhance it.
Your task is to creatively reinterpret and enhance the provided image based on the user's desired style.
**Desired Style:** {style}.
**Additional User Instructions:** {prompt}.
Generate a new, visually appealing image that aligns with the requested style.
Preserve the core subject of the original image, but feel free to add stylistic elements that enhance the theme."#;

const INTERIOR_EDIT_TEMPLATE: &str = r#"You are an expert interior designer AI. Your task is to modify the provided image of a staged room based on a user's text request.
**Strictly preserve the original room's architecture, including walls, windows, doors, and flooring.**
Apply the following change: "{instruction}".
Only change what is requested and keep the rest of the image content and style as close to the original as possible.
Generate a new photorealistic image reflecting this single change."#;

const CONTENT_EDIT_TEMPLATE: &str = r#"You are a creative AI content designer. Your task is to modify the provided image based on a user's text request.
Apply the following change: "{instruction}".
Only change what is requested and keep the rest of the image content and style as close to the original as possible.
Generate a new, visually appealing image reflecting this single change."#;

const PRODUCT_PHOTO_TEMPLATE: &str = r#"Generate a photorealistic product image of a single "{item}" on a plain, neutral light grey background. The item should be centered and well-lit."#;

use crate::adapters::gemini::{GeminiClient, GenerateContentRequest, GenerationConfig, Part};
use async_trait::async_trait;
use palazzo_core::domain::{DesignMode, ImageData};
use palazzo_core::ports::{ImageGenerationService, PortResult, ProductPhotoService};
use std::time::Instant;
use tracing::{info, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that generates and edits images with a Gemini image model.
#[derive(Clone)]
pub struct GeminiImageAdapter {
    client: GeminiClient,
    model: String,
}

impl GeminiImageAdapter {
    /// Creates a new `GeminiImageAdapter`.
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }

    /// Sends the optional input image and the instruction, and expects an image back.
    async fn render(&self, input: Option<&ImageData>, instruction: String) -> PortResult<ImageData> {
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = input {
            parts.push(Part::image(image));
        }
        parts.push(Part::text(instruction));

        let request =
            GenerateContentRequest::from_parts(parts).with_config(GenerationConfig::image_only());

        let start = Instant::now();
        let response = self.client.generate_content(&self.model, &request).await?;
        let image = response.into_image()?;
        info!(
            "⏱️ Image model returned {} bytes in {:?}",
            image.len(),
            start.elapsed()
        );
        Ok(image)
    }
}

/// An empty custom prompt is spelled out so the model does not invent one.
fn prompt_or_none(prompt: &str) -> &str {
    if prompt.trim().is_empty() {
        "None"
    } else {
        prompt
    }
}

fn styled_prompt(template: &str, style: &str, prompt: &str) -> String {
    template
        .replace("{style}", style)
        .replace("{prompt}", prompt_or_none(prompt))
}

fn edit_prompt(mode: DesignMode, instruction: &str) -> String {
    let template = match mode {
        DesignMode::Interior => INTERIOR_EDIT_TEMPLATE,
        DesignMode::Content => CONTENT_EDIT_TEMPLATE,
    };
    template.replace("{instruction}", instruction)
}

//=========================================================================================
// `ImageGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ImageGenerationService for GeminiImageAdapter {
    async fn stage_image(
        &self,
        source: &ImageData,
        style: &str,
        prompt: &str,
    ) -> PortResult<ImageData> {
        self.render(Some(source), styled_prompt(STAGING_TEMPLATE, style, prompt))
            .await
    }

    async fn restyle_content(
        &self,
        source: &ImageData,
        style: &str,
        prompt: &str,
    ) -> PortResult<ImageData> {
        self.render(Some(source), styled_prompt(CONTENT_TEMPLATE, style, prompt))
            .await
    }

    async fn edit_image(
        &self,
        current: &ImageData,
        instruction: &str,
        mode: DesignMode,
    ) -> PortResult<ImageData> {
        self.render(Some(current), edit_prompt(mode, instruction))
            .await
    }
}

//=========================================================================================
// `ProductPhotoService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProductPhotoService for GeminiImageAdapter {
    /// A failed product photo must never sink the whole item list, so every
    /// error is logged and swallowed here.
    async fn synthesize_item_image(&self, item_name: &str) -> Option<ImageData> {
        let instruction = PRODUCT_PHOTO_TEMPLATE.replace("{item}", item_name);
        match self.render(None, instruction).await {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Could not generate product image for '{}': {}", item_name, e);
                None
            }
        }
    }
}
