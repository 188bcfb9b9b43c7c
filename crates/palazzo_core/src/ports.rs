//! crates/palazzo_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the generative service that actually produces images and text.

use crate::domain::{DesignMode, ImageData, PartialItem};
use crate::intent::Intent;
use crate::session::SessionSnapshot;
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// The remote service has no distinguished error codes beyond a missing or
/// malformed payload, so these variants describe which contract was broken.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The service answered but did not include the expected image payload.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    /// The structured response could not be parsed into the expected shape.
    #[error("Could not parse the service response: {0}")]
    ParseFailed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// The message without the variant's prefix, for text shown to the user.
    pub fn detail(&self) -> &str {
        match self {
            PortError::GenerationFailed(detail)
            | PortError::ParseFailed(detail)
            | PortError::Unexpected(detail) => detail,
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Re-stages a room photo in the given style, keeping walls, windows,
    /// doors and flooring untouched.
    async fn stage_image(
        &self,
        source: &ImageData,
        style: &str,
        prompt: &str,
    ) -> PortResult<ImageData>;

    /// Creatively restyles a photo for social content, keeping its core subject.
    async fn restyle_content(
        &self,
        source: &ImageData,
        style: &str,
        prompt: &str,
    ) -> PortResult<ImageData>;

    /// Applies a single requested change and leaves everything else as it was.
    async fn edit_image(
        &self,
        current: &ImageData,
        instruction: &str,
        mode: DesignMode,
    ) -> PortResult<ImageData>;
}

#[async_trait]
pub trait ProductPhotoService: Send + Sync {
    /// Best effort: returns `None` on any failure instead of an error.
    async fn synthesize_item_image(&self, item_name: &str) -> Option<ImageData>;
}

#[async_trait]
pub trait ItemExtractionService: Send + Sync {
    /// Lists the furniture and decor items visible in an image, in the order
    /// the service reports them.
    async fn extract_items(&self, image: &ImageData) -> PortResult<Vec<PartialItem>>;
}

#[async_trait]
pub trait CaptionService: Send + Sync {
    async fn generate_caption(
        &self,
        image: &ImageData,
        style: &str,
        prompt: &str,
    ) -> PortResult<String>;

    async fn rewrite_caption(&self, image: &ImageData, instruction: &str) -> PortResult<String>;

    /// Writes a fresh caption for an image that was just edited with `instruction`.
    async fn recaption_edit(&self, edited: &ImageData, instruction: &str) -> PortResult<String>;
}

#[async_trait]
pub trait IntentClassificationService: Send + Sync {
    async fn classify_intent(&self, text: &str) -> PortResult<Intent>;
}

/// Receives a fresh snapshot every time the session changes.
///
/// Called while the session lock is held, so implementations must not block.
pub trait SessionObserver: Send + Sync {
    fn session_changed(&self, snapshot: &SessionSnapshot);
}
