//! crates/palazzo_core/src/intent.rs
//!
//! Routes a chat message in content mode to either an image edit or a
//! caption-only rewrite.

use crate::ports::{IntentClassificationService, PortResult};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Change the visual content (and regenerate the caption with it).
    Image,
    /// Only rewrite the caption; the image stays as it is.
    Text,
}

impl Intent {
    /// Interprets the classifier's raw answer. Anything other than the two
    /// literal tokens falls back to `Image`, the more comprehensive action.
    pub fn from_response(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "TEXT" => Intent::Text,
            _ => Intent::Image,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Image => "IMAGE",
            Intent::Text => "TEXT",
        }
    }
}

/// Wraps the classification port. The decision is advisory: a wrong route is
/// only visible to the user through the assistant's reply.
#[derive(Clone)]
pub struct IntentRouter {
    classifier: Arc<dyn IntentClassificationService>,
}

impl IntentRouter {
    pub fn new(classifier: Arc<dyn IntentClassificationService>) -> Self {
        Self { classifier }
    }

    pub async fn route(&self, text: &str) -> PortResult<Intent> {
        let intent = self.classifier.classify_intent(text).await?;
        info!("Routed chat message as {} intent.", intent.as_str());
        Ok(intent)
    }
}
