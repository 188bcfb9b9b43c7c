//! crates/palazzo_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or serialization format.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Which of the two design flows a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DesignMode {
    /// Re-stage a room photo and list the furniture in it.
    #[default]
    Interior,
    /// Restyle a photo and write a social media caption for it.
    Content,
}

impl DesignMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesignMode::Interior => "interior",
            DesignMode::Content => "content",
        }
    }
}

/// The fixed style palette offered to the user. Free-text styles are still
/// accepted by the generation ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignStyle {
    Modern,
    Minimalist,
    Industrial,
    Bohemian,
    Scandinavian,
    Coastal,
}

impl DesignStyle {
    pub const ALL: [DesignStyle; 6] = [
        DesignStyle::Modern,
        DesignStyle::Minimalist,
        DesignStyle::Industrial,
        DesignStyle::Bohemian,
        DesignStyle::Scandinavian,
        DesignStyle::Coastal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DesignStyle::Modern => "Modern",
            DesignStyle::Minimalist => "Minimalist",
            DesignStyle::Industrial => "Industrial",
            DesignStyle::Bohemian => "Bohemian",
            DesignStyle::Scandinavian => "Scandinavian",
            DesignStyle::Coastal => "Coastal",
        }
    }
}

/// An encoded image together with its MIME type.
///
/// `Bytes` keeps clones cheap: the same source image is handed to several
/// requests and to every snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Bytes,
    pub mime_type: String,
}

impl ImageData {
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

/// A single line of the design conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }

    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// One entry of the structured item list, before its product photo exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialItem {
    pub name: String,
    pub price_estimate: String,
    pub color: String,
    pub description: String,
    pub dimensions: String,
    pub materials: Vec<String>,
    pub style_tags: Vec<String>,
}

/// A detected furniture or decor item shown in the shop list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FurnitureItem {
    pub id: String,
    pub name: String,
    pub price_estimate: String,
    pub color: String,
    pub description: String,
    pub dimensions: String,
    pub materials: Vec<String>,
    pub style_tags: Vec<String>,
    /// Absent when the product photo could not be synthesized.
    pub product_image: Option<ImageData>,
}

impl FurnitureItem {
    pub fn from_partial(id: String, partial: PartialItem, product_image: Option<ImageData>) -> Self {
        Self {
            id,
            name: partial.name,
            price_estimate: partial.price_estimate,
            color: partial.color,
            description: partial.description,
            dimensions: partial.dimensions,
            materials: partial.materials,
            style_tags: partial.style_tags,
            product_image,
        }
    }
}

/// User feedback on a generated design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignFeedback {
    pub satisfied: bool,
    pub reasons: Vec<String>,
    pub other: Option<String>,
}

/// The canned reasons a user can pick when unhappy with a design.
pub const FEEDBACK_REASONS: [&str; 4] = [
    "Architecture Changed",
    "Weird Lighting",
    "Incorrect Furniture",
    "Style Doesn't Match",
];
