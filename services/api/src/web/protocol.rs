//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for the design assistant. Every frame is a JSON text frame.

use chrono::{DateTime, Utc};
use palazzo_core::codec;
use palazzo_core::domain::{DesignMode, FurnitureItem, Message, Sender};
use palazzo_core::session::SessionSnapshot;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Sets or replaces the source photo. `data` is bare base64 or a data URL.
    Upload { mime_type: String, data: String },

    /// Runs the initial generation for the uploaded photo.
    Generate {
        style: String,
        #[serde(default)]
        prompt: String,
    },

    /// A chat instruction applied to the current design.
    SendMessage { text: String },

    /// Discards everything and starts over in the current mode.
    Reset,

    SwitchMode { mode: WireMode },

    /// Asks for the current design as a downloadable file.
    Export,

    Feedback {
        satisfied: bool,
        #[serde(default)]
        reasons: Vec<String>,
        #[serde(default)]
        other: Option<String>,
    },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The full session view, sent after every state change.
    Snapshot(SessionView),

    /// The uploaded file was not accepted. The session is unchanged.
    UploadRejected { message: String },

    /// The current design, ready to be saved by the browser.
    ExportReady { file_name: String, data_url: String },

    /// Reports an error to the client, which should display an error message.
    Error { message: String },
}

//=========================================================================================
// Wire Views
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WireMode {
    Interior,
    Content,
}

impl From<WireMode> for DesignMode {
    fn from(mode: WireMode) -> Self {
        match mode {
            WireMode::Interior => DesignMode::Interior,
            WireMode::Content => DesignMode::Content,
        }
    }
}

impl From<DesignMode> for WireMode {
    fn from(mode: DesignMode) -> Self {
        match mode {
            DesignMode::Interior => WireMode::Interior,
            DesignMode::Content => WireMode::Content,
        }
    }
}

/// What the browser renders. Images travel as data URLs.
#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct SessionView {
    pub session_id: Uuid,
    pub epoch: u64,
    pub mode: WireMode,
    /// One of `initial`, `image_uploaded`, `generating`, `results_ready`, `error`.
    pub phase: String,
    pub busy: bool,
    pub activity: Option<String>,
    pub source_image: Option<String>,
    pub display_image: Option<String>,
    pub conversation: Vec<MessageView>,
    pub items: Vec<ItemView>,
    pub social_caption: Option<String>,
    pub last_error: Option<String>,
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct MessageView {
    pub id: Uuid,
    /// Either `user` or `assistant`.
    pub sender: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct ItemView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub color: String,
    pub description: String,
    pub dimensions: String,
    pub materials: Vec<String>,
    pub style_tags: Vec<String>,
    pub product_image: Option<String>,
}

impl From<&SessionSnapshot> for SessionView {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            session_id: snapshot.session_id,
            epoch: snapshot.epoch,
            mode: snapshot.mode.into(),
            phase: snapshot.phase.as_str().to_string(),
            busy: snapshot.is_busy(),
            activity: snapshot.activity.map(str::to_string),
            source_image: snapshot.source_image.as_ref().map(codec::to_displayable),
            display_image: snapshot.display_image.as_ref().map(codec::to_displayable),
            conversation: snapshot.conversation.iter().map(MessageView::from).collect(),
            items: snapshot.items.iter().map(ItemView::from).collect(),
            social_caption: snapshot.social_caption.clone(),
            last_error: snapshot.last_error.clone(),
        }
    }
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        let sender = match message.sender {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        };
        Self {
            id: message.id,
            sender: sender.to_string(),
            text: message.text.clone(),
            created_at: message.created_at,
        }
    }
}

impl From<&FurnitureItem> for ItemView {
    fn from(item: &FurnitureItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price_estimate.clone(),
            color: item.color.clone(),
            description: item.description.clone(),
            dimensions: item.dimensions.clone(),
            materials: item.materials.clone(),
            style_tags: item.style_tags.clone(),
            product_image: item.product_image.as_ref().map(codec::to_displayable),
        }
    }
}
