//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! Each connection owns one design session and delegates the slow work to
//! spawned tasks.

use crate::{
    error::ApiError,
    web::{
        design_task::{chat_process, generation_process},
        protocol::{ClientMessage, ServerMessage, SessionView},
        state::{AppState, SnapshotRelay},
    },
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use palazzo_core::{
    codec::{self, UploadedFile},
    domain::{DesignFeedback, DesignMode},
    orchestrator::DesignOrchestrator,
    session::{DesignError, SessionSnapshot},
};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{error, info, warn};

/// Uploads arrive base64-encoded, so a 5 MiB image needs roughly 7 MiB of frame.
const MAX_MESSAGE_BYTES: usize = 10 * 1024 * 1024;

/// The write half of the socket, shared by the control loop and its tasks.
pub type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.max_message_size(MAX_MESSAGE_BYTES)
        .on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New WebSocket connection established.");

    // The sender is wrapped in an Arc<Mutex<>> to allow for shared mutable access across tasks.
    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));

    // --- 1. Session Setup ---
    let (snapshot_tx, snapshot_rx) = mpsc::unbounded_channel::<SessionSnapshot>();
    let orchestrator = Arc::new(DesignOrchestrator::new(
        app_state.services.clone(),
        DesignMode::default(),
        Arc::new(SnapshotRelay::new(snapshot_tx.clone())),
    ));
    info!("Session {} created.", orchestrator.snapshot().session_id);

    let forwarder = tokio::spawn(forward_snapshots(snapshot_rx, ws_sender.clone()));
    if snapshot_tx.send(orchestrator.snapshot()).is_err() {
        error!("Snapshot forwarder stopped before the first snapshot.");
        return;
    }
    drop(snapshot_tx);

    // --- 2. Main Message Loop ---
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    loop {
        if let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    tasks.retain(|task| !task.is_finished());
                    if let Err(e) =
                        handle_text_message(text.as_str(), &orchestrator, &ws_sender, &mut tasks)
                            .await
                    {
                        error!("Failed to answer the client: {}", e);
                        break;
                    }
                }
                Message::Binary(_) => {
                    warn!("Ignoring a binary frame; images are sent as JSON.");
                }
                Message::Close(_) => {
                    info!("Client sent close message.");
                    break;
                }
                _ => {}
            }
        } else {
            info!("Client disconnected.");
            break;
        }
    }

    // --- 3. Cleanup ---
    for task in tasks {
        task.abort();
    }
    forwarder.abort();
    info!("WebSocket connection closed.");
}

/// Helper function to handle the logic for different `ClientMessage` variants.
async fn handle_text_message(
    text: &str,
    orchestrator: &Arc<DesignOrchestrator>,
    ws_sender: &WsSender,
    tasks: &mut Vec<JoinHandle<()>>,
) -> Result<(), ApiError> {
    let client_msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            let message = ServerMessage::Error {
                message: "Unrecognized message.".to_string(),
            };
            return send_server_message(ws_sender, &message).await;
        }
    };

    match client_msg {
        ClientMessage::Upload { mime_type, data } => {
            info!("Upload message received ({}).", mime_type);
            let outcome = UploadedFile::from_encoded(&data, &mime_type)
                .map_err(DesignError::from)
                .and_then(|file| orchestrator.upload(file));
            match outcome {
                Ok(_) => {}
                Err(DesignError::Codec(e)) => {
                    warn!("Upload rejected: {}", e);
                    let message = ServerMessage::UploadRejected {
                        message: e.to_string(),
                    };
                    send_server_message(ws_sender, &message).await?;
                }
                Err(e) => {
                    warn!("Upload refused: {}", e);
                    let message = ServerMessage::Error {
                        message: e.to_string(),
                    };
                    send_server_message(ws_sender, &message).await?;
                }
            }
        }
        ClientMessage::Generate { style, prompt } => {
            info!("Generate message received. Spawning generation task.");
            let orchestrator = orchestrator.clone();
            let ws_sender = ws_sender.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = generation_process(orchestrator, ws_sender, style, prompt).await {
                    error!("Generation process failed: {:?}", e);
                }
            }));
        }
        ClientMessage::SendMessage { text } => {
            info!("SendMessage message received. Spawning chat task.");
            let orchestrator = orchestrator.clone();
            let ws_sender = ws_sender.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = chat_process(orchestrator, ws_sender, text).await {
                    error!("Chat process failed: {:?}", e);
                }
            }));
        }
        ClientMessage::Reset => {
            info!("Reset message received.");
            orchestrator.reset();
        }
        ClientMessage::SwitchMode { mode } => {
            info!("SwitchMode message received.");
            orchestrator.switch_mode(mode.into());
        }
        ClientMessage::Export => {
            let message = match orchestrator.export() {
                Some(export) => ServerMessage::ExportReady {
                    file_name: export.file_name.to_string(),
                    data_url: codec::to_displayable(&export.image),
                },
                None => ServerMessage::Error {
                    message: "There is no design to export yet.".to_string(),
                },
            };
            send_server_message(ws_sender, &message).await?;
        }
        ClientMessage::Feedback {
            satisfied,
            reasons,
            other,
        } => {
            orchestrator.record_feedback(&DesignFeedback {
                satisfied,
                reasons,
                other: other.filter(|text| !text.trim().is_empty()),
            });
        }
    }
    Ok(())
}

/// Drains the session's snapshot queue onto the socket until either side closes.
async fn forward_snapshots(
    mut snapshots: mpsc::UnboundedReceiver<SessionSnapshot>,
    ws_sender: WsSender,
) {
    while let Some(snapshot) = snapshots.recv().await {
        let message = ServerMessage::Snapshot(SessionView::from(&snapshot));
        if let Err(e) = send_server_message(&ws_sender, &message).await {
            error!("Failed to send snapshot: {}", e);
            break;
        }
    }
}

/// Encodes a message and writes it as a single text frame.
pub async fn send_server_message(
    ws_sender: &WsSender,
    message: &ServerMessage,
) -> Result<(), ApiError> {
    let json = serde_json::to_string(message)?;
    ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await?;
    Ok(())
}
