//! services/api/src/web/design_task.rs
//!
//! This module contains the asynchronous "worker" functions that run the
//! long generation calls off the control loop, so a reset can still be
//! received while the model is busy.

use crate::error::ApiError;
use crate::web::ws_handler::{send_server_message, WsSender};
use crate::web::protocol::ServerMessage;
use palazzo_core::orchestrator::DesignOrchestrator;
use palazzo_core::session::{DesignError, SessionSnapshot};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Runs the initial generation for the uploaded photo.
///
/// Snapshots reach the client through the session observer; this task only
/// reports requests that were refused outright.
pub async fn generation_process(
    orchestrator: Arc<DesignOrchestrator>,
    ws_sender: WsSender,
    style: String,
    prompt: String,
) -> Result<(), ApiError> {
    let start_time = Instant::now();
    info!("Generation task started.");

    let outcome = orchestrator.generate(&style, &prompt).await;
    report_outcome("Generation", outcome, &ws_sender).await?;

    info!("⏱️ Generation task took: {:?}", start_time.elapsed());
    Ok(())
}

/// Applies one chat message to the current design.
pub async fn chat_process(
    orchestrator: Arc<DesignOrchestrator>,
    ws_sender: WsSender,
    text: String,
) -> Result<(), ApiError> {
    let start_time = Instant::now();
    info!("Chat task started.");

    let outcome = orchestrator.send_message(&text).await;
    report_outcome("Chat", outcome, &ws_sender).await?;

    info!("⏱️ Chat task took: {:?}", start_time.elapsed());
    Ok(())
}

async fn report_outcome(
    task: &str,
    outcome: Result<SessionSnapshot, DesignError>,
    ws_sender: &WsSender,
) -> Result<(), ApiError> {
    match outcome {
        Ok(snapshot) => {
            info!("{} task left the session in phase {}.", task, snapshot.phase);
            Ok(())
        }
        Err(DesignError::Superseded) => {
            info!("{} task result was dropped after a reset.", task);
            Ok(())
        }
        Err(e) => {
            error!("{} task was refused: {}", task, e);
            let message = ServerMessage::Error {
                message: e.to_string(),
            };
            send_server_message(ws_sender, &message).await
        }
    }
}
