//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::{ItemView, MessageView, SessionView, WireMode};
use crate::web::state::AppState;
use axum::{extract::State, response::Json};
use palazzo_core::domain::DesignStyle;
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        list_styles_handler,
    ),
    components(
        schemas(HealthResponse, StyleListResponse, SessionView, MessageView, ItemView, WireMode)
    ),
    tags(
        (name = "Palazzo Design API", description = "API endpoints for the design assistant. The design session itself runs over the /ws WebSocket.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    image_model: String,
    text_model: String,
}

/// The style palette offered by the client. Free-text styles are also accepted.
#[derive(Serialize, ToSchema)]
pub struct StyleListResponse {
    styles: Vec<String>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Reports that the service is up and which models it talks to.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_handler(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        image_model: app_state.config.image_model.clone(),
        text_model: app_state.config.text_model.clone(),
    })
}

/// Lists the design styles.
#[utoipa::path(
    get,
    path = "/styles",
    responses(
        (status = 200, description = "The fixed style palette", body = StyleListResponse)
    )
)]
pub async fn list_styles_handler() -> Json<StyleListResponse> {
    Json(StyleListResponse {
        styles: DesignStyle::ALL
            .iter()
            .map(|style| style.label().to_string())
            .collect(),
    })
}
