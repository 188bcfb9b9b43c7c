//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        GeminiCaptionAdapter, GeminiClient, GeminiImageAdapter, GeminiIntentAdapter,
        GeminiItemsAdapter,
    },
    config::Config,
    error::ApiError,
    web::{health_handler, list_styles_handler, rest::ApiDoc, state::AppState, ws_handler},
};
use axum::{
    http::{header::{ACCEPT, CONTENT_TYPE}, HeaderValue, Method},
    routing::get,
    Router,
};
use palazzo_core::orchestrator::DesignServices;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;
    let gemini = GeminiClient::new(
        http,
        config.gemini_api_base.clone(),
        config.gemini_api_key.clone(),
    );

    let image_adapter = Arc::new(GeminiImageAdapter::new(
        gemini.clone(),
        config.image_model.clone(),
    ));
    let items_adapter = Arc::new(GeminiItemsAdapter::new(
        gemini.clone(),
        config.text_model.clone(),
    ));
    let caption_adapter = Arc::new(GeminiCaptionAdapter::new(
        gemini.clone(),
        config.text_model.clone(),
    ));
    let intent_adapter = Arc::new(GeminiIntentAdapter::new(
        gemini,
        config.text_model.clone(),
    ));
    info!(
        "Using image model '{}' and text model '{}'.",
        config.image_model, config.text_model
    );

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        services: DesignServices {
            images: image_adapter.clone(),
            extractor: items_adapter,
            photos: image_adapter,
            captions: caption_adapter,
            intents: intent_adapter,
        },
    });

    let allowed_origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!(
            "Invalid ALLOWED_ORIGIN '{}': {}",
            config.allowed_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    let api_router = Router::new()
        .route("/health", get(health_handler))
        .route("/styles", get(list_styles_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
