//! API endpoint handlers
//!
//! This module implements the HTTP surface of the verifier: the upload page,
//! the multipart verification endpoint, and a health check.

use crate::core::config::Config;
use crate::core::constants::defaults;
use crate::verifier::{CaptionVerifier, VerificationResult};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub verifier: CaptionVerifier,
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/verify", post(verify))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Bind and run the server until Ctrl-C
pub async fn serve(state: AppState, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;
    Ok(())
}

/// Failure returned to HTTP clients as `400 {"error": ...}`
#[derive(Debug)]
pub struct ApiError(String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": self.0 }))).into_response()
    }
}

impl<E: std::fmt::Display> From<E> for ApiError {
    fn from(err: E) -> Self {
        ApiError(err.to_string())
    }
}

/// Fields collected from a `/verify` multipart body
#[derive(Default)]
struct VerifyForm {
    image: Option<(String, Bytes)>,
    caption: Option<String>,
    instructions: Option<String>,
}

impl VerifyForm {
    async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = VerifyForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    form.image = Some((file_name, field.bytes().await?));
                }
                "caption" => form.caption = Some(field.text().await?),
                "instructions" => form.instructions = Some(field.text().await?),
                other => debug!("Ignoring unexpected form field '{}'", other),
            }
        }

        Ok(form)
    }
}

/// POST /verify - Verify a caption against an uploaded image
///
/// The upload is written to a named temporary file carrying the original
/// extension. The file handle owns the path, so it is removed when the
/// handler returns, fails, or is dropped mid-flight.
async fn verify(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    let form = VerifyForm::read(multipart?).await?;

    let (file_name, data) = form
        .image
        .ok_or_else(|| ApiError("Missing form field 'image'".to_string()))?;
    let caption = form
        .caption
        .ok_or_else(|| ApiError("Missing form field 'caption'".to_string()))?;

    info!(
        "📥 POST /verify request_id={} file={:?} bytes={}",
        request_id,
        file_name,
        data.len()
    );

    let suffix = Path::new(&file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    let upload = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&suffix)
        .tempfile_in(&state.config.upload_dir)
        .map_err(|e| {
            error!("request_id={} could not create upload file: {}", request_id, e);
            ApiError(format!("Failed to store upload: {}", e))
        })?;
    tokio::fs::write(upload.path(), &data).await?;

    let outcome = state
        .verifier
        .verify_from_path(upload.path(), &caption, form.instructions.as_deref())
        .await;

    if let Err(e) = upload.close() {
        warn!("request_id={} failed to remove upload file: {}", request_id, e);
    }

    match outcome {
        Ok(result) => {
            info!(
                "request_id={} verified with {} ({} tokens)",
                request_id,
                result.model(),
                result.usage().total_tokens
            );
            Ok(Json(verification_body(&result)))
        }
        Err(e) => {
            warn!("request_id={} verification failed: {}", request_id, e);
            Err(ApiError::from(e))
        }
    }
}

/// JSON body returned for a successful verification
pub fn verification_body(result: &VerificationResult) -> serde_json::Value {
    json!({
        "verification": result.verification_text,
        "model": result.model(),
        "created": result.created(),
        "usage": result.usage(),
    })
}

/// GET / - Upload page
async fn index() -> Html<String> {
    Html(render_index())
}

fn render_index() -> String {
    include_str!("index.html")
        .replace("{{CAPTION}}", &escape_html(defaults::CAPTION))
        .replace("{{INSTRUCTIONS}}", &escape_html(defaults::INSTRUCTIONS))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// GET /health - Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "provider": state.verifier.provider_name(),
        "model": state.verifier.model(),
        "api_key_valid": state.config.validate_api_key(),
    }))
}
