use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::post, Json, Router};
use log::{error, info, warn};
use serde::Deserialize;
use std::sync::Arc;

use receipt_pdf::{ReceiptRenderer, RenderConfig, RenderError, ServerConfig};
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Deserialize)]
struct RenderRequest {
    html: String,
    /// Overrides the configured scale for this job only
    font_scale: Option<f32>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Arc::new(RenderConfig::from_env());
    let server = ServerConfig::from_env();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/render-receipt", post(render_receipt))
        .layer(cors)
        .with_state(config);

    info!("Receipt renderer listening on http://{}", server.addr);

    let listener = match tokio::net::TcpListener::bind(server.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", server.addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
}

async fn render_receipt(
    State(config): State<Arc<RenderConfig>>,
    Json(request): Json<RenderRequest>,
) -> Response {
    let mut config = (*config).clone();
    if let Some(scale) = request.font_scale {
        if scale.is_finite() && scale > 0.0 {
            config.font_scale = scale;
        } else {
            warn!("Ignoring font_scale {} in request", scale);
        }
    }

    let renderer = ReceiptRenderer::new(config);
    let job = tokio::task::spawn_blocking(move || renderer.render(&request.html)).await;

    match job {
        Ok(Ok(pdf_bytes)) => (
            [
                (header::CONTENT_TYPE, "application/pdf"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"receipt.pdf\""),
            ],
            pdf_bytes,
        )
            .into_response(),
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            error!("Render task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "render task failed" })),
            )
                .into_response()
        }
    }
}

fn error_response(e: &RenderError) -> Response {
    let status = if e.is_input_error() {
        warn!("Rejected receipt: {}", e);
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        error!("Receipt rendering failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
}
