//! HTTP front end for the `grayblock` pixelation engine.
//!
//! Routes:
//! - `POST /pixelate`: `multipart/form-data` with the image in the `image` field;
//!   answers with the pixelated grayscale PNG (`image/png`).
//! - `GET /healthz`: liveness check.

pub mod config;
pub mod error;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use grayblock::{PNG_CONTENT_TYPE, Pixelator};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

pub use config::{DownscaleSetting, ServerConfig};
pub use error::ApiError;

/// Name of the multipart field carrying the upload.
pub const IMAGE_FIELD: &str = "image";

#[derive(Clone)]
pub struct AppState {
    pixelator: Arc<Pixelator>,
}

/// Builds the application router for `config`.
pub fn router(config: &ServerConfig) -> anyhow::Result<Router> {
    let pixelator = Pixelator::new(config.pixelation_config()).context("invalid pixelation settings")?;
    let cors = build_cors_layer(&config.allowed_origins)?;
    let state = AppState {
        pixelator: Arc::new(pixelator),
    };

    Ok(Router::new()
        .route("/pixelate", post(pixelate))
        .route("/healthz", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Binds `config.bind_addr` and serves until `shutdown` resolves.
///
/// Returns the bound address (useful with port 0) and the server task.
pub async fn start_server<F>(
    config: ServerConfig,
    shutdown: F,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<std::io::Result<()>>)>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(&config)?;
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    let local_addr = listener.local_addr()?;

    info!(
        %local_addr,
        block_size = config.block_size,
        downscale = ?config.downscale,
        threshold = ?config.threshold,
        origins = ?config.allowed_origins,
        "pixelate server listening"
    );

    let server = tokio::spawn(async move {
        axum::serve(listener, app).with_graceful_shutdown(shutdown).await
    });

    Ok((local_addr, server))
}

async fn pixelate(State(state): State<AppState>, mut multipart: Multipart) -> Result<Response, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            debug!(file_name = ?field.file_name(), content_type = ?field.content_type(), "receiving upload");
            upload = Some(field.bytes().await?);
            break;
        }
    }
    let bytes = upload.ok_or(ApiError::MissingImage)?;

    // Decoding and resampling are CPU-bound; keep them off the reactor.
    let pixelator = Arc::clone(&state.pixelator);
    let png = tokio::task::spawn_blocking(move || pixelator.process(&bytes)).await??;

    Ok(([(header::CONTENT_TYPE, PNG_CONTENT_TYPE)], png).into_response())
}

fn build_cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    if origins.is_empty() {
        warn!("allowed_origins is empty; browser uploads from other origins will be blocked");
    }

    let origins = origins
        .iter()
        .map(|origin| HeaderValue::from_str(origin).with_context(|| format!("invalid origin {origin:?}")))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}
