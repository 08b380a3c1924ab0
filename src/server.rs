//! HTTP endpoint for the conversion pipeline.
//!
//! `POST /convert` takes `{fileName, fileContent, fileType?}` and answers with
//! either `{success: true, geoJson, message}` or `{success: false, error}`.
//! Any origin may call it; preflight requests are answered directly.

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::middleware::{Next, from_fn};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::convert::{self, Conversion};
use crate::geometry::FeatureCollection;

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
const ALLOW_METHODS: &str = "POST, OPTIONS";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    pub file_name: Option<String>,
    pub file_content: Option<String>,
    pub file_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertSuccess {
    pub success: bool,
    pub geo_json: FeatureCollection,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ConvertFailure {
    pub success: bool,
    pub error: String,
}

impl ConvertFailure {
    fn response(error: String) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(ConvertFailure {
                success: false,
                error,
            }),
        )
            .into_response()
    }
}

pub fn build_router(config: &ServerConfig) -> Router {
    Router::new()
        .route("/convert", post(convert_handler))
        .route("/healthz", get(|| async { "ok" }))
        .layer(from_fn(cors_middleware))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, build_router(&config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn convert_handler(body: Bytes) -> Response {
    let started = Instant::now();

    let request: ConvertRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "rejecting unparseable request body");
            return ConvertFailure::response(format!("Invalid request body: {e}"));
        }
    };

    let result = convert::convert(
        request.file_name.as_deref(),
        request.file_content.as_deref(),
        request.file_type.as_deref(),
    )
    .await;

    match result {
        Ok(Conversion { format, collection }) => {
            let label = format.label();
            let count = collection.features.len();
            info!(
                file_name = request.file_name.as_deref(),
                format = label,
                features = count,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "conversion succeeded"
            );
            let message = format!(
                "Converted {} feature{} from {}",
                count,
                if count == 1 { "" } else { "s" },
                label
            );
            Json(ConvertSuccess {
                success: true,
                geo_json: collection,
                message,
            })
            .into_response()
        }
        Err(e) => {
            warn!(
                file_name = request.file_name.as_deref(),
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "conversion failed"
            );
            ConvertFailure::response(e.to_string())
        }
    }
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut resp = StatusCode::OK.into_response();
        let headers = resp.headers_mut();
        headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
        headers.insert(
            "access-control-allow-methods",
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            "access-control-allow-headers",
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        return resp;
    }

    let mut resp = next.run(req).await;
    resp.headers_mut()
        .insert("access-control-allow-origin", HeaderValue::from_static("*"));
    resp
}
