use std::{io, sync::Arc};

use axum::{
    Router,
    body::{self, Body as AxumBody},
    extract::{Request, State},
    middleware,
    response::{IntoResponse, Response as AxumResponse},
    routing::{get, post},
};
use http::StatusCode;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    error::AdapterError,
    handlers::Handlers,
    net::{Body, HttpEvent, InboundEvent, Response, cors},
};

type Operation = fn(&Handlers, InboundEvent) -> Result<Response, AdapterError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Clone)]
struct RouteState {
    handlers: Arc<Handlers>,
    max_body_bytes: usize,
}

pub fn create_routes(handlers: Arc<Handlers>) -> Router {
    let state = RouteState { max_body_bytes: handlers.config().max_body_bytes, handlers };

    Router::new()
        .route("/api/upload", post(upload).options(preflight))
        .route("/api/download", get(download).options(preflight))
        .route("/api/list", get(list).options(preflight))
        .fallback(not_found)
        // also covers the 404 and 405 answers axum builds itself
        .layer(middleware::map_response(with_cors))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();
            tracing::debug_span!("request", %method, %uri)
        }))
        .with_state(state)
}

pub async fn serve(handlers: Arc<Handlers>) -> Result<(), ServerError> {
    let listener = TcpListener::bind(("0.0.0.0", handlers.config().port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, create_routes(handlers))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

async fn upload(State(state): State<RouteState>, req: Request) -> AxumResponse {
    dispatch(state, req, Handlers::upload).await
}

async fn download(State(state): State<RouteState>, req: Request) -> AxumResponse {
    dispatch(state, req, Handlers::download).await
}

async fn list(State(state): State<RouteState>, req: Request) -> AxumResponse {
    dispatch(state, req, Handlers::list).await
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn with_cors(mut response: AxumResponse) -> AxumResponse {
    cors::insert_headers(response.headers_mut());
    response
}

/// Runs one handler invocation on the blocking pool.
async fn dispatch(state: RouteState, req: Request, operation: Operation) -> AxumResponse {
    let event = into_event(req, state.max_body_bytes).await;
    let handlers = state.handlers;

    match tokio::task::spawn_blocking(move || operation(&handlers, event)).await {
        Ok(Ok(response)) => response.into_response(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Event rejected");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Handler task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Buffers the request body and wraps the request as an HTTP event. A body
/// that cannot be received is handed over as a failing stream, so the handler
/// reports it like any other read error.
async fn into_event(req: Request, max_body_bytes: usize) -> InboundEvent {
    let (parts, body) = req.into_parts();
    let body = match body::to_bytes(body, max_body_bytes).await {
        Ok(bytes) => Body::new(io::Cursor::new(bytes)),
        Err(e) => Body::failed(io::Error::other(e)),
    };

    HttpEvent::new(parts.method, parts.uri.path())
        .with_query(parts.uri.query().unwrap_or_default())
        .with_body(body)
        .into()
}

impl IntoResponse for Response {
    fn into_response(self) -> AxumResponse {
        (self.status, self.headers, AxumBody::from(self.body)).into_response()
    }
}
