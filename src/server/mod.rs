//! HTTP and WebSocket transport for the labelling client.

mod http;
mod websocket;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use serde_json::Value;
use thiserror::Error;

use crate::session::{SessionError, SessionHandler};

pub use http::ApiError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Request handler over the label store
    pub handler: SessionHandler,
    /// Interface settings passed through to the client untouched
    pub settings: Arc<Value>,
}

impl AppState {
    pub fn new(handler: SessionHandler, settings: Option<Value>) -> Self {
        Self {
            handler,
            settings: Arc::new(settings.unwrap_or_else(|| Value::Object(Default::default()))),
        }
    }

    /// Run a handler call on the blocking thread pool.
    pub(crate) async fn run_blocking<T, F>(&self, call: F) -> Result<T, ApiError>
    where
        F: FnOnce(&SessionHandler) -> Result<T, SessionError> + Send + 'static,
        T: Send + 'static,
    {
        let handler = self.handler.clone();
        tokio::task::spawn_blocking(move || call(&handler))
            .await
            .map_err(|err| ApiError::Internal(err.to_string()))?
            .map_err(ApiError::from)
    }
}

/// Errors that stop the server from starting.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid host address '{host}': {source}")]
    InvalidHost {
        host: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/labelling/get_labels/:image_id", get(http::get_labels))
        .route("/labelling/set_labels", post(http::set_labels))
        .route("/labelling/dextr", post(http::dextr))
        .route("/image/:image_id", get(http::get_image))
        .route("/api/images", get(http::get_images))
        .route("/api/settings", get(http::get_settings))
        .route("/ws", get(websocket::ws_handler))
        .with_state(state)
}

/// Serve until the process is stopped.
pub async fn start_server(state: AppState, host: &str, port: u16) -> Result<(), ServerError> {
    let host_addr: std::net::IpAddr = host.parse().map_err(|source| ServerError::InvalidHost {
        host: host.to_string(),
        source,
    })?;
    let addr = SocketAddr::from((host_addr, port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!(
        "Serving {} images at http://{}",
        state.handler.store().images().len(),
        addr
    );
    axum::serve(listener, router(state)).await?;
    Ok(())
}
