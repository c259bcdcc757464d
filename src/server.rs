use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::bot::Bot;
use crate::platform::telegram::TelegramClient;
use crate::platform::ChatUpdate;

pub const SETUP_PATH: &str = "/setup";
pub const INFO_TEXT: &str = "Student Results Bot is running! Send /setup to configure webhook.";

#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<Bot>,
    pub telegram: Arc<TelegramClient>,
}

/// What an inbound request is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Update,
    Setup,
    Info,
}

impl Route {
    pub fn classify(method: &Method, path: &str) -> Self {
        if method == Method::POST {
            Route::Update
        } else if method == Method::GET && path == SETUP_PATH {
            Route::Setup
        } else {
            Route::Info
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn run(state: AppState, listen: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind to {listen}"))?;

    info!("Webhook server listening on {}", listen);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
}

async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    match Route::classify(&method, uri.path()) {
        Route::Update => handle_update(&state, &body).await,
        Route::Setup => setup_response(state.telegram.set_webhook().await),
        Route::Info => (StatusCode::OK, INFO_TEXT).into_response(),
    }
}

async fn handle_update(state: &AppState, body: &[u8]) -> Response {
    let update: ChatUpdate = match serde_json::from_slice(body) {
        Ok(update) => update,
        Err(e) => {
            warn!("Rejecting malformed update: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error").into_response();
        }
    };

    // The update has been accepted at this point; failures are only logged.
    if let Err(e) = state.bot.handle_update(update).await {
        error!("Error handling update: {:#}", e);
    }

    (StatusCode::OK, "OK").into_response()
}

fn setup_response(result: Result<Value>) -> Response {
    match result {
        Ok(body) => {
            let pretty = serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string());
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                pretty,
            )
                .into_response()
        }
        Err(e) => {
            error!("Webhook registration failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {e:#}")).into_response()
        }
    }
}
