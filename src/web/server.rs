//! Router and listener for the OAuth callback endpoint

use axum::{middleware, routing::any, Router};
use std::net::SocketAddr;
use tracing::info;

use super::auth::require_panel_login;
use super::callback::{oauth_callback, PANEL_CHECK_LOGIN_PATH};
use crate::config::SharedPropertyStore;
use crate::streamlabs::{OAuthCoordinator, OAUTH_CALLBACK_PATH};

/// Shared state for web handlers
#[derive(Clone)]
pub struct AppState {
    pub oauth: OAuthCoordinator,
    pub properties: SharedPropertyStore,
}

/// Build the router serving the callback and login-check paths behind the
/// panel login
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(OAUTH_CALLBACK_PATH, any(oauth_callback))
        .route(PANEL_CHECK_LOGIN_PATH, any(oauth_callback))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_panel_login,
        ))
        .with_state(state)
}

/// Serve the callback endpoint until the listener fails
pub async fn start_web_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let secure = state.oauth.is_secure();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind web server on {}: {}", addr, e))?;

    info!("Web server listening on http://{}", listener.local_addr()?);
    info!("=== Streamlabs OAuth Configuration ===");
    info!("Register this Redirect URI for the Streamlabs application:");
    info!(
        "  {}://<your-host>{}",
        if secure { "https" } else { "http" },
        OAUTH_CALLBACK_PATH
    );

    axum::serve(listener, app).await?;

    Ok(())
}
