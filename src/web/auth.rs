//! HTTP Basic authentication for the web panel routes
//!
//! Credentials come from the `paneluser` / `panelpassword` properties and are
//! read on every request, so changing them takes effect without a restart.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use tracing::warn;

use super::server::AppState;
use crate::config::{PANEL_PASSWORD_KEY, PANEL_USER_KEY};

pub const PANEL_REALM: &str = "Web Panel";
pub const DEFAULT_PANEL_USER: &str = "panel";
pub const DEFAULT_PANEL_PASSWORD: &str = "panel";

/// Extract `(user, password)` from an `Authorization: Basic ...` header
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;

    Some((user.to_string(), password.to_string()))
}

/// Middleware rejecting requests without valid panel credentials
pub async fn require_panel_login(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let user = state
        .properties
        .get_property(PANEL_USER_KEY, DEFAULT_PANEL_USER)
        .await;
    let password = state
        .properties
        .get_property(PANEL_PASSWORD_KEY, DEFAULT_PANEL_PASSWORD)
        .await;

    match basic_credentials(request.headers()) {
        Some((u, p)) if u == user && p == password => next.run(request).await,
        Some((u, _)) => {
            warn!("Rejected panel login for user '{}' on {}", u, request.uri().path());
            unauthorized()
        }
        None => unauthorized(),
    }
}

fn unauthorized() -> Response {
    let mut response = StatusCode::UNAUTHORIZED.into_response();
    if let Ok(challenge) = HeaderValue::from_str(&format!("Basic realm=\"{}\"", PANEL_REALM)) {
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, challenge);
    }
    response
}
