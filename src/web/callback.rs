//! GET /streamlabsoauth - where Streamlabs sends the operator back to

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, error};

use super::server::AppState;
use crate::streamlabs::external_origin;

/// Path used by the web panel to check whether its login is still valid
pub const PANEL_CHECK_LOGIN_PATH: &str = "/panel/checklogin";

/// Where the operator lands after a successful handshake
pub const PANEL_HOME_PATH: &str = "/panel";

/// First value of `name` in the query pairs, as a repeated parameter is
/// resolved on the callback
fn first_param(pairs: &[(String, String)], name: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
}

/// Handle one request on the callback path.
///
/// Without a `code` the operator is redirected to Streamlabs to authorize;
/// with one, the code is exchanged for an access token.
pub async fn oauth_callback(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let path = uri.path();

    if method != Method::GET {
        debug!("405 {}: {}", method, path);
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    if path.starts_with(PANEL_CHECK_LOGIN_PATH) {
        debug!("204 {}: {}", method, path);
        return check_login(&headers);
    }

    let pairs = match query {
        Ok(Query(pairs)) => pairs,
        Err(e) => {
            debug!("400 {}: {} - {}", method, path, e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());

    let Some(code) = first_param(&pairs, "code") else {
        let location = state.oauth.authorize_uri(host).await;
        debug!("303 {}: {}", method, path);
        return Redirect::to(&location).into_response();
    };

    if code.trim().is_empty() {
        debug!("200 {}: {}", method, path);
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            "[]",
        )
            .into_response();
    }

    match state.oauth.request_access_token(host, &code).await {
        Ok(true) => {
            let location = format!(
                "{}{}",
                external_origin(host, state.oauth.is_secure()),
                PANEL_HOME_PATH
            );
            debug!("303 {}: {}", method, path);
            Redirect::to(&location).into_response()
        }
        Ok(false) => {
            error!("500 {}: {} - Streamlabs did not return an access token", method, path);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => {
            error!("500 {}: {} - token exchange failed: {}", method, path, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// 204 echoing the caller's origin so the panel can check with credentials
fn check_login(headers: &HeaderMap) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    let response_headers = response.headers_mut();

    if let Some(origin) = headers.get(header::ORIGIN) {
        response_headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    }
    response_headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );

    response
}
